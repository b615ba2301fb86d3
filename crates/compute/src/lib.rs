pub mod analysis;

pub use analysis::aggregate::*;
