pub mod feature;
pub mod fields;
pub mod query;
pub mod spatial;

pub use feature::*;
