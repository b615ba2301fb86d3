pub mod layer;
pub mod query;
pub mod symbology;
pub mod vector;

pub use layer::*;
