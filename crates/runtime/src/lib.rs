pub mod metrics;
pub mod sequence;
pub mod subscription;

pub use metrics::*;
pub use sequence::*;
pub use subscription::*;
