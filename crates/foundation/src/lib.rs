pub mod bounds;
pub mod geometry;
pub mod ids;
pub mod math;

// Foundation crate: small, well-tested primitives only.
pub use bounds::*;
pub use geometry::*;
pub use ids::*;
