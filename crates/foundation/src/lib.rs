pub mod bounds;
pub mod lnglat;

// Foundation crate: small, well-tested geographic primitives only.
pub use bounds::*;
pub use lnglat::*;
