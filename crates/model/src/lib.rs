pub mod feature;
pub mod geometry;
mod lenient;
pub mod response;
pub mod validate;
pub mod visualization;

pub use feature::*;
pub use geometry::*;
pub use response::*;
pub use validate::*;
pub use visualization::*;
