pub mod adapter;
pub mod camera;
pub mod interaction;
pub mod memory;
pub mod objects;
pub mod style;

pub use adapter::*;
pub use camera::*;
pub use interaction::*;
pub use memory::MemoryRenderer;
pub use objects::*;
pub use style::*;
