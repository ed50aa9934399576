pub mod config;
pub mod diagnostics;
pub mod session;
pub mod style;

pub use config::*;
pub use diagnostics::Diagnostics;
pub use session::*;
pub use style::*;
