pub mod config;
pub mod interaction;
pub mod naming;
pub mod reconcile;
pub mod symbology;
pub mod viewport;

pub use config::*;
pub use naming::ObjectNames;
pub use reconcile::*;
