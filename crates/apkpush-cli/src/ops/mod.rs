//! Operations shared by several commands.

pub mod context;
pub mod device;
pub mod location;

pub use context::Context;
pub use location::InstallLocation;
