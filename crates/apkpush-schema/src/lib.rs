//! Shared types for apkpush.
//!
//! Kept free of I/O so the core and the CLI (and anything that consumes the
//! JSON report) agree on one shape.

pub mod arch;
pub mod types;

// Re-exports
pub use arch::*;
pub use types::*;

/// Root directory for native libraries inside an APK.
pub const NATIVE_LIB_ROOT: &str = "lib/";

/// Suffix of the shared libraries deployed to the device.
pub const SHARED_LIB_SUFFIX: &str = ".so";
