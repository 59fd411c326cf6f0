//! Logging, filesystem and platform helpers shared by the updater and the CLI

#[cfg(target_os = "android")]
pub(crate) mod android_util;
pub(crate) mod fs;
pub mod logging;

pub use logging::{error, info};
