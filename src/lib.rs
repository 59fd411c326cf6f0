//! Keeps the Kodi installation of an Android TV launcher up to date

/// logging, filesystem and platform helpers
pub mod common;
/// data structures for using CLI arguments and loading the configuration file
pub mod config;
/// finds, downloads and installs new Kodi releases
pub mod updater;
