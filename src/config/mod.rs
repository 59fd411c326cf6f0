/// data structures for loading the configuration file and using CLI arguments for the updater
pub mod config_updater;
