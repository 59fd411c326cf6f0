//! This module contains all data structs that are needed for the updater.
//! The data that these structs represent are used for invoking the updater binary with CLI
//! (default) arguments or are used to deserialize its configuration file.

#[cfg(target_os = "android")]
use crate::common::android_util::AndroidUtil;
#[cfg(target_os = "android")]
use crate::common::error;

use crate::common::fs::resolve_path;
use crate::common::info;
use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_LISTING_URL: &str = "http://mirrors.kodi.tv/releases/android/arm/";
pub const DEFAULT_LISTING_ROW: usize = 2;
pub const DEFAULT_APK_PREFIX: &str = "FireStarter-";
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;
pub const DOWNLOAD_FOLDER: &str = "FireStarterInstalls";

#[derive(Parser, Debug)]
pub struct CheckCommand {}

#[derive(Parser, Debug)]
pub struct UpdateCommand {
    /// Version that is currently installed, e.g. v20.0
    #[arg(short = 'v', long)]
    pub current_version: String,
}

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct CliUpdater {
    /// Path to the configuration file, defaults are used if it does not exist
    #[arg(short, long, default_value = default_config_path().into_os_string())]
    pub config: PathBuf,
    #[command(subcommand)]
    pub command: CommandsUpdater,
}

#[derive(Debug, Subcommand)]
pub enum CommandsUpdater {
    /// Look up the latest Kodi release on the mirror.
    Check(CheckCommand),
    /// Download and install the latest Kodi release if it differs from the current version.
    Update(UpdateCommand),
}

#[derive(Debug, Deserialize, PartialEq)]
pub struct ConfigUpdater {
    #[serde(default = "default_listing_url")]
    pub listing_url: String,
    #[serde(default = "default_listing_row")]
    pub listing_row: usize,
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,
    #[serde(default = "default_apk_prefix")]
    pub apk_prefix: String,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_install_command")]
    pub install_command: Vec<String>,
}

impl Default for ConfigUpdater {
    fn default() -> ConfigUpdater {
        ConfigUpdater {
            listing_url: default_listing_url(),
            listing_row: default_listing_row(),
            download_dir: default_download_dir(),
            apk_prefix: default_apk_prefix(),
            poll_interval_ms: default_poll_interval_ms(),
            user_agent: default_user_agent(),
            install_command: default_install_command(),
        }
    }
}

impl ConfigUpdater {
    pub fn deserialize(data: &str) -> anyhow::Result<ConfigUpdater> {
        toml::from_str::<ConfigUpdater>(data)
            .with_context(|| format!("Could not create ConfigUpdater from {data}"))
    }

    pub fn load(path: &Path) -> anyhow::Result<ConfigUpdater> {
        if !path.exists() {
            info(&format!("No config found at {path:?}, using defaults"));
            return Ok(ConfigUpdater::default());
        }

        let data = fs::read_to_string(path).with_context(|| format!("Could not read {path:?}"))?;
        let mut config = ConfigUpdater::deserialize(&data)?;
        config.download_dir = resolve_path(&config.download_dir);
        Ok(config)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

fn default_listing_url() -> String {
    DEFAULT_LISTING_URL.to_string()
}

fn default_listing_row() -> usize {
    DEFAULT_LISTING_ROW
}

fn default_apk_prefix() -> String {
    DEFAULT_APK_PREFIX.to_string()
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

fn default_user_agent() -> String {
    format!("kodi-updater/{}", env!("CARGO_PKG_VERSION"))
}

fn default_install_command() -> Vec<String> {
    ["adb", "install", "-r", "{apk}"].iter().map(|s| s.to_string()).collect()
}

pub fn default_config_path() -> PathBuf {
    get_conf_dir().join("config.toml")
}

fn default_download_dir() -> PathBuf {
    #[cfg(not(target_os = "android"))]
    {
        get_conf_dir().join(DOWNLOAD_FOLDER)
    }

    #[cfg(target_os = "android")]
    {
        match AndroidUtil::create().and_then(|util| util.get_external_storage_dir()) {
            Ok(dir) => dir.join(DOWNLOAD_FOLDER),
            Err(e) => {
                error(format!("Could not get external storage dir: {e:#}"));
                get_conf_dir().join(DOWNLOAD_FOLDER)
            }
        }
    }
}

pub fn get_conf_dir() -> PathBuf {
    #[cfg(not(target_os = "android"))]
    {
        match std::env::var("HOME") {
            Ok(home_dir) => PathBuf::from(home_dir).join(".config").join("kodi-updater"),
            Err(_) => PathBuf::from("."),
        }
    }

    #[cfg(target_os = "android")]
    {
        match AndroidUtil::create().and_then(|util| util.get_files_dir()) {
            Ok(dir) => dir,
            Err(e) => {
                error(format!("Could not get files dir: {e:#}"));
                PathBuf::from(".")
            }
        }
    }
}
