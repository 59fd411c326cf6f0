use crate::common::info;
use crate::updater::service::Installer;
use anyhow::{anyhow, bail, Context};
use std::path::Path;
use std::process::Command;

pub const APK_PLACEHOLDER: &str = "{apk}";

/// Installs by running a host command, e.g. `adb install -r {apk}` to push the APK to a TV.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandInstaller {
    command: Vec<String>,
}

impl CommandInstaller {
    pub fn create(command: Vec<String>) -> anyhow::Result<CommandInstaller> {
        if command.is_empty() {
            bail!("Install command must not be empty");
        }
        Ok(CommandInstaller { command })
    }

    fn args_for(&self, apk: &str) -> Vec<String> {
        let args: Vec<String> =
            self.command[1..].iter().map(|arg| arg.replace(APK_PLACEHOLDER, apk)).collect();
        if self.command.iter().any(|arg| arg.contains(APK_PLACEHOLDER)) {
            args
        } else {
            args.into_iter().chain([apk.to_string()]).collect()
        }
    }
}

impl Installer for CommandInstaller {
    fn install(&self, apk: &Path) -> anyhow::Result<()> {
        let apk_str = apk.to_str().ok_or_else(|| anyhow!("Could not convert {apk:?} to string"))?;
        let program = &self.command[0];
        let args = self.args_for(apk_str);

        info(&format!("Installing {apk_str} via {program} {}", args.join(" ")));
        let output = Command::new(program)
            .args(&args)
            .output()
            .with_context(|| format!("Could not execute {program}"))?;

        if !output.status.success() {
            bail!(
                "{program} exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(())
    }
}
