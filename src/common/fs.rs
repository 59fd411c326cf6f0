use crate::common::logging::error;
use anyhow::{bail, Context};
use std::path::{Path, PathBuf};
use std::{env, fs};

pub(crate) fn resolve_path(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }

    let mut full_path = match env::current_dir() {
        Ok(p) => p,
        Err(e) => {
            error(format!("Could not get current directory: {e}"));
            return path.to_path_buf();
        }
    };
    full_path.push(path);
    match fs::canonicalize(&full_path) {
        Ok(p) => p,
        Err(e) => {
            error(format!("Could not canonicalize {full_path:?}: {e}"));
            full_path
        }
    }
}

/// Make sure `dir` exists as an empty directory.
///
/// A regular file occupying the path is deleted, a missing directory is created and the contents
/// of an existing directory are purged.
pub(crate) fn prepare_download_dir(dir: &Path) -> anyhow::Result<()> {
    if dir.exists() && !dir.is_dir() {
        fs::remove_file(dir).with_context(|| format!("Can not delete file: {dir:?}"))?;
    }

    if !dir.exists() {
        return fs::create_dir_all(dir)
            .with_context(|| format!("Can not create download folder: {dir:?}"));
    }

    purge_dir(dir)
}

fn purge_dir(dir: &Path) -> anyhow::Result<()> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => bail!("Can not read download folder {dir:?}: {e}"),
    };

    for entry in entries {
        let path = entry.with_context(|| format!("Can not read entry of {dir:?}"))?.path();
        if path.is_dir() {
            fs::remove_dir_all(&path).with_context(|| format!("Can not delete folder: {path:?}"))?;
        } else {
            fs::remove_file(&path).with_context(|| format!("Can not delete file: {path:?}"))?;
        }
    }
    Ok(())
}
