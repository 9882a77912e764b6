//! Loading and writing configuration files on disk.

use anyhow::{anyhow, Context, Result};
use fs2::FileExt;
use std::fs::{self, File};
use std::path::Path;
use tracing::{debug, warn};

use crate::error::ConfigError;
use crate::parser::ConfigFile;
use crate::record::TrainConfig;
use crate::value::Value;

fn is_json(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "json")
}

/// Applies a configuration file onto `config`. `.json` files hold a flat
/// object of options; anything else is read as an assignment file.
pub fn apply_file(path: &Path, config: &mut TrainConfig) -> Result<()> {
    let src = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;

    if is_json(path) {
        let map: serde_json::Map<String, serde_json::Value> = serde_json::from_str(&src)
            .with_context(|| format!("{}: not a JSON object", path.display()))?;
        for (key, json) in &map {
            let value = match TrainConfig::kind_of(key) {
                None => Err(ConfigError::UnknownKey(key.clone())),
                Some(expected) => Value::from_json(json).ok_or_else(|| ConfigError::TypeMismatch {
                    key: key.clone(),
                    expected,
                    found: json.to_string(),
                }),
            };
            value
                .and_then(|v| config.set(key, v))
                .with_context(|| format!("{}", path.display()))?;
        }
        debug!("Applied {} options from {}", map.len(), path.display());
        return Ok(());
    }

    let file = ConfigFile::parse(&src).with_context(|| format!("{}", path.display()))?;
    for key in file.duplicate_keys() {
        warn!("{}: `{}` is assigned more than once, last one wins", path.display(), key);
    }
    file.apply(config)
        .with_context(|| format!("{}", path.display()))?;
    debug!(
        "Applied {} assignments from {}",
        file.assignments.len(),
        path.display()
    );
    Ok(())
}

/// Loads a configuration file on top of the trainer defaults.
pub fn load_config(path: &Path) -> Result<TrainConfig> {
    let mut config = TrainConfig::default();
    apply_file(path, &mut config)?;
    Ok(config)
}

/// Writes `contents` while holding an exclusive lock on `<path>.lock`, so two
/// writers never interleave. The lock file is left in place: unlinking it
/// would let a later writer lock a fresh inode while another still waits on
/// the old one.
pub fn write_config(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let file_name = path
        .file_name()
        .ok_or_else(|| anyhow!("{} is not a file path", path.display()))?;
    let mut lock_name = file_name.to_os_string();
    lock_name.push(".lock");
    let lock_path = path.with_file_name(lock_name);

    let lock_file = File::create(&lock_path)?;
    lock_file.lock_exclusive()?;
    let written = fs::write(path, contents)
        .with_context(|| format!("Failed to write {}", path.display()));
    lock_file.unlock()?;
    written
}
