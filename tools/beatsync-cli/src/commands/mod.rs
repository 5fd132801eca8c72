pub mod beats;
pub mod compile;
pub mod zoom;

use std::path::Path;

use anyhow::Context;
use beatsync_common::error::BeatsyncError;
use serde::Serialize;

/// Fail with [`BeatsyncError::FileNotFound`] unless `path` exists.
pub fn ensure_exists(path: &Path) -> anyhow::Result<()> {
    if !path.exists() {
        return Err(BeatsyncError::FileNotFound {
            path: path.to_path_buf(),
        }
        .into());
    }
    Ok(())
}

/// Read a UTF-8 input file.
pub fn read_input(path: &Path) -> anyhow::Result<String> {
    ensure_exists(path)?;
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

/// Write `value` as pretty JSON to `output`, or to stdout when absent.
pub fn write_json<T: Serialize>(value: &T, output: Option<&Path>) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("Wrote {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}
