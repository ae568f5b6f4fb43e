//! Migration file discovery.

use std::path::Path;

use tracing::debug;
use walkdir::WalkDir;

use crate::config::MigrationConfig;
use crate::error::{MigrateError, Result};

/// Lists migration scripts under the configured directory.
///
/// The walk is recursive. Names are relative to the directory, use `/`
/// as separator and come back sorted so files run in name order.
pub fn scan(config: &MigrationConfig) -> Result<Vec<String>> {
    let root = config.dir.as_path();
    let mut files = Vec::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|e| MigrateError::Scan {
            path: root.to_path_buf(),
            message: e.to_string(),
        })?;

        if !entry.file_type().is_file() || !has_extension(entry.path(), &config.extension) {
            continue;
        }

        let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        files.push(name);
    }

    files.sort();
    debug!(dir = %root.display(), count = files.len(), "Scanned migration directory");
    Ok(files)
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension().is_some_and(|ext| ext == extension)
}
