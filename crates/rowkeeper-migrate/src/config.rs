//! Migration discovery settings.

use std::path::PathBuf;

/// Default directory holding migration scripts.
pub const DEFAULT_MIGRATION_DIR: &str = "migration";

/// Default extension of migration scripts.
pub const DEFAULT_EXTENSION: &str = "sql";

/// Where migration scripts are looked up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationConfig {
    /// Root directory, scanned recursively.
    pub dir: PathBuf,
    /// File extension of scripts, without the dot.
    pub extension: String,
}

impl MigrationConfig {
    /// Creates a configuration for a directory with the default extension.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            extension: DEFAULT_EXTENSION.to_string(),
        }
    }

    /// Sets the script extension.
    #[must_use]
    pub fn extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self::new(DEFAULT_MIGRATION_DIR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MigrationConfig::default();
        assert_eq!(config.dir, PathBuf::from("migration"));
        assert_eq!(config.extension, "sql");
    }

    #[test]
    fn test_builder() {
        let config = MigrationConfig::new("/srv/db").extension("ddl");
        assert_eq!(config.dir, PathBuf::from("/srv/db"));
        assert_eq!(config.extension, "ddl");
    }
}
