/// Platform-specific location of the configuration file
///
/// Uses the `dirs` crate so Windows, macOS, and Linux (XDG) all resolve to
/// their native configuration directory.
use std::path::PathBuf;

/// Directory name used under the platform configuration directory
const APP_DIR: &str = "daily-changelog";

/// Platform-agnostic path utilities
pub struct PlatformPaths;

impl PlatformPaths {
    /// Get the platform configuration directory
    ///
    /// - Windows: %APPDATA%
    /// - macOS: ~/Library/Application Support
    /// - Linux/Unix: $XDG_CONFIG_HOME or ~/.config
    ///
    /// Falls back to the current directory when no home is known.
    pub fn config_dir() -> PathBuf {
        dirs::config_dir().unwrap_or_else(|| PathBuf::from("."))
    }

    /// Returns: {config_dir}/daily-changelog
    pub fn project_config_dir() -> PathBuf {
        Self::config_dir().join(APP_DIR)
    }

    /// Returns: {config_dir}/daily-changelog/config.toml
    pub fn default_config_path() -> PathBuf {
        Self::project_config_dir().join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_dir_not_empty() {
        let dir = PlatformPaths::config_dir();
        assert!(!dir.as_os_str().is_empty());
    }

    #[test]
    fn test_project_config_dir_is_subdirectory() {
        let base = PlatformPaths::config_dir();
        let project = PlatformPaths::project_config_dir();
        assert!(project.starts_with(&base));
        assert!(project.ends_with(APP_DIR));
    }

    #[test]
    fn test_default_config_path() {
        let path = PlatformPaths::default_config_path();
        assert!(path.to_string_lossy().contains("daily-changelog"));
        assert!(path.ends_with("config.toml"));
    }
}
