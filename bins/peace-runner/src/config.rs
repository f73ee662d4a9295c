// Runner configuration for peace
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_TOOLCHAIN: &str = "go";
pub const DEFAULT_TEST_FILE_MARKER: &str = "_test.go";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Toolchain executable invoked once per test
    pub toolchain: String,
    /// Workspace root; packages live under `<source_root>/src/<package>`
    pub source_root: Option<PathBuf>,
    /// File name fragment marking a test source file
    pub test_file_marker: String,
    /// Per-test timeout. `None` waits for the child indefinitely.
    pub timeout_ms: Option<u64>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            toolchain: DEFAULT_TOOLCHAIN.to_string(),
            source_root: None,
            test_file_marker: DEFAULT_TEST_FILE_MARKER.to_string(),
            timeout_ms: None,
        }
    }
}

impl RunnerConfig {
    /// Load runner configuration from a JSON file; missing keys keep their defaults
    pub fn load(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            bail!("Runner config file not found: {}", config_path.display());
        }

        let content = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;

        let config: RunnerConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", config_path.display()))?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.toolchain.trim().is_empty() {
            bail!("toolchain cannot be empty");
        }
        if self.test_file_marker.is_empty() {
            bail!("test_file_marker cannot be empty");
        }
        if self.timeout_ms == Some(0) {
            bail!("timeout_ms must be greater than zero when set");
        }
        Ok(())
    }

    /// Directory holding the package's sources
    pub fn package_dir(&self, package: &str) -> Result<PathBuf> {
        match &self.source_root {
            Some(root) => Ok(root.join("src").join(package)),
            None => bail!("No source root configured: set GOPATH or pass --source-root"),
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = RunnerConfig::default();
        assert_eq!(config.toolchain, "go");
        assert_eq!(config.test_file_marker, "_test.go");
        assert_eq!(config.timeout(), None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"timeout_ms": 1500, "source_root": "/opt/gopath"}}"#).unwrap();

        let config = RunnerConfig::load(file.path()).unwrap();
        assert_eq!(config.toolchain, "go");
        assert_eq!(config.timeout(), Some(Duration::from_millis(1500)));
        assert_eq!(
            config.package_dir("acme/widgets").unwrap(),
            PathBuf::from("/opt/gopath/src/acme/widgets")
        );
    }

    #[test]
    fn test_load_missing_file() {
        let err = RunnerConfig::load(Path::new("/nonexistent/peace.json")).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_load_rejects_zero_timeout() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"timeout_ms": 0}}"#).unwrap();
        assert!(RunnerConfig::load(file.path()).is_err());
    }

    #[test]
    fn test_package_dir_requires_root() {
        assert!(RunnerConfig::default().package_dir("pkg").is_err());
    }
}
