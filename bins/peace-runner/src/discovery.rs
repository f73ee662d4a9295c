// Test file discovery: lists a package directory and extracts identifiers
// from every test source file, in file-name order.

use crate::extractor::IdentifierExtractor;
use anyhow::{Context, Result};
use peace_common::types::TestIdentifier;
use std::path::Path;
use tokio::fs;
use tracing::{error, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredFile {
    pub name: String,
    pub identifiers: Vec<TestIdentifier>,
}

/// Regular files whose name contains `marker`, sorted by name
pub async fn list_test_files(dir: &Path, marker: &str) -> Result<Vec<String>> {
    let mut entries = fs::read_dir(dir)
        .await
        .with_context(|| format!("Failed to read directory {}", dir.display()))?;

    let mut names = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .with_context(|| format!("Failed to read directory {}", dir.display()))?
    {
        let file_type = entry
            .file_type()
            .await
            .with_context(|| format!("Failed to stat {}", entry.path().display()))?;
        if file_type.is_dir() {
            continue;
        }

        let name = entry.file_name().to_string_lossy().into_owned();
        if name.contains(marker) {
            names.push(name);
        }
    }

    names.sort();
    Ok(names)
}

/// Scan every test file in `dir`. Any I/O failure aborts the whole scan.
pub async fn discover<X: IdentifierExtractor>(
    dir: &Path,
    marker: &str,
    extractor: &X,
    logging: bool,
) -> Result<Vec<DiscoveredFile>> {
    let names = match list_test_files(dir, marker).await {
        Ok(names) => names,
        Err(e) => {
            if logging {
                error!(dir = %dir.display(), "Error while reading directory");
            }
            return Err(e);
        }
    };

    let mut files = Vec::with_capacity(names.len());
    for name in names {
        if logging {
            info!("File: {}", name);
        }

        let path = dir.join(&name);
        let raw = match fs::read(&path).await {
            Ok(raw) => raw,
            Err(e) => {
                if logging {
                    error!(file = %path.display(), "Error while reading file");
                }
                return Err(e).with_context(|| format!("Failed to read {}", path.display()));
            }
        };

        let identifiers = extractor.extract(&String::from_utf8_lossy(&raw));
        files.push(DiscoveredFile { name, identifiers });
    }

    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::PatternExtractor;
    use std::fs as std_fs;

    #[tokio::test]
    async fn test_only_marked_files_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        std_fs::write(dir.path().join("b_test.go"), "func TestB(t *testing.T) {}").unwrap();
        std_fs::write(dir.path().join("a_test.go"), "func TestA(t *testing.T) {}").unwrap();
        std_fs::write(dir.path().join("main.go"), "func TestNotScanned() {}").unwrap();
        std_fs::create_dir(dir.path().join("dir_test.go")).unwrap();

        let names = list_test_files(dir.path(), "_test.go").await.unwrap();
        assert_eq!(names, vec!["a_test.go", "b_test.go"]);

        let extractor = PatternExtractor::new().unwrap();
        let files = discover(dir.path(), "_test.go", &extractor, false).await.unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].identifiers, vec![TestIdentifier::plain("TestA")]);
        assert_eq!(files[1].identifiers, vec![TestIdentifier::plain("TestB")]);
    }

    #[tokio::test]
    async fn test_missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");

        let extractor = PatternExtractor::new().unwrap();
        let err = discover(&missing, "_test.go", &extractor, true).await.unwrap_err();
        assert!(err.to_string().contains("Failed to read directory"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_unreadable_test_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std_fs::write(dir.path().join("a_test.go"), "func TestA(t *testing.T) {}").unwrap();
        std_fs::create_dir(dir.path().join("fixtures")).unwrap();
        std::os::unix::fs::symlink(dir.path().join("fixtures"), dir.path().join("x_test.go"))
            .unwrap();

        let extractor = PatternExtractor::new().unwrap();
        let err = discover(dir.path(), "_test.go", &extractor, true).await.unwrap_err();
        assert!(err.to_string().contains("x_test.go"));
    }

    #[tokio::test]
    async fn test_non_utf8_file_is_still_scanned() {
        let dir = tempfile::tempdir().unwrap();
        let mut raw = b"func TestOk(t *testing.T) {}\n// ".to_vec();
        raw.extend_from_slice(&[0xff, 0xfe]);
        std_fs::write(dir.path().join("x_test.go"), raw).unwrap();

        let extractor = PatternExtractor::new().unwrap();
        let files = discover(dir.path(), "_test.go", &extractor, false).await.unwrap();
        assert_eq!(files[0].identifiers, vec![TestIdentifier::plain("TestOk")]);
    }
}
