//! Discovery of previously executed experiments
//!
//! The submission tool records every experiment it starts as a file named
//! after the experiment id in the executed-experiments directory.

use crate::error::Result;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Experiment ids recorded in `dir`, sorted
pub fn discover(dir: &Path) -> Result<Vec<String>> {
    let mut experiment_ids = Vec::new();

    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            experiment_ids.push(stem.to_string());
        }
    }

    experiment_ids.sort();
    debug!("Found {} executed experiments in {}", experiment_ids.len(), dir.display());

    Ok(experiment_ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_discover_uses_file_stems() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("b-exp.json"), "{}").unwrap();
        fs::write(temp_dir.path().join("a-exp.json"), "{}").unwrap();
        fs::create_dir(temp_dir.path().join("not-an-experiment")).unwrap();

        let ids = discover(temp_dir.path()).unwrap();

        assert_eq!(ids, vec!["a-exp".to_string(), "b-exp".to_string()]);
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        assert!(discover(&temp_dir.path().join("missing")).is_err());
    }
}
