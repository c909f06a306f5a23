//! Build manifests.
//!
//! Each supported target build ships a `<build>.txt` file listing the URL of
//! every package in that build, one per line.

use std::path::PathBuf;

use crate::selection::CandidateList;
use crate::{Result, UpdaterError};

/// Directory of `<build>.txt` manifests
#[derive(Debug, Clone)]
pub struct ManifestStore {
    dir: PathBuf,
}

impl ManifestStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, build: &str) -> PathBuf {
        self.dir.join(format!("{}.txt", build))
    }

    /// Read the manifest text for a build
    pub fn read(&self, build: &str) -> Result<String> {
        let path = self.path_for(build);
        if !path.is_file() {
            return Err(UpdaterError::ManifestNotFound {
                build: build.to_string(),
                path,
            });
        }
        Ok(std::fs::read_to_string(&path)?)
    }

    /// Load the manifest for a build as a candidate listing
    pub fn load(&self, build: &str) -> Result<CandidateList> {
        let candidates = CandidateList::from_manifest(&self.read(build)?);
        log::debug!("Manifest {} lists {} packages", build, candidates.len());
        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_manifest() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("15063.297.txt"),
            "http://host/a.cab\nhttp://host/b.cab\n",
        )
        .unwrap();

        let store = ManifestStore::new(dir.path());
        let candidates = store.load("15063.297").unwrap();
        assert_eq!(candidates.len(), 2);
        assert!(candidates.find("b.cab").is_some());
    }

    #[test]
    fn test_missing_manifest() {
        let dir = TempDir::new().unwrap();
        let store = ManifestStore::new(dir.path());
        let err = store.load("1.0").unwrap_err();
        assert!(matches!(err, UpdaterError::ManifestNotFound { ref build, .. } if build == "1.0"));
    }
}
