//! Raw request payloads are kept on disk for auditing. Nothing here reads
//! them back or cleans them up

use crate::error::DetectError;
use chrono::{DateTime, Utc};
use rand::Rng;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// The directory received images are written to
#[derive(Debug)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    /// Use `dir` as the artifact directory, creating it if needed
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, DetectError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(ArtifactStore { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `bytes` to a fresh, uniquely named file and return its path
    pub fn persist(&self, bytes: &[u8]) -> Result<PathBuf, DetectError> {
        let name = artifact_name(Utc::now(), rand::thread_rng().gen());
        let path = self.dir.join(name);
        fs::write(&path, bytes)?;
        debug!("stored {} bytes at {}", bytes.len(), path.display());
        Ok(path)
    }
}

/// `<YYYYMMDDTHHMMSSZ>_<32 hex digits>.jpg`, whatever the real format is
pub fn artifact_name(at: DateTime<Utc>, id: u128) -> String {
    format!("{}_{:032x}.jpg", at.format("%Y%m%dT%H%M%SZ"), id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn name_format() {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        assert_eq!(
            artifact_name(at, 0xabc),
            "20240309T070501Z_00000000000000000000000000000abc.jpg"
        );
    }

    #[test]
    fn open_creates_nested_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("a").join("received");
        let store = ArtifactStore::open(&dir).unwrap();
        assert!(store.dir().is_dir());
    }

    #[test]
    fn persist_writes_distinct_files() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ArtifactStore::open(tmp.path()).unwrap();

        let first = store.persist(b"same bytes").unwrap();
        let second = store.persist(b"same bytes").unwrap();

        assert_ne!(first, second);
        assert_eq!(fs::read(&first).unwrap(), b"same bytes");
        assert_eq!(fs::read_dir(tmp.path()).unwrap().count(), 2);
    }

    #[test]
    fn persist_fails_when_dir_is_gone() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ArtifactStore::open(tmp.path().join("gone")).unwrap();
        fs::remove_dir(store.dir()).unwrap();

        let err = store.persist(b"x").unwrap_err();
        assert!(matches!(err, DetectError::Io(_)));
    }
}
