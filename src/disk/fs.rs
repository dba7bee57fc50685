//! File Store Module
//!
//! The minimal filesystem contract the disk tier runs on, plus the
//! `std::fs` implementation.

use std::fmt::Debug;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use filetime::FileTime;
use tempfile::NamedTempFile;

// == File Meta ==
/// One regular file found by `list`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMeta {
    pub name: String,
    pub len: u64,
    /// Last modification time, Unix milliseconds
    pub modified_ms: u64,
}

// == File Store Trait ==
/// Filesystem operations used by the disk tier.
pub trait FileStore: Send + Sync + Debug {
    fn create_dir_all(&self, dir: &Path) -> io::Result<()>;

    /// Replaces the file at `path` with `bytes`. Readers never see a partial write.
    fn write_bytes(&self, path: &Path, bytes: &[u8]) -> io::Result<()>;

    fn read_bytes(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Deletes a file. `Ok(false)` if it was already gone.
    fn delete(&self, path: &Path) -> io::Result<bool>;

    fn exists(&self, path: &Path) -> bool;

    /// Regular files directly inside `dir`.
    fn list(&self, dir: &Path) -> io::Result<Vec<FileMeta>>;

    fn modified_ms(&self, path: &Path) -> io::Result<u64>;

    fn set_modified_ms(&self, path: &Path, millis: u64) -> io::Result<()>;
}

// == Std File Store ==
/// `FileStore` backed by the local filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdFileStore;

impl FileStore for StdFileStore {
    fn create_dir_all(&self, dir: &Path) -> io::Result<()> {
        fs::create_dir_all(dir)
    }

    fn write_bytes(&self, path: &Path, bytes: &[u8]) -> io::Result<()> {
        let parent = parent_dir(path);
        let mut tmp = NamedTempFile::new_in(&parent)?;
        tmp.write_all(bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|err| err.error)?;
        Ok(())
    }

    fn read_bytes(&self, path: &Path) -> io::Result<Vec<u8>> {
        fs::read(path)
    }

    fn delete(&self, path: &Path) -> io::Result<bool> {
        match fs::remove_file(path) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err),
        }
    }

    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn list(&self, dir: &Path) -> io::Result<Vec<FileMeta>> {
        let mut files = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let meta = entry.metadata()?;
            if !meta.is_file() {
                continue;
            }
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            let modified_ms = meta.modified().map(system_time_ms).unwrap_or(0);
            files.push(FileMeta {
                name,
                len: meta.len(),
                modified_ms,
            });
        }
        Ok(files)
    }

    fn modified_ms(&self, path: &Path) -> io::Result<u64> {
        Ok(system_time_ms(fs::metadata(path)?.modified()?))
    }

    fn set_modified_ms(&self, path: &Path, millis: u64) -> io::Result<()> {
        let time = UNIX_EPOCH
            .checked_add(Duration::from_millis(millis))
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "mtime out of range"))?;
        filetime::set_file_mtime(path, FileTime::from_system_time(time))
    }
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn system_time_ms(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_read_delete() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("cdu_file");
        let store = StdFileStore;

        store.write_bytes(&path, b"hello").unwrap();
        assert!(store.exists(&path));
        assert_eq!(store.read_bytes(&path).unwrap(), b"hello");

        store.write_bytes(&path, b"replaced").unwrap();
        assert_eq!(store.read_bytes(&path).unwrap(), b"replaced");

        assert!(store.delete(&path).unwrap());
        assert!(!store.delete(&path).unwrap());
        assert!(!store.exists(&path));
    }

    #[test]
    fn test_list_skips_directories() {
        let tmp = tempfile::tempdir().unwrap();
        let store = StdFileStore;
        store.write_bytes(&tmp.path().join("a"), b"123").unwrap();
        store.create_dir_all(&tmp.path().join("sub")).unwrap();

        let files = store.list(tmp.path()).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name, "a");
        assert_eq!(files[0].len, 3);
    }

    #[test]
    fn test_set_modified_round_trip() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("f");
        let store = StdFileStore;
        store.write_bytes(&path, b"x").unwrap();

        store.set_modified_ms(&path, 1_600_000_000_000).unwrap();
        assert_eq!(store.modified_ms(&path).unwrap(), 1_600_000_000_000);
    }
}
