use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::repository::StorageError;

/// Filesystem-like source of image files.
pub trait ImageSource: Send + Sync {
    /// Names of the regular files directly inside `dir`. A missing directory
    /// lists as empty.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Io` if the directory exists but cannot be read.
    fn list_files(&self, dir: &Path) -> Result<Vec<String>, StorageError>;

    /// Raw bytes of one file.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` or `StorageError::Io`.
    fn read(&self, path: &Path) -> Result<Vec<u8>, StorageError>;
}

/// Reads images from the local filesystem.
#[derive(Debug, Clone, Default)]
pub struct DirectoryImageSource;

impl DirectoryImageSource {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl ImageSource for DirectoryImageSource {
    fn list_files(&self, dir: &Path) -> Result<Vec<String>, StorageError> {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
        Ok(names)
    }

    fn read(&self, path: &Path) -> Result<Vec<u8>, StorageError> {
        fs::read(path).map_err(|err| {
            if err.kind() == std::io::ErrorKind::NotFound {
                StorageError::NotFound
            } else {
                err.into()
            }
        })
    }
}

/// In-memory image source for tests.
#[derive(Clone, Default)]
pub struct InMemoryImageSource {
    files: Arc<Mutex<HashMap<PathBuf, Vec<u8>>>>,
}

impl InMemoryImageSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file at `dir/name`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the lock is poisoned.
    pub fn insert(&self, dir: &Path, name: &str, bytes: Vec<u8>) -> Result<(), StorageError> {
        let mut guard = self
            .files
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(dir.join(name), bytes);
        Ok(())
    }
}

impl ImageSource for InMemoryImageSource {
    fn list_files(&self, dir: &Path) -> Result<Vec<String>, StorageError> {
        let guard = self
            .files
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut names: Vec<String> = guard
            .keys()
            .filter(|path| path.parent() == Some(dir))
            .filter_map(|path| path.file_name().and_then(|n| n.to_str()).map(str::to_string))
            .collect();
        names.sort();
        Ok(names)
    }

    fn read(&self, path: &Path) -> Result<Vec<u8>, StorageError> {
        let guard = self
            .files
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.get(path).cloned().ok_or(StorageError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directory_source_lists_only_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.jpg"), b"a").unwrap();
        fs::write(dir.path().join("notes.txt"), b"n").unwrap();
        fs::create_dir(dir.path().join("nested.png")).unwrap();

        let source = DirectoryImageSource::new();
        let mut names = source.list_files(dir.path()).unwrap();
        names.sort();
        assert_eq!(names, vec!["a.jpg".to_string(), "notes.txt".to_string()]);
        assert_eq!(source.read(&dir.path().join("a.jpg")).unwrap(), b"a");
    }

    #[test]
    fn missing_directory_lists_empty() {
        let dir = tempfile::tempdir().unwrap();
        let source = DirectoryImageSource::new();
        assert!(source.list_files(&dir.path().join("absent")).unwrap().is_empty());
        assert!(matches!(
            source.read(&dir.path().join("absent.jpg")),
            Err(StorageError::NotFound)
        ));
    }

    #[test]
    fn in_memory_source_scopes_by_directory() {
        let source = InMemoryImageSource::new();
        source.insert(Path::new("images/set1"), "a.jpg", vec![1]).unwrap();
        source.insert(Path::new("images/set2"), "b.jpg", vec![2]).unwrap();

        let names = source.list_files(Path::new("images/set1")).unwrap();
        assert_eq!(names, vec!["a.jpg".to_string()]);
        assert_eq!(source.read(Path::new("images/set2/b.jpg")).unwrap(), vec![2]);
    }
}
