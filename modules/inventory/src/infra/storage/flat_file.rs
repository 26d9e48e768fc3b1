//! Inventory file on the local filesystem.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::domain::repo::InventoryFile;

/// Writes go to a temporary file in the same directory which then replaces
/// the target, so a crash mid-write never leaves a truncated file behind.
#[derive(Debug, Clone)]
pub struct FlatFile {
    path: PathBuf,
}

impl FlatFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn parent_dir(&self) -> &Path {
        match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        }
    }
}

impl InventoryFile for FlatFile {
    fn read(&self) -> io::Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn write(&self, contents: &str) -> io::Result<()> {
        let dir = self.parent_dir();
        fs::create_dir_all(dir)?;

        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(contents.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let file = FlatFile::new(dir.path().join("inventory.csv"));
        assert!(file.read().unwrap().is_none());
    }

    #[test]
    fn write_replaces_contents_and_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let file = FlatFile::new(dir.path().join("nested").join("inventory.csv"));

        file.write("1\nA1,Anvil,1.00,1\n").unwrap();
        file.write("0\n").unwrap();

        assert_eq!(file.read().unwrap().as_deref(), Some("0\n"));
        let leftovers = fs::read_dir(dir.path().join("nested")).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn unreadable_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        // a directory cannot be read as text
        let file = FlatFile::new(dir.path());
        assert!(file.read().is_err());
    }

    #[test]
    fn describe_shows_the_path() {
        let file = FlatFile::new("data/inventory.csv");
        assert!(file.describe().ends_with("inventory.csv"));
        assert_eq!(file.parent_dir(), Path::new("data"));
        assert_eq!(FlatFile::new("inventory.csv").parent_dir(), Path::new("."));
    }
}
