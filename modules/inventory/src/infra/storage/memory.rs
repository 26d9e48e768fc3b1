//! In-memory inventory file for tests and ephemeral runs.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use crate::domain::repo::InventoryFile;

#[derive(Debug, Default)]
pub struct MemoryFile {
    contents: Mutex<Option<String>>,
    fail_writes: AtomicBool,
}

impl MemoryFile {
    pub fn with_contents(contents: impl Into<String>) -> Self {
        Self {
            contents: Mutex::new(Some(contents.into())),
            fail_writes: AtomicBool::new(false),
        }
    }

    /// Last successfully written contents.
    #[must_use]
    pub fn contents(&self) -> Option<String> {
        self.contents.lock().clone()
    }

    /// Make subsequent writes fail with a permission error.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

impl InventoryFile for MemoryFile {
    fn read(&self) -> io::Result<Option<String>> {
        Ok(self.contents())
    }

    fn write(&self, contents: &str) -> io::Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "inventory file is read-only",
            ));
        }
        *self.contents.lock() = Some(contents.to_owned());
        Ok(())
    }

    fn describe(&self) -> String {
        "<memory>".to_owned()
    }
}
