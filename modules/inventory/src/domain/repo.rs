use std::io;

/// Backing storage for the serialized inventory.
///
/// The store holds its lock across these calls, so implementations must be
/// synchronous and must not call back into the store.
pub trait InventoryFile: Send + Sync {
    /// Current contents, or `None` if nothing has been written yet.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read.
    fn read(&self) -> io::Result<Option<String>>;

    /// Replace the contents as a whole.
    ///
    /// # Errors
    /// Returns an error if the new contents could not be stored. The previous
    /// contents must remain intact in that case.
    fn write(&self, contents: &str) -> io::Result<()>;

    /// Human-readable location used in logs.
    fn describe(&self) -> String;
}
