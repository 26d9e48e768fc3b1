pub mod flat_file;
pub mod memory;

pub use flat_file::FlatFile;
pub use memory::MemoryFile;
