// RemoteKeyStore adapters

pub mod json_file;
pub mod memory;

pub use json_file::JsonFileKeyStore;
pub use memory::InMemoryKeyStore;
