pub mod postgrest;
pub mod memory;

pub use postgrest::PostgrestStore;
pub use memory::MemoryBackend;
