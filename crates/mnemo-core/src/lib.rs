pub mod error;
pub mod types;

pub use error::MemoryError;
pub use types::{ALLOWED_TYPES_LIST, Memory, MemoryMetadata, MemoryType, OutputFormat};
