use crate::types::ALLOWED_TYPES_LIST;

/// Closed error taxonomy for memory operations.
///
/// Every variant maps 1:1 to a wire error code via [`MemoryError::code`];
/// callers that cross a protocol boundary collapse any uncategorized
/// failure to `storage_error` rather than leaking internals.
#[derive(thiserror::Error, Debug)]
pub enum MemoryError {
    #[error("Invalid memory type: {0}. Allowed types: {ALLOWED_TYPES_LIST}")]
    InvalidMemoryType(String),

    #[error("Missing required field: {0}")]
    MissingRequiredField(&'static str),

    #[error("Memory not found: {0}")]
    MemoryNotFound(String),

    #[error("Project not activated. Call activate_project first.")]
    ProjectNotActivated,

    #[error("Storage error: {0}")]
    Storage(String),
}

impl MemoryError {
    /// Wire error code for this failure.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidMemoryType(_) => "invalid_memory_type",
            Self::MissingRequiredField(_) => "missing_required_field",
            Self::MemoryNotFound(_) => "memory_not_found",
            Self::ProjectNotActivated => "project_not_activated",
            Self::Storage(_) => "storage_error",
        }
    }

    /// Wrap a low-level failure as a storage error.
    pub fn storage(message: impl std::fmt::Display) -> Self {
        Self::Storage(message.to_string())
    }
}
