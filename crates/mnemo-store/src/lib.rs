//! File-backed memory storage scoped to a working directory ("project").
//!
//! On-disk layout, relative to the working directory:
//!
//! ```text
//! .mnemo/
//!   project_id     — raw text: the project UUID, written once
//!   memories.json  — {"project_id": "...", "memories": [...]}
//!   store.lock     — advisory lock taken around each mutating cycle
//! ```
//!
//! The collection file is the single source of truth: every operation
//! re-reads it, applies one mutation in memory, and atomically replaces
//! it via temp-file-then-rename. Readers always observe either the old
//! or the new complete state.
//!
//! Single-writer by design. The advisory flock narrows (but does not
//! fully transactionalize) concurrent multi-process access.

mod identity;
mod lock;
mod store;

pub use identity::{MEMORIES_FILE, PROJECT_ID_FILE, ProjectPaths, STATE_DIR_NAME};
pub use store::{MemoryCollection, MemoryStore};
