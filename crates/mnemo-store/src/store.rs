use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use mnemo_core::{Memory, MemoryError, MemoryMetadata, MemoryType};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::identity::{self, ProjectPaths};
use crate::lock::StoreLock;

/// On-disk shape of memories.json: the project identifier plus the
/// record sequence in insertion order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryCollection {
    pub project_id: String,
    pub memories: Vec<Memory>,
}

/// File-backed memory store for one working directory.
///
/// Construct one per project and call [`MemoryStore::activate`] before
/// any record operation; every other operation fails with
/// `project_not_activated` until then. The store holds no cache: each
/// call re-reads memories.json, applies at most one mutation, and
/// atomically replaces the file.
#[derive(Debug)]
pub struct MemoryStore {
    paths: ProjectPaths,
    /// In-memory activation state; `Some` once `activate` has succeeded.
    project_id: Option<String>,
}

impl MemoryStore {
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            paths: ProjectPaths::new(working_dir),
            project_id: None,
        }
    }

    pub fn working_dir(&self) -> &Path {
        &self.paths.working_dir
    }

    /// Project id, if activation has happened.
    pub fn project_id(&self) -> Option<&str> {
        self.project_id.as_deref()
    }

    /// Activate the project: load or create its persistent identity and
    /// make sure the backing collection file exists.
    ///
    /// Idempotent; re-activating the same directory yields the same id.
    pub fn activate(&mut self) -> Result<String, MemoryError> {
        let project_id = identity::resolve_project_id(&self.paths)?;

        if !self.paths.memories_path.exists() {
            self.write_collection(&MemoryCollection {
                project_id: project_id.clone(),
                memories: Vec::new(),
            })?;
        }

        debug!(project_id = %project_id, dir = %self.paths.working_dir.display(), "project activated");
        self.project_id = Some(project_id.clone());
        Ok(project_id)
    }

    /// Create a new memory and return its id.
    ///
    /// `title` must be non-empty and `memory_type` must name one of the
    /// allowed types; both are checked before anything touches disk.
    /// `content` may be empty.
    pub fn store_memory(
        &self,
        title: &str,
        memory_type: &str,
        content: &str,
    ) -> Result<String, MemoryError> {
        let project_id = self.ensure_activated()?;

        if title.is_empty() {
            return Err(MemoryError::MissingRequiredField("title"));
        }
        let memory_type = MemoryType::parse(memory_type)?;

        let memory = Memory {
            id: Uuid::new_v4(),
            title: title.to_string(),
            memory_type,
            content: content.to_string(),
            created_at: Utc::now(),
            updated_at: None,
        };
        let memory_id = memory.id.to_string();

        let _lock = StoreLock::acquire(&self.paths.state_dir)?;
        let mut collection = self.read_collection(project_id)?;
        collection.memories.push(memory);
        self.write_collection(&collection)?;

        debug!(memory_id = %memory_id, %memory_type, "stored memory");
        Ok(memory_id)
    }

    /// Retrieve a full memory record by id.
    pub fn get_memory(&self, memory_id: &str) -> Result<Memory, MemoryError> {
        let project_id = self.ensure_activated()?;

        let Some(target) = parse_memory_id(memory_id) else {
            return Err(MemoryError::MemoryNotFound(memory_id.to_string()));
        };

        let collection = self.read_collection(project_id)?;
        collection
            .memories
            .into_iter()
            .find(|memory| memory.id == target)
            .ok_or_else(|| MemoryError::MemoryNotFound(memory_id.to_string()))
    }

    /// List memory metadata (no content), optionally filtered by type.
    ///
    /// Returns an empty list, not an error, when nothing matches. Order
    /// is the insertion order of the matching records.
    pub fn list_memories(
        &self,
        type_filter: Option<MemoryType>,
    ) -> Result<Vec<MemoryMetadata>, MemoryError> {
        let project_id = self.ensure_activated()?;

        let collection = self.read_collection(project_id)?;
        Ok(collection
            .memories
            .iter()
            .filter(|memory| type_filter.is_none_or(|wanted| memory.memory_type == wanted))
            .map(Memory::metadata)
            .collect())
    }

    /// Replace a memory's content and stamp `updated_at`.
    ///
    /// `id`, `title`, `type`, and `created_at` are untouched.
    pub fn update_memory(&self, memory_id: &str, content: &str) -> Result<(), MemoryError> {
        let project_id = self.ensure_activated()?;

        let Some(target) = parse_memory_id(memory_id) else {
            return Err(MemoryError::MemoryNotFound(memory_id.to_string()));
        };

        let _lock = StoreLock::acquire(&self.paths.state_dir)?;
        let mut collection = self.read_collection(project_id)?;

        let Some(memory) = collection
            .memories
            .iter_mut()
            .find(|memory| memory.id == target)
        else {
            return Err(MemoryError::MemoryNotFound(memory_id.to_string()));
        };

        memory.content = content.to_string();
        memory.updated_at = Some(Utc::now());
        self.write_collection(&collection)?;

        debug!(memory_id = %memory_id, "updated memory content");
        Ok(())
    }

    /// Remove a memory by id, preserving the order of the rest.
    pub fn delete_memory(&self, memory_id: &str) -> Result<(), MemoryError> {
        let project_id = self.ensure_activated()?;

        let Some(target) = parse_memory_id(memory_id) else {
            return Err(MemoryError::MemoryNotFound(memory_id.to_string()));
        };

        let _lock = StoreLock::acquire(&self.paths.state_dir)?;
        let mut collection = self.read_collection(project_id)?;

        let before = collection.memories.len();
        collection.memories.retain(|memory| memory.id != target);
        if collection.memories.len() == before {
            return Err(MemoryError::MemoryNotFound(memory_id.to_string()));
        }

        self.write_collection(&collection)?;

        debug!(memory_id = %memory_id, "deleted memory");
        Ok(())
    }

    fn ensure_activated(&self) -> Result<&str, MemoryError> {
        self.project_id
            .as_deref()
            .ok_or(MemoryError::ProjectNotActivated)
    }

    /// Read the whole collection. A missing file (deleted out-of-band
    /// after activation) reads as an empty collection; malformed JSON is
    /// a hard storage error, never silently repaired.
    fn read_collection(&self, project_id: &str) -> Result<MemoryCollection, MemoryError> {
        if !self.paths.memories_path.exists() {
            return Ok(MemoryCollection {
                project_id: project_id.to_string(),
                memories: Vec::new(),
            });
        }

        let raw = fs::read_to_string(&self.paths.memories_path).map_err(|error| {
            MemoryError::storage(format!(
                "cannot read memories file {}: {error}",
                self.paths.memories_path.display()
            ))
        })?;

        serde_json::from_str(&raw).map_err(|error| {
            MemoryError::storage(format!(
                "malformed memories file {}: {error}",
                self.paths.memories_path.display()
            ))
        })
    }

    /// Serialize the whole collection to a temp file in the state dir,
    /// then atomically replace memories.json. A crash mid-write leaves
    /// the previous complete file in place.
    fn write_collection(&self, collection: &MemoryCollection) -> Result<(), MemoryError> {
        let tmp_path = self.paths.state_dir.join("memories.json.tmp");

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&tmp_path)
            .map_err(|error| {
                MemoryError::storage(format!(
                    "cannot open temp memories file {}: {error}",
                    tmp_path.display()
                ))
            })?;

        let mut writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, collection).map_err(|error| {
            MemoryError::storage(format!(
                "cannot serialize memories file {}: {error}",
                tmp_path.display()
            ))
        })?;
        writer.flush().map_err(|error| {
            MemoryError::storage(format!(
                "cannot flush temp memories file {}: {error}",
                tmp_path.display()
            ))
        })?;

        fs::rename(&tmp_path, &self.paths.memories_path).map_err(|error| {
            MemoryError::storage(format!(
                "cannot replace memories file {}: {error}",
                self.paths.memories_path.display()
            ))
        })
    }
}

/// Ids from other projects are indistinguishable from nonexistent ones,
/// so an unparseable id is simply "not found" rather than a shape error.
fn parse_memory_id(memory_id: &str) -> Option<Uuid> {
    Uuid::parse_str(memory_id).ok()
}
