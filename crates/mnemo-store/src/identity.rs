//! Project identity: a UUID persisted once per working directory.

use std::fs;
use std::path::{Path, PathBuf};

use mnemo_core::MemoryError;
use uuid::Uuid;

/// Reserved storage subdirectory under the working directory.
pub const STATE_DIR_NAME: &str = ".mnemo";
/// Identity file inside the state dir; raw UUID text, written once.
pub const PROJECT_ID_FILE: &str = "project_id";
/// Backing collection file inside the state dir.
pub const MEMORIES_FILE: &str = "memories.json";

/// Resolved filesystem locations for one project's store.
#[derive(Debug, Clone)]
pub struct ProjectPaths {
    pub working_dir: PathBuf,
    pub state_dir: PathBuf,
    pub project_id_path: PathBuf,
    pub memories_path: PathBuf,
}

impl ProjectPaths {
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        let working_dir = working_dir.into();
        let state_dir = working_dir.join(STATE_DIR_NAME);
        Self {
            project_id_path: state_dir.join(PROJECT_ID_FILE),
            memories_path: state_dir.join(MEMORIES_FILE),
            state_dir,
            working_dir,
        }
    }
}

/// Load or create the persistent project id for `paths`.
///
/// Creates the state directory (and parents) if missing. Repeated calls
/// against the same directory return the same id: the identity file is
/// only ever created, never rewritten, so no atomic-rename dance is
/// needed here.
pub(crate) fn resolve_project_id(paths: &ProjectPaths) -> Result<String, MemoryError> {
    fs::create_dir_all(&paths.state_dir).map_err(|error| {
        MemoryError::storage(format!(
            "cannot create project directory {}: {error}",
            paths.state_dir.display()
        ))
    })?;

    if paths.project_id_path.exists() {
        let raw = read_id_file(&paths.project_id_path)?;
        return Ok(raw.trim().to_string());
    }

    let project_id = Uuid::new_v4().to_string();
    fs::write(&paths.project_id_path, &project_id).map_err(|error| {
        MemoryError::storage(format!(
            "cannot write project id file {}: {error}",
            paths.project_id_path.display()
        ))
    })?;

    Ok(project_id)
}

fn read_id_file(path: &Path) -> Result<String, MemoryError> {
    fs::read_to_string(path).map_err(|error| {
        MemoryError::storage(format!(
            "cannot read project id file {}: {error}",
            path.display()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_activation_creates_state_dir_and_id() {
        let dir = tempdir().expect("create temp dir");
        let paths = ProjectPaths::new(dir.path());

        let project_id = resolve_project_id(&paths).expect("resolve project id");

        assert!(paths.state_dir.is_dir());
        assert!(paths.project_id_path.is_file());
        assert_eq!(project_id.len(), 36);
        assert!(Uuid::parse_str(&project_id).is_ok());
    }

    #[test]
    fn test_repeated_resolution_returns_same_id() {
        let dir = tempdir().expect("create temp dir");
        let paths = ProjectPaths::new(dir.path());

        let first = resolve_project_id(&paths).expect("first resolution");
        let second = resolve_project_id(&paths).expect("second resolution");
        assert_eq!(first, second);
    }

    #[test]
    fn test_existing_id_is_trimmed() {
        let dir = tempdir().expect("create temp dir");
        let paths = ProjectPaths::new(dir.path());
        fs::create_dir_all(&paths.state_dir).unwrap();
        fs::write(&paths.project_id_path, "  abc-123\n").unwrap();

        let project_id = resolve_project_id(&paths).expect("resolve project id");
        assert_eq!(project_id, "abc-123");
    }

    #[test]
    fn test_id_file_never_rewritten() {
        let dir = tempdir().expect("create temp dir");
        let paths = ProjectPaths::new(dir.path());

        let first = resolve_project_id(&paths).expect("first resolution");
        let on_disk_before = fs::read_to_string(&paths.project_id_path).unwrap();
        resolve_project_id(&paths).expect("second resolution");
        let on_disk_after = fs::read_to_string(&paths.project_id_path).unwrap();

        assert_eq!(on_disk_before, on_disk_after);
        assert_eq!(on_disk_before.trim(), first);
    }

    #[test]
    fn test_working_dir_that_is_a_file_fails_with_storage_error() {
        let dir = tempdir().expect("create temp dir");
        let file_path = dir.path().join("not-a-dir");
        fs::write(&file_path, "plain file").unwrap();

        let paths = ProjectPaths::new(&file_path);
        let err = resolve_project_id(&paths).unwrap_err();
        assert_eq!(err.code(), "storage_error");
    }

    #[test]
    fn test_nested_working_dir_created_with_parents() {
        let dir = tempdir().expect("create temp dir");
        let nested = dir.path().join("deep").join("nested").join("project");

        let paths = ProjectPaths::new(&nested);
        resolve_project_id(&paths).expect("resolve project id");
        assert!(nested.join(STATE_DIR_NAME).is_dir());
    }
}
