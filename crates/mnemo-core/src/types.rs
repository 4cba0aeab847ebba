use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::MemoryError;

/// Classification tag for a stored memory. Closed set: anything outside
/// it is rejected before any persisted state changes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum MemoryType {
    DesignDoc,
    ProjectOverview,
    ImplementationPlan,
    ProgressTracker,
    TestPlan,
    Instructions,
    Guidelines,
    Analysis,
}

/// Wire names of all allowed memory types, for error messages and docs.
pub const ALLOWED_TYPES_LIST: &str = "design_doc, project_overview, implementation_plan, \
     progress_tracker, test_plan, instructions, guidelines, analysis";

impl MemoryType {
    /// Returns the wire-facing name for this type
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DesignDoc => "design_doc",
            Self::ProjectOverview => "project_overview",
            Self::ImplementationPlan => "implementation_plan",
            Self::ProgressTracker => "progress_tracker",
            Self::TestPlan => "test_plan",
            Self::Instructions => "instructions",
            Self::Guidelines => "guidelines",
            Self::Analysis => "analysis",
        }
    }

    /// Parse a wire name, rejecting anything outside the closed set.
    pub fn parse(value: &str) -> Result<Self, MemoryError> {
        match value {
            "design_doc" => Ok(Self::DesignDoc),
            "project_overview" => Ok(Self::ProjectOverview),
            "implementation_plan" => Ok(Self::ImplementationPlan),
            "progress_tracker" => Ok(Self::ProgressTracker),
            "test_plan" => Ok(Self::TestPlan),
            "instructions" => Ok(Self::Instructions),
            "guidelines" => Ok(Self::Guidelines),
            "analysis" => Ok(Self::Analysis),
            other => Err(MemoryError::InvalidMemoryType(other.to_string())),
        }
    }
}

impl std::fmt::Display for MemoryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One stored memory record, as persisted in memories.json.
///
/// `id`, `title`, `memory_type`, and `created_at` are immutable after
/// creation; only `content` changes (via update), which also stamps
/// `updated_at`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Memory {
    pub id: Uuid,
    pub title: String,
    #[serde(rename = "type")]
    pub memory_type: MemoryType,
    pub content: String,
    pub created_at: DateTime<Utc>,
    /// Absent (null) until the first update.
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Memory {
    /// Listing projection: everything except content.
    pub fn metadata(&self) -> MemoryMetadata {
        MemoryMetadata {
            id: self.id,
            title: self.title.clone(),
            memory_type: self.memory_type,
        }
    }
}

/// Memory metadata without content, returned by list operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryMetadata {
    pub id: Uuid,
    pub title: String,
    #[serde(rename = "type")]
    pub memory_type: MemoryType,
}

/// Output format for CLI responses
#[derive(Clone, Debug, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}
