use clap::{Parser, Subcommand};
use mnemo_core::types::{MemoryType, OutputFormat};

#[derive(Parser)]
#[command(name = "mnemo")]
#[command(about = "Project-scoped memory store for AI agents (MCP + CLI)")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (text or json)
    #[arg(long, default_value = "text")]
    pub format: OutputFormat,

    /// Working directory (defaults to CWD)
    #[arg(long)]
    pub cd: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Serve the memory tools over MCP stdio (JSON-RPC 2.0)
    Serve,

    /// Activate the project: load or create its identity and backing file
    Activate,

    /// Store a new memory
    Store {
        /// Memory title (required, non-empty)
        #[arg(short, long)]
        title: String,

        /// Memory type (design_doc, project_overview, implementation_plan,
        /// progress_tracker, test_plan, instructions, guidelines, analysis)
        #[arg(short = 'k', long = "type", value_enum)]
        memory_type: MemoryType,

        /// Markdown content; reads from stdin if omitted
        #[arg(short, long)]
        content: Option<String>,
    },

    /// Show a full memory record by id
    Get {
        /// Memory UUID
        id: String,
    },

    /// List memories (id, title, type), optionally filtered by type
    List {
        /// Only show memories of this type
        #[arg(long = "type", value_enum)]
        memory_type: Option<MemoryType>,
    },

    /// Replace a memory's content
    Update {
        /// Memory UUID
        id: String,

        /// New markdown content; reads from stdin if omitted
        #[arg(short, long)]
        content: Option<String>,
    },

    /// Permanently delete a memory
    Delete {
        /// Memory UUID
        id: String,
    },
}
