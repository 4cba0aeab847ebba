use std::io::Read;

use anyhow::{Context, Result};
use mnemo_core::types::{MemoryType, OutputFormat};
use mnemo_store::MemoryStore;

/// One-shot CLI commands activate first: a fresh process has no
/// in-memory activation state, and activation is idempotent.
pub fn handle_activate(store: &mut MemoryStore, format: &OutputFormat) -> Result<()> {
    let project_id = store.activate()?;

    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({ "project_id": project_id }))?
            );
        }
        OutputFormat::Text => {
            println!("Activated project {project_id}");
            println!("Working directory: {}", store.working_dir().display());
        }
    }
    Ok(())
}

pub fn handle_store(
    store: &mut MemoryStore,
    title: &str,
    memory_type: MemoryType,
    content: Option<String>,
    format: &OutputFormat,
) -> Result<()> {
    store.activate()?;
    let content = resolve_content(content)?;
    let memory_id = store.store_memory(title, memory_type.as_str(), &content)?;

    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({ "memory_id": memory_id }))?
            );
        }
        OutputFormat::Text => {
            println!("Stored memory {memory_id} ({memory_type})");
        }
    }
    Ok(())
}

pub fn handle_get(store: &mut MemoryStore, id: &str, format: &OutputFormat) -> Result<()> {
    store.activate()?;
    let memory = store.get_memory(id)?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&memory)?);
        }
        OutputFormat::Text => {
            println!("ID: {}", memory.id);
            println!("Title: {}", memory.title);
            println!("Type: {}", memory.memory_type);
            println!("Created: {}", memory.created_at.to_rfc3339());
            println!(
                "Updated: {}",
                memory
                    .updated_at
                    .map(|value| value.to_rfc3339())
                    .unwrap_or_else(|| "-".to_string())
            );
            println!("Content:");
            println!("{}", memory.content);
        }
    }
    Ok(())
}

pub fn handle_list(
    store: &mut MemoryStore,
    memory_type: Option<MemoryType>,
    format: &OutputFormat,
) -> Result<()> {
    store.activate()?;
    let memories = store.list_memories(memory_type)?;

    if matches!(format, OutputFormat::Json) {
        println!("{}", serde_json::to_string_pretty(&memories)?);
        return Ok(());
    }

    if memories.is_empty() {
        println!("No memories found.");
        return Ok(());
    }

    println!("{:<36}  {:<19}  TITLE", "ID", "TYPE");
    for memory in memories {
        println!(
            "{:<36}  {:<19}  {}",
            memory.id,
            memory.memory_type.as_str(),
            memory.title
        );
    }
    Ok(())
}

pub fn handle_update(
    store: &mut MemoryStore,
    id: &str,
    content: Option<String>,
    format: &OutputFormat,
) -> Result<()> {
    store.activate()?;
    let content = resolve_content(content)?;
    store.update_memory(id, &content)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::json!({ "success": true })),
        OutputFormat::Text => println!("Updated memory {id}"),
    }
    Ok(())
}

pub fn handle_delete(store: &mut MemoryStore, id: &str, format: &OutputFormat) -> Result<()> {
    store.activate()?;
    store.delete_memory(id)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::json!({ "success": true })),
        OutputFormat::Text => println!("Deleted memory {id}"),
    }
    Ok(())
}

/// Content comes from the flag when given, otherwise from stdin.
fn resolve_content(content: Option<String>) -> Result<String> {
    if let Some(content) = content {
        return Ok(content);
    }

    let mut buffer = String::new();
    std::io::stdin()
        .read_to_string(&mut buffer)
        .context("Failed to read content from stdin")?;
    Ok(buffer)
}
