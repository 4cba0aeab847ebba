use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;
mod mcp_server;


use cli::{Cli, Commands};
use mnemo_store::MemoryStore;

fn main() -> Result<()> {
    // Initialize tracing (output to stderr; stdout carries protocol and
    // command output)
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init()
        .ok();

    let cli = Cli::parse();
    let format = cli.format.clone();

    let working_dir = match cli.cd {
        Some(dir) => std::path::PathBuf::from(dir),
        None => std::env::current_dir()?,
    };
    let mut store = MemoryStore::new(working_dir);

    match cli.command {
        Commands::Serve => mcp_server::run_mcp_server(&mut store),
        Commands::Activate => commands::handle_activate(&mut store, &format),
        Commands::Store {
            title,
            memory_type,
            content,
        } => commands::handle_store(&mut store, &title, memory_type, content, &format),
        Commands::Get { id } => commands::handle_get(&mut store, &id, &format),
        Commands::List { memory_type } => commands::handle_list(&mut store, memory_type, &format),
        Commands::Update { id, content } => {
            commands::handle_update(&mut store, &id, content, &format)
        }
        Commands::Delete { id } => commands::handle_delete(&mut store, &id, &format),
    }
}
