//! Command-line arguments: a single positional configuration path,
//! defaulting to `./config.json`.

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser)]
#[command(name = "semantic-mcp-router")]
#[command(about = "Semantic search router for MCP tool-calling agents")]
#[command(version)]
pub struct Cli {
    /// Path to the router's JSON configuration file.
    #[arg(default_value = "./config.json")]
    pub config: PathBuf,

    /// Enable debug-level logging.
    #[arg(short, long)]
    pub verbose: bool,
}
