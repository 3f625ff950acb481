use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::sink::DEFAULT_OUTPUT;

// CLI argument structure
#[derive(Parser, Debug, Clone)]
#[command(name = "deep-novelist")]
#[command(about = "Generate novels with an Ollama server and stream them back")]
pub struct Args {
    // Address to bind the http server to
    #[arg(long, default_value = "127.0.0.1")]
    pub bind: String,

    // Port to run the server on
    #[arg(short, long, default_value_t = 7861)]
    pub port: u16,

    // Ollama host used when a request names none (empty = localhost)
    #[arg(long, default_value = "")]
    pub ollama_host: String,

    // File the finished novel is written to
    #[arg(short, long, default_value = DEFAULT_OUTPUT)]
    pub output: PathBuf,

    // Model list cache TTL in seconds
    #[arg(short, long, default_value_t = 30)]
    pub cache_ttl: u64,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Test the connection to an Ollama server
    Check {
        // Server address (default: localhost)
        #[arg(short, long)]
        ip: Option<String>,

        // Model to send a test prompt to
        #[arg(short, long)]
        model: Option<String>,

        #[arg(long, default_value = "Write a short story.")]
        prompt: String,
    },
}
