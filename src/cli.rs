use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Clone)]
#[command(name = "agent-console")]
#[command(about = "Administrative dashboard and session registry for tracked remote agents")]
#[command(version)]
pub struct Cli {
    /// Enable verbose output (-v)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output (-q)
    #[arg(short, long)]
    pub quiet: bool,

    /// Output logs in JSON format
    #[arg(long)]
    pub json: bool,

    /// Write logs to this file instead of stdout
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Clone)]
pub enum Commands {
    /// Run the dashboard server
    Serve {
        /// Address to bind
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to listen on
        #[arg(long, default_value_t = 8000)]
        port: u16,

        /// Path to the client-tracking database
        #[arg(long, default_value = "agent-console.db")]
        db: PathBuf,

        /// Base URL agents and operators reach this server under; defaults
        /// to http://<host>:<port>
        #[arg(long)]
        public_url: Option<String>,

        /// Seconds to wait for a client to answer a dispatched command
        #[arg(long, default_value_t = 30)]
        command_timeout: u64,
    },

    /// Print the stored client records as JSON
    Clients {
        /// Path to the client-tracking database
        #[arg(long, default_value = "agent-console.db")]
        db: PathBuf,
    },
}
