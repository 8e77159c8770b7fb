//! termdock-hook: CLI hook handler for termdock session state tracking.
//!
//! Called directly by the coding assistant's lifecycle hooks configured in
//! its settings file. Each invocation is a whole short-lived process: read
//! one JSON event from stdin, reconcile it into the shared store, flush,
//! exit. Validation failures are the only non-zero exits.
//!
//! ## Subcommands
//!
//! - `handle`: main hook handler, reads JSON from stdin
//! - `list`: print the current session snapshot
//! - `clear`: remove sessions from the store

mod commands;
mod handle;
mod logging;
mod tty;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "termdock-hook")]
#[command(about = "termdock session state tracker")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Handle a hook event (reads JSON from stdin)
    Handle,

    /// Print tracked sessions
    List {
        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Remove sessions from the store
    Clear {
        /// Remove only this session id
        #[arg(long)]
        session_id: Option<String>,

        /// Remove only stopped sessions
        #[arg(long)]
        stopped: bool,
    },
}

fn main() {
    let _logging_guard = logging::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Handle => {
            if let Err(e) = handle::run() {
                tracing::error!(error = %e, "termdock-hook handle failed");
                eprintln!("termdock-hook: {}", e);
                std::process::exit(1);
            }
        }
        Commands::List { json } => {
            if let Err(e) = commands::list(json) {
                eprintln!("termdock-hook: {}", e);
                std::process::exit(1);
            }
        }
        Commands::Clear {
            session_id,
            stopped,
        } => {
            if let Err(e) = commands::clear(session_id.as_deref(), stopped) {
                eprintln!("termdock-hook: {}", e);
                std::process::exit(1);
            }
        }
    }
}
