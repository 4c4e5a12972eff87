//! coltilectl - Command-line interface to control coltile
//!
//! This tool allows scripts and external programs to:
//! - Query the column layout of every desk
//! - Run tiling actions (columns, floating, swap, move)
//! - Switch desks and send windows between them
//! - Validate layout invariants
//!
//! # Examples
//!
//! ```bash
//! # Get full state as JSON
//! coltilectl state
//!
//! # Show the columns of desk (1, 0)
//! coltilectl desktop 1 0
//!
//! # Split the desk at (0, 0) into three columns
//! coltilectl set-columns 0 0 3
//!
//! # Swap two windows
//! coltilectl swap-windows 0x1a00003 0x1c00007
//!
//! # Validate layout invariants
//! coltilectl validate
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use coltile::ipc::{socket_path, IpcCommand, IpcConnection, IpcResponse};

/// coltilectl - Control the coltile window manager
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Socket path (default: /tmp/coltile_$DISPLAY.sock)
    #[arg(long, global = true)]
    socket: Option<PathBuf>,

    /// Output raw JSON without pretty-printing
    #[arg(long, global = true)]
    raw: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Get full engine state as JSON
    State,

    /// Get the columns of one desk
    Desktop {
        x: i32,
        y: i32,
        /// Zone (screen) of the desk
        #[arg(long, default_value_t = 0)]
        zone: u32,
    },

    /// Validate layout invariants
    Validate,

    /// Get recent event log
    EventLog {
        /// Number of entries to show (default: all)
        #[arg(short = 'n', long)]
        count: Option<usize>,
    },

    /// Toggle floating for a window (default: focused)
    ToggleFloat {
        /// Window ID (decimal or 0x hex)
        window: Option<String>,
    },

    /// Add a column on the active desk
    AddColumn,

    /// Remove a column on the active desk
    RemoveColumn,

    /// Set the column count of a desk
    SetColumns {
        x: i32,
        y: i32,
        count: usize,
        #[arg(long, default_value_t = 0)]
        zone: u32,
    },

    /// Enter swap mode for the focused window
    Swap,

    /// Enter move mode for the focused window
    Move,

    /// Swap two tiled windows
    SwapWindows { a: String, b: String },

    /// Show another desk
    SwitchDesk { x: i32, y: i32 },

    /// Send a window (default: focused) to another desk
    SendToDesk {
        x: i32,
        y: i32,
        /// Window ID (decimal or 0x hex)
        #[arg(long)]
        window: Option<String>,
    },

    /// Re-read the configuration file
    ReloadConfig,

    /// Quit the window manager
    Quit,
}

fn main() {
    let cli = Cli::parse();

    let socket_path = cli.socket.unwrap_or_else(socket_path);

    let command = match cli.command {
        Commands::State => IpcCommand::GetState,
        Commands::Desktop { x, y, zone } => IpcCommand::GetDesktop { zone, x, y },
        Commands::Validate => IpcCommand::ValidateState,
        Commands::EventLog { count } => IpcCommand::GetEventLog { count },
        Commands::ToggleFloat { window } => IpcCommand::ToggleFloat {
            window: window.as_deref().map(parse_window_id),
        },
        Commands::AddColumn => IpcCommand::AddColumn,
        Commands::RemoveColumn => IpcCommand::RemoveColumn,
        Commands::SetColumns { x, y, count, zone } => IpcCommand::SetColumns { zone, x, y, count },
        Commands::Swap => IpcCommand::Swap,
        Commands::Move => IpcCommand::Move,
        Commands::SwapWindows { a, b } => IpcCommand::SwapWindows {
            a: parse_window_id(&a),
            b: parse_window_id(&b),
        },
        Commands::SwitchDesk { x, y } => IpcCommand::SwitchDesk { x, y },
        Commands::SendToDesk { x, y, window } => IpcCommand::SendToDesk {
            window: window.as_deref().map(parse_window_id),
            x,
            y,
        },
        Commands::ReloadConfig => IpcCommand::ReloadConfig,
        Commands::Quit => IpcCommand::Quit,
    };

    if let Err(e) = send_command(&socket_path, &command, cli.raw) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn parse_window_id(s: &str) -> u32 {
    if let Some(hex) = s.strip_prefix("0x") {
        u32::from_str_radix(hex, 16).unwrap_or_else(|_| {
            eprintln!("Invalid hex window ID: {}", s);
            std::process::exit(1);
        })
    } else {
        s.parse().unwrap_or_else(|_| {
            eprintln!("Invalid window ID: {}", s);
            std::process::exit(1);
        })
    }
}

fn send_command(socket_path: &PathBuf, command: &IpcCommand, raw: bool) -> std::io::Result<()> {
    let mut conn = IpcConnection::connect_to(socket_path).map_err(|e| {
        std::io::Error::new(
            e.kind(),
            format!("Failed to connect to coltile at {:?}: {}. Is coltile running?", socket_path, e),
        )
    })?;

    let response = conn.send(command)?;

    if let IpcResponse::Error { code, message } = &response {
        eprintln!("Error [{}]: {}", code, message);
        std::process::exit(1);
    }

    if raw {
        println!("{}", serde_json::to_string(&response)?);
    } else {
        println!("{}", serde_json::to_string_pretty(&response)?);
    }

    Ok(())
}
