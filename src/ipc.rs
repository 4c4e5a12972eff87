//! IPC interface for programmatic control of coltile.
//!
//! Provides a Unix socket server that accepts JSON commands and returns JSON responses.
//! This enables scripts and external tools to:
//! - Query the column layout of every desktop
//! - Run tiling actions (add/remove columns, float, swap, move)
//! - Validate layout invariants

use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::state::StateViolation;
use crate::types::{DeskKey, Rect};

/// Get the socket path for this display
pub fn socket_path() -> PathBuf {
    let display = std::env::var("DISPLAY").unwrap_or_else(|_| ":0".to_string());
    let sanitized = display.replace([':', '.'], "_");
    PathBuf::from(format!("/tmp/coltile{}.sock", sanitized))
}

/// Commands that can be sent to the WM via IPC
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum IpcCommand {
    // Queries
    /// Get full engine state snapshot
    GetState,
    /// Get one desktop's columns
    GetDesktop {
        #[serde(default)]
        zone: u32,
        x: i32,
        y: i32,
    },
    /// Validate layout invariants
    ValidateState,
    /// Get recent event log
    GetEventLog {
        #[serde(default)]
        count: Option<usize>,
    },

    // Actions
    /// Toggle floating for a window (focused window if omitted)
    ToggleFloat {
        #[serde(default)]
        window: Option<u32>,
    },
    /// Add a column on the active desktop
    AddColumn,
    /// Remove a column on the active desktop
    RemoveColumn,
    /// Set the column count of a desktop
    SetColumns {
        #[serde(default)]
        zone: u32,
        x: i32,
        y: i32,
        count: usize,
    },
    /// Enter swap mode for the focused window
    Swap,
    /// Enter move mode for the focused window
    Move,
    /// Swap two tiled windows directly
    SwapWindows { a: u32, b: u32 },
    /// Show another desktop
    SwitchDesk { x: i32, y: i32 },
    /// Send a window (focused window if omitted) to another desktop
    SendToDesk {
        #[serde(default)]
        window: Option<u32>,
        x: i32,
        y: i32,
    },
    /// Re-read the configuration file and apply column counts
    ReloadConfig,

    // Control
    /// Quit the window manager
    Quit,
}

/// Responses from the WM
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum IpcResponse {
    /// Operation succeeded with no data
    Ok,
    /// Full state snapshot
    State { data: EngineSnapshot },
    /// One desktop
    Desktop { data: DesktopSnapshot },
    /// Validation result
    Validation {
        valid: bool,
        violations: Vec<StateViolation>,
    },
    /// Event log
    EventLog { entries: Vec<EventLogEntry> },
    /// Error response
    Error { code: String, message: String },
}

/// Snapshot of the whole engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSnapshot {
    pub active_desk: Option<DeskKey>,
    pub switching: bool,
    pub session: SessionSnapshot,
    pub desktops: Vec<DesktopSnapshot>,
}

/// Interactive session state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub mode: String,
    pub subject: Option<u32>,
    pub labels: Vec<(char, u32)>,
}

/// Snapshot of one desktop's partition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DesktopSnapshot {
    pub desk: DeskKey,
    pub desired_columns: usize,
    pub tiled_count: usize,
    pub columns: Vec<ColumnSnapshot>,
    pub floating: Vec<u32>,
}

/// Snapshot of one occupied column
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnSnapshot {
    pub x: i32,
    pub width: i32,
    pub windows: Vec<WindowSnapshot>,
}

/// A tiled window and its recorded geometry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowSnapshot {
    pub id: u32,
    pub expected: Rect,
    pub original: Rect,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<char>,
}

/// Entry in the event log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub sequence: u64,
    pub timestamp_ms: u64,
    pub event_type: String,
    pub window: Option<u32>,
    pub details: String,
}

/// IPC server that listens on a Unix socket
pub struct IpcServer {
    listener: UnixListener,
    socket_path: PathBuf,
}

impl IpcServer {
    /// Create a new IPC server bound to the socket path
    pub fn bind() -> std::io::Result<Self> {
        let path = socket_path();

        // Remove existing socket if present
        if path.exists() {
            std::fs::remove_file(&path)?;
        }

        let listener = UnixListener::bind(&path)?;

        // Set non-blocking mode for polling
        listener.set_nonblocking(true)?;

        log::info!("IPC server listening on {:?}", path);

        Ok(Self {
            listener,
            socket_path: path,
        })
    }

    /// Poll for incoming commands (non-blocking)
    /// Returns None if no command is pending
    pub fn poll(&self) -> Option<(IpcCommand, IpcClient)> {
        match self.listener.accept() {
            Ok((stream, _)) => {
                // Set a read timeout for the stream
                stream
                    .set_read_timeout(Some(Duration::from_millis(100)))
                    .ok();
                stream
                    .set_write_timeout(Some(Duration::from_millis(100)))
                    .ok();

                let mut reader = BufReader::new(stream.try_clone().ok()?);
                let mut line = String::new();

                match reader.read_line(&mut line) {
                    Ok(0) => None, // EOF
                    Ok(_) => {
                        match serde_json::from_str::<IpcCommand>(&line) {
                            Ok(cmd) => {
                                log::debug!("IPC command received: {:?}", cmd);
                                Some((cmd, IpcClient { stream }))
                            }
                            Err(e) => {
                                log::warn!("Invalid IPC command: {}", e);
                                // Send error response
                                let mut client = IpcClient { stream };
                                let _ = client.respond(IpcResponse::Error {
                                    code: "parse_error".to_string(),
                                    message: format!("Failed to parse command: {}", e),
                                });
                                None
                            }
                        }
                    }
                    Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => None,
                    Err(e) => {
                        log::warn!("IPC read error: {}", e);
                        None
                    }
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => None,
            Err(e) => {
                log::warn!("IPC accept error: {}", e);
                None
            }
        }
    }
}

impl Drop for IpcServer {
    fn drop(&mut self) {
        // Clean up socket file
        let _ = std::fs::remove_file(&self.socket_path);
    }
}

/// Handle for responding to an IPC client
pub struct IpcClient {
    stream: UnixStream,
}

impl IpcClient {
    /// Send a response to the client
    pub fn respond(&mut self, response: IpcResponse) -> std::io::Result<()> {
        let json = serde_json::to_string(&response)?;
        writeln!(self.stream, "{}", json)?;
        self.stream.flush()?;
        Ok(())
    }
}

/// Client for connecting to the IPC server (used by coltilectl)
pub struct IpcConnection {
    stream: UnixStream,
}

impl IpcConnection {
    /// Connect to the WM's IPC socket
    pub fn connect() -> std::io::Result<Self> {
        Self::connect_to(&socket_path())
    }

    /// Connect to an explicit socket path
    pub fn connect_to(path: &Path) -> std::io::Result<Self> {
        let stream = UnixStream::connect(path)?;

        // Set timeouts
        stream.set_read_timeout(Some(Duration::from_secs(5)))?;
        stream.set_write_timeout(Some(Duration::from_secs(5)))?;

        Ok(Self { stream })
    }

    /// Send a command and receive the response
    pub fn send(&mut self, command: &IpcCommand) -> std::io::Result<IpcResponse> {
        let json = serde_json::to_string(command)?;
        writeln!(self.stream, "{}", json)?;
        self.stream.flush()?;

        let mut reader = BufReader::new(&self.stream);
        let mut line = String::new();
        reader.read_line(&mut line)?;

        serde_json::from_str(&line).map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_serialization() {
        let json = serde_json::to_string(&IpcCommand::GetState).unwrap();
        assert!(json.contains("get_state"));

        let cmd = IpcCommand::SetColumns {
            zone: 0,
            x: 1,
            y: 0,
            count: 3,
        };
        let json = serde_json::to_string(&cmd).unwrap();
        assert!(json.contains("set_columns"));
        assert!(json.contains("\"count\":3"));
    }

    #[test]
    fn test_command_deserialization() {
        let cmd: IpcCommand = serde_json::from_str(r#"{"command": "add_column"}"#).unwrap();
        assert!(matches!(cmd, IpcCommand::AddColumn));

        let cmd: IpcCommand = serde_json::from_str(r#"{"command": "toggle_float"}"#).unwrap();
        assert!(matches!(cmd, IpcCommand::ToggleFloat { window: None }));

        let cmd: IpcCommand = serde_json::from_str(r#"{"command": "get_desktop", "x": 1, "y": 1}"#).unwrap();
        assert!(matches!(cmd, IpcCommand::GetDesktop { zone: 0, x: 1, y: 1 }));

        let cmd: IpcCommand = serde_json::from_str(r#"{"command": "swap_windows", "a": 4, "b": 5}"#).unwrap();
        assert!(matches!(cmd, IpcCommand::SwapWindows { a: 4, b: 5 }));

        assert!(serde_json::from_str::<IpcCommand>(r#"{"command": "split"}"#).is_err());
    }

    #[test]
    fn test_response_serialization() {
        let json = serde_json::to_string(&IpcResponse::Ok).unwrap();
        assert_eq!(json, r#"{"status":"ok"}"#);

        let resp = IpcResponse::Error {
            code: "not_tiled".to_string(),
            message: "window 0x10 is not tiled".to_string(),
        };
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("\"status\":\"error\""));
        assert!(json.contains("not_tiled"));
    }

    #[test]
    fn test_socket_path_sanitized() {
        let path = socket_path();
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("coltile"));
        assert!(!name.trim_end_matches(".sock").contains(':'));
    }
}
