//! IPC command handling for the window manager.
//!
//! Contains the handler for all IPC commands from coltilectl and other clients.

use std::time::Instant;

use coltile::error::TilingError;
use coltile::host::Host;
use coltile::ipc::{IpcCommand, IpcResponse};
use coltile::types::DeskKey;

use crate::Wm;

/// Error response for a failed engine operation
fn engine_error(e: TilingError) -> IpcResponse {
    IpcResponse::Error {
        code: e.code().to_string(),
        message: e.to_string(),
    }
}

/// Error response for a failed X11 operation
fn host_error(code: &str, e: anyhow::Error) -> IpcResponse {
    IpcResponse::Error {
        code: code.to_string(),
        message: format!("{:#}", e),
    }
}

fn no_window() -> IpcResponse {
    IpcResponse::Error {
        code: "no_window".to_string(),
        message: "No window given and nothing is focused".to_string(),
    }
}

impl Wm {
    /// Handle an IPC command and return a response
    pub fn handle_ipc(&mut self, cmd: IpcCommand) -> IpcResponse {
        log::debug!("Handling IPC command: {:?}", cmd);

        // Capture command name for tracing
        let cmd_name = format!("{:?}", cmd);
        let now = Instant::now();

        let response = match cmd {
            IpcCommand::GetState => IpcResponse::State {
                data: self.engine.snapshot(),
            },
            IpcCommand::GetDesktop { zone, x, y } => {
                match self.engine.desktop_snapshot(DeskKey::new(zone, x, y)) {
                    Some(data) => IpcResponse::Desktop { data },
                    None => IpcResponse::Error {
                        code: "unknown_desktop".to_string(),
                        message: format!("Desktop {}:{},{} has not been used yet", zone, x, y),
                    },
                }
            }
            IpcCommand::ValidateState => {
                let violations = self.engine.validate(&self.host);
                IpcResponse::Validation {
                    valid: violations.is_empty(),
                    violations,
                }
            }
            IpcCommand::GetEventLog { count } => {
                let entries = match count {
                    Some(n) => self.engine.tracer().get_last(n),
                    None => self.engine.tracer().get_all(),
                };
                IpcResponse::EventLog { entries }
            }
            IpcCommand::ToggleFloat { window } => {
                match window.or_else(|| self.host.focused_window()) {
                    Some(window) => match self.engine.toggle_floating(&mut self.host, window) {
                        Ok(()) => IpcResponse::Ok,
                        Err(e) => engine_error(e),
                    },
                    None => no_window(),
                }
            }
            IpcCommand::AddColumn => match self.engine.add_column(&mut self.host) {
                Ok(()) => IpcResponse::Ok,
                Err(e) => engine_error(e),
            },
            IpcCommand::RemoveColumn => match self.engine.remove_column(&mut self.host) {
                Ok(()) => IpcResponse::Ok,
                Err(e) => engine_error(e),
            },
            IpcCommand::SetColumns { zone, x, y, count } => {
                let desk = DeskKey::new(zone, x, y);
                match self.engine.change_column_number(&mut self.host, desk, count) {
                    Ok(()) => IpcResponse::Ok,
                    Err(e) => engine_error(e),
                }
            }
            IpcCommand::Swap => match self.engine.start_swap(&mut self.host, now) {
                Ok(()) => IpcResponse::Ok,
                Err(e) => engine_error(e),
            },
            IpcCommand::Move => match self.engine.start_move(&mut self.host, now) {
                Ok(()) => IpcResponse::Ok,
                Err(e) => engine_error(e),
            },
            IpcCommand::SwapWindows { a, b } => match self.engine.swap_windows(&mut self.host, a, b) {
                Ok(()) => IpcResponse::Ok,
                Err(e) => engine_error(e),
            },
            IpcCommand::SwitchDesk { x, y } => {
                let desk = self.host.desk_at(x, y);
                match self.switch_desk(desk) {
                    Ok(()) => IpcResponse::Ok,
                    Err(e) => host_error("switch_failed", e),
                }
            }
            IpcCommand::SendToDesk { window, x, y } => {
                let desk = self.host.desk_at(x, y);
                match window.or_else(|| self.host.focused_window()) {
                    Some(window) => match self.send_to_desk(window, desk) {
                        Ok(()) => IpcResponse::Ok,
                        Err(e) => host_error("send_failed", e),
                    },
                    None => no_window(),
                }
            }
            IpcCommand::ReloadConfig => {
                self.reload_config();
                IpcResponse::Ok
            }
            IpcCommand::Quit => {
                log::info!("Quit requested via IPC");
                self.running = false;
                IpcResponse::Ok
            }
        };

        // Trace the IPC command and result
        let result_str = match &response {
            IpcResponse::Ok => "ok".to_string(),
            IpcResponse::Error { code, .. } => format!("error: {}", code),
            _ => "success".to_string(),
        };
        self.engine.tracer_mut().trace_ipc(&cmd_name, &result_str);

        response
    }
}
