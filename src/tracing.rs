//! Event tracing for debugging coltile.
//!
//! Provides a ring buffer of recent events for debugging and replay.
//! Agents can query the event log via IPC to understand what happened.

use std::collections::VecDeque;
use std::time::Instant;

use crate::ipc::EventLogEntry;
use crate::state::StateTransition;

/// Maximum number of events to keep in the trace buffer
const DEFAULT_MAX_ENTRIES: usize = 1000;

/// Event tracer with ring buffer storage
pub struct EventTracer {
    entries: VecDeque<EventLogEntry>,
    max_entries: usize,
    sequence: u64,
    start_time: Instant,
}

impl EventTracer {
    /// Create a new event tracer with default capacity
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_ENTRIES)
    }

    /// Create a new event tracer with specified capacity
    pub fn with_capacity(max_entries: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(max_entries),
            max_entries,
            sequence: 0,
            start_time: Instant::now(),
        }
    }

    /// Get the current timestamp in milliseconds since tracer start
    fn timestamp(&self) -> u64 {
        self.start_time.elapsed().as_millis() as u64
    }

    /// Trace a host-side event (X11 event, host notification)
    pub fn trace_event(&mut self, event_type: &str, window: Option<u32>, details: &str) {
        self.add_entry(event_type.to_string(), window, details.to_string());
    }

    /// Trace a state transition
    pub fn trace_transition(&mut self, transition: &StateTransition) {
        let (event_type, window, details) = match transition {
            StateTransition::WindowTiled { window, desk, column } => {
                ("window_tiled", Some(*window), format!("desk={} column={}", desk, column))
            }
            StateTransition::WindowUntiled { window, desk, reason } => {
                let reason = serde_json::to_string(reason).unwrap_or_else(|_| "unknown".to_string());
                ("window_untiled", Some(*window), format!("desk={} reason={}", desk, reason))
            }
            StateTransition::WindowFloated { window, desk } => {
                ("window_floated", Some(*window), format!("desk={}", desk))
            }
            StateTransition::ColumnsChanged { desk, from, to } => {
                ("columns_changed", None, format!("desk={} {}->{}", desk, from, to))
            }
            StateTransition::WindowsSwapped { a, b } => {
                ("windows_swapped", Some(*a), format!("with=0x{:x}", b))
            }
            StateTransition::WindowStepped { window, direction } => {
                ("window_stepped", Some(*window), format!("dir={}", direction))
            }
            StateTransition::DriftHandled { window, outcome } => {
                ("drift_handled", Some(*window), format!("{:?}", outcome))
            }
            StateTransition::DeskShown { from, to } => {
                ("desk_shown", None, format!("from={:?} to={}", from, to))
            }
            StateTransition::WindowDeskChanged { window, from, to } => {
                ("window_desk_changed", Some(*window), format!("from={:?} to={}", from, to))
            }
            StateTransition::SessionStarted { mode, subject } => {
                ("session_started", Some(*subject), format!("mode={}", mode))
            }
            StateTransition::SessionEnded { mode } => ("session_ended", None, format!("mode={}", mode)),
        };
        self.add_entry(event_type.to_string(), window, details);
    }

    /// Trace an IPC command
    pub fn trace_ipc(&mut self, command: &str, result: &str) {
        self.add_entry("ipc_command".to_string(), None, format!("cmd={} result={}", command, result));
    }

    /// Add an entry to the trace buffer
    fn add_entry(&mut self, event_type: String, window: Option<u32>, details: String) {
        // Remove oldest entry if at capacity
        if self.entries.len() >= self.max_entries {
            self.entries.pop_front();
        }

        self.sequence += 1;
        self.entries.push_back(EventLogEntry {
            sequence: self.sequence,
            timestamp_ms: self.timestamp(),
            event_type,
            window,
            details,
        });
    }

    /// Get the last N entries
    pub fn get_last(&self, n: usize) -> Vec<EventLogEntry> {
        let start = if self.entries.len() > n {
            self.entries.len() - n
        } else {
            0
        };
        self.entries.iter().skip(start).cloned().collect()
    }

    /// Get all entries
    pub fn get_all(&self) -> Vec<EventLogEntry> {
        self.entries.iter().cloned().collect()
    }

    /// Get the number of entries in the buffer
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the buffer is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for EventTracer {
    fn default() -> Self {
        Self::new()
    }
}
