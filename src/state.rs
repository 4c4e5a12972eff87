//! State machine types and validation for coltile.
//!
//! This module formalizes the states a window moves through on a desktop and
//! the invariants the column partition must satisfy after every operation.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::constraint::Placement;
use crate::desktop::{DesktopContext, DesktopRegistry};
use crate::geometry::GeometryTracker;
use crate::types::{DeskKey, Rect};

/// Tiling state of a window on its desktop
///
/// ```text
///             window-placed
///                  │
///                  ▼
///            ┌───────────┐  toggle_floating  ┌──────────┐
///            │   Tiled   │ ─────────────────►│ Floating │
///            │           │ ◄─────────────────│          │
///            └─────┬─────┘  toggle_floating  └────┬─────┘
///                  │                              │
///                  │ hidden / columns → 0         │ hidden
///                  ▼                              ▼
///            ┌───────────┐                  (forgotten)
///            │ Untracked │
///            └───────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowState {
    /// Not part of any partition (desktop has tiling off, or a dialog)
    Untracked,
    /// Occupies a slot in a column
    Tiled,
    /// Excluded from the partition
    Floating,
}

/// State violations that can be detected
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct StateViolation {
    pub kind: ViolationKind,
    pub description: String,
}

/// Types of state violations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// An empty column is followed by a non-empty one
    ColumnHole,
    /// Tiled window without a geometry record
    MissingRecord,
    /// Geometry record for a window no desktop tiles
    OrphanedRecord,
    /// Window appears in more than one slot
    DuplicateWindow,
    /// Window is both tiled and floating
    FloatingAndTiled,
    /// Cached tiled window count disagrees with the columns
    TiledCountMismatch,
    /// More occupied columns than the desktop wants
    TooManyColumns,
    /// Occupied column widths do not add up to the usable width
    ColumnWidthMismatch,
    /// A window's expected geometry disagrees with its column's cached extent
    ColumnCacheMismatch,
    /// Row heights of a column do not add up to the usable height
    RowHeightMismatch,
}

/// State transition events that can be traced
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "transition", rename_all = "snake_case")]
pub enum StateTransition {
    /// Window entered a column
    WindowTiled {
        window: u32,
        desk: String,
        column: usize,
    },
    /// Window left the partition
    WindowUntiled {
        window: u32,
        desk: String,
        reason: UntileReason,
    },
    /// Window was excluded from the partition
    WindowFloated {
        window: u32,
        desk: String,
    },
    /// Desired column count changed
    ColumnsChanged {
        desk: String,
        from: usize,
        to: usize,
    },
    /// Two windows exchanged slots
    WindowsSwapped {
        a: u32,
        b: u32,
    },
    /// Window moved one step in move mode
    WindowStepped {
        window: u32,
        direction: String,
    },
    /// Host reported drift on a tiled window
    DriftHandled {
        window: u32,
        outcome: Placement,
    },
    /// Active desktop changed
    DeskShown {
        from: Option<String>,
        to: String,
    },
    /// Window was reassigned to another desktop
    WindowDeskChanged {
        window: u32,
        from: Option<String>,
        to: String,
    },
    /// Interactive session began
    SessionStarted {
        mode: String,
        subject: u32,
    },
    /// Interactive session ended
    SessionEnded {
        mode: String,
    },
}

/// Reason a window left the partition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UntileReason {
    /// Host hid or destroyed the window
    Hidden,
    /// User floated the window
    Floated,
    /// Window moved to another desktop
    DeskChanged,
}

/// Check every desktop's partition against the tracker.
///
/// `area` gives the usable area of a desktop.
pub fn validate(
    registry: &DesktopRegistry,
    tracker: &GeometryTracker,
    area: impl Fn(DeskKey) -> Rect,
) -> Vec<StateViolation> {
    let mut violations = Vec::new();
    let mut seen = HashSet::new();

    for key in registry.keys() {
        let Some(ctx) = registry.get(key) else {
            continue;
        };
        for window in ctx.tiled_windows() {
            if !seen.insert(window) {
                violations.push(StateViolation {
                    kind: ViolationKind::DuplicateWindow,
                    description: format!("Window 0x{:x} is tiled more than once", window),
                });
            }
        }
        validate_desktop(ctx, tracker, area(key), &mut violations);
    }

    for window in tracker.windows() {
        if !seen.contains(&window) {
            violations.push(StateViolation {
                kind: ViolationKind::OrphanedRecord,
                description: format!("Geometry record for untiled window 0x{:x}", window),
            });
        }
    }

    violations
}

fn validate_desktop(
    ctx: &DesktopContext,
    tracker: &GeometryTracker,
    area: Rect,
    violations: &mut Vec<StateViolation>,
) {
    let key = ctx.key();
    let count = ctx.column_count();

    if (count..crate::types::MAX_COLUMNS).any(|col| !ctx.column(col).is_empty()) {
        violations.push(StateViolation {
            kind: ViolationKind::ColumnHole,
            description: format!("Desktop {} has an empty column before a non-empty one", key),
        });
    }

    let tiled = ctx.tiled_windows().count();
    if tiled != ctx.tiled_count() {
        violations.push(StateViolation {
            kind: ViolationKind::TiledCountMismatch,
            description: format!(
                "Desktop {} counts {} tiled windows but columns hold {}",
                key,
                ctx.tiled_count(),
                tiled
            ),
        });
    }

    if count > ctx.desired_columns() && ctx.desired_columns() > 0 {
        violations.push(StateViolation {
            kind: ViolationKind::TooManyColumns,
            description: format!(
                "Desktop {} has {} columns but wants {}",
                key,
                count,
                ctx.desired_columns()
            ),
        });
    }

    for window in ctx.floating_windows() {
        if ctx.is_tiled(window) {
            violations.push(StateViolation {
                kind: ViolationKind::FloatingAndTiled,
                description: format!("Window 0x{:x} is floating and tiled on {}", window, key),
            });
        }
    }

    let mut all_recorded = true;
    for window in ctx.tiled_windows() {
        if !tracker.contains(window) {
            all_recorded = false;
            violations.push(StateViolation {
                kind: ViolationKind::MissingRecord,
                description: format!("Tiled window 0x{:x} on {} has no geometry record", window, key),
            });
        }
    }
    if count == 0 || !all_recorded {
        return;
    }

    let width: i32 = (0..count).filter_map(|c| ctx.column_extent(c)).map(|(_, w)| w).sum();
    if width != area.width {
        violations.push(StateViolation {
            kind: ViolationKind::ColumnWidthMismatch,
            description: format!(
                "Desktop {} columns span {} pixels of {}",
                key, width, area.width
            ),
        });
    }

    for col in 0..count {
        let Some((x, w)) = ctx.column_extent(col) else {
            continue;
        };
        let mut height = 0;
        for &window in ctx.column(col) {
            let Some(record) = tracker.get(window) else {
                continue;
            };
            height += record.expected.height;
            if record.expected.x != x || record.expected.width != w {
                violations.push(StateViolation {
                    kind: ViolationKind::ColumnCacheMismatch,
                    description: format!(
                        "Window 0x{:x} expects x={} w={} but column {} is x={} w={}",
                        window, record.expected.x, record.expected.width, col, x, w
                    ),
                });
            }
        }
        if height != area.height {
            violations.push(StateViolation {
                kind: ViolationKind::RowHeightMismatch,
                description: format!(
                    "Column {} on {} spans {} pixels of {}",
                    col, key, height, area.height
                ),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::tests::{Fixture, AREA};

    fn registry_with(f: Fixture) -> (DesktopRegistry, GeometryTracker) {
        let mut registry = DesktopRegistry::new();
        let key = f.ctx.key();
        let ctx = f.ctx;
        *registry.get_or_create(key, &f.settings) = ctx;
        (registry, f.tracker)
    }

    #[test]
    fn test_state_transition_serialization() {
        let transition = StateTransition::WindowTiled {
            window: 42,
            desk: "0:0,0".to_string(),
            column: 1,
        };
        let json = serde_json::to_string(&transition).unwrap();
        assert!(json.contains("window_tiled"));
        assert!(json.contains("42"));

        let json = serde_json::to_string(&StateTransition::DriftHandled {
            window: 7,
            outcome: Placement::SnappedBack,
        })
        .unwrap();
        assert!(json.contains("snapped_back"));
    }

    #[test]
    fn test_window_state_serialization() {
        let json = serde_json::to_string(&WindowState::Floating).unwrap();
        assert_eq!(json, "\"floating\"");
        let parsed: WindowState = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, WindowState::Floating);
    }

    #[test]
    fn test_valid_partition() {
        let mut f = Fixture::new(2);
        for w in 1..=5 {
            f.open(w);
        }
        let (registry, tracker) = registry_with(f);
        let violations = validate(&registry, &tracker, |_| AREA);
        assert!(violations.is_empty(), "{:?}", violations);
    }

    #[test]
    fn test_detects_hole_and_count() {
        let mut f = Fixture::new(3);
        for w in 1..=3 {
            f.open(w);
        }
        f.ctx.columns[1].clear();
        let (registry, tracker) = registry_with(f);
        let kinds: Vec<ViolationKind> = validate(&registry, &tracker, |_| AREA)
            .into_iter()
            .map(|v| v.kind)
            .collect();
        assert!(kinds.contains(&ViolationKind::ColumnHole));
        assert!(kinds.contains(&ViolationKind::TiledCountMismatch));
        assert!(kinds.contains(&ViolationKind::OrphanedRecord));
    }

    #[test]
    fn test_detects_missing_record_and_floating_overlap() {
        let mut f = Fixture::new(2);
        f.open(1);
        f.open(2);
        f.tracker.remove(2);
        f.ctx.add_floating(1, None);
        let (registry, tracker) = registry_with(f);
        let kinds: Vec<ViolationKind> = validate(&registry, &tracker, |_| AREA)
            .into_iter()
            .map(|v| v.kind)
            .collect();
        assert!(kinds.contains(&ViolationKind::MissingRecord));
        assert!(kinds.contains(&ViolationKind::FloatingAndTiled));
    }

    #[test]
    fn test_detects_width_gap() {
        let mut f = Fixture::new(2);
        f.open(1);
        f.open(2);
        f.ctx.column_w[1] -= 10;
        let (registry, tracker) = registry_with(f);
        let kinds: Vec<ViolationKind> = validate(&registry, &tracker, |_| AREA)
            .into_iter()
            .map(|v| v.kind)
            .collect();
        assert!(kinds.contains(&ViolationKind::ColumnWidthMismatch));
        assert!(kinds.contains(&ViolationKind::ColumnCacheMismatch));
    }
}
