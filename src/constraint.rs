//! Keeping tiled windows inside their slots.
//!
//! When the host reports that a tiled window settled somewhere other than
//! where the engine put it, the drift is classified against the window's
//! expected geometry and either redistributed to the neighboring column or
//! row, or rejected by snapping the window back.
//!
//! ```text
//!   width  ──▶ boundary with the column to the right
//!   x      ──▶ boundary with the column to the left
//!   height ──▶ boundary with the next window in the column
//!   y      ──▶ boundary with the previous window in the column
//! ```

use serde::{Deserialize, Serialize};

use crate::column::ColumnEngine;
use crate::error::Result;
use crate::host::{Host, PlacedWindow};
use crate::types::{Changes, Maximize, Rect, WindowId};

/// What happened to a placement report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    /// Not ours to manage, or drift below the size step
    Ignored,
    /// The window entered the partition
    Tiled,
    /// The reported geometry is what the engine commanded
    Echo,
    /// A lone window's host geometry became its expected geometry
    Accepted,
    /// The window was put back at its expected geometry
    SnappedBack,
    /// The drift moved a column or row boundary
    Redistributed,
}

impl<H: Host + ?Sized> ColumnEngine<'_, H> {
    /// Handle a window-placed report for this desktop.
    pub fn window_placed(&mut self, placed: &PlacedWindow) -> Result<Placement> {
        let window = placed.window;
        if self.ctx.is_floating(window)
            || (!self.settings.tile_dialogs && self.host.is_dialog(window))
            || self.ctx.desired_columns == 0
        {
            return Ok(Placement::Ignored);
        }
        if !self.ctx.is_tiled(window) {
            let tiled = self.insert_window(window)?;
            return Ok(if tiled {
                Placement::Tiled
            } else {
                Placement::Ignored
            });
        }
        if !placed.changes.any() {
            return Ok(Placement::Ignored);
        }
        self.enforce(window, placed.geometry, placed.changes)
    }

    fn enforce(&mut self, window: WindowId, reported: Rect, changes: Changes) -> Result<Placement> {
        let expected = self.tracker.expected(window)?;
        let maximized = self.host.maximized(window);

        if self.ctx.is_alone(window) {
            if maximized == Maximize::BOTH {
                self.tracker.set_expected(window, reported)?;
                return Ok(Placement::Accepted);
            }
            let area = self.area();
            self.tracker.set_expected(window, area)?;
            self.host.move_resize(window, area);
            self.host.maximize(window, Maximize::BOTH);
            log::debug!("Re-maximized lone window 0x{:x}", window);
            return Ok(Placement::SnappedBack);
        }

        if reported == expected {
            return Ok(Placement::Echo);
        }

        let Some((col, row)) = self.ctx.position_of(window) else {
            return Ok(Placement::Ignored);
        };

        if !maximized.is_empty() && self.ctx.columns[col].len() > 1 {
            self.host.unmaximize(window, Maximize::BOTH);
            return self.snap_back(window);
        }

        if changes.border && changes.size {
            log::debug!("0x{:x} changed border and size together, snapping back", window);
            return self.snap_back(window);
        }

        let hints = self.host.size_hints(window);
        let dx = reported.x - expected.x;
        let dy = reported.y - expected.y;
        let dw = reported.width - expected.width;
        let dh = reported.height - expected.height;

        let mut accepted = false;
        let mut rejected = false;
        let mut record = |ok: bool| {
            if ok {
                accepted = true;
            } else {
                rejected = true;
            }
        };

        // A left-edge drag shows up as dx with an opposite dw; it is handled by
        // the x path alone. Same for top-edge drags and the y path.
        if dw.abs() >= hints.step_width() && !(dx != 0 && dx + dw == 0) {
            record(self.shift_right_boundary(col, dw)?);
        }
        if dh.abs() >= hints.step_height() && !(dy != 0 && dy + dh == 0) {
            record(self.shift_lower_edge(col, row, dh)?);
        }
        if dx != 0 {
            record(self.shift_left_boundary(col, dx)?);
        }
        if dy != 0 {
            record(self.shift_upper_edge(col, row, dy)?);
        }

        if rejected {
            return self.snap_back(window);
        }
        if accepted {
            log::debug!(
                "Redistributed drift of 0x{:x}: dx={} dy={} dw={} dh={}",
                window,
                dx,
                dy,
                dw,
                dh
            );
            return Ok(Placement::Redistributed);
        }
        Ok(Placement::Ignored)
    }

    fn snap_back(&mut self, window: WindowId) -> Result<Placement> {
        let expected = self.tracker.expected(window)?;
        self.host.move_resize(window, expected);
        log::debug!("Snapped 0x{:x} back to {}", window, expected);
        Ok(Placement::SnappedBack)
    }

    /// Move the boundary between `col` and `col + 1` by `delta`.
    fn shift_right_boundary(&mut self, col: usize, delta: i32) -> Result<bool> {
        if col + 1 >= self.ctx.column_count() {
            log::debug!("Last column {} cannot change width", col);
            return Ok(false);
        }
        let delta = delta
            .min(self.ctx.column_w[col + 1] - 1)
            .max(1 - self.ctx.column_w[col]);
        if delta == 0 {
            return Ok(false);
        }
        self.move_resize_column(col, 0, delta)?;
        self.move_resize_column(col + 1, delta, -delta)?;
        Ok(true)
    }

    /// Move the boundary between `col - 1` and `col` by `delta`.
    fn shift_left_boundary(&mut self, col: usize, delta: i32) -> Result<bool> {
        if col == 0 {
            log::debug!("First column cannot move");
            return Ok(false);
        }
        let delta = delta
            .max(1 - self.ctx.column_w[col - 1])
            .min(self.ctx.column_w[col] - 1);
        if delta == 0 {
            return Ok(false);
        }
        self.move_resize_column(col, delta, -delta)?;
        self.move_resize_column(col - 1, 0, delta)?;
        Ok(true)
    }

    /// Move the boundary below row `row` of `col` by `delta`.
    fn shift_lower_edge(&mut self, col: usize, row: usize, delta: i32) -> Result<bool> {
        let windows = &self.ctx.columns[col];
        let (Some(&window), Some(&next)) = (windows.get(row), windows.get(row + 1)) else {
            log::debug!("Last window of column {} cannot change height", col);
            return Ok(false);
        };
        let floor = self.host.size_hints(next).floor_height();
        let mut own = self.tracker.expected(window)?;
        let mut below = self.tracker.expected(next)?;

        let delta = delta.min(below.height - floor).max(1 - own.height);
        if delta == 0 {
            return Ok(false);
        }
        own.height += delta;
        below.y += delta;
        below.height -= delta;
        self.tracker.set_expected(window, own)?;
        self.tracker.set_expected(next, below)?;
        self.host.move_resize(window, own);
        self.host.move_resize(next, below);
        Ok(true)
    }

    /// Move the boundary above row `row` of `col` by `delta`.
    fn shift_upper_edge(&mut self, col: usize, row: usize, delta: i32) -> Result<bool> {
        if row == 0 {
            log::debug!("First window of column {} cannot move", col);
            return Ok(false);
        }
        let windows = &self.ctx.columns[col];
        let (Some(&previous), Some(&window)) = (windows.get(row - 1), windows.get(row)) else {
            return Ok(false);
        };
        let floor = self.host.size_hints(previous).floor_height();
        let mut above = self.tracker.expected(previous)?;
        let mut own = self.tracker.expected(window)?;

        let delta = delta.max(floor - above.height).min(own.height - 1);
        if delta == 0 {
            return Ok(false);
        }
        above.height += delta;
        own.y += delta;
        own.height -= delta;
        self.tracker.set_expected(previous, above)?;
        self.tracker.set_expected(window, own)?;
        self.host.move_resize(previous, above);
        self.host.move_resize(window, own);
        Ok(true)
    }
}
