//! Column partition algorithms.
//!
//! `ColumnEngine` borrows one desktop's context together with the geometry
//! tracker and the host for the duration of a single operation. Every public
//! operation first checks that each window it may touch has a geometry record,
//! so a missing record aborts the operation before anything is mutated.

use std::mem;

use crate::config::TilingConfig;
use crate::desktop::DesktopContext;
use crate::error::{Result, TilingError};
use crate::geometry::{GeometryTracker, WindowGeometryRecord};
use crate::host::Host;
use crate::types::{Decoration, Maximize, Rect, WindowId, MAX_COLUMNS};

/// Split `extent` into `parts` lengths that differ by at most one and sum to
/// `extent` exactly.
///
/// Each boundary is placed at `floor(extent * i / parts)`, the running
/// accumulator a line rasterizer would use, so the remainder pixels are spread
/// evenly instead of piling up in the last row.
pub fn split_extent(extent: i32, parts: usize) -> Vec<i32> {
    if parts == 0 {
        return Vec::new();
    }
    let extent = i64::from(extent);
    let n = parts as i64;
    (0..n)
        .map(|i| ((extent * (i + 1)) / n - (extent * i) / n) as i32)
        .collect()
}

/// Column widths for `count` columns across `extent`: each column takes the
/// remaining width divided by the remaining column count, so the last column
/// consumes whatever is left.
pub fn column_widths(extent: i32, count: usize) -> Vec<i32> {
    let mut remaining = extent;
    (0..count)
        .map(|i| {
            let width = remaining / (count - i) as i32;
            remaining -= width;
            width
        })
        .collect()
}

/// Direction of a single-step relocation in move mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// Column operations on one desktop.
pub struct ColumnEngine<'a, H: Host + ?Sized> {
    pub(crate) ctx: &'a mut DesktopContext,
    pub(crate) tracker: &'a mut GeometryTracker,
    pub(crate) host: &'a mut H,
    pub(crate) settings: &'a TilingConfig,
}

impl<'a, H: Host + ?Sized> ColumnEngine<'a, H> {
    pub fn new(
        ctx: &'a mut DesktopContext,
        tracker: &'a mut GeometryTracker,
        host: &'a mut H,
        settings: &'a TilingConfig,
    ) -> Self {
        Self {
            ctx,
            tracker,
            host,
            settings,
        }
    }

    pub(crate) fn area(&self) -> Rect {
        self.host.usable_area(self.ctx.key())
    }

    fn ensure_tiled_records(&self) -> Result<()> {
        let windows: Vec<WindowId> = self.ctx.tiled_windows().collect();
        self.tracker.ensure_all(&windows)
    }

    /// Give every window in `col` its share of the usable height.
    ///
    /// A lone window is maximized vertically instead of given explicit rows.
    pub fn reorganize_column(&mut self, col: usize) -> Result<()> {
        let windows = self
            .ctx
            .columns
            .get(col)
            .ok_or(TilingError::ColumnOutOfRange(col))?
            .clone();
        if windows.is_empty() {
            return Ok(());
        }
        self.tracker.ensure_all(&windows)?;

        let area = self.area();
        let (x, width) = (self.ctx.column_x[col], self.ctx.column_w[col]);

        if let [window] = windows[..] {
            let rect = Rect::new(x, area.y, width, area.height);
            self.tracker.set_expected(window, rect)?;
            self.host.unmaximize(window, Maximize::VERTICAL);
            self.host.move_resize(window, rect);
            self.host.maximize(window, Maximize::VERTICAL);
            return Ok(());
        }

        let mut y = area.y;
        for (&window, height) in windows.iter().zip(split_extent(area.height, windows.len())) {
            let rect = Rect::new(x, y, width, height);
            y += height;
            if !self.host.maximized(window).is_empty() {
                self.host.unmaximize(window, Maximize::BOTH);
            }
            self.tracker.set_expected(window, rect)?;
            self.host.move_resize(window, rect);
        }
        log::debug!("Reorganized column {} on {}: {} rows", col, self.ctx.key(), windows.len());
        Ok(())
    }

    /// Place column `col` at `x` with `width`, keeping each window's rows.
    fn set_column_geometry(&mut self, col: usize, x: i32, width: i32) -> Result<()> {
        let windows = self
            .ctx
            .columns
            .get(col)
            .ok_or(TilingError::ColumnOutOfRange(col))?
            .clone();
        self.tracker.ensure_all(&windows)?;
        for window in windows {
            if self.host.maximized(window).contains(Maximize::HORIZONTAL) {
                self.host.unmaximize(window, Maximize::HORIZONTAL);
            }
            let mut rect = self.tracker.expected(window)?;
            rect.x = x;
            rect.width = width;
            self.tracker.set_expected(window, rect)?;
            self.host.move_resize(window, rect);
        }
        self.ctx.column_x[col] = x;
        self.ctx.column_w[col] = width;
        Ok(())
    }

    /// Split the usable width into `count` columns and move the windows of
    /// those columns to their new horizontal extent.
    pub fn distribute_columns(&mut self, count: usize) -> Result<()> {
        let count = count.min(MAX_COLUMNS);
        let windows: Vec<WindowId> = self.ctx.columns[..count].iter().flatten().copied().collect();
        self.tracker.ensure_all(&windows)?;

        let area = self.area();
        let mut x = area.x;
        for (col, width) in column_widths(area.width, count).into_iter().enumerate() {
            self.set_column_geometry(col, x, width)?;
            x += width;
        }
        Ok(())
    }

    /// Shift column `col` by `dx` and grow it by `dw`.
    pub(crate) fn move_resize_column(&mut self, col: usize, dx: i32, dw: i32) -> Result<()> {
        let windows = self
            .ctx
            .columns
            .get(col)
            .ok_or(TilingError::ColumnOutOfRange(col))?
            .clone();
        self.tracker.ensure_all(&windows)?;
        for window in windows {
            let mut rect = self.tracker.expected(window)?;
            rect.x += dx;
            rect.width += dw;
            self.tracker.set_expected(window, rect)?;
            self.host.move_resize(window, rect);
        }
        self.ctx.column_x[col] += dx;
        self.ctx.column_w[col] += dw;
        Ok(())
    }

    /// Raise the desired column count by one.
    ///
    /// Going from zero to one column tiles every window on the desktop. When
    /// there are enough windows to fill the extra column, one window is moved
    /// into it: single-window columns slide right until a column with several
    /// windows gives up its last one.
    pub fn add_column(&mut self) -> Result<()> {
        if self.ctx.desired_columns >= MAX_COLUMNS {
            log::debug!("Already at {} columns on {}", MAX_COLUMNS, self.ctx.key());
            return Ok(());
        }
        self.ensure_tiled_records()?;
        self.ctx.desired_columns += 1;
        let desired = self.ctx.desired_columns;
        log::info!("Desktop {} now wants {} columns", self.ctx.key(), desired);

        if desired == 1 {
            for window in self.host.focus_stack(self.ctx.key()) {
                if let Err(e) = self.insert_window(window) {
                    log::error!("Failed to tile 0x{:x}: {}", window, e);
                }
            }
            return Ok(());
        }

        let previous = desired - 1;
        if self.ctx.column_count() != previous || self.ctx.tiled_count < desired {
            return Ok(());
        }

        self.distribute_columns(desired)?;
        for col in (0..previous).rev() {
            if self.ctx.columns[col].len() == 1 {
                let moved = mem::take(&mut self.ctx.columns[col]);
                self.ctx.columns[col + 1] = moved;
                self.reorganize_column(col + 1)?;
            } else {
                let Some(window) = self.ctx.columns[col].pop() else {
                    break;
                };
                self.reorganize_column(col)?;
                self.ctx.columns[col + 1].push(window);
                self.reorganize_column(col + 1)?;
                return Ok(());
            }
        }
        Ok(())
    }

    /// Lower the desired column count by one.
    ///
    /// At zero every window goes back to the geometry it had before tiling.
    /// Otherwise the windows of the column beyond the new count are merged
    /// into the column before it.
    pub fn remove_column(&mut self) -> Result<()> {
        if self.ctx.desired_columns == 0 {
            return Ok(());
        }
        self.ensure_tiled_records()?;
        self.ctx.desired_columns -= 1;
        let desired = self.ctx.desired_columns;
        log::info!("Desktop {} now wants {} columns", self.ctx.key(), desired);

        if desired == 0 {
            return self.untile_all();
        }

        let col = desired;
        if self.ctx.columns[col].is_empty() {
            return Ok(());
        }
        let merged = mem::take(&mut self.ctx.columns[col]);
        self.ctx.columns[col - 1].extend(merged);
        self.ctx.shift_left_from(col);
        let count = self.ctx.column_count();
        self.distribute_columns(count)?;
        self.reorganize_column(col - 1)
    }

    /// Restore every tiled window to its original geometry and clear the
    /// partition.
    pub fn untile_all(&mut self) -> Result<()> {
        let windows: Vec<WindowId> = self.ctx.tiled_windows().collect();
        self.tracker.ensure_all(&windows)?;
        for window in windows {
            let Some(record) = self.tracker.remove(window) else {
                continue;
            };
            if !self.host.maximized(window).is_empty() {
                self.host.unmaximize(window, Maximize::BOTH);
            }
            self.host.move_resize(window, record.original);
        }
        for column in self.ctx.columns.iter_mut() {
            column.clear();
        }
        self.ctx.tiled_count = 0;
        self.ctx.desired_columns = 0;
        self.host.smart_cleanup(self.ctx.key());
        log::info!("Tiling disabled on {}", self.ctx.key());
        Ok(())
    }

    /// Bring the desired column count to `count`, one column at a time.
    pub fn change_column_number(&mut self, count: usize) -> Result<()> {
        let count = count.min(MAX_COLUMNS);
        if count == 0 {
            return self.untile_all();
        }
        while self.ctx.desired_columns < count {
            self.add_column()?;
        }
        while self.ctx.desired_columns > count {
            self.remove_column()?;
        }
        Ok(())
    }

    /// Fit every occupied column to the current usable area. Rows are split
    /// evenly again.
    pub fn relayout(&mut self) -> Result<()> {
        let count = self.ctx.column_count();
        if count == 0 {
            return Ok(());
        }
        self.ensure_tiled_records()?;
        self.distribute_columns(count)?;
        for col in 0..count {
            self.reorganize_column(col)?;
        }
        if count == 1 && self.ctx.columns[0].len() == 1 {
            let window = self.ctx.columns[0][0];
            self.host.maximize(window, Maximize::HORIZONTAL);
        }
        log::info!("Relaid out {} columns on {} for {}", count, self.ctx.key(), self.area());
        Ok(())
    }

    /// Tile a window. Returns whether it was added to the partition.
    pub fn insert_window(&mut self, window: WindowId) -> Result<bool> {
        self.insert_window_with_original(window, None)
    }

    /// Tile a window, recording `original` (or its current geometry) as the
    /// geometry to restore when tiling is switched off.
    pub fn insert_window_with_original(&mut self, window: WindowId, original: Option<Rect>) -> Result<bool> {
        if self.ctx.is_floating(window) {
            return Ok(false);
        }
        if !self.settings.tile_dialogs && self.host.is_dialog(window) {
            log::debug!("Not tiling dialog 0x{:x}", window);
            return Ok(false);
        }
        if self.ctx.desired_columns == 0 || self.ctx.is_tiled(window) {
            return Ok(false);
        }
        let Some(geometry) = self.host.geometry(window) else {
            log::warn!("Host has no geometry for 0x{:x}, not tiling it", window);
            return Ok(false);
        };
        let area = self.area();
        if self.settings.float_too_big_windows {
            let hints = self.host.size_hints(window);
            if hints.min_w > area.width || hints.min_h > area.height {
                log::info!(
                    "0x{:x} needs at least {}x{}, floating it",
                    window,
                    hints.min_w,
                    hints.min_h
                );
                self.ctx.add_floating(window, None);
                return Ok(false);
            }
        }
        self.ensure_tiled_records()?;

        self.tracker.insert(
            window,
            WindowGeometryRecord::new(geometry, original.unwrap_or(geometry)),
        );
        self.host.set_decoration(window, Decoration::Pixel);

        let count = self.ctx.column_count();
        if count == 0 {
            self.ctx.columns[0].push(window);
            self.ctx.tiled_count += 1;
            self.ctx.column_x[0] = area.x;
            self.ctx.column_w[0] = area.width;
            self.tracker.set_expected(window, area)?;
            self.host.unmaximize(window, Maximize::BOTH);
            self.host.move_resize(window, area);
            self.host.maximize(window, Maximize::BOTH);
            log::info!("Tiled 0x{:x} alone on {}", window, self.ctx.key());
        } else if count >= self.ctx.desired_columns {
            let col = count - 1;
            self.ctx.columns[col].push(window);
            self.ctx.tiled_count += 1;
            self.reorganize_column(col)?;
            log::info!("Tiled 0x{:x} in column {} on {}", window, col, self.ctx.key());
        } else {
            self.ctx.columns[count].push(window);
            self.ctx.tiled_count += 1;
            self.distribute_columns(count + 1)?;
            if count == 1 {
                // The window that was alone may have been resized by its client
                self.reorganize_column(0)?;
            }
            self.reorganize_column(count)?;
            log::info!("Tiled 0x{:x} in new column {} on {}", window, count, self.ctx.key());
        }
        Ok(true)
    }

    /// Take a window out of the partition. Returns whether it was tiled here.
    ///
    /// An emptied column either disappears (when there are no longer enough
    /// windows to fill every column) or is refilled with one window from a
    /// neighboring column that has several.
    pub fn remove_window(&mut self, window: WindowId) -> Result<bool> {
        let Some(col) = self.ctx.column_of(window) else {
            return Ok(false);
        };
        self.ensure_tiled_records()?;
        let occupied = self.ctx.column_count();

        self.ctx.columns[col].retain(|&w| w != window);
        self.tracker.remove(window);
        self.ctx.tiled_count -= 1;
        log::info!("Untiled 0x{:x} from column {} on {}", window, col, self.ctx.key());

        if !self.ctx.columns[col].is_empty() {
            self.reorganize_column(col)?;
            return Ok(true);
        }

        if occupied > self.ctx.tiled_count {
            self.ctx.shift_left_from(col);
            self.distribute_columns(occupied - 1)?;
            return Ok(true);
        }

        self.refill_column(col, occupied)?;
        Ok(true)
    }

    /// Fill the empty column `col` from its neighbors.
    fn refill_column(&mut self, col: usize, occupied: usize) -> Result<()> {
        // Prefer pulling from the right: slide columns left up to the first
        // column with spare windows and take its top window.
        for i in col + 1..occupied {
            if self.ctx.columns[i].len() > 1 {
                for j in col..i - 1 {
                    self.ctx.columns[j] = mem::take(&mut self.ctx.columns[j + 1]);
                    self.reorganize_column(j)?;
                }
                let window = self.ctx.columns[i].remove(0);
                self.reorganize_column(i)?;
                self.ctx.columns[i - 1] = vec![window];
                self.reorganize_column(i - 1)?;
                return Ok(());
            }
        }

        // Otherwise slide columns right until one can give up its last window.
        for i in (0..col).rev() {
            if self.ctx.columns[i].len() == 1 {
                self.ctx.columns[i + 1] = mem::take(&mut self.ctx.columns[i]);
                self.reorganize_column(i + 1)?;
            } else {
                let Some(window) = self.ctx.columns[i].pop() else {
                    break;
                };
                self.reorganize_column(i)?;
                self.ctx.columns[i + 1] = vec![window];
                self.reorganize_column(i + 1)?;
                return Ok(());
            }
        }
        Ok(())
    }

    /// Exchange two tiled windows: their slots, their expected geometry and
    /// their maximize state.
    pub fn swap_windows(&mut self, a: WindowId, b: WindowId) -> Result<()> {
        if a == b {
            return Ok(());
        }
        let (col_a, row_a) = self.ctx.position_of(a).ok_or(TilingError::NotTiled(a))?;
        let (col_b, row_b) = self.ctx.position_of(b).ok_or(TilingError::NotTiled(b))?;
        self.tracker.ensure_all(&[a, b])?;

        self.ctx.columns[col_a][row_a] = b;
        self.ctx.columns[col_b][row_b] = a;
        self.tracker.swap_expected(a, b)?;

        let max_a = self.host.maximized(a);
        let max_b = self.host.maximized(b);
        if !max_b.is_empty() {
            self.host.unmaximize(b, Maximize::BOTH);
        }
        if !max_a.is_empty() {
            self.host.unmaximize(a, Maximize::BOTH);
        }
        self.host.move_resize(a, self.tracker.expected(a)?);
        self.host.move_resize(b, self.tracker.expected(b)?);
        if !max_a.is_empty() {
            self.host.maximize(b, max_a);
        }
        if !max_b.is_empty() {
            self.host.maximize(a, max_b);
        }
        log::info!("Swapped 0x{:x} and 0x{:x}", a, b);
        Ok(())
    }

    /// Move a window one step in `direction`.
    pub fn move_window(&mut self, window: WindowId, direction: Direction) -> Result<()> {
        match direction {
            Direction::Up => self.move_up(window),
            Direction::Down => self.move_down(window),
            Direction::Left => self.move_left(window),
            Direction::Right => self.move_right(window),
        }
    }

    /// Exchange a window with the one above it. Heights travel with the windows.
    fn move_up(&mut self, window: WindowId) -> Result<()> {
        let (col, row) = self.ctx.position_of(window).ok_or(TilingError::NotTiled(window))?;
        if row == 0 {
            return Ok(());
        }
        let other = self.ctx.columns[col][row - 1];
        self.tracker.ensure_all(&[window, other])?;
        self.ctx.columns[col].swap(row - 1, row);

        let mut moved = self.tracker.expected(window)?;
        let mut displaced = self.tracker.expected(other)?;
        moved.y = displaced.y;
        displaced.y = moved.y + moved.height;
        self.apply_row_move(window, moved, other, displaced)
    }

    /// Exchange a window with the one below it.
    fn move_down(&mut self, window: WindowId) -> Result<()> {
        let (col, row) = self.ctx.position_of(window).ok_or(TilingError::NotTiled(window))?;
        if row + 1 >= self.ctx.columns[col].len() {
            return Ok(());
        }
        let other = self.ctx.columns[col][row + 1];
        self.tracker.ensure_all(&[window, other])?;
        self.ctx.columns[col].swap(row, row + 1);

        let mut moved = self.tracker.expected(window)?;
        let mut displaced = self.tracker.expected(other)?;
        displaced.y = moved.y;
        moved.y = displaced.y + displaced.height;
        self.apply_row_move(window, moved, other, displaced)
    }

    fn apply_row_move(&mut self, a: WindowId, rect_a: Rect, b: WindowId, rect_b: Rect) -> Result<()> {
        self.tracker.set_expected(a, rect_a)?;
        self.tracker.set_expected(b, rect_b)?;
        self.host.move_window(a, rect_a.x, rect_a.y);
        self.host.move_window(b, rect_b.x, rect_b.y);
        Ok(())
    }

    /// Append a window to the column on its left.
    fn move_left(&mut self, window: WindowId) -> Result<()> {
        let col = self.ctx.column_of(window).ok_or(TilingError::NotTiled(window))?;
        if col == 0 {
            return Ok(());
        }
        self.ensure_tiled_records()?;

        self.ctx.columns[col].retain(|&w| w != window);
        self.ctx.columns[col - 1].push(window);

        if self.ctx.columns[col].is_empty() {
            self.ctx.shift_left_from(col);
            let count = self.ctx.column_count();
            self.distribute_columns(count)?;
        } else {
            self.reorganize_column(col)?;
        }
        self.reorganize_column(col - 1)
    }

    /// Append a window to the column on its right, opening a new column when
    /// it is already in the last one.
    fn move_right(&mut self, window: WindowId) -> Result<()> {
        let col = self.ctx.column_of(window).ok_or(TilingError::NotTiled(window))?;
        let count = self.ctx.column_count();
        if col + 1 >= MAX_COLUMNS || (col + 1 == count && self.ctx.columns[col].len() == 1) {
            return Ok(());
        }
        self.ensure_tiled_records()?;

        self.ctx.columns[col].retain(|&w| w != window);
        self.ctx.columns[col + 1].push(window);

        if self.ctx.columns[col].is_empty() {
            self.ctx.shift_left_from(col);
            let count = self.ctx.column_count();
            self.distribute_columns(count)?;
            self.reorganize_column(col)
        } else if self.ctx.columns[col + 1].len() > 1 {
            self.reorganize_column(col)?;
            self.reorganize_column(col + 1)
        } else {
            self.distribute_columns(count + 1)?;
            self.reorganize_column(col)?;
            self.reorganize_column(col + 1)?;
            if self.ctx.desired_columns < count + 1 {
                self.ctx.desired_columns = count + 1;
                log::info!("Desktop {} grew to {} columns", self.ctx.key(), count + 1);
            }
            Ok(())
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::headless::{HeadlessHost, HostCommand};
    use crate::types::DeskKey;

    pub(crate) const DESK: DeskKey = DeskKey { zone: 0, x: 0, y: 0 };
    pub(crate) const AREA: Rect = Rect {
        x: 0,
        y: 0,
        width: 1000,
        height: 800,
    };

    pub(crate) struct Fixture {
        pub ctx: DesktopContext,
        pub tracker: GeometryTracker,
        pub host: HeadlessHost,
        pub settings: TilingConfig,
    }

    impl Fixture {
        pub fn new(columns: usize) -> Self {
            Self {
                ctx: DesktopContext::new(DESK, columns),
                tracker: GeometryTracker::new(),
                host: HeadlessHost::new(AREA),
                settings: TilingConfig::default(),
            }
        }

        pub fn engine(&mut self) -> ColumnEngine<'_, HeadlessHost> {
            ColumnEngine::new(&mut self.ctx, &mut self.tracker, &mut self.host, &self.settings)
        }

        pub fn open(&mut self, window: WindowId) {
            let n = window as i32;
            self.host.add_window(window, DESK, Rect::new(10 * n, 5 * n, 300, 200));
            self.engine().insert_window(window).unwrap();
        }

        pub fn layout(&self) -> Vec<Vec<WindowId>> {
            (0..self.ctx.column_count())
                .map(|c| self.ctx.column(c).to_vec())
                .collect()
        }

        pub fn expected(&self, window: WindowId) -> Rect {
            self.tracker.expected(window).unwrap()
        }
    }

    #[test]
    fn test_split_extent_sums_exactly() {
        for extent in [1, 7, 100, 799, 800, 1081] {
            for n in 1..=50 {
                let heights = split_extent(extent, n);
                assert_eq!(heights.len(), n);
                assert_eq!(heights.iter().sum::<i32>(), extent, "extent {} n {}", extent, n);
                let floor = extent / n as i32;
                assert!(heights.iter().all(|&h| h == floor || h == floor + 1));
            }
        }
        assert!(split_extent(100, 0).is_empty());
    }

    #[test]
    fn test_column_widths_sum_exactly() {
        for extent in [999, 1000, 1366, 1920] {
            for k in 1..=MAX_COLUMNS {
                let widths = column_widths(extent, k);
                assert_eq!(widths.len(), k);
                assert_eq!(widths.iter().sum::<i32>(), extent);
                let min = widths.iter().min().unwrap();
                let max = widths.iter().max().unwrap();
                assert!(max - min <= 1);
            }
        }
    }

    #[test]
    fn test_first_window_fills_desktop() {
        let mut f = Fixture::new(2);
        f.open(1);

        assert_eq!(f.layout(), vec![vec![1]]);
        assert_eq!(f.expected(1), AREA);
        assert_eq!(f.host.geometry(1), Some(AREA));
        assert_eq!(f.host.maximized(1), Maximize::BOTH);
        assert_eq!(f.host.window(1).unwrap().decoration, Decoration::Pixel);
        // Original is the pre-tiling geometry
        assert_eq!(f.tracker.get(1).unwrap().original, Rect::new(10, 5, 300, 200));
    }

    #[test]
    fn test_three_windows_two_columns() {
        let mut f = Fixture::new(2);
        f.open(1);
        f.open(2);
        assert_eq!(f.layout(), vec![vec![1], vec![2]]);
        assert_eq!(f.expected(1), Rect::new(0, 0, 500, 800));
        assert_eq!(f.expected(2), Rect::new(500, 0, 500, 800));

        f.open(3);
        assert_eq!(f.layout(), vec![vec![1], vec![2, 3]]);
        assert_eq!(f.expected(2), Rect::new(500, 0, 500, 400));
        assert_eq!(f.expected(3), Rect::new(500, 400, 500, 400));
        assert_eq!(f.ctx.tiled_count(), 3);
        // Host geometry follows the expected geometry
        for w in 1..=3 {
            assert_eq!(f.host.geometry(w), Some(f.expected(w)));
        }
    }

    #[test]
    fn test_reorganize_column_remainder() {
        let mut f = Fixture::new(1);
        for w in 1..=3 {
            f.open(w);
        }
        let heights: Vec<i32> = (1..=3).map(|w| f.expected(w).height).collect();
        assert_eq!(heights, vec![266, 267, 267]);
        assert_eq!(f.expected(3).bottom(), 800);
    }

    #[test]
    fn test_insert_skips_floating_and_dialogs() {
        let mut f = Fixture::new(2);
        f.host.add_window(1, DESK, Rect::new(0, 0, 10, 10));
        f.ctx.add_floating(1, None);
        assert!(!f.engine().insert_window(1).unwrap());

        f.settings.tile_dialogs = false;
        f.host.add_window(2, DESK, Rect::new(0, 0, 10, 10));
        f.host.set_dialog(2, true);
        assert!(!f.engine().insert_window(2).unwrap());

        assert_eq!(f.ctx.tiled_count(), 0);
        assert!(f.tracker.is_empty());
    }

    #[test]
    fn test_insert_floats_too_big_window() {
        let mut f = Fixture::new(2);
        f.host.add_window(1, DESK, Rect::new(0, 0, 10, 10));
        f.host.set_hints(
            1,
            crate::types::SizeHints {
                min_w: 1200,
                ..Default::default()
            },
        );
        assert!(!f.engine().insert_window(1).unwrap());
        assert!(f.ctx.is_floating(1));

        f.settings.float_too_big_windows = false;
        f.ctx.take_floating(1);
        assert!(f.engine().insert_window(1).unwrap());
    }

    #[test]
    fn test_insert_disabled_desktop() {
        let mut f = Fixture::new(0);
        f.host.add_window(1, DESK, Rect::new(0, 0, 10, 10));
        assert!(!f.engine().insert_window(1).unwrap());
        assert!(f.host.commands().is_empty());
    }

    #[test]
    fn test_remove_window_shrinks_columns() {
        let mut f = Fixture::new(3);
        for w in 1..=3 {
            f.open(w);
        }
        assert_eq!(f.layout(), vec![vec![1], vec![2], vec![3]]);

        f.engine().remove_window(2).unwrap();
        assert_eq!(f.layout(), vec![vec![1], vec![3]]);
        assert_eq!(f.expected(1), Rect::new(0, 0, 500, 800));
        assert_eq!(f.expected(3), Rect::new(500, 0, 500, 800));
        assert!(!f.tracker.contains(2));
    }

    #[test]
    fn test_remove_window_refills_from_right() {
        let mut f = Fixture::new(2);
        for w in 1..=3 {
            f.open(w);
        }
        // [1], [2, 3]
        f.engine().remove_window(1).unwrap();
        assert_eq!(f.layout(), vec![vec![2], vec![3]]);
        assert_eq!(f.expected(2), Rect::new(0, 0, 500, 800));
        assert_eq!(f.expected(3), Rect::new(500, 0, 500, 800));
    }

    #[test]
    fn test_remove_window_refills_from_left() {
        let mut f = Fixture::new(2);
        for w in 1..=3 {
            f.open(w);
        }
        f.engine().move_window(3, Direction::Left).unwrap();
        assert_eq!(f.layout(), vec![vec![1, 3], vec![2]]);

        f.engine().remove_window(2).unwrap();
        assert_eq!(f.layout(), vec![vec![1], vec![3]]);
        assert_eq!(f.expected(3), Rect::new(500, 0, 500, 800));
    }

    #[test]
    fn test_remove_unknown_window() {
        let mut f = Fixture::new(2);
        f.open(1);
        assert!(!f.engine().remove_window(99).unwrap());
        assert_eq!(f.ctx.tiled_count(), 1);
    }

    #[test]
    fn test_add_column_moves_one_window() {
        let mut f = Fixture::new(1);
        for w in 1..=3 {
            f.open(w);
        }
        assert_eq!(f.layout(), vec![vec![1, 2, 3]]);

        f.engine().add_column().unwrap();
        assert_eq!(f.ctx.desired_columns(), 2);
        assert_eq!(f.layout(), vec![vec![1, 2], vec![3]]);
        assert_eq!(f.expected(3), Rect::new(500, 0, 500, 800));
        assert_eq!(f.expected(1), Rect::new(0, 0, 500, 400));

        f.engine().add_column().unwrap();
        assert_eq!(f.layout(), vec![vec![1], vec![2], vec![3]]);
        assert_eq!(f.expected(1).width + f.expected(2).width + f.expected(3).width, 1000);
    }

    #[test]
    fn test_add_column_slides_single_columns() {
        let mut f = Fixture::new(2);
        for w in 1..=3 {
            f.open(w);
        }
        f.engine().move_window(3, Direction::Left).unwrap();
        // [1, 3], [2]
        f.engine().add_column().unwrap();
        assert_eq!(f.layout(), vec![vec![1], vec![3], vec![2]]);
    }

    #[test]
    fn test_add_column_without_enough_windows() {
        let mut f = Fixture::new(2);
        f.open(1);
        f.open(2);
        f.engine().add_column().unwrap();
        assert_eq!(f.ctx.desired_columns(), 3);
        assert_eq!(f.layout(), vec![vec![1], vec![2]]);

        // The next window opens the third column
        f.open(3);
        assert_eq!(f.layout(), vec![vec![1], vec![2], vec![3]]);
    }

    #[test]
    fn test_add_column_capped() {
        let mut f = Fixture::new(MAX_COLUMNS);
        f.engine().add_column().unwrap();
        assert_eq!(f.ctx.desired_columns(), MAX_COLUMNS);
    }

    #[test]
    fn test_add_column_from_zero_tiles_everything() {
        let mut f = Fixture::new(0);
        f.host.add_window(1, DESK, Rect::new(0, 0, 100, 100));
        f.host.add_window(2, DESK, Rect::new(0, 0, 100, 100));
        f.host.add_window(3, DeskKey::new(0, 1, 0), Rect::new(0, 0, 100, 100));

        f.engine().add_column().unwrap();
        assert_eq!(f.ctx.desired_columns(), 1);
        // Most recently focused first
        assert_eq!(f.layout(), vec![vec![2, 1]]);
    }

    #[test]
    fn test_remove_column_merges() {
        let mut f = Fixture::new(3);
        for w in 1..=4 {
            f.open(w);
        }
        assert_eq!(f.layout(), vec![vec![1], vec![2], vec![3, 4]]);

        f.engine().remove_column().unwrap();
        assert_eq!(f.ctx.desired_columns(), 2);
        assert_eq!(f.layout(), vec![vec![1], vec![2, 3, 4]]);
        assert_eq!(f.expected(1), Rect::new(0, 0, 500, 800));
        let heights: Vec<i32> = [2, 3, 4].iter().map(|&w| f.expected(w).height).collect();
        assert_eq!(heights.iter().sum::<i32>(), 800);
        assert!([2, 3, 4].iter().all(|&w| f.expected(w).x == 500));
    }

    #[test]
    fn test_remove_column_to_zero_restores_originals() {
        let mut f = Fixture::new(2);
        for w in 1..=3 {
            f.open(w);
        }
        f.engine().remove_column().unwrap();
        f.engine().remove_column().unwrap();

        assert_eq!(f.ctx.desired_columns(), 0);
        assert_eq!(f.ctx.tiled_count(), 0);
        assert!(f.layout().is_empty());
        assert!(f.tracker.is_empty());
        for w in 1..=3 {
            let n = w as i32;
            assert_eq!(f.host.geometry(w), Some(Rect::new(10 * n, 5 * n, 300, 200)));
            assert!(f.host.maximized(w).is_empty());
        }
        assert_eq!(f.host.commands().last(), Some(&HostCommand::SmartCleanup(DESK)));

        // Already at zero: nothing happens
        f.host.clear_commands();
        f.engine().remove_column().unwrap();
        assert!(f.host.commands().is_empty());
    }

    #[test]
    fn test_change_column_number() {
        let mut f = Fixture::new(1);
        for w in 1..=4 {
            f.open(w);
        }
        f.engine().change_column_number(3).unwrap();
        assert_eq!(f.ctx.desired_columns(), 3);
        assert_eq!(f.ctx.column_count(), 3);

        f.engine().change_column_number(1).unwrap();
        assert_eq!(f.layout().len(), 1);
        assert_eq!(f.ctx.tiled_count(), 4);

        f.engine().change_column_number(0).unwrap();
        assert_eq!(f.ctx.desired_columns(), 0);
        assert!(f.tracker.is_empty());
    }

    #[test]
    fn test_missing_record_aborts_without_mutation() {
        let mut f = Fixture::new(2);
        f.open(1);
        f.open(2);
        f.tracker.remove(2);
        f.host.clear_commands();

        let err = f.engine().remove_column().unwrap_err();
        assert_eq!(err, TilingError::MissingRecord(2));
        assert_eq!(f.ctx.desired_columns(), 2);
        assert_eq!(f.layout(), vec![vec![1], vec![2]]);
        assert!(f.host.commands().is_empty());
    }

    #[test]
    fn test_swap_windows_exchanges_slots_and_maximize() {
        let mut f = Fixture::new(2);
        for w in 1..=3 {
            f.open(w);
        }
        let before_1 = f.expected(1);
        let before_3 = f.expected(3);
        assert_eq!(f.host.maximized(1), Maximize::VERTICAL);

        f.engine().swap_windows(1, 3).unwrap();
        assert_eq!(f.layout(), vec![vec![3], vec![2, 1]]);
        assert_eq!(f.expected(3), before_1);
        assert_eq!(f.expected(1), before_3);
        assert_eq!(f.host.maximized(3), Maximize::VERTICAL);
        assert!(f.host.maximized(1).is_empty());
        assert_eq!(f.host.geometry(3), Some(before_1));
        assert_eq!(f.host.geometry(1), Some(before_3));
    }

    #[test]
    fn test_swap_with_untiled_window_fails() {
        let mut f = Fixture::new(2);
        f.open(1);
        assert_eq!(f.engine().swap_windows(1, 9), Err(TilingError::NotTiled(9)));
        assert_eq!(f.layout(), vec![vec![1]]);
    }

    #[test]
    fn test_move_up_and_down() {
        let mut f = Fixture::new(1);
        f.open(1);
        f.open(2);
        f.open(3);
        // heights 266, 267, 267
        f.engine().move_window(3, Direction::Up).unwrap();
        assert_eq!(f.layout(), vec![vec![1, 3, 2]]);
        assert_eq!(f.expected(3), Rect::new(0, 266, 1000, 267));
        assert_eq!(f.expected(2), Rect::new(0, 533, 1000, 267));

        f.engine().move_window(1, Direction::Down).unwrap();
        assert_eq!(f.layout(), vec![vec![3, 1, 2]]);
        assert_eq!(f.expected(3).y, 0);
        assert_eq!(f.expected(1).y, 267);

        // Edges are no-ops
        f.engine().move_window(3, Direction::Up).unwrap();
        f.engine().move_window(2, Direction::Down).unwrap();
        assert_eq!(f.layout(), vec![vec![3, 1, 2]]);
    }

    #[test]
    fn test_move_left_collapses_column() {
        let mut f = Fixture::new(2);
        f.open(1);
        f.open(2);
        f.engine().move_window(2, Direction::Left).unwrap();
        assert_eq!(f.layout(), vec![vec![1, 2]]);
        assert_eq!(f.expected(1), Rect::new(0, 0, 1000, 400));
        assert_eq!(f.expected(2), Rect::new(0, 400, 1000, 400));

        f.engine().move_window(1, Direction::Left).unwrap();
        assert_eq!(f.layout(), vec![vec![1, 2]]);
    }

    #[test]
    fn test_move_right_opens_column() {
        let mut f = Fixture::new(2);
        for w in 1..=3 {
            f.open(w);
        }
        f.engine().move_window(3, Direction::Right).unwrap();
        assert_eq!(f.layout(), vec![vec![1], vec![2], vec![3]]);
        assert_eq!(f.ctx.desired_columns(), 3);
        assert_eq!(f.expected(2), Rect::new(333, 0, 333, 800));
        assert_eq!(f.expected(3), Rect::new(666, 0, 334, 800));

        // Alone in the last column: nowhere to go
        f.engine().move_window(3, Direction::Right).unwrap();
        assert_eq!(f.layout(), vec![vec![1], vec![2], vec![3]]);
    }

    #[test]
    fn test_move_right_into_neighbor() {
        let mut f = Fixture::new(2);
        f.open(1);
        f.open(2);
        f.engine().move_window(1, Direction::Right).unwrap();
        assert_eq!(f.layout(), vec![vec![2, 1]]);
        assert_eq!(f.expected(2), Rect::new(0, 0, 1000, 400));
        assert_eq!(f.expected(1), Rect::new(0, 400, 1000, 400));
    }
}
