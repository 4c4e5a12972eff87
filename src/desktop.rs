//! Per-desktop layout state and the registry that owns it.
//!
//! A `DesktopContext` holds the column partition of one virtual desktop: up to
//! `MAX_COLUMNS` ordered columns of windows, the cached origin and width of
//! each column, the desired column count and the set of floating windows.
//! Columns always form a non-empty prefix followed by empty columns.

use std::collections::{BTreeMap, HashMap};

use crate::config::TilingConfig;
use crate::types::{DeskKey, Rect, WindowId, MAX_COLUMNS};

/// Layout state of one virtual desktop.
#[derive(Debug, Clone)]
pub struct DesktopContext {
    key: DeskKey,
    pub(crate) columns: [Vec<WindowId>; MAX_COLUMNS],
    pub(crate) column_x: [i32; MAX_COLUMNS],
    pub(crate) column_w: [i32; MAX_COLUMNS],
    pub(crate) desired_columns: usize,
    /// Floating windows, with the pre-tiling geometry they had when floated
    pub(crate) floating: BTreeMap<WindowId, Option<Rect>>,
    pub(crate) tiled_count: usize,
}

impl DesktopContext {
    pub fn new(key: DeskKey, desired_columns: usize) -> Self {
        Self {
            key,
            columns: Default::default(),
            column_x: [0; MAX_COLUMNS],
            column_w: [0; MAX_COLUMNS],
            desired_columns: desired_columns.min(MAX_COLUMNS),
            floating: BTreeMap::new(),
            tiled_count: 0,
        }
    }

    pub fn key(&self) -> DeskKey {
        self.key
    }

    pub fn desired_columns(&self) -> usize {
        self.desired_columns
    }

    /// Total number of windows across all columns.
    pub fn tiled_count(&self) -> usize {
        self.tiled_count
    }

    /// Windows in a column, top to bottom. Out-of-range columns are empty.
    pub fn column(&self, col: usize) -> &[WindowId] {
        self.columns.get(col).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Cached horizontal extent of a column as (x, width).
    pub fn column_extent(&self, col: usize) -> Option<(i32, i32)> {
        (col < MAX_COLUMNS).then(|| (self.column_x[col], self.column_w[col]))
    }

    /// Number of occupied columns (the length of the non-empty prefix).
    pub fn column_count(&self) -> usize {
        self.columns
            .iter()
            .position(Vec::is_empty)
            .unwrap_or(MAX_COLUMNS)
    }

    /// Index of the column holding `window`.
    pub fn column_of(&self, window: WindowId) -> Option<usize> {
        self.columns.iter().position(|c| c.contains(&window))
    }

    /// Column and row of `window`.
    pub fn position_of(&self, window: WindowId) -> Option<(usize, usize)> {
        self.columns.iter().enumerate().find_map(|(col, windows)| {
            windows
                .iter()
                .position(|&w| w == window)
                .map(|row| (col, row))
        })
    }

    pub fn is_tiled(&self, window: WindowId) -> bool {
        self.column_of(window).is_some()
    }

    pub fn is_floating(&self, window: WindowId) -> bool {
        self.floating.contains_key(&window)
    }

    pub fn floating_windows(&self) -> impl Iterator<Item = WindowId> + '_ {
        self.floating.keys().copied()
    }

    /// All tiled windows, column by column.
    pub fn tiled_windows(&self) -> impl Iterator<Item = WindowId> + '_ {
        self.columns.iter().flat_map(|c| c.iter().copied())
    }

    /// A lone window in the only column.
    pub fn is_alone(&self, window: WindowId) -> bool {
        self.columns[0] == [window] && self.columns[1].is_empty()
    }

    pub(crate) fn add_floating(&mut self, window: WindowId, original: Option<Rect>) {
        self.floating.insert(window, original);
    }

    /// Drop a window from the float set, returning the geometry kept for it.
    pub(crate) fn take_floating(&mut self, window: WindowId) -> Option<Option<Rect>> {
        self.floating.remove(&window)
    }

    /// Close the gap left by an empty column at `col` by shifting every later
    /// column one slot to the left.
    pub(crate) fn shift_left_from(&mut self, col: usize) {
        if col >= MAX_COLUMNS {
            return;
        }
        self.columns[col..].rotate_left(1);
        self.columns[MAX_COLUMNS - 1].clear();
    }
}

/// Every desktop context, keyed by desktop identity.
#[derive(Debug, Default)]
pub struct DesktopRegistry {
    contexts: HashMap<DeskKey, DesktopContext>,
    active: Option<DeskKey>,
    switching: bool,
}

impl DesktopRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Context for `key`, created from the settings on first use.
    pub fn get_or_create(&mut self, key: DeskKey, settings: &TilingConfig) -> &mut DesktopContext {
        self.contexts.entry(key).or_insert_with(|| {
            let columns = settings.columns_for(key);
            log::debug!("Creating desktop context {} with {} columns", key, columns);
            DesktopContext::new(key, columns)
        })
    }

    pub fn get(&self, key: DeskKey) -> Option<&DesktopContext> {
        self.contexts.get(&key)
    }

    pub fn get_mut(&mut self, key: DeskKey) -> Option<&mut DesktopContext> {
        self.contexts.get_mut(&key)
    }

    pub fn active(&self) -> Option<DeskKey> {
        self.active
    }

    pub fn set_active(&mut self, key: DeskKey) {
        self.active = Some(key);
    }

    /// A desktop switch is in progress.
    pub fn is_switching(&self) -> bool {
        self.switching
    }

    pub fn set_switching(&mut self, switching: bool) {
        self.switching = switching;
    }

    /// Desktop whose columns hold `window`.
    pub fn desk_tiling(&self, window: WindowId) -> Option<DeskKey> {
        self.contexts
            .values()
            .find(|ctx| ctx.is_tiled(window))
            .map(DesktopContext::key)
    }

    pub fn keys(&self) -> Vec<DeskKey> {
        let mut keys: Vec<DeskKey> = self.contexts.keys().copied().collect();
        keys.sort();
        keys
    }

    pub fn contexts(&self) -> impl Iterator<Item = &DesktopContext> {
        self.contexts.values()
    }

    pub fn contexts_mut(&mut self) -> impl Iterator<Item = &mut DesktopContext> {
        self.contexts.values_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context_with(columns: &[&[WindowId]]) -> DesktopContext {
        let mut ctx = DesktopContext::new(DeskKey::default(), 3);
        for (i, windows) in columns.iter().enumerate() {
            ctx.columns[i] = windows.to_vec();
            ctx.tiled_count += windows.len();
        }
        ctx
    }

    #[test]
    fn test_column_queries() {
        let ctx = context_with(&[&[1, 2], &[3]]);
        assert_eq!(ctx.column_count(), 2);
        assert_eq!(ctx.column_of(3), Some(1));
        assert_eq!(ctx.position_of(2), Some((0, 1)));
        assert_eq!(ctx.column_of(9), None);
        assert_eq!(ctx.column(1), &[3]);
        assert!(ctx.column(MAX_COLUMNS + 3).is_empty());
        assert_eq!(ctx.tiled_windows().collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn test_is_alone() {
        assert!(context_with(&[&[1]]).is_alone(1));
        assert!(!context_with(&[&[1, 2]]).is_alone(1));
        assert!(!context_with(&[&[1], &[2]]).is_alone(1));
    }

    #[test]
    fn test_shift_left_from() {
        let mut ctx = context_with(&[&[1], &[], &[2, 3], &[4]]);
        ctx.shift_left_from(1);
        assert_eq!(ctx.column(0), &[1]);
        assert_eq!(ctx.column(1), &[2, 3]);
        assert_eq!(ctx.column(2), &[4]);
        assert!(ctx.column(3).is_empty());
        assert_eq!(ctx.column_count(), 3);
    }

    #[test]
    fn test_desired_columns_clamped() {
        let ctx = DesktopContext::new(DeskKey::default(), 99);
        assert_eq!(ctx.desired_columns(), MAX_COLUMNS);
    }

    #[test]
    fn test_registry_lazy_creation() {
        let mut settings = TilingConfig::default();
        settings.desks.push(crate::config::DeskColumns {
            zone: 0,
            x: 1,
            y: 0,
            columns: 4,
        });
        let mut registry = DesktopRegistry::new();

        assert!(registry.get(DeskKey::new(0, 1, 0)).is_none());
        assert_eq!(registry.get_or_create(DeskKey::new(0, 1, 0), &settings).desired_columns(), 4);
        assert_eq!(registry.get_or_create(DeskKey::new(0, 0, 0), &settings).desired_columns(), 2);
        assert_eq!(registry.keys(), vec![DeskKey::new(0, 0, 0), DeskKey::new(0, 1, 0)]);
    }

    #[test]
    fn test_registry_switching_and_active() {
        let mut registry = DesktopRegistry::new();
        assert_eq!(registry.active(), None);
        registry.set_switching(true);
        assert!(registry.is_switching());
        registry.set_active(DeskKey::new(0, 1, 1));
        registry.set_switching(false);
        assert_eq!(registry.active(), Some(DeskKey::new(0, 1, 1)));
        assert!(!registry.is_switching());
    }

    #[test]
    fn test_floating_set() {
        let mut ctx = DesktopContext::new(DeskKey::default(), 2);
        ctx.add_floating(5, Some(Rect::new(1, 2, 3, 4)));
        assert!(ctx.is_floating(5));
        assert_eq!(ctx.take_floating(5), Some(Some(Rect::new(1, 2, 3, 4))));
        assert!(!ctx.is_floating(5));
        assert_eq!(ctx.take_floating(5), None);
    }
}
