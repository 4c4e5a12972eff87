//! Per-window geometry records for tiled windows.
//!
//! Records live in an arena and are reached through a dense window → key map,
//! so removing a window never leaves a dangling reference behind in another
//! desktop's bookkeeping.

use std::collections::HashMap;

use slotmap::{new_key_type, SlotMap};

use crate::error::{Result, TilingError};
use crate::types::{Rect, WindowId};

new_key_type! {
    /// Unique identifier for a geometry record in the arena
    pub struct RecordId;
}

/// What the engine knows about one tiled window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowGeometryRecord {
    /// Geometry the engine last told the host to apply
    pub expected: Rect,
    /// Geometry captured when the window entered tiling
    pub original: Rect,
    /// Label assigned while a swap session is running
    pub overlay_key: Option<char>,
}

impl WindowGeometryRecord {
    pub fn new(expected: Rect, original: Rect) -> Self {
        Self {
            expected,
            original,
            overlay_key: None,
        }
    }
}

/// Arena of geometry records keyed by window.
#[derive(Debug, Default)]
pub struct GeometryTracker {
    records: SlotMap<RecordId, WindowGeometryRecord>,
    by_window: HashMap<WindowId, RecordId>,
}

impl GeometryTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking a window. An existing record is replaced.
    pub fn insert(&mut self, window: WindowId, record: WindowGeometryRecord) -> RecordId {
        if let Some(old) = self.by_window.remove(&window) {
            self.records.remove(old);
        }
        let id = self.records.insert(record);
        self.by_window.insert(window, id);
        id
    }

    /// Stop tracking a window, returning its record.
    pub fn remove(&mut self, window: WindowId) -> Option<WindowGeometryRecord> {
        let id = self.by_window.remove(&window)?;
        self.records.remove(id)
    }

    pub fn contains(&self, window: WindowId) -> bool {
        self.by_window.contains_key(&window)
    }

    pub fn get(&self, window: WindowId) -> Option<&WindowGeometryRecord> {
        self.by_window.get(&window).and_then(|&id| self.records.get(id))
    }

    pub fn get_mut(&mut self, window: WindowId) -> Option<&mut WindowGeometryRecord> {
        let id = *self.by_window.get(&window)?;
        self.records.get_mut(id)
    }

    /// Record lookup that treats absence as an internal consistency error.
    pub fn record(&self, window: WindowId) -> Result<&WindowGeometryRecord> {
        self.get(window).ok_or(TilingError::MissingRecord(window))
    }

    pub fn record_mut(&mut self, window: WindowId) -> Result<&mut WindowGeometryRecord> {
        self.get_mut(window).ok_or(TilingError::MissingRecord(window))
    }

    pub fn expected(&self, window: WindowId) -> Result<Rect> {
        Ok(self.record(window)?.expected)
    }

    pub fn set_expected(&mut self, window: WindowId, rect: Rect) -> Result<()> {
        self.record_mut(window)?.expected = rect;
        Ok(())
    }

    /// Fail unless every window in `windows` has a record.
    pub fn ensure_all<'a>(&self, windows: impl IntoIterator<Item = &'a WindowId>) -> Result<()> {
        for &window in windows {
            if !self.contains(window) {
                return Err(TilingError::MissingRecord(window));
            }
        }
        Ok(())
    }

    /// Exchange the expected geometry of two windows.
    pub fn swap_expected(&mut self, a: WindowId, b: WindowId) -> Result<()> {
        let first = self.expected(a)?;
        let second = self.expected(b)?;
        self.set_expected(a, second)?;
        self.set_expected(b, first)
    }

    /// Forget every overlay label.
    pub fn clear_overlay_keys(&mut self) {
        for record in self.records.values_mut() {
            record.overlay_key = None;
        }
    }

    pub fn windows(&self) -> impl Iterator<Item = WindowId> + '_ {
        self.by_window.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.by_window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_window.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(x: i32) -> WindowGeometryRecord {
        WindowGeometryRecord::new(Rect::new(x, 0, 100, 100), Rect::new(x, 0, 100, 100))
    }

    #[test]
    fn test_insert_and_remove() {
        let mut tracker = GeometryTracker::new();
        tracker.insert(1, record(0));
        tracker.insert(2, record(100));

        assert_eq!(tracker.len(), 2);
        assert!(tracker.contains(1));
        assert_eq!(tracker.expected(2).unwrap().x, 100);

        let removed = tracker.remove(1).unwrap();
        assert_eq!(removed.original.x, 0);
        assert!(!tracker.contains(1));
        assert!(tracker.remove(1).is_none());
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn test_reinsert_replaces_record() {
        let mut tracker = GeometryTracker::new();
        tracker.insert(1, record(0));
        tracker.insert(1, record(50));

        assert_eq!(tracker.len(), 1);
        assert_eq!(tracker.expected(1).unwrap().x, 50);
    }

    #[test]
    fn test_missing_record_error() {
        let tracker = GeometryTracker::new();
        assert_eq!(tracker.record(7).unwrap_err(), TilingError::MissingRecord(7));
        assert!(tracker.ensure_all(&[7]).is_err());
    }

    #[test]
    fn test_swap_expected() {
        let mut tracker = GeometryTracker::new();
        tracker.insert(1, record(0));
        tracker.insert(2, record(100));

        tracker.swap_expected(1, 2).unwrap();
        assert_eq!(tracker.expected(1).unwrap().x, 100);
        assert_eq!(tracker.expected(2).unwrap().x, 0);
        // Originals are not part of the swap
        assert_eq!(tracker.get(1).unwrap().original.x, 0);
    }

    #[test]
    fn test_clear_overlay_keys() {
        let mut tracker = GeometryTracker::new();
        tracker.insert(1, record(0));
        tracker.get_mut(1).unwrap().overlay_key = Some('a');

        tracker.clear_overlay_keys();
        assert_eq!(tracker.get(1).unwrap().overlay_key, None);
    }
}
