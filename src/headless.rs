//! In-memory host without a display server.
//!
//! Keeps a table of windows and applies the engine's commands to it the way a
//! window manager would, recording every command in order. Used by the tests
//! and handy for exercising the engine without X.

use std::collections::BTreeMap;

use anyhow::{bail, Result};

use crate::host::{Host, PlacedWindow};
use crate::types::{Changes, Decoration, DeskKey, Maximize, Rect, SizeHints, WindowId};

/// A command the engine issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostCommand {
    MoveResize(WindowId, Rect),
    Move(WindowId, i32, i32),
    Maximize(WindowId, Maximize),
    Unmaximize(WindowId, Maximize),
    Decoration(WindowId, Decoration),
    SmartCleanup(DeskKey),
    GrabKeyboard,
    ReleaseKeyboard,
    ShowLabel(WindowId, char),
    ClearLabels,
}

/// Host-side state of one window.
#[derive(Debug, Clone)]
pub struct HeadlessWindow {
    pub desk: DeskKey,
    pub geometry: Rect,
    pub maximized: Maximize,
    pub decoration: Decoration,
    pub hints: SizeHints,
    pub dialog: bool,
}

#[derive(Debug)]
pub struct HeadlessHost {
    area: Rect,
    windows: BTreeMap<WindowId, HeadlessWindow>,
    /// Most recently focused first
    focus: Vec<WindowId>,
    commands: Vec<HostCommand>,
    labels: BTreeMap<WindowId, char>,
    grabbed: bool,
    refuse_grab: bool,
}

impl HeadlessHost {
    /// A host whose every desktop has the given usable area.
    pub fn new(area: Rect) -> Self {
        Self {
            area,
            windows: BTreeMap::new(),
            focus: Vec::new(),
            commands: Vec::new(),
            labels: BTreeMap::new(),
            grabbed: false,
            refuse_grab: false,
        }
    }

    /// Create and focus a window, returning the placement event for it.
    pub fn add_window(&mut self, window: WindowId, desk: DeskKey, geometry: Rect) -> PlacedWindow {
        self.windows.insert(
            window,
            HeadlessWindow {
                desk,
                geometry,
                maximized: Maximize::empty(),
                decoration: Decoration::Default,
                hints: SizeHints::default(),
                dialog: false,
            },
        );
        self.focus(window);
        PlacedWindow {
            window,
            desk,
            geometry,
            changes: Changes {
                size: true,
                position: true,
                border: false,
            },
        }
    }

    pub fn remove_window(&mut self, window: WindowId) {
        self.windows.remove(&window);
        self.focus.retain(|&w| w != window);
        self.labels.remove(&window);
    }

    pub fn focus(&mut self, window: WindowId) {
        self.focus.retain(|&w| w != window);
        self.focus.insert(0, window);
    }

    pub fn set_hints(&mut self, window: WindowId, hints: SizeHints) {
        if let Some(w) = self.windows.get_mut(&window) {
            w.hints = hints;
        }
    }

    pub fn set_dialog(&mut self, window: WindowId, dialog: bool) {
        if let Some(w) = self.windows.get_mut(&window) {
            w.dialog = dialog;
        }
    }

    pub fn set_desk(&mut self, window: WindowId, desk: DeskKey) {
        if let Some(w) = self.windows.get_mut(&window) {
            w.desk = desk;
        }
    }

    /// Change a window's geometry from the host side (a user drag or a client
    /// request) and return the event the host would report.
    pub fn user_move_resize(&mut self, window: WindowId, rect: Rect) -> Option<PlacedWindow> {
        let w = self.windows.get_mut(&window)?;
        let changes = Changes::between(&w.geometry, &rect);
        w.geometry = rect;
        Some(PlacedWindow {
            window,
            desk: w.desk,
            geometry: rect,
            changes,
        })
    }

    /// Report a window's current geometry with the given change flags.
    pub fn placed(&self, window: WindowId, changes: Changes) -> Option<PlacedWindow> {
        let w = self.windows.get(&window)?;
        Some(PlacedWindow {
            window,
            desk: w.desk,
            geometry: w.geometry,
            changes,
        })
    }

    /// Make the next keyboard grab fail.
    pub fn refuse_grab(&mut self, refuse: bool) {
        self.refuse_grab = refuse;
    }

    pub fn window(&self, window: WindowId) -> Option<&HeadlessWindow> {
        self.windows.get(&window)
    }

    pub fn commands(&self) -> &[HostCommand] {
        &self.commands
    }

    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }

    pub fn labels(&self) -> &BTreeMap<WindowId, char> {
        &self.labels
    }

    pub fn is_grabbed(&self) -> bool {
        self.grabbed
    }

    pub fn area(&self) -> Rect {
        self.area
    }

    /// Change the usable area, as a panel reserving screen space would.
    pub fn set_area(&mut self, area: Rect) {
        self.area = area;
    }
}

impl Host for HeadlessHost {
    fn geometry(&self, window: WindowId) -> Option<Rect> {
        self.windows.get(&window).map(|w| w.geometry)
    }

    fn desk_of(&self, window: WindowId) -> Option<DeskKey> {
        self.windows.get(&window).map(|w| w.desk)
    }

    fn usable_area(&self, _desk: DeskKey) -> Rect {
        self.area
    }

    fn focus_stack(&self, desk: DeskKey) -> Vec<WindowId> {
        self.focus
            .iter()
            .copied()
            .filter(|w| self.windows.get(w).is_some_and(|w| w.desk == desk))
            .collect()
    }

    fn focused_window(&self) -> Option<WindowId> {
        self.focus.first().copied()
    }

    fn size_hints(&self, window: WindowId) -> SizeHints {
        self.windows.get(&window).map(|w| w.hints).unwrap_or_default()
    }

    fn is_dialog(&self, window: WindowId) -> bool {
        self.windows.get(&window).is_some_and(|w| w.dialog)
    }

    fn maximized(&self, window: WindowId) -> Maximize {
        self.windows
            .get(&window)
            .map(|w| w.maximized)
            .unwrap_or_default()
    }

    fn move_resize(&mut self, window: WindowId, rect: Rect) {
        self.commands.push(HostCommand::MoveResize(window, rect));
        if let Some(w) = self.windows.get_mut(&window) {
            w.geometry = rect;
        }
    }

    fn move_window(&mut self, window: WindowId, x: i32, y: i32) {
        self.commands.push(HostCommand::Move(window, x, y));
        if let Some(w) = self.windows.get_mut(&window) {
            w.geometry.x = x;
            w.geometry.y = y;
        }
    }

    fn maximize(&mut self, window: WindowId, axes: Maximize) {
        self.commands.push(HostCommand::Maximize(window, axes));
        let area = self.area;
        if let Some(w) = self.windows.get_mut(&window) {
            w.maximized |= axes;
            if axes.contains(Maximize::HORIZONTAL) {
                w.geometry.x = area.x;
                w.geometry.width = area.width;
            }
            if axes.contains(Maximize::VERTICAL) {
                w.geometry.y = area.y;
                w.geometry.height = area.height;
            }
        }
    }

    fn unmaximize(&mut self, window: WindowId, axes: Maximize) {
        self.commands.push(HostCommand::Unmaximize(window, axes));
        if let Some(w) = self.windows.get_mut(&window) {
            w.maximized.remove(axes);
        }
    }

    fn set_decoration(&mut self, window: WindowId, decoration: Decoration) {
        self.commands.push(HostCommand::Decoration(window, decoration));
        if let Some(w) = self.windows.get_mut(&window) {
            w.decoration = decoration;
        }
    }

    fn smart_cleanup(&mut self, desk: DeskKey) {
        self.commands.push(HostCommand::SmartCleanup(desk));
    }

    fn grab_keyboard(&mut self) -> Result<()> {
        if self.refuse_grab {
            bail!("keyboard already grabbed by another client");
        }
        self.commands.push(HostCommand::GrabKeyboard);
        self.grabbed = true;
        Ok(())
    }

    fn release_keyboard(&mut self) {
        self.commands.push(HostCommand::ReleaseKeyboard);
        self.grabbed = false;
    }

    fn show_label(&mut self, window: WindowId, key: char) {
        self.commands.push(HostCommand::ShowLabel(window, key));
        self.labels.insert(window, key);
    }

    fn clear_labels(&mut self) {
        self.commands.push(HostCommand::ClearLabels);
        self.labels.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DESK: DeskKey = DeskKey { zone: 0, x: 0, y: 0 };

    #[test]
    fn test_maximize_fills_axis() {
        let mut host = HeadlessHost::new(Rect::new(0, 20, 1000, 780));
        host.add_window(1, DESK, Rect::new(100, 100, 200, 200));

        host.maximize(1, Maximize::VERTICAL);
        assert_eq!(host.geometry(1), Some(Rect::new(100, 20, 200, 780)));
        assert_eq!(host.maximized(1), Maximize::VERTICAL);

        host.unmaximize(1, Maximize::BOTH);
        assert!(host.maximized(1).is_empty());
        // Unmaximizing leaves geometry alone
        assert_eq!(host.geometry(1), Some(Rect::new(100, 20, 200, 780)));
    }

    #[test]
    fn test_focus_stack_per_desk() {
        let mut host = HeadlessHost::new(Rect::new(0, 0, 100, 100));
        let other = DeskKey::new(0, 1, 0);
        host.add_window(1, DESK, Rect::default());
        host.add_window(2, other, Rect::default());
        host.add_window(3, DESK, Rect::default());
        host.focus(1);

        assert_eq!(host.focus_stack(DESK), vec![1, 3]);
        assert_eq!(host.focus_stack(other), vec![2]);
        assert_eq!(host.focused_window(), Some(1));
    }

    #[test]
    fn test_user_move_resize_reports_changes() {
        let mut host = HeadlessHost::new(Rect::new(0, 0, 100, 100));
        host.add_window(1, DESK, Rect::new(0, 0, 50, 50));

        let placed = host.user_move_resize(1, Rect::new(0, 0, 60, 50)).unwrap();
        assert!(placed.changes.size);
        assert!(!placed.changes.position);
        assert!(host.user_move_resize(9, Rect::default()).is_none());
    }

    #[test]
    fn test_refused_grab() {
        let mut host = HeadlessHost::new(Rect::new(0, 0, 100, 100));
        host.refuse_grab(true);
        assert!(host.grab_keyboard().is_err());
        assert!(!host.is_grabbed());
    }
}
