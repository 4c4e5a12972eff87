//! The contract between the layout engine and the window manager hosting it.
//!
//! The host owns the real windows. It reports lifecycle and geometry events to
//! the engine and carries out the absolute move/resize/maximize commands the
//! engine issues back. Everything the engine needs to know about a window that
//! it does not track itself (size hints, dialog classification, focus order,
//! the usable desktop area) is a query on this trait.

use anyhow::Result;

use crate::types::{Changes, Decoration, DeskKey, Maximize, Rect, SizeHints, WindowId};

/// Queries and commands the engine needs from its host.
pub trait Host {
    // Queries

    /// Current geometry of a window as the host sees it.
    fn geometry(&self, window: WindowId) -> Option<Rect>;

    /// Desktop the window currently belongs to.
    fn desk_of(&self, window: WindowId) -> Option<DeskKey>;

    /// Desktop area minus panels and other reserved regions.
    fn usable_area(&self, desk: DeskKey) -> Rect;

    /// Visible windows of a desktop, most recently focused first.
    fn focus_stack(&self, desk: DeskKey) -> Vec<WindowId>;

    fn focused_window(&self) -> Option<WindowId>;

    fn size_hints(&self, window: WindowId) -> SizeHints;

    /// Transient-for or dialog-typed windows.
    fn is_dialog(&self, window: WindowId) -> bool;

    fn maximized(&self, window: WindowId) -> Maximize;

    // Commands

    fn move_resize(&mut self, window: WindowId, rect: Rect);

    fn move_window(&mut self, window: WindowId, x: i32, y: i32);

    fn maximize(&mut self, window: WindowId, axes: Maximize);

    fn unmaximize(&mut self, window: WindowId, axes: Maximize);

    fn set_decoration(&mut self, window: WindowId, decoration: Decoration);

    /// Tidy up untiled windows after tiling was switched off on a desktop.
    fn smart_cleanup(&mut self, desk: DeskKey);

    /// Take exclusive keyboard input for an interactive session.
    fn grab_keyboard(&mut self) -> Result<()>;

    fn release_keyboard(&mut self);

    /// Show a label character over a window.
    fn show_label(&mut self, window: WindowId, key: char);

    /// Remove every label shown by `show_label`.
    fn clear_labels(&mut self);
}

/// A window appeared or its geometry settled after a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacedWindow {
    pub window: WindowId,
    pub desk: DeskKey,
    /// Geometry reported by the host
    pub geometry: Rect,
    pub changes: Changes,
}

/// Keys the interactive controller understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Up,
    Down,
    Left,
    Right,
    Return,
    Escape,
    /// Shift, Control, Alt, Super and friends on their own
    Modifier,
    Other,
}

/// Notifications from the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostEvent {
    WindowPlaced(PlacedWindow),
    WindowHidden { window: WindowId, desk: DeskKey },
    DesktopWillShow { desk: DeskKey },
    DesktopShown { desk: DeskKey },
    WindowDeskSet { window: WindowId, desk: DeskKey },
    /// A key press delivered while the keyboard is grabbed
    KeyPressed(Key),
}
