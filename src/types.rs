//! Shared types used across multiple modules.
//!
//! Geometry, desktop identity and the small value types exchanged between the
//! engine and its host live here so that the engine, the IPC layer and the X11
//! adapter can all depend on them without depending on each other.

use std::fmt;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// Opaque window handle supplied by the host (an X11 window id).
pub type WindowId = u32;

/// Maximum number of columns a desktop can be split into.
pub const MAX_COLUMNS: usize = 8;

/// A rectangle representing geometry.
///
/// Width and height are signed so that deltas between two rectangles can be
/// computed without casts; the engine never produces a negative extent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    /// X coordinate one past the right edge
    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    /// Y coordinate one past the bottom edge
    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    /// Center X coordinate
    pub fn center_x(&self) -> i32 {
        self.x + self.width / 2
    }

    /// Center Y coordinate
    pub fn center_y(&self) -> i32 {
        self.y + self.height / 2
    }

    pub fn contains_point(&self, x: i32, y: i32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// Whether the two rectangles share any area.
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}+{}+{}", self.width, self.height, self.x, self.y)
    }
}

/// Stable identity of a virtual desktop: the zone (screen) it lives on and
/// its coordinate in that zone's desk grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct DeskKey {
    pub zone: u32,
    pub x: i32,
    pub y: i32,
}

impl DeskKey {
    pub fn new(zone: u32, x: i32, y: i32) -> Self {
        Self { zone, x, y }
    }
}

impl fmt::Display for DeskKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{},{}", self.zone, self.x, self.y)
    }
}

bitflags! {
    /// Axes along which a window is (or should be) maximized.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Maximize: u8 {
        const HORIZONTAL = 0b01;
        const VERTICAL = 0b10;
        const BOTH = Self::HORIZONTAL.bits() | Self::VERTICAL.bits();
    }
}

/// Named window decoration styles the engine asks the host for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decoration {
    /// Minimal one-pixel border used for tiled windows
    Pixel,
    /// The host's regular decoration, used for floating windows
    Default,
}

impl Decoration {
    pub fn name(&self) -> &'static str {
        match self {
            Decoration::Pixel => "pixel",
            Decoration::Default => "default",
        }
    }
}

/// ICCCM size hints the engine cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SizeHints {
    pub step_w: i32,
    pub step_h: i32,
    pub base_w: i32,
    pub base_h: i32,
    pub min_w: i32,
    pub min_h: i32,
}

impl SizeHints {
    /// Width increment, never smaller than one pixel
    pub fn step_width(&self) -> i32 {
        self.step_w.max(1)
    }

    /// Height increment, never smaller than one pixel
    pub fn step_height(&self) -> i32 {
        self.step_h.max(1)
    }

    /// Smallest height a neighbor may be shrunk to
    pub fn floor_height(&self) -> i32 {
        self.base_h.max(1)
    }
}

/// Which parts of a window's state changed in a placement event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Changes {
    pub size: bool,
    pub position: bool,
    pub border: bool,
}

impl Changes {
    pub fn any(&self) -> bool {
        self.size || self.position || self.border
    }

    /// Flags describing the difference between two geometries.
    pub fn between(old: &Rect, new: &Rect) -> Self {
        Self {
            size: old.width != new.width || old.height != new.height,
            position: old.x != new.x || old.y != new.y,
            border: false,
        }
    }
}

/// EWMH strut partial - space reserved at screen edges by docks/panels
#[derive(Debug, Clone, Copy, Default)]
pub struct StrutPartial {
    pub left: u32,
    pub right: u32,
    pub top: u32,
    pub bottom: u32,
}

impl StrutPartial {
    /// Shrink `area` by this strut.
    pub fn reserve(&self, area: Rect) -> Rect {
        Rect::new(
            area.x + self.left as i32,
            area.y + self.top as i32,
            (area.width - self.left as i32 - self.right as i32).max(1),
            (area.height - self.top as i32 - self.bottom as i32).max(1),
        )
    }
}
