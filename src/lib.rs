//! coltile - column-tiling layout engine
//!
//! Partitions each virtual desktop into up to eight vertical columns of
//! stacked windows. The engine is host-agnostic: it receives window events
//! through [`engine::Engine`] and drives windows through the [`host::Host`]
//! trait. The `coltile` binary hosts it as an X11 window manager.

pub mod column;
pub mod config;
pub mod constraint;
pub mod desktop;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod headless;
pub mod host;
pub mod interactive;
pub mod ipc;
pub mod state;
pub mod tracing;
pub mod types;
