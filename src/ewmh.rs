//! EWMH (Extended Window Manager Hints) atom management.
//!
//! This module provides the X11 atoms coltile reads from clients (window
//! type, struts, size and maximize state) and publishes on the root window
//! (desktop grid, client list, active window).

use anyhow::Result;
use x11rb::protocol::xproto::{Atom, ConnectionExt};
use x11rb::rust_connection::RustConnection;

/// EWMH and ICCCM atoms used by the window manager
pub struct Atoms {
    // Core EWMH atoms
    pub net_supported: Atom,
    pub net_client_list: Atom,
    pub net_active_window: Atom,
    pub net_wm_name: Atom,
    pub net_supporting_wm_check: Atom,
    pub utf8_string: Atom,

    // Desktop grid
    pub net_current_desktop: Atom,
    pub net_number_of_desktops: Atom,
    pub net_desktop_layout: Atom,
    pub net_wm_desktop: Atom,

    // Window state
    pub net_wm_state: Atom,
    pub net_wm_state_maximized_vert: Atom,
    pub net_wm_state_maximized_horz: Atom,

    // Window type
    pub net_wm_window_type: Atom,
    pub net_wm_window_type_dialog: Atom,
    pub net_wm_window_type_dock: Atom,

    // Reserved screen space
    pub net_wm_strut: Atom,
    pub net_wm_strut_partial: Atom,
}

impl Atoms {
    /// Create and intern all required atoms
    pub fn new(conn: &RustConnection) -> Result<Self> {
        Ok(Self {
            net_supported: Self::intern(conn, b"_NET_SUPPORTED")?,
            net_client_list: Self::intern(conn, b"_NET_CLIENT_LIST")?,
            net_active_window: Self::intern(conn, b"_NET_ACTIVE_WINDOW")?,
            net_wm_name: Self::intern(conn, b"_NET_WM_NAME")?,
            net_supporting_wm_check: Self::intern(conn, b"_NET_SUPPORTING_WM_CHECK")?,
            utf8_string: Self::intern(conn, b"UTF8_STRING")?,
            net_current_desktop: Self::intern(conn, b"_NET_CURRENT_DESKTOP")?,
            net_number_of_desktops: Self::intern(conn, b"_NET_NUMBER_OF_DESKTOPS")?,
            net_desktop_layout: Self::intern(conn, b"_NET_DESKTOP_LAYOUT")?,
            net_wm_desktop: Self::intern(conn, b"_NET_WM_DESKTOP")?,
            net_wm_state: Self::intern(conn, b"_NET_WM_STATE")?,
            net_wm_state_maximized_vert: Self::intern(conn, b"_NET_WM_STATE_MAXIMIZED_VERT")?,
            net_wm_state_maximized_horz: Self::intern(conn, b"_NET_WM_STATE_MAXIMIZED_HORZ")?,
            net_wm_window_type: Self::intern(conn, b"_NET_WM_WINDOW_TYPE")?,
            net_wm_window_type_dialog: Self::intern(conn, b"_NET_WM_WINDOW_TYPE_DIALOG")?,
            net_wm_window_type_dock: Self::intern(conn, b"_NET_WM_WINDOW_TYPE_DOCK")?,
            net_wm_strut: Self::intern(conn, b"_NET_WM_STRUT")?,
            net_wm_strut_partial: Self::intern(conn, b"_NET_WM_STRUT_PARTIAL")?,
        })
    }

    /// Intern an atom name
    fn intern(conn: &RustConnection, name: &[u8]) -> Result<Atom> {
        Ok(conn.intern_atom(false, name)?.reply()?.atom)
    }

    /// Atoms advertised in _NET_SUPPORTED
    pub fn supported(&self) -> [Atom; 14] {
        [
            self.net_supported,
            self.net_client_list,
            self.net_active_window,
            self.net_wm_name,
            self.net_supporting_wm_check,
            self.net_current_desktop,
            self.net_number_of_desktops,
            self.net_desktop_layout,
            self.net_wm_desktop,
            self.net_wm_state,
            self.net_wm_state_maximized_vert,
            self.net_wm_state_maximized_horz,
            self.net_wm_window_type,
            self.net_wm_strut_partial,
        ]
    }
}
