//! Window property query functions.
//!
//! Stateless functions for querying X11 window properties.

use x11rb::connection::Connection;
use x11rb::protocol::xproto::*;

use coltile::types::{SizeHints, StrutPartial};

use crate::ewmh::Atoms;

// WM_NORMAL_HINTS flag bits (ICCCM 4.1.2.3)
const P_MIN_SIZE: u32 = 1 << 4;
const P_RESIZE_INC: u32 = 1 << 6;
const P_BASE_SIZE: u32 = 1 << 8;

/// Get the window title from _NET_WM_NAME or WM_NAME.
pub fn get_window_title(conn: &impl Connection, atoms: &Atoms, window: Window) -> String {
    // Try _NET_WM_NAME first
    if let Ok(reply) = conn.get_property(
        false,
        window,
        atoms.net_wm_name,
        atoms.utf8_string,
        0,
        1024,
    ) {
        if let Ok(reply) = reply.reply() {
            if !reply.value.is_empty() {
                if let Ok(s) = String::from_utf8(reply.value) {
                    return s;
                }
            }
        }
    }

    // Fall back to WM_NAME
    if let Ok(reply) = conn.get_property(
        false,
        window,
        AtomEnum::WM_NAME,
        AtomEnum::STRING,
        0,
        1024,
    ) {
        if let Ok(reply) = reply.reply() {
            if !reply.value.is_empty() {
                if let Ok(s) = String::from_utf8(reply.value) {
                    return s;
                }
            }
        }
    }

    format!("0x{:x}", window)
}

/// Read the window's _NET_WM_WINDOW_TYPE list.
fn window_types(conn: &impl Connection, atoms: &Atoms, window: Window) -> Vec<Atom> {
    let reply = match conn.get_property(
        false,
        window,
        atoms.net_wm_window_type,
        AtomEnum::ATOM,
        0,
        1024,
    ) {
        Ok(cookie) => match cookie.reply() {
            Ok(reply) => reply,
            Err(_) => return Vec::new(),
        },
        Err(_) => return Vec::new(),
    };
    reply.value32().map(|v| v.collect()).unwrap_or_default()
}

/// Check if a window is a dock (status bar like polybar).
pub fn is_dock_window(conn: &impl Connection, atoms: &Atoms, window: Window) -> bool {
    window_types(conn, atoms, window).contains(&atoms.net_wm_window_type_dock)
}

/// Check if a window is a dialog: transient for another window, or typed
/// _NET_WM_WINDOW_TYPE_DIALOG.
pub fn is_dialog(conn: &impl Connection, atoms: &Atoms, window: Window) -> bool {
    if let Ok(cookie) = conn.get_property(
        false,
        window,
        AtomEnum::WM_TRANSIENT_FOR,
        AtomEnum::WINDOW,
        0,
        1,
    ) {
        if let Ok(reply) = cookie.reply() {
            let parent = reply.value32().and_then(|mut v| v.next()).unwrap_or(0);
            if parent != 0 {
                log::debug!("Window 0x{:x} is transient for 0x{:x}", window, parent);
                return true;
            }
        }
    }

    window_types(conn, atoms, window).contains(&atoms.net_wm_window_type_dialog)
}

/// Read the ICCCM size hints (returns Default if none set).
pub fn read_size_hints(conn: &impl Connection, window: Window) -> SizeHints {
    let reply = match conn.get_property(
        false,
        window,
        AtomEnum::WM_NORMAL_HINTS,
        AtomEnum::WM_SIZE_HINTS,
        0,
        18,
    ) {
        Ok(cookie) => match cookie.reply() {
            Ok(reply) => reply,
            Err(_) => return SizeHints::default(),
        },
        Err(_) => return SizeHints::default(),
    };

    let values: Vec<u32> = reply.value32().map(|v| v.collect()).unwrap_or_default();
    if values.len() < 17 {
        return SizeHints::default();
    }
    size_hints_from_values(&values)
}

/// Decode a WM_SIZE_HINTS property.
fn size_hints_from_values(values: &[u32]) -> SizeHints {
    let flags = values[0];
    let mut hints = SizeHints::default();

    if flags & P_MIN_SIZE != 0 {
        hints.min_w = values[5] as i32;
        hints.min_h = values[6] as i32;
    }
    if flags & P_RESIZE_INC != 0 {
        hints.step_w = values[9] as i32;
        hints.step_h = values[10] as i32;
    }
    if flags & P_BASE_SIZE != 0 {
        hints.base_w = values[15] as i32;
        hints.base_h = values[16] as i32;
    } else if flags & P_MIN_SIZE != 0 {
        // ICCCM: base size falls back to the minimum size
        hints.base_w = hints.min_w;
        hints.base_h = hints.min_h;
    }
    hints
}

/// Read strut partial from a window (returns Default if none set).
pub fn read_struts(conn: &impl Connection, atoms: &Atoms, window: Window) -> StrutPartial {
    // _NET_WM_STRUT_PARTIAL starts with the same four values as _NET_WM_STRUT
    for atom in [atoms.net_wm_strut_partial, atoms.net_wm_strut] {
        if let Ok(cookie) = conn.get_property(false, window, atom, AtomEnum::CARDINAL, 0, 4) {
            if let Ok(reply) = cookie.reply() {
                let values: Vec<u32> = reply.value32().map(|v| v.collect()).unwrap_or_default();
                if values.len() >= 4 {
                    return StrutPartial {
                        left: values[0],
                        right: values[1],
                        top: values[2],
                        bottom: values[3],
                    };
                }
            }
        }
    }

    StrutPartial::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hints_property(flags: u32) -> Vec<u32> {
        let mut values = vec![0u32; 18];
        values[0] = flags;
        values[5] = 100;
        values[6] = 50;
        values[9] = 7;
        values[10] = 13;
        values[15] = 4;
        values[16] = 30;
        values
    }

    #[test]
    fn test_size_hints_all_flags() {
        let hints = size_hints_from_values(&hints_property(P_MIN_SIZE | P_RESIZE_INC | P_BASE_SIZE));
        assert_eq!(hints.min_w, 100);
        assert_eq!(hints.min_h, 50);
        assert_eq!(hints.step_w, 7);
        assert_eq!(hints.step_h, 13);
        assert_eq!(hints.base_w, 4);
        assert_eq!(hints.base_h, 30);
    }

    #[test]
    fn test_size_hints_base_falls_back_to_min() {
        let hints = size_hints_from_values(&hints_property(P_MIN_SIZE));
        assert_eq!(hints.base_h, 50);
        assert_eq!(hints.step_height(), 1);
    }

    #[test]
    fn test_size_hints_no_flags() {
        assert_eq!(size_hints_from_values(&hints_property(0)), SizeHints::default());
    }
}
