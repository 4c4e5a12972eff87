//! Event handling for X11 events.
//!
//! Translates X11 events into engine events and user actions. Every change a
//! client or the user makes to a managed window's geometry is applied first
//! and then reported to the engine as a placement, which lets the engine
//! either accept it, redistribute the column around it or snap it back.

use std::time::Instant;

use anyhow::Result;
use x11rb::connection::Connection;
use x11rb::protocol::xproto::*;
use x11rb::protocol::Event;

use coltile::config::keysym_to_key;
use coltile::host::{Host, HostEvent};
use coltile::types::{Maximize, Rect};

use crate::Wm;

/// Smallest size a drag can shrink a window to.
const MIN_DRAG_SIZE: i32 = 20;

/// What a pointer drag does to its window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragKind {
    /// Mod4 + Button1
    Move,
    /// Mod4 + Button3, dragging the bottom-right corner
    Resize,
}

/// A pointer drag in progress
#[derive(Debug, Clone, Copy)]
pub struct DragState {
    pub window: Window,
    pub kind: DragKind,
    /// Mouse start position (root coordinates)
    pub start_x: i32,
    pub start_y: i32,
    /// Window geometry when the drag began
    pub original: Rect,
}

impl DragState {
    /// Geometry for the pointer at (`root_x`, `root_y`).
    pub fn rect_at(&self, root_x: i32, root_y: i32) -> Rect {
        let dx = root_x - self.start_x;
        let dy = root_y - self.start_y;
        let r = self.original;
        match self.kind {
            DragKind::Move => Rect::new(r.x + dx, r.y + dy, r.width, r.height),
            DragKind::Resize => Rect::new(
                r.x,
                r.y,
                (r.width + dx).max(MIN_DRAG_SIZE),
                (r.height + dy).max(MIN_DRAG_SIZE),
            ),
        }
    }
}

impl Wm {
    /// Handle an X11 event
    pub fn handle_event(&mut self, event: Event) -> Result<()> {
        match event {
            Event::MapRequest(e) => {
                self.engine.tracer_mut().trace_event("MapRequest", Some(e.window), "");
                log::debug!("MapRequest for window 0x{:x}", e.window);
                self.manage_window(e.window)?;
            }

            Event::UnmapNotify(e) => {
                // Only the root's copy of the notification counts
                if e.event != self.root() {
                    return Ok(());
                }
                self.engine.tracer_mut().trace_event("UnmapNotify", Some(e.window), "");
                if self.host.take_hidden(e.window) {
                    log::debug!("Ignoring our own unmap of 0x{:x}", e.window);
                } else {
                    log::debug!("UnmapNotify for window 0x{:x}", e.window);
                    self.unmanage_window(e.window);
                }
            }

            Event::DestroyNotify(e) => {
                self.engine.tracer_mut().trace_event("DestroyNotify", Some(e.window), "");
                log::debug!("DestroyNotify for window 0x{:x}", e.window);
                self.unmanage_window(e.window);
            }

            Event::ConfigureRequest(e) => {
                self.engine.tracer_mut().trace_event(
                    "ConfigureRequest",
                    Some(e.window),
                    &format!("{}x{}+{}+{}", e.width, e.height, e.x, e.y),
                );
                if let Some(placed) = self.host.configure_request(&e)? {
                    self.emit(HostEvent::WindowPlaced(placed));
                }
            }

            Event::ClientMessage(e) => {
                self.handle_client_message(e)?;
            }

            Event::PropertyNotify(e) => {
                let atoms = self.host.atoms();
                if e.atom == atoms.net_wm_strut_partial || e.atom == atoms.net_wm_strut {
                    let area = self.usable_area();
                    self.host.refresh_struts(e.window);
                    self.refit_if_area_changed(area);
                } else if e.atom == u32::from(AtomEnum::WM_NORMAL_HINTS) {
                    self.host.refresh_hints(e.window);
                }
            }

            Event::EnterNotify(e) => {
                // Focus follows mouse, but not while a drag or session owns input
                if self.host.is_managed(e.event)
                    && self.drag_state.is_none()
                    && !self.engine.input().is_active()
                {
                    self.engine.tracer_mut().trace_event("EnterNotify", Some(e.event), "");
                    self.host.focus_window(e.event)?;
                }
            }

            Event::KeyPress(e) => {
                self.engine
                    .tracer_mut()
                    .trace_event("KeyPress", None, &format!("keycode={}", e.detail));
                self.handle_key_press(e)?;
            }

            Event::ButtonPress(e) => {
                self.engine
                    .tracer_mut()
                    .trace_event("ButtonPress", Some(e.event), &format!("button={}", e.detail));
                self.handle_button_press(e)?;
            }

            Event::MotionNotify(e) => {
                self.handle_motion(e);
            }

            Event::ButtonRelease(e) => {
                self.handle_button_release(e)?;
            }

            Event::Expose(e) => {
                if e.count == 0 {
                    self.host.expose(e.window)?;
                }
            }

            _ => {}
        }

        Ok(())
    }

    /// Handle a client message event (EWMH requests)
    fn handle_client_message(&mut self, event: ClientMessageEvent) -> Result<()> {
        let msg_type = event.type_;
        let data = event.data.as_data32();
        let window = event.window;
        self.engine
            .tracer_mut()
            .trace_event("ClientMessage", Some(window), &format!("type={}", msg_type));

        let atoms = self.host.atoms();
        if msg_type == atoms.net_wm_state {
            // data[0]: action (0=remove, 1=add, 2=toggle)
            // data[1], data[2]: state atoms to change
            let mut axes = Maximize::empty();
            for state in [data[1], data[2]] {
                if state == atoms.net_wm_state_maximized_horz {
                    axes |= Maximize::HORIZONTAL;
                } else if state == atoms.net_wm_state_maximized_vert {
                    axes |= Maximize::VERTICAL;
                }
            }
            if axes.is_empty() {
                return Ok(());
            }
            log::info!(
                "ClientMessage: _NET_WM_STATE for 0x{:x}, action={}, axes={:?}",
                window,
                data[0],
                axes
            );
            if let Some(placed) = self.host.request_maximize(window, data[0], axes) {
                self.emit(HostEvent::WindowPlaced(placed));
            }
        } else if msg_type == atoms.net_active_window {
            log::info!("ClientMessage: _NET_ACTIVE_WINDOW for 0x{:x}", window);
            if let Some(desk) = self.host.desk_of(window) {
                self.switch_desk(desk)?;
                self.host.focus_window(window)?;
            }
        } else if msg_type == atoms.net_current_desktop {
            let desk = self.host.desk_from_index(data[0]);
            log::info!("ClientMessage: _NET_CURRENT_DESKTOP to {}", desk);
            self.switch_desk(desk)?;
        } else if msg_type == atoms.net_wm_desktop {
            let desk = self.host.desk_from_index(data[0]);
            log::info!("ClientMessage: _NET_WM_DESKTOP move 0x{:x} to {}", window, desk);
            self.send_to_desk(window, desk)?;
        }

        Ok(())
    }

    /// Start a move or resize drag on a managed window
    fn handle_button_press(&mut self, event: ButtonPressEvent) -> Result<()> {
        let window = event.event;
        let kind = match event.detail {
            1 => DragKind::Move,
            3 => DragKind::Resize,
            _ => return Ok(()),
        };
        let Some(original) = self.host.geometry(window) else {
            return Ok(());
        };

        self.host.focus_window(window)?;
        self.conn().grab_pointer(
            false,
            self.root(),
            EventMask::BUTTON_RELEASE | EventMask::POINTER_MOTION,
            GrabMode::ASYNC,
            GrabMode::ASYNC,
            x11rb::NONE,
            x11rb::NONE,
            x11rb::CURRENT_TIME,
        )?;
        self.conn().flush()?;

        log::info!("Starting {:?} drag on 0x{:x} at {}", kind, window, original);
        self.drag_state = Some(DragState {
            window,
            kind,
            start_x: event.root_x as i32,
            start_y: event.root_y as i32,
            original,
        });
        Ok(())
    }

    /// Apply the drag geometry and let the engine react to it
    fn handle_motion(&mut self, event: MotionNotifyEvent) {
        let Some(drag) = self.drag_state else {
            return;
        };
        let rect = drag.rect_at(event.root_x as i32, event.root_y as i32);
        if self.host.geometry(drag.window) == Some(rect) {
            return;
        }
        if let Some(placed) = self.host.user_move_resize(drag.window, rect) {
            self.emit(HostEvent::WindowPlaced(placed));
        }
    }

    /// Handle button release event (end of drag)
    fn handle_button_release(&mut self, event: ButtonReleaseEvent) -> Result<()> {
        let Some(drag) = self.drag_state.take() else {
            return Ok(());
        };

        self.conn().ungrab_pointer(x11rb::CURRENT_TIME)?;
        self.conn().flush()?;

        log::info!(
            "{:?} drag of 0x{:x} finished at ({}, {})",
            drag.kind,
            drag.window,
            event.root_x,
            event.root_y
        );
        Ok(())
    }

    /// Handle a key press event
    fn handle_key_press(&mut self, event: KeyPressEvent) -> Result<()> {
        // Convert state to u16 and mask out NumLock and CapsLock for comparison
        let state_u16 = u16::from(event.state);
        let clean_state = state_u16 & !(u16::from(ModMask::M2) | u16::from(ModMask::LOCK));

        // Get the keysym for this keycode
        let setup = self.conn().setup();
        let min_keycode = setup.min_keycode;
        let max_keycode = setup.max_keycode;

        let mapping = self
            .conn()
            .get_keyboard_mapping(min_keycode, max_keycode - min_keycode + 1)?
            .reply()?;

        let keysyms_per_keycode = mapping.keysyms_per_keycode as usize;
        let idx = (event.detail - min_keycode) as usize * keysyms_per_keycode;
        let keysym = mapping.keysyms.get(idx).copied().unwrap_or(0);

        log::debug!(
            "KeyPress: keycode={}, keysym=0x{:x}, state=0x{:x}, clean_state=0x{:x}",
            event.detail,
            keysym,
            state_u16,
            clean_state
        );

        // While a session holds the keyboard every key belongs to it
        if self.engine.input().is_active() {
            let key = keysym_to_key(keysym);
            self.engine.key_pressed(&mut self.host, key, Instant::now());
            return Ok(());
        }

        // Find matching action from configured keybindings
        let matched_action = self
            .keybindings
            .iter()
            .find(|(_, binding)| binding.keysym == keysym && binding.modifiers == clean_state)
            .map(|(action, _)| *action);

        if let Some(action) = matched_action {
            self.execute_action(action)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drag(kind: DragKind) -> DragState {
        DragState {
            window: 1,
            kind,
            start_x: 100,
            start_y: 100,
            original: Rect::new(0, 0, 500, 400),
        }
    }

    #[test]
    fn test_move_drag_keeps_size() {
        assert_eq!(drag(DragKind::Move).rect_at(130, 90), Rect::new(30, -10, 500, 400));
    }

    #[test]
    fn test_resize_drag_moves_corner() {
        assert_eq!(drag(DragKind::Resize).rect_at(150, 80), Rect::new(0, 0, 550, 380));
    }

    #[test]
    fn test_resize_drag_floor() {
        let rect = drag(DragKind::Resize).rect_at(-1000, -1000);
        assert_eq!(rect.width, MIN_DRAG_SIZE);
        assert_eq!(rect.height, MIN_DRAG_SIZE);
    }
}
