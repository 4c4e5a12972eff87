//! The X11 side of the `Host` contract.
//!
//! `X11Host` owns the connection and everything coltile knows about client
//! windows that the engine does not track: which desk a window lives on, its
//! decoration, host-side maximize state, size hints and focus order. The
//! engine's commands arrive through the `Host` trait and are turned into X
//! requests here; request failures are logged and otherwise ignored.
//!
//! Geometry is always the outer frame (border included), so a column of
//! windows tiles the usable area exactly:
//!
//! ```text
//!   x,y ┌─────────────────┐
//!       │ border          │
//!       │  ┌───────────┐  │
//!       │  │  client   │  │  client size = outer size - 2 * border
//!       │  └───────────┘  │
//!       └─────────────────┘ x + width, y + height
//! ```

use std::collections::{HashMap, HashSet};

use anyhow::{bail, Result};
use x11rb::connection::Connection;
use x11rb::protocol::xproto::*;
use x11rb::rust_connection::RustConnection;
use x11rb::wrapper::ConnectionExt as _;

use coltile::config::{DesktopsConfig, Theme};
use coltile::host::{Host, PlacedWindow};
use coltile::types::{Changes, Decoration, DeskKey, Maximize, Rect, SizeHints, StrutPartial, WindowId};

use crate::ewmh::Atoms;
use crate::overlay::LabelOverlay;
use crate::window_query;

/// What the host keeps per managed window.
#[derive(Debug, Clone)]
struct Client {
    desk: DeskKey,
    geometry: Rect,
    maximized: Maximize,
    decoration: Decoration,
    hints: SizeHints,
    dialog: bool,
}

pub struct X11Host {
    conn: RustConnection,
    root: Window,
    atoms: Atoms,
    theme: Theme,
    screen: Rect,
    grid: DesktopsConfig,
    current: DeskKey,
    clients: HashMap<Window, Client>,
    /// Dock windows and the space they reserve
    docks: HashMap<Window, StrutPartial>,
    /// Most recently focused first
    focus: Vec<Window>,
    /// Windows we unmapped ourselves; their UnmapNotify is not a hide
    hidden: HashSet<Window>,
    overlay: LabelOverlay,
    keyboard_grabbed: bool,
}

impl X11Host {
    pub fn new(conn: RustConnection, screen_num: usize, theme: Theme, grid: DesktopsConfig) -> Result<Self> {
        let screen = &conn.setup().roots[screen_num];
        let root = screen.root;
        let area = Rect::new(
            0,
            0,
            screen.width_in_pixels as i32,
            screen.height_in_pixels as i32,
        );
        let atoms = Atoms::new(&conn)?;
        let overlay = LabelOverlay::new(&conn, root, &theme)?;

        Ok(Self {
            conn,
            root,
            atoms,
            theme,
            screen: area,
            grid,
            current: DeskKey::default(),
            clients: HashMap::new(),
            docks: HashMap::new(),
            focus: Vec::new(),
            hidden: HashSet::new(),
            overlay,
            keyboard_grabbed: false,
        })
    }

    pub fn conn(&self) -> &RustConnection {
        &self.conn
    }

    pub fn root(&self) -> Window {
        self.root
    }

    pub fn atoms(&self) -> &Atoms {
        &self.atoms
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
    }

    pub fn grid(&self) -> DesktopsConfig {
        self.grid
    }

    pub fn current_desk(&self) -> DeskKey {
        self.current
    }

    pub fn is_managed(&self, window: Window) -> bool {
        self.clients.contains_key(&window)
    }

    pub fn managed_windows(&self) -> Vec<Window> {
        let mut windows: Vec<Window> = self.clients.keys().copied().collect();
        windows.sort_unstable();
        windows
    }

    // =========================================================================
    // Desk grid
    // =========================================================================

    /// Clamp a grid coordinate into the configured desk grid.
    pub fn desk_at(&self, x: i32, y: i32) -> DeskKey {
        let max_x = self.grid.count_x.max(1) as i32 - 1;
        let max_y = self.grid.count_y.max(1) as i32 - 1;
        DeskKey::new(0, x.clamp(0, max_x), y.clamp(0, max_y))
    }

    /// EWMH desktop index of a desk (row-major).
    pub fn desk_index(&self, desk: DeskKey) -> u32 {
        desk.y as u32 * self.grid.count_x.max(1) + desk.x as u32
    }

    pub fn desk_from_index(&self, index: u32) -> DeskKey {
        let count_x = self.grid.count_x.max(1);
        self.desk_at((index % count_x) as i32, (index / count_x) as i32)
    }

    /// The desk `step` positions away in row-major order, wrapping around.
    pub fn desk_offset(&self, step: i32) -> DeskKey {
        let total = (self.grid.count_x.max(1) * self.grid.count_y.max(1)) as i32;
        let index = (self.desk_index(self.current) as i32 + step).rem_euclid(total);
        self.desk_from_index(index as u32)
    }

    /// Map the windows of `target` and unmap those of the current desk.
    pub fn show_desk(&mut self, target: DeskKey) -> Result<()> {
        let old = self.current;
        self.current = target;

        for (&window, client) in &self.clients {
            if client.desk == old && client.desk != target {
                self.hidden.insert(window);
                self.conn.unmap_window(window)?;
            } else if client.desk == target && client.desk != old {
                self.hidden.remove(&window);
                self.conn.map_window(window)?;
            }
        }

        self.conn.change_property32(
            PropMode::REPLACE,
            self.root,
            self.atoms.net_current_desktop,
            AtomEnum::CARDINAL,
            &[self.desk_index(target)],
        )?;
        self.conn.flush()?;

        log::info!("Showing desk {} (was {})", target, old);
        if let Some(&window) = self.focus.iter().find(|w| self.clients.get(w).is_some_and(|c| c.desk == target)) {
            self.focus_window(window)?;
        }
        Ok(())
    }

    /// Reassign a window to `desk`, unmapping it if that desk is not shown.
    pub fn assign_desk(&mut self, window: Window, desk: DeskKey) -> Result<()> {
        let index = self.desk_index(desk);
        let current = self.current;
        let Some(client) = self.clients.get_mut(&window) else {
            return Ok(());
        };
        let old = client.desk;
        client.desk = desk;

        if desk != current && old == current {
            self.hidden.insert(window);
            self.conn.unmap_window(window)?;
        } else if desk == current && old != current {
            self.hidden.remove(&window);
            self.conn.map_window(window)?;
        }
        self.conn.change_property32(
            PropMode::REPLACE,
            window,
            self.atoms.net_wm_desktop,
            AtomEnum::CARDINAL,
            &[index],
        )?;
        self.conn.flush()?;
        log::info!("Window 0x{:x} moved from desk {} to {}", window, old, desk);
        Ok(())
    }

    /// Whether an UnmapNotify for `window` was caused by us. Consumes the mark.
    pub fn take_hidden(&mut self, window: Window) -> bool {
        self.hidden.remove(&window)
    }

    // =========================================================================
    // Client lifecycle
    // =========================================================================

    /// Start managing a window. Docks are mapped and reserve their struts;
    /// for ordinary windows the placement to report to the engine is returned.
    pub fn manage(&mut self, window: Window) -> Result<Option<PlacedWindow>> {
        if self.clients.contains_key(&window) || self.docks.contains_key(&window) {
            return Ok(None);
        }

        if window_query::is_dock_window(&self.conn, &self.atoms, window) {
            let strut = window_query::read_struts(&self.conn, &self.atoms, window);
            log::info!("Managing dock 0x{:x} with strut {:?}", window, strut);
            self.docks.insert(window, strut);
            self.conn.change_window_attributes(
                window,
                &ChangeWindowAttributesAux::new().event_mask(EventMask::PROPERTY_CHANGE),
            )?;
            self.conn.map_window(window)?;
            self.conn.flush()?;
            return Ok(None);
        }

        let geom = self.conn.get_geometry(window)?.reply()?;
        let border = self.border_width(Decoration::Default);
        let geometry = Rect::new(
            geom.x as i32,
            geom.y as i32,
            geom.width as i32 + 2 * border,
            geom.height as i32 + 2 * border,
        );
        let client = Client {
            desk: self.current,
            geometry,
            maximized: Maximize::empty(),
            decoration: Decoration::Default,
            hints: window_query::read_size_hints(&self.conn, window),
            dialog: window_query::is_dialog(&self.conn, &self.atoms, window),
        };

        log::info!(
            "Managing window 0x{:x} \"{}\" at {} on desk {}{}",
            window,
            window_query::get_window_title(&self.conn, &self.atoms, window),
            geometry,
            client.desk,
            if client.dialog { " (dialog)" } else { "" }
        );

        self.conn.change_window_attributes(
            window,
            &ChangeWindowAttributesAux::new()
                .border_pixel(self.theme.border_unfocused)
                .event_mask(EventMask::ENTER_WINDOW | EventMask::STRUCTURE_NOTIFY | EventMask::PROPERTY_CHANGE),
        )?;
        for button in [ButtonIndex::M1, ButtonIndex::M3] {
            self.conn.grab_button(
                false,
                window,
                EventMask::BUTTON_PRESS | EventMask::BUTTON_RELEASE | EventMask::POINTER_MOTION,
                GrabMode::ASYNC,
                GrabMode::ASYNC,
                x11rb::NONE,
                x11rb::NONE,
                button,
                ModMask::M4,
            )?;
        }
        self.conn.change_property32(
            PropMode::REPLACE,
            window,
            self.atoms.net_wm_desktop,
            AtomEnum::CARDINAL,
            &[self.desk_index(client.desk)],
        )?;

        let desk = client.desk;
        self.clients.insert(window, client);
        self.configure(window)?;
        self.conn.map_window(window)?;
        self.update_client_list()?;
        self.focus_window(window)?;

        Ok(Some(PlacedWindow {
            window,
            desk,
            geometry,
            changes: Changes {
                size: true,
                position: true,
                border: false,
            },
        }))
    }

    /// Forget a window. Returns the desk it was on if it was a managed client.
    pub fn unmanage(&mut self, window: Window) -> Option<DeskKey> {
        self.hidden.remove(&window);
        if self.docks.remove(&window).is_some() {
            log::info!("Dock 0x{:x} went away", window);
            return None;
        }

        let client = self.clients.remove(&window)?;
        log::info!("Unmanaging window 0x{:x}", window);
        self.focus.retain(|&w| w != window);
        if let Err(e) = self.update_client_list() {
            log::warn!("Failed to update client list: {}", e);
        }
        let next = self
            .focus
            .iter()
            .copied()
            .find(|w| self.clients.get(w).is_some_and(|c| c.desk == self.current));
        let result = match next {
            Some(w) => self.focus_window(w),
            None => self.set_active_window(0),
        };
        if let Err(e) = result {
            log::warn!("Failed to move focus after 0x{:x} went away: {}", window, e);
        }
        Some(client.desk)
    }

    /// Apply a client's ConfigureRequest. Returns the placement to report if
    /// the window is managed.
    pub fn configure_request(&mut self, event: &ConfigureRequestEvent) -> Result<Option<PlacedWindow>> {
        let Some(client) = self.clients.get(&event.window) else {
            // Unmanaged window - allow the configure
            let aux = ConfigureWindowAux::from_configure_request(event);
            self.conn.configure_window(event.window, &aux)?;
            self.conn.flush()?;
            return Ok(None);
        };

        let border = self.border_width(client.decoration);
        let mask = event.value_mask;
        let mut rect = client.geometry;
        if mask.contains(ConfigWindow::X) {
            rect.x = event.x as i32;
        }
        if mask.contains(ConfigWindow::Y) {
            rect.y = event.y as i32;
        }
        if mask.contains(ConfigWindow::WIDTH) {
            rect.width = event.width as i32 + 2 * border;
        }
        if mask.contains(ConfigWindow::HEIGHT) {
            rect.height = event.height as i32 + 2 * border;
        }
        let rect = hold_maximized(rect, client.maximized, self.usable_area(client.desk));

        let mut changes = Changes::between(&client.geometry, &rect);
        changes.border = mask.contains(ConfigWindow::BORDER_WIDTH);
        log::debug!(
            "ConfigureRequest 0x{:x}: {} -> {} (mask 0x{:x})",
            event.window,
            client.geometry,
            rect,
            u16::from(mask)
        );
        Ok(self.apply_placement(event.window, rect, changes))
    }

    /// Apply geometry chosen by the user (pointer drags). Host maximize state
    /// is dropped on both axes.
    pub fn user_move_resize(&mut self, window: Window, rect: Rect) -> Option<PlacedWindow> {
        let client = self.clients.get(&window)?;
        let changes = Changes::between(&client.geometry, &rect);
        if !client.maximized.is_empty() {
            self.unmaximize(window, Maximize::BOTH);
        }
        self.apply_placement(window, rect, changes)
    }

    /// Handle a _NET_WM_STATE maximize request. `action` is the EWMH
    /// remove/add/toggle code.
    pub fn request_maximize(&mut self, window: Window, action: u32, axes: Maximize) -> Option<PlacedWindow> {
        let client = self.clients.get(&window)?;
        let before = client.geometry;
        let set = match action {
            0 => false,
            1 => true,
            2 => !client.maximized.contains(axes),
            _ => return None,
        };
        if set {
            self.maximize(window, axes);
        } else {
            self.unmaximize(window, axes);
        }
        let after = self.clients.get(&window)?.geometry;
        let mut changes = Changes::between(&before, &after);
        changes.size = true;
        Some(PlacedWindow {
            window,
            desk: self.clients.get(&window)?.desk,
            geometry: after,
            changes,
        })
    }

    fn apply_placement(&mut self, window: Window, rect: Rect, changes: Changes) -> Option<PlacedWindow> {
        let client = self.clients.get_mut(&window)?;
        client.geometry = rect;
        let desk = client.desk;
        if let Err(e) = self.configure(window) {
            log::warn!("Failed to configure 0x{:x}: {}", window, e);
        }
        Some(PlacedWindow {
            window,
            desk,
            geometry: rect,
            changes,
        })
    }

    // =========================================================================
    // Focus and EWMH bookkeeping
    // =========================================================================

    /// Focus a window and move it to the front of the focus order.
    pub fn focus_window(&mut self, window: Window) -> Result<()> {
        if !self.clients.contains_key(&window) {
            return Ok(());
        }
        if let Some(&old) = self.focus.first() {
            if old != window && self.clients.contains_key(&old) {
                self.conn.change_window_attributes(
                    old,
                    &ChangeWindowAttributesAux::new().border_pixel(self.theme.border_unfocused),
                )?;
            }
        }
        self.focus.retain(|&w| w != window);
        self.focus.insert(0, window);

        self.conn.change_window_attributes(
            window,
            &ChangeWindowAttributesAux::new().border_pixel(self.theme.border_focused),
        )?;
        self.conn.set_input_focus(InputFocus::POINTER_ROOT, window, x11rb::CURRENT_TIME)?;
        self.set_active_window(window)?;
        log::debug!("Focused window 0x{:x}", window);
        Ok(())
    }

    fn set_active_window(&self, window: Window) -> Result<()> {
        self.conn.change_property32(
            PropMode::REPLACE,
            self.root,
            self.atoms.net_active_window,
            AtomEnum::WINDOW,
            &[window],
        )?;
        self.conn.flush()?;
        Ok(())
    }

    /// Update _NET_CLIENT_LIST with current windows
    fn update_client_list(&self) -> Result<()> {
        self.conn.change_property32(
            PropMode::REPLACE,
            self.root,
            self.atoms.net_client_list,
            AtomEnum::WINDOW,
            &self.managed_windows(),
        )?;
        Ok(())
    }

    /// Publish the maximize axes in _NET_WM_STATE.
    fn publish_wm_state(&self, window: Window, maximized: Maximize) -> Result<()> {
        let mut state = Vec::new();
        if maximized.contains(Maximize::VERTICAL) {
            state.push(self.atoms.net_wm_state_maximized_vert);
        }
        if maximized.contains(Maximize::HORIZONTAL) {
            state.push(self.atoms.net_wm_state_maximized_horz);
        }
        self.conn.change_property32(
            PropMode::REPLACE,
            window,
            self.atoms.net_wm_state,
            AtomEnum::ATOM,
            &state,
        )?;
        Ok(())
    }

    /// Redraw a label window. Returns false if `window` is not one.
    pub fn expose(&self, window: Window) -> Result<bool> {
        self.overlay.expose(&self.conn, window)
    }

    /// Re-read a dock's struts after a property change.
    pub fn refresh_struts(&mut self, window: Window) {
        if self.docks.contains_key(&window) {
            let strut = window_query::read_struts(&self.conn, &self.atoms, window);
            log::info!("Dock 0x{:x} strut changed to {:?}", window, strut);
            self.docks.insert(window, strut);
        }
    }

    /// Re-read a client's size hints after WM_NORMAL_HINTS changed.
    pub fn refresh_hints(&mut self, window: Window) {
        if let Some(client) = self.clients.get_mut(&window) {
            client.hints = window_query::read_size_hints(&self.conn, window);
            log::debug!("Size hints of 0x{:x} now {:?}", window, client.hints);
        }
    }

    /// Release server-side resources before exiting.
    pub fn shutdown(&mut self) -> Result<()> {
        if self.keyboard_grabbed {
            self.release_keyboard();
        }
        self.overlay.close(&self.conn)?;
        self.conn.flush()?;
        Ok(())
    }

    // =========================================================================
    // Geometry helpers
    // =========================================================================

    fn border_width(&self, decoration: Decoration) -> i32 {
        match decoration {
            Decoration::Pixel => self.theme.pixel_border_width as i32,
            Decoration::Default => self.theme.border_width as i32,
        }
    }

    /// Push a client's recorded geometry and decoration to the server.
    fn configure(&self, window: Window) -> Result<()> {
        let Some(client) = self.clients.get(&window) else {
            return Ok(());
        };
        let border = self.border_width(client.decoration);
        let rect = client.geometry;
        self.conn.configure_window(
            window,
            &ConfigureWindowAux::new()
                .x(rect.x)
                .y(rect.y)
                .width((rect.width - 2 * border).max(1) as u32)
                .height((rect.height - 2 * border).max(1) as u32)
                .border_width(border as u32),
        )?;
        self.conn.flush()?;
        Ok(())
    }

    fn update<F: FnOnce(&mut Client)>(&mut self, window: WindowId, f: F) {
        let Some(client) = self.clients.get_mut(&window) else {
            log::warn!("Command for unknown window 0x{:x}", window);
            return;
        };
        f(client);
        if let Err(e) = self.configure(window) {
            log::warn!("Failed to configure 0x{:x}: {}", window, e);
        }
    }
}

/// Keep the maximized axes of a client-requested geometry at the usable area.
fn hold_maximized(mut rect: Rect, maximized: Maximize, area: Rect) -> Rect {
    if maximized.contains(Maximize::HORIZONTAL) {
        rect.x = area.x;
        rect.width = area.width;
    }
    if maximized.contains(Maximize::VERTICAL) {
        rect.y = area.y;
        rect.height = area.height;
    }
    rect
}

/// Largest reservation per screen edge across all docks.
fn combined_strut(docks: &HashMap<Window, StrutPartial>) -> StrutPartial {
    docks.values().fold(StrutPartial::default(), |acc, s| StrutPartial {
        left: acc.left.max(s.left),
        right: acc.right.max(s.right),
        top: acc.top.max(s.top),
        bottom: acc.bottom.max(s.bottom),
    })
}

/// Move `rect` inside `area`, shrinking it if it does not fit.
fn fit_inside(rect: Rect, area: Rect) -> Rect {
    let width = rect.width.min(area.width);
    let height = rect.height.min(area.height);
    Rect::new(
        rect.x.clamp(area.x, area.right() - width),
        rect.y.clamp(area.y, area.bottom() - height),
        width,
        height,
    )
}

impl Host for X11Host {
    fn geometry(&self, window: WindowId) -> Option<Rect> {
        self.clients.get(&window).map(|c| c.geometry)
    }

    fn desk_of(&self, window: WindowId) -> Option<DeskKey> {
        self.clients.get(&window).map(|c| c.desk)
    }

    fn usable_area(&self, _desk: DeskKey) -> Rect {
        combined_strut(&self.docks).reserve(self.screen)
    }

    fn focus_stack(&self, desk: DeskKey) -> Vec<WindowId> {
        self.focus
            .iter()
            .copied()
            .filter(|w| self.clients.get(w).is_some_and(|c| c.desk == desk))
            .collect()
    }

    fn focused_window(&self) -> Option<WindowId> {
        self.focus.first().copied()
    }

    fn size_hints(&self, window: WindowId) -> SizeHints {
        self.clients.get(&window).map(|c| c.hints).unwrap_or_default()
    }

    fn is_dialog(&self, window: WindowId) -> bool {
        self.clients.get(&window).is_some_and(|c| c.dialog)
    }

    fn maximized(&self, window: WindowId) -> Maximize {
        self.clients
            .get(&window)
            .map(|c| c.maximized)
            .unwrap_or_default()
    }

    fn move_resize(&mut self, window: WindowId, rect: Rect) {
        log::debug!("move_resize 0x{:x} to {}", window, rect);
        self.update(window, |c| c.geometry = rect);
    }

    fn move_window(&mut self, window: WindowId, x: i32, y: i32) {
        self.update(window, |c| {
            c.geometry.x = x;
            c.geometry.y = y;
        });
    }

    fn maximize(&mut self, window: WindowId, axes: Maximize) {
        let Some(desk) = self.desk_of(window) else {
            return;
        };
        let area = self.usable_area(desk);
        self.update(window, |c| {
            c.maximized |= axes;
            if axes.contains(Maximize::HORIZONTAL) {
                c.geometry.x = area.x;
                c.geometry.width = area.width;
            }
            if axes.contains(Maximize::VERTICAL) {
                c.geometry.y = area.y;
                c.geometry.height = area.height;
            }
        });
        if let Err(e) = self.publish_wm_state(window, self.maximized(window)) {
            log::warn!("Failed to publish state of 0x{:x}: {}", window, e);
        }
    }

    fn unmaximize(&mut self, window: WindowId, axes: Maximize) {
        if let Some(client) = self.clients.get_mut(&window) {
            client.maximized.remove(axes);
            let maximized = client.maximized;
            if let Err(e) = self.publish_wm_state(window, maximized) {
                log::warn!("Failed to publish state of 0x{:x}: {}", window, e);
            }
        }
    }

    fn set_decoration(&mut self, window: WindowId, decoration: Decoration) {
        log::debug!("Decoration of 0x{:x} set to {}", window, decoration.name());
        self.update(window, |c| c.decoration = decoration);
    }

    fn smart_cleanup(&mut self, desk: DeskKey) {
        let area = self.usable_area(desk);
        let windows: Vec<Window> = self
            .clients
            .iter()
            .filter(|(_, c)| c.desk == desk)
            .map(|(&w, _)| w)
            .collect();
        for window in windows {
            self.update(window, |c| c.geometry = fit_inside(c.geometry, area));
        }
        log::debug!("Tidied untiled windows of desk {}", desk);
    }

    fn grab_keyboard(&mut self) -> Result<()> {
        let reply = self
            .conn
            .grab_keyboard(false, self.root, x11rb::CURRENT_TIME, GrabMode::ASYNC, GrabMode::ASYNC)?
            .reply()?;
        if reply.status != GrabStatus::SUCCESS {
            bail!("keyboard grab refused: {:?}", reply.status);
        }
        self.keyboard_grabbed = true;
        Ok(())
    }

    fn release_keyboard(&mut self) {
        self.keyboard_grabbed = false;
        let result = self
            .conn
            .ungrab_keyboard(x11rb::CURRENT_TIME)
            .map_err(anyhow::Error::from)
            .and_then(|_| self.conn.flush().map_err(anyhow::Error::from));
        if let Err(e) = result {
            log::warn!("Failed to release keyboard: {}", e);
        }
    }

    fn show_label(&mut self, window: WindowId, key: char) {
        let Some(target) = self.geometry(window) else {
            return;
        };
        if let Err(e) = self.overlay.show(&self.conn, self.root, target, key, &self.theme) {
            log::warn!("Failed to show label '{}' on 0x{:x}: {}", key, window, e);
        }
    }

    fn clear_labels(&mut self) {
        log::debug!("Clearing {} labels", self.overlay.len());
        if let Err(e) = self.overlay.clear(&self.conn) {
            log::warn!("Failed to clear labels: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combined_strut_takes_largest_per_edge() {
        let mut docks = HashMap::new();
        docks.insert(1, StrutPartial { top: 24, ..Default::default() });
        docks.insert(2, StrutPartial { top: 30, left: 5, ..Default::default() });
        let strut = combined_strut(&docks);
        assert_eq!(strut.top, 30);
        assert_eq!(strut.left, 5);
        assert_eq!(strut.bottom, 0);
        assert_eq!(
            strut.reserve(Rect::new(0, 0, 1000, 800)),
            Rect::new(5, 30, 995, 770)
        );
    }

    #[test]
    fn test_fit_inside() {
        let area = Rect::new(0, 20, 1000, 780);
        assert_eq!(fit_inside(Rect::new(900, 0, 300, 200), area), Rect::new(700, 20, 300, 200));
        assert_eq!(fit_inside(Rect::new(-50, 100, 2000, 100), area), Rect::new(0, 100, 1000, 100));
        let inside = Rect::new(10, 30, 100, 100);
        assert_eq!(fit_inside(inside, area), inside);
    }

    #[test]
    fn test_configure_request_keeps_maximized_axes() {
        let area = Rect::new(0, 24, 1280, 776);
        let requested = Rect::new(100, 100, 640, 480);
        assert_eq!(hold_maximized(requested, Maximize::BOTH, area), area);
        assert_eq!(
            hold_maximized(requested, Maximize::VERTICAL, area),
            Rect::new(100, 24, 640, 776)
        );
        assert_eq!(
            hold_maximized(requested, Maximize::HORIZONTAL, area),
            Rect::new(0, 100, 1280, 480)
        );
        assert_eq!(hold_maximized(requested, Maximize::empty(), area), requested);
    }
}
