//! coltile - column tiling for X11
//!
//! A small X11 window manager that hosts the coltile layout engine: each
//! virtual desk is split into columns of stacked windows, and the engine keeps
//! that partition intact while windows come, go and get resized.

mod backend;
mod event;
mod ewmh;
mod ipc_handler;
mod overlay;
mod window_query;

use std::collections::HashMap;
use std::time::Instant;

use anyhow::{Context, Result};
use x11rb::connection::Connection;
use x11rb::protocol::xproto::*;
use x11rb::rust_connection::RustConnection;
use x11rb::wrapper::ConnectionExt as _;

use coltile::config::{Config, ParsedBinding, WmAction};
use coltile::engine::Engine;
use coltile::host::{Host, HostEvent};
use coltile::ipc::IpcServer;
use coltile::types::{DeskKey, Rect};

use backend::X11Host;
use event::DragState;

/// The window manager: the X11 host, the layout engine and the glue between.
pub struct Wm {
    host: X11Host,
    engine: Engine,
    /// Window for _NET_SUPPORTING_WM_CHECK
    check_window: Window,
    running: bool,
    /// IPC server for external control
    ipc: Option<IpcServer>,
    /// Parsed keybindings (action -> binding)
    keybindings: HashMap<WmAction, ParsedBinding>,
    /// Current pointer drag (if any)
    drag_state: Option<DragState>,
}

impl Wm {
    /// Connect to X11 and set up the window manager
    fn new() -> Result<Self> {
        let (conn, screen_num) = RustConnection::connect(None)
            .context("Failed to connect to X11 server")?;

        let screen = &conn.setup().roots[screen_num];
        let root = screen.root;

        log::info!(
            "Connected to X11, screen {}, root window 0x{:x}, {}x{}",
            screen_num,
            root,
            screen.width_in_pixels,
            screen.height_in_pixels
        );

        // Create a small check window for EWMH _NET_SUPPORTING_WM_CHECK
        let check_window = conn.generate_id()?;
        conn.create_window(
            0, // depth (copy from parent)
            check_window,
            root,
            -1, -1, 1, 1, 0, // x, y, w, h, border
            WindowClass::INPUT_ONLY,
            0, // visual (copy from parent)
            &CreateWindowAux::new(),
        )?;

        // Initialize IPC server (non-fatal if it fails)
        let ipc = match IpcServer::bind() {
            Ok(server) => Some(server),
            Err(e) => {
                log::warn!("Failed to start IPC server: {}. IPC will be disabled.", e);
                None
            }
        };

        let config = Config::load();
        let keybindings = config.parse_keybindings();
        let host = X11Host::new(conn, screen_num, config.theme(), config.desktops)
            .context("Failed to set up the X11 host")?;
        let engine = Engine::new(config.tiling);

        Ok(Self {
            host,
            engine,
            check_window,
            running: true,
            ipc,
            keybindings,
            drag_state: None,
        })
    }

    fn conn(&self) -> &RustConnection {
        self.host.conn()
    }

    fn root(&self) -> Window {
        self.host.root()
    }

    /// Become the window manager by requesting SubstructureRedirect on root
    fn become_wm(&self) -> Result<()> {
        // SubstructureRedirect is the key - it makes us the WM
        let event_mask = EventMask::SUBSTRUCTURE_REDIRECT
            | EventMask::SUBSTRUCTURE_NOTIFY
            | EventMask::ENTER_WINDOW  // For focus-follows-mouse
            | EventMask::STRUCTURE_NOTIFY;

        let result = self.conn().change_window_attributes(
            self.root(),
            &ChangeWindowAttributesAux::new().event_mask(event_mask),
        );

        self.conn().flush()?;

        if let Err(e) = result?.check() {
            anyhow::bail!(
                "Another window manager is already running! Error: {}",
                e
            );
        }

        log::info!("Successfully became the window manager");
        Ok(())
    }

    /// Set up EWMH properties on root window
    fn setup_ewmh(&self) -> Result<()> {
        let conn = self.conn();
        let root = self.root();
        let atoms = self.host.atoms();
        let grid = self.host.grid();

        conn.change_property32(
            PropMode::REPLACE,
            root,
            atoms.net_supported,
            AtomEnum::ATOM,
            &atoms.supported(),
        )?;

        // Set _NET_SUPPORTING_WM_CHECK on root and check window
        for window in [root, self.check_window] {
            conn.change_property32(
                PropMode::REPLACE,
                window,
                atoms.net_supporting_wm_check,
                AtomEnum::WINDOW,
                &[self.check_window],
            )?;
        }

        conn.change_property8(
            PropMode::REPLACE,
            self.check_window,
            atoms.net_wm_name,
            atoms.utf8_string,
            b"coltile",
        )?;

        // Desk grid: _NET_DESKTOP_LAYOUT is [orientation (0 = horizontal), columns, rows, corner]
        conn.change_property32(
            PropMode::REPLACE,
            root,
            atoms.net_number_of_desktops,
            AtomEnum::CARDINAL,
            &[grid.count_x.max(1) * grid.count_y.max(1)],
        )?;
        conn.change_property32(
            PropMode::REPLACE,
            root,
            atoms.net_desktop_layout,
            AtomEnum::CARDINAL,
            &[0, grid.count_x.max(1), grid.count_y.max(1), 0],
        )?;
        conn.change_property32(
            PropMode::REPLACE,
            root,
            atoms.net_current_desktop,
            AtomEnum::CARDINAL,
            &[self.host.desk_index(self.host.current_desk())],
        )?;
        conn.change_property32(
            PropMode::REPLACE,
            root,
            atoms.net_client_list,
            AtomEnum::WINDOW,
            &[],
        )?;

        conn.flush()?;
        log::info!("EWMH properties set up");
        Ok(())
    }

    fn grab_keys(&self) -> Result<()> {
        // Get keyboard mapping to find keycodes
        let setup = self.conn().setup();
        let min_keycode = setup.min_keycode;
        let max_keycode = setup.max_keycode;

        let mapping = self
            .conn()
            .get_keyboard_mapping(min_keycode, max_keycode - min_keycode + 1)?
            .reply()?;

        let keysyms_per_keycode = mapping.keysyms_per_keycode as usize;

        // Build keysym -> keycode map
        let mut keysym_to_keycode: HashMap<u32, Keycode> = HashMap::new();
        for (i, chunk) in mapping.keysyms.chunks(keysyms_per_keycode).enumerate() {
            for keysym in chunk {
                if *keysym != 0 {
                    keysym_to_keycode
                        .entry(*keysym)
                        .or_insert(min_keycode + i as u8);
                }
            }
        }

        for (action, binding) in &self.keybindings {
            if let Some(&keycode) = keysym_to_keycode.get(&binding.keysym) {
                let modmask = ModMask::from(binding.modifiers);
                self.grab_key(keycode, modmask)?;
                log::info!(
                    "Grabbed {:?} (keycode {}, mods 0x{:x})",
                    action,
                    keycode,
                    binding.modifiers
                );
            } else {
                log::warn!(
                    "Could not find keycode for {:?} (keysym 0x{:x})",
                    action,
                    binding.keysym
                );
            }
        }

        self.conn().flush()?;
        Ok(())
    }

    /// Grab a single key combination
    fn grab_key(&self, keycode: Keycode, modifiers: ModMask) -> Result<()> {
        // Grab with and without NumLock/CapsLock to handle those states
        let numlock = ModMask::M2; // NumLock is usually Mod2
        let capslock = ModMask::LOCK;

        for extra_mods in [
            ModMask::from(0u16),
            capslock,
            numlock,
            capslock | numlock,
        ] {
            self.conn().grab_key(
                false, // owner_events
                self.root(),
                modifiers | extra_mods,
                keycode,
                GrabMode::ASYNC,
                GrabMode::ASYNC,
            )?;
        }
        Ok(())
    }

    /// Manage any existing windows
    fn scan_existing_windows(&mut self) -> Result<()> {
        let tree = self.conn().query_tree(self.root())?.reply()?;

        for &window in &tree.children {
            let attrs = self.conn().get_window_attributes(window)?.reply()?;

            // Skip override_redirect popups and unmapped windows
            if attrs.override_redirect || attrs.map_state != MapState::VIEWABLE {
                continue;
            }

            log::info!("Found existing window 0x{:x}", window);
            self.manage_window(window)?;
        }

        Ok(())
    }

    /// Hand an event to the engine.
    fn emit(&mut self, event: HostEvent) {
        self.engine.handle_event(&mut self.host, event, Instant::now());
    }

    /// Start managing a window and report its placement to the engine
    fn manage_window(&mut self, window: Window) -> Result<()> {
        let area = self.usable_area();
        if let Some(placed) = self.host.manage(window)? {
            self.emit(HostEvent::WindowPlaced(placed));
        }
        self.refit_if_area_changed(area);
        Ok(())
    }

    /// Stop managing a window
    fn unmanage_window(&mut self, window: Window) {
        if let Some(DragState { window: dragged, .. }) = self.drag_state {
            if dragged == window {
                let _ = self.conn().ungrab_pointer(x11rb::CURRENT_TIME);
                self.drag_state = None;
                log::info!("Cancelled drag - dragged window was destroyed");
            }
        }

        let area = self.usable_area();
        if let Some(desk) = self.host.unmanage(window) {
            self.emit(HostEvent::WindowHidden { window, desk });
        }
        self.refit_if_area_changed(area);
    }

    fn usable_area(&self) -> Rect {
        self.host.usable_area(self.host.current_desk())
    }

    /// Docks come and go; tiled windows must follow the space they leave
    fn refit_if_area_changed(&mut self, before: Rect) {
        let after = self.usable_area();
        if after != before {
            log::info!("Usable area changed from {} to {}", before, after);
            self.engine.usable_area_changed(&mut self.host);
        }
    }

    /// Show another desk of the grid
    fn switch_desk(&mut self, target: DeskKey) -> Result<()> {
        if target == self.host.current_desk() {
            return Ok(());
        }
        self.emit(HostEvent::DesktopWillShow { desk: target });
        let result = self.host.show_desk(target);
        // Always close the switch, even if X failed part way
        self.emit(HostEvent::DesktopShown { desk: target });
        result
    }

    /// Reassign a window to another desk of the grid
    fn send_to_desk(&mut self, window: Window, target: DeskKey) -> Result<()> {
        if !self.host.is_managed(window) {
            anyhow::bail!("window 0x{:x} is not managed", window);
        }
        self.host.assign_desk(window, target)?;
        self.emit(HostEvent::WindowDeskSet { window, desk: target });
        Ok(())
    }

    /// Re-read the configuration file and apply what can change at runtime
    fn reload_config(&mut self) {
        let config = Config::load();
        self.host.set_theme(config.theme());
        self.engine.apply_settings(&mut self.host, config.tiling);
        // Key grabs stay as they were; new bindings take effect on restart
        log::info!("Configuration reloaded");
    }

    /// Execute a window manager action
    fn execute_action(&mut self, action: WmAction) -> Result<()> {
        let now = Instant::now();
        match action {
            WmAction::ToggleFloating => {
                if let Some(window) = self.host.focused_window() {
                    self.engine.toggle_floating(&mut self.host, window)?;
                }
            }
            WmAction::AddColumn => self.engine.add_column(&mut self.host)?,
            WmAction::RemoveColumn => self.engine.remove_column(&mut self.host)?,
            WmAction::Swap => self.engine.start_swap(&mut self.host, now)?,
            WmAction::Move => self.engine.start_move(&mut self.host, now)?,
            WmAction::DeskNext => self.switch_desk(self.host.desk_offset(1))?,
            WmAction::DeskPrev => self.switch_desk(self.host.desk_offset(-1))?,
            WmAction::SendToDeskNext | WmAction::SendToDeskPrev => {
                let step = if action == WmAction::SendToDeskNext { 1 } else { -1 };
                if let Some(window) = self.host.focused_window() {
                    self.send_to_desk(window, self.host.desk_offset(step))?;
                }
            }
            WmAction::Quit => {
                log::info!("Quitting window manager");
                self.running = false;
            }
        }
        Ok(())
    }

    /// Main event loop
    fn run(&mut self) -> Result<()> {
        log::info!("Entering event loop");

        while self.running {
            // Poll IPC commands (non-blocking)
            // We need to take the ipc out temporarily to avoid borrow conflicts
            if let Some(ipc) = self.ipc.take() {
                let mut pending_commands = Vec::new();
                while let Some((cmd, client)) = ipc.poll() {
                    pending_commands.push((cmd, client));
                }

                self.ipc = Some(ipc);

                for (cmd, mut client) in pending_commands {
                    let response = self.handle_ipc(cmd);
                    if let Err(e) = client.respond(response) {
                        log::warn!("Failed to send IPC response: {}", e);
                    }
                }
            }

            // Interactive sessions end on their own after a while
            self.engine.tick(&mut self.host, Instant::now());

            // Poll for X11 events (non-blocking)
            match self.conn().poll_for_event() {
                Ok(Some(event)) => {
                    if let Err(e) = self.handle_event(event) {
                        log::error!("Error handling event: {}", e);
                    }
                }
                Ok(None) => {
                    // No event, sleep briefly to avoid busy-waiting
                    std::thread::sleep(std::time::Duration::from_millis(10));
                }
                Err(e) => {
                    log::error!("Error polling for X11 event: {}", e);
                    return Err(e).context("Lost connection to the X server");
                }
            }
        }

        log::info!("Exiting window manager");
        self.host.shutdown()?;
        Ok(())
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info")
    ).init();

    log::info!("Starting coltile - column tiling for X11");

    let mut wm = Wm::new()?;

    wm.become_wm()?;
    wm.setup_ewmh()?;
    wm.grab_keys()?;

    // The engine needs an active desk before the first window shows up
    let desk = wm.host.current_desk();
    wm.emit(HostEvent::DesktopShown { desk });

    wm.scan_existing_windows()?;
    wm.run()?;

    Ok(())
}
