//! Configuration file support for coltile.
//!
//! Loads settings from ~/.config/coltile/config.toml if it exists,
//! otherwise uses sensible defaults.
//!
//! The `[tiling]` section is consumed by the layout engine as-is; the other
//! sections configure the X11 host (desk grid, borders, label colors and key
//! bindings). `Theme` is the resolved form of the appearance section.

use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;

use crate::host::Key;
use crate::types::{DeskKey, MAX_COLUMNS};

// =============================================================================
// Runtime Configuration (resolved values)
// =============================================================================

/// Resolved appearance values used by the X11 host.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Border width for the "default" decoration (floating windows)
    pub border_width: u32,
    /// Border width for the "pixel" decoration (tiled windows)
    pub pixel_border_width: u32,
    pub border_focused: u32,
    pub border_unfocused: u32,
    pub label_bg: u32,
    pub label_fg: u32,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            border_width: 2,
            pixel_border_width: 1,
            border_focused: 0x5294e2,   // Blue
            border_unfocused: 0x3a3a3a, // Gray
            label_bg: 0x222222,
            label_fg: 0xffffff,
        }
    }
}

// =============================================================================
// File-based Configuration (TOML parsing)
// =============================================================================

/// Top-level configuration
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub tiling: TilingConfig,
    pub desktops: DesktopsConfig,
    pub appearance: AppearanceConfig,
    pub keybindings: KeybindingConfig,
}

/// Settings read by the layout engine
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TilingConfig {
    /// Tile transient and dialog windows too
    pub tile_dialogs: bool,
    /// Float windows whose minimum size does not fit the desktop
    pub float_too_big_windows: bool,
    /// Column count for desktops without an override (0 disables tiling)
    pub columns: usize,
    /// Per-desktop column count overrides
    pub desks: Vec<DeskColumns>,
}

/// Column count override for one desktop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct DeskColumns {
    #[serde(default)]
    pub zone: u32,
    pub x: i32,
    pub y: i32,
    pub columns: usize,
}

impl TilingConfig {
    /// Override entry for a desktop, if configured
    pub fn desk(&self, key: DeskKey) -> Option<&DeskColumns> {
        self.desks
            .iter()
            .find(|d| d.zone == key.zone && d.x == key.x && d.y == key.y)
    }

    /// Desired column count for a desktop, clamped to `0..=MAX_COLUMNS`
    pub fn columns_for(&self, key: DeskKey) -> usize {
        self.desk(key)
            .map(|d| d.columns)
            .unwrap_or(self.columns)
            .min(MAX_COLUMNS)
    }
}

impl Default for TilingConfig {
    fn default() -> Self {
        Self {
            tile_dialogs: true,
            float_too_big_windows: true,
            columns: 2,
            desks: Vec::new(),
        }
    }
}

/// Virtual desktop grid (per zone)
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct DesktopsConfig {
    pub count_x: u32,
    pub count_y: u32,
}

impl Default for DesktopsConfig {
    fn default() -> Self {
        Self {
            count_x: 2,
            count_y: 2,
        }
    }
}

/// Appearance settings (hex color strings like "#5294e2")
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AppearanceConfig {
    pub border_width: u32,
    pub pixel_border_width: u32,
    pub border_focused: String,
    pub border_unfocused: String,
    pub label_bg: String,
    pub label_fg: String,
}

impl Default for AppearanceConfig {
    fn default() -> Self {
        Self {
            border_width: 2,
            pixel_border_width: 1,
            border_focused: "#5294e2".to_string(),
            border_unfocused: "#3a3a3a".to_string(),
            label_bg: "#222222".to_string(),
            label_fg: "#ffffff".to_string(),
        }
    }
}

/// Keybinding configuration (strings like "Mod4+Return")
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct KeybindingConfig {
    pub toggle_floating: Option<String>,
    pub add_column: Option<String>,
    pub remove_column: Option<String>,
    pub swap: Option<String>,
    #[serde(rename = "move")]
    pub move_window: Option<String>,
    pub desk_next: Option<String>,
    pub desk_prev: Option<String>,
    pub send_to_desk_next: Option<String>,
    pub send_to_desk_prev: Option<String>,
    pub quit: Option<String>,
}

impl Default for KeybindingConfig {
    fn default() -> Self {
        Self {
            toggle_floating: Some("Mod4+f".to_string()),
            add_column: Some("Mod4+equal".to_string()),
            remove_column: Some("Mod4+minus".to_string()),
            swap: Some("Mod4+s".to_string()),
            move_window: Some("Mod4+m".to_string()),
            desk_next: Some("Mod4+]".to_string()),
            desk_prev: Some("Mod4+[".to_string()),
            send_to_desk_next: Some("Mod4+Shift+]".to_string()),
            send_to_desk_prev: Some("Mod4+Shift+[".to_string()),
            quit: Some("Mod4+Control+F4".to_string()),
        }
    }
}

/// Parsed keybinding (ready for X11 grab)
#[derive(Debug, Clone, Copy)]
pub struct ParsedBinding {
    pub keysym: u32,
    pub modifiers: u16,
}

/// Action bound to a key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WmAction {
    ToggleFloating,
    AddColumn,
    RemoveColumn,
    Swap,
    Move,
    DeskNext,
    DeskPrev,
    SendToDeskNext,
    SendToDeskPrev,
    Quit,
}

impl Config {
    /// Load config from default path (~/.config/coltile/config.toml)
    pub fn load() -> Self {
        Self::load_from_path(Self::default_path())
    }

    /// Default config file path
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("coltile")
            .join("config.toml")
    }

    /// Load config from a specific path
    pub fn load_from_path(path: PathBuf) -> Self {
        match std::fs::read_to_string(&path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => {
                    log::info!("Loaded config from {:?}", path);
                    config
                }
                Err(e) => {
                    log::warn!("Failed to parse config: {}", e);
                    Self::default()
                }
            },
            Err(_) => {
                log::info!("No config file found at {:?}, using defaults", path);
                Self::default()
            }
        }
    }

    /// Resolve appearance strings into pixel values
    pub fn theme(&self) -> Theme {
        let defaults = Theme::default();
        let color = |s: &str, fallback: u32| {
            parse_color(s).unwrap_or_else(|| {
                log::warn!("Invalid color {:?}, using default", s);
                fallback
            })
        };
        Theme {
            border_width: self.appearance.border_width,
            pixel_border_width: self.appearance.pixel_border_width,
            border_focused: color(&self.appearance.border_focused, defaults.border_focused),
            border_unfocused: color(&self.appearance.border_unfocused, defaults.border_unfocused),
            label_bg: color(&self.appearance.label_bg, defaults.label_bg),
            label_fg: color(&self.appearance.label_fg, defaults.label_fg),
        }
    }

    /// Parse keybindings into action -> ParsedBinding map
    pub fn parse_keybindings(&self) -> HashMap<WmAction, ParsedBinding> {
        let mut bindings = HashMap::new();

        let mut insert = |action: WmAction, key_str: &Option<String>| {
            if let Some(s) = key_str {
                if let Some(parsed) = parse_key_binding(s) {
                    bindings.insert(action, parsed);
                } else {
                    log::warn!("Failed to parse keybinding: {}", s);
                }
            }
        };

        let keys = &self.keybindings;
        insert(WmAction::ToggleFloating, &keys.toggle_floating);
        insert(WmAction::AddColumn, &keys.add_column);
        insert(WmAction::RemoveColumn, &keys.remove_column);
        insert(WmAction::Swap, &keys.swap);
        insert(WmAction::Move, &keys.move_window);
        insert(WmAction::DeskNext, &keys.desk_next);
        insert(WmAction::DeskPrev, &keys.desk_prev);
        insert(WmAction::SendToDeskNext, &keys.send_to_desk_next);
        insert(WmAction::SendToDeskPrev, &keys.send_to_desk_prev);
        insert(WmAction::Quit, &keys.quit);

        bindings
    }
}

/// Parse a key binding string like "Mod4+Shift+h" into keysym and modifiers
pub fn parse_key_binding(s: &str) -> Option<ParsedBinding> {
    let parts: Vec<&str> = s.split('+').collect();
    let mut modifiers: u16 = 0;
    let key_part = parts.last().filter(|k| !k.is_empty())?;

    // X11 modifier masks
    const SHIFT_MASK: u16 = 1;
    const CONTROL_MASK: u16 = 4;
    const MOD1_MASK: u16 = 8; // Alt
    const MOD4_MASK: u16 = 64; // Super/Win

    for part in &parts[..parts.len() - 1] {
        match part.to_lowercase().as_str() {
            "mod4" | "super" | "win" => modifiers |= MOD4_MASK,
            "shift" => modifiers |= SHIFT_MASK,
            "control" | "ctrl" => modifiers |= CONTROL_MASK,
            "mod1" | "alt" => modifiers |= MOD1_MASK,
            _ => {
                log::warn!("Unknown modifier: {}", part);
            }
        }
    }

    let keysym = key_to_keysym(key_part)?;
    Some(ParsedBinding { keysym, modifiers })
}

/// Convert key name to X11 keysym
fn key_to_keysym(key: &str) -> Option<u32> {
    let lower = key.to_lowercase();
    // Printable ASCII keysyms equal their character code
    if lower.chars().count() == 1 {
        let c = lower.chars().next()?;
        if c.is_ascii_graphic() {
            return Some(c as u32);
        }
    }
    match lower.as_str() {
        "return" | "enter" => Some(0xff0d),
        "tab" => Some(0xff09),
        "escape" | "esc" => Some(0xff1b),
        "space" => Some(0x20),
        "backspace" => Some(0xff08),
        "delete" => Some(0xffff),
        "minus" => Some(0x2d),
        "equal" => Some(0x3d),
        "plus" => Some(0x2b),
        "comma" => Some(0x2c),
        "period" => Some(0x2e),
        "bracketleft" => Some(0x5b),
        "bracketright" => Some(0x5d),
        "slash" => Some(0x2f),
        "page_up" | "pageup" | "pgup" | "prior" => Some(0xff55),
        "page_down" | "pagedown" | "pgdn" | "next" => Some(0xff56),
        "left" => Some(0xff51),
        "up" => Some(0xff52),
        "right" => Some(0xff53),
        "down" => Some(0xff54),
        "home" => Some(0xff50),
        "end" => Some(0xff57),
        _ => {
            // Function keys F1-F12
            if let Some(n) = lower.strip_prefix('f').and_then(|n| n.parse::<u32>().ok()) {
                if (1..=12).contains(&n) {
                    return Some(0xffbe + n - 1);
                }
            }
            log::warn!("Unknown key: {}", key);
            None
        }
    }
}

/// Translate an X11 keysym into the keys the interactive controller knows
pub fn keysym_to_key(keysym: u32) -> Key {
    match keysym {
        0xff0d | 0xff8d => Key::Return,
        0xff1b => Key::Escape,
        0xff51 => Key::Left,
        0xff52 => Key::Up,
        0xff53 => Key::Right,
        0xff54 => Key::Down,
        0xffe1..=0xffee => Key::Modifier,
        0x21..=0x7e => char::from_u32(keysym).map(Key::Char).unwrap_or(Key::Other),
        _ => Key::Other,
    }
}

/// Parse hex color string (e.g., "#5294e2" or "5294e2") to u32
pub fn parse_color(s: &str) -> Option<u32> {
    let s = s.trim_start_matches('#');
    u32::from_str_radix(s, 16).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key_binding() {
        let binding = parse_key_binding("Mod4+Return").unwrap();
        assert_eq!(binding.keysym, 0xff0d);
        assert_eq!(binding.modifiers, 64); // Mod4

        let binding = parse_key_binding("Mod4+Shift+]").unwrap();
        assert_eq!(binding.keysym, 0x5d);
        assert_eq!(binding.modifiers, 64 | 1); // Mod4 + Shift

        let binding = parse_key_binding("Mod4+Control+F4").unwrap();
        assert_eq!(binding.keysym, 0xffc1);
        assert_eq!(binding.modifiers, 64 | 4); // Mod4 + Control

        assert!(parse_key_binding("Mod4+").is_none());
    }

    #[test]
    fn test_parse_color() {
        assert_eq!(parse_color("#5294e2"), Some(0x5294e2));
        assert_eq!(parse_color("5294e2"), Some(0x5294e2));
        assert_eq!(parse_color("ffffff"), Some(0xffffff));
        assert_eq!(parse_color("#zzzzzz"), None);
    }

    #[test]
    fn test_default_keybindings() {
        let config = Config::default();
        let bindings = config.parse_keybindings();

        assert_eq!(bindings.len(), 10);
        assert_eq!(bindings[&WmAction::AddColumn].keysym, 0x3d);
        assert_eq!(bindings[&WmAction::RemoveColumn].keysym, 0x2d);
        assert!(bindings.contains_key(&WmAction::Swap));
        assert!(bindings.contains_key(&WmAction::Quit));
    }

    #[test]
    fn test_key_to_keysym() {
        assert_eq!(key_to_keysym("return"), Some(0xff0d));
        assert_eq!(key_to_keysym("Return"), Some(0xff0d));
        assert_eq!(key_to_keysym("h"), Some(0x68));
        assert_eq!(key_to_keysym("H"), Some(0x68));
        assert_eq!(key_to_keysym(";"), Some(0x3b));
        assert_eq!(key_to_keysym("f12"), Some(0xffc9));
        assert_eq!(key_to_keysym("f13"), None);
    }

    #[test]
    fn test_keysym_to_key() {
        assert_eq!(keysym_to_key(0xff0d), Key::Return);
        assert_eq!(keysym_to_key(0xff1b), Key::Escape);
        assert_eq!(keysym_to_key(0xff52), Key::Up);
        assert_eq!(keysym_to_key(0x61), Key::Char('a'));
        assert_eq!(keysym_to_key(0x27), Key::Char('\''));
        assert_eq!(keysym_to_key(0xffe1), Key::Modifier); // Shift_L
        assert_eq!(keysym_to_key(0xff09), Key::Other); // Tab
    }

    #[test]
    fn test_tiling_defaults() {
        let config = Config::default();
        assert!(config.tiling.tile_dialogs);
        assert!(config.tiling.float_too_big_windows);
        assert_eq!(config.tiling.columns, 2);
        assert_eq!(config.tiling.columns_for(DeskKey::new(0, 1, 1)), 2);
    }

    #[test]
    fn test_desk_overrides() {
        let toml = r#"
[tiling]
tile_dialogs = false
columns = 1

[[tiling.desks]]
x = 1
y = 0
columns = 3

[[tiling.desks]]
zone = 1
x = 0
y = 0
columns = 42
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert!(!config.tiling.tile_dialogs);
        assert!(config.tiling.float_too_big_windows);
        assert_eq!(config.tiling.columns_for(DeskKey::new(0, 0, 0)), 1);
        assert_eq!(config.tiling.columns_for(DeskKey::new(0, 1, 0)), 3);
        // Clamped to the column limit
        assert_eq!(config.tiling.columns_for(DeskKey::new(1, 0, 0)), MAX_COLUMNS);
    }

    #[test]
    fn test_partial_sections_use_defaults() {
        let toml = r#"
[appearance]
border_width = 4

[keybindings]
swap = "Mod1+s"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let theme = config.theme();
        assert_eq!(theme.border_width, 4);
        assert_eq!(theme.pixel_border_width, 1);
        assert_eq!(theme.border_focused, 0x5294e2);
        assert_eq!(config.desktops.count_x, 2);

        let bindings = config.parse_keybindings();
        assert_eq!(bindings[&WmAction::Swap].modifiers, 8);
        // Unspecified bindings keep their defaults
        assert!(bindings.contains_key(&WmAction::Move));
    }
}
