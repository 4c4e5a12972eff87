//! Keyboard-driven swap and move sessions.
//!
//! ```text
//!                 swap()                    label key
//!        ┌──────────────────────▶ Swapping ───────────▶ swap, then None
//!        │                          │
//!      None ◀───────────────────────┤ Return / Escape / other key /
//!        │                          │ timeout / desk switch / hide
//!        │        move()            │
//!        └──────────────────────▶ Moving ──┐ arrows, h j k l
//!                                   ▲      │ (stays in Moving)
//!                                   └──────┘
//! ```
//!
//! `InputMode` only decides what a key means. Grabbing the keyboard, showing
//! labels and carrying out the swap or move are the engine's job.

use std::time::{Duration, Instant};

use crate::column::Direction;
use crate::host::Key;
use crate::types::{DeskKey, WindowId};

/// Label characters, assigned in this order.
pub const LABEL_KEYS: &str = "asdfghkl;'qwertyuiop[]\\zxcvbnm,./`1234567890-=";

/// A session ends on its own after this long.
pub const OVERLAY_TIMEOUT: Duration = Duration::from_secs(5);

/// The interactive session, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum InputMode {
    #[default]
    None,
    Swapping {
        subject: WindowId,
        desk: DeskKey,
        labels: Vec<(char, WindowId)>,
        deadline: Instant,
    },
    Moving {
        subject: WindowId,
        desk: DeskKey,
        deadline: Instant,
    },
}

/// What a key press asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    /// Not for us, session continues
    Pass,
    /// End the session
    Stop,
    /// Swap the two windows and end the session
    Swap(WindowId, WindowId),
    /// Move the window one step and stay in the session
    Step(WindowId, Direction),
}

impl InputMode {
    pub fn is_active(&self) -> bool {
        !matches!(self, InputMode::None)
    }

    pub fn name(&self) -> &'static str {
        match self {
            InputMode::None => "none",
            InputMode::Swapping { .. } => "swapping",
            InputMode::Moving { .. } => "moving",
        }
    }

    pub fn subject(&self) -> Option<WindowId> {
        match self {
            InputMode::None => None,
            InputMode::Swapping { subject, .. } | InputMode::Moving { subject, .. } => Some(*subject),
        }
    }

    pub fn desk(&self) -> Option<DeskKey> {
        match self {
            InputMode::None => None,
            InputMode::Swapping { desk, .. } | InputMode::Moving { desk, .. } => Some(*desk),
        }
    }

    pub fn labels(&self) -> &[(char, WindowId)] {
        match self {
            InputMode::Swapping { labels, .. } => labels,
            _ => &[],
        }
    }

    /// The session has outlived its deadline.
    pub fn expired(&self, now: Instant) -> bool {
        match self {
            InputMode::None => false,
            InputMode::Swapping { deadline, .. } | InputMode::Moving { deadline, .. } => now >= *deadline,
        }
    }

    pub fn key_action(&self, key: Key) -> KeyAction {
        match self {
            InputMode::None => KeyAction::Pass,
            InputMode::Swapping { subject, labels, .. } => match key {
                Key::Modifier => KeyAction::Pass,
                Key::Char(c) => labels
                    .iter()
                    .find(|(label, _)| *label == c)
                    .map(|&(_, target)| KeyAction::Swap(*subject, target))
                    .unwrap_or(KeyAction::Stop),
                _ => KeyAction::Stop,
            },
            InputMode::Moving { subject, .. } => {
                let direction = match key {
                    Key::Up | Key::Char('k') => Direction::Up,
                    Key::Down | Key::Char('j') => Direction::Down,
                    Key::Left | Key::Char('h') => Direction::Left,
                    Key::Right | Key::Char('l') => Direction::Right,
                    Key::Return | Key::Escape => return KeyAction::Stop,
                    _ => return KeyAction::Pass,
                };
                KeyAction::Step(*subject, direction)
            }
        }
    }
}

/// Label every candidate except `subject`, in order, until the label
/// characters run out.
pub fn assign_labels(subject: WindowId, candidates: impl IntoIterator<Item = WindowId>) -> Vec<(char, WindowId)> {
    LABEL_KEYS
        .chars()
        .zip(candidates.into_iter().filter(|&w| w != subject))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn swapping(labels: Vec<(char, WindowId)>) -> InputMode {
        InputMode::Swapping {
            subject: 1,
            desk: DeskKey::default(),
            labels,
            deadline: Instant::now() + OVERLAY_TIMEOUT,
        }
    }

    #[test]
    fn test_assign_labels_skips_subject() {
        let labels = assign_labels(2, [1, 2, 3, 4]);
        assert_eq!(labels, vec![('a', 1), ('s', 3), ('d', 4)]);
    }

    #[test]
    fn test_assign_labels_runs_out() {
        let count = LABEL_KEYS.chars().count();
        let labels = assign_labels(0, 1..=(count as u32 + 10));
        assert_eq!(labels.len(), count);
        assert_eq!(labels.last().map(|l| l.0), Some('='));
    }

    #[test]
    fn test_label_keys_unique() {
        let mut keys: Vec<char> = LABEL_KEYS.chars().collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), LABEL_KEYS.chars().count());
        assert!(LABEL_KEYS.contains('\\'));
    }

    #[test]
    fn test_swapping_keys() {
        let mode = swapping(vec![('a', 5), ('s', 6)]);
        assert_eq!(mode.key_action(Key::Char('s')), KeyAction::Swap(1, 6));
        assert_eq!(mode.key_action(Key::Modifier), KeyAction::Pass);
        assert_eq!(mode.key_action(Key::Char('z')), KeyAction::Stop);
        assert_eq!(mode.key_action(Key::Escape), KeyAction::Stop);
        assert_eq!(mode.key_action(Key::Return), KeyAction::Stop);
        assert_eq!(mode.key_action(Key::Up), KeyAction::Stop);
    }

    #[test]
    fn test_moving_keys() {
        let mode = InputMode::Moving {
            subject: 3,
            desk: DeskKey::default(),
            deadline: Instant::now() + OVERLAY_TIMEOUT,
        };
        assert_eq!(mode.key_action(Key::Char('k')), KeyAction::Step(3, Direction::Up));
        assert_eq!(mode.key_action(Key::Down), KeyAction::Step(3, Direction::Down));
        assert_eq!(mode.key_action(Key::Char('h')), KeyAction::Step(3, Direction::Left));
        assert_eq!(mode.key_action(Key::Right), KeyAction::Step(3, Direction::Right));
        assert_eq!(mode.key_action(Key::Escape), KeyAction::Stop);
        assert_eq!(mode.key_action(Key::Char('x')), KeyAction::Pass);
        assert_eq!(mode.key_action(Key::Modifier), KeyAction::Pass);
    }

    #[test]
    fn test_expiry() {
        let now = Instant::now();
        let mode = InputMode::Moving {
            subject: 1,
            desk: DeskKey::default(),
            deadline: now + OVERLAY_TIMEOUT,
        };
        assert!(!mode.expired(now));
        assert!(mode.expired(now + OVERLAY_TIMEOUT));
        assert!(!InputMode::None.expired(now));
        assert_eq!(InputMode::None.key_action(Key::Escape), KeyAction::Pass);
    }
}
