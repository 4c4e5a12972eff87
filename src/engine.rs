//! The layout engine as seen by its host.
//!
//! `Engine` owns every desktop context, the geometry tracker, the interactive
//! session and the event tracer. The host hands it events and user actions one
//! at a time together with `&mut` access to itself; each call runs to
//! completion before the next one.

use std::mem;
use std::time::Instant;

use crate::column::ColumnEngine;
use crate::config::TilingConfig;
use crate::constraint::Placement;
use crate::desktop::{DesktopContext, DesktopRegistry};
use crate::error::{Result, TilingError};
use crate::geometry::GeometryTracker;
use crate::host::{Host, HostEvent, Key, PlacedWindow};
use crate::interactive::{assign_labels, InputMode, KeyAction, OVERLAY_TIMEOUT};
use crate::ipc::{ColumnSnapshot, DesktopSnapshot, EngineSnapshot, SessionSnapshot, WindowSnapshot};
use crate::state::{self, StateTransition, StateViolation, UntileReason, WindowState};
use crate::tracing::EventTracer;
use crate::types::{Decoration, DeskKey, Maximize, WindowId};

pub struct Engine {
    settings: TilingConfig,
    registry: DesktopRegistry,
    tracker: GeometryTracker,
    input: InputMode,
    tracer: EventTracer,
}

impl Engine {
    pub fn new(settings: TilingConfig) -> Self {
        Self {
            settings,
            registry: DesktopRegistry::new(),
            tracker: GeometryTracker::new(),
            input: InputMode::None,
            tracer: EventTracer::new(),
        }
    }

    pub fn settings(&self) -> &TilingConfig {
        &self.settings
    }

    pub fn registry(&self) -> &DesktopRegistry {
        &self.registry
    }

    pub fn tracker(&self) -> &GeometryTracker {
        &self.tracker
    }

    pub fn input(&self) -> &InputMode {
        &self.input
    }

    pub fn tracer(&self) -> &EventTracer {
        &self.tracer
    }

    pub fn tracer_mut(&mut self) -> &mut EventTracer {
        &mut self.tracer
    }

    pub fn desktop(&self, desk: DeskKey) -> Option<&DesktopContext> {
        self.registry.get(desk)
    }

    /// Column operations on `desk`, creating its context if needed.
    fn on_desk<'a, H: Host + ?Sized>(&'a mut self, host: &'a mut H, desk: DeskKey) -> ColumnEngine<'a, H> {
        let ctx = self.registry.get_or_create(desk, &self.settings);
        ColumnEngine::new(ctx, &mut self.tracker, host, &self.settings)
    }

    /// Desktop that user actions apply to.
    fn current_desk<H: Host + ?Sized>(&self, host: &H) -> Option<DeskKey> {
        self.registry
            .active()
            .or_else(|| host.focused_window().and_then(|w| host.desk_of(w)))
    }

    pub fn window_state(&self, window: WindowId) -> WindowState {
        if self.registry.desk_tiling(window).is_some() {
            WindowState::Tiled
        } else if self.registry.contexts().any(|ctx| ctx.is_floating(window)) {
            WindowState::Floating
        } else {
            WindowState::Untracked
        }
    }

    // =========================================================================
    // Host events
    // =========================================================================

    /// Dispatch a host event. Errors are logged; the engine is left as it was.
    pub fn handle_event<H: Host + ?Sized>(&mut self, host: &mut H, event: HostEvent, now: Instant) {
        let result = match event {
            HostEvent::WindowPlaced(placed) => self.window_placed(host, &placed).map(|_| ()),
            HostEvent::WindowHidden { window, desk } => self.window_hidden(host, window, desk),
            HostEvent::DesktopWillShow { desk } => {
                self.desktop_will_show(host, desk);
                Ok(())
            }
            HostEvent::DesktopShown { desk } => {
                self.desktop_shown(host, desk);
                Ok(())
            }
            HostEvent::WindowDeskSet { window, desk } => self.window_desk_set(host, window, desk),
            HostEvent::KeyPressed(key) => {
                self.key_pressed(host, key, now);
                Ok(())
            }
        };
        if let Err(e) = result {
            log::error!("Failed to handle {:?}: {}", event, e);
        }
    }

    /// A window appeared or its geometry settled.
    pub fn window_placed<H: Host + ?Sized>(&mut self, host: &mut H, placed: &PlacedWindow) -> Result<Placement> {
        if matches!(self.input, InputMode::Swapping { .. }) {
            self.end_session(host);
        }
        let window = placed.window;
        if let Some(old) = self.registry.desk_tiling(window) {
            if old != placed.desk {
                self.window_desk_set(host, window, placed.desk)?;
                return Ok(Placement::Tiled);
            }
        }

        let outcome = self.on_desk(host, placed.desk).window_placed(placed)?;
        match outcome {
            Placement::Tiled => self.trace_tiled(window, placed.desk),
            Placement::Accepted | Placement::SnappedBack | Placement::Redistributed => {
                self.tracer
                    .trace_transition(&StateTransition::DriftHandled { window, outcome });
            }
            Placement::Ignored | Placement::Echo => {}
        }
        Ok(outcome)
    }

    /// A window was unmapped, destroyed or otherwise hidden by the host.
    pub fn window_hidden<H: Host + ?Sized>(&mut self, host: &mut H, window: WindowId, desk: DeskKey) -> Result<()> {
        self.end_session(host);
        if self.registry.is_switching() {
            log::debug!("Ignoring hide of 0x{:x} during desktop switch", window);
            return Ok(());
        }
        let desk = self.registry.desk_tiling(window).unwrap_or(desk);
        if let Some(ctx) = self.registry.get_mut(desk) {
            ctx.take_floating(window);
        }
        if self.on_desk(host, desk).remove_window(window)? {
            self.tracer.trace_transition(&StateTransition::WindowUntiled {
                window,
                desk: desk.to_string(),
                reason: UntileReason::Hidden,
            });
        }
        Ok(())
    }

    /// The host is about to switch desktops.
    pub fn desktop_will_show<H: Host + ?Sized>(&mut self, host: &mut H, desk: DeskKey) {
        self.end_session(host);
        log::debug!("Switching to desktop {}", desk);
        self.registry.set_switching(true);
    }

    /// The host finished switching to `desk`.
    pub fn desktop_shown<H: Host + ?Sized>(&mut self, host: &mut H, desk: DeskKey) {
        self.registry.set_switching(false);
        self.end_session(host);
        let from = self.registry.active();
        self.registry.set_active(desk);
        self.registry.get_or_create(desk, &self.settings);
        if from != Some(desk) {
            log::info!("Desktop {} shown", desk);
            self.tracer.trace_transition(&StateTransition::DeskShown {
                from: from.map(|d| d.to_string()),
                to: desk.to_string(),
            });
        }
    }

    /// A window was reassigned to `desk`.
    pub fn window_desk_set<H: Host + ?Sized>(&mut self, host: &mut H, window: WindowId, desk: DeskKey) -> Result<()> {
        self.end_session(host);
        self.registry.get_or_create(desk, &self.settings);
        let from = self.registry.desk_tiling(window);
        if from == Some(desk) {
            return Ok(());
        }

        for ctx in self.registry.contexts_mut() {
            if ctx.key() != desk {
                ctx.take_floating(window);
            }
        }
        if let Some(old) = from {
            self.on_desk(host, old).remove_window(window)?;
            self.tracer.trace_transition(&StateTransition::WindowUntiled {
                window,
                desk: old.to_string(),
                reason: UntileReason::DeskChanged,
            });
        }
        self.tracer.trace_transition(&StateTransition::WindowDeskChanged {
            window,
            from: from.map(|d| d.to_string()),
            to: desk.to_string(),
        });
        if self.on_desk(host, desk).insert_window(window)? {
            self.trace_tiled(window, desk);
        }
        Ok(())
    }

    // =========================================================================
    // Interactive sessions
    // =========================================================================

    /// Feed a key press to the interactive session. Returns whether the key
    /// was consumed.
    pub fn key_pressed<H: Host + ?Sized>(&mut self, host: &mut H, key: Key, now: Instant) -> bool {
        if !self.input.is_active() {
            return false;
        }
        if self.input.expired(now) {
            self.end_session(host);
            return false;
        }
        let Some(desk) = self.input.desk() else {
            return false;
        };
        match self.input.key_action(key) {
            KeyAction::Pass => false,
            KeyAction::Stop => {
                self.end_session(host);
                true
            }
            KeyAction::Swap(a, b) => {
                self.end_session(host);
                match self.on_desk(host, desk).swap_windows(a, b) {
                    Ok(()) => self
                        .tracer
                        .trace_transition(&StateTransition::WindowsSwapped { a, b }),
                    Err(e) => log::error!("Swap of 0x{:x} and 0x{:x} failed: {}", a, b, e),
                }
                true
            }
            KeyAction::Step(window, direction) => {
                match self.on_desk(host, desk).move_window(window, direction) {
                    Ok(()) => self.tracer.trace_transition(&StateTransition::WindowStepped {
                        window,
                        direction: format!("{:?}", direction).to_lowercase(),
                    }),
                    Err(e) => {
                        log::error!("Move of 0x{:x} failed: {}", window, e);
                        self.end_session(host);
                    }
                }
                true
            }
        }
    }

    /// End a session that outlived its deadline.
    pub fn tick<H: Host + ?Sized>(&mut self, host: &mut H, now: Instant) {
        if self.input.expired(now) {
            log::debug!("Interactive session timed out");
            self.end_session(host);
        }
    }

    /// Focused tiled window eligible for a session, with its desktop.
    fn session_subject<H: Host + ?Sized>(&self, host: &H, min_tiled: usize) -> Option<(WindowId, DeskKey)> {
        let subject = host.focused_window()?;
        let desk = self.registry.desk_tiling(subject)?;
        if self.registry.active().is_some_and(|active| active != desk) {
            return None;
        }
        let ctx = self.registry.get(desk)?;
        (ctx.desired_columns() > 0 && ctx.tiled_count() >= min_tiled).then_some((subject, desk))
    }

    /// Enter swap mode for the focused window: label every other tiled
    /// window and wait for one of the labels to be typed.
    pub fn start_swap<H: Host + ?Sized>(&mut self, host: &mut H, now: Instant) -> Result<()> {
        self.end_session(host);
        let Some((subject, desk)) = self.session_subject(host, 2) else {
            log::debug!("Nothing to swap");
            return Ok(());
        };
        let candidates: Vec<WindowId> = self
            .registry
            .get(desk)
            .map(|ctx| ctx.tiled_windows().collect())
            .unwrap_or_default();
        self.tracker.ensure_all(&candidates)?;

        host.grab_keyboard()
            .map_err(|e| TilingError::GrabFailed(e.to_string()))?;

        let labels = assign_labels(subject, candidates);
        for &(key, window) in &labels {
            self.tracker.record_mut(window)?.overlay_key = Some(key);
            host.show_label(window, key);
        }
        log::info!("Swap mode for 0x{:x} with {} targets", subject, labels.len());
        self.input = InputMode::Swapping {
            subject,
            desk,
            labels,
            deadline: now + OVERLAY_TIMEOUT,
        };
        self.tracer.trace_transition(&StateTransition::SessionStarted {
            mode: self.input.name().to_string(),
            subject,
        });
        Ok(())
    }

    /// Enter move mode for the focused window.
    pub fn start_move<H: Host + ?Sized>(&mut self, host: &mut H, now: Instant) -> Result<()> {
        self.end_session(host);
        let Some((subject, desk)) = self.session_subject(host, 1) else {
            log::debug!("Nothing to move");
            return Ok(());
        };
        host.grab_keyboard()
            .map_err(|e| TilingError::GrabFailed(e.to_string()))?;

        log::info!("Move mode for 0x{:x}", subject);
        self.input = InputMode::Moving {
            subject,
            desk,
            deadline: now + OVERLAY_TIMEOUT,
        };
        self.tracer.trace_transition(&StateTransition::SessionStarted {
            mode: self.input.name().to_string(),
            subject,
        });
        Ok(())
    }

    /// Leave the current session, releasing the keyboard and the labels.
    pub fn end_session<H: Host + ?Sized>(&mut self, host: &mut H) {
        let mode = mem::take(&mut self.input);
        if !mode.is_active() {
            return;
        }
        self.tracker.clear_overlay_keys();
        host.clear_labels();
        host.release_keyboard();
        log::debug!("Left {} mode", mode.name());
        self.tracer.trace_transition(&StateTransition::SessionEnded {
            mode: mode.name().to_string(),
        });
    }

    // =========================================================================
    // User actions
    // =========================================================================

    /// Float a tiled window or tile a floating one.
    pub fn toggle_floating<H: Host + ?Sized>(&mut self, host: &mut H, window: WindowId) -> Result<()> {
        self.end_session(host);
        let Some(desk) = self.registry.desk_tiling(window).or_else(|| host.desk_of(window)) else {
            return Ok(());
        };
        let ctx = self.registry.get_or_create(desk, &self.settings);

        if ctx.is_floating(window) {
            let original = ctx.take_floating(window).flatten();
            if self.on_desk(host, desk).insert_window_with_original(window, original)? {
                self.trace_tiled(window, desk);
            }
            return Ok(());
        }
        if !ctx.is_tiled(window) {
            log::debug!("0x{:x} is neither tiled nor floating", window);
            return Ok(());
        }

        let original = self.tracker.record(window)?.original;
        self.on_desk(host, desk).remove_window(window)?;
        if let Some(ctx) = self.registry.get_mut(desk) {
            ctx.add_floating(window, Some(original));
        }
        host.maximize(window, Maximize::BOTH);
        host.set_decoration(window, Decoration::Default);
        log::info!("Floated 0x{:x}", window);
        self.tracer.trace_transition(&StateTransition::WindowUntiled {
            window,
            desk: desk.to_string(),
            reason: UntileReason::Floated,
        });
        self.tracer.trace_transition(&StateTransition::WindowFloated {
            window,
            desk: desk.to_string(),
        });
        Ok(())
    }

    /// Add a column on the current desktop.
    pub fn add_column<H: Host + ?Sized>(&mut self, host: &mut H) -> Result<()> {
        self.end_session(host);
        let Some(desk) = self.current_desk(host) else {
            return Ok(());
        };
        self.with_column_change(host, desk, |engine| engine.add_column())
    }

    /// Remove a column on the current desktop.
    pub fn remove_column<H: Host + ?Sized>(&mut self, host: &mut H) -> Result<()> {
        self.end_session(host);
        let Some(desk) = self.current_desk(host) else {
            return Ok(());
        };
        self.with_column_change(host, desk, |engine| engine.remove_column())
    }

    /// Set the desired column count of `desk`.
    pub fn change_column_number<H: Host + ?Sized>(&mut self, host: &mut H, desk: DeskKey, count: usize) -> Result<()> {
        self.end_session(host);
        self.with_column_change(host, desk, |engine| engine.change_column_number(count))
    }

    fn with_column_change<H, F>(&mut self, host: &mut H, desk: DeskKey, change: F) -> Result<()>
    where
        H: Host + ?Sized,
        F: FnOnce(&mut ColumnEngine<'_, H>) -> Result<()>,
    {
        let from = self.registry.get_or_create(desk, &self.settings).desired_columns();
        let result = change(&mut self.on_desk(host, desk));
        let to = self
            .registry
            .get(desk)
            .map(DesktopContext::desired_columns)
            .unwrap_or(from);
        if from != to {
            self.tracer.trace_transition(&StateTransition::ColumnsChanged {
                desk: desk.to_string(),
                from,
                to,
            });
        }
        result
    }

    /// Swap two tiled windows of the same desktop directly.
    pub fn swap_windows<H: Host + ?Sized>(&mut self, host: &mut H, a: WindowId, b: WindowId) -> Result<()> {
        self.end_session(host);
        let desk = self.registry.desk_tiling(a).ok_or(TilingError::NotTiled(a))?;
        if self.registry.desk_tiling(b) != Some(desk) {
            return Err(TilingError::NotTiled(b));
        }
        self.on_desk(host, desk).swap_windows(a, b)?;
        self.tracer
            .trace_transition(&StateTransition::WindowsSwapped { a, b });
        Ok(())
    }

    /// Replace the settings and bring every existing desktop whose configured
    /// column count changed to the new count.
    pub fn apply_settings<H: Host + ?Sized>(&mut self, host: &mut H, settings: TilingConfig) {
        let previous = mem::replace(&mut self.settings, settings);
        for desk in self.registry.keys() {
            let before = previous.columns_for(desk);
            let after = self.settings.columns_for(desk);
            if before != after {
                log::info!("Desktop {} columns {} -> {} from settings", desk, before, after);
                if let Err(e) = self.change_column_number(host, desk, after) {
                    log::error!("Failed to apply columns to {}: {}", desk, e);
                }
            }
        }
    }

    /// The host's usable area changed (a panel appeared, went away or moved
    /// its struts). Every desktop is fitted to the new area.
    pub fn usable_area_changed<H: Host + ?Sized>(&mut self, host: &mut H) {
        for desk in self.registry.keys() {
            if let Err(e) = self.on_desk(host, desk).relayout() {
                log::error!("Failed to fit {} to the new area: {}", desk, e);
            }
        }
    }

    fn trace_tiled(&mut self, window: WindowId, desk: DeskKey) {
        let column = self
            .registry
            .get(desk)
            .and_then(|ctx| ctx.column_of(window))
            .unwrap_or_default();
        self.tracer.trace_transition(&StateTransition::WindowTiled {
            window,
            desk: desk.to_string(),
            column,
        });
    }

    // =========================================================================
    // Introspection
    // =========================================================================

    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            active_desk: self.registry.active(),
            switching: self.registry.is_switching(),
            session: SessionSnapshot {
                mode: self.input.name().to_string(),
                subject: self.input.subject(),
                labels: self.input.labels().to_vec(),
            },
            desktops: self
                .registry
                .keys()
                .into_iter()
                .filter_map(|desk| self.desktop_snapshot(desk))
                .collect(),
        }
    }

    pub fn desktop_snapshot(&self, desk: DeskKey) -> Option<DesktopSnapshot> {
        let ctx = self.registry.get(desk)?;
        let columns = (0..ctx.column_count())
            .map(|col| {
                let (x, width) = ctx.column_extent(col).unwrap_or_default();
                ColumnSnapshot {
                    x,
                    width,
                    windows: ctx
                        .column(col)
                        .iter()
                        .filter_map(|&id| {
                            self.tracker.get(id).map(|record| WindowSnapshot {
                                id,
                                expected: record.expected,
                                original: record.original,
                                label: record.overlay_key,
                            })
                        })
                        .collect(),
                }
            })
            .collect();
        Some(DesktopSnapshot {
            desk,
            desired_columns: ctx.desired_columns(),
            tiled_count: ctx.tiled_count(),
            columns,
            floating: ctx.floating_windows().collect(),
        })
    }

    /// Check the layout invariants of every desktop.
    pub fn validate<H: Host + ?Sized>(&self, host: &H) -> Vec<StateViolation> {
        state::validate(&self.registry, &self.tracker, |desk| host.usable_area(desk))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::{HeadlessHost, HostCommand};
    use crate::types::{Changes, Rect};

    const DESK: DeskKey = DeskKey { zone: 0, x: 0, y: 0 };
    const OTHER: DeskKey = DeskKey { zone: 0, x: 1, y: 0 };

    fn setup() -> (Engine, HeadlessHost) {
        let mut engine = Engine::new(TilingConfig::default());
        let mut host = HeadlessHost::new(Rect::new(0, 0, 1000, 800));
        engine.desktop_shown(&mut host, DESK);
        (engine, host)
    }

    fn open(engine: &mut Engine, host: &mut HeadlessHost, window: WindowId, desk: DeskKey) {
        let placed = host.add_window(window, desk, Rect::new(20, 20, 200, 100));
        engine.window_placed(host, &placed).unwrap();
    }

    #[test]
    fn test_hidden_window_untiled() {
        let (mut engine, mut host) = setup();
        open(&mut engine, &mut host, 1, DESK);
        open(&mut engine, &mut host, 2, DESK);
        host.remove_window(2);
        engine.handle_event(&mut host, HostEvent::WindowHidden { window: 2, desk: DESK }, Instant::now());

        let ctx = engine.desktop(DESK).unwrap();
        assert_eq!(ctx.tiled_count(), 1);
        assert!(!engine.tracker().contains(2));
        assert!(engine.validate(&host).is_empty());
    }

    #[test]
    fn test_hide_ignored_while_switching() {
        let (mut engine, mut host) = setup();
        open(&mut engine, &mut host, 1, DESK);
        engine.handle_event(&mut host, HostEvent::DesktopWillShow { desk: OTHER }, Instant::now());
        engine.handle_event(&mut host, HostEvent::WindowHidden { window: 1, desk: DESK }, Instant::now());
        assert!(engine.desktop(DESK).unwrap().is_tiled(1));

        engine.handle_event(&mut host, HostEvent::DesktopShown { desk: OTHER }, Instant::now());
        assert_eq!(engine.registry().active(), Some(OTHER));
        assert!(!engine.registry().is_switching());
        assert!(engine.desktop(OTHER).is_some());
    }

    #[test]
    fn test_desk_set_moves_window() {
        let (mut engine, mut host) = setup();
        open(&mut engine, &mut host, 1, DESK);
        open(&mut engine, &mut host, 2, DESK);
        host.set_desk(2, OTHER);
        engine.handle_event(&mut host, HostEvent::WindowDeskSet { window: 2, desk: OTHER }, Instant::now());

        assert!(!engine.desktop(DESK).unwrap().is_tiled(2));
        assert!(engine.desktop(OTHER).unwrap().is_tiled(2));
        assert_eq!(engine.registry().desk_tiling(2), Some(OTHER));
        assert!(engine.validate(&host).is_empty());
    }

    #[test]
    fn test_toggle_floating_round_trip() {
        let (mut engine, mut host) = setup();
        open(&mut engine, &mut host, 1, DESK);
        open(&mut engine, &mut host, 2, DESK);

        engine.toggle_floating(&mut host, 2).unwrap();
        assert_eq!(engine.window_state(2), WindowState::Floating);
        assert_eq!(host.maximized(2), Maximize::BOTH);
        assert_eq!(host.window(2).unwrap().decoration, Decoration::Default);
        assert!(engine.validate(&host).is_empty());

        // Placement reports for floating windows are left alone
        let placed = host.user_move_resize(2, Rect::new(5, 5, 50, 50)).unwrap();
        assert_eq!(engine.window_placed(&mut host, &placed).unwrap(), Placement::Ignored);

        engine.toggle_floating(&mut host, 2).unwrap();
        assert_eq!(engine.window_state(2), WindowState::Tiled);
        // The pre-tiling geometry survives the float
        assert_eq!(engine.tracker().get(2).unwrap().original, Rect::new(20, 20, 200, 100));
        assert!(engine.validate(&host).is_empty());
    }

    #[test]
    fn test_swap_session() {
        let (mut engine, mut host) = setup();
        for w in 1..=3 {
            open(&mut engine, &mut host, w, DESK);
        }
        host.focus(1);
        let now = Instant::now();
        engine.start_swap(&mut host, now).unwrap();

        assert_eq!(engine.input().name(), "swapping");
        assert!(host.is_grabbed());
        assert_eq!(host.labels().get(&2), Some(&'a'));
        assert_eq!(host.labels().get(&3), Some(&'s'));
        assert_eq!(engine.tracker().get(3).unwrap().overlay_key, Some('s'));

        assert!(!engine.key_pressed(&mut host, Key::Modifier, now));
        assert!(engine.key_pressed(&mut host, Key::Char('s'), now));
        assert_eq!(engine.desktop(DESK).unwrap().column(0), &[3]);
        assert_eq!(engine.input(), &InputMode::None);
        assert!(!host.is_grabbed());
        assert!(host.labels().is_empty());
        assert_eq!(engine.tracker().get(3).unwrap().overlay_key, None);
    }

    #[test]
    fn test_swap_needs_two_windows() {
        let (mut engine, mut host) = setup();
        open(&mut engine, &mut host, 1, DESK);
        engine.start_swap(&mut host, Instant::now()).unwrap();
        assert!(!engine.input().is_active());
        assert!(!host.is_grabbed());
    }

    #[test]
    fn test_failed_grab_leaves_no_session() {
        let (mut engine, mut host) = setup();
        open(&mut engine, &mut host, 1, DESK);
        open(&mut engine, &mut host, 2, DESK);
        host.refuse_grab(true);

        let err = engine.start_swap(&mut host, Instant::now()).unwrap_err();
        assert!(matches!(err, TilingError::GrabFailed(_)));
        assert!(!engine.input().is_active());
        assert!(host.labels().is_empty());
        assert!(engine.start_move(&mut host, Instant::now()).is_err());
    }

    #[test]
    fn test_move_session_and_timeout() {
        let (mut engine, mut host) = setup();
        for w in 1..=3 {
            open(&mut engine, &mut host, w, DESK);
        }
        host.focus(3);
        let now = Instant::now();
        engine.start_move(&mut host, now).unwrap();
        assert_eq!(engine.input().name(), "moving");

        assert!(engine.key_pressed(&mut host, Key::Char('k'), now));
        assert_eq!(engine.desktop(DESK).unwrap().column(1), &[3, 2]);
        assert!(engine.input().is_active());

        engine.tick(&mut host, now + OVERLAY_TIMEOUT);
        assert!(!engine.input().is_active());
        assert!(!host.is_grabbed());
    }

    #[test]
    fn test_desk_switch_ends_session() {
        let (mut engine, mut host) = setup();
        open(&mut engine, &mut host, 1, DESK);
        open(&mut engine, &mut host, 2, DESK);
        engine.start_swap(&mut host, Instant::now()).unwrap();
        engine.handle_event(&mut host, HostEvent::DesktopWillShow { desk: OTHER }, Instant::now());
        assert!(!engine.input().is_active());
        assert_eq!(host.commands().last(), Some(&HostCommand::ReleaseKeyboard));
    }

    #[test]
    fn test_client_resize_of_lone_window_does_not_leave_gap() {
        let (mut engine, mut host) = setup();
        open(&mut engine, &mut host, 1, DESK);

        // The client shrinks itself right after mapping while still maximized
        host.move_resize(1, Rect::new(0, 0, 640, 480));
        let changes = Changes {
            size: true,
            position: false,
            border: false,
        };
        let placed = host.placed(1, changes).unwrap();
        assert_eq!(engine.window_placed(&mut host, &placed).unwrap(), Placement::Accepted);

        open(&mut engine, &mut host, 2, DESK);
        assert_eq!(engine.tracker().get(1).unwrap().expected, Rect::new(0, 0, 500, 800));
        assert_eq!(host.geometry(1), Some(Rect::new(0, 0, 500, 800)));
        assert!(engine.validate(&host).is_empty());
    }

    #[test]
    fn test_usable_area_change_refits_every_desktop() {
        let (mut engine, mut host) = setup();
        for w in 1..=3 {
            open(&mut engine, &mut host, w, DESK);
        }
        open(&mut engine, &mut host, 4, OTHER);

        // A 30 pixel panel appears at the top
        let area = Rect::new(0, 30, 1000, 770);
        host.set_area(area);
        assert!(!engine.validate(&host).is_empty());
        engine.usable_area_changed(&mut host);

        let expected = |w| engine.tracker().get(w).unwrap().expected;
        assert_eq!(expected(1), Rect::new(0, 30, 500, 770));
        assert_eq!(expected(2), Rect::new(500, 30, 500, 385));
        assert_eq!(expected(3), Rect::new(500, 415, 500, 385));
        assert_eq!(expected(4), area);
        assert_eq!(host.geometry(3), Some(Rect::new(500, 415, 500, 385)));
        assert_eq!(host.geometry(4), Some(area));
        assert_eq!(host.maximized(4), Maximize::BOTH);
        assert!(engine.validate(&host).is_empty());
    }

    #[test]
    fn test_apply_settings_changes_columns() {
        let (mut engine, mut host) = setup();
        for w in 1..=3 {
            open(&mut engine, &mut host, w, DESK);
        }
        let settings = TilingConfig {
            columns: 3,
            ..TilingConfig::default()
        };
        engine.apply_settings(&mut host, settings);
        let ctx = engine.desktop(DESK).unwrap();
        assert_eq!(ctx.desired_columns(), 3);
        assert_eq!(ctx.column_count(), 3);
        assert!(engine.validate(&host).is_empty());
    }

    #[test]
    fn test_snapshot() {
        let (mut engine, mut host) = setup();
        open(&mut engine, &mut host, 1, DESK);
        open(&mut engine, &mut host, 2, DESK);
        let snapshot = engine.snapshot();
        assert_eq!(snapshot.active_desk, Some(DESK));
        assert_eq!(snapshot.desktops.len(), 1);
        let desk = &snapshot.desktops[0];
        assert_eq!(desk.columns.len(), 2);
        assert_eq!(desk.columns[1].windows[0].id, 2);
        assert_eq!(desk.columns[1].x, 500);
        assert!(serde_json::to_string(&snapshot).unwrap().contains("\"desired_columns\":2"));
    }

    #[test]
    fn test_transitions_traced() {
        let (mut engine, mut host) = setup();
        open(&mut engine, &mut host, 1, DESK);
        engine.add_column(&mut host).unwrap();
        let types: Vec<String> = engine
            .tracer()
            .get_all()
            .into_iter()
            .map(|e| e.event_type)
            .collect();
        assert!(types.contains(&"desk_shown".to_string()));
        assert!(types.contains(&"window_tiled".to_string()));
        assert!(types.contains(&"columns_changed".to_string()));
    }
}
