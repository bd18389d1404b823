//! Settings flip gesture recognizer
//!
//! Decides, per touch sequence on the notification panel, between:
//! - an ordinary drag of the shade (events pass through to the handle)
//! - an immediate or animated flip to the quick settings face, from a tap
//!   in the quick pulldown zone, a smart pulldown rule, or a second finger
//! - a horizontal swipe on the fully expanded shade driving a partial flip
//!
//! Phases: `Idle -> Tracking | Ignoring -> SwipeTriggered`, back to `Idle`
//! on up or cancel.

use serde::{Deserialize, Serialize};
use smithay::utils::{Logical, Point, Size};
use tracing::{debug, trace};

use super::touch::{PinnedPointer, TouchAction, TouchEvent};
use crate::settings::{QuickPulldown, SettingsSnapshot, SmartPulldown};

/// Controller of the shade faces, as seen by the gesture recognizer
pub trait PanelHost {
    /// Show the settings face without animation
    fn switch_to_settings(&mut self);
    /// Animate to the settings face
    fn flip_to_settings(&mut self);
    /// Drag-driven flip, -1.0 notifications .. 1.0 settings
    fn partial_flip(&mut self, progress: f64);
    /// Finger lifted, settle the partial flip
    fn complete_partial_flip(&mut self);
    fn has_clearable_notifications(&self) -> bool;
    fn has_visible_notifications(&self) -> bool;
    fn is_showing_settings(&self) -> bool;
    /// Whether the shade has a settings face to flip to
    fn has_flip_settings(&self) -> bool {
        true
    }
}

/// Thresholds for the flip gesture, as fractions of the panel size
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlipConfig {
    /// Settings drag shortcut enabled at all
    pub enabled: bool,
    /// Left pulldown zone ends at `1 - left_percentage` of the width
    pub left_percentage: f64,
    /// Right pulldown zone starts at `1 - right_percentage` of the width
    pub right_percentage: f64,
    /// Horizontal travel that triggers a swipe flip
    pub swipe_trigger_percentage: f64,
    /// Vertical travel that abandons swipe tracking
    pub swipe_vertical_max_percentage: f64,
    /// Horizontal travel for a full partial flip
    pub swipe_move_percentage: f64,
}

impl Default for FlipConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            left_percentage: 0.7,
            right_percentage: 0.3,
            swipe_trigger_percentage: 0.05,
            swipe_vertical_max_percentage: 0.025,
            swipe_move_percentage: 0.2,
        }
    }
}

/// Settings the recognizer depends on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FlipSettings {
    pub quick_pulldown: QuickPulldown,
    pub smart_pulldown: SmartPulldown,
    pub swipe_anywhere: bool,
}

impl From<&SettingsSnapshot> for FlipSettings {
    fn from(snapshot: &SettingsSnapshot) -> Self {
        Self {
            quick_pulldown: snapshot.quick_pulldown,
            smart_pulldown: snapshot.smart_pulldown,
            swipe_anywhere: snapshot.swipe_anywhere,
        }
    }
}

/// Panel geometry at the time of an event
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanelGeometry {
    pub size: Size<f64, Logical>,
    pub padding_bottom: f64,
    pub handle_bar_height: f64,
    /// Height the shade is currently pulled down to
    pub expanded_height: f64,
    pub fully_expanded: bool,
    /// Shade was only peeked open by a tap on the status bar
    pub just_peeked: bool,
}

impl PanelGeometry {
    /// Top of the handle bar strip
    pub fn handle_top(&self) -> f64 {
        self.size.h - self.handle_bar_height - self.padding_bottom
    }

    /// Where the handle's finger is pinned during a flip
    pub fn bottom_center(&self) -> Point<f64, Logical> {
        Point::from((self.size.w / 2.0, self.size.h))
    }

    pub fn is_collapsed(&self) -> bool {
        self.expanded_height == 0.0
    }
}

/// Where a touch sequence currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlipPhase {
    Idle,
    /// Watching for a horizontal swipe
    Tracking,
    /// Down seen, not a swipe candidate
    Ignoring,
    /// Horizontal swipe driving a partial flip
    SwipeTriggered,
}

/// State of one touch sequence
#[derive(Debug, Clone, PartialEq)]
pub struct GestureSession {
    pub start: Point<f64, Logical>,
    pub tracking: bool,
    pub triggered: bool,
    /// +1 or -1 so that continuing the swipe always advances the flip
    pub direction: f64,
    /// Progress at swipe start: -1 on notifications, +1 on settings
    pub flip_offset: f64,
    pub ok_to_flip: bool,
}

impl GestureSession {
    fn begin(start: Point<f64, Logical>, geometry: &PanelGeometry, swipe_anywhere: bool) -> Self {
        let tracking =
            geometry.fully_expanded && (swipe_anywhere || start.y > geometry.handle_top());
        Self {
            start,
            tracking,
            triggered: false,
            direction: 1.0,
            flip_offset: -1.0,
            ok_to_flip: geometry.is_collapsed(),
        }
    }

    /// Returns true when this move triggered the swipe
    fn track_move(
        &mut self,
        pos: Point<f64, Logical>,
        geometry: &PanelGeometry,
        config: &FlipConfig,
        showing_settings: bool,
    ) -> bool {
        let delta_x = (pos.x - self.start.x).abs();
        let delta_y = (pos.y - self.start.y).abs();
        let max_delta_y = geometry.size.h * config.swipe_vertical_max_percentage;
        let min_delta_x = geometry.size.w * config.swipe_trigger_percentage;

        if self.tracking && delta_y > max_delta_y {
            trace!(delta_y, "Vertical drag, no swipe flip");
            self.tracking = false;
        }
        if !(self.tracking && delta_x > delta_y && delta_x > min_delta_x) {
            return false;
        }

        // Moving further in the starting direction always advances the flip
        self.direction = if pos.x < self.start.x { -1.0 } else { 1.0 };
        if showing_settings {
            self.flip_offset = 1.0;
            self.direction = -self.direction;
        } else {
            self.flip_offset = -1.0;
        }
        self.start.x = pos.x;
        self.tracking = false;
        self.triggered = true;
        debug!(direction = self.direction, offset = self.flip_offset, "Swipe flip started");
        true
    }
}

/// What the recognizer asked the host to do
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FlipAction {
    SwitchToSettings,
    FlipToSettings,
    PartialFlip(f64),
    CompletePartialFlip,
}

/// Result of feeding one event
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FlipOutcome {
    /// Event handled here, do not forward it
    pub consumed: bool,
    /// Forward with the primary finger pinned here
    pub pin: Option<PinnedPointer>,
    pub action: Option<FlipAction>,
}

/// Settings flip gesture recognizer
#[derive(Debug, Clone, Default)]
pub struct FlipGesture {
    pub config: FlipConfig,
    settings: FlipSettings,
    session: Option<GestureSession>,
}

impl FlipGesture {
    pub fn new(config: FlipConfig) -> Self {
        Self {
            config,
            settings: FlipSettings::default(),
            session: None,
        }
    }

    pub fn set_settings(&mut self, settings: FlipSettings) {
        self.settings = settings;
    }

    pub fn settings(&self) -> FlipSettings {
        self.settings
    }

    pub fn session(&self) -> Option<&GestureSession> {
        self.session.as_ref()
    }

    pub fn phase(&self) -> FlipPhase {
        match &self.session {
            None => FlipPhase::Idle,
            Some(s) if s.triggered => FlipPhase::SwipeTriggered,
            Some(s) if s.tracking => FlipPhase::Tracking,
            Some(_) => FlipPhase::Ignoring,
        }
    }

    /// Does a touch down at `x` ask for the settings face?
    pub fn wants_flip(&self, x: f64, width: f64, host: &dyn PanelHost) -> bool {
        let left = width * (1.0 - self.config.left_percentage);
        let right = width * (1.0 - self.config.right_percentage);

        let zone = match self.settings.quick_pulldown {
            QuickPulldown::Off => false,
            QuickPulldown::Right => x > right,
            QuickPulldown::Left => x < left,
            QuickPulldown::Middle => x > left && x < right,
        };
        let smart = match self.settings.smart_pulldown {
            SmartPulldown::Off => false,
            SmartPulldown::NoClearable => !host.has_clearable_notifications(),
            SmartPulldown::NoVisible => !host.has_visible_notifications(),
        };
        zone || smart
    }

    /// Feed one touch event
    pub fn handle(
        &mut self,
        event: &TouchEvent,
        geometry: &PanelGeometry,
        host: &mut dyn PanelHost,
    ) -> FlipOutcome {
        let mut outcome = FlipOutcome::default();
        if !self.config.enabled || !host.has_flip_settings() {
            return outcome;
        }
        let Some(primary) = event.primary() else {
            return outcome;
        };

        let mut flip = false;
        let mut swipe_started = false;
        let mut swipe_finished = false;

        match event.action {
            TouchAction::Down => {
                let session = GestureSession::begin(primary, geometry, self.settings.swipe_anywhere);
                flip = self.wants_flip(primary.x, geometry.size.w, &*host);
                trace!(
                    x = primary.x,
                    y = primary.y,
                    tracking = session.tracking,
                    ok_to_flip = session.ok_to_flip,
                    flip,
                    "Shade touch down"
                );
                self.session = Some(session);
            }
            TouchAction::Move => {
                if let Some(session) = self.session.as_mut() {
                    swipe_started =
                        session.track_move(primary, geometry, &self.config, host.is_showing_settings());
                }
            }
            // Multi-touch always asks for the settings face
            TouchAction::PointerDown => flip = true,
            TouchAction::PointerUp => {}
            TouchAction::Up | TouchAction::Cancel => {
                if let Some(session) = self.session.as_mut() {
                    swipe_finished = session.triggered;
                    session.triggered = false;
                    session.tracking = false;
                }
            }
        }

        if let Some(session) = self.session.as_mut() {
            if session.ok_to_flip && flip {
                // Keep the flip a near-horizontal tap or drag
                if event.y_spread() < geometry.handle_bar_height {
                    let action = if geometry.just_peeked
                        || geometry.expanded_height < geometry.handle_bar_height
                    {
                        host.switch_to_settings();
                        FlipAction::SwitchToSettings
                    } else {
                        host.flip_to_settings();
                        FlipAction::FlipToSettings
                    };
                    debug!(?action, "Quick pulldown");
                    session.ok_to_flip = false;
                    outcome.action = Some(action);
                }
            } else if session.triggered {
                let travel = geometry.size.w * self.config.swipe_move_percentage;
                let delta_x = (primary.x - session.start.x) * session.direction;
                let progress = if travel > 0.0 {
                    session.flip_offset + delta_x / travel
                } else {
                    session.flip_offset
                };
                host.partial_flip(progress);
                outcome.action = Some(FlipAction::PartialFlip(progress));
                outcome.consumed = !swipe_started;
            } else if swipe_finished {
                debug!("Swipe flip finished");
                host.complete_partial_flip();
                outcome.action = Some(FlipAction::CompletePartialFlip);
            }
        }

        if swipe_started || swipe_finished {
            outcome.pin = Some(PinnedPointer::new(geometry.bottom_center()));
        }

        if matches!(event.action, TouchAction::Up | TouchAction::Cancel) {
            self.session = None;
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::TouchPointer;

    const W: f64 = 1080.0;
    const H: f64 = 1920.0;
    const HANDLE: f64 = 60.0;

    #[derive(Default)]
    struct RecordingHost {
        calls: Vec<FlipAction>,
        clearable: bool,
        visible: bool,
        showing_settings: bool,
        no_flip_settings: bool,
    }

    impl PanelHost for RecordingHost {
        fn switch_to_settings(&mut self) {
            self.calls.push(FlipAction::SwitchToSettings);
        }
        fn flip_to_settings(&mut self) {
            self.calls.push(FlipAction::FlipToSettings);
        }
        fn partial_flip(&mut self, progress: f64) {
            self.calls.push(FlipAction::PartialFlip(progress));
        }
        fn complete_partial_flip(&mut self) {
            self.calls.push(FlipAction::CompletePartialFlip);
        }
        fn has_clearable_notifications(&self) -> bool {
            self.clearable
        }
        fn has_visible_notifications(&self) -> bool {
            self.visible
        }
        fn is_showing_settings(&self) -> bool {
            self.showing_settings
        }
        fn has_flip_settings(&self) -> bool {
            !self.no_flip_settings
        }
    }

    fn collapsed() -> PanelGeometry {
        PanelGeometry {
            size: Size::from((W, H)),
            padding_bottom: 0.0,
            handle_bar_height: HANDLE,
            expanded_height: 0.0,
            fully_expanded: false,
            just_peeked: false,
        }
    }

    fn expanded() -> PanelGeometry {
        PanelGeometry {
            expanded_height: H,
            fully_expanded: true,
            ..collapsed()
        }
    }

    fn gesture(settings: FlipSettings) -> FlipGesture {
        let mut gesture = FlipGesture::new(FlipConfig::default());
        gesture.set_settings(settings);
        gesture
    }

    fn quick(mode: QuickPulldown) -> FlipSettings {
        FlipSettings {
            quick_pulldown: mode,
            ..FlipSettings::default()
        }
    }

    fn down(x: f64, y: f64) -> TouchEvent {
        TouchEvent::single(TouchAction::Down, x, y)
    }

    fn moved(x: f64, y: f64) -> TouchEvent {
        TouchEvent::single(TouchAction::Move, x, y)
    }

    fn up(x: f64, y: f64) -> TouchEvent {
        TouchEvent::single(TouchAction::Up, x, y)
    }

    #[test]
    fn test_no_tracking_above_handle_strip() {
        let mut gesture = gesture(FlipSettings::default());
        let mut host = RecordingHost::default();
        gesture.handle(&down(540.0, 1000.0), &expanded(), &mut host);
        assert_eq!(gesture.phase(), FlipPhase::Ignoring);
    }

    #[test]
    fn test_tracking_in_handle_strip_or_anywhere() {
        let mut host = RecordingHost::default();

        let mut strict = gesture(FlipSettings::default());
        strict.handle(&down(540.0, H - 10.0), &expanded(), &mut host);
        assert_eq!(strict.phase(), FlipPhase::Tracking);

        let mut anywhere = gesture(FlipSettings {
            swipe_anywhere: true,
            ..FlipSettings::default()
        });
        anywhere.handle(&down(540.0, 300.0), &expanded(), &mut host);
        assert_eq!(anywhere.phase(), FlipPhase::Tracking);

        // Only a fully expanded shade tracks swipes
        let mut partial = gesture(FlipSettings {
            swipe_anywhere: true,
            ..FlipSettings::default()
        });
        let half = PanelGeometry {
            expanded_height: 900.0,
            ..collapsed()
        };
        partial.handle(&down(540.0, 300.0), &half, &mut host);
        assert_eq!(partial.phase(), FlipPhase::Ignoring);
    }

    #[test]
    fn test_right_pulldown_zone_switches_when_collapsed() {
        let mut gesture = gesture(quick(QuickPulldown::Right));
        let mut host = RecordingHost::default();

        let outcome = gesture.handle(&down(0.75 * W, 10.0), &collapsed(), &mut host);
        assert_eq!(outcome.action, Some(FlipAction::SwitchToSettings));
        assert_eq!(host.calls, vec![FlipAction::SwitchToSettings]);
        assert!(!outcome.consumed);
        assert_eq!(outcome.pin, None);

        host.calls.clear();
        gesture.handle(&down(0.65 * W, 10.0), &collapsed(), &mut host);
        assert!(host.calls.is_empty());
    }

    #[test]
    fn test_left_and_middle_zones() {
        let host = RecordingHost::default();

        let left = gesture(quick(QuickPulldown::Left));
        assert!(left.wants_flip(0.2 * W, W, &host));
        assert!(!left.wants_flip(0.5 * W, W, &host));

        let middle = gesture(quick(QuickPulldown::Middle));
        assert!(middle.wants_flip(0.5 * W, W, &host));
        assert!(!middle.wants_flip(0.1 * W, W, &host));
        assert!(!middle.wants_flip(0.9 * W, W, &host));

        let off = gesture(FlipSettings::default());
        assert!(!off.wants_flip(0.9 * W, W, &host));
    }

    #[test]
    fn test_smart_pulldown_ignores_position() {
        let mut gesture = gesture(FlipSettings {
            smart_pulldown: SmartPulldown::NoVisible,
            ..FlipSettings::default()
        });
        let mut host = RecordingHost::default();

        for x in [1.0, 0.5 * W, W - 1.0] {
            host.calls.clear();
            gesture.handle(&down(x, 10.0), &collapsed(), &mut host);
            assert_eq!(host.calls, vec![FlipAction::SwitchToSettings]);
        }

        host.visible = true;
        host.calls.clear();
        gesture.handle(&down(10.0, 10.0), &collapsed(), &mut host);
        assert!(host.calls.is_empty());
    }

    #[test]
    fn test_smart_pulldown_no_clearable() {
        let mut host = RecordingHost {
            visible: true,
            ..RecordingHost::default()
        };
        let gesture = gesture(FlipSettings {
            smart_pulldown: SmartPulldown::NoClearable,
            ..FlipSettings::default()
        });
        assert!(gesture.wants_flip(10.0, W, &host));
        host.clearable = true;
        assert!(!gesture.wants_flip(10.0, W, &host));
    }

    #[test]
    fn test_no_flip_unless_collapsed_at_down() {
        let mut gesture = gesture(quick(QuickPulldown::Right));
        let mut host = RecordingHost::default();
        let half = PanelGeometry {
            expanded_height: 900.0,
            ..collapsed()
        };
        gesture.handle(&down(0.9 * W, 10.0), &half, &mut host);
        assert!(host.calls.is_empty());
    }

    #[test]
    fn test_second_finger_flips_once() {
        let mut gesture = gesture(FlipSettings::default());
        let mut host = RecordingHost::default();
        gesture.handle(&down(540.0, 10.0), &collapsed(), &mut host);
        assert!(host.calls.is_empty());

        let pulled = PanelGeometry {
            expanded_height: 400.0,
            ..collapsed()
        };
        let two = TouchEvent::new(
            TouchAction::PointerDown,
            vec![
                TouchPointer::new(0, Point::from((400.0, 380.0))),
                TouchPointer::new(1, Point::from((700.0, 400.0))),
            ],
        );
        let outcome = gesture.handle(&two, &pulled, &mut host);
        assert_eq!(outcome.action, Some(FlipAction::FlipToSettings));

        // Flipping is disallowed for the rest of the sequence
        gesture.handle(&two, &pulled, &mut host);
        assert_eq!(host.calls, vec![FlipAction::FlipToSettings]);
    }

    #[test]
    fn test_second_finger_far_apart_vertically_does_not_flip() {
        let mut gesture = gesture(FlipSettings::default());
        let mut host = RecordingHost::default();
        gesture.handle(&down(540.0, 10.0), &collapsed(), &mut host);

        let two = TouchEvent::new(
            TouchAction::PointerDown,
            vec![
                TouchPointer::new(0, Point::from((400.0, 100.0))),
                TouchPointer::new(1, Point::from((700.0, 100.0 + HANDLE))),
            ],
        );
        gesture.handle(&two, &collapsed(), &mut host);
        assert!(host.calls.is_empty());
    }

    #[test]
    fn test_just_peeked_switches_immediately() {
        let mut gesture = gesture(FlipSettings::default());
        let mut host = RecordingHost::default();
        gesture.handle(&down(540.0, 10.0), &collapsed(), &mut host);

        let peeked = PanelGeometry {
            expanded_height: 400.0,
            just_peeked: true,
            ..collapsed()
        };
        let two = TouchEvent::new(
            TouchAction::PointerDown,
            vec![
                TouchPointer::new(0, Point::from((400.0, 300.0))),
                TouchPointer::new(1, Point::from((700.0, 310.0))),
            ],
        );
        gesture.handle(&two, &peeked, &mut host);
        assert_eq!(host.calls, vec![FlipAction::SwitchToSettings]);
    }

    #[test]
    fn test_horizontal_swipe_drives_partial_flip() {
        let mut gesture = gesture(FlipSettings::default());
        let mut host = RecordingHost::default();
        let geometry = expanded();
        let y = H - 20.0;

        gesture.handle(&down(300.0, y), &geometry, &mut host);
        assert_eq!(gesture.phase(), FlipPhase::Tracking);

        // Below the 5% trigger: nothing yet
        let outcome = gesture.handle(&moved(340.0, y), &geometry, &mut host);
        assert_eq!(outcome, FlipOutcome::default());

        let outcome = gesture.handle(&moved(400.0, y + 5.0), &geometry, &mut host);
        assert_eq!(gesture.phase(), FlipPhase::SwipeTriggered);
        assert_eq!(outcome.action, Some(FlipAction::PartialFlip(-1.0)));
        assert!(!outcome.consumed);
        assert_eq!(outcome.pin.map(|p| p.position), Some(Point::from((W / 2.0, H))));

        // Travel for a full flip is 20% of the width
        let outcome = gesture.handle(&moved(400.0 + 108.0, y), &geometry, &mut host);
        assert_eq!(outcome.action, Some(FlipAction::PartialFlip(-0.5)));
        assert!(outcome.consumed);
        assert_eq!(outcome.pin, None);

        let outcome = gesture.handle(&up(620.0, y), &geometry, &mut host);
        assert_eq!(outcome.action, Some(FlipAction::CompletePartialFlip));
        assert!(!outcome.consumed);
        assert!(outcome.pin.is_some());
        assert_eq!(gesture.phase(), FlipPhase::Idle);
        assert_eq!(host.calls.last(), Some(&FlipAction::CompletePartialFlip));
    }

    #[test]
    fn test_swipe_from_settings_face_runs_backwards() {
        let mut gesture = gesture(FlipSettings::default());
        let mut host = RecordingHost {
            showing_settings: true,
            ..RecordingHost::default()
        };
        let geometry = expanded();
        let y = H - 20.0;

        gesture.handle(&down(600.0, y), &geometry, &mut host);
        gesture.handle(&moved(500.0, y), &geometry, &mut host);
        let session = gesture.session().unwrap();
        assert_eq!(session.direction, 1.0);
        assert_eq!(session.flip_offset, 1.0);

        // Continuing left moves progress from settings towards notifications
        let outcome = gesture.handle(&moved(500.0 - 54.0, y), &geometry, &mut host);
        assert_eq!(outcome.action, Some(FlipAction::PartialFlip(0.75)));
    }

    #[test]
    fn test_vertical_drag_abandons_tracking() {
        let mut gesture = gesture(FlipSettings::default());
        let mut host = RecordingHost::default();
        let geometry = expanded();

        gesture.handle(&down(300.0, H - 10.0), &geometry, &mut host);
        // 2.5% of 1920 is 48
        gesture.handle(&moved(300.0, H - 70.0), &geometry, &mut host);
        assert_eq!(gesture.phase(), FlipPhase::Ignoring);

        let outcome = gesture.handle(&moved(700.0, H - 70.0), &geometry, &mut host);
        assert_eq!(outcome, FlipOutcome::default());
        assert!(host.calls.is_empty());
    }

    #[test]
    fn test_cancel_settles_partial_flip() {
        let mut gesture = gesture(FlipSettings::default());
        let mut host = RecordingHost::default();
        let geometry = expanded();
        let y = H - 20.0;

        gesture.handle(&down(300.0, y), &geometry, &mut host);
        gesture.handle(&moved(400.0, y), &geometry, &mut host);
        let cancel = TouchEvent::single(TouchAction::Cancel, 400.0, y);
        let outcome = gesture.handle(&cancel, &geometry, &mut host);
        assert_eq!(outcome.action, Some(FlipAction::CompletePartialFlip));
        assert_eq!(gesture.phase(), FlipPhase::Idle);
    }

    #[test]
    fn test_disabled_passes_everything_through() {
        let mut host = RecordingHost {
            no_flip_settings: true,
            ..RecordingHost::default()
        };
        let mut gesture = gesture(quick(QuickPulldown::Right));
        let outcome = gesture.handle(&down(0.9 * W, 10.0), &collapsed(), &mut host);
        assert_eq!(outcome, FlipOutcome::default());

        host.no_flip_settings = false;
        gesture.config.enabled = false;
        gesture.handle(&down(0.9 * W, 10.0), &collapsed(), &mut host);
        assert!(host.calls.is_empty());
        assert_eq!(gesture.phase(), FlipPhase::Idle);
    }
}
