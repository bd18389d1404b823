//! Quick settings face of the notification shade
//!
//! Holds the toggles, the notification list and the controller that flips
//! the shade between its notification and settings faces.

use tracing::{debug, info};

use crate::input::PanelHost;

/// Quick toggle button definition
#[derive(Debug, Clone, PartialEq)]
pub struct QuickToggle {
    pub id: String,
    pub name: String,
    pub icon: &'static str,
    pub enabled: bool,
}

impl QuickToggle {
    pub fn new(id: &str, name: &str, icon: &'static str, enabled: bool) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            icon,
            enabled,
        }
    }
}

/// Notification item
#[derive(Debug, Clone)]
pub struct Notification {
    pub id: u32,
    pub app_name: String,
    pub summary: String,
    /// Swipe-to-dismiss / "clear all" may remove it
    pub clearable: bool,
}

impl Notification {
    pub fn new(id: u32, app_name: &str, summary: &str, clearable: bool) -> Self {
        Self {
            id,
            app_name: app_name.to_string(),
            summary: summary.to_string(),
            clearable,
        }
    }
}

/// Notifications shown on the shade
#[derive(Debug, Default)]
pub struct NotificationStore {
    notifications: Vec<Notification>,
    next_id: u32,
}

impl NotificationStore {
    pub fn new() -> Self {
        Self {
            notifications: Vec::new(),
            next_id: 1,
        }
    }

    pub fn add(&mut self, app_name: &str, summary: &str, clearable: bool) -> u32 {
        let id = self.next_id.max(1);
        self.next_id = id + 1;
        self.notifications
            .push(Notification::new(id, app_name, summary, clearable));
        id
    }

    pub fn remove(&mut self, id: u32) {
        self.notifications.retain(|n| n.id != id);
    }

    pub fn has_clearable(&self) -> bool {
        self.notifications.iter().any(|n| n.clearable)
    }

    pub fn is_empty(&self) -> bool {
        self.notifications.is_empty()
    }

    pub fn len(&self) -> usize {
        self.notifications.len()
    }
}

/// Face of the shade currently in front
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShadeFace {
    Notifications,
    Settings,
}

/// Face-flip request, recorded when the controller keeps a history
#[derive(Debug, Clone, PartialEq)]
pub enum FlipRequest {
    SwitchToSettings,
    FlipToSettings,
    Partial(f64),
    CompletePartial,
}

/// Owns the shade faces and answers the gesture machine's queries
#[derive(Debug)]
pub struct ShadeController {
    pub notifications: NotificationStore,
    pub toggles: Vec<QuickToggle>,
    face: ShadeFace,
    /// 0.0 notifications .. 1.0 settings while a drag flip is in progress,
    /// stored from the raw progress in -1.0..1.0
    partial: Option<f64>,
    history: Option<Vec<FlipRequest>>,
}

impl Default for ShadeController {
    fn default() -> Self {
        Self::new()
    }
}

impl ShadeController {
    pub fn new() -> Self {
        Self {
            notifications: NotificationStore::new(),
            toggles: Vec::new(),
            face: ShadeFace::Notifications,
            partial: None,
            history: None,
        }
    }

    /// Start recording requests for [`take_history`](Self::take_history)
    pub fn record_history(&mut self) {
        self.history.get_or_insert_with(Vec::new);
    }

    fn record(&mut self, request: FlipRequest) {
        if let Some(history) = &mut self.history {
            history.push(request);
        }
    }

    pub fn face(&self) -> ShadeFace {
        self.face
    }

    /// Settings-face fraction of an in-progress drag flip
    pub fn partial_progress(&self) -> Option<f64> {
        self.partial
    }

    /// Requests received since the last call; empty unless recording
    pub fn take_history(&mut self) -> Vec<FlipRequest> {
        self.history.as_mut().map(std::mem::take).unwrap_or_default()
    }
}

impl PanelHost for ShadeController {
    fn switch_to_settings(&mut self) {
        info!("Switching shade to settings");
        self.record(FlipRequest::SwitchToSettings);
        self.face = ShadeFace::Settings;
        self.partial = None;
    }

    fn flip_to_settings(&mut self) {
        info!("Flipping shade to settings");
        self.record(FlipRequest::FlipToSettings);
        self.face = ShadeFace::Settings;
        self.partial = None;
    }

    fn partial_flip(&mut self, progress: f64) {
        self.record(FlipRequest::Partial(progress));
        // -1 is the notification face, +1 the settings face
        let fraction = ((progress + 1.0) / 2.0).clamp(0.0, 1.0);
        self.partial = Some(fraction);
    }

    fn complete_partial_flip(&mut self) {
        self.record(FlipRequest::CompletePartial);
        if let Some(fraction) = self.partial.take() {
            self.face = if fraction >= 0.5 {
                ShadeFace::Settings
            } else {
                ShadeFace::Notifications
            };
            debug!(fraction, face = ?self.face, "Partial flip completed");
        }
    }

    fn has_clearable_notifications(&self) -> bool {
        self.notifications.has_clearable()
    }

    fn has_visible_notifications(&self) -> bool {
        !self.notifications.is_empty()
    }

    fn is_showing_settings(&self) -> bool {
        self.face == ShadeFace::Settings
    }
}
