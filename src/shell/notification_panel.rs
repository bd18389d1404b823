//! Notification panel view
//!
//! Pulls down from the status bar. Draws its handle bar glued to the bottom
//! edge, runs the settings flip gesture on every touch and forwards what it
//! does not consume to the handle view.

use serde::{Deserialize, Serialize};
use smithay::utils::{Logical, Size};
use tracing::{debug, trace};

use super::background::{Backdrop, BackgroundRenderer, Rotation};
use super::primitives::{Argb, Color, Rect};
use crate::input::{
    FlipConfig, FlipGesture, FlipOutcome, FlipSettings, PanelGeometry, PanelHost, PinnedPointer,
    TouchEvent,
};
use crate::settings::SettingsSnapshot;

/// Spoken when the shade window opens
pub const ACCESSIBILITY_DESCRIPTION: &str = "Notification shade.";

/// Stock background drawn when no wallpaper is set
pub const PANEL_BACKGROUND: Color = [0.10, 0.10, 0.18, 1.0];

/// Accessibility event kinds the panel reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessibilityEvent {
    WindowStateChanged,
    Other,
}

/// Static panel dimensions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelConfig {
    pub handle_bar_height: f64,
    pub padding_left: f64,
    pub padding_right: f64,
    pub padding_bottom: f64,
    pub flip: FlipConfig,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            handle_bar_height: 48.0,
            padding_left: 0.0,
            padding_right: 0.0,
            padding_bottom: 0.0,
            flip: FlipConfig::default(),
        }
    }
}

/// The view that actually drags the shade
pub trait HandleTarget {
    /// Handle a touch; `pin` overrides the primary finger position
    fn dispatch_touch(&mut self, event: &TouchEvent, pin: Option<&PinnedPointer>) -> bool;
    /// Pressed state used to draw the handle bar
    fn is_pressed(&self) -> bool {
        false
    }
}

/// Something for the backend to paint, in panel coordinates
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Fill {
        rect: Rect,
        color: Color,
    },
    /// Wallpaper image scaled into `rect`
    Image {
        rect: Rect,
        width: u32,
        height: u32,
        alpha: u8,
    },
    HandleBar {
        rect: Rect,
        pressed: bool,
    },
}

fn apply_tint(base: Color, tint: Option<Argb>, alpha: u8) -> Color {
    // Tint replaces the color and keeps the source coverage (SRC_ATOP)
    let mut color = tint.map_or(base, |t| {
        let [r, g, b, _] = t.to_color();
        [r, g, b, base[3]]
    });
    color[3] *= alpha as f32 / 255.0;
    color
}

/// Notification panel state
#[derive(Debug)]
pub struct NotificationPanel {
    pub config: PanelConfig,
    size: Size<f64, Logical>,
    handle_bar: Rect,
    expanded_height: f64,
    max_height: f64,
    just_peeked: bool,
    gesture: FlipGesture,
    background: BackgroundRenderer,
}

impl NotificationPanel {
    pub fn new(config: PanelConfig) -> Self {
        let gesture = FlipGesture::new(config.flip.clone());
        Self {
            config,
            size: Size::from((0.0, 0.0)),
            handle_bar: Rect::default(),
            expanded_height: 0.0,
            max_height: 0.0,
            just_peeked: false,
            gesture,
            background: BackgroundRenderer::new(),
        }
    }

    /// Refresh from settings: gesture modes and background
    pub fn on_settings_changed(&mut self, snapshot: &SettingsSnapshot) {
        self.gesture.set_settings(FlipSettings::from(snapshot));
        self.background.apply(snapshot);
        debug!(settings = ?self.gesture.settings(), "Notification panel refreshed");
    }

    /// Layout pass
    pub fn layout(&mut self, size: Size<f64, Logical>) {
        if size == self.size {
            return;
        }
        self.size = size;
        self.max_height = size.h;
        self.handle_bar = Rect::new(
            self.config.padding_left,
            0.0,
            (size.w - self.config.padding_right - self.config.padding_left).max(0.0),
            self.config.handle_bar_height,
        );
        trace!(w = size.w, h = size.h, "Notification panel laid out");
    }

    pub fn size(&self) -> Size<f64, Logical> {
        self.size
    }

    /// Current pull-down height, set by the shade's drag/fling animation
    pub fn set_expanded_height(&mut self, height: f64) {
        self.expanded_height = height.clamp(0.0, self.max_height.max(0.0));
    }

    pub fn expanded_height(&self) -> f64 {
        self.expanded_height
    }

    pub fn is_fully_expanded(&self) -> bool {
        self.max_height > 0.0 && self.expanded_height >= self.max_height
    }

    pub fn set_just_peeked(&mut self, peeked: bool) {
        self.just_peeked = peeked;
    }

    pub fn gesture(&self) -> &FlipGesture {
        &self.gesture
    }

    pub fn background(&self) -> &BackgroundRenderer {
        &self.background
    }

    pub fn on_configuration_changed(&mut self, rotation: Rotation) {
        self.background.on_configuration_changed(rotation);
    }

    pub fn geometry(&self) -> PanelGeometry {
        PanelGeometry {
            size: self.size,
            padding_bottom: self.config.padding_bottom,
            handle_bar_height: self.config.handle_bar_height,
            expanded_height: self.expanded_height,
            fully_expanded: self.is_fully_expanded(),
            just_peeked: self.just_peeked,
        }
    }

    /// Text to announce for an accessibility event, `None` to let the
    /// children populate it
    pub fn accessibility_text(&self, event: AccessibilityEvent) -> Option<&'static str> {
        match event {
            AccessibilityEvent::WindowStateChanged => Some(ACCESSIBILITY_DESCRIPTION),
            AccessibilityEvent::Other => None,
        }
    }

    /// Touch entry point; returns whether the event was handled
    pub fn on_touch(
        &mut self,
        event: &TouchEvent,
        host: &mut dyn PanelHost,
        handle: &mut dyn HandleTarget,
    ) -> bool {
        let geometry = self.geometry();
        let FlipOutcome { consumed, pin, .. } = self.gesture.handle(event, &geometry, host);
        if consumed {
            return true;
        }
        handle.dispatch_touch(event, pin.as_ref())
    }

    /// Draw pass
    pub fn draw(&self, handle: &dyn HandleTarget) -> Vec<DrawOp> {
        let full = Rect::new(0.0, 0.0, self.size.w, self.size.h);
        let mut ops = Vec::with_capacity(2);

        match self.background.backdrop() {
            Backdrop::Resource { tint, alpha } => ops.push(DrawOp::Fill {
                rect: full,
                color: apply_tint(PANEL_BACKGROUND, *tint, *alpha),
            }),
            Backdrop::Wallpaper { alpha, .. } => {
                if let Some(image) = self.background.shown_image() {
                    ops.push(DrawOp::Image {
                        rect: full,
                        width: image.width(),
                        height: image.height(),
                        alpha: *alpha,
                    });
                }
            }
        }

        let offset = self.size.h - self.config.handle_bar_height - self.config.padding_bottom;
        ops.push(DrawOp::HandleBar {
            rect: self.handle_bar.translate(0.0, offset),
            pressed: handle.is_pressed(),
        });
        ops
    }
}
