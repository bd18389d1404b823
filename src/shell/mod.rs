//! Notification shade UI
//!
//! Components:
//! - Location quick settings tile
//! - Quick settings face and its flip controller
//! - Notification panel (handle bar, touch routing, flip gestures)
//! - Panel background (tint or wallpaper)

pub mod background;
pub mod location_tile;
pub mod notification_panel;
pub mod primitives;
pub mod quick_settings;
