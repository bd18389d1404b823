//! Input handling for the notification shade
//!
//! This module provides:
//! - Touch event types with a pinned-pointer override for the handle view
//! - The settings flip gesture recognizer

mod flip_gesture;
mod touch;

pub use flip_gesture::*;
pub use touch::*;
