//! Flick notification shade
//!
//! Features:
//! - Location quick settings tile cycling through the enabled location modes
//! - Quick pulldown / smart pulldown / swipe gestures that flip the shade
//!   to its settings face
//! - Tinted or wallpaper panel background with a landscape variant
//! - Persisted settings with change delivery on the calloop event loop

pub mod config;
pub mod error;
pub mod input;
pub mod settings;
pub mod shell;
pub mod state;

pub use error::{Error, Result};
