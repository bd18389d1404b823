//! Notification panel background
//!
//! The panel shows either its stock background (optionally tinted) or a
//! user wallpaper with an optional landscape variant. Wallpapers are decoded
//! only when their setting changes and are shared; rotation only re-selects.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::RgbaImage;
use tracing::{debug, info, warn};
use url::Url;

use super::primitives::{parse_color, Argb};
use crate::settings::SettingsSnapshot;

/// Prefix selecting a plain tint instead of a wallpaper
pub const COLOR_PREFIX: &str = "color=";

/// Display rotation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rotation {
    #[default]
    Rotation0,
    Rotation90,
    Rotation180,
    Rotation270,
}

impl Rotation {
    pub fn from_degrees(degrees: u32) -> Option<Self> {
        match degrees % 360 {
            0 => Some(Rotation::Rotation0),
            90 => Some(Rotation::Rotation90),
            180 => Some(Rotation::Rotation180),
            270 => Some(Rotation::Rotation270),
            _ => None,
        }
    }

    pub fn is_landscape(self) -> bool {
        matches!(self, Rotation::Rotation90 | Rotation::Rotation270)
    }
}

/// What fills the panel behind the notifications
#[derive(Debug, Clone, PartialEq)]
pub enum Backdrop {
    /// Stock panel background
    Resource { tint: Option<Argb>, alpha: u8 },
    /// User wallpaper over a transparent panel
    Wallpaper {
        portrait: Arc<RgbaImage>,
        landscape: Option<Arc<RgbaImage>>,
        alpha: u8,
    },
}

impl Default for Backdrop {
    fn default() -> Self {
        Backdrop::Resource {
            tint: None,
            alpha: 255,
        }
    }
}

/// `(1 - alpha) * 255`, rounded
pub fn alpha_byte(alpha: f64) -> u8 {
    ((1.0 - alpha) * 255.0).round().clamp(0.0, 255.0) as u8
}

/// File path for a wallpaper setting: a `file://` URI or a plain path
pub fn wallpaper_path(value: &str) -> Option<PathBuf> {
    match Url::parse(value) {
        Ok(url) if url.scheme() == "file" => url.to_file_path().ok(),
        _ => Some(PathBuf::from(value)),
    }
}

fn decode(path: &Path) -> Option<Arc<RgbaImage>> {
    if !path.exists() {
        debug!(path = %path.display(), "Wallpaper file missing");
        return None;
    }
    match image::open(path) {
        Ok(img) => {
            let img = img.to_rgba8();
            info!(path = %path.display(), width = img.width(), height = img.height(), "Loaded wallpaper");
            Some(Arc::new(img))
        }
        Err(e) => {
            warn!(path = %path.display(), "Failed to decode wallpaper: {}", e);
            None
        }
    }
}

fn load(value: &str) -> Option<Arc<RgbaImage>> {
    wallpaper_path(value).and_then(|path| decode(&path))
}

/// Background setting strings the current backdrop was resolved from
#[derive(Debug, Clone, PartialEq)]
struct Sources {
    background: Option<String>,
    landscape: Option<String>,
}

/// Resolves background settings and tracks the image on screen
#[derive(Debug, Default)]
pub struct BackgroundRenderer {
    backdrop: Backdrop,
    rotation: Rotation,
    shown: Option<Arc<RgbaImage>>,
    sources: Option<Sources>,
}

impl BackgroundRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn backdrop(&self) -> &Backdrop {
        &self.backdrop
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    /// Wallpaper image currently shown, if any
    pub fn shown_image(&self) -> Option<&Arc<RgbaImage>> {
        self.shown.as_ref()
    }

    /// Resolve the background settings
    ///
    /// Malformed colors and unreadable files keep the previous background.
    /// Unchanged background strings only update the alpha.
    pub fn apply(&mut self, snapshot: &SettingsSnapshot) {
        let alpha = alpha_byte(snapshot.background_alpha);
        let sources = Sources {
            background: snapshot.background.clone(),
            landscape: snapshot.background_landscape.clone(),
        };
        let background_changed = self
            .sources
            .as_ref()
            .map_or(true, |s| s.background != sources.background);
        let landscape_changed = background_changed
            || self
                .sources
                .as_ref()
                .map_or(true, |s| s.landscape != sources.landscape);

        if background_changed {
            self.resolve(sources.background.as_deref(), alpha);
        }

        match &mut self.backdrop {
            Backdrop::Resource {
                alpha: resource_alpha,
                ..
            } => *resource_alpha = alpha,
            Backdrop::Wallpaper {
                landscape,
                alpha: wallpaper_alpha,
                ..
            } => {
                *wallpaper_alpha = alpha;
                if landscape_changed {
                    *landscape = sources.landscape.as_deref().and_then(load);
                }
            }
        }

        self.sources = Some(sources);
        self.select();
    }

    fn resolve(&mut self, background: Option<&str>, alpha: u8) {
        match background {
            None => {
                self.backdrop = Backdrop::Resource { tint: None, alpha };
            }
            Some(value) if value.starts_with(COLOR_PREFIX) => {
                let hex = &value[COLOR_PREFIX.len()..];
                match parse_color(hex) {
                    Ok(tint) => {
                        debug!(?tint, alpha, "Tinted panel background");
                        self.backdrop = Backdrop::Resource {
                            tint: Some(tint),
                            alpha,
                        };
                    }
                    Err(e) => warn!("Ignoring panel background: {}", e),
                }
            }
            Some(value) => {
                if let Some(portrait) = load(value) {
                    self.backdrop = Backdrop::Wallpaper {
                        portrait,
                        landscape: None,
                        alpha,
                    };
                }
            }
        }
    }

    pub fn on_rotate(&mut self, rotation: Rotation) {
        if rotation != self.rotation {
            debug!(?rotation, "Panel rotated");
        }
        self.rotation = rotation;
        self.select();
    }

    pub fn on_configuration_changed(&mut self, rotation: Rotation) {
        self.on_rotate(rotation);
    }

    fn select(&mut self) {
        self.shown = match &self.backdrop {
            Backdrop::Resource { .. } => None,
            Backdrop::Wallpaper {
                portrait,
                landscape,
                ..
            } => match landscape {
                Some(landscape) if self.rotation.is_landscape() => Some(Arc::clone(landscape)),
                _ => Some(Arc::clone(portrait)),
            },
        };
    }
}
