//! Location quick settings tile
//!
//! Tap cycles the location mode, long press opens the location source
//! settings. With no locator mask configured the tile flips between fixed
//! pairs of modes; with a mask it walks the enabled modes in order.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::quick_settings::QuickToggle;
use crate::error::Result;
use crate::settings::SettingsSnapshot;

/// Settings screen opened on long press
pub const LOCATION_SOURCE_SETTINGS: &str = "location_source_settings";

/// Location mode, exactly one active at a time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationMode {
    Off,
    BatterySaving,
    SensorsOnly,
    HighAccuracy,
}

impl LocationMode {
    /// Modes in locator bit order
    pub const LOCATORS: [LocationMode; 4] = [
        LocationMode::Off,
        LocationMode::BatterySaving,
        LocationMode::SensorsOnly,
        LocationMode::HighAccuracy,
    ];

    /// Platform value stored in settings
    pub fn raw(self) -> i64 {
        match self {
            LocationMode::Off => 0,
            LocationMode::SensorsOnly => 1,
            LocationMode::BatterySaving => 2,
            LocationMode::HighAccuracy => 3,
        }
    }

    pub fn from_raw(raw: i64) -> Option<Self> {
        match raw {
            0 => Some(LocationMode::Off),
            1 => Some(LocationMode::SensorsOnly),
            2 => Some(LocationMode::BatterySaving),
            3 => Some(LocationMode::HighAccuracy),
            _ => None,
        }
    }

    /// Bit position in a [`LocatorMask`]
    pub fn locator_index(self) -> usize {
        match self {
            LocationMode::Off => 0,
            LocationMode::BatterySaving => 1,
            LocationMode::SensorsOnly => 2,
            LocationMode::HighAccuracy => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            LocationMode::Off => "Location off",
            LocationMode::BatterySaving => "Battery saving",
            LocationMode::SensorsOnly => "Device only",
            LocationMode::HighAccuracy => "High accuracy",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            LocationMode::Off => "location_off",
            LocationMode::BatterySaving => "location_lowpower",
            LocationMode::SensorsOnly | LocationMode::HighAccuracy => "location_on",
        }
    }
}

/// Modes enabled for cycling, one bit per locator index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocatorMask(u8);

impl LocatorMask {
    const BITS: u8 = 0b1111;

    pub fn from_raw(raw: i64) -> Self {
        Self((raw & Self::BITS as i64) as u8)
    }

    pub fn from_modes(modes: &[LocationMode]) -> Self {
        Self(modes.iter().fold(0, |mask, m| mask | 1 << m.locator_index()))
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn contains(self, mode: LocationMode) -> bool {
        self.contains_index(mode.locator_index())
    }

    fn contains_index(self, index: usize) -> bool {
        self.0 & (1 << index) != 0
    }

    pub fn count(self) -> u32 {
        self.0.count_ones()
    }
}

/// Mode after one tap on the tile
///
/// `current` is `None` when the stored value is not a known mode.
pub fn next_mode(current: Option<LocationMode>, mask: LocatorMask) -> LocationMode {
    if mask.is_empty() {
        return match current {
            Some(LocationMode::BatterySaving) => LocationMode::HighAccuracy,
            Some(LocationMode::HighAccuracy) => LocationMode::BatterySaving,
            Some(LocationMode::Off) => LocationMode::SensorsOnly,
            Some(LocationMode::SensorsOnly) | None => LocationMode::Off,
        };
    }

    let start = current.map_or(0, LocationMode::locator_index);
    let count = LocationMode::LOCATORS.len();
    (1..=count)
        .map(|step| (start + step) % count)
        .find(|&index| mask.contains_index(index))
        .map(|index| LocationMode::LOCATORS[index])
        // A non-empty mask always has a bit within one lap
        .unwrap_or(LocationMode::Off)
}

/// Where the location mode lives
pub trait ModeStore {
    /// `None` when the stored value is not a known mode
    fn read_mode(&self) -> Option<LocationMode>;
    fn write_mode(&mut self, mode: LocationMode) -> Result<()>;
}

/// Action requested by the tile from the shell
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TileAction {
    /// Open a settings screen
    OpenSettings(&'static str),
}

/// Quick settings tile showing and cycling the location mode
#[derive(Debug, Clone)]
pub struct LocationTile {
    mode: Option<LocationMode>,
    mask: LocatorMask,
    toggle: QuickToggle,
}

impl Default for LocationTile {
    fn default() -> Self {
        Self::new()
    }
}

impl LocationTile {
    pub fn new() -> Self {
        let mut tile = Self {
            mode: Some(LocationMode::Off),
            mask: LocatorMask::default(),
            toggle: QuickToggle::new("location", "", "", false),
        };
        tile.update_toggle();
        tile
    }

    /// Refresh from a settings snapshot
    pub fn on_settings_changed(&mut self, snapshot: &SettingsSnapshot) {
        self.mode = snapshot.location_mode;
        self.mask = snapshot.locator_mask;
        self.update_toggle();
        debug!(mode = ?self.mode, mask = self.mask.bits(), "Location tile refreshed");
    }

    /// Tap: write the next mode to the store
    ///
    /// The displayed state changes only once the store reports the change.
    pub fn click(&self, store: &mut impl ModeStore) -> Result<LocationMode> {
        let current = store.read_mode();
        let next = next_mode(current, self.mask);
        info!(from = ?current, to = ?next, "Toggling location mode");
        store.write_mode(next)?;
        Ok(next)
    }

    pub fn long_click(&self) -> TileAction {
        TileAction::OpenSettings(LOCATION_SOURCE_SETTINGS)
    }

    pub fn mode(&self) -> Option<LocationMode> {
        self.mode
    }

    pub fn mask(&self) -> LocatorMask {
        self.mask
    }

    pub fn toggle(&self) -> &QuickToggle {
        &self.toggle
    }

    fn update_toggle(&mut self) {
        let mode = self.mode.unwrap_or(LocationMode::Off);
        self.toggle.name = mode.label().to_string();
        self.toggle.icon = mode.icon();
        self.toggle.enabled = mode != LocationMode::Off;
    }
}
