//! Persisted shell settings
//!
//! Provides:
//! - The setting keys the shade reads and writes, with their defaults
//! - A shared key/value store, optionally backed by a TOML file
//! - Change subscriptions delivered on the calloop event loop
//! - `SettingsSnapshot`, the full set of values handed to the UI on refresh

mod bridge;
mod store;

pub use bridge::*;
pub use store::*;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::shell::location_tile::{LocationMode, LocatorMask};

/// Alpha used when no background alpha is stored
pub const DEFAULT_BACKGROUND_ALPHA: f64 = 0.1;

/// Settings observed by the shade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingKey {
    /// Active location mode (raw platform value)
    LocationMode,
    /// Bitmask of location modes the tile cycles through
    LocatorMask,
    /// Quick pulldown zone: 0 off, 1 right, 2 left, 3 middle
    QuickPulldown,
    /// Smart pulldown: 0 off, 1 no clearable, 2 no visible notifications
    SmartPulldown,
    /// Allow the settings swipe anywhere on a fully expanded shade
    SwipeAnywhere,
    /// `color=<hex>` or a wallpaper file URI
    NotificationBackground,
    /// Landscape wallpaper file URI
    NotificationBackgroundLandscape,
    /// Background transparency, 0.0 opaque .. 1.0 invisible
    NotificationBackgroundAlpha,
}

/// Type of value stored under a key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Int,
    Float,
    Bool,
    Text,
}

impl ValueKind {
    fn name(self) -> &'static str {
        match self {
            ValueKind::Int => "an integer",
            ValueKind::Float => "a number",
            ValueKind::Bool => "a boolean",
            ValueKind::Text => "a string",
        }
    }
}

impl SettingKey {
    pub const ALL: [SettingKey; 8] = [
        SettingKey::LocationMode,
        SettingKey::LocatorMask,
        SettingKey::QuickPulldown,
        SettingKey::SmartPulldown,
        SettingKey::SwipeAnywhere,
        SettingKey::NotificationBackground,
        SettingKey::NotificationBackgroundLandscape,
        SettingKey::NotificationBackgroundAlpha,
    ];

    /// Name of the key in the settings file
    pub fn name(self) -> &'static str {
        match self {
            SettingKey::LocationMode => "location_mode",
            SettingKey::LocatorMask => "expanded_location_mode",
            SettingKey::QuickPulldown => "qs_quick_pulldown",
            SettingKey::SmartPulldown => "qs_smart_pulldown",
            SettingKey::SwipeAnywhere => "qs_swipe_anywhere",
            SettingKey::NotificationBackground => "notification_background",
            SettingKey::NotificationBackgroundLandscape => "notification_background_landscape",
            SettingKey::NotificationBackgroundAlpha => "notification_background_alpha",
        }
    }

    pub fn kind(self) -> ValueKind {
        match self {
            SettingKey::LocationMode
            | SettingKey::LocatorMask
            | SettingKey::QuickPulldown
            | SettingKey::SmartPulldown => ValueKind::Int,
            SettingKey::SwipeAnywhere => ValueKind::Bool,
            SettingKey::NotificationBackground | SettingKey::NotificationBackgroundLandscape => {
                ValueKind::Text
            }
            SettingKey::NotificationBackgroundAlpha => ValueKind::Float,
        }
    }

    /// Value reported when the key is unset (`None` for strings)
    pub fn default_value(self) -> Option<SettingValue> {
        match self.kind() {
            ValueKind::Int => Some(SettingValue::Int(0)),
            ValueKind::Bool => Some(SettingValue::Bool(false)),
            ValueKind::Float => Some(SettingValue::Float(DEFAULT_BACKGROUND_ALPHA)),
            ValueKind::Text => None,
        }
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SettingKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        SettingKey::ALL
            .into_iter()
            .find(|key| key.name() == s)
            .ok_or_else(|| Error::UnknownSetting(s.to_string()))
    }
}

/// A stored setting value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl SettingValue {
    /// Parse user input for `key`
    pub fn parse(key: SettingKey, input: &str) -> Result<Self> {
        let bad = || Error::BadValue {
            key: key.name(),
            expected: key.kind().name(),
            value: input.to_string(),
        };
        let input = input.trim();
        match key.kind() {
            ValueKind::Int => input.parse().map(SettingValue::Int).map_err(|_| bad()),
            ValueKind::Float => input.parse().map(SettingValue::Float).map_err(|_| bad()),
            ValueKind::Bool => match input {
                "1" | "true" | "on" => Ok(SettingValue::Bool(true)),
                "0" | "false" | "off" => Ok(SettingValue::Bool(false)),
                _ => Err(bad()),
            },
            ValueKind::Text => Ok(SettingValue::Text(input.to_string())),
        }
    }

    /// Check that this value can be stored under `key`
    pub fn check(&self, key: SettingKey) -> Result<()> {
        let ok = matches!(
            (key.kind(), self),
            (ValueKind::Int, SettingValue::Int(_))
                | (ValueKind::Float, SettingValue::Float(_) | SettingValue::Int(_))
                | (ValueKind::Bool, SettingValue::Bool(_) | SettingValue::Int(0 | 1))
                | (ValueKind::Text, SettingValue::Text(_))
        );
        if ok {
            Ok(())
        } else {
            Err(Error::BadValue {
                key: key.name(),
                expected: key.kind().name(),
                value: self.to_string(),
            })
        }
    }
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingValue::Bool(v) => write!(f, "{}", v),
            SettingValue::Int(v) => write!(f, "{}", v),
            SettingValue::Float(v) => write!(f, "{}", v),
            SettingValue::Text(v) => f.write_str(v),
        }
    }
}

/// Which horizontal zone of the collapsed bar pulls down quick settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QuickPulldown {
    #[default]
    Off,
    Right,
    Left,
    Middle,
}

impl QuickPulldown {
    pub fn from_raw(raw: i64) -> Self {
        match raw {
            1 => QuickPulldown::Right,
            2 => QuickPulldown::Left,
            3 => QuickPulldown::Middle,
            _ => QuickPulldown::Off,
        }
    }
}

/// Open quick settings directly when there is nothing to act on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SmartPulldown {
    #[default]
    Off,
    NoClearable,
    NoVisible,
}

impl SmartPulldown {
    pub fn from_raw(raw: i64) -> Self {
        match raw {
            1 => SmartPulldown::NoClearable,
            2 => SmartPulldown::NoVisible,
            _ => SmartPulldown::Off,
        }
    }
}

/// Every setting the shade tracks, read in one pass
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SettingsSnapshot {
    /// `None` when the stored value is not a known mode
    pub location_mode: Option<LocationMode>,
    pub locator_mask: LocatorMask,
    pub quick_pulldown: QuickPulldown,
    pub smart_pulldown: SmartPulldown,
    pub swipe_anywhere: bool,
    pub background: Option<String>,
    pub background_landscape: Option<String>,
    pub background_alpha: f64,
}

impl Default for SettingsSnapshot {
    fn default() -> Self {
        Self {
            location_mode: Some(LocationMode::Off),
            locator_mask: LocatorMask::default(),
            quick_pulldown: QuickPulldown::Off,
            smart_pulldown: SmartPulldown::Off,
            swipe_anywhere: false,
            background: None,
            background_landscape: None,
            background_alpha: DEFAULT_BACKGROUND_ALPHA,
        }
    }
}

impl SettingsSnapshot {
    /// Re-read all tracked values from the store
    pub fn read(store: &SettingsStore) -> Self {
        let mode_raw = store.get_int(SettingKey::LocationMode, LocationMode::Off.raw());
        Self {
            location_mode: LocationMode::from_raw(mode_raw),
            locator_mask: LocatorMask::from_raw(store.get_int(SettingKey::LocatorMask, 0)),
            quick_pulldown: QuickPulldown::from_raw(store.get_int(SettingKey::QuickPulldown, 0)),
            smart_pulldown: SmartPulldown::from_raw(store.get_int(SettingKey::SmartPulldown, 0)),
            swipe_anywhere: store.get_bool(SettingKey::SwipeAnywhere, false),
            background: store.get_string(SettingKey::NotificationBackground),
            background_landscape: store.get_string(SettingKey::NotificationBackgroundLandscape),
            background_alpha: store.get_float(
                SettingKey::NotificationBackgroundAlpha,
                DEFAULT_BACKGROUND_ALPHA,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_names_round_trip() {
        for key in SettingKey::ALL {
            assert_eq!(key.name().parse::<SettingKey>().unwrap(), key);
        }
        assert!("qs_unknown".parse::<SettingKey>().is_err());
    }

    #[test]
    fn test_parse_values() {
        assert_eq!(
            SettingValue::parse(SettingKey::SwipeAnywhere, "on").unwrap(),
            SettingValue::Bool(true)
        );
        assert_eq!(
            SettingValue::parse(SettingKey::NotificationBackgroundAlpha, "0.25").unwrap(),
            SettingValue::Float(0.25)
        );
        assert!(SettingValue::parse(SettingKey::QuickPulldown, "right").is_err());
    }

    #[test]
    fn test_value_kind_checks() {
        assert!(SettingValue::Int(1).check(SettingKey::SwipeAnywhere).is_ok());
        assert!(SettingValue::Int(3).check(SettingKey::SwipeAnywhere).is_err());
        assert!(SettingValue::Int(1).check(SettingKey::NotificationBackgroundAlpha).is_ok());
        assert!(SettingValue::Text("x".into()).check(SettingKey::LocationMode).is_err());
    }

    #[test]
    fn test_pulldown_modes_from_raw() {
        assert_eq!(QuickPulldown::from_raw(1), QuickPulldown::Right);
        assert_eq!(QuickPulldown::from_raw(3), QuickPulldown::Middle);
        assert_eq!(QuickPulldown::from_raw(9), QuickPulldown::Off);
        assert_eq!(SmartPulldown::from_raw(2), SmartPulldown::NoVisible);
        assert_eq!(SmartPulldown::from_raw(-1), SmartPulldown::Off);
    }

    #[test]
    fn test_snapshot_defaults_from_empty_store() {
        let store = SettingsStore::in_memory();
        assert_eq!(SettingsSnapshot::read(&store), SettingsSnapshot::default());
    }
}
