//! Shared key/value settings store
//!
//! Last write wins. Every write to a key notifies the subscriptions
//! watching it through a calloop channel, so writers on any thread end up
//! delivering on the UI loop.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use calloop::channel::{self, Channel, Sender};
use tracing::{debug, info, warn};

use super::{SettingKey, SettingValue};
use crate::error::Result;
use crate::shell::location_tile::{LocationMode, ModeStore};

struct Watcher {
    id: u64,
    keys: Vec<SettingKey>,
    sender: Sender<SettingKey>,
}

struct StoreInner {
    values: BTreeMap<String, SettingValue>,
    path: Option<PathBuf>,
    watchers: Vec<Watcher>,
    next_watcher: u64,
}

impl StoreInner {
    /// Write `values` to disk, then make them current
    ///
    /// On error the in-memory values are left untouched.
    fn commit(&mut self, values: BTreeMap<String, SettingValue>) -> Result<()> {
        if let Some(path) = &self.path {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, toml::to_string_pretty(&values)?)?;
            debug!(path = %path.display(), "Saved settings");
        }
        self.values = values;
        Ok(())
    }

    fn notify(&mut self, key: SettingKey) {
        // Receivers dropped without cancelling are pruned here
        self.watchers
            .retain(|w| !w.keys.contains(&key) || w.sender.send(key).is_ok());
    }
}

/// Handle to the settings of the current user
#[derive(Clone)]
pub struct SettingsStore {
    inner: Arc<Mutex<StoreInner>>,
}

impl SettingsStore {
    /// Store that lives only in memory
    pub fn in_memory() -> Self {
        Self::with_values(BTreeMap::new(), None)
    }

    /// Open the store persisted at `path`, starting empty if the file is missing
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let values = if path.exists() {
            let contents = fs::read_to_string(&path)?;
            let values: BTreeMap<String, SettingValue> = toml::from_str(&contents)?;
            info!(path = %path.display(), count = values.len(), "Loaded settings");
            values
        } else {
            info!(path = %path.display(), "No settings file, using defaults");
            BTreeMap::new()
        };
        Ok(Self::with_values(values, Some(path)))
    }

    fn with_values(values: BTreeMap<String, SettingValue>, path: Option<PathBuf>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(StoreInner {
                values,
                path,
                watchers: Vec::new(),
                next_watcher: 1,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, StoreInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn path(&self) -> Option<PathBuf> {
        self.lock().path.clone()
    }

    /// Stored value, or `None` when unset
    pub fn get(&self, key: SettingKey) -> Option<SettingValue> {
        self.lock().values.get(key.name()).cloned()
    }

    /// Stored value, falling back to the key's default
    pub fn get_or_default(&self, key: SettingKey) -> Option<SettingValue> {
        self.get(key).or_else(|| key.default_value())
    }

    pub fn get_int(&self, key: SettingKey, default: i64) -> i64 {
        match self.get(key) {
            Some(SettingValue::Int(v)) => v,
            Some(SettingValue::Bool(v)) => v as i64,
            Some(other) => {
                debug!(key = key.name(), value = %other, "Not an integer, using default");
                default
            }
            None => default,
        }
    }

    pub fn get_float(&self, key: SettingKey, default: f64) -> f64 {
        match self.get(key) {
            Some(SettingValue::Float(v)) => v,
            Some(SettingValue::Int(v)) => v as f64,
            Some(other) => {
                debug!(key = key.name(), value = %other, "Not a number, using default");
                default
            }
            None => default,
        }
    }

    pub fn get_bool(&self, key: SettingKey, default: bool) -> bool {
        match self.get(key) {
            Some(SettingValue::Bool(v)) => v,
            Some(SettingValue::Int(v)) => v != 0,
            Some(other) => {
                debug!(key = key.name(), value = %other, "Not a boolean, using default");
                default
            }
            None => default,
        }
    }

    pub fn get_string(&self, key: SettingKey) -> Option<String> {
        match self.get(key)? {
            SettingValue::Text(v) => Some(v),
            other => Some(other.to_string()),
        }
    }

    /// Write a value, persist it and notify watchers of `key`
    pub fn put(&self, key: SettingKey, value: SettingValue) -> Result<()> {
        value.check(key)?;
        let mut inner = self.lock();
        debug!(key = key.name(), value = %value, "Setting changed");
        let mut values = inner.values.clone();
        values.insert(key.name().to_string(), value);
        inner.commit(values)?;
        inner.notify(key);
        Ok(())
    }

    pub fn put_int(&self, key: SettingKey, value: i64) -> Result<()> {
        self.put(key, SettingValue::Int(value))
    }

    pub fn put_float(&self, key: SettingKey, value: f64) -> Result<()> {
        self.put(key, SettingValue::Float(value))
    }

    pub fn put_bool(&self, key: SettingKey, value: bool) -> Result<()> {
        self.put(key, SettingValue::Bool(value))
    }

    pub fn put_string(&self, key: SettingKey, value: impl Into<String>) -> Result<()> {
        self.put(key, SettingValue::Text(value.into()))
    }

    /// Clear a key back to its default
    pub fn remove(&self, key: SettingKey) -> Result<()> {
        let mut inner = self.lock();
        if inner.values.contains_key(key.name()) {
            let mut values = inner.values.clone();
            values.remove(key.name());
            inner.commit(values)?;
            inner.notify(key);
        }
        Ok(())
    }

    /// Watch `keys` for changes
    ///
    /// The returned channel receives the changed key after every write. It
    /// is meant to be inserted into a calloop event loop (see
    /// [`SettingsWatch`](super::SettingsWatch)). Dropping or cancelling the
    /// subscription stops delivery.
    pub fn subscribe(&self, keys: &[SettingKey]) -> (SettingsSubscription, Channel<SettingKey>) {
        let (sender, receiver) = channel::channel();
        let mut inner = self.lock();
        let id = inner.next_watcher;
        inner.next_watcher += 1;
        inner.watchers.push(Watcher {
            id,
            keys: keys.to_vec(),
            sender,
        });
        debug!(id, keys = ?keys, "Settings subscription added");

        let subscription = SettingsSubscription {
            id,
            store: Arc::downgrade(&self.inner),
        };
        (subscription, receiver)
    }

    /// Number of live subscriptions
    pub fn subscription_count(&self) -> usize {
        self.lock().watchers.len()
    }
}

impl ModeStore for SettingsStore {
    fn read_mode(&self) -> Option<LocationMode> {
        LocationMode::from_raw(self.get_int(SettingKey::LocationMode, LocationMode::Off.raw()))
    }

    fn write_mode(&mut self, mode: LocationMode) -> Result<()> {
        self.put_int(SettingKey::LocationMode, mode.raw())
    }
}

/// Cancellation handle for a settings subscription
pub struct SettingsSubscription {
    id: u64,
    store: Weak<Mutex<StoreInner>>,
}

impl SettingsSubscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Stop delivering changes
    pub fn cancel(self) {
        // Drop does the work
    }
}

impl Drop for SettingsSubscription {
    fn drop(&mut self) {
        let Some(inner) = self.store.upgrade() else {
            return;
        };
        let mut inner = inner.lock().unwrap_or_else(PoisonError::into_inner);
        let before = inner.watchers.len();
        inner.watchers.retain(|w| w.id != self.id);
        if inner.watchers.len() == before {
            warn!(id = self.id, "Settings subscription already gone");
        } else {
            debug!(id = self.id, "Settings subscription cancelled");
        }
    }
}
