//! Settings change delivery on the UI event loop

use calloop::channel::Event;
use calloop::{LoopHandle, RegistrationToken};
use tracing::debug;

use super::{SettingKey, SettingsSnapshot, SettingsStore, SettingsSubscription};
use crate::error::{Error, Result};

/// A settings subscription registered as a calloop event source
///
/// Every change to a watched key re-reads the whole snapshot and hands it
/// to the callback together with the loop data.
pub struct SettingsWatch {
    subscription: SettingsSubscription,
    token: RegistrationToken,
}

impl SettingsWatch {
    pub fn insert<'l, D, F>(
        handle: &LoopHandle<'l, D>,
        store: &SettingsStore,
        keys: &[SettingKey],
        mut on_change: F,
    ) -> Result<Self>
    where
        D: 'l,
        F: FnMut(&SettingsSnapshot, &mut D) + 'l,
    {
        let (subscription, channel) = store.subscribe(keys);
        let reader = store.clone();
        let token = handle
            .insert_source(channel, move |event, _, data| {
                if let Event::Msg(key) = event {
                    debug!(key = key.name(), "Refreshing from settings");
                    let snapshot = SettingsSnapshot::read(&reader);
                    on_change(&snapshot, data);
                }
            })
            .map_err(|e| Error::EventLoop(e.error.to_string()))?;

        Ok(Self { subscription, token })
    }

    pub fn subscription_id(&self) -> u64 {
        self.subscription.id()
    }

    /// Remove the event source and unregister from the store
    pub fn cancel<D>(self, handle: &LoopHandle<'_, D>) {
        handle.remove(self.token);
        self.subscription.cancel();
    }
}
