//! Shade state shared with the event loop
//!
//! Ties the location tile, the notification panel and the face controller to
//! the settings store. Settings changes arrive through the calloop loop the
//! state is registered with.

use calloop::LoopHandle;
use smithay::utils::{Logical, Point};
use tracing::{debug, info};

use crate::config::ShadeConfig;
use crate::error::Result;
use crate::input::{PinnedPointer, TouchAction, TouchEvent};
use crate::settings::{SettingKey, SettingsSnapshot, SettingsStore, SettingsWatch};
use crate::shell::location_tile::{LocationMode, LocationTile, TileAction};
use crate::shell::notification_panel::{HandleTarget, NotificationPanel};
use crate::shell::quick_settings::ShadeController;

/// Handle view that drags the shade
#[derive(Debug, Default)]
pub struct DragHandle {
    pressed: bool,
    last: Option<Point<f64, Logical>>,
}

impl DragHandle {
    /// Last finger position the handle acted on
    pub fn last_position(&self) -> Option<Point<f64, Logical>> {
        self.last
    }
}

impl HandleTarget for DragHandle {
    fn dispatch_touch(&mut self, event: &TouchEvent, pin: Option<&PinnedPointer>) -> bool {
        self.pressed = !matches!(event.action, TouchAction::Up | TouchAction::Cancel);
        self.last = PinnedPointer::resolve(pin, event);
        true
    }

    fn is_pressed(&self) -> bool {
        self.pressed
    }
}

/// Everything the shade needs at runtime
pub struct ShadeState {
    pub store: SettingsStore,
    pub tile: LocationTile,
    pub panel: NotificationPanel,
    pub controller: ShadeController,
    pub handle: DragHandle,
    watch: Option<SettingsWatch>,
}

impl ShadeState {
    pub fn new(config: &ShadeConfig, store: SettingsStore) -> Self {
        Self {
            store,
            tile: LocationTile::new(),
            panel: NotificationPanel::new(config.panel.clone()),
            controller: ShadeController::new(),
            handle: DragHandle::default(),
            watch: None,
        }
    }

    /// Push a snapshot into every settings consumer
    pub fn apply_settings(&mut self, snapshot: &SettingsSnapshot) {
        self.tile.on_settings_changed(snapshot);
        self.panel.on_settings_changed(snapshot);
        self.controller.toggles = vec![self.tile.toggle().clone()];
    }

    /// Read settings once and follow changes on `handle`'s loop
    pub fn attach<'l>(&mut self, handle: &LoopHandle<'l, ShadeState>) -> Result<()> {
        self.detach(handle);
        self.apply_settings(&SettingsSnapshot::read(&self.store));
        let watch = SettingsWatch::insert(
            handle,
            &self.store,
            &SettingKey::ALL,
            |snapshot, state: &mut ShadeState| state.apply_settings(snapshot),
        )?;
        info!(subscription = watch.subscription_id(), "Shade attached to settings");
        self.watch = Some(watch);
        Ok(())
    }

    /// Stop following settings changes
    pub fn detach<'l>(&mut self, handle: &LoopHandle<'l, ShadeState>) {
        if let Some(watch) = self.watch.take() {
            debug!(subscription = watch.subscription_id(), "Shade detached from settings");
            watch.cancel(handle);
        }
    }

    pub fn is_attached(&self) -> bool {
        self.watch.is_some()
    }

    pub fn click_location(&mut self) -> Result<LocationMode> {
        self.tile.click(&mut self.store)
    }

    pub fn long_click_location(&self) -> TileAction {
        self.tile.long_click()
    }

    /// Route a touch on the panel
    pub fn touch(&mut self, event: &TouchEvent) -> bool {
        self.panel
            .on_touch(event, &mut self.controller, &mut self.handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::PanelHost;
    use crate::shell::quick_settings::ShadeFace;
    use calloop::EventLoop;
    use smithay::utils::Size;
    use std::time::Duration;

    fn dispatch(event_loop: &mut EventLoop<'static, ShadeState>, state: &mut ShadeState) {
        event_loop.dispatch(Some(Duration::ZERO), state).unwrap();
    }

    #[test]
    fn test_location_click_round_trips_through_loop() {
        let mut event_loop: EventLoop<ShadeState> = EventLoop::try_new().unwrap();
        let mut state = ShadeState::new(&ShadeConfig::default(), SettingsStore::in_memory());
        state.attach(&event_loop.handle()).unwrap();
        assert_eq!(state.tile.mode(), Some(LocationMode::Off));

        assert_eq!(state.click_location().unwrap(), LocationMode::SensorsOnly);
        assert_eq!(state.tile.mode(), Some(LocationMode::Off));

        dispatch(&mut event_loop, &mut state);
        assert_eq!(state.tile.mode(), Some(LocationMode::SensorsOnly));
        assert_eq!(state.controller.toggles[0].name, "Device only");
    }

    #[test]
    fn test_external_writes_refresh_panel() {
        let mut event_loop: EventLoop<ShadeState> = EventLoop::try_new().unwrap();
        let store = SettingsStore::in_memory();
        let mut state = ShadeState::new(&ShadeConfig::default(), store.clone());
        state.attach(&event_loop.handle()).unwrap();

        let writer = std::thread::spawn(move || {
            store.put_int(SettingKey::SmartPulldown, 2).unwrap();
            store.put_int(SettingKey::LocatorMask, 0b1001).unwrap();
        });
        writer.join().unwrap();
        dispatch(&mut event_loop, &mut state);

        assert_eq!(
            state.panel.gesture().settings().smart_pulldown,
            crate::settings::SmartPulldown::NoVisible
        );
        assert_eq!(state.tile.mask().bits(), 0b1001);

        // No notifications: a tap on the collapsed bar opens settings
        state.panel.layout(Size::from((720.0, 1280.0)));
        state.touch(&TouchEvent::single(TouchAction::Down, 360.0, 10.0));
        assert_eq!(state.controller.face(), ShadeFace::Settings);
        assert!(state.controller.is_showing_settings());
        assert!(state.handle.is_pressed());
    }

    #[test]
    fn test_location_toggle_keeps_decoded_wallpaper() {
        let dir = tempfile::tempdir().unwrap();
        let wallpaper = dir.path().join("wall.png");
        image::RgbaImage::from_pixel(4, 8, image::Rgba([1, 2, 3, 255]))
            .save(&wallpaper)
            .unwrap();

        let mut event_loop: EventLoop<ShadeState> = EventLoop::try_new().unwrap();
        let store = SettingsStore::in_memory();
        store
            .put_string(SettingKey::NotificationBackground, wallpaper.to_str().unwrap())
            .unwrap();
        let mut state = ShadeState::new(&ShadeConfig::default(), store);
        state.attach(&event_loop.handle()).unwrap();
        let before = std::sync::Arc::clone(state.panel.background().shown_image().unwrap());

        state.click_location().unwrap();
        dispatch(&mut event_loop, &mut state);

        assert_eq!(state.tile.mode(), Some(LocationMode::SensorsOnly));
        let after = state.panel.background().shown_image().unwrap();
        assert!(std::sync::Arc::ptr_eq(&before, after));
    }

    #[test]
    fn test_long_drag_keeps_no_history() {
        let mut state = ShadeState::new(&ShadeConfig::default(), SettingsStore::in_memory());
        state.apply_settings(&SettingsSnapshot {
            swipe_anywhere: true,
            ..SettingsSnapshot::default()
        });
        state.panel.layout(Size::from((1080.0, 1920.0)));
        state.panel.set_expanded_height(1920.0);

        state.touch(&TouchEvent::single(TouchAction::Down, 300.0, 800.0));
        for step in 0..1000 {
            let x = 300.0 + (step % 500) as f64;
            state.touch(&TouchEvent::single(TouchAction::Move, x, 805.0));
        }
        assert!(state.controller.partial_progress().is_some());
        assert!(state.controller.take_history().is_empty());
    }

    #[test]
    fn test_detach_stops_refresh() {
        let mut event_loop: EventLoop<ShadeState> = EventLoop::try_new().unwrap();
        let mut state = ShadeState::new(&ShadeConfig::default(), SettingsStore::in_memory());
        let handle = event_loop.handle();
        state.attach(&handle).unwrap();
        state.detach(&handle);
        assert!(!state.is_attached());
        assert_eq!(state.store.subscription_count(), 0);

        state.store.put_bool(SettingKey::SwipeAnywhere, true).unwrap();
        dispatch(&mut event_loop, &mut state);
        assert!(!state.panel.gesture().settings().swipe_anywhere);
    }
}
