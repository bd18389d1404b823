//! Touch events as delivered to the shade

use std::time::Duration;

use serde::Deserialize;
use smithay::utils::{Logical, Point};

/// Kind of touch event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TouchAction {
    /// First finger down
    Down,
    Move,
    /// Additional finger down
    PointerDown,
    /// Non-last finger up
    PointerUp,
    /// Last finger up
    Up,
    Cancel,
}

/// One finger of a touch event
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchPointer {
    pub id: i32,
    pub position: Point<f64, Logical>,
    pub pressure: f32,
    pub size: f32,
}

impl TouchPointer {
    pub fn new(id: i32, position: Point<f64, Logical>) -> Self {
        Self {
            id,
            position,
            pressure: 1.0,
            size: 0.0,
        }
    }
}

/// A touch event with all fingers currently down
///
/// `pointers[0]` is the primary finger.
#[derive(Debug, Clone, PartialEq)]
pub struct TouchEvent {
    pub action: TouchAction,
    pub pointers: Vec<TouchPointer>,
    /// Time the gesture started
    pub down_time: Duration,
    pub event_time: Duration,
    pub device_id: i32,
    pub meta_state: u32,
    pub edge_flags: u32,
}

impl TouchEvent {
    pub fn new(action: TouchAction, pointers: Vec<TouchPointer>) -> Self {
        Self {
            action,
            pointers,
            down_time: Duration::ZERO,
            event_time: Duration::ZERO,
            device_id: 0,
            meta_state: 0,
            edge_flags: 0,
        }
    }

    /// Single finger event
    pub fn single(action: TouchAction, x: f64, y: f64) -> Self {
        Self::new(action, vec![TouchPointer::new(0, Point::from((x, y)))])
    }

    pub fn at_time(mut self, down_time: Duration, event_time: Duration) -> Self {
        self.down_time = down_time;
        self.event_time = event_time;
        self
    }

    /// Position of the primary finger
    pub fn primary(&self) -> Option<Point<f64, Logical>> {
        self.pointers.first().map(|p| p.position)
    }

    /// Vertical distance between the highest and lowest finger
    pub fn y_spread(&self) -> f64 {
        let mut ys = self.pointers.iter().map(|p| p.position.y);
        let Some(first) = ys.next() else {
            return 0.0;
        };
        let (min, max) = ys.fold((first, first), |(min, max), y| (min.min(y), max.max(y)));
        max - min
    }
}

/// Position override for the primary finger
///
/// While the shade flips, the handle view sees the real event with its
/// primary finger pinned here so its own hit testing stays put.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PinnedPointer {
    pub position: Point<f64, Logical>,
}

impl PinnedPointer {
    pub fn new(position: Point<f64, Logical>) -> Self {
        Self { position }
    }

    /// Primary position the handle should use for `event`
    pub fn resolve(pin: Option<&PinnedPointer>, event: &TouchEvent) -> Option<Point<f64, Logical>> {
        match pin {
            Some(pin) => Some(pin.position),
            None => event.primary(),
        }
    }
}
