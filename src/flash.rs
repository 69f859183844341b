use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::alert::StatusDisplay;
use crate::timer::{Scheduler, TimerHandle};

/// Blinks the status icon and label between two opacities until stopped.
/// At most one blink timer exists at a time.
pub struct Flasher {
    scheduler: Arc<dyn Scheduler>,
    display: Arc<dyn StatusDisplay>,
    interval: Duration,
    bright: u8,
    dim: u8,
    active: Mutex<Option<TimerHandle>>,
}

impl Flasher {
    pub fn new(
        scheduler: Arc<dyn Scheduler>,
        display: Arc<dyn StatusDisplay>,
        interval: Duration,
        bright: u8,
        dim: u8,
    ) -> Self {
        Self {
            scheduler,
            display,
            interval,
            bright,
            dim,
            active: Mutex::new(None),
        }
    }

    pub fn start(&self) {
        let mut active = match self.active.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(previous) = active.take() {
            self.scheduler.cancel(previous);
        }

        let display = self.display.clone();
        let (bright, dim) = (self.bright, self.dim);
        let mut visible = true;
        let handle = self.scheduler.schedule_repeating(
            self.interval,
            Box::new(move || {
                visible = !visible;
                let opacity = if visible { bright } else { dim };
                display.set_opacity(opacity);
            }),
        );
        *active = Some(handle);
    }

    /// Cancels the blink, leaving opacity wherever the last toggle put it.
    pub fn stop(&self) {
        let previous = match self.active.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(handle) = previous {
            self.scheduler.cancel(handle);
        }
    }

    pub fn is_flashing(&self) -> bool {
        self.active
            .lock()
            .ok()
            .and_then(|guard| *guard)
            .is_some_and(|handle| self.scheduler.is_live(handle))
    }
}
