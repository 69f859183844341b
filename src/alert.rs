use std::sync::Arc;

use crate::flash::Flasher;
use crate::models::EarthquakeEvent;
use crate::sound::SoundChoice;

const SOUND_DESCRIPTION: &str = "Earthquake Alert";

/// Desktop notification sink. Fire-and-forget.
pub trait Notifier: Send + Sync {
    fn notify(&self, title: &str, body: &str);
}

/// The panel widget: an icon plus a text label.
pub trait StatusDisplay: Send + Sync {
    fn set_label(&self, text: &str);
    /// Applies to both the icon and the label.
    fn set_opacity(&self, opacity: u8);
}

/// Plays a named sound from the desktop sound theme. Fire-and-forget.
pub trait SoundPlayer: Send + Sync {
    fn play(&self, sound_name: &str, description: &str);
}

pub fn alert_message(event: &EarthquakeEvent) -> String {
    format!(
        "Magnitude: {} SR\nDepth: {}\nLocation: {}",
        event.magnitude, event.depth, event.felt_locations
    )
}

pub fn label_text(event: &EarthquakeEvent) -> String {
    format!("M {} SR", event.magnitude)
}

pub struct AlertDispatcher {
    title: String,
    notifier: Arc<dyn Notifier>,
    display: Arc<dyn StatusDisplay>,
    sound: Arc<dyn SoundPlayer>,
    flasher: Flasher,
}

impl AlertDispatcher {
    pub fn new(
        title: impl Into<String>,
        notifier: Arc<dyn Notifier>,
        display: Arc<dyn StatusDisplay>,
        sound: Arc<dyn SoundPlayer>,
        flasher: Flasher,
    ) -> Self {
        Self {
            title: title.into(),
            notifier,
            display,
            sound,
            flasher,
        }
    }

    pub fn fire(&self, event: &EarthquakeEvent, sound: &SoundChoice) {
        tracing::info!(
            magnitude = %event.magnitude,
            depth = %event.depth,
            id = %event.id(),
            "announcing earthquake"
        );
        self.notifier.notify(&self.title, &alert_message(event));
        self.display.set_label(&label_text(event));
        self.sound.play(sound.current(), SOUND_DESCRIPTION);
        self.flasher.start();
    }

    pub fn flasher(&self) -> &Flasher {
        &self.flasher
    }
}
