use std::sync::{Arc, Mutex, MutexGuard, Weak};

use tokio::runtime::Handle;

use crate::alert::{AlertDispatcher, Notifier, SoundPlayer, StatusDisplay};
use crate::config::{ConfigError, MonitorConfig};
use crate::feed::FeedSource;
use crate::flash::Flasher;
use crate::models::EventId;
use crate::poller::{Outcome, Poller};
use crate::sound::SoundChoice;
use crate::timer::{Scheduler, TimerHandle};

const STARTUP_MESSAGE: &str = "Monitoring BMKG feed for earthquake alerts.";

/// The outside world as the monitor sees it.
pub struct Collaborators {
    pub notifier: Arc<dyn Notifier>,
    pub display: Arc<dyn StatusDisplay>,
    pub sound: Arc<dyn SoundPlayer>,
    pub scheduler: Arc<dyn Scheduler>,
}

/// Everything that lives between startup and teardown: the poller, the
/// current sound choice and the timers.
pub struct Session<F> {
    config: MonitorConfig,
    poller: Poller<F>,
    dispatcher: AlertDispatcher,
    notifier: Arc<dyn Notifier>,
    display: Arc<dyn StatusDisplay>,
    scheduler: Arc<dyn Scheduler>,
    runtime: Handle,
    sound: Mutex<SoundChoice>,
    poll_timer: Mutex<Option<TimerHandle>>,
    // Held across the liveness check and the alert so shutdown cannot interleave.
    alive: Mutex<bool>,
}

impl<F: FeedSource + 'static> Session<F> {
    pub fn new(
        config: MonitorConfig,
        feed: F,
        collaborators: Collaborators,
        runtime: Handle,
    ) -> Result<Arc<Self>, ConfigError> {
        config.validate()?;
        let sound = SoundChoice::new(&config.sound_themes).ok_or(ConfigError::NoSounds)?;
        let Collaborators {
            notifier,
            display,
            sound: sound_player,
            scheduler,
        } = collaborators;

        let flasher = Flasher::new(
            scheduler.clone(),
            display.clone(),
            config.flash_interval,
            config.bright_opacity,
            config.dim_opacity,
        );
        let dispatcher = AlertDispatcher::new(
            config.alert_title.clone(),
            notifier.clone(),
            display.clone(),
            sound_player,
            flasher,
        );

        Ok(Arc::new(Self {
            config,
            poller: Poller::new(feed),
            dispatcher,
            notifier,
            display,
            scheduler,
            runtime,
            sound: Mutex::new(sound),
            poll_timer: Mutex::new(None),
            alive: Mutex::new(true),
        }))
    }

    /// Arms the poll timer and runs the first automatic check right away.
    pub async fn start(self: &Arc<Self>) -> Outcome {
        self.display.set_label(&self.config.idle_label);

        let weak: Weak<Self> = Arc::downgrade(self);
        let runtime = self.runtime.clone();
        let handle = self.scheduler.schedule_repeating(
            self.config.poll_interval,
            Box::new(move || {
                if let Some(session) = weak.upgrade() {
                    runtime.spawn(async move {
                        session.check(false).await;
                    });
                }
            }),
        );
        if let Some(previous) = lock(&self.poll_timer).replace(handle) {
            self.scheduler.cancel(previous);
        }

        tracing::info!(
            url = %self.config.feed_url,
            interval_secs = self.config.poll_interval.as_secs(),
            "monitoring started"
        );
        self.notifier.notify(&self.config.app_title, STARTUP_MESSAGE);
        self.check(false).await
    }

    pub async fn check(&self, manual: bool) -> Outcome {
        if !self.is_alive() {
            return Outcome::NoChange;
        }
        let outcome = self.poller.check(manual).await;
        match &outcome {
            Outcome::NewEvent(event) => {
                let alive = lock(&self.alive);
                if *alive {
                    let sound = lock(&self.sound).clone();
                    self.dispatcher.fire(event, &sound);
                } else {
                    tracing::debug!("session closed while fetching, dropping event");
                }
            }
            Outcome::NoChange => tracing::debug!(manual, "no new earthquake"),
            Outcome::FetchFailed(reason) => {
                tracing::warn!("earthquake feed fetch failed: {reason}")
            }
            Outcome::ParseFailed(reason) => {
                tracing::warn!("earthquake feed parse failed: {reason}")
            }
        }
        outcome
    }

    /// Moves to the next theme sound and returns the new menu label.
    pub fn cycle_sound(&self) -> String {
        let (label, message) = {
            let mut sound = lock(&self.sound);
            sound.cycle();
            (sound.menu_label(), sound.changed_message())
        };
        self.notifier.notify(&self.config.app_title, &message);
        label
    }

    pub fn sound_menu_label(&self) -> String {
        lock(&self.sound).menu_label()
    }

    pub fn current_sound(&self) -> String {
        lock(&self.sound).current().to_string()
    }

    pub fn about(&self) {
        self.notifier.notify(&self.config.app_title, &self.config.about_text);
    }

    pub fn last_seen(&self) -> Option<EventId> {
        self.poller.last_seen()
    }

    pub fn is_alive(&self) -> bool {
        *lock(&self.alive)
    }

    pub fn is_flashing(&self) -> bool {
        self.dispatcher.flasher().is_flashing()
    }

    /// Stops all periodic work. Fetches still in flight finish silently.
    pub fn shutdown(&self) {
        let mut alive = lock(&self.alive);
        if !*alive {
            return;
        }
        *alive = false;
        if let Some(handle) = lock(&self.poll_timer).take() {
            self.scheduler.cancel(handle);
        }
        self.dispatcher.flasher().stop();
        tracing::info!("monitoring stopped");
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
