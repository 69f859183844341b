use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_FEED_URL: &str = "https://data.bmkg.go.id/DataMKG/TEWS/autogempa.json";

const DEFAULT_SOUND_THEMES: [&str; 4] = [
    "dialog-warning",
    "bell",
    "alarm-clock-elapsed",
    "suspend-error",
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("feed url is invalid: {0}")]
    FeedUrl(String),
    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),
    #[error("at least one sound theme is required")]
    NoSounds,
}

/// Every tunable the monitor uses. There is deliberately no file or
/// environment layer on top of this; the shell always runs `default()`.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub feed_url: String,
    pub poll_interval: Duration,
    pub fetch_timeout: Duration,
    pub flash_interval: Duration,
    pub bright_opacity: u8,
    pub dim_opacity: u8,
    pub sound_themes: Vec<String>,
    pub app_title: String,
    pub alert_title: String,
    pub about_text: String,
    pub idle_label: String,
    pub user_agent: String,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            feed_url: DEFAULT_FEED_URL.to_string(),
            poll_interval: Duration::from_secs(60),
            fetch_timeout: Duration::from_secs(20),
            flash_interval: Duration::from_secs(1),
            bright_opacity: 255,
            dim_opacity: 50,
            sound_themes: DEFAULT_SOUND_THEMES.iter().map(|s| s.to_string()).collect(),
            app_title: "Earthquake Alarm".to_string(),
            alert_title: "BMKG Earthquake Alert".to_string(),
            about_text: "Extension by asek.rf.gd".to_string(),
            idle_label: "No Alert".to_string(),
            user_agent: concat!("QuakeAlarm/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl MonitorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        reqwest::Url::parse(&self.feed_url)
            .map_err(|err| ConfigError::FeedUrl(format!("{}: {err}", self.feed_url)))?;
        if self.poll_interval.is_zero() {
            return Err(ConfigError::ZeroDuration("poll interval"));
        }
        if self.fetch_timeout.is_zero() {
            return Err(ConfigError::ZeroDuration("fetch timeout"));
        }
        if self.flash_interval.is_zero() {
            return Err(ConfigError::ZeroDuration("flash interval"));
        }
        if self.sound_themes.is_empty() {
            return Err(ConfigError::NoSounds);
        }
        Ok(())
    }
}
