use std::sync::Arc;

/// Index into the fixed list of theme sounds. Lives only as long as the session.
#[derive(Debug, Clone)]
pub struct SoundChoice {
    themes: Arc<[String]>,
    index: usize,
}

impl SoundChoice {
    /// Returns `None` for an empty list; `MonitorConfig::validate` rules that out.
    pub fn new(themes: &[String]) -> Option<Self> {
        if themes.is_empty() {
            return None;
        }
        Some(Self {
            themes: themes.into(),
            index: 0,
        })
    }

    pub fn current(&self) -> &str {
        &self.themes[self.index]
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.themes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.themes.is_empty()
    }

    pub fn cycle(&mut self) -> &str {
        self.index = (self.index + 1) % self.themes.len();
        self.current()
    }

    pub fn menu_label(&self) -> String {
        format!("Change Sound (current: {})", self.current())
    }

    pub fn changed_message(&self) -> String {
        format!("Notification sound set to \"{}\"", self.current())
    }
}
