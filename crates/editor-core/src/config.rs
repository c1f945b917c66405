use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::history::MAX_HISTORY;
use crate::upload::UploadPolicy;

const DEFAULT_DEBOUNCE_MS: u64 = 500;
const DEFAULT_RESTORE_GRACE_MS: u64 = 50;
const DEFAULT_PLACEHOLDER: &str = "Start writing your post...";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub max_history: usize,
    /// Quiet period before typing is committed to history.
    pub typing_debounce_ms: u64,
    /// How long surface change events are treated as echoes after undo/redo.
    pub restore_grace_ms: u64,
    pub placeholder: String,
    pub upload: UploadPolicy,
}

impl EditorConfig {
    /// Fills zero or blank fields with their defaults.
    pub fn with_defaults(mut self) -> Self {
        if self.max_history == 0 {
            self.max_history = MAX_HISTORY;
        }
        if self.typing_debounce_ms == 0 {
            self.typing_debounce_ms = DEFAULT_DEBOUNCE_MS;
        }
        if self.restore_grace_ms == 0 {
            self.restore_grace_ms = DEFAULT_RESTORE_GRACE_MS;
        }
        if self.placeholder.trim().is_empty() {
            self.placeholder = DEFAULT_PLACEHOLDER.to_string();
        }
        self.upload = self.upload.with_defaults();
        self
    }

    pub fn from_json_str(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<Self>(s).map(Self::with_defaults)
    }

    pub fn typing_debounce(&self) -> Duration {
        Duration::from_millis(self.typing_debounce_ms)
    }

    pub fn restore_grace(&self) -> Duration {
        Duration::from_millis(self.restore_grace_ms)
    }
}
