use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub enabled: bool,
    /// Filter directive for the log files
    pub level: String,
    /// Filter directive for the terminal; kept quiet so it does not drown
    /// the operator status lines
    pub console_level: String,
    pub keep_days: u64,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: "info".to_string(),
            console_level: "warn".to_string(),
            keep_days: 7,
        }
    }
}

impl LoggingConfig {
    /// Same config with both file and terminal output at `level`.
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self.console_level = self.level.clone();
        self
    }
}
