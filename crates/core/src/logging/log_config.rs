use std::str::FromStr;

use crate::logging::log_level::LogLevel;

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Minimum log level to display
    pub level: LogLevel,
    /// Output format for logs
    pub format: OutputFormat,
    /// Whether to enable file logging
    pub enable_file_logging: bool,
    /// File path for log output (if enabled)
    pub log_file_path: Option<String>,
    /// Whether to include the event target (module path)
    pub include_target: bool,
}

/// Output format for log entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// JSON format
    Json,
    /// Plain text format
    Text,
    /// Multi-line human readable format
    Pretty,
}

impl FromStr for OutputFormat {
    type Err = crate::errors::SchedulerError;

    fn from_str(format: &str) -> Result<Self, Self::Err> {
        match format.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "text" => Ok(OutputFormat::Text),
            "pretty" => Ok(OutputFormat::Pretty),
            _ => Err(crate::errors::SchedulerError::Configuration(format!(
                "Invalid log format: {format}"
            ))),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: OutputFormat::Text,
            enable_file_logging: false,
            log_file_path: None,
            include_target: false,
        }
    }
}

impl LogConfig {
    /// Apply `LOG_LEVEL`, `LOG_FORMAT`, `LOG_TO_FILE` and `LOG_FILE_PATH` on top of this config
    pub fn with_env_overrides(self) -> Result<Self, crate::errors::SchedulerError> {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    fn with_overrides_from(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, crate::errors::SchedulerError> {
        if let Some(level) = lookup("LOG_LEVEL") {
            self.level = level.parse::<LogLevel>()?;
        }

        if let Some(format) = lookup("LOG_FORMAT") {
            self.format = format.parse()?;
        }

        if let Some(enable_file) = lookup("LOG_TO_FILE") {
            self.enable_file_logging = enable_file.eq_ignore_ascii_case("true");
        }

        if let Some(path) = lookup("LOG_FILE_PATH") {
            self.log_file_path = Some(path);
        }

        Ok(self)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.enable_file_logging && self.log_file_path.is_none() {
            return Err("Log file path is required when file logging is enabled".to_string());
        }

        Ok(())
    }
}
