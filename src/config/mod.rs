use std::env;
use std::fmt;

/// Top-level configuration, loaded from the environment (and an optional
/// `.env` file) so deployment defaults never live in code.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub telemetry: TelemetryConfig,
    pub roster: RosterConfig,
    pub export: ExportConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let log_level = env::var("GRADEBOOK_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let roster = RosterConfig {
            delimiter: separator_from_env("GRADEBOOK_ROSTER_SEPARATOR", b';')?,
            matriculation_column: env::var("GRADEBOOK_MATRICULATION_COLUMN")
                .unwrap_or_else(|_| "Matrikelnummer".to_string()),
            study_column: env::var("GRADEBOOK_STUDY_COLUMN")
                .unwrap_or_else(|_| "SKZ".to_string()),
        };
        let export = ExportConfig {
            delimiter: separator_from_env("GRADEBOOK_OUTPUT_SEPARATOR", b';')?,
        };

        Ok(Self {
            telemetry: TelemetryConfig { log_level },
            roster,
            export,
        })
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Registrar export conventions.
#[derive(Debug, Clone)]
pub struct RosterConfig {
    pub delimiter: u8,
    pub matriculation_column: String,
    pub study_column: String,
}

/// Grading-file output conventions.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    pub delimiter: u8,
}

fn separator_from_env(key: &'static str, default: u8) -> Result<u8, ConfigError> {
    match env::var(key) {
        Ok(value) => {
            let bytes = value.as_bytes();
            if bytes.len() == 1 && bytes[0].is_ascii() {
                Ok(bytes[0])
            } else {
                Err(ConfigError::InvalidSeparator { key, value })
            }
        }
        Err(_) => Ok(default),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidSeparator { key: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidSeparator { key, value } => {
                write!(f, "{key} must be a single ASCII character, got '{value}'")
            }
        }
    }
}

impl std::error::Error for ConfigError {}
