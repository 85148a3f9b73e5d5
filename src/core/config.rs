use std::env;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {field}: {value}")]
    InvalidValue { field: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub exam: ExamSettings,
    pub progress: ProgressSettings,
    pub telemetry: TelemetrySettings,
}

/// Exam derivation defaults. The mock-exam shape mirrors the real licensing
/// exam: two sections of `section_question_count` questions, each timed at
/// `section_time_minutes`.
#[derive(Debug, Clone)]
pub struct ExamSettings {
    pub section_question_count: usize,
    pub section_time_minutes: u32,
    pub passing_score: u32,
    pub practice_question_count: usize,
    pub custom_question_count: usize,
    pub custom_time_minutes: u32,
}

#[derive(Debug, Clone)]
pub struct ProgressSettings {
    pub weak_area_threshold: u32,
    pub strong_area_threshold: u32,
}

#[derive(Debug, Clone)]
pub struct TelemetrySettings {
    pub log_level: String,
    pub json: bool,
}

impl Default for ExamSettings {
    fn default() -> Self {
        Self {
            section_question_count: 110,
            section_time_minutes: 120,
            passing_score: 60,
            practice_question_count: 20,
            custom_question_count: 20,
            custom_time_minutes: 30,
        }
    }
}

impl Default for ProgressSettings {
    fn default() -> Self {
        Self { weak_area_threshold: 60, strong_area_threshold: 80 }
    }
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self { log_level: "info".to_string(), json: false }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            exam: ExamSettings::default(),
            progress: ProgressSettings::default(),
            telemetry: TelemetrySettings::default(),
        }
    }
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        let defaults = Settings::default();

        let section_question_count = parse_usize(
            "SPLE_SECTION_QUESTIONS",
            env_optional("SPLE_SECTION_QUESTIONS"),
            defaults.exam.section_question_count,
        )?;
        let section_time_minutes = parse_u32(
            "SPLE_SECTION_MINUTES",
            env_optional("SPLE_SECTION_MINUTES"),
            defaults.exam.section_time_minutes,
        )?;
        let passing_score = parse_percent(
            "SPLE_PASSING_SCORE",
            env_optional("SPLE_PASSING_SCORE"),
            defaults.exam.passing_score,
        )?;
        let practice_question_count = parse_usize(
            "SPLE_PRACTICE_QUESTIONS",
            env_optional("SPLE_PRACTICE_QUESTIONS"),
            defaults.exam.practice_question_count,
        )?;
        let custom_question_count = parse_usize(
            "SPLE_CUSTOM_QUESTIONS",
            env_optional("SPLE_CUSTOM_QUESTIONS"),
            defaults.exam.custom_question_count,
        )?;
        let custom_time_minutes = parse_u32(
            "SPLE_CUSTOM_MINUTES",
            env_optional("SPLE_CUSTOM_MINUTES"),
            defaults.exam.custom_time_minutes,
        )?;

        let weak_area_threshold = parse_percent(
            "SPLE_WEAK_THRESHOLD",
            env_optional("SPLE_WEAK_THRESHOLD"),
            defaults.progress.weak_area_threshold,
        )?;
        let strong_area_threshold = parse_percent(
            "SPLE_STRONG_THRESHOLD",
            env_optional("SPLE_STRONG_THRESHOLD"),
            defaults.progress.strong_area_threshold,
        )?;

        let log_level = env_or_default("SPLE_LOG_LEVEL", &defaults.telemetry.log_level);
        let json =
            env_optional("SPLE_LOG_JSON").map(|value| parse_bool(&value)).unwrap_or(false);

        Ok(Self {
            exam: ExamSettings {
                section_question_count,
                section_time_minutes,
                passing_score,
                practice_question_count,
                custom_question_count,
                custom_time_minutes,
            },
            progress: ProgressSettings { weak_area_threshold, strong_area_threshold },
            telemetry: TelemetrySettings { log_level, json },
        })
    }
}

fn env_optional(key: &str) -> Option<String> {
    env::var(key).ok().map(|value| value.trim().to_string()).filter(|value| !value.is_empty())
}

fn env_or_default(key: &str, default: &str) -> String {
    env_optional(key).unwrap_or_else(|| default.to_string())
}

fn parse_bool(value: &str) -> bool {
    matches!(value, "1" | "true" | "TRUE" | "yes" | "YES" | "on" | "ON")
}

fn parse_u32(field: &'static str, value: Option<String>, default: u32) -> Result<u32, ConfigError> {
    match value {
        Some(raw) => raw.parse::<u32>().map_err(|_| ConfigError::InvalidValue { field, value: raw }),
        None => Ok(default),
    }
}

fn parse_usize(
    field: &'static str,
    value: Option<String>,
    default: usize,
) -> Result<usize, ConfigError> {
    match value {
        Some(raw) => {
            raw.parse::<usize>().map_err(|_| ConfigError::InvalidValue { field, value: raw })
        }
        None => Ok(default),
    }
}

fn parse_percent(
    field: &'static str,
    value: Option<String>,
    default: u32,
) -> Result<u32, ConfigError> {
    let parsed = parse_u32(field, value, default)?;
    if parsed > 100 {
        return Err(ConfigError::InvalidValue { field, value: parsed.to_string() });
    }
    Ok(parsed)
}
