use crate::core::config::ExamSettings;
use crate::store::types::{ExamType, QuestionDifficulty, QuestionDomain};

/// Fully-resolved rules for one session. Derived from the exam type, never
/// persisted on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExamConfig {
    pub domain: Option<QuestionDomain>,
    pub difficulty: Option<QuestionDifficulty>,
    pub question_count: usize,
    /// Zero means untimed.
    pub time_limit_minutes: u32,
    pub show_feedback: bool,
    pub allow_review: bool,
}

/// Caller-supplied partial configuration; missing fields fall back to the
/// per-type defaults.
#[derive(Debug, Clone, Default)]
pub struct ExamConfigOverrides {
    pub domain: Option<QuestionDomain>,
    pub difficulty: Option<QuestionDifficulty>,
    pub question_count: Option<usize>,
    pub time_limit_minutes: Option<u32>,
    pub show_feedback: Option<bool>,
    pub allow_review: Option<bool>,
}

impl ExamConfig {
    /// Mock sessions are fixed-shape regardless of overrides; practice
    /// sessions are untimed with feedback and free review; custom sessions
    /// take the overrides with defaults for whatever is missing.
    pub fn resolve(
        exam_type: ExamType,
        overrides: &ExamConfigOverrides,
        settings: &ExamSettings,
    ) -> Self {
        match exam_type {
            ExamType::Mock => Self {
                domain: None,
                difficulty: None,
                question_count: settings.section_question_count,
                time_limit_minutes: settings.section_time_minutes,
                show_feedback: false,
                allow_review: false,
            },
            ExamType::Practice => Self {
                domain: overrides.domain,
                difficulty: overrides.difficulty,
                question_count: overrides
                    .question_count
                    .unwrap_or(settings.practice_question_count),
                time_limit_minutes: 0,
                show_feedback: true,
                allow_review: true,
            },
            ExamType::Custom => Self {
                domain: overrides.domain,
                difficulty: overrides.difficulty,
                question_count: overrides.question_count.unwrap_or(settings.custom_question_count),
                time_limit_minutes: overrides
                    .time_limit_minutes
                    .unwrap_or(settings.custom_time_minutes),
                show_feedback: overrides.show_feedback.unwrap_or(false),
                allow_review: overrides.allow_review.unwrap_or(true),
            },
        }
    }

    pub fn is_timed(&self) -> bool {
        self.time_limit_minutes > 0
    }

    pub fn duration_seconds(&self) -> u64 {
        self.time_limit_minutes as u64 * 60
    }
}
