use serde::{Deserialize, Serialize};
use time::PrimitiveDateTime;

use crate::store::types::{ExamSection, ExamType, QuestionDifficulty, QuestionDomain};

/// Immutable exam item. The document id lives outside the stored body, so
/// `id` is filled in by the repository layer after a read.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    #[serde(skip)]
    pub id: String,
    pub content: String,
    pub options: Vec<String>,
    pub correct_answer: usize,
    pub explanation: String,
    pub domain: QuestionDomain,
    pub difficulty: QuestionDifficulty,
    #[serde(default)]
    pub references: Vec<String>,
    pub created_by: String,
    pub approved: bool,
    #[serde(with = "crate::core::time::rfc3339")]
    pub created_at: PrimitiveDateTime,
}

/// One exam attempt as persisted in the `examSessions` collection. The
/// question list is fixed at session start; `answers` always has one slot
/// per question. `end_time` and `score` stay absent until completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamSessionRecord {
    #[serde(skip)]
    pub id: String,
    pub user_id: String,
    pub exam_type: ExamType,
    pub section: ExamSection,
    pub question_ids: Vec<String>,
    pub answers: Vec<Option<usize>>,
    #[serde(with = "crate::core::time::rfc3339")]
    pub start_time: PrimitiveDateTime,
    #[serde(with = "crate::core::time::rfc3339_option", default)]
    pub end_time: Option<PrimitiveDateTime>,
    #[serde(default)]
    pub score: Option<u32>,
    pub completed: bool,
    pub time_spent_seconds: u64,
}

/// Average percentage score per domain; 0 where the user has no answered
/// questions in that domain yet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DomainScores {
    pub biomedical: f64,
    pub pharmaceutical: f64,
    pub social: f64,
    pub clinical: f64,
}

impl DomainScores {
    pub fn get(&self, domain: QuestionDomain) -> f64 {
        match domain {
            QuestionDomain::Biomedical => self.biomedical,
            QuestionDomain::Pharmaceutical => self.pharmaceutical,
            QuestionDomain::Social => self.social,
            QuestionDomain::Clinical => self.clinical,
        }
    }

    pub fn set(&mut self, domain: QuestionDomain, value: f64) {
        match domain {
            QuestionDomain::Biomedical => self.biomedical = value,
            QuestionDomain::Pharmaceutical => self.pharmaceutical = value,
            QuestionDomain::Social => self.social = value,
            QuestionDomain::Clinical => self.clinical = value,
        }
    }
}

/// Per-user rollup over completed sessions. A materialized view: always
/// recomputable from the `examSessions` collection, never a source of truth.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProgress {
    pub user_id: String,
    pub total_exams: u32,
    pub average_score: f64,
    pub domain_scores: DomainScores,
    pub weak_areas: Vec<QuestionDomain>,
    pub strong_areas: Vec<QuestionDomain>,
    #[serde(with = "crate::core::time::rfc3339")]
    pub last_updated: PrimitiveDateTime,
}
