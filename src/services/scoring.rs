//! Pure scoring and analytics over a question set and its answer slots.
//! A length mismatch between questions and answers is a programmer error and
//! panics; the state machine maintains that invariant from session start.

use std::collections::BTreeMap;

use crate::store::models::Question;
use crate::store::types::{QuestionDifficulty, QuestionDomain};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreSummary {
    /// Integer percentage, round-half-up.
    pub score: u32,
    pub correct: usize,
    /// Unanswered slots count as incorrect.
    pub incorrect: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub correct: usize,
    pub total: usize,
}

impl Tally {
    pub fn percentage(&self) -> u32 {
        if self.total == 0 {
            0
        } else {
            percentage(self.correct, self.total)
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionAnalytics {
    pub total_questions: usize,
    pub correct: usize,
    pub incorrect: usize,
    pub unanswered: usize,
    pub time_per_question_seconds: f64,
    pub domains: BTreeMap<QuestionDomain, Tally>,
    pub difficulties: BTreeMap<QuestionDifficulty, Tally>,
}

pub(crate) fn percentage(part: usize, total: usize) -> u32 {
    ((part as f64 / total as f64) * 100.0).round() as u32
}

fn assert_paired(questions: &[Question], answers: &[Option<usize>]) {
    assert_eq!(
        questions.len(),
        answers.len(),
        "answers length must match questions length"
    );
    assert!(!questions.is_empty(), "cannot score an empty question set");
}

pub fn score_session(questions: &[Question], answers: &[Option<usize>]) -> ScoreSummary {
    assert_paired(questions, answers);

    let correct = questions
        .iter()
        .zip(answers)
        .filter(|(question, answer)| **answer == Some(question.correct_answer))
        .count();
    let total = questions.len();

    ScoreSummary { score: percentage(correct, total), correct, incorrect: total - correct }
}

pub fn domain_breakdown(
    questions: &[Question],
    answers: &[Option<usize>],
) -> BTreeMap<QuestionDomain, Tally> {
    assert_paired(questions, answers);

    let mut breakdown: BTreeMap<QuestionDomain, Tally> = BTreeMap::new();
    for (question, answer) in questions.iter().zip(answers) {
        let tally = breakdown.entry(question.domain).or_default();
        tally.total += 1;
        if *answer == Some(question.correct_answer) {
            tally.correct += 1;
        }
    }
    breakdown
}

pub fn difficulty_breakdown(
    questions: &[Question],
    answers: &[Option<usize>],
) -> BTreeMap<QuestionDifficulty, Tally> {
    assert_paired(questions, answers);

    let mut breakdown: BTreeMap<QuestionDifficulty, Tally> = BTreeMap::new();
    for (question, answer) in questions.iter().zip(answers) {
        let tally = breakdown.entry(question.difficulty).or_default();
        tally.total += 1;
        if *answer == Some(question.correct_answer) {
            tally.correct += 1;
        }
    }
    breakdown
}

/// The threshold comes from configuration, not from this function.
pub fn is_passing(score: u32, passing_threshold: u32) -> bool {
    score >= passing_threshold
}

pub fn session_analytics(
    questions: &[Question],
    answers: &[Option<usize>],
    time_spent_seconds: u64,
) -> SessionAnalytics {
    assert_paired(questions, answers);

    let summary = score_session(questions, answers);
    let unanswered = answers.iter().filter(|answer| answer.is_none()).count();

    SessionAnalytics {
        total_questions: questions.len(),
        correct: summary.correct,
        incorrect: summary.incorrect - unanswered,
        unanswered,
        time_per_question_seconds: time_spent_seconds as f64 / questions.len() as f64,
        domains: domain_breakdown(questions, answers),
        difficulties: difficulty_breakdown(questions, answers),
    }
}
