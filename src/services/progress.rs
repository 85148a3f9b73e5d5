use std::collections::{BTreeMap, HashMap};

use crate::core::config::ProgressSettings;
use crate::core::time::primitive_now_utc;
use crate::error::ExamError;
use crate::repositories::{progress as progress_repo, questions, sessions};
use crate::services::scoring::Tally;
use crate::store::models::{DomainScores, UserProgress};
use crate::store::types::QuestionDomain;
use crate::store::DocumentStore;

/// Recomputes the per-user rollup from all completed sessions and upserts
/// the `userProgress` document. Per-domain figures aggregate raw counts
/// across sessions before taking percentages; averaging per-session
/// percentages would overweight sessions with few questions in a domain.
///
/// Sessions reference questions by id, so a question edited or deleted after
/// the fact changes (or drops out of) historical aggregates. Unresolvable
/// ids are skipped.
pub async fn rebuild_user_progress(
    store: &dyn DocumentStore,
    user_id: &str,
    settings: &ProgressSettings,
) -> Result<UserProgress, ExamError> {
    let completed = sessions::list_completed_by_user(store, user_id).await?;

    let mut tallies: BTreeMap<QuestionDomain, Tally> = BTreeMap::new();
    let mut score_sum: u64 = 0;

    for session in &completed {
        let score = session.score.ok_or_else(|| {
            ExamError::InvariantViolation(format!("completed session {} missing score", session.id))
        })?;
        score_sum += u64::from(score);

        if session.answers.len() != session.question_ids.len() {
            return Err(ExamError::InvariantViolation(format!(
                "session {} answers/questions length mismatch",
                session.id
            )));
        }

        let resolved = questions::find_by_ids(store, &session.question_ids).await?;
        let by_id: HashMap<&str, _> = resolved.iter().map(|q| (q.id.as_str(), q)).collect();

        for (question_id, answer) in session.question_ids.iter().zip(&session.answers) {
            let Some(question) = by_id.get(question_id.as_str()) else {
                continue;
            };
            let tally = tallies.entry(question.domain).or_default();
            tally.total += 1;
            if *answer == Some(question.correct_answer) {
                tally.correct += 1;
            }
        }
    }

    let total_exams = completed.len() as u32;
    let average_score =
        if completed.is_empty() { 0.0 } else { score_sum as f64 / completed.len() as f64 };

    let mut domain_scores = DomainScores::default();
    let mut weak_areas = Vec::new();
    let mut strong_areas = Vec::new();
    for (&domain, tally) in &tallies {
        let percentage = tally.percentage();
        domain_scores.set(domain, f64::from(percentage));
        if percentage < settings.weak_area_threshold {
            weak_areas.push(domain);
        } else if percentage >= settings.strong_area_threshold {
            strong_areas.push(domain);
        }
    }

    let progress = UserProgress {
        user_id: user_id.to_string(),
        total_exams,
        average_score,
        domain_scores,
        weak_areas,
        strong_areas,
        last_updated: primitive_now_utc(),
    };
    progress_repo::upsert(store, &progress).await?;

    tracing::debug!(user_id, total_exams, average_score, "User progress rebuilt");
    Ok(progress)
}
