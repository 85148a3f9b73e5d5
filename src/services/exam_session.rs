use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use time::PrimitiveDateTime;
use tokio::time::Instant;

use crate::auth::IdentityProvider;
use crate::core::config::Settings;
use crate::core::time::primitive_now_utc;
use crate::error::ExamError;
use crate::repositories::{questions, sessions};
use crate::services::exam_config::{ExamConfig, ExamConfigOverrides};
use crate::services::exam_timer::Countdown;
use crate::services::scoring;
use crate::store::models::{ExamSessionRecord, Question};
use crate::store::types::{ExamSection, ExamType};
use crate::store::DocumentStore;

/// Entry point for the exam lifecycle: resolves the effective configuration,
/// samples the question set, persists the initial record, and hands back an
/// [`ActiveExam`] driving the attempt.
pub struct ExamService {
    store: Arc<dyn DocumentStore>,
    identity: Arc<dyn IdentityProvider>,
    settings: Settings,
}

impl ExamService {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        identity: Arc<dyn IdentityProvider>,
        settings: Settings,
    ) -> Self {
        Self { store, identity, settings }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn is_passing(&self, score: u32) -> bool {
        scoring::is_passing(score, self.settings.exam.passing_score)
    }

    pub async fn start_exam(
        &self,
        exam_type: ExamType,
        section: ExamSection,
        overrides: ExamConfigOverrides,
    ) -> Result<ActiveExam, ExamError> {
        let user =
            self.identity.current_user().await.ok_or(ExamError::AuthenticationRequired)?;

        let config = ExamConfig::resolve(exam_type, &overrides, &self.settings.exam);

        // The question fetch happens before any persistence, so a short pool
        // never leaves a partial session behind.
        let question_set = questions::fetch_random(
            self.store.as_ref(),
            config.question_count,
            config.domain,
            config.difficulty,
        )
        .await?;

        let mut record = ExamSessionRecord {
            id: String::new(),
            user_id: user.uid,
            exam_type,
            section,
            question_ids: question_set.iter().map(|q| q.id.clone()).collect(),
            answers: vec![None; question_set.len()],
            start_time: primitive_now_utc(),
            end_time: None,
            score: None,
            completed: false,
            time_spent_seconds: 0,
        };
        record.id = sessions::create(self.store.as_ref(), &record).await?;

        tracing::info!(
            session_id = %record.id,
            exam_type = exam_type.as_str(),
            question_count = question_set.len(),
            time_limit_minutes = config.time_limit_minutes,
            "Exam session started"
        );

        Ok(ActiveExam::launch(self.store.clone(), config, question_set, record))
    }

    /// Reads a persisted session, e.g. for a results view.
    pub async fn load_session(&self, id: &str) -> Result<ExamSessionRecord, ExamError> {
        sessions::find_by_id(self.store.as_ref(), id).await
    }

    /// Recent sessions of the signed-in user, newest first.
    pub async fn session_history(
        &self,
        exam_type: Option<ExamType>,
        limit: usize,
    ) -> Result<Vec<ExamSessionRecord>, ExamError> {
        let user =
            self.identity.current_user().await.ok_or(ExamError::AuthenticationRequired)?;
        Ok(sessions::list_by_user(self.store.as_ref(), &user.uid, exam_type, limit).await?)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Active,
    Paused,
    Completed,
}

#[derive(Debug, Clone, Copy)]
enum FinalizeMode {
    Manual,
    Deadline,
}

/// Correctness feedback for one answered question, available only in
/// sessions configured with immediate feedback.
#[derive(Debug, Clone)]
pub struct AnswerFeedback {
    pub correct: bool,
    pub correct_answer: usize,
    pub explanation: String,
}

struct SessionState {
    record: ExamSessionRecord,
    questions: Arc<Vec<Question>>,
    current_index: usize,
    highest_visited: usize,
    phase: Phase,
    timed: bool,
    started_at: Instant,
    active_elapsed: Duration,
    activated_at: Option<Instant>,
    persisted_final: bool,
    scoring_runs: u32,
}

/// One in-progress exam attempt. All answer and navigation mutations are
/// synchronous and in-memory; only persistence calls await. The state behind
/// the mutex is shared with the countdown task, and completion is a
/// check-and-set under that lock, so a manual submit racing the expiry
/// callback finalizes exactly once. Dropping the handle cancels the timer;
/// the last persisted record remains the durable source of truth.
pub struct ActiveExam {
    state: Arc<Mutex<SessionState>>,
    store: Arc<dyn DocumentStore>,
    config: ExamConfig,
    timer: Option<Countdown>,
}

fn lock_state(state: &Mutex<SessionState>) -> MutexGuard<'_, SessionState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl ActiveExam {
    fn launch(
        store: Arc<dyn DocumentStore>,
        config: ExamConfig,
        question_set: Vec<Question>,
        record: ExamSessionRecord,
    ) -> Self {
        let now = Instant::now();
        let timed = config.is_timed();
        let state = Arc::new(Mutex::new(SessionState {
            record,
            questions: Arc::new(question_set),
            current_index: 0,
            highest_visited: 0,
            phase: Phase::Active,
            timed,
            started_at: now,
            active_elapsed: Duration::ZERO,
            activated_at: Some(now),
            persisted_final: false,
            scoring_runs: 0,
        }));

        let timer = timed.then(|| {
            let expire_state = state.clone();
            let expire_store = store.clone();
            Countdown::start(config.duration_seconds(), async move {
                if let Err(err) =
                    finalize(&expire_state, expire_store.as_ref(), FinalizeMode::Deadline).await
                {
                    tracing::error!(error = %err, "Failed to auto-submit expired exam session");
                }
            })
        });

        Self { state, store, config, timer }
    }

    pub fn config(&self) -> &ExamConfig {
        &self.config
    }

    pub fn session_id(&self) -> String {
        lock_state(&self.state).record.id.clone()
    }

    pub fn questions(&self) -> Arc<Vec<Question>> {
        lock_state(&self.state).questions.clone()
    }

    pub fn answers(&self) -> Vec<Option<usize>> {
        lock_state(&self.state).record.answers.clone()
    }

    pub fn current_index(&self) -> usize {
        lock_state(&self.state).current_index
    }

    pub fn is_completed(&self) -> bool {
        lock_state(&self.state).phase == Phase::Completed
    }

    /// Remaining countdown seconds; zero for untimed sessions.
    pub fn time_remaining_seconds(&self) -> u64 {
        self.timer.as_ref().map(Countdown::remaining_seconds).unwrap_or(0)
    }

    /// Copy of the session record in its current in-memory form.
    pub fn snapshot(&self) -> ExamSessionRecord {
        lock_state(&self.state).record.clone()
    }

    /// Records an answer. Answers stay mutable until submission; an
    /// out-of-range index is a defect in the caller and leaves state
    /// untouched.
    pub fn submit_answer(
        &self,
        question_index: usize,
        option_index: usize,
    ) -> Result<(), ExamError> {
        let mut state = lock_state(&self.state);
        if state.phase == Phase::Completed {
            return Err(ExamError::InvariantViolation(
                "answer mutation on a completed session".to_string(),
            ));
        }

        let question_count = state.questions.len();
        if question_index >= question_count {
            tracing::warn!(
                index = question_index,
                limit = question_count,
                "Rejected answer for out-of-range question index"
            );
            return Err(ExamError::InvalidIndex {
                what: "question",
                index: question_index,
                limit: question_count,
            });
        }

        let option_count = state.questions[question_index].options.len();
        if option_index >= option_count {
            tracing::warn!(
                index = option_index,
                limit = option_count,
                "Rejected out-of-range option index"
            );
            return Err(ExamError::InvalidIndex {
                what: "option",
                index: option_index,
                limit: option_count,
            });
        }

        state.record.answers[question_index] = Some(option_index);
        Ok(())
    }

    /// Moves the cursor. Out-of-range indices are tolerated as a no-op;
    /// review-locked sessions reject backward navigation below the highest
    /// index already visited. Returns whether the cursor moved.
    pub fn navigate_to_question(&self, index: usize) -> bool {
        let mut state = lock_state(&self.state);
        if state.phase == Phase::Completed || index >= state.questions.len() {
            return false;
        }
        if !self.config.allow_review && index < state.highest_visited {
            tracing::debug!(
                index,
                highest_visited = state.highest_visited,
                "Backward navigation rejected for review-locked session"
            );
            return false;
        }

        state.current_index = index;
        if index > state.highest_visited {
            state.highest_visited = index;
        }
        true
    }

    /// Feedback for an answered question, or `None` when the session is
    /// configured without immediate feedback or the slot is unanswered.
    pub fn answer_feedback(&self, question_index: usize) -> Option<AnswerFeedback> {
        if !self.config.show_feedback {
            return None;
        }
        let state = lock_state(&self.state);
        let question = state.questions.get(question_index)?;
        let answer = (*state.record.answers.get(question_index)?)?;
        Some(AnswerFeedback {
            correct: answer == question.correct_answer,
            correct_answer: question.correct_answer,
            explanation: question.explanation.clone(),
        })
    }

    /// Freezes the countdown and the active-time accounting. No-op unless
    /// the session is currently active.
    pub fn pause(&self) {
        {
            let mut state = lock_state(&self.state);
            if state.phase != Phase::Active {
                return;
            }
            let now = Instant::now();
            if let Some(activated_at) = state.activated_at.take() {
                state.active_elapsed += now - activated_at;
            }
            state.phase = Phase::Paused;
        }
        if let Some(timer) = &self.timer {
            timer.pause();
        }
    }

    pub fn resume(&self) {
        {
            let mut state = lock_state(&self.state);
            if state.phase != Phase::Paused {
                return;
            }
            state.activated_at = Some(Instant::now());
            state.phase = Phase::Active;
        }
        if let Some(timer) = &self.timer {
            timer.resume();
        }
    }

    /// Persists the in-flight answers. In-memory state stays authoritative
    /// if the write fails; answers are never rolled back.
    pub async fn save_progress(&self) -> Result<(), ExamError> {
        let (id, answers, time_spent) = {
            let state = lock_state(&self.state);
            if state.phase == Phase::Completed {
                return Ok(());
            }
            (
                state.record.id.clone(),
                state.record.answers.clone(),
                elapsed_seconds(&state, Instant::now()),
            )
        };
        Ok(sessions::save_answers(self.store.as_ref(), &id, &answers, time_spent).await?)
    }

    /// Finalizes the attempt: scores it, stamps the end time, and persists
    /// the completed record. Idempotent: a repeat call (or the losing side
    /// of a race with the expiry callback) gets the already-computed result
    /// back. If only the persistence step failed, calling again retries the
    /// write without rescoring.
    pub async fn submit(&self) -> Result<ExamSessionRecord, ExamError> {
        if let Some(timer) = &self.timer {
            timer.cancel();
        }
        finalize(&self.state, self.store.as_ref(), FinalizeMode::Manual).await
    }

    #[cfg(test)]
    pub(crate) fn scoring_runs(&self) -> u32 {
        lock_state(&self.state).scoring_runs
    }
}

/// Wall-clock seconds chargeable to this session so far: active (non-paused)
/// time for timed sessions, raw elapsed time otherwise.
fn elapsed_seconds(state: &SessionState, now: Instant) -> u64 {
    if state.timed {
        let active = state.active_elapsed
            + state.activated_at.map(|activated_at| now - activated_at).unwrap_or_default();
        active.as_secs()
    } else {
        (now - state.started_at).as_secs()
    }
}

struct PendingFinal {
    id: String,
    answers: Vec<Option<usize>>,
    end_time: PrimitiveDateTime,
    score: u32,
    time_spent_seconds: u64,
}

enum FinalizeStep {
    AlreadyDone(ExamSessionRecord),
    Persist(PendingFinal),
}

fn pending_from(state: &SessionState) -> Result<PendingFinal, ExamError> {
    let end_time = state.record.end_time.ok_or_else(|| {
        ExamError::InvariantViolation("completed session missing end time".to_string())
    })?;
    let score = state.record.score.ok_or_else(|| {
        ExamError::InvariantViolation("completed session missing score".to_string())
    })?;
    Ok(PendingFinal {
        id: state.record.id.clone(),
        answers: state.record.answers.clone(),
        end_time,
        score,
        time_spent_seconds: state.record.time_spent_seconds,
    })
}

async fn finalize(
    state: &Mutex<SessionState>,
    store: &dyn DocumentStore,
    mode: FinalizeMode,
) -> Result<ExamSessionRecord, ExamError> {
    let step = {
        let mut state = lock_state(state);
        match state.phase {
            Phase::Completed if state.persisted_final => {
                FinalizeStep::AlreadyDone(state.record.clone())
            }
            Phase::Completed => FinalizeStep::Persist(pending_from(&state)?),
            Phase::Active | Phase::Paused => {
                let now = Instant::now();
                if let Some(activated_at) = state.activated_at.take() {
                    state.active_elapsed += now - activated_at;
                }
                let time_spent = elapsed_seconds(&state, now);

                let questions = state.questions.clone();
                let summary = scoring::score_session(&questions, &state.record.answers);
                state.scoring_runs += 1;

                state.record.score = Some(summary.score);
                state.record.end_time = Some(primitive_now_utc());
                state.record.completed = true;
                state.record.time_spent_seconds = time_spent;
                state.phase = Phase::Completed;

                tracing::info!(
                    session_id = %state.record.id,
                    score = summary.score,
                    correct = summary.correct,
                    time_spent_seconds = time_spent,
                    auto_submitted = matches!(mode, FinalizeMode::Deadline),
                    "Exam session finalized"
                );
                FinalizeStep::Persist(pending_from(&state)?)
            }
        }
    };

    match step {
        FinalizeStep::AlreadyDone(record) => Ok(record),
        FinalizeStep::Persist(pending) => {
            sessions::finalize(
                store,
                &pending.id,
                sessions::FinalizeSession {
                    answers: &pending.answers,
                    end_time: pending.end_time,
                    score: pending.score,
                    time_spent_seconds: pending.time_spent_seconds,
                },
            )
            .await?;

            let mut state = lock_state(state);
            state.persisted_final = true;
            Ok(state.record.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use tokio::time::{sleep, Duration};

    use super::*;
    use crate::repositories::sessions as session_repo;
    use crate::store::memory::MemoryStore;
    use crate::store::types::QuestionDomain;
    use crate::test_support::{
        flaky_store, seed_question, service, service_signed_out, small_mock_settings,
    };

    async fn seeded_store(count: usize) -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        for i in 0..count {
            seed_question(&store, &format!("question {i}"), QuestionDomain::Clinical, i % 4).await;
        }
        store
    }

    fn practice_overrides(count: usize) -> ExamConfigOverrides {
        ExamConfigOverrides { question_count: Some(count), ..ExamConfigOverrides::default() }
    }

    fn timed_custom_overrides(count: usize, minutes: u32) -> ExamConfigOverrides {
        ExamConfigOverrides {
            question_count: Some(count),
            time_limit_minutes: Some(minutes),
            ..ExamConfigOverrides::default()
        }
    }

    /// Answers every question correctly except `wrong` of them.
    fn answer_all_but(exam: &ActiveExam, wrong: usize) {
        let questions = exam.questions();
        for (i, question) in questions.iter().enumerate() {
            let choice = if i < wrong {
                (question.correct_answer + 1) % question.options.len()
            } else {
                question.correct_answer
            };
            exam.submit_answer(i, choice).expect("answer");
        }
    }

    #[tokio::test]
    async fn start_requires_authentication() {
        let store = seeded_store(10).await;
        let service = service_signed_out(store);
        let result = service
            .start_exam(ExamType::Practice, ExamSection::One, practice_overrides(5))
            .await;
        assert!(matches!(result, Err(ExamError::AuthenticationRequired)));
    }

    #[tokio::test]
    async fn short_pool_fails_without_persisting_a_session() {
        let store = seeded_store(10).await;
        let service = service(store.clone());

        let result = service
            .start_exam(ExamType::Practice, ExamSection::One, practice_overrides(50))
            .await;
        assert!(matches!(
            result,
            Err(ExamError::InsufficientQuestions { requested: 50, available: 10 })
        ));

        let persisted = store
            .query(crate::store::collections::EXAM_SESSIONS, &crate::store::Query::new())
            .await
            .unwrap();
        assert!(persisted.is_empty());
    }

    #[tokio::test]
    async fn answers_array_tracks_question_count_through_all_operations() {
        let store = seeded_store(8).await;
        let service = service(store);
        let exam = service
            .start_exam(ExamType::Practice, ExamSection::One, practice_overrides(5))
            .await
            .unwrap();

        let expected = exam.questions().len();
        assert_eq!(exam.answers().len(), expected);

        exam.submit_answer(0, 1).unwrap();
        exam.navigate_to_question(3);
        exam.submit_answer(3, 2).unwrap();
        let _ = exam.submit_answer(99, 0);
        exam.navigate_to_question(42);

        assert_eq!(exam.answers().len(), expected);
        assert_eq!(exam.snapshot().answers.len(), expected);
    }

    #[tokio::test]
    async fn scores_and_persists_on_submit() {
        let store = seeded_store(12).await;
        let service = service(store.clone());
        let exam = service
            .start_exam(ExamType::Practice, ExamSection::One, practice_overrides(5))
            .await
            .unwrap();

        // 3 correct, 2 unanswered: unanswered slots never match.
        let questions = exam.questions();
        for i in 0..3 {
            exam.submit_answer(i, questions[i].correct_answer).unwrap();
        }

        let record = exam.submit().await.unwrap();
        assert_eq!(record.score, Some(60));
        assert!(record.completed);
        assert!(record.end_time.is_some());

        let persisted = session_repo::find_by_id(store.as_ref(), &record.id).await.unwrap();
        assert_eq!(persisted.score, Some(60));
        assert!(persisted.completed);
        assert_eq!(persisted.answers, record.answers);
    }

    #[tokio::test]
    async fn repeat_submission_returns_same_result_without_rescoring() {
        let store = seeded_store(10).await;
        let service = service(store);
        let exam = service
            .start_exam(ExamType::Practice, ExamSection::One, practice_overrides(4))
            .await
            .unwrap();
        answer_all_but(&exam, 1);

        let first = exam.submit().await.unwrap();
        let second = exam.submit().await.unwrap();

        assert_eq!(first.score, second.score);
        assert_eq!(first.end_time, second.end_time);
        assert!(first.completed && second.completed);
        assert_eq!(exam.scoring_runs(), 1);
    }

    #[tokio::test]
    async fn changing_an_answer_overwrites_the_slot() {
        let store = seeded_store(6).await;
        let service = service(store);
        let exam = service
            .start_exam(ExamType::Practice, ExamSection::One, practice_overrides(3))
            .await
            .unwrap();

        exam.submit_answer(0, 1).unwrap();
        exam.submit_answer(0, 3).unwrap();
        assert_eq!(exam.answers()[0], Some(3));
    }

    #[tokio::test]
    async fn invalid_indices_leave_state_untouched() {
        let store = seeded_store(6).await;
        let service = service(store);
        let exam = service
            .start_exam(ExamType::Practice, ExamSection::One, practice_overrides(3))
            .await
            .unwrap();

        let before = exam.answers();
        assert!(matches!(
            exam.submit_answer(7, 0),
            Err(ExamError::InvalidIndex { what: "question", index: 7, .. })
        ));
        assert!(matches!(
            exam.submit_answer(0, 9),
            Err(ExamError::InvalidIndex { what: "option", index: 9, .. })
        ));
        assert_eq!(exam.answers(), before);
    }

    #[tokio::test]
    async fn completed_session_rejects_further_mutation() {
        let store = seeded_store(6).await;
        let service = service(store);
        let exam = service
            .start_exam(ExamType::Practice, ExamSection::One, practice_overrides(3))
            .await
            .unwrap();

        exam.submit().await.unwrap();
        assert!(matches!(exam.submit_answer(0, 0), Err(ExamError::InvariantViolation(_))));
        assert!(!exam.navigate_to_question(1));
        // Pausing after completion is a no-op rather than an error.
        exam.pause();
        assert!(exam.is_completed());
    }

    #[tokio::test]
    async fn review_lock_rejects_backward_navigation() {
        let store = seeded_store(15).await;
        let service = service(store.clone());

        let mock = ExamService::new(
            store.clone(),
            crate::test_support::signed_in_identity(),
            small_mock_settings(4),
        );
        let exam = mock
            .start_exam(ExamType::Mock, ExamSection::One, ExamConfigOverrides::default())
            .await
            .unwrap();
        assert!(exam.navigate_to_question(3));
        assert!(!exam.navigate_to_question(1));
        assert_eq!(exam.current_index(), 3);
        drop(exam);

        let practice = service
            .start_exam(ExamType::Practice, ExamSection::One, practice_overrides(5))
            .await
            .unwrap();
        assert!(practice.navigate_to_question(3));
        assert!(practice.navigate_to_question(1));
        assert_eq!(practice.current_index(), 1);
    }

    #[tokio::test]
    async fn single_question_session_navigates_degenerately() {
        let store = seeded_store(4).await;
        let service = service(store);
        let exam = service
            .start_exam(ExamType::Practice, ExamSection::One, practice_overrides(1))
            .await
            .unwrap();

        assert!(!exam.navigate_to_question(1));
        assert!(exam.navigate_to_question(0));
        assert_eq!(exam.current_index(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn expiry_auto_submits_an_untouched_session() {
        let store = seeded_store(8).await;
        let service = service(store.clone());
        let exam = service
            .start_exam(ExamType::Custom, ExamSection::One, timed_custom_overrides(4, 1))
            .await
            .unwrap();

        sleep(Duration::from_millis(61_500)).await;

        assert!(exam.is_completed());
        let record = exam.snapshot();
        assert_eq!(record.score, Some(0));
        assert!(record.completed);

        let persisted = session_repo::find_by_id(store.as_ref(), &record.id).await.unwrap();
        assert!(persisted.completed);
        assert_eq!(persisted.score, Some(0));
        assert_eq!(exam.scoring_runs(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn manual_submit_cancels_the_countdown() {
        let store = seeded_store(8).await;
        let service = service(store);
        let exam = service
            .start_exam(ExamType::Custom, ExamSection::One, timed_custom_overrides(4, 1))
            .await
            .unwrap();
        answer_all_but(&exam, 0);

        let record = exam.submit().await.unwrap();
        assert_eq!(record.score, Some(100));

        // Let the original deadline pass; the expiry callback must not rerun
        // scoring or overwrite the result.
        sleep(Duration::from_secs(120)).await;
        assert_eq!(exam.scoring_runs(), 1);
        assert_eq!(exam.snapshot().score, Some(100));
    }

    #[tokio::test(start_paused = true)]
    async fn paused_time_is_excluded_from_timed_sessions() {
        let store = seeded_store(8).await;
        let service = service(store);
        let exam = service
            .start_exam(ExamType::Custom, ExamSection::One, timed_custom_overrides(4, 10))
            .await
            .unwrap();

        sleep(Duration::from_millis(10_500)).await;
        exam.pause();
        let frozen = exam.time_remaining_seconds();
        assert_eq!(frozen, 590);

        sleep(Duration::from_secs(50)).await;
        assert_eq!(exam.time_remaining_seconds(), frozen);

        exam.resume();
        sleep(Duration::from_millis(4_500)).await;

        let record = exam.submit().await.unwrap();
        assert_eq!(record.time_spent_seconds, 15);
    }

    #[tokio::test(start_paused = true)]
    async fn untimed_sessions_charge_raw_elapsed_time() {
        let store = seeded_store(8).await;
        let service = service(store);
        let exam = service
            .start_exam(ExamType::Practice, ExamSection::One, practice_overrides(4))
            .await
            .unwrap();
        assert_eq!(exam.time_remaining_seconds(), 0);

        sleep(Duration::from_millis(10_500)).await;
        exam.pause();
        sleep(Duration::from_secs(50)).await;
        exam.resume();

        let record = exam.submit().await.unwrap();
        assert_eq!(record.time_spent_seconds, 60);
    }

    #[tokio::test]
    async fn failed_final_persistence_retries_without_rescoring() {
        let (store, failures) = flaky_store(seeded_store(8).await);
        let service = service(store.clone());
        let exam = service
            .start_exam(ExamType::Practice, ExamSection::One, practice_overrides(4))
            .await
            .unwrap();
        answer_all_but(&exam, 2);

        failures.store(true, std::sync::atomic::Ordering::SeqCst);
        let result = exam.submit().await;
        assert!(matches!(result, Err(ExamError::Store(_))));
        assert!(exam.is_completed());
        assert_eq!(exam.scoring_runs(), 1);

        failures.store(false, std::sync::atomic::Ordering::SeqCst);
        let record = exam.submit().await.unwrap();
        assert_eq!(record.score, Some(50));
        assert_eq!(exam.scoring_runs(), 1);

        let persisted = session_repo::find_by_id(store.as_ref(), &record.id).await.unwrap();
        assert!(persisted.completed);
        assert_eq!(persisted.score, Some(50));
    }

    #[tokio::test]
    async fn save_progress_persists_in_flight_answers() {
        let store = seeded_store(8).await;
        let service = service(store.clone());
        let exam = service
            .start_exam(ExamType::Practice, ExamSection::One, practice_overrides(4))
            .await
            .unwrap();

        exam.submit_answer(0, 2).unwrap();
        exam.save_progress().await.unwrap();

        let persisted =
            session_repo::find_by_id(store.as_ref(), &exam.session_id()).await.unwrap();
        assert_eq!(persisted.answers[0], Some(2));
        assert!(!persisted.completed);
    }

    #[tokio::test]
    async fn feedback_only_in_feedback_enabled_sessions() {
        let store = seeded_store(15).await;

        let practice = service(store.clone());
        let exam = practice
            .start_exam(ExamType::Practice, ExamSection::One, practice_overrides(4))
            .await
            .unwrap();
        let correct = exam.questions()[0].correct_answer;
        assert!(exam.answer_feedback(0).is_none());
        exam.submit_answer(0, correct).unwrap();
        let feedback = exam.answer_feedback(0).expect("feedback");
        assert!(feedback.correct);
        assert_eq!(feedback.correct_answer, correct);

        let mock = ExamService::new(
            store,
            crate::test_support::signed_in_identity(),
            small_mock_settings(4),
        );
        let exam = mock
            .start_exam(ExamType::Mock, ExamSection::One, ExamConfigOverrides::default())
            .await
            .unwrap();
        exam.submit_answer(0, 0).unwrap();
        assert!(exam.answer_feedback(0).is_none());
    }
}
