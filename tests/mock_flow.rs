use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use sple_prep::auth::{AuthError, AuthUser, IdentityProvider, NewUserProfile};
use sple_prep::core::config::Settings;
use sple_prep::services::exam_config::ExamConfigOverrides;
use sple_prep::services::exam_session::ExamService;
use sple_prep::services::progress::rebuild_user_progress;
use sple_prep::services::scoring;
use sple_prep::store::memory::MemoryStore;
use sple_prep::store::types::{ExamSection, ExamType, QuestionDomain, UserRole};
use sple_prep::store::{collections, DocumentStore};

struct SingleLearner;

fn learner() -> AuthUser {
    AuthUser {
        uid: "learner-7".to_string(),
        email: "learner@example.com".to_string(),
        display_name: "Learner".to_string(),
        role: UserRole::Student,
    }
}

#[async_trait]
impl IdentityProvider for SingleLearner {
    async fn register(
        &self,
        _email: &str,
        _password: &str,
        _profile: NewUserProfile,
    ) -> Result<String, AuthError> {
        Err(AuthError::Provider("read-only fixture".to_string()))
    }

    async fn login(&self, _email: &str, _password: &str) -> Result<AuthUser, AuthError> {
        Ok(learner())
    }

    async fn logout(&self) -> Result<(), AuthError> {
        Ok(())
    }

    async fn reset_password(&self, _email: &str) -> Result<(), AuthError> {
        Ok(())
    }

    async fn current_user(&self) -> Option<AuthUser> {
        Some(learner())
    }
}

async fn seed_question(store: &MemoryStore, content: &str, domain: &str, correct: usize) -> String {
    store
        .create(
            collections::QUESTIONS,
            None,
            &json!({
                "content": content,
                "options": ["A", "B", "C", "D"],
                "correctAnswer": correct,
                "explanation": format!("{content} rationale"),
                "domain": domain,
                "difficulty": "medium",
                "references": [],
                "createdBy": "seed",
                "approved": true,
                "createdAt": "2025-06-01T00:00:00Z",
            }),
        )
        .await
        .expect("seed question")
}

#[tokio::test]
async fn full_mock_flow_scores_and_breaks_down_by_domain() {
    let store = Arc::new(MemoryStore::new());

    // A bank of exactly four questions with correct answers [1, 0, 2, 3];
    // the pharmaceutical one will be answered wrong.
    seed_question(&store, "biomedical item", "biomedical", 1).await;
    let wrong_id = seed_question(&store, "pharmaceutical item", "pharmaceutical", 0).await;
    seed_question(&store, "clinical item one", "clinical", 2).await;
    seed_question(&store, "clinical item two", "clinical", 3).await;

    let mut settings = Settings::default();
    settings.exam.section_question_count = 4;
    let passing_score = settings.exam.passing_score;

    let service = ExamService::new(store.clone(), Arc::new(SingleLearner), settings);
    let exam = service
        .start_exam(ExamType::Mock, ExamSection::One, ExamConfigOverrides::default())
        .await
        .expect("start mock exam");

    assert_eq!(exam.questions().len(), 4);
    assert!(exam.config().is_timed());
    assert_eq!(exam.time_remaining_seconds(), 120 * 60);
    assert!(!exam.config().allow_review);

    // The question order is shuffled, so answer by identity.
    let questions = exam.questions();
    for (index, question) in questions.iter().enumerate() {
        let choice = if question.id == wrong_id {
            (question.correct_answer + 1) % question.options.len()
        } else {
            question.correct_answer
        };
        exam.submit_answer(index, choice).expect("record answer");
    }

    let record = exam.submit().await.expect("submit exam");
    assert_eq!(record.score, Some(75));
    assert!(record.completed);
    assert!(record.end_time.is_some());
    assert!(scoring::is_passing(75, passing_score));

    let breakdown = scoring::domain_breakdown(&questions, &record.answers);
    assert_eq!(breakdown[&QuestionDomain::Biomedical].correct, 1);
    assert_eq!(breakdown[&QuestionDomain::Biomedical].total, 1);
    assert_eq!(breakdown[&QuestionDomain::Pharmaceutical].correct, 0);
    assert_eq!(breakdown[&QuestionDomain::Pharmaceutical].total, 1);
    assert_eq!(breakdown[&QuestionDomain::Clinical].correct, 2);
    assert_eq!(breakdown[&QuestionDomain::Clinical].total, 2);

    // The durable record matches what the API returned.
    let loaded = service.load_session(&record.id).await.expect("load session");
    assert_eq!(loaded.score, Some(75));
    assert!(loaded.completed);
    assert_eq!(loaded.question_ids.len(), 4);

    let history = service.session_history(Some(ExamType::Mock), 10).await.expect("history");
    assert_eq!(history.len(), 1);

    // The rollup reflects the one completed session with real aggregation.
    let progress =
        rebuild_user_progress(store.as_ref(), "learner-7", &service.settings().progress)
            .await
            .expect("rebuild progress");
    assert_eq!(progress.total_exams, 1);
    assert_eq!(progress.average_score, 75.0);
    assert_eq!(progress.domain_scores.clinical, 100.0);
    assert_eq!(progress.domain_scores.pharmaceutical, 0.0);
    assert!(progress.weak_areas.contains(&QuestionDomain::Pharmaceutical));
    assert!(progress.strong_areas.contains(&QuestionDomain::Clinical));
}
