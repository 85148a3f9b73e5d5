use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::auth::{AuthError, AuthUser, IdentityProvider, NewUserProfile};
use crate::core::config::Settings;
use crate::core::time::primitive_now_utc;
use crate::services::exam_session::ExamService;
use crate::store::memory::MemoryStore;
use crate::store::models::Question;
use crate::store::types::{QuestionDifficulty, QuestionDomain, UserRole};
use crate::store::{collections, Document, DocumentStore, Query, StoreError};

pub(crate) fn student_user() -> AuthUser {
    AuthUser {
        uid: "student-1".to_string(),
        email: "student@example.com".to_string(),
        display_name: "Test Student".to_string(),
        role: UserRole::Student,
    }
}

pub(crate) struct StaticIdentity {
    user: Option<AuthUser>,
}

#[async_trait]
impl IdentityProvider for StaticIdentity {
    async fn register(
        &self,
        _email: &str,
        _password: &str,
        _profile: NewUserProfile,
    ) -> Result<String, AuthError> {
        Err(AuthError::Provider("registration not supported in tests".to_string()))
    }

    async fn login(&self, _email: &str, _password: &str) -> Result<AuthUser, AuthError> {
        self.user.clone().ok_or(AuthError::InvalidCredentials)
    }

    async fn logout(&self) -> Result<(), AuthError> {
        Ok(())
    }

    async fn reset_password(&self, _email: &str) -> Result<(), AuthError> {
        Ok(())
    }

    async fn current_user(&self) -> Option<AuthUser> {
        self.user.clone()
    }
}

pub(crate) fn signed_in_identity() -> Arc<dyn IdentityProvider> {
    Arc::new(StaticIdentity { user: Some(student_user()) })
}

pub(crate) fn service(store: Arc<dyn DocumentStore>) -> ExamService {
    ExamService::new(store, signed_in_identity(), Settings::default())
}

pub(crate) fn service_signed_out(store: Arc<dyn DocumentStore>) -> ExamService {
    ExamService::new(store, Arc::new(StaticIdentity { user: None }), Settings::default())
}

/// Default settings with the mock-section size shrunk so tests can run full
/// mock flows against a small seeded bank.
pub(crate) fn small_mock_settings(section_questions: usize) -> Settings {
    let mut settings = Settings::default();
    settings.exam.section_question_count = section_questions;
    settings
}

pub(crate) fn make_question(content: &str, domain: QuestionDomain, correct: usize) -> Question {
    Question {
        id: format!("q-{content}"),
        content: content.to_string(),
        options: (0..4).map(|i| format!("option {i}")).collect(),
        correct_answer: correct,
        explanation: format!("{content} explanation"),
        domain,
        difficulty: QuestionDifficulty::Medium,
        references: Vec::new(),
        created_by: "seed".to_string(),
        approved: true,
        created_at: primitive_now_utc(),
    }
}

pub(crate) async fn seed_question(
    store: &MemoryStore,
    content: &str,
    domain: QuestionDomain,
    correct: usize,
) -> String {
    insert_question(store, make_question(content, domain, correct)).await
}

pub(crate) async fn seed_unapproved_question(
    store: &MemoryStore,
    content: &str,
    domain: QuestionDomain,
) -> String {
    let mut question = make_question(content, domain, 0);
    question.approved = false;
    insert_question(store, question).await
}

async fn insert_question(store: &MemoryStore, question: Question) -> String {
    let data = serde_json::to_value(&question).expect("serialize question");
    store.create(collections::QUESTIONS, None, &data).await.expect("seed question")
}

/// Store wrapper whose updates fail with a transport error while the flag is
/// set; used to exercise the submit-retry path.
pub(crate) struct FlakyStore {
    inner: Arc<MemoryStore>,
    fail_updates: Arc<AtomicBool>,
}

pub(crate) fn flaky_store(inner: Arc<MemoryStore>) -> (Arc<FlakyStore>, Arc<AtomicBool>) {
    let fail_updates = Arc::new(AtomicBool::new(false));
    (Arc::new(FlakyStore { inner, fail_updates: fail_updates.clone() }), fail_updates)
}

#[async_trait]
impl DocumentStore for FlakyStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        self.inner.get(collection, id).await
    }

    async fn query(&self, collection: &str, query: &Query) -> Result<Vec<Document>, StoreError> {
        self.inner.query(collection, query).await
    }

    async fn create(
        &self,
        collection: &str,
        id: Option<&str>,
        data: &Value,
    ) -> Result<String, StoreError> {
        self.inner.create(collection, id, data).await
    }

    async fn update(&self, collection: &str, id: &str, patch: &Value) -> Result<(), StoreError> {
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(StoreError::Transport("simulated network failure".to_string()));
        }
        self.inner.update(collection, id, patch).await
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        self.inner.delete(collection, id).await
    }
}
