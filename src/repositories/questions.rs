use rand::seq::SliceRandom;
use serde_json::{json, Value};
use time::PrimitiveDateTime;
use validator::Validate;

use crate::core::time::format_primitive;
use crate::error::ExamError;
use crate::store::models::Question;
use crate::store::types::{QuestionDifficulty, QuestionDomain};
use crate::store::{collections, Document, DocumentStore, Query, StoreError};

/// Upper bound on a single read from the question bank.
pub const MAX_FETCH_LIMIT: usize = 500;

/// Random sampling over-fetches this multiple of the requested count before
/// shuffling, so the sample is not biased toward insertion order.
const OVERFETCH_FACTOR: usize = 3;

#[derive(Debug, Clone)]
pub struct QuestionFilter {
    pub domain: Option<QuestionDomain>,
    pub difficulty: Option<QuestionDifficulty>,
    pub approved_only: bool,
}

impl Default for QuestionFilter {
    fn default() -> Self {
        Self { domain: None, difficulty: None, approved_only: true }
    }
}

#[derive(Debug, Clone, Validate)]
pub struct QuestionCreate {
    #[validate(length(min = 1, message = "content must not be empty"))]
    pub content: String,
    #[validate(length(min = 2, message = "at least two options are required"))]
    pub options: Vec<String>,
    pub correct_answer: usize,
    pub explanation: String,
    pub domain: QuestionDomain,
    pub difficulty: QuestionDifficulty,
    pub references: Vec<String>,
    pub created_by: String,
    pub approved: bool,
}

#[derive(Debug, Clone, Default)]
pub struct QuestionUpdate {
    pub content: Option<String>,
    pub options: Option<Vec<String>>,
    pub correct_answer: Option<usize>,
    pub explanation: Option<String>,
    pub references: Option<Vec<String>>,
}

fn decode(doc: Document) -> Result<Question, StoreError> {
    let mut question: Question = serde_json::from_value(doc.data)?;
    question.id = doc.id;
    Ok(question)
}

pub async fn list(
    store: &dyn DocumentStore,
    filter: &QuestionFilter,
    limit: usize,
) -> Result<Vec<Question>, StoreError> {
    let mut query = Query::new().order_desc("createdAt").limit(limit.clamp(1, MAX_FETCH_LIMIT));
    if filter.approved_only {
        query = query.filter("approved", true);
    }
    if let Some(domain) = filter.domain {
        query = query.filter("domain", domain.as_str());
    }
    if let Some(difficulty) = filter.difficulty {
        query = query.filter("difficulty", difficulty.as_str());
    }

    let docs = store.query(collections::QUESTIONS, &query).await?;
    docs.into_iter().map(decode).collect()
}

/// Samples `count` approved questions matching the optional filters. Fails
/// with [`ExamError::InsufficientQuestions`] when the filtered pool is too
/// small; callers must treat that as a content-availability problem, not a
/// transport failure.
pub async fn fetch_random(
    store: &dyn DocumentStore,
    count: usize,
    domain: Option<QuestionDomain>,
    difficulty: Option<QuestionDifficulty>,
) -> Result<Vec<Question>, ExamError> {
    if count == 0 {
        return Err(ExamError::InsufficientQuestions { requested: 0, available: 0 });
    }

    let filter = QuestionFilter { domain, difficulty, approved_only: true };
    let mut pool = list(store, &filter, count.saturating_mul(OVERFETCH_FACTOR)).await?;

    if pool.len() < count {
        return Err(ExamError::InsufficientQuestions { requested: count, available: pool.len() });
    }

    pool.shuffle(&mut rand::thread_rng());
    pool.truncate(count);
    Ok(pool)
}

pub async fn find_by_id(
    store: &dyn DocumentStore,
    id: &str,
) -> Result<Option<Question>, StoreError> {
    match store.get(collections::QUESTIONS, id).await? {
        Some(doc) => decode(doc).map(Some),
        None => Ok(None),
    }
}

/// Resolves a batch of question ids, silently skipping ids that no longer
/// exist. Sessions reference questions by id, so a deleted question simply
/// drops out of historical analytics.
pub async fn find_by_ids(
    store: &dyn DocumentStore,
    ids: &[String],
) -> Result<Vec<Question>, StoreError> {
    let mut questions = Vec::with_capacity(ids.len());
    for id in ids {
        if let Some(question) = find_by_id(store, id).await? {
            questions.push(question);
        }
    }
    Ok(questions)
}

pub async fn create(
    store: &dyn DocumentStore,
    payload: &QuestionCreate,
    now: PrimitiveDateTime,
) -> Result<String, ExamError> {
    payload.validate()?;
    if payload.correct_answer >= payload.options.len() {
        return Err(ExamError::InvalidIndex {
            what: "option",
            index: payload.correct_answer,
            limit: payload.options.len(),
        });
    }

    let data = json!({
        "content": payload.content,
        "options": payload.options,
        "correctAnswer": payload.correct_answer,
        "explanation": payload.explanation,
        "domain": payload.domain,
        "difficulty": payload.difficulty,
        "references": payload.references,
        "createdBy": payload.created_by,
        "approved": payload.approved,
        "createdAt": format_primitive(now),
    });
    Ok(store.create(collections::QUESTIONS, None, &data).await?)
}

pub async fn update(
    store: &dyn DocumentStore,
    id: &str,
    changes: &QuestionUpdate,
) -> Result<(), StoreError> {
    let mut patch = serde_json::Map::new();
    if let Some(content) = &changes.content {
        patch.insert("content".to_string(), json!(content));
    }
    if let Some(options) = &changes.options {
        patch.insert("options".to_string(), json!(options));
    }
    if let Some(correct_answer) = changes.correct_answer {
        patch.insert("correctAnswer".to_string(), json!(correct_answer));
    }
    if let Some(explanation) = &changes.explanation {
        patch.insert("explanation".to_string(), json!(explanation));
    }
    if let Some(references) = &changes.references {
        patch.insert("references".to_string(), json!(references));
    }
    if patch.is_empty() {
        return Ok(());
    }
    store.update(collections::QUESTIONS, id, &Value::Object(patch)).await
}

pub async fn set_approved(
    store: &dyn DocumentStore,
    id: &str,
    approved: bool,
) -> Result<(), StoreError> {
    store.update(collections::QUESTIONS, id, &json!({ "approved": approved })).await
}

pub async fn delete(store: &dyn DocumentStore, id: &str) -> Result<(), StoreError> {
    store.delete(collections::QUESTIONS, id).await
}
