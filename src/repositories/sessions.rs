use serde_json::json;
use time::PrimitiveDateTime;

use crate::core::time::format_primitive;
use crate::error::ExamError;
use crate::store::models::ExamSessionRecord;
use crate::store::types::ExamType;
use crate::store::{collections, Document, DocumentStore, Query, StoreError};

fn decode(doc: Document) -> Result<ExamSessionRecord, StoreError> {
    let mut record: ExamSessionRecord = serde_json::from_value(doc.data)?;
    record.id = doc.id;
    Ok(record)
}

pub async fn create(
    store: &dyn DocumentStore,
    record: &ExamSessionRecord,
) -> Result<String, StoreError> {
    let data = serde_json::to_value(record)?;
    store.create(collections::EXAM_SESSIONS, None, &data).await
}

/// Reads one session record. A missing document maps to
/// [`ExamError::SessionNotFound`], distinct from a transport failure, so
/// callers can tell "never existed" from "store unreachable".
pub async fn find_by_id(
    store: &dyn DocumentStore,
    id: &str,
) -> Result<ExamSessionRecord, ExamError> {
    match store.get(collections::EXAM_SESSIONS, id).await? {
        Some(doc) => Ok(decode(doc)?),
        None => Err(ExamError::SessionNotFound(id.to_string())),
    }
}

pub async fn list_by_user(
    store: &dyn DocumentStore,
    user_id: &str,
    exam_type: Option<ExamType>,
    limit: usize,
) -> Result<Vec<ExamSessionRecord>, StoreError> {
    let mut query =
        Query::new().filter("userId", user_id).order_desc("startTime").limit(limit.max(1));
    if let Some(exam_type) = exam_type {
        query = query.filter("examType", exam_type.as_str());
    }

    let docs = store.query(collections::EXAM_SESSIONS, &query).await?;
    docs.into_iter().map(decode).collect()
}

pub async fn list_completed_by_user(
    store: &dyn DocumentStore,
    user_id: &str,
) -> Result<Vec<ExamSessionRecord>, StoreError> {
    let query =
        Query::new().filter("userId", user_id).filter("completed", true).order_desc("startTime");
    let docs = store.query(collections::EXAM_SESSIONS, &query).await?;
    docs.into_iter().map(decode).collect()
}

/// Intermediate durability: persists only the answer slots and elapsed time.
pub async fn save_answers(
    store: &dyn DocumentStore,
    id: &str,
    answers: &[Option<usize>],
    time_spent_seconds: u64,
) -> Result<(), StoreError> {
    let patch = json!({
        "answers": answers,
        "timeSpentSeconds": time_spent_seconds,
    });
    store.update(collections::EXAM_SESSIONS, id, &patch).await
}

pub struct FinalizeSession<'a> {
    pub answers: &'a [Option<usize>],
    pub end_time: PrimitiveDateTime,
    pub score: u32,
    pub time_spent_seconds: u64,
}

/// Full completion write: answers, end timestamp, score, and the completed
/// flag in a single update.
pub async fn finalize(
    store: &dyn DocumentStore,
    id: &str,
    update: FinalizeSession<'_>,
) -> Result<(), StoreError> {
    let patch = json!({
        "answers": update.answers,
        "endTime": format_primitive(update.end_time),
        "score": update.score,
        "completed": true,
        "timeSpentSeconds": update.time_spent_seconds,
    });
    store.update(collections::EXAM_SESSIONS, id, &patch).await
}
