use crate::store::models::UserProgress;
use crate::store::{collections, DocumentStore, StoreError};

/// Progress documents are keyed by the owning user's id.
pub async fn find_by_user(
    store: &dyn DocumentStore,
    user_id: &str,
) -> Result<Option<UserProgress>, StoreError> {
    match store.get(collections::USER_PROGRESS, user_id).await? {
        Some(doc) => Ok(Some(serde_json::from_value(doc.data)?)),
        None => Ok(None),
    }
}

pub async fn upsert(store: &dyn DocumentStore, progress: &UserProgress) -> Result<(), StoreError> {
    let data = serde_json::to_value(progress)?;
    store.create(collections::USER_PROGRESS, Some(&progress.user_id), &data).await?;
    Ok(())
}
