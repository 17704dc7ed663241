//! Ownership bookkeeping: which identity pinned which content id.
//!
//! Handlers only talk to [`OwnershipStore`]; the backing store is chosen at
//! startup. Every operation applies fully or fails; no operation spans more
//! than one call, so handlers never assume a transaction across calls.

mod database;
mod memory;

pub use database::DbOwnershipStore;
pub use memory::MemoryOwnershipStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::DbErr;
use thiserror::Error;

use crate::entity::content;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] DbErr),
}

/// An active `(identity, content id)` pair.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Ownership {
    pub identity: String,
    pub content_id: String,
}

/// A full ownership row, active or removed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OwnershipRecord {
    pub identity: String,
    pub content_id: String,
    pub label: String,
    pub byte_size: i64,
    pub created_at: DateTime<Utc>,
    /// `None` while the content is pinned for this identity.
    pub removed_at: Option<DateTime<Utc>>,
}

impl OwnershipRecord {
    pub fn is_active(&self) -> bool {
        self.removed_at.is_none()
    }
}

impl From<content::Model> for OwnershipRecord {
    fn from(model: content::Model) -> Self {
        Self {
            identity: model.username,
            content_id: model.hash,
            label: model.name,
            byte_size: model.size,
            created_at: model.created,
            removed_at: model.removed,
        }
    }
}

#[async_trait]
pub trait OwnershipStore: Send + Sync {
    /// Insert an active record, or reactivate and refresh an existing one.
    /// The creation time of an existing record is kept.
    ///
    /// Returns the number of rows written.
    async fn upsert_active(
        &self,
        identity: &str,
        content_id: &str,
        label: &str,
        byte_size: i64,
    ) -> Result<u64, StoreError>;

    /// Active content ids of one identity, oldest first.
    async fn list_active_by_identity(&self, identity: &str) -> Result<Vec<String>, StoreError>;

    /// Active records of any identity whose content id is in `content_ids`.
    async fn list_active_by_content_ids(
        &self,
        content_ids: &[String],
    ) -> Result<Vec<Ownership>, StoreError>;

    /// Mark the identity's active records for `content_ids` as removed now.
    /// Ids that are not active for the identity are skipped.
    ///
    /// Returns the number of rows marked.
    async fn deactivate(&self, identity: &str, content_ids: &[String]) -> Result<u64, StoreError>;

    /// Every record, active or removed, oldest first.
    async fn list_all(&self) -> Result<Vec<OwnershipRecord>, StoreError>;
}
