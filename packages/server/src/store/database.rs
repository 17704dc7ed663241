use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set};

use super::{Ownership, OwnershipRecord, OwnershipStore, StoreError};
use crate::entity::content;

/// Ownership store backed by the `content` table.
#[derive(Clone)]
pub struct DbOwnershipStore {
    db: DatabaseConnection,
}

impl DbOwnershipStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl OwnershipStore for DbOwnershipStore {
    async fn upsert_active(
        &self,
        identity: &str,
        content_id: &str,
        label: &str,
        byte_size: i64,
    ) -> Result<u64, StoreError> {
        let model = content::ActiveModel {
            username: Set(identity.to_string()),
            hash: Set(content_id.to_string()),
            name: Set(label.to_string()),
            size: Set(byte_size),
            created: Set(Utc::now()),
            removed: Set(None),
        };

        // `created` is left out of the update set so re-uploads keep it.
        let rows = content::Entity::insert(model)
            .on_conflict(
                OnConflict::columns([content::Column::Username, content::Column::Hash])
                    .update_columns([
                        content::Column::Name,
                        content::Column::Size,
                        content::Column::Removed,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;

        Ok(rows)
    }

    async fn list_active_by_identity(&self, identity: &str) -> Result<Vec<String>, StoreError> {
        let rows = content::Entity::find()
            .filter(content::Column::Username.eq(identity))
            .filter(content::Column::Removed.is_null())
            .order_by_asc(content::Column::Created)
            .all(&self.db)
            .await?;

        Ok(rows.into_iter().map(|row| row.hash).collect())
    }

    async fn list_active_by_content_ids(
        &self,
        content_ids: &[String],
    ) -> Result<Vec<Ownership>, StoreError> {
        if content_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = content::Entity::find()
            .filter(content::Column::Hash.is_in(content_ids.iter().cloned()))
            .filter(content::Column::Removed.is_null())
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| Ownership {
                identity: row.username,
                content_id: row.hash,
            })
            .collect())
    }

    async fn deactivate(&self, identity: &str, content_ids: &[String]) -> Result<u64, StoreError> {
        if content_ids.is_empty() {
            return Ok(0);
        }

        let result = content::Entity::update_many()
            .col_expr(content::Column::Removed, Expr::value(Utc::now()))
            .filter(content::Column::Username.eq(identity))
            .filter(content::Column::Hash.is_in(content_ids.iter().cloned()))
            .filter(content::Column::Removed.is_null())
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected)
    }

    async fn list_all(&self) -> Result<Vec<OwnershipRecord>, StoreError> {
        let rows = content::Entity::find()
            .order_by_asc(content::Column::Created)
            .order_by_asc(content::Column::Username)
            .all(&self.db)
            .await?;

        Ok(rows.into_iter().map(OwnershipRecord::from).collect())
    }
}
