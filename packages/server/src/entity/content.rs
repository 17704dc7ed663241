use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Maps an identity to a content id it uploaded.
///
/// Rows are never deleted; unpinning sets `removed`.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "content")]
pub struct Model {
    /// Authenticated user who uploaded the content.
    #[sea_orm(primary_key)]
    pub username: String,
    /// Content id assigned by the storage node.
    #[sea_orm(primary_key)]
    pub hash: String,

    /// File name, directory name, or synthesized import label.
    pub name: String,

    pub size: i64,

    /// Set on first insertion only.
    pub created: DateTimeUtc,

    pub removed: Option<DateTimeUtc>,
}

impl ActiveModelBehavior for ActiveModel {}
