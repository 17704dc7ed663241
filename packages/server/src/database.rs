use std::time::Duration;

use sea_orm::sea_query::{Index, PostgresQueryBuilder};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr};
use tracing::info;

use crate::entity::content;

pub async fn init_db(db_url: &str) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(db_url.to_owned());

    opt.max_connections(50)
        .min_connections(2)
        .connect_timeout(Duration::from_secs(8))
        .acquire_timeout(Duration::from_secs(8))
        .idle_timeout(Duration::from_secs(60))
        .sqlx_logging(false);

    let db = Database::connect(opt).await?;
    db.get_schema_registry("pin_proxy::entity::*")
        .sync(&db)
        .await?;

    Ok(db)
}

/// Create indexes not expressible through the entity definitions.
pub async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    // Cross-identity lookup during pin removal:
    // SELECT ... FROM content WHERE hash IN (...) AND removed IS NULL
    let stmt = Index::create()
        .if_not_exists()
        .name("idx_content_hash_removed")
        .table(content::Entity)
        .col(content::Column::Hash)
        .col(content::Column::Removed)
        .to_string(PostgresQueryBuilder);

    match db.execute_unprepared(&stmt).await {
        Ok(_) => info!("Ensured index idx_content_hash_removed exists"),
        Err(e) => tracing::warn!("Failed to create index idx_content_hash_removed: {}", e),
    }

    Ok(())
}
