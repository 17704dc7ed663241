use std::sync::Arc;

use crate::backend::BackendClient;
use crate::metrics::ProxyMetrics;
use crate::store::OwnershipStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn OwnershipStore>,
    pub backend: BackendClient,
    pub metrics: ProxyMetrics,
}
