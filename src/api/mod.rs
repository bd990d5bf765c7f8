pub mod handlers;
pub mod routes;

pub use routes::*;

use crate::ml::service::PredictionService;
use crate::models::DatasetSnapshot;
use std::sync::Arc;
use std::time::Instant;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub snapshot: DatasetSnapshot,
    pub service: Arc<PredictionService>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(snapshot: DatasetSnapshot, service: Arc<PredictionService>) -> Self {
        Self {
            snapshot,
            service,
            started_at: Instant::now(),
        }
    }
}
