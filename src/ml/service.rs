use crate::error::{AppError, Result};
use crate::metrics::{PipelineTimer, CRIME_MODEL_MAE, SAFETY_MODEL_ACCURACY};
use crate::ml::classifier::SafetyClassifier;
use crate::ml::error::MlResult;
use crate::ml::models::{CrimeForecast, MlConfig, SafetyAssessment};
use crate::ml::regressor::CrimeCountRegressor;
use crate::models::DatasetSnapshot;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

/// Both pipeline results for one snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRun {
    pub crime: CrimeForecast,
    pub safety: SafetyAssessment,
}

/// Runs the prediction pipelines on demand.
///
/// Holds configuration only. Each call trains fresh models against the snapshot it is
/// given and drops them before returning, so concurrent calls share nothing mutable.
pub struct PredictionService {
    config: MlConfig,
}

impl PredictionService {
    pub const CRIME_PIPELINE: &'static str = "crime_regression";
    pub const SAFETY_PIPELINE: &'static str = "safety_classification";

    /// Create a service, rejecting out-of-range settings up front
    pub fn new(config: MlConfig) -> MlResult<Self> {
        config.check()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &MlConfig {
        &self.config
    }

    /// Train and evaluate the crime-count regressor
    pub fn forecast_crime(&self, snapshot: &DatasetSnapshot) -> MlResult<CrimeForecast> {
        let timer = PipelineTimer::start(Self::CRIME_PIPELINE);
        let result = CrimeCountRegressor::new(&self.config).run(snapshot);
        let elapsed = timer.finish(result.is_ok());

        match &result {
            Ok(forecast) => {
                CRIME_MODEL_MAE.set(forecast.mae);
                info!(
                    districts = snapshot.len(),
                    mae = forecast.mae,
                    elapsed_secs = elapsed,
                    "Crime forecast completed"
                );
            }
            Err(e) => error!(districts = snapshot.len(), "Crime forecast failed: {}", e),
        }

        result
    }

    /// Train and evaluate the safety classifier, then label the probe inputs
    pub fn assess_safety(&self, snapshot: &DatasetSnapshot) -> MlResult<SafetyAssessment> {
        let timer = PipelineTimer::start(Self::SAFETY_PIPELINE);
        let result = SafetyClassifier::new(&self.config).run(snapshot);
        let elapsed = timer.finish(result.is_ok());

        match &result {
            Ok(assessment) => {
                SAFETY_MODEL_ACCURACY.set(assessment.accuracy);
                info!(
                    districts = snapshot.len(),
                    accuracy = assessment.accuracy,
                    elapsed_secs = elapsed,
                    "Safety assessment completed"
                );
            }
            Err(e) => error!(districts = snapshot.len(), "Safety assessment failed: {}", e),
        }

        result
    }

    /// Run both pipelines; either failure aborts the whole run
    pub fn run_all(&self, snapshot: &DatasetSnapshot) -> MlResult<PredictionRun> {
        Ok(PredictionRun {
            crime: self.forecast_crime(snapshot)?,
            safety: self.assess_safety(snapshot)?,
        })
    }

    /// Crime forecast on the blocking thread pool
    pub async fn forecast_crime_blocking(
        self: &Arc<Self>,
        snapshot: DatasetSnapshot,
    ) -> Result<CrimeForecast> {
        let service = Arc::clone(self);
        spawn_pipeline(move || service.forecast_crime(&snapshot)).await
    }

    /// Safety assessment on the blocking thread pool
    pub async fn assess_safety_blocking(
        self: &Arc<Self>,
        snapshot: DatasetSnapshot,
    ) -> Result<SafetyAssessment> {
        let service = Arc::clone(self);
        spawn_pipeline(move || service.assess_safety(&snapshot)).await
    }

    /// Both pipelines on the blocking thread pool
    pub async fn run_all_blocking(self: &Arc<Self>, snapshot: DatasetSnapshot) -> Result<PredictionRun> {
        let service = Arc::clone(self);
        spawn_pipeline(move || service.run_all(&snapshot)).await
    }
}

async fn spawn_pipeline<T, F>(job: F) -> Result<T>
where
    F: FnOnce() -> MlResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(job)
        .await
        .map_err(|e| AppError::Internal(format!("Pipeline task failed: {}", e)))?
        .map_err(AppError::from)
}
