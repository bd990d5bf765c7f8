/// Prediction pipelines over the district snapshot
///
/// This module provides:
/// - Feature matrices with an explicit, ordered schema per pipeline
/// - A seeded train/evaluation split
/// - Gradient-boosted regression of crime counts, scored by held-out MAE
/// - Median-threshold safety labeling and a random forest classifier
/// - A service that times each run and publishes its score

pub mod classifier;
pub mod error;
pub mod evaluation;
pub mod features;
pub mod models;
pub mod regressor;
pub mod service;
pub mod split;

pub use classifier::{SafetyClassifier, SafetyForest, SafetyLabeling};
pub use error::{MlError, MlResult};
pub use features::{FeatureBuilder, FeatureMatrix, FeatureSchema, StandardScaler};
pub use models::{
    ClassifierConfig, CrimeForecast, DesignationLabels, DistrictPrediction, DistrictSafety,
    MlConfig, ProbePrediction, ProbeRecord, RegressorConfig, SafetyAssessment, SafetyLabel,
};
pub use regressor::{rank_by_error, CrimeCountRegressor, GradientBoostedRegressor};
pub use service::{PredictionRun, PredictionService};
pub use split::TrainTestSplit;
