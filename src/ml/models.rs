use crate::ml::error::{MlError, MlResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

/// Prediction pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MlConfig {
    /// Seed shared by the train/evaluation splits and the tree ensembles
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Fraction of districts held out for evaluation
    #[serde(default = "default_test_fraction")]
    #[validate(range(min = 0.01, max = 0.99))]
    pub test_fraction: f64,

    /// Number of districts kept in the ranked error table
    #[serde(default = "default_top_errors")]
    #[validate(range(min = 1))]
    pub top_errors: usize,

    /// Crime-count regressor hyperparameters
    #[serde(default)]
    #[validate(nested)]
    pub regressor: RegressorConfig,

    /// Safety classifier hyperparameters
    #[serde(default)]
    #[validate(nested)]
    pub classifier: ClassifierConfig,

    /// Fixed inputs used to demonstrate the trained classifier
    #[serde(default = "default_probes")]
    #[validate(length(min = 1))]
    pub probes: Vec<ProbeRecord>,

    /// Display names for the two safety classes
    #[serde(default)]
    pub designations: DesignationLabels,
}

impl MlConfig {
    /// Validate ranges, mapping failures into the pipeline error taxonomy
    pub fn check(&self) -> MlResult<()> {
        self.validate()
            .map_err(|e| MlError::InvalidConfiguration(e.to_string()))
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

impl Default for MlConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            test_fraction: default_test_fraction(),
            top_errors: default_top_errors(),
            regressor: RegressorConfig::default(),
            classifier: ClassifierConfig::default(),
            probes: default_probes(),
            designations: DesignationLabels::default(),
        }
    }
}

/// Gradient-boosted tree ensemble settings
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct RegressorConfig {
    #[validate(range(min = 1))]
    pub n_trees: usize,

    #[validate(range(min = 0.0001, max = 1.0))]
    pub learning_rate: f64,

    #[validate(range(min = 1))]
    pub max_depth: u16,

    /// Fraction of training rows drawn (without replacement) for each tree
    #[validate(range(min = 0.01, max = 1.0))]
    pub subsample: f64,

    #[validate(range(min = 1))]
    pub min_samples_leaf: usize,
}

impl Default for RegressorConfig {
    fn default() -> Self {
        Self {
            n_trees: 500,
            learning_rate: 0.05,
            max_depth: 6,
            subsample: 1.0,
            min_samples_leaf: 1,
        }
    }
}

/// Random forest settings
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ClassifierConfig {
    #[validate(range(min = 1))]
    pub n_trees: u16,

    /// Unlimited when absent
    pub max_depth: Option<u16>,

    #[validate(range(min = 1))]
    pub min_samples_leaf: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: None,
            min_samples_leaf: 1,
        }
    }
}

/// Literal classifier input, independent of the live dataset
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProbeRecord {
    pub cctv_total: f64,
    pub facility_total: f64,
    pub avg_transaction_amount: f64,
    pub crime_total: f64,
}

impl ProbeRecord {
    pub fn new(
        cctv_total: f64,
        facility_total: f64,
        avg_transaction_amount: f64,
        crime_total: f64,
    ) -> Self {
        Self {
            cctv_total,
            facility_total,
            avg_transaction_amount,
            crime_total,
        }
    }
}

/// Binary safety class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SafetyLabel {
    Unsafe,
    Safe,
}

impl SafetyLabel {
    /// Class index used by the classifier (0 = unsafe, 1 = safe)
    pub fn class(&self) -> i32 {
        match self {
            SafetyLabel::Unsafe => 0,
            SafetyLabel::Safe => 1,
        }
    }

    pub fn from_class(class: i32) -> Self {
        if class == 1 {
            SafetyLabel::Safe
        } else {
            SafetyLabel::Unsafe
        }
    }
}

impl fmt::Display for SafetyLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SafetyLabel::Unsafe => f.write_str("unsafe"),
            SafetyLabel::Safe => f.write_str("safe"),
        }
    }
}

/// Mapping from safety class to the designation shown to users
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignationLabels {
    pub safe: String,
    #[serde(rename = "unsafe")]
    pub unsafe_: String,
}

impl DesignationLabels {
    pub fn designation(&self, label: SafetyLabel) -> &str {
        match label {
            SafetyLabel::Safe => &self.safe,
            SafetyLabel::Unsafe => &self.unsafe_,
        }
    }
}

impl Default for DesignationLabels {
    fn default() -> Self {
        Self {
            safe: "safe".to_string(),
            unsafe_: "unsafe".to_string(),
        }
    }
}

/// Per-district regression output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistrictPrediction {
    pub district: String,
    pub actual_crime_count: u64,
    pub predicted_crime_count: f64,
    pub absolute_error: f64,
}

/// Result of one crime-count regression run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrimeForecast {
    /// Mean absolute error on the held-out districts
    pub mae: f64,
    pub n_train: usize,
    pub n_eval: usize,
    /// Every district in snapshot order
    pub predictions: Vec<DistrictPrediction>,
    /// Largest absolute errors first
    pub top_errors: Vec<DistrictPrediction>,
}

/// Derived safety columns for one district
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistrictSafety {
    pub district: String,
    pub safety_score: f64,
    pub label: SafetyLabel,
}

/// Classifier output for one probe input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbePrediction {
    pub probe: ProbeRecord,
    pub label: SafetyLabel,
}

/// Result of one safety classification run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetyAssessment {
    /// Fraction of held-out districts labeled correctly
    pub accuracy: f64,
    pub n_train: usize,
    pub n_eval: usize,
    /// Median safety score the labels were thresholded at
    pub median_score: f64,
    /// Every district in snapshot order
    pub districts: Vec<DistrictSafety>,
    pub probes: Vec<ProbePrediction>,
}

fn default_seed() -> u64 {
    42
}

fn default_test_fraction() -> f64 {
    0.2
}

fn default_top_errors() -> usize {
    15
}

/// The five demonstration inputs shown on the dashboard
pub fn default_probes() -> Vec<ProbeRecord> {
    vec![
        ProbeRecord::new(5000.0, 10.0, 80000.0, 3000.0),
        ProbeRecord::new(8000.0, 20.0, 150000.0, 1000.0),
        ProbeRecord::new(6000.0, 18.0, 70000.0, 300.0),
        ProbeRecord::new(4500.0, 22.0, 90000.0, 600.0),
        ProbeRecord::new(4900.0, 15.0, 63624.0, 2400.0),
    ]
}
