use crate::ml::error::{MlError, MlResult};
use crate::ml::evaluation::{accuracy, median};
use crate::ml::features::{FeatureBuilder, FeatureSchema};
use crate::ml::models::{
    ClassifierConfig, DistrictSafety, MlConfig, ProbePrediction, ProbeRecord, SafetyAssessment,
    SafetyLabel,
};
use crate::ml::regressor::ndarray_to_densematrix;
use crate::ml::split::TrainTestSplit;
use crate::models::DatasetSnapshot;
use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::SeedableRng;
use smartcore::ensemble::random_forest_classifier::{
    RandomForestClassifier, RandomForestClassifierParameters,
};
use smartcore::linalg::basic::matrix::DenseMatrix;
use tracing::{debug, info, warn};

type Forest = RandomForestClassifier<f64, i32, DenseMatrix<f64>, Vec<i32>>;

/// Safety score and label for every district of a snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct SafetyLabeling {
    pub median_score: f64,
    pub districts: Vec<DistrictSafety>,
}

impl SafetyLabeling {
    /// Score each district and label it safe when its score is strictly above the median
    pub fn derive(snapshot: &DatasetSnapshot) -> MlResult<Self> {
        let scores: Vec<f64> = snapshot
            .records()
            .iter()
            .map(|r| r.safety_score())
            .collect();
        let median_score = median(&scores)?;

        let districts = snapshot
            .records()
            .iter()
            .zip(scores)
            .map(|(record, safety_score)| DistrictSafety {
                district: record.district.clone(),
                safety_score,
                label: if safety_score > median_score {
                    SafetyLabel::Safe
                } else {
                    SafetyLabel::Unsafe
                },
            })
            .collect();

        Ok(Self {
            median_score,
            districts,
        })
    }

    pub fn labels(&self) -> Vec<SafetyLabel> {
        self.districts.iter().map(|d| d.label).collect()
    }
}

enum SafetyModel {
    Forest(Box<Forest>),
    /// Training rows carried a single class
    Constant(SafetyLabel),
}

/// Random forest over the unscaled classification features
pub struct SafetyForest {
    model: SafetyModel,
    n_features: usize,
}

impl SafetyForest {
    pub fn fit(
        features: &Array2<f64>,
        labels: &[SafetyLabel],
        config: &ClassifierConfig,
        seed: u64,
    ) -> MlResult<Self> {
        if features.nrows() == 0 {
            return Err(MlError::InsufficientData(
                "cannot fit a classifier on zero rows".to_string(),
            ));
        }
        if labels.len() != features.nrows() {
            return Err(MlError::ModelTraining(format!(
                "feature rows ({}) and labels ({}) differ",
                features.nrows(),
                labels.len()
            )));
        }

        let first = labels[0];
        if labels.iter().all(|l| *l == first) {
            warn!(
                label = %first,
                "Training labels contain a single class, using a constant model"
            );
            return Ok(Self {
                model: SafetyModel::Constant(first),
                n_features: features.ncols(),
            });
        }

        let mut params = RandomForestClassifierParameters::default()
            .with_n_trees(config.n_trees)
            .with_min_samples_leaf(config.min_samples_leaf)
            .with_seed(seed);
        if let Some(max_depth) = config.max_depth {
            params = params.with_max_depth(max_depth);
        }

        let x = ndarray_to_densematrix(features);
        let y: Vec<i32> = labels.iter().map(|l| l.class()).collect();

        let forest = RandomForestClassifier::fit(&x, &y, params).map_err(|e| {
            MlError::ModelTraining(format!("Failed to train random forest: {}", e))
        })?;

        debug!(n_trees = config.n_trees, n_samples = labels.len(), "Safety forest fitted");

        Ok(Self {
            model: SafetyModel::Forest(Box::new(forest)),
            n_features: features.ncols(),
        })
    }

    pub fn predict(&self, features: &Array2<f64>) -> MlResult<Vec<SafetyLabel>> {
        if features.ncols() != self.n_features {
            return Err(MlError::FeatureSchema(format!(
                "expected {} features, got {}",
                self.n_features,
                features.ncols()
            )));
        }
        if features.nrows() == 0 {
            return Ok(Vec::new());
        }

        match &self.model {
            SafetyModel::Constant(label) => Ok(vec![*label; features.nrows()]),
            SafetyModel::Forest(forest) => {
                let x = ndarray_to_densematrix(features);
                let predictions = forest
                    .predict(&x)
                    .map_err(|e| MlError::ModelTraining(format!("Prediction failed: {}", e)))?;
                Ok(predictions.into_iter().map(SafetyLabel::from_class).collect())
            }
        }
    }

    pub fn is_constant(&self) -> bool {
        matches!(self.model, SafetyModel::Constant(_))
    }
}

/// Labels districts safe/unsafe and demonstrates the model on the probe inputs
pub struct SafetyClassifier {
    config: ClassifierConfig,
    seed: u64,
    test_fraction: f64,
    probes: Vec<ProbeRecord>,
}

impl SafetyClassifier {
    pub fn new(config: &MlConfig) -> Self {
        Self {
            config: config.classifier.clone(),
            seed: config.seed,
            test_fraction: config.test_fraction,
            probes: config.probes.clone(),
        }
    }

    pub fn run(&self, snapshot: &DatasetSnapshot) -> MlResult<SafetyAssessment> {
        let matrix = FeatureBuilder::build(snapshot, FeatureSchema::SafetyClassification)?;
        let labeling = SafetyLabeling::derive(snapshot)?;
        let labels = Array1::from(labeling.labels());

        let mut split_rng = StdRng::seed_from_u64(self.seed);
        let split = TrainTestSplit::new(matrix.n_samples(), self.test_fraction, &mut split_rng)?;
        let (x_train, x_test) = split.select_rows(&matrix.features);
        let (y_train, y_test) = split.select_targets(&labels);

        let model = SafetyForest::fit(&x_train, &y_train.to_vec(), &self.config, self.seed)?;

        let eval_predictions = model.predict(&x_test)?;
        let accuracy = accuracy(&y_test.to_vec(), &eval_predictions)?;

        let probe_features = FeatureBuilder::probe_matrix(&self.probes)?;
        let probe_labels = model.predict(&probe_features)?;
        let probes = self
            .probes
            .iter()
            .zip(probe_labels)
            .map(|(probe, label)| ProbePrediction {
                probe: *probe,
                label,
            })
            .collect();

        info!(
            "Safety classifier trained on {} districts - Accuracy: {:.2}%",
            split.train.len(),
            accuracy * 100.0
        );

        Ok(SafetyAssessment {
            accuracy,
            n_train: split.train.len(),
            n_eval: split.test.len(),
            median_score: labeling.median_score,
            districts: labeling.districts,
            probes,
        })
    }
}
