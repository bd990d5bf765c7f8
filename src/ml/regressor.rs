use crate::ml::error::{MlError, MlResult};
use crate::ml::evaluation::{ensure_finite, mean_absolute_error};
use crate::ml::features::{FeatureBuilder, FeatureSchema};
use crate::ml::models::{CrimeForecast, DistrictPrediction, MlConfig, RegressorConfig};
use crate::ml::split::TrainTestSplit;
use crate::models::DatasetSnapshot;
use ndarray::{Array1, Array2, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::tree::decision_tree_regressor::{
    DecisionTreeRegressor, DecisionTreeRegressorParameters,
};
use tracing::{debug, info};

type RegressionTree = DecisionTreeRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>;

pub(crate) fn ndarray_to_densematrix(arr: &Array2<f64>) -> DenseMatrix<f64> {
    let shape = arr.shape();
    let data: Vec<f64> = arr.iter().copied().collect();
    DenseMatrix::new(shape[0], shape[1], data, false)
}

/// Gradient-boosted regression trees with squared-error loss.
///
/// Starts from the mean target and adds `learning_rate` times the output of each tree,
/// where every tree is fit to the residuals of the ensemble so far. With `subsample < 1`
/// each tree sees a random subset of rows drawn from the injected generator.
pub struct GradientBoostedRegressor {
    config: RegressorConfig,
    base_score: f64,
    trees: Vec<RegressionTree>,
    n_features: usize,
}

impl GradientBoostedRegressor {
    pub fn fit<R: Rng + ?Sized>(
        features: &Array2<f64>,
        target: &Array1<f64>,
        config: &RegressorConfig,
        rng: &mut R,
    ) -> MlResult<Self> {
        let n_samples = features.nrows();
        if n_samples == 0 {
            return Err(MlError::InsufficientData(
                "cannot fit a regressor on zero rows".to_string(),
            ));
        }
        if target.len() != n_samples {
            return Err(MlError::ModelTraining(format!(
                "feature rows ({}) and targets ({}) differ",
                n_samples,
                target.len()
            )));
        }

        let base_score = target.mean().unwrap_or(0.0);
        let full = ndarray_to_densematrix(features);
        let params = DecisionTreeRegressorParameters::default()
            .with_max_depth(config.max_depth)
            .with_min_samples_leaf(config.min_samples_leaf);

        let sample_size = ((n_samples as f64) * config.subsample)
            .round()
            .clamp(1.0, n_samples as f64) as usize;

        let mut fitted = Array1::from_elem(n_samples, base_score);
        let mut trees = Vec::with_capacity(config.n_trees);

        for round in 0..config.n_trees {
            let residuals = target - &fitted;

            let tree = if sample_size < n_samples {
                let rows = rand::seq::index::sample(rng, n_samples, sample_size).into_vec();
                let x = ndarray_to_densematrix(&features.select(Axis(0), &rows));
                let y: Vec<f64> = rows.iter().map(|&i| residuals[i]).collect();
                Self::fit_tree(&x, &y, params.clone(), round)?
            } else {
                Self::fit_tree(&full, &residuals.to_vec(), params.clone(), round)?
            };

            let update = tree.predict(&full).map_err(|e| {
                MlError::ModelTraining(format!("boosting round {} prediction failed: {}", round, e))
            })?;
            ensure_finite(&update, "boosting round")?;

            for (f, u) in fitted.iter_mut().zip(update) {
                *f += config.learning_rate * u;
            }
            trees.push(tree);
        }

        debug!(
            n_trees = trees.len(),
            n_samples,
            base_score,
            "Gradient-boosted regressor fitted"
        );

        Ok(Self {
            config: config.clone(),
            base_score,
            trees,
            n_features: features.ncols(),
        })
    }

    fn fit_tree(
        x: &DenseMatrix<f64>,
        y: &Vec<f64>,
        params: DecisionTreeRegressorParameters,
        round: usize,
    ) -> MlResult<RegressionTree> {
        DecisionTreeRegressor::fit(x, y, params).map_err(|e| {
            MlError::ModelTraining(format!("boosting round {} failed to fit: {}", round, e))
        })
    }

    pub fn predict(&self, features: &Array2<f64>) -> MlResult<Array1<f64>> {
        if features.ncols() != self.n_features {
            return Err(MlError::FeatureSchema(format!(
                "expected {} features, got {}",
                self.n_features,
                features.ncols()
            )));
        }
        if features.nrows() == 0 {
            return Ok(Array1::zeros(0));
        }

        let x = ndarray_to_densematrix(features);
        let mut output = Array1::from_elem(features.nrows(), self.base_score);

        for tree in &self.trees {
            let update = tree
                .predict(&x)
                .map_err(|e| MlError::ModelTraining(format!("Prediction failed: {}", e)))?;
            for (o, u) in output.iter_mut().zip(update) {
                *o += self.config.learning_rate * u;
            }
        }

        ensure_finite(&output.to_vec(), "gradient-boosted regressor")?;
        Ok(output)
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn base_score(&self) -> f64 {
        self.base_score
    }
}

/// Predicts total crime incidents per district and reports its held-out error
pub struct CrimeCountRegressor {
    config: RegressorConfig,
    seed: u64,
    test_fraction: f64,
    top_errors: usize,
}

impl CrimeCountRegressor {
    pub fn new(config: &MlConfig) -> Self {
        Self {
            config: config.regressor.clone(),
            seed: config.seed,
            test_fraction: config.test_fraction,
            top_errors: config.top_errors,
        }
    }

    /// Train on 80% of the districts, score the rest, then annotate every district
    pub fn run(&self, snapshot: &DatasetSnapshot) -> MlResult<CrimeForecast> {
        let matrix = FeatureBuilder::build(snapshot, FeatureSchema::CrimeRegression)?;
        let target = FeatureBuilder::crime_target(snapshot);

        let mut split_rng = StdRng::seed_from_u64(self.seed);
        let split = TrainTestSplit::new(matrix.n_samples(), self.test_fraction, &mut split_rng)?;
        let (x_train, x_test) = split.select_rows(&matrix.features);
        let (y_train, y_test) = split.select_targets(&target);

        debug!(
            n_train = split.train.len(),
            n_eval = split.test.len(),
            "Crime regression split"
        );

        let mut model_rng = StdRng::seed_from_u64(self.seed);
        let model = GradientBoostedRegressor::fit(&x_train, &y_train, &self.config, &mut model_rng)?;

        let eval_predictions = model.predict(&x_test)?;
        let mae = mean_absolute_error(&y_test.to_vec(), &eval_predictions.to_vec())?;

        let all_predictions = model.predict(&matrix.features)?;
        let predictions: Vec<DistrictPrediction> = snapshot
            .records()
            .iter()
            .zip(all_predictions.iter())
            .map(|(record, &predicted)| DistrictPrediction {
                district: record.district.clone(),
                actual_crime_count: record.crime_total,
                predicted_crime_count: predicted,
                absolute_error: (predicted - record.crime_total as f64).abs(),
            })
            .collect();

        let top_errors = rank_by_error(&predictions, self.top_errors);

        info!(
            "Crime regressor trained on {} districts - MAE: {:.2}",
            split.train.len(),
            mae
        );

        Ok(CrimeForecast {
            mae,
            n_train: split.train.len(),
            n_eval: split.test.len(),
            predictions,
            top_errors,
        })
    }
}

/// Largest absolute errors first; ties keep snapshot order
pub fn rank_by_error(predictions: &[DistrictPrediction], limit: usize) -> Vec<DistrictPrediction> {
    let mut ranked = predictions.to_vec();
    ranked.sort_by(|a, b| b.absolute_error.total_cmp(&a.absolute_error));
    ranked.truncate(limit);
    ranked
}
