use crate::ml::error::{MlError, MlResult};
use crate::ml::models::ProbeRecord;
use crate::models::{DatasetSnapshot, DistrictField, DistrictRecord};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

/// Named, ordered feature sets used by the two models
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureSchema {
    /// Structural features predicting the crime count
    CrimeRegression,
    /// Coverage and price features predicting the safety label
    SafetyClassification,
}

impl FeatureSchema {
    /// Columns in matrix order
    pub fn fields(&self) -> &'static [DistrictField] {
        match self {
            FeatureSchema::CrimeRegression => &[
                DistrictField::CctvTotal,
                DistrictField::FacilityTotal,
                DistrictField::AvgTransactionAmount,
                DistrictField::Population,
                DistrictField::LandArea,
            ],
            FeatureSchema::SafetyClassification => &[
                DistrictField::CctvTotal,
                DistrictField::FacilityTotal,
                DistrictField::AvgTransactionAmount,
                DistrictField::CrimeTotal,
            ],
        }
    }

    /// Regression inputs are standardized; classification inputs are used raw
    pub fn is_standardized(&self) -> bool {
        matches!(self, FeatureSchema::CrimeRegression)
    }

    pub fn n_features(&self) -> usize {
        self.fields().len()
    }
}

/// Zero-mean, unit-variance column scaling.
///
/// Variance is the population variance; constant columns keep a scale of 1 so they
/// map to zero instead of NaN.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: Array1<f64>,
    scale: Array1<f64>,
}

impl StandardScaler {
    pub fn fit(features: &Array2<f64>) -> MlResult<Self> {
        let mean = features.mean_axis(Axis(0)).ok_or_else(|| {
            MlError::InsufficientData("cannot standardize an empty feature matrix".to_string())
        })?;
        let scale = features
            .std_axis(Axis(0), 0.0)
            .mapv(|s| if s > 0.0 && s.is_finite() { s } else { 1.0 });

        Ok(Self { mean, scale })
    }

    pub fn transform(&self, features: &Array2<f64>) -> Array2<f64> {
        (features - &self.mean) / &self.scale
    }

    pub fn mean(&self) -> &Array1<f64> {
        &self.mean
    }

    pub fn scale(&self) -> &Array1<f64> {
        &self.scale
    }
}

/// Feature matrix for one schema, rows parallel to the snapshot
#[derive(Debug, Clone)]
pub struct FeatureMatrix {
    pub schema: FeatureSchema,
    pub district_ids: Vec<String>,
    pub features: Array2<f64>,
    pub scaler: Option<StandardScaler>,
}

impl FeatureMatrix {
    pub fn n_samples(&self) -> usize {
        self.features.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.features.ncols()
    }
}

/// Builds model inputs from a dataset snapshot
pub struct FeatureBuilder;

impl FeatureBuilder {
    /// Minimum number of districts for a train/evaluation split
    pub const MIN_DISTRICTS: usize = 2;

    /// Extract the schema's columns, standardizing them when the schema asks for it
    pub fn build(snapshot: &DatasetSnapshot, schema: FeatureSchema) -> MlResult<FeatureMatrix> {
        if snapshot.len() < Self::MIN_DISTRICTS {
            return Err(MlError::InsufficientData(format!(
                "need at least {} districts, snapshot has {}",
                Self::MIN_DISTRICTS,
                snapshot.len()
            )));
        }

        let fields = schema.fields();
        let mut raw = Array2::<f64>::zeros((snapshot.len(), fields.len()));

        for (i, record) in snapshot.records().iter().enumerate() {
            for (j, field) in fields.iter().enumerate() {
                let value = Self::field_value(record, *field)?;
                if !value.is_finite() {
                    return Err(MlError::FeatureSchema(format!(
                        "district '{}': feature '{}' is not finite",
                        record.district, field
                    )));
                }
                raw[[i, j]] = value;
            }
        }

        let (features, scaler) = if schema.is_standardized() {
            let scaler = StandardScaler::fit(&raw)?;
            (scaler.transform(&raw), Some(scaler))
        } else {
            (raw, None)
        };

        Ok(FeatureMatrix {
            schema,
            district_ids: snapshot.district_ids(),
            features,
            scaler,
        })
    }

    /// Total crime count per district, the regression target
    pub fn crime_target(snapshot: &DatasetSnapshot) -> Array1<f64> {
        snapshot
            .records()
            .iter()
            .map(|r| r.crime_total as f64)
            .collect()
    }

    /// Probe inputs laid out in classification schema order
    pub fn probe_matrix(probes: &[ProbeRecord]) -> MlResult<Array2<f64>> {
        let n_features = FeatureSchema::SafetyClassification.n_features();
        let mut matrix = Array2::<f64>::zeros((probes.len(), n_features));

        for (i, probe) in probes.iter().enumerate() {
            let row = [
                probe.cctv_total,
                probe.facility_total,
                probe.avg_transaction_amount,
                probe.crime_total,
            ];
            if row.iter().any(|v| !v.is_finite()) {
                return Err(MlError::FeatureSchema(format!(
                    "probe {} has a non-finite feature",
                    i
                )));
            }
            matrix.row_mut(i).assign(&Array1::from(row.to_vec()));
        }

        Ok(matrix)
    }

    fn field_value(record: &DistrictRecord, field: DistrictField) -> MlResult<f64> {
        match field {
            DistrictField::CctvTotal => Ok(record.cctv_total as f64),
            DistrictField::FacilityTotal => Ok(record.facility_total as f64),
            DistrictField::AvgTransactionAmount => Ok(record.avg_transaction_amount),
            DistrictField::Population => Ok(record.population as f64),
            DistrictField::LandArea => Ok(record.land_area),
            DistrictField::CrimeTotal => Ok(record.crime_total as f64),
            DistrictField::District => Err(MlError::FeatureSchema(
                "district identifier is not a numeric feature".to_string(),
            )),
        }
    }
}
