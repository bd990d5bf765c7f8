//! Held-out evaluation metrics

use crate::ml::error::{MlError, MlResult};

/// Mean absolute error between two equally sized series.
///
/// A non-finite result is a training failure, never a reportable score.
pub fn mean_absolute_error(actual: &[f64], predicted: &[f64]) -> MlResult<f64> {
    if actual.len() != predicted.len() {
        return Err(MlError::ModelTraining(format!(
            "prediction count {} does not match target count {}",
            predicted.len(),
            actual.len()
        )));
    }
    if actual.is_empty() {
        return Err(MlError::InsufficientData(
            "cannot score an empty evaluation set".to_string(),
        ));
    }

    let mae = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).abs())
        .sum::<f64>()
        / actual.len() as f64;

    if !mae.is_finite() {
        return Err(MlError::ModelTraining(format!(
            "mean absolute error is not finite ({})",
            mae
        )));
    }
    Ok(mae)
}

/// Fraction of labels predicted correctly
pub fn accuracy<T: PartialEq>(actual: &[T], predicted: &[T]) -> MlResult<f64> {
    if actual.len() != predicted.len() {
        return Err(MlError::ModelTraining(format!(
            "prediction count {} does not match label count {}",
            predicted.len(),
            actual.len()
        )));
    }
    if actual.is_empty() {
        return Err(MlError::InsufficientData(
            "cannot score an empty evaluation set".to_string(),
        ));
    }

    let correct = actual
        .iter()
        .zip(predicted)
        .filter(|(a, p)| a == p)
        .count();
    Ok(correct as f64 / actual.len() as f64)
}

/// Median with the two middle values averaged for even counts
pub fn median(values: &[f64]) -> MlResult<f64> {
    if values.is_empty() {
        return Err(MlError::InsufficientData(
            "median of an empty series".to_string(),
        ));
    }
    if values.iter().any(|v| !v.is_finite()) {
        return Err(MlError::FeatureSchema(
            "median input contains a non-finite value".to_string(),
        ));
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let n = sorted.len();
    Ok(if n % 2 == 0 {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    } else {
        sorted[n / 2]
    })
}

/// Reject any non-finite model output
pub fn ensure_finite(values: &[f64], context: &str) -> MlResult<()> {
    match values.iter().position(|v| !v.is_finite()) {
        Some(idx) => Err(MlError::ModelTraining(format!(
            "{} produced a non-finite value at row {} ({})",
            context, idx, values[idx]
        ))),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_absolute_error() {
        let mae = mean_absolute_error(&[1.0, 2.0, 3.0], &[2.0, 2.0, 1.0]).unwrap();
        assert!((mae - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_mae_rejects_nan() {
        let err = mean_absolute_error(&[1.0, 2.0], &[f64::NAN, 2.0]).unwrap_err();
        assert!(matches!(err, MlError::ModelTraining(_)));
    }

    #[test]
    fn test_mae_length_mismatch() {
        assert!(mean_absolute_error(&[1.0], &[1.0, 2.0]).is_err());
    }

    #[test]
    fn test_accuracy() {
        let acc = accuracy(&[1, 0, 1, 1], &[1, 1, 1, 0]).unwrap();
        assert_eq!(acc, 0.5);
        assert_eq!(accuracy(&[0, 0], &[0, 0]).unwrap(), 1.0);
        assert!(accuracy::<i32>(&[], &[]).is_err());
    }

    #[test]
    fn test_median() {
        assert_eq!(median(&[3.0, 1.0, 2.0]).unwrap(), 2.0);
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]).unwrap(), 2.5);
        assert!(median(&[]).is_err());
    }

    #[test]
    fn test_ensure_finite() {
        assert!(ensure_finite(&[1.0, 2.0], "booster").is_ok());
        let err = ensure_finite(&[1.0, f64::INFINITY], "booster").unwrap_err();
        assert!(matches!(err, MlError::ModelTraining(ref msg) if msg.contains("row 1")));
    }
}
