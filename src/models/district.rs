use crate::ml::error::{MlError, MlResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Columns of the merged per-district table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DistrictField {
    District,
    CctvTotal,
    FacilityTotal,
    AvgTransactionAmount,
    Population,
    LandArea,
    CrimeTotal,
}

impl DistrictField {
    pub const ALL: [DistrictField; 7] = [
        DistrictField::District,
        DistrictField::CctvTotal,
        DistrictField::FacilityTotal,
        DistrictField::AvgTransactionAmount,
        DistrictField::Population,
        DistrictField::LandArea,
        DistrictField::CrimeTotal,
    ];

    /// Canonical column name
    pub fn key(&self) -> &'static str {
        match self {
            DistrictField::District => "district",
            DistrictField::CctvTotal => "cctv_total",
            DistrictField::FacilityTotal => "facility_total",
            DistrictField::AvgTransactionAmount => "avg_transaction_amount",
            DistrictField::Population => "population",
            DistrictField::LandArea => "land_area",
            DistrictField::CrimeTotal => "crime_total",
        }
    }

    /// Column name used by the dashboard database export
    pub fn legacy_key(&self) -> &'static str {
        match self {
            DistrictField::District => "자치구",
            DistrictField::CctvTotal => "CCTV_총계",
            DistrictField::FacilityTotal => "치안시설_합계",
            DistrictField::AvgTransactionAmount => "평균거래금액",
            DistrictField::Population => "전체인구수",
            DistrictField::LandArea => "땅면적",
            DistrictField::CrimeTotal => "범죄_합계",
        }
    }

    fn lookup<'a>(&self, row: &'a Map<String, Value>) -> Option<&'a Value> {
        row.get(self.key())
            .or_else(|| row.get(self.legacy_key()))
            .filter(|v| !v.is_null())
    }
}

impl fmt::Display for DistrictField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// One row per administrative district
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistrictRecord {
    pub district: String,
    pub cctv_total: u64,
    pub facility_total: u64,
    pub avg_transaction_amount: f64,
    pub population: u64,
    pub land_area: f64,
    pub crime_total: u64,
}

impl DistrictRecord {
    /// Build a record from a loosely typed row.
    ///
    /// Both canonical and legacy column names are accepted. Numbers may arrive as JSON
    /// numbers or numeric strings; anything else is a `FeatureSchema` error.
    pub fn from_row(row: &Map<String, Value>) -> MlResult<Self> {
        let district = match DistrictField::District.lookup(row) {
            Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
            Some(other) => {
                return Err(MlError::FeatureSchema(format!(
                    "column '{}' must be a non-empty string, got {}",
                    DistrictField::District,
                    other
                )))
            }
            None => {
                return Err(MlError::FeatureSchema(format!(
                    "missing column '{}'",
                    DistrictField::District
                )))
            }
        };

        Ok(Self {
            cctv_total: count_field(row, DistrictField::CctvTotal, &district)?,
            facility_total: count_field(row, DistrictField::FacilityTotal, &district)?,
            avg_transaction_amount: numeric_field(
                row,
                DistrictField::AvgTransactionAmount,
                &district,
            )?,
            population: count_field(row, DistrictField::Population, &district)?,
            land_area: numeric_field(row, DistrictField::LandArea, &district)?,
            crime_total: count_field(row, DistrictField::CrimeTotal, &district)?,
            district,
        })
    }

    /// CCTV coverage relative to crime volume
    pub fn safety_score(&self) -> f64 {
        self.cctv_total as f64 / (self.crime_total as f64 + 1.0)
    }

    /// Check the value constraints of a single record
    pub fn validate(&self) -> MlResult<()> {
        if !self.avg_transaction_amount.is_finite() || self.avg_transaction_amount < 0.0 {
            return Err(MlError::InvalidSnapshot(format!(
                "district '{}': average transaction amount must be a non-negative number, got {}",
                self.district, self.avg_transaction_amount
            )));
        }
        if !self.land_area.is_finite() || self.land_area <= 0.0 {
            return Err(MlError::InvalidSnapshot(format!(
                "district '{}': land area must be positive, got {}",
                self.district, self.land_area
            )));
        }
        Ok(())
    }
}

fn numeric_field(row: &Map<String, Value>, field: DistrictField, district: &str) -> MlResult<f64> {
    let value = field.lookup(row).ok_or_else(|| {
        MlError::FeatureSchema(format!("district '{}': missing column '{}'", district, field))
    })?;

    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', "").parse::<f64>().ok(),
        _ => None,
    };

    match parsed {
        Some(v) if v.is_finite() => Ok(v),
        _ => Err(MlError::FeatureSchema(format!(
            "district '{}': column '{}' is not numeric ({})",
            district, field, value
        ))),
    }
}

fn count_field(row: &Map<String, Value>, field: DistrictField, district: &str) -> MlResult<u64> {
    let value = numeric_field(row, field, district)?;
    if value < 0.0 || value.fract() != 0.0 {
        return Err(MlError::InvalidSnapshot(format!(
            "district '{}': column '{}' must be a non-negative integer, got {}",
            district, field, value
        )));
    }
    Ok(value as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_from_row_canonical_columns() {
        let record = DistrictRecord::from_row(&row(json!({
            "district": "Jongno-gu",
            "cctv_total": 1966,
            "facility_total": 21,
            "avg_transaction_amount": 91234.5,
            "population": 141223,
            "land_area": 23.91,
            "crime_total": 3825
        })))
        .unwrap();

        assert_eq!(record.district, "Jongno-gu");
        assert_eq!(record.cctv_total, 1966);
        assert_eq!(record.crime_total, 3825);
        assert!((record.land_area - 23.91).abs() < 1e-12);
    }

    #[test]
    fn test_from_row_legacy_columns() {
        let record = DistrictRecord::from_row(&row(json!({
            "_id": "65f0c0ffee",
            "자치구": "종로구",
            "CCTV_총계": 1966.0,
            "치안시설_합계": "21",
            "평균거래금액": "91,234",
            "전체인구수": 141223,
            "땅면적": 23.91,
            "범죄_합계": 3825
        })))
        .unwrap();

        assert_eq!(record.district, "종로구");
        assert_eq!(record.cctv_total, 1966);
        assert_eq!(record.facility_total, 21);
        assert_eq!(record.avg_transaction_amount, 91234.0);
    }

    #[test]
    fn test_missing_column_is_schema_error() {
        let err = DistrictRecord::from_row(&row(json!({
            "district": "Jung-gu",
            "cctv_total": 10,
            "facility_total": 1,
            "avg_transaction_amount": 1.0,
            "population": 5,
            "land_area": 1.0
        })))
        .unwrap_err();

        assert!(matches!(err, MlError::FeatureSchema(ref msg) if msg.contains("crime_total")));
    }

    #[test]
    fn test_non_numeric_column_is_schema_error() {
        let err = DistrictRecord::from_row(&row(json!({
            "district": "Jung-gu",
            "cctv_total": "many",
            "facility_total": 1,
            "avg_transaction_amount": 1.0,
            "population": 5,
            "land_area": 1.0,
            "crime_total": 3
        })))
        .unwrap_err();

        assert!(matches!(err, MlError::FeatureSchema(_)));
    }

    #[test]
    fn test_negative_count_rejected() {
        let err = DistrictRecord::from_row(&row(json!({
            "district": "Jung-gu",
            "cctv_total": -4,
            "facility_total": 1,
            "avg_transaction_amount": 1.0,
            "population": 5,
            "land_area": 1.0,
            "crime_total": 3
        })))
        .unwrap_err();

        assert!(matches!(err, MlError::InvalidSnapshot(_)));
    }

    #[test]
    fn test_safety_score() {
        let record = DistrictRecord {
            district: "A".to_string(),
            cctv_total: 1000,
            facility_total: 3,
            avg_transaction_amount: 1.0,
            population: 1,
            land_area: 1.0,
            crime_total: 499,
        };
        assert_eq!(record.safety_score(), 2.0);
    }

    #[test]
    fn test_validate_land_area() {
        let record = DistrictRecord {
            district: "A".to_string(),
            cctv_total: 1,
            facility_total: 1,
            avg_transaction_amount: 1.0,
            population: 1,
            land_area: 0.0,
            crime_total: 1,
        };
        assert!(matches!(record.validate(), Err(MlError::InvalidSnapshot(_))));
    }
}
