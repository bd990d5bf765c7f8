//! Flat, named-field tables built from pipeline results

use crate::ml::models::{CrimeForecast, DesignationLabels, SafetyAssessment};
use crate::ml::service::PredictionRun;
use crate::models::DatasetSnapshot;
use crate::report::TabularReport;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// One row of the ranked error table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorTableRow {
    pub district: String,
    pub actual_crime_count: u64,
    pub predicted_crime_count: f64,
    pub absolute_error: f64,
}

/// One row of the probe prediction table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeTableRow {
    pub cctv_total: f64,
    pub facility_total: f64,
    pub avg_transaction_amount: f64,
    pub crime_total: f64,
    pub designation: String,
}

/// Crime regression summary: MAE plus the largest errors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrimeReport {
    pub mae: f64,
    pub n_train: usize,
    pub n_eval: usize,
    pub rows: Vec<ErrorTableRow>,
}

impl CrimeReport {
    pub fn from_forecast(forecast: &CrimeForecast) -> Self {
        let rows = forecast
            .top_errors
            .iter()
            .map(|p| ErrorTableRow {
                district: p.district.clone(),
                actual_crime_count: p.actual_crime_count,
                predicted_crime_count: p.predicted_crime_count,
                absolute_error: p.absolute_error,
            })
            .collect();

        Self {
            mae: forecast.mae,
            n_train: forecast.n_train,
            n_eval: forecast.n_eval,
            rows,
        }
    }
}

impl TabularReport for CrimeReport {
    fn title(&self) -> &str {
        "Crime count prediction"
    }

    fn summary(&self) -> Option<String> {
        Some(format!("Mean absolute error (MAE): {:.2} crimes", self.mae))
    }

    fn headers(&self) -> Vec<&'static str> {
        vec!["district", "actual", "predicted", "absolute error"]
    }

    fn cells(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|r| {
                vec![
                    r.district.clone(),
                    r.actual_crime_count.to_string(),
                    format!("{:.2}", r.predicted_crime_count),
                    format!("{:.2}", r.absolute_error),
                ]
            })
            .collect()
    }
}

/// Safety classification summary: probe designations and held-out accuracy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetyReport {
    pub accuracy: f64,
    pub median_score: f64,
    pub rows: Vec<ProbeTableRow>,
}

impl SafetyReport {
    pub fn from_assessment(assessment: &SafetyAssessment, labels: &DesignationLabels) -> Self {
        let rows = assessment
            .probes
            .iter()
            .map(|p| ProbeTableRow {
                cctv_total: p.probe.cctv_total,
                facility_total: p.probe.facility_total,
                avg_transaction_amount: p.probe.avg_transaction_amount,
                crime_total: p.probe.crime_total,
                designation: labels.designation(p.label).to_string(),
            })
            .collect();

        Self {
            accuracy: assessment.accuracy,
            median_score: assessment.median_score,
            rows,
        }
    }
}

impl TabularReport for SafetyReport {
    fn title(&self) -> &str {
        "Safe residence recommendation"
    }

    fn summary(&self) -> Option<String> {
        Some(format!("Held-out accuracy: {:.2}%", self.accuracy * 100.0))
    }

    fn headers(&self) -> Vec<&'static str> {
        vec!["cctv", "facilities", "avg transaction", "crimes", "designation"]
    }

    fn cells(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|r| {
                vec![
                    format_number(r.cctv_total),
                    format_number(r.facility_total),
                    format_number(r.avg_transaction_amount),
                    format_number(r.crime_total),
                    r.designation.clone(),
                ]
            })
            .collect()
    }
}

/// Snapshot row joined with both overlays
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistrictRow {
    pub district: String,
    pub cctv_total: u64,
    pub facility_total: u64,
    pub avg_transaction_amount: f64,
    pub population: u64,
    pub land_area: f64,
    pub crime_total: u64,
    pub predicted_crime_count: Option<f64>,
    pub absolute_error: Option<f64>,
    pub safety_score: Option<f64>,
    pub designation: Option<String>,
}

/// Join snapshot rows with the overlays, keeping snapshot order.
///
/// Overlays are matched by district name; a district missing from an overlay keeps
/// `None` in those columns.
pub fn compose_district_rows(
    snapshot: &DatasetSnapshot,
    forecast: &CrimeForecast,
    assessment: &SafetyAssessment,
    labels: &DesignationLabels,
) -> Vec<DistrictRow> {
    let predictions: HashMap<&str, _> = forecast
        .predictions
        .iter()
        .map(|p| (p.district.as_str(), p))
        .collect();
    let safety: HashMap<&str, _> = assessment
        .districts
        .iter()
        .map(|d| (d.district.as_str(), d))
        .collect();

    snapshot
        .records()
        .iter()
        .map(|record| {
            let prediction = predictions.get(record.district.as_str());
            let score = safety.get(record.district.as_str());
            DistrictRow {
                district: record.district.clone(),
                cctv_total: record.cctv_total,
                facility_total: record.facility_total,
                avg_transaction_amount: record.avg_transaction_amount,
                population: record.population,
                land_area: record.land_area,
                crime_total: record.crime_total,
                predicted_crime_count: prediction.map(|p| p.predicted_crime_count),
                absolute_error: prediction.map(|p| p.absolute_error),
                safety_score: score.map(|s| s.safety_score),
                designation: score.map(|s| labels.designation(s.label).to_string()),
            }
        })
        .collect()
}

/// District table ready for rendering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistrictTable {
    pub rows: Vec<DistrictRow>,
}

impl TabularReport for DistrictTable {
    fn title(&self) -> &str {
        "Districts"
    }

    fn headers(&self) -> Vec<&'static str> {
        vec![
            "district",
            "cctv",
            "facilities",
            "avg transaction",
            "population",
            "land area",
            "crimes",
            "predicted",
            "safety score",
            "designation",
        ]
    }

    fn cells(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|r| {
                vec![
                    r.district.clone(),
                    r.cctv_total.to_string(),
                    r.facility_total.to_string(),
                    format_number(r.avg_transaction_amount),
                    r.population.to_string(),
                    format!("{:.2}", r.land_area),
                    r.crime_total.to_string(),
                    optional(r.predicted_crime_count, 2),
                    optional(r.safety_score, 4),
                    r.designation.clone().unwrap_or_else(|| "-".to_string()),
                ]
            })
            .collect()
    }
}

/// Both reports of one dashboard refresh
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionReport {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub crime: CrimeReport,
    pub safety: SafetyReport,
}

impl PredictionReport {
    pub fn from_run(run: &PredictionRun, labels: &DesignationLabels) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            crime: CrimeReport::from_forecast(&run.crime),
            safety: SafetyReport::from_assessment(&run.safety, labels),
        }
    }

    pub fn to_html(&self) -> String {
        format!("{}\n{}", self.crime.to_html(), self.safety.to_html())
    }

    pub fn to_text(&self) -> String {
        format!(
            "Run {} at {}\n\n{}\n{}",
            self.run_id,
            self.generated_at.to_rfc3339(),
            self.crime.to_text(),
            self.safety.to_text()
        )
    }
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{:.2}", value)
    }
}

fn optional(value: Option<f64>, precision: usize) -> String {
    value
        .map(|v| format!("{:.*}", precision, v))
        .unwrap_or_else(|| "-".to_string())
}
