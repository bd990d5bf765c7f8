/// Integration tests for the prediction pipelines
///
/// These tests run both pipelines end to end over a Seoul-shaped snapshot:
/// - Split sizes and determinism under a fixed seed
/// - Ranked error table ordering and length
/// - Median-threshold labeling
/// - Probe classification with configured designations
/// - Loading from a legacy-format JSON export
mod common;

use common::{fast_config, seoul_legacy_json, seoul_records, seoul_snapshot};
use district_safety_analytics::{
    dataset::{DatasetSource, InMemorySource, JsonFileSource},
    ml::{
        evaluation::median, DesignationLabels, MlError, PredictionService, ProbeRecord,
        SafetyLabel,
    },
    models::DatasetSnapshot,
    report::{CrimeReport, PredictionReport, SafetyReport, TabularReport},
};
use std::io::Write;

fn service() -> PredictionService {
    PredictionService::new(fast_config()).unwrap()
}

#[test]
fn test_crime_forecast_on_seoul() {
    let snapshot = seoul_snapshot();
    let forecast = service().forecast_crime(&snapshot).unwrap();

    assert_eq!(forecast.n_train, 20);
    assert_eq!(forecast.n_eval, 5);
    assert!(forecast.mae.is_finite());
    assert!(forecast.mae >= 0.0);
    assert_eq!(forecast.predictions.len(), 25);
    assert_eq!(forecast.top_errors.len(), 15);
    assert!(forecast
        .top_errors
        .windows(2)
        .all(|w| w[0].absolute_error >= w[1].absolute_error));

    // Every ranked row is one of the snapshot's districts
    for row in &forecast.top_errors {
        assert!(snapshot.get(&row.district).is_some());
    }
}

#[test]
fn test_pipelines_are_deterministic() {
    let snapshot = seoul_snapshot();
    let first = service().run_all(&snapshot).unwrap();
    let second = service().run_all(&snapshot).unwrap();

    assert_eq!(first.crime.mae.to_bits(), second.crime.mae.to_bits());
    assert_eq!(first.crime.predictions, second.crime.predictions);
    assert_eq!(first.safety.accuracy.to_bits(), second.safety.accuracy.to_bits());
    assert_eq!(first.safety.probes, second.safety.probes);
}

#[test]
fn test_repeat_runs_leave_snapshot_untouched() {
    let snapshot = seoul_snapshot();
    let before = snapshot.records().to_vec();

    let service = service();
    let a = service.run_all(&snapshot).unwrap();
    let b = service.run_all(&snapshot).unwrap();

    assert_eq!(snapshot.records(), before.as_slice());
    assert_eq!(a, b);
}

#[test]
fn test_safety_labels_follow_median() {
    let snapshot = seoul_snapshot();
    let assessment = service().assess_safety(&snapshot).unwrap();

    let scores: Vec<f64> = snapshot.records().iter().map(|r| r.safety_score()).collect();
    assert_eq!(assessment.median_score, median(&scores).unwrap());

    for (district, record) in assessment.districts.iter().zip(snapshot.records()) {
        assert_eq!(district.district, record.district);
        assert_eq!(district.safety_score, record.safety_score());
        assert_eq!(
            district.label == SafetyLabel::Safe,
            record.safety_score() > assessment.median_score
        );
    }

    // 25 districts with distinct scores: 12 above the median
    let safe = assessment
        .districts
        .iter()
        .filter(|d| d.label == SafetyLabel::Safe)
        .count();
    assert_eq!(safe, 12);
    assert!((0.0..=1.0).contains(&assessment.accuracy));
}

#[test]
fn test_probe_scenario() {
    let snapshot = seoul_snapshot();
    let service = service();
    let assessment = service.assess_safety(&snapshot).unwrap();

    let expected_probes = vec![
        ProbeRecord::new(5000.0, 10.0, 80000.0, 3000.0),
        ProbeRecord::new(8000.0, 20.0, 150000.0, 1000.0),
        ProbeRecord::new(6000.0, 18.0, 70000.0, 300.0),
        ProbeRecord::new(4500.0, 22.0, 90000.0, 600.0),
        ProbeRecord::new(4900.0, 15.0, 63624.0, 2400.0),
    ];
    let probes: Vec<ProbeRecord> = assessment.probes.iter().map(|p| p.probe).collect();
    assert_eq!(probes, expected_probes);

    let labels = DesignationLabels {
        safe: "안전".to_string(),
        unsafe_: "위험".to_string(),
    };
    let report = SafetyReport::from_assessment(&assessment, &labels);
    assert_eq!(report.rows.len(), 5);
    assert!(report
        .rows
        .iter()
        .all(|r| r.designation == "안전" || r.designation == "위험"));
}

#[test]
fn test_degenerate_labels_do_not_fail() {
    // Identical districts share one score, so every label is unsafe
    let records = (0..10)
        .map(|i| {
            let mut record = seoul_records()[0].clone();
            record.district = format!("clone-{}", i);
            record
        })
        .collect();
    let snapshot = DatasetSnapshot::new(records).unwrap();

    let assessment = service().assess_safety(&snapshot).unwrap();
    assert_eq!(assessment.accuracy, 1.0);
    assert!(assessment
        .probes
        .iter()
        .all(|p| p.label == SafetyLabel::Unsafe));
}

#[test]
fn test_two_district_snapshot() {
    let snapshot = DatasetSnapshot::new(seoul_records().into_iter().take(2).collect()).unwrap();
    let run = service().run_all(&snapshot).unwrap();

    assert_eq!(run.crime.n_train, 1);
    assert_eq!(run.crime.n_eval, 1);
    assert_eq!(run.crime.top_errors.len(), 2);
    assert_eq!(run.safety.n_train + run.safety.n_eval, 2);
}

#[test]
fn test_single_district_is_insufficient() {
    let snapshot = DatasetSnapshot::new(seoul_records().into_iter().take(1).collect()).unwrap();
    let service = service();

    assert!(matches!(
        service.forecast_crime(&snapshot),
        Err(MlError::InsufficientData(_))
    ));
    assert!(matches!(
        service.assess_safety(&snapshot),
        Err(MlError::InsufficientData(_))
    ));
}

#[test]
fn test_custom_seed_is_deterministic() {
    let snapshot = seoul_snapshot();
    let a = PredictionService::new(fast_config().with_seed(1))
        .unwrap()
        .forecast_crime(&snapshot)
        .unwrap();
    let b = PredictionService::new(fast_config().with_seed(1))
        .unwrap()
        .forecast_crime(&snapshot)
        .unwrap();

    assert_eq!(a.mae.to_bits(), b.mae.to_bits());
    assert_eq!(a.n_eval, 5);
}

#[tokio::test]
async fn test_json_export_through_pipelines() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    let body = serde_json::to_string_pretty(&seoul_legacy_json()).unwrap();
    file.write_all(body.as_bytes()).unwrap();

    let from_file = JsonFileSource::new(file.path()).load().await.unwrap();
    let in_memory = InMemorySource::new(seoul_records()).load().await.unwrap();
    assert_eq!(from_file.records(), in_memory.records());

    let service = service();
    let file_run = service.run_all(&from_file).unwrap();
    let memory_run = service.run_all(&in_memory).unwrap();
    assert_eq!(file_run, memory_run);
}

#[test]
fn test_reports_render() {
    let snapshot = seoul_snapshot();
    let service = service();
    let run = service.run_all(&snapshot).unwrap();

    let crime = CrimeReport::from_forecast(&run.crime);
    let html = crime.to_html();
    assert!(html.contains(&format!("{:.2}", run.crime.mae)));
    assert_eq!(html.matches("<tr>").count(), 15);

    let report = PredictionReport::from_run(&run, &service.config().designations);
    assert!(report.to_text().contains("Crime count prediction"));
    assert_eq!(report.safety.rows.len(), 5);
}
