//! Shared fixtures for integration tests
//!
//! A 25-district table shaped like the Seoul dataset, plus helpers for the
//! Prometheus exposition format.

#![allow(dead_code)]

use district_safety_analytics::{
    ml::{MlConfig, RegressorConfig},
    models::{DatasetSnapshot, DistrictRecord},
};
use serde_json::{json, Value};
use std::collections::HashMap;

/// (district, cctv, facilities, avg transaction, population, land area, crimes)
const SEOUL: [(&str, u64, u64, f64, u64, f64, u64); 25] = [
    ("Gangnam-gu", 5221, 24, 182650.0, 537800, 39.50, 7548),
    ("Gangdong-gu", 1879, 14, 93410.0, 463998, 24.59, 4302),
    ("Gangbuk-gu", 1265, 12, 58220.0, 296506, 23.60, 3013),
    ("Gangseo-gu", 1617, 17, 67480.0, 571829, 41.44, 4992),
    ("Gwanak-gu", 3985, 15, 63624.0, 495060, 29.57, 5301),
    ("Gwangjin-gu", 1581, 11, 99870.0, 345186, 17.06, 3846),
    ("Guro-gu", 3227, 14, 61890.0, 403393, 20.12, 4378),
    ("Geumcheon-gu", 1634, 9, 55010.0, 233886, 13.02, 2698),
    ("Nowon-gu", 1906, 16, 52980.0, 523037, 35.44, 3705),
    ("Dobong-gu", 825, 10, 48330.0, 318209, 20.67, 2098),
    ("Dongdaemun-gu", 1870, 13, 71260.0, 348052, 14.22, 3758),
    ("Dongjak-gu", 1302, 12, 88450.0, 389827, 16.35, 3149),
    ("Mapo-gu", 980, 15, 104300.0, 374035, 23.85, 5125),
    ("Seodaemun-gu", 1254, 11, 77020.0, 310885, 17.63, 2896),
    ("Seocho-gu", 2297, 16, 171880.0, 423406, 46.98, 4821),
    ("Seongdong-gu", 1327, 12, 115390.0, 299556, 16.86, 3201),
    ("Seongbuk-gu", 2111, 14, 66730.0, 442650, 24.58, 3602),
    ("Songpa-gu", 1081, 19, 132540.0, 658801, 33.87, 6236),
    ("Yangcheon-gu", 2482, 13, 96120.0, 462465, 17.41, 3447),
    ("Yeongdeungpo-gu", 1277, 15, 84670.0, 389480, 24.55, 6001),
    ("Yongsan-gu", 1624, 12, 138200.0, 244956, 21.87, 4033),
    ("Eunpyeong-gu", 1873, 13, 57640.0, 491202, 29.71, 3586),
    ("Jongno-gu", 1619, 18, 98000.5, 141223, 23.91, 3826),
    ("Jung-gu", 1023, 13, 92150.0, 125709, 9.96, 4229),
    ("Jungnang-gu", 916, 11, 51270.0, 412780, 18.50, 3731),
];

pub fn seoul_records() -> Vec<DistrictRecord> {
    SEOUL
        .iter()
        .map(
            |&(district, cctv, facilities, price, population, area, crimes)| DistrictRecord {
                district: district.to_string(),
                cctv_total: cctv,
                facility_total: facilities,
                avg_transaction_amount: price,
                population,
                land_area: area,
                crime_total: crimes,
            },
        )
        .collect()
}

pub fn seoul_snapshot() -> DatasetSnapshot {
    DatasetSnapshot::new(seoul_records()).expect("fixture is valid")
}

/// Rows as exported from the dashboard database, legacy column names included
pub fn seoul_legacy_json() -> Value {
    Value::Array(
        SEOUL
            .iter()
            .enumerate()
            .map(|(i, &(district, cctv, facilities, price, population, area, crimes))| {
                json!({
                    "_id": format!("65f0{:04x}", i),
                    "자치구": district,
                    "CCTV_총계": cctv,
                    "치안시설_합계": facilities,
                    "평균거래금액": price,
                    "전체인구수": population,
                    "땅면적": area,
                    "범죄_합계": crimes,
                })
            })
            .collect(),
    )
}

/// Default settings with a smaller booster so tests stay quick
pub fn fast_config() -> MlConfig {
    MlConfig {
        regressor: RegressorConfig {
            n_trees: 80,
            learning_rate: 0.1,
            ..RegressorConfig::default()
        },
        ..MlConfig::default()
    }
}

/// Parse Prometheus exposition format into metric name -> lines
pub fn parse_prometheus_output(output: &str) -> HashMap<String, Vec<String>> {
    let mut metrics = HashMap::new();
    let mut current_metric = String::new();

    for line in output.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if line.starts_with("# HELP") || line.starts_with("# TYPE") {
            if let Some(name) = line.split_whitespace().nth(2) {
                current_metric = name.to_string();
                metrics
                    .entry(current_metric.clone())
                    .or_insert_with(Vec::new)
                    .push(line.to_string());
            }
        } else if !line.starts_with('#') && !current_metric.is_empty() {
            metrics
                .entry(current_metric.clone())
                .or_insert_with(Vec::new)
                .push(line.to_string());
        }
    }

    metrics
}
