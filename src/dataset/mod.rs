use crate::error::{AppError, Result};
use crate::models::{DatasetSnapshot, DistrictRecord};
use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Trait for loading the per-district table
#[async_trait]
pub trait DatasetSource: Send + Sync {
    /// Load a validated snapshot
    async fn load(&self) -> Result<DatasetSnapshot>;

    /// Human-readable origin, used in logs
    fn describe(&self) -> String;
}

/// Reads a JSON array of district objects exported from the dashboard database.
///
/// Each object may use canonical or legacy column names. Extra fields such as
/// `_id` are ignored.
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parse already-read file contents
    pub fn parse(contents: &str) -> Result<Vec<DistrictRecord>> {
        let value: Value = serde_json::from_str(contents)?;
        let rows = match value {
            Value::Array(rows) => rows,
            other => {
                return Err(AppError::Dataset(format!(
                    "expected a JSON array of district rows, got {}",
                    json_kind(&other)
                )))
            }
        };

        rows.iter()
            .enumerate()
            .map(|(idx, row)| match row {
                Value::Object(map) => DistrictRecord::from_row(map).map_err(AppError::from),
                other => Err(AppError::Dataset(format!(
                    "row {} must be an object, got {}",
                    idx,
                    json_kind(other)
                ))),
            })
            .collect()
    }
}

#[async_trait]
impl DatasetSource for JsonFileSource {
    async fn load(&self) -> Result<DatasetSnapshot> {
        debug!(path = %self.path.display(), "Reading dataset file");
        let contents = tokio::fs::read_to_string(&self.path).await?;
        let records = Self::parse(&contents)?;
        let snapshot = DatasetSnapshot::new(records)?;

        info!(
            "Loaded {} districts from {}",
            snapshot.len(),
            self.path.display()
        );
        Ok(snapshot)
    }

    fn describe(&self) -> String {
        format!("json file {}", self.path.display())
    }
}

/// Records held in memory
pub struct InMemorySource {
    records: Vec<DistrictRecord>,
}

impl InMemorySource {
    pub fn new(records: Vec<DistrictRecord>) -> Self {
        Self { records }
    }
}

#[async_trait]
impl DatasetSource for InMemorySource {
    async fn load(&self) -> Result<DatasetSnapshot> {
        Ok(DatasetSnapshot::new(self.records.clone())?)
    }

    fn describe(&self) -> String {
        format!("in-memory ({} rows)", self.records.len())
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const LEGACY_ROWS: &str = r#"[
        {"_id": {"$oid": "65f0"}, "자치구": "강남구", "CCTV_총계": 5221, "치안시설_합계": 24,
         "평균거래금액": "182,650", "전체인구수": 537800, "땅면적": 39.5, "범죄_합계": 7548},
        {"_id": {"$oid": "65f1"}, "자치구": "종로구", "CCTV_총계": 1966, "치안시설_합계": 18,
         "평균거래금액": 98000.5, "전체인구수": 141223, "땅면적": 23.91, "범죄_합계": 2980}
    ]"#;

    #[test]
    fn test_parse_legacy_columns() {
        let records = JsonFileSource::parse(LEGACY_ROWS).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].district, "강남구");
        assert_eq!(records[0].avg_transaction_amount, 182_650.0);
        assert_eq!(records[1].crime_total, 2980);
    }

    #[test]
    fn test_parse_rejects_non_array() {
        let err = JsonFileSource::parse(r#"{"district": "x"}"#).unwrap_err();
        assert_eq!(err.error_code(), "DATASET_ERROR");

        let err = JsonFileSource::parse("[1, 2]").unwrap_err();
        assert_eq!(err.error_code(), "DATASET_ERROR");
    }

    #[test]
    fn test_parse_missing_column() {
        let err = JsonFileSource::parse(r#"[{"district": "x", "cctv_total": 1}]"#).unwrap_err();
        assert_eq!(err.error_code(), "FEATURE_SCHEMA_ERROR");
    }

    #[tokio::test]
    async fn test_json_file_source_load() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(LEGACY_ROWS.as_bytes()).unwrap();

        let source = JsonFileSource::new(file.path());
        let snapshot = source.load().await.unwrap();
        assert_eq!(snapshot.len(), 2);
        assert!(snapshot.get("종로구").is_some());
        assert!(source.describe().starts_with("json file"));
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let source = JsonFileSource::new("/nonexistent/districts.json");
        let err = source.load().await.unwrap_err();
        assert!(matches!(err, AppError::Io(_)));
    }

    #[tokio::test]
    async fn test_in_memory_source_rejects_duplicates() {
        let records = JsonFileSource::parse(LEGACY_ROWS).unwrap();
        let mut duplicated = records.clone();
        duplicated.push(records[0].clone());

        assert_eq!(InMemorySource::new(records).load().await.unwrap().len(), 2);
        let err = InMemorySource::new(duplicated).load().await.unwrap_err();
        assert_eq!(err.error_code(), "DATASET_ERROR");
    }
}
