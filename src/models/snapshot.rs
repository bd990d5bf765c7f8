use crate::ml::error::{MlError, MlResult};
use crate::models::DistrictRecord;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::Arc;

/// Immutable per-district table shared by every pipeline invocation.
///
/// Cloning is cheap; the records sit behind an `Arc` and are never mutated after
/// construction. Derived columns live in overlays returned by the pipelines.
#[derive(Debug, Clone)]
pub struct DatasetSnapshot {
    records: Arc<[DistrictRecord]>,
    loaded_at: DateTime<Utc>,
}

impl DatasetSnapshot {
    /// Create a snapshot, enforcing one valid record per district
    pub fn new(records: Vec<DistrictRecord>) -> MlResult<Self> {
        let mut seen = HashSet::with_capacity(records.len());
        for record in &records {
            record.validate()?;
            if !seen.insert(record.district.as_str()) {
                return Err(MlError::InvalidSnapshot(format!(
                    "duplicate district '{}'",
                    record.district
                )));
            }
        }

        Ok(Self {
            records: records.into(),
            loaded_at: Utc::now(),
        })
    }

    pub fn records(&self) -> &[DistrictRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Look up a district by identifier
    pub fn get(&self, district: &str) -> Option<&DistrictRecord> {
        self.records.iter().find(|r| r.district == district)
    }

    pub fn district_ids(&self) -> Vec<String> {
        self.records.iter().map(|r| r.district.clone()).collect()
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, cctv: u64, crime: u64) -> DistrictRecord {
        DistrictRecord {
            district: name.to_string(),
            cctv_total: cctv,
            facility_total: 10,
            avg_transaction_amount: 50_000.0,
            population: 100_000,
            land_area: 20.0,
            crime_total: crime,
        }
    }

    #[test]
    fn test_snapshot_creation() {
        let snapshot =
            DatasetSnapshot::new(vec![record("A", 100, 10), record("B", 200, 20)]).unwrap();

        assert_eq!(snapshot.len(), 2);
        assert!(!snapshot.is_empty());
        assert_eq!(snapshot.get("B").unwrap().cctv_total, 200);
        assert!(snapshot.get("C").is_none());
        assert_eq!(snapshot.district_ids(), vec!["A", "B"]);
    }

    #[test]
    fn test_duplicate_district_rejected() {
        let err = DatasetSnapshot::new(vec![record("A", 100, 10), record("A", 200, 20)])
            .unwrap_err();
        assert!(matches!(err, MlError::InvalidSnapshot(ref msg) if msg.contains("duplicate")));
    }

    #[test]
    fn test_clone_shares_records() {
        let snapshot = DatasetSnapshot::new(vec![record("A", 100, 10)]).unwrap();
        let copy = snapshot.clone();
        assert!(std::ptr::eq(snapshot.records(), copy.records()));
    }
}
