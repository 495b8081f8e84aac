//! In-memory repair record store shared by the HTTP server and the host loop.
//!
//! One `RwLock` guards the whole keyed map. Every mutation that checks and then
//! writes (add, update) does both under a single write guard, so racing
//! requests for the same plate resolve to exactly one winner.
//!
//! Operations never fail: absence and conflict come back as `bool`/`Option`.
//! Records cross the boundary by value only.

use indexmap::IndexMap;
use log::{info, warn};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::repair::{RepairRecord, RepairStatus, normalize_plate};

#[derive(Debug, Default)]
pub struct RepairRepository {
    records: RwLock<IndexMap<String, RepairRecord>>,
}

impl RepairRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Repository pre-filled with records (duplicates and blank plates skipped).
    pub fn with_records(records: impl IntoIterator<Item = RepairRecord>) -> Self {
        let repo = Self::new();
        for record in records {
            repo.add(record);
        }
        repo
    }

    /// Insert if the plate is non-blank and not present. Never overwrites.
    pub fn add(&self, mut record: RepairRecord) -> bool {
        let key = normalize_plate(&record.license_plate);
        if key.is_empty() {
            warn!("Rejected repair record with blank license plate");
            return false;
        }

        let mut records = self.write();
        if records.contains_key(&key) {
            warn!("Repair record already exists: {}", key);
            return false;
        }
        record.license_plate = key.clone();
        info!("Added repair record: {} {} ({})", key, record.car_model, record.status);
        records.insert(key, record);
        true
    }

    /// Snapshot of every record.
    pub fn get_all(&self) -> Vec<RepairRecord> {
        self.read().values().cloned().collect()
    }

    pub fn get_by_key(&self, plate: &str) -> Option<RepairRecord> {
        self.read().get(&normalize_plate(plate)).cloned()
    }

    /// Full replace under the path plate, which wins over whatever plate the
    /// record carries. The stored request stamp survives when the replacement
    /// has none.
    pub fn update(&self, plate: &str, record: RepairRecord) -> bool {
        self.replace(plate, record).is_some()
    }

    /// [`update`](Self::update) returning the record as stored.
    pub fn replace(&self, plate: &str, mut record: RepairRecord) -> Option<RepairRecord> {
        let key = normalize_plate(plate);
        let mut records = self.write();
        let existing = records.get_mut(&key)?;
        record.license_plate = key.clone();
        if record.requested_at.is_none() {
            record.requested_at = existing.requested_at;
        }
        *existing = record;
        info!("Updated repair record: {} ({})", key, existing.status);
        Some(existing.clone())
    }

    /// Partial update from the local UI: only the given fields change.
    pub fn update_status(
        &self,
        plate: &str,
        status: Option<RepairStatus>,
        estimated_finish_at: Option<u32>,
    ) -> bool {
        let key = normalize_plate(plate);
        let mut records = self.write();
        let Some(existing) = records.get_mut(&key) else {
            return false;
        };
        if let Some(status) = status {
            existing.status = status;
        }
        if estimated_finish_at.is_some() {
            existing.estimated_finish_at = estimated_finish_at;
        }
        info!("Updated repair status: {} -> {}", key, existing.status);
        true
    }

    pub fn delete(&self, plate: &str) -> bool {
        let key = normalize_plate(plate);
        let removed = self.write().shift_remove(&key).is_some();
        if removed {
            info!("Removed repair record: {}", key);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn clear(&self) {
        self.write().clear();
    }

    // Poisoning only means another thread panicked mid-operation; the map
    // itself is always left in a consistent state.
    fn read(&self) -> RwLockReadGuard<'_, IndexMap<String, RepairRecord>> {
        self.records.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, IndexMap<String, RepairRecord>> {
        self.records.write().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::{Arc, Barrier};
    use std::thread;

    fn rec(plate: &str, model: &str) -> RepairRecord {
        RepairRecord::new(plate, model, RepairStatus::InProgress)
    }

    #[test]
    fn test_add_twice_keeps_first() {
        let repo = RepairRepository::new();
        assert!(repo.add(rec("12가3456", "Sonata")));
        assert!(!repo.add(rec("12가3456", "Avante")));

        assert_eq!(repo.len(), 1);
        assert_eq!(repo.get_by_key("12가3456").unwrap().car_model, "Sonata");
    }

    #[test]
    fn test_add_rejects_blank_plate() {
        let repo = RepairRepository::new();
        assert!(!repo.add(rec("", "Sonata")));
        assert!(!repo.add(rec("   ", "Sonata")));
        assert!(repo.is_empty());
    }

    #[test]
    fn test_keys_normalized_uniformly() {
        let repo = RepairRepository::new();
        assert!(repo.add(rec(" ab-12 ", "K3")));
        assert!(!repo.add(rec("AB-12", "K5")));

        let stored = repo.get_by_key("ab-12").unwrap();
        assert_eq!(stored.license_plate, "AB-12");
        assert!(repo.update("Ab-12", rec("whatever", "K7")));
        assert!(repo.delete(" AB-12"));
        assert!(repo.is_empty());
    }

    #[test]
    fn test_update_uses_path_plate() {
        let repo = RepairRepository::new();
        repo.add(rec("11가1111", "Morning"));

        let body = RepairRecord::new("99하9999", "Ray", RepairStatus::Completed);
        assert!(repo.update("11가1111", body));

        assert!(repo.get_by_key("99하9999").is_none());
        let stored = repo.get_by_key("11가1111").unwrap();
        assert_eq!(stored.license_plate, "11가1111");
        assert_eq!(stored.car_model, "Ray");
        assert_eq!(stored.status, RepairStatus::Completed);
    }

    #[test]
    fn test_update_missing_is_false() {
        let repo = RepairRepository::new();
        assert!(!repo.update("nope", rec("nope", "x")));
        assert!(repo.is_empty());
    }

    #[test]
    fn test_update_carries_request_stamp() {
        let repo = RepairRepository::new();
        repo.add(rec("A1", "Spark").with_requested_at(Some(3600)));

        repo.update("A1", rec("A1", "Spark").with_estimated_finish_at(Some(600)));
        let stored = repo.get_by_key("A1").unwrap();
        assert_eq!(stored.requested_at, Some(3600));
        assert_eq!(stored.estimated_finish_at, Some(600));

        repo.update("A1", rec("A1", "Spark").with_requested_at(Some(7200)));
        let stored = repo.get_by_key("A1").unwrap();
        assert_eq!(stored.requested_at, Some(7200));
        assert_eq!(stored.estimated_finish_at, None);
    }

    #[test]
    fn test_update_status_partial() {
        let repo = RepairRepository::new();
        repo.add(rec("A1", "Tucson").with_estimated_finish_at(Some(585)));

        assert!(repo.update_status("A1", Some(RepairStatus::FinalInspection), None));
        let stored = repo.get_by_key("A1").unwrap();
        assert_eq!(stored.status, RepairStatus::FinalInspection);
        assert_eq!(stored.estimated_finish_at, Some(585));

        assert!(repo.update_status("A1", None, Some(700)));
        assert_eq!(repo.get_by_key("A1").unwrap().estimated_finish_at, Some(700));
        assert!(!repo.update_status("B2", Some(RepairStatus::Completed), None));
    }

    #[test]
    fn test_delete() {
        let repo = RepairRepository::new();
        repo.add(rec("A1", "x"));
        assert!(repo.delete("A1"));
        assert!(!repo.delete("A1"));
        assert!(repo.get_by_key("A1").is_none());
    }

    #[test]
    fn test_add_delete_sequences_stay_unique() {
        let repo = RepairRepository::new();
        let plates = ["A", "B", "a", "C", " b "];
        for round in 0..5 {
            for (i, plate) in plates.iter().enumerate() {
                if (i + round) % 3 == 0 {
                    repo.delete(plate);
                } else {
                    repo.add(rec(plate, "x"));
                }
                let all = repo.get_all();
                let keys: HashSet<_> = all.iter().map(|r| r.license_plate.clone()).collect();
                assert_eq!(keys.len(), all.len());
            }
        }
    }

    #[test]
    fn test_concurrent_add_single_winner() {
        const N: usize = 16;
        let repo = Arc::new(RepairRepository::new());
        let barrier = Arc::new(Barrier::new(N));

        let handles: Vec<_> = (0..N)
            .map(|i| {
                let repo = Arc::clone(&repo);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    repo.add(rec("12가3456", &format!("model-{}", i)))
                })
            })
            .collect();

        let wins = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();

        assert_eq!(wins, 1);
        assert_eq!(repo.len(), 1);
    }

    #[test]
    fn test_get_all_is_snapshot() {
        let repo = RepairRepository::with_records([rec("A", "x"), rec("B", "y"), rec("A", "z")]);
        let snapshot = repo.get_all();
        repo.clear();
        assert_eq!(snapshot.len(), 2);
        assert!(repo.is_empty());
    }
}
