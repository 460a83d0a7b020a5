//! Registration storage for uketsuke.
//!
//! The registration store is the single source of truth for registration
//! records. It loads its collection from the blob store once at
//! construction and rewrites the full collection after every mutation.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::registration::{Registration, RegistrationForm, RegistrationStatus};
use crate::store::blob::{BlobStore, MemoryBlobStore};

/// Blob key the registration collection persists under.
pub const REGISTRATIONS_KEY: &str = "registrations";

/// Store owning the registration collection.
///
/// Mutations take `&mut self`, which makes the single-writer requirement
/// explicit: a concurrent host must wrap the store in a mutex or drive it
/// from a single task, because every mutation is a read-modify-persist
/// sequence over the whole collection.
#[derive(Debug)]
pub struct RegistrationStore {
    /// Durability layer the collection persists through.
    blob: Arc<dyn BlobStore>,
    /// The records, in insertion order.
    records: Vec<Registration>,
}

impl RegistrationStore {
    /// Open a store backed by the given blob store.
    ///
    /// Loads the persisted collection if one exists. An unreadable or
    /// unparseable blob yields an empty collection with a logged warning
    /// rather than an error.
    #[must_use]
    pub fn open(blob: Arc<dyn BlobStore>) -> Self {
        let records = match blob.read(REGISTRATIONS_KEY) {
            Ok(Some(payload)) => match serde_json::from_str::<Vec<Registration>>(&payload) {
                Ok(records) => {
                    debug!("Loaded {} registrations", records.len());
                    records
                }
                Err(err) => {
                    warn!("Discarding unreadable registration blob: {}", err);
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(err) => {
                warn!("Failed to read registration blob: {}", err);
                Vec::new()
            }
        };

        Self { blob, records }
    }

    /// Create a store backed by an in-memory blob store, for testing.
    #[must_use]
    pub fn open_in_memory() -> Self {
        Self::open(Arc::new(MemoryBlobStore::new()))
    }

    /// Add a new registration.
    ///
    /// Validates the form, assigns the id and QR token, appends the record,
    /// and persists the collection before returning it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingField`] if `name` or `email` is empty; no
    /// record is created.
    pub fn add(&mut self, form: RegistrationForm) -> Result<Registration> {
        let registration = Registration::new(form)?;
        info!(
            "Added registration {} for event {}",
            registration.id, registration.event_id
        );
        self.records.push(registration.clone());
        self.persist();
        Ok(registration)
    }

    /// Check a participant in.
    ///
    /// Transitions Registered to Attended and stamps the check-in time.
    /// Returns `None` without changing anything when the id is unknown or
    /// the registration is not currently Registered, so repeated calls are
    /// no-ops.
    pub fn check_in(&mut self, id: &str) -> Option<Registration> {
        let record = self.records.iter_mut().find(|r| r.id == id)?;
        if record.status != RegistrationStatus::Registered {
            debug!("Ignoring check-in for {} in status {}", id, record.status);
            return None;
        }

        record.status = RegistrationStatus::Attended;
        record.check_in_time = Some(Utc::now());
        let updated = record.clone();
        info!("Checked in {}", id);
        self.persist();
        Some(updated)
    }

    /// Cancel a registration.
    ///
    /// From Registered the record moves to Cancelled with the time and
    /// reason recorded. Cancelling an already-cancelled record is a no-op
    /// returning `Ok(None)` that keeps the first cancellation's time and
    /// reason. Unknown ids also return `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CancelAfterCheckIn`] if the participant already
    /// checked in; the record is left unchanged.
    pub fn cancel(&mut self, id: &str, reason: &str) -> Result<Option<Registration>> {
        let Some(record) = self.records.iter_mut().find(|r| r.id == id) else {
            return Ok(None);
        };

        match record.status {
            RegistrationStatus::Attended => Err(Error::CancelAfterCheckIn { id: id.to_string() }),
            RegistrationStatus::Cancelled => {
                debug!("Ignoring repeat cancellation for {}", id);
                Ok(None)
            }
            RegistrationStatus::Registered => {
                record.status = RegistrationStatus::Cancelled;
                record.cancelled_at = Some(Utc::now());
                record.cancel_reason = Some(reason.to_string());
                let updated = record.clone();
                info!("Cancelled {}", id);
                self.persist();
                Ok(Some(updated))
            }
        }
    }

    /// Remove a registration outright.
    ///
    /// Administrative deletion, unconstrained by status. Returns the
    /// removed record, or `None` if the id is unknown.
    pub fn remove(&mut self, id: &str) -> Option<Registration> {
        let idx = self.records.iter().position(|r| r.id == id)?;
        let removed = self.records.remove(idx);
        info!("Removed registration {}", id);
        self.persist();
        Some(removed)
    }

    /// Append already-parsed registrations in bulk.
    ///
    /// Used by the CSV importer. Rows failing validation are skipped with a
    /// warning. Persists once after the whole batch and returns the number
    /// of records added.
    pub fn import(&mut self, forms: Vec<RegistrationForm>) -> usize {
        let mut added = 0;
        for form in forms {
            match Registration::new(form) {
                Ok(registration) => {
                    self.records.push(registration);
                    added += 1;
                }
                Err(err) => warn!("Skipping imported row: {}", err),
            }
        }

        if added > 0 {
            info!("Imported {} registrations", added);
            self.persist();
        }
        added
    }

    /// Get a registration by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<Registration> {
        self.records.iter().find(|r| r.id == id).cloned()
    }

    /// Look a registration up by its QR token.
    #[must_use]
    pub fn find_by_qr(&self, code: &str) -> Option<Registration> {
        self.records.iter().find(|r| r.qr_code == code).cloned()
    }

    /// Find an active registration by email within an event.
    ///
    /// The email comparison is case-insensitive. Cancelled records are
    /// skipped, so a participant who cancelled can register again. Used
    /// for duplicate detection before accepting a new registration.
    #[must_use]
    pub fn find_by_email(&self, event_id: &str, email: &str) -> Option<Registration> {
        let needle = email.to_lowercase();
        self.records
            .iter()
            .find(|r| r.is_active() && r.event_id == event_id && r.email.to_lowercase() == needle)
            .cloned()
    }

    /// Get all registrations for an event, in insertion order.
    #[must_use]
    pub fn by_event(&self, event_id: &str) -> Vec<Registration> {
        self.records
            .iter()
            .filter(|r| r.event_id == event_id)
            .cloned()
            .collect()
    }

    /// Get all registrations, in insertion order.
    #[must_use]
    pub fn all(&self) -> &[Registration] {
        &self.records
    }

    /// Count all registrations.
    #[must_use]
    pub fn count(&self) -> usize {
        self.records.len()
    }

    /// Search registrations by substring.
    ///
    /// Performs a case-insensitive match against name, furigana, email, and
    /// company, optionally restricted to one event.
    #[must_use]
    pub fn search(&self, query: &str, event_id: Option<&str>) -> Vec<Registration> {
        let needle = query.to_lowercase();
        self.records
            .iter()
            .filter(|r| event_id.map_or(true, |e| r.event_id == e))
            .filter(|r| {
                r.name.to_lowercase().contains(&needle)
                    || r.furigana.to_lowercase().contains(&needle)
                    || r.email.to_lowercase().contains(&needle)
                    || r.company.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect()
    }

    /// Compute statistics, optionally restricted to one event.
    #[must_use]
    pub fn statistics(&self, event_id: Option<&str>) -> EventStatistics {
        let mut total = 0u32;
        let mut registered = 0u32;
        let mut attended = 0u32;
        let mut cancelled = 0u32;

        for record in self
            .records
            .iter()
            .filter(|r| event_id.map_or(true, |e| r.event_id == e))
        {
            total += 1;
            match record.status {
                RegistrationStatus::Registered => registered += 1,
                RegistrationStatus::Attended => attended += 1,
                RegistrationStatus::Cancelled => cancelled += 1,
            }
        }

        let check_in_rate = if total == 0 {
            0.0
        } else {
            (f64::from(attended) / f64::from(total) * 1000.0).round() / 10.0
        };

        EventStatistics {
            total,
            registered,
            attended,
            cancelled,
            check_in_rate,
        }
    }

    /// Serialize and write the collection, best-effort.
    ///
    /// A failed write leaves the in-memory state ahead of durable state;
    /// the mutation that triggered it still succeeds.
    fn persist(&self) {
        match serde_json::to_string(&self.records) {
            Ok(payload) => {
                if let Err(err) = self.blob.write(REGISTRATIONS_KEY, &payload) {
                    warn!("Failed to persist registrations: {}", err);
                }
            }
            Err(err) => warn!("Failed to serialize registrations: {}", err),
        }
    }
}

/// Aggregate counts over a set of registrations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EventStatistics {
    /// Total number of registrations, cancelled included.
    pub total: u32,
    /// Records still registered and not yet checked in.
    pub registered: u32,
    /// Records checked in.
    pub attended: u32,
    /// Cancelled records.
    pub cancelled: u32,
    /// Attended share of total as a percentage, rounded to one decimal;
    /// zero when there are no records.
    pub check_in_rate: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_store() -> RegistrationStore {
        RegistrationStore::open_in_memory()
    }

    fn test_form(name: &str, email: &str) -> RegistrationForm {
        RegistrationForm {
            event_id: "event_1".to_string(),
            name: name.to_string(),
            email: email.to_string(),
            ..RegistrationForm::default()
        }
    }

    #[test]
    fn test_open_empty() {
        let store = create_test_store();
        assert_eq!(store.count(), 0);
        assert!(store.all().is_empty());
    }

    #[test]
    fn test_add_and_get() {
        let mut store = create_test_store();
        let reg = store.add(test_form("田中 太郎", "tanaka@example.com")).unwrap();

        assert_eq!(reg.status, RegistrationStatus::Registered);
        assert!(!reg.id.is_empty());
        assert!(!reg.qr_code.is_empty());

        let fetched = store.get(&reg.id).unwrap();
        assert_eq!(fetched, reg);
    }

    #[test]
    fn test_add_rejects_empty_name() {
        let mut store = create_test_store();
        let err = store.add(test_form("", "tanaka@example.com")).unwrap_err();
        assert!(err.is_validation());
        assert_eq!(store.count(), 0);
    }

    #[test]
    fn test_add_rejects_whitespace_email() {
        let mut store = create_test_store();
        assert!(store.add(test_form("田中 太郎", "   ")).is_err());
        assert_eq!(store.count(), 0);
    }

    #[test]
    fn test_add_assigns_unique_ids() {
        let mut store = create_test_store();
        let a = store.add(test_form("田中 太郎", "tanaka@example.com")).unwrap();
        let b = store.add(test_form("佐藤 花子", "sato@example.com")).unwrap();
        assert_ne!(a.id, b.id);
        assert_ne!(a.qr_code, b.qr_code);
    }

    #[test]
    fn test_add_persists() {
        let blob = Arc::new(MemoryBlobStore::new());
        let mut store = RegistrationStore::open(blob.clone());
        let reg = store.add(test_form("田中 太郎", "tanaka@example.com")).unwrap();

        let payload = blob.read(REGISTRATIONS_KEY).unwrap().unwrap();
        assert!(payload.contains(&reg.id));
    }

    #[test]
    fn test_check_in_transitions() {
        let mut store = create_test_store();
        let reg = store.add(test_form("田中 太郎", "tanaka@example.com")).unwrap();

        let updated = store.check_in(&reg.id).unwrap();
        assert_eq!(updated.status, RegistrationStatus::Attended);
        assert!(updated.check_in_time.is_some());
        assert!(updated.cancelled_at.is_none());
    }

    #[test]
    fn test_check_in_twice_is_noop() {
        let mut store = create_test_store();
        let reg = store.add(test_form("田中 太郎", "tanaka@example.com")).unwrap();

        let first = store.check_in(&reg.id).unwrap();
        assert!(store.check_in(&reg.id).is_none());

        let current = store.get(&reg.id).unwrap();
        assert_eq!(current.status, RegistrationStatus::Attended);
        assert_eq!(current.check_in_time, first.check_in_time);
    }

    #[test]
    fn test_check_in_unknown_id() {
        let mut store = create_test_store();
        assert!(store.check_in("reg_nope").is_none());
    }

    #[test]
    fn test_check_in_cancelled_is_noop() {
        let mut store = create_test_store();
        let reg = store.add(test_form("田中 太郎", "tanaka@example.com")).unwrap();
        store.cancel(&reg.id, "").unwrap();

        assert!(store.check_in(&reg.id).is_none());
        assert_eq!(
            store.get(&reg.id).unwrap().status,
            RegistrationStatus::Cancelled
        );
    }

    #[test]
    fn test_cancel_records_time_and_reason() {
        let mut store = create_test_store();
        let reg = store.add(test_form("田中 太郎", "tanaka@example.com")).unwrap();

        let cancelled = store.cancel(&reg.id, "体調不良").unwrap().unwrap();
        assert_eq!(cancelled.status, RegistrationStatus::Cancelled);
        assert!(cancelled.cancelled_at.is_some());
        assert_eq!(cancelled.cancel_reason.as_deref(), Some("体調不良"));
        assert!(cancelled.check_in_time.is_none());
    }

    #[test]
    fn test_cancel_twice_first_write_wins() {
        let mut store = create_test_store();
        let reg = store.add(test_form("田中 太郎", "tanaka@example.com")).unwrap();

        let first = store.cancel(&reg.id, "最初の理由").unwrap().unwrap();
        assert!(store.cancel(&reg.id, "別の理由").unwrap().is_none());

        let current = store.get(&reg.id).unwrap();
        assert_eq!(current.cancelled_at, first.cancelled_at);
        assert_eq!(current.cancel_reason.as_deref(), Some("最初の理由"));
    }

    #[test]
    fn test_cancel_after_check_in_is_conflict() {
        let mut store = create_test_store();
        let reg = store.add(test_form("田中 太郎", "tanaka@example.com")).unwrap();
        store.check_in(&reg.id).unwrap();

        let err = store.cancel(&reg.id, "遅刻").unwrap_err();
        assert!(err.is_conflict());

        let current = store.get(&reg.id).unwrap();
        assert_eq!(current.status, RegistrationStatus::Attended);
        assert!(current.cancelled_at.is_none());
    }

    #[test]
    fn test_cancel_unknown_id() {
        let mut store = create_test_store();
        assert!(store.cancel("reg_nope", "").unwrap().is_none());
    }

    #[test]
    fn test_remove() {
        let mut store = create_test_store();
        let reg = store.add(test_form("田中 太郎", "tanaka@example.com")).unwrap();

        let removed = store.remove(&reg.id).unwrap();
        assert_eq!(removed.id, reg.id);
        assert_eq!(store.count(), 0);
        assert!(store.get(&reg.id).is_none());
        assert!(store.remove(&reg.id).is_none());
    }

    #[test]
    fn test_find_by_qr() {
        let mut store = create_test_store();
        let reg = store.add(test_form("田中 太郎", "tanaka@example.com")).unwrap();

        let found = store.find_by_qr(&reg.qr_code).unwrap();
        assert_eq!(found.id, reg.id);
        assert!(store.find_by_qr("unknown-token").is_none());
    }

    #[test]
    fn test_find_by_email_case_insensitive() {
        let mut store = create_test_store();
        store.add(test_form("田中 太郎", "Tanaka@Example.com")).unwrap();

        assert!(store.find_by_email("event_1", "tanaka@example.com").is_some());
        assert!(store.find_by_email("event_2", "tanaka@example.com").is_none());
    }

    #[test]
    fn test_find_by_email_skips_cancelled() {
        let mut store = create_test_store();
        let first = store.add(test_form("田中 太郎", "tanaka@example.com")).unwrap();
        store.cancel(&first.id, "都合により").unwrap();

        assert!(store.find_by_email("event_1", "tanaka@example.com").is_none());

        // A later active record with the same email is found past the
        // cancelled one.
        let second = store.add(test_form("田中 太郎", "tanaka@example.com")).unwrap();
        let found = store.find_by_email("event_1", "tanaka@example.com").unwrap();
        assert_eq!(found.id, second.id);
    }

    #[test]
    fn test_by_event_preserves_insertion_order() {
        let mut store = create_test_store();
        let a = store.add(test_form("田中 太郎", "tanaka@example.com")).unwrap();
        let mut other = test_form("鈴木 一郎", "suzuki@example.com");
        other.event_id = "event_2".to_string();
        store.add(other).unwrap();
        let b = store.add(test_form("佐藤 花子", "sato@example.com")).unwrap();

        let regs = store.by_event("event_1");
        assert_eq!(regs.len(), 2);
        assert_eq!(regs[0].id, a.id);
        assert_eq!(regs[1].id, b.id);
    }

    #[test]
    fn test_search_by_name() {
        let mut store = create_test_store();
        store.add(test_form("Tanaka Taro", "taro@example.com")).unwrap();
        store.add(test_form("Sato Hanako", "hanako@example.com")).unwrap();

        let hits = store.search("tanaka", None);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Tanaka Taro");
    }

    #[test]
    fn test_search_by_furigana_and_company() {
        let mut store = create_test_store();
        let mut form = test_form("田中 太郎", "tanaka@example.com");
        form.furigana = "タナカ タロウ".to_string();
        form.company = "株式会社サンプル".to_string();
        store.add(form).unwrap();

        assert_eq!(store.search("タナカ", None).len(), 1);
        assert_eq!(store.search("サンプル", None).len(), 1);
        assert!(store.search("みつからない", None).is_empty());
    }

    #[test]
    fn test_search_scoped_to_event() {
        let mut store = create_test_store();
        store.add(test_form("Tanaka Taro", "taro@example.com")).unwrap();
        let mut other = test_form("Tanaka Jiro", "jiro@example.com");
        other.event_id = "event_2".to_string();
        store.add(other).unwrap();

        assert_eq!(store.search("tanaka", None).len(), 2);
        assert_eq!(store.search("tanaka", Some("event_2")).len(), 1);
    }

    #[test]
    fn test_statistics() {
        let mut store = create_test_store();
        let a = store.add(test_form("田中 太郎", "tanaka@example.com")).unwrap();
        store.add(test_form("佐藤 花子", "sato@example.com")).unwrap();
        let c = store.add(test_form("鈴木 一郎", "suzuki@example.com")).unwrap();

        store.check_in(&a.id).unwrap();
        store.cancel(&c.id, "").unwrap();

        let stats = store.statistics(Some("event_1"));
        assert_eq!(stats.total, 3);
        assert_eq!(stats.registered, 1);
        assert_eq!(stats.attended, 1);
        assert_eq!(stats.cancelled, 1);
        assert_eq!(stats.total, stats.registered + stats.attended + stats.cancelled);
        assert!((stats.check_in_rate - 33.3).abs() < f64::EPSILON);
    }

    #[test]
    fn test_statistics_empty() {
        let store = create_test_store();
        let stats = store.statistics(None);
        assert_eq!(stats.total, 0);
        assert!((stats.check_in_rate - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_statistics_scoped_to_event() {
        let mut store = create_test_store();
        store.add(test_form("田中 太郎", "tanaka@example.com")).unwrap();
        let mut other = test_form("鈴木 一郎", "suzuki@example.com");
        other.event_id = "event_2".to_string();
        store.add(other).unwrap();

        assert_eq!(store.statistics(Some("event_1")).total, 1);
        assert_eq!(store.statistics(None).total, 2);
    }

    #[test]
    fn test_reload_roundtrip() {
        let blob = Arc::new(MemoryBlobStore::new());
        let mut store = RegistrationStore::open(blob.clone());
        let a = store.add(test_form("田中 太郎", "tanaka@example.com")).unwrap();
        let b = store.add(test_form("佐藤 花子", "sato@example.com")).unwrap();
        store.check_in(&a.id).unwrap();
        drop(store);

        let reloaded = RegistrationStore::open(blob);
        assert_eq!(reloaded.count(), 2);
        assert_eq!(
            reloaded.get(&a.id).unwrap().status,
            RegistrationStatus::Attended
        );
        assert_eq!(reloaded.get(&b.id).unwrap(), b);
    }

    #[test]
    fn test_unreadable_blob_yields_empty_store() {
        let blob = Arc::new(MemoryBlobStore::new());
        blob.write(REGISTRATIONS_KEY, "not json at all").unwrap();

        let store = RegistrationStore::open(blob);
        assert_eq!(store.count(), 0);
    }

    #[test]
    fn test_write_failure_keeps_mutation() {
        #[derive(Debug)]
        struct FailingBlobStore;

        impl BlobStore for FailingBlobStore {
            fn read(&self, _key: &str) -> crate::error::Result<Option<String>> {
                Ok(None)
            }

            fn write(&self, key: &str, _payload: &str) -> crate::error::Result<()> {
                Err(Error::BlobWrite {
                    key: key.to_string(),
                    source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
                })
            }
        }

        let mut store = RegistrationStore::open(Arc::new(FailingBlobStore));
        let reg = store.add(test_form("田中 太郎", "tanaka@example.com")).unwrap();

        assert_eq!(store.count(), 1);
        assert!(store.get(&reg.id).is_some());
    }

    #[test]
    fn test_import_skips_invalid_rows() {
        let mut store = create_test_store();
        let forms = vec![
            test_form("田中 太郎", "tanaka@example.com"),
            test_form("", "missing-name@example.com"),
            test_form("佐藤 花子", "sato@example.com"),
        ];

        let added = store.import(forms);
        assert_eq!(added, 2);
        assert_eq!(store.count(), 2);
    }
}
