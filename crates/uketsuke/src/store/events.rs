//! Event storage for uketsuke.
//!
//! Owns the event collection referenced by registrations. Persistence
//! mirrors the registration store: load once at construction, rewrite the
//! full collection after every mutation, both best-effort.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::Result;
use crate::event::{Event, EventForm, EventStatus};
use crate::store::blob::{BlobStore, MemoryBlobStore};

/// Blob key the event collection persists under.
pub const EVENTS_KEY: &str = "events";

/// Store owning the event collection.
#[derive(Debug)]
pub struct EventStore {
    /// Durability layer the collection persists through.
    blob: Arc<dyn BlobStore>,
    /// The events, in insertion order.
    records: Vec<Event>,
}

impl EventStore {
    /// Open a store backed by the given blob store.
    ///
    /// Loads the persisted collection if one exists; an unreadable blob
    /// yields an empty collection with a logged warning.
    #[must_use]
    pub fn open(blob: Arc<dyn BlobStore>) -> Self {
        let records = match blob.read(EVENTS_KEY) {
            Ok(Some(payload)) => match serde_json::from_str::<Vec<Event>>(&payload) {
                Ok(records) => {
                    debug!("Loaded {} events", records.len());
                    records
                }
                Err(err) => {
                    warn!("Discarding unreadable event blob: {}", err);
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(err) => {
                warn!("Failed to read event blob: {}", err);
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

    /// Add a new event.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::Error::MissingField`] if the form's `name`
    /// is empty.
    pub fn add(&mut self, form: EventForm) -> Result<Event> {
        let event = Event::new(form)?;
        info!("Added event {} ({})", event.id, event.name);
        self.records.push(event.clone());
        self.persist();
        Ok(event)
    }

    /// Update an event's editable fields.
    ///
    /// Returns `Ok(None)` if the id is unknown.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::Error::MissingField`] if the form's `name`
    /// is empty; the event is left unchanged.
    pub fn update(&mut self, id: &str, form: EventForm) -> Result<Option<Event>> {
        let Some(event) = self.records.iter_mut().find(|e| e.id == id) else {
            return Ok(None);
        };

        event.apply(form)?;
        let updated = event.clone();
        info!("Updated event {}", id);
        self.persist();
        Ok(Some(updated))
    }

    /// Close an event to further registrations.
    ///
    /// Returns the updated event, or `None` if the id is unknown.
    pub fn close(&mut self, id: &str) -> Option<Event> {
        let event = self.records.iter_mut().find(|e| e.id == id)?;
        event.status = EventStatus::Closed;
        let updated = event.clone();
        info!("Closed event {}", id);
        self.persist();
        Some(updated)
    }

    /// Remove an event outright.
    ///
    /// Returns the removed event, or `None` if the id is unknown.
    pub fn remove(&mut self, id: &str) -> Option<Event> {
        let idx = self.records.iter().position(|e| e.id == id)?;
        let removed = self.records.remove(idx);
        info!("Removed event {}", id);
        self.persist();
        Some(removed)
    }

    /// Get an event by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<Event> {
        self.records.iter().find(|e| e.id == id).cloned()
    }

    /// Get all events, in insertion order.
    #[must_use]
    pub fn all(&self) -> &[Event] {
        &self.records
    }

    /// Count all events.
    #[must_use]
    pub fn count(&self) -> usize {
        self.records.len()
    }

    fn persist(&self) {
        match serde_json::to_string(&self.records) {
            Ok(payload) => {
                if let Err(err) = self.blob.write(EVENTS_KEY, &payload) {
                    warn!("Failed to persist events: {}", err);
                }
            }
            Err(err) => warn!("Failed to serialize events: {}", err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn create_test_store() -> EventStore {
        EventStore::open_in_memory()
    }

    fn test_form(name: &str) -> EventForm {
        EventForm {
            name: name.to_string(),
            date: NaiveDate::from_ymd_opt(2026, 9, 15).unwrap(),
            capacity: 30,
            ..EventForm::default()
        }
    }

    #[test]
    fn test_add_and_get() {
        let mut store = create_test_store();
        let event = store.add(test_form("新製品発表会")).unwrap();

        assert_eq!(event.status, EventStatus::Active);
        let fetched = store.get(&event.id).unwrap();
        assert_eq!(fetched, event);
    }

    #[test]
    fn test_add_rejects_empty_name() {
        let mut store = create_test_store();
        assert!(store.add(test_form("")).is_err());
        assert_eq!(store.count(), 0);
    }

    #[test]
    fn test_update() {
        let mut store = create_test_store();
        let event = store.add(test_form("新製品発表会")).unwrap();

        let mut form = test_form("新製品発表会(改)");
        form.capacity = 50;
        let updated = store.update(&event.id, form).unwrap().unwrap();

        assert_eq!(updated.id, event.id);
        assert_eq!(updated.name, "新製品発表会(改)");
        assert_eq!(updated.capacity, 50);
    }

    #[test]
    fn test_update_unknown_id() {
        let mut store = create_test_store();
        assert!(store.update("event_nope", test_form("x")).unwrap().is_none());
    }

    #[test]
    fn test_close() {
        let mut store = create_test_store();
        let event = store.add(test_form("新製品発表会")).unwrap();

        let closed = store.close(&event.id).unwrap();
        assert_eq!(closed.status, EventStatus::Closed);
        assert!(!store.get(&event.id).unwrap().is_active());
    }

    #[test]
    fn test_remove() {
        let mut store = create_test_store();
        let event = store.add(test_form("新製品発表会")).unwrap();

        assert!(store.remove(&event.id).is_some());
        assert_eq!(store.count(), 0);
        assert!(store.remove(&event.id).is_none());
    }

    #[test]
    fn test_reload_roundtrip() {
        let blob = Arc::new(MemoryBlobStore::new());
        let mut store = EventStore::open(blob.clone());
        let event = store.add(test_form("新製品発表会")).unwrap();
        store.close(&event.id).unwrap();
        drop(store);

        let reloaded = EventStore::open(blob);
        assert_eq!(reloaded.count(), 1);
        assert_eq!(reloaded.get(&event.id).unwrap().status, EventStatus::Closed);
    }

    #[test]
    fn test_unreadable_blob_yields_empty_store() {
        let blob = Arc::new(MemoryBlobStore::new());
        blob.write(EVENTS_KEY, "{broken").unwrap();

        let store = EventStore::open(blob);
        assert_eq!(store.count(), 0);
    }

    #[test]
    fn test_persists_under_events_key() {
        let blob = Arc::new(MemoryBlobStore::new());
        let mut store = EventStore::open(blob.clone());
        let event = store.add(test_form("新製品発表会")).unwrap();

        let payload = blob.read(EVENTS_KEY).unwrap().unwrap();
        assert!(payload.contains(&event.id));
    }
}
