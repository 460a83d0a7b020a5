//! Event types for uketsuke.
//!
//! Events are the things participants register for. They are owned by the
//! event store and referenced from registrations by id.

use chrono::{NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::registration::random_suffix;

/// Whether an event still accepts registrations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    /// Open for registration.
    Active,
    /// Closed; no further registrations are accepted.
    Closed,
}

impl EventStatus {
    /// The Japanese display label.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Active => "募集中",
            Self::Closed => "終了",
        }
    }
}

impl std::fmt::Display for EventStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Closed => write!(f, "closed"),
        }
    }
}

/// Input fields for creating or updating an event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventForm {
    /// Event name.
    pub name: String,
    /// Date the event takes place.
    pub date: NaiveDate,
    /// Starting time, if scheduled.
    #[serde(default)]
    pub time: Option<NaiveTime>,
    /// Venue.
    #[serde(default)]
    pub location: String,
    /// Maximum number of non-cancelled registrations.
    pub capacity: u32,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Last date (inclusive) on which registration is accepted.
    #[serde(default)]
    pub registration_deadline: Option<NaiveDate>,
    /// Contact address shown to participants.
    #[serde(default)]
    pub contact_email: String,
}

impl EventForm {
    /// Check that the required fields are filled in.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingField`] if `name` is empty.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::missing_field("name"));
        }
        Ok(())
    }
}

/// An event participants can register for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Unique identifier, assigned at creation.
    pub id: String,

    /// Event name.
    pub name: String,

    /// Date the event takes place.
    pub date: NaiveDate,

    /// Starting time, if scheduled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<NaiveTime>,

    /// Venue.
    #[serde(default)]
    pub location: String,

    /// Maximum number of non-cancelled registrations.
    pub capacity: u32,

    /// Free-form description.
    #[serde(default)]
    pub description: String,

    /// Last date (inclusive) on which registration is accepted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registration_deadline: Option<NaiveDate>,

    /// Contact address shown to participants.
    #[serde(default)]
    pub contact_email: String,

    /// Whether the event still accepts registrations.
    pub status: EventStatus,
}

impl Event {
    /// Create a new active event from a validated form.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingField`] if `name` is empty.
    pub fn new(form: EventForm) -> Result<Self> {
        form.validate()?;
        Ok(Self {
            id: generate_event_id(),
            name: form.name,
            date: form.date,
            time: form.time,
            location: form.location,
            capacity: form.capacity,
            description: form.description,
            registration_deadline: form.registration_deadline,
            contact_email: form.contact_email,
            status: EventStatus::Active,
        })
    }

    /// Overwrite the editable fields from a form, keeping id and status.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingField`] if the form's `name` is empty.
    pub fn apply(&mut self, form: EventForm) -> Result<()> {
        form.validate()?;
        self.name = form.name;
        self.date = form.date;
        self.time = form.time;
        self.location = form.location;
        self.capacity = form.capacity;
        self.description = form.description;
        self.registration_deadline = form.registration_deadline;
        self.contact_email = form.contact_email;
        Ok(())
    }

    /// Check whether the event is open for registration.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == EventStatus::Active
    }
}

/// Generate a unique event id.
#[must_use]
pub fn generate_event_id() -> String {
    format!(
        "event_{}_{}",
        Utc::now().timestamp_millis(),
        random_suffix(4)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_event_form() -> EventForm {
        EventForm {
            name: "テックカンファレンス2026".to_string(),
            date: NaiveDate::from_ymd_opt(2026, 9, 15).unwrap(),
            time: NaiveTime::from_hms_opt(14, 0, 0),
            location: "東京国際フォーラム".to_string(),
            capacity: 100,
            description: "年次技術カンファレンス".to_string(),
            registration_deadline: NaiveDate::from_ymd_opt(2026, 9, 10),
            contact_email: "events@example.com".to_string(),
        }
    }

    #[test]
    fn test_event_status_display() {
        assert_eq!(EventStatus::Active.to_string(), "active");
        assert_eq!(EventStatus::Closed.to_string(), "closed");
    }

    #[test]
    fn test_event_status_label() {
        assert_eq!(EventStatus::Active.label(), "募集中");
        assert_eq!(EventStatus::Closed.label(), "終了");
    }

    #[test]
    fn test_event_new() {
        let event = Event::new(test_event_form()).unwrap();

        assert!(event.id.starts_with("event_"));
        assert_eq!(event.status, EventStatus::Active);
        assert_eq!(event.capacity, 100);
        assert!(event.is_active());
    }

    #[test]
    fn test_event_new_rejects_empty_name() {
        let mut form = test_event_form();
        form.name = "  ".to_string();
        assert!(Event::new(form).is_err());
    }

    #[test]
    fn test_event_apply_keeps_id_and_status() {
        let mut event = Event::new(test_event_form()).unwrap();
        event.status = EventStatus::Closed;
        let id = event.id.clone();

        let mut form = test_event_form();
        form.name = "改名イベント".to_string();
        form.capacity = 50;
        event.apply(form).unwrap();

        assert_eq!(event.id, id);
        assert_eq!(event.status, EventStatus::Closed);
        assert_eq!(event.name, "改名イベント");
        assert_eq!(event.capacity, 50);
    }

    #[test]
    fn test_event_serialization() {
        let event = Event::new(test_event_form()).unwrap();

        let json = serde_json::to_string(&event).unwrap();
        let deserialized: Event = serde_json::from_str(&json).unwrap();

        assert_eq!(event, deserialized);
    }
}
