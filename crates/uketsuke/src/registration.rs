//! Core registration types for uketsuke.
//!
//! This module defines the fundamental data structures for representing
//! event registrations and their lifecycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// The lifecycle status of a registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationStatus {
    /// Registered and expected to attend.
    Registered,
    /// Checked in at the reception desk.
    Attended,
    /// Cancelled before attending.
    Cancelled,
}

impl RegistrationStatus {
    /// The Japanese display label, as shown at the desk and in exports.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Registered => "申込済",
            Self::Attended => "参加済",
            Self::Cancelled => "キャンセル",
        }
    }
}

impl std::fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Registered => write!(f, "registered"),
            Self::Attended => write!(f, "attended"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Input fields for creating a registration.
///
/// Only `event_id`, `name`, and `email` are required; the remaining
/// fields default to empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationForm {
    /// Id of the event being registered for.
    pub event_id: String,
    /// Participant name.
    pub name: String,
    /// Phonetic reading of the name.
    #[serde(default)]
    pub furigana: String,
    /// Contact email address.
    pub email: String,
    /// Contact phone number.
    #[serde(default)]
    pub phone: String,
    /// Company the participant belongs to.
    #[serde(default)]
    pub company: String,
    /// Department within the company.
    #[serde(default)]
    pub department: String,
    /// Job title.
    #[serde(default)]
    pub position: String,
    /// Free-form notes.
    #[serde(default)]
    pub notes: String,
}

impl RegistrationForm {
    /// Check that the required fields are filled in.
    ///
    /// Whitespace-only values count as empty.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingField`] naming the first empty required field.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::missing_field("name"));
        }
        if self.email.trim().is_empty() {
            return Err(Error::missing_field("email"));
        }
        Ok(())
    }
}

/// A participant's registration for an event.
///
/// Created by a registration submission; afterwards mutated only by the
/// check-in and cancel transitions. At most one of `check_in_time` and
/// `cancelled_at` is ever set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    /// Unique identifier, assigned at creation.
    pub id: String,

    /// Id of the event this registration belongs to.
    pub event_id: String,

    /// Participant name.
    pub name: String,

    /// Phonetic reading of the name.
    #[serde(default)]
    pub furigana: String,

    /// Contact email address.
    pub email: String,

    /// Contact phone number.
    #[serde(default)]
    pub phone: String,

    /// Company the participant belongs to.
    #[serde(default)]
    pub company: String,

    /// Department within the company.
    #[serde(default)]
    pub department: String,

    /// Job title.
    #[serde(default)]
    pub position: String,

    /// Free-form notes.
    #[serde(default)]
    pub notes: String,

    /// Current lifecycle status.
    pub status: RegistrationStatus,

    /// When the registration was created.
    pub registered_at: DateTime<Utc>,

    /// When the participant checked in, if they did.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_in_time: Option<DateTime<Utc>>,

    /// When the registration was cancelled, if it was.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancelled_at: Option<DateTime<Utc>>,

    /// Reason given at cancellation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancel_reason: Option<String>,

    /// Token embedded in the participant's QR code.
    pub qr_code: String,
}

impl Registration {
    /// Create a new registration from a validated form.
    ///
    /// Assigns a fresh id, stamps the creation time, and derives the QR
    /// token from the identifying fields.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingField`] if `name` or `email` is empty.
    pub fn new(form: RegistrationForm) -> Result<Self> {
        form.validate()?;
        let registered_at = Utc::now();
        let qr_code = derive_qr_token(&form.event_id, &form.name, &form.email, registered_at);
        Ok(Self {
            id: generate_registration_id(),
            event_id: form.event_id,
            name: form.name,
            furigana: form.furigana,
            email: form.email,
            phone: form.phone,
            company: form.company,
            department: form.department,
            position: form.position,
            notes: form.notes,
            status: RegistrationStatus::Registered,
            registered_at,
            check_in_time: None,
            cancelled_at: None,
            cancel_reason: None,
            qr_code,
        })
    }

    /// Check whether this registration still occupies a seat.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status != RegistrationStatus::Cancelled
    }
}

/// Generate a unique registration id.
///
/// Combines the current unix-millisecond timestamp with a nine-character
/// random base36 suffix, so collisions are negligible without a central
/// counter.
#[must_use]
pub fn generate_registration_id() -> String {
    format!(
        "reg_{}_{}",
        Utc::now().timestamp_millis(),
        random_suffix(9)
    )
}

/// Derive the QR token for a registration.
///
/// The token is a BLAKE3 digest over the identifying fields fixed at
/// creation time, so reprinting a badge always yields the same code and
/// the token itself carries no readable participant data.
#[must_use]
pub fn derive_qr_token(
    event_id: &str,
    name: &str,
    email: &str,
    registered_at: DateTime<Utc>,
) -> String {
    let seed = format!(
        "{}|{}|{}|{}",
        event_id,
        name,
        email,
        registered_at.timestamp_millis()
    );
    blake3::hash(seed.as_bytes()).to_hex().to_string()
}

pub(crate) fn random_suffix(len: usize) -> String {
    use rand::Rng;
    let mut rng = rand::thread_rng();
    let chars: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

    (0..len)
        .map(|_| {
            let idx = rng.gen_range(0..chars.len());
            chars[idx] as char
        })
        .collect()
}
