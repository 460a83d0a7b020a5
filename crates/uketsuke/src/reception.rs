//! Reception service.
//!
//! Ties the event and registration stores together with the notification
//! channels. Every mutation follows the same contract: the store change is
//! validated and persisted first, then notifications go out best-effort.
//! A channel failure is logged and never propagated to the caller.

use std::sync::Arc;

use chrono::{FixedOffset, NaiveDate, Utc};
use tracing::{debug, warn};

use crate::capacity;
use crate::error::{Error, Result};
use crate::event::Event;
use crate::notify::{NotificationMessage, Notifier};
use crate::registration::{Registration, RegistrationForm, RegistrationStatus};
use crate::store::{EventStore, RegistrationStore};

/// Coordinates registrations, events, and notification channels.
#[derive(Debug)]
pub struct Reception {
    events: EventStore,
    registrations: RegistrationStore,
    notifiers: Vec<Arc<dyn Notifier>>,
    tz_offset: FixedOffset,
}

impl Reception {
    /// Assemble the service from its parts.
    #[must_use]
    pub fn new(
        events: EventStore,
        registrations: RegistrationStore,
        notifiers: Vec<Arc<dyn Notifier>>,
        tz_offset: FixedOffset,
    ) -> Self {
        Self {
            events,
            registrations,
            notifiers,
            tz_offset,
        }
    }

    /// The event store.
    #[must_use]
    pub fn events(&self) -> &EventStore {
        &self.events
    }

    /// The event store, mutable.
    pub fn events_mut(&mut self) -> &mut EventStore {
        &mut self.events
    }

    /// The registration store.
    #[must_use]
    pub fn registrations(&self) -> &RegistrationStore {
        &self.registrations
    }

    /// The registration store, mutable.
    pub fn registrations_mut(&mut self) -> &mut RegistrationStore {
        &mut self.registrations
    }

    /// The configured local timezone offset.
    #[must_use]
    pub fn tz_offset(&self) -> FixedOffset {
        self.tz_offset
    }

    /// Today's date in the configured local timezone.
    #[must_use]
    pub fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.tz_offset).date_naive()
    }

    /// Accept a new registration for an event.
    ///
    /// The event must exist, be open, have seats left, and be inside its
    /// registration deadline. One email registers at most once per event;
    /// a cancelled registration does not count against that.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a missing name or email, and a
    /// gating error ([`Error::UnknownEvent`], [`Error::EventClosed`],
    /// [`Error::DeadlinePassed`], [`Error::EventFull`], or
    /// [`Error::DuplicateRegistration`]) when the event cannot take the
    /// registration.
    pub async fn register(&mut self, form: RegistrationForm) -> Result<Registration> {
        form.validate()?;

        let event = self
            .events
            .get(&form.event_id)
            .ok_or_else(|| Error::unknown_event(&form.event_id))?;

        if !event.is_active() {
            return Err(Error::EventClosed { event_id: event.id });
        }
        if let Some(deadline) = event.registration_deadline {
            if self.today() > deadline {
                return Err(Error::DeadlinePassed { event_id: event.id });
            }
        }

        let existing = self.registrations.by_event(&event.id);
        if capacity::available(&event, &existing) == 0 {
            return Err(Error::EventFull { event_id: event.id });
        }
        if self
            .registrations
            .find_by_email(&event.id, &form.email)
            .is_some()
        {
            return Err(Error::duplicate_registration(&event.id, &form.email));
        }

        let registration = self.registrations.add(form)?;
        self.dispatch(NotificationMessage::registration_confirmed(
            &registration,
            &event,
            self.tz_offset,
        ))
        .await;

        Ok(registration)
    }

    /// Check a participant in by registration id or QR token.
    ///
    /// Returns the updated registration, or `None` when the registration
    /// exists but is not in the registered state (already attended, or
    /// cancelled).
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownRegistration`] when no registration matches
    /// the key.
    pub async fn check_in(&mut self, key: &str) -> Result<Option<Registration>> {
        let id = self
            .registrations
            .get(key)
            .or_else(|| self.registrations.find_by_qr(key))
            .map(|r| r.id)
            .ok_or_else(|| Error::unknown_registration(key))?;

        let Some(registration) = self.registrations.check_in(&id) else {
            debug!(id = %id, "Check-in skipped, registration not in registered state");
            return Ok(None);
        };

        if let Some(event) = self.events.get(&registration.event_id) {
            self.dispatch(NotificationMessage::checked_in(
                &registration,
                &event,
                self.tz_offset,
            ))
            .await;
        } else {
            warn!(
                event_id = %registration.event_id,
                "Check-in recorded for an event that no longer exists, skipping notification"
            );
        }

        Ok(Some(registration))
    }

    /// Cancel a registration.
    ///
    /// Returns the updated registration, or `None` when the id is unknown
    /// or the registration was already cancelled.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CancelAfterCheckIn`] when the participant has
    /// already checked in.
    pub async fn cancel(&mut self, id: &str, reason: &str) -> Result<Option<Registration>> {
        let Some(registration) = self.registrations.cancel(id, reason)? else {
            return Ok(None);
        };

        if let Some(event) = self.events.get(&registration.event_id) {
            self.dispatch(NotificationMessage::registration_cancelled(
                &registration,
                &event,
                self.tz_offset,
            ))
            .await;
        }

        Ok(Some(registration))
    }

    /// Send a reminder to every registered participant of an event.
    ///
    /// Returns the number of participants a reminder was built for.
    /// Attended and cancelled registrations are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownEvent`] when the event does not exist.
    pub async fn remind(&self, event_id: &str) -> Result<usize> {
        let event = self
            .events
            .get(event_id)
            .ok_or_else(|| Error::unknown_event(event_id))?;

        let pending: Vec<Registration> = self
            .registrations
            .by_event(event_id)
            .into_iter()
            .filter(|r| r.status == RegistrationStatus::Registered)
            .collect();

        let today = self.today();
        for registration in &pending {
            self.dispatch(NotificationMessage::event_reminder(
                registration,
                &event,
                today,
            ))
            .await;
        }

        Ok(pending.len())
    }

    /// Whether an event can currently take a new registration.
    #[must_use]
    pub fn can_register(&self, event: &Event) -> bool {
        let existing = self.registrations.by_event(&event.id);
        capacity::can_register(event, &existing, self.today())
    }

    /// Offer a message to every configured channel, logging failures.
    async fn dispatch(&self, message: NotificationMessage) {
        for notifier in &self.notifiers {
            if let Err(error) = notifier.send(&message).await {
                warn!(
                    channel = notifier.name(),
                    kind = %message.kind,
                    %error,
                    "Notification delivery failed"
                );
            }
        }
    }
}
