//! Seat availability calculations.
//!
//! Pure functions over a snapshot of an event's registrations. Nothing here
//! is cached; callers recompute after every mutation that can change the
//! active count.

use chrono::NaiveDate;

use crate::event::Event;
use crate::registration::Registration;

/// Count the registrations that still occupy a seat.
///
/// Cancelled registrations free their seat; registered and attended ones
/// hold it.
#[must_use]
pub fn active_count(registrations: &[Registration]) -> u32 {
    registrations
        .iter()
        .filter(|r| r.is_active())
        .count()
        .try_into()
        .unwrap_or(u32::MAX)
}

/// Seats still available for an event.
///
/// Never negative; an overbooked event reports zero.
#[must_use]
pub fn available(event: &Event, registrations: &[Registration]) -> u32 {
    event.capacity.saturating_sub(active_count(registrations))
}

/// Whether a new registration is currently accepted for an event.
///
/// True when the event is active, a seat is available, and `today` is on
/// or before the registration deadline. Events without a deadline accept
/// until full.
#[must_use]
pub fn can_register(event: &Event, registrations: &[Registration], today: NaiveDate) -> bool {
    if !event.is_active() {
        return false;
    }
    if available(event, registrations) == 0 {
        return false;
    }
    match event.registration_deadline {
        Some(deadline) => today <= deadline,
        None => true,
    }
}
