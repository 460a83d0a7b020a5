//! Email channel stub.

use std::sync::Mutex;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::notify::{DeliveryReceipt, DeliveryRecord, NotificationMessage, Notifier};

/// Email notification stub.
///
/// Builds the same mail the production sender would and logs it instead of
/// handing it to a mail relay. Every attempt is recorded in an in-memory
/// history so the desk can answer "did they get the confirmation?".
#[derive(Debug, Default)]
pub struct EmailNotifier {
    simulate_failure: bool,
    history: Mutex<Vec<DeliveryRecord>>,
}

impl EmailNotifier {
    /// Create a stub that accepts every message.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a stub that rejects every message. Test hook for the
    /// fire-and-forget guarantee.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            simulate_failure: true,
            history: Mutex::new(Vec::new()),
        }
    }

    /// Delivery attempts recorded so far, optionally narrowed to one
    /// registration.
    #[must_use]
    pub fn history(&self, registration_id: Option<&str>) -> Vec<DeliveryRecord> {
        self.history
            .lock()
            .map(|records| {
                records
                    .iter()
                    .filter(|r| {
                        registration_id.map_or(true, |id| r.registration_id.as_deref() == Some(id))
                    })
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    fn record(&self, message: &NotificationMessage, error: Option<&str>) {
        if let Ok(mut history) = self.history.lock() {
            history.push(DeliveryRecord {
                at: Utc::now(),
                kind: message.kind,
                recipient: message.recipient.clone(),
                subject: message.subject.clone(),
                registration_id: message.registration_id.clone(),
                error: error.map(ToString::to_string),
            });
        }
    }
}

#[async_trait::async_trait]
impl Notifier for EmailNotifier {
    fn name(&self) -> &'static str {
        "email"
    }

    async fn send(&self, message: &NotificationMessage) -> Result<DeliveryReceipt> {
        if self.simulate_failure {
            let reason = "simulated email failure";
            self.record(message, Some(reason));
            warn!(
                to = %message.recipient,
                kind = %message.kind,
                "Email send failed: {reason}"
            );
            return Err(Error::delivery(reason));
        }

        let message_id = format!("msg_{}", Utc::now().timestamp_millis());
        info!(
            to = %message.recipient,
            subject = %message.subject,
            message_id = %message_id,
            "Email sent (stub, logged only)"
        );
        debug!("Email body:\n{}", message.body);
        self.record(message, None);

        Ok(DeliveryReceipt {
            channel: "email",
            message_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{Event, EventForm};
    use crate::notify::NotificationMessage;
    use crate::registration::{Registration, RegistrationForm};
    use chrono::{FixedOffset, NaiveDate};

    fn test_message() -> NotificationMessage {
        let event = Event::new(EventForm {
            name: "新製品説明会".to_string(),
            date: NaiveDate::from_ymd_opt(2026, 10, 1).unwrap(),
            capacity: 50,
            ..EventForm::default()
        })
        .unwrap();
        let registration = Registration::new(RegistrationForm {
            event_id: event.id.clone(),
            name: "佐藤 花子".to_string(),
            email: "sato@example.com".to_string(),
            ..RegistrationForm::default()
        })
        .unwrap();
        let offset = FixedOffset::east_opt(9 * 3600).unwrap();
        NotificationMessage::registration_confirmed(&registration, &event, offset)
    }

    #[tokio::test]
    async fn test_send_records_success() {
        let notifier = EmailNotifier::new();
        let message = test_message();

        let receipt = notifier.send(&message).await.unwrap();
        assert_eq!(receipt.channel, "email");
        assert!(receipt.message_id.starts_with("msg_"));

        let history = notifier.history(None);
        assert_eq!(history.len(), 1);
        assert!(history[0].succeeded());
        assert_eq!(history[0].recipient, "sato@example.com");
    }

    #[tokio::test]
    async fn test_failing_stub_records_error() {
        let notifier = EmailNotifier::failing();
        let message = test_message();

        let result = notifier.send(&message).await;
        assert!(result.is_err());

        let history = notifier.history(None);
        assert_eq!(history.len(), 1);
        assert!(!history[0].succeeded());
    }

    #[tokio::test]
    async fn test_history_filters_by_registration() {
        let notifier = EmailNotifier::new();
        let message = test_message();
        notifier.send(&message).await.unwrap();

        let id = message.registration_id.as_deref().unwrap();
        assert_eq!(notifier.history(Some(id)).len(), 1);
        assert!(notifier.history(Some("reg_unknown")).is_empty());
    }
}
