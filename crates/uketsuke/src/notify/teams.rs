//! Microsoft Teams channel stub.

use std::collections::HashMap;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::notify::{DeliveryReceipt, NotificationKind, NotificationMessage, Notifier};

/// Teams notification stub.
///
/// Assembles the MessageCard payload the production webhook would receive,
/// resolves the department channel, and logs the card instead of posting.
#[derive(Debug, Default)]
pub struct TeamsNotifier {
    /// Webhook used when no department-specific channel matches.
    default_webhook: String,
    /// Department name to webhook URL.
    webhooks: HashMap<String, String>,
    simulate_failure: bool,
}

impl TeamsNotifier {
    /// Create a stub with the given channel routing.
    #[must_use]
    pub fn new(default_webhook: impl Into<String>, webhooks: HashMap<String, String>) -> Self {
        Self {
            default_webhook: default_webhook.into(),
            webhooks,
            simulate_failure: false,
        }
    }

    /// Create a stub that rejects every message. Test hook for the
    /// fire-and-forget guarantee.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            simulate_failure: true,
            ..Self::default()
        }
    }

    /// Webhook URL for a department, falling back to the default channel.
    #[must_use]
    pub fn webhook_for(&self, department: &str) -> &str {
        self.webhooks
            .get(department)
            .map_or(self.default_webhook.as_str(), String::as_str)
    }
}

fn theme_color(kind: NotificationKind) -> &'static str {
    match kind {
        NotificationKind::RegistrationConfirmed => "0076D7",
        NotificationKind::CheckedIn => "28a745",
        NotificationKind::RegistrationCancelled => "dc3545",
        NotificationKind::EventReminder => "ffc107",
    }
}

fn card_title(kind: NotificationKind) -> &'static str {
    match kind {
        NotificationKind::RegistrationConfirmed => "📝 イベント申込通知",
        NotificationKind::CheckedIn => "📅 イベント受付通知",
        NotificationKind::RegistrationCancelled => "❌ 申込キャンセル通知",
        NotificationKind::EventReminder => "🔔 イベントリマインダー",
    }
}

fn message_card(message: &NotificationMessage) -> serde_json::Value {
    serde_json::json!({
        "@type": "MessageCard",
        "@context": "http://schema.org/extensions",
        "themeColor": theme_color(message.kind),
        "summary": message.subject,
        "sections": [{
            "activityTitle": card_title(message.kind),
            "activitySubtitle": message.subject,
            "facts": message.facts,
            "markdown": true
        }]
    })
}

#[async_trait::async_trait]
impl Notifier for TeamsNotifier {
    fn name(&self) -> &'static str {
        "teams"
    }

    async fn send(&self, message: &NotificationMessage) -> Result<DeliveryReceipt> {
        if self.simulate_failure {
            warn!(
                department = %message.department,
                kind = %message.kind,
                "Teams post failed: simulated teams failure"
            );
            return Err(Error::delivery("simulated teams failure"));
        }

        let webhook = self.webhook_for(&message.department);
        let card = message_card(message);
        let payload = serde_json::to_string_pretty(&card)?;

        let message_id = format!("card_{}", Utc::now().timestamp_millis());
        info!(
            department = %message.department,
            kind = %message.kind,
            message_id = %message_id,
            "Teams card posted (stub, logged only)"
        );
        debug!(webhook = %webhook, "Teams payload:\n{payload}");

        Ok(DeliveryReceipt {
            channel: "teams",
            message_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{Event, EventForm};
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
            name: "田中 太郎".to_string(),
            email: "tanaka@example.com".to_string(),
            department: "営業部".to_string(),
            ..RegistrationForm::default()
        })
        .unwrap();
        let offset = FixedOffset::east_opt(9 * 3600).unwrap();
        NotificationMessage::registration_confirmed(&registration, &event, offset)
    }

    fn test_webhooks() -> HashMap<String, String> {
        let mut map = HashMap::new();
        map.insert(
            "営業部".to_string(),
            "https://example.test/hooks/sales".to_string(),
        );
        map.insert(
            "人事部".to_string(),
            "https://example.test/hooks/hr".to_string(),
        );
        map
    }

    #[test]
    fn test_webhook_routing() {
        let notifier = TeamsNotifier::new("https://example.test/hooks/general", test_webhooks());

        assert_eq!(
            notifier.webhook_for("営業部"),
            "https://example.test/hooks/sales"
        );
        assert_eq!(
            notifier.webhook_for("未知の部署"),
            "https://example.test/hooks/general"
        );
        assert_eq!(
            notifier.webhook_for(""),
            "https://example.test/hooks/general"
        );
    }

    #[test]
    fn test_message_card_shape() {
        let card = message_card(&test_message());

        assert_eq!(card["@type"], "MessageCard");
        assert_eq!(card["@context"], "http://schema.org/extensions");
        assert_eq!(card["themeColor"], "0076D7");

        let section = &card["sections"][0];
        assert_eq!(section["activityTitle"], "📝 イベント申込通知");
        assert_eq!(section["markdown"], true);
        let facts = section["facts"].as_array().unwrap();
        assert!(facts.iter().any(|f| f["name"] == "イベント名"));
    }

    #[tokio::test]
    async fn test_send_returns_receipt() {
        let notifier = TeamsNotifier::new("https://example.test/hooks/general", test_webhooks());
        let receipt = notifier.send(&test_message()).await.unwrap();

        assert_eq!(receipt.channel, "teams");
        assert!(receipt.message_id.starts_with("card_"));
    }

    #[tokio::test]
    async fn test_failing_stub_rejects() {
        let notifier = TeamsNotifier::failing();
        assert!(notifier.send(&test_message()).await.is_err());
    }
}
