//! Notification message construction.
//!
//! Messages are built once per lifecycle transition and handed to every
//! configured channel. The email channel renders the subject and body; the
//! Teams channel renders the fact list. All participant-facing text is
//! Japanese, matching the desk's correspondence.

use chrono::{FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::event::Event;
use crate::export::format_local;
use crate::registration::Registration;

/// What a notification is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// A registration was accepted.
    RegistrationConfirmed,
    /// A registration was cancelled.
    RegistrationCancelled,
    /// A participant checked in at the desk.
    CheckedIn,
    /// A reminder ahead of the event.
    EventReminder,
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RegistrationConfirmed => write!(f, "registration_confirmed"),
            Self::RegistrationCancelled => write!(f, "registration_cancelled"),
            Self::CheckedIn => write!(f, "checked_in"),
            Self::EventReminder => write!(f, "event_reminder"),
        }
    }
}

/// A name/value pair rendered as a fact row in rich channels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fact {
    /// Row label.
    pub name: String,
    /// Row value.
    pub value: String,
}

impl Fact {
    /// Create a fact row.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A channel-independent notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationMessage {
    /// What the notification is about.
    pub kind: NotificationKind,
    /// Recipient email address.
    pub recipient: String,
    /// Recipient display name.
    pub recipient_name: String,
    /// Subject line.
    pub subject: String,
    /// Plain-text body.
    pub body: String,
    /// Fact rows for card-style channels.
    pub facts: Vec<Fact>,
    /// Department used for channel routing.
    pub department: String,
    /// Registration the message concerns.
    pub registration_id: Option<String>,
}

impl NotificationMessage {
    /// Build the registration confirmation message.
    #[must_use]
    pub fn registration_confirmed(
        registration: &Registration,
        event: &Event,
        offset: FixedOffset,
    ) -> Self {
        let name = &registration.name;
        let event_name = &event.name;
        let registered_at = format_local(registration.registered_at, offset);
        let venue = venue_line(event);

        let body = format!(
            "{name} 様\n\n\
             この度は「{event_name}」にお申込みいただき、誠にありがとうございます。\n\n\
             ■ 申込情報\n\
             ・お名前: {name}\n\
             ・会社名: {company}\n\
             ・メールアドレス: {email}\n\
             ・申込日時: {registered_at}\n\
             ・申込ID: {id}\n\n\
             ■ イベント詳細\n\
             ・イベント名: {event_name}\n\
             ・開催日時: {schedule}\n\
             ・会場: {venue}\n\n\
             ■ 受付について\n\
             当日は下記のQRコードをご提示いただくか、申込IDをお伝えください。\n\n\
             申込ID: {id}\n\
             QRコード: {qr}\n\n\
             皆様のご参加を心よりお待ちしております。\n",
            company = or_private(&registration.company),
            email = registration.email,
            id = registration.id,
            schedule = event_schedule(event),
            qr = registration.qr_code,
        );

        Self {
            kind: NotificationKind::RegistrationConfirmed,
            recipient: registration.email.clone(),
            recipient_name: registration.name.clone(),
            subject: format!("【申込確認】{event_name} - 申込完了のお知らせ"),
            body,
            facts: vec![
                Fact::new("イベント名", event_name),
                Fact::new("参加者名", name),
                Fact::new("会社名", or_private(&registration.company)),
                Fact::new("申込日時", registered_at),
                Fact::new("申込ID", &registration.id),
            ],
            department: registration.department.clone(),
            registration_id: Some(registration.id.clone()),
        }
    }

    /// Build the cancellation confirmation message.
    #[must_use]
    pub fn registration_cancelled(
        registration: &Registration,
        event: &Event,
        offset: FixedOffset,
    ) -> Self {
        let name = &registration.name;
        let event_name = &event.name;
        let cancelled_at = registration
            .cancelled_at
            .map(|t| format_local(t, offset))
            .unwrap_or_default();

        let body = format!(
            "{name} 様\n\n\
             「{event_name}」のキャンセルを承りました。\n\n\
             ■ キャンセル情報\n\
             ・イベント名: {event_name}\n\
             ・申込ID: {id}\n\
             ・キャンセル日時: {cancelled_at}\n\n\
             キャンセル手続きが完了いたしました。\n\n\
             今後とも弊社イベントをご愛顧いただけますよう、よろしくお願いいたします。\n",
            id = registration.id,
        );

        Self {
            kind: NotificationKind::RegistrationCancelled,
            recipient: registration.email.clone(),
            recipient_name: registration.name.clone(),
            subject: format!("【キャンセル確認】{event_name} - キャンセル完了のお知らせ"),
            body,
            facts: vec![
                Fact::new("イベント名", event_name),
                Fact::new("参加者名", name),
                Fact::new("申込ID", &registration.id),
                Fact::new("キャンセル日時", cancelled_at),
            ],
            department: registration.department.clone(),
            registration_id: Some(registration.id.clone()),
        }
    }

    /// Build the check-in completion message.
    #[must_use]
    pub fn checked_in(registration: &Registration, event: &Event, offset: FixedOffset) -> Self {
        let name = &registration.name;
        let event_name = &event.name;
        let checked_in_at = registration
            .check_in_time
            .map(|t| format_local(t, offset))
            .unwrap_or_default();

        let body = format!(
            "{name} 様\n\n\
             「{event_name}」の受付が完了しました。\n\
             本日はご来場いただき、誠にありがとうございます。\n\n\
             ・受付時刻: {checked_in_at}\n\
             ・申込ID: {id}\n",
            id = registration.id,
        );

        Self {
            kind: NotificationKind::CheckedIn,
            recipient: registration.email.clone(),
            recipient_name: registration.name.clone(),
            subject: format!("【チェックイン完了】{event_name} - ご来場ありがとうございます"),
            body,
            facts: vec![
                Fact::new("イベント名", event_name),
                Fact::new("参加者名", name),
                Fact::new("会社名", or_private(&registration.company)),
                Fact::new("受付時刻", checked_in_at),
                Fact::new("QRコード", "有り"),
            ],
            department: registration.department.clone(),
            registration_id: Some(registration.id.clone()),
        }
    }

    /// Build the pre-event reminder message.
    #[must_use]
    pub fn event_reminder(registration: &Registration, event: &Event, today: NaiveDate) -> Self {
        let name = &registration.name;
        let event_name = &event.name;
        let days_until = (event.date - today).num_days();
        let opening = if days_until > 0 {
            format!("「{event_name}」の開催が{days_until}日後に迫りました。")
        } else if days_until == 0 {
            format!("「{event_name}」は本日開催です。")
        } else {
            format!("「{event_name}」は開催済みです。")
        };

        let body = format!(
            "{name} 様\n\n\
             {opening}\n\n\
             ■ イベント詳細（再確認）\n\
             ・イベント名: {event_name}\n\
             ・開催日時: {schedule}\n\
             ・会場: {venue}\n\
             ・申込ID: {id}\n\n\
             ■ 当日の受付について\n\
             ・受付開始: イベント開始30分前\n\
             ・QRコードまたは申込IDをご提示ください\n\n\
             当日お会いできることを楽しみにしております。\n",
            schedule = event_schedule(event),
            venue = venue_line(event),
            id = registration.id,
        );

        Self {
            kind: NotificationKind::EventReminder,
            recipient: registration.email.clone(),
            recipient_name: registration.name.clone(),
            subject: format!("【リマインダー】{event_name} - 開催のお知らせ"),
            body,
            facts: vec![
                Fact::new("イベント名", event_name),
                Fact::new("参加者名", name),
                Fact::new("開催日", event.date.format("%Y/%m/%d").to_string()),
                Fact::new("申込ID", &registration.id),
            ],
            department: registration.department.clone(),
            registration_id: Some(registration.id.clone()),
        }
    }
}

fn event_schedule(event: &Event) -> String {
    match event.time {
        Some(time) => format!(
            "{} {}",
            event.date.format("%Y/%m/%d"),
            time.format("%H:%M")
        ),
        None => event.date.format("%Y/%m/%d").to_string(),
    }
}

fn venue_line(event: &Event) -> String {
    if event.location.trim().is_empty() {
        "詳細は別途ご案内いたします".to_string()
    } else {
        event.location.clone()
    }
}

fn or_private(company: &str) -> String {
    if company.trim().is_empty() {
        "個人".to_string()
    } else {
        company.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventForm;
    use crate::registration::RegistrationForm;
    use chrono::NaiveTime;

    fn jst() -> FixedOffset {
        FixedOffset::east_opt(9 * 3600).unwrap()
    }

    fn test_event() -> Event {
        Event::new(EventForm {
            name: "テックカンファレンス2026".to_string(),
            date: NaiveDate::from_ymd_opt(2026, 9, 15).unwrap(),
            time: NaiveTime::from_hms_opt(14, 0, 0),
            location: "東京国際フォーラム".to_string(),
            capacity: 100,
            ..EventForm::default()
        })
        .unwrap()
    }

    fn test_registration() -> Registration {
        Registration::new(RegistrationForm {
            event_id: "event_1".to_string(),
            name: "田中 太郎".to_string(),
            email: "tanaka@example.com".to_string(),
            department: "営業部".to_string(),
            ..RegistrationForm::default()
        })
        .unwrap()
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(
            NotificationKind::RegistrationConfirmed.to_string(),
            "registration_confirmed"
        );
        assert_eq!(NotificationKind::CheckedIn.to_string(), "checked_in");
    }

    #[test]
    fn test_fact_serialization() {
        let fact = Fact::new("イベント名", "説明会");
        let json = serde_json::to_string(&fact).unwrap();
        assert_eq!(json, r#"{"name":"イベント名","value":"説明会"}"#);
    }

    #[test]
    fn test_confirmation_message() {
        let reg = test_registration();
        let msg = NotificationMessage::registration_confirmed(&reg, &test_event(), jst());

        assert_eq!(msg.kind, NotificationKind::RegistrationConfirmed);
        assert_eq!(msg.recipient, "tanaka@example.com");
        assert_eq!(
            msg.subject,
            "【申込確認】テックカンファレンス2026 - 申込完了のお知らせ"
        );
        assert!(msg.body.starts_with("田中 太郎 様"));
        assert!(msg.body.contains(&reg.id));
        assert!(msg.body.contains(&reg.qr_code));
        assert!(msg.body.contains("2026/09/15 14:00"));
        assert_eq!(msg.department, "営業部");
        assert_eq!(msg.registration_id.as_deref(), Some(reg.id.as_str()));
    }

    #[test]
    fn test_confirmation_empty_company_reads_private() {
        let reg = test_registration();
        let msg = NotificationMessage::registration_confirmed(&reg, &test_event(), jst());
        assert!(msg.facts.iter().any(|f| f.name == "会社名" && f.value == "個人"));
    }

    #[test]
    fn test_cancellation_message() {
        let mut reg = test_registration();
        reg.cancelled_at = Some(chrono::Utc::now());
        let msg = NotificationMessage::registration_cancelled(&reg, &test_event(), jst());

        assert!(msg.subject.starts_with("【キャンセル確認】"));
        assert!(msg.body.contains("キャンセルを承りました"));
    }

    #[test]
    fn test_checked_in_message() {
        let mut reg = test_registration();
        reg.check_in_time = Some(chrono::Utc::now());
        let msg = NotificationMessage::checked_in(&reg, &test_event(), jst());

        assert!(msg.subject.starts_with("【チェックイン完了】"));
        assert!(msg.facts.iter().any(|f| f.name == "受付時刻"));
    }

    #[test]
    fn test_reminder_counts_days() {
        let reg = test_registration();
        let event = test_event();

        let before = NaiveDate::from_ymd_opt(2026, 9, 12).unwrap();
        let msg = NotificationMessage::event_reminder(&reg, &event, before);
        assert!(msg.body.contains("3日後に迫りました"));

        let on_the_day = event.date;
        let msg = NotificationMessage::event_reminder(&reg, &event, on_the_day);
        assert!(msg.body.contains("本日開催です"));
    }

    #[test]
    fn test_reminder_for_past_event() {
        let reg = test_registration();
        let event = test_event();

        let after = NaiveDate::from_ymd_opt(2026, 9, 20).unwrap();
        let msg = NotificationMessage::event_reminder(&reg, &event, after);
        assert!(msg.body.contains("開催済みです"));
        assert!(!msg.body.contains("本日開催です"));
    }

    #[test]
    fn test_missing_venue_placeholder() {
        let mut event = test_event();
        event.location = String::new();
        let msg =
            NotificationMessage::registration_confirmed(&test_registration(), &event, jst());
        assert!(msg.body.contains("詳細は別途ご案内いたします"));
    }
}
