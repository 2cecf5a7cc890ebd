//! Rendering of snapshots and detected changes into webhook payloads.
//!
//! Every message has the same semantic content regardless of the output
//! format: a title, the overall indicator line, then one line per reported
//! component.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::FetchError;
use crate::monitor::{Component, ComponentStatus, DetectionResult, Snapshot, Transition};

const ADAPTIVE_CARD_CONTENT_TYPE: &str = "application/vnd.microsoft.card.adaptive";
const ADAPTIVE_CARD_SCHEMA: &str = "http://adaptivecards.io/schemas/adaptive-card.json";
const FALLBACK_PAGE_NAME: &str = "Status page";
const FETCH_ERROR_TITLE: &str = "❌ Error fetching status";

/// Outbound JSON shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PayloadFormat {
    /// Teams message carrying an Adaptive Card.
    #[default]
    Card,
    /// Plain `{"text": ...}` body with Markdown.
    Text,
}

impl FromStr for PayloadFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "card" | "adaptive_card" | "adaptivecard" => Ok(Self::Card),
            "text" | "plain" => Ok(Self::Text),
            other => Err(format!(
                "unknown payload format '{}', expected card or text",
                other
            )),
        }
    }
}

/// Emoji set used for component and overall status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmojiStyle {
    /// One emoji per status level.
    #[default]
    Detailed,
    /// Green for healthy, red for everything else.
    Binary,
}

impl FromStr for EmojiStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "detailed" | "full" => Ok(Self::Detailed),
            "binary" | "simple" => Ok(Self::Binary),
            other => Err(format!(
                "unknown emoji style '{}', expected detailed or binary",
                other
            )),
        }
    }
}

impl EmojiStyle {
    pub fn component(&self, status: ComponentStatus) -> &'static str {
        match self {
            Self::Detailed => match status {
                ComponentStatus::Operational => "🟢",
                ComponentStatus::DegradedPerformance => "🟡",
                ComponentStatus::PartialOutage => "🟠",
                ComponentStatus::MajorOutage => "🔴",
                ComponentStatus::UnderMaintenance => "🔧",
                ComponentStatus::Unknown => "⚪",
            },
            Self::Binary => {
                if status.is_operational() {
                    "🟢"
                } else {
                    "🔴"
                }
            }
        }
    }

    /// Emoji for the page-wide indicator (`none`, `minor`, `major`, `critical`, ...).
    pub fn indicator(&self, indicator: &str) -> &'static str {
        let indicator = indicator.trim().to_ascii_lowercase();
        match self {
            Self::Detailed => match indicator.as_str() {
                "none" => "🟢",
                "minor" => "🟡",
                "major" => "🟠",
                "critical" => "🔴",
                "maintenance" => "🔧",
                _ => "⚪",
            },
            Self::Binary => {
                if indicator == "none" {
                    "🟢"
                } else {
                    "🔴"
                }
            }
        }
    }
}

/// What a payload reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    InitialSummary,
    StatusChange,
    DegradedSummary,
    ComponentRemoved,
    FetchError,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InitialSummary => "initial_summary",
            Self::StatusChange => "status_change",
            Self::DegradedSummary => "degraded_summary",
            Self::ComponentRemoved => "component_removed",
            Self::FetchError => "fetch_error",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A rendered, ready-to-send webhook body.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationPayload {
    kind: NotificationKind,
    title: String,
    body: Value,
}

impl NotificationPayload {
    pub fn kind(&self) -> NotificationKind {
        self.kind
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// JSON body POSTed to the webhook.
    pub fn body(&self) -> &Value {
        &self.body
    }
}

/// Format-independent message content.
struct Message {
    kind: NotificationKind,
    title: String,
    overall: String,
    lines: Vec<String>,
}

/// Turns detection results into webhook payloads.
#[derive(Debug, Clone, Copy, Default)]
pub struct MessageFormatter {
    format: PayloadFormat,
    emoji: EmojiStyle,
    notify_on_first_run: bool,
}

impl MessageFormatter {
    pub fn new(format: PayloadFormat, emoji: EmojiStyle, notify_on_first_run: bool) -> Self {
        Self {
            format,
            emoji,
            notify_on_first_run,
        }
    }

    /// Payloads for one successful cycle, possibly none.
    ///
    /// The first run reports no transitions; it adds the full component list
    /// when `notify_on_first_run` is set. Every run ends with the degraded
    /// summary if anything is degraded.
    pub fn format_cycle(
        &self,
        snapshot: &Snapshot,
        detection: &DetectionResult,
    ) -> Vec<NotificationPayload> {
        let mut messages = Vec::new();

        if detection.is_first_run {
            if self.notify_on_first_run {
                messages.push(self.initial_summary(snapshot));
            }
        } else {
            messages.extend(
                detection
                    .transitions
                    .iter()
                    .map(|t| self.status_change(snapshot, t)),
            );
            messages.extend(
                detection
                    .removed
                    .iter()
                    .map(|c| self.component_removed(snapshot, c)),
            );
        }

        if detection.any_degraded {
            messages.push(self.degraded_summary(snapshot));
        }

        messages.into_iter().map(|m| self.render(m)).collect()
    }

    /// Fixed error card sent when the status document could not be retrieved.
    pub fn format_fetch_error(&self, error: &FetchError) -> NotificationPayload {
        self.render(Message {
            kind: NotificationKind::FetchError,
            title: FETCH_ERROR_TITLE.to_string(),
            overall: error.to_string(),
            lines: Vec::new(),
        })
    }

    fn initial_summary(&self, snapshot: &Snapshot) -> Message {
        Message {
            kind: NotificationKind::InitialSummary,
            title: format!("{}: current status", page_name(snapshot)),
            overall: self.overall_line(snapshot),
            lines: snapshot
                .components()
                .iter()
                .map(|c| self.component_line(c))
                .collect(),
        }
    }

    fn degraded_summary(&self, snapshot: &Snapshot) -> Message {
        Message {
            kind: NotificationKind::DegradedSummary,
            title: format!("{}: degraded components", page_name(snapshot)),
            overall: self.overall_line(snapshot),
            lines: snapshot
                .degraded_components()
                .map(|c| self.component_line(c))
                .collect(),
        }
    }

    fn status_change(&self, snapshot: &Snapshot, transition: &Transition) -> Message {
        Message {
            kind: NotificationKind::StatusChange,
            title: format!("{}: status change", page_name(snapshot)),
            overall: self.overall_line(snapshot),
            lines: vec![format!(
                "{} {}: {} → {}",
                self.emoji.component(transition.new_status),
                transition.component_name,
                transition.previous_status,
                transition.new_status
            )],
        }
    }

    fn component_removed(&self, snapshot: &Snapshot, component: &Component) -> Message {
        Message {
            kind: NotificationKind::ComponentRemoved,
            title: format!("{}: component removed", page_name(snapshot)),
            overall: self.overall_line(snapshot),
            lines: vec![format!(
                "{} {}: {} → removed",
                self.emoji.component(ComponentStatus::Unknown),
                component.name,
                component.status
            )],
        }
    }

    fn overall_line(&self, snapshot: &Snapshot) -> String {
        let indicator = snapshot.overall_indicator();
        let description = match snapshot.overall_description() {
            "" => "Unknown",
            d => d,
        };
        if indicator.is_empty() {
            format!("{} {}", self.emoji.indicator(indicator), description)
        } else {
            format!(
                "{} {} ({})",
                self.emoji.indicator(indicator),
                description,
                indicator
            )
        }
    }

    fn component_line(&self, component: &Component) -> String {
        format!(
            "{} {}: {}",
            self.emoji.component(component.status),
            component.name,
            component.status
        )
    }

    fn render(&self, message: Message) -> NotificationPayload {
        let body = match self.format {
            PayloadFormat::Card => render_card(&message),
            PayloadFormat::Text => render_text(&message),
        };
        NotificationPayload {
            kind: message.kind,
            title: message.title,
            body,
        }
    }
}

fn page_name(snapshot: &Snapshot) -> &str {
    match snapshot.page().name.trim() {
        "" => FALLBACK_PAGE_NAME,
        name => name,
    }
}

fn render_card(message: &Message) -> Value {
    let mut body = vec![
        json!({
            "type": "TextBlock",
            "size": "Large",
            "weight": "Bolder",
            "text": message.title,
            "wrap": true
        }),
        json!({
            "type": "TextBlock",
            "text": message.overall,
            "wrap": true
        }),
    ];
    body.extend(message.lines.iter().map(|line| {
        json!({
            "type": "TextBlock",
            "text": line,
            "wrap": true
        })
    }));

    json!({
        "type": "message",
        "attachments": [{
            "contentType": ADAPTIVE_CARD_CONTENT_TYPE,
            "content": {
                "$schema": ADAPTIVE_CARD_SCHEMA,
                "type": "AdaptiveCard",
                "version": "1.0",
                "body": body
            }
        }]
    })
}

fn render_text(message: &Message) -> Value {
    let mut text = format!("## {}\n\n{}", message.title, message.overall);
    if !message.lines.is_empty() {
        text.push_str("\n\n");
        let lines: Vec<String> = message.lines.iter().map(|l| format!("- {}", l)).collect();
        text.push_str(&lines.join("\n"));
    }
    json!({ "text": text })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::{ChangeDetector, PageInfo};
    use chrono::Utc;

    fn snapshot(components: &[(&str, ComponentStatus)]) -> Snapshot {
        let page = PageInfo {
            name: "GitHub".to_string(),
            ..Default::default()
        };
        let (indicator, description) = if components.iter().all(|(_, s)| s.is_operational()) {
            ("none", "All Systems Operational")
        } else {
            ("major", "Partial System Outage")
        };
        Snapshot::new(
            page,
            indicator,
            description,
            components
                .iter()
                .map(|(name, status)| Component::new(*name, *status))
                .collect(),
            Utc::now(),
        )
    }

    fn card_texts(payload: &NotificationPayload) -> Vec<String> {
        payload.body()["attachments"][0]["content"]["body"]
            .as_array()
            .unwrap()
            .iter()
            .map(|block| block["text"].as_str().unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_component_emoji_detailed() {
        let style = EmojiStyle::Detailed;
        assert_eq!(style.component(ComponentStatus::Operational), "🟢");
        assert_eq!(style.component(ComponentStatus::DegradedPerformance), "🟡");
        assert_eq!(style.component(ComponentStatus::PartialOutage), "🟠");
        assert_eq!(style.component(ComponentStatus::MajorOutage), "🔴");
        assert_eq!(style.component(ComponentStatus::UnderMaintenance), "🔧");
        assert_eq!(style.component(ComponentStatus::Unknown), "⚪");
        assert_eq!(
            style.component(ComponentStatus::parse("flibbertigibbet")),
            "⚪"
        );
    }

    #[test]
    fn test_component_emoji_binary() {
        let style = EmojiStyle::Binary;
        assert_eq!(style.component(ComponentStatus::Operational), "🟢");
        assert_eq!(style.component(ComponentStatus::DegradedPerformance), "🔴");
        assert_eq!(style.component(ComponentStatus::Unknown), "🔴");
    }

    #[test]
    fn test_indicator_emoji() {
        assert_eq!(EmojiStyle::Detailed.indicator("none"), "🟢");
        assert_eq!(EmojiStyle::Detailed.indicator("Critical"), "🔴");
        assert_eq!(EmojiStyle::Detailed.indicator(""), "⚪");
        assert_eq!(EmojiStyle::Binary.indicator("minor"), "🔴");
        assert_eq!(EmojiStyle::Binary.indicator("none"), "🟢");
    }

    #[test]
    fn test_operational_unchanged_cycle_is_silent() {
        let formatter = MessageFormatter::default();
        let detector = ChangeDetector::default();
        let previous = snapshot(&[("API", ComponentStatus::Operational)]);
        let current = snapshot(&[("API", ComponentStatus::Operational)]);

        assert!(formatter
            .format_cycle(&current, &detector.detect(None, &current))
            .is_empty());
        assert!(formatter
            .format_cycle(&current, &detector.detect(Some(&previous), &current))
            .is_empty());
    }

    #[test]
    fn test_first_run_with_degraded_components() {
        let formatter = MessageFormatter::default();
        let current = snapshot(&[
            ("API", ComponentStatus::Operational),
            ("Git", ComponentStatus::MajorOutage),
        ]);
        let detection = ChangeDetector::default().detect(None, &current);

        let payloads = formatter.format_cycle(&current, &detection);
        assert_eq!(payloads.len(), 1);
        assert_eq!(payloads[0].kind(), NotificationKind::DegradedSummary);
        let texts = card_texts(&payloads[0]);
        assert_eq!(texts[0], "GitHub: degraded components");
        assert_eq!(texts[1], "🟠 Partial System Outage (major)");
        assert_eq!(&texts[2..], &["🔴 Git: major_outage".to_string()]);
    }

    #[test]
    fn test_first_run_summary_when_enabled() {
        let formatter = MessageFormatter::new(PayloadFormat::Card, EmojiStyle::Detailed, true);
        let current = snapshot(&[
            ("API", ComponentStatus::Operational),
            ("Git", ComponentStatus::MajorOutage),
        ]);
        let detection = ChangeDetector::default().detect(None, &current);

        let payloads = formatter.format_cycle(&current, &detection);
        let kinds: Vec<_> = payloads.iter().map(|p| p.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                NotificationKind::InitialSummary,
                NotificationKind::DegradedSummary
            ]
        );
        let texts = card_texts(&payloads[0]);
        assert_eq!(
            &texts[2..],
            &[
                "🟢 API: operational".to_string(),
                "🔴 Git: major_outage".to_string()
            ]
        );
        assert_eq!(
            &card_texts(&payloads[1])[2..],
            &["🔴 Git: major_outage".to_string()]
        );
    }

    #[test]
    fn test_first_run_summary_alone_when_healthy() {
        let formatter = MessageFormatter::new(PayloadFormat::Card, EmojiStyle::Detailed, true);
        let current = snapshot(&[("API", ComponentStatus::Operational)]);
        let detection = ChangeDetector::default().detect(None, &current);

        let payloads = formatter.format_cycle(&current, &detection);
        assert_eq!(payloads.len(), 1);
        assert_eq!(payloads[0].kind(), NotificationKind::InitialSummary);
    }

    #[test]
    fn test_change_and_degraded_summary() {
        let formatter = MessageFormatter::default();
        let previous = snapshot(&[("Git Operations", ComponentStatus::Operational)]);
        let current = snapshot(&[("Git Operations", ComponentStatus::MajorOutage)]);
        let detection = ChangeDetector::default().detect(Some(&previous), &current);

        let payloads = formatter.format_cycle(&current, &detection);
        let kinds: Vec<_> = payloads.iter().map(|p| p.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                NotificationKind::StatusChange,
                NotificationKind::DegradedSummary
            ]
        );

        let change = card_texts(&payloads[0]);
        assert_eq!(change[0], "GitHub: status change");
        assert_eq!(change[2], "🔴 Git Operations: operational → major_outage");

        let summary = card_texts(&payloads[1]);
        assert_eq!(&summary[2..], &["🔴 Git Operations: major_outage".to_string()]);
    }

    #[test]
    fn test_recovery_sends_only_change() {
        let formatter = MessageFormatter::default();
        let previous = snapshot(&[("Actions", ComponentStatus::PartialOutage)]);
        let current = snapshot(&[("Actions", ComponentStatus::Operational)]);
        let detection = ChangeDetector::default().detect(Some(&previous), &current);

        let payloads = formatter.format_cycle(&current, &detection);
        assert_eq!(payloads.len(), 1);
        assert_eq!(payloads[0].kind(), NotificationKind::StatusChange);
        assert!(card_texts(&payloads[0])[2].starts_with("🟢 Actions: partial_outage → operational"));
    }

    #[test]
    fn test_removed_component_message() {
        let formatter = MessageFormatter::new(PayloadFormat::Text, EmojiStyle::Detailed, false);
        let previous = snapshot(&[
            ("API", ComponentStatus::Operational),
            ("Pages", ComponentStatus::Operational),
        ]);
        let current = snapshot(&[("API", ComponentStatus::Operational)]);
        let detection = ChangeDetector::new(crate::monitor::RemovedComponentPolicy::Report)
            .detect(Some(&previous), &current);

        let payloads = formatter.format_cycle(&current, &detection);
        assert_eq!(payloads.len(), 1);
        assert_eq!(payloads[0].kind(), NotificationKind::ComponentRemoved);
        let text = payloads[0].body()["text"].as_str().unwrap();
        assert!(text.contains("- ⚪ Pages: operational → removed"));
    }

    #[test]
    fn test_text_format() {
        let formatter = MessageFormatter::new(PayloadFormat::Text, EmojiStyle::Detailed, false);
        let previous = snapshot(&[("Git Operations", ComponentStatus::Operational)]);
        let current = snapshot(&[("Git Operations", ComponentStatus::MajorOutage)]);
        let detection = ChangeDetector::default().detect(Some(&previous), &current);

        let payloads = formatter.format_cycle(&current, &detection);
        assert_eq!(
            payloads[0].body()["text"],
            "## GitHub: status change\n\n🟠 Partial System Outage (major)\n\n- 🔴 Git Operations: operational → major_outage"
        );
        assert!(payloads[0].body().get("attachments").is_none());
    }

    #[test]
    fn test_card_envelope() {
        let formatter = MessageFormatter::default();
        let current = snapshot(&[("Git", ComponentStatus::MajorOutage)]);
        let detection = ChangeDetector::default().detect(None, &current);

        let payloads = formatter.format_cycle(&current, &detection);
        let body = payloads[0].body();
        assert_eq!(body["type"], "message");
        assert_eq!(body["attachments"][0]["contentType"], ADAPTIVE_CARD_CONTENT_TYPE);
        assert_eq!(body["attachments"][0]["content"]["type"], "AdaptiveCard");
        assert_eq!(body["attachments"][0]["content"]["version"], "1.0");
    }

    #[test]
    fn test_fetch_error_card() {
        let formatter = MessageFormatter::default();
        let error = FetchError::Status {
            status: 503,
            body: "unavailable".to_string(),
        };

        let payload = formatter.format_fetch_error(&error);
        assert_eq!(payload.kind(), NotificationKind::FetchError);
        assert_eq!(payload.title(), FETCH_ERROR_TITLE);
        let texts = card_texts(&payload);
        assert_eq!(texts.len(), 2);
        assert!(texts[1].contains("503"));
    }

    #[test]
    fn test_missing_page_name_falls_back() {
        let formatter = MessageFormatter::default();
        let current = Snapshot::new(
            PageInfo::default(),
            "",
            "",
            vec![Component::new("API", ComponentStatus::Unknown)],
            Utc::now(),
        );
        let detection = ChangeDetector::default().detect(None, &current);

        let payloads = formatter.format_cycle(&current, &detection);
        let texts = card_texts(&payloads[0]);
        assert_eq!(texts[0], "Status page: degraded components");
        assert_eq!(texts[1], "⚪ Unknown");
        assert_eq!(texts[2], "⚪ API: unknown");
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!("card".parse::<PayloadFormat>(), Ok(PayloadFormat::Card));
        assert_eq!("Adaptive_Card".parse::<PayloadFormat>(), Ok(PayloadFormat::Card));
        assert_eq!("TEXT".parse::<PayloadFormat>(), Ok(PayloadFormat::Text));
        assert!("html".parse::<PayloadFormat>().is_err());
        assert_eq!("binary".parse::<EmojiStyle>(), Ok(EmojiStyle::Binary));
        assert!("rainbow".parse::<EmojiStyle>().is_err());
    }
}
