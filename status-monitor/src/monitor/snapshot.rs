//! Status snapshot model.
//!
//! A [`Snapshot`] is one full reading of a status page. It is parsed from the
//! Statuspage-style `summary.json` document and never mutated afterwards.

use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Status of a single page component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentStatus {
    Operational,
    DegradedPerformance,
    PartialOutage,
    MajorOutage,
    UnderMaintenance,
    /// Missing or unrecognised status value.
    Unknown,
}

impl ComponentStatus {
    /// Parse a wire value. Never fails: anything unrecognised is `Unknown`.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "operational" => Self::Operational,
            "degraded_performance" => Self::DegradedPerformance,
            "partial_outage" => Self::PartialOutage,
            "major_outage" => Self::MajorOutage,
            "under_maintenance" => Self::UnderMaintenance,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Operational => "operational",
            Self::DegradedPerformance => "degraded_performance",
            Self::PartialOutage => "partial_outage",
            Self::MajorOutage => "major_outage",
            Self::UnderMaintenance => "under_maintenance",
            Self::Unknown => "unknown",
        }
    }

    pub fn is_operational(&self) -> bool {
        matches!(self, Self::Operational)
    }
}

impl fmt::Display for ComponentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named component of the status page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    pub name: String,
    pub status: ComponentStatus,
}

impl Component {
    pub fn new(name: impl Into<String>, status: ComponentStatus) -> Self {
        Self {
            name: name.into(),
            status,
        }
    }
}

/// Metadata about the status page itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    pub id: String,
    pub name: String,
    pub url: String,
    pub time_zone: String,
    pub updated_at: Option<DateTime<Utc>>,
}

/// One full status-page reading.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    page: PageInfo,
    overall_indicator: String,
    overall_description: String,
    components: Vec<Component>,
    fetched_at: DateTime<Utc>,
}

impl Snapshot {
    /// Build a snapshot. Later duplicates of a component name are dropped.
    pub fn new(
        page: PageInfo,
        overall_indicator: impl Into<String>,
        overall_description: impl Into<String>,
        components: Vec<Component>,
        fetched_at: DateTime<Utc>,
    ) -> Self {
        let mut seen = HashSet::with_capacity(components.len());
        let components = components
            .into_iter()
            .filter(|c| {
                let first = seen.insert(c.name.clone());
                if !first {
                    debug!(component = %c.name, "Dropping duplicate component");
                }
                first
            })
            .collect();

        Self {
            page,
            overall_indicator: overall_indicator.into(),
            overall_description: overall_description.into(),
            components,
            fetched_at,
        }
    }

    /// Parse a `summary.json` body. Missing fields fall back to defaults;
    /// only malformed JSON is an error.
    pub fn from_summary_json(
        body: &[u8],
        fetched_at: DateTime<Utc>,
    ) -> Result<Self, serde_json::Error> {
        let raw: RawSummary = serde_json::from_slice(body)?;
        Ok(raw.into_snapshot(fetched_at))
    }

    pub fn page(&self) -> &PageInfo {
        &self.page
    }

    pub fn overall_indicator(&self) -> &str {
        &self.overall_indicator
    }

    pub fn overall_description(&self) -> &str {
        &self.overall_description
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    /// Components whose status is anything but operational, in feed order.
    pub fn degraded_components(&self) -> impl Iterator<Item = &Component> {
        self.components.iter().filter(|c| !c.status.is_operational())
    }

    pub fn any_degraded(&self) -> bool {
        self.degraded_components().next().is_some()
    }
}

// Wire shapes. Every field is optional; nulls and absences both default.

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawSummary {
    page: Option<RawPage>,
    status: Option<RawStatus>,
    components: Option<Vec<RawComponent>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawPage {
    id: Option<String>,
    name: Option<String>,
    url: Option<String>,
    time_zone: Option<String>,
    updated_at: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawStatus {
    indicator: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawComponent {
    name: Option<String>,
    status: Option<String>,
}

impl RawSummary {
    fn into_snapshot(self, fetched_at: DateTime<Utc>) -> Snapshot {
        let page = self.page.unwrap_or_default();
        let page = PageInfo {
            id: page.id.unwrap_or_default(),
            name: page.name.unwrap_or_default(),
            url: page.url.unwrap_or_default(),
            time_zone: page.time_zone.unwrap_or_default(),
            updated_at: page
                .updated_at
                .as_deref()
                .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
                .map(|ts| ts.with_timezone(&Utc)),
        };

        let status = self.status.unwrap_or_default();
        let components = self
            .components
            .unwrap_or_default()
            .into_iter()
            .map(|c| Component {
                name: c.name.unwrap_or_else(|| "Unknown".to_string()),
                status: c
                    .status
                    .as_deref()
                    .map(ComponentStatus::parse)
                    .unwrap_or(ComponentStatus::Unknown),
            })
            .collect();

        Snapshot::new(
            page,
            status.indicator.unwrap_or_default(),
            status.description.unwrap_or_default(),
            components,
            fetched_at,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUMMARY: &str = r#"{
        "page": {
            "id": "kctbh9vrtdwd",
            "name": "GitHub",
            "url": "https://www.githubstatus.com",
            "time_zone": "Etc/UTC",
            "updated_at": "2024-05-01T12:30:00.000Z"
        },
        "status": {"indicator": "minor", "description": "Minor Service Outage"},
        "components": [
            {"name": "Git Operations", "status": "operational", "id": "8l4ygp009s5s"},
            {"name": "Actions", "status": "partial_outage"},
            {"name": "Pages", "status": "Degraded_Performance"}
        ],
        "incidents": []
    }"#;

    #[test]
    fn test_parse_summary() {
        let snapshot = Snapshot::from_summary_json(SUMMARY.as_bytes(), Utc::now()).unwrap();

        assert_eq!(snapshot.page().name, "GitHub");
        assert_eq!(snapshot.page().time_zone, "Etc/UTC");
        assert!(snapshot.page().updated_at.is_some());
        assert_eq!(snapshot.overall_indicator(), "minor");
        assert_eq!(snapshot.overall_description(), "Minor Service Outage");
        assert_eq!(
            snapshot.components(),
            &[
                Component::new("Git Operations", ComponentStatus::Operational),
                Component::new("Actions", ComponentStatus::PartialOutage),
                Component::new("Pages", ComponentStatus::DegradedPerformance),
            ]
        );
        assert!(snapshot.any_degraded());
        assert_eq!(snapshot.degraded_components().count(), 2);
    }

    #[test]
    fn test_missing_fields_default() {
        let body = br#"{"components": [{"status": "operational"}, {"name": "API"}, {"name": "Hooks", "status": null}]}"#;
        let snapshot = Snapshot::from_summary_json(body, Utc::now()).unwrap();

        assert_eq!(snapshot.overall_indicator(), "");
        assert_eq!(snapshot.overall_description(), "");
        assert_eq!(snapshot.page(), &PageInfo::default());
        assert_eq!(snapshot.components()[0].name, "Unknown");
        assert_eq!(snapshot.components()[1].status, ComponentStatus::Unknown);
        assert_eq!(snapshot.components()[2].status, ComponentStatus::Unknown);
    }

    #[test]
    fn test_empty_document() {
        let snapshot = Snapshot::from_summary_json(b"{}", Utc::now()).unwrap();
        assert!(snapshot.components().is_empty());
        assert!(!snapshot.any_degraded());
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        assert!(Snapshot::from_summary_json(b"<html>", Utc::now()).is_err());
    }

    #[test]
    fn test_bad_updated_at_is_ignored() {
        let body = br#"{"page": {"name": "X", "updated_at": "yesterday"}}"#;
        let snapshot = Snapshot::from_summary_json(body, Utc::now()).unwrap();
        assert_eq!(snapshot.page().name, "X");
        assert!(snapshot.page().updated_at.is_none());
    }

    #[test]
    fn test_unknown_status_never_fails() {
        assert_eq!(
            ComponentStatus::parse("flibbertigibbet"),
            ComponentStatus::Unknown
        );
        assert_eq!(ComponentStatus::parse(""), ComponentStatus::Unknown);
        assert_eq!(
            ComponentStatus::parse(" MAJOR_OUTAGE "),
            ComponentStatus::MajorOutage
        );
    }

    #[test]
    fn test_duplicate_names_keep_first() {
        let snapshot = Snapshot::new(
            PageInfo::default(),
            "none",
            "All Systems Operational",
            vec![
                Component::new("API", ComponentStatus::Operational),
                Component::new("API", ComponentStatus::MajorOutage),
            ],
            Utc::now(),
        );
        assert_eq!(
            snapshot.components(),
            &[Component::new("API", ComponentStatus::Operational)]
        );
    }

    #[test]
    fn test_status_display_round_trips_wire_value() {
        for status in [
            ComponentStatus::Operational,
            ComponentStatus::DegradedPerformance,
            ComponentStatus::PartialOutage,
            ComponentStatus::MajorOutage,
            ComponentStatus::UnderMaintenance,
        ] {
            assert_eq!(ComponentStatus::parse(&status.to_string()), status);
        }
    }
}
