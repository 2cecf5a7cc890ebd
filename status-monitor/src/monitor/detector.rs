//! Change detection between two successive snapshots.

use std::collections::{HashMap, HashSet};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::snapshot::{Component, ComponentStatus, Snapshot};

/// How components that disappear from the feed are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovedComponentPolicy {
    /// Vanished components are not reported.
    #[default]
    Ignore,
    /// Vanished components are listed in [`DetectionResult::removed`].
    Report,
    /// Vanished components become a transition to `unknown`.
    Unknown,
}

impl FromStr for RemovedComponentPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ignore" => Ok(Self::Ignore),
            "report" | "removed" => Ok(Self::Report),
            "unknown" => Ok(Self::Unknown),
            other => Err(format!(
                "unknown policy '{}', expected ignore, report or unknown",
                other
            )),
        }
    }
}

/// A status change of one component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub component_name: String,
    pub previous_status: ComponentStatus,
    pub new_status: ComponentStatus,
}

/// Outcome of comparing two snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DetectionResult {
    /// No previous snapshot existed.
    pub is_first_run: bool,
    /// Changes in the current snapshot's component order.
    pub transitions: Vec<Transition>,
    /// Components gone from the current snapshot, with their last known status.
    pub removed: Vec<Component>,
    /// At least one current component is not operational.
    pub any_degraded: bool,
}

impl DetectionResult {
    pub fn has_changes(&self) -> bool {
        !self.transitions.is_empty() || !self.removed.is_empty()
    }
}

/// Compares snapshots component by component.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChangeDetector {
    removed_policy: RemovedComponentPolicy,
}

impl ChangeDetector {
    pub fn new(removed_policy: RemovedComponentPolicy) -> Self {
        Self { removed_policy }
    }

    pub fn detect(&self, previous: Option<&Snapshot>, current: &Snapshot) -> DetectionResult {
        let any_degraded = current.any_degraded();

        let Some(previous) = previous else {
            return DetectionResult {
                is_first_run: true,
                any_degraded,
                ..Default::default()
            };
        };

        let before: HashMap<&str, ComponentStatus> = previous
            .components()
            .iter()
            .map(|c| (c.name.as_str(), c.status))
            .collect();

        let mut transitions: Vec<Transition> = current
            .components()
            .iter()
            .filter_map(|c| match before.get(c.name.as_str()) {
                Some(&prev) if prev != c.status => Some(Transition {
                    component_name: c.name.clone(),
                    previous_status: prev,
                    new_status: c.status,
                }),
                _ => None,
            })
            .collect();

        let mut removed = Vec::new();
        if self.removed_policy != RemovedComponentPolicy::Ignore {
            let now: HashSet<&str> = current
                .components()
                .iter()
                .map(|c| c.name.as_str())
                .collect();
            let vanished = previous
                .components()
                .iter()
                .filter(|c| !now.contains(c.name.as_str()));

            match self.removed_policy {
                RemovedComponentPolicy::Report => removed.extend(vanished.cloned()),
                RemovedComponentPolicy::Unknown => transitions.extend(
                    vanished
                        .filter(|c| c.status != ComponentStatus::Unknown)
                        .map(|c| Transition {
                            component_name: c.name.clone(),
                            previous_status: c.status,
                            new_status: ComponentStatus::Unknown,
                        }),
                ),
                RemovedComponentPolicy::Ignore => {}
            }
        }

        DetectionResult {
            is_first_run: false,
            transitions,
            removed,
            any_degraded,
        }
    }
}
