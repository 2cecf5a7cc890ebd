//! Status monitoring: snapshot model, HTTP fetching and change detection.

pub mod detector;
pub mod fetcher;
pub mod snapshot;

pub use detector::{ChangeDetector, DetectionResult, RemovedComponentPolicy, Transition};
pub use fetcher::{StatusFetcher, StatusSource};
pub use snapshot::{Component, ComponentStatus, PageInfo, Snapshot};
