//! Polled CI status observations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StalenessError;

/// Lifecycle state of one CI run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum LifecycleState {
    InProgress,
    Completed,
}

/// Outcome of a completed CI run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Outcome {
    Succeeded,
    Failed,
    /// Canceled, partially succeeded, or anything else the feed reports.
    Other,
}

/// One polled observation of a CI run. Consumed immediately to compute
/// staleness, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CiStatusSample {
    /// The run's identifier in the CI system.
    pub external_build_id: String,

    /// Whether the run is still going.
    pub state: LifecycleState,

    /// Outcome, meaningful once completed.
    pub outcome: Outcome,

    /// When the run finished; absent while in progress.
    pub finished_at: Option<DateTime<Utc>>,
}

/// The CI status feed the staleness detector polls.
#[async_trait]
pub trait CiStatusFeed: Send + Sync {
    /// Fetch the most recent `count` runs for a definition on a branch,
    /// newest first, completed and in-progress alike.
    async fn recent_builds(
        &self,
        account: &str,
        project: &str,
        definition_id: &str,
        branch: &str,
        count: usize,
    ) -> Result<Vec<CiStatusSample>, StalenessError>;
}

/// Deep link to a CI run's results page.
pub fn build_results_link(account: &str, project: &str, external_build_id: &str) -> String {
    format!("https://dev.azure.com/{account}/{project}/_build/results?buildId={external_build_id}")
}
