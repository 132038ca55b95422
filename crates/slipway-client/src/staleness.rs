//! Build freshness detection against the CI status feed.
//!
//! A displayed build is stale once a newer completed run exists on the same
//! definition and branch. Each poll tick is stateless apart from the
//! reference build: fetch a small window of recent runs, derive a
//! [`StalenessResult`], discard the samples.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use slipway_core::Build;

use crate::error::StalenessError;
use crate::status_feed::{build_results_link, CiStatusSample, CiStatusFeed, LifecycleState, Outcome};

/// How many recent runs one poll tick inspects.
pub const DEFAULT_SAMPLE_WINDOW: usize = 5;

/// The displayed build's CI coordinates, fixed for the life of the view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceBuild {
    pub account: String,
    pub project: String,
    pub definition_id: String,
    pub branch: String,
    pub external_build_id: String,
    pub produced_at: DateTime<Utc>,
}

impl TryFrom<&Build> for ReferenceBuild {
    type Error = StalenessError;

    fn try_from(build: &Build) -> Result<Self, Self::Error> {
        let ci = build.ci.as_ref().ok_or(StalenessError::MissingCiIdentity)?;
        Ok(Self {
            account: ci.account.clone(),
            project: ci.project.clone(),
            definition_id: ci.definition_id.clone(),
            branch: ci.branch.clone(),
            external_build_id: ci.external_build_id.clone(),
            produced_at: ci.produced_at,
        })
    }
}

/// Derived freshness answer for one poll tick.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StalenessResult {
    /// True when no completed run supersedes the reference build.
    pub is_most_recent: bool,

    /// Link to the earliest failed run among the newer ones, when present.
    pub most_recent_failure_link: Option<String>,
}

impl StalenessResult {
    /// The reference build is still current.
    pub fn most_recent() -> Self {
        Self {
            is_most_recent: true,
            most_recent_failure_link: None,
        }
    }
}

/// True when `sample` supersedes the reference build: completed, a different
/// run, and finished strictly after the reference was produced.
fn is_newer(reference: &ReferenceBuild, sample: &CiStatusSample) -> bool {
    if sample.state == LifecycleState::InProgress {
        return false;
    }
    if sample.external_build_id == reference.external_build_id {
        return false;
    }
    match sample.finished_at {
        Some(finished_at) => finished_at > reference.produced_at,
        None => false,
    }
}

/// Compute staleness of the reference build from one window of samples.
pub fn evaluate(reference: &ReferenceBuild, samples: &[CiStatusSample]) -> StalenessResult {
    let mut newer: Vec<&CiStatusSample> = samples
        .iter()
        .filter(|sample| is_newer(reference, sample))
        .collect();

    if newer.is_empty() {
        return StalenessResult::most_recent();
    }

    newer.sort_by_key(|sample| sample.finished_at);
    let failure_link = newer
        .iter()
        .find(|sample| sample.outcome == Outcome::Failed)
        .map(|sample| {
            build_results_link(
                &reference.account,
                &reference.project,
                &sample.external_build_id,
            )
        });

    StalenessResult {
        is_most_recent: false,
        most_recent_failure_link: failure_link,
    }
}

/// Polls the status feed for one reference build.
pub struct StalenessDetector {
    feed: Arc<dyn CiStatusFeed>,
    reference: ReferenceBuild,
    window: usize,
}

impl StalenessDetector {
    pub fn new(feed: Arc<dyn CiStatusFeed>, reference: ReferenceBuild) -> Self {
        Self {
            feed,
            reference,
            window: DEFAULT_SAMPLE_WINDOW,
        }
    }

    /// Override the sample window size.
    pub fn with_window(mut self, window: usize) -> Self {
        self.window = window;
        self
    }

    /// Run one poll tick.
    pub async fn check(&self) -> Result<StalenessResult, StalenessError> {
        let samples = self
            .feed
            .recent_builds(
                &self.reference.account,
                &self.reference.project,
                &self.reference.definition_id,
                &self.reference.branch,
                self.window,
            )
            .await?;
        Ok(evaluate(&self.reference, &samples))
    }
}

impl std::fmt::Debug for StalenessDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StalenessDetector")
            .field("reference", &self.reference)
            .field("window", &self.window)
            .finish()
    }
}

/// Freshness state the view renders.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum StalenessStatus {
    /// No tick has completed yet.
    Unknown,
    /// The displayed build is still the most recent.
    Fresh,
    /// A newer completed run exists.
    Superseded { failure_link: Option<String> },
    /// The last tick failed; the indicator degrades instead of the view.
    Unavailable,
}

/// Owns the poll loop for one active view.
///
/// Dropping the handle aborts the task, which releases the timer and any
/// in-flight fetch; no poll outlives its view.
#[derive(Debug)]
pub struct MonitorHandle {
    task: JoinHandle<()>,
}

impl Drop for MonitorHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Fixed-interval staleness polling with a watch output.
pub struct StalenessMonitor;

impl StalenessMonitor {
    /// Spawn the poll loop. The first tick runs immediately; after that one
    /// tick per `period`, and a new tick never starts while the previous
    /// fetch is outstanding.
    pub fn spawn(
        detector: StalenessDetector,
        period: Duration,
    ) -> (MonitorHandle, watch::Receiver<StalenessStatus>) {
        let (tx, rx) = watch::channel(StalenessStatus::Unknown);
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let status = match detector.check().await {
                    Ok(result) if result.is_most_recent => StalenessStatus::Fresh,
                    Ok(result) => StalenessStatus::Superseded {
                        failure_link: result.most_recent_failure_link,
                    },
                    Err(error) => {
                        tracing::warn!(event = "staleness.check_failed", error = %error);
                        StalenessStatus::Unavailable
                    }
                };
                if tx.send(status).is_err() {
                    break;
                }
            }
        });
        (MonitorHandle { task }, rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::{completed, in_progress, reference, ScriptedStatusFeed};

    #[test]
    fn test_superseded_with_failure_link() {
        let reference = reference("X", 0);
        let samples = vec![
            completed("X", 0, Outcome::Succeeded),
            completed("Y", 1, Outcome::Failed),
            in_progress("Z"),
        ];

        let result = evaluate(&reference, &samples);
        assert!(!result.is_most_recent);
        assert_eq!(
            result.most_recent_failure_link.as_deref(),
            Some("https://dev.azure.com/contoso/tools/_build/results?buildId=Y")
        );
    }

    #[test]
    fn test_most_recent_when_nothing_newer() {
        let reference = reference("X", 10);
        let samples = vec![
            completed("X", 10, Outcome::Succeeded),
            completed("W", 5, Outcome::Failed),
            completed("V", 10, Outcome::Succeeded),
        ];

        let result = evaluate(&reference, &samples);
        assert!(result.is_most_recent);
        assert!(result.most_recent_failure_link.is_none());
    }

    #[test]
    fn test_earliest_failure_wins_among_newer() {
        let reference = reference("X", 0);
        let samples = vec![
            completed("C", 3, Outcome::Failed),
            completed("A", 1, Outcome::Failed),
            completed("B", 2, Outcome::Succeeded),
        ];

        let result = evaluate(&reference, &samples);
        assert!(!result.is_most_recent);
        // Newer set sorted by finish time ascending; A fails first.
        assert!(result
            .most_recent_failure_link
            .as_deref()
            .unwrap()
            .ends_with("buildId=A"));
    }

    #[test]
    fn test_newer_successes_only_give_no_link() {
        let reference = reference("X", 0);
        let samples = vec![
            completed("A", 1, Outcome::Succeeded),
            completed("B", 2, Outcome::Other),
        ];

        let result = evaluate(&reference, &samples);
        assert!(!result.is_most_recent);
        assert!(result.most_recent_failure_link.is_none());
    }

    #[test]
    fn test_reference_build_requires_ci_identity() {
        let build = slipway_core::Build::without_ci(slipway_core::BuildId::new());
        let result = ReferenceBuild::try_from(&build);
        assert!(matches!(result, Err(StalenessError::MissingCiIdentity)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_monitor_degrades_on_feed_failure() {
        let feed = Arc::new(ScriptedStatusFeed::new());
        feed.push_failure("gateway timeout");
        feed.push_samples(vec![completed("Y", 1, Outcome::Succeeded)]);

        let detector = StalenessDetector::new(feed, reference("X", 0));
        let (_handle, mut rx) = StalenessMonitor::spawn(detector, Duration::from_secs(300));

        rx.changed().await.expect("first tick");
        assert_eq!(*rx.borrow(), StalenessStatus::Unavailable);

        rx.changed().await.expect("second tick");
        assert_eq!(
            *rx.borrow(),
            StalenessStatus::Superseded { failure_link: None }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_handle_stops_polling() {
        let feed = Arc::new(ScriptedStatusFeed::new());
        let detector = StalenessDetector::new(feed.clone(), reference("X", 0));
        let (handle, mut rx) = StalenessMonitor::spawn(detector, Duration::from_secs(300));

        rx.changed().await.expect("first tick");
        let polls_before = feed.poll_count();
        drop(handle);
        tokio::time::sleep(Duration::from_secs(1800)).await;
        assert_eq!(feed.poll_count(), polls_before);
    }
}
