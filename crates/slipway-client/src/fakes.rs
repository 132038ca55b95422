//! In-memory fakes for the client-side traits (testing only)

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};

use slipway_core::{BuildId, ChannelId};

use crate::error::StalenessError;
use crate::resolver::{LatestBuildFeed, ResolveError};
use crate::staleness::ReferenceBuild;
use crate::status_feed::{CiStatusFeed, CiStatusSample, LifecycleState, Outcome};

/// Fixed origin all fake timestamps offset from.
fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

/// Reference build with fixed contoso/tools coordinates, produced at
/// `epoch + offset_secs`.
pub fn reference(external_build_id: &str, offset_secs: i64) -> ReferenceBuild {
    ReferenceBuild {
        account: "contoso".to_string(),
        project: "tools".to_string(),
        definition_id: "77".to_string(),
        branch: "refs/heads/main".to_string(),
        external_build_id: external_build_id.to_string(),
        produced_at: epoch() + Duration::seconds(offset_secs),
    }
}

/// Completed sample finished at `epoch + offset_secs`.
pub fn completed(external_build_id: &str, offset_secs: i64, outcome: Outcome) -> CiStatusSample {
    CiStatusSample {
        external_build_id: external_build_id.to_string(),
        state: LifecycleState::Completed,
        outcome,
        finished_at: Some(epoch() + Duration::seconds(offset_secs)),
    }
}

/// Sample still in progress.
pub fn in_progress(external_build_id: &str) -> CiStatusSample {
    CiStatusSample {
        external_build_id: external_build_id.to_string(),
        state: LifecycleState::InProgress,
        outcome: Outcome::Other,
        finished_at: None,
    }
}

type ScriptedResponse = Result<Vec<CiStatusSample>, String>;

/// Status feed that replays scripted responses, one per poll, then keeps
/// returning an empty window. Counts polls.
#[derive(Debug, Default)]
pub struct ScriptedStatusFeed {
    responses: Mutex<VecDeque<ScriptedResponse>>,
    polls: Mutex<usize>,
}

impl ScriptedStatusFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful poll response.
    pub fn push_samples(&self, samples: Vec<CiStatusSample>) {
        self.responses.lock().unwrap().push_back(Ok(samples));
    }

    /// Queue a failing poll response.
    pub fn push_failure(&self, reason: &str) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Err(reason.to_string()));
    }

    /// Number of polls served so far.
    pub fn poll_count(&self) -> usize {
        *self.polls.lock().unwrap()
    }
}

#[async_trait]
impl CiStatusFeed for ScriptedStatusFeed {
    async fn recent_builds(
        &self,
        _account: &str,
        _project: &str,
        _definition_id: &str,
        _branch: &str,
        count: usize,
    ) -> Result<Vec<CiStatusSample>, StalenessError> {
        *self.polls.lock().unwrap() += 1;
        match self.responses.lock().unwrap().pop_front() {
            Some(Ok(mut samples)) => {
                samples.truncate(count);
                Ok(samples)
            }
            Some(Err(reason)) => Err(StalenessError::Feed(reason)),
            None => Ok(Vec::new()),
        }
    }
}

/// Latest-build feed with a fixed answer.
#[derive(Debug)]
pub struct StaticLatestBuildFeed {
    latest: Option<BuildId>,
}

impl StaticLatestBuildFeed {
    pub fn new(latest: Option<BuildId>) -> Self {
        Self { latest }
    }
}

#[async_trait]
impl LatestBuildFeed for StaticLatestBuildFeed {
    async fn latest_build(&self, _channel_id: ChannelId) -> Result<Option<BuildId>, ResolveError> {
        Ok(self.latest)
    }
}
