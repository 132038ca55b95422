//! In-memory fakes for the collaborator traits (testing only)
//!
//! Provides `StaticTokenProvider`, `MemoryChannelStore`, `ScriptedCiClient`,
//! `RecordingReleaseClient`, and `RecordingActorRuntime` that satisfy the
//! trait contracts without any external services.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::{Build, BuildId, Channel, ChannelId, Result, SlipwayError};
use crate::services::*;

// ---------------------------------------------------------------------------
// StaticTokenProvider
// ---------------------------------------------------------------------------

/// Token provider that hands out `token-for-{account}` credentials and
/// counts how often each account was asked.
#[derive(Debug, Default)]
pub struct StaticTokenProvider {
    failing_accounts: HashSet<String>,
    calls: Mutex<Vec<String>>,
}

impl StaticTokenProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make token acquisition fail for the given account.
    pub fn failing_for(mut self, account: &str) -> Self {
        self.failing_accounts.insert(account.to_string());
        self
    }

    /// Accounts tokens were requested for, in request order.
    pub fn requested_accounts(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn token(&self, account: &str) -> Result<Credential> {
        self.calls.lock().unwrap().push(account.to_string());
        if self.failing_accounts.contains(account) {
            return Err(SlipwayError::Token {
                account: account.to_string(),
                reason: "rejected by fake".to_string(),
            });
        }
        Ok(Credential(format!("token-for-{account}")))
    }
}

// ---------------------------------------------------------------------------
// MemoryChannelStore
// ---------------------------------------------------------------------------

/// In-memory channel store backed by a `HashMap<ChannelId, Channel>`.
#[derive(Debug, Default)]
pub struct MemoryChannelStore {
    channels: Mutex<HashMap<ChannelId, Channel>>,
}

impl MemoryChannelStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a channel.
    pub fn put(&self, channel: Channel) {
        self.channels.lock().unwrap().insert(channel.id, channel);
    }
}

#[async_trait]
impl ChannelStore for MemoryChannelStore {
    async fn channel_with_pipelines(&self, channel_id: ChannelId) -> Result<Option<Channel>> {
        Ok(self.channels.lock().unwrap().get(&channel_id).cloned())
    }
}

// ---------------------------------------------------------------------------
// ScriptedCiClient
// ---------------------------------------------------------------------------

/// CI client that fabricates metadata from its inputs. Optionally fails for
/// chosen external build ids.
#[derive(Debug, Default)]
pub struct ScriptedCiClient {
    failing_builds: HashSet<String>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedCiClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make build lookup fail for the given external build id.
    pub fn failing_for(mut self, external_build_id: &str) -> Self {
        self.failing_builds.insert(external_build_id.to_string());
        self
    }

    /// External build ids fetched, in fetch order.
    pub fn fetched_builds(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CiClient for ScriptedCiClient {
    async fn build(
        &self,
        _credential: &Credential,
        account: &str,
        project: &str,
        external_build_id: &str,
    ) -> Result<CiBuildMetadata> {
        self.calls
            .lock()
            .unwrap()
            .push(external_build_id.to_string());
        if self.failing_builds.contains(external_build_id) {
            return Err(SlipwayError::CiService(format!(
                "build {external_build_id} not found"
            )));
        }
        Ok(CiBuildMetadata {
            external_build_id: external_build_id.to_string(),
            number: format!("20240101.{external_build_id}"),
            source_branch: "refs/heads/main".to_string(),
            web_link: format!(
                "https://dev.azure.com/{account}/{project}/_build/results?buildId={external_build_id}"
            ),
        })
    }
}

// ---------------------------------------------------------------------------
// RecordingReleaseClient
// ---------------------------------------------------------------------------

/// A release actually started through the fake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartedRelease {
    pub pipeline_id: String,
    pub trace_id: BuildId,
    pub artifact_sources: Vec<String>,
}

/// Release client that records every call and can be scripted to fail a
/// given pipeline at the definition-fetch step.
#[derive(Debug, Default)]
pub struct RecordingReleaseClient {
    fail_definition_for: HashSet<String>,
    fail_start_for: HashSet<String>,
    started: Mutex<Vec<StartedRelease>>,
    waited: Mutex<Vec<ReleaseId>>,
}

impl RecordingReleaseClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail `definition` for the given pipeline id.
    pub fn failing_definition_for(mut self, pipeline_id: &str) -> Self {
        self.fail_definition_for.insert(pipeline_id.to_string());
        self
    }

    /// Fail `start_release` for the given pipeline id.
    pub fn failing_start_for(mut self, pipeline_id: &str) -> Self {
        self.fail_start_for.insert(pipeline_id.to_string());
        self
    }

    /// Releases started, in start order.
    pub fn started_releases(&self) -> Vec<StartedRelease> {
        self.started.lock().unwrap().clone()
    }

    /// Releases waited on, in wait order.
    pub fn waited_releases(&self) -> Vec<ReleaseId> {
        self.waited.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReleaseClient for RecordingReleaseClient {
    async fn definition(
        &self,
        _credential: &Credential,
        _account: &str,
        _project: &str,
        pipeline_id: &str,
    ) -> Result<ReleaseDefinition> {
        if self.fail_definition_for.contains(pipeline_id) {
            return Err(SlipwayError::ReleaseService(format!(
                "definition {pipeline_id} unavailable"
            )));
        }
        Ok(ReleaseDefinition {
            pipeline_id: pipeline_id.to_string(),
            // Stale leftovers from an earlier publish; the orchestrator must
            // clear these before wiring the new source.
            artifact_sources: vec!["stale-artifact".to_string()],
        })
    }

    async fn remove_artifact_sources(
        &self,
        _credential: &Credential,
        _account: &str,
        _project: &str,
        mut definition: ReleaseDefinition,
    ) -> Result<ReleaseDefinition> {
        definition.artifact_sources.clear();
        Ok(definition)
    }

    async fn add_artifact_source(
        &self,
        _credential: &Credential,
        _account: &str,
        _project: &str,
        mut definition: ReleaseDefinition,
        ci_build: &CiBuildMetadata,
    ) -> Result<ReleaseDefinition> {
        definition
            .artifact_sources
            .push(ci_build.external_build_id.clone());
        Ok(definition)
    }

    async fn start_release(
        &self,
        _credential: &Credential,
        _account: &str,
        _project: &str,
        definition: &ReleaseDefinition,
        trace_id: BuildId,
    ) -> Result<ReleaseId> {
        if self.fail_start_for.contains(&definition.pipeline_id) {
            return Err(SlipwayError::ReleaseService(format!(
                "start rejected for pipeline {}",
                definition.pipeline_id
            )));
        }
        self.started.lock().unwrap().push(StartedRelease {
            pipeline_id: definition.pipeline_id.clone(),
            trace_id,
            artifact_sources: definition.artifact_sources.clone(),
        });
        Ok(ReleaseId(format!("release-{}", definition.pipeline_id)))
    }

    async fn wait_until_terminal(
        &self,
        _credential: &Credential,
        _account: &str,
        _project: &str,
        release_id: &ReleaseId,
    ) -> Result<()> {
        self.waited.lock().unwrap().push(release_id.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// RecordingActorRuntime
// ---------------------------------------------------------------------------

/// Actor runtime that records dependency-update invocations.
#[derive(Debug, Default)]
pub struct RecordingActorRuntime {
    fail: bool,
    invocations: Mutex<Vec<(BuildId, ChannelId)>>,
}

impl RecordingActorRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every invocation fail.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Invocations observed so far.
    pub fn invocations(&self) -> Vec<(BuildId, ChannelId)> {
        self.invocations.lock().unwrap().clone()
    }
}

#[async_trait]
impl ActorRuntime for RecordingActorRuntime {
    async fn start_update_dependencies(
        &self,
        build_id: BuildId,
        channel_id: ChannelId,
    ) -> Result<()> {
        self.invocations.lock().unwrap().push((build_id, channel_id));
        if self.fail {
            return Err(SlipwayError::ActorRuntime(
                "actor unreachable".to_string(),
            ));
        }
        Ok(())
    }
}

/// Build a CI identity with fixed coordinates, varying only the external id.
pub fn ci_identity(external_build_id: &str) -> crate::domain::CiIdentity {
    crate::domain::CiIdentity {
        account: "contoso".to_string(),
        project: "tools".to_string(),
        external_build_id: external_build_id.to_string(),
        definition_id: "77".to_string(),
        branch: "refs/heads/main".to_string(),
        produced_at: chrono::Utc::now(),
    }
}

/// Build carrying [`ci_identity`] coordinates.
pub fn build_with_ci(external_build_id: &str) -> Build {
    Build::with_ci(BuildId::new(), ci_identity(external_build_id))
}
