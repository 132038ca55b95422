//! Interfaces to the external collaborators the orchestrator calls.
//!
//! The CI service, release service, actor runtime, token provider, and the
//! single channel lookup the trigger needs are all consumed behind traits;
//! their transport (HTTP, actor messaging) lives outside this crate.
//! In-memory implementations for tests live in [`crate::fakes`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{BuildId, Channel, ChannelId, Result};

/// An opaque credential for calling the release/CI services of one account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential(pub String);

/// Metadata the CI system holds for one build.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CiBuildMetadata {
    /// The build's identifier in the CI system.
    pub external_build_id: String,

    /// Human-readable build number.
    pub number: String,

    /// Branch the build ran against.
    pub source_branch: String,

    /// Link to the build's results page.
    pub web_link: String,
}

/// A release definition as returned by the release service.
///
/// Opaque to the orchestrator beyond its artifact sources; the service
/// round-trips the rest of the definition body untouched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReleaseDefinition {
    /// Definition identifier in the release service.
    pub pipeline_id: String,

    /// External build ids currently wired in as artifact sources.
    pub artifact_sources: Vec<String>,
}

/// Identifier of a started release.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReleaseId(pub String);

impl std::fmt::Display for ReleaseId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Resolves a per-account credential for the release/CI services.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Fetch a credential for the named account. Authentication failures
    /// surface here and are isolated per pipeline by the publisher.
    async fn token(&self, account: &str) -> Result<Credential>;
}

/// Read side of the CI system.
#[async_trait]
pub trait CiClient: Send + Sync {
    /// Fetch metadata for a build by its external identity.
    async fn build(
        &self,
        credential: &Credential,
        account: &str,
        project: &str,
        external_build_id: &str,
    ) -> Result<CiBuildMetadata>;
}

/// The release service: definitions in, releases out.
#[async_trait]
pub trait ReleaseClient: Send + Sync {
    /// Fetch the current definition for a pipeline.
    async fn definition(
        &self,
        credential: &Credential,
        account: &str,
        project: &str,
        pipeline_id: &str,
    ) -> Result<ReleaseDefinition>;

    /// Strip every artifact source from the definition. Definitions are
    /// republished from a clean slate; sources are replaced, never merged.
    async fn remove_artifact_sources(
        &self,
        credential: &Credential,
        account: &str,
        project: &str,
        definition: ReleaseDefinition,
    ) -> Result<ReleaseDefinition>;

    /// Wire one artifact source pointing at the given CI build.
    async fn add_artifact_source(
        &self,
        credential: &Credential,
        account: &str,
        project: &str,
        definition: ReleaseDefinition,
        ci_build: &CiBuildMetadata,
    ) -> Result<ReleaseDefinition>;

    /// Start a release from the definition, tagged with `trace_id` so the
    /// release can be traced back to the internal build.
    async fn start_release(
        &self,
        credential: &Credential,
        account: &str,
        project: &str,
        definition: &ReleaseDefinition,
        trace_id: BuildId,
    ) -> Result<ReleaseId>;

    /// Block until the release reaches a terminal state.
    async fn wait_until_terminal(
        &self,
        credential: &Credential,
        account: &str,
        project: &str,
        release_id: &ReleaseId,
    ) -> Result<()>;
}

/// Entry point into the distributed actor runtime.
///
/// At-least-once delivery; the actor's dependency update must be idempotent
/// (a contract on the runtime, not enforced here).
#[async_trait]
pub trait ActorRuntime: Send + Sync {
    /// Kick off a dependency update for the build on the channel.
    async fn start_update_dependencies(&self, build_id: BuildId, channel_id: ChannelId)
        -> Result<()>;
}

/// The one persistence lookup the trigger needs: a channel together with its
/// configured release pipelines. A cold read per trigger is acceptable.
#[async_trait]
pub trait ChannelStore: Send + Sync {
    async fn channel_with_pipelines(&self, channel_id: ChannelId) -> Result<Option<Channel>>;
}
