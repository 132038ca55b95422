//! Channels and their configured release pipelines.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Internal identifier for a channel.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ChannelId(pub Uuid);

impl ChannelId {
    /// Mint a fresh channel id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ChannelId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ChannelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// An external release definition a channel publishes through.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReleasePipeline {
    /// Organization/account owning the release definition.
    pub organization: String,

    /// Project containing the release definition.
    pub project: String,

    /// Identifier of the release definition itself.
    pub pipeline_id: String,
}

impl std::fmt::Display for ReleasePipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}#{}",
            self.organization, self.project, self.pipeline_id
        )
    }
}

/// A named publishing destination builds can be associated with.
///
/// Pipelines are ordered; publishing walks them in order. A channel with no
/// pipelines is a normal state that short-circuits publishing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Channel {
    /// Internal identifier.
    pub id: ChannelId,

    /// Human-readable channel name.
    pub name: String,

    /// Release pipelines configured on this channel, in publish order.
    pub pipelines: Vec<ReleasePipeline>,
}

impl Channel {
    /// Create a channel with the given pipelines.
    pub fn new(id: ChannelId, name: impl Into<String>, pipelines: Vec<ReleasePipeline>) -> Self {
        Self {
            id,
            name: name.into(),
            pipelines,
        }
    }
}
