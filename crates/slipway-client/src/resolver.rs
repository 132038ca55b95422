//! Resolving the route's build reference to a concrete build id.

use async_trait::async_trait;
use uuid::Uuid;

use slipway_core::{BuildId, ChannelId};

/// Errors while resolving a build reference.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("not a build reference: {0:?}")]
    InvalidRef(String),

    #[error("latest-build lookup failed: {0}")]
    Lookup(String),
}

/// A build reference from the route: a concrete id or "latest".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildRef {
    Id(BuildId),
    Latest,
}

impl std::str::FromStr for BuildRef {
    type Err = ResolveError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        if raw.eq_ignore_ascii_case("latest") {
            return Ok(Self::Latest);
        }
        raw.parse::<Uuid>()
            .map(|id| Self::Id(BuildId(id)))
            .map_err(|_| ResolveError::InvalidRef(raw.to_string()))
    }
}

/// Lookup for a channel's most recent build.
#[async_trait]
pub trait LatestBuildFeed: Send + Sync {
    async fn latest_build(&self, channel_id: ChannelId) -> Result<Option<BuildId>, ResolveError>;
}

impl BuildRef {
    /// Resolve to a concrete build id; `None` when the channel has no
    /// builds yet.
    pub async fn resolve(
        &self,
        feed: &dyn LatestBuildFeed,
        channel_id: ChannelId,
    ) -> Result<Option<BuildId>, ResolveError> {
        match self {
            Self::Id(id) => Ok(Some(*id)),
            Self::Latest => feed.latest_build(channel_id).await,
        }
    }
}
