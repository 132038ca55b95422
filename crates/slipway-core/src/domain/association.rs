//! Build-to-channel association events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::build::Build;
use crate::domain::channel::ChannelId;

/// Domain event emitted after a build-channel association is durably created.
///
/// The persistence layer emits this exactly once per successful create and
/// never on reads or updates; the orchestration handler consumes it. The
/// association row itself is owned by the persistence layer and is immutable
/// from this crate's perspective.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BuildChannelAssociation {
    /// The build that was added to the channel.
    pub build: Build,

    /// The channel it was added to.
    pub channel_id: ChannelId,

    /// When the association was committed.
    pub created_at: DateTime<Utc>,
}

impl BuildChannelAssociation {
    /// Create the event payload for a just-committed association.
    pub fn new(build: Build, channel_id: ChannelId) -> Self {
        Self {
            build,
            channel_id,
            created_at: Utc::now(),
        }
    }
}
