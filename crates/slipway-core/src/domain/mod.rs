//! Domain model: builds, channels, associations, and the error taxonomy.

pub mod association;
pub mod build;
pub mod channel;
pub mod error;

pub use association::BuildChannelAssociation;
pub use build::{Build, BuildId, CiIdentity};
pub use channel::{Channel, ChannelId, ReleasePipeline};
pub use error::{Result, SlipwayError};
