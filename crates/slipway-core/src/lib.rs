//! Slipway Core Library
//!
//! Server-side orchestration for build-channel publishing: when a build is
//! associated with a channel, republish it through the channel's release
//! pipelines (failures isolated per pipeline) and post one dependency-update
//! task for the distributed actor runtime onto the background work queue.

pub mod dispatcher;
pub mod domain;
pub mod event_source;
pub mod fakes;
pub mod obs;
pub mod publisher;
pub mod services;
pub mod work_queue;

pub use dispatcher::DependencyUpdateDispatcher;
pub use domain::{
    Build, BuildChannelAssociation, BuildId, Channel, ChannelId, CiIdentity, ReleasePipeline,
    Result, SlipwayError,
};
pub use event_source::{AssociationCreatedHandler, HandledAssociation};
pub use publisher::{PipelinePublish, PublishOutcome, PublishSummary, ReleasePipelinePublisher};
pub use services::{
    ActorRuntime, ChannelStore, CiBuildMetadata, CiClient, Credential, ReleaseClient,
    ReleaseDefinition, ReleaseId, TokenProvider,
};
pub use work_queue::{BackgroundWorkQueue, WorkItem, WorkQueueHandle};
