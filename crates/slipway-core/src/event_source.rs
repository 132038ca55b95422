//! Orchestration entry point: the association-created event handler.
//!
//! The persistence layer emits a [`BuildChannelAssociation`] event after the
//! association is durably committed; whatever commits the transaction awaits
//! this handler. Publishing runs inline to completion, then a single
//! dependency-update task is posted for the actor runtime. The handler never
//! raises for pipeline failures — those are logged and isolated per pipeline
//! — and only a refused queue submission propagates, since dropping it would
//! permanently skip dependency flow for the build.

use std::sync::Arc;

use crate::dispatcher::DependencyUpdateDispatcher;
use crate::domain::{BuildChannelAssociation, Result};
use crate::obs;
use crate::publisher::{PublishSummary, ReleasePipelinePublisher};
use crate::services::ChannelStore;

/// What the handler did with one association event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandledAssociation {
    /// The build has no CI identity; nothing was published or dispatched.
    SkippedMissingCiIdentity,
    /// The channel has no pipelines; nothing was published or dispatched.
    SkippedNoPipelines,
    /// The channel row could not be found; nothing was published or
    /// dispatched. Operational-log-only.
    SkippedChannelNotFound,
    /// Publishing ran and a dependency update was dispatched.
    Published(PublishSummary),
}

/// Handles "a build was associated with a channel" events.
pub struct AssociationCreatedHandler {
    channels: Arc<dyn ChannelStore>,
    publisher: ReleasePipelinePublisher,
    dispatcher: DependencyUpdateDispatcher,
}

impl AssociationCreatedHandler {
    pub fn new(
        channels: Arc<dyn ChannelStore>,
        publisher: ReleasePipelinePublisher,
        dispatcher: DependencyUpdateDispatcher,
    ) -> Self {
        Self {
            channels,
            publisher,
            dispatcher,
        }
    }

    /// Handle one association event. Invoked exactly once per creation,
    /// never on reads or updates.
    pub async fn handle(&self, assoc: &BuildChannelAssociation) -> Result<HandledAssociation> {
        let build_id = assoc.build.id;
        let channel_id = assoc.channel_id;
        obs::emit_association_observed(build_id, channel_id);

        let Some(ci) = assoc.build.ci.as_ref() else {
            obs::emit_publish_skipped(build_id, channel_id, "missing-ci-identity");
            return Ok(HandledAssociation::SkippedMissingCiIdentity);
        };

        let channel = match self.channels.channel_with_pipelines(channel_id).await {
            Ok(Some(channel)) => channel,
            Ok(None) => {
                obs::emit_publish_skipped(build_id, channel_id, "channel-not-found");
                return Ok(HandledAssociation::SkippedChannelNotFound);
            }
            Err(error) => {
                obs::emit_publish_skipped(build_id, channel_id, &format!("channel-load: {error}"));
                return Ok(HandledAssociation::SkippedChannelNotFound);
            }
        };

        if channel.pipelines.is_empty() {
            obs::emit_publish_skipped(build_id, channel_id, "no-pipelines");
            return Ok(HandledAssociation::SkippedNoPipelines);
        }

        // Publishing completes (or each pipeline fails and is recorded)
        // before the triggering transaction is considered finished.
        let summary = self
            .publisher
            .publish(build_id, ci, &channel.pipelines)
            .await;

        // Exactly one dispatch per association, whatever publishing did.
        self.dispatcher.dispatch(build_id, channel_id)?;

        Ok(HandledAssociation::Published(summary))
    }
}

impl std::fmt::Debug for AssociationCreatedHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssociationCreatedHandler").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Build, BuildId, Channel, ChannelId, ReleasePipeline};
    use crate::fakes::*;
    use crate::work_queue::BackgroundWorkQueue;

    struct Fixture {
        queue: BackgroundWorkQueue,
        channels: Arc<MemoryChannelStore>,
        tokens: Arc<StaticTokenProvider>,
        ci: Arc<ScriptedCiClient>,
        releases: Arc<RecordingReleaseClient>,
        actors: Arc<RecordingActorRuntime>,
    }

    impl Fixture {
        fn new(releases: RecordingReleaseClient) -> Self {
            Self {
                queue: BackgroundWorkQueue::start(1),
                channels: Arc::new(MemoryChannelStore::new()),
                tokens: Arc::new(StaticTokenProvider::new()),
                ci: Arc::new(ScriptedCiClient::new()),
                releases: Arc::new(releases),
                actors: Arc::new(RecordingActorRuntime::new()),
            }
        }

        fn handler(&self) -> AssociationCreatedHandler {
            let publisher = ReleasePipelinePublisher::new(
                self.tokens.clone(),
                self.ci.clone(),
                self.releases.clone(),
            );
            let dispatcher =
                DependencyUpdateDispatcher::new(self.actors.clone(), self.queue.handle());
            AssociationCreatedHandler::new(self.channels.clone(), publisher, dispatcher)
        }

        fn channel_with(&self, pipelines: Vec<ReleasePipeline>) -> ChannelId {
            let id = ChannelId::new();
            self.channels.put(Channel::new(id, "nightly", pipelines));
            id
        }
    }

    fn pipeline(id: &str) -> ReleasePipeline {
        ReleasePipeline {
            organization: "contoso".to_string(),
            project: "tools".to_string(),
            pipeline_id: id.to_string(),
        }
    }

    #[tokio::test]
    async fn test_missing_ci_identity_short_circuits() {
        let fixture = Fixture::new(RecordingReleaseClient::new());
        let channel_id = fixture.channel_with(vec![pipeline("1")]);
        let handler = fixture.handler();

        let assoc =
            BuildChannelAssociation::new(Build::without_ci(BuildId::new()), channel_id);
        let handled = handler.handle(&assoc).await.expect("handle");

        assert_eq!(handled, HandledAssociation::SkippedMissingCiIdentity);
        fixture.queue.shutdown().await;
        assert!(fixture.releases.started_releases().is_empty());
        assert!(fixture.tokens.requested_accounts().is_empty());
        assert!(fixture.actors.invocations().is_empty());
    }

    #[tokio::test]
    async fn test_channel_without_pipelines_short_circuits() {
        let fixture = Fixture::new(RecordingReleaseClient::new());
        let channel_id = fixture.channel_with(vec![]);
        let handler = fixture.handler();

        let assoc = BuildChannelAssociation::new(build_with_ci("1234"), channel_id);
        let handled = handler.handle(&assoc).await.expect("handle");

        assert_eq!(handled, HandledAssociation::SkippedNoPipelines);
        fixture.queue.shutdown().await;
        assert!(fixture.releases.started_releases().is_empty());
        assert!(fixture.actors.invocations().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_channel_never_raises() {
        let fixture = Fixture::new(RecordingReleaseClient::new());
        let handler = fixture.handler();

        let assoc = BuildChannelAssociation::new(build_with_ci("1234"), ChannelId::new());
        let handled = handler.handle(&assoc).await.expect("handle");

        assert_eq!(handled, HandledAssociation::SkippedChannelNotFound);
        fixture.queue.shutdown().await;
    }

    #[tokio::test]
    async fn test_publishes_then_dispatches_exactly_once() {
        let fixture = Fixture::new(RecordingReleaseClient::new());
        let channel_id = fixture.channel_with(vec![pipeline("1"), pipeline("2")]);
        let handler = fixture.handler();

        let build = build_with_ci("1234");
        let build_id = build.id;
        let assoc = BuildChannelAssociation::new(build, channel_id);
        let handled = handler.handle(&assoc).await.expect("handle");

        match handled {
            HandledAssociation::Published(summary) => {
                assert_eq!(summary.released_count(), 2);
            }
            other => panic!("expected Published, got {other:?}"),
        }

        fixture.queue.shutdown().await;
        assert_eq!(fixture.actors.invocations(), vec![(build_id, channel_id)]);
    }

    #[tokio::test]
    async fn test_dispatch_happens_even_when_every_pipeline_fails() {
        let fixture = Fixture::new(
            RecordingReleaseClient::new()
                .failing_definition_for("1")
                .failing_definition_for("2"),
        );
        let channel_id = fixture.channel_with(vec![pipeline("1"), pipeline("2")]);
        let handler = fixture.handler();

        let build = build_with_ci("1234");
        let build_id = build.id;
        let assoc = BuildChannelAssociation::new(build, channel_id);
        let handled = handler.handle(&assoc).await.expect("handle");

        match handled {
            HandledAssociation::Published(summary) => {
                assert_eq!(summary.failed_count(), 2);
                assert_eq!(summary.released_count(), 0);
            }
            other => panic!("expected Published, got {other:?}"),
        }

        fixture.queue.shutdown().await;
        assert_eq!(fixture.actors.invocations(), vec![(build_id, channel_id)]);
    }
}
