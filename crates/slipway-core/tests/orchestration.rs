//! Integration tests for the association-triggered orchestration over fakes.

use std::sync::Arc;

use slipway_core::fakes::*;
use slipway_core::{
    AssociationCreatedHandler, BackgroundWorkQueue, BuildChannelAssociation, Channel, ChannelId,
    DependencyUpdateDispatcher, HandledAssociation, PublishOutcome, ReleasePipeline,
    ReleasePipelinePublisher,
};

fn pipeline(org: &str, id: &str) -> ReleasePipeline {
    ReleasePipeline {
        organization: org.to_string(),
        project: "tools".to_string(),
        pipeline_id: id.to_string(),
    }
}

/// Test: one failing pipeline does not block the others, and the dependency
/// update is dispatched exactly once either way.
#[tokio::test]
async fn test_partial_pipeline_failure_end_to_end() {
    let queue = BackgroundWorkQueue::start(2);
    let channels = Arc::new(MemoryChannelStore::new());
    let tokens = Arc::new(StaticTokenProvider::new());
    let ci = Arc::new(ScriptedCiClient::new());
    let releases = Arc::new(RecordingReleaseClient::new().failing_definition_for("broken"));
    let actors = Arc::new(RecordingActorRuntime::new());

    let channel_id = ChannelId::new();
    channels.put(Channel::new(
        channel_id,
        "nightly",
        vec![
            pipeline("contoso", "broken"),
            pipeline("contoso", "healthy"),
        ],
    ));

    let handler = AssociationCreatedHandler::new(
        channels,
        ReleasePipelinePublisher::new(tokens, ci, releases.clone()),
        DependencyUpdateDispatcher::new(actors.clone(), queue.handle()),
    );

    let build = build_with_ci("5678");
    let build_id = build.id;
    let assoc = BuildChannelAssociation::new(build, channel_id);

    let handled = handler.handle(&assoc).await.expect("handle");
    let summary = match handled {
        HandledAssociation::Published(summary) => summary,
        other => panic!("expected Published, got {other:?}"),
    };

    assert_eq!(summary.results.len(), 2, "both pipelines attempted");
    assert!(matches!(summary.results[0].outcome, PublishOutcome::Failed(_)));
    assert!(matches!(
        summary.results[1].outcome,
        PublishOutcome::Released(_)
    ));

    // The healthy pipeline's release carries the internal build id and the
    // freshly wired artifact source only.
    let started = releases.started_releases();
    assert_eq!(started.len(), 1);
    assert_eq!(started[0].pipeline_id, "healthy");
    assert_eq!(started[0].trace_id, build_id);
    assert_eq!(started[0].artifact_sources, vec!["5678".to_string()]);

    queue.shutdown().await;
    assert_eq!(actors.invocations(), vec![(build_id, channel_id)]);
}

/// Test: two associations on the same channel trigger two independent
/// passes and two dispatches.
#[tokio::test]
async fn test_each_association_triggers_one_pass() {
    let queue = BackgroundWorkQueue::start(1);
    let channels = Arc::new(MemoryChannelStore::new());
    let releases = Arc::new(RecordingReleaseClient::new());
    let actors = Arc::new(RecordingActorRuntime::new());

    let channel_id = ChannelId::new();
    channels.put(Channel::new(
        channel_id,
        "release",
        vec![pipeline("contoso", "42")],
    ));

    let handler = AssociationCreatedHandler::new(
        channels,
        ReleasePipelinePublisher::new(
            Arc::new(StaticTokenProvider::new()),
            Arc::new(ScriptedCiClient::new()),
            releases.clone(),
        ),
        DependencyUpdateDispatcher::new(actors.clone(), queue.handle()),
    );

    for external_id in ["100", "101"] {
        let assoc = BuildChannelAssociation::new(build_with_ci(external_id), channel_id);
        handler.handle(&assoc).await.expect("handle");
    }

    queue.shutdown().await;
    assert_eq!(releases.started_releases().len(), 2);
    assert_eq!(actors.invocations().len(), 2);
}
