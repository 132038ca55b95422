//! Structured observability hooks for orchestration lifecycle events.
//!
//! Events are emitted through `tracing` at info/warn/error level; the
//! daemon configures the subscriber. Warn is reserved for preconditions
//! that short-circuit publishing, error for per-pipeline failures.

use tracing::{error, info, warn};

use crate::domain::{BuildId, ChannelId};

/// Emit event: an association was observed and orchestration is starting.
pub fn emit_association_observed(build_id: BuildId, channel_id: ChannelId) {
    info!(event = "association.observed", build_id = %build_id, channel_id = %channel_id);
}

/// Emit event: publishing was skipped for a non-error precondition.
pub fn emit_publish_skipped(build_id: BuildId, channel_id: ChannelId, reason: &str) {
    warn!(event = "publish.skipped", build_id = %build_id, channel_id = %channel_id, reason = %reason);
}

/// Emit event: a release was started for one pipeline.
pub fn emit_release_started(build_id: BuildId, pipeline: &str, release_id: &str) {
    info!(event = "release.started", build_id = %build_id, pipeline = %pipeline, release_id = %release_id);
}

/// Emit event: one pipeline's publish failed; the loop continues.
pub fn emit_pipeline_publish_failed(
    build_id: BuildId,
    pipeline: &str,
    error: &dyn std::fmt::Display,
) {
    error!(event = "release.publish_failed", build_id = %build_id, pipeline = %pipeline, error = %error);
}

/// Emit event: a dependency-update task was accepted by the work queue.
pub fn emit_dependency_update_queued(build_id: BuildId, channel_id: ChannelId) {
    info!(event = "dependency_update.queued", build_id = %build_id, channel_id = %channel_id);
}

/// Emit event: a queued work item failed (warning level).
pub fn emit_work_item_failed(error: &dyn std::fmt::Display) {
    warn!(event = "work_queue.item_failed", error = %error);
}
