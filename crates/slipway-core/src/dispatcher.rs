//! Dependency-update dispatch onto the background work queue.

use std::sync::Arc;

use crate::domain::{BuildId, ChannelId, Result};
use crate::obs;
use crate::services::ActorRuntime;
use crate::work_queue::WorkQueueHandle;

/// Posts "update dependencies for build B on channel C" tasks for the
/// distributed actor runtime.
///
/// The call into the runtime crosses a process boundary and is
/// fire-and-forget: the posted task neither inspects the actor's outcome
/// nor retries. Delivery is at-least-once, so the actor's update must be
/// idempotent. Dispatch is called at most once per association event.
pub struct DependencyUpdateDispatcher {
    actors: Arc<dyn ActorRuntime>,
    queue: WorkQueueHandle,
}

impl DependencyUpdateDispatcher {
    pub fn new(actors: Arc<dyn ActorRuntime>, queue: WorkQueueHandle) -> Self {
        Self { actors, queue }
    }

    /// Post a single dependency-update task. Fails only if the queue has
    /// shut down; that failure must reach the caller, since a dropped post
    /// permanently skips dependency flow for the build.
    pub fn dispatch(&self, build_id: BuildId, channel_id: ChannelId) -> Result<()> {
        let actors = Arc::clone(&self.actors);
        self.queue.post(async move {
            actors
                .start_update_dependencies(build_id, channel_id)
                .await?;
            Ok(())
        })?;
        obs::emit_dependency_update_queued(build_id, channel_id);
        Ok(())
    }
}

impl std::fmt::Debug for DependencyUpdateDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DependencyUpdateDispatcher").finish()
    }
}
