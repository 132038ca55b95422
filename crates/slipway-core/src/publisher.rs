//! Republishing a build through a channel's release pipelines.

use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::{BuildId, CiIdentity, ReleasePipeline, Result};
use crate::obs;
use crate::services::{CiClient, Credential, ReleaseClient, ReleaseId, TokenProvider};

/// Outcome of one pipeline's publish attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    /// The release started and reached a terminal state.
    Released(ReleaseId),
    /// Some step failed; the error was logged and the pass moved on.
    Failed(String),
}

/// One pipeline's entry in a publish pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelinePublish {
    pub pipeline: ReleasePipeline,
    pub outcome: PublishOutcome,
}

/// Per-pipeline outcomes of a single publish pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishSummary {
    pub results: Vec<PipelinePublish>,
}

impl PublishSummary {
    /// Number of pipelines whose release started.
    pub fn released_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| matches!(r.outcome, PublishOutcome::Released(_)))
            .count()
    }

    /// Number of pipelines that failed.
    pub fn failed_count(&self) -> usize {
        self.results.len() - self.released_count()
    }
}

/// Publishes one build through every release pipeline of a channel.
///
/// Pipelines are processed strictly in order, one at a time, and each
/// pipeline's steps are isolated: a failure anywhere in one pipeline is
/// caught, logged with pipeline and build identity, and recorded in the
/// summary while the loop continues. Nothing escapes this component and
/// nothing is retried within a pass.
pub struct ReleasePipelinePublisher {
    tokens: Arc<dyn TokenProvider>,
    ci: Arc<dyn CiClient>,
    releases: Arc<dyn ReleaseClient>,
}

impl ReleasePipelinePublisher {
    pub fn new(
        tokens: Arc<dyn TokenProvider>,
        ci: Arc<dyn CiClient>,
        releases: Arc<dyn ReleaseClient>,
    ) -> Self {
        Self {
            tokens,
            ci,
            releases,
        }
    }

    /// Run one publish pass over the given pipelines.
    pub async fn publish(
        &self,
        build_id: BuildId,
        ci: &CiIdentity,
        pipelines: &[ReleasePipeline],
    ) -> PublishSummary {
        // One credential per distinct account per pass; reused across
        // pipelines of the same account.
        let mut credentials: HashMap<String, Credential> = HashMap::new();
        let mut summary = PublishSummary::default();

        for pipeline in pipelines {
            let outcome = match self
                .publish_one(build_id, ci, pipeline, &mut credentials)
                .await
            {
                Ok(release_id) => {
                    obs::emit_release_started(build_id, &pipeline.to_string(), &release_id.0);
                    PublishOutcome::Released(release_id)
                }
                Err(error) => {
                    obs::emit_pipeline_publish_failed(build_id, &pipeline.to_string(), &error);
                    PublishOutcome::Failed(error.to_string())
                }
            };
            summary.results.push(PipelinePublish {
                pipeline: pipeline.clone(),
                outcome,
            });
        }

        summary
    }

    /// Steps 1-7 for a single pipeline. Any error here is caught by the
    /// caller and isolated to this pipeline.
    async fn publish_one(
        &self,
        build_id: BuildId,
        ci: &CiIdentity,
        pipeline: &ReleasePipeline,
        credentials: &mut HashMap<String, Credential>,
    ) -> Result<ReleaseId> {
        let credential = match credentials.get(&pipeline.organization) {
            Some(credential) => credential.clone(),
            None => {
                let credential = self.tokens.token(&pipeline.organization).await?;
                credentials.insert(pipeline.organization.clone(), credential.clone());
                credential
            }
        };

        let ci_build = self
            .ci
            .build(&credential, &ci.account, &ci.project, &ci.external_build_id)
            .await?;

        let definition = self
            .releases
            .definition(
                &credential,
                &pipeline.organization,
                &pipeline.project,
                &pipeline.pipeline_id,
            )
            .await?;

        // Clean-slate republish: replace artifact sources, never merge.
        let definition = self
            .releases
            .remove_artifact_sources(
                &credential,
                &pipeline.organization,
                &pipeline.project,
                definition,
            )
            .await?;
        let definition = self
            .releases
            .add_artifact_source(
                &credential,
                &pipeline.organization,
                &pipeline.project,
                definition,
                &ci_build,
            )
            .await?;

        let release_id = self
            .releases
            .start_release(
                &credential,
                &pipeline.organization,
                &pipeline.project,
                &definition,
                build_id,
            )
            .await?;

        // Serialize pipelines relative to the triggering transaction: the
        // next pipeline starts only after this release is terminal.
        self.releases
            .wait_until_terminal(
                &credential,
                &pipeline.organization,
                &pipeline.project,
                &release_id,
            )
            .await?;

        Ok(release_id)
    }
}

impl std::fmt::Debug for ReleasePipelinePublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReleasePipelinePublisher").finish()
    }
}
