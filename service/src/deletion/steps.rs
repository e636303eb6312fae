use core_types::events::DeletionEvent;
use document_store::RecordRef;

use crate::{
    activity_log::ActivityEvent,
    deletion::{
        context::DeletionContext,
        discovery::discover_by_foreign_key,
        model::DeletionPlan,
    },
    error::Error,
    pipeline::pipeline_step::{PipelineStep, StepAction},
};

/// Phase 1: discover every record referencing the root.
///
/// Pure reads only. The dependent collections are independent, so their
/// discoveries fan out concurrently and fan back in to one plan. Any
/// failure aborts before a single mutation has happened.
pub struct DiscoverDependentsStep;

#[async_trait::async_trait]
impl PipelineStep<DeletionContext> for DiscoverDependentsStep {
    fn name(&self) -> &'static str {
        "discover_dependents"
    }

    async fn execute(&self, context: &mut DeletionContext) -> StepAction {
        tracing::info!(
            "Discovering dependents of {} across {} collection(s)",
            context.request.root,
            context.request.dependents.len()
        );
        context
            .publish(DeletionEvent::DiscoveryStarted {
                root_collection: context.request.root.collection.clone(),
                root_id: context.request.root.id.clone(),
                dependent_collections: context.request.dependents.len(),
            })
            .await;

        let root_id = context.request.root.id.clone();
        let discoveries: Vec<_> = context
            .request
            .dependents
            .iter()
            .map(|dependent| {
                let store = context.store.clone();
                let collection = dependent.collection.clone();
                let foreign_key = dependent.foreign_key.clone();
                let root_id = root_id.clone();
                async move {
                    let refs =
                        discover_by_foreign_key(store.as_ref(), &collection, &foreign_key, &root_id)
                            .await?;
                    Ok::<(String, Vec<RecordRef>), Error>((collection, refs))
                }
            })
            .collect();

        match futures::future::try_join_all(discoveries).await {
            Ok(collections) => {
                for (collection, refs) in &collections {
                    context
                        .publish(DeletionEvent::CollectionDiscovered {
                            collection: collection.clone(),
                            dependents: refs.len(),
                        })
                        .await;
                }
                context.plan = Some(DeletionPlan { collections });
                StepAction::Continue
            }
            Err(error) => {
                tracing::error!(
                    "Dependent discovery for {} failed, store untouched: {}",
                    context.request.root,
                    error
                );
                StepAction::Abort(error)
            }
        }
    }
}

/// Phase 2: delete everything in the plan plus the root, batched under
/// the provider's mutation cap.
///
/// Dependents fill the batches first and the root rides in the final
/// one, so the root can never disappear while its dependents survive.
/// Batches commit sequentially; a failed commit aborts with the count of
/// batches that already went through, which are not rolled back.
pub struct CommitDeletionStep;

#[async_trait::async_trait]
impl PipelineStep<DeletionContext> for CommitDeletionStep {
    fn name(&self) -> &'static str {
        "commit_deletion"
    }

    async fn execute(&self, context: &mut DeletionContext) -> StepAction {
        let Some(plan) = context.plan.take() else {
            return StepAction::Abort(Error::Commit {
                message: "No deletion plan built before commit".to_string(),
                batches_committed: 0,
            });
        };

        let dependent_count = plan.dependent_count();
        let mut mutations: Vec<RecordRef> = plan.dependents().cloned().collect();
        mutations.push(context.request.root.clone());

        let limit = context.store.max_batch_mutations().max(1);
        let total_batches = mutations.len().div_ceil(limit);
        tracing::info!(
            "Committing {} deletion(s) for {} in {} batch(es)",
            mutations.len(),
            context.request.root,
            total_batches
        );

        for (batch_index, chunk) in mutations.chunks(limit).enumerate() {
            let mut batch = context.store.write_batch();
            for record in chunk {
                batch.delete(record);
            }
            let mutation_count = batch.mutation_count();

            if let Err(e) = batch.commit().await {
                tracing::error!(
                    "Batch {} of {} failed for {}; {} batch(es) were already committed: {}",
                    batch_index + 1,
                    total_batches,
                    context.request.root,
                    context.batches_committed,
                    e
                );
                return StepAction::Abort(Error::Commit {
                    message: format!("Batch {} of {} failed: {}", batch_index + 1, total_batches, e),
                    batches_committed: context.batches_committed,
                });
            }

            context.batches_committed += 1;
            context
                .publish(DeletionEvent::BatchCommitted {
                    batch_number: batch_index + 1,
                    mutations: mutation_count,
                })
                .await;

            // Per-batch activity record; a partially committed cascade is
            // reconciled from these.
            if let Err(e) = context
                .activity
                .log_activity(ActivityEvent::CascadeBatchCommitted {
                    root: context.request.root.clone(),
                    batch_number: batch_index + 1,
                    deleted: chunk.to_vec(),
                })
                .await
            {
                tracing::warn!("Failed to log cascade batch activity: {}", e);
            }
        }

        context.dependents_removed = dependent_count;
        StepAction::Continue
    }
}
