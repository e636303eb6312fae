use super::cancel::CancelToken;
use super::pipeline_step::{PipelineStep, StepAction};
use crate::error::Error;

/// A generic pipeline that executes a series of steps in sequence.
///
/// The pipeline pattern provides a structured way to organize complex
/// operations into discrete, testable steps. Each step can decide whether
/// to continue, skip remaining steps, or abort the entire pipeline.
///
/// Cancellation is checked before every step; the gap between steps is
/// the only cancellation point, so a step's own work is never torn down
/// halfway.
///
/// # Type Parameters
///
/// * `T` - The context type that will be passed through all steps. The
///   context typically contains shared state, dependencies, and results
///   that steps need to read or modify.
pub struct Pipeline<T> {
    pub steps: Vec<Box<dyn PipelineStep<T>>>,
}

impl<T> Pipeline<T> {
    /// Create a pipeline with the given steps.
    pub fn with_steps(steps: Vec<Box<dyn PipelineStep<T>>>) -> Self {
        Self { steps }
    }

    /// Execute all steps in the pipeline in sequence.
    ///
    /// Steps are executed in order, with each step's `should_execute()`
    /// check determining if it runs. The pipeline continues until all
    /// steps complete, a step returns `Skip`, a step returns `Abort`, or
    /// the cancel token is set between steps.
    pub async fn execute(&self, context: &mut T, cancel: &CancelToken) -> Result<(), Error> {
        for step in &self.steps {
            if cancel.is_cancelled() {
                tracing::info!("Pipeline cancelled before step {}", step.name());
                return Err(Error::OperationCancelled);
            }

            if !step.should_execute(context) {
                tracing::info!("Step {} will be skipped based on context", step.name());
                continue;
            }

            tracing::info!("Executing step: {}", step.name());

            match step.execute(context).await {
                StepAction::Continue => {
                    // Proceed to next step
                    continue;
                }
                StepAction::Skip => {
                    tracing::info!("Step {} requested skip - stopping pipeline", step.name());
                    return Ok(());
                }
                StepAction::Abort(error) => {
                    tracing::error!("Step {} aborted the pipeline: {}", step.name(), error);
                    return Err(error);
                }
            }
        }

        Ok(())
    }
}
