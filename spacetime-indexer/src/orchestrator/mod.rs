//! Orchestrator module for the indexer.
//!
//! Runs pipeline units strictly in order. A unit is only started once the
//! engine call of the previous one has completed, so a dataset index always
//! exists before documents are written into it.

use futures::{Stream, StreamExt};
use spacetime_indexer_shared::Message;
use tracing::{debug, error, info, instrument};

use crate::consumer::{MessageBatcher, PipelineUnit};
use crate::errors::IngestError;
use crate::loader::{IndexLifecycleManager, LifecycleOutcome, SearchLoader};
use crate::processor::OperationTranslator;

/// Default cap on the number of objects in one bulk request.
pub const DEFAULT_MAX_BATCH_SIZE: usize = 1000;

/// Configuration for the orchestrator.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Upper bound on objects per batch. `None` leaves runs of objects whole.
    pub max_batch_size: Option<usize>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_batch_size: Some(DEFAULT_MAX_BATCH_SIZE),
        }
    }
}

/// Counters for a completed run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineReport {
    /// Units executed.
    pub units: usize,
    /// Object batches sent to the engine.
    pub batches: usize,
    pub datasets_created: usize,
    /// Create messages for indices that already existed.
    pub datasets_existing: usize,
    pub datasets_deleted: usize,
    pub dataset_updates_skipped: usize,
    /// Operations the engine applied.
    pub documents_written: usize,
    /// Objects left out because they could not be translated.
    pub records_rejected: usize,
    /// Operations the engine rejected inside an accepted bulk request.
    pub item_failures: usize,
}

/// Orchestrator that executes pipeline units against the engine.
pub struct Orchestrator {
    translator: OperationTranslator,
    loader: SearchLoader,
    lifecycle: IndexLifecycleManager,
    config: OrchestratorConfig,
}

impl Orchestrator {
    /// Create a new orchestrator with the given components.
    pub fn new(
        translator: OperationTranslator,
        loader: SearchLoader,
        lifecycle: IndexLifecycleManager,
    ) -> Self {
        Self::with_config(translator, loader, lifecycle, OrchestratorConfig::default())
    }

    /// Create a new orchestrator with custom configuration.
    pub fn with_config(
        translator: OperationTranslator,
        loader: SearchLoader,
        lifecycle: IndexLifecycleManager,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            translator,
            loader,
            lifecycle,
            config,
        }
    }

    /// Batch and execute a message stream.
    pub async fn run_messages<S>(&self, messages: S) -> Result<PipelineReport, IngestError>
    where
        S: Stream<Item = Result<Message, IngestError>> + Unpin,
    {
        let units = MessageBatcher::new(messages, self.config.max_batch_size);
        self.run(units).await
    }

    /// Execute pipeline units in order.
    ///
    /// # Returns
    ///
    /// * `Ok(PipelineReport)` - Every unit was executed
    /// * `Err(IngestError)` - The first fatal error; units before it stay applied
    #[instrument(skip_all)]
    pub async fn run<S>(&self, mut units: S) -> Result<PipelineReport, IngestError>
    where
        S: Stream<Item = Result<PipelineUnit, IngestError>> + Unpin,
    {
        info!("Starting indexing pipeline");
        let mut report = PipelineReport::default();

        // The next unit is only pulled once the previous one has completed.
        while let Some(unit) = units.next().await {
            let result = match unit {
                Ok(unit) => self.execute(unit, &mut report).await,
                Err(e) => Err(e),
            };

            if let Err(e) = result {
                error!(error = %e, units_completed = report.units, "Pipeline halted");
                return Err(e);
            }
            report.units += 1;
        }

        info!(
            units = report.units,
            batches = report.batches,
            datasets_created = report.datasets_created,
            datasets_deleted = report.datasets_deleted,
            documents_written = report.documents_written,
            records_rejected = report.records_rejected,
            item_failures = report.item_failures,
            "Pipeline completed"
        );
        Ok(report)
    }

    async fn execute(
        &self,
        unit: PipelineUnit,
        report: &mut PipelineReport,
    ) -> Result<(), IngestError> {
        match unit {
            PipelineUnit::Objects(objects) => {
                debug!(object_count = objects.len(), "Processing batch of objects");

                let batch = self.translator.translate_batch(&objects);
                report.records_rejected += batch.rejected.len();

                if batch.operations.is_empty() {
                    debug!("No operations left after translation");
                    return Ok(());
                }

                let summary = self.loader.write(&batch.operations).await?;
                report.batches += 1;
                report.documents_written += summary.succeeded;
                report.item_failures += summary.failed;
            }
            PipelineUnit::Dataset(dataset) => match self.lifecycle.apply(&dataset).await? {
                LifecycleOutcome::Created => report.datasets_created += 1,
                LifecycleOutcome::AlreadyExists => report.datasets_existing += 1,
                LifecycleOutcome::Deleted => report.datasets_deleted += 1,
                LifecycleOutcome::Skipped => report.dataset_updates_skipped += 1,
            },
        }
        Ok(())
    }
}
