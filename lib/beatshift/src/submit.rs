use shared::report::Completion;
use std::ops::Range;
use tracing::info;

use crate::{
    error::{Error, Result},
    reconcile::ReconciliationState,
    retry::RetryPolicy,
    traits::RemoteCatalog,
};

/// Largest bulk save the remote library accepts.
pub const MAX_BATCH_SIZE: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmitConfig {
    batch_size: usize,
    pub retry: RetryPolicy,
}

impl SubmitConfig {
    pub fn new(batch_size: usize, retry: RetryPolicy) -> Result<Self> {
        if !(1..=MAX_BATCH_SIZE).contains(&batch_size) {
            return Err(Error::NotConfigured(format!(
                "batch size must be between 1 and {MAX_BATCH_SIZE}, got {batch_size}"
            )));
        }
        Ok(Self { batch_size, retry })
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }
}

impl Default for SubmitConfig {
    fn default() -> Self {
        Self {
            batch_size: MAX_BATCH_SIZE,
            retry: RetryPolicy::default(),
        }
    }
}

/// Consecutive, ordered index ranges of at most `capacity` items covering `0..len`.
pub fn chunk_ranges(len: usize, capacity: usize) -> Vec<Range<usize>> {
    let capacity = capacity.max(1);
    (0..len)
        .step_by(capacity)
        .map(|start| start..(start + capacity).min(len))
        .collect()
}

/// Saves the `ready` tracks of a reconciliation in bounded batches, one batch at a time.
pub struct BatchSubmitter<'a> {
    catalog: &'a dyn RemoteCatalog,
    config: SubmitConfig,
}

impl<'a> BatchSubmitter<'a> {
    pub fn new(catalog: &'a dyn RemoteCatalog, config: SubmitConfig) -> Self {
        Self { catalog, config }
    }

    /// Each batch that succeeds is appended to `done` before the next one starts.
    /// A batch that still fails after retries stops the submission; `done` then
    /// holds exactly the batches saved so far.
    pub async fn submit(&self, state: &mut ReconciliationState) -> Result<Completion> {
        let ranges = chunk_ranges(state.ready().len(), self.config.batch_size);
        info!(
            "Submitting {} tracks to {} in {} batches",
            state.ready().len(),
            self.catalog.name(),
            ranges.len()
        );

        for (index, range) in ranges.into_iter().enumerate() {
            let ids: Vec<String> = state.ready()[range.clone()]
                .iter()
                .map(|m| m.track.id.clone())
                .collect();

            self.config
                .retry
                .execute("Library save", || self.catalog.save(&ids))
                .await?;

            state.mark_done(range);
            info!(
                "Batch {} saved ({} tracks, {}/{} done)",
                index + 1,
                ids.len(),
                state.done().len(),
                state.ready().len()
            );
        }

        Ok(Completion {
            done: state.done().len(),
            ready: state.ready().len(),
        })
    }
}
