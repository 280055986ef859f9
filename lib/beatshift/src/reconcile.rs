//! One forward pass over the local descriptors, sorting each into exactly one of
//! "not available", "already exists" or "ready".

use shared::{
    catalog::RemoteTrack,
    report::{ClassCounts, Listing},
};
use std::ops::Range;
use tracing::{debug, info};

use crate::{
    error::{Error, Result},
    matcher::MatchPolicy,
    normalize::NormalizerRules,
    retry::RetryPolicy,
    traits::RemoteCatalog,
};

/// A local descriptor paired with the remote track it was matched to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedTrack {
    pub descriptor: String,
    pub track: RemoteTrack,
}

impl MatchedTrack {
    pub fn display_name(&self) -> String {
        self.track.display_name()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    NotAvailable,
    AlreadyExists,
    Ready,
}

/// Outcome of one run. Every processed descriptor lands in exactly one of
/// `not_available`, `already_exists` or `ready`; `done` is the prefix of `ready`
/// that has been submitted so far.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconciliationState {
    not_available: Vec<String>,
    already_exists: Vec<MatchedTrack>,
    ready: Vec<MatchedTrack>,
    done: Vec<MatchedTrack>,
}

impl ReconciliationState {
    pub fn not_available(&self) -> &[String] {
        &self.not_available
    }

    pub fn already_exists(&self) -> &[MatchedTrack] {
        &self.already_exists
    }

    pub fn ready(&self) -> &[MatchedTrack] {
        &self.ready
    }

    pub fn done(&self) -> &[MatchedTrack] {
        &self.done
    }

    pub fn counts(&self) -> ClassCounts {
        ClassCounts {
            not_available: self.not_available.len(),
            already_exists: self.already_exists.len(),
            ready: self.ready.len(),
        }
    }

    /// All processed descriptors, grouped by class.
    pub fn descriptors(&self) -> impl Iterator<Item = &str> {
        self.not_available
            .iter()
            .map(String::as_str)
            .chain(self.already_exists.iter().map(|m| m.descriptor.as_str()))
            .chain(self.ready.iter().map(|m| m.descriptor.as_str()))
    }

    pub fn listing(&self) -> Listing {
        Listing {
            not_available: self.not_available.clone(),
            already_exists: self
                .already_exists
                .iter()
                .map(MatchedTrack::display_name)
                .collect(),
            ready: self.ready.iter().map(MatchedTrack::display_name).collect(),
        }
    }

    pub(crate) fn mark_done(&mut self, range: Range<usize>) {
        self.done.extend_from_slice(&self.ready[range]);
    }

    fn record(&mut self, descriptor: String, found: Option<(RemoteTrack, bool)>) -> Classification {
        match found {
            None => {
                info!("Not available: {}", descriptor);
                self.not_available.push(descriptor);
                Classification::NotAvailable
            }
            Some((track, true)) => {
                info!("Already exists: {}", track.display_name());
                self.already_exists.push(MatchedTrack { descriptor, track });
                Classification::AlreadyExists
            }
            Some((track, false)) => {
                info!("Found: {}", track.display_name());
                self.ready.push(MatchedTrack { descriptor, track });
                Classification::Ready
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub normalizer: NormalizerRules,
    pub matcher: MatchPolicy,
    pub retry: RetryPolicy,
    /// Process only the first `limit` descriptors.
    pub limit: Option<usize>,
}

pub struct ReconciliationEngine<'a> {
    catalog: &'a dyn RemoteCatalog,
    config: EngineConfig,
}

impl<'a> ReconciliationEngine<'a> {
    pub fn new(catalog: &'a dyn RemoteCatalog, config: EngineConfig) -> Self {
        Self { catalog, config }
    }

    pub async fn reconcile(&self, descriptors: Vec<String>) -> Result<ReconciliationState> {
        let limit = self.config.limit.unwrap_or(descriptors.len());
        let total = descriptors.len().min(limit);
        info!(
            "Reconciling {} local tracks against {}",
            total,
            self.catalog.name()
        );

        let mut state = ReconciliationState::default();
        for (index, descriptor) in descriptors.into_iter().take(limit).enumerate() {
            debug!("[{}/{}] {}", index + 1, total, descriptor);
            self.classify(descriptor, &mut state).await?;
        }
        Ok(state)
    }

    pub async fn classify(
        &self,
        descriptor: String,
        state: &mut ReconciliationState,
    ) -> Result<Classification> {
        let query = self.config.normalizer.normalize(&descriptor);
        let results = self
            .config
            .retry
            .execute("Catalog search", || self.catalog.search(&query))
            .await?;

        let Some(candidate) = results.into_iter().next() else {
            debug!("No search results for '{}'", query);
            return Ok(state.record(descriptor, None));
        };

        let candidate_name = candidate.display_name();
        if !self.config.matcher.is_match(&candidate_name, &query) {
            debug!("Rejected '{}' for query '{}'", candidate_name, query);
            return Ok(state.record(descriptor, None));
        }

        let ids = [candidate.id.clone()];
        let flags = self
            .config
            .retry
            .execute("Saved-track check", || self.catalog.is_saved(&ids))
            .await?;
        let saved = flags.first().copied().ok_or_else(|| {
            Error::UnexpectedResponse(format!("no saved flag returned for track {}", candidate.id))
        })?;

        Ok(state.record(descriptor, Some((candidate, saved))))
    }
}
