//! Scripted collaborators shared by the unit tests.

use async_trait::async_trait;
use shared::{
    catalog::RemoteTrack,
    report::{ClassCounts, Completion, Listing},
};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use crate::{
    error::{Error, Result},
    traits::{ConfirmationPort, LibraryScanner, RemoteCatalog},
};

pub(crate) fn metrik_vip() -> RemoteTrack {
    RemoteTrack::new("abc", vec!["Metrik".to_string()], "Freefall (VIP Mix)")
}

/// In-memory catalog keyed by exact query, recording every call it receives.
#[derive(Default)]
pub(crate) struct StubCatalog {
    results: HashMap<String, Vec<RemoteTrack>>,
    saved: HashSet<String>,
    failing_searches: usize,
    failing_saves: usize,
    empty_saved_checks: bool,
    searches: Mutex<Vec<String>>,
    saved_checks: Mutex<Vec<Vec<String>>>,
    saves: Mutex<Vec<Vec<String>>>,
}

impl StubCatalog {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_result(mut self, query: &str, track: RemoteTrack) -> Self {
        self.results.entry(query.to_string()).or_default().push(track);
        self
    }

    pub(crate) fn with_saved(mut self, id: &str) -> Self {
        self.saved.insert(id.to_string());
        self
    }

    /// The first `count` searches fail with a 503.
    pub(crate) fn failing_searches(mut self, count: usize) -> Self {
        self.failing_searches = count;
        self
    }

    /// The first `count` saves fail with a 503.
    pub(crate) fn failing_saves(mut self, count: usize) -> Self {
        self.failing_saves = count;
        self
    }

    pub(crate) fn with_empty_saved_checks(mut self) -> Self {
        self.empty_saved_checks = true;
        self
    }

    pub(crate) fn searches(&self) -> Vec<String> {
        self.searches.lock().unwrap().clone()
    }

    pub(crate) fn saved_checks(&self) -> Vec<Vec<String>> {
        self.saved_checks.lock().unwrap().clone()
    }

    pub(crate) fn saves(&self) -> Vec<Vec<String>> {
        self.saves.lock().unwrap().clone()
    }

    fn unavailable() -> Error {
        Error::Api {
            status: 503,
            message: "Service unavailable".to_string(),
        }
    }
}

#[async_trait]
impl RemoteCatalog for StubCatalog {
    fn name(&self) -> &'static str {
        "Stub"
    }

    async fn search(&self, query: &str) -> Result<Vec<RemoteTrack>> {
        let call = {
            let mut searches = self.searches.lock().unwrap();
            searches.push(query.to_string());
            searches.len()
        };
        if call <= self.failing_searches {
            return Err(Self::unavailable());
        }
        Ok(self.results.get(query).cloned().unwrap_or_default())
    }

    async fn is_saved(&self, ids: &[String]) -> Result<Vec<bool>> {
        self.saved_checks.lock().unwrap().push(ids.to_vec());
        if self.empty_saved_checks {
            return Ok(vec![]);
        }
        Ok(ids.iter().map(|id| self.saved.contains(id)).collect())
    }

    async fn save(&self, ids: &[String]) -> Result<()> {
        let call = {
            let mut saves = self.saves.lock().unwrap();
            saves.push(ids.to_vec());
            saves.len()
        };
        if call <= self.failing_saves {
            return Err(Self::unavailable());
        }
        Ok(())
    }
}

/// Yields fixed descriptors, or reports a missing source when there are none.
pub(crate) struct StubScanner(pub(crate) Option<Vec<String>>);

impl LibraryScanner for StubScanner {
    fn scan(&self) -> Result<Vec<String>> {
        self.0.clone().ok_or_else(|| Error::SourceUnavailable {
            path: "/missing".into(),
            reason: "path does not exist".to_string(),
        })
    }
}

/// Answers the confirmation questions from a script and records what it was shown.
#[derive(Default)]
pub(crate) struct ScriptedPort {
    pub(crate) show_listing: bool,
    pub(crate) proceed: bool,
    pub(crate) summaries: Mutex<Vec<ClassCounts>>,
    pub(crate) listings: Mutex<Vec<Listing>>,
    pub(crate) completions: Mutex<Vec<Completion>>,
}

impl ScriptedPort {
    pub(crate) fn answering(show_listing: bool, proceed: bool) -> Self {
        Self {
            show_listing,
            proceed,
            ..Default::default()
        }
    }
}

#[async_trait]
impl ConfirmationPort for ScriptedPort {
    async fn report_summary(&self, counts: &ClassCounts) -> Result<()> {
        self.summaries.lock().unwrap().push(*counts);
        Ok(())
    }

    async fn request_listing(&self) -> Result<bool> {
        Ok(self.show_listing)
    }

    async fn show_listing(&self, listing: &Listing) -> Result<()> {
        self.listings.lock().unwrap().push(listing.clone());
        Ok(())
    }

    async fn confirm(&self, _counts: &ClassCounts) -> Result<bool> {
        Ok(self.proceed)
    }

    async fn report_completion(&self, completion: &Completion) -> Result<()> {
        self.completions.lock().unwrap().push(*completion);
        Ok(())
    }
}
