use async_trait::async_trait;
use shared::{
    catalog::RemoteTrack,
    report::{ClassCounts, Completion, Listing},
};

use crate::error::Result;

/// The remote catalog/library the local collection is reconciled against.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RemoteCatalog: Send + Sync {
    /// Human-readable service name for logs.
    fn name(&self) -> &'static str;

    /// Ranked search results, best first. May be empty.
    async fn search(&self, query: &str) -> Result<Vec<RemoteTrack>>;

    /// One flag per id, same length and order as `ids`.
    async fn is_saved(&self, ids: &[String]) -> Result<Vec<bool>>;

    /// Adds `ids` to the saved library. Saving an already saved id is a no-op.
    async fn save(&self, ids: &[String]) -> Result<()>;
}

/// Produces the ordered local descriptors for one run.
pub trait LibraryScanner: Send + Sync {
    fn scan(&self) -> Result<Vec<String>>;
}

/// The interactive side of a run: summary in, continue/abort decision out.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConfirmationPort: Send + Sync {
    async fn report_summary(&self, counts: &ClassCounts) -> Result<()>;

    /// Whether the itemized listings should be shown.
    async fn request_listing(&self) -> Result<bool>;

    async fn show_listing(&self, listing: &Listing) -> Result<()>;

    /// `true` to continue with submission, `false` to abort.
    async fn confirm(&self, counts: &ClassCounts) -> Result<bool>;

    async fn report_completion(&self, completion: &Completion) -> Result<()>;
}
