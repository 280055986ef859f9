pub mod error;
pub mod matcher;
pub mod migration;
pub mod normalize;
pub mod reconcile;
pub mod retry;
pub mod scanner;
pub mod spotify;
pub mod submit;
pub mod traits;

#[cfg(test)]
mod testing;

pub use matcher::MatchPolicy;
pub use migration::{Migration, MigrationConfig, RunOutcome, RunPhase};
pub use normalize::NormalizerRules;
pub use reconcile::{EngineConfig, MatchedTrack, ReconciliationEngine, ReconciliationState};
pub use retry::RetryPolicy;
pub use submit::{BatchSubmitter, SubmitConfig};
pub use traits::{ConfirmationPort, LibraryScanner, RemoteCatalog};
