//! Drives one run: scan, reconcile, confirm, submit.

use shared::report::Completion;
use tracing::{error, info};

use crate::{
    error::Result,
    reconcile::{EngineConfig, ReconciliationEngine, ReconciliationState},
    submit::{BatchSubmitter, SubmitConfig},
    traits::{ConfirmationPort, LibraryScanner, RemoteCatalog},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    Scanning,
    AwaitingConfirmation,
    Submitting,
    Completed,
    Aborted,
    Fatal,
}

impl RunPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Aborted | Self::Fatal)
    }
}

#[derive(Debug)]
pub enum RunOutcome {
    Completed {
        state: ReconciliationState,
        completion: Completion,
    },
    Aborted {
        state: ReconciliationState,
    },
}

impl RunOutcome {
    pub fn state(&self) -> &ReconciliationState {
        match self {
            Self::Completed { state, .. } | Self::Aborted { state } => state,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MigrationConfig {
    pub engine: EngineConfig,
    pub submit: SubmitConfig,
}

pub struct Migration<'a> {
    catalog: &'a dyn RemoteCatalog,
    scanner: &'a dyn LibraryScanner,
    port: &'a dyn ConfirmationPort,
    config: MigrationConfig,
    phase: RunPhase,
}

impl<'a> Migration<'a> {
    pub fn new(
        catalog: &'a dyn RemoteCatalog,
        scanner: &'a dyn LibraryScanner,
        port: &'a dyn ConfirmationPort,
        config: MigrationConfig,
    ) -> Self {
        Self {
            catalog,
            scanner,
            port,
            config,
            phase: RunPhase::Idle,
        }
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    /// Runs to a terminal phase. Errors leave the run in [`RunPhase::Fatal`].
    pub async fn run(&mut self) -> Result<RunOutcome> {
        match self.drive().await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                error!("Migration failed during {:?}: {}", self.phase, e);
                self.phase = RunPhase::Fatal;
                Err(e)
            }
        }
    }

    async fn drive(&mut self) -> Result<RunOutcome> {
        self.phase = RunPhase::Scanning;
        let descriptors = self.scanner.scan()?;
        info!("Scanned {} local tracks", descriptors.len());

        let engine = ReconciliationEngine::new(self.catalog, self.config.engine.clone());
        let mut state = engine.reconcile(descriptors).await?;

        self.phase = RunPhase::AwaitingConfirmation;
        let counts = state.counts();
        self.port.report_summary(&counts).await?;
        if self.port.request_listing().await? {
            self.port.show_listing(&state.listing()).await?;
        }

        if state.ready().is_empty() {
            info!("Nothing to migrate");
            let completion = Completion::default();
            self.port.report_completion(&completion).await?;
            self.phase = RunPhase::Completed;
            return Ok(RunOutcome::Completed { state, completion });
        }

        if !self.port.confirm(&counts).await? {
            info!("Migration aborted, no tracks were saved");
            self.phase = RunPhase::Aborted;
            return Ok(RunOutcome::Aborted { state });
        }

        self.phase = RunPhase::Submitting;
        let completion = BatchSubmitter::new(self.catalog, self.config.submit)
            .submit(&mut state)
            .await?;
        self.port.report_completion(&completion).await?;
        info!(
            "Migration complete: {}/{} tracks saved",
            completion.done, completion.ready
        );

        self.phase = RunPhase::Completed;
        Ok(RunOutcome::Completed { state, completion })
    }
}
