use std::{path::PathBuf, process::ExitCode, time::Duration};

use beatshift::{
    matcher::{DEFAULT_MIX_SUFFIX_PATTERN, DEFAULT_THRESHOLD},
    normalize::{DEFAULT_CONNECTOR_PATTERN, DEFAULT_FEATURED_PATTERN},
    retry::{DEFAULT_INITIAL_DELAY_MS, DEFAULT_MAX_RETRIES},
    scanner::FileScanner,
    spotify::{Credentials, SpotifyClientBuilder, SCOPES},
    submit::MAX_BATCH_SIZE,
    EngineConfig, MatchPolicy, Migration, MigrationConfig, NormalizerRules, RetryPolicy,
    RunOutcome, SubmitConfig,
};
use clap::{Args, Parser, Subcommand};
use rand::{distr::Alphanumeric, Rng};
use tracing::{error, info, warn};

use crate::{
    config::AppConfig, credentials::CredentialStore, error::AppError, prompt::TerminalPrompt,
};

mod callback;
mod config;
mod credentials;
mod error;
mod prompt;

#[derive(Parser, Debug)]
#[command(name = "beatshift", version, about = "Migrate a local music library to Spotify")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Authorize against Spotify and store the tokens
    Auth,
    /// Save local tracks to the Spotify library
    Migrate(MigrateArgs),
}

#[derive(Args, Debug)]
struct MigrateArgs {
    /// Root folder of the local library
    #[arg(env = "SOURCE")]
    source: PathBuf,

    /// Skip files whose path relative to the source matches this regex
    #[arg(long, env = "IGNORE")]
    ignore: Option<String>,

    /// Only process the first N tracks
    #[arg(long)]
    limit: Option<usize>,

    /// Minimum similarity for a search result to count as the same track
    #[arg(long, env = "MATCH_THRESHOLD", default_value_t = DEFAULT_THRESHOLD)]
    threshold: f64,

    /// Compare titles case-sensitively
    #[arg(long)]
    no_case_fold: bool,

    #[arg(long, default_value = DEFAULT_FEATURED_PATTERN)]
    featured_pattern: String,

    #[arg(long, default_value = DEFAULT_CONNECTOR_PATTERN)]
    connector_pattern: String,

    #[arg(long, default_value = DEFAULT_MIX_SUFFIX_PATTERN)]
    mix_suffix_pattern: String,

    /// Tracks per save request (1-50)
    #[arg(long, default_value_t = MAX_BATCH_SIZE)]
    batch_size: usize,

    /// Wait before the first attempt of every remote call, doubled on each retry
    #[arg(long, env = "INITIAL_DELAY_MS", default_value_t = DEFAULT_INITIAL_DELAY_MS)]
    initial_delay_ms: u64,

    #[arg(long, env = "MAX_RETRIES", default_value_t = DEFAULT_MAX_RETRIES)]
    max_retries: u32,

    /// Answer yes to the migration confirmation
    #[arg(long, short)]
    yes: bool,

    /// Always print the full listings
    #[arg(long)]
    list: bool,
}

impl MigrateArgs {
    fn migration_config(&self) -> beatshift::error::Result<MigrationConfig> {
        let retry = RetryPolicy::new(
            Duration::from_millis(self.initial_delay_ms),
            self.max_retries,
        );
        Ok(MigrationConfig {
            engine: EngineConfig {
                normalizer: NormalizerRules::new(&self.featured_pattern, &self.connector_pattern)?,
                matcher: MatchPolicy::new(
                    self.threshold,
                    !self.no_case_fold,
                    &self.mix_suffix_pattern,
                    &self.featured_pattern,
                )?,
                retry,
                limit: self.limit,
            },
            submit: SubmitConfig::new(self.batch_size, retry)?,
        })
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match run(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command) -> Result<(), AppError> {
    let config = AppConfig::from_env()?;
    let store = CredentialStore::new(config.credentials_path());

    match command {
        Command::Auth => authorize(&config, &store).await.map(|_| ()),
        Command::Migrate(args) => migrate(&config, &store, &args).await,
    }
}

async fn authorize(config: &AppConfig, store: &CredentialStore) -> Result<Credentials, AppError> {
    let oauth = config.oauth()?;
    let state: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(16)
        .map(char::from)
        .collect();

    let url = oauth.authorize_url(SCOPES, &state)?;
    println!("Open this URL in a browser to authorize access:\n\n  {url}\n");

    let code = callback::wait_for_code(config.port(), state).await?;
    let credentials = oauth.exchange_code(&code).await?;
    store.save(&credentials)?;
    info!("Saved credentials to {}", store.path().display());
    Ok(credentials)
}

async fn migrate(
    config: &AppConfig,
    store: &CredentialStore,
    args: &MigrateArgs,
) -> Result<(), AppError> {
    let migration_config = args.migration_config()?;
    let credentials = match store.load()? {
        Some(credentials) => credentials,
        None => {
            info!("No stored credentials, starting authorization");
            authorize(config, store).await?
        }
    };

    let sink = store.clone();
    let mut builder = SpotifyClientBuilder::new()
        .api_url(config.api_url())
        .credentials(credentials)
        .on_refresh(move |credentials| {
            if let Err(e) = sink.save(credentials) {
                warn!("Could not persist refreshed credentials: {e}");
            }
        });
    match config.oauth() {
        Ok(oauth) => builder = builder.oauth(oauth),
        Err(e) => warn!("Token refresh disabled: {e}"),
    }
    let client = builder.build()?;

    let scanner = FileScanner::new(&args.source, args.ignore.as_deref())?;
    let prompt = TerminalPrompt::stdio(args.list, args.yes);

    let mut migration = Migration::new(&client, &scanner, &prompt, migration_config);
    match migration.run().await? {
        RunOutcome::Completed { completion, .. } => {
            info!("Saved {}/{} tracks", completion.done, completion.ready);
        }
        RunOutcome::Aborted { .. } => info!("Nothing was saved"),
    }
    Ok(())
}
