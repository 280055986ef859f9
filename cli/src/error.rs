use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required {0} env var")]
    Missing(&'static str),

    #[error("Invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },
}

#[derive(Error, Debug)]
pub enum CallbackError {
    #[error("Authorization failed: {0}")]
    Denied(String),

    #[error("Callback listener failed: {0}")]
    Listener(#[from] std::io::Error),

    #[error("Callback listener stopped before receiving a code")]
    Closed,
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Callback(#[from] CallbackError),

    #[error(transparent)]
    Core(#[from] beatshift::error::Error),

    #[error("Credential store error: {0}")]
    Credentials(String),
}
