use beatshift::spotify::Credentials;
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::info;

use crate::error::AppError;

/// JSON file holding the access and refresh tokens between runs.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Option<Credentials>, AppError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let text = fs::read_to_string(&self.path).map_err(|e| self.error("read", e))?;
        let credentials: Credentials =
            serde_json::from_str(&text).map_err(|e| self.error("parse", e))?;
        info!("Got credentials from {}", self.path.display());
        Ok(Some(credentials))
    }

    pub fn save(&self, credentials: &Credentials) -> Result<(), AppError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.error("create directory for", e))?;
        }
        let text =
            serde_json::to_string_pretty(credentials).map_err(|e| self.error("encode", e))?;
        fs::write(&self.path, text).map_err(|e| self.error("write", e))?;
        Ok(())
    }

    fn error(&self, action: &str, e: impl std::fmt::Display) -> AppError {
        AppError::Credentials(format!("could not {action} {}: {e}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path().join("credentials.json"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn saved_credentials_load_back() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path().join("nested/credentials.json"));
        let credentials = Credentials::new("access", Some("refresh".to_string()));

        store.save(&credentials).unwrap();

        assert_eq!(store.load().unwrap(), Some(credentials));
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        fs::write(&path, "not json").unwrap();

        assert!(matches!(
            CredentialStore::new(path).load(),
            Err(AppError::Credentials(_))
        ));
    }
}
