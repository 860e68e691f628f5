//! Session persistence.
//!
//! The session (target URLs, OAuth tokens and the TLS flag) is stored as
//! JSON at `~/.config/keyhold/config.json`. Set `KEYHOLD_CONFIG_DIR` to use
//! a different directory.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use crate::auth::Session;

/// Application name used for the config directory
const APP_NAME: &str = "keyhold";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Overrides the config directory when set
const CONFIG_DIR_ENV: &str = "KEYHOLD_CONFIG_DIR";

pub struct ConfigStore {
    config_dir: PathBuf,
}

impl ConfigStore {
    pub fn new(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
        }
    }

    /// Store in `$KEYHOLD_CONFIG_DIR`, or the platform config directory.
    pub fn from_env() -> Result<Self> {
        if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV).filter(|d| !d.is_empty()) {
            return Ok(Self::new(dir));
        }
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(Self::new(config_dir.join(APP_NAME)))
    }

    pub fn path(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILE)
    }

    /// Load the saved session, or an empty one if nothing has been saved yet.
    pub fn load(&self) -> Result<Session> {
        let path = self.path();
        if !path.exists() {
            debug!(path = %path.display(), "No saved session");
            return Ok(Session::default());
        }
        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn save(&self, session: &Session) -> Result<()> {
        let path = self.path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory {}", parent.display()))?;
        }
        let contents = serde_json::to_string_pretty(session)?;
        std::fs::write(&path, contents)
            .with_context(|| format!("Failed to write config file {}", path.display()))?;
        restrict_permissions(&path)?;
        debug!(path = %path.display(), "Session saved");
        Ok(())
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
        .context("Failed to restrict config file permissions")
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_missing_file_gives_empty_session() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path());
        assert_eq!(store.load().unwrap(), Session::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path().join("nested"));
        let session = Session {
            api_url: "https://api.example.com".to_string(),
            auth_url: "https://uaa.example.com".to_string(),
            access_token: "2YotnFZFEjr1zCsicMWpAA".to_string(),
            refresh_token: "erousflkajqwer".to_string(),
            insecure_skip_verify: true,
        };

        store.save(&session).unwrap();

        assert_eq!(store.load().unwrap(), session);
    }

    #[cfg(unix)]
    #[test]
    fn test_saved_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path());
        store.save(&Session::default()).unwrap();

        let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_load_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path());
        std::fs::write(store.path(), "{not json").unwrap();
        assert!(store.load().is_err());
    }
}
