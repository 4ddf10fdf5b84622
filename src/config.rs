//! Configuration file handling for tally.
//!
//! The configuration file is stored at `$TALLY_HOME/config.json` and holds the address of the
//! tracker service, the request timeout and the location of the stored credential.

use crate::api::Credential;
use crate::error::{ErrorType, IntoResult, Res, Result};
use crate::utils;
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

const APP_NAME: &str = "tally";
const CONFIG_VERSION: u8 = 1;
const SECRETS: &str = ".secrets";
const TOKEN: &str = "token";
const CONFIG_JSON: &str = "config.json";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// The `Config` object represents the configuration of the app. You instantiate it by providing
/// the path to `$TALLY_HOME` and from there it loads `$TALLY_HOME/config.json`.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    secrets: PathBuf,
    config_path: PathBuf,
    config_file: ConfigFile,
    base_url: Url,
}

impl Config {
    /// Creates the home directory and its `.secrets` subdirectory, then writes an initial
    /// `config.json` pointing at `base_url`, e.g. `http://127.0.0.1:5000`.
    pub async fn create(dir: impl Into<PathBuf>, base_url: &str) -> Result<Self> {
        Self::create_inner(dir.into(), base_url)
            .await
            .pub_result(ErrorType::Config)
    }

    async fn create_inner(maybe_relative: PathBuf, base_url: &str) -> Res<Self> {
        let base_url = parse_base_url(base_url)?;
        utils::make_dir(&maybe_relative)
            .await
            .context("Unable to create the tally home directory")?;
        let root = utils::canonicalize(&maybe_relative).await?;
        let secrets = root.join(SECRETS);
        utils::make_dir(&secrets).await?;

        let config_path = root.join(CONFIG_JSON);
        let config_file = ConfigFile {
            base_url: base_url.to_string(),
            ..ConfigFile::default()
        };
        config_file.save(&config_path).await?;
        info!("Created {}", config_path.display());

        Ok(Self {
            root,
            secrets,
            config_path,
            config_file,
            base_url,
        })
    }

    /// Validates that `tally_home` and its config file exist, then loads the config file.
    pub async fn load(tally_home: impl Into<PathBuf>) -> Result<Self> {
        Self::load_inner(tally_home.into())
            .await
            .pub_result(ErrorType::Config)
    }

    async fn load_inner(maybe_relative: PathBuf) -> Res<Self> {
        let root = utils::canonicalize(&maybe_relative)
            .await
            .context("Tally Home is missing, run 'tally init' first")?;
        let _ = utils::read_dir(&root).await?;

        let config_path = root.join(CONFIG_JSON);
        if !config_path.is_file() {
            bail!("The config file is missing '{}'", config_path.display())
        }
        let config_file = ConfigFile::load(&config_path).await?;
        let base_url = parse_base_url(&config_file.base_url)
            .with_context(|| format!("Invalid base_url in {}", config_path.display()))?;
        debug!("Loaded {}", config_path.display());

        Ok(Self {
            secrets: root.join(SECRETS),
            root,
            config_path,
            config_file,
            base_url,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn secrets(&self) -> &Path {
        &self.secrets
    }

    /// The address of the tracker service. API paths are joined onto it.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Points this config at a different service. The change is not saved to `config.json`.
    pub fn set_base_url(&mut self, base_url: &str) -> Result<()> {
        self.base_url = parse_base_url(base_url).pub_result(ErrorType::Config)?;
        self.config_file.base_url = self.base_url.to_string();
        Ok(())
    }

    /// The limit applied to every request made to the service.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.config_file.timeout_secs)
    }

    /// Returns the stored `token_path` if it is absolute, otherwise resolves the relative path.
    pub fn token_path(&self) -> PathBuf {
        let p = self.config_file.token_path();
        if p.is_absolute() {
            return p;
        }
        self.root.join(p)
    }

    /// The stored credential, or `None` when the user has not signed in. A blank token file is
    /// the same as no token file.
    pub async fn credential(&self) -> Result<Option<Credential>> {
        let path = self.token_path();
        let content = utils::read_if_exists(&path)
            .await
            .pub_result(ErrorType::Config)?;
        match content {
            Some(token) if !token.trim().is_empty() => Ok(Some(Credential::new(token)?)),
            _ => Ok(None),
        }
    }

    /// Stores `credential` in the token file, readable only by the current user.
    pub async fn save_credential(&self, credential: &Credential) -> Result<()> {
        let path = self.token_path();
        if let Some(parent) = path.parent() {
            utils::make_dir(parent).await.pub_result(ErrorType::Config)?;
        }
        utils::write_secret(&path, credential.token())
            .await
            .pub_result(ErrorType::Config)?;
        info!("Credential saved to {}", path.display());
        Ok(())
    }

    /// Deletes the token file. Returns `false` if there was none.
    pub async fn clear_credential(&self) -> Result<bool> {
        let path = self.token_path();
        let removed = utils::remove_if_exists(&path)
            .await
            .pub_result(ErrorType::Config)?;
        debug!("Removed {}: {removed}", path.display());
        Ok(removed)
    }
}

fn parse_base_url(s: &str) -> Res<Url> {
    let url = Url::parse(s.trim()).with_context(|| format!("'{s}' is not a valid URL"))?;
    anyhow::ensure!(
        matches!(url.scheme(), "http" | "https"),
        "The service URL must use http or https, got '{}'",
        url.scheme()
    );
    anyhow::ensure!(!url.cannot_be_a_base(), "'{s}' cannot be used as a base URL");
    Ok(url)
}

/// Represents the serialization and deserialization format of the configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "tally",
///   "config_version": 1,
///   "base_url": "http://127.0.0.1:5000/",
///   "timeout_secs": 30,
///   "token_path": ".secrets/token"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
struct ConfigFile {
    /// Application name, should always be "tally"
    app_name: String,

    /// Configuration file version
    config_version: u8,

    /// Address of the tracker service
    base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    timeout_secs: u64,

    /// Path to the credential file (optional, relative to the home directory or absolute)
    /// Defaults to $TALLY_HOME/.secrets/token if not specified
    #[serde(default, skip_serializing_if = "Option::is_none")]
    token_path: Option<PathBuf>,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            base_url: String::new(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            token_path: None,
        }
    }
}

impl ConfigFile {
    async fn load(path: impl AsRef<Path>) -> Res<Self> {
        let path = path.as_ref();
        let content = utils::read(path).await?;
        let config: ConfigFile = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file at {}", path.display()))?;

        anyhow::ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );
        anyhow::ensure!(
            config.timeout_secs > 0,
            "timeout_secs in {} must be greater than zero",
            path.display()
        );

        Ok(config)
    }

    async fn save(&self, path: impl AsRef<Path>) -> Res<()> {
        let data = serde_json::to_string_pretty(self).context("Unable to serialize config")?;
        utils::write(path, data)
            .await
            .context("Unable to write config file")
    }

    fn token_path(&self) -> PathBuf {
        self.token_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(SECRETS).join(TOKEN))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_config_create_and_load() {
        let dir = TempDir::new().unwrap();
        let home = dir.path().join("tally_home");
        let created = Config::create(&home, "http://127.0.0.1:5000").await.unwrap();
        assert!(created.secrets().is_dir());
        assert!(created.config_path().is_file());

        let loaded = Config::load(&home).await.unwrap();
        assert_eq!(loaded.base_url().as_str(), "http://127.0.0.1:5000/");
        assert_eq!(loaded.timeout(), Duration::from_secs(30));
        assert_eq!(loaded.token_path(), loaded.root().join(".secrets/token"));
    }

    #[tokio::test]
    async fn test_create_rejects_bad_url() {
        let dir = TempDir::new().unwrap();
        let err = Config::create(dir.path(), "ftp://example.com")
            .await
            .unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Config);
        assert!(Config::create(dir.path(), "not a url").await.is_err());
    }

    #[tokio::test]
    async fn test_load_missing_home() {
        let dir = TempDir::new().unwrap();
        let err = Config::load(dir.path().join("nope")).await.unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Config);
    }

    #[tokio::test]
    async fn test_config_file_load_with_minimal_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_JSON);
        let json = r#"{
            "app_name": "tally",
            "config_version": 1,
            "base_url": "https://tracker.example.com"
        }"#;
        utils::write(&path, json).await.unwrap();
        let config = ConfigFile::load(&path).await.unwrap();
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.token_path(), PathBuf::from(SECRETS).join(TOKEN));
    }

    #[tokio::test]
    async fn test_config_file_load_invalid_app_name() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_JSON);
        let json = r#"{"app_name": "wrong_app", "config_version": 1, "base_url": "http://x"}"#;
        utils::write(&path, json).await.unwrap();
        let err = ConfigFile::load(&path).await.unwrap_err();
        assert!(err.to_string().contains("Invalid app_name"));
    }

    #[tokio::test]
    async fn test_config_file_serialization_omits_none_fields() {
        let json = serde_json::to_string(&ConfigFile::default()).unwrap();
        assert!(!json.contains("token_path"));
    }

    #[tokio::test]
    async fn test_credential_lifecycle() {
        let dir = TempDir::new().unwrap();
        let config = Config::create(dir.path(), "http://127.0.0.1:5000")
            .await
            .unwrap();
        assert!(config.credential().await.unwrap().is_none());

        let credential = Credential::new("abc.def.ghi").unwrap();
        config.save_credential(&credential).await.unwrap();
        assert_eq!(config.credential().await.unwrap(), Some(credential));

        assert!(config.clear_credential().await.unwrap());
        assert!(config.credential().await.unwrap().is_none());
        assert!(!config.clear_credential().await.unwrap());
    }

    #[tokio::test]
    async fn test_blank_token_file_is_no_credential() {
        let dir = TempDir::new().unwrap();
        let config = Config::create(dir.path(), "http://127.0.0.1:5000")
            .await
            .unwrap();
        utils::write(config.token_path(), "  \n").await.unwrap();
        assert!(config.credential().await.unwrap().is_none());
    }
}
