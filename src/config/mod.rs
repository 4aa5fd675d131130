//! Configuration management
//!
//! Settings live in `~/.storydesk/config.yaml` (or the file named by
//! `STORYDESK_CONFIG`). API keys are never read from the file: they come
//! from environment variables first, then the OS keyring.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use keyring::Entry;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use crate::cms::{DEFAULT_CMS_URL, DEFAULT_EDITOR_URL};
use crate::crm::{DEFAULT_CRM_APP_URL, DEFAULT_CRM_URL};

/// Keyring service name for stored API keys.
pub const KEYRING_SERVICE: &str = "storydesk";

/// Environment variable overriding the config file location.
pub const CONFIG_PATH_ENV: &str = "STORYDESK_CONFIG";

/// Environment variable overriding `cms.space_id`.
pub const SPACE_ID_ENV: &str = "STORYDESK_CMS_SPACE_ID";

/// An external service that needs an API key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Service {
    /// The CMS management API.
    Cms,
    /// The CRM API.
    Crm,
}

impl Service {
    pub const ALL: [Service; 2] = [Service::Cms, Service::Crm];

    /// Environment variable holding this service's key.
    pub fn env_var(self) -> &'static str {
        match self {
            Service::Cms => "STORYDESK_CMS_API_KEY",
            Service::Crm => "STORYDESK_CRM_API_KEY",
        }
    }

    /// Keyring user name for this service's key.
    pub fn keyring_user(self) -> &'static str {
        match self {
            Service::Cms => "cms-api-key",
            Service::Crm => "crm-api-key",
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Service::Cms => write!(f, "cms"),
            Service::Crm => write!(f, "crm"),
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub cms: CmsSettings,
    pub crm: CrmSettings,
    pub http: HttpSettings,
}

/// CMS connection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CmsSettings {
    /// Management API host.
    pub base_url: String,
    /// Space holding the stories. Required for story commands.
    pub space_id: Option<String>,
    /// Only list published stories unless a command asks for drafts.
    pub published_only: bool,
    /// Web editor host, used for story links.
    pub editor_url: String,
}

impl Default for CmsSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_CMS_URL.to_string(),
            space_id: None,
            published_only: true,
            editor_url: DEFAULT_EDITOR_URL.to_string(),
        }
    }
}

/// CRM connection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrmSettings {
    /// API host.
    pub base_url: String,
    /// Web app host, used for record links.
    pub app_url: String,
    /// Portal (account) id. Record links are omitted without it.
    pub portal_id: Option<String>,
}

impl Default for CrmSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_CRM_URL.to_string(),
            app_url: DEFAULT_CRM_APP_URL.to_string(),
            portal_id: None,
        }
    }
}

/// HTTP client settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 10,
            request_timeout_secs: 30,
        }
    }
}

impl HttpSettings {
    /// Builds a blocking HTTP client with the configured timeouts.
    pub fn build_client(&self) -> Result<Client, ConfigError> {
        Client::builder()
            .connect_timeout(Duration::from_secs(self.connect_timeout_secs))
            .timeout(Duration::from_secs(self.request_timeout_secs))
            .user_agent(concat!("storydesk/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))
    }
}

impl Config {
    /// Loads the configuration from the default location and applies
    /// environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path()?;
        let mut config = Self::load_from(&path)?;
        config.apply_overrides(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Loads a config file. A missing or empty file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::Unreadable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        Self::parse(&content).map_err(|reason| ConfigError::Invalid {
            path: path.to_path_buf(),
            reason,
        })
    }

    /// Parses YAML config text.
    pub fn parse(content: &str) -> Result<Self, String> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_saphyr::from_str(content).map_err(|e| e.to_string())
    }

    /// Applies environment overrides using the given variable lookup.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(space_id) = lookup(SPACE_ID_ENV).filter(|s| !s.trim().is_empty()) {
            self.cms.space_id = Some(space_id.trim().to_string());
        }
    }

    /// Returns the configured space id or an error naming how to set it.
    pub fn space_id(&self) -> Result<&str, ConfigError> {
        self.cms
            .space_id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::MissingSetting {
                key: "cms.space_id",
                env: SPACE_ID_ENV,
            })
    }

    /// Returns the config file path.
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        if let Some(path) = std::env::var_os(CONFIG_PATH_ENV).filter(|p| !p.is_empty()) {
            return Ok(PathBuf::from(path));
        }

        let config_dir = dirs::home_dir()
            .ok_or(ConfigError::NoHomeDir)?
            .join(".storydesk");

        Ok(config_dir.join("config.yaml"))
    }
}

/// Where a credential was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    Environment,
    Keyring,
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialSource::Environment => write!(f, "environment"),
            CredentialSource::Keyring => write!(f, "keyring"),
        }
    }
}

/// A resolved API key.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub service: Service,
    pub value: String,
    pub source: CredentialSource,
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("service", &self.service)
            .field("value", &"<redacted>")
            .field("source", &self.source)
            .finish()
    }
}

/// Persistent storage for API keys.
pub trait SecretStore {
    fn get(&self, service: Service) -> Result<Option<String>, ConfigError>;
    fn set(&self, service: Service, value: &str) -> Result<(), ConfigError>;
    /// Removes a key. Returns false if none was stored.
    fn delete(&self, service: Service) -> Result<bool, ConfigError>;
}

/// API keys stored in the OS keychain.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeyringStore;

impl KeyringStore {
    fn entry(service: Service) -> Result<Entry, ConfigError> {
        Entry::new(KEYRING_SERVICE, service.keyring_user())
            .map_err(|e| ConfigError::Keyring(e.to_string()))
    }
}

impl SecretStore for KeyringStore {
    fn get(&self, service: Service) -> Result<Option<String>, ConfigError> {
        match Self::entry(service)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(ConfigError::Keyring(e.to_string())),
        }
    }

    fn set(&self, service: Service, value: &str) -> Result<(), ConfigError> {
        Self::entry(service)?
            .set_password(value)
            .map_err(|e| ConfigError::Keyring(e.to_string()))
    }

    fn delete(&self, service: Service) -> Result<bool, ConfigError> {
        match Self::entry(service)?.delete_credential() {
            Ok(()) => Ok(true),
            Err(keyring::Error::NoEntry) => Ok(false),
            Err(e) => Err(ConfigError::Keyring(e.to_string())),
        }
    }
}

/// Looks up a credential without failing when it is absent.
///
/// Environment variables win over the keyring. Blank values are ignored.
pub fn find_credential<S, F>(
    service: Service,
    env: F,
    store: &S,
) -> Result<Option<Credential>, ConfigError>
where
    S: SecretStore + ?Sized,
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = env(service.env_var()).filter(|v| !v.trim().is_empty()) {
        return Ok(Some(Credential {
            service,
            value: value.trim().to_string(),
            source: CredentialSource::Environment,
        }));
    }

    match store.get(service) {
        Ok(Some(value)) if !value.trim().is_empty() => Ok(Some(Credential {
            service,
            value: value.trim().to_string(),
            source: CredentialSource::Keyring,
        })),
        Ok(_) => Ok(None),
        Err(e) => {
            // An unusable keychain behaves like an empty one
            tracing::debug!("Keyring lookup for {} failed: {}", service, e);
            Ok(None)
        }
    }
}

/// Resolves a credential, failing with [`ConfigError::MissingCredential`].
pub fn require_credential<S, F>(service: Service, env: F, store: &S) -> Result<Credential, ConfigError>
where
    S: SecretStore + ?Sized,
    F: Fn(&str) -> Option<String>,
{
    find_credential(service, env, store)?.ok_or(ConfigError::MissingCredential {
        service,
        env: service.env_var(),
    })
}

/// Resolves a credential from the process environment and the OS keyring.
pub fn resolve_credential(service: Service) -> Result<Credential, ConfigError> {
    require_credential(service, |name| std::env::var(name).ok(), &KeyringStore)
}

/// Errors that can occur while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An API key is not set anywhere.
    #[error("No API key configured for {service}. Set {env} or run 'storydesk secrets set {service}'")]
    MissingCredential {
        service: Service,
        env: &'static str,
    },

    /// A required setting is absent.
    #[error("Missing setting '{key}'. Add it to the config file or set {env}")]
    MissingSetting {
        key: &'static str,
        env: &'static str,
    },

    /// The config file exists but could not be read.
    #[error("Could not read config file {}: {reason}", .path.display())]
    Unreadable { path: PathBuf, reason: String },

    /// The config file is not valid YAML for the expected shape.
    #[error("Invalid config file {}: {reason}", .path.display())]
    Invalid { path: PathBuf, reason: String },

    /// The OS keychain rejected an operation.
    #[error("Keyring error: {0}")]
    Keyring(String),

    /// The HTTP client could not be built.
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),

    #[error("Could not find home directory")]
    NoHomeDir,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[derive(Default)]
    struct MemoryStore {
        values: RefCell<HashMap<&'static str, String>>,
        broken: bool,
    }

    impl SecretStore for MemoryStore {
        fn get(&self, service: Service) -> Result<Option<String>, ConfigError> {
            if self.broken {
                return Err(ConfigError::Keyring("no backend".to_string()));
            }
            Ok(self.values.borrow().get(service.keyring_user()).cloned())
        }

        fn set(&self, service: Service, value: &str) -> Result<(), ConfigError> {
            self.values
                .borrow_mut()
                .insert(service.keyring_user(), value.to_string());
            Ok(())
        }

        fn delete(&self, service: Service) -> Result<bool, ConfigError> {
            Ok(self
                .values
                .borrow_mut()
                .remove(service.keyring_user())
                .is_some())
        }
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.cms.base_url, DEFAULT_CMS_URL);
        assert!(config.cms.published_only);
        assert_eq!(config.http.connect_timeout_secs, 10);
        assert_eq!(config.http.request_timeout_secs, 30);
        assert!(config.space_id().is_err());
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_from(&dir.path().join("config.yaml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_partial_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(
            &path,
            "cms:\n  space_id: \"123456\"\n  published_only: false\ncrm:\n  portal_id: \"9184177\"\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();

        assert_eq!(config.space_id().unwrap(), "123456");
        assert!(!config.cms.published_only);
        assert_eq!(config.cms.editor_url, DEFAULT_EDITOR_URL);
        assert_eq!(config.crm.portal_id.as_deref(), Some("9184177"));
        assert_eq!(config.http, HttpSettings::default());
    }

    #[test]
    fn test_load_empty_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "\n").unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), Config::default());
    }

    #[test]
    fn test_load_invalid_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "http:\n  connect_timeout_secs: soon\n").unwrap();
        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
        assert!(err.to_string().contains("config.yaml"));
    }

    #[test]
    fn test_space_id_env_override() {
        let mut config = Config::default();
        config.apply_overrides(|name| (name == SPACE_ID_ENV).then(|| " 42 ".to_string()));
        assert_eq!(config.space_id().unwrap(), "42");
    }

    #[test]
    fn test_blank_space_id_is_missing() {
        let mut config = Config::default();
        config.cms.space_id = Some("  ".to_string());
        assert!(matches!(
            config.space_id(),
            Err(ConfigError::MissingSetting { key: "cms.space_id", .. })
        ));
    }

    #[test]
    fn test_env_credential_wins_over_keyring() {
        let store = MemoryStore::default();
        store.set(Service::Cms, "from-keyring").unwrap();

        let cred = require_credential(
            Service::Cms,
            |name| (name == "STORYDESK_CMS_API_KEY").then(|| "from-env".to_string()),
            &store,
        )
        .unwrap();

        assert_eq!(cred.value, "from-env");
        assert_eq!(cred.source, CredentialSource::Environment);
    }

    #[test]
    fn test_keyring_credential_fallback() {
        let store = MemoryStore::default();
        store.set(Service::Crm, "pat-na1-abc").unwrap();

        let cred = require_credential(Service::Crm, no_env, &store).unwrap();

        assert_eq!(cred.value, "pat-na1-abc");
        assert_eq!(cred.source, CredentialSource::Keyring);
    }

    #[test]
    fn test_missing_credential() {
        let store = MemoryStore::default();
        let err = require_credential(Service::Cms, no_env, &store).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("STORYDESK_CMS_API_KEY"));
        assert!(message.contains("storydesk secrets set cms"));
    }

    #[test]
    fn test_broken_keyring_counts_as_missing() {
        let store = MemoryStore {
            broken: true,
            ..Default::default()
        };
        assert!(find_credential(Service::Crm, no_env, &store).unwrap().is_none());
    }

    #[test]
    fn test_blank_env_value_ignored() {
        let store = MemoryStore::default();
        let found = find_credential(Service::Cms, |_| Some("   ".to_string()), &store).unwrap();
        assert!(found.is_none());
    }

    #[test]
    fn test_credential_debug_redacts_value() {
        let cred = Credential {
            service: Service::Cms,
            value: "secret-token".to_string(),
            source: CredentialSource::Keyring,
        };
        assert!(!format!("{cred:?}").contains("secret-token"));
    }

    #[test]
    fn test_store_delete() {
        let store = MemoryStore::default();
        store.set(Service::Cms, "x").unwrap();
        assert!(store.delete(Service::Cms).unwrap());
        assert!(!store.delete(Service::Cms).unwrap());
    }

    #[test]
    fn test_build_client() {
        assert!(HttpSettings::default().build_client().is_ok());
    }
}
