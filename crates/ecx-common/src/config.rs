//! Provider configuration.
//!
//! A [`ProviderConfig`] is handed to the key-management provider context when
//! it is brought up. It can be built in code, parsed from JSON (inline or from
//! a file), or read from `ECX_*` environment variables.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::helpers::parse_bool;

/// Environment variable holding the provider name.
pub const ENV_PROVIDER_NAME: &str = "ECX_PROVIDER_NAME";
/// Environment variable for the include-public-key policy.
pub const ENV_INCLUDE_PUBLIC: &str = "ECX_INCLUDE_PUBLIC";
/// Environment variable controlling whether the provider starts running.
pub const ENV_START_RUNNING: &str = "ECX_START_RUNNING";

/// Configuration for an ECX provider context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Human readable provider name, used in log output.
    pub name: String,

    /// Policy copied into every new key: include the public key when the
    /// private key is serialized.
    pub include_public_in_private_encoding: bool,

    /// Whether the provider is in the running state right after creation.
    pub start_running: bool,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            name: "ecx".to_string(),
            include_public_in_private_encoding: false,
            start_running: true,
        }
    }
}

impl ProviderConfig {
    /// Parse a configuration from a JSON document.
    ///
    /// Missing fields take their default values.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a JSON configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Build a configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a configuration from an arbitrary variable lookup.
    ///
    /// Variables that are not set keep their default values.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(name) = lookup(ENV_PROVIDER_NAME) {
            config.name = name.trim().to_string();
        }
        if let Some(value) = lookup(ENV_INCLUDE_PUBLIC) {
            config.include_public_in_private_encoding = parse_bool(&value);
        }
        if let Some(value) = lookup(ENV_START_RUNNING) {
            config.start_running = parse_bool(&value);
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(Error::config("provider name must not be empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = ProviderConfig::default();
        assert_eq!(config.name, "ecx");
        assert!(!config.include_public_in_private_encoding);
        assert!(config.start_running);
    }

    #[test]
    fn test_from_json_partial() {
        let config =
            ProviderConfig::from_json(r#"{"include_public_in_private_encoding": true}"#).unwrap();
        assert!(config.include_public_in_private_encoding);
        assert_eq!(config.name, "ecx");
    }

    #[test]
    fn test_from_json_rejects_empty_name() {
        let err = ProviderConfig::from_json(r#"{"name": ""}"#).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_from_json_malformed() {
        let err = ProviderConfig::from_json("{not json").unwrap_err();
        assert!(matches!(err, Error::Serialization(_)));
    }

    #[test]
    fn test_from_file() {
        let path = std::env::temp_dir().join(format!("ecx-config-{}.json", std::process::id()));
        std::fs::write(&path, r#"{"name": "from-file", "start_running": false}"#).unwrap();
        let config = ProviderConfig::from_file(&path);
        std::fs::remove_file(&path).unwrap();

        let config = config.unwrap();
        assert_eq!(config.name, "from-file");
        assert!(!config.start_running);
    }

    #[test]
    fn test_from_file_missing() {
        let err = ProviderConfig::from_file("/nonexistent/ecx/provider.json").unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_from_lookup() {
        let vars: HashMap<&str, &str> = [
            (ENV_PROVIDER_NAME, " test-provider "),
            (ENV_INCLUDE_PUBLIC, "yes"),
            (ENV_START_RUNNING, "0"),
        ]
        .into_iter()
        .collect();

        let config =
            ProviderConfig::from_lookup(|name| vars.get(name).map(|v| v.to_string())).unwrap();
        assert_eq!(config.name, "test-provider");
        assert!(config.include_public_in_private_encoding);
        assert!(!config.start_running);
    }

    #[test]
    fn test_from_lookup_empty_environment() {
        let config = ProviderConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, ProviderConfig::default());
    }
}
