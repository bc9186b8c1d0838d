//! Provider configuration
//!
//! Credentials come from the provider block of the declarative configuration,
//! falling back to `PFPTMETA_*` environment variables.

use std::collections::HashMap;

use figment::{
    Figment,
    providers::{Env, Serialized},
};
use pfptmeta_core::resource::Value;
use pfptmeta_core::schema::{AttributeSchema, AttributeType, ResourceSchema, types};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://api.metanetworks.com/";

const ENV_PREFIX: &str = "PFPTMETA_";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing {field}: set it in the provider block or via {env}")]
    Missing {
        field: &'static str,
        env: &'static str,
    },

    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

/// Scalar as figment's `Env` provider parses it: `1234` arrives as a number
#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    String(String),
    Unsigned(u64),
    Signed(i64),
    Bool(bool),
}

fn scalar_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let scalar = Option::<Scalar>::deserialize(deserializer)?;
    Ok(scalar.map(|s| match s {
        Scalar::String(s) => s,
        Scalar::Unsigned(n) => n.to_string(),
        Scalar::Signed(n) => n.to_string(),
        Scalar::Bool(b) => b.to_string(),
    }))
}

/// Layer shape shared by the environment and the provider block
#[derive(Debug, Default, Serialize, Deserialize)]
struct Layer {
    #[serde(default, deserialize_with = "scalar_string", skip_serializing_if = "Option::is_none")]
    api_key: Option<String>,
    #[serde(default, deserialize_with = "scalar_string", skip_serializing_if = "Option::is_none")]
    api_secret: Option<String>,
    #[serde(default, deserialize_with = "scalar_string", skip_serializing_if = "Option::is_none")]
    org_shortname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    base_url: Option<String>,
}

impl Layer {
    fn from_block(block: &HashMap<String, Value>) -> Result<Self, ConfigError> {
        let get = |field: &str| -> Result<Option<String>, ConfigError> {
            match block.get(field) {
                None => Ok(None),
                Some(Value::String(s)) => Ok(Some(s.clone())),
                Some(_) => Err(ConfigError::Validation {
                    field: field.to_string(),
                    reason: "expected a string".to_string(),
                }),
            }
        };

        Ok(Self {
            api_key: get("api_key")?,
            api_secret: get("api_secret")?,
            org_shortname: get("org_shortname")?,
            base_url: get("base_url")?,
        })
    }
}

/// Resolved provider configuration
#[derive(Debug)]
pub struct ProviderConfig {
    pub api_key: String,
    pub api_secret: SecretString,
    pub org_shortname: String,
    /// Always ends with `/` so relative API paths join below it
    pub base_url: Url,
}

impl ProviderConfig {
    /// Resolve configuration from a provider block, falling back to the environment
    pub fn load(block: &HashMap<String, Value>) -> Result<Self, ConfigError> {
        let figment = Figment::new()
            .merge(Env::prefixed(ENV_PREFIX))
            .merge(Serialized::defaults(Layer::from_block(block)?));
        Self::from_figment(figment)
    }

    fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let layer: Layer = figment.extract()?;

        let api_key = layer.api_key.filter(|k| !k.is_empty()).ok_or(ConfigError::Missing {
            field: "api_key",
            env: "PFPTMETA_API_KEY",
        })?;
        let api_secret = layer
            .api_secret
            .filter(|s| !s.is_empty())
            .map(SecretString::from)
            .ok_or(ConfigError::Missing {
                field: "api_secret",
                env: "PFPTMETA_API_SECRET",
            })?;
        let org_shortname =
            layer
                .org_shortname
                .filter(|o| !o.is_empty())
                .ok_or(ConfigError::Missing {
                    field: "org_shortname",
                    env: "PFPTMETA_ORG_SHORTNAME",
                })?;

        let raw = layer
            .base_url
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let base_url = normalize_base_url(&raw)?;

        Ok(Self {
            api_key,
            api_secret,
            org_shortname,
            base_url,
        })
    }
}

fn normalize_base_url(raw: &str) -> Result<Url, ConfigError> {
    let with_slash = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{raw}/")
    };
    let url = Url::parse(&with_slash).map_err(|e| ConfigError::Validation {
        field: "base_url".to_string(),
        reason: e.to_string(),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::Validation {
            field: "base_url".to_string(),
            reason: format!("unsupported scheme '{other}'"),
        }),
    }
}

/// Schema of the provider block itself
pub fn provider_schema() -> ResourceSchema {
    ResourceSchema::new("provider")
        .with_description("Proofpoint Meta API credentials")
        .attribute(
            AttributeSchema::new("api_key", AttributeType::String)
                .with_description("API key ID, or PFPTMETA_API_KEY"),
        )
        .attribute(
            AttributeSchema::new("api_secret", AttributeType::String)
                .sensitive()
                .with_description("API key secret, or PFPTMETA_API_SECRET"),
        )
        .attribute(
            AttributeSchema::new("org_shortname", AttributeType::String)
                .with_description("Organization short name, or PFPTMETA_ORG_SHORTNAME"),
        )
        .attribute(
            AttributeSchema::new("base_url", types::url())
                .with_description("API base URL, or PFPTMETA_BASE_URL"),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;
    use secrecy::ExposeSecret;

    fn block(pairs: &[(&str, &str)]) -> HashMap<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), Value::from(*v)))
            .collect()
    }

    #[test]
    fn environment_supplies_defaults() {
        Jail::expect_with(|jail| {
            jail.set_env("PFPTMETA_API_KEY", "env-key");
            jail.set_env("PFPTMETA_API_SECRET", "env-secret");
            jail.set_env("PFPTMETA_ORG_SHORTNAME", "acme");

            let config = ProviderConfig::load(&HashMap::new()).expect("config");
            assert_eq!(config.api_key, "env-key");
            assert_eq!(config.api_secret.expose_secret(), "env-secret");
            assert_eq!(config.org_shortname, "acme");
            assert_eq!(config.base_url.as_str(), DEFAULT_BASE_URL);
            Ok(())
        });
    }

    #[test]
    fn provider_block_overrides_environment() {
        Jail::expect_with(|jail| {
            jail.set_env("PFPTMETA_API_KEY", "env-key");
            jail.set_env("PFPTMETA_API_SECRET", "env-secret");
            jail.set_env("PFPTMETA_ORG_SHORTNAME", "acme");

            let config = ProviderConfig::load(&block(&[
                ("api_key", "block-key"),
                ("base_url", "http://localhost:8080/api"),
            ]))
            .expect("config");
            assert_eq!(config.api_key, "block-key");
            assert_eq!(config.api_secret.expose_secret(), "env-secret");
            assert_eq!(config.base_url.as_str(), "http://localhost:8080/api/");
            Ok(())
        });
    }

    #[test]
    fn numeric_environment_values_stay_strings() {
        Jail::expect_with(|jail| {
            jail.set_env("PFPTMETA_API_KEY", "1234567");
            jail.set_env("PFPTMETA_API_SECRET", "998877");
            jail.set_env("PFPTMETA_ORG_SHORTNAME", "42");

            let config = ProviderConfig::load(&HashMap::new()).expect("config");
            assert_eq!(config.api_key, "1234567");
            assert_eq!(config.api_secret.expose_secret(), "998877");
            assert_eq!(config.org_shortname, "42");
            Ok(())
        });
    }

    #[test]
    fn missing_secret_names_the_variable() {
        Jail::expect_with(|_jail| {
            let err = ProviderConfig::load(&block(&[
                ("api_key", "k"),
                ("org_shortname", "acme"),
            ]))
            .unwrap_err();
            assert!(matches!(
                err,
                ConfigError::Missing {
                    field: "api_secret",
                    env: "PFPTMETA_API_SECRET"
                }
            ));
            Ok(())
        });
    }

    #[test]
    fn rejects_non_http_base_url() {
        Jail::expect_with(|_jail| {
            let err = ProviderConfig::load(&block(&[
                ("api_key", "k"),
                ("api_secret", "s"),
                ("org_shortname", "acme"),
                ("base_url", "ftp://example.com"),
            ]))
            .unwrap_err();
            assert!(matches!(err, ConfigError::Validation { .. }));
            Ok(())
        });
    }
}
