//! Hand-written mapping for nested configuration blocks
//!
//! Nested shapes differ from entity to entity, so each one is described by
//! typed serde structs here rather than by the generic schema mapper. One-of
//! blocks become tagged enums so that exactly one variant can be sent.

use std::collections::HashMap;

use pfptmeta_core::mapper::{json_to_value, value_to_json};
use pfptmeta_core::provider::ProviderError;
use pfptmeta_core::resource::Value;
use pfptmeta_core::schema::TypeError;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Map;
use thiserror::Error;

pub mod access_bridge;
pub mod app;
pub mod enterprise_dns;
pub mod notification_channel;
pub mod posture_check;
pub mod protocol_group;
pub mod trusted_network;
pub mod tunnel;

pub type Body = Map<String, serde_json::Value>;

#[derive(Debug, Error)]
pub enum NestedError {
    #[error("attribute '{attribute}': {source}")]
    Decode {
        attribute: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("attribute '{attribute}': {message}")]
    Invalid { attribute: String, message: String },
}

impl NestedError {
    pub(crate) fn invalid(attribute: &str, message: impl Into<String>) -> Self {
        NestedError::Invalid {
            attribute: attribute.to_string(),
            message: message.into(),
        }
    }

    pub fn attribute(&self) -> &str {
        match self {
            NestedError::Decode { attribute, .. } | NestedError::Invalid { attribute, .. } => {
                attribute
            }
        }
    }

    /// Report as a schema error on the offending attribute
    pub fn into_type_error(self) -> TypeError {
        let message = match &self {
            NestedError::Decode { source, .. } => source.to_string(),
            NestedError::Invalid { message, .. } => message.clone(),
        };
        TypeError::AttributeError {
            name: self.attribute().to_string(),
            inner: Box::new(TypeError::ValidationFailed { message }),
        }
    }
}

impl From<NestedError> for ProviderError {
    fn from(err: NestedError) -> Self {
        ProviderError::new(err.to_string()).with_cause(err)
    }
}

/// Decode a configured block into its typed form
pub(crate) fn from_attribute<T: DeserializeOwned>(
    attrs: &HashMap<String, Value>,
    name: &str,
) -> Result<Option<T>, NestedError> {
    attrs
        .get(name)
        .map(|value| decode(name, value_to_json(value)))
        .transpose()
}

pub(crate) fn decode<T: DeserializeOwned>(
    attribute: &str,
    json: serde_json::Value,
) -> Result<T, NestedError> {
    serde_json::from_value(json).map_err(|source| NestedError::Decode {
        attribute: attribute.to_string(),
        source,
    })
}

/// Encode a typed block as an attribute value
pub(crate) fn to_attribute<T: Serialize>(attribute: &str, block: &T) -> Result<Value, NestedError> {
    let json = serde_json::to_value(block).map_err(|source| NestedError::Decode {
        attribute: attribute.to_string(),
        source,
    })?;
    json_to_value(&json).ok_or_else(|| NestedError::invalid(attribute, "empty block"))
}

pub(crate) fn to_json<T: Serialize>(attribute: &str, block: &T) -> Result<serde_json::Value, NestedError> {
    serde_json::to_value(block).map_err(|source| NestedError::Decode {
        attribute: attribute.to_string(),
        source,
    })
}

/// A JSON field that is present and not `null`
pub(crate) fn field<'a>(props: &'a serde_json::Value, key: &str) -> Option<&'a serde_json::Value> {
    props.get(key).filter(|v| !v.is_null())
}

/// Fit a block read from the API to the shape last written to state.
///
/// Keys the configuration never set are dropped, so server-side defaults do
/// not show up as drift. Keys the API does not echo back (secrets) keep their
/// previous value. Without a previous value the block is returned as read.
pub(crate) fn fit_block(read: Value, prior: Option<&Value>) -> Value {
    match (read, prior) {
        (Value::Map(mut read), Some(Value::Map(prior))) => {
            read.retain(|k, _| prior.contains_key(k));
            for (k, v) in prior {
                read.entry(k.clone()).or_insert_with(|| v.clone());
            }
            Value::Map(read)
        }
        (read, _) => read,
    }
}

/// Entity-specific nested fields of a create or update body.
///
/// `only`, when given, restricts the blocks written to those that changed.
pub fn write_nested(
    resource_type: &str,
    attrs: &HashMap<String, Value>,
    only: Option<&[String]>,
    body: &mut Body,
) -> Result<(), NestedError> {
    let wanted = |name: &str| only.is_none_or(|only| only.iter().any(|n| n == name));

    match resource_type {
        "protocol_group" if wanted("protocols") => protocol_group::write(attrs, body),
        "enterprise_dns" if wanted("mapped_domains") => enterprise_dns::write(attrs, body),
        "trusted_network" if wanted("criteria") => trusted_network::write(attrs, body),
        "posture_check" if posture_check::BLOCKS.iter().any(|b| wanted(b)) => {
            posture_check::write(attrs, body)
        }
        "notification_channel" if notification_channel::BLOCKS.iter().any(|b| wanted(b)) => {
            notification_channel::write(attrs, body)
        }
        "access_bridge" if access_bridge::BLOCKS.iter().any(|b| wanted(b)) => {
            access_bridge::write(attrs, body)
        }
        // Only sent on create; source IP changes go through dedicated actions
        "tunnel" if only.is_none() => tunnel::write(attrs, body),
        _ => Ok(()),
    }
}

/// Entity-specific nested fields of a response into `attrs`.
///
/// `prior` holds the attributes last written to state, used to keep secrets
/// the API does not return.
pub fn read_nested(
    resource_type: &str,
    props: &serde_json::Value,
    prior: &HashMap<String, Value>,
    attrs: &mut HashMap<String, Value>,
) -> Result<(), NestedError> {
    match resource_type {
        "protocol_group" => protocol_group::read(props, attrs),
        "enterprise_dns" => enterprise_dns::read(props, attrs),
        "trusted_network" => trusted_network::read(props, attrs),
        "posture_check" => posture_check::read(props, attrs),
        "notification_channel" => notification_channel::read(props, prior, attrs),
        "access_bridge" => access_bridge::read(props, prior, attrs),
        "tunnel" => tunnel::read(props, prior, attrs),
        "app" => app::read(props, prior, attrs),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, Value)]) -> Value {
        Value::Map(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        )
    }

    #[test]
    fn fit_block_drops_server_defaults_and_keeps_secrets() {
        let read = map(&[
            ("url", Value::from("https://splunk.example.com")),
            ("verify_ssl", Value::Bool(true)),
        ]);
        let prior = map(&[
            ("url", Value::from("https://old.example.com")),
            ("token", Value::from("s3cret")),
        ]);

        let fitted = fit_block(read, Some(&prior));
        assert_eq!(
            fitted,
            map(&[
                ("url", Value::from("https://splunk.example.com")),
                ("token", Value::from("s3cret")),
            ])
        );
    }

    #[test]
    fn fit_block_without_prior_returns_read() {
        let read = map(&[("verify_ssl", Value::Bool(true))]);
        assert_eq!(fit_block(read.clone(), None), read);
    }
}
