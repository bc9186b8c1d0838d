//! Single sign-on protocol of an app
//!
//! The protocol is not part of the app body. It is written with
//! `PUT v1/apps/{id}/saml` or `PUT v1/apps/{id}/oidc` once the app exists,
//! and read back from the `saml_config` or `oidc_config` key of the app.

use std::collections::{BTreeMap, HashMap};

use pfptmeta_core::resource::Value;
use serde::{Deserialize, Serialize};

use super::{NestedError, decode, field, fit_block, from_attribute, to_attribute, to_json};

pub const BLOCKS: &[&str] = &["saml_config", "oidc_config"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SamlConfig {
    pub sso_url: String,
    pub audience_uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_relay_state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature_algorithm: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest_algorithm: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute_statements: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OidcConfig {
    pub sign_in_redirect_urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initiate_login_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scopes: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grant_types: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppProtocol {
    Saml(SamlConfig),
    Oidc(OidcConfig),
}

impl AppProtocol {
    pub fn from_attributes(attrs: &HashMap<String, Value>) -> Result<Self, NestedError> {
        let saml = from_attribute(attrs, "saml_config")?.map(AppProtocol::Saml);
        let oidc = from_attribute(attrs, "oidc_config")?.map(AppProtocol::Oidc);

        match (saml, oidc) {
            (Some(p), None) | (None, Some(p)) => Ok(p),
            _ => Err(NestedError::invalid(
                "saml_config",
                "exactly one of saml_config, oidc_config must be set",
            )),
        }
    }

    pub fn block_name(&self) -> &'static str {
        match self {
            AppProtocol::Saml(_) => "saml_config",
            AppProtocol::Oidc(_) => "oidc_config",
        }
    }

    /// Last segment of the path the protocol is written to
    pub fn path_suffix(&self) -> &'static str {
        match self {
            AppProtocol::Saml(_) => "saml",
            AppProtocol::Oidc(_) => "oidc",
        }
    }

    pub fn body(&self) -> Result<serde_json::Value, NestedError> {
        match self {
            AppProtocol::Saml(c) => to_json(self.block_name(), c),
            AppProtocol::Oidc(c) => to_json(self.block_name(), c),
        }
    }

    fn inner_attribute(&self) -> Result<Value, NestedError> {
        match self {
            AppProtocol::Saml(c) => to_attribute(self.block_name(), c),
            AppProtocol::Oidc(c) => to_attribute(self.block_name(), c),
        }
    }
}

pub fn read(
    props: &serde_json::Value,
    prior: &HashMap<String, Value>,
    attrs: &mut HashMap<String, Value>,
) -> Result<(), NestedError> {
    for block in BLOCKS {
        attrs.remove(*block);
    }

    // The block last written wins when the API echoes both
    let order = if prior.contains_key("oidc_config") {
        ["oidc_config", "saml_config"]
    } else {
        ["saml_config", "oidc_config"]
    };
    let Some((name, json)) = order
        .into_iter()
        .find_map(|name| field(props, name).map(|json| (name, json.clone())))
    else {
        return Ok(());
    };
    let protocol = match name {
        "oidc_config" => AppProtocol::Oidc(decode(name, json)?),
        _ => AppProtocol::Saml(decode(name, json)?),
    };

    let name = protocol.block_name();
    let value = fit_block(protocol.inner_attribute()?, prior.get(name));
    attrs.insert(name.to_string(), value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn oidc_attrs() -> HashMap<String, Value> {
        HashMap::from([(
            "oidc_config".to_string(),
            Value::Map(HashMap::from([(
                "sign_in_redirect_urls".to_string(),
                Value::List(vec![Value::from("https://app.example.com/callback")]),
            )])),
        )])
    }

    #[test]
    fn oidc_is_written_to_its_own_path() {
        let protocol = AppProtocol::from_attributes(&oidc_attrs()).unwrap();
        assert_eq!(protocol.path_suffix(), "oidc");
        assert_eq!(
            protocol.body().unwrap(),
            json!({"sign_in_redirect_urls": ["https://app.example.com/callback"]})
        );
    }

    #[test]
    fn read_drops_server_filled_fields() {
        let props = json!({
            "id": "app-1",
            "saml_config": null,
            "oidc_config": {
                "sign_in_redirect_urls": ["https://app.example.com/callback"],
                "client_id": "ignored",
                "grant_types": ["authorization_code"]
            }
        });
        let mut attrs = HashMap::from([("saml_config".to_string(), Value::from("stale"))]);
        read(&props, &oidc_attrs(), &mut attrs).unwrap();

        assert!(!attrs.contains_key("saml_config"));
        assert_eq!(attrs.get("oidc_config"), oidc_attrs().get("oidc_config"));
    }

    #[test]
    fn read_follows_the_block_last_written() {
        let props = json!({
            "id": "app-1",
            "saml_config": {
                "sso_url": "https://idp.example.com/sso",
                "audience_uri": "urn:example"
            },
            "oidc_config": {
                "sign_in_redirect_urls": ["https://app.example.com/callback"]
            }
        });

        let mut attrs = HashMap::new();
        read(&props, &oidc_attrs(), &mut attrs).unwrap();
        assert!(!attrs.contains_key("saml_config"));
        assert_eq!(attrs.get("oidc_config"), oidc_attrs().get("oidc_config"));

        let mut attrs = HashMap::new();
        read(&props, &HashMap::new(), &mut attrs).unwrap();
        assert!(attrs.contains_key("saml_config"));
        assert!(!attrs.contains_key("oidc_config"));
    }

    #[test]
    fn both_protocols_are_rejected() {
        let mut attrs = oidc_attrs();
        attrs.insert(
            "saml_config".to_string(),
            Value::Map(HashMap::from([
                ("sso_url".to_string(), Value::from("https://idp.example.com/sso")),
                ("audience_uri".to_string(), Value::from("urn:example")),
            ])),
        );
        assert!(AppProtocol::from_attributes(&attrs).is_err());
    }
}
