//! Criteria that identify a trusted network
//!
//! Each criterion is exactly one of an external IP match or a resolved
//! address match, sent as `{"external_ip_config": {...}}` or
//! `{"resolved_address_config": {...}}`.

use std::collections::HashMap;

use pfptmeta_core::resource::Value;
use serde::{Deserialize, Serialize};

use super::{Body, NestedError, decode, field, from_attribute, to_attribute, to_json};

const ATTRIBUTE: &str = "criteria";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalIp {
    pub addresses_ranges: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedAddress {
    pub addresses_ranges: Vec<String>,
    pub hostname: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    ExternalIpConfig(ExternalIp),
    ResolvedAddressConfig(ResolvedAddress),
}

pub fn write(attrs: &HashMap<String, Value>, body: &mut Body) -> Result<(), NestedError> {
    let criteria: Vec<Criterion> = from_attribute(attrs, ATTRIBUTE)?.unwrap_or_default();
    if criteria.is_empty() {
        return Err(NestedError::invalid(ATTRIBUTE, "at least one criterion is required"));
    }
    body.insert(ATTRIBUTE.to_string(), to_json(ATTRIBUTE, &criteria)?);
    Ok(())
}

pub fn read(props: &serde_json::Value, attrs: &mut HashMap<String, Value>) -> Result<(), NestedError> {
    let Some(serde_json::Value::Array(items)) = field(props, ATTRIBUTE) else {
        attrs.remove(ATTRIBUTE);
        return Ok(());
    };

    // The API spells out the unused variant as null
    let items = items
        .iter()
        .map(|item| match item {
            serde_json::Value::Object(obj) => serde_json::Value::Object(
                obj.iter()
                    .filter(|(_, v)| !v.is_null())
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
            ),
            other => other.clone(),
        })
        .collect();

    let criteria: Vec<Criterion> = decode(ATTRIBUTE, serde_json::Value::Array(items))?;
    attrs.insert(ATTRIBUTE.to_string(), to_attribute(ATTRIBUTE, &criteria)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn criterion_with_both_variants_is_rejected() {
        let block = Value::Map(HashMap::from([
            (
                "external_ip_config".to_string(),
                Value::Map(HashMap::from([(
                    "addresses_ranges".to_string(),
                    Value::string_list(["1.2.3.0/24"]),
                )])),
            ),
            (
                "resolved_address_config".to_string(),
                Value::Map(HashMap::from([
                    ("addresses_ranges".to_string(), Value::string_list(["1.2.3.0/24"])),
                    ("hostname".to_string(), Value::from("vpn.example.com")),
                ])),
            ),
        ]));
        let attrs = HashMap::from([("criteria".to_string(), Value::List(vec![block]))]);

        assert!(write(&attrs, &mut Body::new()).is_err());
    }

    #[test]
    fn reads_criteria_ignoring_null_variants() {
        let props = json!({
            "criteria": [
                {"external_ip_config": {"addresses_ranges": ["10.0.0.0/8"]}, "resolved_address_config": null}
            ]
        });
        let mut attrs = HashMap::new();
        read(&props, &mut attrs).unwrap();

        let expected = Value::List(vec![Value::Map(HashMap::from([(
            "external_ip_config".to_string(),
            Value::Map(HashMap::from([(
                "addresses_ranges".to_string(),
                Value::string_list(["10.0.0.0/8"]),
            )])),
        )]))]);
        assert_eq!(attrs.get("criteria"), Some(&expected));
    }

    #[test]
    fn writes_externally_tagged_criteria() {
        let criteria = vec![Criterion::ResolvedAddressConfig(ResolvedAddress {
            addresses_ranges: vec!["192.0.2.0/24".to_string()],
            hostname: "office.example.com".to_string(),
        })];
        let attrs = HashMap::from([(
            "criteria".to_string(),
            to_attribute("criteria", &criteria).unwrap(),
        )]);
        let mut body = Body::new();
        write(&attrs, &mut body).unwrap();
        assert_eq!(
            body.get("criteria"),
            Some(&json!([{
                "resolved_address_config": {
                    "addresses_ranges": ["192.0.2.0/24"],
                    "hostname": "office.example.com"
                }
            }]))
        );
    }
}
