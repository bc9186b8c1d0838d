//! GRE configuration of a tunnel
//!
//! Source IPs are sent in full on create. Afterwards they only change
//! through the `add_source_ips` and `remove_source_ips` actions.

use std::collections::HashMap;

use pfptmeta_core::resource::Value;
use serde::{Deserialize, Serialize};

use super::{Body, NestedError, decode, field, fit_block, from_attribute, to_attribute, to_json};

const ATTRIBUTE: &str = "gre_config";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GreConfig {
    pub source_ips: Vec<String>,
}

pub fn write(attrs: &HashMap<String, Value>, body: &mut Body) -> Result<(), NestedError> {
    let gre: GreConfig = from_attribute(attrs, ATTRIBUTE)?
        .ok_or_else(|| NestedError::invalid(ATTRIBUTE, "block is required"))?;
    if gre.source_ips.is_empty() {
        return Err(NestedError::invalid(ATTRIBUTE, "at least one source IP is required"));
    }
    body.insert(ATTRIBUTE.to_string(), to_json(ATTRIBUTE, &gre)?);
    Ok(())
}

/// Configured source IPs, empty when the block is absent
pub fn source_ips(attrs: &HashMap<String, Value>) -> Result<Vec<String>, NestedError> {
    Ok(from_attribute::<GreConfig>(attrs, ATTRIBUTE)?
        .map(|gre| gre.source_ips)
        .unwrap_or_default())
}

/// Body of an `add_source_ips` or `remove_source_ips` action
pub fn action_body(ips: &[String]) -> serde_json::Value {
    serde_json::json!({ "source_ips": ips })
}

pub fn read(
    props: &serde_json::Value,
    prior: &HashMap<String, Value>,
    attrs: &mut HashMap<String, Value>,
) -> Result<(), NestedError> {
    let Some(json) = field(props, ATTRIBUTE) else {
        attrs.remove(ATTRIBUTE);
        return Ok(());
    };
    let mut gre: GreConfig = decode(ATTRIBUTE, json.clone())?;
    gre.source_ips.sort();
    gre.source_ips.dedup();

    let value = fit_block(to_attribute(ATTRIBUTE, &gre)?, prior.get(ATTRIBUTE));
    attrs.insert(ATTRIBUTE.to_string(), value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn gre(ips: &[&str]) -> HashMap<String, Value> {
        HashMap::from([(
            ATTRIBUTE.to_string(),
            Value::Map(HashMap::from([(
                "source_ips".to_string(),
                Value::List(ips.iter().map(|ip| Value::from(*ip)).collect()),
            )])),
        )])
    }

    #[test]
    fn create_body_carries_all_source_ips() {
        let mut body = Body::new();
        write(&gre(&["203.0.113.7", "198.51.100.1"]), &mut body).unwrap();
        assert_eq!(
            body.get(ATTRIBUTE),
            Some(&json!({"source_ips": ["203.0.113.7", "198.51.100.1"]}))
        );
    }

    #[test]
    fn empty_source_ips_are_rejected() {
        let mut body = Body::new();
        assert!(write(&gre(&[]), &mut body).is_err());
    }

    #[test]
    fn read_sorts_source_ips() {
        let props = json!({"gre_config": {"source_ips": ["203.0.113.7", "198.51.100.1"]}});
        let mut attrs = HashMap::new();
        read(&props, &HashMap::new(), &mut attrs).unwrap();
        assert_eq!(attrs, gre(&["198.51.100.1", "203.0.113.7"]));
    }

    #[test]
    fn source_ips_of_missing_block_are_empty() {
        assert!(source_ips(&HashMap::new()).unwrap().is_empty());
    }
}
