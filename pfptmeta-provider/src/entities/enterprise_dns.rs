//! Domains an enterprise DNS entry maps

use std::collections::HashMap;

use pfptmeta_core::resource::Value;
use serde::{Deserialize, Serialize};

use super::{Body, NestedError, decode, field, from_attribute, to_attribute, to_json};

const ATTRIBUTE: &str = "mapped_domains";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappedDomain {
    pub name: String,
    pub mapped_domain: String,
}

pub fn write(attrs: &HashMap<String, Value>, body: &mut Body) -> Result<(), NestedError> {
    let domains: Vec<MappedDomain> = from_attribute(attrs, ATTRIBUTE)?.unwrap_or_default();
    body.insert(ATTRIBUTE.to_string(), to_json(ATTRIBUTE, &domains)?);
    Ok(())
}

pub fn read(props: &serde_json::Value, attrs: &mut HashMap<String, Value>) -> Result<(), NestedError> {
    match field(props, ATTRIBUTE) {
        Some(json) => {
            let domains: Vec<MappedDomain> = decode(ATTRIBUTE, json.clone())?;
            if domains.is_empty() {
                attrs.remove(ATTRIBUTE);
            } else {
                attrs.insert(ATTRIBUTE.to_string(), to_attribute(ATTRIBUTE, &domains)?);
            }
        }
        None => {
            attrs.remove(ATTRIBUTE);
        }
    }
    Ok(())
}
