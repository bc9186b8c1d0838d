//! The check a posture check runs
//!
//! Configured as exactly one of `min_app_version`, `min_os_version` or
//! `osquery`. Version checks travel in `check`, a query travels in `osquery`.

use std::collections::HashMap;

use pfptmeta_core::resource::Value;
use serde::{Deserialize, Serialize};

use super::{Body, NestedError, decode, field, to_json};

pub const BLOCKS: &[&str] = &["min_app_version", "min_os_version", "osquery"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Check {
    MinimumAppVersion { min_version: String },
    MinimumOsVersion { min_version: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostureRule {
    AppVersion(String),
    OsVersion(String),
    Osquery(String),
}

impl PostureRule {
    pub fn from_attributes(attrs: &HashMap<String, Value>) -> Result<Self, NestedError> {
        let configured: Vec<&str> = BLOCKS
            .iter()
            .copied()
            .filter(|b| attrs.contains_key(*b))
            .collect();
        let &[block] = configured.as_slice() else {
            return Err(NestedError::invalid(
                "min_app_version",
                format!("exactly one of {} must be set", BLOCKS.join(", ")),
            ));
        };

        let key = if block == "osquery" { "query" } else { "version" };
        let inner = attrs
            .get(block)
            .and_then(Value::as_map)
            .and_then(|m| m.get(key))
            .and_then(Value::as_str)
            .ok_or_else(|| NestedError::invalid(block, format!("'{key}' is required")))?
            .to_string();

        Ok(match block {
            "min_app_version" => PostureRule::AppVersion(inner),
            "min_os_version" => PostureRule::OsVersion(inner),
            _ => PostureRule::Osquery(inner),
        })
    }

    /// Body fields for this rule; the field of the other kind is cleared
    pub fn write(&self, body: &mut Body) -> Result<(), NestedError> {
        let (check, osquery) = match self {
            PostureRule::AppVersion(v) => (
                Some(Check::MinimumAppVersion {
                    min_version: v.clone(),
                }),
                None,
            ),
            PostureRule::OsVersion(v) => (
                Some(Check::MinimumOsVersion {
                    min_version: v.clone(),
                }),
                None,
            ),
            PostureRule::Osquery(q) => (None, Some(q.clone())),
        };
        body.insert("check".to_string(), to_json("check", &check)?);
        body.insert("osquery".to_string(), to_json("osquery", &osquery)?);
        Ok(())
    }

    pub fn from_response(props: &serde_json::Value) -> Result<Option<Self>, NestedError> {
        if let Some(q) = field(props, "osquery").and_then(|v| v.as_str()) {
            return Ok(Some(PostureRule::Osquery(q.to_string())));
        }
        let Some(check) = field(props, "check") else {
            return Ok(None);
        };
        Ok(Some(match decode::<Check>("check", check.clone())? {
            Check::MinimumAppVersion { min_version } => PostureRule::AppVersion(min_version),
            Check::MinimumOsVersion { min_version } => PostureRule::OsVersion(min_version),
        }))
    }

    /// The configuration block this rule corresponds to
    pub fn block(&self) -> (&'static str, Value) {
        let (name, key, value) = match self {
            PostureRule::AppVersion(v) => ("min_app_version", "version", v),
            PostureRule::OsVersion(v) => ("min_os_version", "version", v),
            PostureRule::Osquery(q) => ("osquery", "query", q),
        };
        (
            name,
            Value::Map(HashMap::from([(key.to_string(), Value::String(value.clone()))])),
        )
    }
}

pub fn write(attrs: &HashMap<String, Value>, body: &mut Body) -> Result<(), NestedError> {
    PostureRule::from_attributes(attrs)?.write(body)
}

pub fn read(props: &serde_json::Value, attrs: &mut HashMap<String, Value>) -> Result<(), NestedError> {
    for block in BLOCKS {
        attrs.remove(*block);
    }
    if let Some(rule) = PostureRule::from_response(props)? {
        let (name, value) = rule.block();
        attrs.insert(name.to_string(), value);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn block(key: &str, value: &str) -> Value {
        Value::Map(HashMap::from([(key.to_string(), Value::from(value))]))
    }

    #[test]
    fn version_check_is_internally_tagged() {
        let attrs = HashMap::from([("min_os_version".to_string(), block("version", "14.2"))]);
        let mut body = Body::new();
        write(&attrs, &mut body).unwrap();
        assert_eq!(
            body.get("check"),
            Some(&json!({"type": "minimum_os_version", "min_version": "14.2"}))
        );
        assert_eq!(body.get("osquery"), Some(&serde_json::Value::Null));
    }

    #[test]
    fn osquery_clears_check() {
        let attrs = HashMap::from([(
            "osquery".to_string(),
            block("query", "select 1 from disk_encryption"),
        )]);
        let mut body = Body::new();
        write(&attrs, &mut body).unwrap();
        assert_eq!(body.get("check"), Some(&serde_json::Value::Null));
        assert_eq!(body.get("osquery"), Some(&json!("select 1 from disk_encryption")));
    }

    #[test]
    fn two_rules_are_rejected() {
        let attrs = HashMap::from([
            ("min_os_version".to_string(), block("version", "14.2")),
            ("min_app_version".to_string(), block("version", "3.0")),
        ]);
        assert!(PostureRule::from_attributes(&attrs).is_err());
    }

    #[test]
    fn reads_rule_into_matching_block() {
        let props = json!({"check": {"type": "minimum_app_version", "min_version": "3.1"}, "osquery": null});
        let mut attrs = HashMap::from([("osquery".to_string(), block("query", "stale"))]);
        read(&props, &mut attrs).unwrap();
        assert_eq!(attrs.get("min_app_version"), Some(&block("version", "3.1")));
        assert!(!attrs.contains_key("osquery"));
    }
}
