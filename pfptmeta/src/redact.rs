//! Masking of sensitive attributes in logged requests and responses

use pfptmeta_core::schema::{AttributeSchema, AttributeType, ResourceSchema};
use pfptmeta_provider::config::provider_schema;
use pfptmeta_provider::resources::{data_source_types, resource_types};
use serde_json::json;

pub const REDACTED: &str = "<redacted>";

/// Keys of params and results that hold attributes directly
const ATTRIBUTE_KEYS: &[&str] = &["config", "planned_state", "attributes"];

/// Keys of params that hold a wire state
const STATE_KEYS: &[&str] = &["state", "prior_state"];

/// Schema that describes the attributes a request carries
pub fn request_schema(method: &str, params: &serde_json::Value) -> Option<ResourceSchema> {
    if method == "configure" {
        return Some(provider_schema());
    }
    let type_name = params.get("type_name")?.as_str()?;
    let types = if method == "read_data_source" {
        data_source_types()
    } else {
        resource_types()
    };
    types
        .into_iter()
        .find(|t| t.name() == type_name)
        .map(|t| t.schema())
}

/// Whether `message` holds attributes that only a schema could mask
pub fn carries_attributes(message: &serde_json::Value) -> bool {
    ATTRIBUTE_KEYS
        .iter()
        .chain(STATE_KEYS)
        .any(|key| message.get(*key).is_some())
}

/// Copy of `message` (request params or response result) with every
/// sensitive attribute replaced by [`REDACTED`]
pub fn redacted(schema: &ResourceSchema, message: &serde_json::Value) -> serde_json::Value {
    let mut message = message.clone();
    let Some(object) = message.as_object_mut() else {
        return message;
    };
    for key in ATTRIBUTE_KEYS {
        if let Some(attrs) = object.get_mut(*key) {
            redact_object(schema.attributes.values(), attrs);
        }
    }
    for key in STATE_KEYS {
        if let Some(attrs) = object.get_mut(*key).and_then(|s| s.get_mut("attributes")) {
            redact_object(schema.attributes.values(), attrs);
        }
    }
    message
}

fn redact_object<'a>(
    schemas: impl IntoIterator<Item = &'a AttributeSchema>,
    value: &mut serde_json::Value,
) {
    let Some(object) = value.as_object_mut() else {
        return;
    };
    for attr in schemas {
        let Some(field) = object.get_mut(&attr.name) else {
            continue;
        };
        if attr.sensitive {
            if !field.is_null() {
                *field = json!(REDACTED);
            }
            continue;
        }
        match &attr.attr_type {
            AttributeType::Block(inner) => redact_object(inner, field),
            AttributeType::List(inner) | AttributeType::Set(inner) => {
                if let (AttributeType::Block(block), Some(items)) =
                    (inner.as_ref(), field.as_array_mut())
                {
                    for item in items {
                        redact_object(block, item);
                    }
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configure_params_keep_no_secret() {
        let params = json!({
            "config": {
                "api_key": "key-1",
                "api_secret": "s3cret-value",
                "org_shortname": "acme"
            }
        });
        let schema = request_schema("configure", &params).unwrap();
        let logged = redacted(&schema, &params).to_string();

        assert!(!logged.contains("s3cret-value"), "{logged}");
        assert!(logged.contains(REDACTED));
        assert!(logged.contains("key-1"));
    }

    #[test]
    fn secrets_inside_blocks_are_masked() {
        let params = json!({
            "type_name": "notification_channel",
            "config": {
                "name": "pager",
                "pagerduty_config": {"api_key": "pd-key-123"}
            },
            "prior_state": {
                "id": "nch-1",
                "attributes": {
                    "name": "hook",
                    "webhook_config": {"uri": "https://hooks.example.com", "auth_token": "tok-9"}
                }
            }
        });
        let schema = request_schema("update", &params).unwrap();
        let logged = redacted(&schema, &params);

        assert_eq!(logged["config"]["pagerduty_config"]["api_key"], json!(REDACTED));
        assert_eq!(
            logged["prior_state"]["attributes"]["webhook_config"]["auth_token"],
            json!(REDACTED)
        );
        assert_eq!(
            logged["prior_state"]["attributes"]["webhook_config"]["uri"],
            json!("https://hooks.example.com")
        );
    }

    #[test]
    fn returned_state_is_masked() {
        let schema = request_schema("read", &json!({"type_name": "access_bridge"})).unwrap();
        let result = json!({
            "id": "ab-1",
            "attributes": {
                "name": "siem",
                "splunk_http_config": {"url": "https://splunk.example.com", "token": "hec-token"}
            }
        });
        let logged = redacted(&schema, &result).to_string();
        assert!(!logged.contains("hec-token"), "{logged}");
    }

    #[test]
    fn unknown_type_has_no_schema() {
        assert!(request_schema("create", &json!({"type_name": "firewall"})).is_none());
        assert!(request_schema("get_schema", &json!({})).is_none());
    }

    #[test]
    fn unmasked_attributes_are_detected() {
        assert!(carries_attributes(&json!({"type_name": "firewall", "prior_state": {}})));
        assert!(carries_attributes(&json!({"config": {"token": "x"}})));
        assert!(!carries_attributes(&json!({"type_name": "user", "id": "usr-1"})));
    }
}
