//! Proofpoint Meta resource schemas
//!
//! Each entity pairs its attribute schema with the REST collection it lives
//! under and the prefix of the IDs the API assigns to it.

use pfptmeta_core::schema::{AttributeSchema, AttributeType, ResourceSchema, types};

pub mod access;
pub mod identity;
pub mod network;
pub mod settings;

/// Schema plus the API metadata needed for the generic CRUD path
pub struct MetaSchemaConfig {
    /// Collection path relative to the base URL (e.g., "v1/users")
    pub api_path: &'static str,
    /// Prefix of IDs the API assigns (e.g., "usr" for `usr-abc123`)
    pub id_prefix: &'static str,
    /// Attributes mapped by the entity's own handler instead of the generic mapper
    pub nested: &'static [&'static str],
    pub schema: ResourceSchema,
}

impl MetaSchemaConfig {
    pub fn item_path(&self, identifier: &str) -> String {
        format!("{}/{}", self.api_path, identifier)
    }
}

/// Start a schema with the attributes every entity carries
pub(crate) fn base_schema(resource_type: &str, id_prefix: &'static str) -> ResourceSchema {
    ResourceSchema::new(resource_type)
        .attribute(
            AttributeSchema::new("id", AttributeType::id(id_prefix))
                .computed()
                .with_description("ID assigned by the API"),
        )
        .attribute(AttributeSchema::new("name", AttributeType::String).required())
        .attribute(AttributeSchema::new("description", AttributeType::String))
}

/// `enabled` flag, which the API defaults to true
pub(crate) fn enabled() -> AttributeSchema {
    AttributeSchema::new("enabled", AttributeType::Bool).optional_computed()
}

pub(crate) fn tags() -> AttributeSchema {
    AttributeSchema::new("tags", types::tags())
}

/// Platforms a device, posture check or setting can target
pub(crate) const PLATFORMS: &[&str] = &["Android", "macOS", "iOS", "Linux", "Windows", "ChromeOS"];

/// Entities a policy-like object can apply to
pub(crate) fn entity_ids() -> AttributeType {
    AttributeType::set(AttributeType::Id(vec!["usr", "grp", "dev"]))
}

/// Returns all entity schema configs
pub fn configs() -> Vec<MetaSchemaConfig> {
    vec![
        identity::user_config(),
        identity::group_config(),
        identity::role_config(),
        identity::device_config(),
        network::network_element_config(),
        network::metaport_config(),
        network::metaport_cluster_config(),
        network::routing_group_config(),
        network::tunnel_config(),
        network::enterprise_dns_config(),
        network::trusted_network_config(),
        network::ip_network_config(),
        access::policy_config(),
        access::protocol_group_config(),
        access::app_config(),
        access::easylink_config(),
        access::cloud_app_config(),
        access::url_filtering_rule_config(),
        settings::posture_check_config(),
        settings::notification_channel_config(),
        settings::access_bridge_config(),
        settings::certificate_config(),
        settings::device_settings_config(),
    ]
}

/// Get the schema config for a resource type
pub fn get_schema_config(resource_type: &str) -> Option<MetaSchemaConfig> {
    configs()
        .into_iter()
        .find(|c| c.schema.resource_type == resource_type)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn every_entity_has_a_computed_prefixed_id() {
        for config in configs() {
            let id = config
                .schema
                .get("id")
                .unwrap_or_else(|| panic!("{} has no id", config.schema.resource_type));
            assert!(id.is_read_only());
            match &id.attr_type {
                AttributeType::Id(prefixes) => assert_eq!(prefixes, &vec![config.id_prefix]),
                other => panic!("unexpected id type {other}"),
            }
        }
    }

    #[test]
    fn resource_types_and_prefixes_are_unique() {
        let configs = configs();
        let names: HashSet<_> = configs.iter().map(|c| c.schema.resource_type.clone()).collect();
        let prefixes: HashSet<_> = configs.iter().map(|c| c.id_prefix).collect();
        assert_eq!(names.len(), configs.len());
        assert_eq!(prefixes.len(), configs.len());
    }

    #[test]
    fn nested_attributes_are_blocks_in_the_schema() {
        for config in configs() {
            for name in config.nested {
                let attr = config.schema.get(name).unwrap_or_else(|| {
                    panic!("{}.{} missing", config.schema.resource_type, name)
                });
                assert!(
                    attr.attr_type.is_block(),
                    "{}.{} is not a block",
                    config.schema.resource_type,
                    name
                );
            }
        }
    }

    #[test]
    fn lookup_by_type_name() {
        assert_eq!(get_schema_config("user").unwrap().api_path, "v1/users");
        assert_eq!(
            get_schema_config("access_bridge").unwrap().api_path,
            "v1/settings/access_bridges"
        );
        assert!(get_schema_config("group_roles_attachment").is_none());
    }
}
