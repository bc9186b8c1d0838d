//! Resource type and data source registrations

use pfptmeta_core::provider::{ResourceKind, ResourceType};
use pfptmeta_core::schema::ResourceSchema;

use crate::attachments;
use crate::data_sources;
use crate::schemas::{access, identity, network, settings};

// =============================================================================
// Resource Type Definitions
// =============================================================================

macro_rules! define_resource_type {
    ($name:ident, $type_name:expr, $schema:expr) => {
        pub struct $name;
        impl ResourceType for $name {
            fn name(&self) -> &'static str {
                $type_name
            }
            fn schema(&self) -> ResourceSchema {
                $schema
            }
        }
    };
    ($name:ident, $type_name:expr, $schema:expr, data_source) => {
        pub struct $name;
        impl ResourceType for $name {
            fn name(&self) -> &'static str {
                $type_name
            }
            fn schema(&self) -> ResourceSchema {
                $schema
            }
            fn kind(&self) -> ResourceKind {
                ResourceKind::DataSource
            }
        }
    };
}

fn attachment_schema(name: &str) -> ResourceSchema {
    attachments::schema(name).unwrap_or_else(|| ResourceSchema::new(name))
}

fn data_source_schema(name: &str) -> ResourceSchema {
    data_sources::schema(name).unwrap_or_else(|| ResourceSchema::new(name))
}

// Identity
define_resource_type!(UserType, "user", identity::user_config().schema);
define_resource_type!(GroupType, "group", identity::group_config().schema);
define_resource_type!(RoleType, "role", identity::role_config().schema);
define_resource_type!(DeviceType, "device", identity::device_config().schema);

// Network
define_resource_type!(NetworkElementType, "network_element", network::network_element_config().schema);
define_resource_type!(MetaportType, "metaport", network::metaport_config().schema);
define_resource_type!(MetaportClusterType, "metaport_cluster", network::metaport_cluster_config().schema);
define_resource_type!(RoutingGroupType, "routing_group", network::routing_group_config().schema);
define_resource_type!(TunnelType, "tunnel", network::tunnel_config().schema);
define_resource_type!(EnterpriseDnsType, "enterprise_dns", network::enterprise_dns_config().schema);
define_resource_type!(TrustedNetworkType, "trusted_network", network::trusted_network_config().schema);
define_resource_type!(IpNetworkType, "ip_network", network::ip_network_config().schema);

// Access
define_resource_type!(PolicyType, "policy", access::policy_config().schema);
define_resource_type!(ProtocolGroupType, "protocol_group", access::protocol_group_config().schema);
define_resource_type!(AppType, "app", access::app_config().schema);
define_resource_type!(EasylinkType, "easylink", access::easylink_config().schema);
define_resource_type!(CloudAppType, "cloud_app", access::cloud_app_config().schema);
define_resource_type!(UrlFilteringRuleType, "url_filtering_rule", access::url_filtering_rule_config().schema);

// Settings
define_resource_type!(PostureCheckType, "posture_check", settings::posture_check_config().schema);
define_resource_type!(NotificationChannelType, "notification_channel", settings::notification_channel_config().schema);
define_resource_type!(AccessBridgeType, "access_bridge", settings::access_bridge_config().schema);
define_resource_type!(CertificateType, "certificate", settings::certificate_config().schema);
define_resource_type!(DeviceSettingsType, "device_settings", settings::device_settings_config().schema);

// Join resources
define_resource_type!(NetworkElementAliasType, "network_element_alias", attachments::alias_schema());
define_resource_type!(GroupRolesAttachmentType, "group_roles_attachment", attachment_schema("group_roles_attachment"));
define_resource_type!(GroupUsersAttachmentType, "group_users_attachment", attachment_schema("group_users_attachment"));
define_resource_type!(UserRolesAttachmentType, "user_roles_attachment", attachment_schema("user_roles_attachment"));
define_resource_type!(
    RoutingGroupMappedElementsAttachmentType,
    "routing_group_mapped_elements_attachment",
    attachment_schema("routing_group_mapped_elements_attachment")
);
define_resource_type!(
    MetaportClusterMappedElementsAttachmentType,
    "metaport_cluster_mapped_elements_attachment",
    attachment_schema("metaport_cluster_mapped_elements_attachment")
);

// Data sources
define_resource_type!(UserDataSource, "user", data_source_schema("user"), data_source);
define_resource_type!(GroupDataSource, "group", data_source_schema("group"), data_source);
define_resource_type!(RoleDataSource, "role", data_source_schema("role"), data_source);
define_resource_type!(NetworkElementDataSource, "network_element", data_source_schema("network_element"), data_source);
define_resource_type!(ProtocolGroupDataSource, "protocol_group", data_source_schema("protocol_group"), data_source);
define_resource_type!(MetaportDataSource, "metaport", data_source_schema("metaport"), data_source);
define_resource_type!(CertificateDataSource, "certificate", data_source_schema("certificate"), data_source);
define_resource_type!(LocationDataSource, "location", data_source_schema("location"), data_source);

/// Returns all managed resource types supported by this provider
pub fn resource_types() -> Vec<Box<dyn ResourceType>> {
    vec![
        Box::new(UserType),
        Box::new(GroupType),
        Box::new(RoleType),
        Box::new(DeviceType),
        Box::new(NetworkElementType),
        Box::new(MetaportType),
        Box::new(MetaportClusterType),
        Box::new(RoutingGroupType),
        Box::new(TunnelType),
        Box::new(EnterpriseDnsType),
        Box::new(TrustedNetworkType),
        Box::new(IpNetworkType),
        Box::new(PolicyType),
        Box::new(ProtocolGroupType),
        Box::new(AppType),
        Box::new(EasylinkType),
        Box::new(CloudAppType),
        Box::new(UrlFilteringRuleType),
        Box::new(PostureCheckType),
        Box::new(NotificationChannelType),
        Box::new(AccessBridgeType),
        Box::new(CertificateType),
        Box::new(DeviceSettingsType),
        Box::new(NetworkElementAliasType),
        Box::new(GroupRolesAttachmentType),
        Box::new(GroupUsersAttachmentType),
        Box::new(UserRolesAttachmentType),
        Box::new(RoutingGroupMappedElementsAttachmentType),
        Box::new(MetaportClusterMappedElementsAttachmentType),
    ]
}

/// Returns all data sources supported by this provider
pub fn data_source_types() -> Vec<Box<dyn ResourceType>> {
    vec![
        Box::new(UserDataSource),
        Box::new(GroupDataSource),
        Box::new(RoleDataSource),
        Box::new(NetworkElementDataSource),
        Box::new(ProtocolGroupDataSource),
        Box::new(MetaportDataSource),
        Box::new(CertificateDataSource),
        Box::new(LocationDataSource),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schemas::configs;

    #[test]
    fn registered_names_match_schemas() {
        for t in resource_types() {
            assert_eq!(t.schema().resource_type, t.name());
            assert_eq!(t.kind(), ResourceKind::Managed);
        }
        for t in data_source_types() {
            assert_eq!(t.schema().resource_type, t.name());
            assert_eq!(t.kind(), ResourceKind::DataSource);
        }
    }

    #[test]
    fn every_entity_and_join_resource_is_registered() {
        let names: Vec<_> = resource_types().iter().map(|t| t.name()).collect();
        for config in configs() {
            assert!(names.contains(&config.schema.resource_type.as_str()));
        }
        for attachment in attachments::ATTACHMENTS {
            assert!(names.contains(&attachment.resource_type));
        }
        assert_eq!(names.len(), configs().len() + attachments::ATTACHMENTS.len() + 1);
    }

    #[test]
    fn every_data_source_is_registered() {
        let names: Vec<_> = data_source_types().iter().map(|t| t.name()).collect();
        for config in data_sources::DATA_SOURCES {
            assert!(names.contains(&config.name));
        }
    }

    #[test]
    fn schemas_are_not_empty() {
        for t in resource_types().into_iter().chain(data_source_types()) {
            assert!(!t.schema().attributes.is_empty(), "{} has no attributes", t.name());
        }
    }
}
