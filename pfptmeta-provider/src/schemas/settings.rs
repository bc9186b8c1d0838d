//! Settings schemas: posture checks, notifications, SIEM export, certificates

use pfptmeta_core::schema::{AttributeSchema, AttributeType, types};

use super::{MetaSchemaConfig, PLATFORMS, base_schema, enabled, entity_ids};

pub fn posture_check_config() -> MetaSchemaConfig {
    let version = || AttributeSchema::new("version", AttributeType::String).required();

    MetaSchemaConfig {
        api_path: "v1/posture_checks",
        id_prefix: "pc",
        nested: &["min_app_version", "min_os_version", "osquery"],
        schema: base_schema("posture_check", "pc")
            .with_description("A device check run before or while connecting")
            .attribute(enabled())
            .attribute(
                AttributeSchema::new("platform", AttributeType::enumeration(PLATFORMS)).required(),
            )
            .attribute(
                AttributeSchema::new(
                    "action",
                    AttributeType::enumeration(&["DISCONNECT", "NONE", "WARNING"]),
                )
                .required(),
            )
            .attribute(AttributeSchema::new(
                "when",
                AttributeType::set(AttributeType::enumeration(&["PRE_CONNECT", "PERIODIC"])),
            ))
            .attribute(
                AttributeSchema::new("interval", types::positive_int())
                    .with_description("Minutes between periodic checks"),
            )
            .attribute(AttributeSchema::new("apply_to_entities", entity_ids()))
            .attribute(AttributeSchema::new("exempt_entities", entity_ids()))
            .attribute(AttributeSchema::new("user_message_on_fail", AttributeType::String))
            .attribute(AttributeSchema::new(
                "min_app_version",
                AttributeType::Block(vec![version()]),
            ))
            .attribute(AttributeSchema::new(
                "min_os_version",
                AttributeType::Block(vec![version()]),
            ))
            .attribute(AttributeSchema::new(
                "osquery",
                AttributeType::Block(vec![
                    AttributeSchema::new("query", AttributeType::String).required(),
                ]),
            ))
            .exactly_one_of(&["min_app_version", "min_os_version", "osquery"]),
    }
}

pub fn notification_channel_config() -> MetaSchemaConfig {
    MetaSchemaConfig {
        api_path: "v1/notification_channels",
        id_prefix: "nch",
        nested: &[
            "email_config",
            "slack_config",
            "webhook_config",
            "pagerduty_config",
        ],
        schema: base_schema("notification_channel", "nch")
            .with_description("Where alerts are delivered")
            .attribute(enabled())
            .attribute(AttributeSchema::new(
                "email_config",
                AttributeType::Block(vec![
                    AttributeSchema::new("recipients", AttributeType::set(types::email()))
                        .required(),
                ]),
            ))
            .attribute(AttributeSchema::new(
                "slack_config",
                AttributeType::Block(vec![
                    AttributeSchema::new("channel", AttributeType::String).required(),
                    AttributeSchema::new("webhook_url", types::url())
                        .required()
                        .sensitive(),
                ]),
            ))
            .attribute(AttributeSchema::new(
                "webhook_config",
                AttributeType::Block(vec![
                    AttributeSchema::new("uri", types::url()).required(),
                    AttributeSchema::new("method", AttributeType::enumeration(&["POST", "PUT"]))
                        .required(),
                    AttributeSchema::new("headers", AttributeType::map(AttributeType::String)),
                    AttributeSchema::new("auth_token", AttributeType::String).sensitive(),
                ]),
            ))
            .attribute(AttributeSchema::new(
                "pagerduty_config",
                AttributeType::Block(vec![
                    AttributeSchema::new("api_key", AttributeType::String)
                        .required()
                        .sensitive(),
                ]),
            ))
            .exactly_one_of(&[
                "email_config",
                "slack_config",
                "webhook_config",
                "pagerduty_config",
            ]),
    }
}

pub fn access_bridge_config() -> MetaSchemaConfig {
    MetaSchemaConfig {
        api_path: "v1/settings/access_bridges",
        id_prefix: "ab",
        nested: &["splunk_http_config", "qradar_http_config", "syslog_config"],
        schema: base_schema("access_bridge", "ab")
            .with_description("Exports audit events to a SIEM")
            .attribute(enabled())
            .attribute(AttributeSchema::new(
                "notification_channels",
                AttributeType::set(AttributeType::id("nch")),
            ))
            .attribute(AttributeSchema::new(
                "splunk_http_config",
                AttributeType::Block(vec![
                    AttributeSchema::new("url", types::url()).required(),
                    AttributeSchema::new("token", AttributeType::String)
                        .required()
                        .sensitive(),
                    AttributeSchema::new("verify_ssl", AttributeType::Bool),
                    AttributeSchema::new("publicly_accessible", AttributeType::Bool),
                ]),
            ))
            .attribute(AttributeSchema::new(
                "qradar_http_config",
                AttributeType::Block(vec![
                    AttributeSchema::new("url", types::url()).required(),
                    AttributeSchema::new("certificate", AttributeType::String),
                ]),
            ))
            .attribute(AttributeSchema::new(
                "syslog_config",
                AttributeType::Block(vec![
                    AttributeSchema::new("host", types::hostname()).required(),
                    AttributeSchema::new("port", types::port()).required(),
                    AttributeSchema::new("proto", AttributeType::enumeration(&["tcp", "udp"]))
                        .required(),
                ]),
            ))
            .attribute(AttributeSchema::new("status", AttributeType::String).computed())
            .exactly_one_of(&["splunk_http_config", "qradar_http_config", "syslog_config"]),
    }
}

pub fn certificate_config() -> MetaSchemaConfig {
    MetaSchemaConfig {
        api_path: "v1/certificates",
        id_prefix: "crt",
        nested: &[],
        schema: base_schema("certificate", "crt")
            .with_description("A TLS certificate issued by the platform")
            .attribute(
                AttributeSchema::new("sans", AttributeType::set(types::hostname()))
                    .required()
                    .force_new(),
            )
            .attribute(AttributeSchema::new("status", AttributeType::String).computed())
            .attribute(AttributeSchema::new("serial_number", AttributeType::String).computed())
            .attribute(AttributeSchema::new("valid_not_before", AttributeType::String).computed())
            .attribute(AttributeSchema::new("valid_not_after", AttributeType::String).computed()),
    }
}

pub fn device_settings_config() -> MetaSchemaConfig {
    MetaSchemaConfig {
        api_path: "v1/settings/device",
        id_prefix: "ds",
        nested: &[],
        schema: base_schema("device_settings", "ds")
            .with_description("Agent behavior for the devices it applies to")
            .attribute(enabled())
            .attribute(AttributeSchema::new("apply_on_org", AttributeType::Bool))
            .attribute(AttributeSchema::new("apply_to_entities", entity_ids()))
            .attribute(AttributeSchema::new("exempt_entities", entity_ids()))
            .attribute(AttributeSchema::new(
                "tunnel_mode",
                AttributeType::enumeration(&["split", "full"]),
            ))
            .attribute(AttributeSchema::new(
                "vpn_login_browser",
                AttributeType::enumeration(&["AGENT", "EXTERNAL", "USER_DEFINED"]),
            ))
            .attribute(AttributeSchema::new("proxy_alwayson", AttributeType::Bool))
            .attribute(AttributeSchema::new(
                "protocol_selection_lifetime",
                types::positive_int(),
            ))
            .attribute(AttributeSchema::new("session_lifetime", types::positive_int()))
            .attribute(AttributeSchema::new(
                "search_domains",
                AttributeType::set(types::hostname()),
            )),
    }
}
