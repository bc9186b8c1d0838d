//! Access schemas: policies, protocol groups, applications and filtering

use pfptmeta_core::schema::{AttributeSchema, AttributeType, types};

use super::{MetaSchemaConfig, base_schema, enabled, entity_ids};

pub fn policy_config() -> MetaSchemaConfig {
    MetaSchemaConfig {
        api_path: "v1/policies",
        id_prefix: "pol",
        nested: &[],
        schema: base_schema("policy", "pol")
            .with_description("Grants sources access to destinations over protocol groups")
            .attribute(enabled())
            .attribute(AttributeSchema::new("sources", entity_ids()))
            .attribute(AttributeSchema::new("exempt_sources", entity_ids()))
            .attribute(AttributeSchema::new(
                "destinations",
                AttributeType::set(AttributeType::id("ne")),
            ))
            .attribute(AttributeSchema::new(
                "protocol_groups",
                AttributeType::set(AttributeType::id("pg")),
            )),
    }
}

pub fn protocol_group_config() -> MetaSchemaConfig {
    MetaSchemaConfig {
        api_path: "v1/protocol_groups",
        id_prefix: "pg",
        nested: &["protocols"],
        schema: base_schema("protocol_group", "pg")
            .with_description("Named set of port ranges")
            .attribute(
                AttributeSchema::new(
                    "protocols",
                    AttributeType::list(AttributeType::Block(vec![
                        AttributeSchema::new("from_port", types::port()).required(),
                        AttributeSchema::new("to_port", types::port()).required(),
                        AttributeSchema::new(
                            "proto",
                            AttributeType::enumeration(&["tcp", "udp", "icmp"]),
                        )
                        .required(),
                    ])),
                )
                .required(),
            )
            .attribute(
                AttributeSchema::new("read_only", AttributeType::Bool)
                    .computed()
                    .with_description("Built-in groups cannot be modified"),
            ),
    }
}

pub fn app_config() -> MetaSchemaConfig {
    MetaSchemaConfig {
        api_path: "v1/apps",
        id_prefix: "app",
        nested: &["saml_config", "oidc_config"],
        schema: base_schema("app", "app")
            .with_description("A single sign-on application, configured for SAML or OIDC")
            .attribute(enabled())
            .attribute(AttributeSchema::new("visible", AttributeType::Bool).optional_computed())
            .attribute(AttributeSchema::new(
                "mapped_elements_ids",
                AttributeType::set(AttributeType::id("ne")),
            ))
            .attribute(AttributeSchema::new(
                "saml_config",
                AttributeType::Block(vec![
                    AttributeSchema::new("sso_url", types::url()).required(),
                    AttributeSchema::new("audience_uri", AttributeType::String).required(),
                    AttributeSchema::new("recipient_url", types::url()),
                    AttributeSchema::new("destination_url", types::url()),
                    AttributeSchema::new("default_relay_state", AttributeType::String),
                    AttributeSchema::new(
                        "subject_format",
                        AttributeType::enumeration(&[
                            "unspecified",
                            "emailAddress",
                            "x509SubjectName",
                            "persistent",
                            "transient",
                        ]),
                    ),
                    AttributeSchema::new(
                        "signature_algorithm",
                        AttributeType::enumeration(&["RSA-SHA256", "RSA-SHA1"]),
                    ),
                    AttributeSchema::new(
                        "digest_algorithm",
                        AttributeType::enumeration(&["SHA256", "SHA1"]),
                    ),
                    AttributeSchema::new(
                        "attribute_statements",
                        AttributeType::map(AttributeType::String),
                    ),
                ]),
            ))
            .attribute(AttributeSchema::new(
                "oidc_config",
                AttributeType::Block(vec![
                    AttributeSchema::new("sign_in_redirect_urls", AttributeType::list(types::url()))
                        .required(),
                    AttributeSchema::new("initiate_login_url", types::url()),
                    AttributeSchema::new(
                        "scopes",
                        AttributeType::set(AttributeType::enumeration(&[
                            "openid", "profile", "email",
                        ])),
                    ),
                    AttributeSchema::new(
                        "grant_types",
                        AttributeType::set(AttributeType::enumeration(&[
                            "authorization_code",
                            "implicit",
                            "refresh_token",
                        ])),
                    ),
                ]),
            ))
            .exactly_one_of(&["saml_config", "oidc_config"]),
    }
}

pub fn easylink_config() -> MetaSchemaConfig {
    MetaSchemaConfig {
        api_path: "v1/easylinks",
        id_prefix: "el",
        nested: &[],
        schema: base_schema("easylink", "el")
            .with_description("A browser shortcut to a mapped element")
            .attribute(AttributeSchema::new("domain_name", types::hostname()).required())
            .attribute(AttributeSchema::new("mapped_element_id", AttributeType::id("ne")).required())
            .attribute(
                AttributeSchema::new(
                    "access_type",
                    AttributeType::enumeration(&["meta", "redirect", "native"]),
                )
                .required(),
            )
            .attribute(
                AttributeSchema::new(
                    "protocol",
                    AttributeType::enumeration(&["http", "https", "ssh", "rdp"]),
                )
                .required(),
            )
            .attribute(AttributeSchema::new("port", types::port()).required())
            .attribute(AttributeSchema::new(
                "viewers",
                AttributeType::set(AttributeType::Id(vec!["usr", "grp"])),
            ))
            .attribute(AttributeSchema::new("root_path", AttributeType::String))
            .attribute(AttributeSchema::new("certificate_id", AttributeType::id("crt")))
            .attribute(AttributeSchema::new("audit", AttributeType::Bool).with_default(false))
            .attribute(AttributeSchema::new("enable_sni", AttributeType::Bool).with_default(false)),
    }
}

pub fn cloud_app_config() -> MetaSchemaConfig {
    MetaSchemaConfig {
        api_path: "v1/cloud_apps",
        id_prefix: "ca",
        nested: &[],
        schema: base_schema("cloud_app", "ca")
            .with_description("A SaaS application matched by URL filtering rules")
            .attribute(AttributeSchema::new("app", AttributeType::String))
            .attribute(AttributeSchema::new("urls", AttributeType::set(AttributeType::String)))
            .attribute(
                AttributeSchema::new(
                    "tenant_type",
                    AttributeType::enumeration(&["All", "Personal", "Corporate"]),
                )
                .with_default("All"),
            )
            .attribute(AttributeSchema::new("tenant_corp_id", AttributeType::String)),
    }
}

pub fn url_filtering_rule_config() -> MetaSchemaConfig {
    MetaSchemaConfig {
        api_path: "v1/url_filtering_rules",
        id_prefix: "ufr",
        nested: &[],
        schema: base_schema("url_filtering_rule", "ufr")
            .with_description("Blocks, warns on or logs web traffic")
            .attribute(enabled())
            .attribute(
                AttributeSchema::new(
                    "action",
                    AttributeType::enumeration(&["ALLOW", "BLOCK", "LOG", "WARN", "ISOLATE"]),
                )
                .required(),
            )
            .attribute(AttributeSchema::new("priority", types::positive_int()).required())
            .attribute(AttributeSchema::new("apply_to_org", AttributeType::Bool))
            .attribute(AttributeSchema::new("sources", entity_ids()))
            .attribute(AttributeSchema::new("exempt_sources", entity_ids()))
            .attribute(AttributeSchema::new(
                "advanced_threat_protection",
                AttributeType::Bool,
            ))
            .attribute(AttributeSchema::new(
                "forbidden_content_categories",
                AttributeType::set(AttributeType::String),
            ))
            .attribute(AttributeSchema::new(
                "warn_content_categories",
                AttributeType::set(AttributeType::String),
            ))
            .attribute(AttributeSchema::new(
                "cloud_apps",
                AttributeType::set(AttributeType::id("ca")),
            ))
            .attribute(AttributeSchema::new(
                "networks",
                AttributeType::set(AttributeType::id("ipn")),
            ))
            .attribute(AttributeSchema::new(
                "countries",
                AttributeType::set(types::country_code()),
            )),
    }
}
