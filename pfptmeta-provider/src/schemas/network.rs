//! Network schemas: mapped elements, metaports, routing and tunnels

use pfptmeta_core::schema::{AttributeSchema, AttributeType, types};

use super::{MetaSchemaConfig, base_schema, enabled, entity_ids, tags};

pub fn network_element_config() -> MetaSchemaConfig {
    MetaSchemaConfig {
        api_path: "v1/network_elements",
        id_prefix: "ne",
        nested: &[],
        schema: base_schema("network_element", "ne")
            .with_description("A mapped subnet or mapped service reachable through metaports")
            .attribute(
                AttributeSchema::new("mapped_subnets", AttributeType::list(types::cidr()))
                    .conflicts_with(&["mapped_service"]),
            )
            .attribute(
                AttributeSchema::new("mapped_service", types::hostname())
                    .conflicts_with(&["mapped_subnets"]),
            )
            .attribute(enabled())
            .attribute(tags())
            .attribute(
                AttributeSchema::new("aliases", AttributeType::set(types::hostname()))
                    .computed()
                    .with_description("Managed with network_element_alias"),
            )
            .attribute(AttributeSchema::new("dns_name", AttributeType::String).computed())
            .exactly_one_of(&["mapped_subnets", "mapped_service"]),
    }
}

pub fn metaport_config() -> MetaSchemaConfig {
    MetaSchemaConfig {
        api_path: "v1/metaports",
        id_prefix: "mp",
        nested: &[],
        schema: base_schema("metaport", "mp")
            .with_description("A connector that exposes network elements")
            .attribute(enabled())
            .attribute(AttributeSchema::new("allow_support", AttributeType::Bool).optional_computed())
            .attribute(
                AttributeSchema::new("mapped_elements", AttributeType::set(AttributeType::id("ne")))
                    .computed(),
            )
            .attribute(AttributeSchema::new("healthy", AttributeType::Bool).computed()),
    }
}

pub fn metaport_cluster_config() -> MetaSchemaConfig {
    MetaSchemaConfig {
        api_path: "v1/metaport_clusters",
        id_prefix: "mpc",
        nested: &[],
        schema: base_schema("metaport_cluster", "mpc")
            .with_description("Metaports serving the same network elements")
            .attribute(AttributeSchema::new(
                "metaports",
                AttributeType::set(AttributeType::id("mp")),
            ))
            .attribute(
                AttributeSchema::new("mapped_elements", AttributeType::set(AttributeType::id("ne")))
                    .computed()
                    .with_description("Managed with metaport_cluster_mapped_elements_attachment"),
            ),
    }
}

pub fn routing_group_config() -> MetaSchemaConfig {
    MetaSchemaConfig {
        api_path: "v1/routing_groups",
        id_prefix: "rg",
        nested: &[],
        schema: base_schema("routing_group", "rg")
            .with_description("Routes traffic of the given sources to mapped elements")
            .attribute(AttributeSchema::new("sources", entity_ids()))
            .attribute(AttributeSchema::new("exclude_sources", entity_ids()))
            .attribute(
                AttributeSchema::new(
                    "mapped_elements_ids",
                    AttributeType::set(AttributeType::id("ne")),
                )
                .computed()
                .with_description("Managed with routing_group_mapped_elements_attachment"),
            ),
    }
}

pub fn tunnel_config() -> MetaSchemaConfig {
    MetaSchemaConfig {
        api_path: "v1/tunnels",
        id_prefix: "tun",
        nested: &["gre_config"],
        schema: base_schema("tunnel", "tun")
            .with_description("A GRE tunnel from a site into the Meta network")
            .attribute(enabled())
            .attribute(
                AttributeSchema::new(
                    "gre_config",
                    AttributeType::Block(vec![
                        AttributeSchema::new("source_ips", AttributeType::set(types::ip()))
                            .required(),
                    ]),
                )
                .required(),
            )
            .attribute(AttributeSchema::new("status", AttributeType::String).computed()),
    }
}

pub fn enterprise_dns_config() -> MetaSchemaConfig {
    MetaSchemaConfig {
        api_path: "v1/enterprise_dns",
        id_prefix: "ed",
        nested: &["mapped_domains"],
        schema: base_schema("enterprise_dns", "ed")
            .with_description("Resolves enterprise domains through mapped elements")
            .attribute(AttributeSchema::new(
                "mapped_domains",
                AttributeType::list(AttributeType::Block(vec![
                    AttributeSchema::new("name", types::hostname()).required(),
                    AttributeSchema::new("mapped_domain", types::hostname()).required(),
                ])),
            )),
    }
}

pub fn trusted_network_config() -> MetaSchemaConfig {
    let addresses = || {
        AttributeSchema::new("addresses_ranges", AttributeType::set(types::cidr())).required()
    };

    MetaSchemaConfig {
        api_path: "v1/trusted_networks",
        id_prefix: "tn",
        nested: &["criteria"],
        schema: base_schema("trusted_network", "tn")
            .with_description("Networks where devices are considered on premises")
            .attribute(enabled())
            .attribute(AttributeSchema::new("apply_to_entities", entity_ids()))
            .attribute(AttributeSchema::new("exempt_entities", entity_ids()))
            .attribute(
                AttributeSchema::new(
                    "criteria",
                    AttributeType::list(AttributeType::Block(vec![
                        AttributeSchema::new(
                            "external_ip_config",
                            AttributeType::Block(vec![addresses()]),
                        ),
                        AttributeSchema::new(
                            "resolved_address_config",
                            AttributeType::Block(vec![
                                addresses(),
                                AttributeSchema::new("hostname", types::hostname()).required(),
                            ]),
                        ),
                    ])),
                )
                .required(),
            ),
    }
}

pub fn ip_network_config() -> MetaSchemaConfig {
    MetaSchemaConfig {
        api_path: "v1/ip_networks",
        id_prefix: "ipn",
        nested: &[],
        schema: base_schema("ip_network", "ipn")
            .with_description("IP ranges and countries referenced by filtering rules")
            .attribute(AttributeSchema::new("cidrs", AttributeType::set(types::cidr())))
            .attribute(AttributeSchema::new(
                "countries",
                AttributeType::set(types::country_code()),
            )),
    }
}
