//! Identity schemas: users, groups, roles and devices

use pfptmeta_core::schema::{AttributeSchema, AttributeType, ResourceSchema, types};

use super::{MetaSchemaConfig, PLATFORMS, base_schema, enabled, tags};

pub fn user_config() -> MetaSchemaConfig {
    MetaSchemaConfig {
        api_path: "v1/users",
        id_prefix: "usr",
        nested: &[],
        schema: ResourceSchema::new("user")
            .with_description("A user of the organization")
            .attribute(AttributeSchema::new("id", AttributeType::id("usr")).computed())
            .attribute(AttributeSchema::new("given_name", AttributeType::String).required())
            .attribute(AttributeSchema::new("family_name", AttributeType::String).required())
            .attribute(
                AttributeSchema::new("email", types::email())
                    .required()
                    .with_description("Login address, unique in the organization"),
            )
            .attribute(AttributeSchema::new("phone", AttributeType::String))
            .attribute(enabled())
            .attribute(tags())
            .attribute(
                AttributeSchema::new("groups", AttributeType::set(AttributeType::id("grp")))
                    .computed(),
            )
            .attribute(
                AttributeSchema::new("roles", AttributeType::set(AttributeType::id("rol")))
                    .computed()
                    .with_description("Managed with user_roles_attachment"),
            ),
    }
}

pub fn group_config() -> MetaSchemaConfig {
    MetaSchemaConfig {
        api_path: "v1/groups",
        id_prefix: "grp",
        nested: &[],
        schema: base_schema("group", "grp")
            .with_description("A group of users, static or defined by an expression")
            .attribute(
                AttributeSchema::new("expression", AttributeType::String)
                    .with_description("Tag expression selecting members dynamically"),
            )
            .attribute(
                AttributeSchema::new("provisioned_by", AttributeType::String).computed(),
            )
            .attribute(
                AttributeSchema::new("users", AttributeType::set(AttributeType::id("usr")))
                    .computed()
                    .with_description("Managed with group_users_attachment"),
            )
            .attribute(
                AttributeSchema::new("roles", AttributeType::set(AttributeType::id("rol")))
                    .computed()
                    .with_description("Managed with group_roles_attachment"),
            ),
    }
}

pub fn role_config() -> MetaSchemaConfig {
    MetaSchemaConfig {
        api_path: "v1/roles",
        id_prefix: "rol",
        nested: &[],
        schema: base_schema("role", "rol")
            .with_description("A set of administrative privileges")
            .attribute(
                AttributeSchema::new("privileges", AttributeType::set(AttributeType::String))
                    .with_description("Privileges such as `users:read`"),
            )
            .attribute(AttributeSchema::new("all_read_privileges", AttributeType::Bool))
            .attribute(AttributeSchema::new("all_write_privileges", AttributeType::Bool))
            .attribute(AttributeSchema::new("all_suborgs", AttributeType::Bool))
            .attribute(
                AttributeSchema::new("suborgs_expression", AttributeType::String)
                    .conflicts_with(&["all_suborgs"]),
            )
            .attribute(
                AttributeSchema::new("apply_to_orgs", AttributeType::set(AttributeType::String)),
            ),
    }
}

pub fn device_config() -> MetaSchemaConfig {
    MetaSchemaConfig {
        api_path: "v1/devices",
        id_prefix: "dev",
        nested: &[],
        schema: base_schema("device", "dev")
            .with_description("A device enrolled for a user")
            .attribute(
                AttributeSchema::new("owner_id", AttributeType::id("usr"))
                    .required()
                    .force_new(),
            )
            .attribute(AttributeSchema::new("platform", AttributeType::enumeration(PLATFORMS)))
            .attribute(enabled())
            .attribute(tags())
            .attribute(
                AttributeSchema::new("aliases", AttributeType::set(types::hostname())).computed(),
            )
            .attribute(AttributeSchema::new("serial_number", AttributeType::String).computed()),
    }
}
