//! Join resources
//!
//! An attachment manages some of the members of an owner entity (the roles of
//! a group, the mapped elements of a routing group, ...) through the owner's
//! `add_*` and `remove_*` actions. It has no remote object of its own, so its
//! identifier is synthetic; see [`pfptmeta_core::attachment`].
//!
//! `network_element_alias` is handled here too: one alias of a network
//! element, identified as `<network element id>/<alias>`.

use std::collections::HashMap;

use log::{debug, info};
use pfptmeta_core::attachment::{membership_delta, reconcile, synthetic_id};
use pfptmeta_core::provider::{ProviderError, ProviderResult};
use pfptmeta_core::resource::{Resource, ResourceId, State, Value};
use pfptmeta_core::schema::{AttributeSchema, AttributeType, ResourceSchema, types};
use serde_json::json;

use crate::client::MetaClient;

/// Resource type name of the network element alias
pub const ALIAS: &str = "network_element_alias";

/// How one join resource maps onto its owner entity
#[derive(Debug, Clone, Copy)]
pub struct AttachmentConfig {
    pub resource_type: &'static str,
    /// Collection of the owner (e.g., "v1/groups")
    pub owner_path: &'static str,
    pub owner_attribute: &'static str,
    pub owner_prefix: &'static str,
    pub members_attribute: &'static str,
    pub member_prefix: &'static str,
    /// Key of the member list in the owner's JSON and in action bodies
    pub remote_key: &'static str,
    /// Suffix of the `add_*` and `remove_*` actions
    pub action: &'static str,
}

impl AttachmentConfig {
    fn action_path(&self, owner: &str, verb: &str) -> String {
        format!("{}/{}/{}_{}", self.owner_path, owner, verb, self.action)
    }

    fn owner_item_path(&self, owner: &str) -> String {
        format!("{}/{}", self.owner_path, owner)
    }

    pub fn schema(&self) -> ResourceSchema {
        ResourceSchema::new(self.resource_type)
            .attribute(
                AttributeSchema::new("id", AttributeType::String)
                    .computed()
                    .with_description("Owner ID followed by a hash of the member set"),
            )
            .attribute(
                AttributeSchema::new(self.owner_attribute, AttributeType::id(self.owner_prefix))
                    .required()
                    .force_new(),
            )
            .attribute(
                AttributeSchema::new(
                    self.members_attribute,
                    AttributeType::set(AttributeType::id(self.member_prefix)),
                )
                .required(),
            )
    }
}

pub const ATTACHMENTS: &[AttachmentConfig] = &[
    AttachmentConfig {
        resource_type: "group_roles_attachment",
        owner_path: "v1/groups",
        owner_attribute: "group_id",
        owner_prefix: "grp",
        members_attribute: "roles",
        member_prefix: "rol",
        remote_key: "roles",
        action: "roles",
    },
    AttachmentConfig {
        resource_type: "group_users_attachment",
        owner_path: "v1/groups",
        owner_attribute: "group_id",
        owner_prefix: "grp",
        members_attribute: "users",
        member_prefix: "usr",
        remote_key: "users",
        action: "users",
    },
    AttachmentConfig {
        resource_type: "user_roles_attachment",
        owner_path: "v1/users",
        owner_attribute: "user_id",
        owner_prefix: "usr",
        members_attribute: "roles",
        member_prefix: "rol",
        remote_key: "roles",
        action: "roles",
    },
    AttachmentConfig {
        resource_type: "routing_group_mapped_elements_attachment",
        owner_path: "v1/routing_groups",
        owner_attribute: "routing_group_id",
        owner_prefix: "rg",
        members_attribute: "mapped_elements_ids",
        member_prefix: "ne",
        remote_key: "mapped_elements_ids",
        action: "mapped_elements",
    },
    AttachmentConfig {
        resource_type: "metaport_cluster_mapped_elements_attachment",
        owner_path: "v1/metaport_clusters",
        owner_attribute: "metaport_cluster_id",
        owner_prefix: "mpc",
        members_attribute: "mapped_elements",
        member_prefix: "ne",
        remote_key: "mapped_elements",
        action: "mapped_elements",
    },
];

pub fn get_attachment_config(resource_type: &str) -> Option<&'static AttachmentConfig> {
    ATTACHMENTS.iter().find(|c| c.resource_type == resource_type)
}

/// Whether `resource_type` is handled by this module
pub fn is_attachment(resource_type: &str) -> bool {
    resource_type == ALIAS || get_attachment_config(resource_type).is_some()
}

pub fn alias_schema() -> ResourceSchema {
    ResourceSchema::new(ALIAS)
        .with_description("An additional DNS name of a network element")
        .attribute(AttributeSchema::new("id", AttributeType::String).computed())
        .attribute(
            AttributeSchema::new("network_element_id", AttributeType::id("ne"))
                .required()
                .force_new(),
        )
        .attribute(
            AttributeSchema::new("alias", types::hostname())
                .required()
                .force_new(),
        )
}

/// Schema of an attachment or of the alias resource
pub fn schema(resource_type: &str) -> Option<ResourceSchema> {
    if resource_type == ALIAS {
        return Some(alias_schema());
    }
    get_attachment_config(resource_type).map(AttachmentConfig::schema)
}

fn members(attrs: &HashMap<String, Value>, name: &str) -> Vec<String> {
    attrs.get(name).map(Value::string_items).unwrap_or_default()
}

fn remote_members(props: &serde_json::Value, key: &str) -> Vec<String> {
    props
        .get(key)
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|m| m.as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default()
}

fn required_str<'a>(
    id: &ResourceId,
    attrs: &'a HashMap<String, Value>,
    name: &str,
) -> ProviderResult<&'a str> {
    attrs.get(name).and_then(Value::as_str).ok_or_else(|| {
        ProviderError::new(format!("Attribute '{}' is required", name)).for_resource(id.clone())
    })
}

// =============================================================================
// Membership Attachments
// =============================================================================

/// Read the owner and keep the configured members it still has.
///
/// Without configured members (an import), every member of the owner is
/// taken. The identifier of an imported attachment is the owner ID.
pub async fn read(
    client: &MetaClient,
    config: &AttachmentConfig,
    current: &State,
) -> ProviderResult<State> {
    let id = &current.id;
    let owner = match current.get_str(config.owner_attribute) {
        Some(owner) => owner.to_string(),
        None => match current.identifier.as_deref() {
            Some(identifier) => identifier.to_string(),
            None => return Ok(State::not_found(id.clone())),
        },
    };

    let props: serde_json::Value = match client.get(&config.owner_item_path(&owner)).await {
        Ok(props) => props,
        Err(e) if e.is_not_found() => {
            info!("{} owner {} no longer exists", id, owner);
            return Ok(State::not_found(id.clone()));
        }
        Err(e) => return Err(ProviderError::from(e).for_resource(id.clone())),
    };

    let authoritative = remote_members(&props, config.remote_key);
    let kept = match current.attributes.get(config.members_attribute) {
        Some(configured) => reconcile(&authoritative, &configured.string_items()),
        None => reconcile(&authoritative, &authoritative),
    };

    let identifier = synthetic_id(&owner, &kept);
    let attributes = HashMap::from([
        (config.owner_attribute.to_string(), Value::String(owner)),
        (
            config.members_attribute.to_string(),
            Value::string_list(kept),
        ),
    ]);
    Ok(State::existing(id.clone(), attributes).with_identifier(identifier))
}

async fn post_action(
    client: &MetaClient,
    config: &AttachmentConfig,
    id: &ResourceId,
    owner: &str,
    verb: &str,
    members: &[String],
) -> ProviderResult<()> {
    if members.is_empty() {
        return Ok(());
    }
    debug!("{}_{} {} {:?}", verb, config.action, owner, members);
    let mut body = serde_json::Map::new();
    body.insert(config.remote_key.to_string(), json!(members));
    let _: serde_json::Value = client
        .post(&config.action_path(owner, verb), &body)
        .await
        .map_err(|e| ProviderError::from(e).for_resource(id.clone()))?;
    Ok(())
}

pub async fn create(
    client: &MetaClient,
    config: &AttachmentConfig,
    resource: &Resource,
) -> ProviderResult<State> {
    let id = &resource.id;
    let owner = required_str(id, &resource.attributes, config.owner_attribute)?;
    let wanted = members(&resource.attributes, config.members_attribute);

    post_action(client, config, id, owner, "add", &wanted).await?;

    let pending = State::existing(id.clone(), resource.attributes.clone());
    read_back(client, config, &pending).await
}

/// Add the new members, then remove the dropped ones
pub async fn update(
    client: &MetaClient,
    config: &AttachmentConfig,
    from: &State,
    to: &Resource,
) -> ProviderResult<State> {
    let id = &to.id;
    let owner = required_str(id, &to.attributes, config.owner_attribute)?;
    if from.get_str(config.owner_attribute) != Some(owner) {
        return Err(ProviderError::new(format!(
            "Changing '{}' requires replacing the resource",
            config.owner_attribute
        ))
        .for_resource(id.clone()));
    }

    let (added, removed) = membership_delta(
        &members(&from.attributes, config.members_attribute),
        &members(&to.attributes, config.members_attribute),
    );
    post_action(client, config, id, owner, "add", &added).await?;
    post_action(client, config, id, owner, "remove", &removed).await?;

    let pending = State::existing(id.clone(), to.attributes.clone());
    read_back(client, config, &pending).await
}

/// Remove the members this attachment owns; a missing owner counts as done
pub async fn delete(
    client: &MetaClient,
    config: &AttachmentConfig,
    current: &State,
) -> ProviderResult<()> {
    let id = &current.id;
    let owner = required_str(id, &current.attributes, config.owner_attribute)?;
    let owned = members(&current.attributes, config.members_attribute);

    match post_action(client, config, id, owner, "remove", &owned).await {
        Err(e) if e.is_not_found() => {
            info!("{} owner {} was already deleted", id, owner);
            Ok(())
        }
        result => result,
    }
}

async fn read_back(
    client: &MetaClient,
    config: &AttachmentConfig,
    pending: &State,
) -> ProviderResult<State> {
    let state = read(client, config, pending).await?;
    if state.exists {
        Ok(state)
    } else {
        Err(ProviderError::new("Owner disappeared right after it was written")
            .for_resource(pending.id.clone()))
    }
}

// =============================================================================
// Network Element Alias
// =============================================================================

fn alias_path(network_element: &str, alias: &str) -> String {
    format!("v1/network_elements/{}/aliases/{}", network_element, alias)
}

/// Split an alias identifier `<network element id>/<alias>`
fn split_alias_identifier(identifier: &str) -> Option<(&str, &str)> {
    identifier
        .split_once('/')
        .filter(|(ne, alias)| !ne.is_empty() && !alias.is_empty())
}

pub async fn read_alias(client: &MetaClient, current: &State) -> ProviderResult<State> {
    let id = &current.id;
    let (ne, alias) = match (
        current.get_str("network_element_id"),
        current.get_str("alias"),
    ) {
        (Some(ne), Some(alias)) => (ne.to_string(), alias.to_string()),
        _ => match current.identifier.as_deref().and_then(split_alias_identifier) {
            Some((ne, alias)) => (ne.to_string(), alias.to_string()),
            None => return Ok(State::not_found(id.clone())),
        },
    };

    let props: serde_json::Value = match client.get(&format!("v1/network_elements/{}", ne)).await {
        Ok(props) => props,
        Err(e) if e.is_not_found() => return Ok(State::not_found(id.clone())),
        Err(e) => return Err(ProviderError::from(e).for_resource(id.clone())),
    };
    if !remote_members(&props, "aliases").contains(&alias) {
        info!("{} alias {} was removed from {}", id, alias, ne);
        return Ok(State::not_found(id.clone()));
    }

    let identifier = format!("{}/{}", ne, alias);
    let attributes = HashMap::from([
        ("network_element_id".to_string(), Value::String(ne)),
        ("alias".to_string(), Value::String(alias)),
    ]);
    Ok(State::existing(id.clone(), attributes).with_identifier(identifier))
}

pub async fn create_alias(client: &MetaClient, resource: &Resource) -> ProviderResult<State> {
    let id = &resource.id;
    let ne = required_str(id, &resource.attributes, "network_element_id")?;
    let alias = required_str(id, &resource.attributes, "alias")?;

    let _: serde_json::Value = client
        .put(&alias_path(ne, alias), &json!({}))
        .await
        .map_err(|e| ProviderError::from(e).for_resource(id.clone()))?;

    let pending = State::existing(id.clone(), resource.attributes.clone());
    let state = read_alias(client, &pending).await?;
    if state.exists {
        Ok(state)
    } else {
        Err(ProviderError::new(format!("Alias {} was not added", alias)).for_resource(id.clone()))
    }
}

pub async fn delete_alias(client: &MetaClient, current: &State) -> ProviderResult<()> {
    let id = &current.id;
    let ne = required_str(id, &current.attributes, "network_element_id")?;
    let alias = required_str(id, &current.attributes, "alias")?;

    match client.delete(&alias_path(ne, alias)).await {
        Ok(()) => Ok(()),
        Err(e) if e.is_not_found() => Ok(()),
        Err(e) => Err(ProviderError::from(e).for_resource(id.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_attachment_has_a_unique_type() {
        let mut names: Vec<_> = ATTACHMENTS.iter().map(|c| c.resource_type).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), ATTACHMENTS.len());
    }

    #[test]
    fn action_paths() {
        let config = get_attachment_config("routing_group_mapped_elements_attachment").unwrap();
        assert_eq!(
            config.action_path("rg-1", "add"),
            "v1/routing_groups/rg-1/add_mapped_elements"
        );
        assert_eq!(
            config.action_path("rg-1", "remove"),
            "v1/routing_groups/rg-1/remove_mapped_elements"
        );
    }

    #[test]
    fn owner_is_force_new() {
        let schema = get_attachment_config("group_roles_attachment")
            .unwrap()
            .schema();
        assert!(schema.get("group_id").unwrap().force_new);
        assert!(!schema.get("roles").unwrap().force_new);
    }

    #[test]
    fn alias_identifier_splits_on_slash() {
        assert_eq!(
            split_alias_identifier("ne-1/db.corp.example.com"),
            Some(("ne-1", "db.corp.example.com"))
        );
        assert_eq!(split_alias_identifier("ne-1"), None);
        assert_eq!(split_alias_identifier("/db"), None);
    }

    #[test]
    fn both_kinds_are_recognised() {
        assert!(is_attachment("group_users_attachment"));
        assert!(is_attachment(ALIAS));
        assert!(!is_attachment("group"));
    }
}
