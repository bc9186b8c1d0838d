//! Proofpoint Meta provider implementation
//!
//! Every entity goes through the same path: POST then GET on create, GET on
//! read, PATCH of the changed attributes then GET on update, and DELETE.
//! Entities with nested blocks hook into that path through `entities`.

use std::collections::HashMap;

use log::{debug, info};
use pfptmeta_core::differ::changed_attributes;
use pfptmeta_core::mapper::{MapError, build_body, map_response};
use pfptmeta_core::provider::{ProviderError, ProviderResult};
use pfptmeta_core::resource::{Resource, ResourceId, State, Value};

use crate::attachments;
use crate::client::MetaClient;
use crate::config::ProviderConfig;
use crate::data_sources;
use crate::entities::{self, Body, app::AppProtocol, tunnel};
use crate::schemas::{MetaSchemaConfig, get_schema_config};

/// Look up the schema config of an entity, or fail for `id`
fn schema_config(id: &ResourceId) -> ProviderResult<MetaSchemaConfig> {
    get_schema_config(&id.resource_type).ok_or_else(|| {
        ProviderError::new(format!("Unknown resource type: {}", id.resource_type))
            .for_resource(id.clone())
    })
}

fn mapping_error(id: &ResourceId) -> impl FnOnce(MapError) -> ProviderError + '_ {
    move |e| ProviderError::new(e.to_string()).with_cause(e).for_resource(id.clone())
}

/// Check a resource or data source block without contacting the API.
///
/// Runs the schema checks and the entity's own nested-block checks, and
/// reports every problem found.
pub fn validate_resource(resource: &Resource) -> ProviderResult<()> {
    let id = &resource.id;
    let attrs = &resource.attributes;

    if resource.is_data_source() {
        let schema = data_sources::schema(&id.resource_type).ok_or_else(|| {
            ProviderError::new(format!("Unknown data source: {}", id.resource_type))
                .for_resource(id.clone())
        })?;
        return schema
            .validate(attrs)
            .map_err(|errors| ProviderError::validation(errors).for_resource(id.clone()));
    }

    if let Some(schema) = attachments::schema(&id.resource_type) {
        return schema
            .validate(attrs)
            .map_err(|errors| ProviderError::validation(errors).for_resource(id.clone()));
    }

    let config = schema_config(id)?;
    let mut errors = config.schema.validate(attrs).err().unwrap_or_default();

    // Nested checks need well-typed blocks; skip them when those already failed
    let nested_ok = !errors
        .iter()
        .any(|e| e.attribute().is_some_and(|a| config.nested.contains(&a)));
    if nested_ok {
        let mut scratch = Body::new();
        if let Err(e) = entities::write_nested(&id.resource_type, attrs, None, &mut scratch) {
            errors.push(e.into_type_error());
        }
        if id.resource_type == "app"
            && let Err(e) = AppProtocol::from_attributes(attrs)
        {
            errors.push(e.into_type_error());
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ProviderError::validation(errors).for_resource(id.clone()))
    }
}

/// Proofpoint Meta provider
pub struct MetaProvider {
    client: MetaClient,
}

impl MetaProvider {
    pub fn new(client: MetaClient) -> Self {
        Self { client }
    }

    /// Authenticate against the API described by `config`
    pub async fn connect(config: ProviderConfig) -> ProviderResult<Self> {
        info!(
            "Connecting to {} for org {}",
            config.base_url, config.org_shortname
        );
        let client = MetaClient::connect(config).await?;
        Ok(Self::new(client))
    }

    pub fn client(&self) -> &MetaClient {
        &self.client
    }

    // =========================================================================
    // Resource Operations
    // =========================================================================

    /// Read an entity by identifier.
    ///
    /// `prior` holds the attributes last written to state. Nested blocks are
    /// fitted to it and write-only secrets are carried over from it.
    pub async fn read_resource(
        &self,
        id: &ResourceId,
        identifier: Option<&str>,
        prior: &HashMap<String, Value>,
    ) -> ProviderResult<State> {
        let config = schema_config(id)?;

        let Some(identifier) = identifier else {
            return Ok(State::not_found(id.clone()));
        };

        let props: serde_json::Value = match self.client.get(&config.item_path(identifier)).await {
            Ok(props) => props,
            Err(e) if e.is_not_found() => {
                info!("{} {} no longer exists", id, identifier);
                return Ok(State::not_found(id.clone()));
            }
            Err(e) => return Err(ProviderError::from(e).for_resource(id.clone())),
        };

        let mut attributes = HashMap::new();
        map_response(&config.schema, &props, config.nested, &mut attributes)
            .map_err(mapping_error(id))?;
        entities::read_nested(&id.resource_type, &props, prior, &mut attributes)
            .map_err(|e| ProviderError::from(e).for_resource(id.clone()))?;

        // Secrets the API never returns keep the value last written
        for (name, attr) in &config.schema.attributes {
            if attr.sensitive
                && !attributes.contains_key(name)
                && let Some(value) = prior.get(name)
            {
                attributes.insert(name.clone(), value.clone());
            }
        }

        let identifier = props
            .get("id")
            .and_then(|v| v.as_str())
            .unwrap_or(identifier);
        Ok(State::existing(id.clone(), attributes).with_identifier(identifier))
    }

    /// Create an entity, then read it back
    pub async fn create_resource(&self, resource: Resource) -> ProviderResult<State> {
        validate_resource(&resource)?;
        let id = &resource.id;
        let config = schema_config(id)?;

        let mut attrs = resource.attributes.clone();
        config.schema.apply_defaults(&mut attrs);

        let mut body = build_body(&config.schema, &attrs, config.nested, None)
            .map_err(mapping_error(id))?;
        entities::write_nested(&id.resource_type, &attrs, None, &mut body)
            .map_err(|e| ProviderError::from(e).for_resource(id.clone()))?;

        let created: serde_json::Value = self
            .client
            .post(config.api_path, &body)
            .await
            .map_err(|e| ProviderError::from(e).for_resource(id.clone()))?;
        let identifier = created
            .get("id")
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                ProviderError::new("Create response did not include an id").for_resource(id.clone())
            })?
            .to_string();
        debug!("Created {} as {}", id, identifier);

        if id.resource_type == "app" {
            self.put_app_protocol(id, &config, &identifier, &attrs).await?;
        }

        self.read_back(id, &identifier, &attrs).await
    }

    /// Update an entity in place, sending only the attributes that changed
    pub async fn update_resource(
        &self,
        identifier: &str,
        from: &State,
        to: Resource,
    ) -> ProviderResult<State> {
        validate_resource(&to)?;
        let id = &to.id;
        let config = schema_config(id)?;

        let mut attrs = to.attributes.clone();
        config.schema.apply_defaults(&mut attrs);

        let changed = changed_attributes(&config.schema, &attrs, &from.attributes);
        if let Some(name) = changed
            .iter()
            .find(|name| config.schema.get(name).is_some_and(|a| a.force_new))
        {
            return Err(ProviderError::new(format!(
                "Changing '{}' requires replacing the resource",
                name
            ))
            .for_resource(id.clone()));
        }
        debug!("Updating {} {}: {:?}", id, identifier, changed);

        let mut body = build_body(&config.schema, &attrs, config.nested, Some(&changed))
            .map_err(mapping_error(id))?;
        entities::write_nested(&id.resource_type, &attrs, Some(&changed), &mut body)
            .map_err(|e| ProviderError::from(e).for_resource(id.clone()))?;

        if !body.is_empty() {
            let _: serde_json::Value = self
                .client
                .patch(&config.item_path(identifier), &body)
                .await
                .map_err(|e| ProviderError::from(e).for_resource(id.clone()))?;
        }

        match id.resource_type.as_str() {
            "tunnel" if changed.iter().any(|c| c == "gre_config") => {
                self.update_source_ips(id, &config, identifier, &from.attributes, &attrs)
                    .await?;
            }
            "app" if changed.iter().any(|c| entities::app::BLOCKS.contains(&c.as_str())) => {
                self.put_app_protocol(id, &config, identifier, &attrs).await?;
            }
            _ => {}
        }

        self.read_back(id, identifier, &attrs).await
    }

    /// Delete an entity; one that is already gone counts as deleted
    pub async fn delete_resource(&self, id: &ResourceId, identifier: &str) -> ProviderResult<()> {
        let config = schema_config(id)?;
        match self.client.delete(&config.item_path(identifier)).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => {
                info!("{} {} was already deleted", id, identifier);
                Ok(())
            }
            Err(e) => Err(ProviderError::from(e).for_resource(id.clone())),
        }
    }

    // =========================================================================
    // Entity-specific Steps
    // =========================================================================

    /// Read after a write; the object must exist at this point
    async fn read_back(
        &self,
        id: &ResourceId,
        identifier: &str,
        desired: &HashMap<String, Value>,
    ) -> ProviderResult<State> {
        let state = self.read_resource(id, Some(identifier), desired).await?;
        if state.exists {
            Ok(state)
        } else {
            Err(ProviderError::new(format!(
                "{} disappeared right after it was written",
                identifier
            ))
            .for_resource(id.clone()))
        }
    }

    async fn put_app_protocol(
        &self,
        id: &ResourceId,
        config: &MetaSchemaConfig,
        identifier: &str,
        attrs: &HashMap<String, Value>,
    ) -> ProviderResult<()> {
        let protocol = AppProtocol::from_attributes(attrs)
            .map_err(|e| ProviderError::from(e).for_resource(id.clone()))?;
        let body = protocol
            .body()
            .map_err(|e| ProviderError::from(e).for_resource(id.clone()))?;
        let path = format!("{}/{}", config.item_path(identifier), protocol.path_suffix());

        let _: serde_json::Value = self
            .client
            .put(&path, &body)
            .await
            .map_err(|e| ProviderError::from(e).for_resource(id.clone()))?;
        Ok(())
    }

    /// Apply a change of GRE source IPs: additions first, then removals
    async fn update_source_ips(
        &self,
        id: &ResourceId,
        config: &MetaSchemaConfig,
        identifier: &str,
        from: &HashMap<String, Value>,
        to: &HashMap<String, Value>,
    ) -> ProviderResult<()> {
        let nested = |e: entities::NestedError| ProviderError::from(e).for_resource(id.clone());
        let (added, removed) = pfptmeta_core::attachment::membership_delta(
            &tunnel::source_ips(from).map_err(nested)?,
            &tunnel::source_ips(to).map_err(nested)?,
        );

        for (action, ips) in [("add_source_ips", added), ("remove_source_ips", removed)] {
            if ips.is_empty() {
                continue;
            }
            debug!("{} {} {:?}", action, identifier, ips);
            let path = format!("{}/{}", config.item_path(identifier), action);
            let _: serde_json::Value = self
                .client
                .post(&path, &tunnel::action_body(&ips))
                .await
                .map_err(|e| ProviderError::from(e).for_resource(id.clone()))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn protocol_group(protocols: Vec<(i64, i64, &str)>) -> Resource {
        let protocols = protocols
            .into_iter()
            .map(|(from, to, proto)| {
                Value::Map(HashMap::from([
                    ("from_port".to_string(), Value::Int(from)),
                    ("to_port".to_string(), Value::Int(to)),
                    ("proto".to_string(), Value::from(proto)),
                ]))
            })
            .collect();
        Resource::new("protocol_group", "web")
            .with_attribute("name", "web")
            .with_attribute("protocols", Value::List(protocols))
    }

    #[test]
    fn valid_protocol_group_passes() {
        assert!(validate_resource(&protocol_group(vec![(80, 443, "tcp")])).is_ok());
    }

    #[test]
    fn inverted_port_range_is_reported_on_its_attribute() {
        let err = validate_resource(&protocol_group(vec![(443, 80, "tcp")])).unwrap_err();
        assert_eq!(err.validation.len(), 1);
        assert_eq!(err.validation[0].attribute(), Some("protocols"));
    }

    #[test]
    fn schema_and_nested_errors_are_reported_together() {
        let resource = protocol_group(vec![(443, 80, "tcp")])
            .with_attribute("id", "pg-123")
            .with_attribute("colour", "blue");
        let err = validate_resource(&resource).unwrap_err();
        let attributes: Vec<_> = err.validation.iter().filter_map(|e| e.attribute()).collect();
        assert!(attributes.contains(&"id"));
        assert!(attributes.contains(&"colour"));
        assert!(attributes.contains(&"protocols"));
    }

    #[test]
    fn unknown_type_is_rejected() {
        let err = validate_resource(&Resource::new("firewall", "x")).unwrap_err();
        assert!(err.message.contains("Unknown resource type"));
    }

    #[test]
    fn attachment_members_are_checked_against_their_prefix() {
        let resource = Resource::new("group_roles_attachment", "admins")
            .with_attribute("group_id", "grp-1")
            .with_attribute("roles", Value::string_list(["usr-1"]));
        assert!(validate_resource(&resource).is_err());
    }
}
