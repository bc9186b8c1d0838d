//! Data sources
//!
//! A data source looks up one existing object. With `id` set it is fetched
//! directly; otherwise the collection is listed and matched on the lookup
//! attribute, which must match exactly one object.

use std::collections::HashMap;

use log::debug;
use pfptmeta_core::mapper::map_response;
use pfptmeta_core::provider::{ProviderError, ProviderResult};
use pfptmeta_core::resource::{Resource, ResourceId, State, Value};
use pfptmeta_core::schema::{AttributeSchema, AttributeType, ResourceSchema, types};

use crate::client::MetaClient;
use crate::entities;
use crate::schemas::get_schema_config;

/// How a data source finds its object
#[derive(Debug, Clone, Copy)]
pub struct DataSourceConfig {
    pub name: &'static str,
    pub lookup_attribute: &'static str,
    /// Entity whose schema and path the data source reuses
    pub entity: Option<&'static str>,
}

pub const DATA_SOURCES: &[DataSourceConfig] = &[
    DataSourceConfig {
        name: "user",
        lookup_attribute: "email",
        entity: Some("user"),
    },
    DataSourceConfig {
        name: "group",
        lookup_attribute: "name",
        entity: Some("group"),
    },
    DataSourceConfig {
        name: "role",
        lookup_attribute: "name",
        entity: Some("role"),
    },
    DataSourceConfig {
        name: "network_element",
        lookup_attribute: "name",
        entity: Some("network_element"),
    },
    DataSourceConfig {
        name: "protocol_group",
        lookup_attribute: "name",
        entity: Some("protocol_group"),
    },
    DataSourceConfig {
        name: "metaport",
        lookup_attribute: "name",
        entity: Some("metaport"),
    },
    DataSourceConfig {
        name: "certificate",
        lookup_attribute: "name",
        entity: Some("certificate"),
    },
    DataSourceConfig {
        name: "location",
        lookup_attribute: "name",
        entity: None,
    },
];

const LOCATIONS_PATH: &str = "v1/locations";

pub fn get_data_source_config(name: &str) -> Option<&'static DataSourceConfig> {
    DATA_SOURCES.iter().find(|c| c.name == name)
}

/// Points of presence; listed only, matched by name
fn location_schema() -> ResourceSchema {
    ResourceSchema::new("location")
        .with_description("A point of presence of the Meta network")
        .attribute(AttributeSchema::new("name", AttributeType::String).required())
        .attribute(AttributeSchema::new("city", AttributeType::String).computed())
        .attribute(AttributeSchema::new("state", AttributeType::String).computed())
        .attribute(AttributeSchema::new("country", types::country_code()).computed())
        .attribute(AttributeSchema::new("status", AttributeType::String).computed())
}

impl DataSourceConfig {
    pub fn schema(&self) -> Option<ResourceSchema> {
        match self.entity {
            Some(entity) => get_schema_config(entity).map(|c| {
                c.schema
                    .as_data_source(self.name, &["id", self.lookup_attribute])
            }),
            None => Some(location_schema()),
        }
    }

    fn collection_path(&self) -> &'static str {
        match self.entity.and_then(get_schema_config) {
            Some(config) => config.api_path,
            None => LOCATIONS_PATH,
        }
    }
}

/// Schema of a data source, by name
pub fn schema(name: &str) -> Option<ResourceSchema> {
    get_data_source_config(name).and_then(DataSourceConfig::schema)
}

/// Objects of `items` whose `key` equals `wanted`
fn matching<'a>(
    items: &'a [serde_json::Value],
    key: &str,
    wanted: &str,
) -> Vec<&'a serde_json::Value> {
    items
        .iter()
        .filter(|item| item.get(key).and_then(|v| v.as_str()) == Some(wanted))
        .collect()
}

pub async fn read(client: &MetaClient, resource: &Resource) -> ProviderResult<State> {
    let id = &resource.id;
    let config = get_data_source_config(&id.resource_type).ok_or_else(|| {
        ProviderError::new(format!("Unknown data source: {}", id.resource_type))
            .for_resource(id.clone())
    })?;
    let schema = config.schema().ok_or_else(|| {
        ProviderError::new(format!("No schema for data source: {}", config.name))
            .for_resource(id.clone())
    })?;

    let props = match (resource.get_str("id"), resource.get_str(config.lookup_attribute)) {
        (Some(identifier), _) if config.entity.is_some() => {
            let path = format!("{}/{}", config.collection_path(), identifier);
            client
                .get(&path)
                .await
                .map_err(|e| ProviderError::from(e).for_resource(id.clone()))?
        }
        (_, Some(wanted)) => find_one(client, config, id, wanted).await?,
        _ => {
            return Err(ProviderError::new(format!(
                "One of 'id' or '{}' must be set",
                config.lookup_attribute
            ))
            .for_resource(id.clone()));
        }
    };

    state_from_props(config, &schema, id, &props)
}

async fn find_one(
    client: &MetaClient,
    config: &DataSourceConfig,
    id: &ResourceId,
    wanted: &str,
) -> ProviderResult<serde_json::Value> {
    let items: Vec<serde_json::Value> = client
        .list(config.collection_path())
        .await
        .map_err(|e| ProviderError::from(e).for_resource(id.clone()))?;
    debug!(
        "{}: {} candidates for {} = {}",
        id,
        items.len(),
        config.lookup_attribute,
        wanted
    );

    match matching(&items, config.lookup_attribute, wanted).as_slice() {
        [one] => Ok((*one).clone()),
        [] => Err(ProviderError::not_found(format!(
            "No {} with {} '{}'",
            config.name, config.lookup_attribute, wanted
        ))
        .for_resource(id.clone())),
        many => Err(ProviderError::new(format!(
            "{} objects of type {} have {} '{}'",
            many.len(),
            config.name,
            config.lookup_attribute,
            wanted
        ))
        .for_resource(id.clone())),
    }
}

fn state_from_props(
    config: &DataSourceConfig,
    schema: &ResourceSchema,
    id: &ResourceId,
    props: &serde_json::Value,
) -> ProviderResult<State> {
    let mut attributes: HashMap<String, Value> = HashMap::new();
    map_response(schema, props, &[], &mut attributes)
        .map_err(|e| ProviderError::new(e.to_string()).with_cause(e).for_resource(id.clone()))?;
    if let Some(entity) = config.entity {
        entities::read_nested(entity, props, &HashMap::new(), &mut attributes)
            .map_err(|e| ProviderError::from(e).for_resource(id.clone()))?;
    }

    // Locations have no ID of their own
    let identifier = props
        .get("id")
        .or_else(|| props.get(config.lookup_attribute))
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();
    Ok(State::existing(id.clone(), attributes).with_identifier(identifier))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn every_data_source_has_a_schema() {
        for config in DATA_SOURCES {
            let schema = config.schema().unwrap();
            assert!(
                schema.get(config.lookup_attribute).is_some(),
                "{} lacks {}",
                config.name,
                config.lookup_attribute
            );
        }
    }

    #[test]
    fn lookup_attributes_stay_configurable() {
        let schema = schema("user").unwrap();
        assert!(!schema.get("email").unwrap().is_read_only());
        assert!(!schema.get("id").unwrap().is_read_only());
        assert!(schema.get("given_name").unwrap().is_read_only());
    }

    #[test]
    fn matching_compares_the_lookup_attribute() {
        let items = vec![
            json!({"id": "grp-1", "name": "admins"}),
            json!({"id": "grp-2", "name": "developers"}),
            json!({"id": "grp-3", "name": "admins"}),
        ];
        assert_eq!(matching(&items, "name", "developers").len(), 1);
        assert_eq!(matching(&items, "name", "admins").len(), 2);
        assert!(matching(&items, "name", "ops").is_empty());
    }

    #[test]
    fn location_state_is_identified_by_name() {
        let config = get_data_source_config("location").unwrap();
        let schema = config.schema().unwrap();
        let props = json!({"name": "LHR", "city": "London", "country": "GB", "latitude": 51.47});
        let state =
            state_from_props(config, &schema, &ResourceId::new("location", "lhr"), &props).unwrap();
        assert_eq!(state.identifier.as_deref(), Some("LHR"));
        assert_eq!(state.get_str("city"), Some("London"));
    }
}
