//! Proofpoint Meta Provider
//!
//! Manages users, network elements, policies and the rest of a Meta
//! organization through its REST API.
//!
//! ## Module Structure
//!
//! - `config` - Provider configuration (environment and provider block)
//! - `client` - Authenticated REST client
//! - `schemas` - Entity schemas and API paths
//! - `entities` - Nested blocks that need entity-specific mapping
//! - `provider` - MetaProvider and the generic CRUD path
//! - `attachments` - Join resources with synthetic identifiers
//! - `data_sources` - Read-only lookups
//! - `resources` - Resource type registrations

pub mod attachments;
pub mod client;
pub mod config;
pub mod data_sources;
pub mod entities;
pub mod error;
pub mod provider;
pub mod resources;
pub mod schemas;

// Re-export main types
pub use client::MetaClient;
pub use config::{ConfigError, ProviderConfig};
pub use error::ApiError;
pub use provider::{MetaProvider, validate_resource};

use pfptmeta_core::provider::{BoxFuture, Provider, ProviderResult, ResourceType};
use pfptmeta_core::resource::{Resource, State};

use attachments::{ALIAS, get_attachment_config};
use resources::{data_source_types, resource_types};

// =============================================================================
// Provider Trait Implementation
// =============================================================================

impl Provider for MetaProvider {
    fn name(&self) -> &'static str {
        "pfptmeta"
    }

    fn resource_types(&self) -> Vec<Box<dyn ResourceType>> {
        resource_types()
    }

    fn data_sources(&self) -> Vec<Box<dyn ResourceType>> {
        data_source_types()
    }

    fn read(&self, current: &State) -> BoxFuture<'_, ProviderResult<State>> {
        let current = current.clone();
        Box::pin(async move {
            let resource_type = current.id.resource_type.as_str();
            if resource_type == ALIAS {
                attachments::read_alias(self.client(), &current).await
            } else if let Some(config) = get_attachment_config(resource_type) {
                attachments::read(self.client(), config, &current).await
            } else {
                self.read_resource(
                    &current.id,
                    current.identifier.as_deref(),
                    &current.attributes,
                )
                .await
            }
        })
    }

    fn create(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
        let resource = resource.clone();
        Box::pin(async move {
            let resource_type = resource.id.resource_type.as_str();
            if attachments::is_attachment(resource_type) {
                validate_resource(&resource)?;
            }
            if resource_type == ALIAS {
                attachments::create_alias(self.client(), &resource).await
            } else if let Some(config) = get_attachment_config(resource_type) {
                attachments::create(self.client(), config, &resource).await
            } else {
                self.create_resource(resource).await
            }
        })
    }

    fn update(
        &self,
        identifier: &str,
        from: &State,
        to: &Resource,
    ) -> BoxFuture<'_, ProviderResult<State>> {
        let identifier = identifier.to_string();
        let from = from.clone();
        let to = to.clone();
        Box::pin(async move {
            let resource_type = to.id.resource_type.as_str();
            if resource_type == ALIAS {
                validate_resource(&to)?;
                // Both attributes force replacement, so there is nothing to change in place
                attachments::read_alias(self.client(), &from).await
            } else if let Some(config) = get_attachment_config(resource_type) {
                validate_resource(&to)?;
                attachments::update(self.client(), config, &from, &to).await
            } else {
                self.update_resource(&identifier, &from, to).await
            }
        })
    }

    fn delete(&self, current: &State) -> BoxFuture<'_, ProviderResult<()>> {
        let current = current.clone();
        Box::pin(async move {
            let resource_type = current.id.resource_type.as_str();
            if resource_type == ALIAS {
                return attachments::delete_alias(self.client(), &current).await;
            }
            if let Some(config) = get_attachment_config(resource_type) {
                return attachments::delete(self.client(), config, &current).await;
            }
            match current.identifier.as_deref() {
                Some(identifier) => self.delete_resource(&current.id, identifier).await,
                None => Ok(()),
            }
        })
    }

    fn read_data_source(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
        let resource = resource.clone().with_read_only(true);
        Box::pin(async move {
            validate_resource(&resource)?;
            data_sources::read(self.client(), &resource).await
        })
    }
}
