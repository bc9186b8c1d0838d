//! Provider - Trait abstracting resource operations
//!
//! A Provider maps resource and data source blocks onto a remote API.
//! Every operation is a single request/response exchange with no retry.

use std::future::Future;
use std::pin::Pin;

use crate::resource::{Resource, ResourceId, State};
use crate::schema::{ResourceSchema, TypeError};

/// Error type for Provider operations
#[derive(Debug)]
pub struct ProviderError {
    pub message: String,
    pub resource_id: Option<ResourceId>,
    pub cause: Option<Box<dyn std::error::Error + Send + Sync>>,
    /// The remote API reported that the object does not exist
    pub not_found: bool,
    /// Attribute-level problems found before any request was made
    pub validation: Vec<TypeError>,
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(ref id) = self.resource_id {
            write!(f, "[{}.{}] {}", id.resource_type, id.name, self.message)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

impl std::error::Error for ProviderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_ref()
            .map(|e| e.as_ref() as &dyn std::error::Error)
    }
}

impl ProviderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            resource_id: None,
            cause: None,
            not_found: false,
            validation: Vec::new(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            not_found: true,
            ..Self::new(message)
        }
    }

    /// Configuration failed schema validation
    pub fn validation(errors: Vec<TypeError>) -> Self {
        let message = errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        Self {
            validation: errors,
            ..Self::new(format!("Invalid configuration: {}", message))
        }
    }

    pub fn for_resource(mut self, id: ResourceId) -> Self {
        self.resource_id = Some(id);
        self
    }

    pub fn with_cause(mut self, cause: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    pub fn is_not_found(&self) -> bool {
        self.not_found
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;

/// Return type for async operations
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Whether a type describes a managed resource or a read-only data source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Managed,
    DataSource,
}

/// Definition of resource types that a Provider can handle
pub trait ResourceType: Send + Sync {
    /// Resource type name (e.g., "user")
    fn name(&self) -> &'static str;

    /// Attribute schema for this resource type
    fn schema(&self) -> ResourceSchema;

    fn kind(&self) -> ResourceKind {
        ResourceKind::Managed
    }
}

/// Main Provider trait
///
/// All operations are async and involve side effects on the remote API.
pub trait Provider: Send + Sync {
    /// Name of this Provider (e.g., "pfptmeta")
    fn name(&self) -> &'static str;

    /// Managed resource types this Provider can handle
    fn resource_types(&self) -> Vec<Box<dyn ResourceType>>;

    /// Data sources this Provider can read
    fn data_sources(&self) -> Vec<Box<dyn ResourceType>>;

    /// Refresh a resource from the remote API
    ///
    /// `current` carries the identifier and the attributes last written to state.
    /// Returns `State::not_found()` if the remote API no longer knows the object.
    fn read(&self, current: &State) -> BoxFuture<'_, ProviderResult<State>>;

    /// Create a resource
    ///
    /// Returns State with identifier set to the remote ID (e.g., usr-xxx)
    fn create(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>>;

    /// Update a resource in place, sending only changed attributes
    fn update(
        &self,
        identifier: &str,
        from: &State,
        to: &Resource,
    ) -> BoxFuture<'_, ProviderResult<State>>;

    /// Delete a resource; an object that is already gone is not an error
    ///
    /// `current` is the state last written, so that join resources know which
    /// members they own.
    fn delete(&self, current: &State) -> BoxFuture<'_, ProviderResult<()>>;

    /// Look up an existing object without managing its lifecycle
    fn read_data_source(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>>;

    /// Bring an existing remote object under management by its identifier
    fn import(&self, id: &ResourceId, identifier: &str) -> BoxFuture<'_, ProviderResult<State>> {
        let state = State::existing(id.clone(), Default::default()).with_identifier(identifier);
        Box::pin(async move { self.read(&state).await })
    }

    /// Schema for a managed resource type or data source
    fn schema_for(&self, resource_type: &str, kind: ResourceKind) -> Option<ResourceSchema> {
        let types = match kind {
            ResourceKind::Managed => self.resource_types(),
            ResourceKind::DataSource => self.data_sources(),
        };
        types
            .into_iter()
            .find(|t| t.name() == resource_type)
            .map(|t| t.schema())
    }
}

/// Provider implementation for Box<dyn Provider>
/// This enables dynamic dispatch for Providers
impl Provider for Box<dyn Provider> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn resource_types(&self) -> Vec<Box<dyn ResourceType>> {
        (**self).resource_types()
    }

    fn data_sources(&self) -> Vec<Box<dyn ResourceType>> {
        (**self).data_sources()
    }

    fn read(&self, current: &State) -> BoxFuture<'_, ProviderResult<State>> {
        (**self).read(current)
    }

    fn create(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
        (**self).create(resource)
    }

    fn update(
        &self,
        identifier: &str,
        from: &State,
        to: &Resource,
    ) -> BoxFuture<'_, ProviderResult<State>> {
        (**self).update(identifier, from, to)
    }

    fn delete(&self, current: &State) -> BoxFuture<'_, ProviderResult<()>> {
        (**self).delete(current)
    }

    fn read_data_source(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
        (**self).read_data_source(resource)
    }

    fn import(&self, id: &ResourceId, identifier: &str) -> BoxFuture<'_, ProviderResult<State>> {
        (**self).import(id, identifier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{AttributeSchema, AttributeType};

    // Mock Provider for testing
    struct MockProvider;

    struct MockType;

    impl ResourceType for MockType {
        fn name(&self) -> &'static str {
            "thing"
        }

        fn schema(&self) -> ResourceSchema {
            ResourceSchema::new("thing")
                .attribute(AttributeSchema::new("name", AttributeType::String).required())
        }
    }

    impl Provider for MockProvider {
        fn name(&self) -> &'static str {
            "mock"
        }

        fn resource_types(&self) -> Vec<Box<dyn ResourceType>> {
            vec![Box::new(MockType)]
        }

        fn data_sources(&self) -> Vec<Box<dyn ResourceType>> {
            vec![]
        }

        fn read(&self, current: &State) -> BoxFuture<'_, ProviderResult<State>> {
            let current = current.clone();
            Box::pin(async move {
                match current.identifier.as_deref() {
                    Some("thg-1") => Ok(current),
                    _ => Ok(State::not_found(current.id)),
                }
            })
        }

        fn create(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
            let id = resource.id.clone();
            let attrs = resource.attributes.clone();
            Box::pin(async move { Ok(State::existing(id, attrs).with_identifier("thg-1")) })
        }

        fn update(
            &self,
            _identifier: &str,
            from: &State,
            to: &Resource,
        ) -> BoxFuture<'_, ProviderResult<State>> {
            let id = from.id.clone();
            let attrs = to.attributes.clone();
            Box::pin(async move { Ok(State::existing(id, attrs)) })
        }

        fn delete(&self, _current: &State) -> BoxFuture<'_, ProviderResult<()>> {
            Box::pin(async { Ok(()) })
        }

        fn read_data_source(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
            let id = resource.id.clone();
            Box::pin(async move { Err(ProviderError::not_found("no such thing").for_resource(id)) })
        }
    }

    #[tokio::test]
    async fn mock_provider_read_returns_not_found() {
        let provider = MockProvider;
        let state = State::existing(ResourceId::new("thing", "example"), Default::default())
            .with_identifier("thg-404");
        let state = provider.read(&state).await.unwrap();
        assert!(!state.exists);
    }

    #[tokio::test]
    async fn mock_provider_create_returns_existing() {
        let provider = MockProvider;
        let resource = Resource::new("thing", "example");
        let state = provider.create(&resource).await.unwrap();
        assert!(state.exists);
        assert_eq!(state.identifier, Some("thg-1".to_string()));
    }

    #[tokio::test]
    async fn default_import_reads_by_identifier() {
        let provider: Box<dyn Provider> = Box::new(MockProvider);
        let state = provider
            .import(&ResourceId::new("thing", "imported"), "thg-1")
            .await
            .unwrap();
        assert!(state.exists);
        assert_eq!(state.get_str("id"), Some("thg-1"));
    }

    #[test]
    fn schema_lookup_by_kind() {
        let provider = MockProvider;
        assert!(provider.schema_for("thing", ResourceKind::Managed).is_some());
        assert!(provider.schema_for("thing", ResourceKind::DataSource).is_none());
    }

    #[test]
    fn error_display_includes_resource() {
        let err = ProviderError::not_found("gone").for_resource(ResourceId::new("user", "alice"));
        assert_eq!(err.to_string(), "[user.alice] gone");
        assert!(err.is_not_found());
    }
}
