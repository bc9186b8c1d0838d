//! Schema - Define type schemas for resources
//!
//! The provider defines a schema for each resource type and data source,
//! so configuration can be type checked before any API call is made.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;

use serde::Serialize;

use crate::resource::Value;
use crate::validation;

/// Attribute type
#[derive(Debug, Clone)]
pub enum AttributeType {
    /// String
    String,
    /// Integer
    Int,
    /// Boolean
    Bool,
    /// Enum (list of allowed values)
    Enum(Vec<String>),
    /// Remote ID with a type-specific prefix (e.g., "usr" for `usr-abc123`);
    /// several prefixes are accepted when an attribute can reference more than one entity type
    Id(Vec<&'static str>),
    /// Custom type (with validation function)
    Custom {
        name: String,
        base: Box<AttributeType>,
        validate: fn(&Value) -> Result<(), String>,
    },
    /// Ordered list
    List(Box<AttributeType>),
    /// Unordered collection without duplicates
    Set(Box<AttributeType>),
    /// Map with string keys
    Map(Box<AttributeType>),
    /// Nested configuration block; never mapped generically
    Block(Vec<AttributeSchema>),
}

impl AttributeType {
    pub fn id(prefix: &'static str) -> Self {
        AttributeType::Id(vec![prefix])
    }

    pub fn enumeration(values: &[&str]) -> Self {
        AttributeType::Enum(values.iter().map(|v| v.to_string()).collect())
    }

    pub fn list(inner: AttributeType) -> Self {
        AttributeType::List(Box::new(inner))
    }

    pub fn set(inner: AttributeType) -> Self {
        AttributeType::Set(Box::new(inner))
    }

    pub fn map(inner: AttributeType) -> Self {
        AttributeType::Map(Box::new(inner))
    }

    pub fn is_block(&self) -> bool {
        match self {
            AttributeType::Block(_) => true,
            AttributeType::List(inner) | AttributeType::Set(inner) => inner.is_block(),
            _ => false,
        }
    }

    pub fn is_collection(&self) -> bool {
        matches!(self, AttributeType::List(_) | AttributeType::Set(_))
    }

    /// Check if a value conforms to this type
    pub fn validate(&self, value: &Value) -> Result<(), TypeError> {
        match (self, value) {
            (AttributeType::String, Value::String(_)) => Ok(()),
            (AttributeType::Int, Value::Int(_)) => Ok(()),
            (AttributeType::Bool, Value::Bool(_)) => Ok(()),

            (AttributeType::Enum(variants), Value::String(s)) => {
                if variants.iter().any(|v| v == s) {
                    Ok(())
                } else {
                    Err(TypeError::InvalidEnumVariant {
                        value: s.clone(),
                        expected: variants.clone(),
                    })
                }
            }

            (AttributeType::Id(prefixes), Value::String(s)) => {
                validation::validate_id_prefixes(s, prefixes)
                    .map_err(|message| TypeError::ValidationFailed { message })
            }

            (AttributeType::Custom { validate, .. }, v) => {
                validate(v).map_err(|message| TypeError::ValidationFailed { message })
            }

            (AttributeType::List(inner), Value::List(items)) => {
                for (i, item) in items.iter().enumerate() {
                    inner.validate(item).map_err(|e| TypeError::ListItemError {
                        index: i,
                        inner: Box::new(e),
                    })?;
                }
                Ok(())
            }

            (AttributeType::Set(inner), Value::List(items)) => {
                for (i, item) in items.iter().enumerate() {
                    inner.validate(item).map_err(|e| TypeError::ListItemError {
                        index: i,
                        inner: Box::new(e),
                    })?;
                    if items[..i].contains(item) {
                        return Err(TypeError::DuplicateSetMember {
                            index: i,
                            value: format!("{:?}", item),
                        });
                    }
                }
                Ok(())
            }

            (AttributeType::Map(inner), Value::Map(map)) => {
                for (k, v) in map {
                    inner.validate(v).map_err(|e| TypeError::MapValueError {
                        key: k.clone(),
                        inner: Box::new(e),
                    })?;
                }
                Ok(())
            }

            (AttributeType::Block(attributes), Value::Map(map)) => {
                let errors = validate_attributes(attributes.iter(), map, &[]);
                match errors.into_iter().next() {
                    None => Ok(()),
                    Some(e) => Err(e),
                }
            }

            _ => Err(TypeError::TypeMismatch {
                expected: self.type_name(),
                got: value.type_name().to_string(),
            }),
        }
    }

    pub fn type_name(&self) -> String {
        match self {
            AttributeType::String => "String".to_string(),
            AttributeType::Int => "Int".to_string(),
            AttributeType::Bool => "Bool".to_string(),
            AttributeType::Enum(variants) => format!("Enum({})", variants.join(" | ")),
            AttributeType::Id(prefixes) => format!("Id({})", prefixes.join(" | ")),
            AttributeType::Custom { name, .. } => name.clone(),
            AttributeType::List(inner) => format!("List<{}>", inner.type_name()),
            AttributeType::Set(inner) => format!("Set<{}>", inner.type_name()),
            AttributeType::Map(inner) => format!("Map<{}>", inner.type_name()),
            AttributeType::Block(_) => "Block".to_string(),
        }
    }

    /// The scalar wire type this attribute is carried as
    pub fn base(&self) -> &AttributeType {
        match self {
            AttributeType::Custom { base, .. } => base.base(),
            other => other,
        }
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_name())
    }
}

/// Type error
#[derive(Debug, Clone, thiserror::Error)]
pub enum TypeError {
    #[error("Type mismatch: expected {expected}, got {got}")]
    TypeMismatch { expected: String, got: String },

    #[error("Invalid enum variant '{value}', expected one of: {}", expected.join(", "))]
    InvalidEnumVariant {
        value: String,
        expected: Vec<String>,
    },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    #[error("Required attribute '{name}' is missing")]
    MissingRequired { name: String },

    #[error("Unknown attribute '{name}'")]
    UnknownAttribute { name: String },

    #[error("Attribute '{name}' is computed and cannot be configured")]
    ComputedOnly { name: String },

    #[error("Attribute '{name}' conflicts with '{other}'")]
    Conflict { name: String, other: String },

    #[error("Exactly one of {} must be set", names.join(", "))]
    ExactlyOneOf { names: Vec<String> },

    #[error("Set contains duplicate member at index {index}: {value}")]
    DuplicateSetMember { index: usize, value: String },

    #[error("List item at index {index}: {inner}")]
    ListItemError { index: usize, inner: Box<TypeError> },

    #[error("Map value for key '{key}': {inner}")]
    MapValueError { key: String, inner: Box<TypeError> },

    #[error("Attribute '{name}': {inner}")]
    AttributeError { name: String, inner: Box<TypeError> },
}

impl TypeError {
    /// Attribute path the error refers to, when there is one
    pub fn attribute(&self) -> Option<&str> {
        match self {
            TypeError::MissingRequired { name }
            | TypeError::UnknownAttribute { name }
            | TypeError::ComputedOnly { name }
            | TypeError::Conflict { name, .. }
            | TypeError::AttributeError { name, .. } => Some(name.as_str()),
            _ => None,
        }
    }
}

/// Attribute schema
#[derive(Debug, Clone)]
pub struct AttributeSchema {
    pub name: String,
    pub attr_type: AttributeType,
    pub required: bool,
    /// Set by the remote API; configurable too when `optional` is also set
    pub computed: bool,
    pub optional: bool,
    pub sensitive: bool,
    /// Changing this attribute replaces the remote object
    pub force_new: bool,
    pub default: Option<Value>,
    pub description: Option<String>,
    /// JSON key on the API side, when it differs from the attribute name
    pub provider_name: Option<String>,
    pub conflicts_with: Vec<String>,
}

impl AttributeSchema {
    pub fn new(name: impl Into<String>, attr_type: AttributeType) -> Self {
        Self {
            name: name.into(),
            attr_type,
            required: false,
            computed: false,
            optional: true,
            sensitive: false,
            force_new: false,
            default: None,
            description: None,
            provider_name: None,
            conflicts_with: Vec::new(),
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self.optional = false;
        self
    }

    /// Read-only attribute set by the API
    pub fn computed(mut self) -> Self {
        self.computed = true;
        self.optional = false;
        self.required = false;
        self
    }

    /// Configurable attribute that the API fills in when left unset
    pub fn optional_computed(mut self) -> Self {
        self.computed = true;
        self.optional = true;
        self.required = false;
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    pub fn force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    pub fn with_provider_name(mut self, name: impl Into<String>) -> Self {
        self.provider_name = Some(name.into());
        self
    }

    pub fn conflicts_with(mut self, names: &[&str]) -> Self {
        self.conflicts_with = names.iter().map(|n| n.to_string()).collect();
        self
    }

    /// JSON key used by the remote API
    pub fn api_name(&self) -> &str {
        self.provider_name.as_deref().unwrap_or(&self.name)
    }

    /// Read-only: computed and not settable from configuration
    pub fn is_read_only(&self) -> bool {
        self.computed && !self.optional
    }
}

/// Resource schema
#[derive(Debug, Clone)]
pub struct ResourceSchema {
    pub resource_type: String,
    pub attributes: HashMap<String, AttributeSchema>,
    pub description: Option<String>,
    /// Groups of attributes of which exactly one must be configured
    pub exactly_one_of: Vec<Vec<String>>,
}

impl ResourceSchema {
    pub fn new(resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            attributes: HashMap::new(),
            description: None,
            exactly_one_of: Vec::new(),
        }
    }

    pub fn attribute(mut self, schema: AttributeSchema) -> Self {
        self.attributes.insert(schema.name.clone(), schema);
        self
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    pub fn exactly_one_of(mut self, names: &[&str]) -> Self {
        self.exactly_one_of
            .push(names.iter().map(|n| n.to_string()).collect());
        self
    }

    pub fn get(&self, name: &str) -> Option<&AttributeSchema> {
        self.attributes.get(name)
    }

    /// Attribute names in a stable order
    pub fn attribute_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.attributes.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Validate resource attributes
    pub fn validate(&self, attributes: &HashMap<String, Value>) -> Result<(), Vec<TypeError>> {
        let errors = validate_attributes(
            self.attributes.values(),
            attributes,
            &self.exactly_one_of,
        );

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Fill in declared defaults for attributes absent from configuration
    pub fn apply_defaults(&self, attributes: &mut HashMap<String, Value>) {
        for (name, schema) in &self.attributes {
            if let Some(default) = &schema.default
                && !attributes.contains_key(name)
            {
                attributes.insert(name.clone(), default.clone());
            }
        }
    }

    /// Turn every attribute into a computed one, keeping `keep` configurable.
    /// Used to derive data source schemas from resource schemas.
    pub fn as_data_source(&self, name: impl Into<String>, keep: &[&str]) -> ResourceSchema {
        let mut schema = ResourceSchema::new(name);
        schema.description = self.description.clone();
        for attr in self.attributes.values() {
            let mut attr = attr.clone();
            attr.default = None;
            attr.force_new = false;
            attr.conflicts_with.clear();
            attr = if keep.contains(&attr.name.as_str()) {
                attr.optional_computed()
            } else {
                attr.computed()
            };
            schema = schema.attribute(attr);
        }
        schema
    }
}

fn validate_attributes<'a>(
    schemas: impl Iterator<Item = &'a AttributeSchema>,
    attributes: &HashMap<String, Value>,
    exactly_one_of: &[Vec<String>],
) -> Vec<TypeError> {
    let mut errors = Vec::new();
    let schemas: HashMap<&str, &AttributeSchema> = schemas.map(|s| (s.name.as_str(), s)).collect();

    // Check required attributes
    let mut names: Vec<&&str> = schemas.keys().collect();
    names.sort_unstable();
    for name in names {
        let schema = schemas[*name];
        if schema.required && !attributes.contains_key(*name) && schema.default.is_none() {
            errors.push(TypeError::MissingRequired {
                name: name.to_string(),
            });
        }
    }

    // Type check each attribute
    let mut conflicts = BTreeSet::new();
    let mut configured: Vec<&String> = attributes.keys().collect();
    configured.sort_unstable();
    for name in configured {
        let value = &attributes[name];
        let Some(schema) = schemas.get(name.as_str()) else {
            errors.push(TypeError::UnknownAttribute { name: name.clone() });
            continue;
        };

        if schema.is_read_only() {
            errors.push(TypeError::ComputedOnly { name: name.clone() });
            continue;
        }

        if let Err(e) = schema.attr_type.validate(value) {
            errors.push(TypeError::AttributeError {
                name: name.clone(),
                inner: Box::new(e),
            });
        }

        for other in &schema.conflicts_with {
            if attributes.contains_key(other) {
                let pair = if name < other {
                    (name.clone(), other.clone())
                } else {
                    (other.clone(), name.clone())
                };
                conflicts.insert(pair);
            }
        }
    }

    for (name, other) in conflicts {
        errors.push(TypeError::Conflict { name, other });
    }

    for group in exactly_one_of {
        let set: HashSet<&String> = group.iter().filter(|n| attributes.contains_key(*n)).collect();
        if set.len() != 1 {
            errors.push(TypeError::ExactlyOneOf {
                names: group.clone(),
            });
        }
    }

    errors
}

/// Serializable description of a schema, used to publish schemas to the declarative tool
#[derive(Debug, Clone, Serialize)]
pub struct SchemaDescription {
    pub description: Option<String>,
    pub attributes: Vec<AttributeDescription>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub exactly_one_of: Vec<Vec<String>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AttributeDescription {
    pub name: String,
    #[serde(rename = "type")]
    pub attr_type: String,
    pub required: bool,
    pub optional: bool,
    pub computed: bool,
    pub sensitive: bool,
    pub force_new: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub nested: Vec<AttributeDescription>,
}

impl From<&AttributeSchema> for AttributeDescription {
    fn from(attr: &AttributeSchema) -> Self {
        let nested = match &attr.attr_type {
            AttributeType::Block(inner) => inner.iter().map(Self::from).collect(),
            AttributeType::List(inner) | AttributeType::Set(inner) => match inner.as_ref() {
                AttributeType::Block(inner) => inner.iter().map(Self::from).collect(),
                _ => Vec::new(),
            },
            _ => Vec::new(),
        };
        Self {
            name: attr.name.clone(),
            attr_type: attr.attr_type.type_name(),
            required: attr.required,
            optional: attr.optional,
            computed: attr.computed,
            sensitive: attr.sensitive,
            force_new: attr.force_new,
            description: attr.description.clone(),
            nested,
        }
    }
}

impl From<&ResourceSchema> for SchemaDescription {
    fn from(schema: &ResourceSchema) -> Self {
        let attributes = schema
            .attribute_names()
            .into_iter()
            .filter_map(|n| schema.get(n))
            .map(AttributeDescription::from)
            .collect();
        Self {
            description: schema.description.clone(),
            attributes,
            exactly_one_of: schema.exactly_one_of.clone(),
        }
    }
}

/// Helper functions for common types
pub mod types {
    use super::*;

    fn string_check(value: &Value, check: fn(&str) -> Result<(), String>) -> Result<(), String> {
        match value {
            Value::String(s) => check(s),
            _ => Err("Expected string".to_string()),
        }
    }

    /// Positive integer type
    pub fn positive_int() -> AttributeType {
        AttributeType::Custom {
            name: "PositiveInt".to_string(),
            base: Box::new(AttributeType::Int),
            validate: |value| {
                if let Value::Int(n) = value {
                    if *n > 0 {
                        Ok(())
                    } else {
                        Err("Value must be positive".to_string())
                    }
                } else {
                    Err("Expected integer".to_string())
                }
            },
        }
    }

    /// Port number type (1-65535)
    pub fn port() -> AttributeType {
        AttributeType::Custom {
            name: "Port".to_string(),
            base: Box::new(AttributeType::Int),
            validate: |value| match value {
                Value::Int(n) => validation::validate_port(*n),
                _ => Err("Expected integer".to_string()),
            },
        }
    }

    /// CIDR block type (e.g., "10.0.0.0/16")
    pub fn cidr() -> AttributeType {
        AttributeType::Custom {
            name: "Cidr".to_string(),
            base: Box::new(AttributeType::String),
            validate: |value| string_check(value, validation::validate_cidr),
        }
    }

    /// IP address type
    pub fn ip() -> AttributeType {
        AttributeType::Custom {
            name: "IpAddress".to_string(),
            base: Box::new(AttributeType::String),
            validate: |value| string_check(value, validation::validate_ip),
        }
    }

    /// DNS hostname type
    pub fn hostname() -> AttributeType {
        AttributeType::Custom {
            name: "Hostname".to_string(),
            base: Box::new(AttributeType::String),
            validate: |value| string_check(value, validation::validate_hostname),
        }
    }

    /// Email address type
    pub fn email() -> AttributeType {
        AttributeType::Custom {
            name: "Email".to_string(),
            base: Box::new(AttributeType::String),
            validate: |value| string_check(value, validation::validate_email),
        }
    }

    /// ISO 3166-1 alpha-2 country code
    pub fn country_code() -> AttributeType {
        AttributeType::Custom {
            name: "CountryCode".to_string(),
            base: Box::new(AttributeType::String),
            validate: |value| string_check(value, validation::validate_country_code),
        }
    }

    /// http(s) URL
    pub fn url() -> AttributeType {
        AttributeType::Custom {
            name: "Url".to_string(),
            base: Box::new(AttributeType::String),
            validate: |value| string_check(value, validation::validate_url),
        }
    }

    /// Tags attached to an entity
    pub fn tags() -> AttributeType {
        AttributeType::map(AttributeType::String)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_string_type() {
        let t = AttributeType::String;
        assert!(t.validate(&Value::String("hello".to_string())).is_ok());
        assert!(t.validate(&Value::Int(42)).is_err());
    }

    #[test]
    fn validate_enum_type() {
        let t = AttributeType::enumeration(&["a", "b"]);
        assert!(t.validate(&Value::String("a".to_string())).is_ok());
        assert!(t.validate(&Value::String("c".to_string())).is_err());
    }

    #[test]
    fn validate_id_type() {
        let t = AttributeType::id("usr");
        assert!(t.validate(&Value::from("usr-abc123")).is_ok());
        assert!(t.validate(&Value::from("grp-abc123")).is_err());

        let either = AttributeType::Id(vec!["usr", "grp"]);
        assert!(either.validate(&Value::from("grp-abc123")).is_ok());
    }

    #[test]
    fn validate_positive_int() {
        let t = types::positive_int();
        assert!(t.validate(&Value::Int(1)).is_ok());
        assert!(t.validate(&Value::Int(100)).is_ok());
        assert!(t.validate(&Value::Int(0)).is_err());
        assert!(t.validate(&Value::Int(-1)).is_err());
    }

    #[test]
    fn validate_set_rejects_duplicates() {
        let t = AttributeType::set(AttributeType::id("rol"));
        assert!(t.validate(&Value::string_list(["rol-a", "rol-b"])).is_ok());
        let err = t
            .validate(&Value::string_list(["rol-a", "rol-a"]))
            .unwrap_err();
        assert!(matches!(err, TypeError::DuplicateSetMember { index: 1, .. }));
    }

    #[test]
    fn validate_block_checks_nested_attributes() {
        let t = AttributeType::Block(vec![
            AttributeSchema::new("proto", AttributeType::enumeration(&["tcp", "udp"])).required(),
            AttributeSchema::new("from_port", types::port()).required(),
        ]);
        let ok = Value::Map(HashMap::from([
            ("proto".to_string(), Value::from("tcp")),
            ("from_port".to_string(), Value::Int(443)),
        ]));
        assert!(t.validate(&ok).is_ok());

        let missing = Value::Map(HashMap::from([("proto".to_string(), Value::from("tcp"))]));
        assert!(matches!(
            t.validate(&missing),
            Err(TypeError::MissingRequired { .. })
        ));
    }

    #[test]
    fn validate_resource_schema() {
        let schema = ResourceSchema::new("resource")
            .attribute(AttributeSchema::new("name", AttributeType::String).required())
            .attribute(AttributeSchema::new("count", types::positive_int()))
            .attribute(AttributeSchema::new("enabled", AttributeType::Bool));

        let mut attrs = HashMap::new();
        attrs.insert("name".to_string(), Value::String("my-resource".to_string()));
        attrs.insert("count".to_string(), Value::Int(5));
        attrs.insert("enabled".to_string(), Value::Bool(true));

        assert!(schema.validate(&attrs).is_ok());
    }

    #[test]
    fn missing_required_attribute() {
        let schema = ResourceSchema::new("group")
            .attribute(AttributeSchema::new("name", AttributeType::String).required());

        let attrs = HashMap::new();
        let result = schema.validate(&attrs);
        assert!(result.is_err());
    }

    #[test]
    fn computed_attribute_cannot_be_configured() {
        let schema = ResourceSchema::new("group")
            .attribute(AttributeSchema::new("name", AttributeType::String).required())
            .attribute(AttributeSchema::new("users", AttributeType::list(AttributeType::String)).computed());

        let attrs = HashMap::from([
            ("name".to_string(), Value::from("admins")),
            ("users".to_string(), Value::string_list(["usr-a"])),
        ]);
        let errors = schema.validate(&attrs).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(matches!(&errors[0], TypeError::ComputedOnly { name } if name == "users"));
    }

    #[test]
    fn unknown_and_conflicting_attributes() {
        let schema = ResourceSchema::new("network_element")
            .attribute(
                AttributeSchema::new("mapped_subnets", AttributeType::list(types::cidr()))
                    .conflicts_with(&["mapped_service"]),
            )
            .attribute(
                AttributeSchema::new("mapped_service", types::hostname())
                    .conflicts_with(&["mapped_subnets"]),
            );

        let attrs = HashMap::from([
            ("mapped_subnets".to_string(), Value::string_list(["10.0.0.0/8"])),
            ("mapped_service".to_string(), Value::from("db.internal")),
            ("bogus".to_string(), Value::Bool(true)),
        ]);
        let errors = schema.validate(&attrs).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().any(|e| matches!(e, TypeError::UnknownAttribute { .. })));
        assert!(errors.iter().any(|e| matches!(e, TypeError::Conflict { .. })));
    }

    #[test]
    fn exactly_one_of_group() {
        let schema = ResourceSchema::new("app")
            .attribute(AttributeSchema::new("saml_config", AttributeType::Block(vec![])))
            .attribute(AttributeSchema::new("oidc_config", AttributeType::Block(vec![])))
            .exactly_one_of(&["saml_config", "oidc_config"]);

        let none = HashMap::new();
        assert!(schema.validate(&none).is_err());

        let one = HashMap::from([("saml_config".to_string(), Value::Map(HashMap::new()))]);
        assert!(schema.validate(&one).is_ok());

        let both = HashMap::from([
            ("saml_config".to_string(), Value::Map(HashMap::new())),
            ("oidc_config".to_string(), Value::Map(HashMap::new())),
        ]);
        assert!(schema.validate(&both).is_err());
    }

    #[test]
    fn validate_cidr_type() {
        let t = types::cidr();

        assert!(t.validate(&Value::String("10.0.0.0/16".to_string())).is_ok());
        assert!(t.validate(&Value::String("0.0.0.0/0".to_string())).is_ok());
        assert!(t.validate(&Value::String("10.0.0.0".to_string())).is_err());
        assert!(t.validate(&Value::Int(42)).is_err()); // wrong type
    }

    #[test]
    fn data_source_schema_is_computed_except_lookup_keys() {
        let schema = ResourceSchema::new("user")
            .attribute(AttributeSchema::new("email", types::email()).required())
            .attribute(AttributeSchema::new("given_name", AttributeType::String).required());
        let ds = schema.as_data_source("user", &["email"]);

        assert!(!ds.get("email").unwrap().is_read_only());
        assert!(ds.get("given_name").unwrap().is_read_only());
    }
}
