//! Differ - Compare desired configuration with current state
//!
//! Compares the desired attributes declared in configuration with the current
//! state held by the declarative tool, and decides whether the resource must be
//! created, updated in place, replaced, or left alone.

use std::collections::HashMap;

use crate::mapper::normalize_set;
use crate::resource::{Resource, ResourceId, State, Value};
use crate::schema::{AttributeType, ResourceSchema};

/// Result of a diff operation
#[derive(Debug, Clone, PartialEq)]
pub enum Diff {
    /// Resource does not exist -> needs creation
    Create(Resource),
    /// Resource exists with differences -> needs update
    Update {
        id: ResourceId,
        changed_attributes: Vec<String>,
    },
    /// A force-new attribute changed -> delete and recreate
    Replace {
        id: ResourceId,
        attributes: Vec<String>,
    },
    /// Resource exists with no differences -> no action needed
    NoChange(ResourceId),
}

impl Diff {
    /// Returns whether this Diff involves a change
    pub fn is_change(&self) -> bool {
        !matches!(self, Diff::NoChange(_))
    }
}

/// Compare desired state with current state to compute a Diff
pub fn diff(schema: &ResourceSchema, desired: &Resource, current: &State) -> Diff {
    if !current.exists {
        return Diff::Create(desired.clone());
    }

    let changed = changed_attributes(schema, &desired.attributes, &current.attributes);
    let replace: Vec<String> = changed
        .iter()
        .filter(|name| schema.get(name).is_some_and(|a| a.force_new))
        .cloned()
        .collect();

    if !replace.is_empty() {
        Diff::Replace {
            id: desired.id.clone(),
            attributes: replace,
        }
    } else if changed.is_empty() {
        Diff::NoChange(desired.id.clone())
    } else {
        Diff::Update {
            id: desired.id.clone(),
            changed_attributes: changed,
        }
    }
}

/// Find configurable attributes whose desired value differs from the current one.
///
/// Sets compare without regard to order. An attribute absent from configuration
/// counts as changed when it is present in the current state, unless the API
/// computes it.
pub fn changed_attributes(
    schema: &ResourceSchema,
    desired: &HashMap<String, Value>,
    current: &HashMap<String, Value>,
) -> Vec<String> {
    let mut changed = Vec::new();

    for name in schema.attribute_names() {
        let attr = &schema.attributes[name];
        if attr.is_read_only() {
            continue;
        }

        match (desired.get(name), current.get(name)) {
            (Some(d), Some(c)) if values_equal(&attr.attr_type, d, c) => {}
            (None, None) => {}
            (None, Some(_)) if attr.computed => {}
            (None, Some(c)) if is_empty(c) => {}
            _ => changed.push(name.to_string()),
        }
    }

    changed
}

/// Compare two values the way their declared type says, so that set members
/// and nested blocks compare without regard to order.
fn values_equal(attr_type: &AttributeType, a: &Value, b: &Value) -> bool {
    match (attr_type.base(), a, b) {
        (AttributeType::Set(_), Value::List(x), Value::List(y)) => {
            let mut x = x.clone();
            let mut y = y.clone();
            normalize_set(&mut x);
            normalize_set(&mut y);
            x == y
        }
        (AttributeType::List(inner), Value::List(x), Value::List(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(a, b)| values_equal(inner, a, b))
        }
        (AttributeType::Block(attrs), Value::Map(x), Value::Map(y)) => {
            attrs.iter().all(|attr| match (x.get(&attr.name), y.get(&attr.name)) {
                (Some(a), Some(b)) => values_equal(&attr.attr_type, a, b),
                (None, None) => true,
                _ => false,
            })
        }
        _ => a == b,
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::List(items) => items.is_empty(),
        Value::Map(map) => map.is_empty(),
        _ => false,
    }
}

/// Planned state for a resource plus the attributes that force replacement
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    pub planned: HashMap<String, Value>,
    pub requires_replace: Vec<String>,
    pub changed: Vec<String>,
}

/// Merge desired configuration with prior computed values.
///
/// Computed attributes keep their prior value unless the resource is replaced,
/// in which case they are left out of the planned state for the API to fill in.
pub fn plan(schema: &ResourceSchema, desired: &Resource, prior: &State) -> Plan {
    let mut planned = desired.attributes.clone();
    schema.apply_defaults(&mut planned);

    let d = diff(
        schema,
        &Resource {
            attributes: planned.clone(),
            ..desired.clone()
        },
        prior,
    );

    let (changed, requires_replace) = match &d {
        Diff::Create(_) => (planned.keys().cloned().collect(), Vec::new()),
        Diff::Update {
            changed_attributes, ..
        } => (changed_attributes.clone(), Vec::new()),
        Diff::Replace { attributes, .. } => (
            changed_attributes(schema, &planned, &prior.attributes),
            attributes.clone(),
        ),
        Diff::NoChange(_) => (Vec::new(), Vec::new()),
    };

    if prior.exists && requires_replace.is_empty() {
        for (name, attr) in &schema.attributes {
            if attr.computed
                && !planned.contains_key(name)
                && let Some(value) = prior.attributes.get(name)
            {
                planned.insert(name.clone(), value.clone());
            }
        }
    }

    let mut changed = changed;
    changed.sort();

    Plan {
        planned,
        requires_replace,
        changed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::AttributeSchema;

    fn schema() -> ResourceSchema {
        ResourceSchema::new("tunnel")
            .attribute(AttributeSchema::new("id", AttributeType::id("tun")).computed())
            .attribute(AttributeSchema::new("name", AttributeType::String).required())
            .attribute(AttributeSchema::new("description", AttributeType::String))
            .attribute(AttributeSchema::new("enabled", AttributeType::Bool).optional_computed())
            .attribute(AttributeSchema::new(
                "source_ips",
                AttributeType::set(AttributeType::String),
            ))
            .attribute(AttributeSchema::new("region", AttributeType::String).force_new())
    }

    fn current(attrs: &[(&str, Value)]) -> State {
        State::existing(
            ResourceId::new("tunnel", "t"),
            attrs
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        )
    }

    #[test]
    fn diff_create_when_not_exists() {
        let desired = Resource::new("tunnel", "t");
        let current = State::not_found(ResourceId::new("tunnel", "t"));

        let result = diff(&schema(), &desired, &current);
        assert!(matches!(result, Diff::Create(_)));
    }

    #[test]
    fn diff_no_change_when_same() {
        let desired = Resource::new("tunnel", "t").with_attribute("name", "edge");
        let state = current(&[
            ("id", Value::from("tun-1")),
            ("name", Value::from("edge")),
            ("enabled", Value::Bool(true)),
        ]);

        let result = diff(&schema(), &desired, &state);
        assert!(matches!(result, Diff::NoChange(_)));
    }

    #[test]
    fn diff_update_when_different() {
        let desired = Resource::new("tunnel", "t")
            .with_attribute("name", "edge-2")
            .with_attribute("description", "x");
        let state = current(&[("name", Value::from("edge")), ("description", Value::from("x"))]);

        match diff(&schema(), &desired, &state) {
            Diff::Update {
                changed_attributes, ..
            } => {
                assert_eq!(changed_attributes, vec!["name".to_string()]);
            }
            other => panic!("Expected Update, got {:?}", other),
        }
    }

    #[test]
    fn removed_attribute_counts_as_change() {
        let desired = Resource::new("tunnel", "t").with_attribute("name", "edge");
        let state = current(&[("name", Value::from("edge")), ("description", Value::from("x"))]);

        let changed = changed_attributes(&schema(), &desired.attributes, &state.attributes);
        assert_eq!(changed, vec!["description".to_string()]);
    }

    #[test]
    fn sets_compare_without_order() {
        let desired = Resource::new("tunnel", "t")
            .with_attribute("name", "edge")
            .with_attribute("source_ips", Value::string_list(["1.1.1.1", "2.2.2.2"]));
        let state = current(&[
            ("name", Value::from("edge")),
            ("source_ips", Value::string_list(["2.2.2.2", "1.1.1.1"])),
        ]);

        assert!(!diff(&schema(), &desired, &state).is_change());
    }

    #[test]
    fn nested_block_sets_compare_without_order() {
        let schema = ResourceSchema::new("tunnel").attribute(AttributeSchema::new(
            "gre_config",
            AttributeType::Block(vec![AttributeSchema::new(
                "source_ips",
                AttributeType::set(AttributeType::String),
            )]),
        ));
        let block = |ips: [&str; 2]| {
            Value::Map(HashMap::from([(
                "source_ips".to_string(),
                Value::string_list(ips),
            )]))
        };
        let desired = HashMap::from([("gre_config".to_string(), block(["1.1.1.1", "2.2.2.2"]))]);
        let current = HashMap::from([("gre_config".to_string(), block(["2.2.2.2", "1.1.1.1"]))]);
        assert!(changed_attributes(&schema, &desired, &current).is_empty());

        let moved = HashMap::from([("gre_config".to_string(), block(["2.2.2.2", "3.3.3.3"]))]);
        assert_eq!(
            changed_attributes(&schema, &desired, &moved),
            vec!["gre_config".to_string()]
        );
    }

    #[test]
    fn force_new_attribute_requires_replace() {
        let desired = Resource::new("tunnel", "t")
            .with_attribute("name", "edge")
            .with_attribute("region", "eu");
        let state = current(&[("name", Value::from("edge")), ("region", Value::from("us"))]);

        let p = plan(&schema(), &desired, &state);
        assert_eq!(p.requires_replace, vec!["region".to_string()]);
        assert!(!p.planned.contains_key("id"));
    }

    #[test]
    fn plan_carries_prior_computed_values() {
        let desired = Resource::new("tunnel", "t").with_attribute("name", "edge-2");
        let state = current(&[
            ("id", Value::from("tun-1")),
            ("name", Value::from("edge")),
            ("enabled", Value::Bool(true)),
        ]);

        let p = plan(&schema(), &desired, &state);
        assert_eq!(p.changed, vec!["name".to_string()]);
        assert_eq!(p.planned.get("id"), Some(&Value::from("tun-1")));
        assert_eq!(p.planned.get("enabled"), Some(&Value::Bool(true)));
        assert_eq!(p.planned.get("name"), Some(&Value::from("edge-2")));
    }
}
