//! Port ranges of a protocol group

use std::collections::HashMap;

use pfptmeta_core::resource::Value;
use serde::{Deserialize, Serialize};

use super::{Body, NestedError, decode, field, from_attribute, to_attribute, to_json};

const ATTRIBUTE: &str = "protocols";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Proto {
    Tcp,
    Udp,
    Icmp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Protocol {
    pub from_port: u16,
    pub to_port: u16,
    pub proto: Proto,
}

pub fn write(attrs: &HashMap<String, Value>, body: &mut Body) -> Result<(), NestedError> {
    let protocols: Vec<Protocol> = from_attribute(attrs, ATTRIBUTE)?.unwrap_or_default();
    for (i, p) in protocols.iter().enumerate() {
        if p.from_port > p.to_port {
            return Err(NestedError::invalid(
                ATTRIBUTE,
                format!(
                    "item {i}: from_port {} is greater than to_port {}",
                    p.from_port, p.to_port
                ),
            ));
        }
    }
    body.insert(ATTRIBUTE.to_string(), to_json(ATTRIBUTE, &protocols)?);
    Ok(())
}

pub fn read(props: &serde_json::Value, attrs: &mut HashMap<String, Value>) -> Result<(), NestedError> {
    match field(props, ATTRIBUTE) {
        Some(json) => {
            let protocols: Vec<Protocol> = decode(ATTRIBUTE, json.clone())?;
            attrs.insert(ATTRIBUTE.to_string(), to_attribute(ATTRIBUTE, &protocols)?);
        }
        None => {
            attrs.remove(ATTRIBUTE);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn protocol(from: i64, to: i64, proto: &str) -> Value {
        Value::Map(HashMap::from([
            ("from_port".to_string(), Value::Int(from)),
            ("to_port".to_string(), Value::Int(to)),
            ("proto".to_string(), Value::from(proto)),
        ]))
    }

    #[test]
    fn writes_typed_protocol_list() {
        let attrs = HashMap::from([(
            "protocols".to_string(),
            Value::List(vec![protocol(443, 443, "tcp"), protocol(53, 53, "udp")]),
        )]);
        let mut body = Body::new();
        write(&attrs, &mut body).unwrap();
        assert_eq!(
            body.get("protocols"),
            Some(&json!([
                {"from_port": 443, "to_port": 443, "proto": "tcp"},
                {"from_port": 53, "to_port": 53, "proto": "udp"}
            ]))
        );
    }

    #[test]
    fn rejects_inverted_port_range() {
        let attrs = HashMap::from([(
            "protocols".to_string(),
            Value::List(vec![protocol(8080, 80, "tcp")]),
        )]);
        let err = write(&attrs, &mut Body::new()).unwrap_err();
        assert!(err.to_string().contains("greater than"));
    }

    #[test]
    fn reads_protocols_back() {
        let props = json!({"protocols": [{"from_port": 22, "to_port": 22, "proto": "tcp"}]});
        let mut attrs = HashMap::new();
        read(&props, &mut attrs).unwrap();
        assert_eq!(
            attrs.get("protocols"),
            Some(&Value::List(vec![protocol(22, 22, "tcp")]))
        );
    }
}
