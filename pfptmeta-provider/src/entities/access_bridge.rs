//! SIEM exporter of an access bridge, sent as an internally tagged
//! `siem_config` object.

use std::collections::HashMap;

use pfptmeta_core::resource::Value;
use serde::{Deserialize, Serialize};

use super::{Body, NestedError, decode, field, fit_block, from_attribute, to_attribute, to_json};

pub const BLOCKS: &[&str] = &["splunk_http_config", "qradar_http_config", "syslog_config"];

const WIRE_FIELD: &str = "siem_config";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplunkHttp {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verify_ssl: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publicly_accessible: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QradarHttp {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyslogProto {
    Tcp,
    Udp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Syslog {
    pub host: String,
    pub port: u16,
    pub proto: SyslogProto,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SiemConfig {
    SplunkHttp(SplunkHttp),
    QradarHttp(QradarHttp),
    Syslog(Syslog),
}

impl SiemConfig {
    pub fn block_name(&self) -> &'static str {
        match self {
            SiemConfig::SplunkHttp(_) => "splunk_http_config",
            SiemConfig::QradarHttp(_) => "qradar_http_config",
            SiemConfig::Syslog(_) => "syslog_config",
        }
    }

    pub fn from_attributes(attrs: &HashMap<String, Value>) -> Result<Self, NestedError> {
        let splunk = from_attribute(attrs, "splunk_http_config")?.map(SiemConfig::SplunkHttp);
        let qradar = from_attribute(attrs, "qradar_http_config")?.map(SiemConfig::QradarHttp);
        let syslog = from_attribute(attrs, "syslog_config")?.map(SiemConfig::Syslog);

        match (splunk, qradar, syslog) {
            (Some(c), None, None) | (None, Some(c), None) | (None, None, Some(c)) => Ok(c),
            _ => Err(NestedError::invalid(
                WIRE_FIELD,
                format!("exactly one of {} must be set", BLOCKS.join(", ")),
            )),
        }
    }

    fn inner_attribute(&self) -> Result<Value, NestedError> {
        let name = self.block_name();
        match self {
            SiemConfig::SplunkHttp(c) => to_attribute(name, c),
            SiemConfig::QradarHttp(c) => to_attribute(name, c),
            SiemConfig::Syslog(c) => to_attribute(name, c),
        }
    }
}

pub fn write(attrs: &HashMap<String, Value>, body: &mut Body) -> Result<(), NestedError> {
    let siem = SiemConfig::from_attributes(attrs)?;
    body.insert(WIRE_FIELD.to_string(), to_json(WIRE_FIELD, &siem)?);
    Ok(())
}

pub fn read(
    props: &serde_json::Value,
    prior: &HashMap<String, Value>,
    attrs: &mut HashMap<String, Value>,
) -> Result<(), NestedError> {
    for block in BLOCKS {
        attrs.remove(*block);
    }
    let Some(json) = field(props, WIRE_FIELD) else {
        return Ok(());
    };

    let siem: SiemConfig = decode(WIRE_FIELD, json.clone())?;
    let name = siem.block_name();
    let value = fit_block(siem.inner_attribute()?, prior.get(name));
    attrs.insert(name.to_string(), value);
    Ok(())
}
