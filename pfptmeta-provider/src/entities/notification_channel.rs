//! Delivery settings of a notification channel
//!
//! Sent adjacently tagged: `"type": "slack", "config": {...}`. Secrets are
//! write-only, so reads keep the value from state.

use std::collections::{BTreeMap, HashMap};

use pfptmeta_core::resource::Value;
use serde::{Deserialize, Serialize};

use super::{Body, NestedError, decode, field, fit_block, from_attribute, to_attribute, to_json};

pub const BLOCKS: &[&str] = &[
    "email_config",
    "slack_config",
    "webhook_config",
    "pagerduty_config",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailConfig {
    pub recipients: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlackConfig {
    pub channel: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookConfig {
    pub uri: String,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagerDutyConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "config", rename_all = "lowercase")]
pub enum ChannelConfig {
    Email(EmailConfig),
    Slack(SlackConfig),
    Webhook(WebhookConfig),
    Pagerduty(PagerDutyConfig),
}

impl ChannelConfig {
    pub fn block_name(&self) -> &'static str {
        match self {
            ChannelConfig::Email(_) => "email_config",
            ChannelConfig::Slack(_) => "slack_config",
            ChannelConfig::Webhook(_) => "webhook_config",
            ChannelConfig::Pagerduty(_) => "pagerduty_config",
        }
    }

    pub fn from_attributes(attrs: &HashMap<String, Value>) -> Result<Self, NestedError> {
        let mut found = Vec::new();
        if let Some(c) = from_attribute(attrs, "email_config")? {
            found.push(ChannelConfig::Email(c));
        }
        if let Some(c) = from_attribute(attrs, "slack_config")? {
            found.push(ChannelConfig::Slack(c));
        }
        if let Some(c) = from_attribute(attrs, "webhook_config")? {
            found.push(ChannelConfig::Webhook(c));
        }
        if let Some(c) = from_attribute(attrs, "pagerduty_config")? {
            found.push(ChannelConfig::Pagerduty(c));
        }

        match found.len() {
            1 => Ok(found.remove(0)),
            _ => Err(NestedError::invalid(
                "email_config",
                format!("exactly one of {} must be set", BLOCKS.join(", ")),
            )),
        }
    }

    fn inner_attribute(&self) -> Result<Value, NestedError> {
        let name = self.block_name();
        match self {
            ChannelConfig::Email(c) => to_attribute(name, c),
            ChannelConfig::Slack(c) => to_attribute(name, c),
            ChannelConfig::Webhook(c) => to_attribute(name, c),
            ChannelConfig::Pagerduty(c) => to_attribute(name, c),
        }
    }
}

pub fn write(attrs: &HashMap<String, Value>, body: &mut Body) -> Result<(), NestedError> {
    let channel = ChannelConfig::from_attributes(attrs)?;
    if let serde_json::Value::Object(fields) = to_json(channel.block_name(), &channel)? {
        body.extend(fields);
    }
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
    let (Some(kind), Some(config)) = (field(props, "type"), field(props, "config")) else {
        return Ok(());
    };

    let tagged = serde_json::json!({"type": kind, "config": config});
    let channel: ChannelConfig = decode("config", tagged)?;
    let name = channel.block_name();
    let value = fit_block(channel.inner_attribute()?, prior.get(name));
    attrs.insert(name.to_string(), value);
    Ok(())
}
