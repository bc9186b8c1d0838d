//! Messages exchanged with the declarative tool over stdio
//!
//! One JSON request per line on stdin, one JSON response per line on stdout.
//! Responses carry the `id` of their request and may arrive out of order.

use std::collections::HashMap;

use pfptmeta_core::provider::ProviderError;
use pfptmeta_core::resource::{ResourceId, State, Value};
use pfptmeta_provider::ApiError;
use serde::{Deserialize, Serialize};

/// First line written on stdout, before any response
pub const HANDSHAKE: &str = "PFPTMETA_PROVIDER|1|stdio";

#[derive(Debug, Deserialize)]
pub struct Request {
    #[serde(default)]
    pub id: serde_json::Value,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

#[derive(Debug, Serialize)]
pub struct Response {
    pub id: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

impl Response {
    pub fn ok(id: serde_json::Value, result: serde_json::Value) -> Self {
        Self {
            id,
            result: Some(result),
            diagnostics: Vec::new(),
        }
    }

    pub fn failed(id: serde_json::Value, diagnostics: Vec<Diagnostic>) -> Self {
        Self {
            id,
            result: None,
            diagnostics,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Attribute path the problem refers to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
}

impl Diagnostic {
    pub fn error(summary: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            summary: summary.into(),
            detail: None,
            attribute: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attribute = Some(attribute.into());
        self
    }
}

/// Diagnostics for a provider error: one per invalid attribute, or a single
/// one carrying the API's response body as detail.
pub fn diagnostics(err: &ProviderError) -> Vec<Diagnostic> {
    if !err.validation.is_empty() {
        return err
            .validation
            .iter()
            .map(|e| {
                let diag = Diagnostic::error(e.to_string());
                match e.attribute() {
                    Some(attribute) => diag.with_attribute(attribute),
                    None => diag,
                }
            })
            .collect();
    }

    let mut diag = Diagnostic::error(err.to_string());
    if let Some(ApiError::Status { body, .. }) = err.cause.as_ref().and_then(|c| c.downcast_ref::<ApiError>())
        && !body.is_empty()
    {
        diag = diag.with_detail(body.clone());
    }
    vec![diag]
}

/// A resource's state as exchanged with the tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub attributes: HashMap<String, Value>,
}

impl WireState {
    pub fn into_state(self, id: ResourceId) -> State {
        let state = State::existing(id, self.attributes);
        match self.id {
            Some(identifier) => state.with_identifier(identifier),
            None => state,
        }
    }

    /// `None` for a state that does not exist
    pub fn from_state(state: State) -> Option<Self> {
        state.exists.then_some(Self {
            id: state.identifier,
            attributes: state.attributes,
        })
    }
}

/// Which block a request is about
#[derive(Debug, Deserialize)]
pub struct Target {
    pub type_name: String,
    #[serde(default = "default_name")]
    pub name: String,
}

fn default_name() -> String {
    "this".to_string()
}

impl Target {
    pub fn resource_id(&self) -> ResourceId {
        ResourceId::new(&self.type_name, &self.name)
    }
}
