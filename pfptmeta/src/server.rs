//! Provider server
//!
//! Reads requests from stdin and answers each one from its own task, so a
//! slow API call does not hold up the others. A single writer task owns
//! stdout and writes responses as they complete.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use log::{debug, info, warn};
use pfptmeta_core::differ::plan;
use pfptmeta_core::provider::{Provider, ProviderError, ResourceKind};
use pfptmeta_core::resource::{Resource, State, Value};
use pfptmeta_core::schema::{ResourceSchema, SchemaDescription};
use pfptmeta_provider::config::provider_schema;
use pfptmeta_provider::resources::{data_source_types, resource_types};
use pfptmeta_provider::{MetaProvider, ProviderConfig, validate_resource};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::{OnceCell, mpsc};
use tokio::task::JoinSet;

use crate::protocol::{
    Diagnostic, HANDSHAKE, Request, Response, Severity, Target, WireState, diagnostics,
};
use crate::redact;

type Attributes = HashMap<String, Value>;

#[derive(Deserialize)]
struct ConfigureParams {
    #[serde(default)]
    config: Attributes,
}

#[derive(Deserialize)]
struct ConfigParams {
    #[serde(flatten)]
    target: Target,
    #[serde(default)]
    config: Attributes,
}

#[derive(Deserialize)]
struct PlanParams {
    #[serde(flatten)]
    target: Target,
    /// `None` when the block was removed from configuration
    config: Option<Attributes>,
    #[serde(default)]
    prior_state: Option<WireState>,
}

#[derive(Deserialize)]
struct StateParams {
    #[serde(flatten)]
    target: Target,
    state: WireState,
}

#[derive(Deserialize)]
struct UpdateParams {
    #[serde(flatten)]
    target: Target,
    prior_state: WireState,
    config: Attributes,
}

#[derive(Deserialize)]
struct ImportParams {
    #[serde(flatten)]
    target: Target,
    id: String,
}

/// Outcome of one request
type Handled = Result<serde_json::Value, Vec<Diagnostic>>;

fn failed(err: ProviderError) -> Vec<Diagnostic> {
    diagnostics(&err)
}

fn params<T: DeserializeOwned>(raw: serde_json::Value) -> Result<T, Vec<Diagnostic>> {
    serde_json::from_value(raw)
        .map_err(|e| vec![Diagnostic::error("Malformed request parameters").with_detail(e.to_string())])
}

fn state_json(state: State) -> serde_json::Value {
    json!(WireState::from_state(state))
}

/// Provider, resource and data source schemas in one document
pub fn schema_document() -> serde_json::Value {
    let describe = |types: Vec<Box<dyn pfptmeta_core::provider::ResourceType>>| {
        types
            .into_iter()
            .map(|t| (t.name(), SchemaDescription::from(&t.schema())))
            .collect::<BTreeMap<_, _>>()
    };
    json!({
        "provider": SchemaDescription::from(&provider_schema()),
        "resources": describe(resource_types()),
        "data_sources": describe(data_source_types()),
    })
}

pub struct Server {
    provider: OnceCell<Box<dyn Provider>>,
}

impl Default for Server {
    fn default() -> Self {
        Self::new()
    }
}

impl Server {
    pub fn new() -> Self {
        Self {
            provider: OnceCell::new(),
        }
    }

    /// A server whose provider is already configured
    #[cfg(test)]
    pub fn with_provider(provider: Box<dyn Provider>) -> Self {
        Self {
            provider: OnceCell::new_with(Some(provider)),
        }
    }

    fn provider(&self) -> Result<&dyn Provider, Vec<Diagnostic>> {
        self.provider.get().map(|p| p.as_ref()).ok_or_else(|| {
            vec![Diagnostic::error("Provider is not configured")
                .with_detail("Send `configure` before managing resources")]
        })
    }

    pub async fn handle(&self, request: Request) -> Response {
        debug!("<- {} {}", request.method, request.id);
        let result = match request.method.as_str() {
            "get_schema" => Ok(schema_document()),
            "configure" => self.configure(request.params).await,
            "validate_resource_config" => self.validate_resource_config(request.params),
            "plan_resource_change" => self.plan_resource_change(request.params),
            "create" => self.create(request.params).await,
            "read" => self.read(request.params).await,
            "update" => self.update(request.params).await,
            "delete" => self.delete(request.params).await,
            "import_resource_state" => self.import(request.params).await,
            "read_data_source" => self.read_data_source(request.params).await,
            "stop" => Ok(serde_json::Value::Null),
            other => Err(vec![Diagnostic::error(format!("Unknown method '{}'", other))]),
        };

        match result {
            Ok(result) => Response::ok(request.id, result),
            Err(diagnostics) => Response::failed(request.id, diagnostics),
        }
    }

    async fn configure(&self, raw: serde_json::Value) -> Handled {
        let ConfigureParams { config } = params(raw)?;
        if self.provider.initialized() {
            warn!("configure received twice; keeping the first configuration");
            return Err(vec![Diagnostic {
                severity: Severity::Warning,
                ..Diagnostic::error("Provider is already configured")
            }]);
        }

        let config = ProviderConfig::load(&config).map_err(|e| {
            vec![Diagnostic::error("Invalid provider configuration").with_detail(e.to_string())]
        })?;
        let provider = MetaProvider::connect(config).await.map_err(failed)?;
        // A concurrent configure may have won the race; either provider is fine
        let _ = self.provider.set(Box::new(provider));
        info!("Provider configured");
        Ok(serde_json::Value::Null)
    }

    fn validate_resource_config(&self, raw: serde_json::Value) -> Handled {
        let ConfigParams { target, config } = params(raw)?;
        let resource = Resource::new(&target.type_name, &target.name).with_attributes(config);
        validate_resource(&resource).map_err(failed)?;
        Ok(serde_json::Value::Null)
    }

    fn plan_resource_change(&self, raw: serde_json::Value) -> Handled {
        let PlanParams {
            target,
            config,
            prior_state,
        } = params(raw)?;
        let id = target.resource_id();

        let Some(config) = config else {
            return Ok(json!({ "planned_state": null, "requires_replace": [], "changed": [] }));
        };

        let resource = Resource::new(&target.type_name, &target.name).with_attributes(config);
        validate_resource(&resource).map_err(failed)?;
        let schema = resource_types()
            .into_iter()
            .find(|t| t.name() == target.type_name)
            .map(|t| t.schema())
            .ok_or_else(|| vec![Diagnostic::error(format!("Unknown resource type: {}", target.type_name))])?;

        let prior = match prior_state {
            Some(wire) => wire.into_state(id.clone()),
            None => State::not_found(id),
        };
        let plan = plan(&schema, &resource, &prior);
        Ok(json!({
            "planned_state": plan.planned,
            "requires_replace": plan.requires_replace,
            "changed": plan.changed,
        }))
    }

    async fn create(&self, raw: serde_json::Value) -> Handled {
        let ConfigParams { target, config } = params(raw)?;
        let provider = self.provider()?;
        let resource = Resource::new(&target.type_name, &target.name).with_attributes(config);
        let state = provider.create(&resource).await.map_err(failed)?;
        Ok(state_json(state))
    }

    async fn read(&self, raw: serde_json::Value) -> Handled {
        let StateParams { target, state } = params(raw)?;
        let provider = self.provider()?;
        let current = state.into_state(target.resource_id());
        let state = provider.read(&current).await.map_err(failed)?;
        Ok(state_json(state))
    }

    async fn update(&self, raw: serde_json::Value) -> Handled {
        let UpdateParams {
            target,
            prior_state,
            config,
        } = params(raw)?;
        let provider = self.provider()?;
        let from = prior_state.into_state(target.resource_id());
        let identifier = from.identifier.clone().ok_or_else(|| {
            vec![Diagnostic::error("Prior state has no id").with_attribute("id")]
        })?;
        let to = Resource::new(&target.type_name, &target.name).with_attributes(config);
        let state = provider.update(&identifier, &from, &to).await.map_err(failed)?;
        Ok(state_json(state))
    }

    async fn delete(&self, raw: serde_json::Value) -> Handled {
        let StateParams { target, state } = params(raw)?;
        let provider = self.provider()?;
        let current = state.into_state(target.resource_id());
        provider.delete(&current).await.map_err(failed)?;
        Ok(serde_json::Value::Null)
    }

    async fn import(&self, raw: serde_json::Value) -> Handled {
        let ImportParams { target, id } = params(raw)?;
        let provider = self.provider()?;
        if provider
            .schema_for(&target.type_name, ResourceKind::Managed)
            .is_none()
        {
            return Err(vec![Diagnostic::error(format!(
                "Unknown resource type: {}",
                target.type_name
            ))]);
        }
        let state = provider
            .import(&target.resource_id(), &id)
            .await
            .map_err(failed)?;
        if !state.exists {
            return Err(vec![Diagnostic::error(format!(
                "Cannot import {}: no such object",
                id
            ))]);
        }
        Ok(state_json(state))
    }

    async fn read_data_source(&self, raw: serde_json::Value) -> Handled {
        let ConfigParams { target, config } = params(raw)?;
        let provider = self.provider()?;
        let resource = Resource::new(&target.type_name, &target.name)
            .with_attributes(config)
            .with_read_only(true);
        let state = provider.read_data_source(&resource).await.map_err(failed)?;
        Ok(state_json(state))
    }
}

/// Log a request with its secrets masked; returns the schema used, for the response
fn log_request(request: &Request) -> anyhow::Result<Option<ResourceSchema>> {
    let schema = redact::request_schema(&request.method, &request.params);
    match &schema {
        Some(schema) => debug!(
            "<- {} {}",
            request.method,
            serde_json::to_string_pretty(&redact::redacted(schema, &request.params))?
        ),
        None if redact::carries_attributes(&request.params) => {
            debug!("<- {} (unknown type, params not shown)", request.method)
        }
        None => debug!(
            "<- {} {}",
            request.method,
            serde_json::to_string_pretty(&request.params)?
        ),
    }
    Ok(schema)
}

fn log_response(response: &Response, schema: Option<&ResourceSchema>) {
    let result = match (&response.result, schema) {
        (Some(result), Some(schema)) => redact::redacted(schema, result),
        (Some(_), None) => json!("<not shown>"),
        (None, _) => serde_json::Value::Null,
    };
    let diagnostics = serde_json::to_value(&response.diagnostics).unwrap_or_default();
    let logged = json!({"id": response.id, "result": result, "diagnostics": diagnostics});
    debug!(
        "-> {}",
        serde_json::to_string_pretty(&logged).unwrap_or_else(|_| logged.to_string())
    );
}

/// Serve requests on stdin until `stop` or end of input
pub async fn serve(debug: bool) -> anyhow::Result<()> {
    let server = Arc::new(Server::new());

    let mut stdout = tokio::io::stdout();
    stdout.write_all(format!("{}\n", HANDSHAKE).as_bytes()).await?;
    stdout.flush().await?;

    let (tx, mut rx) = mpsc::unbounded_channel::<Response>();
    let writer = tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        while let Some(response) = rx.recv().await {
            let mut line = serde_json::to_vec(&response)?;
            line.push(b'\n');
            stdout.write_all(&line).await?;
            stdout.flush().await?;
        }
        Ok::<_, anyhow::Error>(())
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut tasks = JoinSet::new();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let request: Request = match serde_json::from_str(&line) {
            Ok(request) => request,
            Err(e) => {
                let diag = Diagnostic::error("Malformed request").with_detail(e.to_string());
                let _ = tx.send(Response::failed(serde_json::Value::Null, vec![diag]));
                continue;
            }
        };
        let schema = if debug {
            log_request(&request)?
        } else {
            None
        };

        if request.method == "stop" {
            // In-flight requests still get their responses
            while tasks.join_next().await.is_some() {}
            let _ = tx.send(server.handle(request).await);
            break;
        }

        let server = Arc::clone(&server);
        let tx = tx.clone();
        tasks.spawn(async move {
            let response = server.handle(request).await;
            if debug {
                log_response(&response, schema.as_ref());
            }
            let _ = tx.send(response);
        });
    }

    while tasks.join_next().await.is_some() {}
    drop(tx);
    writer.await??;
    info!("Provider server stopped");
    Ok(())
}
