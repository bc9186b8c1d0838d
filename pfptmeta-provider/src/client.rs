//! HTTP client for the Proofpoint Meta REST API
//!
//! Base URL: https://api.metanetworks.com/
//! Auth: OAuth2 client credentials, bearer token on every request

use std::time::{Duration, Instant};

use log::debug;
use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use url::Url;

use crate::config::ProviderConfig;
use crate::error::ApiError;

/// A cached token is replaced once it is this close to expiring
const REFRESH_MARGIN: Duration = Duration::from_secs(60);

const TOKEN_PATH: &str = "v1/oauth/token";

// ── Error / token response shapes ────────────────────────────────────

#[derive(serde::Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    detail: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(serde::Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

struct Token {
    access_token: SecretString,
    expires_at: Instant,
}

impl Token {
    fn is_fresh(&self) -> bool {
        self.expires_at > Instant::now() + REFRESH_MARGIN
    }
}

// ── Client ───────────────────────────────────────────────────────────

/// Authenticated client shared by every resource of one provider instance.
///
/// Each call is a single request; failures are returned to the caller
/// without retry.
pub struct MetaClient {
    http: reqwest::Client,
    config: ProviderConfig,
    token: Mutex<Option<Token>>,
}

impl MetaClient {
    /// Build the client and exchange the API key for a first bearer token
    pub async fn connect(config: ProviderConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("terraform-provider-pfptmeta/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let client = Self {
            http,
            config,
            token: Mutex::new(None),
        };
        client.bearer().await?;
        Ok(client)
    }

    pub fn base_url(&self) -> &Url {
        &self.config.base_url
    }

    pub fn org_shortname(&self) -> &str {
        &self.config.org_shortname
    }

    /// Join a relative path (e.g. `"v1/users"`) onto the base URL.
    fn url(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.config.base_url.join(path.trim_start_matches('/'))?)
    }

    // ── Authentication ───────────────────────────────────────────────

    async fn bearer(&self) -> Result<SecretString, ApiError> {
        let mut guard = self.token.lock().await;
        if let Some(token) = guard.as_ref()
            && token.is_fresh()
        {
            return Ok(SecretString::from(token.access_token.expose_secret().to_owned()));
        }

        let token = self.fetch_token().await?;
        let bearer = SecretString::from(token.access_token.expose_secret().to_owned());
        *guard = Some(token);
        Ok(bearer)
    }

    async fn fetch_token(&self) -> Result<Token, ApiError> {
        let url = self.url(TOKEN_PATH)?;
        debug!("POST {url} (scope org:{})", self.config.org_shortname);

        let form = [
            ("grant_type", "client_credentials".to_string()),
            ("scope", format!("org:{}", self.config.org_shortname)),
        ];
        let resp = self
            .http
            .post(url)
            .basic_auth(
                &self.config.api_key,
                Some(self.config.api_secret.expose_secret()),
            )
            .form(&form)
            .send()
            .await?;

        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            let err = parse_error(status, resp).await;
            return Err(ApiError::Authentication {
                message: err.to_string(),
            });
        }

        let token: TokenResponse = handle_response(resp).await?;
        Ok(Token {
            access_token: SecretString::from(token.access_token),
            expires_at: Instant::now() + Duration::from_secs(token.expires_in),
        })
    }

    // ── HTTP verbs ───────────────────────────────────────────────────

    async fn send<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, ApiError> {
        let url = self.url(path)?;
        debug!("{method} {url}");

        let bearer = self.bearer().await?;
        let mut req = self
            .http
            .request(method, url)
            .bearer_auth(bearer.expose_secret());
        if let Some(body) = body {
            req = req.json(body);
        }
        let resp = req.send().await?;
        handle_response(resp).await
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send::<T, ()>(Method::GET, path, None).await
    }

    /// GET a collection; the API answers with a bare JSON array
    pub async fn list<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, ApiError> {
        self.get(path).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.send(Method::POST, path, Some(body)).await
    }

    pub async fn patch<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.send(Method::PATCH, path, Some(body)).await
    }

    pub async fn put<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.send(Method::PUT, path, Some(body)).await
    }

    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.send::<serde_json::Value, ()>(Method::DELETE, path, None)
            .await
            .map(|_| ())
    }
}

// ── Response handling ────────────────────────────────────────────────

/// Decode a 2xx body; an empty body decodes as JSON `null`.
async fn handle_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ApiError> {
    let status = resp.status();
    if !status.is_success() {
        return Err(parse_error(status, resp).await);
    }

    let body = resp.text().await?;
    let text: &str = if body.trim().is_empty() { "null" } else { &body };
    serde_json::from_str(text).map_err(|e| {
        let preview: String = body.chars().take(200).collect();
        ApiError::Deserialization {
            message: format!("{e} (body preview: {preview:?})"),
            body,
        }
    })
}

async fn parse_error(status: reqwest::StatusCode, resp: reqwest::Response) -> ApiError {
    let raw = resp.text().await.unwrap_or_default();

    let message = match serde_json::from_str::<ErrorResponse>(&raw) {
        Ok(err) => err.detail.or(err.message),
        Err(_) => None,
    };
    let message = message.unwrap_or_else(|| {
        if raw.is_empty() {
            status.to_string()
        } else {
            raw.clone()
        }
    });

    ApiError::Status {
        status: status.as_u16(),
        message,
        body: raw,
    }
}
