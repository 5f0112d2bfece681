//! The authenticated store handle: readiness checks, collection discovery,
//! and search execution over the request/response channel.

use std::sync::Mutex;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::Deserialize;
use tokio::net::TcpStream;
use tokio::runtime::Runtime;
use tracing::{debug, info};

use searchdeck_core::config::ConnectionConfig;
use searchdeck_core::error::{ConnectionError, QueryError};
use searchdeck_core::traits::SearchBackend;
use searchdeck_core::types::{RawHit, RawMetadata, SearchPlan};

use crate::endpoint::{resolve_endpoints, Endpoints};
use crate::graphql;

/// Bound on every round trip; the store is expected to answer well within
/// this for interactive use.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Session-scoped handle to the store. Not safe for concurrent use: every
/// network call runs under an internal operation guard, so at most one
/// operation is in flight per handle.
pub struct StoreClient {
    http: reqwest::Client,
    endpoints: Endpoints,
    has_provider_key: bool,
    runtime: Runtime,
    op_guard: Mutex<()>,
}

#[derive(Debug, Deserialize)]
struct SchemaResponse {
    #[serde(default)]
    classes: Vec<SchemaClass>,
}

#[derive(Debug, Deserialize)]
struct SchemaClass {
    class: String,
    #[serde(default)]
    properties: Vec<SchemaProperty>,
}

#[derive(Debug, Deserialize)]
struct SchemaProperty {
    name: String,
}

#[derive(Debug, Deserialize)]
struct GraphqlResponse {
    data: Option<serde_json::Value>,
    errors: Option<Vec<GraphqlError>>,
}

#[derive(Debug, Deserialize)]
struct GraphqlError {
    message: String,
}

impl StoreClient {
    /// Establish the handle: validate the configuration, resolve both
    /// endpoints, then check readiness of the request/response channel and
    /// reachability of the binary channel. Single attempt, no retries.
    pub fn connect(config: &ConnectionConfig) -> Result<Self, ConnectionError> {
        if config.host.trim().is_empty() {
            return Err(ConnectionError::Misconfigured("host must not be empty".into()));
        }
        if config.api_key.trim().is_empty() {
            return Err(ConnectionError::Misconfigured("API key must not be empty".into()));
        }
        let endpoints = resolve_endpoints(config);
        let headers = build_headers(config)?;
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .default_headers(headers)
            .build()
            .map_err(|e| ConnectionError::Misconfigured(format!("HTTP client: {e}")))?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| ConnectionError::Misconfigured(format!("runtime: {e}")))?;
        let client = Self {
            http,
            endpoints,
            has_provider_key: config.provider.is_some(),
            runtime,
            op_guard: Mutex::new(()),
        };
        client.check_ready()?;
        client.probe_grpc()?;
        info!(
            rest = %client.endpoints.rest.base_url(),
            grpc = %client.endpoints.grpc.authority(),
            "connected to store"
        );
        Ok(client)
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// All collection names known to the store. Always a fresh round trip.
    pub fn list_collections(&self) -> Result<Vec<String>, ConnectionError> {
        let url = format!("{}/v1/schema", self.endpoints.rest.base_url());
        let (status, body) = self
            .fetch(self.http.get(&url))
            .map_err(map_connect_transport_error)?;
        check_discovery_status(status)?;
        let schema: SchemaResponse = serde_json::from_slice(&body)
            .map_err(|e| ConnectionError::NotReady(format!("unexpected schema payload: {e}")))?;
        Ok(schema.classes.into_iter().map(|c| c.class).collect())
    }

    /// Property names of one collection, in schema order.
    pub fn describe_collection(&self, name: &str) -> Result<Vec<String>, QueryError> {
        let url = format!("{}/v1/schema/{}", self.endpoints.rest.base_url(), name);
        let (status, body) = self
            .fetch(self.http.get(&url))
            .map_err(map_query_transport_error)?;
        if status == StatusCode::NOT_FOUND {
            return Err(QueryError::InvalidCollection(name.to_string()));
        }
        if !status.is_success() {
            return Err(QueryError::UpstreamFailure(format!(
                "schema lookup returned {status}"
            )));
        }
        let class: SchemaClass = serde_json::from_slice(&body)
            .map_err(|e| QueryError::UpstreamFailure(format!("unexpected schema payload: {e}")))?;
        Ok(class.properties.into_iter().map(|p| p.name).collect())
    }

    fn check_ready(&self) -> Result<(), ConnectionError> {
        let url = format!("{}/v1/.well-known/ready", self.endpoints.rest.base_url());
        let (status, _body) = self
            .fetch(self.http.get(&url))
            .map_err(map_connect_transport_error)?;
        if status.is_success() {
            Ok(())
        } else if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            Err(ConnectionError::Unauthorized(format!(
                "readiness check returned {status}"
            )))
        } else {
            Err(ConnectionError::NotReady(format!(
                "readiness check returned {status}"
            )))
        }
    }

    /// TCP reachability probe of the binary channel.
    fn probe_grpc(&self) -> Result<(), ConnectionError> {
        let authority = self.endpoints.grpc.authority();
        let result = self.block_on(async {
            tokio::time::timeout(REQUEST_TIMEOUT, TcpStream::connect(authority.as_str())).await
        });
        match result {
            Ok(Ok(_stream)) => Ok(()),
            Ok(Err(e)) => Err(ConnectionError::Unreachable(format!(
                "binary channel {authority}: {e}"
            ))),
            Err(_) => Err(ConnectionError::Unreachable(format!(
                "binary channel {authority}: connect timed out"
            ))),
        }
    }

    /// Send one request and collect status plus body bytes.
    fn fetch(&self, request: reqwest::RequestBuilder) -> Result<(StatusCode, Vec<u8>), reqwest::Error> {
        self.block_on(async {
            let response = request.send().await?;
            let status = response.status();
            let body = response.bytes().await?;
            Ok((status, body.to_vec()))
        })
    }

    fn block_on<F: std::future::Future>(&self, future: F) -> F::Output {
        let _guard = self.op_guard.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        self.runtime.block_on(future)
    }
}

impl SearchBackend for StoreClient {
    fn has_provider_credential(&self) -> bool {
        self.has_provider_key
    }

    fn run_search(&self, plan: &SearchPlan) -> Result<Vec<RawHit>, QueryError> {
        let query = graphql::render_get_query(plan);
        debug!(collection = %plan.collection, %query, "dispatching search");
        let url = format!("{}/v1/graphql", self.endpoints.rest.base_url());
        let body = serde_json::json!({ "query": query });
        let (status, bytes) = self
            .fetch(self.http.post(&url).json(&body))
            .map_err(map_query_transport_error)?;
        if !status.is_success() {
            return Err(QueryError::UpstreamFailure(format!(
                "query endpoint returned {status}"
            )));
        }
        let response: GraphqlResponse = serde_json::from_slice(&bytes)
            .map_err(|e| QueryError::UpstreamFailure(format!("unexpected query payload: {e}")))?;
        if let Some(first) = response.errors.as_ref().and_then(|errors| errors.first()) {
            return Err(map_graphql_error(&plan.collection, &first.message));
        }
        Ok(extract_hits(response.data.as_ref(), &plan.collection))
    }
}

fn build_headers(config: &ConnectionConfig) -> Result<HeaderMap, ConnectionError> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    let bearer = format!("Bearer {}", config.api_key);
    let mut auth = HeaderValue::from_str(&bearer).map_err(|_| {
        ConnectionError::Misconfigured("API key contains invalid header characters".into())
    })?;
    auth.set_sensitive(true);
    headers.insert(AUTHORIZATION, auth);
    if let Some(credential) = &config.provider {
        let mut value = HeaderValue::from_str(&credential.api_key).map_err(|_| {
            ConnectionError::Misconfigured("provider key contains invalid header characters".into())
        })?;
        value.set_sensitive(true);
        headers.insert(credential.provider.header_name(), value);
    }
    Ok(headers)
}

fn check_discovery_status(status: StatusCode) -> Result<(), ConnectionError> {
    if status.is_success() {
        Ok(())
    } else if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        Err(ConnectionError::Unauthorized(format!(
            "schema listing returned {status}"
        )))
    } else {
        Err(ConnectionError::NotReady(format!(
            "schema listing returned {status}"
        )))
    }
}

fn map_connect_transport_error(error: reqwest::Error) -> ConnectionError {
    ConnectionError::Unreachable(error.to_string())
}

fn map_query_transport_error(error: reqwest::Error) -> QueryError {
    if error.is_timeout() {
        QueryError::Timeout(REQUEST_TIMEOUT.as_secs())
    } else {
        QueryError::UpstreamFailure(error.to_string())
    }
}

/// The store reports an unknown collection as an unqueryable field; keep
/// that case distinct from other upstream failures.
fn map_graphql_error(collection: &str, message: &str) -> QueryError {
    if message.contains("Cannot query field") {
        QueryError::InvalidCollection(collection.to_string())
    } else {
        QueryError::UpstreamFailure(message.to_string())
    }
}

fn extract_hits(data: Option<&serde_json::Value>, collection: &str) -> Vec<RawHit> {
    let items = data
        .and_then(|d| d.get("Get"))
        .and_then(|get| get.get(collection))
        .and_then(|c| c.as_array());
    match items {
        Some(items) => items.iter().map(parse_hit).collect(),
        None => Vec::new(),
    }
}

/// Split one response object into its properties bag and metadata bag.
/// Non-object entries produce an empty hit, which normalization skips.
fn parse_hit(value: &serde_json::Value) -> RawHit {
    let Some(fields) = value.as_object() else {
        return RawHit::default();
    };
    let mut properties = serde_json::Map::new();
    let mut metadata = None;
    for (key, field) in fields {
        if key == "_additional" {
            metadata = field.as_object().map(parse_metadata);
        } else {
            properties.insert(key.clone(), field.clone());
        }
    }
    RawHit {
        properties: Some(properties),
        metadata,
    }
}

fn parse_metadata(bag: &serde_json::Map<String, serde_json::Value>) -> RawMetadata {
    RawMetadata {
        id: bag.get("id").and_then(|v| v.as_str()).map(str::to_string),
        distance: number_field(bag.get("distance")),
        certainty: number_field(bag.get("certainty")),
        score: number_field(bag.get("score")),
        explain_score: bag
            .get("explainScore")
            .and_then(|v| v.as_str())
            .map(str::to_string),
    }
}

/// Relevance numbers arrive either as JSON numbers or as numeric strings.
fn number_field(value: Option<&serde_json::Value>) -> Option<f64> {
    match value? {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
