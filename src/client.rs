use log::debug;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use crate::config::ClientConfig;
use crate::error::{Details, NenDBError, Result};
use crate::request::{
    BFS_PATH, BfsRequest, DIJKSTRA_PATH, DijkstraRequest, HEALTH_PATH, PAGERANK_PATH,
    PageRankRequest, STATS_PATH,
};
use crate::retry::with_retry;
use crate::transport::{ApiRequest, ApiResponse, HttpTransport, Method, Transport};
use crate::types::{
    BfsResult, DijkstraResult, Filters, GraphStats, HealthStatus, NodeId, PageRankResult,
};

/// Async client for a NenDB server.
///
/// Cloning is cheap: clones share the configuration and the connection pool,
/// which is released when the last handle is dropped or closed. All methods
/// take `&self` and may run concurrently.
pub struct Client<T: Transport = HttpTransport> {
    transport: Arc<T>,
    config: Arc<ClientConfig>,
    timeout: Duration,
}

impl<T: Transport> Clone for Client<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            config: Arc::clone(&self.config),
            timeout: self.timeout,
        }
    }
}

impl<T: Transport> std::fmt::Debug for Client<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.config.base_url())
            .field("timeout", &self.timeout)
            .field("retries", &self.config.retries())
            .finish()
    }
}

impl Client<HttpTransport> {
    /// Builds a client without contacting the server.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let transport = HttpTransport::new(&config)?;
        Ok(Self::from_parts(config, transport))
    }

    /// Builds a client and checks that the server answers its health endpoint.
    #[tracing::instrument(skip(config), fields(base_url = config.base_url()))]
    pub async fn connect(config: ClientConfig) -> Result<Self> {
        let client = Self::new(config)?;
        let health = client.health().await?;
        debug!(
            "Connected to {} {} at {} (status: {})",
            health.service,
            health.version,
            client.config.base_url(),
            health.status
        );
        Ok(client)
    }
}

impl<T: Transport> Client<T> {
    /// Builds a client over a custom transport.
    ///
    /// `config` supplies the timeout and retry policy; the transport decides
    /// where requests go. Build an [`HttpTransport`] from the same config so
    /// the two agree.
    pub fn with_transport(config: ClientConfig, transport: T) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_parts(config, transport))
    }

    fn from_parts(config: ClientConfig, transport: T) -> Self {
        Self {
            timeout: config.timeout(),
            transport: Arc::new(transport),
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Per-call timeout used by this handle.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// A handle on the same connection pool whose calls use another timeout.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        Self {
            timeout,
            ..self.clone()
        }
    }

    /// Releases this handle. The pool closes once no other handle (clone or
    /// in-flight call) holds it.
    pub fn close(self) {
        debug!(
            "Closing client for {} ({} handle(s) remaining)",
            self.config.base_url(),
            Arc::strong_count(&self.transport) - 1
        );
    }

    #[tracing::instrument(skip(self))]
    pub async fn health(&self) -> Result<HealthStatus> {
        self.call("Health check", Method::Get, HEALTH_PATH, None).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn graph_stats(&self) -> Result<GraphStats> {
        self.call("Fetching graph statistics", Method::Get, STATS_PATH, None).await
    }

    /// Breadth-first search from `start_node` up to `max_depth` hops.
    #[tracing::instrument(skip(self, filters))]
    pub async fn bfs(
        &self,
        start_node: NodeId,
        max_depth: u32,
        filters: Option<&Filters>,
    ) -> Result<BfsResult> {
        let request = BfsRequest::new(start_node, max_depth, filters);
        let body = encode(&request)?;
        self.call("Running BFS", Method::Post, BFS_PATH, Some(body)).await
    }

    /// Shortest weighted path between two nodes.
    #[tracing::instrument(skip(self))]
    pub async fn dijkstra(
        &self,
        start_node: NodeId,
        end_node: NodeId,
        weight_property: &str,
    ) -> Result<DijkstraResult> {
        let request = DijkstraRequest {
            start_node,
            end_node,
            weight_property,
        };
        request.validate()?;
        let body = encode(&request)?;
        self.call("Running Dijkstra", Method::Post, DIJKSTRA_PATH, Some(body)).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn pagerank(
        &self,
        iterations: u32,
        damping_factor: f64,
        tolerance: f64,
    ) -> Result<PageRankResult> {
        let request = PageRankRequest {
            iterations,
            damping_factor,
            tolerance,
        };
        request.validate()?;
        let body = encode(&request)?;
        self.call("Running PageRank", Method::Post, PAGERANK_PATH, Some(body)).await
    }

    async fn call<R: DeserializeOwned>(
        &self,
        operation_name: &str,
        method: Method,
        path: &'static str,
        body: Option<Value>,
    ) -> Result<R> {
        let request = ApiRequest {
            method,
            path,
            body,
            timeout: self.timeout,
        };
        let policy = self.config.retry_policy();
        let transport = self.transport.as_ref();
        let request = &request;

        with_retry(operation_name, &policy, || async move {
            let response = transport.execute(request).await?;
            decode(path, response)
        })
        .await
    }
}

fn encode<B: Serialize>(body: &B) -> Result<Value> {
    serde_json::to_value(body)
        .map_err(|e| NenDBError::validation(format!("failed to encode request body: {}", e)))
}

/// Maps a raw response onto a typed value or the matching error.
fn decode<R: DeserializeOwned>(path: &str, response: ApiResponse) -> Result<R> {
    match response.status {
        200..=299 => serde_json::from_slice(&response.body).map_err(|e| NenDBError::Protocol {
            message: format!("invalid JSON response from {}: {}", path, e),
            details: Some(response_details(&response)),
        }),
        400..=599 => Err(server_error(path, &response)),
        status => Err(NenDBError::Protocol {
            message: format!("unexpected HTTP status {} from {}", status, path),
            details: Some(response_details(&response)),
        }),
    }
}

fn response_details(response: &ApiResponse) -> Details {
    let mut details = Details::new();
    details.insert("status_code".to_string(), response.status.into());
    details.insert(
        "response_text".to_string(),
        String::from_utf8_lossy(&response.body).into_owned().into(),
    );
    details
}

/// Error bodies look like `{"error": "...", "details": {...}}`; `message` is
/// accepted in place of `error`. Anything else is reported as raw text.
fn server_error(path: &str, response: &ApiResponse) -> NenDBError {
    let parsed: Option<Value> = serde_json::from_slice(&response.body).ok();

    let (message, details) = match parsed.as_ref().and_then(Value::as_object) {
        Some(object) => {
            let message = object
                .get("error")
                .or_else(|| object.get("message"))
                .and_then(Value::as_str)
                .map(str::to_string);
            let details = object.get("details").and_then(Value::as_object).cloned();
            (message, details)
        }
        None => (None, None),
    };

    let message = message.unwrap_or_else(|| {
        let text = String::from_utf8_lossy(&response.body).trim().to_string();
        if text.is_empty() {
            format!("HTTP {} on {}", response.status, path)
        } else {
            text
        }
    });

    NenDBError::Server {
        status: response.status,
        message,
        details,
    }
}
