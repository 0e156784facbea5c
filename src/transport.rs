use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

use crate::config::ClientConfig;
use crate::error::{NenDBError, Result};

pub const USER_AGENT: &str = concat!("nendb-rust/", env!("NENDB_VERSION"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Method::Get => f.write_str("GET"),
            Method::Post => f.write_str("POST"),
        }
    }
}

/// One HTTP exchange, fully built before the first attempt so every retry
/// sends the same request.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: &'static str,
    pub body: Option<Value>,
    pub timeout: Duration,
}

/// Raw response: status code and the complete body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// Sends a request and returns whatever the server answered.
///
/// Implementations only fail with [`NenDBError::Connection`] or
/// [`NenDBError::Timeout`]; HTTP error statuses come back as responses.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: &ApiRequest) -> Result<ApiResponse>;
}

/// reqwest-backed transport. Holds the connection pool for its owner.
#[derive(Debug)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        config.validate()?;

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .pool_max_idle_per_host(config.pool_max_idle_per_host())
            .build()
            .map_err(|e| NenDBError::connection("failed to initialize HTTP client", e))?;

        Ok(Self {
            client,
            base_url: config.base_url().to_string(),
        })
    }

    /// Uses a preconfigured reqwest client, e.g. one with extra default headers.
    ///
    /// Requests go to `config`'s base URL. Pool and user-agent settings are
    /// those of `client`; `config.pool_max_idle_per_host()` does not apply.
    pub fn with_client(client: Client, config: &ClientConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            client,
            base_url: config.base_url().to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn inner(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl Transport for HttpTransport {
    #[tracing::instrument(skip(self, request), fields(path = request.path))]
    async fn execute(&self, request: &ApiRequest) -> Result<ApiResponse> {
        let url = format!("{}{}", self.base_url, request.path);

        debug!("{} {}", request.method, url);

        let builder = match request.method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
        };
        let builder = match &request.body {
            Some(body) => builder.json(body),
            None => builder,
        };

        let response = builder
            .timeout(request.timeout)
            .send()
            .await
            .map_err(|e| transport_error(e, request, &url))?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| transport_error(e, request, &url))?;

        debug!("{} {} -> {} ({} bytes)", request.method, url, status, body.len());

        Ok(ApiResponse {
            status,
            body: body.to_vec(),
        })
    }
}

fn transport_error(error: reqwest::Error, request: &ApiRequest, url: &str) -> NenDBError {
    if error.is_timeout() {
        NenDBError::timeout(
            format!("{} {} timed out", request.method, url),
            request.timeout,
            error,
        )
    } else {
        NenDBError::connection(format!("{} {} failed", request.method, url), error)
    }
}
