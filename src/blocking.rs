//! Blocking client for callers without an async runtime.
//!
//! Every call is driven to completion on a private current-thread tokio
//! runtime, so validation, retry and decoding are exactly those of the async
//! [`Client`](crate::Client). Do not use this type from inside an async
//! context: blocking on a runtime there panics.

use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::{Builder, Runtime};

use crate::config::ClientConfig;
use crate::error::{NenDBError, Result};
use crate::transport::{HttpTransport, Transport};
use crate::types::{
    BfsResult, DijkstraResult, Filters, GraphStats, HealthStatus, NodeId, PageRankResult,
};

pub struct Client<T: Transport = HttpTransport> {
    inner: crate::Client<T>,
    runtime: Arc<Runtime>,
}

impl<T: Transport> Clone for Client<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            runtime: Arc::clone(&self.runtime),
        }
    }
}

impl<T: Transport> std::fmt::Debug for Client<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("BlockingClient").field(&self.inner).finish()
    }
}

fn build_runtime() -> Result<Runtime> {
    Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| NenDBError::connection("failed to start I/O runtime", e))
}

impl Client<HttpTransport> {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let runtime = build_runtime()?;
        let inner = crate::Client::new(config)?;
        Ok(Self {
            inner,
            runtime: Arc::new(runtime),
        })
    }

    /// Builds a client and checks the server's health endpoint.
    pub fn connect(config: ClientConfig) -> Result<Self> {
        let runtime = build_runtime()?;
        let inner = runtime.block_on(crate::Client::connect(config))?;
        Ok(Self {
            inner,
            runtime: Arc::new(runtime),
        })
    }
}

impl<T: Transport> Client<T> {
    pub fn with_transport(config: ClientConfig, transport: T) -> Result<Self> {
        let runtime = build_runtime()?;
        let inner = crate::Client::with_transport(config, transport)?;
        Ok(Self {
            inner,
            runtime: Arc::new(runtime),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        self.inner.config()
    }

    pub fn timeout(&self) -> Duration {
        self.inner.timeout()
    }

    pub fn with_timeout(&self, timeout: Duration) -> Self {
        Self {
            inner: self.inner.with_timeout(timeout),
            runtime: Arc::clone(&self.runtime),
        }
    }

    /// Borrows the async client behind this one.
    pub fn as_async(&self) -> &crate::Client<T> {
        &self.inner
    }

    pub fn close(self) {
        self.inner.close();
    }

    pub fn health(&self) -> Result<HealthStatus> {
        self.runtime.block_on(self.inner.health())
    }

    pub fn graph_stats(&self) -> Result<GraphStats> {
        self.runtime.block_on(self.inner.graph_stats())
    }

    pub fn bfs(
        &self,
        start_node: NodeId,
        max_depth: u32,
        filters: Option<&Filters>,
    ) -> Result<BfsResult> {
        self.runtime.block_on(self.inner.bfs(start_node, max_depth, filters))
    }

    pub fn dijkstra(
        &self,
        start_node: NodeId,
        end_node: NodeId,
        weight_property: &str,
    ) -> Result<DijkstraResult> {
        self.runtime.block_on(self.inner.dijkstra(start_node, end_node, weight_property))
    }

    pub fn pagerank(
        &self,
        iterations: u32,
        damping_factor: f64,
        tolerance: f64,
    ) -> Result<PageRankResult> {
        self.runtime.block_on(self.inner.pagerank(iterations, damping_factor, tolerance))
    }
}
