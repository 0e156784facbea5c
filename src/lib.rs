//! Client library for the NenDB graph database.
//!
//! ```no_run
//! use nendb::{Client, ClientConfig};
//!
//! # async fn run() -> nendb::Result<()> {
//! let client = Client::connect(ClientConfig::new("http://localhost:8080")).await?;
//! let stats = client.graph_stats().await?;
//! let route = client.dijkstra(0, 5, "cost").await?;
//! println!("{} nodes, path {:?} costs {:?}", stats.nodes, route.path, route.cost);
//! client.close();
//! # Ok(())
//! # }
//! ```

pub mod blocking;
pub mod client;
pub mod commands;
pub mod config;
pub mod error;
pub mod request;
pub mod retry;
pub mod transport;
pub mod types;

pub use client::Client;
pub use config::ClientConfig;
pub use error::{ErrorKind, NenDBError, Result};
pub use retry::RetryPolicy;
pub use transport::{HttpTransport, Transport};
pub use types::{
    AlgorithmResult, AlgorithmStatus, BfsPayload, BfsResult, DijkstraPayload, DijkstraResult,
    Filters, GraphStats, HealthStatus, NodeId, PageRankPayload, PageRankResult,
};
