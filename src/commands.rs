//! Implementations of the `nendb` subcommands.
//!
//! Each command runs one client call and returns the result as JSON, ready to
//! be printed by the binary.

use anyhow::{Context, Result, anyhow};
use serde::Serialize;
use serde_json::Value;

use crate::types::{Filters, NodeId};
use crate::{Client, Transport};

#[tracing::instrument(skip(client))]
pub async fn health<T: Transport>(client: &Client<T>) -> Result<Value> {
    to_json(client.health().await?)
}

#[tracing::instrument(skip(client))]
pub async fn stats<T: Transport>(client: &Client<T>) -> Result<Value> {
    to_json(client.graph_stats().await?)
}

#[tracing::instrument(skip(client))]
pub async fn bfs<T: Transport>(
    client: &Client<T>,
    start_node: NodeId,
    max_depth: u32,
    filters: Option<&str>,
) -> Result<Value> {
    let filters = filters.map(parse_filters).transpose()?;
    to_json(client.bfs(start_node, max_depth, filters.as_ref()).await?)
}

#[tracing::instrument(skip(client))]
pub async fn dijkstra<T: Transport>(
    client: &Client<T>,
    start_node: NodeId,
    end_node: NodeId,
    weight_property: &str,
) -> Result<Value> {
    to_json(client.dijkstra(start_node, end_node, weight_property).await?)
}

#[tracing::instrument(skip(client))]
pub async fn pagerank<T: Transport>(
    client: &Client<T>,
    iterations: u32,
    damping_factor: f64,
    tolerance: f64,
) -> Result<Value> {
    to_json(client.pagerank(iterations, damping_factor, tolerance).await?)
}

/// Parses the `--filters` argument, which must be a JSON object.
pub fn parse_filters(raw: &str) -> Result<Filters> {
    let value: Value = serde_json::from_str(raw).context("Failed to parse filters as JSON")?;
    match value {
        Value::Object(filters) => Ok(filters),
        other => Err(anyhow!("Filters must be a JSON object, got: {}", other)),
    }
}

pub fn render(value: &Value, pretty: bool) -> Result<String> {
    let rendered = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(rendered)
}

fn to_json<S: Serialize>(result: S) -> Result<Value> {
    serde_json::to_value(result).context("Failed to serialize result")
}
