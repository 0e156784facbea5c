//! Request bodies for the algorithm endpoints and their local validation.

use serde::Serialize;

use crate::error::{NenDBError, Result};
use crate::types::{Filters, NodeId};

pub const HEALTH_PATH: &str = "/health";
pub const STATS_PATH: &str = "/graph/stats";
pub const BFS_PATH: &str = "/graph/algorithms/bfs";
pub const DIJKSTRA_PATH: &str = "/graph/algorithms/dijkstra";
pub const PAGERANK_PATH: &str = "/graph/algorithms/pagerank";

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct BfsRequest<'a> {
    pub start_node: NodeId,
    pub max_depth: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filters: Option<&'a Filters>,
}

impl<'a> BfsRequest<'a> {
    /// Empty filters are left out of the body entirely; anything else is
    /// forwarded untouched for the server to interpret.
    pub fn new(start_node: NodeId, max_depth: u32, filters: Option<&'a Filters>) -> Self {
        Self {
            start_node,
            max_depth,
            filters: filters.filter(|f| !f.is_empty()),
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct DijkstraRequest<'a> {
    pub start_node: NodeId,
    pub end_node: NodeId,
    pub weight_property: &'a str,
}

impl DijkstraRequest<'_> {
    pub fn validate(&self) -> Result<()> {
        if self.weight_property.trim().is_empty() {
            return Err(NenDBError::validation(
                "weight_property must be a non-empty string",
            ));
        }
        Ok(())
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct PageRankRequest {
    pub iterations: u32,
    pub damping_factor: f64,
    pub tolerance: f64,
}

impl PageRankRequest {
    pub fn validate(&self) -> Result<()> {
        if self.iterations < 1 {
            return Err(NenDBError::validation("iterations must be at least 1"));
        }
        // Written so that NaN fails both checks
        if !(self.damping_factor > 0.0 && self.damping_factor < 1.0) {
            return Err(NenDBError::validation(format!(
                "damping_factor must be strictly between 0 and 1, got {}",
                self.damping_factor
            )));
        }
        if !(self.tolerance > 0.0) || !self.tolerance.is_finite() {
            return Err(NenDBError::validation(format!(
                "tolerance must be a positive number, got {}",
                self.tolerance
            )));
        }
        Ok(())
    }
}
