use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::ops::Deref;

/// Identifier of a graph node on the server.
pub type NodeId = u64;

/// Node/edge filters forwarded verbatim to BFS.
pub type Filters = Map<String, Value>;

/// Response of `GET /health`.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct HealthStatus {
    pub status: String,
    pub service: String,
    pub version: String,
}

/// Response of `GET /graph/stats`.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct GraphStats {
    pub nodes: u64,
    pub edges: u64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub algorithms: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Any other metrics the server reports.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Execution state reported for an algorithm run.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(from = "String", into = "String")]
pub enum AlgorithmStatus {
    Queued,
    Running,
    Completed,
    Failed,
    Cancelled,
    /// A status this client does not know, kept as sent.
    Other(String),
}

impl AlgorithmStatus {
    pub fn as_str(&self) -> &str {
        match self {
            AlgorithmStatus::Queued => "queued",
            AlgorithmStatus::Running => "running",
            AlgorithmStatus::Completed => "completed",
            AlgorithmStatus::Failed => "failed",
            AlgorithmStatus::Cancelled => "cancelled",
            AlgorithmStatus::Other(s) => s,
        }
    }
}

impl From<String> for AlgorithmStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "queued" => AlgorithmStatus::Queued,
            "running" => AlgorithmStatus::Running,
            "completed" => AlgorithmStatus::Completed,
            "failed" => AlgorithmStatus::Failed,
            "cancelled" => AlgorithmStatus::Cancelled,
            _ => AlgorithmStatus::Other(s),
        }
    }
}

impl From<AlgorithmStatus> for String {
    fn from(status: AlgorithmStatus) -> Self {
        match status {
            AlgorithmStatus::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for AlgorithmStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Response of an algorithm endpoint: the shared header plus an
/// algorithm-specific payload, reachable directly through `Deref`.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct AlgorithmResult<P> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub algorithm: Option<String>,
    pub status: AlgorithmStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(flatten)]
    pub payload: P,
}

#[derive(Deserialize)]
struct ResultHeader {
    #[serde(default)]
    algorithm: Option<String>,
    status: AlgorithmStatus,
    #[serde(default)]
    message: Option<String>,
}

// Header and payload are read from the same JSON object. `#[serde(flatten)]`
// would lose serde_json's support for integer map keys (PageRank scores).
impl<'de, P: DeserializeOwned> Deserialize<'de> for AlgorithmResult<P> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        if !value.is_object() {
            return Err(D::Error::custom("expected a JSON object"));
        }
        let header = ResultHeader::deserialize(&value).map_err(D::Error::custom)?;
        let payload = P::deserialize(&value).map_err(D::Error::custom)?;
        Ok(Self {
            algorithm: header.algorithm,
            status: header.status,
            message: header.message,
            payload,
        })
    }
}

impl<P> Deref for AlgorithmResult<P> {
    type Target = P;

    fn deref(&self) -> &P {
        &self.payload
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
pub struct BfsPayload {
    #[serde(default, alias = "visited", skip_serializing_if = "Vec::is_empty")]
    pub visited_nodes: Vec<NodeId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<NodeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depth: Option<u32>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
pub struct DijkstraPayload {
    #[serde(default, alias = "shortest_path", skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<NodeId>,
    #[serde(default, alias = "total_cost", skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub path_details: Vec<Value>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
pub struct PageRankPayload {
    #[serde(default, alias = "node_scores", skip_serializing_if = "BTreeMap::is_empty")]
    pub scores: BTreeMap<NodeId, f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iterations: Option<u32>,
    #[serde(default, alias = "convergence", skip_serializing_if = "Option::is_none")]
    pub converged: Option<bool>,
}

impl PageRankPayload {
    /// Nodes ordered by descending score.
    pub fn ranked(&self) -> Vec<(NodeId, f64)> {
        let mut ranked: Vec<(NodeId, f64)> = self.scores.iter().map(|(n, s)| (*n, *s)).collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked
    }
}

pub type BfsResult = AlgorithmResult<BfsPayload>;
pub type DijkstraResult = AlgorithmResult<DijkstraPayload>;
pub type PageRankResult = AlgorithmResult<PageRankPayload>;
