//! Domain model for the delivered workflow graph.
//!
//! The generation layer hands this crate a finished [`Artifact`]; nothing
//! here interprets node semantics. The graph is serialized, fingerprinted,
//! and forwarded as-is, with unknown fields preserved through round-trips.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use thiserror::Error;

/// Error type for artifact encoding and decoding.
#[derive(Debug, Error)]
pub enum ArtifactError {
    /// The graph failed to parse or serialize.
    #[error("malformed workflow graph: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// A single node of the workflow graph.
///
/// Only the identity fields are typed; everything else (parameters,
/// position, versions) rides along in `rest` so that a graph survives a
/// round-trip without losses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Node display name, also the key used by `connections`.
    pub name: String,

    /// Node type identifier understood by the target application.
    #[serde(rename = "type")]
    pub kind: String,

    /// Remaining node fields, passed through untouched.
    #[serde(flatten)]
    pub rest: serde_json::Map<String, Value>,
}

impl Node {
    /// Create a node with no extra fields.
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            rest: serde_json::Map::new(),
        }
    }
}

/// A generated workflow graph awaiting delivery.
///
/// The shape matches the target application's workflow export format:
/// a name, a list of nodes, a `connections` map keyed by node name, and
/// free-form settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    /// Workflow display name.
    pub name: String,

    /// Graph nodes.
    #[serde(default)]
    pub nodes: Vec<Node>,

    /// Outgoing edges per node name; opaque to this crate.
    #[serde(default)]
    pub connections: serde_json::Map<String, Value>,

    /// Workflow-level settings; opaque to this crate.
    #[serde(default)]
    pub settings: Value,
}

impl Artifact {
    /// Create an empty artifact with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: Vec::new(),
            connections: serde_json::Map::new(),
            settings: Value::Null,
        }
    }

    /// Add a node to the graph.
    pub fn with_node(mut self, node: Node) -> Self {
        self.nodes.push(node);
        self
    }

    /// Serialize the graph to its JSON wire form.
    pub fn to_json(&self) -> Result<String, ArtifactError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse a graph from its JSON wire form.
    pub fn from_json(raw: &str) -> Result<Self, ArtifactError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Number of nodes in the graph.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Stable content fingerprint.
    ///
    /// Two artifacts from the same generation turn hash identically, which
    /// is what the delivery orchestrator keys its in-flight guard on.
    pub fn fingerprint(&self) -> String {
        let mut hasher = DefaultHasher::new();
        self.name.hash(&mut hasher);
        for node in &self.nodes {
            node.name.hash(&mut hasher);
            node.kind.hash(&mut hasher);
        }
        self.connections.len().hash(&mut hasher);
        format!("{:016x}", hasher.finish())
    }
}

impl std::fmt::Display for Artifact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({} nodes)", self.name, self.nodes.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Artifact {
        Artifact::new("Daily report")
            .with_node(Node::new("Schedule", "trigger.cron"))
            .with_node(Node::new("Send mail", "action.email"))
    }

    #[test]
    fn test_json_round_trip_preserves_unknown_fields() {
        let raw = r#"{
            "name": "Imported",
            "nodes": [
                {"name": "Hook", "type": "trigger.webhook", "position": [80, 120], "typeVersion": 2}
            ],
            "connections": {"Hook": {"main": [[{"node": "Next", "index": 0}]]}},
            "settings": {"timezone": "UTC"}
        }"#;

        let artifact = Artifact::from_json(raw).unwrap();
        assert_eq!(artifact.name, "Imported");
        assert_eq!(artifact.nodes[0].rest["typeVersion"], 2);

        let reparsed = Artifact::from_json(&artifact.to_json().unwrap()).unwrap();
        assert_eq!(reparsed, artifact);
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        assert!(matches!(
            Artifact::from_json("not a graph"),
            Err(ArtifactError::Malformed(_))
        ));
    }

    #[test]
    fn test_fingerprint_is_stable() {
        assert_eq!(sample().fingerprint(), sample().fingerprint());
    }

    #[test]
    fn test_fingerprint_changes_with_content() {
        let a = sample();
        let b = sample().with_node(Node::new("Extra", "action.http"));
        assert_ne!(a.fingerprint(), b.fingerprint());
    }
}
