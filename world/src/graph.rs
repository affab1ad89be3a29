//! Static world graph supplied to the session.

use std::{
    collections::HashSet,
    fs, io,
    path::{Path, PathBuf},
};

use neural_terra_core::{AssetType, GraphEdge, NodeId, Planet, WorldNode};
use serde::Deserialize;
use thiserror::Error;

/// Builtin node list embedded in the crate.
pub const BUILTIN_WORLD_NODES: &str = include_str!("data/world_nodes.json");

#[derive(Debug, Deserialize)]
struct WorldGraphFile {
    nodes: Vec<WorldNode>,
    #[serde(default)]
    edges: Vec<GraphEdge>,
}

/// Read-only world nodes with unique identifiers and the directed edges
/// shocks ripple along.
#[derive(Clone, Debug, PartialEq)]
pub struct WorldGraph {
    nodes: Vec<WorldNode>,
    edges: Vec<GraphEdge>,
}

impl WorldGraph {
    /// Parses the embedded node list.
    #[must_use]
    pub fn builtin() -> Self {
        Self::from_json_str(BUILTIN_WORLD_NODES).expect("builtin world nodes should parse")
    }

    /// Builds a graph, rejecting duplicate node ids and edges that name
    /// unknown nodes or carry non-finite coefficients.
    pub fn from_parts(
        nodes: Vec<WorldNode>,
        edges: Vec<GraphEdge>,
    ) -> Result<Self, WorldGraphError> {
        let mut seen = HashSet::with_capacity(nodes.len());
        for node in &nodes {
            if !seen.insert(&node.id) {
                return Err(WorldGraphError::DuplicateId {
                    id: node.id.clone(),
                });
            }
        }
        for edge in &edges {
            for endpoint in [&edge.source, &edge.target] {
                if !seen.contains(endpoint) {
                    return Err(WorldGraphError::UnknownEdgeEndpoint {
                        id: endpoint.clone(),
                    });
                }
            }
            if !edge.weight.is_finite() || !edge.decay.is_finite() {
                return Err(WorldGraphError::NonFiniteEdge {
                    source_id: edge.source.clone(),
                    target_id: edge.target.clone(),
                });
            }
        }
        Ok(Self { nodes, edges })
    }

    /// Parses a `{"nodes": [...], "edges": [...]}` document.
    pub fn from_json_str(json: &str) -> Result<Self, WorldGraphError> {
        let parsed: WorldGraphFile = serde_json::from_str(json)?;
        Self::from_parts(parsed.nodes, parsed.edges)
    }

    /// Reads and parses a node list from disk.
    pub fn from_file(path: &Path) -> Result<Self, WorldGraphError> {
        let contents = fs::read_to_string(path).map_err(|source| WorldGraphError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let graph = Self::from_json_str(&contents)?;
        tracing::info!(
            target: "neural_terra::world",
            path = %path.display(),
            nodes = graph.len(),
            edges = graph.edges.len(),
            "world_graph.loaded=file"
        );
        Ok(graph)
    }

    /// Every node in document order.
    #[must_use]
    pub fn nodes(&self) -> &[WorldNode] {
        &self.nodes
    }

    /// Every edge in document order.
    #[must_use]
    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    /// Looks up a node by id.
    #[must_use]
    pub fn get(&self, id: &NodeId) -> Option<&WorldNode> {
        self.nodes.iter().find(|node| &node.id == id)
    }

    /// Asset type of the node with the given id.
    #[must_use]
    pub fn asset_type_of(&self, id: &NodeId) -> Option<AssetType> {
        self.get(id).map(|node| node.asset_type)
    }

    /// Nodes located on `planet`, in document order.
    #[must_use]
    pub fn on_planet(&self, planet: Planet) -> Vec<WorldNode> {
        self.nodes
            .iter()
            .filter(|node| node.planet == planet)
            .cloned()
            .collect()
    }

    /// Resolves ids to nodes, skipping and logging unknown ones.
    #[must_use]
    pub fn resolve(&self, ids: &[NodeId]) -> Vec<WorldNode> {
        ids.iter()
            .filter_map(|id| {
                let node = self.get(id);
                if node.is_none() {
                    tracing::warn!(
                        target: "neural_terra::world",
                        node = %id,
                        "world_graph.unknown_node"
                    );
                }
                node.cloned()
            })
            .collect()
    }

    /// Number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Reports whether the graph holds no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl Default for WorldGraph {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Failure to load a world graph.
#[derive(Debug, Error)]
pub enum WorldGraphError {
    /// The document was not valid JSON.
    #[error("failed to parse world graph: {0}")]
    Parse(#[from] serde_json::Error),
    /// The document could not be read.
    #[error("failed to read world graph from {path:?}: {source}")]
    Read {
        /// Path that failed to load.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// Two nodes share an identifier.
    #[error("duplicate world node `{id}`")]
    DuplicateId {
        /// Repeated identifier.
        id: NodeId,
    },
    /// An edge names a node the graph does not contain.
    #[error("edge endpoint `{id}` is not a world node")]
    UnknownEdgeEndpoint {
        /// Missing identifier.
        id: NodeId,
    },
    /// An edge carries a non-finite weight or decay.
    #[error("edge `{source_id}` -> `{target_id}` has a non-finite coefficient")]
    NonFiniteEdge {
        /// Edge source.
        source_id: NodeId,
        /// Edge target.
        target_id: NodeId,
    },
}
