//! Road adjacency graph
//!
//! A static map from each road to its ordered list of alternatives. The
//! relation is undirected in intent but stored as directed entries, so
//! validation enforces that every listed alternative is itself a key and
//! that no road lists itself. List order matters: it breaks score ties
//! during selection.

use std::collections::HashMap;
use std::path::Path;

use thiserror::Error;

/// Errors from loading or validating an adjacency graph
#[derive(Debug, Error)]
pub enum GraphError {
    /// Could not read the adjacency file
    #[error("failed to read adjacency file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Adjacency file is not a JSON map of string lists
    #[error("failed to parse adjacency file '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// A road lists itself as an alternative
    #[error("road '{road}' lists itself as an alternative")]
    SelfLoop { road: String },

    /// An alternative has no entry of its own
    #[error("road '{road}' lists unknown alternative '{alt}'")]
    UnknownAlternative { road: String, alt: String },
}

/// Road adjacency map.
#[derive(Debug, Clone)]
pub struct AdjacencyGraph {
    routes: HashMap<String, Vec<String>>,
}

impl AdjacencyGraph {
    /// The built-in city graph used when no file override is configured.
    pub fn city_default() -> Self {
        let routes = HashMap::from([
            (
                "RING-NORTH-12".to_string(),
                vec!["RING-SOUTH-09".to_string(), "CITY-CENTER-01".to_string()],
            ),
            (
                "RING-SOUTH-09".to_string(),
                vec!["RING-NORTH-12".to_string(), "CITY-CENTER-01".to_string()],
            ),
            (
                "CITY-CENTER-01".to_string(),
                vec!["RING-NORTH-12".to_string(), "RING-SOUTH-09".to_string()],
            ),
            (
                "AIRPORT-AXIS-03".to_string(),
                vec!["RING-SOUTH-09".to_string(), "UNIVERSITY-LOOP-07".to_string()],
            ),
            (
                "UNIVERSITY-LOOP-07".to_string(),
                vec!["AIRPORT-AXIS-03".to_string(), "CITY-CENTER-01".to_string()],
            ),
        ]);
        Self { routes }
    }

    /// Load and validate a graph from a JSON file of the shape
    /// `{"ROAD": ["ALT", ...], ...}`.
    pub fn from_file(path: &Path) -> Result<Self, GraphError> {
        let contents = std::fs::read_to_string(path).map_err(|source| GraphError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let routes: HashMap<String, Vec<String>> =
            serde_json::from_str(&contents).map_err(|source| GraphError::Parse {
                path: path.display().to_string(),
                source,
            })?;

        Self::from_map(routes)
    }

    /// Validate and wrap an adjacency map.
    pub fn from_map(routes: HashMap<String, Vec<String>>) -> Result<Self, GraphError> {
        for (road, alternatives) in &routes {
            for alt in alternatives {
                if alt == road {
                    return Err(GraphError::SelfLoop { road: road.clone() });
                }
                if !routes.contains_key(alt) {
                    return Err(GraphError::UnknownAlternative {
                        road: road.clone(),
                        alt: alt.clone(),
                    });
                }
            }
        }
        Ok(Self { routes })
    }

    /// Ordered alternatives for a road, if it is part of the graph.
    pub fn alternatives(&self, road_id: &str) -> Option<&[String]> {
        self.routes.get(road_id).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_graph_is_valid() {
        let graph = AdjacencyGraph::city_default();
        assert_eq!(graph.len(), 5);
        // Re-validating the built-in map must succeed.
        assert!(AdjacencyGraph::from_map(graph.routes.clone()).is_ok());
    }

    #[test]
    fn test_alternatives_preserve_order() {
        let graph = AdjacencyGraph::city_default();
        let alternatives = graph.alternatives("RING-NORTH-12").unwrap();
        assert_eq!(alternatives, ["RING-SOUTH-09", "CITY-CENTER-01"]);
        assert!(graph.alternatives("UNKNOWN-99").is_none());
    }

    #[test]
    fn test_self_loop_rejected() {
        let map = HashMap::from([("A".to_string(), vec!["A".to_string()])]);
        assert!(matches!(
            AdjacencyGraph::from_map(map),
            Err(GraphError::SelfLoop { .. })
        ));
    }

    #[test]
    fn test_unknown_alternative_rejected() {
        let map = HashMap::from([("A".to_string(), vec!["B".to_string()])]);
        assert!(matches!(
            AdjacencyGraph::from_map(map),
            Err(GraphError::UnknownAlternative { .. })
        ));
    }
}
