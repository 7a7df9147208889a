//! Cache keys for graph targets.
//!
//! A target's key covers everything that changes its build output as far as the graph
//! knows: its name, product, platform, any extra configuration strings supplied by the
//! caller, and the keys of its dependencies in declaration order. Keys of shared
//! dependencies are computed once per hasher.

use petgraph::graph::NodeIndex;
use std::collections::{BTreeMap, HashMap};

use super::{ContentHasher, ContentHashing};
use crate::graph::{Graph, GraphNode, NodeId};

/// Computes memoized cache keys for every node in a graph.
pub struct GraphContentHasher<'g, H = ContentHasher> {
    graph: &'g Graph,
    hasher: H,
    additional_strings: Vec<String>,
    cache: HashMap<NodeIndex, String>,
}

impl<'g> GraphContentHasher<'g, ContentHasher> {
    #[must_use]
    pub fn new(graph: &'g Graph) -> Self {
        Self::with_hasher(graph, ContentHasher::new())
    }
}

impl<'g, H: ContentHashing> GraphContentHasher<'g, H> {
    pub fn with_hasher(graph: &'g Graph, hasher: H) -> Self {
        Self {
            graph,
            hasher,
            additional_strings: Vec::new(),
            cache: HashMap::new(),
        }
    }

    /// Mix configuration (for example the build configuration name) into target keys.
    #[must_use]
    pub fn with_additional_strings(mut self, strings: Vec<String>) -> Self {
        self.additional_strings = strings;
        self.cache.clear();
        self
    }

    /// Key of the target with this identity, if the graph has it.
    pub fn hash_target(&mut self, id: &NodeId) -> Option<String> {
        let index = self.graph.index_of(id)?;
        self.graph.node_at(index).as_target()?;
        Some(self.hash_node(index))
    }

    /// Keys of every target in the graph.
    pub fn target_hashes(&mut self) -> BTreeMap<NodeId, String> {
        let graph = self.graph;
        let targets: Vec<NodeIndex> =
            graph.indices().filter(|&i| graph.node_at(i).as_target().is_some()).collect();
        targets
            .into_iter()
            .map(|index| (self.graph.node_at(index).id(), self.hash_node(index)))
            .collect()
    }

    fn hash_node(&mut self, index: NodeIndex) -> String {
        if let Some(hash) = self.cache.get(&index) {
            return hash.clone();
        }

        let graph = self.graph;
        let hash = match graph.node_at(index) {
            GraphNode::Target(node) => {
                let mut components = vec![
                    "target".to_string(),
                    node.target.name.clone(),
                    node.target.product.as_str().to_string(),
                    node.target.platform.case_value().to_string(),
                ];
                components.extend(self.additional_strings.iter().cloned());
                for dependency in graph.dependency_indices(index) {
                    components.push(self.hash_node(dependency));
                }
                self.hasher.hash_strings(&components)
            }
            GraphNode::Library(node) => {
                let path = node.path.to_string_lossy();
                self.hasher.hash_strings(&["library", &*path, node.linking.as_str()])
            }
            GraphNode::Framework(node) => {
                let path = node.path.to_string_lossy();
                self.hasher.hash_strings(&["framework", &*path, node.linking.as_str()])
            }
            GraphNode::Package(node) => {
                self.hasher.hash_strings(&["package", node.product.as_str()])
            }
        };

        self.cache.insert(index, hash.clone());
        hash
    }
}
