//! Project graph construction and traversal.
//!
//! The graph is an arena of [`GraphNode`]s connected by "depends on" edges. Edges are
//! user-declared, so a misconfigured project can contain cycles; [`GraphBuilder::build`]
//! runs a depth-first traversal with a visiting marker per node and refuses to produce a
//! graph when it finds one. Dependency order is declaration order so that every analysis
//! built on top of the graph is reproducible.

pub mod description;
pub mod node;

pub use description::GraphDescription;
pub use node::{
    FrameworkKind, FrameworkNode, GraphNode, LibraryNode, Linking, NodeId, PackageProductNode,
    Platform, Product, Target, TargetNode,
};

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{HashMap, HashSet};
use tracing::debug;

use crate::core::XcforgeError;

/// Color states for cycle detection using DFS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    /// Node has not been visited.
    White,
    /// Node is currently being visited (in the DFS stack).
    Gray,
    /// Node has been fully visited.
    Black,
}

/// Incrementally assembles a [`Graph`].
///
/// Nodes must be added before the edges that reference them.
///
/// ```rust
/// use xcforge_cli::graph::{Graph, GraphNode, Platform, Product, Target, TargetNode};
///
/// let mut builder = Graph::builder();
/// let app = builder
///     .add_node(GraphNode::Target(TargetNode::new("/App", Target::new("App", Product::App, Platform::Ios))))
///     .unwrap();
/// let core = builder
///     .add_node(GraphNode::Target(TargetNode::new("/App", Target::new("Core", Product::Framework, Platform::Ios))))
///     .unwrap();
/// builder.add_dependency(&app, &core).unwrap();
/// let graph = builder.build().unwrap();
/// assert_eq!(graph.entry_nodes().len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct GraphBuilder {
    graph: DiGraph<GraphNode, ()>,
    node_map: HashMap<NodeId, NodeIndex>,
}

impl GraphBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a node with this identity has been added.
    #[must_use]
    pub fn contains(&self, id: &NodeId) -> bool {
        self.node_map.contains_key(id)
    }

    /// Add a node, failing if another node already has its identity.
    pub fn add_node(&mut self, node: GraphNode) -> Result<NodeId, XcforgeError> {
        let id = node.id();
        if self.node_map.contains_key(&id) {
            return Err(XcforgeError::DuplicateNode {
                name: id.name,
                path: id.path.display().to_string(),
            });
        }
        let index = self.graph.add_node(node);
        self.node_map.insert(id.clone(), index);
        Ok(id)
    }

    /// Add a node unless an identical one exists, returning its identity.
    ///
    /// A node that shares the identity but differs in kind or linking is a conflicting
    /// declaration and is rejected.
    pub fn ensure_node(&mut self, node: GraphNode) -> Result<NodeId, XcforgeError> {
        let id = node.id();
        match self.node_map.get(&id) {
            Some(&index) if self.graph[index] != node => Err(XcforgeError::ConflictingNode {
                name: id.name,
                path: id.path.display().to_string(),
                existing: declaration(&self.graph[index]),
                requested: declaration(&node),
            }),
            Some(_) => Ok(id),
            None => {
                let index = self.graph.add_node(node);
                self.node_map.insert(id.clone(), index);
                Ok(id)
            }
        }
    }

    /// Look up a node added so far.
    #[must_use]
    pub fn node(&self, id: &NodeId) -> Option<&GraphNode> {
        self.node_map.get(id).map(|&index| &self.graph[index])
    }

    /// Record that `from` depends on `to`.
    ///
    /// Declaring the same dependency twice keeps a single edge.
    pub fn add_dependency(&mut self, from: &NodeId, to: &NodeId) -> Result<(), XcforgeError> {
        let from_idx = self.index(from)?;
        let to_idx = self.index(to)?;
        if !self.graph.contains_edge(from_idx, to_idx) {
            self.graph.add_edge(from_idx, to_idx, ());
        }
        Ok(())
    }

    /// Finish construction, rejecting graphs that contain a cycle.
    pub fn build(self) -> Result<Graph, XcforgeError> {
        let graph = Graph {
            graph: self.graph,
            node_map: self.node_map,
        };
        graph.detect_cycles()?;
        debug!(
            target: "graph",
            "Built graph with {} nodes and {} edges",
            graph.node_count(),
            graph.edge_count()
        );
        Ok(graph)
    }

    fn index(&self, id: &NodeId) -> Result<NodeIndex, XcforgeError> {
        self.node_map.get(id).copied().ok_or_else(|| XcforgeError::TargetNotFound {
            name: id.name.clone(),
            path: id.path.display().to_string(),
        })
    }
}

fn declaration(node: &GraphNode) -> String {
    match node {
        GraphNode::Target(target) => format!("{node} ({})", target.target.product),
        GraphNode::Library(library) => format!("{node} ({})", library.linking.as_str()),
        GraphNode::Framework(framework) => format!("{node} ({})", framework.linking.as_str()),
        GraphNode::Package(_) => node.to_string(),
    }
}

/// An acyclic project graph.
#[derive(Debug)]
pub struct Graph {
    graph: DiGraph<GraphNode, ()>,
    node_map: HashMap<NodeId, NodeIndex>,
}

impl Graph {
    #[must_use]
    pub fn builder() -> GraphBuilder {
        GraphBuilder::new()
    }

    /// Look up a node by identity.
    #[must_use]
    pub fn node(&self, id: &NodeId) -> Option<&GraphNode> {
        self.node_map.get(id).map(|&index| &self.graph[index])
    }

    /// Find a target by name, in insertion order.
    #[must_use]
    pub fn find_target(&self, name: &str) -> Option<&GraphNode> {
        self.nodes().find(|node| node.as_target().is_some_and(|t| t.target.name == name))
    }

    /// All nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.graph.node_indices().map(|index| &self.graph[index])
    }

    /// Nodes nothing else depends on, in insertion order.
    #[must_use]
    pub fn entry_nodes(&self) -> Vec<&GraphNode> {
        self.entry_indices().into_iter().map(|index| &self.graph[index]).collect()
    }

    /// Direct dependencies of a node in declaration order.
    #[must_use]
    pub fn dependencies(&self, id: &NodeId) -> Vec<&GraphNode> {
        self.node_map
            .get(id)
            .map(|&index| {
                self.dependency_indices(index).into_iter().map(|dep| &self.graph[dep]).collect()
            })
            .unwrap_or_default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub(crate) fn index_of(&self, id: &NodeId) -> Option<NodeIndex> {
        self.node_map.get(id).copied()
    }

    pub(crate) fn indices(&self) -> impl Iterator<Item = NodeIndex> {
        self.graph.node_indices()
    }

    pub(crate) fn entry_indices(&self) -> Vec<NodeIndex> {
        self.graph
            .node_indices()
            .filter(|&index| {
                self.graph.neighbors_directed(index, Direction::Incoming).next().is_none()
            })
            .collect()
    }

    pub(crate) fn dependency_indices(&self, index: NodeIndex) -> Vec<NodeIndex> {
        // petgraph lists the most recently added edge first
        let mut deps: Vec<NodeIndex> = self.graph.neighbors(index).collect();
        deps.reverse();
        deps
    }

    pub(crate) fn node_at(&self, index: NodeIndex) -> &GraphNode {
        &self.graph[index]
    }

    /// Detect cycles using DFS with colors.
    ///
    /// Returns [`XcforgeError::CircularDependency`] naming the node whose dependency closes
    /// the cycle and the node it points back to.
    pub fn detect_cycles(&self) -> Result<(), XcforgeError> {
        let mut colors: HashMap<NodeIndex, Color> =
            self.graph.node_indices().map(|index| (index, Color::White)).collect();

        for index in self.graph.node_indices() {
            if colors.get(&index) == Some(&Color::White)
                && let Some((from, to)) = self.dfs_visit(index, &mut colors)
            {
                let from = &self.graph[from];
                let to = &self.graph[to];
                return Err(XcforgeError::CircularDependency {
                    from_name: from.name().to_string(),
                    from_path: from.path().display().to_string(),
                    to_name: to.name().to_string(),
                    to_path: to.path().display().to_string(),
                });
            }
        }

        Ok(())
    }

    fn dfs_visit(
        &self,
        index: NodeIndex,
        colors: &mut HashMap<NodeIndex, Color>,
    ) -> Option<(NodeIndex, NodeIndex)> {
        colors.insert(index, Color::Gray);

        for dep in self.dependency_indices(index) {
            match colors.get(&dep) {
                Some(Color::Gray) => return Some((index, dep)),
                Some(Color::White) => {
                    if let Some(cycle) = self.dfs_visit(dep, colors) {
                        return Some(cycle);
                    }
                }
                _ => {}
            }
        }

        colors.insert(index, Color::Black);
        None
    }

    /// Build a human-readable dependency tree rooted at `root`.
    #[must_use]
    pub fn to_tree_string(&self, root: &NodeId) -> String {
        let mut result = String::new();
        let mut visited = HashSet::new();
        if let Some(&index) = self.node_map.get(root) {
            self.build_tree_string(index, &mut result, "", true, &mut visited);
        }
        result
    }

    fn build_tree_string(
        &self,
        index: NodeIndex,
        result: &mut String,
        prefix: &str,
        is_last: bool,
        visited: &mut HashSet<NodeIndex>,
    ) {
        let connector = if is_last {
            "└── "
        } else {
            "├── "
        };
        let node = &self.graph[index];
        let label = match node {
            GraphNode::Target(target) => {
                format!("{} ({})", target.target.name, target.target.product)
            }
            other => other.to_string(),
        };
        result.push_str(&format!("{prefix}{connector}{label}\n"));

        let child_prefix = if is_last {
            format!("{prefix}    ")
        } else {
            format!("{prefix}│   ")
        };

        let deps = self.dependency_indices(index);
        if !visited.insert(index) {
            if !deps.is_empty() {
                result.push_str(&format!("{child_prefix}└── (shown above)\n"));
            }
            return;
        }

        for (i, dep) in deps.iter().enumerate() {
            let is_last_child = i == deps.len() - 1;
            self.build_tree_string(*dep, result, &child_prefix, is_last_child, visited);
        }
    }
}
