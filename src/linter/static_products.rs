//! Detection of static products linked more than once.
//!
//! Linking a static product copies its code into the linking binary. When two binaries
//! that end up in the same product both link it, the code (and any global state it holds)
//! is duplicated. The linter walks the graph depth-first from every entry node carrying
//! the static products seen so far:
//!
//! - a static product joins the `unlinked` set of everything above it;
//! - a target that links static products moves every `unlinked` product into `linked`,
//!   recording itself as one of that product's linkers;
//! - anything else passes its dependencies' products through untouched.
//!
//! Results are memoized per node for the duration of a single [`lint`] call, so shared
//! subgraphs are analyzed once and their contribution merged into every branch.
//!
//! [`lint`]: StaticProductsGraphLinter::lint

use petgraph::graph::NodeIndex;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use tracing::{debug, warn};

use super::{GraphLinter, LintingIssue};
use crate::graph::{Graph, GraphNode, Product};

/// Static products reachable from a node, split by whether something already linked them.
#[derive(Debug, Clone, Default)]
struct StaticProducts {
    unlinked: BTreeSet<NodeIndex>,
    linked: BTreeMap<NodeIndex, BTreeSet<NodeIndex>>,
}

impl StaticProducts {
    fn merge(&mut self, other: &Self) {
        self.unlinked.extend(other.unlinked.iter().copied());
        for (product, linkers) in &other.linked {
            self.linked.entry(*product).or_default().extend(linkers.iter().copied());
        }
    }
}

/// A static product with the targets that link it, ordered by [`Self::description`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct StaticDependencyWarning {
    description: String,
    static_product: NodeIndex,
    linking_nodes: Vec<NodeIndex>,
}

/// Per-call traversal state.
struct Analysis<'g> {
    graph: &'g Graph,
    cache: HashMap<NodeIndex, StaticProducts>,
    visiting: HashSet<NodeIndex>,
}

impl<'g> Analysis<'g> {
    fn new(graph: &'g Graph) -> Self {
        Self {
            graph,
            cache: HashMap::new(),
            visiting: HashSet::new(),
        }
    }

    fn visit(&mut self, index: NodeIndex) -> StaticProducts {
        if let Some(cached) = self.cache.get(&index) {
            return cached.clone();
        }

        // Built graphs are acyclic; this only guards against recursing forever.
        if !self.visiting.insert(index) {
            warn!(target: "lint", "Skipping {} already on the traversal stack", self.graph.node_at(index));
            return StaticProducts::default();
        }

        let graph = self.graph;
        let node = graph.node_at(index);
        let mut results = StaticProducts::default();
        if matches!(node, GraphNode::Target(_)) {
            for dependency in graph.dependency_indices(index) {
                let dependency_results = self.visit(dependency);
                results.merge(&dependency_results);
            }
        }
        self.visiting.remove(&index);

        if node.is_static_product() {
            results.unlinked.insert(index);
            self.cache.insert(index, results.clone());
            return results;
        }

        match node {
            GraphNode::Target(target) if target.target.product.can_link_static_products() => {
                for product in std::mem::take(&mut results.unlinked) {
                    results.linked.entry(product).or_default().insert(index);
                }
                self.cache.insert(index, results.clone());
                results
            }
            _ => results,
        }
    }

    fn warning(
        &self,
        static_product: NodeIndex,
        linked_by: &BTreeSet<NodeIndex>,
    ) -> Option<StaticDependencyWarning> {
        let graph = self.graph;
        let product_of = |index: NodeIndex| graph.node_at(index).as_target().map(|t| t.target.product);

        // Test bundles share dependencies with their host app; generation drops the
        // duplicate link, so the pair is not a conflict.
        let apps: HashSet<NodeIndex> =
            linked_by.iter().copied().filter(|&l| product_of(l) == Some(Product::App)).collect();
        let hosted_test_bundles: HashSet<NodeIndex> = linked_by
            .iter()
            .copied()
            .filter(|&l| product_of(l).is_some_and(Product::is_tests_bundle))
            .filter(|&l| graph.dependency_indices(l).iter().any(|dep| apps.contains(dep)))
            .collect();

        let mut links: Vec<NodeIndex> =
            linked_by.iter().copied().filter(|l| !hosted_test_bundles.contains(l)).collect();
        if links.len() < 2 {
            return None;
        }

        links.sort_by(|a, b| {
            graph.node_at(*a).name().cmp(graph.node_at(*b).name()).then(a.cmp(b))
        });
        let names: Vec<&str> = links.iter().map(|&l| graph.node_at(l).name()).collect();

        Some(StaticDependencyWarning {
            description: format!("{} > {:?}", graph.node_at(static_product).name(), names),
            static_product,
            linking_nodes: links,
        })
    }

    fn issue(&self, warning: &StaticDependencyWarning) -> LintingIssue {
        let names: Vec<&str> =
            warning.linking_nodes.iter().map(|&l| self.graph.node_at(l).name()).collect();
        LintingIssue::warning(format!(
            "{} has been linked against {:?}, it is a static product so may introduce unwanted side effects.",
            self.graph.node_at(warning.static_product),
            names
        ))
    }
}

/// Reports static products that more than one target links.
#[derive(Debug, Default, Clone, Copy)]
pub struct StaticProductsGraphLinter;

impl StaticProductsGraphLinter {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl GraphLinter for StaticProductsGraphLinter {
    fn lint(&self, graph: &Graph) -> Vec<LintingIssue> {
        let mut analysis = Analysis::new(graph);
        let mut warnings = BTreeSet::new();

        for entry in graph.entry_indices() {
            if analysis.cache.contains_key(&entry) {
                continue;
            }
            let results = analysis.visit(entry);
            for (product, linked_by) in &results.linked {
                if let Some(warning) = analysis.warning(*product, linked_by) {
                    warnings.insert(warning);
                }
            }
        }

        debug!(target: "lint", "Found {} static linking conflicts", warnings.len());
        warnings.iter().map(|warning| analysis.issue(warning)).collect()
    }
}
