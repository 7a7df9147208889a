use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use crate::core::XcforgeError;
use crate::graph::Graph;
use crate::graph::description::load_graph;

/// Command to print the dependency tree of a graph description.
#[derive(Args, Debug)]
pub struct GraphCommand {
    /// Path to the graph description
    #[arg(short, long, default_value = "graph.toml")]
    graph: PathBuf,

    /// Print only the tree below this target
    ///
    /// Without it, one tree is printed per entry node (nodes nothing depends on).
    #[arg(short, long)]
    root: Option<String>,
}

impl GraphCommand {
    pub fn execute(self) -> Result<()> {
        let graph = load_graph(&self.graph)?;
        print!("{}", self.render(&graph)?);
        Ok(())
    }

    fn render(&self, graph: &Graph) -> Result<String, XcforgeError> {
        let roots = match &self.root {
            Some(name) => {
                let node = graph.find_target(name).ok_or_else(|| XcforgeError::TargetNotFound {
                    name: name.clone(),
                    path: self.graph.display().to_string(),
                })?;
                vec![node]
            }
            None => graph.entry_nodes(),
        };

        Ok(roots.into_iter().map(|node| graph.to_tree_string(&node.id())).collect())
    }
}
