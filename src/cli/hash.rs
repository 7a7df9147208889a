use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use crate::core::XcforgeError;
use crate::graph::Graph;
use crate::graph::description::load_graph;
use crate::hashing::GraphContentHasher;

/// Command to print target cache keys.
#[derive(Args, Debug)]
pub struct HashCommand {
    /// Path to the graph description
    #[arg(short, long, default_value = "graph.toml")]
    graph: PathBuf,

    /// Only print the key of this target
    #[arg(short, long)]
    target: Option<String>,

    /// Extra strings mixed into every key, such as the build configuration
    ///
    /// May be repeated; order matters.
    #[arg(long = "configuration", value_name = "STRING")]
    configuration: Vec<String>,
}

impl HashCommand {
    pub fn execute(self) -> Result<()> {
        let graph = load_graph(&self.graph)?;
        for (name, hash) in self.hashes(&graph)? {
            println!("{name} {hash}");
        }
        Ok(())
    }

    /// `(target name, key)` pairs, ordered by target identity.
    fn hashes(&self, graph: &Graph) -> Result<Vec<(String, String)>, XcforgeError> {
        let mut hasher =
            GraphContentHasher::new(graph).with_additional_strings(self.configuration.clone());

        match &self.target {
            Some(name) => {
                let not_found = || XcforgeError::TargetNotFound {
                    name: name.clone(),
                    path: self.graph.display().to_string(),
                };
                let id = graph.find_target(name).ok_or_else(not_found)?.id();
                let hash = hasher.hash_target(&id).ok_or_else(not_found)?;
                Ok(vec![(name.clone(), hash)])
            }
            None => Ok(hasher.target_hashes().into_iter().map(|(id, hash)| (id.name, hash)).collect()),
        }
    }
}
