//! Heterogeneous Earliest Finish Time (HEFT), Topcuoglu et al.,
//! doi 10.1109/71.993206.

use petgraph::graph::NodeIndex;

use crate::algorithm::{allocate_min_eft, Algorithm, AlgorithmName, SchedulingContext};
use crate::error::Result;

/// Ranks tasks by upward rank and places each on the processor with the
/// earliest finish time.
pub struct Heft;

impl Heft {
    pub fn new() -> Self {
        Self
    }
}

impl Default for Heft {
    fn default() -> Self {
        Self::new()
    }
}

impl Algorithm for Heft {
    fn name(&self) -> AlgorithmName {
        AlgorithmName::Heft
    }

    fn prepare(&mut self, context: &mut SchedulingContext<'_>) -> Result<()> {
        for node in context.dag.node_indices() {
            context.dag[node].priority = context.priority.upward_ranks[node.index()];
        }
        Ok(())
    }

    fn allocate(&mut self, node: NodeIndex, context: &mut SchedulingContext<'_>) -> Result<()> {
        allocate_min_eft(node, context)
    }
}
