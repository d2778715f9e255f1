//! Critical Path on a Processor (CPOP), Topcuoglu et al.,
//! doi 10.1109/71.993206.

use std::collections::HashSet;

use petgraph::graph::NodeIndex;

use crate::algorithm::{allocate_min_eft, Algorithm, AlgorithmName, SchedulingContext};
use crate::error::Result;
use crate::graph_extension::GraphExtension;
use crate::priority::is_equal;

/// Ranks tasks by the sum of upward and downward rank. Tasks on the critical
/// path are pinned to the fastest processor; all others use min-EFT.
pub struct Cpop {
    critical_path: HashSet<NodeIndex>,
    critical_path_processor: usize,
}

impl Cpop {
    pub fn new() -> Self {
        Self {
            critical_path: HashSet::new(),
            critical_path_processor: 0,
        }
    }
}

impl Default for Cpop {
    fn default() -> Self {
        Self::new()
    }
}

impl Algorithm for Cpop {
    fn name(&self) -> AlgorithmName {
        AlgorithmName::Cpop
    }

    fn prepare(&mut self, context: &mut SchedulingContext<'_>) -> Result<()> {
        for node in context.dag.node_indices() {
            context.dag[node].priority = context.priority.upward_ranks[node.index()]
                + context.priority.downward_ranks[node.index()];
        }

        let mut entry_task: Option<NodeIndex> = None;
        for node in context.dag.get_entry_nodes() {
            if entry_task
                .map_or(true, |current| context.dag[node].priority > context.dag[current].priority)
            {
                entry_task = Some(node);
            }
        }
        let Some(entry_task) = entry_task else {
            return Ok(());
        };

        let critical_path_rank = context.dag[entry_task].priority;
        self.critical_path.insert(entry_task);
        let mut current = Some(entry_task);
        while let Some(node) = current {
            if context.dag.is_exit(node) {
                break;
            }
            current = None;
            for child in context.dag.get_children(node) {
                if is_equal(critical_path_rank, context.dag[child].priority) {
                    self.critical_path.insert(child);
                    current = Some(child);
                    break;
                }
            }
        }

        let mut fastest = 0;
        for (index, processor) in context.processors.iter().enumerate() {
            if processor.mips > context.processors[fastest].mips {
                fastest = index;
            }
        }
        self.critical_path_processor = fastest;
        Ok(())
    }

    fn allocate(&mut self, node: NodeIndex, context: &mut SchedulingContext<'_>) -> Result<()> {
        if self.critical_path.contains(&node) {
            let ready_time = context.earliest_start_time(node, self.critical_path_processor)?;
            context.occupy(node, self.critical_path_processor, ready_time);
            return Ok(());
        }
        allocate_min_eft(node, context)
    }
}
