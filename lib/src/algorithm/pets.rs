//! Performance Effective Task Scheduling (PETS),
//! doi 10.3844/jcssp.2007.94.103.

use petgraph::graph::NodeIndex;

use crate::algorithm::{allocate_min_eft, Algorithm, AlgorithmName, SchedulingContext};
use crate::cost::{average_bandwidth, computation_costs};
use crate::error::Result;
use crate::graph_extension::GraphExtension;
use crate::util::mean;

/// Ranks tasks by the rounded sum of average computation cost, cumulative
/// data transfer cost to the children, and the highest parent rank. Rank
/// ties in the ready set break towards the smaller average computation cost.
/// Selection is plain min-EFT.
pub struct Pets {
    average_computation_costs: Vec<f64>,
}

impl Pets {
    pub fn new() -> Self {
        Self {
            average_computation_costs: Vec::new(),
        }
    }
}

impl Default for Pets {
    fn default() -> Self {
        Self::new()
    }
}

impl Algorithm for Pets {
    fn name(&self) -> AlgorithmName {
        AlgorithmName::Pets
    }

    fn prepare(&mut self, context: &mut SchedulingContext<'_>) -> Result<()> {
        let mean_bandwidth = average_bandwidth(context.processors);
        self.average_computation_costs = context
            .dag
            .node_indices()
            .map(|node| mean(&computation_costs(&context.dag[node], context.processors)))
            .collect();

        // parents first, so the predecessor rank below is already final
        for node in context.dag.topological_order()? {
            let mut data_transfer_cost = 0.0;
            for child in context.dag.get_children(node) {
                data_transfer_cost += context.communication_costs.at_bandwidth(
                    context.dag,
                    node,
                    child,
                    mean_bandwidth,
                );
            }
            let predecessor_rank = context
                .dag
                .get_parents(node)
                .iter()
                .map(|&parent| context.dag[parent].priority)
                .fold(0.0, f64::max);
            context.dag[node].priority = (self.average_computation_costs[node.index()]
                + data_transfer_cost
                + predecessor_rank)
                .round();
        }
        Ok(())
    }

    fn select_ready(&self, ready_tasks: &[NodeIndex], context: &SchedulingContext<'_>) -> usize {
        let mut selected = 0;
        for position in 1..ready_tasks.len() {
            let candidate = ready_tasks[position];
            let current = ready_tasks[selected];
            let candidate_priority = context.dag[candidate].priority;
            let current_priority = context.dag[current].priority;
            if candidate_priority > current_priority
                || (candidate_priority == current_priority
                    && self.average_computation_costs[candidate.index()]
                        < self.average_computation_costs[current.index()])
            {
                selected = position;
            }
        }
        selected
    }

    fn allocate(&mut self, node: NodeIndex, context: &mut SchedulingContext<'_>) -> Result<()> {
        allocate_min_eft(node, context)
    }
}
