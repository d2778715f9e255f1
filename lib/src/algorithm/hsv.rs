//! Heterogeneous Selection Value (HSV), doi 10.1016/j.jpdc.2015.04.005.

use petgraph::graph::NodeIndex;

use crate::algorithm::{Algorithm, AlgorithmName, SchedulingContext};
use crate::cost::computation_cost;
use crate::error::Result;
use crate::graph_extension::GraphExtension;
use crate::priority::average_rank;

/// Ranks tasks by out-degree times the mean of the per-processor upward rank
/// matrix row, and selects the processor minimising the product of the
/// finish time and the remaining distance to the exit.
pub struct Hsv;

impl Hsv {
    pub fn new() -> Self {
        Self
    }
}

impl Default for Hsv {
    fn default() -> Self {
        Self::new()
    }
}

impl Algorithm for Hsv {
    fn name(&self) -> AlgorithmName {
        AlgorithmName::Hsv
    }

    fn prepare(&mut self, context: &mut SchedulingContext<'_>) -> Result<()> {
        for node in context.dag.node_indices() {
            let out_degree = context.dag.get_children(node).len() as f64;
            context.dag[node].priority =
                out_degree * average_rank(&context.priority.upward_rank_matrix, node);
        }
        Ok(())
    }

    fn allocate(&mut self, node: NodeIndex, context: &mut SchedulingContext<'_>) -> Result<()> {
        let mut chosen_processor = 0;
        let mut min_selection_value = f64::MAX;
        let mut best_ready_time = 0.0;

        for processor_index in 0..context.processors.len() {
            let (earliest_start_time, finish_time) = context.evaluate(node, processor_index)?;
            let longest_distance_exit_time = context.priority.upward_rank_matrix[node.index()]
                [processor_index]
                - computation_cost(&context.dag[node], &context.processors[processor_index]);
            let selection_value = finish_time * longest_distance_exit_time;
            if selection_value < min_selection_value {
                min_selection_value = selection_value;
                best_ready_time = earliest_start_time;
                chosen_processor = processor_index;
            }
        }

        context.occupy(node, chosen_processor, best_ready_time);
        Ok(())
    }
}
