//! Improved Predict Priority Task Scheduling (IPPTS),
//! doi 10.1109/TPDS.2020.3041829.

use petgraph::graph::NodeIndex;

use crate::algorithm::{Algorithm, AlgorithmName, SchedulingContext};
use crate::cost::computation_cost;
use crate::error::Result;
use crate::graph_extension::GraphExtension;
use crate::priority::average_rank;

/// Ranks tasks by out-degree times the mean predict cost row and selects the
/// processor minimising the finish time plus the remaining predicted
/// distance to the exit.
pub struct Ippts;

impl Ippts {
    pub fn new() -> Self {
        Self
    }
}

impl Default for Ippts {
    fn default() -> Self {
        Self::new()
    }
}

impl Algorithm for Ippts {
    fn name(&self) -> AlgorithmName {
        AlgorithmName::Ippts
    }

    fn prepare(&mut self, context: &mut SchedulingContext<'_>) -> Result<()> {
        for node in context.dag.node_indices() {
            let out_degree = context.dag.get_children(node).len() as f64;
            context.dag[node].priority =
                out_degree * average_rank(&context.priority.predict_cost_matrix, node);
        }
        Ok(())
    }

    fn allocate(&mut self, node: NodeIndex, context: &mut SchedulingContext<'_>) -> Result<()> {
        let mut chosen_processor = 0;
        let mut min_look_ahead_finish_time = f64::MAX;
        let mut best_ready_time = 0.0;

        for processor_index in 0..context.processors.len() {
            let (earliest_start_time, finish_time) = context.evaluate(node, processor_index)?;
            let looking_head_exit_time = context.priority.predict_cost_matrix[node.index()]
                [processor_index]
                - computation_cost(&context.dag[node], &context.processors[processor_index]);
            let look_ahead_finish_time = finish_time + looking_head_exit_time;
            if look_ahead_finish_time < min_look_ahead_finish_time {
                min_look_ahead_finish_time = look_ahead_finish_time;
                best_ready_time = earliest_start_time;
                chosen_processor = processor_index;
            }
        }

        context.occupy(node, chosen_processor, best_ready_time);
        Ok(())
    }
}
