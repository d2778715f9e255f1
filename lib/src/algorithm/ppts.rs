//! Predict Priority Task Scheduling (PPTS), doi 10.1145/3339186.3339206.

use petgraph::graph::NodeIndex;

use crate::algorithm::{Algorithm, AlgorithmName, SchedulingContext};
use crate::error::Result;
use crate::priority::average_rank;

/// Ranks tasks by the mean of the predict cost matrix row and selects the
/// processor minimising predicted cost plus finish time.
pub struct Ppts;

impl Ppts {
    pub fn new() -> Self {
        Self
    }
}

impl Default for Ppts {
    fn default() -> Self {
        Self::new()
    }
}

impl Algorithm for Ppts {
    fn name(&self) -> AlgorithmName {
        AlgorithmName::Ppts
    }

    fn prepare(&mut self, context: &mut SchedulingContext<'_>) -> Result<()> {
        for node in context.dag.node_indices() {
            context.dag[node].priority = average_rank(&context.priority.predict_cost_matrix, node);
        }
        Ok(())
    }

    fn allocate(&mut self, node: NodeIndex, context: &mut SchedulingContext<'_>) -> Result<()> {
        let mut chosen_processor = 0;
        let mut min_look_ahead = f64::MAX;
        let mut best_ready_time = 0.0;

        for processor_index in 0..context.processors.len() {
            let (earliest_start_time, finish_time) = context.evaluate(node, processor_index)?;
            let look_ahead =
                context.priority.predict_cost_matrix[node.index()][processor_index] + finish_time;
            if look_ahead < min_look_ahead {
                min_look_ahead = look_ahead;
                best_ready_time = earliest_start_time;
                chosen_processor = processor_index;
            }
        }

        context.occupy(node, chosen_processor, best_ready_time);
        Ok(())
    }
}
