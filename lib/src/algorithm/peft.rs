//! Predict Earliest Finish Time (PEFT), doi 10.1109/TPDS.2013.57.

use petgraph::graph::NodeIndex;

use crate::algorithm::{Algorithm, AlgorithmName, SchedulingContext};
use crate::error::Result;
use crate::priority::average_rank;

/// Ranks tasks by the mean of the optimistic cost table row and selects the
/// processor minimising optimistic cost plus finish time.
pub struct Peft;

impl Peft {
    pub fn new() -> Self {
        Self
    }
}

impl Default for Peft {
    fn default() -> Self {
        Self::new()
    }
}

impl Algorithm for Peft {
    fn name(&self) -> AlgorithmName {
        AlgorithmName::Peft
    }

    fn prepare(&mut self, context: &mut SchedulingContext<'_>) -> Result<()> {
        for node in context.dag.node_indices() {
            context.dag[node].priority =
                average_rank(&context.priority.optimistic_cost_table, node);
        }
        Ok(())
    }

    fn allocate(&mut self, node: NodeIndex, context: &mut SchedulingContext<'_>) -> Result<()> {
        let mut chosen_processor = 0;
        let mut min_optimistic_finish_time = f64::MAX;
        let mut best_ready_time = 0.0;

        for processor_index in 0..context.processors.len() {
            let (earliest_start_time, finish_time) = context.evaluate(node, processor_index)?;
            let optimistic_finish_time = context.priority.optimistic_cost_table[node.index()]
                [processor_index]
                + finish_time;
            if optimistic_finish_time < min_optimistic_finish_time {
                min_optimistic_finish_time = optimistic_finish_time;
                best_ready_time = earliest_start_time;
                chosen_processor = processor_index;
            }
        }

        context.occupy(node, chosen_processor, best_ready_time);
        Ok(())
    }
}
