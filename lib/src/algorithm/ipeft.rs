//! Improved Predict Earliest Finish Time (IPEFT), doi 10.1002/cpe.3944.

use std::collections::HashSet;

use petgraph::graph::NodeIndex;

use crate::algorithm::{Algorithm, AlgorithmName, SchedulingContext};
use crate::cost::{average_bandwidth, computation_cost, computation_costs};
use crate::error::Result;
use crate::graph_extension::GraphExtension;
use crate::priority::{average_rank, is_equal};
use crate::util::mean;

/// Ranks tasks by the mean pessimistic cost plus the mean computation cost.
/// Tasks whose average earliest and latest start times coincide are critical
/// nodes; a task with a critical child is placed by plain min-EFT, all
/// others add the critical-node cost table to the objective.
pub struct Ipeft {
    critical_nodes: HashSet<NodeIndex>,
    critical_node_cost_table: Vec<Vec<f64>>,
}

impl Ipeft {
    pub fn new() -> Self {
        Self {
            critical_nodes: HashSet::new(),
            critical_node_cost_table: Vec::new(),
        }
    }

    fn contains_critical_child(&self, node: NodeIndex, context: &SchedulingContext<'_>) -> bool {
        if self.critical_nodes.contains(&node) {
            return false;
        }
        context
            .dag
            .get_children(node)
            .iter()
            .any(|child| self.critical_nodes.contains(child))
    }
}

impl Default for Ipeft {
    fn default() -> Self {
        Self::new()
    }
}

impl Algorithm for Ipeft {
    fn name(&self) -> AlgorithmName {
        AlgorithmName::Ipeft
    }

    fn prepare(&mut self, context: &mut SchedulingContext<'_>) -> Result<()> {
        let order = context.dag.topological_order()?;
        let node_count = context.dag.node_count();
        let processor_count = context.processors.len();
        let mean_bandwidth = average_bandwidth(context.processors);

        // average earliest start times, walking away from the entries
        let mut average_earliest_start_times = vec![0.0; node_count];
        for &node in &order {
            let mut earliest: f64 = 0.0;
            for parent in context.dag.get_parents(node) {
                let parent_computation =
                    mean(&computation_costs(&context.dag[parent], context.processors));
                let parent_communication = context.communication_costs.at_bandwidth(
                    context.dag,
                    parent,
                    node,
                    mean_bandwidth,
                );
                earliest = earliest.max(
                    average_earliest_start_times[parent.index()]
                        + parent_computation
                        + parent_communication,
                );
            }
            average_earliest_start_times[node.index()] = earliest;
        }

        // average latest start times, walking back from the exits
        let mut average_latest_start_times = vec![0.0; node_count];
        for &node in order.iter().rev() {
            let children = context.dag.get_children(node);
            if children.is_empty() {
                average_latest_start_times[node.index()] =
                    average_earliest_start_times[node.index()];
                continue;
            }
            let average_computation =
                mean(&computation_costs(&context.dag[node], context.processors));
            let mut latest = f64::MAX;
            for &child in &children {
                let child_communication = context.communication_costs.at_bandwidth(
                    context.dag,
                    node,
                    child,
                    mean_bandwidth,
                );
                latest =
                    latest.min(average_latest_start_times[child.index()] - child_communication);
            }
            average_latest_start_times[node.index()] = latest - average_computation;
        }

        self.critical_nodes.clear();
        for node in context.dag.node_indices() {
            if is_equal(
                average_earliest_start_times[node.index()],
                average_latest_start_times[node.index()],
            ) {
                self.critical_nodes.insert(node);
            }
        }

        for node in context.dag.node_indices() {
            let average_computation =
                mean(&computation_costs(&context.dag[node], context.processors));
            context.dag[node].priority =
                average_rank(&context.priority.pessimistic_cost_table, node) + average_computation;
        }

        // critical-node cost table, filled child rows first
        self.critical_node_cost_table = vec![vec![0.0; processor_count]; node_count];
        for &node in order.iter().rev() {
            let children = context.dag.get_children(node);
            if children.is_empty() {
                continue;
            }
            for p in 0..processor_count {
                let mut critical_node_cost: f64 = 0.0;
                for &child in &children {
                    let child_communication = context.communication_costs.at_bandwidth(
                        context.dag,
                        node,
                        child,
                        mean_bandwidth,
                    );
                    let mut min_child_cost = f64::MAX;
                    for (q, other) in context.processors.iter().enumerate() {
                        let child_cost = computation_cost(&context.dag[child], other);
                        let crossing = if q == p { 0.0 } else { child_communication };
                        min_child_cost = min_child_cost.min(
                            self.critical_node_cost_table[child.index()][q]
                                + child_cost
                                + crossing,
                        );
                    }
                    critical_node_cost = critical_node_cost.max(min_child_cost);
                }
                self.critical_node_cost_table[node.index()][p] = critical_node_cost;
            }
        }

        Ok(())
    }

    fn allocate(&mut self, node: NodeIndex, context: &mut SchedulingContext<'_>) -> Result<()> {
        let contains_critical_child = self.contains_critical_child(node, context);
        let mut chosen_processor = 0;
        let mut min_selection_value = f64::MAX;
        let mut best_ready_time = 0.0;

        for processor_index in 0..context.processors.len() {
            let (earliest_start_time, finish_time) = context.evaluate(node, processor_index)?;
            let critical_node_cost = self.critical_node_cost_table[node.index()][processor_index];
            let selection_value = if contains_critical_child {
                finish_time
            } else {
                finish_time + critical_node_cost
            };
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
