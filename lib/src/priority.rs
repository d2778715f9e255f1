//! Rank and cost tables derived from the DAG, computed once per
//! (workflow, processor scenario) pair and shared by every algorithm.

use petgraph::graph::NodeIndex;

use crate::cost::{average_bandwidth, computation_cost, computation_costs, CommunicationCosts};
use crate::error::Result;
use crate::graph_extension::{GraphExtension, TaskGraph};
use crate::processor::Processor;
use crate::util::mean;

const EPSILON: f64 = 1e-10;

/// Tolerant equality used for every comparison of ranks and times.
pub fn is_equal(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

/// The priority tables. Scalar tables are indexed by node index, matrix
/// tables by node index and processor position.
pub struct PriorityTable {
    pub upward_ranks: Vec<f64>,
    pub downward_ranks: Vec<f64>,
    pub upward_rank_matrix: Vec<Vec<f64>>,
    pub optimistic_cost_table: Vec<Vec<f64>>,
    pub pessimistic_cost_table: Vec<Vec<f64>>,
    pub predict_cost_matrix: Vec<Vec<f64>>,
}

/// Arithmetic mean of a matrix row.
pub fn average_rank(matrix: &[Vec<f64>], node: NodeIndex) -> f64 {
    mean(&matrix[node.index()])
}

impl PriorityTable {
    /// Fills all tables in one topological sweep per direction. The upward
    /// tables walk the order in reverse so every child row is complete before
    /// its parents read it; the downward ranks walk it forwards.
    pub fn compute(
        dag: &TaskGraph,
        processors: &[Processor],
        communication_costs: &mut CommunicationCosts,
    ) -> Result<Self> {
        let order = dag.topological_order()?;
        let node_count = dag.node_count();
        let processor_count = processors.len();
        let mean_bandwidth = average_bandwidth(processors);

        let mut upward_ranks = vec![0.0; node_count];
        let mut downward_ranks = vec![0.0; node_count];
        let mut upward_rank_matrix = vec![vec![0.0; processor_count]; node_count];
        let mut optimistic_cost_table = vec![vec![0.0; processor_count]; node_count];
        let mut pessimistic_cost_table = vec![vec![0.0; processor_count]; node_count];
        let mut predict_cost_matrix = vec![vec![0.0; processor_count]; node_count];

        for &node in order.iter().rev() {
            let children = dag.get_children(node);
            let average_computation_cost = mean(&computation_costs(&dag[node], processors));

            if children.is_empty() {
                upward_ranks[node.index()] = average_computation_cost;
                for (p, processor) in processors.iter().enumerate() {
                    let own_cost = computation_cost(&dag[node], processor);
                    upward_rank_matrix[node.index()][p] = own_cost;
                    predict_cost_matrix[node.index()][p] = own_cost;
                }
                continue;
            }

            let mut upward_rank: f64 = 0.0;
            for &child in &children {
                let child_communication =
                    communication_costs.at_bandwidth(dag, node, child, mean_bandwidth);
                upward_rank =
                    upward_rank.max(upward_ranks[child.index()] + child_communication);
            }
            upward_ranks[node.index()] = upward_rank + average_computation_cost;

            for p in 0..processor_count {
                let own_cost = computation_cost(&dag[node], &processors[p]);
                let mut matrix_rank: f64 = 0.0;
                let mut optimistic_cost: f64 = 0.0;
                let mut pessimistic_cost: f64 = 0.0;
                let mut predict_cost: f64 = 0.0;

                for &child in &children {
                    let child_communication =
                        communication_costs.at_bandwidth(dag, node, child, mean_bandwidth);

                    matrix_rank = matrix_rank.max(
                        upward_rank_matrix[child.index()][p] + own_cost + child_communication,
                    );

                    let mut optimistic_child = f64::MAX;
                    let mut pessimistic_child: f64 = 0.0;
                    let mut predict_child = f64::MAX;
                    for (q, other) in processors.iter().enumerate() {
                        let child_cost = computation_cost(&dag[child], other);
                        let crossing = if q == p { 0.0 } else { child_communication };
                        optimistic_child = optimistic_child
                            .min(optimistic_cost_table[child.index()][q] + child_cost + crossing);
                        pessimistic_child = pessimistic_child
                            .max(pessimistic_cost_table[child.index()][q] + child_cost + crossing);
                        predict_child = predict_child.min(
                            predict_cost_matrix[child.index()][q]
                                + computation_cost(&dag[node], other)
                                + child_cost
                                + crossing,
                        );
                    }
                    optimistic_cost = optimistic_cost.max(optimistic_child);
                    pessimistic_cost = pessimistic_cost.max(pessimistic_child);
                    predict_cost = predict_cost.max(predict_child);
                }

                upward_rank_matrix[node.index()][p] = matrix_rank;
                optimistic_cost_table[node.index()][p] = optimistic_cost;
                pessimistic_cost_table[node.index()][p] = pessimistic_cost;
                predict_cost_matrix[node.index()][p] = predict_cost;
            }
        }

        for &node in &order {
            let parents = dag.get_parents(node);
            let mut downward_rank: f64 = 0.0;
            for &parent in &parents {
                let parent_computation = mean(&computation_costs(&dag[parent], processors));
                let parent_communication =
                    communication_costs.at_bandwidth(dag, parent, node, mean_bandwidth);
                downward_rank = downward_rank.max(
                    downward_ranks[parent.index()] + parent_computation + parent_communication,
                );
            }
            downward_ranks[node.index()] = downward_rank;
        }

        Ok(Self {
            upward_ranks,
            downward_ranks,
            upward_rank_matrix,
            optimistic_cost_table,
            pessimistic_cost_table,
            predict_cost_matrix,
        })
    }

    /// Extracts the critical path: the entry task with the largest combined
    /// upward and downward rank, then at each step the first child whose
    /// combined rank equals the entry's.
    pub fn get_critical_path(&self, dag: &TaskGraph) -> Vec<NodeIndex> {
        let combined = |node: NodeIndex| {
            self.upward_ranks[node.index()] + self.downward_ranks[node.index()]
        };

        let mut entry: Option<NodeIndex> = None;
        for node in dag.get_entry_nodes() {
            if entry.map_or(true, |current| combined(node) > combined(current)) {
                entry = Some(node);
            }
        }
        let Some(entry) = entry else {
            return Vec::new();
        };

        let entry_priority = combined(entry);
        let mut critical_path = vec![entry];
        let mut current = Some(entry);
        while let Some(node) = current {
            if dag.is_exit(node) {
                break;
            }
            current = None;
            for child in dag.get_children(node) {
                if is_equal(entry_priority, combined(child)) {
                    critical_path.push(child);
                    current = Some(child);
                    break;
                }
            }
        }
        critical_path
    }
}
