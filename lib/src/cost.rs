//! Computation and communication cost library.
//!
//! Communication costs are memoised per (bandwidth, parent, child) because the
//! priority tables query the same edges many times. The cache must be dropped
//! when the processor scenario changes, since bandwidths change with it.

use std::collections::{HashMap, HashSet};

use petgraph::graph::NodeIndex;

use crate::error::{Error, Result};
use crate::graph_extension::{GraphExtension, TaskGraph};
use crate::processor::Processor;
use crate::task::{FileType, Task};
use crate::util::{mean, median};

/// Computation cost of a task on a processor, in seconds.
pub fn computation_cost(task: &Task, processor: &Processor) -> f64 {
    task.length / processor.mips
}

/// Computation cost of a task on every processor, in processor order.
pub fn computation_costs(task: &Task, processors: &[Processor]) -> Vec<f64> {
    processors
        .iter()
        .map(|processor| computation_cost(task, processor))
        .collect()
}

pub fn bandwidths(processors: &[Processor]) -> Vec<f64> {
    processors.iter().map(|processor| processor.bandwidth).collect()
}

/// Memoised communication costs, keyed by bandwidth bits and the task pair.
#[derive(Default)]
pub struct CommunicationCosts {
    cache: HashMap<(u64, NodeIndex, NodeIndex), f64>,
}

impl CommunicationCosts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cost of the edge (parent, child) when the two tasks run on the given
    /// processors. Zero on the same host; otherwise the payload is carried at
    /// the smaller of the two link bandwidths.
    pub fn between_processors(
        &mut self,
        dag: &TaskGraph,
        parent: NodeIndex,
        child: NodeIndex,
        previous_processor: &Processor,
        current_processor: &Processor,
    ) -> f64 {
        if previous_processor.id == current_processor.id {
            return 0.0;
        }
        let bandwidth = previous_processor.bandwidth.min(current_processor.bandwidth);
        self.at_bandwidth(dag, parent, child, bandwidth)
    }

    /// Cost of the edge (parent, child) at an explicit bandwidth, typically
    /// the mean or median bandwidth of the scenario.
    pub fn at_bandwidth(
        &mut self,
        dag: &TaskGraph,
        parent: NodeIndex,
        child: NodeIndex,
        bandwidth: f64,
    ) -> f64 {
        let key = (bandwidth.to_bits(), parent, child);
        if let Some(&cost) = self.cache.get(&key) {
            return cost;
        }
        // convert from byte to megabyte, then to megabits
        let megabits = transferred_bytes(dag, parent, child) / 1_000_000.0 * 8.0;
        let cost = megabits / bandwidth;
        self.cache.insert(key, cost);
        cost
    }
}

/// Sum of the sizes of the child's input files that the parent produces.
fn transferred_bytes(dag: &TaskGraph, parent: NodeIndex, child: NodeIndex) -> f64 {
    let parent_output_names: HashSet<&str> = dag[parent]
        .file_items
        .iter()
        .filter(|item| item.file_type == FileType::Output)
        .map(|item| item.name.as_str())
        .collect();

    dag[child]
        .file_items
        .iter()
        .filter(|item| {
            item.file_type == FileType::Input && parent_output_names.contains(item.name.as_str())
        })
        .map(|item| item.size)
        .sum()
}

/// Sum over the given tasks of the median computation cost across processors.
pub fn sum_median_computation_cost(
    dag: &TaskGraph,
    nodes: &[NodeIndex],
    processors: &[Processor],
) -> f64 {
    nodes
        .iter()
        .map(|&node| median(&computation_costs(&dag[node], processors)))
        .sum()
}

/// Sum over all edges of the communication cost at the median bandwidth.
pub fn sum_communication_cost(
    dag: &TaskGraph,
    processors: &[Processor],
    communication_costs: &mut CommunicationCosts,
) -> f64 {
    let median_bandwidth = median(&bandwidths(processors));
    let mut sum = 0.0;
    for node in dag.node_indices() {
        for child in dag.get_children(node) {
            sum += communication_costs.at_bandwidth(dag, node, child, median_bandwidth);
        }
    }
    sum
}

/// Ratio of total communication cost to total computation cost.
pub fn communication_to_computation_ratio(
    dag: &TaskGraph,
    processors: &[Processor],
    communication_costs: &mut CommunicationCosts,
) -> Result<f64> {
    let all_nodes: Vec<NodeIndex> = dag.node_indices().collect();
    let total_computation_cost = sum_median_computation_cost(dag, &all_nodes, processors);
    if total_computation_cost <= 0.0 {
        return Err(Error::ZeroComputation);
    }
    let total_communication_cost = sum_communication_cost(dag, processors, communication_costs);
    Ok(total_communication_cost / total_computation_cost)
}

/// Mean bandwidth of the scenario, used by the priority tables.
pub fn average_bandwidth(processors: &[Processor]) -> f64 {
    mean(&bandwidths(processors))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::FileItem;

    fn create_processor(id: usize, mips: f64, bandwidth: f64) -> Processor {
        Processor::new(id, format!("device-{}", id), mips, bandwidth, 0.0)
    }

    fn create_linked_pair() -> TaskGraph {
        let mut dag = TaskGraph::new();
        let producer = dag.add_node(Task::new(
            1,
            10.0,
            vec![
                FileItem::new("a.out", 2_000_000.0, FileType::Output),
                FileItem::new("a.in", 5_000_000.0, FileType::Input),
            ],
            0.0,
            0.0,
        ));
        let consumer = dag.add_node(Task::new(
            2,
            20.0,
            vec![
                FileItem::new("a.out", 2_000_000.0, FileType::Input),
                FileItem::new("other", 9_000_000.0, FileType::Input),
            ],
            0.0,
            0.0,
        ));
        dag.add_edge(producer, consumer, ());
        dag
    }

    #[test]
    fn test_computation_cost() {
        let processor = create_processor(0, 4.0, 100.0);
        let task = Task::new(1, 10.0, Vec::new(), 0.0, 0.0);
        assert_eq!(computation_cost(&task, &processor), 2.5);
    }

    #[test]
    fn test_communication_cost_matches_produced_inputs_only() {
        let dag = create_linked_pair();
        let mut costs = CommunicationCosts::new();
        // 2 MB payload -> 16 megabits, carried at 8 megabits per second
        let cost = costs.at_bandwidth(&dag, NodeIndex::new(0), NodeIndex::new(1), 8.0);
        assert!((cost - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_communication_cost_zero_on_same_processor() {
        let dag = create_linked_pair();
        let mut costs = CommunicationCosts::new();
        let processor = create_processor(0, 1.0, 8.0);
        let cost = costs.between_processors(
            &dag,
            NodeIndex::new(0),
            NodeIndex::new(1),
            &processor,
            &processor,
        );
        assert_eq!(cost, 0.0);
    }

    #[test]
    fn test_communication_cost_uses_minimum_bandwidth() {
        let dag = create_linked_pair();
        let mut costs = CommunicationCosts::new();
        let fast = create_processor(0, 1.0, 16.0);
        let slow = create_processor(1, 1.0, 8.0);
        let cost =
            costs.between_processors(&dag, NodeIndex::new(0), NodeIndex::new(1), &fast, &slow);
        assert!((cost - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_communication_cost_is_cached_per_bandwidth() {
        let dag = create_linked_pair();
        let mut costs = CommunicationCosts::new();
        let first = costs.at_bandwidth(&dag, NodeIndex::new(0), NodeIndex::new(1), 8.0);
        let second = costs.at_bandwidth(&dag, NodeIndex::new(0), NodeIndex::new(1), 8.0);
        assert_eq!(first, second);
        assert_eq!(costs.cache.len(), 1);
        costs.at_bandwidth(&dag, NodeIndex::new(0), NodeIndex::new(1), 4.0);
        assert_eq!(costs.cache.len(), 2);
    }

    #[test]
    fn test_sum_median_computation_cost() {
        let dag = create_linked_pair();
        let processors = vec![create_processor(0, 1.0, 8.0), create_processor(1, 2.0, 8.0)];
        let nodes: Vec<NodeIndex> = dag.node_indices().collect();
        // medians: (10 + 5) / 2 = 7.5 and (20 + 10) / 2 = 15
        assert_eq!(sum_median_computation_cost(&dag, &nodes, &processors), 22.5);
    }

    #[test]
    fn test_ccr_rejects_zero_computation() {
        let mut dag = TaskGraph::new();
        dag.add_node(Task::new(1, 0.0, Vec::new(), 0.0, 0.0));
        let processors = vec![create_processor(0, 1.0, 8.0)];
        let mut costs = CommunicationCosts::new();
        assert!(matches!(
            communication_to_computation_ratio(&dag, &processors, &mut costs),
            Err(Error::ZeroComputation)
        ));
    }
}
