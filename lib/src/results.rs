//! Schedule quality metrics computed from a committed schedule.

use petgraph::graph::NodeIndex;

use crate::cost::sum_median_computation_cost;
use crate::error::{Error, Result};
use crate::graph_extension::TaskGraph;
use crate::processor::Processor;

/// Finish time of the last task.
pub fn get_makespan(dag: &TaskGraph) -> Result<f64> {
    if dag.node_count() == 0 {
        return Err(Error::EmptyTaskList);
    }
    Ok(dag
        .node_indices()
        .map(|node| dag[node].finish_time)
        .fold(0.0, f64::max))
}

/// Ratio of the sequential execution time (sum of median computation costs)
/// to the makespan.
pub fn get_speedup(dag: &TaskGraph, processors: &[Processor], makespan: f64) -> Result<f64> {
    if makespan <= 0.0 {
        return Err(Error::ZeroMakespan);
    }
    let all_nodes: Vec<NodeIndex> = dag.node_indices().collect();
    Ok(sum_median_computation_cost(dag, &all_nodes, processors) / makespan)
}

/// Speedup divided by the number of processors.
pub fn get_efficiency(processors: &[Processor], speedup: f64) -> f64 {
    speedup / processors.len() as f64
}

/// Makespan normalized by the sequential execution time of the given tasks,
/// typically the critical-path tasks.
pub fn get_schedule_length_ratio(
    dag: &TaskGraph,
    nodes: &[NodeIndex],
    processors: &[Processor],
    makespan: f64,
) -> Result<f64> {
    if makespan <= 0.0 {
        return Err(Error::ZeroMakespan);
    }
    Ok(makespan / sum_median_computation_cost(dag, nodes, processors))
}

/// Completed tasks per minute.
pub fn get_throughput(number_of_task: f64, makespan: f64) -> f64 {
    (number_of_task / makespan) * 60.0
}

pub fn get_total_running_time(processors: &[Processor]) -> f64 {
    processors.iter().map(|processor| processor.running_time).sum()
}

/// Share of the total busy time spent on this processor, as a percentage.
pub fn get_resource_utilization(processor: &Processor, total_running_time: f64) -> f64 {
    (processor.running_time / total_running_time) * 100.0
}
