//! Result records for one (workflow, scenario, algorithm) run and the JSON
//! export consumed by downstream analysis scripts.

use std::fs;

use log::info;
use petgraph::graph::NodeIndex;
use serde_derive::Serialize;

use crate::cost::{
    bandwidths, communication_to_computation_ratio, sum_communication_cost,
    sum_median_computation_cost, CommunicationCosts,
};
use crate::error::Result;
use crate::graph_extension::{GraphExtension, TaskGraph};
use crate::priority::{average_rank, PriorityTable};
use crate::processor::Processor;
use crate::results::{
    get_efficiency, get_makespan, get_resource_utilization, get_schedule_length_ratio,
    get_speedup, get_throughput, get_total_running_time,
};
use crate::util::{create_output_path, median};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessorResult {
    pub name: String,
    pub mips: f64,
    pub bandwidth: f64,
    pub resource_utilization: f64,
}

impl ProcessorResult {
    pub fn new(processor: &Processor, total_running_time: f64) -> Self {
        Self {
            name: processor.name.clone(),
            mips: processor.mips,
            bandwidth: processor.bandwidth,
            resource_utilization: get_resource_utilization(processor, total_running_time),
        }
    }
}

/// Metrics and DAG statistics of one committed schedule.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulingResult {
    pub workflow_name: String,
    pub algorithm_name: String,
    pub number_of_task: usize,
    pub number_of_processor: usize,
    pub makespan: f64,
    pub speedup: f64,
    pub efficiency: f64,
    pub schedule_length_ratio: f64,
    pub throughput: f64,
    pub communication_to_computation_ratio: f64,
    pub width: usize,
    pub height: i32,
    pub density: f64,
    pub number_of_edge: usize,
    pub average_task_degree: f64,
    pub total_length: f64,
    pub total_computation_cost: f64,
    pub total_communication_cost: f64,
    pub critical_path_cost: f64,
    pub number_of_critical_task: usize,
    pub upward_ranks: Vec<f64>,
    pub downward_ranks: Vec<f64>,
    pub heterogeneous_upward_ranks: Vec<f64>,
    pub optimistic_costs: Vec<f64>,
    pub pessimistic_costs: Vec<f64>,
    pub predict_costs: Vec<f64>,
    pub predict_ranks: Vec<f64>,
    pub processor_results: Vec<ProcessorResult>,
}

impl SchedulingResult {
    pub fn new(
        workflow_name: &str,
        algorithm_name: &str,
        dag: &TaskGraph,
        processors: &[Processor],
        priority: &PriorityTable,
        communication_costs: &mut CommunicationCosts,
    ) -> Result<Self> {
        let critical_tasks = priority.get_critical_path(dag);
        let all_nodes: Vec<NodeIndex> = dag.node_indices().collect();

        let makespan = get_makespan(dag)?;
        let speedup = get_speedup(dag, processors, makespan)?;
        let efficiency = get_efficiency(processors, speedup);
        let schedule_length_ratio =
            get_schedule_length_ratio(dag, &critical_tasks, processors, makespan)?;
        let throughput = get_throughput(dag.node_count() as f64, makespan);

        let mut critical_path_cost =
            sum_median_computation_cost(dag, &critical_tasks, processors);
        let median_bandwidth = median(&bandwidths(processors));
        for pair in critical_tasks.windows(2) {
            critical_path_cost +=
                communication_costs.at_bandwidth(dag, pair[0], pair[1], median_bandwidth);
        }

        let mut upward_ranks = Vec::with_capacity(dag.node_count());
        let mut downward_ranks = Vec::with_capacity(dag.node_count());
        let mut heterogeneous_upward_ranks = Vec::with_capacity(dag.node_count());
        let mut optimistic_costs = Vec::with_capacity(dag.node_count());
        let mut pessimistic_costs = Vec::with_capacity(dag.node_count());
        let mut predict_costs = Vec::with_capacity(dag.node_count());
        let mut predict_ranks = Vec::with_capacity(dag.node_count());
        for node in dag.node_indices() {
            let out_degree = dag.get_children(node).len() as f64;
            upward_ranks.push(priority.upward_ranks[node.index()]);
            downward_ranks.push(priority.downward_ranks[node.index()]);
            heterogeneous_upward_ranks
                .push(average_rank(&priority.upward_rank_matrix, node) * out_degree);
            optimistic_costs.push(average_rank(&priority.optimistic_cost_table, node));
            pessimistic_costs.push(average_rank(&priority.pessimistic_cost_table, node));
            predict_costs.push(average_rank(&priority.predict_cost_matrix, node));
            predict_ranks.push(average_rank(&priority.predict_cost_matrix, node) * out_degree);
        }

        let total_running_time = get_total_running_time(processors);
        let processor_results = processors
            .iter()
            .map(|processor| ProcessorResult::new(processor, total_running_time))
            .collect();

        Ok(Self {
            workflow_name: workflow_name.to_string(),
            algorithm_name: algorithm_name.to_string(),
            number_of_task: dag.node_count(),
            number_of_processor: processors.len(),
            makespan,
            speedup,
            efficiency,
            schedule_length_ratio,
            throughput,
            communication_to_computation_ratio: communication_to_computation_ratio(
                dag,
                processors,
                communication_costs,
            )?,
            width: dag.get_width(),
            height: dag.get_height(),
            density: dag.get_density(),
            number_of_edge: dag.get_number_of_edges(),
            average_task_degree: dag.get_average_task_degree(),
            total_length: dag.get_total_length(),
            total_computation_cost: sum_median_computation_cost(dag, &all_nodes, processors),
            total_communication_cost: sum_communication_cost(
                dag,
                processors,
                communication_costs,
            ),
            critical_path_cost,
            number_of_critical_task: critical_tasks.len(),
            upward_ranks,
            downward_ranks,
            heterogeneous_upward_ranks,
            optimistic_costs,
            pessimistic_costs,
            predict_costs,
            predict_ranks,
            processor_results,
        })
    }
}

/// Writes the results as pretty-printed JSON to `<dir>/<file_name>.json` and
/// returns the path.
pub fn export_results(
    results: &[SchedulingResult],
    dir_path: &str,
    file_name: &str,
) -> Result<String> {
    let path = create_output_path(dir_path, file_name, "json")?;
    let json = serde_json::to_string_pretty(results)?;
    fs::write(&path, json)?;
    info!(
        "exported {} scheduling results to {}",
        results.len(),
        path.display()
    );
    Ok(path.display().to_string())
}
