use chrono::{DateTime, Utc};
use clap::Parser;
use log::{error, info};

use lib::algorithm::{create_algorithm, SchedulingContext, DEFAULT_ALGORITHMS};
use lib::config::Config;
use lib::cost::CommunicationCosts;
use lib::dag_creator::{create_task_graph_from_dax, get_workflow_name, get_workflow_paths};
use lib::environment::EnvironmentSetting;
use lib::output::{export_results, SchedulingResult};
use lib::priority::PriorityTable;
use lib::scheduler::{commit_schedule, reset_run};

#[derive(Parser)]
#[clap(
    name = "task_scheduling_simulator",
    version = "1.0",
    about = "About:
    Simulates static list scheduling of workflow DAGs onto heterogeneous
    processors and reports makespan, speedup, efficiency, schedule length
    ratio, throughput, and per-processor utilization for each algorithm."
)]
struct ArgParser {
    ///Path to the properties file with the simulation inputs.
    #[clap(short = 'c', long = "config_file_path", required = true)]
    config_file_path: String,
    ///Path to output directory.
    #[clap(short = 'o', long = "output_dir_path", default_value = "./outputs")]
    output_dir_path: String,
    ///Name of the result file, without extension. Defaults to a timestamp.
    #[clap(short = 'r', long = "result_name")]
    result_name: Option<String>,
}

fn main() {
    env_logger::init();
    let arg: ArgParser = ArgParser::parse();
    if let Err(err) = run(&arg) {
        error!("simulation aborted: {}", err);
        std::process::exit(1);
    }
}

fn run(arg: &ArgParser) -> lib::Result<()> {
    let config = Config::load(&arg.config_file_path)?;
    let environment = EnvironmentSetting::load(config.get("environmentSettingPath")?)?;
    let workflow_paths = get_workflow_paths(config.get("workflowDirectoryPath")?)?;

    let results = simulate(&environment, &workflow_paths)?;

    let result_name = arg.result_name.clone().unwrap_or_else(|| {
        let now: DateTime<Utc> = Utc::now();
        format!("{}-results", now.format("%Y-%m-%d-%H-%M-%S"))
    });
    export_results(&results, &arg.output_dir_path, &result_name)?;
    Ok(())
}

/// Runs every default algorithm on every (workflow, processor scenario)
/// combination. Task and processor state is reset between algorithms; the
/// communication-cost cache lives for one scenario because bandwidths change
/// across scenarios.
fn simulate(
    environment: &EnvironmentSetting,
    workflow_paths: &[std::path::PathBuf],
) -> lib::Result<Vec<SchedulingResult>> {
    let mut results =
        Vec::with_capacity(workflow_paths.len() * environment.scenarios.len() * DEFAULT_ALGORITHMS.len());

    for workflow_path in workflow_paths {
        let workflow_name = get_workflow_name(&workflow_path.display().to_string());
        let mut dag = create_task_graph_from_dax(
            workflow_path,
            environment.has_port_constraint,
            environment.add_pseudo_task,
        )?;
        info!("loaded workflow {} with {} tasks", workflow_name, dag.node_count());

        for scenario in &environment.scenarios {
            let mut processors = scenario.clone();
            let mut communication_costs = CommunicationCosts::new();
            let priority = PriorityTable::compute(&dag, &processors, &mut communication_costs)?;

            for algorithm_name in DEFAULT_ALGORITHMS {
                let mut algorithm = create_algorithm(algorithm_name);
                let scheduled_order = {
                    let mut context = SchedulingContext::new(
                        &mut dag,
                        &mut processors,
                        &priority,
                        &mut communication_costs,
                    );
                    algorithm.run(&mut context)?
                };
                commit_schedule(
                    &mut dag,
                    &scheduled_order,
                    &mut processors,
                    &mut communication_costs,
                    environment.has_port_constraint,
                )?;

                results.push(SchedulingResult::new(
                    &workflow_name,
                    &algorithm_name.to_string(),
                    &dag,
                    &processors,
                    &priority,
                    &mut communication_costs,
                )?);

                reset_run(&mut dag, &mut processors);
            }
        }
    }

    Ok(results)
}
