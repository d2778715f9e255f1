//! Scheduling algorithm strategies. Each policy supplies a task priority and
//! a processor-selection objective; the list-scheduling control loop and the
//! slot finder are shared.

mod cpop;
mod heft;
mod hsv;
mod ipeft;
mod ippts;
mod peft;
mod pets;
mod ppts;

pub use cpop::Cpop;
pub use heft::Heft;
pub use hsv::Hsv;
pub use ipeft::Ipeft;
pub use ippts::Ippts;
pub use peft::Peft;
pub use pets::Pets;
pub use ppts::Ppts;

use std::collections::HashSet;
use std::fmt;

use log::info;
use petgraph::graph::NodeIndex;

use crate::cost::CommunicationCosts;
use crate::error::Result;
use crate::graph_extension::{GraphExtension, TaskGraph};
use crate::priority::PriorityTable;
use crate::processor::Processor;
use crate::scheduler::{find_earliest_finish_time, get_earliest_start_time};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlgorithmName {
    Heft,
    Cpop,
    Hsv,
    Ppts,
    Peft,
    Ipeft,
    Ippts,
    Pets,
}

impl fmt::Display for AlgorithmName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AlgorithmName::Heft => "HEFT",
            AlgorithmName::Cpop => "CPOP",
            AlgorithmName::Hsv => "HSV",
            AlgorithmName::Ppts => "PPTS",
            AlgorithmName::Peft => "PEFT",
            AlgorithmName::Ipeft => "IPEFT",
            AlgorithmName::Ippts => "IPPTS",
            AlgorithmName::Pets => "PETS",
        };
        write!(f, "{}", name)
    }
}

/// The algorithms run by the default simulation sweep.
pub const DEFAULT_ALGORITHMS: [AlgorithmName; 7] = [
    AlgorithmName::Heft,
    AlgorithmName::Cpop,
    AlgorithmName::Hsv,
    AlgorithmName::Ppts,
    AlgorithmName::Peft,
    AlgorithmName::Ipeft,
    AlgorithmName::Ippts,
];

pub fn create_algorithm(name: AlgorithmName) -> Box<dyn Algorithm> {
    match name {
        AlgorithmName::Heft => Box::new(Heft::new()),
        AlgorithmName::Cpop => Box::new(Cpop::new()),
        AlgorithmName::Hsv => Box::new(Hsv::new()),
        AlgorithmName::Ppts => Box::new(Ppts::new()),
        AlgorithmName::Peft => Box::new(Peft::new()),
        AlgorithmName::Ipeft => Box::new(Ipeft::new()),
        AlgorithmName::Ippts => Box::new(Ippts::new()),
        AlgorithmName::Pets => Box::new(Pets::new()),
    }
}

/// Mutable state of one scheduling run: the DAG, the processors, the shared
/// priority tables, the communication-cost cache, and one ordered task list
/// per processor.
pub struct SchedulingContext<'a> {
    pub dag: &'a mut TaskGraph,
    pub processors: &'a mut [Processor],
    pub priority: &'a PriorityTable,
    pub communication_costs: &'a mut CommunicationCosts,
    pub schedules: Vec<Vec<NodeIndex>>,
}

impl<'a> SchedulingContext<'a> {
    pub fn new(
        dag: &'a mut TaskGraph,
        processors: &'a mut [Processor],
        priority: &'a PriorityTable,
        communication_costs: &'a mut CommunicationCosts,
    ) -> Self {
        let schedules = vec![Vec::new(); processors.len()];
        Self {
            dag,
            processors,
            priority,
            communication_costs,
            schedules,
        }
    }

    /// Estimated earliest start time of the task on the given processor.
    pub fn earliest_start_time(&mut self, node: NodeIndex, processor_index: usize) -> Result<f64> {
        get_earliest_start_time(
            self.dag,
            node,
            self.processors,
            processor_index,
            self.communication_costs,
            true,
        )
    }

    /// Probes a processor: the estimated earliest start time and the finish
    /// time the slot finder would achieve, without reserving the slot.
    pub fn evaluate(&mut self, node: NodeIndex, processor_index: usize) -> Result<(f64, f64)> {
        let earliest_start_time = self.earliest_start_time(node, processor_index)?;
        let finish_time = find_earliest_finish_time(
            self.dag,
            &mut self.schedules[processor_index],
            node,
            self.processors,
            processor_index,
            earliest_start_time,
            false,
        );
        Ok((earliest_start_time, finish_time))
    }

    /// Reserves the winning slot on the chosen processor.
    pub fn occupy(&mut self, node: NodeIndex, processor_index: usize, ready_time: f64) {
        find_earliest_finish_time(
            self.dag,
            &mut self.schedules[processor_index],
            node,
            self.processors,
            processor_index,
            ready_time,
            true,
        );
    }
}

/// A list-scheduling policy. `prepare` assigns every task its scalar
/// priority (and builds any policy-internal tables); `allocate` picks a
/// processor for one task. The ready-set loop in [`Algorithm::run`] is shared
/// by all policies.
pub trait Algorithm {
    fn name(&self) -> AlgorithmName;

    fn prepare(&mut self, context: &mut SchedulingContext<'_>) -> Result<()>;

    fn allocate(&mut self, node: NodeIndex, context: &mut SchedulingContext<'_>) -> Result<()>;

    /// Picks the next task from the ready set: the highest priority wins,
    /// ties go to the task that entered the set first.
    fn select_ready(&self, ready_tasks: &[NodeIndex], context: &SchedulingContext<'_>) -> usize {
        let mut selected = 0;
        for position in 1..ready_tasks.len() {
            if context.dag[ready_tasks[position]].priority
                > context.dag[ready_tasks[selected]].priority
            {
                selected = position;
            }
        }
        selected
    }

    /// Runs the two scheduling phases and returns all tasks ordered by
    /// estimated start time (ties by estimated finish time), which is the
    /// order the commit pass replays.
    fn run(&mut self, context: &mut SchedulingContext<'_>) -> Result<Vec<NodeIndex>> {
        info!(
            "{} running with {} tasks on {} processors",
            self.name(),
            context.dag.node_count(),
            context.processors.len()
        );

        self.prepare(context)?;

        let mut ready_tasks = context.dag.get_entry_nodes();
        let mut executed_tasks: HashSet<NodeIndex> = HashSet::new();
        while !ready_tasks.is_empty() {
            let position = self.select_ready(&ready_tasks, context);
            let node = ready_tasks.remove(position);
            self.allocate(node, context)?;
            executed_tasks.insert(node);
            for child in context.dag.get_children(node) {
                let all_parents_executed = context
                    .dag
                    .get_parents(child)
                    .iter()
                    .all(|parent| executed_tasks.contains(parent));
                if all_parents_executed {
                    ready_tasks.push(child);
                }
            }
        }

        let mut scheduled_order: Vec<NodeIndex> = context.dag.node_indices().collect();
        scheduled_order.sort_by(|&a, &b| {
            context.dag[a]
                .estimated_start_time
                .partial_cmp(&context.dag[b].estimated_start_time)
                .unwrap()
                .then(
                    context.dag[a]
                        .estimated_finish_time
                        .partial_cmp(&context.dag[b].estimated_finish_time)
                        .unwrap(),
                )
        });
        Ok(scheduled_order)
    }
}

/// The min-EFT selection shared by HEFT and PETS: probe every processor and
/// reserve the slot on the one with the smallest finish time.
pub(crate) fn allocate_min_eft(
    node: NodeIndex,
    context: &mut SchedulingContext<'_>,
) -> Result<()> {
    let mut chosen_processor = 0;
    let mut earliest_finish_time = f64::MAX;
    let mut best_ready_time = 0.0;

    for processor_index in 0..context.processors.len() {
        let (earliest_start_time, finish_time) = context.evaluate(node, processor_index)?;
        if finish_time < earliest_finish_time {
            best_ready_time = earliest_start_time;
            earliest_finish_time = finish_time;
            chosen_processor = processor_index;
        }
    }

    context.occupy(node, chosen_processor, best_ready_time);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_algorithm_names() {
        assert_eq!(AlgorithmName::Heft.to_string(), "HEFT");
        assert_eq!(AlgorithmName::Ipeft.to_string(), "IPEFT");
        assert_eq!(DEFAULT_ALGORITHMS.len(), 7);
        assert!(!DEFAULT_ALGORITHMS.contains(&AlgorithmName::Pets));
    }

    #[test]
    fn test_factory_covers_every_algorithm() {
        for name in [
            AlgorithmName::Heft,
            AlgorithmName::Cpop,
            AlgorithmName::Hsv,
            AlgorithmName::Ppts,
            AlgorithmName::Peft,
            AlgorithmName::Ipeft,
            AlgorithmName::Ippts,
            AlgorithmName::Pets,
        ] {
            assert_eq!(create_algorithm(name).name(), name);
        }
    }
}
