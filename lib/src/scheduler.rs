//! Placement machinery shared by every algorithm: earliest start times, the
//! insertion-based earliest-finish-time slot finder, the single-port
//! collision avoider, and the commit pass that turns estimated times into
//! final ones.

use petgraph::graph::NodeIndex;

use crate::cost::{computation_cost, CommunicationCosts};
use crate::error::{Error, Result};
use crate::graph_extension::{GraphExtension, TaskGraph};
use crate::processor::Processor;

/// A reserved send or receive interval on the shared I/O port.
#[derive(Debug, Clone, Copy)]
pub struct Timeslot {
    pub start_time: f64,
    pub finish_time: f64,
}

impl Timeslot {
    pub fn new(start_time: f64, finish_time: f64) -> Self {
        Self {
            start_time,
            finish_time,
        }
    }
}

/// Earliest time the task may start on the given processor: the processor's
/// ready time or the latest parent finish plus communication, whichever is
/// later. With `is_estimation` the estimated times are used, otherwise the
/// committed ones.
///
/// Fails with a precedence violation when a parent has not been committed
/// yet, which would indicate a scheduling bug.
pub fn get_earliest_start_time(
    dag: &TaskGraph,
    node: NodeIndex,
    processors: &[Processor],
    processor_index: usize,
    communication_costs: &mut CommunicationCosts,
    is_estimation: bool,
) -> Result<f64> {
    let processor_ready_time = if is_estimation {
        processors[processor_index].estimated_ready_time
    } else {
        processors[processor_index].ready_time
    };

    let mut max_parent_finish_time: f64 = 0.0;
    for parent in dag.get_parents(node) {
        let parent_task = &dag[parent];
        let parent_finish_time = if is_estimation {
            parent_task.estimated_finish_time
        } else {
            parent_task.finish_time
        };
        if parent_finish_time < 0.0 {
            return Err(Error::PrecedenceViolation);
        }
        let previous_processor = parent_task
            .assigned_processor
            .ok_or(Error::PrecedenceViolation)?;
        let communication_cost = communication_costs.between_processors(
            dag,
            parent,
            node,
            &processors[previous_processor],
            &processors[processor_index],
        );
        max_parent_finish_time = max_parent_finish_time.max(parent_finish_time + communication_cost);
    }

    Ok(processor_ready_time.max(max_parent_finish_time))
}

/// Finds the earliest finish time of `node` on the processor whose schedule
/// is given, never starting before `ready_time` and never overlapping an
/// already placed task. The walk runs from the tail towards the head so the
/// earliest feasible gap wins.
///
/// With `occupy` the task is spliced into the schedule at the found index and
/// its estimated times, its processor assignment, and the processor's
/// estimated ready time are written.
pub fn find_earliest_finish_time(
    dag: &mut TaskGraph,
    schedule: &mut Vec<NodeIndex>,
    node: NodeIndex,
    processors: &mut [Processor],
    processor_index: usize,
    ready_time: f64,
    occupy: bool,
) -> f64 {
    let computation_cost = computation_cost(&dag[node], &processors[processor_index]);

    if schedule.is_empty() {
        if occupy {
            occupy_slot(
                dag,
                schedule,
                node,
                processors,
                processor_index,
                ready_time,
                ready_time + computation_cost,
                0,
            );
        }
        return ready_time + computation_cost;
    }

    let last = *schedule.last().unwrap();
    let mut start_time = ready_time.max(dag[last].estimated_finish_time);
    let mut index = schedule.len();

    let mut current = schedule.len() - 1;
    while current >= 1 {
        let current_event = &dag[schedule[current]];
        let previous_event = &dag[schedule[current - 1]];

        if ready_time > previous_event.estimated_finish_time {
            if ready_time + computation_cost <= current_event.estimated_start_time {
                start_time = ready_time;
                index = current;
            }
            break;
        }

        if previous_event.estimated_finish_time + computation_cost
            <= current_event.estimated_start_time
        {
            start_time = previous_event.estimated_finish_time;
            index = current;
        }

        current -= 1;
    }

    if ready_time + computation_cost <= dag[schedule[0]].estimated_start_time {
        index = 0;
        start_time = ready_time;
    }

    let finish_time = start_time + computation_cost;
    if occupy {
        occupy_slot(
            dag,
            schedule,
            node,
            processors,
            processor_index,
            start_time,
            finish_time,
            index,
        );
    }
    finish_time
}

#[allow(clippy::too_many_arguments)]
fn occupy_slot(
    dag: &mut TaskGraph,
    schedule: &mut Vec<NodeIndex>,
    node: NodeIndex,
    processors: &mut [Processor],
    processor_index: usize,
    start_time: f64,
    finish_time: f64,
    index: usize,
) {
    let task = &mut dag[node];
    task.estimated_start_time = start_time;
    task.estimated_finish_time = finish_time;
    task.assigned_processor = Some(processor_index);
    task.is_estimated = true;
    processors[processor_index].estimated_ready_time = finish_time;
    schedule.insert(index, node);
}

/// Pushes `ready_time` forward until the whole window from the start of the
/// sending phase to the end of the receiving phase clears every reserved
/// slot, each expanded by a 1.0 time-unit buffer on both sides. Zero-cost
/// pseudo tasks pass through untouched.
pub fn avoid_port_collision(
    timeslots: &[Timeslot],
    mut ready_time: f64,
    computation_cost: f64,
    sending_latency: f64,
    receiving_latency: f64,
) -> f64 {
    if timeslots.is_empty() || computation_cost == 0.0 {
        return ready_time;
    }

    let overlap_buffer = 1.0;
    loop {
        let receiving_time = ready_time + sending_latency + computation_cost + receiving_latency;
        let mut has_overlap = false;
        for timeslot in timeslots {
            let start = timeslot.start_time - overlap_buffer;
            let finish = timeslot.finish_time + overlap_buffer;
            if ready_time.max(start) < receiving_time.min(finish) {
                has_overlap = true;
                ready_time = finish;
                break;
            }
        }
        if !has_overlap {
            return ready_time;
        }
    }
}

/// Replays the estimated schedule in priority order and writes the final
/// start and finish times, updating each processor's ready and running time.
///
/// With the port constraint each task's timeline is sending, computation,
/// receiving; the send and receive phases reserve slots on the shared port
/// and later tasks are pushed past them by [`avoid_port_collision`].
pub fn commit_schedule(
    dag: &mut TaskGraph,
    scheduled_order: &[NodeIndex],
    processors: &mut [Processor],
    communication_costs: &mut CommunicationCosts,
    has_port_constraint: bool,
) -> Result<()> {
    let mut timeslots: Vec<Timeslot> = Vec::new();

    for &node in scheduled_order {
        let processor_index = dag[node]
            .assigned_processor
            .ok_or(Error::PrecedenceViolation)?;
        let computation_cost = computation_cost(&dag[node], &processors[processor_index]);
        let mut earliest_start_time = get_earliest_start_time(
            dag,
            node,
            processors,
            processor_index,
            communication_costs,
            false,
        )?;

        if has_port_constraint {
            for parent in dag.get_parents(node) {
                earliest_start_time = earliest_start_time.max(dag[parent].finish_receiving_time);
            }
            let sending_latency = dag[node].sending_latency;
            let receiving_latency = dag[node].receiving_latency;
            let start_sending_time = avoid_port_collision(
                &timeslots,
                earliest_start_time,
                computation_cost,
                sending_latency,
                receiving_latency,
            );
            let finish_sending_time = start_sending_time + sending_latency;
            let start_receiving_time = finish_sending_time + computation_cost;
            let finish_receiving_time = start_receiving_time + receiving_latency;

            let task = &mut dag[node];
            task.ready_time = earliest_start_time;
            task.start_sending_time = start_sending_time;
            task.finish_sending_time = finish_sending_time;
            task.start_time = finish_sending_time;
            task.finish_time = start_receiving_time;
            task.start_receiving_time = start_receiving_time;
            task.finish_receiving_time = finish_receiving_time;

            if computation_cost != 0.0 {
                timeslots.push(Timeslot::new(start_sending_time, finish_sending_time));
                timeslots.push(Timeslot::new(start_receiving_time, finish_receiving_time));
            }

            processors[processor_index].set_ready_time(finish_receiving_time);
            processors[processor_index].add_running_time(computation_cost);
        } else {
            let finish_time = earliest_start_time + computation_cost;
            let task = &mut dag[node];
            task.start_time = earliest_start_time;
            task.finish_time = finish_time;
            processors[processor_index].set_ready_time(finish_time);
            processors[processor_index].add_running_time(computation_cost);
        }
    }

    Ok(())
}

/// Clears all per-task and per-processor state between algorithm runs.
pub fn reset_run(dag: &mut TaskGraph, processors: &mut [Processor]) {
    dag.reset_schedule();
    for processor in processors.iter_mut() {
        processor.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::Task;

    fn create_task(id: i32, length: f64) -> Task {
        Task::new(id, length, Vec::new(), 0.0, 0.0)
    }

    fn create_processors(mips: &[f64]) -> Vec<Processor> {
        mips.iter()
            .enumerate()
            .map(|(i, &m)| Processor::new(i, format!("device-{}", i), m, 100.0, 0.0))
            .collect()
    }

    fn place(
        dag: &mut TaskGraph,
        schedule: &mut Vec<NodeIndex>,
        processors: &mut [Processor],
        node: NodeIndex,
        ready_time: f64,
    ) -> f64 {
        find_earliest_finish_time(dag, schedule, node, processors, 0, ready_time, true)
    }

    #[test]
    fn test_slot_finder_empty_schedule() {
        let mut dag = TaskGraph::new();
        let n0 = dag.add_node(create_task(1, 10.0));
        let mut processors = create_processors(&[1.0]);
        let mut schedule = Vec::new();

        let finish = place(&mut dag, &mut schedule, &mut processors, n0, 3.0);

        assert_eq!(finish, 13.0);
        assert_eq!(dag[n0].estimated_start_time, 3.0);
        assert_eq!(dag[n0].estimated_finish_time, 13.0);
        assert_eq!(dag[n0].assigned_processor, Some(0));
        assert_eq!(processors[0].estimated_ready_time, 13.0);
        assert_eq!(schedule, vec![n0]);
    }

    #[test]
    fn test_slot_finder_appends_when_no_gap_fits() {
        let mut dag = TaskGraph::new();
        let n0 = dag.add_node(create_task(1, 10.0));
        let n1 = dag.add_node(create_task(2, 10.0));
        let mut processors = create_processors(&[1.0]);
        let mut schedule = Vec::new();

        place(&mut dag, &mut schedule, &mut processors, n0, 0.0);
        let finish = place(&mut dag, &mut schedule, &mut processors, n1, 0.0);

        assert_eq!(finish, 20.0);
        assert_eq!(dag[n1].estimated_start_time, 10.0);
        assert_eq!(schedule, vec![n0, n1]);
    }

    #[test]
    fn test_slot_finder_reuses_gap_before_head() {
        let mut dag = TaskGraph::new();
        let n0 = dag.add_node(create_task(1, 10.0));
        let n1 = dag.add_node(create_task(2, 4.0));
        let mut processors = create_processors(&[1.0]);
        let mut schedule = Vec::new();

        // first task starts late, leaving a gap at the front
        place(&mut dag, &mut schedule, &mut processors, n0, 6.0);
        let finish = place(&mut dag, &mut schedule, &mut processors, n1, 0.0);

        assert_eq!(finish, 4.0);
        assert_eq!(dag[n1].estimated_start_time, 0.0);
        assert_eq!(schedule, vec![n1, n0]);
    }

    #[test]
    fn test_slot_finder_reuses_earliest_inner_gap() {
        let mut dag = TaskGraph::new();
        let n0 = dag.add_node(create_task(1, 5.0));
        let n1 = dag.add_node(create_task(2, 5.0));
        let n2 = dag.add_node(create_task(3, 5.0));
        let n3 = dag.add_node(create_task(4, 3.0));
        let mut processors = create_processors(&[1.0]);
        let mut schedule = Vec::new();

        place(&mut dag, &mut schedule, &mut processors, n0, 0.0);
        place(&mut dag, &mut schedule, &mut processors, n1, 9.0);
        place(&mut dag, &mut schedule, &mut processors, n2, 20.0);
        // gaps are [5, 9] and [14, 20]; the first fits and must win
        let finish = place(&mut dag, &mut schedule, &mut processors, n3, 0.0);

        assert_eq!(dag[n3].estimated_start_time, 5.0);
        assert_eq!(finish, 8.0);
        assert_eq!(schedule, vec![n0, n3, n1, n2]);
    }

    #[test]
    fn test_slot_finder_respects_ready_time_inside_gap() {
        let mut dag = TaskGraph::new();
        let n0 = dag.add_node(create_task(1, 5.0));
        let n1 = dag.add_node(create_task(2, 5.0));
        let n2 = dag.add_node(create_task(3, 2.0));
        let mut processors = create_processors(&[1.0]);
        let mut schedule = Vec::new();

        place(&mut dag, &mut schedule, &mut processors, n0, 0.0);
        place(&mut dag, &mut schedule, &mut processors, n1, 12.0);
        // ready time falls inside the [5, 12] gap
        let finish = place(&mut dag, &mut schedule, &mut processors, n2, 8.0);

        assert_eq!(dag[n2].estimated_start_time, 8.0);
        assert_eq!(finish, 10.0);
        assert_eq!(schedule, vec![n0, n2, n1]);
    }

    #[test]
    fn test_earliest_start_time_includes_parent_communication() {
        let mut dag = TaskGraph::new();
        let parent = dag.add_node(create_task(1, 10.0));
        let child = dag.add_node(create_task(2, 10.0));
        dag.add_edge(parent, child, ());
        let mut processors = create_processors(&[1.0, 1.0]);
        let mut costs = CommunicationCosts::new();

        dag[parent].assigned_processor = Some(0);
        dag[parent].estimated_finish_time = 10.0;

        let est = get_earliest_start_time(&dag, child, &processors, 1, &mut costs, true).unwrap();
        assert_eq!(est, 10.0);

        processors[1].estimated_ready_time = 14.0;
        let est = get_earliest_start_time(&dag, child, &processors, 1, &mut costs, true).unwrap();
        assert_eq!(est, 14.0);
    }

    #[test]
    fn test_commit_detects_precedence_violation() {
        let mut dag = TaskGraph::new();
        let parent = dag.add_node(create_task(1, 10.0));
        let child = dag.add_node(create_task(2, 10.0));
        dag.add_edge(parent, child, ());
        let mut processors = create_processors(&[1.0]);
        let mut costs = CommunicationCosts::new();
        dag[parent].assigned_processor = Some(0);
        dag[child].assigned_processor = Some(0);

        // committing the child before its parent must fail
        let result = commit_schedule(&mut dag, &[child], &mut processors, &mut costs, false);
        assert!(matches!(result, Err(Error::PrecedenceViolation)));
    }

    #[test]
    fn test_commit_without_port_constraint() {
        let mut dag = TaskGraph::new();
        let parent = dag.add_node(create_task(1, 10.0));
        let child = dag.add_node(create_task(2, 6.0));
        dag.add_edge(parent, child, ());
        let mut processors = create_processors(&[1.0]);
        let mut costs = CommunicationCosts::new();
        dag[parent].assigned_processor = Some(0);
        dag[child].assigned_processor = Some(0);

        commit_schedule(&mut dag, &[parent, child], &mut processors, &mut costs, false).unwrap();

        assert_eq!(dag[parent].start_time, 0.0);
        assert_eq!(dag[parent].finish_time, 10.0);
        assert_eq!(dag[child].start_time, 10.0);
        assert_eq!(dag[child].finish_time, 16.0);
        assert_eq!(processors[0].ready_time, 16.0);
        assert_eq!(processors[0].running_time, 16.0);
    }

    #[test]
    fn test_avoid_port_collision_no_slots_or_zero_cost() {
        assert_eq!(avoid_port_collision(&[], 5.0, 10.0, 1.0, 1.0), 5.0);
        let slots = [Timeslot::new(4.0, 6.0)];
        assert_eq!(avoid_port_collision(&slots, 5.0, 0.0, 1.0, 1.0), 5.0);
    }

    #[test]
    fn test_avoid_port_collision_pushes_past_buffered_slot() {
        let slots = [Timeslot::new(6.0, 7.0)];
        // window [0, 5] clears the expanded slot [5, 8]
        assert_eq!(avoid_port_collision(&slots, 0.0, 3.0, 1.0, 1.0), 0.0);
        // window [4, 9] overlaps it and is pushed to its end
        assert_eq!(avoid_port_collision(&slots, 4.0, 3.0, 1.0, 1.0), 8.0);
    }

    #[test]
    fn test_avoid_port_collision_iterates_over_chained_slots() {
        let slots = [Timeslot::new(2.0, 3.0), Timeslot::new(5.0, 6.0)];
        // pushed past the first slot into the second, then past both
        assert_eq!(avoid_port_collision(&slots, 1.0, 2.0, 1.0, 1.0), 7.0);
    }

    #[test]
    fn test_reset_run() {
        let mut dag = TaskGraph::new();
        let n0 = dag.add_node(create_task(1, 10.0));
        let mut processors = create_processors(&[1.0]);
        dag[n0].finish_time = 12.0;
        processors[0].set_ready_time(12.0);
        processors[0].add_running_time(10.0);

        reset_run(&mut dag, &mut processors);

        assert_eq!(dag[n0].finish_time, -1.0);
        assert_eq!(processors[0].ready_time, 0.0);
        assert_eq!(processors[0].running_time, 0.0);
    }
}
