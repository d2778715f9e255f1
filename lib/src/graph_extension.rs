//! Structural operations on the workflow DAG (petgraph).

use crate::error::{Error, Result};
use crate::task::Task;

use petgraph::algo::toposort;
use petgraph::graph::{Graph, NodeIndex};
use petgraph::Direction::{Incoming, Outgoing};
use std::collections::HashMap;

/// The workflow DAG. Node weights are tasks, edges are data dependencies.
pub type TaskGraph = Graph<Task, ()>;

pub trait GraphExtension {
    fn get_entry_nodes(&self) -> Vec<NodeIndex>;
    fn get_exit_nodes(&self) -> Vec<NodeIndex>;
    fn get_parents(&self, node: NodeIndex) -> Vec<NodeIndex>;
    fn get_children(&self, node: NodeIndex) -> Vec<NodeIndex>;
    fn is_entry(&self, node: NodeIndex) -> bool;
    fn is_exit(&self, node: NodeIndex) -> bool;
    fn topological_order(&self) -> Result<Vec<NodeIndex>>;
    fn add_pseudo_tasks(&mut self);
    fn assign_depths(&mut self) -> Result<()>;
    fn get_width(&self) -> usize;
    fn get_height(&self) -> i32;
    fn get_number_of_edges(&self) -> usize;
    fn get_density(&self) -> f64;
    fn get_average_task_degree(&self) -> f64;
    fn get_total_length(&self) -> f64;
    fn reset_schedule(&mut self);
}

impl GraphExtension for TaskGraph {
    fn get_entry_nodes(&self) -> Vec<NodeIndex> {
        self.node_indices()
            .filter(|&i| self.neighbors_directed(i, Incoming).next().is_none())
            .collect()
    }

    fn get_exit_nodes(&self) -> Vec<NodeIndex> {
        self.node_indices()
            .filter(|&i| self.neighbors_directed(i, Outgoing).next().is_none())
            .collect()
    }

    fn get_parents(&self, node: NodeIndex) -> Vec<NodeIndex> {
        // petgraph walks neighbors newest-edge first; reverse so callers see
        // edge insertion order.
        let mut parents: Vec<NodeIndex> = self.neighbors_directed(node, Incoming).collect();
        parents.reverse();
        parents
    }

    fn get_children(&self, node: NodeIndex) -> Vec<NodeIndex> {
        let mut children: Vec<NodeIndex> = self.neighbors_directed(node, Outgoing).collect();
        children.reverse();
        children
    }

    fn is_entry(&self, node: NodeIndex) -> bool {
        self.neighbors_directed(node, Incoming).next().is_none()
    }

    fn is_exit(&self, node: NodeIndex) -> bool {
        self.neighbors_directed(node, Outgoing).next().is_none()
    }

    fn topological_order(&self) -> Result<Vec<NodeIndex>> {
        toposort(self, None)
            .map_err(|_| Error::WorkflowParse("workflow graph contains a cycle".to_string()))
    }

    /// Inserts a zero-cost pseudo entry when the DAG has multiple roots and a
    /// zero-cost pseudo exit when it has multiple exits. The pseudo entry
    /// takes id 0, the pseudo exit takes the maximum id plus one.
    fn add_pseudo_tasks(&mut self) {
        let entry_nodes = self.get_entry_nodes();
        let exit_nodes = self.get_exit_nodes();
        if entry_nodes.len() == 1 && exit_nodes.len() == 1 {
            return;
        }

        if entry_nodes.len() > 1 {
            let pseudo_entry = self.add_node(Task::new(0, 0.0, Vec::new(), 0.0, 0.0));
            for entry in entry_nodes {
                self.add_edge(pseudo_entry, entry, ());
            }
        }
        if exit_nodes.len() > 1 {
            let max_id = self.node_indices().map(|i| self[i].id).max().unwrap_or(-1);
            let pseudo_exit = self.add_node(Task::new(max_id + 1, 0.0, Vec::new(), 0.0, 0.0));
            for exit in exit_nodes {
                self.add_edge(exit, pseudo_exit, ());
            }
        }
    }

    /// Assigns each task its depth: 1 for roots, one more than the deepest
    /// parent otherwise. Fails when the graph is not acyclic.
    fn assign_depths(&mut self) -> Result<()> {
        let order = self.topological_order()?;
        for node in order {
            let depth = self
                .get_parents(node)
                .iter()
                .map(|&parent| self[parent].depth)
                .max()
                .unwrap_or(0);
            self[node].depth = depth + 1;
        }
        Ok(())
    }

    fn get_width(&self) -> usize {
        let mut depth_counts: HashMap<i32, usize> = HashMap::new();
        for node in self.node_indices() {
            *depth_counts.entry(self[node].depth).or_insert(0) += 1;
        }
        depth_counts.values().copied().max().unwrap_or(0)
    }

    fn get_height(&self) -> i32 {
        self.node_indices()
            .map(|node| self[node].depth)
            .max()
            .unwrap_or(0)
    }

    fn get_number_of_edges(&self) -> usize {
        self.edge_count()
    }

    fn get_density(&self) -> f64 {
        let number_of_task = self.node_count() as f64;
        self.edge_count() as f64 / (number_of_task * (number_of_task - 1.0) / 2.0)
    }

    fn get_average_task_degree(&self) -> f64 {
        self.edge_count() as f64 / self.node_count() as f64
    }

    fn get_total_length(&self) -> f64 {
        self.node_indices().map(|node| self[node].length).sum()
    }

    fn reset_schedule(&mut self) {
        for node in self.node_indices() {
            self[node].reset();
        }
    }
}
