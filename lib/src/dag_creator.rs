//! Generate a petgraph DAG object from a workflow DAX file.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use petgraph::graph::NodeIndex;
use roxmltree::{Document, Node};

use crate::error::{Error, Result};
use crate::graph_extension::{GraphExtension, TaskGraph};
use crate::task::{FileItem, FileType, Task};

/// Loads a workflow file and returns the task graph, optionally adding
/// pseudo zero-cost entry and exit tasks and assigning depths.
///
/// # Arguments
///
/// * `path` - workflow DAX/XML file path
/// * `has_port_constraint` - whether sending/receiving latencies are read
/// * `add_pseudo_task` - whether to force a single root and a single exit
pub fn create_task_graph_from_dax(
    path: &Path,
    has_port_constraint: bool,
    add_pseudo_task: bool,
) -> Result<TaskGraph> {
    let content = fs::read_to_string(path)
        .map_err(|error| Error::WorkflowParse(format!("{}: {}", path.display(), error)))?;
    let mut dag = parse_dax(&content, has_port_constraint)?;
    if add_pseudo_task {
        dag.add_pseudo_tasks();
    }
    dag.assign_depths()?;
    Ok(dag)
}

/// Parses DAX content: `<job>` elements become tasks (ids assigned in
/// document order, starting at 1), `<child>` elements become edges from each
/// referenced parent. `runtime` seconds are scaled to a length in
/// instructions; `<uses>` elements become file items.
pub fn parse_dax(content: &str, has_port_constraint: bool) -> Result<TaskGraph> {
    let document =
        Document::parse(content).map_err(|error| Error::WorkflowParse(error.to_string()))?;

    let mut dag = TaskGraph::new();
    let mut task_by_name: HashMap<String, NodeIndex> = HashMap::new();
    let mut current_task_id = 1;

    for element in document.root_element().children().filter(Node::is_element) {
        match element.tag_name().name().to_ascii_lowercase().as_str() {
            "job" => {
                let job_name = element.attribute("id").ok_or_else(|| {
                    Error::WorkflowParse("job element is missing the id attribute".to_string())
                })?;
                let task = create_task_from_job(current_task_id, &element, has_port_constraint)?;
                task_by_name.insert(job_name.to_string(), dag.add_node(task));
                current_task_id += 1;
            }
            "child" => add_task_dependency(&mut dag, &task_by_name, &element),
            _ => {}
        }
    }

    Ok(dag)
}

fn create_task_from_job(
    task_id: i32,
    element: &Node<'_, '_>,
    has_port_constraint: bool,
) -> Result<Task> {
    // runtime is in seconds; the length is expressed in instructions
    let length = match element.attribute("runtime") {
        Some(runtime) => {
            1000.0
                * runtime.parse::<f64>().map_err(|_| {
                    Error::WorkflowParse(format!("non-numeric runtime attribute: {}", runtime))
                })?
        }
        None => 0.0,
    };

    let mut sending_latency = 0.0;
    let mut receiving_latency = 0.0;
    if has_port_constraint {
        sending_latency = latency_attribute(element, "sending")?;
        receiving_latency = latency_attribute(element, "receiving")?;
    }

    let mut file_items = Vec::new();
    for file_element in element.children().filter(Node::is_element) {
        if file_element.tag_name().name().eq_ignore_ascii_case("uses") {
            file_items.push(create_file_item(&file_element)?);
        }
    }

    Ok(Task::new(
        task_id,
        length,
        file_items,
        sending_latency,
        receiving_latency,
    ))
}

fn latency_attribute(element: &Node<'_, '_>, name: &str) -> Result<f64> {
    match element.attribute(name) {
        Some(value) => value.parse().map_err(|_| {
            Error::WorkflowParse(format!("non-numeric {} attribute: {}", name, value))
        }),
        None => Ok(0.0),
    }
}

fn create_file_item(file_element: &Node<'_, '_>) -> Result<FileItem> {
    let name = file_element
        .attribute("name")
        .or_else(|| file_element.attribute("file"))
        .ok_or_else(|| {
            Error::WorkflowParse("uses element is missing the name attribute".to_string())
        })?;
    let size = match file_element.attribute("size") {
        Some(size) => size.parse().map_err(|_| {
            Error::WorkflowParse(format!("non-numeric size attribute: {}", size))
        })?,
        None => 0.0,
    };
    let file_type = match file_element.attribute("link") {
        Some("input") => FileType::Input,
        Some("output") => FileType::Output,
        _ => FileType::None,
    };
    Ok(FileItem::new(name, size, file_type))
}

/// Adds edges from every `<parent ref=...>` of a `<child ref=...>` element.
/// References to unknown jobs are skipped.
fn add_task_dependency(
    dag: &mut TaskGraph,
    task_by_name: &HashMap<String, NodeIndex>,
    element: &Node<'_, '_>,
) {
    let Some(child) = element
        .attribute("ref")
        .and_then(|name| task_by_name.get(name))
    else {
        return;
    };
    for parent_element in element.children().filter(Node::is_element) {
        if let Some(parent) = parent_element
            .attribute("ref")
            .and_then(|name| task_by_name.get(name))
        {
            dag.add_edge(*parent, *child, ());
        }
    }
}

/// Collects the `.xml` and `.dax` files directly inside the workflow
/// directory, sorted by path.
pub fn get_workflow_paths(workflow_directory_path: &str) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(workflow_directory_path).map_err(|error| {
        Error::WorkflowNotFound(format!("{}: {}", workflow_directory_path, error))
    })?;

    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            matches!(
                path.extension().and_then(|extension| extension.to_str()),
                Some("xml") | Some("dax")
            )
        })
        .collect();
    paths.sort();

    if paths.is_empty() {
        return Err(Error::WorkflowNotFound(format!(
            "no input files in {}",
            workflow_directory_path
        )));
    }
    Ok(paths)
}

/// Extracts the workflow name: the portion of the path between the last
/// slash (forward or backward) and the last dot.
pub fn get_workflow_name(workflow_path: &str) -> String {
    let start = workflow_path
        .rfind(|character| character == '/' || character == '\\')
        .map(|position| position + 1)
        .unwrap_or(0);
    let end = workflow_path.rfind('.').unwrap_or(workflow_path.len());
    workflow_path[start..end].to_string()
}
