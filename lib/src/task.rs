//! Task and file item definitions for the workflow DAG.

/// Direction of a file item relative to its owning task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    Input,
    Output,
    None,
}

/// A file produced or consumed by a task. Only pairs where a parent outputs a
/// file with the same name a child reads as input contribute to the
/// transferred payload between the two tasks.
#[derive(Debug, Clone)]
pub struct FileItem {
    pub name: String,
    pub size: f64,
    pub file_type: FileType,
}

impl FileItem {
    pub fn new(name: &str, size: f64, file_type: FileType) -> Self {
        Self {
            name: name.to_string(),
            size,
            file_type,
        }
    }
}

/// A task in the workflow. Identity (id, length, file items, latencies) is
/// fixed at construction; depth is assigned once after the DAG is built; the
/// remaining fields are per-run scheduling state and are cleared by
/// [`Task::reset`] between algorithm runs.
///
/// `finish_time` stays negative until the commit pass places the task, which
/// is how precedence violations are detected.
#[derive(Debug, Clone)]
pub struct Task {
    pub id: i32,
    pub length: f64,
    pub file_items: Vec<FileItem>,
    pub sending_latency: f64,
    pub receiving_latency: f64,
    pub depth: i32,
    pub priority: f64,
    pub assigned_processor: Option<usize>,
    pub ready_time: f64,
    pub start_time: f64,
    pub finish_time: f64,
    pub estimated_start_time: f64,
    pub estimated_finish_time: f64,
    pub start_sending_time: f64,
    pub finish_sending_time: f64,
    pub start_receiving_time: f64,
    pub finish_receiving_time: f64,
    pub is_estimated: bool,
}

impl Task {
    pub fn new(
        id: i32,
        length: f64,
        file_items: Vec<FileItem>,
        sending_latency: f64,
        receiving_latency: f64,
    ) -> Self {
        Self {
            id,
            length,
            file_items,
            sending_latency,
            receiving_latency,
            depth: 0,
            priority: 0.0,
            assigned_processor: None,
            ready_time: 0.0,
            start_time: 0.0,
            finish_time: -1.0,
            estimated_start_time: 0.0,
            estimated_finish_time: 0.0,
            start_sending_time: 0.0,
            finish_sending_time: 0.0,
            start_receiving_time: 0.0,
            finish_receiving_time: 0.0,
            is_estimated: false,
        }
    }

    /// Clears the per-run scheduling state so the next algorithm starts from
    /// a fresh task. Identity and depth are left untouched.
    pub fn reset(&mut self) {
        self.priority = 0.0;
        self.assigned_processor = None;
        self.ready_time = 0.0;
        self.start_time = 0.0;
        self.finish_time = -1.0;
        self.estimated_start_time = 0.0;
        self.estimated_finish_time = 0.0;
        self.start_sending_time = 0.0;
        self.finish_sending_time = 0.0;
        self.start_receiving_time = 0.0;
        self.finish_receiving_time = 0.0;
        self.is_estimated = false;
    }
}
