//! Processor model. Compute rate and link bandwidth are fixed per scenario;
//! ready and running times are per-run state.

/// A processor in the simulated environment. `ready_time` tracks committed
/// placements, `estimated_ready_time` tracks the selection phase, and
/// `running_time` accumulates busy time for the utilization metric.
#[derive(Debug, Clone)]
pub struct Processor {
    pub id: usize,
    pub name: String,
    pub mips: f64,
    pub bandwidth: f64,
    pub cost_per_mips: f64,
    pub ready_time: f64,
    pub estimated_ready_time: f64,
    pub running_time: f64,
}

impl Processor {
    pub fn new(id: usize, name: String, mips: f64, bandwidth: f64, cost_per_mips: f64) -> Self {
        Self {
            id,
            name,
            mips,
            bandwidth,
            cost_per_mips,
            ready_time: 0.0,
            estimated_ready_time: 0.0,
            running_time: 0.0,
        }
    }

    /// Advances the committed ready time. The value is monotone
    /// non-decreasing within a run.
    pub fn set_ready_time(&mut self, ready_time: f64) {
        self.ready_time = self.ready_time.max(ready_time);
    }

    pub fn add_running_time(&mut self, running_time: f64) {
        self.running_time += running_time;
    }

    /// Clears the per-run state for the next algorithm.
    pub fn reset(&mut self) {
        self.ready_time = 0.0;
        self.estimated_ready_time = 0.0;
        self.running_time = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_processor() -> Processor {
        Processor::new(0, "device-0".to_string(), 1000.0, 100.0, 0.5)
    }

    #[test]
    fn test_set_ready_time_monotone() {
        let mut processor = create_processor();
        processor.set_ready_time(10.0);
        assert_eq!(processor.ready_time, 10.0);
        processor.set_ready_time(5.0);
        assert_eq!(processor.ready_time, 10.0);
        processor.set_ready_time(12.0);
        assert_eq!(processor.ready_time, 12.0);
    }

    #[test]
    fn test_add_running_time_accumulates() {
        let mut processor = create_processor();
        processor.add_running_time(3.0);
        processor.add_running_time(4.5);
        assert_eq!(processor.running_time, 7.5);
    }

    #[test]
    fn test_reset_clears_run_state() {
        let mut processor = create_processor();
        processor.set_ready_time(10.0);
        processor.estimated_ready_time = 8.0;
        processor.add_running_time(6.0);

        processor.reset();

        assert_eq!(processor.ready_time, 0.0);
        assert_eq!(processor.estimated_ready_time, 0.0);
        assert_eq!(processor.running_time, 0.0);
        assert_eq!(processor.mips, 1000.0);
    }
}
