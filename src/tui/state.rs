use crate::model::{DriverEvent, Report};
use std::time::Instant;

pub struct UiState {
    pub info: String,
    pub show_help: bool,

    pub total_runs: usize,
    pub completed_runs: usize,
    pub current_run: Option<usize>,
    pub batch_start: Instant,
    // (run number, wall time in ms) for the run-time chart
    pub run_times: Vec<(f64, f64)>,

    pub report: Option<Report>,
    pub failure: Option<String>,
    pub auto_save: bool,
    pub last_exported_path: Option<String>,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            info: String::new(),
            show_help: false,
            total_runs: 0,
            completed_runs: 0,
            current_run: None,
            batch_start: Instant::now(),
            run_times: Vec::new(),
            report: None,
            failure: None,
            auto_save: true,
            last_exported_path: None,
        }
    }
}

impl UiState {
    /// Fraction of the batch finished, in `[0, 1]`.
    pub fn progress(&self) -> f64 {
        if self.total_runs == 0 {
            return 0.0;
        }
        (self.completed_runs as f64 / self.total_runs as f64).clamp(0.0, 1.0)
    }

    /// Forget the previous batch when a new one starts.
    fn reset_batch(&mut self, total: usize) {
        self.total_runs = total;
        self.completed_runs = 0;
        self.current_run = None;
        self.batch_start = Instant::now();
        self.run_times.clear();
        self.report = None;
        self.failure = None;
    }

    pub fn apply_event(&mut self, ev: DriverEvent) {
        match ev {
            DriverEvent::RunStarted { index, total } => {
                if index == 0 {
                    self.reset_batch(total);
                }
                self.current_run = Some(index);
                self.info = format!("Run {}/{}", index + 1, total);
            }
            DriverEvent::RunFinished {
                index,
                total,
                elapsed,
            } => {
                self.total_runs = total;
                self.completed_runs = index + 1;
                self.run_times
                    .push(((index + 1) as f64, elapsed.as_secs_f64() * 1000.0));
            }
            DriverEvent::Info(msg) => {
                self.info = msg;
            }
            DriverEvent::Completed { report } => {
                self.current_run = None;
                self.info = format!(
                    "Done: {} runs in {:.1}s",
                    report.runs,
                    self.batch_start.elapsed().as_secs_f64()
                );
                self.report = Some(*report);
            }
            DriverEvent::Failed(msg) => {
                self.current_run = None;
                self.info = "Run failed".into();
                self.failure = Some(msg);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn progress_follows_finished_runs() {
        let mut state = UiState::default();
        state.apply_event(DriverEvent::RunStarted { index: 0, total: 4 });
        assert_eq!(state.progress(), 0.0);
        state.apply_event(DriverEvent::RunFinished {
            index: 0,
            total: 4,
            elapsed: Duration::from_millis(20),
        });
        assert_eq!(state.progress(), 0.25);
        assert_eq!(state.run_times, vec![(1.0, 20.0)]);
    }

    #[test]
    fn new_batch_clears_previous_result() {
        let mut state = UiState::default();
        state.apply_event(DriverEvent::Completed {
            report: Box::new(Report::sample()),
        });
        assert!(state.report.is_some());
        state.apply_event(DriverEvent::RunStarted { index: 0, total: 2 });
        assert!(state.report.is_none());
        assert_eq!(state.total_runs, 2);
    }

    #[test]
    fn failure_is_kept_for_display() {
        let mut state = UiState::default();
        state.apply_event(DriverEvent::Failed("benchmark run 3 failed".into()));
        assert_eq!(state.failure.as_deref(), Some("benchmark run 3 failed"));
    }
}
