//! Progress reporting for coordination sessions

use colored::Colorize;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use resolver_application::CoordinationProgressNotifier;
use resolver_domain::{BarrierResult, ExecutionReport, SessionId, TaskId};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// Reports session progress with a task bar and a barrier spinner
pub struct ProgressReporter {
    multi: MultiProgress,
    task_bar: Mutex<Option<ProgressBar>>,
    barrier_spinner: Mutex<Option<ProgressBar>>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            task_bar: Mutex::new(None),
            barrier_spinner: Mutex::new(None),
        }
    }

    fn task_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{spinner:.green} {prefix:.bold.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-")
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {prefix:.bold} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    fn with_task_bar(&self, f: impl FnOnce(&ProgressBar)) {
        let guard = self.task_bar.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(pb) = guard.as_ref() {
            f(pb);
        }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl CoordinationProgressNotifier for ProgressReporter {
    fn on_session_start(&self, _session_id: &SessionId, total_tasks: usize) {
        let pb = self.multi.add(ProgressBar::new(total_tasks as u64));
        pb.set_style(Self::task_style());
        pb.set_prefix("Tasks");
        pb.set_message("Starting...");
        pb.enable_steady_tick(Duration::from_millis(120));

        *self.task_bar.lock().unwrap_or_else(PoisonError::into_inner) = Some(pb);
    }

    fn on_task_start(&self, task_id: &TaskId) {
        self.with_task_bar(|pb| pb.set_message(format!("{} {}", "->".cyan(), task_id)));
    }

    fn on_task_complete(&self, task_id: &TaskId, success: bool) {
        self.with_task_bar(|pb| {
            let status = if success {
                format!("{} {}", "v".green(), task_id)
            } else {
                format!("{} {}", "x".red(), task_id)
            };
            pb.set_message(status);
            pb.inc(1);
        });
    }

    fn on_barrier_wait(&self, name: &str) {
        let spinner = self.multi.add(ProgressBar::new_spinner());
        spinner.set_style(Self::spinner_style());
        spinner.set_prefix("Barrier");
        spinner.set_message(name.to_string());
        spinner.enable_steady_tick(Duration::from_millis(120));
        *self
            .barrier_spinner
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(spinner);
    }

    fn on_barrier_resolved(&self, result: &BarrierResult) {
        if let Some(spinner) = self
            .barrier_spinner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            let message = if result.triggered {
                format!("{} {}", result.name, "triggered".green())
            } else {
                format!("{} {}", result.name, result.status.as_str().red())
            };
            spinner.finish_with_message(message);
        }
    }

    fn on_session_complete(&self, report: &ExecutionReport) {
        if let Some(pb) = self
            .task_bar
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            pb.finish_with_message(format!("session {}", report.status.as_str()));
        }
    }
}

/// Simple text-based progress (no fancy UI), for non-terminal output
pub struct SimpleProgress;

impl CoordinationProgressNotifier for SimpleProgress {
    fn on_session_start(&self, session_id: &SessionId, total_tasks: usize) {
        eprintln!(
            "{} {} ({} tasks)",
            "->".cyan(),
            format!("Session {}", session_id).bold(),
            total_tasks
        );
    }

    fn on_task_complete(&self, task_id: &TaskId, success: bool) {
        if success {
            eprintln!("  {} {}", "v".green(), task_id);
        } else {
            eprintln!("  {} {} (failed)", "x".red(), task_id);
        }
    }

    fn on_barrier_resolved(&self, result: &BarrierResult) {
        eprintln!(
            "  {} barrier {} ({}/{})",
            if result.triggered { "v".green() } else { "x".red() },
            result.name,
            result.completed,
            result.total
        );
    }

    fn on_session_complete(&self, report: &ExecutionReport) {
        eprintln!("{} {}", "->".cyan(), report.status.as_str());
    }
}
