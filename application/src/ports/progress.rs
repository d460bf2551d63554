//! Progress notification port
//!
//! Defines the interface for reporting progress while a coordination
//! session executes.

use resolver_domain::{BarrierResult, ExecutionReport, SessionId, TaskId};

/// Callback for progress updates during session execution
///
/// Implementations live in the presentation layer and can display
/// progress in various ways (progress bars, plain logs, etc.)
pub trait CoordinationProgressNotifier: Send + Sync {
    /// Called once execution of a session starts
    fn on_session_start(&self, session_id: &SessionId, total_tasks: usize);

    /// Called when a task is dispatched
    fn on_task_start(&self, _task_id: &TaskId) {}

    /// Called when a task finishes (successfully or not)
    fn on_task_complete(&self, task_id: &TaskId, success: bool);

    /// Called when the coordinator starts waiting on a barrier
    fn on_barrier_wait(&self, _name: &str) {}

    /// Called when a barrier triggers or times out
    fn on_barrier_resolved(&self, _result: &BarrierResult) {}

    /// Called when the session finishes
    fn on_session_complete(&self, report: &ExecutionReport);
}

/// No-op progress notifier for when progress reporting is not needed
pub struct NoProgress;

impl CoordinationProgressNotifier for NoProgress {
    fn on_session_start(&self, _session_id: &SessionId, _total_tasks: usize) {}
    fn on_task_complete(&self, _task_id: &TaskId, _success: bool) {}
    fn on_session_complete(&self, _report: &ExecutionReport) {}
}
