//! Coordination domain: sessions, barriers, worktrees and resource budgets.

pub mod barrier;
pub mod session;
pub mod worktree;

pub use barrier::{
    BarrierResult, BarrierStatus, CoordinationBarrier, TriggerCondition, completed_ratio,
};
pub use session::{
    CoordinationSession, CoordinationStrategy, ExecutionReport, SessionStatus, TaskOutcome,
    TaskRunStatus,
};
pub use worktree::{
    IsolationLevel, ResourceAllocation, ResourceRequest, ResourceType, WorktreeEnvironment,
    WorktreeStatus, sanitize_branch_component, sanitize_path_component, worktree_branch_name,
};
