//! Arena-indexed dependency graph with iterative cycle detection.
//!
//! Nodes are stored in insertion order and addressed by index; an edge
//! `a -> b` means "a depends on b". Cycle detection is an explicit-stack
//! three-colour DFS, so its stack depth does not grow with the graph.

use super::entities::TaskStatus;
use crate::core::ids::TaskId;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    White,
    Gray,
    Black,
}

/// Directed dependency graph over task ids.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    nodes: Vec<TaskId>,
    index: HashMap<TaskId, usize>,
    edges: Vec<Vec<usize>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from `(task, dependencies)` pairs. Dependencies not
    /// listed as tasks are added as nodes on first reference.
    pub fn from_dependencies<'a, I, D>(entries: I) -> Self
    where
        I: IntoIterator<Item = (&'a TaskId, D)>,
        D: IntoIterator<Item = &'a TaskId>,
    {
        let mut graph = Self::new();
        for (task, deps) in entries {
            graph.add_node(task);
            for dep in deps {
                graph.add_edge(task, dep);
            }
        }
        graph
    }

    /// Insert a node if absent and return its index.
    pub fn add_node(&mut self, id: &TaskId) -> usize {
        if let Some(&idx) = self.index.get(id) {
            return idx;
        }
        let idx = self.nodes.len();
        self.nodes.push(id.clone());
        self.index.insert(id.clone(), idx);
        self.edges.push(Vec::new());
        idx
    }

    /// Record that `task` depends on `dependency`.
    pub fn add_edge(&mut self, task: &TaskId, dependency: &TaskId) {
        let from = self.add_node(task);
        let to = self.add_node(dependency);
        if !self.edges[from].contains(&to) {
            self.edges[from].push(to);
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: &TaskId) -> bool {
        self.index.contains_key(id)
    }

    /// Every back edge found by DFS, reported as the cycle it closes.
    ///
    /// Each cycle starts and ends with the same id, e.g. `[a, b, a]`.
    pub fn find_cycles(&self) -> Vec<Vec<TaskId>> {
        let n = self.nodes.len();
        let mut marks = vec![Mark::White; n];
        let mut stack_pos: Vec<Option<usize>> = vec![None; n];
        let mut cycles = Vec::new();

        for root in 0..n {
            if marks[root] != Mark::White {
                continue;
            }
            // (node, next edge to explore)
            let mut stack: Vec<(usize, usize)> = vec![(root, 0)];
            marks[root] = Mark::Gray;
            stack_pos[root] = Some(0);

            while let Some(top) = stack.last_mut() {
                let node = top.0;
                if let Some(&next) = self.edges[node].get(top.1) {
                    top.1 += 1;
                    match marks[next] {
                        Mark::White => {
                            marks[next] = Mark::Gray;
                            stack_pos[next] = Some(stack.len());
                            stack.push((next, 0));
                        }
                        Mark::Gray => {
                            if let Some(start) = stack_pos[next] {
                                let mut cycle: Vec<TaskId> = stack[start..]
                                    .iter()
                                    .map(|&(idx, _)| self.nodes[idx].clone())
                                    .collect();
                                cycle.push(self.nodes[next].clone());
                                cycles.push(cycle);
                            }
                        }
                        Mark::Black => {}
                    }
                } else {
                    marks[node] = Mark::Black;
                    stack_pos[node] = None;
                    stack.pop();
                }
            }
        }

        cycles
    }

    pub fn has_cycle(&self) -> bool {
        !self.find_cycles().is_empty()
    }

    /// Kahn ordering with dependencies before dependents, ties broken by
    /// insertion order. Returns `None` when the graph has a cycle.
    pub fn topological_order(&self) -> Option<Vec<TaskId>> {
        let n = self.nodes.len();
        let mut remaining: Vec<usize> = self.edges.iter().map(Vec::len).collect();
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); n];
        for (from, deps) in self.edges.iter().enumerate() {
            for &to in deps {
                dependents[to].push(from);
            }
        }

        let mut queue: VecDeque<usize> = (0..n).filter(|&i| remaining[i] == 0).collect();
        let mut order = Vec::with_capacity(n);
        while let Some(idx) = queue.pop_front() {
            order.push(self.nodes[idx].clone());
            for &dependent in &dependents[idx] {
                remaining[dependent] -= 1;
                if remaining[dependent] == 0 {
                    queue.push_back(dependent);
                }
            }
        }

        (order.len() == n).then_some(order)
    }
}

/// A task whose dependency lies outside the validated set and is not DONE.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockedTask {
    pub task_id: TaskId,
    pub blocked_by: Vec<TaskId>,
}

/// Outcome of validating a set of tasks before execution.
///
/// `valid` reflects cycles only; externally blocked tasks are reported
/// separately in `blocked_tasks`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DependencyValidation {
    pub valid: bool,
    pub circular_dependencies: Vec<Vec<TaskId>>,
    pub blocked_tasks: Vec<BlockedTask>,
    pub issues: Vec<String>,
}

impl DependencyValidation {
    /// Whether a session over these tasks may start.
    pub fn is_executable(&self) -> bool {
        self.valid && self.blocked_tasks.is_empty()
    }
}

/// Lightweight reference to a neighbouring task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependencyRef {
    pub id: TaskId,
    pub title: String,
    pub status: TaskStatus,
}

/// Dependency neighbourhood of a single task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependencyInfo {
    pub task_id: TaskId,
    pub dependencies: Vec<DependencyRef>,
    pub dependents: Vec<DependencyRef>,
    pub blocked: bool,
    pub blocking_reasons: Vec<String>,
}
