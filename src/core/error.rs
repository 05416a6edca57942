use super::TaskId;
use thiserror::Error;

/// Errors produced while building task graphs, schedules or assignments.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum Error {
    /// A task with the same identifier is already part of the graph.
    #[error("task {0} is already part of the graph")]
    DuplicateTask(TaskId),

    /// The precedence relation contains a cycle passing through the task.
    #[error("precedence graph contains a cycle through task {0}")]
    CyclicGraph(TaskId),

    /// The input was rejected before any state was produced.
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInput),
}

/// Detailed reason carried by [`Error::InvalidInput`].
#[derive(Clone, Debug, Error, PartialEq)]
pub enum InvalidInput {
    #[error("at least one machine is required")]
    NoMachines,

    #[error("task {0} does not exist")]
    UnknownTask(TaskId),

    #[error("task {task} depends on missing task {predecessor}")]
    MissingPredecessor { task: TaskId, predecessor: TaskId },

    #[error("task {0} must have a positive duration")]
    ZeroDuration(TaskId),

    /// Durations are summed along paths and machines, so their total must fit in `u64`.
    #[error("total task duration exceeds {}", u64::MAX)]
    DurationOverflow,

    #[error("{durations} durations given for {predecessors} predecessor lists")]
    LengthMismatch {
        durations: usize,
        predecessors: usize,
    },

    #[error("visitation order covers {actual} tasks, graph has {expected}")]
    OrderLength { expected: usize, actual: usize },

    #[error("task {0} is visited more than once")]
    RepeatedVisit(TaskId),

    /// Visitation order is not topological.
    #[error("task {task} is visited before its predecessor {predecessor}")]
    PredecessorNotScheduled { task: TaskId, predecessor: TaskId },

    #[error("task {0} is assigned to more than one machine slot")]
    DuplicateAssignment(TaskId),

    #[error("task {0} is not assigned to any machine")]
    UnassignedTask(TaskId),

    /// Machine sequences deadlock against the precedence relation.
    #[error("assignment cannot be executed without violating precedence")]
    InfeasibleAssignment,

    #[error("edge probability {0} is outside [0, 1]")]
    EdgeProbability(f64),
}
