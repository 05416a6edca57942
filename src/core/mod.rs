mod error;
mod graph;
mod indexed;
mod schedule;
mod util;

pub use error::*;
pub use graph::*;
pub use indexed::*;
pub use schedule::*;
pub use util::*;

/// Identifier of a task. Identifiers are unique within a graph.
pub type TaskId = usize;

/// Schedules the tasks of a graph on identical machines.
pub trait Scheduler {
    /// Schedules the tasks of the given graph on `machines` machines.
    ///
    /// # Errors
    /// - `InvalidInput::NoMachines` if `machines` is 0.
    /// - `CyclicGraph` if the precedence relation contains a cycle.
    fn schedule(&mut self, graph: &TaskGraph, machines: usize) -> Result<Schedule, Error>;

    /// Returns the name of the scheduler.
    fn name(&self) -> &'static str;
}
