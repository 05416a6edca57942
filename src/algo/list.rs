use crate::core::{Error, IndexedGraph, InvalidInput, Schedule, ScheduleBuilder, TaskGraph, TaskId};
use tracing::debug;

/// Checks that `order` visits every task exactly once, each after all of its predecessors.
fn validate_order(graph: &IndexedGraph, order: &[usize]) -> Result<(), Error> {
    if order.len() != graph.len() {
        return Err(InvalidInput::OrderLength {
            expected: graph.len(),
            actual: order.len(),
        }
        .into());
    }

    let mut visited = vec![false; graph.len()];
    for &task in order {
        if std::mem::replace(&mut visited[task], true) {
            return Err(InvalidInput::RepeatedVisit(graph.id(task)).into());
        }
        if let Some(&predecessor) = graph
            .predecessors(task)
            .iter()
            .find(|&&predecessor| !visited[predecessor])
        {
            return Err(InvalidInput::PredecessorNotScheduled {
                task: graph.id(task),
                predecessor: graph.id(predecessor),
            }
            .into());
        }
    }

    Ok(())
}

/// Greedy list scheduling over dense task indices.
/// Each task in `order` goes to the machine offering the earliest start.
pub(super) fn schedule(
    graph: &IndexedGraph,
    order: &[usize],
    machines: usize,
) -> Result<Schedule, Error> {
    let mut builder = ScheduleBuilder::new(graph, machines)?;
    validate_order(graph, order)?;

    for &task in order {
        builder.schedule(task);
    }

    let Some(schedule) = builder.build() else {
        unreachable!("Validated order covers every task");
    };

    debug!(
        tasks = graph.len(),
        machines,
        cmax = schedule.cmax(),
        "list schedule built"
    );

    Ok(schedule)
}

/// Schedules the tasks greedily in the given visitation order of identifiers.
///
/// # Errors
/// - `InvalidInput::NoMachines` if `machines` is 0.
/// - `InvalidInput::UnknownTask` if the order names a task outside the graph.
/// - `InvalidInput` if the order is not a topological order of all tasks.
pub fn list_schedule(
    graph: &IndexedGraph,
    order: &[TaskId],
    machines: usize,
) -> Result<Schedule, Error> {
    let order = order
        .iter()
        .map(|&id| graph.index_of(id).ok_or(InvalidInput::UnknownTask(id)))
        .collect::<Result<Vec<_>, _>>()?;
    schedule(graph, &order, machines)
}

/// List scheduling in topological order, smallest identifier first among ready tasks.
#[derive(Clone, Debug, Default)]
pub struct Topological;

impl crate::core::Scheduler for Topological {
    fn schedule(&mut self, graph: &TaskGraph, machines: usize) -> Result<Schedule, Error> {
        let graph = graph.indexed();
        let order = graph.topological_order()?;
        schedule(&graph, &order, machines)
    }

    fn name(&self) -> &'static str {
        "Topological"
    }
}

#[allow(unsafe_code)]
#[linkme::distributed_slice(super::SCHEDULERS)]
static INSTANCE: fn() -> Box<dyn crate::core::Scheduler> = || Box::new(Topological);
