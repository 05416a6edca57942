use crate::cast_u64;
use crate::core::{Error, IndexedGraph, InvalidInput, TaskGraph, TaskId};
use std::cmp::Reverse;
use std::collections::BTreeMap;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Visit {
    New,
    Open,
    Done,
}

/// Computes the upward rank of every task: its duration plus the largest rank
/// among its successors. Sinks rank at their own duration.
///
/// Traversal is an iterative depth-first search with memoization; each stack
/// frame keeps the position of the next successor to explore.
///
/// # Errors
/// - `CyclicGraph` if a successor is reached while it is still open.
pub fn upward_ranks(graph: &IndexedGraph) -> Result<Vec<u64>, Error> {
    let mut ranks = vec![0; graph.len()];
    let mut state = vec![Visit::New; graph.len()];
    let mut stack: Vec<(usize, usize)> = Vec::new();

    for root in 0..graph.len() {
        if state[root] != Visit::New {
            continue;
        }

        state[root] = Visit::Open;
        stack.push((root, 0));

        while let Some(frame) = stack.last_mut() {
            let (task, next) = *frame;

            if let Some(&successor) = graph.successors(task).get(next) {
                frame.1 += 1;
                match state[successor] {
                    Visit::New => {
                        state[successor] = Visit::Open;
                        stack.push((successor, 0));
                    }
                    Visit::Open => return Err(Error::CyclicGraph(graph.id(successor))),
                    Visit::Done => {}
                }
            } else {
                let tail = graph
                    .successors(task)
                    .iter()
                    .map(|&successor| ranks[successor])
                    .max()
                    .unwrap_or_default();
                ranks[task] = graph.duration(task) + tail;
                state[task] = Visit::Done;
                stack.pop();
            }
        }
    }

    Ok(ranks)
}

/// Orders task indices by descending rank; equal ranks keep ascending identifiers.
#[must_use]
pub fn rank_order(graph: &IndexedGraph, ranks: &[u64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..graph.len()).collect();
    order.sort_by_key(|&task| (Reverse(ranks[task]), task));
    order
}

/// Computes the upward rank of every task, keyed by identifier.
///
/// # Errors
/// - `CyclicGraph` if the graph contains a cycle.
pub fn ranks(graph: &TaskGraph) -> Result<BTreeMap<TaskId, u64>, Error> {
    let indexed = graph.indexed();
    let ranks = upward_ranks(&indexed)?;
    Ok(indexed.ids().iter().copied().zip(ranks).collect())
}

/// Lower bound on the makespan of any schedule: the longer of the critical path
/// and the total work spread evenly over the machines.
///
/// # Errors
/// - `InvalidInput::NoMachines` if `machines` is 0.
/// - `CyclicGraph` if the graph contains a cycle.
pub fn lower_bound(graph: &IndexedGraph, machines: usize) -> Result<u64, Error> {
    if machines == 0 {
        return Err(InvalidInput::NoMachines.into());
    }

    let critical_path = upward_ranks(graph)?.into_iter().max().unwrap_or_default();
    let spread = graph.total_duration().div_ceil(cast_u64(machines));
    Ok(critical_path.max(spread))
}
