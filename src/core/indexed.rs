use super::{Error, InvalidInput, TaskGraph, TaskId};
use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// Dense view of a task graph used by the scheduling algorithms.
///
/// Tasks are sorted by ascending identifier and addressed by their position,
/// so ordering by index is the same as ordering by identifier.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct IndexedGraph {
    ids: Vec<TaskId>,
    durations: Vec<u64>,
    predecessors: Vec<Vec<usize>>,
    successors: Vec<Vec<usize>>,
}

impl IndexedGraph {
    /// Builds a graph over tasks `0..durations.len()` from raw parts.
    /// Acyclicity is not checked here; it is detected later by the traversals.
    ///
    /// # Errors
    /// - `InvalidInput::LengthMismatch` if the vectors have different lengths.
    /// - `InvalidInput::ZeroDuration` if a duration is zero.
    /// - `InvalidInput::DurationOverflow` if the durations do not sum within `u64`.
    /// - `InvalidInput::MissingPredecessor` if a predecessor index is out of range.
    pub fn from_parts(durations: Vec<u64>, predecessors: Vec<Vec<usize>>) -> Result<Self, Error> {
        if durations.len() != predecessors.len() {
            return Err(InvalidInput::LengthMismatch {
                durations: durations.len(),
                predecessors: predecessors.len(),
            }
            .into());
        }

        let n = durations.len();
        checked_total(&durations)?;

        let mut successors = vec![Vec::new(); n];
        let mut sorted = Vec::with_capacity(n);
        for (task, mut list) in predecessors.into_iter().enumerate() {
            list.sort_unstable();
            list.dedup();
            for &predecessor in &list {
                if predecessor >= n {
                    return Err(InvalidInput::MissingPredecessor { task, predecessor }.into());
                }
                successors[predecessor].push(task);
            }
            sorted.push(list);
        }

        Ok(Self {
            ids: (0..n).collect(),
            durations,
            predecessors: sorted,
            successors,
        })
    }

    /// Returns the number of tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Returns whether the graph has no tasks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Returns the identifier of the task at `index`.
    #[must_use]
    pub fn id(&self, index: usize) -> TaskId {
        self.ids[index]
    }

    /// Returns all identifiers in ascending order.
    #[must_use]
    pub fn ids(&self) -> &[TaskId] {
        &self.ids
    }

    /// Returns the index of the task with identifier `id`.
    #[must_use]
    pub fn index_of(&self, id: TaskId) -> Option<usize> {
        self.ids.binary_search(&id).ok()
    }

    /// Returns the duration of the task at `index`.
    #[must_use]
    pub fn duration(&self, index: usize) -> u64 {
        self.durations[index]
    }

    /// Returns all durations by index.
    #[must_use]
    pub fn durations(&self) -> &[u64] {
        &self.durations
    }

    /// Returns the predecessor indices of the task at `index`, ascending.
    #[must_use]
    pub fn predecessors(&self, index: usize) -> &[usize] {
        &self.predecessors[index]
    }

    /// Returns the successor indices of the task at `index`, ascending.
    #[must_use]
    pub fn successors(&self, index: usize) -> &[usize] {
        &self.successors[index]
    }

    /// Computes a topological order. Among ready tasks the smallest identifier goes first.
    ///
    /// # Errors
    /// - `CyclicGraph` naming the smallest task left on a cycle.
    pub fn topological_order(&self) -> Result<Vec<usize>, Error> {
        let mut in_degree: Vec<usize> = self.predecessors.iter().map(Vec::len).collect();
        let mut ready: BinaryHeap<_> = (0..self.len())
            .filter(|&task| in_degree[task] == 0)
            .map(Reverse)
            .collect();
        let mut order = Vec::with_capacity(self.len());

        while let Some(Reverse(task)) = ready.pop() {
            order.push(task);
            for &successor in &self.successors[task] {
                in_degree[successor] -= 1;
                if in_degree[successor] == 0 {
                    ready.push(Reverse(successor));
                }
            }
        }

        if order.len() == self.len() {
            Ok(order)
        } else {
            let blocked = (0..self.len()).find(|&task| in_degree[task] > 0);
            Err(Error::CyclicGraph(blocked.map_or(0, |task| self.ids[task])))
        }
    }

    /// Sum of all durations.
    #[must_use]
    pub fn total_duration(&self) -> u64 {
        self.durations.iter().sum()
    }
}

/// Sums durations of tasks `0..durations.len()`.
/// Every start time, path length and machine load is bounded by this total.
///
/// # Errors
/// - `InvalidInput::ZeroDuration` naming the first zero duration.
/// - `InvalidInput::DurationOverflow` if the sum does not fit in `u64`.
pub fn checked_total(durations: &[u64]) -> Result<u64, Error> {
    durations
        .iter()
        .enumerate()
        .try_fold(0_u64, |total, (task, &duration)| {
            if duration == 0 {
                return Err(InvalidInput::ZeroDuration(task).into());
            }
            total
                .checked_add(duration)
                .ok_or_else(|| InvalidInput::DurationOverflow.into())
        })
}

impl From<&TaskGraph> for IndexedGraph {
    fn from(graph: &TaskGraph) -> Self {
        let mut ids: Vec<TaskId> = graph.tasks().map(|task| task.id).collect();
        ids.sort_unstable();

        let position = |id: TaskId| {
            ids.binary_search(&id)
                .unwrap_or_else(|_| unreachable!("Predecessors always belong to the graph"))
        };

        let mut durations = Vec::with_capacity(ids.len());
        let mut predecessors = Vec::with_capacity(ids.len());
        let mut successors = Vec::with_capacity(ids.len());

        for &id in &ids {
            let Some(task) = graph.get(id) else {
                unreachable!("Identifier was collected from the graph");
            };
            durations.push(task.duration);
            predecessors.push(task.predecessors().iter().map(|&p| position(p)).collect());
            let Some(next) = graph.successors(id) else {
                unreachable!("Identifier was collected from the graph");
            };
            successors.push(next.iter().map(|&s| position(s)).collect());
        }

        Self {
            ids,
            durations,
            predecessors,
            successors,
        }
    }
}

impl TaskGraph {
    /// Builds the dense view used by the scheduling algorithms.
    #[must_use]
    pub fn indexed(&self) -> IndexedGraph {
        IndexedGraph::from(self)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::core::TaskRecord;

    #[test]
    fn indexed_view_should_sort_identifiers() -> anyhow::Result<()> {
        let graph = TaskGraph::from_records([
            TaskRecord::new(30, 1, vec![10]),
            TaskRecord::new(10, 2, vec![]),
            TaskRecord::new(20, 3, vec![10, 30]),
        ])?;
        let indexed = graph.indexed();

        assert_eq!(indexed.ids(), &[10, 20, 30]);
        assert_eq!(indexed.durations(), &[2, 3, 1]);
        assert_eq!(indexed.predecessors(1), &[0, 2]);
        assert_eq!(indexed.successors(0), &[1, 2]);
        assert_eq!(indexed.index_of(30), Some(2));
        assert_eq!(indexed.index_of(25), None);
        Ok(())
    }

    #[test]
    fn topological_order_should_prefer_small_identifiers() -> anyhow::Result<()> {
        let graph = IndexedGraph::from_parts(
            vec![1, 1, 1, 1, 1],
            vec![vec![], vec![3], vec![], vec![], vec![0, 2]],
        )?;
        assert_eq!(graph.topological_order()?, vec![0, 2, 3, 1, 4]);
        Ok(())
    }

    #[test]
    fn topological_order_should_detect_cycles() -> anyhow::Result<()> {
        let graph = IndexedGraph::from_parts(vec![1, 1, 1], vec![vec![], vec![2], vec![1]])?;
        assert_eq!(graph.topological_order(), Err(Error::CyclicGraph(1)));
        Ok(())
    }

    #[test]
    fn parts_should_be_validated() {
        assert_eq!(
            IndexedGraph::from_parts(vec![1], vec![]),
            Err(InvalidInput::LengthMismatch {
                durations: 1,
                predecessors: 0
            }
            .into())
        );
        assert_eq!(
            IndexedGraph::from_parts(vec![1, 0], vec![vec![], vec![]]),
            Err(InvalidInput::ZeroDuration(1).into())
        );
        assert_eq!(
            IndexedGraph::from_parts(vec![u64::MAX, 1], vec![vec![], vec![0]]),
            Err(InvalidInput::DurationOverflow.into())
        );
        assert_eq!(
            IndexedGraph::from_parts(vec![1, 1], vec![vec![], vec![5]]),
            Err(InvalidInput::MissingPredecessor {
                task: 1,
                predecessor: 5
            }
            .into())
        );
    }
}
