use super::{Error, InvalidInput, TaskId};
use ahash::{HashMap, HashMapExt};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A task. Contains its duration (WCET) and the tasks it waits for.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Task {
    pub id: TaskId,
    pub duration: u64,
    predecessors: BTreeSet<TaskId>,
}

impl Task {
    /// Returns the identifiers of the tasks that must finish before this one starts.
    #[must_use]
    pub const fn predecessors(&self) -> &BTreeSet<TaskId> {
        &self.predecessors
    }
}

/// A persisted task: identifier, duration and predecessor identifiers.
/// Predecessors may reference tasks appearing later in a record sequence.
#[derive(Clone, Debug, Deserialize, Eq, Serialize, PartialEq)]
pub struct TaskRecord {
    pub id: TaskId,
    pub duration: u64,
    #[serde(default)]
    pub predecessors: Vec<TaskId>,
}

impl TaskRecord {
    /// Creates a new record.
    #[must_use]
    pub const fn new(id: TaskId, duration: u64, predecessors: Vec<TaskId>) -> Self {
        Self {
            id,
            duration,
            predecessors,
        }
    }
}

/// A directed acyclic graph of tasks keyed by identifier.
/// Successors are cached alongside predecessors and kept consistent on every insertion.
#[derive(Clone, Debug, Default, Deserialize, Eq, Serialize, PartialEq)]
#[serde(try_from = "Vec<TaskRecord>", into = "Vec<TaskRecord>")]
pub struct TaskGraph {
    tasks: Vec<Task>,
    successors: Vec<BTreeSet<TaskId>>,
    index: HashMap<TaskId, usize>,
    total_duration: u64,
}

impl TaskGraph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a graph from records. All tasks are inserted before any dependency,
    /// so records may reference predecessors in any order.
    ///
    /// # Errors
    /// - `DuplicateTask` if two records share an identifier.
    /// - `InvalidInput` if a duration is zero or a predecessor does not exist.
    /// - `CyclicGraph` if the dependencies form a cycle.
    pub fn from_records(records: impl IntoIterator<Item = TaskRecord>) -> Result<Self, Error> {
        let records: Vec<_> = records.into_iter().collect();
        let mut graph = Self::with_capacity(records.len());

        for record in &records {
            graph.add_task(record.id, record.duration)?;
        }

        for record in &records {
            for &predecessor in &record.predecessors {
                if !graph.contains(predecessor) {
                    return Err(InvalidInput::MissingPredecessor {
                        task: record.id,
                        predecessor,
                    }
                    .into());
                }
                graph.add_dependency(record.id, predecessor)?;
            }
        }

        Ok(graph)
    }

    fn with_capacity(capacity: usize) -> Self {
        Self {
            tasks: Vec::with_capacity(capacity),
            successors: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
            total_duration: 0,
        }
    }

    /// Adds a task without dependencies.
    ///
    /// # Errors
    /// - `DuplicateTask` if the identifier is already used.
    /// - `InvalidInput::ZeroDuration` if the duration is zero.
    /// - `InvalidInput::DurationOverflow` if the total duration would not fit in `u64`.
    pub fn add_task(&mut self, id: TaskId, duration: u64) -> Result<(), Error> {
        if self.index.contains_key(&id) {
            return Err(Error::DuplicateTask(id));
        }
        if duration == 0 {
            return Err(InvalidInput::ZeroDuration(id).into());
        }
        self.total_duration = self
            .total_duration
            .checked_add(duration)
            .ok_or(InvalidInput::DurationOverflow)?;

        self.index.insert(id, self.tasks.len());
        self.tasks.push(Task {
            id,
            duration,
            predecessors: BTreeSet::new(),
        });
        self.successors.push(BTreeSet::new());

        Ok(())
    }

    /// Makes `task` wait for `predecessor`. Adding an existing dependency does nothing.
    ///
    /// # Errors
    /// - `InvalidInput::UnknownTask` if either task does not exist.
    /// - `CyclicGraph` if the dependency would close a cycle.
    pub fn add_dependency(&mut self, task: TaskId, predecessor: TaskId) -> Result<(), Error> {
        let position = self.position(task)?;
        let predecessor_position = self.position(predecessor)?;

        if task == predecessor || self.reaches(task, predecessor) {
            return Err(Error::CyclicGraph(task));
        }

        self.tasks[position].predecessors.insert(predecessor);
        self.successors[predecessor_position].insert(task);

        Ok(())
    }

    fn position(&self, id: TaskId) -> Result<usize, Error> {
        self.index
            .get(&id)
            .copied()
            .ok_or_else(|| InvalidInput::UnknownTask(id).into())
    }

    /// Checks whether `to` can be reached from `from` following successor edges.
    fn reaches(&self, from: TaskId, to: TaskId) -> bool {
        let mut visited = vec![false; self.tasks.len()];
        let mut stack = vec![from];

        while let Some(id) = stack.pop() {
            if id == to {
                return true;
            }
            let position = self.index[&id];
            if !std::mem::replace(&mut visited[position], true) {
                stack.extend(self.successors[position].iter().copied());
            }
        }

        false
    }

    /// Returns whether a task with the identifier exists.
    #[must_use]
    pub fn contains(&self, id: TaskId) -> bool {
        self.index.contains_key(&id)
    }

    /// Returns the task with the identifier.
    #[must_use]
    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.index.get(&id).map(|&position| &self.tasks[position])
    }

    /// Returns the predecessors of a task.
    #[must_use]
    pub fn predecessors(&self, id: TaskId) -> Option<&BTreeSet<TaskId>> {
        self.get(id).map(Task::predecessors)
    }

    /// Returns the successors of a task.
    #[must_use]
    pub fn successors(&self, id: TaskId) -> Option<&BTreeSet<TaskId>> {
        self.index.get(&id).map(|&position| &self.successors[position])
    }

    /// Returns the tasks in insertion order.
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter()
    }

    /// Returns the number of tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Returns whether the graph has no tasks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Sum of all durations. No schedule of the graph ends later.
    #[must_use]
    pub const fn total_duration(&self) -> u64 {
        self.total_duration
    }

    /// Returns the number of precedence edges.
    #[must_use]
    pub fn edges(&self) -> usize {
        self.tasks.iter().map(|task| task.predecessors.len()).sum()
    }
}

impl TryFrom<Vec<TaskRecord>> for TaskGraph {
    type Error = Error;

    fn try_from(records: Vec<TaskRecord>) -> Result<Self, Self::Error> {
        Self::from_records(records)
    }
}

impl From<TaskGraph> for Vec<TaskRecord> {
    fn from(graph: TaskGraph) -> Self {
        let mut records: Self = graph
            .tasks
            .into_iter()
            .map(|task| TaskRecord {
                id: task.id,
                duration: task.duration,
                predecessors: task.predecessors.into_iter().collect(),
            })
            .collect();
        records.sort_unstable_by_key(|record| record.id);
        records
    }
}
