use super::{IndexedGraph, TaskId};
use serde::{Deserialize, Serialize};

/// Ordered task identifiers per machine.
pub type Assignment = Vec<Vec<TaskId>>;

/// Placement of a single task.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Serialize, PartialEq)]
pub struct ScheduledTask {
    pub id: TaskId,
    pub start: u64,
    pub end: u64,
    pub machine: usize,
}

/// A complete schedule: start, end and machine for every task of a graph.
/// Entries are stored by ascending task identifier.
#[derive(Clone, Debug, Deserialize, Eq, Serialize, PartialEq)]
pub struct Schedule {
    machines: usize,
    tasks: Vec<ScheduledTask>,
}

impl Schedule {
    pub(crate) fn new(machines: usize, tasks: Vec<ScheduledTask>) -> Self {
        debug_assert!(tasks.windows(2).all(|pair| pair[0].id < pair[1].id));
        Self { machines, tasks }
    }

    /// Returns the number of machines.
    #[must_use]
    pub const fn machines(&self) -> usize {
        self.machines
    }

    /// Returns the number of scheduled tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Returns whether no task is scheduled.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Completion time of the last task, 0 for an empty schedule.
    #[must_use]
    pub fn cmax(&self) -> u64 {
        self.tasks.iter().map(|task| task.end).max().unwrap_or_default()
    }

    /// Returns the placement of a task.
    #[must_use]
    pub fn get(&self, id: TaskId) -> Option<&ScheduledTask> {
        self.tasks
            .binary_search_by_key(&id, |task| task.id)
            .ok()
            .map(|index| &self.tasks[index])
    }

    /// Returns the placements by ascending task identifier.
    pub fn iter(&self) -> impl Iterator<Item = &ScheduledTask> {
        self.tasks.iter()
    }

    /// Returns the task identifiers of every machine in execution order.
    #[must_use]
    pub fn assignment(&self) -> Assignment {
        self.sequences()
            .into_iter()
            .map(|sequence| sequence.into_iter().map(|index| self.tasks[index].id).collect())
            .collect()
    }

    /// Same as [`Self::assignment`] but with dense task indices.
    pub(crate) fn sequences(&self) -> Vec<Vec<usize>> {
        let mut sequences = vec![Vec::new(); self.machines];
        for (index, task) in self.tasks.iter().enumerate() {
            sequences[task.machine].push(index);
        }
        for sequence in &mut sequences {
            sequence.sort_by_key(|&index| self.tasks[index].start);
        }
        sequences
    }

    /// Verifies the schedule against the graph it was built for:
    /// every task placed once, durations kept, precedence respected and
    /// no two tasks overlapping on a machine.
    #[must_use]
    pub fn verify(&self, graph: &IndexedGraph) -> bool {
        if self.tasks.len() != graph.len() {
            return false;
        }

        let placed = self.tasks.iter().enumerate().all(|(index, task)| {
            task.id == graph.id(index)
                && task.machine < self.machines
                && task.end == task.start + graph.duration(index)
        });
        if !placed {
            return false;
        }

        let ordered = (0..graph.len()).all(|index| {
            graph
                .predecessors(index)
                .iter()
                .all(|&predecessor| self.tasks[predecessor].end <= self.tasks[index].start)
        });

        let disjoint = self.sequences().iter().all(|sequence| {
            sequence
                .windows(2)
                .all(|pair| self.tasks[pair[0]].end <= self.tasks[pair[1]].start)
        });

        ordered && disjoint
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn chain() -> anyhow::Result<IndexedGraph> {
        Ok(IndexedGraph::from_parts(
            vec![2, 3, 1],
            vec![vec![], vec![0], vec![]],
        )?)
    }

    fn task(id: TaskId, start: u64, end: u64, machine: usize) -> ScheduledTask {
        ScheduledTask {
            id,
            start,
            end,
            machine,
        }
    }

    #[test]
    fn valid_schedule_should_verify() -> anyhow::Result<()> {
        let schedule = Schedule::new(
            2,
            vec![task(0, 0, 2, 0), task(1, 2, 5, 0), task(2, 0, 1, 1)],
        );

        assert!(schedule.verify(&chain()?));
        assert_eq!(schedule.cmax(), 5);
        assert_eq!(schedule.assignment(), vec![vec![0, 1], vec![2]]);
        assert_eq!(schedule.get(1), Some(&task(1, 2, 5, 0)));
        assert_eq!(schedule.get(7), None);
        Ok(())
    }

    #[test]
    fn precedence_violation_should_not_verify() -> anyhow::Result<()> {
        let schedule = Schedule::new(
            2,
            vec![task(0, 0, 2, 0), task(1, 1, 4, 1), task(2, 2, 3, 0)],
        );
        assert!(!schedule.verify(&chain()?));
        Ok(())
    }

    #[test]
    fn overlap_should_not_verify() -> anyhow::Result<()> {
        let schedule = Schedule::new(
            1,
            vec![task(0, 0, 2, 0), task(1, 2, 5, 0), task(2, 4, 5, 0)],
        );
        assert!(!schedule.verify(&chain()?));
        Ok(())
    }

    #[test]
    fn empty_schedule_should_have_zero_cmax() {
        let schedule = Schedule::new(3, Vec::new());
        assert_eq!(schedule.cmax(), 0);
        assert_eq!(schedule.assignment(), vec![Vec::<TaskId>::new(); 3]);
    }
}
