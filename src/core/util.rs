use super::{Error, IndexedGraph, InvalidInput, Schedule, ScheduledTask};
use tracing::trace;

/// Machine is a resource that can process one task at a time.
/// `free` is the moment it finishes its last assigned task.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Machine {
    pub id: usize,
    pub free: u64,
}

impl Machine {
    /// Creates a new machine with free time 0.
    #[must_use]
    pub const fn new(id: usize) -> Self {
        Self { id, free: 0 }
    }

    /// Earliest moment this machine could start a task ready at `ready`.
    #[must_use]
    pub const fn earliest_start(&self, ready: u64) -> u64 {
        if self.free > ready {
            self.free
        } else {
            ready
        }
    }
}

/// A builder for creating a schedule.
/// Holds all the state of a single greedy run: machine free times and
/// the placements made so far. Every run owns its own builder.
#[derive(Clone, Debug)]
pub struct ScheduleBuilder<'a> {
    graph: &'a IndexedGraph,
    machines: Vec<Machine>,
    placed: Vec<Option<ScheduledTask>>,
}

impl<'a> ScheduleBuilder<'a> {
    /// Creates a new schedule builder with all machines free at time 0.
    ///
    /// # Errors
    /// - `InvalidInput::NoMachines` if `machines` is 0.
    pub fn new(graph: &'a IndexedGraph, machines: usize) -> Result<Self, Error> {
        if machines == 0 {
            return Err(InvalidInput::NoMachines.into());
        }

        Ok(Self {
            graph,
            machines: (0..machines).map(Machine::new).collect(),
            placed: vec![None; graph.len()],
        })
    }

    /// Returns the moment all predecessors of the task are finished,
    /// or `None` if one of them is not placed yet.
    #[must_use]
    pub fn ready_time(&self, task: usize) -> Option<u64> {
        self.graph
            .predecessors(task)
            .iter()
            .try_fold(0, |ready, &predecessor| {
                self.placed[predecessor].map(|info| ready.max(info.end))
            })
    }

    /// Returns the machine offering the earliest start, lowest index on ties.
    #[must_use]
    pub fn select_machine(&self, ready: u64) -> Machine {
        let best = self
            .machines
            .iter()
            .min_by_key(|machine| (machine.earliest_start(ready), machine.id));
        let Some(&machine) = best else {
            unreachable!("Machine number is always greater than 0");
        };
        machine
    }

    /// Places the task at its earliest start on the given machine.
    /// All predecessors must already be placed.
    pub fn place(&mut self, task: usize, machine: usize, ready: u64) -> ScheduledTask {
        let start = self.machines[machine].earliest_start(ready);
        let info = ScheduledTask {
            id: self.graph.id(task),
            start,
            end: start + self.graph.duration(task),
            machine,
        };

        trace!(task = info.id, machine, start, end = info.end, "placed task");

        self.machines[machine].free = info.end;
        self.placed[task] = Some(info);
        info
    }

    /// Greedily places the task on the machine offering the earliest start.
    ///
    /// # Panics
    /// - If a predecessor of the task has not been placed yet.
    pub fn schedule(&mut self, task: usize) -> ScheduledTask {
        let Some(ready) = self.ready_time(task) else {
            unreachable!("Visitation order is validated before scheduling");
        };
        let machine = self.select_machine(ready);
        self.place(task, machine.id, ready)
    }

    /// Executes every machine's sequence in order, starting each task as soon as
    /// its machine is free and its predecessors are done.
    /// Returns `None` when the sequences deadlock against precedence, or when
    /// a task is unknown or listed more than once.
    #[must_use]
    pub fn replay(graph: &'a IndexedGraph, sequences: &[Vec<usize>]) -> Option<Schedule> {
        let mut builder = Self::new(graph, sequences.len()).ok()?;
        let mut next = vec![0; sequences.len()];
        let mut remaining: usize = sequences.iter().map(Vec::len).sum();

        while remaining > 0 {
            let mut progress = false;

            for (machine, sequence) in sequences.iter().enumerate() {
                while let Some(&task) = sequence.get(next[machine]) {
                    if !matches!(builder.placed.get(task), Some(None)) {
                        return None;
                    }
                    let Some(ready) = builder.ready_time(task) else {
                        break;
                    };
                    builder.place(task, machine, ready);
                    next[machine] += 1;
                    remaining -= 1;
                    progress = true;
                }
            }

            if !progress {
                return None;
            }
        }

        builder.build()
    }

    /// Finishes the schedule. Returns `None` if some task was never placed.
    #[must_use]
    pub fn build(self) -> Option<Schedule> {
        let tasks = self.placed.into_iter().collect::<Option<Vec<_>>>()?;
        Some(Schedule::new(self.machines.len(), tasks))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn fork() -> anyhow::Result<IndexedGraph> {
        Ok(IndexedGraph::from_parts(
            vec![3, 2, 4, 2],
            vec![vec![], vec![0], vec![0], vec![1, 2]],
        )?)
    }

    #[test]
    fn machine_should_start_at_ready_or_free() {
        let mut machine = Machine::new(0);
        assert_eq!(machine.earliest_start(4), 4);
        machine.free = 6;
        assert_eq!(machine.earliest_start(4), 6);
    }

    #[test]
    fn builder_should_require_machines() -> anyhow::Result<()> {
        assert!(matches!(
            ScheduleBuilder::new(&fork()?, 0),
            Err(Error::InvalidInput(InvalidInput::NoMachines))
        ));
        Ok(())
    }

    #[test]
    fn selection_should_prefer_lowest_index_on_ties() -> anyhow::Result<()> {
        let graph = fork()?;
        let mut builder = ScheduleBuilder::new(&graph, 3)?;

        builder.place(0, 1, 0);
        // machines 0 and 2 are free at 0, machine 1 at 3; all tie at ready time 3
        assert_eq!(builder.select_machine(3).id, 0);
        assert_eq!(builder.select_machine(0).id, 0);
        assert_eq!(builder.ready_time(1), Some(3));
        assert_eq!(builder.ready_time(3), None);
        Ok(())
    }

    #[test]
    fn replay_should_respect_precedence() -> anyhow::Result<()> {
        let graph = fork()?;
        let schedule = ScheduleBuilder::replay(&graph, &[vec![0, 2, 3], vec![1]]);

        let Some(schedule) = schedule else {
            anyhow::bail!("replay should succeed");
        };
        assert!(schedule.verify(&graph));
        assert_eq!(schedule.get(1).map(|task| task.start), Some(3));
        assert_eq!(schedule.cmax(), 9);
        Ok(())
    }

    #[test]
    fn replay_should_reject_invalid_sequences() -> anyhow::Result<()> {
        let graph = fork()?;
        assert_eq!(ScheduleBuilder::replay(&graph, &[vec![3, 0], vec![1, 2]]), None);
        assert_eq!(ScheduleBuilder::replay(&graph, &[vec![0, 1, 2, 3], vec![0]]), None);
        assert_eq!(ScheduleBuilder::replay(&graph, &[vec![0, 1, 2, 3, 7]]), None);
        Ok(())
    }
}
