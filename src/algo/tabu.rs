use super::heft::Heft;
use crate::core::{
    checked_total, Assignment, Error, IndexedGraph, InvalidInput, Schedule, ScheduleBuilder,
    Scheduler, TaskGraph,
};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::debug;

/// Scores an assignment of dense task indices to machines.
pub trait Objective {
    /// Number of tasks an assignment must cover.
    fn tasks(&self) -> usize;

    /// Makespan of the assignment, `None` if it cannot be executed.
    fn makespan(&self, assignment: &[Vec<usize>]) -> Option<u64>;
}

/// Largest total duration assigned to a single machine.
/// Precedence is ignored: this is the load-balancing relaxation.
#[derive(Clone, Copy, Debug)]
pub struct MachineLoad<'a> {
    durations: &'a [u64],
}

impl<'a> MachineLoad<'a> {
    /// Creates the objective for tasks `0..durations.len()`.
    ///
    /// # Errors
    /// - `InvalidInput::ZeroDuration` if a duration is zero.
    /// - `InvalidInput::DurationOverflow` if the durations do not sum within `u64`.
    pub fn new(durations: &'a [u64]) -> Result<Self, Error> {
        checked_total(durations)?;
        Ok(Self { durations })
    }
}

impl Objective for MachineLoad<'_> {
    fn tasks(&self) -> usize {
        self.durations.len()
    }

    fn makespan(&self, assignment: &[Vec<usize>]) -> Option<u64> {
        let loads = assignment
            .iter()
            .map(|machine| machine.iter().map(|&task| self.durations[task]).sum::<u64>());
        Some(loads.max().unwrap_or_default())
    }
}

/// Makespan of executing each machine's list in order, every task starting
/// once its machine is free and its predecessors are finished.
#[derive(Clone, Copy, Debug)]
pub struct Sequenced<'a> {
    graph: &'a IndexedGraph,
}

impl<'a> Sequenced<'a> {
    /// Creates the objective over the tasks of `graph`.
    #[must_use]
    pub const fn new(graph: &'a IndexedGraph) -> Self {
        Self { graph }
    }
}

impl Objective for Sequenced<'_> {
    fn tasks(&self) -> usize {
        self.graph.len()
    }

    fn makespan(&self, assignment: &[Vec<usize>]) -> Option<u64> {
        ScheduleBuilder::replay(self.graph, assignment).map(|schedule| schedule.cmax())
    }
}

/// Relocation of a task from one machine list to the end of another.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Move {
    pub task: usize,
    pub from: usize,
    pub to: usize,
}

impl Move {
    const fn reverse(self) -> Self {
        Self {
            task: self.task,
            from: self.to,
            to: self.from,
        }
    }
}

/// Bounded FIFO memory of forbidden moves.
#[derive(Clone, Debug)]
struct TabuList {
    moves: VecDeque<Move>,
    capacity: usize,
}

impl TabuList {
    fn new(capacity: usize) -> Self {
        Self {
            moves: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    fn push(&mut self, value: Move) {
        if self.capacity == 0 {
            return;
        }
        if self.moves.len() == self.capacity {
            self.moves.pop_front();
        }
        self.moves.push_back(value);
    }

    fn contains(&self, value: &Move) -> bool {
        self.moves.contains(value)
    }
}

/// Parameters of the tabu search.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Serialize, PartialEq)]
#[serde(default)]
pub struct TabuConfig {
    /// Maximum number of committed moves.
    pub iterations: usize,
    /// Number of recent moves kept in the tabu memory.
    pub tabu_size: usize,
}

impl Default for TabuConfig {
    fn default() -> Self {
        Self {
            iterations: 100,
            tabu_size: 7,
        }
    }
}

/// Why the search stopped.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Serialize, PartialEq)]
pub enum Termination {
    BudgetExhausted,
    /// Every neighbor was tabu without beating the best makespan, or none was executable.
    NoAdmissibleMove,
}

/// Result of a tabu search run.
#[derive(Clone, Debug, Deserialize, Eq, Serialize, PartialEq)]
pub struct TabuOutcome {
    pub assignment: Assignment,
    pub makespan: u64,
    pub iterations: usize,
    pub termination: Termination,
    /// Best-known makespan after each iteration.
    pub history: Vec<u64>,
}

/// Checks that the assignment is a partition of tasks `0..tasks` over at least one machine.
fn validate(tasks: usize, assignment: &[Vec<usize>]) -> Result<(), Error> {
    if assignment.is_empty() {
        return Err(InvalidInput::NoMachines.into());
    }

    let mut seen = vec![false; tasks];
    for &task in assignment.iter().flatten() {
        if task >= tasks {
            return Err(InvalidInput::UnknownTask(task).into());
        }
        if std::mem::replace(&mut seen[task], true) {
            return Err(InvalidInput::DuplicateAssignment(task).into());
        }
    }

    match seen.iter().position(|&assigned| !assigned) {
        Some(task) => Err(InvalidInput::UnassignedTask(task).into()),
        None => Ok(()),
    }
}

/// Finds the best admissible neighbor of `current`. Neighbors are generated by
/// source machine, position in its list, then destination machine; ties keep
/// the first one generated. `current` is restored before returning.
fn best_neighbor(
    objective: &impl Objective,
    current: &mut [Vec<usize>],
    tabu: &TabuList,
    best_makespan: u64,
) -> Option<(Move, u64)> {
    let mut chosen: Option<(Move, u64)> = None;

    for from in 0..current.len() {
        for position in 0..current[from].len() {
            for to in (0..current.len()).filter(|&to| to != from) {
                let task = current[from].remove(position);
                current[to].push(task);
                let score = objective.makespan(current);
                current[to].pop();
                current[from].insert(position, task);

                let Some(score) = score else {
                    continue;
                };

                let candidate = Move { task, from, to };
                let admissible = !tabu.contains(&candidate) || score < best_makespan;
                if admissible && chosen.map_or(true, |(_, best)| score < best) {
                    chosen = Some((candidate, score));
                }
            }
        }
    }

    chosen
}

fn apply(assignment: &mut [Vec<usize>], relocation: Move) {
    let Some(position) = assignment[relocation.from]
        .iter()
        .position(|&task| task == relocation.task)
    else {
        unreachable!("Moves are generated from the current assignment");
    };
    assignment[relocation.from].remove(position);
    assignment[relocation.to].push(relocation.task);
}

/// Improves an assignment by single-task relocations under a short-term tabu memory.
///
/// # Errors
/// - `InvalidInput` if the assignment is not a partition of the objective's tasks,
///   has no machine, or cannot be scored by the objective.
pub fn tabu_search(
    objective: &impl Objective,
    initial: Assignment,
    config: &TabuConfig,
) -> Result<TabuOutcome, Error> {
    validate(objective.tasks(), &initial)?;

    let mut best_makespan = objective
        .makespan(&initial)
        .ok_or(InvalidInput::InfeasibleAssignment)?;
    let mut current = initial.clone();
    let mut best = initial;
    let mut tabu = TabuList::new(config.tabu_size);
    let mut history = Vec::with_capacity(config.iterations);
    let mut termination = Termination::BudgetExhausted;

    for iteration in 1..=config.iterations {
        let Some((relocation, score)) =
            best_neighbor(objective, &mut current, &tabu, best_makespan)
        else {
            termination = Termination::NoAdmissibleMove;
            break;
        };

        apply(&mut current, relocation);
        tabu.push(relocation.reverse());

        if score < best_makespan {
            best_makespan = score;
            best.clone_from(&current);
        }
        history.push(best_makespan);

        debug!(
            iteration,
            task = relocation.task,
            from = relocation.from,
            to = relocation.to,
            score,
            best = best_makespan,
            "tabu move"
        );
    }

    Ok(TabuOutcome {
        assignment: best,
        makespan: best_makespan,
        iterations: history.len(),
        termination,
        history,
    })
}

/// HEFT followed by a precedence-aware tabu search over its machine sequences.
#[derive(Clone, Debug, Default)]
pub struct HeftTabu {
    config: TabuConfig,
}

impl HeftTabu {
    /// Creates the scheduler with the given search parameters.
    #[must_use]
    pub const fn new(config: TabuConfig) -> Self {
        Self { config }
    }
}

impl Scheduler for HeftTabu {
    fn schedule(&mut self, graph: &TaskGraph, machines: usize) -> Result<Schedule, Error> {
        let initial = Heft.schedule(graph, machines)?;
        let graph = graph.indexed();

        let outcome = tabu_search(&Sequenced::new(&graph), initial.sequences(), &self.config)?;

        debug!(
            heft = initial.cmax(),
            improved = outcome.makespan,
            iterations = outcome.iterations,
            "tabu refinement finished"
        );

        ScheduleBuilder::replay(&graph, &outcome.assignment)
            .ok_or_else(|| InvalidInput::InfeasibleAssignment.into())
    }

    fn name(&self) -> &'static str {
        "HEFT+Tabu"
    }
}

#[allow(unsafe_code)]
#[linkme::distributed_slice(super::SCHEDULERS)]
static INSTANCE: fn() -> Box<dyn Scheduler> = || Box::new(HeftTabu::default());

#[cfg(test)]
mod test {
    use super::*;
    use crate::data::{erdos_renyi, samples};

    const DURATIONS: [u64; 7] = [2, 3, 6, 4, 5, 1, 8];

    #[test]
    fn test_heft_tabu() -> anyhow::Result<()> {
        let config = TabuConfig {
            iterations: 20,
            tabu_size: 5,
        };
        samples(&mut HeftTabu::new(config), &[7, 9, 7, 20, 20])
    }

    #[test]
    fn duplicate_task_should_be_rejected() -> anyhow::Result<()> {
        let initial = vec![vec![0, 1, 4, 3], vec![2, 6, 5], vec![6]];
        let outcome = tabu_search(
            &MachineLoad::new(&DURATIONS)?,
            initial,
            &TabuConfig::default(),
        );
        assert_eq!(outcome, Err(InvalidInput::DuplicateAssignment(6).into()));
        Ok(())
    }

    #[test]
    fn malformed_assignments_should_be_rejected() -> anyhow::Result<()> {
        let objective = MachineLoad::new(&DURATIONS)?;
        let config = TabuConfig::default();

        assert_eq!(
            tabu_search(&objective, vec![vec![0, 1, 2, 3], vec![4, 5]], &config),
            Err(InvalidInput::UnassignedTask(6).into())
        );
        assert_eq!(
            tabu_search(&objective, vec![vec![0, 1, 2, 3, 9], vec![4, 5, 6]], &config),
            Err(InvalidInput::UnknownTask(9).into())
        );
        assert_eq!(
            tabu_search(&objective, Vec::new(), &config),
            Err(InvalidInput::NoMachines.into())
        );
        Ok(())
    }

    #[test]
    fn load_objective_should_reject_bad_durations() {
        assert_eq!(
            MachineLoad::new(&[3, 0, 2]).map(|_| ()),
            Err(InvalidInput::ZeroDuration(1).into())
        );
        assert_eq!(
            MachineLoad::new(&[u64::MAX / 2 + 1, u64::MAX / 2 + 1]).map(|_| ()),
            Err(InvalidInput::DurationOverflow.into())
        );
    }

    #[test]
    fn search_should_balance_loads() -> anyhow::Result<()> {
        let initial = vec![vec![0, 1, 4, 3], vec![2, 5], vec![6]];
        let objective = MachineLoad::new(&DURATIONS)?;
        let outcome = tabu_search(&objective, initial, &TabuConfig::default())?;

        assert_eq!(outcome.makespan, 10);
        assert_eq!(outcome.assignment, vec![vec![4, 3], vec![2, 5, 1], vec![6, 0]]);
        assert_eq!(objective.makespan(&outcome.assignment), Some(10));
        assert_eq!(outcome.termination, Termination::BudgetExhausted);
        assert_eq!(outcome.iterations, 100);
        assert_eq!(&outcome.history[..3], &[11, 10, 10]);
        assert!(outcome.history.windows(2).all(|pair| pair[1] <= pair[0]));
        Ok(())
    }

    #[test]
    fn search_should_stop_without_admissible_moves() -> anyhow::Result<()> {
        let objective = MachineLoad::new(&[5, 5])?;
        let config = TabuConfig {
            iterations: 10,
            tabu_size: 7,
        };
        let outcome = tabu_search(&objective, vec![vec![0], vec![1]], &config)?;

        assert_eq!(outcome.termination, Termination::NoAdmissibleMove);
        assert_eq!(outcome.iterations, 2);
        assert_eq!(outcome.history, vec![5, 5]);
        assert_eq!(outcome.assignment, vec![vec![0], vec![1]]);

        let single = tabu_search(&MachineLoad::new(&[4])?, vec![vec![0]], &config)?;
        assert_eq!(single.termination, Termination::NoAdmissibleMove);
        assert_eq!(single.makespan, 4);
        Ok(())
    }

    #[test]
    fn short_memory_should_exhaust_budget() -> anyhow::Result<()> {
        let config = TabuConfig {
            iterations: 10,
            tabu_size: 1,
        };
        let outcome = tabu_search(&MachineLoad::new(&[5, 5])?, vec![vec![0], vec![1]], &config)?;
        assert_eq!(outcome.termination, Termination::BudgetExhausted);
        assert_eq!(outcome.makespan, 5);
        Ok(())
    }

    #[test]
    fn aspiration_should_override_tabu() -> anyhow::Result<()> {
        let objective = MachineLoad::new(&[5, 5])?;
        let mut current = vec![vec![0, 1], vec![]];
        let mut tabu = TabuList::new(3);
        tabu.push(Move {
            task: 0,
            from: 0,
            to: 1,
        });

        let improving = best_neighbor(&objective, &mut current, &tabu, 10);
        assert_eq!(improving.map(|(relocation, _)| relocation.task), Some(0));

        let not_improving = best_neighbor(&objective, &mut current, &tabu, 5);
        assert_eq!(not_improving.map(|(relocation, _)| relocation.task), Some(1));
        assert_eq!(current, vec![vec![0, 1], vec![]]);
        Ok(())
    }

    #[test]
    fn tabu_list_should_evict_oldest() {
        let mut tabu = TabuList::new(2);
        let moves: Vec<_> = (0..3).map(|task| Move { task, from: 0, to: 1 }).collect();
        for &relocation in &moves {
            tabu.push(relocation);
        }
        assert!(!tabu.contains(&moves[0]));
        assert!(tabu.contains(&moves[1]));
        assert!(tabu.contains(&moves[2]));
    }

    #[test]
    fn sequenced_objective_should_reject_deadlocks() -> anyhow::Result<()> {
        let graph = IndexedGraph::from_parts(vec![3, 2], vec![vec![], vec![0]])?;
        let objective = Sequenced::new(&graph);

        assert_eq!(objective.makespan(&[vec![0, 1]]), Some(5));
        assert_eq!(objective.makespan(&[vec![1, 0]]), None);
        assert_eq!(
            tabu_search(&objective, vec![vec![1, 0]], &TabuConfig::default()),
            Err(InvalidInput::InfeasibleAssignment.into())
        );
        Ok(())
    }

    #[test]
    fn refinement_should_not_worsen_heft() -> anyhow::Result<()> {
        for seed in 0..6 {
            let graph = erdos_renyi(25, 0.2, seed)?;
            let heft = Heft.schedule(&graph, 3)?;
            let refined = HeftTabu::new(TabuConfig {
                iterations: 15,
                tabu_size: 7,
            })
            .schedule(&graph, 3)?;

            assert!(refined.verify(&graph.indexed()));
            assert!(refined.cmax() <= heft.cmax());
        }
        Ok(())
    }
}
