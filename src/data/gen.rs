use crate::core::{Error, InvalidInput, TaskGraph};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Largest duration given to a generated task.
pub const MAX_DURATION: u64 = 10;

/// Generates a random DAG following the Erdős–Rényi model.
/// Task `i` depends on every task `j < i` with probability `probability`;
/// durations are uniform in `1..=MAX_DURATION`.
///
/// # Errors
/// - `InvalidInput::EdgeProbability` if `probability` is not within `[0, 1]`.
pub fn erdos_renyi(tasks: usize, probability: f64, seed: u64) -> Result<TaskGraph, Error> {
    if !(0.0..=1.0).contains(&probability) {
        return Err(InvalidInput::EdgeProbability(probability).into());
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut graph = TaskGraph::new();

    for task in 0..tasks {
        graph.add_task(task, rng.gen_range(1..=MAX_DURATION))?;
        for predecessor in 0..task {
            if rng.gen_bool(probability) {
                graph.add_dependency(task, predecessor)?;
            }
        }
    }

    Ok(graph)
}
