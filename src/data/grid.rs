use super::erdos_renyi;
use crate::cast_u64;
use crate::core::{Error, Scheduler, TaskGraph};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result};
use tracing::{debug, info};

/// Summary of a single scheduling run.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct RunRecord {
    pub algorithm: String,
    pub tasks: usize,
    pub probability: f64,
    pub machines: usize,
    pub cmax: u64,
}

impl Display for RunRecord {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(
            f,
            "{}, {}, {}, {}, {}",
            self.algorithm, self.tasks, self.probability, self.machines, self.cmax
        )
    }
}

/// Schedules `graph` once and summarizes the result.
/// `probability` is the edge probability the graph was generated with.
///
/// # Errors
/// - If the scheduler rejects the graph or the machine count.
pub fn run_single(
    scheduler: &mut dyn Scheduler,
    graph: &TaskGraph,
    probability: f64,
    machines: usize,
) -> std::result::Result<RunRecord, Error> {
    let schedule = scheduler.schedule(graph, machines)?;
    Ok(RunRecord {
        algorithm: scheduler.name().into(),
        tasks: graph.len(),
        probability,
        machines,
        cmax: schedule.cmax(),
    })
}

/// Parameter grid of a batch experiment over random graphs.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Grid {
    pub tasks: Vec<usize>,
    pub probabilities: Vec<f64>,
    pub machines: Vec<usize>,
    /// Random graphs generated per `(tasks, probability)` pair.
    pub instances: usize,
    pub seed: u64,
}

/// Average makespan of one scheduler over the instances of a grid cell.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct GridEntry {
    pub algorithm: String,
    pub tasks: usize,
    pub probability: f64,
    pub machines: usize,
    pub instances: usize,
    pub average_cmax: f64,
}

impl Display for GridEntry {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(
            f,
            "{}, {}, {}, {}, {:.2}",
            self.algorithm, self.tasks, self.probability, self.machines, self.average_cmax
        )
    }
}

/// Runs every scheduler on every cell of the grid and averages Cmax per cell.
/// Instance `i` of a `(tasks, probability)` pair is generated with seed `seed + i`,
/// so all schedulers and machine counts see the same graphs.
///
/// Entries are ordered by tasks, probability, machines, then scheduler.
///
/// # Errors
/// - `InvalidInput` if a probability is outside `[0, 1]` or a machine count is 0.
#[allow(clippy::cast_precision_loss)]
pub fn run_grid(
    grid: &Grid,
    schedulers: &mut [Box<dyn Scheduler>],
) -> std::result::Result<Vec<GridEntry>, Error> {
    let mut entries = Vec::new();

    for &tasks in &grid.tasks {
        for &probability in &grid.probabilities {
            let graphs = (0..grid.instances)
                .map(|i| erdos_renyi(tasks, probability, grid.seed.wrapping_add(cast_u64(i))))
                .collect::<std::result::Result<Vec<_>, _>>()?;

            for &machines in &grid.machines {
                for scheduler in schedulers.iter_mut() {
                    let mut total = 0;
                    for graph in &graphs {
                        let record = run_single(scheduler.as_mut(), graph, probability, machines)?;
                        debug!(%record, "run finished");
                        total += record.cmax;
                    }

                    let entry = GridEntry {
                        algorithm: scheduler.name().into(),
                        tasks,
                        probability,
                        machines,
                        instances: graphs.len(),
                        average_cmax: if graphs.is_empty() {
                            0.0
                        } else {
                            total as f64 / cast_u64(graphs.len()) as f64
                        },
                    };
                    info!(%entry, "grid cell finished");
                    entries.push(entry);
                }
            }
        }
    }

    Ok(entries)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::algo::{Heft, Topological};
    use crate::core::InvalidInput;

    fn schedulers() -> Vec<Box<dyn Scheduler>> {
        vec![Box::new(Heft), Box::new(Topological)]
    }

    #[test]
    fn record_should_render_summary_line() -> anyhow::Result<()> {
        let graph = erdos_renyi(1, 0.5, 3)?;
        let record = run_single(&mut Topological, &graph, 0.5, 1)?;
        let duration = graph.get(0).map(|task| task.duration).unwrap_or_default();

        assert_eq!(record.cmax, duration);
        assert_eq!(record.to_string(), format!("Topological, 1, 0.5, 1, {duration}"));
        Ok(())
    }

    #[test]
    fn grid_should_cover_every_cell() -> anyhow::Result<()> {
        let grid = Grid {
            tasks: vec![5, 20],
            probabilities: vec![0.25, 0.5],
            machines: vec![2, 3],
            instances: 3,
            seed: 11,
        };
        let entries = run_grid(&grid, &mut schedulers())?;

        assert_eq!(entries.len(), 2 * 2 * 2 * 2);
        assert_eq!(entries[0].algorithm, "HEFT");
        assert_eq!(entries[1].algorithm, "Topological");
        assert!(entries.iter().all(|entry| entry.instances == 3));
        assert!(entries.iter().all(|entry| entry.average_cmax > 0.0));
        Ok(())
    }

    #[test]
    fn grid_should_be_reproducible() -> anyhow::Result<()> {
        let grid = Grid {
            tasks: vec![30],
            probabilities: vec![0.3],
            machines: vec![4],
            instances: 4,
            seed: 5,
        };
        assert_eq!(run_grid(&grid, &mut schedulers())?, run_grid(&grid, &mut schedulers())?);
        Ok(())
    }

    #[test]
    fn instances_should_use_consecutive_seeds() -> anyhow::Result<()> {
        let grid = Grid {
            tasks: vec![12],
            probabilities: vec![0.4],
            machines: vec![2],
            instances: 2,
            seed: u64::MAX,
        };
        let entries = run_grid(&grid, &mut [Box::new(Heft) as Box<dyn Scheduler>])?;

        let mut total = 0;
        for seed in [u64::MAX, 0] {
            total += run_single(&mut Heft, &erdos_renyi(12, 0.4, seed)?, 0.4, 2)?.cmax;
        }
        assert_eq!(entries.len(), 1);
        assert!((entries[0].average_cmax * 2.0 - f64::from(u32::try_from(total)?)).abs() < 1e-9);
        Ok(())
    }

    #[test]
    fn grid_should_reject_invalid_axes() {
        let mut grid = Grid {
            tasks: vec![5],
            probabilities: vec![2.0],
            machines: vec![2],
            instances: 1,
            seed: 0,
        };
        assert_eq!(
            run_grid(&grid, &mut schedulers()),
            Err(InvalidInput::EdgeProbability(2.0).into())
        );

        grid.probabilities = vec![0.5];
        grid.machines = vec![0];
        assert_eq!(
            run_grid(&grid, &mut schedulers()),
            Err(InvalidInput::NoMachines.into())
        );
    }
}
