use clap::{Parser, ValueEnum};
use dag_scheduling::algo::{self, tabu_search, MachineLoad, TabuConfig};
use dag_scheduling::core::Scheduler;
use dag_scheduling::data::{self, erdos_renyi, run_grid, Grid, TabuInstance};
use dag_scheduling::run_reader;
use std::fs::File;
use std::io::{BufReader, Write};
use std::num::NonZero;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Copy, Clone, Debug)]
struct Algorithm(usize, &'static str);

impl From<Algorithm> for Box<dyn Scheduler> {
    fn from(value: Algorithm) -> Box<dyn Scheduler> {
        algo::SCHEDULERS[value.0]()
    }
}

impl std::fmt::Display for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.1)
    }
}

impl ValueEnum for Algorithm {
    fn value_variants<'a>() -> &'a [Self] {
        static ALGORITHMS: std::sync::LazyLock<Vec<Algorithm>> = std::sync::LazyLock::new(|| {
            let iter = algo::SCHEDULERS.iter().enumerate();
            let mut algorithms: Vec<_> = iter.map(|(i, init)| Algorithm(i, init().name())).collect();
            algorithms.sort_by_key(|algorithm| algorithm.1);
            algorithms
        });

        ALGORITHMS.as_slice()
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(clap::builder::PossibleValue::new(self.1))
    }
}

/// Application scheduling precedence-constrained task graphs on identical machines.
#[derive(Debug, Parser)]
enum Application {
    /// Schedule a task graph read from a file or stdin.
    Run {
        algorithm: Algorithm,
        /// The number of machines.
        machines: NonZero<usize>,
        /// The task graph file. Reads stdin when omitted.
        input: Option<PathBuf>,
    },
    /// Run benchmarks on a directory of `{machines}_{index}.json` task graphs.
    Bench {
        /// The input directory.
        input: PathBuf,
        /// Exclude scheduling algorithms.
        #[clap(short, long, value_delimiter = ',')]
        exclude: Vec<Algorithm>,
    },
    /// Average the makespan of every algorithm over a grid of random graphs.
    Grid {
        /// Task counts.
        #[clap(short, long, value_delimiter = ',', default_value = "10,50,100")]
        tasks: Vec<usize>,
        /// Edge probabilities.
        #[clap(short, long, value_delimiter = ',', default_value = "0.1,0.3,0.5")]
        probabilities: Vec<f64>,
        /// Machine counts.
        #[clap(short, long, value_delimiter = ',', default_value = "2,4,8")]
        machines: Vec<NonZero<usize>>,
        /// Random graphs per task count and probability.
        #[clap(short, long, default_value = "10")]
        instances: usize,
        /// Seed of the first graph of each cell.
        #[clap(short, long, default_value = "0")]
        seed: u64,
        /// Exclude scheduling algorithms.
        #[clap(short, long, value_delimiter = ',')]
        exclude: Vec<Algorithm>,
        /// Write the result lines to this file instead of stdout.
        #[clap(short, long)]
        output: Option<PathBuf>,
    },
    /// Generate random task graphs.
    Gen {
        /// The number of tasks.
        tasks: NonZero<usize>,
        /// The probability of an edge between two tasks.
        probability: f64,
        /// The number of machines, recorded in the file names.
        machines: NonZero<usize>,
        /// Seed of the first graph.
        #[clap(short, long, default_value = "0")]
        seed: u64,
        /// Number of graphs to generate.
        #[clap(short, long, default_value = "1")]
        amount: NonZero<u64>,
        /// Path to output the generated graphs. If the directory does not exist, it will be created.
        #[clap(short, long, default_value = "output")]
        output: PathBuf,
    },
    /// Improve a machine assignment by tabu search on machine loads.
    Tabu {
        /// The instance file holding durations and the starting assignment. Reads stdin when omitted.
        input: Option<PathBuf>,
        /// Maximum number of moves.
        #[clap(short, long, default_value = "100")]
        iterations: usize,
        /// Number of recent moves kept tabu.
        #[clap(short, long, default_value = "7")]
        tabu_size: usize,
    },
}

fn schedulers(exclude: &[Algorithm]) -> Vec<Box<dyn Scheduler>> {
    let iter = algo::SCHEDULERS.iter().map(|init| init());
    let mut schedulers: Vec<_> = iter
        .filter(|scheduler| !exclude.iter().any(|name| name.1 == scheduler.name()))
        .collect();
    schedulers.sort_by_key(|scheduler| scheduler.name());
    schedulers
}

fn read<T: serde::de::DeserializeOwned>(input: Option<&Path>) -> anyhow::Result<T> {
    match input {
        Some(path) => data::deserialize(&mut BufReader::new(File::open(path)?)),
        None => data::deserialize(&mut std::io::stdin().lock()),
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    match Application::parse() {
        Application::Run {
            algorithm,
            machines,
            input,
        } => {
            let mut scheduler = Box::<dyn Scheduler>::from(algorithm);
            let mut stdout = std::io::stdout().lock();
            match input {
                Some(path) => run_reader(
                    scheduler.as_mut(),
                    machines.get(),
                    &mut BufReader::new(File::open(path)?),
                    &mut stdout,
                ),
                None => run_reader(
                    scheduler.as_mut(),
                    machines.get(),
                    &mut std::io::stdin().lock(),
                    &mut stdout,
                ),
            }
        }
        Application::Bench { input, exclude } => {
            for mut scheduler in schedulers(&exclude) {
                println!("{}", data::run(&input, scheduler.as_mut())?);
            }
            Ok(())
        }
        Application::Grid {
            tasks,
            probabilities,
            machines,
            instances,
            seed,
            exclude,
            output,
        } => {
            let grid = Grid {
                tasks,
                probabilities,
                machines: machines.into_iter().map(NonZero::get).collect(),
                instances,
                seed,
            };
            let entries = run_grid(&grid, &mut schedulers(&exclude))?;

            let mut writer: Box<dyn Write> = match output {
                Some(path) => Box::new(File::create(path)?),
                None => Box::new(std::io::stdout().lock()),
            };
            for entry in entries {
                writeln!(writer, "{entry}")?;
            }
            Ok(())
        }
        Application::Gen {
            tasks,
            probability,
            machines,
            seed,
            amount,
            output,
        } => {
            if !output.try_exists()? {
                std::fs::create_dir_all(&output)?;
            }

            for i in 0..amount.get() {
                let graph = erdos_renyi(tasks.get(), probability, seed.wrapping_add(i))?;
                let filename = format!("{machines}_{i}.json");
                File::create(output.join(&filename))?
                    .write_all(data::to_string(&graph)?.as_bytes())?;
                info!(%filename, edges = graph.edges(), "graph generated");
            }
            Ok(())
        }
        Application::Tabu {
            input,
            iterations,
            tabu_size,
        } => {
            let instance: TabuInstance = read(input.as_deref())?;
            let config = TabuConfig {
                iterations,
                tabu_size,
            };
            let outcome = tabu_search(
                &MachineLoad::new(&instance.durations)?,
                instance.assignment,
                &config,
            )?;
            println!("{}", data::to_string(&outcome)?);
            Ok(())
        }
    }
}
