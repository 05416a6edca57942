use crate::algo::lower_bound;
use crate::core::{Scheduler, TaskGraph};
use crate::data::deserialize;
use anyhow::{anyhow, ensure};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::info;

/// Report of running a directory of samples.
#[derive(Debug, Deserialize, Serialize)]
pub struct Report {
    scheduler: String,
    entries: Vec<ReportEntry>,
}

impl Report {
    /// Create a new report.
    fn new(scheduler: String) -> Self {
        let entries = Vec::new();
        Self { scheduler, entries }
    }

    /// Get the scheduler name.
    #[must_use]
    pub fn scheduler_name(&self) -> &str {
        &self.scheduler
    }

    /// Get the entries.
    #[must_use]
    pub fn entries(&self) -> &[ReportEntry] {
        &self.entries
    }
}

impl Display for Report {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        writeln!(f, "Scheduler: {}", self.scheduler)?;
        for entry in &self.entries {
            writeln!(f, "{entry}")?;
        }
        writeln!(f, "-------------------")
    }
}

/// Report of running a single sample.
#[non_exhaustive]
#[derive(Debug, Deserialize, Serialize)]
pub struct ReportEntry {
    pub name: String,
    pub machines: usize,
    pub cmax: u64,
    pub lower_bound: u64,
    pub time: f64,
}

impl Display for ReportEntry {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(
            f,
            "{}: Cmax {} (bound {}) on {} machines in {:.3} sec",
            self.name, self.cmax, self.lower_bound, self.machines, self.time
        )
    }
}

/// Run all samples in the `samples` directory and compare each Cmax with
/// `expected`, given in file name order.
/// Print the report to stdout.
///
/// # Errors
/// - If a file cannot be read.
/// - If no samples are found.
/// - If a schedule is invalid or its Cmax differs from the expected one.
pub fn samples(solver: &mut dyn Scheduler, expected: &[u64]) -> anyhow::Result<()> {
    let report = run("samples", solver)?;
    ensure!(!report.entries.is_empty(), "No samples found");
    ensure!(
        report.entries.len() == expected.len(),
        "{} samples found, {} expected",
        report.entries.len(),
        expected.len()
    );

    for (entry, &cmax) in report.entries.iter().zip(expected) {
        ensure!(
            entry.cmax == cmax,
            "{}: {} gave Cmax {}, expected {cmax}",
            entry.name,
            report.scheduler,
            entry.cmax
        );
    }

    println!("{report}");
    Ok(())
}

/// Run all instances in the `dir` directory, in file name order.
/// The machine count of each instance is taken from its file name,
/// `{machines}_{index}.json`.
///
/// # Errors
/// - If a file cannot be read or has a malformed name.
/// - If the scheduler fails or creates an invalid schedule.
pub fn run(dir: impl AsRef<Path>, solver: &mut dyn Scheduler) -> anyhow::Result<Report> {
    let mut report = Report::new(solver.name().into());

    let mut files = std::fs::read_dir(dir)?.collect::<std::io::Result<Vec<_>>>()?;
    files.sort_by_key(std::fs::DirEntry::file_name);

    for file in files {
        let (name, machines) = parse_filename(&file.file_name())?;
        let graph: TaskGraph = deserialize(&mut BufReader::new(File::open(file.path())?))?;
        let indexed = graph.indexed();

        let time = std::time::Instant::now();
        let schedule = solver.schedule(&graph, machines)?;
        let time = time.elapsed().as_secs_f64();

        ensure!(schedule.verify(&indexed), "Invalid schedule created for {name}");

        let entry = ReportEntry {
            name,
            machines,
            cmax: schedule.cmax(),
            lower_bound: lower_bound(&indexed, machines)?,
            time,
        };
        info!(scheduler = solver.name(), %entry, "instance scheduled");
        report.entries.push(entry);
    }

    Ok(report)
}

fn parse_filename(filename: &std::ffi::OsString) -> anyhow::Result<(String, usize)> {
    static NAME_ERR: &str = "Cannot read filename";

    let name = filename.to_str().ok_or_else(|| anyhow!(NAME_ERR))?;
    let stem = name.strip_suffix(".json").ok_or_else(|| anyhow!(NAME_ERR))?;
    let mut parts = stem.split('_');
    let machines = parts.next().ok_or_else(|| anyhow!(NAME_ERR))?.parse()?;
    let _: usize = parts.next().ok_or_else(|| anyhow!(NAME_ERR))?.parse()?;
    ensure!(parts.next().is_none(), NAME_ERR);
    ensure!(machines > 0, "Instance {name} has no machines");
    Ok((name.into(), machines))
}
