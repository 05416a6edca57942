#![deny(clippy::all, clippy::cargo, clippy::expect_used, clippy::unwrap_used)]
#![deny(clippy::pedantic, clippy::nursery, unsafe_code)]
#![warn(clippy::unimplemented, clippy::redundant_type_annotations)]

use anyhow::Result;
use std::io::{BufRead, Write};

pub mod algo;
pub mod core;
pub mod data;

/// Runs the given scheduler on the task graph read from reader and writes the schedule to writer.
/// Also writes the makespan on the last line.
///
/// # Errors
/// - If the task graph could not be read from the reader.
/// - If the scheduler rejects the graph or the machine count.
/// - If the schedule could not be written.
///
/// # Panics
///  - If the schedule is invalid in debug mode.
pub fn run_reader(
    scheduler: &mut dyn core::Scheduler,
    machines: usize,
    reader: &mut impl BufRead,
    writer: &mut impl Write,
) -> Result<()> {
    let graph: core::TaskGraph = data::deserialize(reader)?;
    let schedule = scheduler.schedule(&graph, machines)?;

    debug_assert!(
        schedule.verify(&graph.indexed()),
        "Schedule is invalid: {schedule:?}"
    );

    writeln!(writer, "{}", data::to_string(&schedule)?)?;
    writeln!(writer, "{}", schedule.cmax())?;

    Ok(())
}

#[cfg(not(target_pointer_width = "64"))]
compile_error!("Must be 64-bit system!");

/// Casts the given value to `u64`.
/// It should never fail on 64-bit systems.
///
/// # Panics
/// - If the value cannot be cast to `u64`.
#[must_use]
pub fn cast_u64(value: usize) -> u64 {
    u64::try_from(value).unwrap_or_else(|_| unreachable!("Must be 64-bit system!"))
}
