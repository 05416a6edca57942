mod gen;
mod grid;
mod run;

pub use gen::*;
pub use grid::*;
pub use run::*;

use crate::core::Assignment;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::io::BufRead;

/// Reads a JSON value.
///
/// # Errors
/// - If the reader fails or the content is not a valid value.
pub fn deserialize<T: DeserializeOwned>(reader: &mut impl BufRead) -> anyhow::Result<T> {
    Ok(serde_json::from_reader(reader)?)
}

/// Writes a value as pretty-printed JSON.
///
/// # Errors
/// - If the value cannot be serialized.
pub fn to_string<T: Serialize>(value: &T) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Input of a stand-alone tabu search: task durations and a starting assignment
/// of task indices to machines.
#[derive(Clone, Debug, Deserialize, Eq, Serialize, PartialEq)]
pub struct TabuInstance {
    pub durations: Vec<u64>,
    pub assignment: Assignment,
}
