use super::rank::{rank_order, upward_ranks};
use crate::core::{Error, Schedule, Scheduler, TaskGraph};
use tracing::debug;

/// HEFT list scheduling: tasks are visited by descending upward rank,
/// so the ones heading the longest remaining chains are placed first.
#[derive(Clone, Debug, Default)]
pub struct Heft;

impl Scheduler for Heft {
    fn schedule(&mut self, graph: &TaskGraph, machines: usize) -> Result<Schedule, Error> {
        let graph = graph.indexed();
        let ranks = upward_ranks(&graph)?;
        let order = rank_order(&graph, &ranks);

        debug!(
            critical_path = ranks.iter().max().copied().unwrap_or_default(),
            "ranks computed"
        );

        super::list::schedule(&graph, &order, machines)
    }

    fn name(&self) -> &'static str {
        "HEFT"
    }
}

#[allow(unsafe_code)]
#[linkme::distributed_slice(super::SCHEDULERS)]
static INSTANCE: fn() -> Box<dyn Scheduler> = || Box::new(Heft);
