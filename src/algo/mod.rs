mod heft;
mod list;
mod rank;
mod tabu;

pub use heft::Heft;
pub use list::{list_schedule, Topological};
pub use rank::{lower_bound, rank_order, ranks, upward_ranks};
pub use tabu::{
    tabu_search, HeftTabu, MachineLoad, Move, Objective, Sequenced, TabuConfig, TabuOutcome,
    Termination,
};

/// Every scheduler known to the binary, registered by the implementing modules.
#[allow(unsafe_code)]
#[linkme::distributed_slice]
pub static SCHEDULERS: [fn() -> Box<dyn crate::core::Scheduler>];
