//! Domain model: phases, tasks, trades, and the phase-ordering rule table.

pub mod phase;
pub mod task;

pub use phase::{InspectionType, Phase, PhaseOrderingRules};
pub use task::{Task, TaskStatus, Trade};
