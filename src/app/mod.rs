pub mod context;
pub mod error;
pub mod runner;

pub use context::AppContext;
pub use error::{CourierError, Result};
pub use runner::{run_cycle, RunOutcome, RunSummary};
