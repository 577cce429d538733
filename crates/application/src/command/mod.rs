//! Command resolution and execution.

mod executor;
mod resolver;

pub use executor::{CommandExecutor, CommandOutcome, ExecutorSettings};
pub use resolver::CommandResolver;
