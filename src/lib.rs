// Loading
mod loader;
pub use loader::{Instruction, Instructions, Program};
mod span;

// Running
mod alu;
mod runtime;
pub use runtime::{Cpu, Flow};
pub mod opcode;
pub mod state;
pub mod output;

mod error;
pub use error::{run_failed, RunError};

pub mod env;

/// Amount of lines to show as context, each side of the offending line.
pub const DIAGNOSTIC_CONTEXT_LINES: usize = 4;
