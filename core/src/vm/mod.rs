//! Hybrid register/stack interpreter
//!
//! Opcode decoding, the per-thread execution context and the dispatcher that
//! drives it one instruction at a time.

mod exec;
pub mod math;
pub mod opcode;
pub mod operand;
mod program;
mod stack;
mod thread;

pub use opcode::{Opcode, code};
pub use program::{Instruction, Program, RunOutcome, StepOutcome};
pub use thread::{REG_COUNTER, REG_RETURN, REG_STACK_BASE, REG_STACK_TIP, RESERVED_REGISTERS, Thread};

#[cfg(test)]
mod math_test;
#[cfg(test)]
mod opcode_test;
#[cfg(test)]
mod program_test;
