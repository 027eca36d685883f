//! Execution core of the Zorya bytecode VM.
//!
//! A host assembles [`vm::Instruction`]s, hands them to a [`vm::Thread`] and
//! drives it with [`vm::Thread::exec`], [`vm::Thread::step`] or
//! [`vm::Thread::run`].

pub mod config;
pub mod error;
pub mod vm;

pub use config::{ThreadConfig, init_tracing};
pub use error::{ExecError, Fault, FaultCode, Trace, TraceFrame, code_of, is_bad_access, is_bad_opcode};
pub use vm::{Instruction, Opcode, Program, Thread};

#[cfg(test)]
mod error_test;
