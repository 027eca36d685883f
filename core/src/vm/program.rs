//! Instruction streams and the step/run driver.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ExecError, Fault, FaultCode};

use super::opcode::Opcode;
use super::thread::Thread;

/// One decoded instruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
    pub op: Opcode,
    #[serde(default)]
    pub operands: Vec<f64>,
    /// Indirection mask, see [`crate::vm::operand`].
    #[serde(default)]
    pub flags: u32,
}

impl Instruction {
    pub fn new(op: Opcode, operands: impl Into<Vec<f64>>) -> Self {
        Self {
            op,
            operands: operands.into(),
            flags: 0,
        }
    }

    pub fn with_flags(mut self, flags: u32) -> Self {
        self.flags = flags;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub instructions: Vec<Instruction>,
}

impl Program {
    pub fn new(instructions: Vec<Instruction>) -> Self {
        Self { instructions }
    }

    pub fn from_json_str(src: &str) -> Result<Self> {
        serde_json::from_str(src).context("invalid program JSON")
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn get(&self, pc: usize) -> Option<&Instruction> {
        self.instructions.get(pc)
    }
}

impl FromIterator<Instruction> for Program {
    fn from_iter<T: IntoIterator<Item = Instruction>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Executed one instruction; more may follow.
    Continue,
    /// The program counter reached the end of the program.
    Halt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOutcome {
    pub outcome: StepOutcome,
    /// Instructions executed in this run.
    pub steps: usize,
}

impl Thread {
    /// Execute the instruction at the program counter.
    ///
    /// The counter is advanced by one before dispatch, so a jump lands exactly
    /// on its target and a comparison mismatch skips the following instruction.
    /// On a recoverable fault the counter is restored.
    pub fn step(&mut self, program: &Program) -> Result<StepOutcome, ExecError> {
        if let Some(fault) = &self.poison {
            return Err(ExecError::Fatal(fault.clone()));
        }

        let pc = self.pc();
        let len = program.len();
        if pc.fract() != 0.0 || pc < 0.0 || pc > len as f64 {
            return Err(Fault::new(
                FaultCode::BadAccess,
                format!("Program counter {pc} is outside a program of {len} instructions."),
            )
            .into());
        }
        let Some(instr) = program.get(pc as usize) else {
            return Ok(StepOutcome::Halt);
        };

        self.set_pc(pc + 1.0);
        if let Err(err) = self.exec(instr.op, &instr.operands, instr.flags) {
            if !err.is_fatal() {
                self.set_pc(pc);
            }
            return Err(err);
        }
        Ok(StepOutcome::Continue)
    }

    /// Step until the program halts or `max_steps` instructions have run.
    pub fn run(&mut self, program: &Program, max_steps: usize) -> Result<RunOutcome> {
        debug!(target: "zorya::vm::run", instructions = program.len(), max_steps, "run start");
        let mut steps = 0;
        while steps < max_steps {
            let pc = self.pc();
            let outcome = self
                .step(program)
                .with_context(|| format!("instruction at pc {pc} failed after {steps} steps"))?;
            match outcome {
                StepOutcome::Continue => steps += 1,
                StepOutcome::Halt => {
                    debug!(target: "zorya::vm::run", steps, "halted");
                    return Ok(RunOutcome {
                        outcome: StepOutcome::Halt,
                        steps,
                    });
                }
            }
        }
        debug!(target: "zorya::vm::run", steps, "step budget exhausted");
        Ok(RunOutcome {
            outcome: StepOutcome::Continue,
            steps,
        })
    }
}
