//! Instruction dispatch.
//!
//! Failures found before the thread is touched (bad opcode, attribute bits
//! that disagree with the code, wrong arity, an unresolvable destination)
//! come back as [`ExecError::Fault`]. A source operand that cannot be
//! resolved once a destination slot is held, an integer division by zero, or
//! an opcode without runtime semantics is escalated to [`ExecError::Fatal`]
//! and poisons the thread.

use tracing::{debug, trace, warn};

use crate::error::{ExecError, Fault, FaultCode};

use super::math;
use super::opcode::{Opcode, code};
use super::operand::{ARG_1, ARG_2, ARG_3, ARG_DST, ARG_LHS, ARG_RHS, ARG_SRC, MASK_1, MASK_2, MASK_3, MASK_LHS, MASK_RHS, MASK_SRC};
use super::thread::{REG_COUNTER, Slot, Thread};

impl Thread {
    /// Execute `op` with `operands`, treating each operand whose bit is set in
    /// `flags` as an address.
    pub fn exec(&mut self, op: Opcode, operands: &[f64], flags: u32) -> Result<(), ExecError> {
        if let Some(fault) = &self.poison {
            return Err(ExecError::Fatal(fault.clone()));
        }

        let result = self.exec_unpoisoned(op, operands, flags);
        match &result {
            Ok(()) => {}
            Err(ExecError::Fault(fault)) => {
                debug!(target: "zorya::vm::exec", %op, code = %fault.code, message = %fault.message, "fault");
            }
            Err(ExecError::Fatal(fault)) => {
                warn!(
                    target: "zorya::vm::exec",
                    %op,
                    code = %fault.code,
                    message = %fault.message,
                    "fatal fault, thread poisoned"
                );
                self.poison = Some(fault.clone());
            }
        }
        result
    }

    fn exec_unpoisoned(&mut self, op: Opcode, operands: &[f64], flags: u32) -> Result<(), ExecError> {
        if !op.valid() {
            return Err(Fault::new(FaultCode::BadOpcode, format!("Unrecognized opcode: {}", op.raw())).into());
        }
        if !op.is_canonical() {
            return Err(Fault::new(
                FaultCode::BadOpcode,
                format!("{op} carries non-canonical attribute bits (raw 0x{:x}).", op.raw()),
            )
            .into());
        }
        if operands.len() != op.argc() {
            return Err(Fault::new(
                FaultCode::BadOpcode,
                format!("Expected {} operands for {op}, received {}.", op.argc(), operands.len()),
            )
            .into());
        }

        let dst = match operands.get(ARG_DST) {
            Some(&index) if op.has_destination() => Some(self.locate(index as i64)?),
            _ => None,
        };

        trace!(target: "zorya::vm::exec", %op, ?operands, flags, "dispatch");

        match op.strict() {
            code::ADD
            | code::SUB
            | code::DIV
            | code::IDIV
            | code::MUL
            | code::POW
            | code::MOD
            | code::IMOD
            | code::OR
            | code::AND
            | code::XOR
            | code::ARITH_SHIFT
            | code::BIT_SHIFT => {
                let dst = require_destination(op, dst)?;
                let lhs = self.source(operands, flags, ARG_LHS, MASK_LHS)?;
                let rhs = self.source(operands, flags, ARG_RHS, MASK_RHS)?;
                let value = math::binary(op.strict(), lhs, rhs).map_err(ExecError::Fatal)?;
                *self.slot_mut(dst) = value;
            }
            code::NEG | code::NOT | code::FLOOR | code::CEIL | code::ROUND | code::TRUNC => {
                let dst = require_destination(op, dst)?;
                let src = self.source(operands, flags, ARG_SRC, MASK_SRC)?;
                let value = math::unary(op.strict(), src).map_err(ExecError::Fatal)?;
                *self.slot_mut(dst) = value;
            }
            code::EQ | code::LE | code::LT => {
                let a = self.deref(operands[ARG_1], flags, MASK_1)?;
                let b = self.deref(operands[ARG_2], flags, MASK_2)?;
                let requested = self.deref(operands[ARG_3], flags, MASK_3)? != 0.0;
                let comp = match op.strict() {
                    code::EQ => a == b,
                    code::LE => a <= b,
                    _ => a < b,
                };
                // Mismatch skips the next instruction.
                if comp != requested {
                    self.reg[REG_COUNTER] += 1.0;
                }
            }
            code::JUMP => {
                self.reg[REG_COUNTER] = self.deref(operands[ARG_1], flags, MASK_1)?;
            }
            code::PUSH => {
                let value = self.deref(operands[ARG_1], flags, MASK_1)?;
                self.push(value)?;
            }
            code::POP => {
                // Peeking is `Load dst, -1` with the first flag set.
                let dst = require_destination(op, dst)?;
                let value = self.pop()?;
                *self.slot_mut(dst) = value;
            }
            code::LOAD => {
                let dst = require_destination(op, dst)?;
                let value = self.source(operands, flags, ARG_SRC, MASK_SRC)?;
                *self.slot_mut(dst) = value;
            }
            code::CALL
            | code::RETURN
            | code::REALLOC
            | code::FREE
            | code::MEMMOVE
            | code::TRAP
            | code::MEMDUP
            | code::MEMLEN
            | code::PEEK
            | code::POKE
            | code::DEFER
            | code::FORCE => {
                return Err(ExecError::Fatal(Fault::new(FaultCode::BadOpcode, format!("{op} not implemented"))));
            }
            other => {
                return Err(Fault::new(FaultCode::BadOpcode, format!("Unrecognized opcode: {other}")).into());
            }
        }
        Ok(())
    }

    /// Dereference a source operand while a destination slot is held. Any
    /// failure here leaves the instruction half done, so it is fatal.
    #[inline]
    fn source(&self, operands: &[f64], flags: u32, arg: usize, mask: u32) -> Result<f64, ExecError> {
        self.deref(operands[arg], flags, mask).map_err(ExecError::Fatal)
    }
}

#[inline]
fn require_destination(op: Opcode, dst: Option<Slot>) -> Result<Slot, ExecError> {
    dst.ok_or_else(|| {
        Fault::new(FaultCode::BadOpcode, format!("{op} is encoded without a destination operand.")).into()
    })
}
