use crate::config::ThreadConfig;
use crate::error::{Fault, FaultCode};

use super::operand::is_indirect;

pub const REG_COUNTER: usize = 0;
pub const REG_STACK_BASE: usize = 1;
pub const REG_STACK_TIP: usize = 2;
pub const REG_RETURN: usize = 3;

/// Registers 0..RESERVED_REGISTERS have fixed roles.
pub const RESERVED_REGISTERS: usize = 4;

/// A resolved storage location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Slot {
    Register(usize),
    Stack(usize),
}

/// Execution context: registers plus a growable value stack.
///
/// The stack buffer is always kept at its full capacity length; the live
/// region is `stack_base..stack_tip` as recorded in the reserved registers.
#[derive(Debug, Clone)]
pub struct Thread {
    pub(super) reg: Vec<f64>,
    pub(super) stack: Vec<f64>,
    pub(super) stack_limit: Option<usize>,
    pub(super) poison: Option<Fault>,
}

impl Thread {
    /// A thread with `registers` registers (at least the reserved ones) and an
    /// empty stack.
    pub fn new(registers: usize) -> Self {
        Self {
            reg: vec![0.0; registers.max(RESERVED_REGISTERS)],
            stack: Vec::new(),
            stack_limit: None,
            poison: None,
        }
    }

    pub fn with_config(config: &ThreadConfig) -> Result<Self, Fault> {
        config.validate()?;
        let mut stack = Vec::with_capacity(config.stack_capacity);
        stack.resize(stack.capacity(), 0.0);
        Ok(Self {
            reg: vec![0.0; config.registers],
            stack,
            stack_limit: config.stack_limit,
            poison: None,
        })
    }

    pub fn registers(&self) -> &[f64] {
        &self.reg
    }

    pub fn register(&self, index: usize) -> Option<f64> {
        self.reg.get(index).copied()
    }

    pub fn pc(&self) -> f64 {
        self.reg[REG_COUNTER]
    }

    pub fn set_pc(&mut self, pc: f64) {
        self.reg[REG_COUNTER] = pc;
    }

    pub fn return_value(&self) -> f64 {
        self.reg[REG_RETURN]
    }

    pub fn stack_base(&self) -> i64 {
        self.reg[REG_STACK_BASE] as i64
    }

    pub fn stack_tip(&self) -> i64 {
        self.reg[REG_STACK_TIP] as i64
    }

    /// Live stack slots, bottom first.
    pub fn stack(&self) -> &[f64] {
        let len = self.stack.len() as i64;
        let lo = self.stack_base().clamp(0, len) as usize;
        let hi = self.stack_tip().clamp(0, len) as usize;
        if lo >= hi { &[] } else { &self.stack[lo..hi] }
    }

    /// Slots available before the next push reallocates.
    pub fn stack_capacity(&self) -> usize {
        self.stack.len()
    }

    pub fn is_poisoned(&self) -> bool {
        self.poison.is_some()
    }

    /// The fault that poisoned this thread, if any.
    pub fn poison(&self) -> Option<&Fault> {
        self.poison.as_ref()
    }

    /// Zero every register and stack slot and clear the poison. Buffers keep
    /// their capacity.
    pub fn reset(&mut self) {
        self.reg.fill(0.0);
        self.stack.fill(0.0);
        self.poison = None;
    }

    /// Resolve `index` to a slot. Non-negative indices are registers, negative
    /// ones count back from the stack tip (-1 is the top of the stack).
    pub(crate) fn locate(&self, index: i64) -> Result<Slot, Fault> {
        if index >= 0 {
            let idx = index as usize;
            if idx >= self.reg.len() {
                return Err(Fault::new(
                    FaultCode::BadAccess,
                    format!(
                        "Storage offset for register index {index} exceeds register count {}.",
                        self.reg.len()
                    ),
                ));
            }
            return Ok(Slot::Register(idx));
        }

        let pos = self.stack_tip().saturating_add(index);
        if pos < 0 {
            return Err(Fault::new(
                FaultCode::BadAccess,
                format!(
                    "Storage offset for stack index {index} exceeds stack size {}.",
                    self.stack_tip()
                ),
            ));
        }
        let pos = pos as usize;
        // Slots past the live tip are reachable as long as the buffer covers them.
        if pos >= self.stack.len() {
            return Err(Fault::new(
                FaultCode::BadAccess,
                format!(
                    "Storage offset for stack index {index} lands past the stack buffer ({} slots).",
                    self.stack.len()
                ),
            ));
        }
        Ok(Slot::Stack(pos))
    }

    #[inline]
    pub(crate) fn slot(&self, slot: Slot) -> f64 {
        match slot {
            Slot::Register(i) => self.reg[i],
            Slot::Stack(i) => self.stack[i],
        }
    }

    #[inline]
    pub(crate) fn slot_mut(&mut self, slot: Slot) -> &mut f64 {
        match slot {
            Slot::Register(i) => &mut self.reg[i],
            Slot::Stack(i) => &mut self.stack[i],
        }
    }

    /// Read-write access to one register or stack slot.
    pub fn storage(&mut self, index: i64) -> Result<&mut f64, Fault> {
        let slot = self.locate(index)?;
        Ok(self.slot_mut(slot))
    }

    /// Resolve an operand: `value` itself when its flag bit is clear,
    /// otherwise the contents of the slot it addresses.
    pub fn deref(&self, value: f64, flags: u32, mask: u32) -> Result<f64, Fault> {
        if !is_indirect(flags, mask) {
            return Ok(value);
        }
        let slot = self.locate(value as i64)?;
        Ok(self.slot(slot))
    }
}
