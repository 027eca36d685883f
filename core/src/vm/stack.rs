use tracing::trace;

use crate::error::{Fault, FaultCode};

use super::thread::{REG_STACK_TIP, Thread};

impl Thread {
    /// Push `value` at the stack tip, growing the buffer when it is full. Only a
    /// tip sitting exactly at the end of the buffer grows it.
    pub fn push(&mut self, value: f64) -> Result<(), Fault> {
        let tip = self.stack_tip();
        if tip < 0 {
            return Err(Fault::new(
                FaultCode::BadAccess,
                format!("Stack tip register holds negative position {tip}."),
            ));
        }
        let tip = tip as usize;
        if let Some(limit) = self.stack_limit {
            let depth = (tip as i64).saturating_sub(self.stack_base().max(0));
            if depth >= limit as i64 {
                return Err(Fault::overflow(limit));
            }
        }
        if tip > self.stack.len() {
            return Err(Fault::new(
                FaultCode::BadAccess,
                format!(
                    "Stack tip {tip} lies past the end of the stack buffer ({} slots).",
                    self.stack.len()
                ),
            ));
        }
        if tip == self.stack.len() {
            // Let Vec choose the growth, then expose the whole capacity so the
            // following pushes land without reallocating.
            self.stack.reserve(1);
            let capacity = self.stack.capacity();
            self.stack.resize(capacity, 0.0);
            trace!(target: "zorya::vm::stack", capacity, "stack buffer grown");
        }
        self.stack[tip] = value;
        self.reg[REG_STACK_TIP] = (tip + 1) as f64;
        Ok(())
    }

    /// Remove and return the top of the stack.
    pub fn pop(&mut self) -> Result<f64, Fault> {
        let (top, value) = self.top()?;
        self.reg[REG_STACK_TIP] = top as f64;
        Ok(value)
    }

    /// Return the top of the stack without removing it.
    pub fn peek(&self) -> Result<f64, Fault> {
        self.top().map(|(_, value)| value)
    }

    fn top(&self) -> Result<(usize, f64), Fault> {
        let top = self.stack_tip() - 1;
        if top < self.stack_base() {
            return Err(Fault::underflow());
        }
        let value = usize::try_from(top).ok().and_then(|i| self.stack.get(i).map(|v| (i, *v)));
        value.ok_or_else(|| {
            Fault::new(
                FaultCode::BadAccess,
                format!("Stack tip {} lies outside the stack buffer ({} slots).", top + 1, self.stack.len()),
            )
        })
    }
}
