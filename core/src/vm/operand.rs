//! Operand positions and indirection flags.
//!
//! Bit `i` of a flag mask (counting operands from 1) marks operand `i` as an
//! address to resolve through [`crate::vm::Thread::storage`]; a clear bit
//! means the operand is a literal.

pub const MAX_OPERANDS: usize = 6;

pub const MASK_1: u32 = 0x1;
pub const MASK_2: u32 = 0x1 << 1;
pub const MASK_3: u32 = 0x1 << 2;
pub const MASK_4: u32 = 0x1 << 3;
pub const MASK_5: u32 = 0x1 << 4;
pub const MASK_6: u32 = 0x1 << 5;

/// Every operand is an address.
pub const ALL_INDIRECT: u32 = MASK_1 | MASK_2 | MASK_3 | MASK_4 | MASK_5 | MASK_6;

pub const ARG_1: usize = 0;
pub const ARG_2: usize = 1;
pub const ARG_3: usize = 2;

pub(crate) const ARG_DST: usize = ARG_1;
pub(crate) const ARG_SRC: usize = ARG_2;
pub(crate) const MASK_SRC: u32 = MASK_2;
pub(crate) const ARG_LHS: usize = ARG_2;
pub(crate) const MASK_LHS: u32 = MASK_2;
pub(crate) const ARG_RHS: usize = ARG_3;
pub(crate) const MASK_RHS: u32 = MASK_3;

/// Mask bit for the zero-based operand `index`.
#[inline]
pub const fn mask_for(index: usize) -> u32 {
    if index < MAX_OPERANDS { 1 << index } else { 0 }
}

/// Build a flag mask from zero-based operand indices.
pub fn indirect(indices: &[usize]) -> u32 {
    indices.iter().fold(0, |flags, &i| flags | mask_for(i))
}

#[inline]
pub const fn is_indirect(flags: u32, mask: u32) -> bool {
    mask != 0 && flags & mask == mask
}
