//! Numeric kernels for the arithmetic, bitwise and unary opcodes.

use crate::error::{Fault, FaultCode};

use super::opcode::code;

const LOW_32: u64 = 0xFFFF_FFFF;

/// Round half away from zero. NaN and the infinities pass through.
#[inline]
pub fn round(f: f64) -> f64 {
    if f.is_nan() || f.is_infinite() {
        return f;
    }
    let neg = f.is_sign_negative();
    let mag = f.abs();
    let mut r = mag.floor();
    if mag - r >= 0.5 {
        r += 1.0;
    }
    if neg { -r } else { r }
}

/// Truncate toward zero through a 64-bit integer.
#[inline]
pub fn trunc(f: f64) -> f64 {
    f as i64 as f64
}

#[inline]
fn to_u32(f: f64) -> u32 {
    f as i64 as u32
}

#[inline]
fn to_i32(f: f64) -> i32 {
    f as i64 as i32
}

/// Positive `shift` moves left, negative moves right.
pub fn arith_shift(value: i32, shift: i64) -> i32 {
    if shift > 0 {
        u32::try_from(shift).ok().and_then(|s| value.checked_shl(s)).unwrap_or(0)
    } else if shift < 0 {
        value >> shift.unsigned_abs().min(31) as u32
    } else {
        value
    }
}

/// Positive `shift` moves left, negative moves right (zero fill).
pub fn bit_shift(value: u32, shift: i64) -> u32 {
    let amount = u32::try_from(shift.unsigned_abs()).ok();
    if shift > 0 {
        amount.and_then(|s| value.checked_shl(s)).unwrap_or(0)
    } else if shift < 0 {
        amount.and_then(|s| value.checked_shr(s)).unwrap_or(0)
    } else {
        value
    }
}

fn integer_operands(lhs: f64, rhs: f64, what: &str) -> Result<(i64, i64), Fault> {
    let (a, b) = (lhs as i64, rhs as i64);
    if b == 0 {
        return Err(Fault::new(FaultCode::BadArgument, format!("Integer {what} by zero ({lhs} / {rhs}).")));
    }
    Ok((a, b))
}

/// Evaluate a two-operand kernel. `op` must be one of the binary codes.
pub(crate) fn binary(op: u16, lhs: f64, rhs: f64) -> Result<f64, Fault> {
    let value = match op {
        code::ADD => lhs + rhs,
        code::SUB => lhs - rhs,
        code::DIV => lhs / rhs,
        code::MUL => lhs * rhs,
        code::POW => lhs.powf(rhs),
        code::MOD => lhs % rhs,
        code::IDIV => {
            let (a, b) = integer_operands(lhs, rhs, "division")?;
            a.wrapping_div(b) as f64
        }
        code::IMOD => {
            let (a, b) = integer_operands(lhs, rhs, "remainder")?;
            a.wrapping_rem(b) as f64
        }
        code::OR => (to_u32(lhs) | to_u32(rhs)) as f64,
        code::AND => (to_u32(lhs) & to_u32(rhs)) as f64,
        code::XOR => (to_u32(lhs) ^ to_u32(rhs)) as f64,
        code::ARITH_SHIFT => arith_shift(to_i32(lhs), rhs as i64) as f64,
        code::BIT_SHIFT => bit_shift(to_u32(lhs), rhs as i64) as f64,
        _ => {
            return Err(Fault::new(FaultCode::BadOpcode, format!("Opcode code {op} is not a binary kernel.")));
        }
    };
    Ok(value)
}

/// Evaluate a one-operand kernel. `op` must be one of the unary codes.
pub(crate) fn unary(op: u16, v: f64) -> Result<f64, Fault> {
    let value = match op {
        code::NEG => -v,
        code::NOT => (!(v as i64 as u64) & LOW_32) as f64,
        code::FLOOR => v.floor(),
        code::CEIL => v.ceil(),
        code::ROUND => round(v),
        code::TRUNC => trunc(v),
        _ => {
            return Err(Fault::new(FaultCode::BadOpcode, format!("Opcode code {op} is not a unary kernel.")));
        }
    };
    Ok(value)
}
