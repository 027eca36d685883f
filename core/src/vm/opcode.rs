//! Opcode encoding.
//!
//! An opcode is a `u32` laid out as:
//!
//! ```text
//!  31        21  20  19  18..16  15 ............ 0
//! [ reserved  ][dst][ - ][argc ][      code      ]
//! ```
//!
//! The low 16 bits are the wire identity of the operation. `argc` and the
//! destination attribute ride above it so the dispatcher can check arity and
//! destination presence with bit tests. Identity comparisons always go through
//! [`Opcode::strict`], which drops the attribute bits.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Fault, FaultCode};

const CODE_MASK: u32 = 0xFFFF;
const ARGC_SHIFT: u32 = 16;
const ARGC_MASK: u32 = 0x7 << ARGC_SHIFT;
const DST_BIT: u32 = 1 << 20;

/// Wire codes of the defined operations.
pub mod code {
    pub const ADD: u16 = 0;
    pub const SUB: u16 = 1;
    pub const DIV: u16 = 2;
    pub const IDIV: u16 = 3;
    pub const MUL: u16 = 4;
    pub const POW: u16 = 5;
    pub const MOD: u16 = 6;
    pub const IMOD: u16 = 7;
    pub const NEG: u16 = 8;
    pub const NOT: u16 = 9;
    pub const OR: u16 = 10;
    pub const AND: u16 = 11;
    pub const XOR: u16 = 12;
    pub const ARITH_SHIFT: u16 = 13;
    pub const BIT_SHIFT: u16 = 14;
    pub const FLOOR: u16 = 15;
    pub const CEIL: u16 = 16;
    pub const ROUND: u16 = 17;
    pub const TRUNC: u16 = 18;
    pub const EQ: u16 = 19;
    pub const LE: u16 = 20;
    pub const LT: u16 = 21;
    pub const JUMP: u16 = 22;
    pub const PUSH: u16 = 23;
    pub const POP: u16 = 24;
    pub const LOAD: u16 = 25;
    pub const CALL: u16 = 26;
    pub const RETURN: u16 = 27;
    pub const REALLOC: u16 = 28;
    pub const FREE: u16 = 29;
    pub const MEMMOVE: u16 = 30;
    pub const TRAP: u16 = 31;
    pub const MEMDUP: u16 = 32;
    pub const MEMLEN: u16 = 33;
    pub const PEEK: u16 = 34;
    pub const POKE: u16 = 35;
    pub const DEFER: u16 = 36;
    pub const FORCE: u16 = 37;

    /// Highest defined code.
    pub const LAST: u16 = FORCE;
}

/// Encoded instruction identity plus operand count and attribute bits.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Opcode(u32);

const fn encode(code: u16, argc: u32, dst: bool) -> Opcode {
    let mut raw = code as u32 | ((argc << ARGC_SHIFT) & ARGC_MASK);
    if dst {
        raw |= DST_BIT;
    }
    Opcode(raw)
}

impl Opcode {
    pub const ADD: Opcode = encode(code::ADD, 3, true);
    pub const SUB: Opcode = encode(code::SUB, 3, true);
    pub const DIV: Opcode = encode(code::DIV, 3, true);
    pub const IDIV: Opcode = encode(code::IDIV, 3, true);
    pub const MUL: Opcode = encode(code::MUL, 3, true);
    pub const POW: Opcode = encode(code::POW, 3, true);
    pub const MOD: Opcode = encode(code::MOD, 3, true);
    pub const IMOD: Opcode = encode(code::IMOD, 3, true);
    pub const NEG: Opcode = encode(code::NEG, 2, true);
    pub const NOT: Opcode = encode(code::NOT, 2, true);
    pub const OR: Opcode = encode(code::OR, 3, true);
    pub const AND: Opcode = encode(code::AND, 3, true);
    pub const XOR: Opcode = encode(code::XOR, 3, true);
    pub const ARITH_SHIFT: Opcode = encode(code::ARITH_SHIFT, 3, true);
    pub const BIT_SHIFT: Opcode = encode(code::BIT_SHIFT, 3, true);
    pub const FLOOR: Opcode = encode(code::FLOOR, 2, true);
    pub const CEIL: Opcode = encode(code::CEIL, 2, true);
    pub const ROUND: Opcode = encode(code::ROUND, 2, true);
    pub const TRUNC: Opcode = encode(code::TRUNC, 2, true);
    pub const EQ: Opcode = encode(code::EQ, 3, false);
    pub const LE: Opcode = encode(code::LE, 3, false);
    pub const LT: Opcode = encode(code::LT, 3, false);
    pub const JUMP: Opcode = encode(code::JUMP, 1, false);
    pub const PUSH: Opcode = encode(code::PUSH, 1, false);
    pub const POP: Opcode = encode(code::POP, 1, true);
    pub const LOAD: Opcode = encode(code::LOAD, 2, true);
    pub const CALL: Opcode = encode(code::CALL, 2, false);
    pub const RETURN: Opcode = encode(code::RETURN, 0, true);
    pub const REALLOC: Opcode = encode(code::REALLOC, 2, true);
    pub const FREE: Opcode = encode(code::FREE, 1, false);
    pub const MEMMOVE: Opcode = encode(code::MEMMOVE, 3, false);
    pub const TRAP: Opcode = encode(code::TRAP, 1, false);
    pub const MEMDUP: Opcode = encode(code::MEMDUP, 2, true);
    pub const MEMLEN: Opcode = encode(code::MEMLEN, 2, true);
    pub const PEEK: Opcode = encode(code::PEEK, 2, true);
    pub const POKE: Opcode = encode(code::POKE, 2, false);
    pub const DEFER: Opcode = encode(code::DEFER, 1, false);
    pub const FORCE: Opcode = encode(code::FORCE, 1, false);

    /// Every defined opcode, indexed by its code.
    pub const ALL: [Opcode; code::LAST as usize + 1] = [
        Opcode::ADD,
        Opcode::SUB,
        Opcode::DIV,
        Opcode::IDIV,
        Opcode::MUL,
        Opcode::POW,
        Opcode::MOD,
        Opcode::IMOD,
        Opcode::NEG,
        Opcode::NOT,
        Opcode::OR,
        Opcode::AND,
        Opcode::XOR,
        Opcode::ARITH_SHIFT,
        Opcode::BIT_SHIFT,
        Opcode::FLOOR,
        Opcode::CEIL,
        Opcode::ROUND,
        Opcode::TRUNC,
        Opcode::EQ,
        Opcode::LE,
        Opcode::LT,
        Opcode::JUMP,
        Opcode::PUSH,
        Opcode::POP,
        Opcode::LOAD,
        Opcode::CALL,
        Opcode::RETURN,
        Opcode::REALLOC,
        Opcode::FREE,
        Opcode::MEMMOVE,
        Opcode::TRAP,
        Opcode::MEMDUP,
        Opcode::MEMLEN,
        Opcode::PEEK,
        Opcode::POKE,
        Opcode::DEFER,
        Opcode::FORCE,
    ];

    /// Wrap a raw encoded value without checking it.
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Opcode(raw)
    }

    /// Decode a wire code into its fully attributed opcode.
    #[inline]
    pub fn from_code(code: u16) -> Option<Self> {
        Self::ALL.get(code as usize).copied()
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// The code with every attribute bit cleared.
    #[inline]
    pub const fn strict(self) -> u16 {
        (self.0 & CODE_MASK) as u16
    }

    #[inline]
    pub const fn argc(self) -> usize {
        ((self.0 & ARGC_MASK) >> ARGC_SHIFT) as usize
    }

    /// Whether operand 0 is a write target.
    #[inline]
    pub const fn has_destination(self) -> bool {
        self.0 & DST_BIT != 0
    }

    #[inline]
    pub const fn valid(self) -> bool {
        self.strict() <= code::LAST
    }

    /// Whether the argc and destination bits match the defined encoding of
    /// this code. Always false for an invalid code.
    #[inline]
    pub fn is_canonical(self) -> bool {
        Self::from_code(self.strict()) == Some(self)
    }

    pub fn name(self) -> Option<&'static str> {
        NAMES.get(self.strict() as usize).copied()
    }
}

static NAMES: [&str; code::LAST as usize + 1] = [
    "Add",
    "Sub",
    "Div",
    "IDiv",
    "Mul",
    "Pow",
    "Mod",
    "IMod",
    "Neg",
    "Not",
    "Or",
    "And",
    "Xor",
    "ArithShift",
    "BitShift",
    "Floor",
    "Ceil",
    "Round",
    "Trunc",
    "Eq",
    "LE",
    "LT",
    "Jump",
    "Push",
    "Pop",
    "Load",
    "Call",
    "Return",
    "Realloc",
    "Free",
    "Memmove",
    "Trap",
    "Memdup",
    "Memlen",
    "Peek",
    "Poke",
    "Defer",
    "Force",
];

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "<UNKNOWN 0x{:x}>", self.0),
        }
    }
}

impl fmt::Debug for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Opcode({self}, argc={}", self.argc())?;
        if self.has_destination() {
            f.write_str(", dst")?;
        }
        f.write_str(")")
    }
}

impl FromStr for Opcode {
    type Err = Fault;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        NAMES
            .iter()
            .position(|name| name.eq_ignore_ascii_case(needle))
            .and_then(|idx| Opcode::from_code(idx as u16))
            .ok_or_else(|| Fault::new(FaultCode::BadOpcode, format!("Unrecognized opcode mnemonic: {needle:?}")))
    }
}

impl TryFrom<String> for Opcode {
    type Error = Fault;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Opcode> for String {
    fn from(op: Opcode) -> Self {
        op.to_string()
    }
}
