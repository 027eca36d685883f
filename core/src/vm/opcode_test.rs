use super::*;

#[test]
fn test_defined_encodings() {
    let table = [
        (Opcode::ADD, 3, true),
        (Opcode::IMOD, 3, true),
        (Opcode::ARITH_SHIFT, 3, true),
        (Opcode::XOR, 3, true),
        (Opcode::NOT, 2, true),
        (Opcode::TRUNC, 2, true),
        (Opcode::EQ, 3, false),
        (Opcode::LT, 3, false),
        (Opcode::JUMP, 1, false),
        (Opcode::PUSH, 1, false),
        (Opcode::POP, 1, true),
        (Opcode::LOAD, 2, true),
        (Opcode::CALL, 2, false),
        (Opcode::RETURN, 0, true),
        (Opcode::MEMMOVE, 3, false),
        (Opcode::PEEK, 2, true),
    ];
    for (op, argc, dst) in table {
        assert!(op.valid(), "{op:?}");
        assert_eq!(op.argc(), argc, "{op:?}");
        assert_eq!(op.has_destination(), dst, "{op:?}");
    }
}

#[test]
fn test_strict_drops_attribute_bits() {
    assert_eq!(Opcode::ADD.strict(), code::ADD);
    assert_eq!(Opcode::LOAD.strict(), code::LOAD);
    assert_ne!(Opcode::LOAD.raw(), code::LOAD as u32);
    assert_eq!(Opcode::from_raw(code::LOAD as u32).strict(), Opcode::LOAD.strict());
}

#[test]
fn test_valid_range() {
    assert!(Opcode::from_raw(0).valid());
    assert!(Opcode::FORCE.valid());
    assert!(!Opcode::from_raw(code::LAST as u32 + 1).valid());
    // Attribute bits never make an unknown code valid.
    assert!(!Opcode::from_raw(0x0013_FFFF).valid());
}

#[test]
fn test_canonical_encoding() {
    assert!(Opcode::ALL.iter().all(|op| op.is_canonical()));
    // Valid code, wrong attributes.
    assert!(!Opcode::from_raw(code::ADD as u32).is_canonical());
    assert!(!Opcode::from_raw(Opcode::JUMP.raw() | (1 << 20)).is_canonical());
    assert!(!Opcode::from_raw(code::LAST as u32 + 1).is_canonical());
}

#[test]
fn test_from_code_matches_table() {
    assert_eq!(Opcode::ALL.len(), 38);
    for (i, op) in Opcode::ALL.iter().enumerate() {
        assert_eq!(op.strict() as usize, i);
        assert_eq!(Opcode::from_code(i as u16), Some(*op));
    }
    assert_eq!(Opcode::from_code(code::LAST + 1), None);
}

#[test]
fn test_names() {
    assert_eq!(Opcode::ARITH_SHIFT.to_string(), "ArithShift");
    assert_eq!(Opcode::from_raw(0xBEEF).to_string(), "<UNKNOWN 0xbeef>");
    assert_eq!(format!("{:?}", Opcode::POP), "Opcode(Pop, argc=1, dst)");
    assert_eq!("imod".parse::<Opcode>().unwrap(), Opcode::IMOD);
    assert_eq!(" LE ".parse::<Opcode>().unwrap(), Opcode::LE);
    assert!("Halt".parse::<Opcode>().is_err());
}

#[test]
fn test_serde_uses_mnemonics() {
    assert_eq!(serde_json::to_string(&Opcode::BIT_SHIFT).unwrap(), "\"BitShift\"");
    let op: Opcode = serde_json::from_str("\"memlen\"").unwrap();
    assert_eq!(op, Opcode::MEMLEN);
    assert!(serde_json::from_str::<Opcode>("\"Nope\"").is_err());
}
