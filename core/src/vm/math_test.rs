use super::math::*;

#[test]
fn test_round_normal() {
    let before = [-2.7, -2.5, -2.3, -1.0, 0.0, 0.1, 0.5, 0.8, 1.0, 1.5, 1.7, 2.0];
    let after = [-3.0, -3.0, -2.0, -1.0, 0.0, 0.0, 1.0, 1.0, 1.0, 2.0, 2.0, 2.0];
    for (x, want) in before.iter().zip(after) {
        assert_eq!(round(*x), want, "round({x})");
    }
}

#[test]
fn test_round_special() {
    assert!(round(f64::NAN).is_nan());
    assert_eq!(round(f64::INFINITY), f64::INFINITY);
    assert_eq!(round(f64::NEG_INFINITY), f64::NEG_INFINITY);
}

#[test]
fn test_trunc_saturates() {
    assert_eq!(trunc(-0.9), 0.0);
    assert_eq!(trunc(1e300), i64::MAX as f64);
    assert_eq!(trunc(f64::NAN), 0.0);
}

#[test]
fn test_shift_helpers() {
    assert_eq!(arith_shift(-8, -1), -4);
    assert_eq!(arith_shift(-8, i64::MIN), -1);
    assert_eq!(arith_shift(1, i64::MAX), 0);
    assert_eq!(bit_shift(0xFFFF_FFFF, -4), 0x0FFF_FFFF);
    assert_eq!(bit_shift(1, i64::MIN), 0);
    assert_eq!(bit_shift(0x8000_0000, 1), 0);
}
