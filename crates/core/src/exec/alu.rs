//! Integer arithmetic with explicit condition-code derivation.
//!
//! Every helper returns the raw result plus whatever the condition codes
//! need, computed from operand and result sign bits rather than inferred
//! after masking. The execution core decides whether an overflow becomes
//! an arithmetic-exception trap or just CC1.

use crate::arch::psd::{CC_NEGATIVE, CC_OVERFLOW, CC_POSITIVE, CC_ZERO};

/// Condition-code nibble for a signed 32-bit result, no overflow.
#[inline]
pub const fn cc_for(val: u32) -> u8 {
    if val == 0 {
        CC_ZERO
    } else if val & 0x8000_0000 != 0 {
        CC_NEGATIVE
    } else {
        CC_POSITIVE
    }
}

/// Condition-code nibble for a signed 64-bit result.
#[inline]
pub const fn cc_for64(val: u64) -> u8 {
    if val == 0 {
        CC_ZERO
    } else if val & 0x8000_0000_0000_0000 != 0 {
        CC_NEGATIVE
    } else {
        CC_POSITIVE
    }
}

/// Adds `cc_for` and the overflow bit.
#[inline]
pub const fn cc_with_overflow(val: u32, overflow: bool) -> u8 {
    if overflow {
        cc_for(val) | CC_OVERFLOW
    } else {
        cc_for(val)
    }
}

/// Condition codes for a signed comparison of `a` against `b`.
#[inline]
pub fn cc_compare(a: u32, b: u32) -> u8 {
    match (a as i32).cmp(&(b as i32)) {
        std::cmp::Ordering::Greater => CC_POSITIVE,
        std::cmp::Ordering::Less => CC_NEGATIVE,
        std::cmp::Ordering::Equal => CC_ZERO,
    }
}

/// Wrapping 32-bit add with signed-overflow detection.
///
/// Overflow iff the operands agree in sign and the result does not.
#[inline]
pub const fn add32(a: u32, b: u32) -> (u32, bool) {
    let r = a.wrapping_add(b);
    let overflow = (a ^ b) & 0x8000_0000 == 0 && (a ^ r) & 0x8000_0000 != 0;
    (r, overflow)
}

/// Wrapping 32-bit subtract (`a - b`) with signed-overflow detection.
#[inline]
pub const fn sub32(a: u32, b: u32) -> (u32, bool) {
    let r = a.wrapping_sub(b);
    let overflow = (a ^ b) & 0x8000_0000 != 0 && (a ^ r) & 0x8000_0000 != 0;
    (r, overflow)
}

/// Signed 32x32 -> 64 multiply into an even/odd pair image.
#[inline]
pub const fn mul32(a: u32, b: u32) -> u64 {
    ((a as i32 as i64).wrapping_mul(b as i32 as i64)) as u64
}

/// Divides a signed 64-bit pair by a signed 32-bit divisor.
///
/// Returns `(quotient, remainder)`, or `None` on divide by zero or a
/// quotient that does not fit in 32 bits. Destination registers are the
/// caller's to leave untouched in that case.
#[inline]
pub fn div64(dividend: u64, divisor: u32) -> Option<(u32, u32)> {
    let divisor = divisor as i32;
    if divisor == 0 {
        return None;
    }
    let dividend = dividend as i64;
    let quotient = dividend.wrapping_div(i64::from(divisor));
    if quotient > i64::from(i32::MAX) || quotient < i64::from(i32::MIN) {
        return None;
    }
    let remainder = dividend.wrapping_rem(i64::from(divisor));
    #[allow(clippy::cast_possible_truncation)]
    Some((quotient as u32, remainder as u32))
}

/// Arithmetic left shift; overflow when any bit unlike the sign was
/// shifted out, that is when the result does not shift back to the
/// operand.
#[inline]
pub const fn shift_left_arith(a: u32, count: u32) -> (u32, bool) {
    let count = count & 31;
    let r = ((a as i32) << count) as u32;
    let overflow = ((r as i32) >> count) as u32 != a;
    (r, overflow)
}

/// Arithmetic right shift (sign propagating).
#[inline]
pub const fn shift_right_arith(a: u32, count: u32) -> u32 {
    (a as i32 >> (count & 31)) as u32
}

/// Logical left shift.
#[inline]
pub const fn shift_left_logical(a: u32, count: u32) -> u32 {
    a << (count & 31)
}

/// Logical right shift.
#[inline]
pub const fn shift_right_logical(a: u32, count: u32) -> u32 {
    a >> (count & 31)
}

/// Doubleword arithmetic left shift with overflow detection.
#[inline]
pub const fn shift_left_arith64(a: u64, count: u32) -> (u64, bool) {
    let count = count & 63;
    let r = ((a as i64) << count) as u64;
    let overflow = ((r as i64) >> count) as u64 != a;
    (r, overflow)
}

/// Doubleword arithmetic right shift.
#[inline]
pub const fn shift_right_arith64(a: u64, count: u32) -> u64 {
    (a as i64 >> (count & 63)) as u64
}

/// Doubleword logical left shift.
#[inline]
pub const fn shift_left_logical64(a: u64, count: u32) -> u64 {
    a << (count & 63)
}

/// Doubleword logical right shift.
#[inline]
pub const fn shift_right_logical64(a: u64, count: u32) -> u64 {
    a >> (count & 63)
}
