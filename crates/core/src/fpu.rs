//! Floating-point primitives.
//!
//! The machine's float format is modeled as IEEE single precision over the
//! register's raw bit pattern. Each primitive is a pure function from bit
//! patterns to an [`FpOutcome`]: result bits, the condition-code nibble,
//! and a fault flag the execution core turns into an arithmetic exception.
//! Non-finite results count as overflow faults; the destination is left to
//! the caller's exception policy.

use crate::arch::psd::{CC_NEGATIVE, CC_OVERFLOW, CC_POSITIVE, CC_ZERO};

/// Result of one floating-point primitive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FpOutcome {
    /// Result bit pattern (unspecified when `fault` is set).
    pub bits: u32,
    /// Condition-code nibble for the result.
    pub cc: u8,
    /// Overflow, underflow to non-finite, or divide by zero.
    pub fault: bool,
}

fn outcome(value: f32) -> FpOutcome {
    if !value.is_finite() {
        return FpOutcome {
            bits: 0,
            cc: CC_OVERFLOW,
            fault: true,
        };
    }
    let cc = if value == 0.0 {
        CC_ZERO
    } else if value.is_sign_negative() {
        CC_NEGATIVE
    } else {
        CC_POSITIVE
    };
    FpOutcome {
        bits: value.to_bits(),
        cc,
        fault: false,
    }
}

/// Floating add.
pub fn fad(a: u32, b: u32) -> FpOutcome {
    outcome(f32::from_bits(a) + f32::from_bits(b))
}

/// Floating subtract (`a - b`).
pub fn fsu(a: u32, b: u32) -> FpOutcome {
    outcome(f32::from_bits(a) - f32::from_bits(b))
}

/// Floating multiply.
pub fn fmu(a: u32, b: u32) -> FpOutcome {
    outcome(f32::from_bits(a) * f32::from_bits(b))
}

/// Floating divide (`a / b`); divide by zero faults.
pub fn fdv(a: u32, b: u32) -> FpOutcome {
    let d = f32::from_bits(b);
    if d == 0.0 {
        return FpOutcome {
            bits: 0,
            cc: CC_OVERFLOW,
            fault: true,
        };
    }
    outcome(f32::from_bits(a) / d)
}

/// Float to integer, truncating toward zero; out-of-range faults.
pub fn fix(a: u32) -> FpOutcome {
    let v = f32::from_bits(a);
    if !v.is_finite() || v >= 2_147_483_648.0 || v < -2_147_483_648.0 {
        return FpOutcome {
            bits: 0,
            cc: CC_OVERFLOW,
            fault: true,
        };
    }
    #[allow(clippy::cast_possible_truncation)]
    let i = v.trunc() as i32;
    let cc = if i == 0 {
        CC_ZERO
    } else if i < 0 {
        CC_NEGATIVE
    } else {
        CC_POSITIVE
    };
    FpOutcome {
        bits: i as u32,
        cc,
        fault: false,
    }
}

/// Integer to float. Never faults; rounding follows the host conversion.
pub fn flt(a: u32) -> FpOutcome {
    #[allow(clippy::cast_precision_loss)]
    outcome(a as i32 as f32)
}
