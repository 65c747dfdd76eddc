//! CPU condition codes
//!
//! Four booleans derived from the most recent flag-updating operation.
//! Logical, shift, compare-test and data-movement results touch Z and N only;
//! additive arithmetic updates all four.

use crate::Word;
use serde::{Deserialize, Serialize};

const SIGN_BIT: Word = 0x8000_0000;

/// Z/N/C/V condition codes.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flags {
    /// Result was zero
    pub zero: bool,
    /// Result was negative as a signed 32-bit value
    pub negative: bool,
    /// Unsigned carry out (ADD) or borrow (SUB/CMP)
    pub carry: bool,
    /// Signed overflow
    pub overflow: bool,
}

impl Flags {
    /// Reset all four flags.
    pub fn clear(&mut self) {
        *self = Flags::default();
    }

    /// Update Z and N from a result; C and V are left untouched.
    pub fn update(&mut self, result: Word) {
        self.zero = result == 0;
        self.negative = (result as i32) < 0;
    }

    /// Full flag update for `result = a + b`.
    ///
    /// C is set when the unsigned 32-bit sum overflowed; V when the signed
    /// interpretation overflowed.
    pub fn update_add(&mut self, a: Word, b: Word, result: Word) {
        self.update(result);
        self.carry = (a as u64) + (b as u64) > u32::MAX as u64;
        self.overflow = (a ^ result) & (b ^ result) & SIGN_BIT != 0;
    }

    /// Full flag update for `result = a - b`.
    ///
    /// C is set when a borrow occurred, i.e. `a < b` unsigned.
    pub fn update_sub(&mut self, a: Word, b: Word, result: Word) {
        self.update(result);
        self.carry = a < b;
        self.overflow = (a ^ b) & (a ^ result) & SIGN_BIT != 0;
    }

    /// Set C to the last bit shifted out of a shift operation.
    pub fn set_shift_carry(&mut self, bit: bool) {
        self.carry = bit;
    }
}
