//! # Fixed-point math
//!
//! Every monetary calculation in the protocol goes through [`mul_div`]:
//! `x * y / denominator` with a 256-bit intermediate, so the product of an
//! 18-decimal amount and an 18-decimal weight cannot overflow before the
//! division. Results that do not fit an `i128` fail with `Error::Overflow`;
//! nothing is ever silently truncated.
//!
//! The wide path uses the host's `U256` object and is only taken when the
//! product overflows `i128`.

use soroban_sdk::{Env, U256};

use crate::constants::WAD;
use crate::Error;

/// Direction to round an inexact quotient.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Rounding {
    Down,
    Up,
}

/// `x * y / denominator`, rounded as requested.
///
/// Operands must be non-negative and the denominator positive.
pub fn mul_div(
    env: &Env,
    x: i128,
    y: i128,
    denominator: i128,
    rounding: Rounding,
) -> Result<i128, Error> {
    if x < 0 || y < 0 || denominator <= 0 {
        return Err(Error::InvalidAmount);
    }
    if x == 0 || y == 0 {
        return Ok(0);
    }

    if let Some(product) = x.checked_mul(y) {
        let quotient = product / denominator;
        let inexact = product % denominator != 0;
        return round(quotient, inexact, rounding);
    }

    let product = U256::from_u128(env, x as u128).mul(&U256::from_u128(env, y as u128));
    let denominator = U256::from_u128(env, denominator as u128);
    let quotient = product.div(&denominator);
    let inexact = product.rem_euclid(&denominator) != U256::from_u32(env, 0);

    let quotient = quotient.to_u128().ok_or(Error::Overflow)?;
    let quotient = i128::try_from(quotient).map_err(|_| Error::Overflow)?;
    round(quotient, inexact, rounding)
}

#[inline]
pub fn mul_div_down(env: &Env, x: i128, y: i128, denominator: i128) -> Result<i128, Error> {
    mul_div(env, x, y, denominator, Rounding::Down)
}

#[inline]
pub fn mul_div_up(env: &Env, x: i128, y: i128, denominator: i128) -> Result<i128, Error> {
    mul_div(env, x, y, denominator, Rounding::Up)
}

/// `x * y / 10^18`, rounded down.
#[inline]
pub fn fixed_mul(env: &Env, x: i128, y: i128) -> Result<i128, Error> {
    mul_div_down(env, x, y, WAD)
}

/// `10^decimals`.
pub fn pow10(decimals: u32) -> Result<i128, Error> {
    10i128.checked_pow(decimals).ok_or(Error::Overflow)
}

fn round(quotient: i128, inexact: bool, rounding: Rounding) -> Result<i128, Error> {
    match rounding {
        Rounding::Up if inexact => quotient.checked_add(1).ok_or(Error::Overflow),
        _ => Ok(quotient),
    }
}
