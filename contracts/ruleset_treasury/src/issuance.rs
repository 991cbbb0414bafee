//! # Issuance
//!
//! Token issuance and the processed-token tracker that makes reserved-token
//! distribution exact and idempotent.
//!
//! The tracker is a signed counter per project:
//!
//! | Event                                   | Tracker change      |
//! |-----------------------------------------|---------------------|
//! | mint at reserved rate `0`               | `+ beneficiary`     |
//! | mint at reserved rate `MAX`             | `- count`           |
//! | mint at any other rate                  | unchanged           |
//! | burn                                    | `- amount`          |
//! | reserved distribution                   | `= supply + owed`   |
//!
//! From it the tokens still owed to reserved splits are
//!
//! ```text
//! unprocessed = supply - tracker
//! owed        = unprocessed * MAX / (MAX - rate) - unprocessed   (rate < MAX)
//! owed        = unprocessed                                      (rate == MAX)
//! ```

use soroban_sdk::{Address, Env};

use crate::constants::MAX_RESERVED_RATE;
use crate::math::{fixed_mul, mul_div_down};
use crate::storage;
use crate::tokens;
use crate::Error;

/// Tokens `amount_paid_in` buys at `weight`, before the reserved cut.
pub fn issuance_for(env: &Env, amount_paid_in: i128, weight: i128) -> Result<i128, Error> {
    fixed_mul(env, amount_paid_in, weight)
}

/// Part of `token_count` that goes to the beneficiary.
pub fn beneficiary_share(env: &Env, token_count: i128, reserved_rate: u32) -> Result<i128, Error> {
    if reserved_rate >= MAX_RESERVED_RATE {
        return Ok(0);
    }
    mul_div_down(
        env,
        token_count,
        (MAX_RESERVED_RATE - reserved_rate) as i128,
        MAX_RESERVED_RATE as i128,
    )
}

/// Mint the beneficiary's share of `token_count` and leave the reserved
/// share pending. Returns the beneficiary's count.
pub fn mint_for(
    env: &Env,
    project_id: u64,
    token_count: i128,
    beneficiary: &Address,
    reserved_rate: u32,
    prefer_claimed: bool,
) -> Result<i128, Error> {
    if token_count < 0 {
        return Err(Error::InvalidAmount);
    }
    if token_count == 0 {
        return Ok(0);
    }

    let tracker = storage::get_tracker(env, project_id);

    if reserved_rate == MAX_RESERVED_RATE {
        let tracker = tracker.checked_sub(token_count).ok_or(Error::Overflow)?;
        storage::set_tracker(env, project_id, tracker);
        return Ok(0);
    }

    let beneficiary_count = beneficiary_share(env, token_count, reserved_rate)?;
    if reserved_rate == 0 {
        let tracker = tracker
            .checked_add(beneficiary_count)
            .ok_or(Error::Overflow)?;
        storage::set_tracker(env, project_id, tracker);
    }
    tokens::mint(env, project_id, beneficiary, beneficiary_count, prefer_claimed)?;
    Ok(beneficiary_count)
}

/// Burn `amount` of the holder's tokens, keeping the tracker aligned.
pub fn burn_from(env: &Env, project_id: u64, holder: &Address, amount: i128) -> Result<(), Error> {
    if amount <= 0 {
        return Err(Error::InvalidAmount);
    }
    tokens::burn(env, project_id, holder, amount)?;
    let tracker = storage::get_tracker(env, project_id)
        .checked_sub(amount)
        .ok_or(Error::Overflow)?;
    storage::set_tracker(env, project_id, tracker);
    Ok(())
}

/// Reserved tokens owed given a tracker, reserved rate and total supply.
pub fn reserved_amount_owed(
    env: &Env,
    tracker: i128,
    reserved_rate: u32,
    total_supply: i128,
) -> Result<i128, Error> {
    let unprocessed = total_supply.checked_sub(tracker).ok_or(Error::Overflow)?;
    if unprocessed <= 0 || reserved_rate == 0 {
        return Ok(0);
    }
    if reserved_rate >= MAX_RESERVED_RATE {
        return Ok(unprocessed);
    }
    let gross = mul_div_down(
        env,
        unprocessed,
        MAX_RESERVED_RATE as i128,
        (MAX_RESERVED_RATE - reserved_rate) as i128,
    )?;
    Ok(gross - unprocessed)
}

pub fn pending_reserved_of(env: &Env, project_id: u64, reserved_rate: u32) -> Result<i128, Error> {
    reserved_amount_owed(
        env,
        storage::get_tracker(env, project_id),
        reserved_rate,
        tokens::total_supply_of(env, project_id)?,
    )
}

/// Supply including reserved tokens that are owed but not yet minted.
pub fn total_outstanding_of(env: &Env, project_id: u64, reserved_rate: u32) -> Result<i128, Error> {
    let pending = pending_reserved_of(env, project_id, reserved_rate)?;
    tokens::total_supply_of(env, project_id)?
        .checked_add(pending)
        .ok_or(Error::Overflow)
}

/// Mark every owed reserved token as processed and return how many there are.
/// The caller mints them afterwards.
pub fn settle_reserved(env: &Env, project_id: u64, reserved_rate: u32) -> Result<i128, Error> {
    let supply = tokens::total_supply_of(env, project_id)?;
    let tracker = storage::get_tracker(env, project_id);
    let owed = reserved_amount_owed(env, tracker, reserved_rate, supply)?;
    storage::set_tracker(
        env,
        project_id,
        supply.checked_add(owed).ok_or(Error::Overflow)?,
    );
    Ok(owed)
}

/// Align the tracker with supply so nothing is pending. Used when a
/// controller hands a project over.
pub fn reset_tracker(env: &Env, project_id: u64) -> Result<(), Error> {
    storage::set_tracker(env, project_id, tokens::total_supply_of(env, project_id)?);
    Ok(())
}
