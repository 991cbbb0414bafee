//! Project token ledger.
//!
//! Each holder has an unclaimed **credit** balance (internal to this
//! contract) and a **claimed** balance. Both count towards total supply.
//! Burns consume credits before claimed tokens.

use soroban_sdk::{Address, Env};

use crate::storage;
use crate::Error;

pub fn total_supply_of(env: &Env, project_id: u64) -> Result<i128, Error> {
    storage::get_credit_supply(env, project_id)
        .checked_add(storage::get_claimed_supply(env, project_id))
        .ok_or(Error::Overflow)
}

pub fn balance_of(env: &Env, project_id: u64, holder: &Address) -> Result<i128, Error> {
    storage::get_credits(env, project_id, holder)
        .checked_add(storage::get_claimed(env, project_id, holder))
        .ok_or(Error::Overflow)
}

pub fn credit_balance_of(env: &Env, project_id: u64, holder: &Address) -> i128 {
    storage::get_credits(env, project_id, holder)
}

pub fn mint(
    env: &Env,
    project_id: u64,
    holder: &Address,
    amount: i128,
    prefer_claimed: bool,
) -> Result<(), Error> {
    if amount < 0 {
        return Err(Error::InvalidAmount);
    }
    if amount == 0 {
        return Ok(());
    }

    if prefer_claimed {
        let balance = storage::get_claimed(env, project_id, holder)
            .checked_add(amount)
            .ok_or(Error::Overflow)?;
        let supply = storage::get_claimed_supply(env, project_id)
            .checked_add(amount)
            .ok_or(Error::Overflow)?;
        storage::set_claimed(env, project_id, holder, balance);
        storage::set_claimed_supply(env, project_id, supply);
    } else {
        let balance = storage::get_credits(env, project_id, holder)
            .checked_add(amount)
            .ok_or(Error::Overflow)?;
        let supply = storage::get_credit_supply(env, project_id)
            .checked_add(amount)
            .ok_or(Error::Overflow)?;
        storage::set_credits(env, project_id, holder, balance);
        storage::set_credit_supply(env, project_id, supply);
    }
    Ok(())
}

pub fn burn(env: &Env, project_id: u64, holder: &Address, amount: i128) -> Result<(), Error> {
    if amount < 0 {
        return Err(Error::InvalidAmount);
    }
    let credits = storage::get_credits(env, project_id, holder);
    let claimed = storage::get_claimed(env, project_id, holder);
    if amount > credits.checked_add(claimed).ok_or(Error::Overflow)? {
        return Err(Error::InsufficientBalance);
    }

    let from_credits = amount.min(credits);
    let from_claimed = amount - from_credits;

    if from_credits > 0 {
        storage::set_credits(env, project_id, holder, credits - from_credits);
        let supply = storage::get_credit_supply(env, project_id);
        storage::set_credit_supply(env, project_id, supply - from_credits);
    }
    if from_claimed > 0 {
        storage::set_claimed(env, project_id, holder, claimed - from_claimed);
        let supply = storage::get_claimed_supply(env, project_id);
        storage::set_claimed_supply(env, project_id, supply - from_claimed);
    }
    Ok(())
}

/// Move unclaimed credits between holders. Supply is unchanged.
pub fn transfer_credits(
    env: &Env,
    project_id: u64,
    from: &Address,
    to: &Address,
    amount: i128,
) -> Result<(), Error> {
    if amount <= 0 {
        return Err(Error::InvalidAmount);
    }
    let from_credits = storage::get_credits(env, project_id, from);
    if amount > from_credits {
        return Err(Error::InsufficientBalance);
    }
    storage::set_credits(env, project_id, from, from_credits - amount);
    let to_credits = storage::get_credits(env, project_id, to)
        .checked_add(amount)
        .ok_or(Error::Overflow)?;
    storage::set_credits(env, project_id, to, to_credits);
    Ok(())
}

/// Convert `amount` of the holder's credits into claimed tokens.
pub fn claim(env: &Env, project_id: u64, holder: &Address, amount: i128) -> Result<(), Error> {
    if amount <= 0 {
        return Err(Error::InvalidAmount);
    }
    let credits = storage::get_credits(env, project_id, holder);
    if amount > credits {
        return Err(Error::InsufficientBalance);
    }
    let claimed = storage::get_claimed(env, project_id, holder)
        .checked_add(amount)
        .ok_or(Error::Overflow)?;
    let claimed_supply = storage::get_claimed_supply(env, project_id)
        .checked_add(amount)
        .ok_or(Error::Overflow)?;

    storage::set_credits(env, project_id, holder, credits - amount);
    storage::set_credit_supply(
        env,
        project_id,
        storage::get_credit_supply(env, project_id) - amount,
    );
    storage::set_claimed(env, project_id, holder, claimed);
    storage::set_claimed_supply(env, project_id, claimed_supply);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use soroban_sdk::testutils::Address as _;

    use crate::RulesetTreasury;

    fn within_contract<T>(f: impl FnOnce(&Env, &Address) -> T) -> T {
        let env = Env::default();
        let id = env.register(RulesetTreasury, ());
        let holder = Address::generate(&env);
        env.as_contract(&id, || f(&env, &holder))
    }

    #[test]
    fn burn_takes_credits_before_claimed() {
        within_contract(|env, holder| {
            mint(env, 1, holder, 30, false).unwrap();
            mint(env, 1, holder, 70, true).unwrap();
            burn(env, 1, holder, 50).unwrap();
            assert_eq!(credit_balance_of(env, 1, holder), 0);
            assert_eq!(balance_of(env, 1, holder).unwrap(), 50);
            assert_eq!(total_supply_of(env, 1).unwrap(), 50);
            assert_eq!(burn(env, 1, holder, 51), Err(Error::InsufficientBalance));
        });
    }

    #[test]
    fn sums_past_i128_fail_instead_of_wrapping() {
        within_contract(|env, holder| {
            mint(env, 1, holder, i128::MAX, true).unwrap();
            mint(env, 1, holder, 1, false).unwrap();

            assert_eq!(total_supply_of(env, 1), Err(Error::Overflow));
            assert_eq!(balance_of(env, 1, holder), Err(Error::Overflow));
            assert_eq!(burn(env, 1, holder, 1), Err(Error::Overflow));
            assert_eq!(claim(env, 1, holder, 1), Err(Error::Overflow));
            assert_eq!(credit_balance_of(env, 1, holder), 1);
        });
    }
}
