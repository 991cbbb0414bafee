//! # Splits
//!
//! Split groups are stored per `(project, domain, group)` where the domain is
//! the id of the ruleset they were queued with. A lookup for a ruleset with
//! no splits of its own falls back to the default domain `0`.
//!
//! Replacing a group is all-or-nothing:
//!
//! * every percent is non-zero and the sum stays within `SPLITS_TOTAL_PERCENT`;
//! * every stored split still locked at `now` reappears in the new group with
//!   the same destination and percent and a lock at least as long.
//!
//! Allocation takes floor shares of the original total in stored order; what
//! rounding leaves behind (and any unallocated percent) is the leftover.

use soroban_sdk::{Address, Env, Vec};

use crate::constants::{DEFAULT_SPLIT_DOMAIN, SPLITS_TOTAL_PERCENT};
use crate::math::mul_div_down;
use crate::storage;
use crate::types::{Split, SplitGroup, SplitGroupKey};
use crate::Error;

/// Where a split's share goes, in priority order.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Destination {
    Hook(Address),
    Project(u64),
    Beneficiary(Address),
    Caller,
}

pub fn destination_of(split: &Split) -> Destination {
    if let Some(hook) = &split.hook {
        Destination::Hook(hook.clone())
    } else if split.project_id != 0 {
        Destination::Project(split.project_id)
    } else if let Some(beneficiary) = &split.beneficiary {
        Destination::Beneficiary(beneficiary.clone())
    } else {
        Destination::Caller
    }
}

pub fn splits_of(env: &Env, project_id: u64, domain: u64, group: &SplitGroupKey) -> Vec<Split> {
    let splits = storage::get_splits(env, project_id, domain, group);
    if splits.is_empty() && domain != DEFAULT_SPLIT_DOMAIN {
        return storage::get_splits(env, project_id, DEFAULT_SPLIT_DOMAIN, group);
    }
    splits
}

/// Replace every group in `groups` for `(project_id, domain)`.
pub fn set_splits_of(
    env: &Env,
    project_id: u64,
    domain: u64,
    groups: &Vec<SplitGroup>,
) -> Result<(), Error> {
    let now = env.ledger().timestamp();
    for group in groups.iter() {
        validate_percents(&group.splits)?;
        let current = storage::get_splits(env, project_id, domain, &group.group);
        for locked in current.iter() {
            if locked.locked_until > now && !includes_locked(&group.splits, &locked) {
                return Err(Error::LockedSplitsNotIncluded);
            }
        }
        storage::set_splits(env, project_id, domain, &group.group, &group.splits);
    }
    Ok(())
}

pub fn validate_percents(splits: &Vec<Split>) -> Result<(), Error> {
    let mut total: u64 = 0;
    for split in splits.iter() {
        if split.percent == 0 {
            return Err(Error::InvalidSplitPercent);
        }
        total += split.percent as u64;
        if total > SPLITS_TOTAL_PERCENT as u64 {
            return Err(Error::PercentOverflow);
        }
    }
    Ok(())
}

fn includes_locked(splits: &Vec<Split>, locked: &Split) -> bool {
    splits.iter().any(|split| {
        split.percent == locked.percent
            && split.project_id == locked.project_id
            && split.beneficiary == locked.beneficiary
            && split.hook == locked.hook
            && split.prefer_claimed == locked.prefer_claimed
            && split.prefer_add_to_balance == locked.prefer_add_to_balance
            && split.locked_until >= locked.locked_until
    })
}

/// Floor share of `total` for every split, plus the leftover.
pub fn allocate(env: &Env, total: i128, splits: &Vec<Split>) -> Result<(Vec<i128>, i128), Error> {
    if total < 0 {
        return Err(Error::InvalidAmount);
    }
    let mut shares = Vec::new(env);
    let mut leftover = total;
    for split in splits.iter() {
        let share = mul_div_down(
            env,
            total,
            split.percent as i128,
            SPLITS_TOTAL_PERCENT as i128,
        )?;
        leftover -= share;
        shares.push_back(share);
    }
    if leftover < 0 {
        return Err(Error::PercentOverflow);
    }
    Ok((shares, leftover))
}

#[cfg(test)]
mod tests {
    use super::*;
    use soroban_sdk::testutils::{Address as _, Ledger};
    use soroban_sdk::vec;

    use crate::RulesetTreasury;

    fn split(env: &Env, percent: u32, locked_until: u64) -> Split {
        Split {
            percent,
            project_id: 0,
            beneficiary: Some(Address::generate(env)),
            hook: None,
            locked_until,
            prefer_claimed: false,
            prefer_add_to_balance: false,
        }
    }

    #[test]
    fn destination_priority() {
        let env = Env::default();
        let mut s = split(&env, 1, 0);
        let hook = Address::generate(&env);
        s.project_id = 7;
        s.hook = Some(hook.clone());
        assert_eq!(destination_of(&s), Destination::Hook(hook));
        s.hook = None;
        assert_eq!(destination_of(&s), Destination::Project(7));
        s.project_id = 0;
        assert!(matches!(destination_of(&s), Destination::Beneficiary(_)));
        s.beneficiary = None;
        assert_eq!(destination_of(&s), Destination::Caller);
    }

    #[test]
    fn percents_are_validated() {
        let env = Env::default();
        let half = SPLITS_TOTAL_PERCENT / 2;
        assert!(validate_percents(&vec![&env, split(&env, half, 0), split(&env, half, 0)]).is_ok());
        assert_eq!(
            validate_percents(&vec![&env, split(&env, half, 0), split(&env, half + 1, 0)]),
            Err(Error::PercentOverflow)
        );
        assert_eq!(
            validate_percents(&vec![&env, split(&env, 0, 0)]),
            Err(Error::InvalidSplitPercent)
        );
    }

    #[test]
    fn allocation_floors_and_keeps_the_remainder() {
        let env = Env::default();
        let third = SPLITS_TOTAL_PERCENT / 3;
        let splits = vec![&env, split(&env, third, 0), split(&env, third, 0), split(&env, third, 0)];
        let (shares, leftover) = allocate(&env, 100, &splits).unwrap();
        assert_eq!(shares, vec![&env, 33i128, 33, 33]);
        assert_eq!(leftover, 1);
    }

    #[test]
    fn locked_split_must_be_kept() {
        let env = Env::default();
        env.ledger().set_timestamp(1_000);
        let id = env.register(RulesetTreasury, ());
        env.as_contract(&id, || {
            let locked = split(&env, 100, 2_000);
            let group = SplitGroupKey::ReservedTokens;
            set_splits_of(
                &env,
                1,
                0,
                &vec![&env, SplitGroup { group: group.clone(), splits: vec![&env, locked.clone()] }],
            )
            .unwrap();

            let dropped = vec![&env, SplitGroup { group: group.clone(), splits: vec![&env, split(&env, 100, 0)] }];
            assert_eq!(set_splits_of(&env, 1, 0, &dropped), Err(Error::LockedSplitsNotIncluded));

            let mut extended = locked.clone();
            extended.locked_until = 5_000;
            let kept = vec![&env, SplitGroup { group: group.clone(), splits: vec![&env, extended] }];
            assert!(set_splits_of(&env, 1, 0, &kept).is_ok());

            env.ledger().set_timestamp(5_000);
            assert!(set_splits_of(&env, 1, 0, &dropped).is_ok());
        });
    }

    #[test]
    fn lookup_falls_back_to_default_domain() {
        let env = Env::default();
        let id = env.register(RulesetTreasury, ());
        env.as_contract(&id, || {
            let group = SplitGroupKey::ReservedTokens;
            let splits = vec![&env, split(&env, 10, 0)];
            storage::set_splits(&env, 1, DEFAULT_SPLIT_DOMAIN, &group, &splits);
            assert_eq!(splits_of(&env, 1, 42, &group), splits);
        });
    }
}
