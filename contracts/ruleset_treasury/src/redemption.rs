//! Bonding-curve redemption.
//!
//! ```text
//! base    = surplus * count / supply
//! reclaim = base * (rate + count * (MAX - rate) / supply) / MAX
//! ```
//!
//! At `rate == MAX` every token reclaims its linear share of surplus. Lower
//! rates penalise early redeemers in favour of the holders who stay; the last
//! holder redeeming the whole supply still takes the whole surplus.

use soroban_sdk::Env;

use crate::constants::MAX_REDEMPTION_RATE;
use crate::math::mul_div_down;
use crate::Error;

/// Amount of surplus `count` tokens out of `total_supply` may reclaim.
pub fn reclaim_amount_for(
    env: &Env,
    count: i128,
    total_supply: i128,
    surplus: i128,
    redemption_rate: u32,
) -> Result<i128, Error> {
    if count < 0 || total_supply < 0 || surplus < 0 {
        return Err(Error::InvalidAmount);
    }
    if redemption_rate > MAX_REDEMPTION_RATE {
        return Err(Error::InvalidConfiguration);
    }
    if count > total_supply {
        return Err(Error::InsufficientTokens);
    }
    if redemption_rate == 0 || count == 0 || surplus == 0 {
        return Ok(0);
    }
    if count == total_supply {
        return Ok(surplus);
    }

    let base = mul_div_down(env, surplus, count, total_supply)?;
    if redemption_rate == MAX_REDEMPTION_RATE {
        return Ok(base);
    }

    let curve = redemption_rate as i128
        + mul_div_down(
            env,
            count,
            (MAX_REDEMPTION_RATE - redemption_rate) as i128,
            total_supply,
        )?;
    mul_div_down(env, base, curve, MAX_REDEMPTION_RATE as i128)
}

#[cfg(test)]
mod tests {
    use super::*;

    const E18: i128 = 1_000_000_000_000_000_000;

    #[test]
    fn full_rate_is_linear() {
        let env = Env::default();
        let got = reclaim_amount_for(&env, 100 * E18, 1_000 * E18, 10 * E18, 10_000).unwrap();
        assert_eq!(got, E18);
    }

    #[test]
    fn half_rate_discounts_partial_redemptions() {
        let env = Env::default();
        // base = 1e18; curve = 5000 + 100 * 5000 / 1000 = 5500
        let got = reclaim_amount_for(&env, 100 * E18, 1_000 * E18, 10 * E18, 5_000).unwrap();
        assert_eq!(got, E18 * 5_500 / 10_000);
    }

    #[test]
    fn zero_rate_reclaims_nothing() {
        let env = Env::default();
        assert_eq!(reclaim_amount_for(&env, 1_000, 1_000, 5_000, 0).unwrap(), 0);
        assert_eq!(reclaim_amount_for(&env, 10, 1_000, 5_000, 0).unwrap(), 0);
    }

    #[test]
    fn whole_supply_takes_whole_surplus() {
        let env = Env::default();
        assert_eq!(reclaim_amount_for(&env, 777, 777, 12_345, 1).unwrap(), 12_345);
    }

    #[test]
    fn empty_inputs_reclaim_nothing() {
        let env = Env::default();
        assert_eq!(reclaim_amount_for(&env, 0, 0, 1_000, 10_000).unwrap(), 0);
        assert_eq!(reclaim_amount_for(&env, 10, 100, 0, 10_000).unwrap(), 0);
    }

    #[test]
    fn redeeming_more_than_supply_fails() {
        let env = Env::default();
        assert_eq!(
            reclaim_amount_for(&env, 101, 100, 1_000, 10_000),
            Err(Error::InsufficientTokens)
        );
    }

    #[test]
    fn rate_above_max_is_rejected() {
        let env = Env::default();
        assert_eq!(
            reclaim_amount_for(&env, 1, 100, 1_000, MAX_REDEMPTION_RATE + 1),
            Err(Error::InvalidConfiguration)
        );
    }
}
