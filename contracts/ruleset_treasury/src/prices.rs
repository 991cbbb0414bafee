//! Currency conversion through admin-registered price feeds.
//!
//! A feed registered for `(pricing, unit)` quotes the price of one `unit`
//! in `pricing`. The inverse direction is derived from the same feed.

use soroban_sdk::{Address, Env};

use crate::hooks::PriceFeedClient;
use crate::math::{mul_div_down, pow10};
use crate::storage;
use crate::Error;

/// Price of one `unit_currency` expressed in `pricing_currency`, with
/// `decimals` decimals.
pub fn price_per_unit_of(
    env: &Env,
    pricing_currency: u32,
    unit_currency: u32,
    decimals: u32,
) -> Result<i128, Error> {
    if pricing_currency == unit_currency {
        return pow10(decimals);
    }

    if let Some(feed) = storage::get_price_feed(env, pricing_currency, unit_currency) {
        let price = PriceFeedClient::new(env, &feed).current_unit_price(&decimals);
        if price <= 0 {
            return Err(Error::InvalidPrice);
        }
        return Ok(price);
    }

    if let Some(feed) = storage::get_price_feed(env, unit_currency, pricing_currency) {
        let inverse = PriceFeedClient::new(env, &feed).current_unit_price(&decimals);
        if inverse <= 0 {
            return Err(Error::InvalidPrice);
        }
        let one = pow10(decimals)?;
        return mul_div_down(env, one, one, inverse);
    }

    Err(Error::PriceFeedNotFound)
}

/// Register `feed` for `(pricing_currency, unit_currency)`. A pair can only be
/// registered once, in either direction.
pub fn add_price_feed(
    env: &Env,
    pricing_currency: u32,
    unit_currency: u32,
    feed: &Address,
) -> Result<(), Error> {
    if pricing_currency == unit_currency {
        return Err(Error::InvalidConfiguration);
    }
    if storage::get_price_feed(env, pricing_currency, unit_currency).is_some()
        || storage::get_price_feed(env, unit_currency, pricing_currency).is_some()
    {
        return Err(Error::PriceFeedExists);
    }
    storage::set_price_feed(env, pricing_currency, unit_currency, feed);
    Ok(())
}
