//! # Accounting ledger
//!
//! Balances per `(project, terminal, token)`, the fund-access limits of each
//! ruleset, and the counters tracking how much of those limits was used.
//!
//! This contract is itself the terminal: every record is keyed by
//! `env.current_contract_address()`.
//!
//! | Counter            | Keyed by       | Resets when                |
//! |--------------------|----------------|----------------------------|
//! | used payouts       | cycle number   | every new cycle, even when rolled over |
//! | used allowance     | ruleset id     | a new ruleset takes effect |
//!
//! Surplus is the balance minus what the current cycle's payout limit still
//! owes, floored at zero. Redemptions and allowance withdrawals may only touch
//! surplus.
//!
//! Every `record_*` function only mutates ledger state; token transfers and
//! hook calls happen in the caller afterwards.

use soroban_sdk::{Address, Bytes, Env, Vec};

use crate::constants::{MAX_LIMIT_CURRENCY, MAX_TOKEN_DECIMALS, MAX_WEIGHT};
use crate::hooks::DataHookClient;
use crate::issuance;
use crate::math::{mul_div_down, pow10};
use crate::prices;
use crate::redemption;
use crate::rulesets;
use crate::storage;
use crate::types::{
    AccountingContext, CurrencyAmount, FundAccessLimits, HookSpecification, PayContext,
    RedeemContext, Ruleset, TokenAmount,
};
use crate::Error;

/// Outcome of recording a payment.
pub struct PaymentRecord {
    pub ruleset: Ruleset,
    pub weight: i128,
    pub token_count: i128,
    pub specifications: Vec<HookSpecification>,
}

/// Outcome of recording a redemption.
pub struct RedemptionRecord {
    pub ruleset: Ruleset,
    pub reclaim_amount: i128,
    pub specifications: Vec<HookSpecification>,
}

/// The address balances are recorded under.
pub fn terminal(env: &Env) -> Address {
    env.current_contract_address()
}

// ─────────────────────────────────────────────────────────
// Accounting contexts and balances
// ─────────────────────────────────────────────────────────

pub fn add_accounting_context(
    env: &Env,
    project_id: u64,
    context: &AccountingContext,
) -> Result<(), Error> {
    let terminal = terminal(env);
    if storage::get_accounting_context(env, project_id, &terminal, &context.token).is_some() {
        return Err(Error::AccountingContextExists);
    }
    if context.decimals > MAX_TOKEN_DECIMALS {
        return Err(Error::InvalidDecimals);
    }
    storage::set_accounting_context(env, project_id, &terminal, context);
    Ok(())
}

pub fn accounting_context_of(
    env: &Env,
    project_id: u64,
    token: &Address,
) -> Result<AccountingContext, Error> {
    storage::get_accounting_context(env, project_id, &terminal(env), token)
        .ok_or(Error::TokenNotAccepted)
}

/// Every accounting context the project registered here, in registration order.
pub fn accounting_contexts_of(env: &Env, project_id: u64) -> Vec<AccountingContext> {
    let terminal = terminal(env);
    let mut contexts = Vec::new(env);
    for token in storage::get_accounting_tokens(env, project_id, &terminal).iter() {
        if let Some(context) = storage::get_accounting_context(env, project_id, &terminal, &token) {
            contexts.push_back(context);
        }
    }
    contexts
}

pub fn balance_of(env: &Env, project_id: u64, token: &Address) -> i128 {
    storage::get_balance(env, project_id, &terminal(env), token)
}

/// Credit `amount` to the project's balance of `token`.
pub fn record_incoming(
    env: &Env,
    project_id: u64,
    token: &Address,
    amount: i128,
) -> Result<i128, Error> {
    if amount < 0 {
        return Err(Error::InvalidAmount);
    }
    let terminal = terminal(env);
    let balance = storage::get_balance(env, project_id, &terminal, token)
        .checked_add(amount)
        .ok_or(Error::Overflow)?;
    storage::set_balance(env, project_id, &terminal, token, balance);
    Ok(balance)
}

fn debit(env: &Env, project_id: u64, token: &Address, amount: i128) -> Result<(), Error> {
    let terminal = terminal(env);
    let balance = storage::get_balance(env, project_id, &terminal, token);
    if amount > balance {
        return Err(Error::InsufficientBalance);
    }
    storage::set_balance(env, project_id, &terminal, token, balance - amount);
    Ok(())
}

// ─────────────────────────────────────────────────────────
// Fund access limits
// ─────────────────────────────────────────────────────────

/// Store the payout limits and surplus allowances of a freshly queued ruleset.
pub fn set_fund_access_limits(
    env: &Env,
    project_id: u64,
    ruleset_id: u64,
    limits: &Vec<FundAccessLimits>,
) -> Result<(), Error> {
    let terminal = terminal(env);
    for limit in limits.iter() {
        validate_limit(&limit.payout_limit)?;
        validate_limit(&limit.surplus_allowance)?;
        storage::set_payout_limit(
            env,
            project_id,
            ruleset_id,
            &terminal,
            &limit.token,
            &limit.payout_limit,
        );
        storage::set_surplus_allowance(
            env,
            project_id,
            ruleset_id,
            &terminal,
            &limit.token,
            &limit.surplus_allowance,
        );
    }
    Ok(())
}

fn validate_limit(limit: &CurrencyAmount) -> Result<(), Error> {
    if limit.amount < 0 || limit.currency > MAX_LIMIT_CURRENCY {
        return Err(Error::InvalidConfiguration);
    }
    Ok(())
}

pub fn payout_limit_of(
    env: &Env,
    project_id: u64,
    ruleset_id: u64,
    token: &Address,
) -> Option<CurrencyAmount> {
    storage::get_payout_limit(env, project_id, ruleset_id, &terminal(env), token)
}

pub fn surplus_allowance_of(
    env: &Env,
    project_id: u64,
    ruleset_id: u64,
    token: &Address,
) -> Option<CurrencyAmount> {
    storage::get_surplus_allowance(env, project_id, ruleset_id, &terminal(env), token)
}

pub fn used_payouts_of(env: &Env, project_id: u64, token: &Address, cycle_number: u32) -> i128 {
    storage::get_used_payouts(env, project_id, &terminal(env), token, cycle_number)
}

pub fn used_allowance_of(env: &Env, project_id: u64, token: &Address, ruleset_id: u64) -> i128 {
    storage::get_used_allowance(env, project_id, &terminal(env), token, ruleset_id)
}

/// Express `amount` of `currency` in the context's token.
fn convert_to_context(
    env: &Env,
    amount: i128,
    currency: u32,
    context: &AccountingContext,
) -> Result<i128, Error> {
    if currency == context.currency {
        return Ok(amount);
    }
    let one = pow10(context.decimals)?;
    let price = prices::price_per_unit_of(env, currency, context.currency, context.decimals)?;
    mul_div_down(env, amount, one, price)
}

// ─────────────────────────────────────────────────────────
// Surplus
// ─────────────────────────────────────────────────────────

/// Balance beyond what `ruleset`'s payout limit still owes this cycle.
pub fn surplus_during(
    env: &Env,
    project_id: u64,
    ruleset: &Ruleset,
    context: &AccountingContext,
) -> Result<i128, Error> {
    let terminal = terminal(env);
    let balance = storage::get_balance(env, project_id, &terminal, &context.token);
    if balance == 0 {
        return Ok(0);
    }

    let still_owed = match storage::get_payout_limit(
        env,
        project_id,
        ruleset.id,
        &terminal,
        &context.token,
    ) {
        Some(limit) => {
            let used = storage::get_used_payouts(
                env,
                project_id,
                &terminal,
                &context.token,
                ruleset.cycle_number,
            );
            let remaining = (limit.amount - used).max(0);
            if remaining == 0 {
                0
            } else {
                convert_to_context(env, remaining, limit.currency, context)?
            }
        }
        None => 0,
    };

    Ok((balance - still_owed).max(0))
}

/// Surplus of `token` under the project's current ruleset.
pub fn surplus_of(env: &Env, project_id: u64, token: &Address) -> Result<i128, Error> {
    let context = accounting_context_of(env, project_id, token)?;
    match rulesets::current_of(env, project_id)? {
        Some(ruleset) => surplus_during(env, project_id, &ruleset, &context),
        None => Ok(balance_of(env, project_id, token)),
    }
}

// ─────────────────────────────────────────────────────────
// Recording
// ─────────────────────────────────────────────────────────

/// Record a payment of `amount` and work out how many project tokens it buys.
///
/// Hook forwards proposed by the data hook are carved out of the credited
/// amount; they may not exceed it.
pub fn record_payment(
    env: &Env,
    payer: &Address,
    project_id: u64,
    amount: &TokenAmount,
    beneficiary: &Address,
    metadata: &Bytes,
) -> Result<PaymentRecord, Error> {
    let ruleset = rulesets::current_of(env, project_id)?.ok_or(Error::NoActiveRuleset)?;
    if ruleset.metadata.pause_pay {
        return Err(Error::PayPaused);
    }

    let (weight, specifications) = match &ruleset.metadata.data_hook {
        Some(hook) if ruleset.metadata.use_data_hook_for_pay => {
            let proposal = DataHookClient::new(env, hook).before_pay_recorded(&PayContext {
                payer: payer.clone(),
                project_id,
                ruleset_id: ruleset.id,
                amount: amount.clone(),
                beneficiary: beneficiary.clone(),
                weight: ruleset.weight,
                reserved_rate: ruleset.metadata.reserved_rate,
                metadata: metadata.clone(),
            });
            if proposal.weight < 0 || proposal.weight > MAX_WEIGHT {
                return Err(Error::InvalidHookAmount);
            }
            (proposal.weight, proposal.specifications)
        }
        _ => (ruleset.weight, Vec::new(env)),
    };

    let mut credited = amount.value;
    for specification in specifications.iter() {
        if specification.amount < 0 || specification.amount > credited {
            return Err(Error::InvalidHookAmount);
        }
        credited -= specification.amount;
    }
    if credited > 0 {
        record_incoming(env, project_id, &amount.token, credited)?;
    }

    let token_count = if weight == 0 || amount.value == 0 {
        0
    } else {
        let weight_ratio = if amount.currency == ruleset.metadata.base_currency {
            pow10(amount.decimals)?
        } else {
            prices::price_per_unit_of(
                env,
                amount.currency,
                ruleset.metadata.base_currency,
                amount.decimals,
            )?
        };
        mul_div_down(env, amount.value, weight, weight_ratio)?
    };

    Ok(PaymentRecord {
        ruleset,
        weight,
        token_count,
        specifications,
    })
}

/// Record a payout of `amount` (denominated in `currency`) against the
/// current cycle's payout limit. Returns the ruleset and the token amount
/// debited.
pub fn record_payouts(
    env: &Env,
    project_id: u64,
    token: &Address,
    amount: i128,
    currency: u32,
) -> Result<(Ruleset, i128), Error> {
    if amount <= 0 {
        return Err(Error::InvalidAmount);
    }
    let ruleset = rulesets::current_of(env, project_id)?.ok_or(Error::NoActiveRuleset)?;
    if ruleset.metadata.pause_payouts {
        return Err(Error::PayoutsPaused);
    }
    let context = accounting_context_of(env, project_id, token)?;
    let terminal = terminal(env);

    let limit = storage::get_payout_limit(env, project_id, ruleset.id, &terminal, token)
        .ok_or(Error::ExceedsLimit)?;
    let used = storage::get_used_payouts(env, project_id, &terminal, token, ruleset.cycle_number);
    let new_used = used.checked_add(amount).ok_or(Error::Overflow)?;
    if limit.amount == 0 || new_used > limit.amount {
        return Err(Error::ExceedsLimit);
    }
    if currency != limit.currency {
        return Err(Error::CurrencyMismatch);
    }

    let paid_out = convert_to_context(env, amount, currency, &context)?;
    debit(env, project_id, token, paid_out)?;
    storage::set_used_payouts(
        env,
        project_id,
        &terminal,
        token,
        ruleset.cycle_number,
        new_used,
    );

    Ok((ruleset, paid_out))
}

/// Record a discretionary withdrawal from surplus against the current
/// ruleset's surplus allowance.
pub fn record_allowance_use(
    env: &Env,
    project_id: u64,
    token: &Address,
    amount: i128,
    currency: u32,
) -> Result<(Ruleset, i128), Error> {
    if amount <= 0 {
        return Err(Error::InvalidAmount);
    }
    let ruleset = rulesets::current_of(env, project_id)?.ok_or(Error::NoActiveRuleset)?;
    let context = accounting_context_of(env, project_id, token)?;
    let terminal = terminal(env);

    let allowance = storage::get_surplus_allowance(env, project_id, ruleset.id, &terminal, token)
        .ok_or(Error::ExceedsLimit)?;
    let used = storage::get_used_allowance(env, project_id, &terminal, token, ruleset.id);
    let new_used = used.checked_add(amount).ok_or(Error::Overflow)?;
    if allowance.amount == 0 || new_used > allowance.amount {
        return Err(Error::ExceedsLimit);
    }
    if currency != allowance.currency {
        return Err(Error::CurrencyMismatch);
    }

    let withdrawn = convert_to_context(env, amount, currency, &context)?;
    if withdrawn > surplus_during(env, project_id, &ruleset, &context)? {
        return Err(Error::ExceedsLimit);
    }
    debit(env, project_id, token, withdrawn)?;
    storage::set_used_allowance(env, project_id, &terminal, token, ruleset.id, new_used);

    Ok((ruleset, withdrawn))
}

/// Record a redemption of `redeem_count` project tokens for `token`.
///
/// The reclaim amount comes from the bonding curve unless the ruleset's
/// redeem data hook overrides it. The override plus every forwarded slice
/// must fit within surplus.
pub fn record_redemption(
    env: &Env,
    holder: &Address,
    project_id: u64,
    token: &Address,
    redeem_count: i128,
    metadata: &Bytes,
) -> Result<RedemptionRecord, Error> {
    let ruleset = rulesets::current_of(env, project_id)?.ok_or(Error::NoActiveRuleset)?;
    if ruleset.metadata.pause_redeem {
        return Err(Error::RedeemPaused);
    }
    let context = accounting_context_of(env, project_id, token)?;

    let total_supply =
        issuance::total_outstanding_of(env, project_id, ruleset.metadata.reserved_rate)?;
    if redeem_count > total_supply {
        return Err(Error::InsufficientTokens);
    }

    let surplus = surplus_during(env, project_id, &ruleset, &context)?;
    let mut reclaim_amount = redemption::reclaim_amount_for(
        env,
        redeem_count,
        total_supply,
        surplus,
        ruleset.metadata.redemption_rate,
    )?;
    let mut specifications = Vec::new(env);

    if let Some(hook) = &ruleset.metadata.data_hook {
        if ruleset.metadata.use_data_hook_for_redeem {
            let proposal = DataHookClient::new(env, hook).before_redeem_recorded(&RedeemContext {
                holder: holder.clone(),
                project_id,
                ruleset_id: ruleset.id,
                redeem_count,
                total_supply,
                surplus: TokenAmount {
                    token: token.clone(),
                    value: surplus,
                    decimals: context.decimals,
                    currency: context.currency,
                },
                reclaim_amount,
                redemption_rate: ruleset.metadata.redemption_rate,
                metadata: metadata.clone(),
            });
            if proposal.reclaim_amount < 0 {
                return Err(Error::InvalidHookAmount);
            }
            reclaim_amount = proposal.reclaim_amount;
            specifications = proposal.specifications;
        }
    }

    let mut total = reclaim_amount;
    for specification in specifications.iter() {
        if specification.amount < 0 {
            return Err(Error::InvalidHookAmount);
        }
        total = total.checked_add(specification.amount).ok_or(Error::Overflow)?;
    }
    if total > surplus {
        return Err(Error::HookOverrideExceedsSurplus);
    }

    debit(env, project_id, token, total)?;

    Ok(RedemptionRecord {
        ruleset,
        reclaim_amount,
        specifications,
    })
}

/// Zero the project's balance of `token` for a move to another terminal.
pub fn record_migration(env: &Env, project_id: u64, token: &Address) -> Result<i128, Error> {
    let ruleset = rulesets::current_of(env, project_id)?.ok_or(Error::NoActiveRuleset)?;
    if !ruleset.metadata.allow_terminal_migration {
        return Err(Error::MigrationNotAllowed);
    }
    let balance = balance_of(env, project_id, token);
    debit(env, project_id, token, balance)?;
    Ok(balance)
}
