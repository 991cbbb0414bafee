//! # Storage
//!
//! Typed helpers over Soroban's two storage tiers used by the protocol.
//!
//! ## Instance storage (contract-lifetime TTL)
//!
//! | Key              | Type      | Description                        |
//! |------------------|-----------|------------------------------------|
//! | `ProjectCount`   | `u64`     | Last issued project id             |
//! | `Paused`         | `bool`    | Global emergency pause             |
//!
//! Instance TTL is bumped by **7 days** whenever it falls below 1 day remaining.
//!
//! ## Persistent storage (per-entry TTL)
//!
//! | Key                                        | Type                 |
//! |--------------------------------------------|----------------------|
//! | `Project(project)`                         | `Project`            |
//! | `LatestRulesetId(project)`                 | `u64`                |
//! | `Ruleset(project, id)`                     | `Ruleset`            |
//! | `Controller(project)`                      | `Address`            |
//! | `Terminals(project)`                       | `Vec<Address>`       |
//! | `AccountingContext(project, terminal, tok)`| `AccountingContext`  |
//! | `AccountingTokens(project, terminal)`      | `Vec<Address>`       |
//! | `Balance(project, terminal, token)`        | `i128`               |
//! | `PayoutLimit(project, ruleset, term, tok)` | `CurrencyAmount`     |
//! | `SurplusAllowance(project, ruleset, ..)`   | `CurrencyAmount`     |
//! | `UsedPayouts(project, term, tok, cycle)`   | `i128`               |
//! | `UsedAllowance(project, term, tok, rs)`    | `i128`               |
//! | `Splits(project, domain, group)`           | `Vec<Split>`         |
//! | `Tracker(project)`                         | `i128`               |
//! | `Credits(project, holder)`                 | `i128`               |
//! | `Claimed(project, holder)`                 | `i128`               |
//! | `CreditSupply(project)`                    | `i128`               |
//! | `ClaimedSupply(project)`                   | `i128`               |
//! | `Permissions(project, account, operator)`  | `u32` bitmask        |
//! | `PriceFeed(pricing, unit)`                 | `Address`            |
//!
//! Persistent TTL is bumped by **30 days** whenever it falls below 7 days
//! remaining. Entries are only bumped when they exist.
//!
//! Historical rulesets are never deleted; they form the audit trail of a
//! project's configuration.

use core::fmt::Debug;

use soroban_sdk::{contracttype, Address, Env, IntoVal, TryFromVal, Val, Vec};

use crate::types::{AccountingContext, CurrencyAmount, Project, Ruleset, Split, SplitGroupKey};

// ── TTL Constants ────────────────────────────────────────────────────

/// Approximate ledgers per day (~5 seconds per ledger).
const DAY_IN_LEDGERS: u32 = 17_280;

/// Instance storage: bump by 7 days when below 1 day remaining.
const INSTANCE_BUMP_AMOUNT: u32 = 7 * DAY_IN_LEDGERS;
const INSTANCE_LIFETIME_THRESHOLD: u32 = DAY_IN_LEDGERS;

/// Persistent storage: bump by 30 days when below 7 days remaining.
const PERSISTENT_BUMP_AMOUNT: u32 = 30 * DAY_IN_LEDGERS;
const PERSISTENT_LIFETIME_THRESHOLD: u32 = 7 * DAY_IN_LEDGERS;

// ── Storage Keys ─────────────────────────────────────────────────────

/// All contract storage keys except the RBAC ones (see `rbac::RbacKey`).
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DataKey {
    ProjectCount,
    Paused,
    Project(u64),
    LatestRulesetId(u64),
    Ruleset(u64, u64),
    Controller(u64),
    Terminals(u64),
    AccountingContext(u64, Address, Address),
    AccountingTokens(u64, Address),
    Balance(u64, Address, Address),
    PayoutLimit(u64, u64, Address, Address),
    SurplusAllowance(u64, u64, Address, Address),
    UsedPayouts(u64, Address, Address, u32),
    UsedAllowance(u64, Address, Address, u64),
    Splits(u64, u64, SplitGroupKey),
    Tracker(u64),
    Credits(u64, Address),
    Claimed(u64, Address),
    CreditSupply(u64),
    ClaimedSupply(u64),
    Permissions(u64, Address, Address),
    PriceFeed(u32, u32),
}

// ── Instance Storage Helpers ─────────────────────────────────────────

/// Extend instance storage TTL if it falls below the threshold.
fn bump_instance(env: &Env) {
    env.storage()
        .instance()
        .extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
}

/// Atomically read and increment the project counter.
/// Returns the id to use for the new project (first id is 1).
pub fn next_project_id(env: &Env) -> u64 {
    bump_instance(env);
    let current: u64 = env
        .storage()
        .instance()
        .get(&DataKey::ProjectCount)
        .unwrap_or(0);
    let next = current + 1;
    env.storage().instance().set(&DataKey::ProjectCount, &next);
    next
}

pub fn project_count(env: &Env) -> u64 {
    env.storage()
        .instance()
        .get(&DataKey::ProjectCount)
        .unwrap_or(0)
}

pub fn set_paused(env: &Env, paused: bool) {
    bump_instance(env);
    env.storage().instance().set(&DataKey::Paused, &paused);
}

pub fn is_paused(env: &Env) -> bool {
    env.storage()
        .instance()
        .get(&DataKey::Paused)
        .unwrap_or(false)
}

// ── Persistent Storage Helpers ───────────────────────────────────────

/// Extend the TTL for a persistent storage key.
fn bump_persistent(env: &Env, key: &DataKey) {
    env.storage()
        .persistent()
        .extend_ttl(key, PERSISTENT_LIFETIME_THRESHOLD, PERSISTENT_BUMP_AMOUNT);
}

fn read<V>(env: &Env, key: &DataKey) -> Option<V>
where
    V: TryFromVal<Env, Val>,
    <V as TryFromVal<Env, Val>>::Error: Debug,
{
    let value = env.storage().persistent().get(key);
    if value.is_some() {
        bump_persistent(env, key);
    }
    value
}

fn write<V: IntoVal<Env, Val>>(env: &Env, key: &DataKey, value: &V) {
    env.storage().persistent().set(key, value);
    bump_persistent(env, key);
}

// ─────────────────────────────────────────────────────────
// Projects and directory
// ─────────────────────────────────────────────────────────

pub fn save_project(env: &Env, project: &Project) {
    write(env, &DataKey::Project(project.id), project);
}

pub fn load_project(env: &Env, project_id: u64) -> Option<Project> {
    read(env, &DataKey::Project(project_id))
}

pub fn get_controller(env: &Env, project_id: u64) -> Option<Address> {
    read(env, &DataKey::Controller(project_id))
}

pub fn set_controller(env: &Env, project_id: u64, controller: &Address) {
    write(env, &DataKey::Controller(project_id), controller);
}

pub fn get_terminals(env: &Env, project_id: u64) -> Vec<Address> {
    read(env, &DataKey::Terminals(project_id)).unwrap_or(Vec::new(env))
}

pub fn set_terminals(env: &Env, project_id: u64, terminals: &Vec<Address>) {
    write(env, &DataKey::Terminals(project_id), terminals);
}

/// Permissions `account` granted `operator` over `project_id`.
pub fn get_permissions(env: &Env, project_id: u64, account: &Address, operator: &Address) -> u32 {
    read(
        env,
        &DataKey::Permissions(project_id, account.clone(), operator.clone()),
    )
    .unwrap_or(0)
}

pub fn set_permissions(
    env: &Env,
    project_id: u64,
    account: &Address,
    operator: &Address,
    mask: u32,
) {
    write(
        env,
        &DataKey::Permissions(project_id, account.clone(), operator.clone()),
        &mask,
    );
}

// ─────────────────────────────────────────────────────────
// Rulesets
// ─────────────────────────────────────────────────────────

/// Id of the most recently queued ruleset, `0` when none.
pub fn latest_ruleset_id(env: &Env, project_id: u64) -> u64 {
    read(env, &DataKey::LatestRulesetId(project_id)).unwrap_or(0)
}

pub fn set_latest_ruleset_id(env: &Env, project_id: u64, ruleset_id: u64) {
    write(env, &DataKey::LatestRulesetId(project_id), &ruleset_id);
}

pub fn load_ruleset(env: &Env, project_id: u64, ruleset_id: u64) -> Option<Ruleset> {
    if ruleset_id == 0 {
        return None;
    }
    read(env, &DataKey::Ruleset(project_id, ruleset_id))
}

pub fn save_ruleset(env: &Env, ruleset: &Ruleset) {
    write(env, &DataKey::Ruleset(ruleset.project_id, ruleset.id), ruleset);
}

// ─────────────────────────────────────────────────────────
// Accounting
// ─────────────────────────────────────────────────────────

pub fn get_accounting_context(
    env: &Env,
    project_id: u64,
    terminal: &Address,
    token: &Address,
) -> Option<AccountingContext> {
    read(
        env,
        &DataKey::AccountingContext(project_id, terminal.clone(), token.clone()),
    )
}

pub fn set_accounting_context(
    env: &Env,
    project_id: u64,
    terminal: &Address,
    context: &AccountingContext,
) {
    write(
        env,
        &DataKey::AccountingContext(project_id, terminal.clone(), context.token.clone()),
        context,
    );
    let key = DataKey::AccountingTokens(project_id, terminal.clone());
    let mut tokens: Vec<Address> = read(env, &key).unwrap_or(Vec::new(env));
    tokens.push_back(context.token.clone());
    write(env, &key, &tokens);
}

pub fn get_accounting_tokens(env: &Env, project_id: u64, terminal: &Address) -> Vec<Address> {
    read(env, &DataKey::AccountingTokens(project_id, terminal.clone())).unwrap_or(Vec::new(env))
}

pub fn get_balance(env: &Env, project_id: u64, terminal: &Address, token: &Address) -> i128 {
    read(
        env,
        &DataKey::Balance(project_id, terminal.clone(), token.clone()),
    )
    .unwrap_or(0)
}

pub fn set_balance(env: &Env, project_id: u64, terminal: &Address, token: &Address, balance: i128) {
    write(
        env,
        &DataKey::Balance(project_id, terminal.clone(), token.clone()),
        &balance,
    );
}

pub fn get_payout_limit(
    env: &Env,
    project_id: u64,
    ruleset_id: u64,
    terminal: &Address,
    token: &Address,
) -> Option<CurrencyAmount> {
    read(
        env,
        &DataKey::PayoutLimit(project_id, ruleset_id, terminal.clone(), token.clone()),
    )
}

pub fn set_payout_limit(
    env: &Env,
    project_id: u64,
    ruleset_id: u64,
    terminal: &Address,
    token: &Address,
    limit: &CurrencyAmount,
) {
    write(
        env,
        &DataKey::PayoutLimit(project_id, ruleset_id, terminal.clone(), token.clone()),
        limit,
    );
}

pub fn get_surplus_allowance(
    env: &Env,
    project_id: u64,
    ruleset_id: u64,
    terminal: &Address,
    token: &Address,
) -> Option<CurrencyAmount> {
    read(
        env,
        &DataKey::SurplusAllowance(project_id, ruleset_id, terminal.clone(), token.clone()),
    )
}

pub fn set_surplus_allowance(
    env: &Env,
    project_id: u64,
    ruleset_id: u64,
    terminal: &Address,
    token: &Address,
    allowance: &CurrencyAmount,
) {
    write(
        env,
        &DataKey::SurplusAllowance(project_id, ruleset_id, terminal.clone(), token.clone()),
        allowance,
    );
}

pub fn get_used_payouts(
    env: &Env,
    project_id: u64,
    terminal: &Address,
    token: &Address,
    cycle_number: u32,
) -> i128 {
    read(
        env,
        &DataKey::UsedPayouts(project_id, terminal.clone(), token.clone(), cycle_number),
    )
    .unwrap_or(0)
}

pub fn set_used_payouts(
    env: &Env,
    project_id: u64,
    terminal: &Address,
    token: &Address,
    cycle_number: u32,
    used: i128,
) {
    write(
        env,
        &DataKey::UsedPayouts(project_id, terminal.clone(), token.clone(), cycle_number),
        &used,
    );
}

pub fn get_used_allowance(
    env: &Env,
    project_id: u64,
    terminal: &Address,
    token: &Address,
    ruleset_id: u64,
) -> i128 {
    read(
        env,
        &DataKey::UsedAllowance(project_id, terminal.clone(), token.clone(), ruleset_id),
    )
    .unwrap_or(0)
}

pub fn set_used_allowance(
    env: &Env,
    project_id: u64,
    terminal: &Address,
    token: &Address,
    ruleset_id: u64,
    used: i128,
) {
    write(
        env,
        &DataKey::UsedAllowance(project_id, terminal.clone(), token.clone(), ruleset_id),
        &used,
    );
}

pub fn get_price_feed(env: &Env, pricing_currency: u32, unit_currency: u32) -> Option<Address> {
    read(env, &DataKey::PriceFeed(pricing_currency, unit_currency))
}

pub fn set_price_feed(env: &Env, pricing_currency: u32, unit_currency: u32, feed: &Address) {
    write(env, &DataKey::PriceFeed(pricing_currency, unit_currency), feed);
}

// ─────────────────────────────────────────────────────────
// Splits
// ─────────────────────────────────────────────────────────

pub fn get_splits(env: &Env, project_id: u64, domain: u64, group: &SplitGroupKey) -> Vec<Split> {
    read(env, &DataKey::Splits(project_id, domain, group.clone())).unwrap_or(Vec::new(env))
}

pub fn set_splits(env: &Env, project_id: u64, domain: u64, group: &SplitGroupKey, splits: &Vec<Split>) {
    write(env, &DataKey::Splits(project_id, domain, group.clone()), splits);
}

// ─────────────────────────────────────────────────────────
// Project tokens
// ─────────────────────────────────────────────────────────

/// Processed-token tracker; signed, may go negative.
pub fn get_tracker(env: &Env, project_id: u64) -> i128 {
    read(env, &DataKey::Tracker(project_id)).unwrap_or(0)
}

pub fn set_tracker(env: &Env, project_id: u64, tracker: i128) {
    write(env, &DataKey::Tracker(project_id), &tracker);
}

pub fn get_credits(env: &Env, project_id: u64, holder: &Address) -> i128 {
    read(env, &DataKey::Credits(project_id, holder.clone())).unwrap_or(0)
}

pub fn set_credits(env: &Env, project_id: u64, holder: &Address, amount: i128) {
    write(env, &DataKey::Credits(project_id, holder.clone()), &amount);
}

pub fn get_claimed(env: &Env, project_id: u64, holder: &Address) -> i128 {
    read(env, &DataKey::Claimed(project_id, holder.clone())).unwrap_or(0)
}

pub fn set_claimed(env: &Env, project_id: u64, holder: &Address, amount: i128) {
    write(env, &DataKey::Claimed(project_id, holder.clone()), &amount);
}

pub fn get_credit_supply(env: &Env, project_id: u64) -> i128 {
    read(env, &DataKey::CreditSupply(project_id)).unwrap_or(0)
}

pub fn set_credit_supply(env: &Env, project_id: u64, supply: i128) {
    write(env, &DataKey::CreditSupply(project_id), &supply);
}

pub fn get_claimed_supply(env: &Env, project_id: u64) -> i128 {
    read(env, &DataKey::ClaimedSupply(project_id)).unwrap_or(0)
}

pub fn set_claimed_supply(env: &Env, project_id: u64, supply: i128) {
    write(env, &DataKey::ClaimedSupply(project_id), &supply);
}
