//! On-chain events. Topics are `(symbol, project_id)` unless noted.

use soroban_sdk::{contracttype, symbol_short, Address, Env, Symbol};

use crate::types::{Split, SplitGroupKey};

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProjectLaunched {
    pub project_id: u64,
    pub owner: Address,
    pub ruleset_id: u64,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RulesetQueued {
    pub ruleset_id: u64,
    pub based_on_id: u64,
    pub cycle_number: u32,
    pub start: u64,
    pub weight: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Paid {
    pub ruleset_id: u64,
    pub cycle_number: u32,
    pub payer: Address,
    pub beneficiary: Address,
    pub token: Address,
    pub amount: i128,
    pub token_count: i128,
    pub beneficiary_count: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BalanceAdded {
    pub caller: Address,
    pub token: Address,
    pub amount: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Redeemed {
    pub ruleset_id: u64,
    pub holder: Address,
    pub beneficiary: Address,
    pub token: Address,
    pub redeem_count: i128,
    pub reclaim_amount: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PayoutsSent {
    pub ruleset_id: u64,
    pub cycle_number: u32,
    pub caller: Address,
    pub token: Address,
    pub amount: i128,
    pub paid_out: i128,
    pub leftover: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SplitPaid {
    pub group: SplitGroupKey,
    pub split: Split,
    pub amount: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AllowanceUsed {
    pub ruleset_id: u64,
    pub caller: Address,
    pub beneficiary: Address,
    pub token: Address,
    pub amount: i128,
    pub withdrawn: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReservedSent {
    pub ruleset_id: u64,
    pub caller: Address,
    pub owed: i128,
    pub leftover: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TokensMinted {
    pub caller: Address,
    pub beneficiary: Address,
    pub token_count: i128,
    pub beneficiary_count: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TokensBurned {
    pub caller: Address,
    pub holder: Address,
    pub amount: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Migrated {
    /// `control` or `terminal`.
    pub kind: Symbol,
    pub to: Address,
    pub token: Option<Address>,
    pub amount: i128,
}

pub fn emit_project_launched(env: &Env, project_id: u64, owner: Address, ruleset_id: u64) {
    let topics = (symbol_short!("launched"), project_id);
    env.events().publish(
        topics,
        ProjectLaunched {
            project_id,
            owner,
            ruleset_id,
        },
    );
}

pub fn emit_ruleset_queued(env: &Env, project_id: u64, data: RulesetQueued) {
    env.events()
        .publish((symbol_short!("queued"), project_id), data);
}

pub fn emit_paid(env: &Env, project_id: u64, data: Paid) {
    env.events().publish((symbol_short!("paid"), project_id), data);
}

pub fn emit_balance_added(env: &Env, project_id: u64, caller: Address, token: Address, amount: i128) {
    let topics = (symbol_short!("add_bal"), project_id);
    env.events().publish(
        topics,
        BalanceAdded {
            caller,
            token,
            amount,
        },
    );
}

pub fn emit_redeemed(env: &Env, project_id: u64, data: Redeemed) {
    env.events()
        .publish((symbol_short!("redeemed"), project_id), data);
}

pub fn emit_payouts_sent(env: &Env, project_id: u64, data: PayoutsSent) {
    env.events()
        .publish((symbol_short!("payouts"), project_id), data);
}

pub fn emit_split_paid(env: &Env, project_id: u64, group: SplitGroupKey, split: Split, amount: i128) {
    let topics = (symbol_short!("split"), project_id);
    env.events()
        .publish(topics, SplitPaid { group, split, amount });
}

/// A project-routed payout the target could not take; the share stays with
/// the paying project.
pub fn emit_payout_reverted(env: &Env, project_id: u64, group: SplitGroupKey, split: Split, amount: i128) {
    let topics = (symbol_short!("reverted"), project_id);
    env.events()
        .publish(topics, SplitPaid { group, split, amount });
}

pub fn emit_allowance_used(env: &Env, project_id: u64, data: AllowanceUsed) {
    env.events()
        .publish((symbol_short!("allow"), project_id), data);
}

pub fn emit_reserved_sent(env: &Env, project_id: u64, data: ReservedSent) {
    env.events()
        .publish((symbol_short!("reserved"), project_id), data);
}

pub fn emit_tokens_minted(env: &Env, project_id: u64, data: TokensMinted) {
    env.events()
        .publish((symbol_short!("minted"), project_id), data);
}

pub fn emit_tokens_burned(env: &Env, project_id: u64, caller: Address, holder: Address, amount: i128) {
    let topics = (symbol_short!("burned"), project_id);
    env.events().publish(
        topics,
        TokensBurned {
            caller,
            holder,
            amount,
        },
    );
}

pub fn emit_splits_set(env: &Env, project_id: u64, domain: u64, caller: Address) {
    env.events()
        .publish((symbol_short!("splits"), project_id), (domain, caller));
}

pub fn emit_migrated(env: &Env, project_id: u64, data: Migrated) {
    env.events()
        .publish((symbol_short!("migrated"), project_id), data);
}

pub fn emit_context_added(env: &Env, project_id: u64, token: Address, decimals: u32, currency: u32) {
    env.events().publish(
        (symbol_short!("ctx_add"), project_id),
        (token, decimals, currency),
    );
}

pub fn emit_owner_changed(env: &Env, project_id: u64, from: Address, to: Address) {
    env.events()
        .publish((symbol_short!("owner"), project_id), (from, to));
}

pub fn emit_terminals_set(env: &Env, project_id: u64, caller: Address) {
    env.events()
        .publish((symbol_short!("terms"), project_id), caller);
}

pub fn emit_credits_moved(env: &Env, project_id: u64, from: Address, to: Address, amount: i128) {
    env.events()
        .publish((symbol_short!("credits"), project_id), (from, to, amount));
}

pub fn emit_tokens_claimed(env: &Env, project_id: u64, holder: Address, amount: i128) {
    env.events()
        .publish((symbol_short!("claimed"), project_id), (holder, amount));
}

/// Topic: `(feed_set, pricing_currency, unit_currency)`.
pub fn emit_price_feed_set(env: &Env, pricing_currency: u32, unit_currency: u32, feed: Address) {
    env.events().publish(
        (symbol_short!("feed_set"), pricing_currency, unit_currency),
        feed,
    );
}

/// Topic: `(paused,)`.
pub fn emit_protocol_paused(env: &Env, caller: Address) {
    env.events().publish((symbol_short!("paused"),), caller);
}

pub fn emit_protocol_unpaused(env: &Env, caller: Address) {
    env.events().publish((symbol_short!("unpaused"),), caller);
}
