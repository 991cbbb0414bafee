//! # Hooks
//!
//! Interfaces of the external contracts the protocol calls into. Each trait
//! generates a typed client; the protocol only ever holds hook `Address`es
//! (stored on rulesets, splits and price-feed entries) and invokes them
//! through these clients.
//!
//! | Trait              | Stored on                      | Called from            |
//! |--------------------|--------------------------------|------------------------|
//! | `ApprovalHook`     | `Ruleset::approval_hook`       | ruleset store          |
//! | `DataHook`         | `RulesetMetadata::data_hook`   | pay / redeem recording |
//! | `PayHook`          | data hook proposal             | after a payment        |
//! | `RedeemHook`       | data hook proposal             | after a redemption     |
//! | `SplitHook`        | `Split::hook`                  | payouts / reserved     |
//! | `PriceFeed`        | price-feed registry            | currency conversion    |
//! | `MigrationTerminal`| directory terminals            | balance migration      |
//!
//! Everything a hook returns is a proposal. Callers validate it against the
//! relevant cap before any of it is applied, and every ledger mutation of a
//! step is written before the hook is invoked.

use soroban_sdk::{contractclient, Address, Env};

use crate::types::{
    AfterPayContext, AfterRedeemContext, HookVerdict, PayContext, PayHookProposal,
    RedeemContext, RedeemHookProposal, SplitHookContext,
};

/// Gate for the ruleset queued on top of the ruleset that names it.
#[contractclient(name = "ApprovalHookClient")]
pub trait ApprovalHook {
    /// Minimum seconds between queueing a ruleset and its start.
    fn approval_window(env: Env) -> u64;

    fn approval_status(env: Env, project_id: u64, ruleset_id: u64, start: u64) -> HookVerdict;
}

#[contractclient(name = "DataHookClient")]
pub trait DataHook {
    fn before_pay_recorded(env: Env, context: PayContext) -> PayHookProposal;

    fn before_redeem_recorded(env: Env, context: RedeemContext) -> RedeemHookProposal;
}

#[contractclient(name = "PayHookClient")]
pub trait PayHook {
    fn after_pay_recorded(env: Env, context: AfterPayContext);
}

#[contractclient(name = "RedeemHookClient")]
pub trait RedeemHook {
    fn after_redeem_recorded(env: Env, context: AfterRedeemContext);
}

/// Receives a split's share. Tokens (or project tokens) are already credited
/// to the hook when this is called.
#[contractclient(name = "SplitHookClient")]
pub trait SplitHook {
    fn process_split(env: Env, context: SplitHookContext);
}

/// Price of one unit of the feed's unit currency in its pricing currency,
/// with `decimals` decimals.
#[contractclient(name = "PriceFeedClient")]
pub trait PriceFeed {
    fn current_unit_price(env: Env, decimals: u32) -> i128;
}

/// A terminal that can take over a project's balance.
#[contractclient(name = "MigrationTerminalClient")]
pub trait MigrationTerminal {
    fn accept_migration(env: Env, from: Address, project_id: u64, token: Address, amount: i128);
}
