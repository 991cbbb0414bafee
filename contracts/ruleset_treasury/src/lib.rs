//! # Ruleset Treasury
//!
//! A project-funding protocol on Soroban. Projects queue time-boxed
//! **rulesets** that govern how payments are accepted, how many project tokens
//! they issue, how much of the treasury may be paid out and at what rate token
//! holders may redeem against the surplus.
//!
//! | Phase          | Entry Point(s)                                                  |
//! |----------------|-----------------------------------------------------------------|
//! | Bootstrap      | [`RulesetTreasury::init`]                                       |
//! | Role admin     | `grant_role`, `revoke_role`, `transfer_super_admin`             |
//! | Protocol admin | `pause`, `unpause`, `set_price_feed`                            |
//! | Configuration  | `launch_project`, `launch_rulesets`, `queue_rulesets`, `set_splits`, `set_terminals`, `set_permissions`, `transfer_ownership`, `add_accounting_contexts` |
//! | Treasury       | `pay`, `add_to_balance`, `redeem_tokens`, `send_payouts`, `use_allowance` |
//! | Supply         | `mint_tokens`, `burn_tokens`, `send_reserved_tokens`, `transfer_credits`, `claim_tokens` |
//! | Migration      | `migrate_controller`, `prep_for_migration`, `migrate_balance`, `accept_migration` |
//!
//! ## Architecture
//!
//! ```text
//!  lib.rs ──► controller ──► rulesets ─► math
//!         │              ├─► issuance ─► tokens
//!         │              └─► splits
//!         └─► terminal  ──► ledger ────► prices, redemption
//! ```
//!
//! Authorization is delegated to [`rbac`], storage access to `storage`. This
//! file contains **only** the public entry points.
//!
//! Every entry point returns `Result`; an `Err` rolls back every write made
//! during the invocation, so no operation is ever partially applied.

#![no_std]

use soroban_sdk::{contract, contracterror, contractimpl, Address, Bytes, Env, Vec};

pub mod constants;
mod controller;
mod directory;
pub mod events;
pub mod hooks;
mod issuance;
mod ledger;
pub mod math;
mod prices;
mod projects;
pub mod rbac;
mod redemption;
mod rulesets;
mod splits;
mod storage;
mod terminal;
mod tokens;
pub mod types;

#[cfg(test)]
mod invariants;
#[cfg(test)]
mod test_events;
#[cfg(test)]
mod test_hooks;

pub use rbac::{Permission, Role};
pub use types::{
    AccountingContext, ApprovalStatus, CurrencyAmount, FundAccessLimits, HookVerdict, Project,
    Ruleset, RulesetConfig, RulesetMetadata, Split, SplitGroup, SplitGroupKey,
};

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum Error {
    ProjectNotFound = 1,
    Unauthorized = 2,
    AlreadyInitialized = 3,
    ProtocolPaused = 4,
    NotInitialized = 5,
    RulesetNotFound = 6,

    InvalidConfiguration = 10,
    PercentOverflow = 11,
    InvalidSplitPercent = 12,
    LockedSplitsNotIncluded = 13,
    InvalidAmount = 14,
    AccountingContextExists = 15,
    InvalidDecimals = 16,
    InvalidHookAmount = 17,
    InvalidTerminal = 18,
    InvalidPrice = 19,

    ExceedsLimit = 30,
    InsufficientBalance = 31,
    InsufficientTokens = 32,
    HookOverrideExceedsSurplus = 33,
    BelowMinimumReturned = 34,

    NoActiveRuleset = 50,
    RulesetsAlreadyLaunched = 51,
    PayPaused = 52,
    RedeemPaused = 53,
    PayoutsPaused = 54,
    MintNotAllowed = 55,
    BurnPaused = 56,
    TransfersPaused = 57,
    MigrationNotAllowed = 58,
    ControllerAlreadyCurrent = 59,
    NotController = 60,
    TokenNotAccepted = 61,
    CurrencyMismatch = 62,
    PriceFeedNotFound = 63,
    PriceFeedExists = 64,

    Overflow = 70,
}

#[contract]
pub struct RulesetTreasury;

#[contractimpl]
impl RulesetTreasury {
    // ─────────────────────────────────────────────────────────
    // Initialisation
    // ─────────────────────────────────────────────────────────

    /// Initialise the contract and set the first SuperAdmin.
    ///
    /// Must be called exactly once immediately after deployment.
    pub fn init(env: Env, super_admin: Address) -> Result<(), Error> {
        super_admin.require_auth();
        rbac::init_super_admin(&env, &super_admin)
    }

    // ─────────────────────────────────────────────────────────
    // Role management
    // ─────────────────────────────────────────────────────────

    /// Grant `role` to `target`. Only `SuperAdmin` can grant `SuperAdmin`.
    pub fn grant_role(env: Env, caller: Address, target: Address, role: Role) -> Result<(), Error> {
        caller.require_auth();
        rbac::grant_role(&env, &caller, &target, role)
    }

    /// Revoke any role from `target`. Cannot remove the SuperAdmin.
    pub fn revoke_role(env: Env, caller: Address, target: Address) -> Result<(), Error> {
        caller.require_auth();
        rbac::revoke_role(&env, &caller, &target)
    }

    /// Transfer SuperAdmin to `new_super_admin`.
    pub fn transfer_super_admin(
        env: Env,
        current_super_admin: Address,
        new_super_admin: Address,
    ) -> Result<(), Error> {
        current_super_admin.require_auth();
        rbac::transfer_super_admin(&env, &current_super_admin, &new_super_admin)
    }

    pub fn role_of(env: Env, address: Address) -> Option<Role> {
        rbac::role_of(&env, address)
    }

    pub fn has_role(env: Env, address: Address, role: Role) -> bool {
        rbac::has_role(&env, address, role)
    }

    // ─────────────────────────────────────────────────────────
    // Protocol administration
    // ─────────────────────────────────────────────────────────

    /// Pause the protocol, halting every state-changing project operation.
    pub fn pause(env: Env, caller: Address) -> Result<(), Error> {
        caller.require_auth();
        rbac::require_admin_or_above(&env, &caller)?;
        storage::set_paused(&env, true);
        events::emit_protocol_paused(&env, caller);
        Ok(())
    }

    pub fn unpause(env: Env, caller: Address) -> Result<(), Error> {
        caller.require_auth();
        rbac::require_admin_or_above(&env, &caller)?;
        storage::set_paused(&env, false);
        events::emit_protocol_unpaused(&env, caller);
        Ok(())
    }

    pub fn is_paused(env: Env) -> bool {
        storage::is_paused(&env)
    }

    /// Register the feed quoting one `unit_currency` in `pricing_currency`.
    pub fn set_price_feed(
        env: Env,
        caller: Address,
        pricing_currency: u32,
        unit_currency: u32,
        feed: Address,
    ) -> Result<(), Error> {
        caller.require_auth();
        rbac::require_admin_or_above(&env, &caller)?;
        prices::add_price_feed(&env, pricing_currency, unit_currency, &feed)?;
        events::emit_price_feed_set(&env, pricing_currency, unit_currency, feed);
        Ok(())
    }

    // ─────────────────────────────────────────────────────────
    // Project configuration
    // ─────────────────────────────────────────────────────────

    /// Register a project, its accounting contexts and its first rulesets.
    /// Returns the new project id.
    pub fn launch_project(
        env: Env,
        owner: Address,
        configs: Vec<RulesetConfig>,
        contexts: Vec<AccountingContext>,
    ) -> Result<u64, Error> {
        Self::require_not_paused(&env)?;
        owner.require_auth();
        let (project_id, _) = controller::launch_project(&env, &owner, &configs, &contexts)?;
        Ok(project_id)
    }

    /// Queue the first rulesets of a project that has none.
    pub fn launch_rulesets(
        env: Env,
        caller: Address,
        project_id: u64,
        configs: Vec<RulesetConfig>,
    ) -> Result<u64, Error> {
        Self::require_not_paused(&env)?;
        caller.require_auth();
        controller::launch_rulesets(&env, &caller, project_id, &configs)
    }

    /// Queue rulesets. Returns the id of the last one queued.
    pub fn queue_rulesets(
        env: Env,
        caller: Address,
        project_id: u64,
        configs: Vec<RulesetConfig>,
    ) -> Result<u64, Error> {
        Self::require_not_paused(&env)?;
        caller.require_auth();
        controller::queue_rulesets(&env, &caller, project_id, &configs)
    }

    pub fn set_splits(
        env: Env,
        caller: Address,
        project_id: u64,
        domain: u64,
        groups: Vec<SplitGroup>,
    ) -> Result<(), Error> {
        Self::require_not_paused(&env)?;
        caller.require_auth();
        controller::set_splits(&env, &caller, project_id, domain, &groups)
    }

    /// Replace what `account` lets `operator` do in `project_id`.
    pub fn set_permissions(
        env: Env,
        account: Address,
        project_id: u64,
        operator: Address,
        permissions: Vec<Permission>,
    ) -> Result<u32, Error> {
        account.require_auth();
        projects::load(&env, project_id)?;
        Ok(rbac::set_permissions(
            &env,
            &account,
            project_id,
            &operator,
            &permissions,
        ))
    }

    pub fn set_terminals(
        env: Env,
        caller: Address,
        project_id: u64,
        terminals: Vec<Address>,
    ) -> Result<(), Error> {
        Self::require_not_paused(&env)?;
        caller.require_auth();
        rbac::require_owner_permission(&env, project_id, &caller, Permission::SetTerminals)?;
        directory::set_terminals_of(&env, project_id, &terminals)?;
        events::emit_terminals_set(&env, project_id, caller);
        Ok(())
    }

    pub fn transfer_ownership(
        env: Env,
        owner: Address,
        project_id: u64,
        new_owner: Address,
    ) -> Result<(), Error> {
        owner.require_auth();
        projects::transfer_ownership(&env, &owner, project_id, &new_owner)?;
        events::emit_owner_changed(&env, project_id, owner, new_owner);
        Ok(())
    }

    pub fn add_accounting_contexts(
        env: Env,
        caller: Address,
        project_id: u64,
        contexts: Vec<AccountingContext>,
    ) -> Result<(), Error> {
        Self::require_not_paused(&env)?;
        caller.require_auth();
        rbac::require_owner_permission(
            &env,
            project_id,
            &caller,
            Permission::AddAccountingContexts,
        )?;
        directory::require_terminal(&env, project_id)?;
        for context in contexts.iter() {
            ledger::add_accounting_context(&env, project_id, &context)?;
            events::emit_context_added(
                &env,
                project_id,
                context.token,
                context.decimals,
                context.currency,
            );
        }
        Ok(())
    }

    // ─────────────────────────────────────────────────────────
    // Treasury
    // ─────────────────────────────────────────────────────────

    /// Pay into a project. Returns the beneficiary's project-token count.
    #[allow(clippy::too_many_arguments)]
    pub fn pay(
        env: Env,
        payer: Address,
        project_id: u64,
        token: Address,
        amount: i128,
        beneficiary: Address,
        min_returned_tokens: i128,
        prefer_claimed: bool,
        metadata: Bytes,
    ) -> Result<i128, Error> {
        Self::require_not_paused(&env)?;
        payer.require_auth();
        terminal::pay(
            &env,
            &payer,
            project_id,
            &token,
            amount,
            &beneficiary,
            min_returned_tokens,
            prefer_claimed,
            &metadata,
        )
    }

    pub fn add_to_balance(
        env: Env,
        caller: Address,
        project_id: u64,
        token: Address,
        amount: i128,
    ) -> Result<(), Error> {
        Self::require_not_paused(&env)?;
        caller.require_auth();
        terminal::add_to_balance(&env, &caller, project_id, &token, amount)
    }

    /// Redeem project tokens against the surplus. Returns the reclaimed amount.
    #[allow(clippy::too_many_arguments)]
    pub fn redeem_tokens(
        env: Env,
        holder: Address,
        project_id: u64,
        token: Address,
        redeem_count: i128,
        min_reclaimed: i128,
        beneficiary: Address,
        metadata: Bytes,
    ) -> Result<i128, Error> {
        Self::require_not_paused(&env)?;
        holder.require_auth();
        terminal::redeem_tokens(
            &env,
            &holder,
            project_id,
            &token,
            redeem_count,
            min_reclaimed,
            &beneficiary,
            &metadata,
        )
    }

    /// Distribute payouts within the cycle's limit. Returns the owner's leftover.
    pub fn send_payouts(
        env: Env,
        caller: Address,
        project_id: u64,
        token: Address,
        amount: i128,
        currency: u32,
        min_paid_out: i128,
    ) -> Result<i128, Error> {
        Self::require_not_paused(&env)?;
        caller.require_auth();
        terminal::send_payouts(
            &env,
            &caller,
            project_id,
            &token,
            amount,
            currency,
            min_paid_out,
        )
    }

    #[allow(clippy::too_many_arguments)]
    pub fn use_allowance(
        env: Env,
        caller: Address,
        project_id: u64,
        token: Address,
        amount: i128,
        currency: u32,
        min_withdrawn: i128,
        beneficiary: Address,
    ) -> Result<i128, Error> {
        Self::require_not_paused(&env)?;
        caller.require_auth();
        terminal::use_allowance(
            &env,
            &caller,
            project_id,
            &token,
            amount,
            currency,
            min_withdrawn,
            &beneficiary,
        )
    }

    // ─────────────────────────────────────────────────────────
    // Supply
    // ─────────────────────────────────────────────────────────

    /// Distribute owed reserved tokens. Returns how many were minted.
    pub fn send_reserved_tokens(env: Env, caller: Address, project_id: u64) -> Result<i128, Error> {
        Self::require_not_paused(&env)?;
        caller.require_auth();
        controller::send_reserved_tokens(&env, &caller, project_id)
    }

    pub fn mint_tokens(
        env: Env,
        caller: Address,
        project_id: u64,
        token_count: i128,
        beneficiary: Address,
        use_reserved_rate: bool,
    ) -> Result<i128, Error> {
        Self::require_not_paused(&env)?;
        caller.require_auth();
        controller::mint_tokens_of(
            &env,
            &caller,
            project_id,
            token_count,
            &beneficiary,
            use_reserved_rate,
        )
    }

    pub fn burn_tokens(
        env: Env,
        caller: Address,
        holder: Address,
        project_id: u64,
        amount: i128,
    ) -> Result<(), Error> {
        Self::require_not_paused(&env)?;
        caller.require_auth();
        controller::burn_tokens_of(&env, &caller, &holder, project_id, amount)
    }

    pub fn transfer_credits(
        env: Env,
        caller: Address,
        holder: Address,
        project_id: u64,
        to: Address,
        amount: i128,
    ) -> Result<(), Error> {
        Self::require_not_paused(&env)?;
        caller.require_auth();
        controller::transfer_credits(&env, &caller, &holder, project_id, &to, amount)
    }

    pub fn claim_tokens(env: Env, holder: Address, project_id: u64, amount: i128) -> Result<(), Error> {
        Self::require_not_paused(&env)?;
        holder.require_auth();
        controller::claim_tokens(&env, &holder, project_id, amount)
    }

    // ─────────────────────────────────────────────────────────
    // Migration
    // ─────────────────────────────────────────────────────────

    pub fn migrate_controller(
        env: Env,
        caller: Address,
        project_id: u64,
        to: Address,
    ) -> Result<(), Error> {
        Self::require_not_paused(&env)?;
        caller.require_auth();
        controller::migrate_controller(&env, &caller, project_id, &to)
    }

    /// Called by a project's external controller to hand control back here.
    pub fn prep_for_migration(env: Env, caller: Address, project_id: u64) -> Result<(), Error> {
        caller.require_auth();
        controller::prep_for_migration(&env, &caller, project_id)
    }

    pub fn migrate_balance(
        env: Env,
        caller: Address,
        project_id: u64,
        token: Address,
        to: Address,
    ) -> Result<i128, Error> {
        Self::require_not_paused(&env)?;
        caller.require_auth();
        terminal::migrate_balance(&env, &caller, project_id, &token, &to)
    }

    /// Called by another terminal of the project after sending it `amount`.
    pub fn accept_migration(
        env: Env,
        from: Address,
        project_id: u64,
        token: Address,
        amount: i128,
    ) -> Result<(), Error> {
        from.require_auth();
        terminal::accept_migration(&env, &from, project_id, &token, amount)
    }

    // ─────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────

    pub fn project_count(env: Env) -> u64 {
        storage::project_count(&env)
    }

    pub fn owner_of(env: Env, project_id: u64) -> Result<Address, Error> {
        projects::owner_of(&env, project_id)
    }

    pub fn controller_of(env: Env, project_id: u64) -> Option<Address> {
        directory::controller_of(&env, project_id)
    }

    pub fn terminals_of(env: Env, project_id: u64) -> Vec<Address> {
        directory::terminals_of(&env, project_id)
    }

    pub fn current_ruleset_of(env: Env, project_id: u64) -> Result<Option<Ruleset>, Error> {
        rulesets::current_of(&env, project_id)
    }

    pub fn upcoming_ruleset_of(env: Env, project_id: u64) -> Result<Option<Ruleset>, Error> {
        rulesets::upcoming_of(&env, project_id)
    }

    pub fn latest_queued_ruleset_of(
        env: Env,
        project_id: u64,
    ) -> Result<Option<(Ruleset, ApprovalStatus)>, Error> {
        rulesets::latest_queued_of(&env, project_id)
    }

    pub fn ruleset_of(env: Env, project_id: u64, ruleset_id: u64) -> Result<Ruleset, Error> {
        rulesets::get(&env, project_id, ruleset_id)
    }

    /// Most recent rulesets first, following `based_on_id`.
    pub fn rulesets_of(env: Env, project_id: u64, max: u32) -> Vec<Ruleset> {
        rulesets::history_of(&env, project_id, max)
    }

    pub fn accounting_context_of(
        env: Env,
        project_id: u64,
        token: Address,
    ) -> Result<AccountingContext, Error> {
        ledger::accounting_context_of(&env, project_id, &token)
    }

    pub fn accounting_contexts_of(env: Env, project_id: u64) -> Vec<AccountingContext> {
        ledger::accounting_contexts_of(&env, project_id)
    }

    pub fn balance_of(env: Env, project_id: u64, token: Address) -> i128 {
        ledger::balance_of(&env, project_id, &token)
    }

    pub fn surplus_of(env: Env, project_id: u64, token: Address) -> Result<i128, Error> {
        ledger::surplus_of(&env, project_id, &token)
    }

    pub fn payout_limit_of(
        env: Env,
        project_id: u64,
        ruleset_id: u64,
        token: Address,
    ) -> Option<CurrencyAmount> {
        ledger::payout_limit_of(&env, project_id, ruleset_id, &token)
    }

    pub fn surplus_allowance_of(
        env: Env,
        project_id: u64,
        ruleset_id: u64,
        token: Address,
    ) -> Option<CurrencyAmount> {
        ledger::surplus_allowance_of(&env, project_id, ruleset_id, &token)
    }

    pub fn used_payouts_of(env: Env, project_id: u64, token: Address, cycle_number: u32) -> i128 {
        ledger::used_payouts_of(&env, project_id, &token, cycle_number)
    }

    pub fn used_allowance_of(env: Env, project_id: u64, token: Address, ruleset_id: u64) -> i128 {
        ledger::used_allowance_of(&env, project_id, &token, ruleset_id)
    }

    /// What redeeming `redeem_count` tokens would reclaim right now, before
    /// any data hook override.
    pub fn reclaimable_surplus_of(
        env: Env,
        project_id: u64,
        token: Address,
        redeem_count: i128,
    ) -> Result<i128, Error> {
        let ruleset = rulesets::current_of(&env, project_id)?.ok_or(Error::NoActiveRuleset)?;
        let total_supply =
            issuance::total_outstanding_of(&env, project_id, ruleset.metadata.reserved_rate)?;
        let context = ledger::accounting_context_of(&env, project_id, &token)?;
        let surplus = ledger::surplus_during(&env, project_id, &ruleset, &context)?;
        redemption::reclaim_amount_for(
            &env,
            redeem_count,
            total_supply,
            surplus,
            ruleset.metadata.redemption_rate,
        )
    }

    pub fn token_balance_of(env: Env, project_id: u64, holder: Address) -> Result<i128, Error> {
        tokens::balance_of(&env, project_id, &holder)
    }

    pub fn credit_balance_of(env: Env, project_id: u64, holder: Address) -> i128 {
        tokens::credit_balance_of(&env, project_id, &holder)
    }

    pub fn total_supply_of(env: Env, project_id: u64) -> Result<i128, Error> {
        tokens::total_supply_of(&env, project_id)
    }

    /// Supply plus reserved tokens owed under the current reserved rate.
    pub fn total_outstanding_supply_of(env: Env, project_id: u64) -> Result<i128, Error> {
        let rate = Self::current_reserved_rate(&env, project_id)?;
        issuance::total_outstanding_of(&env, project_id, rate)
    }

    pub fn pending_reserved_tokens_of(env: Env, project_id: u64) -> Result<i128, Error> {
        let rate = Self::current_reserved_rate(&env, project_id)?;
        issuance::pending_reserved_of(&env, project_id, rate)
    }

    pub fn processed_tracker_of(env: Env, project_id: u64) -> i128 {
        storage::get_tracker(&env, project_id)
    }

    pub fn splits_of(env: Env, project_id: u64, domain: u64, group: SplitGroupKey) -> Vec<Split> {
        splits::splits_of(&env, project_id, domain, &group)
    }

    pub fn has_permission(
        env: Env,
        account: Address,
        project_id: u64,
        operator: Address,
        permission: Permission,
    ) -> bool {
        rbac::has_permission(&env, &account, project_id, &operator, permission)
    }

    // ─────────────────────────────────────────────────────────
    // Internal Helpers
    // ─────────────────────────────────────────────────────────

    fn require_not_paused(env: &Env) -> Result<(), Error> {
        if storage::is_paused(env) {
            return Err(Error::ProtocolPaused);
        }
        Ok(())
    }

    fn current_reserved_rate(env: &Env, project_id: u64) -> Result<u32, Error> {
        Ok(rulesets::current_of(env, project_id)?
            .map(|ruleset| ruleset.metadata.reserved_rate)
            .unwrap_or(0))
    }
}
