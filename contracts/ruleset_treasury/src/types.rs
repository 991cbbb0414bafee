//! # Types
//!
//! Shared data structures used across all modules of the treasury protocol.
//!
//! ## Design decisions
//!
//! ### Rulesets are immutable records
//!
//! A [`Ruleset`] is written once by the ruleset store and never mutated. The
//! "current" ruleset returned to callers may be a *rolled-forward view* of a
//! stored record: same `id`, `based_on_id` and metadata, but with `start`,
//! `cycle_number` and `weight` advanced by whole durations.
//!
//! ```text
//! Queued ──► Approved ──► Current ──► Expired
//!    └──► Rejected (never activates, prior ruleset rolls over)
//! ```
//!
//! ### Metadata is an explicit struct
//!
//! Pause flags, rates and hook references are named fields of
//! [`RulesetMetadata`]. Nothing in the logical model depends on a packed
//! layout.
//!
//! ### Hooks are addresses
//!
//! Approval, data, pay, redeem and split hooks are other contracts. They are
//! referenced by `Address` and invoked through the clients in `hooks`.

use soroban_sdk::{contracttype, Address, Bytes, Vec};

// ─────────────────────────────────────────────────────────
// Projects
// ─────────────────────────────────────────────────────────

/// A registered project.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Project {
    /// Sequential identifier, starting at 1.
    pub id: u64,
    /// Receives payout leftovers and reserved-token leftovers.
    pub owner: Address,
    /// Ledger timestamp of registration.
    pub created_at: u64,
}

// ─────────────────────────────────────────────────────────
// Rulesets
// ─────────────────────────────────────────────────────────

/// Per-ruleset switches and rates.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RulesetMetadata {
    /// Share of newly issued tokens withheld for reserved splits, out of `MAX_RESERVED_RATE`.
    pub reserved_rate: u32,
    /// Bonding-curve parameter for redemptions, out of `MAX_REDEMPTION_RATE`.
    pub redemption_rate: u32,
    /// Currency the weight is denominated in.
    pub base_currency: u32,
    pub pause_pay: bool,
    pub pause_redeem: bool,
    pub pause_payouts: bool,
    pub pause_mint: bool,
    pub pause_burn: bool,
    pub pause_transfers: bool,
    /// Lets the owner (and operators) mint tokens on demand.
    pub allow_minting: bool,
    pub allow_terminal_migration: bool,
    pub allow_controller_migration: bool,
    pub use_data_hook_for_pay: bool,
    pub use_data_hook_for_redeem: bool,
    pub data_hook: Option<Address>,
}

/// A stored (or rolled-forward) ruleset.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Ruleset {
    pub project_id: u64,
    /// Timestamp the ruleset was queued at; unique per project.
    pub id: u64,
    /// Id of the ruleset this one was derived from, `0` for the first.
    pub based_on_id: u64,
    pub cycle_number: u32,
    pub start: u64,
    /// Seconds; `0` never rolls over.
    pub duration: u64,
    /// Tokens issued per whole unit paid in, 18 decimals.
    pub weight: i128,
    /// Weight decay applied per rolled cycle, out of `MAX_DECAY_RATE`.
    pub decay_rate: u32,
    /// Gate that must approve the *next* ruleset queued on top of this one.
    pub approval_hook: Option<Address>,
    pub metadata: RulesetMetadata,
}

impl Ruleset {
    /// Exclusive end of this ruleset's window, `None` when it never ends.
    pub fn end(&self) -> Option<u64> {
        if self.duration == 0 {
            None
        } else {
            Some(self.start.saturating_add(self.duration))
        }
    }

    /// True once `now` is past the end of the window.
    pub fn has_expired_at(&self, now: u64) -> bool {
        match self.end() {
            Some(end) => now >= end,
            None => false,
        }
    }
}

/// Input to `launch_project` / `queue_rulesets`.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RulesetConfig {
    pub must_start_at_or_after: u64,
    pub duration: u64,
    pub weight: i128,
    pub decay_rate: u32,
    pub approval_hook: Option<Address>,
    pub metadata: RulesetMetadata,
    pub split_groups: Vec<SplitGroup>,
    pub fund_access_limits: Vec<FundAccessLimits>,
}

/// Approval state of a queued ruleset as seen by the store.
#[contracttype]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ApprovalStatus {
    /// No hook governs the ruleset; implicitly approved.
    Empty,
    /// The governing hook approved it.
    Approved,
    /// Decision still pending and the ruleset has not started yet.
    Active,
    /// Decision still pending although the ruleset's start has passed.
    ApprovalExpired,
    /// The governing hook rejected it.
    Failed,
}

impl ApprovalStatus {
    pub fn is_approved(&self) -> bool {
        matches!(self, ApprovalStatus::Empty | ApprovalStatus::Approved)
    }
}

/// What an approval hook answers for a ruleset.
#[contracttype]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum HookVerdict {
    Approved,
    Pending,
    Rejected,
}

// ─────────────────────────────────────────────────────────
// Accounting
// ─────────────────────────────────────────────────────────

/// Decimals and currency a terminal accounts a token in.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AccountingContext {
    pub token: Address,
    pub decimals: u32,
    pub currency: u32,
}

/// An amount tagged with the currency it is denominated in.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CurrencyAmount {
    pub amount: i128,
    pub currency: u32,
}

/// Payout limit and surplus allowance of one token for one ruleset.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FundAccessLimits {
    pub token: Address,
    pub payout_limit: CurrencyAmount,
    pub surplus_allowance: CurrencyAmount,
}

/// A token amount with the context needed to interpret it.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TokenAmount {
    pub token: Address,
    pub value: i128,
    pub decimals: u32,
    pub currency: u32,
}

// ─────────────────────────────────────────────────────────
// Splits
// ─────────────────────────────────────────────────────────

/// A weighted recipient.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Split {
    /// Out of `SPLITS_TOTAL_PERCENT`.
    pub percent: u32,
    /// Route to this project (`0` for none).
    pub project_id: u64,
    pub beneficiary: Option<Address>,
    /// Takes precedence over every other destination.
    pub hook: Option<Address>,
    /// The split cannot be removed or changed before this timestamp.
    pub locked_until: u64,
    /// Reserved tokens are minted as claimed tokens instead of credits.
    pub prefer_claimed: bool,
    /// Payouts routed to a project are added to its balance without issuance.
    pub prefer_add_to_balance: bool,
}

/// Which pot a split group divides.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SplitGroupKey {
    ReservedTokens,
    Payouts(Address),
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SplitGroup {
    pub group: SplitGroupKey,
    pub splits: Vec<Split>,
}

// ─────────────────────────────────────────────────────────
// Hook payloads
// ─────────────────────────────────────────────────────────

/// A slice of a payment or redemption forwarded to a hook.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct HookSpecification {
    pub hook: Address,
    pub amount: i128,
    pub metadata: Bytes,
}

/// What the pay data hook sees before a payment is recorded.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PayContext {
    pub payer: Address,
    pub project_id: u64,
    pub ruleset_id: u64,
    pub amount: TokenAmount,
    pub beneficiary: Address,
    pub weight: i128,
    pub reserved_rate: u32,
    pub metadata: Bytes,
}

/// The pay data hook's proposal. Untrusted: validated before use.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PayHookProposal {
    pub weight: i128,
    pub specifications: Vec<HookSpecification>,
}

/// What a pay hook receives after the payment is recorded.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AfterPayContext {
    pub payer: Address,
    pub project_id: u64,
    pub ruleset_id: u64,
    pub forwarded_amount: TokenAmount,
    pub weight: i128,
    pub token_count: i128,
    pub beneficiary: Address,
    pub hook_metadata: Bytes,
    pub pay_metadata: Bytes,
}

/// What the redeem data hook sees before a redemption is recorded.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RedeemContext {
    pub holder: Address,
    pub project_id: u64,
    pub ruleset_id: u64,
    pub redeem_count: i128,
    pub total_supply: i128,
    pub surplus: TokenAmount,
    pub reclaim_amount: i128,
    pub redemption_rate: u32,
    pub metadata: Bytes,
}

/// The redeem data hook's proposal. Untrusted: validated before use.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RedeemHookProposal {
    pub reclaim_amount: i128,
    pub specifications: Vec<HookSpecification>,
}

/// What a redeem hook receives after the redemption is recorded.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AfterRedeemContext {
    pub holder: Address,
    pub project_id: u64,
    pub ruleset_id: u64,
    pub redeem_count: i128,
    pub reclaimed_amount: i128,
    pub forwarded_amount: TokenAmount,
    pub redemption_rate: u32,
    pub beneficiary: Address,
    pub hook_metadata: Bytes,
    pub redeem_metadata: Bytes,
}

/// What a split hook receives along with its share.
///
/// `token` is `None` when the share is project tokens (reserved group).
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SplitHookContext {
    pub token: Option<Address>,
    pub amount: i128,
    pub decimals: u32,
    pub project_id: u64,
    pub group: SplitGroupKey,
    pub split: Split,
}
