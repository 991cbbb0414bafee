#![cfg(test)]

use super::*;
use soroban_sdk::testutils::{Address as _, Ledger};
use soroban_sdk::{vec, Address, Vec};

use ruleset_treasury::{
    AccountingContext, ApprovalStatus, RulesetConfig, RulesetMetadata, RulesetTreasury,
    RulesetTreasuryClient,
};

const DAY: u64 = 86_400;

fn setup(duration: u64) -> (Env, DeadlineHookClient<'static>) {
    let env = Env::default();
    let id = env.register(DeadlineHook, (duration,));
    let client = DeadlineHookClient::new(&env, &id);
    (env, client)
}

#[test]
fn window_is_the_configured_duration() {
    let (_env, hook) = setup(3 * DAY);
    assert_eq!(hook.approval_window(), 3 * DAY);
}

#[test]
fn queued_after_start_is_rejected() {
    let (_env, hook) = setup(DAY);
    assert_eq!(hook.approval_status(&1, &500, &400), HookVerdict::Rejected);
}

#[test]
fn short_notice_is_rejected() {
    let (_env, hook) = setup(DAY);
    assert_eq!(hook.approval_status(&1, &1_000, &(1_000 + DAY - 1)), HookVerdict::Rejected);
}

#[test]
fn pending_until_the_deadline_then_approved() {
    let (env, hook) = setup(DAY);
    let start = 10 * DAY;
    env.ledger().set_timestamp(DAY);
    assert_eq!(hook.approval_status(&1, &DAY, &start), HookVerdict::Pending);

    env.ledger().set_timestamp(start - DAY);
    assert_eq!(hook.approval_status(&1, &DAY, &start), HookVerdict::Approved);
}

// ── Gating a treasury timeline ──────────────────────────────────────

fn metadata() -> RulesetMetadata {
    RulesetMetadata {
        reserved_rate: 0,
        redemption_rate: 10_000,
        base_currency: 1,
        pause_pay: false,
        pause_redeem: false,
        pause_payouts: false,
        pause_mint: false,
        pause_burn: false,
        pause_transfers: false,
        allow_minting: false,
        allow_terminal_migration: false,
        allow_controller_migration: false,
        use_data_hook_for_pay: false,
        use_data_hook_for_redeem: false,
        data_hook: None,
    }
}

fn config(env: &Env, duration: u64, weight: i128, hook: Option<Address>) -> RulesetConfig {
    RulesetConfig {
        must_start_at_or_after: 0,
        duration,
        weight,
        decay_rate: 0,
        approval_hook: hook,
        metadata: metadata(),
        split_groups: Vec::new(env),
        fund_access_limits: Vec::new(env),
    }
}

#[test]
fn reconfiguration_waits_for_the_notice_period() {
    let env = Env::default();
    env.mock_all_auths();
    env.ledger().set_timestamp(1_000);

    let hook = env.register(DeadlineHook, (3 * DAY,));
    let treasury = RulesetTreasuryClient::new(&env, &env.register(RulesetTreasury, ()));
    let owner = Address::generate(&env);

    let project_id = treasury.launch_project(
        &owner,
        &vec![&env, config(&env, 7 * DAY, 100, Some(hook.clone()))],
        &Vec::<AccountingContext>::new(&env),
    );

    // Queued 5 days in: 5 + 3 days of notice lands after the first boundary,
    // so the new ruleset starts on the second one.
    env.ledger().set_timestamp(1_000 + 5 * DAY);
    treasury.queue_rulesets(&owner, &project_id, &vec![&env, config(&env, 7 * DAY, 200, None)]);

    let (queued, status) = treasury.latest_queued_ruleset_of(&project_id).unwrap();
    assert_eq!(queued.start, 1_000 + 14 * DAY);
    assert_eq!(status, ApprovalStatus::Active);

    env.ledger().set_timestamp(1_000 + 8 * DAY);
    let current = treasury.current_ruleset_of(&project_id).unwrap();
    assert_eq!(current.weight, 100);
    assert_eq!(current.cycle_number, 2);

    env.ledger().set_timestamp(1_000 + 14 * DAY);
    let current = treasury.current_ruleset_of(&project_id).unwrap();
    assert_eq!(current.weight, 200);
    assert_eq!(current.cycle_number, 3);
}
