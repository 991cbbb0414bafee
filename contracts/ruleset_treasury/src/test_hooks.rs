#![cfg(test)]

use soroban_sdk::{testutils::Address as _, vec, Address, Bytes, Env, Vec};

use crate::constants::SPLITS_TOTAL_PERCENT;
use crate::test::{config, metadata, Fixture, DAY, E18, ETH, START, USD};
use crate::types::HookSpecification;
use crate::{ApprovalStatus, Error, HookVerdict, Split, SplitGroup, SplitGroupKey};

// ─── Mock hooks ──────────────────────────────────────────

mod approval {
    use soroban_sdk::{contract, contractimpl, symbol_short, Env};

    use crate::HookVerdict;

    /// Approval hook with a verdict the test sets directly.
    #[contract]
    pub struct MockApproval;

    #[contractimpl]
    impl MockApproval {
        pub fn set_verdict(env: Env, verdict: HookVerdict) {
            env.storage().instance().set(&symbol_short!("verdict"), &verdict);
        }

        pub fn approval_window(_env: Env) -> u64 {
            0
        }

        pub fn approval_status(env: Env, _project_id: u64, _ruleset_id: u64, _start: u64) -> HookVerdict {
            env.storage()
                .instance()
                .get(&symbol_short!("verdict"))
                .unwrap_or(HookVerdict::Approved)
        }
    }
}

mod data {
    use soroban_sdk::{contract, contractimpl, symbol_short, Env};

    use crate::types::{PayContext, PayHookProposal, RedeemContext, RedeemHookProposal};

    /// Data hook returning whatever proposals the test stored.
    #[contract]
    pub struct MockDataHook;

    #[contractimpl]
    impl MockDataHook {
        pub fn set_pay(env: Env, proposal: PayHookProposal) {
            env.storage().instance().set(&symbol_short!("pay"), &proposal);
        }

        pub fn set_redeem(env: Env, proposal: RedeemHookProposal) {
            env.storage().instance().set(&symbol_short!("redeem"), &proposal);
        }

        pub fn before_pay_recorded(env: Env, context: PayContext) -> PayHookProposal {
            env.storage()
                .instance()
                .get(&symbol_short!("pay"))
                .unwrap_or(PayHookProposal {
                    weight: context.weight,
                    specifications: soroban_sdk::Vec::new(&env),
                })
        }

        pub fn before_redeem_recorded(env: Env, context: RedeemContext) -> RedeemHookProposal {
            env.storage()
                .instance()
                .get(&symbol_short!("redeem"))
                .unwrap_or(RedeemHookProposal {
                    reclaim_amount: context.reclaim_amount,
                    specifications: soroban_sdk::Vec::new(&env),
                })
        }
    }
}

mod recorder {
    use soroban_sdk::{contract, contractimpl, symbol_short, Env};

    use crate::types::{AfterPayContext, AfterRedeemContext, SplitHookContext};

    /// Pay, redeem and split hook that counts calls and sums what it was told
    /// it received.
    #[contract]
    pub struct Recorder;

    fn record(env: &Env, amount: i128) {
        let storage = env.storage().instance();
        let calls: u32 = storage.get(&symbol_short!("calls")).unwrap_or(0);
        let total: i128 = storage.get(&symbol_short!("total")).unwrap_or(0);
        storage.set(&symbol_short!("calls"), &(calls + 1));
        storage.set(&symbol_short!("total"), &(total + amount));
    }

    #[contractimpl]
    impl Recorder {
        pub fn after_pay_recorded(env: Env, context: AfterPayContext) {
            record(&env, context.forwarded_amount.value);
        }

        pub fn after_redeem_recorded(env: Env, context: AfterRedeemContext) {
            record(&env, context.forwarded_amount.value);
        }

        pub fn process_split(env: Env, context: SplitHookContext) {
            record(&env, context.amount);
        }

        pub fn calls(env: Env) -> u32 {
            env.storage().instance().get(&symbol_short!("calls")).unwrap_or(0)
        }

        pub fn total(env: Env) -> i128 {
            env.storage().instance().get(&symbol_short!("total")).unwrap_or(0)
        }
    }
}

mod feed {
    use soroban_sdk::{contract, contractimpl, symbol_short, Env};

    /// Fixed price quoted with 18 decimals.
    #[contract]
    pub struct MockFeed;

    #[contractimpl]
    impl MockFeed {
        pub fn __constructor(env: Env, price: i128) {
            env.storage().instance().set(&symbol_short!("price"), &price);
        }

        pub fn current_unit_price(env: Env, _decimals: u32) -> i128 {
            env.storage().instance().get(&symbol_short!("price")).unwrap_or(0)
        }
    }
}

use approval::{MockApproval, MockApprovalClient};
use data::{MockDataHook, MockDataHookClient};
use feed::MockFeed;
use recorder::{Recorder, RecorderClient};

fn specification(env: &Env, hook: &Address, amount: i128) -> Vec<HookSpecification> {
    vec![
        env,
        HookSpecification {
            hook: hook.clone(),
            amount,
            metadata: Bytes::new(env),
        },
    ]
}

fn hook_split(hook: &Address, percent: u32) -> Split {
    Split {
        percent,
        project_id: 0,
        beneficiary: None,
        hook: Some(hook.clone()),
        locked_until: 0,
        prefer_claimed: false,
        prefer_add_to_balance: false,
    }
}

// ─── 1. Approval hooks ───────────────────────────────────

#[test]
fn test_unapproved_ruleset_rolls_the_current_one_over() {
    let f = Fixture::new();
    let hook = MockApprovalClient::new(&f.env, &f.env.register(MockApproval, ()));
    let mut c = config(&f.env, 7 * DAY, 100 * E18, metadata());
    c.approval_hook = Some(hook.address.clone());
    let project_id = f.launch(c);

    f.warp(DAY);
    hook.set_verdict(&HookVerdict::Pending);
    f.client.queue_rulesets(
        &f.owner,
        &project_id,
        &vec![&f.env, config(&f.env, 7 * DAY, 200 * E18, metadata())],
    );

    let (queued, status) = f.client.latest_queued_ruleset_of(&project_id).unwrap();
    assert_eq!(queued.start, START + 7 * DAY);
    assert_eq!(status, ApprovalStatus::Active);
    let upcoming = f.client.upcoming_ruleset_of(&project_id).unwrap();
    assert_eq!(upcoming.id, START);
    assert_eq!(upcoming.weight, 100 * E18);

    // Still pending at its start: the base keeps rolling.
    f.warp(6 * DAY);
    let (_, status) = f.client.latest_queued_ruleset_of(&project_id).unwrap();
    assert_eq!(status, ApprovalStatus::ApprovalExpired);
    let current = f.client.current_ruleset_of(&project_id).unwrap();
    assert_eq!(current.id, START);
    assert_eq!(current.cycle_number, 2);
    assert_eq!(current.weight, 100 * E18);

    hook.set_verdict(&HookVerdict::Rejected);
    let (_, status) = f.client.latest_queued_ruleset_of(&project_id).unwrap();
    assert_eq!(status, ApprovalStatus::Failed);
    assert_eq!(f.client.current_ruleset_of(&project_id).unwrap().id, START);

    hook.set_verdict(&HookVerdict::Approved);
    let current = f.client.current_ruleset_of(&project_id).unwrap();
    assert_eq!(current.id, queued.id);
    assert_eq!(current.weight, 200 * E18);
}

// ─── 2. Data hooks on payments ───────────────────────────

#[test]
fn test_pay_data_hook_overrides_weight_and_forwards() {
    let f = Fixture::new();
    let data_hook = MockDataHookClient::new(&f.env, &f.env.register(MockDataHook, ()));
    let recorder = RecorderClient::new(&f.env, &f.env.register(Recorder, ()));
    let mut m = metadata();
    m.data_hook = Some(data_hook.address.clone());
    m.use_data_hook_for_pay = true;
    let project_id = f.launch(config(&f.env, 0, 100 * E18, m));

    data_hook.set_pay(&crate::types::PayHookProposal {
        weight: 200 * E18,
        specifications: specification(&f.env, &recorder.address, E18 / 4),
    });

    let payer = Address::generate(&f.env);
    assert_eq!(f.pay(project_id, &payer, E18), 200 * E18);
    assert_eq!(f.client.balance_of(&project_id, &f.token.address), E18 * 3 / 4);
    assert_eq!(f.token.balance(&recorder.address), E18 / 4);
    assert_eq!(recorder.calls(), 1);
    assert_eq!(recorder.total(), E18 / 4);
}

#[test]
fn test_pay_forward_larger_than_payment_is_rejected() {
    let f = Fixture::new();
    let data_hook = MockDataHookClient::new(&f.env, &f.env.register(MockDataHook, ()));
    let mut m = metadata();
    m.data_hook = Some(data_hook.address.clone());
    m.use_data_hook_for_pay = true;
    let project_id = f.launch(config(&f.env, 0, 100 * E18, m));

    data_hook.set_pay(&crate::types::PayHookProposal {
        weight: 100 * E18,
        specifications: specification(&f.env, &data_hook.address, 2 * E18),
    });

    let payer = Address::generate(&f.env);
    f.minter.mint(&payer, &E18);
    let result = f.client.try_pay(
        &payer,
        &project_id,
        &f.token.address,
        &E18,
        &payer,
        &0,
        &false,
        &Bytes::new(&f.env),
    );
    assert_eq!(result, Err(Ok(Error::InvalidHookAmount)));
    assert_eq!(f.token.balance(&payer), E18);
}

#[test]
fn test_data_hook_may_mint_without_allow_minting() {
    let f = Fixture::new();
    let data_hook = MockDataHookClient::new(&f.env, &f.env.register(MockDataHook, ()));
    let mut m = metadata();
    m.data_hook = Some(data_hook.address.clone());
    let project_id = f.launch(config(&f.env, 0, E18, m));
    let alice = Address::generate(&f.env);

    assert_eq!(
        f.client.try_mint_tokens(&f.owner, &project_id, &10, &alice, &false),
        Err(Ok(Error::MintNotAllowed))
    );
    f.client.mint_tokens(&data_hook.address, &project_id, &10, &alice, &false);
    assert_eq!(f.client.token_balance_of(&project_id, &alice), 10);
}

// ─── 3. Data hooks on redemptions ────────────────────────

#[test]
fn test_redeem_override_pays_each_slice_once() {
    let f = Fixture::new();
    let data_hook = MockDataHookClient::new(&f.env, &f.env.register(MockDataHook, ()));
    let recorder = RecorderClient::new(&f.env, &f.env.register(Recorder, ()));
    let mut m = metadata();
    m.data_hook = Some(data_hook.address.clone());
    m.use_data_hook_for_redeem = true;
    let project_id = f.launch(config(&f.env, 0, 100 * E18, m));
    let holder = Address::generate(&f.env);
    let beneficiary = Address::generate(&f.env);
    f.pay(project_id, &holder, E18);

    data_hook.set_redeem(&crate::types::RedeemHookProposal {
        reclaim_amount: E18 * 3 / 10,
        specifications: specification(&f.env, &recorder.address, E18 / 5),
    });

    let reclaimed = f.client.redeem_tokens(
        &holder,
        &project_id,
        &f.token.address,
        &(10 * E18),
        &0,
        &beneficiary,
        &Bytes::new(&f.env),
    );
    assert_eq!(reclaimed, E18 * 3 / 10);
    assert_eq!(f.token.balance(&beneficiary), E18 * 3 / 10);
    assert_eq!(f.token.balance(&recorder.address), E18 / 5);
    assert_eq!(recorder.calls(), 1);
    assert_eq!(f.client.balance_of(&project_id, &f.token.address), E18 / 2);
    assert_eq!(f.client.token_balance_of(&project_id, &holder), 90 * E18);
}

#[test]
fn test_redeem_override_beyond_surplus_is_rejected() {
    let f = Fixture::new();
    let data_hook = MockDataHookClient::new(&f.env, &f.env.register(MockDataHook, ()));
    let mut m = metadata();
    m.data_hook = Some(data_hook.address.clone());
    m.use_data_hook_for_redeem = true;
    let project_id = f.launch(config(&f.env, 0, 100 * E18, m));
    let holder = Address::generate(&f.env);
    f.pay(project_id, &holder, E18);

    data_hook.set_redeem(&crate::types::RedeemHookProposal {
        reclaim_amount: E18 * 9 / 10,
        specifications: specification(&f.env, &data_hook.address, E18 / 5),
    });

    let result = f.client.try_redeem_tokens(
        &holder,
        &project_id,
        &f.token.address,
        &E18,
        &0,
        &holder,
        &Bytes::new(&f.env),
    );
    assert_eq!(result, Err(Ok(Error::HookOverrideExceedsSurplus)));
    assert_eq!(f.client.token_balance_of(&project_id, &holder), 100 * E18);
}

// ─── 4. Split hooks ──────────────────────────────────────

#[test]
fn test_payout_and_reserved_split_hooks_are_notified() {
    let f = Fixture::new();
    let recorder = RecorderClient::new(&f.env, &f.env.register(Recorder, ()));
    let mut m = metadata();
    m.reserved_rate = 5_000;
    let mut c = config(&f.env, 0, 100 * E18, m);
    c.fund_access_limits = vec![&f.env, f.limits(2 * E18, 0)];
    c.split_groups = vec![
        &f.env,
        f.payout_group(vec![&f.env, hook_split(&recorder.address, SPLITS_TOTAL_PERCENT / 2)]),
        SplitGroup {
            group: SplitGroupKey::ReservedTokens,
            splits: vec![&f.env, hook_split(&recorder.address, SPLITS_TOTAL_PERCENT)],
        },
    ];
    let project_id = f.launch(c);
    let payer = Address::generate(&f.env);
    f.pay(project_id, &payer, 2 * E18);

    f.client.send_payouts(&payer, &project_id, &f.token.address, &(2 * E18), &ETH, &0);
    assert_eq!(f.token.balance(&recorder.address), E18);
    assert_eq!(f.token.balance(&f.owner), E18);

    f.client.send_reserved_tokens(&payer, &project_id);
    assert_eq!(f.client.token_balance_of(&project_id, &recorder.address), 100 * E18);
    assert_eq!(recorder.calls(), 2);
    assert_eq!(recorder.total(), E18 + 100 * E18);
}

// ─── 5. Price feeds ──────────────────────────────────────

#[test]
fn test_payment_priced_through_inverse_feed() {
    let f = Fixture::new();
    let feed = f.env.register(MockFeed, (2_000 * E18,));
    f.client.set_price_feed(&f.super_admin, &USD, &ETH, &feed);

    let mut m = metadata();
    m.base_currency = USD;
    let mut c = config(&f.env, DAY, E18, m);
    c.fund_access_limits = vec![
        &f.env,
        crate::FundAccessLimits {
            token: f.token.address.clone(),
            payout_limit: crate::CurrencyAmount { amount: 1_000 * E18, currency: USD },
            surplus_allowance: crate::CurrencyAmount { amount: 0, currency: USD },
        },
    ];
    let project_id = f.launch(c);

    let payer = Address::generate(&f.env);
    assert_eq!(f.pay(project_id, &payer, E18), 2_000 * E18);
    assert_eq!(f.client.surplus_of(&project_id, &f.token.address), E18 / 2);

    f.client.send_payouts(&payer, &project_id, &f.token.address, &(500 * E18), &USD, &0);
    assert_eq!(f.token.balance(&f.owner), E18 / 4);
    assert_eq!(f.client.surplus_of(&project_id, &f.token.address), E18 / 2);
}

#[test]
fn test_price_feed_registration_rules() {
    let f = Fixture::new();
    let feed = f.env.register(MockFeed, (E18,));
    f.client.set_price_feed(&f.super_admin, &USD, &ETH, &feed);

    assert_eq!(
        f.client.try_set_price_feed(&f.super_admin, &ETH, &USD, &feed),
        Err(Ok(Error::PriceFeedExists))
    );
    assert_eq!(
        f.client.try_set_price_feed(&f.super_admin, &ETH, &ETH, &feed),
        Err(Ok(Error::InvalidConfiguration))
    );
    let stranger = Address::generate(&f.env);
    assert_eq!(
        f.client.try_set_price_feed(&stranger, &3, &ETH, &feed),
        Err(Ok(Error::Unauthorized))
    );
}

#[test]
fn test_missing_feed_blocks_payment() {
    let f = Fixture::new();
    let mut m = metadata();
    m.base_currency = USD;
    let project_id = f.launch(config(&f.env, 0, E18, m));
    let payer = Address::generate(&f.env);
    f.minter.mint(&payer, &E18);
    let result = f.client.try_pay(
        &payer,
        &project_id,
        &f.token.address,
        &E18,
        &payer,
        &0,
        &false,
        &Bytes::new(&f.env),
    );
    assert_eq!(result, Err(Ok(Error::PriceFeedNotFound)));
}
