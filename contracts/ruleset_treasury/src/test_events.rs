extern crate std;

use soroban_sdk::{
    symbol_short,
    testutils::{Address as _, Events},
    vec, Address, Bytes, Env, IntoVal, TryIntoVal, Val, Vec,
};

use crate::constants::SPLITS_TOTAL_PERCENT;
use crate::events::{
    Migrated, Paid, PayoutsSent, ProjectLaunched, Redeemed, ReservedSent, RulesetQueued,
    SplitPaid,
};
use crate::test::{config, metadata, split_to, Fixture, DAY, E18, ETH, START};
use crate::{SplitGroup, SplitGroupKey};

/// Data of the last event the treasury published under exactly `topics`.
fn last_event(env: &Env, contract: &Address, topics: Vec<Val>) -> Val {
    env.events()
        .all()
        .iter()
        .filter(|(from, event_topics, _)| from == contract && *event_topics == topics)
        .last()
        .map(|(_, _, data)| data)
        .expect("No matching event found")
}

#[test]
fn test_project_launched_event() {
    let f = Fixture::new();
    let project_id = f.launch(config(&f.env, 7 * DAY, 100 * E18, metadata()));

    let topics = vec![&f.env, symbol_short!("launched").into_val(&f.env), project_id.into_val(&f.env)];
    let event_data: ProjectLaunched = last_event(&f.env, &f.client.address, topics)
        .try_into_val(&f.env)
        .unwrap();
    assert_eq!(event_data, ProjectLaunched {
        project_id,
        owner: f.owner.clone(),
        ruleset_id: START,
    });

    let topics = vec![&f.env, symbol_short!("queued").into_val(&f.env), project_id.into_val(&f.env)];
    let event_data: RulesetQueued = last_event(&f.env, &f.client.address, topics)
        .try_into_val(&f.env)
        .unwrap();
    assert_eq!(event_data, RulesetQueued {
        ruleset_id: START,
        based_on_id: 0,
        cycle_number: 1,
        start: START,
        weight: 100 * E18,
    });
}

#[test]
fn test_paid_event() {
    let f = Fixture::new();
    let mut m = metadata();
    m.reserved_rate = 2_000;
    let project_id = f.launch(config(&f.env, 0, 100 * E18, m));
    let payer = Address::generate(&f.env);
    f.pay(project_id, &payer, E18);

    let topics = vec![&f.env, symbol_short!("paid").into_val(&f.env), project_id.into_val(&f.env)];
    let event_data: Paid = last_event(&f.env, &f.client.address, topics)
        .try_into_val(&f.env)
        .unwrap();
    assert_eq!(event_data, Paid {
        ruleset_id: START,
        cycle_number: 1,
        payer: payer.clone(),
        beneficiary: payer.clone(),
        token: f.token.address.clone(),
        amount: E18,
        token_count: 100 * E18,
        beneficiary_count: 80 * E18,
    });
}

#[test]
fn test_redeemed_event() {
    let f = Fixture::new();
    let project_id = f.launch(config(&f.env, 0, 100 * E18, metadata()));
    let holder = Address::generate(&f.env);
    let beneficiary = Address::generate(&f.env);
    f.pay(project_id, &holder, 2 * E18);

    f.client.redeem_tokens(
        &holder,
        &project_id,
        &f.token.address,
        &(50 * E18),
        &0,
        &beneficiary,
        &Bytes::new(&f.env),
    );

    let topics = vec![&f.env, symbol_short!("redeemed").into_val(&f.env), project_id.into_val(&f.env)];
    let event_data: Redeemed = last_event(&f.env, &f.client.address, topics)
        .try_into_val(&f.env)
        .unwrap();
    assert_eq!(event_data, Redeemed {
        ruleset_id: START,
        holder: holder.clone(),
        beneficiary: beneficiary.clone(),
        token: f.token.address.clone(),
        redeem_count: 50 * E18,
        reclaim_amount: E18 / 2,
    });
}

#[test]
fn test_payouts_event() {
    let f = Fixture::new();
    let mut c = config(&f.env, DAY, E18, metadata());
    c.fund_access_limits = vec![&f.env, f.limits(3 * E18, 0)];
    let project_id = f.launch(c);
    let payer = Address::generate(&f.env);
    f.pay(project_id, &payer, 5 * E18);

    f.client.send_payouts(&payer, &project_id, &f.token.address, &(2 * E18), &ETH, &0);

    let topics = vec![&f.env, symbol_short!("payouts").into_val(&f.env), project_id.into_val(&f.env)];
    let event_data: PayoutsSent = last_event(&f.env, &f.client.address, topics)
        .try_into_val(&f.env)
        .unwrap();
    assert_eq!(event_data, PayoutsSent {
        ruleset_id: START,
        cycle_number: 1,
        caller: payer.clone(),
        token: f.token.address.clone(),
        amount: 2 * E18,
        paid_out: 2 * E18,
        leftover: 2 * E18,
    });
}

#[test]
fn test_payout_reverted_event() {
    let f = Fixture::new();
    let mut paused = metadata();
    paused.pause_pay = true;
    let target = f.launch(config(&f.env, 0, E18, paused));

    let mut split = split_to(&f.owner, SPLITS_TOTAL_PERCENT / 2);
    split.project_id = target;
    let mut c = config(&f.env, DAY, E18, metadata());
    c.fund_access_limits = vec![&f.env, f.limits(2 * E18, 0)];
    c.split_groups = vec![&f.env, f.payout_group(vec![&f.env, split.clone()])];
    let source = f.launch(c);
    let payer = Address::generate(&f.env);
    f.pay(source, &payer, 2 * E18);

    f.client.send_payouts(&payer, &source, &f.token.address, &(2 * E18), &ETH, &0);

    let topics = vec![&f.env, symbol_short!("reverted").into_val(&f.env), source.into_val(&f.env)];
    let event_data: SplitPaid = last_event(&f.env, &f.client.address, topics)
        .try_into_val(&f.env)
        .unwrap();
    assert_eq!(event_data, SplitPaid {
        group: SplitGroupKey::Payouts(f.token.address.clone()),
        split,
        amount: E18,
    });
    assert_eq!(f.client.balance_of(&source, &f.token.address), E18);
}

#[test]
fn test_reserved_sent_event() {
    let f = Fixture::new();
    let alice = Address::generate(&f.env);
    let mut m = metadata();
    m.reserved_rate = 10_000;
    let mut c = config(&f.env, 0, 10 * E18, m);
    c.split_groups = vec![
        &f.env,
        SplitGroup {
            group: SplitGroupKey::ReservedTokens,
            splits: vec![&f.env, split_to(&alice, SPLITS_TOTAL_PERCENT / 10)],
        },
    ];
    let project_id = f.launch(c);
    let payer = Address::generate(&f.env);
    f.pay(project_id, &payer, E18);

    f.client.send_reserved_tokens(&payer, &project_id);

    let topics = vec![&f.env, symbol_short!("reserved").into_val(&f.env), project_id.into_val(&f.env)];
    let event_data: ReservedSent = last_event(&f.env, &f.client.address, topics)
        .try_into_val(&f.env)
        .unwrap();
    assert_eq!(event_data, ReservedSent {
        ruleset_id: START,
        caller: payer.clone(),
        owed: 10 * E18,
        leftover: 9 * E18,
    });
    assert_eq!(f.client.token_balance_of(&project_id, &alice), E18);
}

#[test]
fn test_protocol_paused_event() {
    let f = Fixture::new();
    f.client.pause(&f.super_admin);

    let topics = vec![&f.env, symbol_short!("paused").into_val(&f.env)];
    let event_data: Address = last_event(&f.env, &f.client.address, topics)
        .try_into_val(&f.env)
        .unwrap();
    assert_eq!(event_data, f.super_admin);
}

#[test]
fn test_controller_migrated_event() {
    let f = Fixture::new();
    let mut m = metadata();
    m.allow_controller_migration = true;
    let project_id = f.launch(config(&f.env, 0, E18, m));
    let next = Address::generate(&f.env);

    f.client.migrate_controller(&f.owner, &project_id, &next);

    let topics = vec![&f.env, symbol_short!("migrated").into_val(&f.env), project_id.into_val(&f.env)];
    let event_data: Migrated = last_event(&f.env, &f.client.address, topics)
        .try_into_val(&f.env)
        .unwrap();
    assert_eq!(event_data, Migrated {
        kind: symbol_short!("control"),
        to: next,
        token: None,
        amount: 0,
    });
}
