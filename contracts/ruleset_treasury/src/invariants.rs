#![allow(dead_code)]

extern crate std;

use soroban_sdk::{Address, Vec};

use crate::{Ruleset, RulesetTreasuryClient};

/// Total supply equals the sum of every holder's claimed and unclaimed
/// balance. `holders` must list everyone who ever held tokens.
pub fn assert_supply_matches_holders(
    client: &RulesetTreasuryClient,
    project_id: u64,
    holders: &[Address],
) {
    let held: i128 = holders
        .iter()
        .map(|holder| client.token_balance_of(&project_id, holder))
        .sum();
    assert_eq!(
        client.total_supply_of(&project_id),
        held,
        "supply of project {} does not match its holders",
        project_id
    );
}

/// Nothing is owed to reserved splits and the tracker sits at supply.
pub fn assert_tracker_settled(client: &RulesetTreasuryClient, project_id: u64) {
    assert_eq!(client.pending_reserved_tokens_of(&project_id), 0);
    assert_eq!(
        client.processed_tracker_of(&project_id),
        client.total_supply_of(&project_id),
        "tracker of project {} out of step with supply",
        project_id
    );
}

/// The contract holds at least what its ledger says projects own.
pub fn assert_holdings_cover_balances(held: i128, project_balances: &[i128]) {
    let owed: i128 = project_balances.iter().sum();
    assert!(
        held >= owed,
        "contract holds {} but projects are owed {}",
        held,
        owed
    );
}

/// History as returned by `rulesets_of`: newest first, each linked to the
/// next by `based_on_id`, with ids and starts moving forward in time.
pub fn assert_ruleset_chain(history: &Vec<Ruleset>) {
    for i in 1..history.len() {
        let newer = history.get(i - 1).unwrap();
        let older = history.get(i).unwrap();
        assert_eq!(newer.based_on_id, older.id);
        assert!(newer.id > older.id, "ruleset ids must increase");
        assert!(newer.start >= older.start, "ruleset {} starts too early", newer.id);
        assert!(newer.cycle_number > older.cycle_number);
    }
}

/// Shares plus leftover account for exactly `total`, none negative.
pub fn assert_conserved(total: i128, shares: &Vec<i128>, leftover: i128) {
    assert!(leftover >= 0, "negative leftover {}", leftover);
    let mut sum = leftover;
    for share in shares.iter() {
        assert!(share >= 0, "negative share {}", share);
        sum += share;
    }
    assert_eq!(sum, total, "allocation created or lost value");
}

/// A redemption never reclaims more than the surplus it was priced against.
pub fn assert_reclaim_within_surplus(reclaimed: i128, surplus: i128) {
    assert!(
        (0..=surplus).contains(&reclaimed),
        "reclaimed {} outside surplus {}",
        reclaimed,
        surplus
    );
}
