//! # Controller
//!
//! Project configuration and project-token supply: launching, queueing
//! rulesets, splits, minting, burning, reserved-token distribution and
//! controller migration.
//!
//! Every function here assumes the caller's signature was already checked by
//! the entry point; permission checks happen here.

use soroban_sdk::{symbol_short, vec, Address, Env, Vec};

use crate::constants::WEIGHT_DECIMALS;
use crate::directory;
use crate::events::{self, Migrated, ReservedSent, RulesetQueued, TokensMinted};
use crate::hooks::SplitHookClient;
use crate::issuance;
use crate::ledger;
use crate::projects;
use crate::rbac::{self, Permission};
use crate::rulesets::{self, RulesetData};
use crate::splits::{self, Destination};
use crate::tokens;
use crate::types::{AccountingContext, RulesetConfig, Split, SplitGroup, SplitGroupKey, SplitHookContext};
use crate::Error;

// ─────────────────────────────────────────────────────────
// Launching and queueing
// ─────────────────────────────────────────────────────────

/// Register a project owned by `owner`, make this contract its controller and
/// only terminal, register its accounting contexts and queue its rulesets.
///
/// Returns `(project_id, id of the last queued ruleset)`.
pub fn launch_project(
    env: &Env,
    owner: &Address,
    configs: &Vec<RulesetConfig>,
    contexts: &Vec<AccountingContext>,
) -> Result<(u64, u64), Error> {
    let project = projects::create(env, owner);
    let this = env.current_contract_address();
    directory::set_controller_of(env, project.id, &this);
    directory::set_terminals_of(env, project.id, &vec![env, this])?;

    for context in contexts.iter() {
        ledger::add_accounting_context(env, project.id, &context)?;
        events::emit_context_added(env, project.id, context.token, context.decimals, context.currency);
    }

    let ruleset_id = queue_all(env, project.id, configs)?;
    events::emit_project_launched(env, project.id, owner.clone(), ruleset_id);
    Ok((project.id, ruleset_id))
}

/// Queue the first rulesets of a project that has none yet.
pub fn launch_rulesets(
    env: &Env,
    caller: &Address,
    project_id: u64,
    configs: &Vec<RulesetConfig>,
) -> Result<u64, Error> {
    rbac::require_owner_permission(env, project_id, caller, Permission::QueueRulesets)?;
    directory::require_controller(env, project_id)?;
    if rulesets::latest_queued_of(env, project_id)?.is_some() {
        return Err(Error::RulesetsAlreadyLaunched);
    }
    queue_all(env, project_id, configs)
}

pub fn queue_rulesets(
    env: &Env,
    caller: &Address,
    project_id: u64,
    configs: &Vec<RulesetConfig>,
) -> Result<u64, Error> {
    rbac::require_owner_permission(env, project_id, caller, Permission::QueueRulesets)?;
    directory::require_controller(env, project_id)?;
    queue_all(env, project_id, configs)
}

fn queue_all(env: &Env, project_id: u64, configs: &Vec<RulesetConfig>) -> Result<u64, Error> {
    if configs.is_empty() {
        return Err(Error::InvalidConfiguration);
    }

    let mut last_id = 0;
    for config in configs.iter() {
        let data = RulesetData {
            duration: config.duration,
            weight: config.weight,
            decay_rate: config.decay_rate,
            approval_hook: config.approval_hook.clone(),
        };
        let ruleset = rulesets::configure_for(
            env,
            project_id,
            &data,
            &config.metadata,
            config.must_start_at_or_after,
        )?;
        splits::set_splits_of(env, project_id, ruleset.id, &config.split_groups)?;
        ledger::set_fund_access_limits(env, project_id, ruleset.id, &config.fund_access_limits)?;

        events::emit_ruleset_queued(
            env,
            project_id,
            RulesetQueued {
                ruleset_id: ruleset.id,
                based_on_id: ruleset.based_on_id,
                cycle_number: ruleset.cycle_number,
                start: ruleset.start,
                weight: ruleset.weight,
            },
        );
        last_id = ruleset.id;
    }
    Ok(last_id)
}

/// Replace split groups of `domain` (a ruleset id, or `0` for the default).
pub fn set_splits(
    env: &Env,
    caller: &Address,
    project_id: u64,
    domain: u64,
    groups: &Vec<SplitGroup>,
) -> Result<(), Error> {
    rbac::require_owner_permission(env, project_id, caller, Permission::SetSplits)?;
    directory::require_controller(env, project_id)?;
    splits::set_splits_of(env, project_id, domain, groups)?;
    events::emit_splits_set(env, project_id, domain, caller.clone());
    Ok(())
}

// ─────────────────────────────────────────────────────────
// Supply
// ─────────────────────────────────────────────────────────

/// Mint `token_count` project tokens outside of a payment.
///
/// The ruleset's data hook may always mint. The owner and its operators need
/// `allow_minting`. Nobody can mint while `pause_mint` is set.
pub fn mint_tokens_of(
    env: &Env,
    caller: &Address,
    project_id: u64,
    token_count: i128,
    beneficiary: &Address,
    use_reserved_rate: bool,
) -> Result<i128, Error> {
    directory::require_controller(env, project_id)?;
    if token_count <= 0 {
        return Err(Error::InvalidAmount);
    }
    let ruleset = rulesets::current_of(env, project_id)?.ok_or(Error::NoActiveRuleset)?;
    if ruleset.metadata.pause_mint {
        return Err(Error::MintNotAllowed);
    }
    if ruleset.metadata.data_hook.as_ref() != Some(caller) {
        rbac::require_owner_permission(env, project_id, caller, Permission::MintTokens)?;
        if !ruleset.metadata.allow_minting {
            return Err(Error::MintNotAllowed);
        }
    }

    let reserved_rate = if use_reserved_rate {
        ruleset.metadata.reserved_rate
    } else {
        0
    };
    let beneficiary_count =
        issuance::mint_for(env, project_id, token_count, beneficiary, reserved_rate, false)?;

    events::emit_tokens_minted(
        env,
        project_id,
        TokensMinted {
            caller: caller.clone(),
            beneficiary: beneficiary.clone(),
            token_count,
            beneficiary_count,
        },
    );
    Ok(beneficiary_count)
}

/// Burn `amount` of `holder`'s tokens on behalf of `caller`.
pub fn burn_tokens_of(
    env: &Env,
    caller: &Address,
    holder: &Address,
    project_id: u64,
    amount: i128,
) -> Result<(), Error> {
    directory::require_controller(env, project_id)?;
    rbac::require_permission(env, holder, project_id, caller, Permission::BurnTokens)?;
    if let Some(ruleset) = rulesets::current_of(env, project_id)? {
        if ruleset.metadata.pause_burn {
            return Err(Error::BurnPaused);
        }
    }
    issuance::burn_from(env, project_id, holder, amount)?;
    events::emit_tokens_burned(env, project_id, caller.clone(), holder.clone(), amount);
    Ok(())
}

/// Move `holder`'s unclaimed credits to `to`.
pub fn transfer_credits(
    env: &Env,
    caller: &Address,
    holder: &Address,
    project_id: u64,
    to: &Address,
    amount: i128,
) -> Result<(), Error> {
    projects::load(env, project_id)?;
    rbac::require_permission(env, holder, project_id, caller, Permission::TransferCredits)?;
    if let Some(ruleset) = rulesets::current_of(env, project_id)? {
        if ruleset.metadata.pause_transfers {
            return Err(Error::TransfersPaused);
        }
    }
    tokens::transfer_credits(env, project_id, holder, to, amount)?;
    events::emit_credits_moved(env, project_id, holder.clone(), to.clone(), amount);
    Ok(())
}

pub fn claim_tokens(env: &Env, holder: &Address, project_id: u64, amount: i128) -> Result<(), Error> {
    projects::load(env, project_id)?;
    tokens::claim(env, project_id, holder, amount)?;
    events::emit_tokens_claimed(env, project_id, holder.clone(), amount);
    Ok(())
}

// ─────────────────────────────────────────────────────────
// Reserved tokens
// ─────────────────────────────────────────────────────────

/// Mint every reserved token owed and fan it out over the reserved split
/// group. Anyone may trigger it; `caller` is the fallback recipient.
pub fn send_reserved_tokens(env: &Env, caller: &Address, project_id: u64) -> Result<i128, Error> {
    directory::require_controller(env, project_id)?;
    distribute_reserved(env, caller, project_id)
}

fn distribute_reserved(env: &Env, caller: &Address, project_id: u64) -> Result<i128, Error> {
    let owner = projects::owner_of(env, project_id)?;
    let (ruleset_id, reserved_rate) = match rulesets::current_of(env, project_id)? {
        Some(ruleset) => (ruleset.id, ruleset.metadata.reserved_rate),
        None => (0, 0),
    };

    let owed = issuance::settle_reserved(env, project_id, reserved_rate)?;
    if owed == 0 {
        return Ok(0);
    }

    let group = SplitGroupKey::ReservedTokens;
    let splits = splits::splits_of(env, project_id, ruleset_id, &group);
    let (shares, leftover) = splits::allocate(env, owed, &splits)?;

    let mut notify: Vec<(Address, i128, Split)> = Vec::new(env);
    for (split, share) in splits.iter().zip(shares.iter()) {
        if share == 0 {
            continue;
        }
        let recipient = match splits::destination_of(&split) {
            Destination::Hook(hook) => {
                notify.push_back((hook.clone(), share, split.clone()));
                hook
            }
            Destination::Project(target) => projects::owner_of(env, target)?,
            Destination::Beneficiary(beneficiary) => beneficiary,
            Destination::Caller => caller.clone(),
        };
        tokens::mint(env, project_id, &recipient, share, split.prefer_claimed)?;
        events::emit_split_paid(env, project_id, group.clone(), split, share);
    }
    if leftover > 0 {
        tokens::mint(env, project_id, &owner, leftover, false)?;
    }

    events::emit_reserved_sent(
        env,
        project_id,
        ReservedSent {
            ruleset_id,
            caller: caller.clone(),
            owed,
            leftover,
        },
    );

    for (hook, share, split) in notify.iter() {
        SplitHookClient::new(env, &hook).process_split(&SplitHookContext {
            token: None,
            amount: share,
            decimals: WEIGHT_DECIMALS,
            project_id,
            group: group.clone(),
            split,
        });
    }

    Ok(owed)
}

// ─────────────────────────────────────────────────────────
// Migration
// ─────────────────────────────────────────────────────────

/// Hand the project over to another controller. Outstanding reserved tokens
/// are distributed first.
pub fn migrate_controller(
    env: &Env,
    caller: &Address,
    project_id: u64,
    to: &Address,
) -> Result<(), Error> {
    directory::require_controller(env, project_id)?;
    rbac::require_owner_permission(env, project_id, caller, Permission::MigrateController)?;
    if *to == env.current_contract_address() {
        return Err(Error::ControllerAlreadyCurrent);
    }
    let ruleset = rulesets::current_of(env, project_id)?.ok_or(Error::NoActiveRuleset)?;
    if !ruleset.metadata.allow_controller_migration {
        return Err(Error::MigrationNotAllowed);
    }

    directory::set_controller_of(env, project_id, to);
    events::emit_migrated(
        env,
        project_id,
        Migrated {
            kind: symbol_short!("control"),
            to: to.clone(),
            token: None,
            amount: 0,
        },
    );

    if issuance::pending_reserved_of(env, project_id, ruleset.metadata.reserved_rate)? > 0 {
        distribute_reserved(env, caller, project_id)?;
    }
    Ok(())
}

/// Take control of a project back from its current external controller,
/// which must be `caller`.
pub fn prep_for_migration(env: &Env, caller: &Address, project_id: u64) -> Result<(), Error> {
    let this = env.current_contract_address();
    let current = directory::controller_of(env, project_id).ok_or(Error::ProjectNotFound)?;
    if current == this {
        return Err(Error::ControllerAlreadyCurrent);
    }
    if current != *caller {
        return Err(Error::Unauthorized);
    }

    issuance::reset_tracker(env, project_id)?;
    directory::set_controller_of(env, project_id, &this);
    events::emit_migrated(
        env,
        project_id,
        Migrated {
            kind: symbol_short!("control"),
            to: this,
            token: None,
            amount: 0,
        },
    );
    Ok(())
}
