//! # Terminal
//!
//! Token movements in and out of project treasuries.
//!
//! Each operation follows the same order:
//!
//! 1. pull tokens in (payments, balance additions and accepted migrations);
//! 2. record everything in the ledger, the tracker and the token ledger;
//! 3. emit the event;
//! 4. push tokens out and notify hooks.
//!
//! Hooks and split recipients therefore always observe fully updated state.

use soroban_sdk::auth::{ContractContext, InvokerContractAuthEntry, SubContractInvocation};
use soroban_sdk::{symbol_short, token, vec, Address, Bytes, Env, IntoVal, Vec};

use crate::directory;
use crate::events::{self, AllowanceUsed, Migrated, Paid, PayoutsSent, Redeemed};
use crate::hooks::{MigrationTerminalClient, PayHookClient, RedeemHookClient, SplitHookClient};
use crate::issuance;
use crate::ledger::{self, PaymentRecord};
use crate::projects;
use crate::rbac::{self, Permission};
use crate::rulesets;
use crate::splits::{self, Destination};
use crate::types::{
    AccountingContext, AfterPayContext, AfterRedeemContext, Split, SplitGroupKey,
    SplitHookContext, TokenAmount,
};
use crate::Error;

fn send(env: &Env, token: &Address, to: &Address, amount: i128) {
    if amount > 0 {
        token::Client::new(env, token).transfer(&env.current_contract_address(), to, &amount);
    }
}

fn pull(env: &Env, token: &Address, from: &Address, amount: i128) {
    if amount > 0 {
        token::Client::new(env, token).transfer(from, &env.current_contract_address(), &amount);
    }
}

fn token_amount(context: &AccountingContext, value: i128) -> TokenAmount {
    TokenAmount {
        token: context.token.clone(),
        value,
        decimals: context.decimals,
        currency: context.currency,
    }
}

// ─────────────────────────────────────────────────────────
// Inflows
// ─────────────────────────────────────────────────────────

/// Pay `amount` of `token` into the project and mint project tokens to
/// `beneficiary`. Returns the beneficiary's token count.
#[allow(clippy::too_many_arguments)]
pub fn pay(
    env: &Env,
    payer: &Address,
    project_id: u64,
    token: &Address,
    amount: i128,
    beneficiary: &Address,
    min_returned_tokens: i128,
    prefer_claimed: bool,
    metadata: &Bytes,
) -> Result<i128, Error> {
    projects::load(env, project_id)?;
    directory::require_terminal(env, project_id)?;
    if amount < 0 {
        return Err(Error::InvalidAmount);
    }
    let context = ledger::accounting_context_of(env, project_id, token)?;

    pull(env, token, payer, amount);
    let (record, beneficiary_count) = record_pay(
        env,
        payer,
        project_id,
        &context,
        amount,
        beneficiary,
        prefer_claimed,
        metadata,
    )?;
    if beneficiary_count < min_returned_tokens {
        return Err(Error::BelowMinimumReturned);
    }

    notify_pay_hooks(
        env,
        payer,
        project_id,
        &context,
        &record,
        beneficiary,
        metadata,
    );
    Ok(beneficiary_count)
}

/// Ledger, issuance and event of a payment whose tokens are already held.
#[allow(clippy::too_many_arguments)]
fn record_pay(
    env: &Env,
    payer: &Address,
    project_id: u64,
    context: &AccountingContext,
    amount: i128,
    beneficiary: &Address,
    prefer_claimed: bool,
    metadata: &Bytes,
) -> Result<(PaymentRecord, i128), Error> {
    let record = ledger::record_payment(
        env,
        payer,
        project_id,
        &token_amount(context, amount),
        beneficiary,
        metadata,
    )?;

    let beneficiary_count = if record.token_count > 0 {
        directory::require_controller(env, project_id)?;
        issuance::mint_for(
            env,
            project_id,
            record.token_count,
            beneficiary,
            record.ruleset.metadata.reserved_rate,
            prefer_claimed,
        )?
    } else {
        0
    };

    events::emit_paid(
        env,
        project_id,
        Paid {
            ruleset_id: record.ruleset.id,
            cycle_number: record.ruleset.cycle_number,
            payer: payer.clone(),
            beneficiary: beneficiary.clone(),
            token: context.token.clone(),
            amount,
            token_count: record.token_count,
            beneficiary_count,
        },
    );
    Ok((record, beneficiary_count))
}

fn notify_pay_hooks(
    env: &Env,
    payer: &Address,
    project_id: u64,
    context: &AccountingContext,
    record: &PaymentRecord,
    beneficiary: &Address,
    metadata: &Bytes,
) {
    for specification in record.specifications.iter() {
        send(env, &context.token, &specification.hook, specification.amount);
        PayHookClient::new(env, &specification.hook).after_pay_recorded(&AfterPayContext {
            payer: payer.clone(),
            project_id,
            ruleset_id: record.ruleset.id,
            forwarded_amount: token_amount(context, specification.amount),
            weight: record.weight,
            token_count: record.token_count,
            beneficiary: beneficiary.clone(),
            hook_metadata: specification.metadata.clone(),
            pay_metadata: metadata.clone(),
        });
    }
}

/// Add funds to the project's balance without issuing tokens.
pub fn add_to_balance(
    env: &Env,
    caller: &Address,
    project_id: u64,
    token: &Address,
    amount: i128,
) -> Result<(), Error> {
    projects::load(env, project_id)?;
    directory::require_terminal(env, project_id)?;
    if amount <= 0 {
        return Err(Error::InvalidAmount);
    }
    ledger::accounting_context_of(env, project_id, token)?;

    pull(env, token, caller, amount);
    ledger::record_incoming(env, project_id, token, amount)?;
    events::emit_balance_added(env, project_id, caller.clone(), token.clone(), amount);
    Ok(())
}

// ─────────────────────────────────────────────────────────
// Outflows
// ─────────────────────────────────────────────────────────

/// Burn `redeem_count` of `holder`'s tokens and send the reclaimed share of
/// surplus to `beneficiary`. Returns the reclaimed amount.
#[allow(clippy::too_many_arguments)]
pub fn redeem_tokens(
    env: &Env,
    holder: &Address,
    project_id: u64,
    token: &Address,
    redeem_count: i128,
    min_reclaimed: i128,
    beneficiary: &Address,
    metadata: &Bytes,
) -> Result<i128, Error> {
    projects::load(env, project_id)?;
    directory::require_terminal(env, project_id)?;
    directory::require_controller(env, project_id)?;
    if redeem_count < 0 {
        return Err(Error::InvalidAmount);
    }
    let context = ledger::accounting_context_of(env, project_id, token)?;

    let record = ledger::record_redemption(env, holder, project_id, token, redeem_count, metadata)?;
    if record.reclaim_amount < min_reclaimed {
        return Err(Error::BelowMinimumReturned);
    }
    if redeem_count > 0 {
        issuance::burn_from(env, project_id, holder, redeem_count)?;
    }

    events::emit_redeemed(
        env,
        project_id,
        Redeemed {
            ruleset_id: record.ruleset.id,
            holder: holder.clone(),
            beneficiary: beneficiary.clone(),
            token: token.clone(),
            redeem_count,
            reclaim_amount: record.reclaim_amount,
        },
    );

    send(env, token, beneficiary, record.reclaim_amount);
    for specification in record.specifications.iter() {
        send(env, token, &specification.hook, specification.amount);
        RedeemHookClient::new(env, &specification.hook).after_redeem_recorded(
            &AfterRedeemContext {
                holder: holder.clone(),
                project_id,
                ruleset_id: record.ruleset.id,
                redeem_count,
                reclaimed_amount: record.reclaim_amount,
                forwarded_amount: token_amount(&context, specification.amount),
                redemption_rate: record.ruleset.metadata.redemption_rate,
                beneficiary: beneficiary.clone(),
                hook_metadata: specification.metadata.clone(),
                redeem_metadata: metadata.clone(),
            },
        );
    }

    Ok(record.reclaim_amount)
}

/// Pay out up to the cycle's payout limit across the payout split group of
/// `token`. Anyone may trigger it. Returns the leftover sent to the owner.
#[allow(clippy::too_many_arguments)]
pub fn send_payouts(
    env: &Env,
    caller: &Address,
    project_id: u64,
    token: &Address,
    amount: i128,
    currency: u32,
    min_paid_out: i128,
) -> Result<i128, Error> {
    let owner = projects::owner_of(env, project_id)?;
    directory::require_terminal(env, project_id)?;
    let context = ledger::accounting_context_of(env, project_id, token)?;

    let (ruleset, paid_out) = ledger::record_payouts(env, project_id, token, amount, currency)?;
    if paid_out < min_paid_out {
        return Err(Error::BelowMinimumReturned);
    }

    let group = SplitGroupKey::Payouts(token.clone());
    let splits = splits::splits_of(env, project_id, ruleset.id, &group);
    let (shares, leftover) = splits::allocate(env, paid_out, &splits)?;

    // Internal routes first: project-to-project payments are ledger effects.
    let mut external: Vec<(Split, i128)> = Vec::new(env);
    let mut hooks_paid: Vec<(Address, i128, Split)> = Vec::new(env);
    for (split, share) in splits.iter().zip(shares.iter()) {
        if share == 0 {
            continue;
        }
        match splits::destination_of(&split) {
            Destination::Project(target) => {
                if !accepts_split_payment(env, target, token, &split) {
                    ledger::record_incoming(env, project_id, token, share)?;
                    events::emit_payout_reverted(env, project_id, group.clone(), split, share);
                    continue;
                }
                pay_project(env, caller, target, &context, &split, share)?;
            }
            Destination::Hook(hook) => hooks_paid.push_back((hook, share, split.clone())),
            _ => external.push_back((split.clone(), share)),
        }
        events::emit_split_paid(env, project_id, group.clone(), split, share);
    }

    events::emit_payouts_sent(
        env,
        project_id,
        PayoutsSent {
            ruleset_id: ruleset.id,
            cycle_number: ruleset.cycle_number,
            caller: caller.clone(),
            token: token.clone(),
            amount,
            paid_out,
            leftover,
        },
    );

    for (split, share) in external.iter() {
        let recipient = match splits::destination_of(&split) {
            Destination::Beneficiary(beneficiary) => beneficiary,
            _ => caller.clone(),
        };
        send(env, token, &recipient, share);
    }
    for (hook, share, split) in hooks_paid.iter() {
        send(env, token, &hook, share);
        SplitHookClient::new(env, &hook).process_split(&SplitHookContext {
            token: Some(token.clone()),
            amount: share,
            decimals: context.decimals,
            project_id,
            group: group.clone(),
            split,
        });
    }
    send(env, token, &owner, leftover);

    Ok(leftover)
}

/// Whether `target` can take a payout split right now. The target's owner
/// controls every condition checked here, so a failing one must not block
/// the paying project.
fn accepts_split_payment(env: &Env, target: u64, token: &Address, split: &Split) -> bool {
    if projects::load(env, target).is_err()
        || directory::require_terminal(env, target).is_err()
        || ledger::accounting_context_of(env, target, token).is_err()
    {
        return false;
    }
    if split.prefer_add_to_balance {
        return true;
    }
    match rulesets::current_of(env, target) {
        Ok(Some(ruleset)) if !ruleset.metadata.pause_pay => {
            ruleset.weight == 0 || directory::require_controller(env, target).is_ok()
        }
        _ => false,
    }
}

/// Route a payout split to another project served by this terminal.
fn pay_project(
    env: &Env,
    caller: &Address,
    target: u64,
    context: &AccountingContext,
    split: &Split,
    share: i128,
) -> Result<(), Error> {
    projects::load(env, target)?;
    directory::require_terminal(env, target)?;
    let target_context = ledger::accounting_context_of(env, target, &context.token)?;

    if split.prefer_add_to_balance {
        ledger::record_incoming(env, target, &context.token, share)?;
        events::emit_balance_added(
            env,
            target,
            env.current_contract_address(),
            context.token.clone(),
            share,
        );
        return Ok(());
    }

    let beneficiary = split.beneficiary.clone().unwrap_or_else(|| caller.clone());
    let (record, _) = record_pay(
        env,
        &env.current_contract_address(),
        target,
        &target_context,
        share,
        &beneficiary,
        split.prefer_claimed,
        &Bytes::new(env),
    )?;
    notify_pay_hooks(
        env,
        &env.current_contract_address(),
        target,
        &target_context,
        &record,
        &beneficiary,
        &Bytes::new(env),
    );
    Ok(())
}

/// Withdraw from surplus against the ruleset's surplus allowance.
#[allow(clippy::too_many_arguments)]
pub fn use_allowance(
    env: &Env,
    caller: &Address,
    project_id: u64,
    token: &Address,
    amount: i128,
    currency: u32,
    min_withdrawn: i128,
    beneficiary: &Address,
) -> Result<i128, Error> {
    rbac::require_owner_permission(env, project_id, caller, Permission::UseAllowance)?;
    directory::require_terminal(env, project_id)?;

    let (ruleset, withdrawn) =
        ledger::record_allowance_use(env, project_id, token, amount, currency)?;
    if withdrawn < min_withdrawn {
        return Err(Error::BelowMinimumReturned);
    }

    events::emit_allowance_used(
        env,
        project_id,
        AllowanceUsed {
            ruleset_id: ruleset.id,
            caller: caller.clone(),
            beneficiary: beneficiary.clone(),
            token: token.clone(),
            amount,
            withdrawn,
        },
    );
    send(env, token, beneficiary, withdrawn);
    Ok(withdrawn)
}

// ─────────────────────────────────────────────────────────
// Terminal migration
// ─────────────────────────────────────────────────────────

/// Move the project's whole balance of `token` to another of its terminals.
pub fn migrate_balance(
    env: &Env,
    caller: &Address,
    project_id: u64,
    token: &Address,
    to: &Address,
) -> Result<i128, Error> {
    rbac::require_owner_permission(env, project_id, caller, Permission::MigrateTerminal)?;
    if *to == env.current_contract_address() || !directory::is_terminal_of(env, project_id, to) {
        return Err(Error::InvalidTerminal);
    }

    let amount = ledger::record_migration(env, project_id, token)?;
    events::emit_migrated(
        env,
        project_id,
        Migrated {
            kind: symbol_short!("terminal"),
            to: to.clone(),
            token: Some(token.clone()),
            amount,
        },
    );

    if amount > 0 {
        // `to` pulls the balance itself; allow exactly that one transfer.
        let this = env.current_contract_address();
        env.authorize_as_current_contract(vec![
            env,
            InvokerContractAuthEntry::Contract(SubContractInvocation {
                context: ContractContext {
                    contract: token.clone(),
                    fn_name: symbol_short!("transfer"),
                    args: (this.clone(), to.clone(), amount).into_val(env),
                },
                sub_invocations: vec![env],
            }),
        ]);
        MigrationTerminalClient::new(env, to).accept_migration(
            &this,
            &project_id,
            token,
            &amount,
        );
    }
    Ok(amount)
}

/// Pull a balance migrated from `from`, another terminal of the project, and
/// credit it. Only tokens actually received are credited.
pub fn accept_migration(
    env: &Env,
    from: &Address,
    project_id: u64,
    token: &Address,
    amount: i128,
) -> Result<(), Error> {
    projects::load(env, project_id)?;
    if *from == env.current_contract_address() || !directory::is_terminal_of(env, project_id, from)
    {
        return Err(Error::InvalidTerminal);
    }
    directory::require_terminal(env, project_id)?;
    ledger::accounting_context_of(env, project_id, token)?;
    if amount < 0 {
        return Err(Error::InvalidAmount);
    }

    pull(env, token, from, amount);
    ledger::record_incoming(env, project_id, token, amount)?;
    events::emit_balance_added(env, project_id, from.clone(), token.clone(), amount);
    Ok(())
}
