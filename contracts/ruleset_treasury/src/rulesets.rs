//! # Ruleset store
//!
//! Append-only timeline of rulesets per project.
//!
//! ## Timeline model
//!
//! Every queued ruleset is stored under `(project, id)` and points at the
//! ruleset it was derived from (`based_on_id`). Windows along that chain never
//! overlap: a new ruleset always starts on a cycle boundary of its base at or
//! after the earliest legal start.
//!
//! ```text
//!  base  |--- c1 ---|--- c2 ---|--- c3 ---|       (duration d, rolling)
//!  new                                    |--- c4 ... (queued during c2 or c3)
//! ```
//!
//! ## Approval gating
//!
//! The *base* ruleset's `approval_hook` decides whether the ruleset queued on
//! top of it may take effect. A ruleset that is rejected, or still pending once
//! its start has passed, never becomes current: the store keeps rolling the
//! base forward by whole durations instead, advancing `cycle_number` and
//! decaying `weight` once per rolled cycle.
//!
//! Only one pending reconfiguration survives per project: queueing again
//! while the latest ruleset is unapproved (or not yet started) derives the new
//! ruleset from the same approved base, so the pending one is replaced rather
//! than stacked.
//!
//! A ruleset with `duration == 0` never rolls over; it stays current until a
//! new ruleset is queued, which may then start immediately.

use soroban_sdk::{Address, Env, Vec};

use crate::constants::{
    MAX_DECAY_RATE, MAX_DURATION, MAX_REDEMPTION_RATE, MAX_RESERVED_RATE, MAX_WEIGHT, WAD,
};
use crate::hooks::ApprovalHookClient;
use crate::math::{fixed_mul, mul_div_down};
use crate::storage;
use crate::types::{ApprovalStatus, HookVerdict, Ruleset, RulesetMetadata};
use crate::Error;

/// Intrinsic properties of a ruleset to queue.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RulesetData {
    pub duration: u64,
    /// `0` inherits the base's decayed weight; `1` is an explicit zero.
    pub weight: i128,
    pub decay_rate: u32,
    pub approval_hook: Option<Address>,
}

// ─────────────────────────────────────────────────────────
// Queueing
// ─────────────────────────────────────────────────────────

/// Validate and store a new ruleset for `project_id`.
///
/// The ruleset starts at the first legal moment at or after
/// `max(now, must_start_at_or_after)`, also respecting the base hook's
/// approval window.
pub fn configure_for(
    env: &Env,
    project_id: u64,
    data: &RulesetData,
    metadata: &RulesetMetadata,
    must_start_at_or_after: u64,
) -> Result<Ruleset, Error> {
    validate(data, metadata, must_start_at_or_after)?;

    let now = env.ledger().timestamp();
    let latest_id = storage::latest_ruleset_id(env, project_id);
    // Ids are queue timestamps, bumped when several rulesets share a ledger.
    let ruleset_id = if latest_id >= now {
        latest_id.checked_add(1).ok_or(Error::Overflow)?
    } else {
        now
    };

    let earliest_start = must_start_at_or_after.max(ruleset_id);
    let (based_on_id, cycle_number, start, weight) =
        intrinsic_properties(env, project_id, ruleset_id, data.weight, earliest_start)?;

    let ruleset = Ruleset {
        project_id,
        id: ruleset_id,
        based_on_id,
        cycle_number,
        start,
        duration: data.duration,
        weight,
        decay_rate: data.decay_rate,
        approval_hook: data.approval_hook.clone(),
        metadata: metadata.clone(),
    };

    storage::save_ruleset(env, &ruleset);
    storage::set_latest_ruleset_id(env, project_id, ruleset_id);
    Ok(ruleset)
}

fn validate(
    data: &RulesetData,
    metadata: &RulesetMetadata,
    must_start_at_or_after: u64,
) -> Result<(), Error> {
    if data.weight < 0 || data.weight > MAX_WEIGHT {
        return Err(Error::InvalidConfiguration);
    }
    if data.duration > MAX_DURATION || data.decay_rate > MAX_DECAY_RATE {
        return Err(Error::InvalidConfiguration);
    }
    if metadata.reserved_rate > MAX_RESERVED_RATE
        || metadata.redemption_rate > MAX_REDEMPTION_RATE
    {
        return Err(Error::InvalidConfiguration);
    }
    if must_start_at_or_after.checked_add(data.duration).is_none() {
        return Err(Error::InvalidConfiguration);
    }
    Ok(())
}

/// Returns `(based_on_id, cycle_number, start, weight)` for a new ruleset.
fn intrinsic_properties(
    env: &Env,
    project_id: u64,
    ruleset_id: u64,
    weight: i128,
    must_start_at_or_after: u64,
) -> Result<(u64, u32, u64, i128), Error> {
    let latest_id = storage::latest_ruleset_id(env, project_id);
    if latest_id == 0 {
        return Ok((0, 1, must_start_at_or_after, weight));
    }

    let now = env.ledger().timestamp();
    let base_id = eligible_ruleset_id(env, project_id)?.unwrap_or(latest_id);
    let mut base = get(env, project_id, base_id)?;

    // An unapproved or not-yet-started base is itself pending; build on the
    // approved ruleset it was derived from instead.
    if !approval_status_of(env, &base).is_approved() || now < base.start {
        match storage::load_ruleset(env, project_id, base.based_on_id) {
            Some(approved) => base = approved,
            None => return Ok((0, 1, must_start_at_or_after, weight)),
        }
    }

    let after_approval_window = match &base.approval_hook {
        Some(hook) => ruleset_id
            .checked_add(ApprovalHookClient::new(env, hook).approval_window())
            .ok_or(Error::Overflow)?,
        None => 0,
    };

    let start = derive_start(&base, must_start_at_or_after.max(after_approval_window))?;
    let weight = match weight {
        0 => derive_weight(env, &base, start)?,
        1 => 0,
        w => w,
    };
    let cycle_number = derive_cycle_number(&base, start)?;

    Ok((base.id, cycle_number, start, weight))
}

// ─────────────────────────────────────────────────────────
// Resolution
// ─────────────────────────────────────────────────────────

/// The ruleset in effect right now, if any.
pub fn current_of(env: &Env, project_id: u64) -> Result<Option<Ruleset>, Error> {
    let latest_id = storage::latest_ruleset_id(env, project_id);
    if latest_id == 0 {
        return Ok(None);
    }

    let now = env.ledger().timestamp();
    let base_id = match eligible_ruleset_id(env, project_id)? {
        Some(id) => {
            let ruleset = get(env, project_id, id)?;
            if approval_status_of(env, &ruleset).is_approved() {
                return Ok(Some(ruleset));
            }
            ruleset.based_on_id
        }
        None => {
            let latest = get(env, project_id, latest_id)?;
            if !approval_status_of(env, &latest).is_approved() || now < latest.start {
                latest.based_on_id
            } else {
                latest.id
            }
        }
    };

    let base = match storage::load_ruleset(env, project_id, base_id) {
        Some(base) => base,
        None => return Ok(None),
    };
    if base.duration == 0 {
        return Ok(Some(base));
    }
    roll_forward(env, &base, true).map(Some)
}

/// The ruleset that will take effect once the current one ends, if known.
pub fn upcoming_of(env: &Env, project_id: u64) -> Result<Option<Ruleset>, Error> {
    let latest_id = storage::latest_ruleset_id(env, project_id);
    if latest_id == 0 {
        return Ok(None);
    }

    let now = env.ledger().timestamp();
    let ruleset = match standby_ruleset_id(env, project_id)? {
        Some(id) => {
            let standby = get(env, project_id, id)?;
            if approval_status_of(env, &standby).is_approved() {
                return Ok(Some(standby));
            }
            match storage::load_ruleset(env, project_id, standby.based_on_id) {
                Some(base) => base,
                None => return Ok(None),
            }
        }
        None => {
            let latest = get(env, project_id, latest_id)?;
            if now < latest.start {
                match storage::load_ruleset(env, project_id, latest.based_on_id) {
                    Some(base) => base,
                    None => return Ok(None),
                }
            } else {
                latest
            }
        }
    };

    if ruleset.duration == 0 {
        return Ok(None);
    }
    if approval_status_of(env, &ruleset).is_approved() {
        return roll_forward(env, &ruleset, false).map(Some);
    }

    let base = match storage::load_ruleset(env, project_id, ruleset.based_on_id) {
        Some(base) if base.duration != 0 => base,
        _ => return Ok(None),
    };
    roll_forward(env, &base, false).map(Some)
}

/// The most recently queued ruleset and its approval status.
pub fn latest_queued_of(
    env: &Env,
    project_id: u64,
) -> Result<Option<(Ruleset, ApprovalStatus)>, Error> {
    let latest_id = storage::latest_ruleset_id(env, project_id);
    if latest_id == 0 {
        return Ok(None);
    }
    let latest = get(env, project_id, latest_id)?;
    let status = approval_status_of(env, &latest);
    Ok(Some((latest, status)))
}

/// Stored ruleset by id.
pub fn get(env: &Env, project_id: u64, ruleset_id: u64) -> Result<Ruleset, Error> {
    storage::load_ruleset(env, project_id, ruleset_id).ok_or(Error::RulesetNotFound)
}

/// Walk the `based_on_id` chain back from the latest ruleset, newest first.
pub fn history_of(env: &Env, project_id: u64, max: u32) -> Vec<Ruleset> {
    let mut history = Vec::new(env);
    let mut next_id = storage::latest_ruleset_id(env, project_id);
    while history.len() < max {
        match storage::load_ruleset(env, project_id, next_id) {
            Some(ruleset) => {
                next_id = ruleset.based_on_id;
                history.push_back(ruleset);
            }
            None => break,
        }
    }
    history
}

/// Approval status of `ruleset`, as decided by its base's hook.
pub fn approval_status_of(env: &Env, ruleset: &Ruleset) -> ApprovalStatus {
    let hook = match storage::load_ruleset(env, ruleset.project_id, ruleset.based_on_id) {
        Some(Ruleset {
            approval_hook: Some(hook),
            ..
        }) => hook,
        _ => return ApprovalStatus::Empty,
    };

    let verdict = ApprovalHookClient::new(env, &hook).approval_status(
        &ruleset.project_id,
        &ruleset.id,
        &ruleset.start,
    );
    match verdict {
        HookVerdict::Approved => ApprovalStatus::Approved,
        HookVerdict::Rejected => ApprovalStatus::Failed,
        HookVerdict::Pending if env.ledger().timestamp() < ruleset.start => ApprovalStatus::Active,
        HookVerdict::Pending => ApprovalStatus::ApprovalExpired,
    }
}

/// Id of the ruleset whose window may contain `now`: the latest if it has
/// started and not expired, otherwise its base if that has not expired.
fn eligible_ruleset_id(env: &Env, project_id: u64) -> Result<Option<u64>, Error> {
    let now = env.ledger().timestamp();
    let latest = get(env, project_id, storage::latest_ruleset_id(env, project_id))?;

    if latest.has_expired_at(now) {
        return Ok(None);
    }
    if now >= latest.start {
        return Ok(Some(latest.id));
    }

    match storage::load_ruleset(env, project_id, latest.based_on_id) {
        Some(base) if !base.has_expired_at(now) => Ok(Some(base.id)),
        _ => Ok(None),
    }
}

/// Id of the latest ruleset if it is queued to start right after the
/// current cycle.
fn standby_ruleset_id(env: &Env, project_id: u64) -> Result<Option<u64>, Error> {
    let now = env.ledger().timestamp();
    let latest = get(env, project_id, storage::latest_ruleset_id(env, project_id))?;

    if now >= latest.start {
        return Ok(None);
    }
    if latest.based_on_id == 0 {
        return Ok(Some(latest.id));
    }

    let base = get(env, project_id, latest.based_on_id)?;
    if base.duration != 0 && now < latest.start.saturating_sub(base.duration) {
        return Ok(None);
    }
    Ok(Some(latest.id))
}

// ─────────────────────────────────────────────────────────
// Derivations
// ─────────────────────────────────────────────────────────

/// `base` rolled forward to the cycle containing now (`allow_mid_cycle`) or
/// to the next cycle starting after now.
fn roll_forward(env: &Env, base: &Ruleset, allow_mid_cycle: bool) -> Result<Ruleset, Error> {
    let now = env.ledger().timestamp();
    let must_start_at_or_after = if allow_mid_cycle {
        now.saturating_add(1).saturating_sub(base.duration)
    } else {
        now.saturating_add(1)
    };

    let start = derive_start(base, must_start_at_or_after)?;
    let cycle_number = derive_cycle_number(base, start)?;
    let weight = derive_weight(env, base, start)?;

    Ok(Ruleset {
        cycle_number,
        start,
        weight,
        ..base.clone()
    })
}

/// First cycle boundary of `base` at or after `must_start_at_or_after`.
pub(crate) fn derive_start(base: &Ruleset, must_start_at_or_after: u64) -> Result<u64, Error> {
    if base.duration == 0 {
        return Ok(must_start_at_or_after);
    }

    let next_immediate_start = base
        .start
        .checked_add(base.duration)
        .ok_or(Error::Overflow)?;
    if next_immediate_start >= must_start_at_or_after {
        return Ok(next_immediate_start);
    }

    let offset = (must_start_at_or_after - next_immediate_start) % base.duration;
    if offset == 0 {
        Ok(must_start_at_or_after)
    } else {
        (must_start_at_or_after - offset)
            .checked_add(base.duration)
            .ok_or(Error::Overflow)
    }
}

pub(crate) fn derive_cycle_number(base: &Ruleset, start: u64) -> Result<u32, Error> {
    if base.duration == 0 {
        return base.cycle_number.checked_add(1).ok_or(Error::Overflow);
    }
    let elapsed = start.saturating_sub(base.start) / base.duration;
    let elapsed = u32::try_from(elapsed).map_err(|_| Error::Overflow)?;
    base.cycle_number.checked_add(elapsed).ok_or(Error::Overflow)
}

pub(crate) fn derive_weight(env: &Env, base: &Ruleset, start: u64) -> Result<i128, Error> {
    if base.duration == 0 {
        return decay(env, base.weight, base.decay_rate, 1);
    }
    if base.decay_rate == 0 {
        return Ok(base.weight);
    }
    let cycles = start.saturating_sub(base.start) / base.duration;
    decay(env, base.weight, base.decay_rate, cycles)
}

/// `weight * ((MAX_DECAY_RATE - decay_rate) / MAX_DECAY_RATE)^cycles`, floored.
///
/// The per-cycle factor is raised by repeated squaring in 18-decimal fixed
/// point, so cost grows with `log2(cycles)` rather than with the number of
/// cycles a ruleset was left rolling.
fn decay(env: &Env, weight: i128, decay_rate: u32, cycles: u64) -> Result<i128, Error> {
    if decay_rate == 0 || cycles == 0 || weight == 0 {
        return Ok(weight);
    }
    let mut square = (MAX_DECAY_RATE - decay_rate) as i128 * (WAD / MAX_DECAY_RATE as i128);
    let mut factor = WAD;
    let mut remaining = cycles;
    while remaining > 0 && factor != 0 {
        if remaining & 1 == 1 {
            factor = fixed_mul(env, factor, square)?;
        }
        remaining >>= 1;
        if remaining > 0 {
            square = fixed_mul(env, square, square)?;
        }
    }
    mul_div_down(env, weight, factor, WAD)
}
