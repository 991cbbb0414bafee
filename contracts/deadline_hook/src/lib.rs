//! # Deadline hook
//!
//! An approval hook that approves a queued ruleset once it has been public for
//! a fixed notice period before its start.
//!
//! | Queued                                   | Verdict                   |
//! |------------------------------------------|---------------------------|
//! | after the ruleset's start                | `Rejected`                |
//! | less than `duration` before the start    | `Rejected`                |
//! | otherwise, before `start - duration`     | `Pending`                 |
//! | otherwise, from `start - duration` on    | `Approved`                |
//!
//! Ruleset ids are queue timestamps, so `start - ruleset_id` is the notice the
//! ruleset was queued with.

#![no_std]

use soroban_sdk::{contract, contractimpl, contracttype, Env};

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
enum DataKey {
    Duration,
}

/// Mirrors the treasury's approval hook verdict.
#[contracttype]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum HookVerdict {
    Approved,
    Pending,
    Rejected,
}

#[contract]
pub struct DeadlineHook;

#[contractimpl]
impl DeadlineHook {
    pub fn __constructor(env: Env, duration: u64) {
        env.storage().instance().set(&DataKey::Duration, &duration);
    }

    /// Minimum notice, in seconds, between queueing a ruleset and its start.
    pub fn approval_window(env: Env) -> u64 {
        Self::duration(&env)
    }

    pub fn approval_status(env: Env, _project_id: u64, ruleset_id: u64, start: u64) -> HookVerdict {
        let duration = Self::duration(&env);
        if ruleset_id > start || start - ruleset_id < duration {
            return HookVerdict::Rejected;
        }
        if env.ledger().timestamp().saturating_add(duration) < start {
            HookVerdict::Pending
        } else {
            HookVerdict::Approved
        }
    }

    fn duration(env: &Env) -> u64 {
        env.storage()
            .instance()
            .get(&DataKey::Duration)
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod test;
