//! Directory of each project's controller and terminals.
//!
//! This contract plays both parts for the projects it launches. A project
//! whose controller was migrated elsewhere can no longer be configured or
//! minted for here; a project whose terminal list no longer contains this
//! contract can no longer be paid or redeemed here.

use soroban_sdk::{Address, Env, Vec};

use crate::storage;
use crate::Error;

pub fn controller_of(env: &Env, project_id: u64) -> Option<Address> {
    storage::get_controller(env, project_id)
}

pub fn set_controller_of(env: &Env, project_id: u64, controller: &Address) {
    storage::set_controller(env, project_id, controller);
}

pub fn require_controller(env: &Env, project_id: u64) -> Result<(), Error> {
    match controller_of(env, project_id) {
        Some(controller) if controller == env.current_contract_address() => Ok(()),
        Some(_) => Err(Error::NotController),
        None => Err(Error::ProjectNotFound),
    }
}

pub fn terminals_of(env: &Env, project_id: u64) -> Vec<Address> {
    storage::get_terminals(env, project_id)
}

pub fn is_terminal_of(env: &Env, project_id: u64, terminal: &Address) -> bool {
    terminals_of(env, project_id).contains(terminal)
}

/// Replace the project's terminal list. Duplicates are rejected.
pub fn set_terminals_of(env: &Env, project_id: u64, terminals: &Vec<Address>) -> Result<(), Error> {
    for i in 0..terminals.len() {
        let terminal = terminals.get_unchecked(i);
        for j in (i + 1)..terminals.len() {
            if terminal == terminals.get_unchecked(j) {
                return Err(Error::InvalidTerminal);
            }
        }
    }
    storage::set_terminals(env, project_id, terminals);
    Ok(())
}

pub fn require_terminal(env: &Env, project_id: u64) -> Result<(), Error> {
    if is_terminal_of(env, project_id, &env.current_contract_address()) {
        Ok(())
    } else {
        Err(Error::InvalidTerminal)
    }
}
