//! # RBAC: roles and operator permissions
//!
//! Two layers of access control:
//!
//! ```text
//! Protocol roles                 Project permissions
//!
//! SuperAdmin                     account ──grants──► operator
//!     └── Admin                      (bitmask per project)
//! ```
//!
//! Protocol roles gate the global switches: the emergency pause and the
//! price-feed registry. Project permissions let an account (the project owner,
//! or a token holder for their own tokens) delegate individual operations to
//! operators.
//!
//! ## Storage layout
//!
//! - `RbacKey::SuperAdmin` → `Address` (instance): the one and only super-admin.
//! - `RbacKey::Role(addr)` → `Role` (persistent): the role held by `addr`, if any.
//! - `DataKey::Permissions(project, account, operator)` → `u32` bitmask.
//!
//! ## Event emissions
//!
//! | Event topic prefix | Trigger |
//! |--------------------|---------|
//! | `role_set`         | Role granted or replaced |
//! | `role_del`         | Role revoked |
//! | `perms`            | Operator permissions replaced |
//!
//! ## Threat model notes
//!
//! - `Admin` cannot escalate to `SuperAdmin`; only `SuperAdmin` may grant that role.
//! - `SuperAdmin` cannot be removed via `revoke_role`; use `transfer_super_admin`.
//! - An address holds **at most one role** at a time; granting a new role replaces the old one.
//! - An account always holds every permission over its own resources.

use soroban_sdk::{contracttype, symbol_short, Address, Env, Symbol, Vec};

use crate::{projects, storage, Error};

// ─────────────────────────────────────────────────────────
// Roles and permissions
// ─────────────────────────────────────────────────────────

/// Protocol-level roles. A single address may hold at most one.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Role {
    /// Grants and revokes any role, pauses the protocol.
    SuperAdmin,
    /// Grants and revokes `Admin`, pauses the protocol, registers price feeds.
    Admin,
}

/// Operations an account can delegate to an operator.
#[contracttype]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum Permission {
    QueueRulesets = 0,
    SetSplits = 1,
    MintTokens = 2,
    BurnTokens = 3,
    UseAllowance = 4,
    SetTerminals = 5,
    AddAccountingContexts = 6,
    MigrateController = 7,
    MigrateTerminal = 8,
    TransferCredits = 9,
}

impl Permission {
    fn bit(self) -> u32 {
        1 << (self as u32)
    }
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RbacKey {
    Role(Address),
    SuperAdmin,
}

// ─────────────────────────────────────────────────────────
// Storage helpers (private)
// ─────────────────────────────────────────────────────────

fn store_role(env: &Env, address: &Address, role: &Role) {
    env.storage()
        .persistent()
        .set(&RbacKey::Role(address.clone()), role);
}

fn clear_role(env: &Env, address: &Address) {
    env.storage()
        .persistent()
        .remove(&RbacKey::Role(address.clone()));
}

pub fn get_role(env: &Env, address: &Address) -> Option<Role> {
    env.storage()
        .persistent()
        .get(&RbacKey::Role(address.clone()))
}

/// Read the SuperAdmin address, returning `None` before init.
pub fn get_super_admin(env: &Env) -> Option<Address> {
    env.storage().instance().get(&RbacKey::SuperAdmin)
}

// ─────────────────────────────────────────────────────────
// Initialisation
// ─────────────────────────────────────────────────────────

/// Set the initial SuperAdmin. Can only happen once.
pub fn init_super_admin(env: &Env, super_admin: &Address) -> Result<(), Error> {
    if env.storage().instance().has(&RbacKey::SuperAdmin) {
        return Err(Error::AlreadyInitialized);
    }
    env.storage()
        .instance()
        .set(&RbacKey::SuperAdmin, super_admin);
    store_role(env, super_admin, &Role::SuperAdmin);

    emit(env, super_admin, &Role::SuperAdmin, None);
    Ok(())
}

// ─────────────────────────────────────────────────────────
// Role assignment
// ─────────────────────────────────────────────────────────

/// Grant `role` to `target`, replacing any role it held.
///
/// Emits a `role_set` event.
pub fn grant_role(env: &Env, caller: &Address, target: &Address, role: Role) -> Result<(), Error> {
    match role {
        Role::SuperAdmin => require_role(env, caller, &Role::SuperAdmin)?,
        Role::Admin => require_admin_or_above(env, caller)?,
    }

    // The SuperAdmin cannot be demoted through a grant.
    if get_role(env, target) == Some(Role::SuperAdmin) && role != Role::SuperAdmin {
        return Err(Error::Unauthorized);
    }

    store_role(env, target, &role);
    emit(env, target, &role, Some(caller.clone()));
    Ok(())
}

/// Revoke any role from `target`. A no-op when it holds none.
///
/// Emits a `role_del` event if a role existed.
pub fn revoke_role(env: &Env, caller: &Address, target: &Address) -> Result<(), Error> {
    require_admin_or_above(env, caller)?;

    if get_super_admin(env).as_ref() == Some(target) {
        return Err(Error::Unauthorized);
    }

    if get_role(env, target).is_some() {
        clear_role(env, target);
        emit_revoke(env, target, Some(caller.clone()));
    }
    Ok(())
}

/// Hand the SuperAdmin role to `new`. The only way to remove a SuperAdmin.
pub fn transfer_super_admin(env: &Env, current: &Address, new: &Address) -> Result<(), Error> {
    require_role(env, current, &Role::SuperAdmin)?;

    clear_role(env, current);
    emit_revoke(env, current, Some(current.clone()));

    env.storage().instance().set(&RbacKey::SuperAdmin, new);
    store_role(env, new, &Role::SuperAdmin);
    emit(env, new, &Role::SuperAdmin, Some(current.clone()));
    Ok(())
}

// ─────────────────────────────────────────────────────────
// Access guards
// ─────────────────────────────────────────────────────────

pub fn require_role(env: &Env, address: &Address, required_role: &Role) -> Result<(), Error> {
    match get_role(env, address) {
        Some(ref r) if r == required_role => Ok(()),
        _ => Err(Error::Unauthorized),
    }
}

#[inline]
pub fn require_admin_or_above(env: &Env, address: &Address) -> Result<(), Error> {
    match get_role(env, address) {
        Some(Role::SuperAdmin) | Some(Role::Admin) => Ok(()),
        None => Err(Error::Unauthorized),
    }
}

// ─────────────────────────────────────────────────────────
// Operator permissions
// ─────────────────────────────────────────────────────────

/// Replace the permissions `account` grants `operator` over `project_id`.
/// Returns the stored bitmask.
pub fn set_permissions(
    env: &Env,
    account: &Address,
    project_id: u64,
    operator: &Address,
    permissions: &Vec<Permission>,
) -> u32 {
    let mask = permissions
        .iter()
        .fold(0u32, |mask, permission| mask | permission.bit());
    storage::set_permissions(env, project_id, account, operator, mask);
    env.events().publish(
        (symbol_short!("perms"), project_id),
        (account.clone(), operator.clone(), mask),
    );
    mask
}

pub fn has_permission(
    env: &Env,
    account: &Address,
    project_id: u64,
    operator: &Address,
    permission: Permission,
) -> bool {
    storage::get_permissions(env, project_id, account, operator) & permission.bit() != 0
}

/// `caller` is `account` itself or an operator `account` delegated to.
pub fn require_permission(
    env: &Env,
    account: &Address,
    project_id: u64,
    caller: &Address,
    permission: Permission,
) -> Result<(), Error> {
    if caller == account || has_permission(env, account, project_id, caller, permission) {
        Ok(())
    } else {
        Err(Error::Unauthorized)
    }
}

/// Permission check against the project's owner.
pub fn require_owner_permission(
    env: &Env,
    project_id: u64,
    caller: &Address,
    permission: Permission,
) -> Result<(), Error> {
    let owner = projects::owner_of(env, project_id)?;
    require_permission(env, &owner, project_id, caller, permission)
}

// ─────────────────────────────────────────────────────────
// Queries
// ─────────────────────────────────────────────────────────

pub fn role_of(env: &Env, address: Address) -> Option<Role> {
    get_role(env, &address)
}

pub fn has_role(env: &Env, address: Address, role: Role) -> bool {
    get_role(env, &address).map(|r| r == role).unwrap_or(false)
}

// ─────────────────────────────────────────────────────────
// Internal helpers
// ─────────────────────────────────────────────────────────

/// Topic: `(role_set, target_address, role_symbol)`, data: `Option<caller>`.
fn emit(env: &Env, target: &Address, role: &Role, by: Option<Address>) {
    env.events().publish(
        (symbol_short!("role_set"), target.clone(), role_to_symbol(role)),
        by,
    );
}

fn emit_revoke(env: &Env, target: &Address, by: Option<Address>) {
    env.events()
        .publish((symbol_short!("role_del"), target.clone()), by);
}

fn role_to_symbol(role: &Role) -> Symbol {
    match role {
        Role::SuperAdmin => symbol_short!("supadmin"),
        Role::Admin => symbol_short!("admin"),
    }
}
