//! Project registry: sequential ids and ownership.

use soroban_sdk::{Address, Env};

use crate::storage;
use crate::types::Project;
use crate::Error;

pub fn create(env: &Env, owner: &Address) -> Project {
    let project = Project {
        id: storage::next_project_id(env),
        owner: owner.clone(),
        created_at: env.ledger().timestamp(),
    };
    storage::save_project(env, &project);
    project
}

pub fn load(env: &Env, project_id: u64) -> Result<Project, Error> {
    storage::load_project(env, project_id).ok_or(Error::ProjectNotFound)
}

pub fn owner_of(env: &Env, project_id: u64) -> Result<Address, Error> {
    Ok(load(env, project_id)?.owner)
}

/// Hand the project to `new_owner`. Only the current owner may do this.
pub fn transfer_ownership(
    env: &Env,
    caller: &Address,
    project_id: u64,
    new_owner: &Address,
) -> Result<Project, Error> {
    let mut project = load(env, project_id)?;
    if project.owner != *caller {
        return Err(Error::Unauthorized);
    }
    project.owner = new_owner.clone();
    storage::save_project(env, &project);
    Ok(project)
}
