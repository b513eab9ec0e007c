//! # Escrow Ledger Contract
//!
//! Creators open fund-raising projects, contributors fund them up to a fixed
//! target, and the raised value can only leave custody through spend
//! requests approved by a strict majority of the project's contributors.
//!
//! | Phase        | Entry Point(s)                                               |
//! |--------------|--------------------------------------------------------------|
//! | Deployment   | `__constructor`                                              |
//! | Registration | [`EscrowLedger::create_project`]                             |
//! | Funding      | [`EscrowLedger::contribute`], [`EscrowLedger::withdraw_contribution`] |
//! | Spending     | [`EscrowLedger::request_funds`], [`EscrowLedger::approve`], [`EscrowLedger::spend_funds`] |
//! | Queries      | `get_project_details`, `get_project_count`, `get_creators`, `get_creator_count`, `get_contribution`, `get_spend_request`, `get_token` |
//!
//! ## Architecture
//!
//! Transition rules are evaluated by [`ledger`] without side effects.
//! Storage access is delegated to [`storage`] and event emission to
//! [`events`]. Each entry point validates, writes state, and only then moves
//! tokens, so the host's transaction rollback covers every failure path.
//!
//! Projects are addressed by `(creator, index)` where `index` is the
//! project's permanent position in the creator's list.

#![no_std]

#[cfg(test)]
extern crate std;

use soroban_sdk::{
    contract, contracterror, contractimpl, log, panic_with_error, token, Address, Bytes, Env,
    String, Vec,
};

pub mod events;
mod ledger;
mod storage;
mod types;

#[cfg(test)]
mod invariants;
#[cfg(test)]
mod test_events;
#[cfg(test)]
mod test_invariants;

use storage::{
    append_contribution, has_approved, load_contribution, load_contributions, load_project_pair,
    load_project_state, load_request, load_requests, mark_approved, push_project,
    register_creator, save_contribution, save_project_state, save_request, ProjectKey,
};
pub use types::{Contribution, ProjectConfig, ProjectDetails, ProjectState, SpendRequest};

/// Strkey of the all-zero ed25519 account, treated as the null identity.
pub const NULL_ACCOUNT: &str = "GAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAWHF";

/// Largest page returned by [`EscrowLedger::get_creators`].
pub const MAX_PAGE: u32 = 100;

/// Contract errors. Codes carry no payload; `InsufficientContribution` and
/// `Overspend` write the limit they failed against as a diagnostic `log!`,
/// which only debug builds emit.
#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum Error {
    ZeroAddress = 1,
    InvalidTitle = 2,
    InvalidDescription = 3,
    InvalidMinContribution = 4,
    InvalidTarget = 5,
    ProjectNotFound = 6,
    SelfContribution = 7,
    TargetMet = 8,
    InsufficientContribution = 9,
    TargetReached = 10,
    NotAContributor = 11,
    AlreadyWithdrawn = 12,
    EmptyRequestPurpose = 13,
    TargetNotMet = 14,
    Overspend = 15,
    SelfApproval = 16,
    FundsAlreadySpent = 17,
    AlreadyApproved = 18,
    UnapprovedRequest = 19,
    RequestNotFound = 20,
    InvalidAmount = 21,
    Overflow = 22,
    LedgerInconsistency = 23,
}

#[contract]
pub struct EscrowLedger;

#[contractimpl]
impl EscrowLedger {
    /// Deploy the ledger with `token` as the custody asset.
    pub fn __constructor(env: Env, token: Address) {
        storage::set_token(&env, &token);
    }

    /// Return the custody asset.
    pub fn get_token(env: Env) -> Address {
        storage::get_token(&env)
    }

    // ─────────────────────────────────────────────────────────
    // Project registry
    // ─────────────────────────────────────────────────────────

    /// Open a new project owned by `creator` and return its index.
    pub fn create_project(
        env: Env,
        creator: Address,
        title: Bytes,
        description: Bytes,
        min_contribution: i128,
        target_amount: i128,
    ) -> Result<u32, Error> {
        creator.require_auth();
        ledger::validate_project(&title, &description, min_contribution, target_amount)?;

        let config = ProjectConfig {
            title,
            description,
            min_contribution,
            target_amount,
        };
        let state = ProjectState {
            raised_amount: 0,
            target_reached: false,
            contributor_count: 0,
            request_count: 0,
        };

        let index = push_project(&env, &creator, &config, &state);
        register_creator(&env, &creator);

        events::emit_project_created(&env, &creator, index, min_contribution, target_amount);
        Ok(index)
    }

    /// Full read-only view of `creator`'s project at `index`.
    pub fn get_project_details(
        env: Env,
        creator: Address,
        index: u32,
    ) -> Result<ProjectDetails, Error> {
        require_not_null(&env, &creator)?;
        let key = ProjectKey::new(&creator, index);
        let (config, state) = load_project_pair(&env, &key).ok_or(Error::ProjectNotFound)?;

        Ok(ProjectDetails {
            creator,
            index,
            title: config.title,
            description: config.description,
            min_contribution: config.min_contribution,
            target_amount: config.target_amount,
            raised_amount: state.raised_amount,
            target_reached: state.target_reached,
            contributions: load_contributions(&env, &key),
            spend_requests: load_requests(&env, &key, state.request_count),
        })
    }

    /// Number of projects `creator` has opened.
    pub fn get_project_count(env: Env, creator: Address) -> u32 {
        storage::project_count(&env, &creator)
    }

    /// Creators that have opened at least one project, in first-seen order,
    /// starting at position `start`. At most [`MAX_PAGE`] are returned.
    pub fn get_creators(env: Env, start: u32, limit: u32) -> Vec<Address> {
        storage::get_creators(&env, start, limit.min(MAX_PAGE))
    }

    /// Number of distinct creators.
    pub fn get_creator_count(env: Env) -> u32 {
        storage::creator_count(&env)
    }

    // ─────────────────────────────────────────────────────────
    // Contributions
    // ─────────────────────────────────────────────────────────

    /// Contribute `value` to `creator`'s project at `index`.
    ///
    /// Whatever would push the raised amount past the target is sent back
    /// to the contributor in the same transaction. Returns the amount kept.
    pub fn contribute(
        env: Env,
        contributor: Address,
        creator: Address,
        index: u32,
        value: i128,
    ) -> Result<i128, Error> {
        contributor.require_auth();
        require_not_null(&env, &creator)?;
        if contributor == creator {
            return Err(Error::SelfContribution);
        }

        let key = ProjectKey::new(&creator, index);
        let (config, mut state) = load_project_pair(&env, &key).ok_or(Error::ProjectNotFound)?;

        let plan = ledger::plan_contribution(
            config.min_contribution,
            config.target_amount,
            &state,
            value,
        )
        .map_err(|e| {
            if e == Error::InsufficientContribution {
                log!(&env, "contribution below minimum", config.min_contribution);
            }
            e
        })?;

        let now = env.ledger().timestamp();
        let existing = load_contribution(&env, &key, &contributor);
        let entry = match &existing {
            Some(entry) if entry.amount == 0 => return Err(Error::AlreadyWithdrawn),
            // First-contribution time is kept on top-ups.
            Some(entry) => Contribution {
                contributor: contributor.clone(),
                amount: entry
                    .amount
                    .checked_add(plan.credited)
                    .ok_or(Error::Overflow)?,
                time: entry.time,
            },
            None => Contribution {
                contributor: contributor.clone(),
                amount: plan.credited,
                time: now,
            },
        };

        state.raised_amount = plan.raised_after;
        if plan.reaches_target {
            state.target_reached = true;
        }
        if existing.is_some() {
            save_contribution(&env, &key, &entry);
        } else {
            append_contribution(&env, &key, &entry);
            state.contributor_count += 1;
        }
        save_project_state(&env, &key, &state);

        let custody = env.current_contract_address();
        let token_client = token::Client::new(&env, &storage::get_token(&env));
        token_client.transfer(&contributor, &custody, &value);
        if plan.refund > 0 {
            token_client.transfer(&custody, &contributor, &plan.refund);
            events::emit_refunded(&env, &creator, index, &contributor, plan.refund);
        }

        events::emit_contributed(
            &env,
            &creator,
            index,
            &contributor,
            plan.credited,
            state.raised_amount,
            state.target_reached,
        );
        Ok(plan.credited)
    }

    /// Reclaim the caller's whole contribution while the target is unmet.
    /// Returns the amount sent back.
    pub fn withdraw_contribution(
        env: Env,
        contributor: Address,
        creator: Address,
        index: u32,
    ) -> Result<i128, Error> {
        contributor.require_auth();
        require_not_null(&env, &creator)?;

        let key = ProjectKey::new(&creator, index);
        let mut state = load_project_state(&env, &key).ok_or(Error::ProjectNotFound)?;
        let mut entry = load_contribution(&env, &key, &contributor);

        let stake = entry.as_ref().map(|c| c.amount);
        let amount = match ledger::plan_withdrawal(&state, stake) {
            Err(Error::LedgerInconsistency) => {
                log!(
                    &env,
                    "ledger inconsistency: stake exceeds raised amount",
                    stake,
                    state.raised_amount
                );
                panic_with_error!(&env, Error::LedgerInconsistency)
            }
            other => other?,
        };

        if let Some(entry) = entry.as_mut() {
            entry.amount = 0;
            save_contribution(&env, &key, entry);
        }
        state.raised_amount -= amount;
        save_project_state(&env, &key, &state);

        let token_client = token::Client::new(&env, &storage::get_token(&env));
        token_client.transfer(&env.current_contract_address(), &contributor, &amount);

        events::emit_withdrawn(&env, &creator, index, &contributor, amount, state.raised_amount);
        Ok(amount)
    }

    /// Return `contributor`'s entry in a project, if any.
    pub fn get_contribution(
        env: Env,
        creator: Address,
        index: u32,
        contributor: Address,
    ) -> Option<Contribution> {
        load_contribution(&env, &ProjectKey::new(&creator, index), &contributor)
    }

    // ─────────────────────────────────────────────────────────
    // Spend requests
    // ─────────────────────────────────────────────────────────

    /// Propose paying `amount` to `receiver` from a funded project.
    /// Returns the request index.
    pub fn request_funds(
        env: Env,
        creator: Address,
        index: u32,
        amount: i128,
        receiver: Address,
        purpose: Bytes,
    ) -> Result<u32, Error> {
        creator.require_auth();
        require_not_null(&env, &receiver)?;
        if purpose.is_empty() {
            return Err(Error::EmptyRequestPurpose);
        }

        let key = ProjectKey::new(&creator, index);
        let mut state = load_project_state(&env, &key).ok_or(Error::ProjectNotFound)?;
        ledger::check_request(&state, amount).map_err(|e| {
            if e == Error::Overspend {
                log!(&env, "request exceeds raised amount", state.raised_amount);
            }
            e
        })?;

        let request_index = state.request_count;
        let request = SpendRequest {
            amount,
            receiver: receiver.clone(),
            purpose,
            approvers: Vec::new(&env),
            spent: false,
        };
        save_request(&env, &key, request_index, &request);
        state.request_count += 1;
        save_project_state(&env, &key, &state);

        events::emit_funds_requested(&env, &creator, index, request_index, amount, &receiver);
        Ok(request_index)
    }

    /// Vote for a spend request. Only contributors other than the creator
    /// may vote, once each.
    pub fn approve(
        env: Env,
        approver: Address,
        creator: Address,
        project_index: u32,
        request_index: u32,
    ) -> Result<(), Error> {
        approver.require_auth();
        require_not_null(&env, &creator)?;
        if approver == creator {
            return Err(Error::SelfApproval);
        }

        let key = ProjectKey::new(&creator, project_index);
        load_project_state(&env, &key).ok_or(Error::ProjectNotFound)?;
        let mut request =
            load_request(&env, &key, request_index).ok_or(Error::RequestNotFound)?;

        ledger::check_approval(
            &request,
            load_contribution(&env, &key, &approver).is_some(),
            has_approved(&env, &key, request_index, &approver),
        )?;

        request.approvers.push_back(approver.clone());
        save_request(&env, &key, request_index, &request);
        mark_approved(&env, &key, request_index, &approver);

        events::emit_request_approved(
            &env,
            &creator,
            project_index,
            request_index,
            &approver,
            request.approvers.len(),
        );
        Ok(())
    }

    /// Pay out an approved request to its receiver.
    ///
    /// Quorum is measured against the contributor count at the time of this
    /// call, withdrawn contributors included.
    pub fn spend_funds(
        env: Env,
        creator: Address,
        project_index: u32,
        request_index: u32,
    ) -> Result<(), Error> {
        creator.require_auth();

        let key = ProjectKey::new(&creator, project_index);
        let mut state = load_project_state(&env, &key).ok_or(Error::ProjectNotFound)?;
        let mut request =
            load_request(&env, &key, request_index).ok_or(Error::RequestNotFound)?;

        ledger::check_spend(&state, &request).map_err(|e| {
            if e == Error::Overspend {
                log!(&env, "spend exceeds raised amount", state.raised_amount);
            }
            e
        })?;

        request.spent = true;
        state.raised_amount -= request.amount;
        save_request(&env, &key, request_index, &request);
        save_project_state(&env, &key, &state);

        let token_client = token::Client::new(&env, &storage::get_token(&env));
        token_client.transfer(
            &env.current_contract_address(),
            &request.receiver,
            &request.amount,
        );

        events::emit_funds_spent(
            &env,
            &creator,
            project_index,
            request_index,
            request.amount,
            &request.receiver,
            state.raised_amount,
        );
        Ok(())
    }

    /// Return one spend request of a project.
    pub fn get_spend_request(
        env: Env,
        creator: Address,
        project_index: u32,
        request_index: u32,
    ) -> Result<SpendRequest, Error> {
        let key = ProjectKey::new(&creator, project_index);
        load_request(&env, &key, request_index).ok_or(Error::RequestNotFound)
    }
}

/// The null identity as an [`Address`].
pub fn null_address(env: &Env) -> Address {
    Address::from_string(&String::from_str(env, NULL_ACCOUNT))
}

fn require_not_null(env: &Env, address: &Address) -> Result<(), Error> {
    if *address == null_address(env) {
        return Err(Error::ZeroAddress);
    }
    Ok(())
}
