//! # Events
//!
//! Every successful state transition publishes one event. Topics are
//! `(symbol, creator, project_index)` so that an indexer can filter a
//! single project without decoding the data payload.
//!
//! | Topic       | Data               |
//! |-------------|--------------------|
//! | `created`   | [`ProjectCreated`] |
//! | `contrib`   | [`Contributed`]    |
//! | `refunded`  | [`Refunded`]       |
//! | `withdrawn` | [`Withdrawn`]      |
//! | `requested` | [`FundsRequested`] |
//! | `approved`  | [`RequestApproved`]|
//! | `spent`     | [`FundsSpent`]     |

use soroban_sdk::{contracttype, symbol_short, Address, Env, Symbol};

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProjectCreated {
    pub creator: Address,
    pub index: u32,
    pub min_contribution: i128,
    pub target_amount: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Contributed {
    pub contributor: Address,
    /// Amount kept by the project after any refund.
    pub amount: i128,
    pub raised_amount: i128,
    pub target_reached: bool,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Refunded {
    pub contributor: Address,
    pub amount: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Withdrawn {
    pub contributor: Address,
    pub amount: i128,
    pub raised_amount: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FundsRequested {
    pub request_index: u32,
    pub amount: i128,
    pub receiver: Address,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RequestApproved {
    pub request_index: u32,
    pub approver: Address,
    pub approvals: u32,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FundsSpent {
    pub request_index: u32,
    pub amount: i128,
    pub receiver: Address,
    pub raised_amount: i128,
}

fn publish<D>(env: &Env, topic: Symbol, creator: &Address, index: u32, data: D)
where
    D: soroban_sdk::IntoVal<Env, soroban_sdk::Val>,
{
    env.events().publish((topic, creator.clone(), index), data);
}

pub fn emit_project_created(
    env: &Env,
    creator: &Address,
    index: u32,
    min_contribution: i128,
    target_amount: i128,
) {
    let data = ProjectCreated {
        creator: creator.clone(),
        index,
        min_contribution,
        target_amount,
    };
    publish(env, symbol_short!("created"), creator, index, data);
}

pub fn emit_contributed(
    env: &Env,
    creator: &Address,
    index: u32,
    contributor: &Address,
    amount: i128,
    raised_amount: i128,
    target_reached: bool,
) {
    let data = Contributed {
        contributor: contributor.clone(),
        amount,
        raised_amount,
        target_reached,
    };
    publish(env, symbol_short!("contrib"), creator, index, data);
}

pub fn emit_refunded(env: &Env, creator: &Address, index: u32, contributor: &Address, amount: i128) {
    let data = Refunded {
        contributor: contributor.clone(),
        amount,
    };
    publish(env, symbol_short!("refunded"), creator, index, data);
}

pub fn emit_withdrawn(
    env: &Env,
    creator: &Address,
    index: u32,
    contributor: &Address,
    amount: i128,
    raised_amount: i128,
) {
    let data = Withdrawn {
        contributor: contributor.clone(),
        amount,
        raised_amount,
    };
    publish(env, symbol_short!("withdrawn"), creator, index, data);
}

pub fn emit_funds_requested(
    env: &Env,
    creator: &Address,
    index: u32,
    request_index: u32,
    amount: i128,
    receiver: &Address,
) {
    let data = FundsRequested {
        request_index,
        amount,
        receiver: receiver.clone(),
    };
    publish(env, symbol_short!("requested"), creator, index, data);
}

pub fn emit_request_approved(
    env: &Env,
    creator: &Address,
    index: u32,
    request_index: u32,
    approver: &Address,
    approvals: u32,
) {
    let data = RequestApproved {
        request_index,
        approver: approver.clone(),
        approvals,
    };
    publish(env, symbol_short!("approved"), creator, index, data);
}

pub fn emit_funds_spent(
    env: &Env,
    creator: &Address,
    index: u32,
    request_index: u32,
    amount: i128,
    receiver: &Address,
    raised_amount: i128,
) {
    let data = FundsSpent {
        request_index,
        amount,
        receiver: receiver.clone(),
        raised_amount,
    };
    publish(env, symbol_short!("spent"), creator, index, data);
}
