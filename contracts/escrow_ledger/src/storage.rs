//! # Storage
//!
//! Provides typed helpers over Soroban's two storage tiers used by the ledger:
//!
//! ## Instance storage (contract-lifetime TTL)
//!
//! | Key      | Type      | Description                                |
//! |----------|-----------|--------------------------------------------|
//! | `Token`  | `Address` | Asset held in custody by the contract      |
//!
//! Instance TTL is bumped by **7 days** whenever it falls below 1 day remaining.
//!
//! ## Persistent storage (per-entry TTL)
//!
//! | Key                     | Type            | Description                          |
//! |-------------------------|-----------------|--------------------------------------|
//! | `CreatorCount`          | `u32`           | Number of known creators             |
//! | `Creator(n)`            | `Address`       | The n-th creator, first-seen order   |
//! | `KnownCreator(addr)`    | `bool`          | Dedup marker for `Creator(n)`        |
//! | `ProjectCount(addr)`    | `u32`           | Length of a creator's project list   |
//! | `ProjConfig(project)`   | `ProjectConfig` | Immutable project configuration      |
//! | `ProjState(project)`    | `ProjectState`  | Mutable project state                |
//! | `Contributors(project)` | `Vec<Address>`  | Contributors in insertion order      |
//! | `Contrib(contribution)` | `Contribution`  | One contributor's stake              |
//! | `SpendReq(request)`     | `SpendRequest`  | One spend request                    |
//! | `Approval(approval)`    | `bool`          | Presence marks an approver           |
//!
//! Persistent TTL is bumped by **30 days** whenever it falls below 7 days remaining.
//!
//! ## Why keyed entries instead of nested vectors?
//!
//! Contributor and approver lookups hit a single key instead of scanning a
//! vector. The creator registry is open to anyone, so it is a counter plus
//! one entry per creator and registering costs the same at any size. The `Contributors` list and `SpendRequest::approvers` keep the
//! insertion order for enumeration only.

use soroban_sdk::{contracttype, Address, Env, Vec};

use crate::types::{Contribution, ProjectConfig, ProjectState, SpendRequest};

// ── TTL Constants ────────────────────────────────────────────────────

/// Approximate ledgers per day (~5 seconds per ledger).
const DAY_IN_LEDGERS: u32 = 17_280;

/// Instance storage: bump by 7 days when below 1 day remaining.
const INSTANCE_BUMP_AMOUNT: u32 = 7 * DAY_IN_LEDGERS;
const INSTANCE_LIFETIME_THRESHOLD: u32 = DAY_IN_LEDGERS;

/// Persistent storage: bump by 30 days when below 7 days remaining.
const PERSISTENT_BUMP_AMOUNT: u32 = 30 * DAY_IN_LEDGERS;
const PERSISTENT_LIFETIME_THRESHOLD: u32 = 7 * DAY_IN_LEDGERS;

// ── Storage Keys ─────────────────────────────────────────────────────

/// Identifies a project: position `index` in `creator`'s project list.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProjectKey {
    pub creator: Address,
    pub index: u32,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ContributionKey {
    pub project: ProjectKey,
    pub contributor: Address,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RequestKey {
    pub project: ProjectKey,
    pub request: u32,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ApprovalKey {
    pub request: RequestKey,
    pub approver: Address,
}

/// All contract storage keys.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DataKey {
    /// Custody token (Instance).
    Token,
    /// Number of distinct creators (Persistent).
    CreatorCount,
    /// Creator at a first-seen position (Persistent).
    Creator(u32),
    /// Marks a creator as already registered (Persistent).
    KnownCreator(Address),
    /// Number of projects opened by a creator (Persistent).
    ProjectCount(Address),
    /// Immutable project configuration (Persistent).
    ProjConfig(ProjectKey),
    /// Mutable project state (Persistent).
    ProjState(ProjectKey),
    /// Contributor addresses in insertion order (Persistent).
    Contributors(ProjectKey),
    /// A single contribution entry (Persistent).
    Contrib(ContributionKey),
    /// A single spend request (Persistent).
    SpendReq(RequestKey),
    /// Approval marker for one approver of one request (Persistent).
    Approval(ApprovalKey),
}

impl ProjectKey {
    pub fn new(creator: &Address, index: u32) -> Self {
        ProjectKey {
            creator: creator.clone(),
            index,
        }
    }

    pub fn contribution(&self, contributor: &Address) -> ContributionKey {
        ContributionKey {
            project: self.clone(),
            contributor: contributor.clone(),
        }
    }

    pub fn request(&self, request: u32) -> RequestKey {
        RequestKey {
            project: self.clone(),
            request,
        }
    }
}

impl RequestKey {
    pub fn approval(&self, approver: &Address) -> ApprovalKey {
        ApprovalKey {
            request: self.clone(),
            approver: approver.clone(),
        }
    }
}

// ── Instance Storage Helpers ─────────────────────────────────────────

/// Extend instance storage TTL if it falls below the threshold.
fn bump_instance(env: &Env) {
    env.storage()
        .instance()
        .extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
}

/// Store the custody token address.
pub fn set_token(env: &Env, token: &Address) {
    env.storage().instance().set(&DataKey::Token, token);
    bump_instance(env);
}

/// Retrieve the custody token address.
/// Panics if the contract was deployed without one, which the constructor rules out.
pub fn get_token(env: &Env) -> Address {
    bump_instance(env);
    env.storage()
        .instance()
        .get(&DataKey::Token)
        .expect("token not set")
}

// ── Persistent Storage Helpers ───────────────────────────────────────

/// Extend the TTL for a persistent storage key.
fn bump_persistent(env: &Env, key: &DataKey) {
    env.storage()
        .persistent()
        .extend_ttl(key, PERSISTENT_LIFETIME_THRESHOLD, PERSISTENT_BUMP_AMOUNT);
}

fn read<V>(env: &Env, key: &DataKey) -> Option<V>
where
    V: soroban_sdk::TryFromVal<Env, soroban_sdk::Val>,
{
    let value = env.storage().persistent().get(key);
    if value.is_some() {
        bump_persistent(env, key);
    }
    value
}

fn write<V>(env: &Env, key: &DataKey, value: &V)
where
    V: soroban_sdk::IntoVal<Env, soroban_sdk::Val>,
{
    env.storage().persistent().set(key, value);
    bump_persistent(env, key);
}

// ── Creator registry ─────────────────────────────────────────────────

/// Add `creator` to the enumeration unless it is already there.
pub fn register_creator(env: &Env, creator: &Address) {
    let marker = DataKey::KnownCreator(creator.clone());
    if read::<bool>(env, &marker).is_some() {
        return;
    }
    let count = creator_count(env);
    write(env, &DataKey::Creator(count), creator);
    write(env, &DataKey::CreatorCount, &(count + 1));
    write(env, &marker, &true);
}

pub fn creator_count(env: &Env) -> u32 {
    read(env, &DataKey::CreatorCount).unwrap_or(0)
}

/// Up to `limit` creators starting at position `start`.
pub fn get_creators(env: &Env, start: u32, limit: u32) -> Vec<Address> {
    let end = start.saturating_add(limit).min(creator_count(env));
    let mut creators = Vec::new(env);
    for position in start..end {
        if let Some(creator) = read(env, &DataKey::Creator(position)) {
            creators.push_back(creator);
        }
    }
    creators
}

pub fn project_count(env: &Env, creator: &Address) -> u32 {
    read(env, &DataKey::ProjectCount(creator.clone())).unwrap_or(0)
}

/// Append a project to `creator`'s list and return its permanent index.
pub fn push_project(
    env: &Env,
    creator: &Address,
    config: &ProjectConfig,
    state: &ProjectState,
) -> u32 {
    let index = project_count(env, creator);
    let key = ProjectKey::new(creator, index);

    write(env, &DataKey::ProjConfig(key.clone()), config);
    write(env, &DataKey::ProjState(key), state);
    write(env, &DataKey::ProjectCount(creator.clone()), &(index + 1));
    index
}

// ── Projects ─────────────────────────────────────────────────────────

/// Load only the immutable project configuration.
pub fn load_project_config(env: &Env, key: &ProjectKey) -> Option<ProjectConfig> {
    read(env, &DataKey::ProjConfig(key.clone()))
}

/// Load only the mutable project state.
pub fn load_project_state(env: &Env, key: &ProjectKey) -> Option<ProjectState> {
    read(env, &DataKey::ProjState(key.clone()))
}

/// Load config and state together. `None` when the index is out of bounds.
pub fn load_project_pair(env: &Env, key: &ProjectKey) -> Option<(ProjectConfig, ProjectState)> {
    let config = load_project_config(env, key)?;
    let state = load_project_state(env, key)?;
    Some((config, state))
}

/// Save only the mutable project state.
pub fn save_project_state(env: &Env, key: &ProjectKey, state: &ProjectState) {
    write(env, &DataKey::ProjState(key.clone()), state);
}

// ── Contributions ────────────────────────────────────────────────────

pub fn load_contribution(
    env: &Env,
    key: &ProjectKey,
    contributor: &Address,
) -> Option<Contribution> {
    read(env, &DataKey::Contrib(key.contribution(contributor)))
}

/// Overwrite an existing contribution entry.
pub fn save_contribution(env: &Env, key: &ProjectKey, contribution: &Contribution) {
    write(
        env,
        &DataKey::Contrib(key.contribution(&contribution.contributor)),
        contribution,
    );
}

/// Store a first-time contribution and append its contributor to the
/// enumeration list. The caller bumps `ProjectState::contributor_count`.
pub fn append_contribution(env: &Env, key: &ProjectKey, contribution: &Contribution) {
    let list_key = DataKey::Contributors(key.clone());
    let mut contributors: Vec<Address> = read(env, &list_key).unwrap_or_else(|| Vec::new(env));
    contributors.push_back(contribution.contributor.clone());
    write(env, &list_key, &contributors);
    save_contribution(env, key, contribution);
}

/// Every contribution entry of a project, in insertion order.
pub fn load_contributions(env: &Env, key: &ProjectKey) -> Vec<Contribution> {
    let contributors: Vec<Address> =
        read(env, &DataKey::Contributors(key.clone())).unwrap_or_else(|| Vec::new(env));
    let mut out = Vec::new(env);
    for contributor in contributors.iter() {
        if let Some(entry) = load_contribution(env, key, &contributor) {
            out.push_back(entry);
        }
    }
    out
}

// ── Spend requests ───────────────────────────────────────────────────

pub fn load_request(env: &Env, key: &ProjectKey, request: u32) -> Option<SpendRequest> {
    read(env, &DataKey::SpendReq(key.request(request)))
}

pub fn save_request(env: &Env, key: &ProjectKey, request: u32, value: &SpendRequest) {
    write(env, &DataKey::SpendReq(key.request(request)), value);
}

/// Every spend request of a project, in creation order.
pub fn load_requests(env: &Env, key: &ProjectKey, count: u32) -> Vec<SpendRequest> {
    let mut out = Vec::new(env);
    for request in 0..count {
        if let Some(value) = load_request(env, key, request) {
            out.push_back(value);
        }
    }
    out
}

pub fn has_approved(env: &Env, key: &ProjectKey, request: u32, approver: &Address) -> bool {
    read::<bool>(
        env,
        &DataKey::Approval(key.request(request).approval(approver)),
    )
    .is_some()
}

pub fn mark_approved(env: &Env, key: &ProjectKey, request: u32, approver: &Address) {
    write(
        env,
        &DataKey::Approval(key.request(request).approval(approver)),
        &true,
    );
}
