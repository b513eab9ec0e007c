//! # Types
//!
//! Shared data structures used across all modules of the escrow ledger.
//!
//! ## Design decisions
//!
//! ### Config / State split
//!
//! A project is internally stored as two separate ledger entries:
//!
//! - [`ProjectConfig`]: written once at creation; never mutated.
//! - [`ProjectState`]: rewritten on every contribution, withdrawal,
//!   request and spend.
//!
//! Contributions and spend requests live under their own keys so that a
//! vote or a top-up never rewrites the whole project. The public API exposes
//! the reconstructed [`ProjectDetails`] projection for convenience.
//!
//! ### Sticky flags
//!
//! `ProjectState::target_reached` and `SpendRequest::spent` only ever move
//! from `false` to `true`:
//!
//! ```text
//! target_reached:  false ──(raised == target)──► true
//! spent:           false ──(spend_funds)───────► true
//! ```

use soroban_sdk::{contracttype, Address, Bytes, Vec};

/// Immutable project configuration, written once at creation.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProjectConfig {
    pub title: Bytes,
    pub description: Bytes,
    /// Smallest value a single `contribute` call may carry.
    pub min_contribution: i128,
    /// Ceiling for `ProjectState::raised_amount`.
    pub target_amount: i128,
}

/// Mutable project state.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProjectState {
    /// Always within `0..=target_amount`.
    pub raised_amount: i128,
    pub target_reached: bool,
    /// Number of contribution entries, withdrawn ones included.
    pub contributor_count: u32,
    pub request_count: u32,
}

/// One contributor's stake in a project.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Contribution {
    pub contributor: Address,
    /// Zeroed on withdrawal; never topped up again afterwards.
    pub amount: i128,
    /// Ledger timestamp of the first contribution.
    pub time: u64,
}

/// A creator-proposed disbursement, executable once a strict majority of
/// contributors approve it.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SpendRequest {
    pub amount: i128,
    pub receiver: Address,
    pub purpose: Bytes,
    /// Approving contributors in voting order.
    pub approvers: Vec<Address>,
    pub spent: bool,
}

/// Full read-only view of a project.
///
/// Reconstructed from the split config/state entries plus every
/// contribution and spend request, in insertion order.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProjectDetails {
    pub creator: Address,
    pub index: u32,
    pub title: Bytes,
    pub description: Bytes,
    pub min_contribution: i128,
    pub target_amount: i128,
    pub raised_amount: i128,
    pub target_reached: bool,
    pub contributions: Vec<Contribution>,
    pub spend_requests: Vec<SpendRequest>,
}
