//! Canonical event types emitted by the escrow ledger contract.
//!
//! These mirror the Soroban contract events defined in
//! `contracts/escrow_ledger/src/events.rs`. Every contract event carries the
//! topics `(symbol, creator, project_index)`.

use serde::{Deserialize, Serialize};

/// All recognised event kinds from the escrow contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A creator opened a project (`created` topic).
    ProjectCreated,
    /// Value was credited to a project (`contrib` topic).
    Contributed,
    /// The part of a contribution above the target went back (`refunded` topic).
    Refunded,
    /// A contributor reclaimed their stake (`withdrawn` topic).
    Withdrawn,
    /// The creator proposed a disbursement (`requested` topic).
    FundsRequested,
    /// A contributor voted for a request (`approved` topic).
    RequestApproved,
    /// An approved request was paid out (`spent` topic).
    FundsSpent,
    /// An event from this contract that we don't recognise yet.
    Unknown,
}

impl EventKind {
    /// Parse the leading topic symbol string produced by Soroban into an [`EventKind`].
    pub fn from_topic(topic: &str) -> Self {
        match topic {
            "created" => Self::ProjectCreated,
            "contrib" => Self::Contributed,
            "refunded" => Self::Refunded,
            "withdrawn" => Self::Withdrawn,
            "requested" => Self::FundsRequested,
            "approved" => Self::RequestApproved,
            "spent" => Self::FundsSpent,
            _ => Self::Unknown,
        }
    }

    /// Return a short identifier string suitable for storage in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProjectCreated => "project_created",
            Self::Contributed => "contributed",
            Self::Refunded => "refunded",
            Self::Withdrawn => "withdrawn",
            Self::FundsRequested => "funds_requested",
            Self::RequestApproved => "request_approved",
            Self::FundsSpent => "funds_spent",
            Self::Unknown => "unknown",
        }
    }
}

/// A fully decoded escrow event, ready to be stored in the database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscrowEvent {
    /// RPC event id, or a synthesized key when the RPC omits it.
    pub event_id: String,
    pub event_type: String,
    pub creator: Option<String>,
    pub project_index: Option<i64>,
    pub request_index: Option<i64>,
    pub actor: Option<String>,
    pub amount: Option<String>,
    pub ledger: i64,
    pub timestamp: i64,
    pub contract_id: String,
    pub tx_hash: Option<String>,
}

/// An event record as stored in / read from the database.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct EventRecord {
    pub id: i64,
    pub event_id: String,
    pub event_type: String,
    pub creator: Option<String>,
    pub project_index: Option<i64>,
    pub request_index: Option<i64>,
    pub actor: Option<String>,
    pub amount: Option<String>,
    pub ledger: i64,
    pub timestamp: i64,
    pub contract_id: String,
    pub tx_hash: Option<String>,
    pub created_at: i64,
}
