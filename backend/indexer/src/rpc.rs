//! Soroban RPC client. Polls `getEvents` and decodes escrow ledger events.
//!
//! ## Resilience
//!
//! * Exponential back-off is applied when the RPC returns a soft error or a
//!   rate-limit response, capped at [`MAX_BACKOFF_SECS`] seconds.
//! * Transient network errors (connection reset, timeout) are retried silently.
//! * JSON-RPC codes `-32600` / `-32601` mean the request itself is wrong and
//!   are returned immediately.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::errors::{IndexerError, Result};
use crate::events::{EscrowEvent, EventKind};

const MAX_BACKOFF_SECS: u64 = 60;
const INITIAL_BACKOFF_SECS: u64 = 2;

// ─────────────────────────────────────────────────────────
// JSON-RPC response shapes
// ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RpcResponse {
    pub result: Option<EventsResult>,
    pub error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

impl RpcError {
    fn is_fatal(&self) -> bool {
        self.code == -32600 || self.code == -32601
    }
}

#[derive(Debug, Deserialize)]
pub struct EventsResult {
    pub events: Vec<RawEvent>,
    pub cursor: Option<String>,
    #[serde(rename = "latestLedger")]
    pub latest_ledger: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RawEvent {
    /// Topics as ScVal JSON (requested with `xdrFormat: "json"`).
    #[serde(rename = "topicJson", default)]
    pub topic_json: Vec<Value>,
    /// Event data as ScVal JSON.
    #[serde(rename = "valueJson", default)]
    pub value_json: Value,
    #[serde(rename = "contractId")]
    pub contract_id: Option<String>,
    #[serde(rename = "txHash")]
    pub tx_hash: Option<String>,
    pub id: Option<String>,
    pub ledger: Option<u64>,
    #[serde(rename = "ledgerClosedAt")]
    pub ledger_closed_at: Option<String>,
}

/// One page of `getEvents` output.
#[derive(Debug)]
pub struct EventsPage {
    pub events: Vec<RawEvent>,
    /// Opaque cursor to continue from, if the RPC returned one.
    pub cursor: Option<String>,
    pub latest_ledger: Option<u64>,
}

/// Doubling retry delay.
struct Backoff {
    secs: u64,
}

impl Backoff {
    fn new() -> Self {
        Backoff {
            secs: INITIAL_BACKOFF_SECS,
        }
    }

    async fn wait(&mut self) {
        tokio::time::sleep(Duration::from_secs(self.secs)).await;
        self.secs = (self.secs * 2).min(MAX_BACKOFF_SECS);
    }
}

// ─────────────────────────────────────────────────────────
// Public API
// ─────────────────────────────────────────────────────────

/// Fetch a page of events for `contract_id`.
///
/// * `start_ledger`: the ledger sequence to scan from (inclusive); ignored
///   when `cursor` is set.
/// * `cursor`: optional pagination cursor from a previous page.
/// * `limit`: maximum number of events to return.
pub async fn fetch_events(
    client: &Client,
    rpc_url: &str,
    contract_id: &str,
    start_ledger: u32,
    cursor: Option<&str>,
    limit: u32,
) -> Result<EventsPage> {
    let mut backoff = Backoff::new();
    let request = json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "getEvents",
        "params": build_params(contract_id, start_ledger, cursor, limit),
    });

    loop {
        let resp = match client.post(rpc_url).json(&request).send().await {
            Ok(resp) => resp,
            Err(e) => {
                warn!("RPC request failed (will retry in {}s): {e}", backoff.secs);
                backoff.wait().await;
                continue;
            }
        };

        if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            warn!("Rate-limited by RPC (will retry in {}s)", backoff.secs);
            backoff.wait().await;
            continue;
        }

        let body: RpcResponse = resp.json().await?;
        if let Some(err) = body.error {
            if err.is_fatal() {
                return Err(IndexerError::Rpc(format!(
                    "hard error {}: {}",
                    err.code, err.message
                )));
            }
            warn!(
                "RPC soft error (will retry in {}s): {} {}",
                backoff.secs, err.code, err.message
            );
            backoff.wait().await;
            continue;
        }

        let result = body
            .result
            .ok_or_else(|| IndexerError::Rpc("Empty result from getEvents".to_string()))?;
        debug!(
            "Fetched {} events (latest_ledger={:?})",
            result.events.len(),
            result.latest_ledger
        );
        return Ok(EventsPage {
            events: result.events,
            cursor: result.cursor,
            latest_ledger: result.latest_ledger,
        });
    }
}

fn build_params(contract_id: &str, start_ledger: u32, cursor: Option<&str>, limit: u32) -> Value {
    let mut params = json!({
        "filters": [{ "type": "contract", "contractIds": [contract_id] }],
        "pagination": { "limit": limit },
        "xdrFormat": "json",
    });

    match cursor {
        Some(cur) => params["pagination"]["cursor"] = json!(cur),
        None => params["startLedger"] = json!(start_ledger),
    }
    params
}

// ─────────────────────────────────────────────────────────
// Event decoding
// ─────────────────────────────────────────────────────────

/// Decode a list of raw RPC events into [`EscrowEvent`] structs.
/// Events without a leading symbol topic are logged and dropped.
pub fn decode_events(raw: &[RawEvent], contract_id: &str) -> Vec<EscrowEvent> {
    raw.iter()
        .filter_map(|e| match decode_single(e, contract_id) {
            Ok(event) => Some(event),
            Err(err) => {
                warn!("Skipping event: {err}");
                None
            }
        })
        .collect()
}

fn decode_single(raw: &RawEvent, contract_id: &str) -> Result<EscrowEvent> {
    let undecodable = |reason| IndexerError::UndecodableEvent {
        event_id: raw.id.clone().unwrap_or_else(|| "-".to_string()),
        reason,
    };
    let symbol = raw
        .topic_json
        .first()
        .ok_or_else(|| undecodable("no topics"))?;
    let kind = EventKind::from_topic(
        &scval_scalar(symbol).ok_or_else(|| undecodable("first topic is not a scalar"))?,
    );

    let ledger = raw.ledger.unwrap_or(0) as i64;
    let timestamp = raw
        .ledger_closed_at
        .as_deref()
        .and_then(parse_iso_to_unix)
        .unwrap_or(0);

    let creator = raw.topic_json.get(1).and_then(scval_scalar);
    let project_index = raw
        .topic_json
        .get(2)
        .and_then(scval_scalar)
        .and_then(|i| i.parse::<i64>().ok());

    let payload = decode_data(&raw.value_json, &kind);
    let event_type = kind.as_str().to_string();

    let event_id = raw.id.clone().unwrap_or_else(|| {
        format!(
            "{ledger}:{}:{event_type}:{}:{}:{}",
            raw.tx_hash.as_deref().unwrap_or("-"),
            creator.as_deref().unwrap_or("-"),
            project_index.map(|i| i.to_string()).unwrap_or_default(),
            payload.actor.as_deref().unwrap_or("-"),
        )
    });

    Ok(EscrowEvent {
        event_id,
        event_type,
        creator,
        project_index,
        request_index: payload.request_index,
        actor: payload.actor,
        amount: payload.amount,
        ledger,
        timestamp,
        contract_id: raw
            .contract_id
            .clone()
            .unwrap_or_else(|| contract_id.to_string()),
        tx_hash: raw.tx_hash.clone(),
    })
}

/// Fields pulled out of an event's data payload.
#[derive(Debug, Default, PartialEq)]
struct Payload {
    actor: Option<String>,
    amount: Option<String>,
    request_index: Option<i64>,
}

/// Pull apart the event data. Contract event structs arrive as an ScVal
/// map keyed by field name.
fn decode_data(value: &Value, kind: &EventKind) -> Payload {
    let request_index = || field(value, "request_index").and_then(|s| s.parse::<i64>().ok());

    match kind {
        EventKind::ProjectCreated => Payload {
            actor: field(value, "creator"),
            amount: field(value, "target_amount"),
            request_index: None,
        },
        EventKind::Contributed | EventKind::Refunded | EventKind::Withdrawn => Payload {
            actor: field(value, "contributor"),
            amount: field(value, "amount"),
            request_index: None,
        },
        EventKind::FundsRequested | EventKind::FundsSpent => Payload {
            actor: field(value, "receiver"),
            amount: field(value, "amount"),
            request_index: request_index(),
        },
        EventKind::RequestApproved => Payload {
            actor: field(value, "approver"),
            amount: None,
            request_index: request_index(),
        },
        EventKind::Unknown => Payload::default(),
    }
}

/// Scalar value of `key` in an ScVal map
/// (`{"map":[{"key":{"symbol":k},"val":v}, ...]}`) or a plain JSON object.
fn field(value: &Value, key: &str) -> Option<String> {
    if let Some(entries) = value.get("map").and_then(Value::as_array) {
        return entries
            .iter()
            .find(|entry| {
                entry
                    .get("key")
                    .and_then(scval_scalar)
                    .is_some_and(|k| k == key)
            })
            .and_then(|entry| entry.get("val"))
            .and_then(scval_scalar);
    }
    value.get(key).and_then(scval_scalar)
}

/// Render a scalar ScVal as a string: `{"symbol":"contrib"}` gives
/// `contrib`, `{"u32":3}` gives `3`, `{"i128":"4600"}` gives `4600`.
/// Bare JSON strings and numbers pass through.
fn scval_scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Object(map) if map.len() == 1 => {
            let (_, inner) = map.iter().next()?;
            match inner {
                Value::Object(parts) if parts.contains_key("hi") && parts.contains_key("lo") => {
                    int128_parts(inner)
                }
                Value::Object(_) | Value::Array(_) => None,
                _ => scval_scalar(inner),
            }
        }
        _ => None,
    }
}

/// `{"hi":h,"lo":l}` 128-bit integer parts as a decimal string.
fn int128_parts(parts: &Value) -> Option<String> {
    let hi = parts.get("hi")?.as_i64()?;
    let lo = parts.get("lo")?.as_u64()?;
    Some((((hi as i128) << 64) | lo as i128).to_string())
}

/// Parse an ISO-8601 timestamp string into a Unix epoch (seconds).
fn parse_iso_to_unix(s: &str) -> Option<i64> {
    chrono::DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.timestamp())
}

// ─────────────────────────────────────────────────────────
// Unit tests
// ─────────────────────────────────────────────────────────
