//! Database layer: migrations, queries, and cursor management.

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::info;

use crate::errors::Result;
use crate::events::{EscrowEvent, EventRecord};

const EVENT_COLUMNS: &str = "id, event_id, event_type, creator, project_index, request_index, \
     actor, amount, ledger, timestamp, contract_id, tx_hash, created_at";

/// Open (creating if needed) the SQLite database and run pending migrations.
pub async fn init_pool(database_url: &str) -> Result<SqlitePool> {
    let url = if database_url.starts_with("sqlite:") {
        database_url.to_string()
    } else {
        format!("sqlite:{database_url}")
    };
    let options = SqliteConnectOptions::from_str(&url)?.create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("Database migrations applied successfully");
    Ok(pool)
}

// ─────────────────────────────────────────────────────────
// Cursor helpers
// ─────────────────────────────────────────────────────────

/// Read the last-seen ledger from the cursor row.
/// Returns `0` when no cursor has been persisted yet.
pub async fn get_last_ledger(pool: &SqlitePool) -> Result<i64> {
    let row: Option<(i64,)> = sqlx::query_as("SELECT last_ledger FROM indexer_cursor WHERE id = 1")
        .fetch_optional(pool)
        .await?;
    Ok(row.map(|(v,)| v).unwrap_or(0))
}

/// Persist the last-seen ledger and the pagination cursor, if any.
pub async fn save_cursor(
    pool: &SqlitePool,
    last_ledger: i64,
    last_cursor: Option<&str>,
) -> Result<()> {
    sqlx::query("UPDATE indexer_cursor SET last_ledger = ?1, last_cursor = ?2 WHERE id = 1")
        .bind(last_ledger)
        .bind(last_cursor)
        .execute(pool)
        .await?;
    Ok(())
}

/// Read back the raw cursor string (used to resume pagination mid-ledger).
pub async fn get_cursor_string(pool: &SqlitePool) -> Result<Option<String>> {
    let row: Option<(Option<String>,)> =
        sqlx::query_as("SELECT last_cursor FROM indexer_cursor WHERE id = 1")
            .fetch_optional(pool)
            .await?;
    Ok(row.and_then(|(v,)| v))
}

// ─────────────────────────────────────────────────────────
// Event writes
// ─────────────────────────────────────────────────────────

/// Persist a batch of decoded events in one transaction. An event whose
/// `event_id` is already stored is skipped, so replaying a page is harmless.
///
/// Returns the number of rows actually inserted.
pub async fn insert_events(pool: &SqlitePool, events: &[EscrowEvent]) -> Result<usize> {
    let mut tx = pool.begin().await?;
    let mut count = 0usize;
    for ev in events {
        let rows_affected = sqlx::query(
            r#"
            INSERT OR IGNORE INTO events
                (event_id, event_type, creator, project_index, request_index,
                 actor, amount, ledger, timestamp, contract_id, tx_hash)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&ev.event_id)
        .bind(&ev.event_type)
        .bind(&ev.creator)
        .bind(ev.project_index)
        .bind(ev.request_index)
        .bind(&ev.actor)
        .bind(&ev.amount)
        .bind(ev.ledger)
        .bind(ev.timestamp)
        .bind(&ev.contract_id)
        .bind(&ev.tx_hash)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        count += rows_affected as usize;
    }
    tx.commit().await?;
    Ok(count)
}

// ─────────────────────────────────────────────────────────
// Event reads
// ─────────────────────────────────────────────────────────

/// All events for one project, oldest first.
pub async fn get_events_for_project(
    pool: &SqlitePool,
    creator: &str,
    project_index: i64,
) -> Result<Vec<EventRecord>> {
    let sql = format!(
        "SELECT {EVENT_COLUMNS} FROM events \
         WHERE creator = ?1 AND project_index = ?2 \
         ORDER BY ledger ASC, id ASC"
    );
    let rows = sqlx::query_as::<_, EventRecord>(&sql)
        .bind(creator)
        .bind(project_index)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Fetch all events, ordered by ledger ascending.
pub async fn get_all_events(pool: &SqlitePool) -> Result<Vec<EventRecord>> {
    let sql = format!("SELECT {EVENT_COLUMNS} FROM events ORDER BY ledger ASC, id ASC");
    let rows = sqlx::query_as::<_, EventRecord>(&sql)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Every creator that has opened a project, in order of their first project.
pub async fn get_creators(pool: &SqlitePool) -> Result<Vec<String>> {
    let rows: Vec<(String,)> = sqlx::query_as(
        r#"
        SELECT creator
        FROM   events
        WHERE  event_type = 'project_created' AND creator IS NOT NULL
        GROUP  BY creator
        ORDER  BY MIN(id) ASC
        "#,
    )
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(|(c,)| c).collect())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Single-connection in-memory database with migrations applied.
    pub(crate) async fn memory_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();
        pool
    }

    pub(crate) fn event(id: &str, kind: &str, creator: &str, index: i64, ledger: i64) -> EscrowEvent {
        EscrowEvent {
            event_id: id.to_string(),
            event_type: kind.to_string(),
            creator: Some(creator.to_string()),
            project_index: Some(index),
            request_index: None,
            actor: Some("GACTOR".to_string()),
            amount: Some("100".to_string()),
            ledger,
            timestamp: 1_704_067_200,
            contract_id: "CESCROW".to_string(),
            tx_hash: Some(format!("tx-{id}")),
        }
    }

    #[tokio::test]
    async fn insert_is_idempotent_on_event_id() {
        let pool = memory_pool().await;
        let batch = vec![
            event("e1", "project_created", "GBOB", 0, 10),
            event("e2", "contributed", "GBOB", 0, 11),
        ];

        assert_eq!(insert_events(&pool, &batch).await.unwrap(), 2);
        assert_eq!(insert_events(&pool, &batch).await.unwrap(), 0);
        assert_eq!(get_all_events(&pool).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn project_filter_matches_creator_and_index() {
        let pool = memory_pool().await;
        let batch = vec![
            event("e1", "project_created", "GBOB", 0, 10),
            event("e2", "project_created", "GBOB", 1, 11),
            event("e3", "contributed", "GBOB", 0, 12),
            event("e4", "project_created", "GCAROL", 0, 13),
        ];
        insert_events(&pool, &batch).await.unwrap();

        let bob_first = get_events_for_project(&pool, "GBOB", 0).await.unwrap();
        let ids: Vec<&str> = bob_first.iter().map(|e| e.event_id.as_str()).collect();
        assert_eq!(ids, vec!["e1", "e3"]);
        assert_eq!(bob_first[1].amount.as_deref(), Some("100"));

        assert!(get_events_for_project(&pool, "GCAROL", 1)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn creators_listed_once_in_first_seen_order() {
        let pool = memory_pool().await;
        let batch = vec![
            event("e1", "project_created", "GCAROL", 0, 10),
            event("e2", "project_created", "GBOB", 0, 11),
            event("e3", "project_created", "GCAROL", 1, 12),
            event("e4", "contributed", "GDAVE", 0, 13),
        ];
        insert_events(&pool, &batch).await.unwrap();

        assert_eq!(get_creators(&pool).await.unwrap(), vec!["GCAROL", "GBOB"]);
    }

    #[tokio::test]
    async fn cursor_round_trips() {
        let pool = memory_pool().await;
        assert_eq!(get_last_ledger(&pool).await.unwrap(), 0);
        assert_eq!(get_cursor_string(&pool).await.unwrap(), None);

        save_cursor(&pool, 4_200, Some("0000018038862241792-0000000000"))
            .await
            .unwrap();
        assert_eq!(get_last_ledger(&pool).await.unwrap(), 4_200);
        assert_eq!(
            get_cursor_string(&pool).await.unwrap().as_deref(),
            Some("0000018038862241792-0000000000")
        );
    }
}
