//! Timestamp-aware create-or-merge primitive shared by every entity write.
//!
//! A record is looked up by its natural (or surrogate) key. Absent rows are
//! inserted with `created_at` set to the supplied timestamp; present rows keep
//! their original `created_at` and get `updated_at` plus all mutable fields
//! written. Link rows and authors only ever take the create-only path
//! ([`ensure`]).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;

use crate::error::Result;

/// What an upsert did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Updated,
    /// Create-only write that found the row already present
    Unchanged,
}

/// Identity of a row that is already persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Existing {
    /// Surrogate id, for kinds that have one
    pub id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// An entity kind the store knows how to look up, insert and merge.
#[async_trait]
pub trait Record: Send + Sync {
    /// Table name, used in log lines.
    const KIND: &'static str;

    /// Look up the persisted row with this record's key.
    async fn find_existing(&self, conn: &mut SqliteConnection) -> Result<Option<Existing>>;

    /// First persistence. Implementations store any assigned surrogate id.
    async fn insert(
        &mut self,
        conn: &mut SqliteConnection,
        created_at: DateTime<Utc>,
    ) -> Result<()>;

    /// Write all mutable fields of an already persisted row.
    async fn merge(
        &mut self,
        conn: &mut SqliteConnection,
        updated_at: DateTime<Utc>,
    ) -> Result<()>;

    /// Take over the persisted identity and creation time.
    fn adopt(&mut self, existing: Existing);

    /// Called before the row is written.
    fn before_save(&mut self) {}

    /// Called after the row is written (or found unchanged).
    fn after_save(&self, _outcome: UpsertOutcome) {}
}

/// Insert `record` if absent, otherwise merge it into the persisted row.
pub async fn upsert<R: Record>(
    conn: &mut SqliteConnection,
    record: &mut R,
    at: DateTime<Utc>,
) -> Result<UpsertOutcome> {
    record.before_save();
    let outcome = match record.find_existing(conn).await? {
        None => {
            record.insert(conn, at).await?;
            UpsertOutcome::Created
        }
        Some(existing) => {
            record.adopt(existing);
            record.merge(conn, at).await?;
            UpsertOutcome::Updated
        }
    };
    log::trace!("upsert {} -> {:?}", R::KIND, outcome);
    record.after_save(outcome);
    Ok(outcome)
}

/// Insert `record` if absent; never modify a persisted row.
pub async fn ensure<R: Record>(
    conn: &mut SqliteConnection,
    record: &mut R,
    at: DateTime<Utc>,
) -> Result<UpsertOutcome> {
    record.before_save();
    let outcome = match record.find_existing(conn).await? {
        None => {
            record.insert(conn, at).await?;
            UpsertOutcome::Created
        }
        Some(existing) => {
            record.adopt(existing);
            UpsertOutcome::Unchanged
        }
    };
    log::trace!("ensure {} -> {:?}", R::KIND, outcome);
    record.after_save(outcome);
    Ok(outcome)
}
