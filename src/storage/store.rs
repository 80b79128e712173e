//! SQLite-backed entity store.
//!
//! The store holds a single-connection pool: the harvester is strictly
//! sequential, and an in-memory database only lives as long as its one
//! connection. Lookup and delete helpers take `&mut SqliteConnection` so they
//! run equally on a pooled connection or inside a transaction.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use sqlx::pool::PoolConnection;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Sqlite, SqliteConnection, SqlitePool, Transaction};

use crate::error::Result;
use crate::models::{Item, Tag};
use crate::storage::schema;

/// Handle to the persistence session.
#[derive(Debug, Clone)]
pub struct Store {
    pool: SqlitePool,
}

/// Row counts per table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreCounts {
    pub items: i64,
    pub tags: i64,
    pub authors: i64,
    pub item_tags: i64,
    pub item_authors: i64,
}

impl Store {
    /// Open (or create) the database file and ensure the schema exists.
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let newly_created = !path.exists();

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));
        let store = Self::connect(options).await?;

        if newly_created {
            log::info!("Initialized new database: {}", path.display());
        } else {
            log::info!("Opened existing database: {}", path.display());
        }
        Ok(store)
    }

    /// Create a private in-memory store.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        Self::connect(options).await
    }

    async fn connect(options: SqliteConnectOptions) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>)
            .connect_with(options)
            .await?;
        schema::create_all(&pool).await?;
        Ok(Self { pool })
    }

    /// Start a unit of work. Dropping the transaction without committing
    /// rolls it back.
    pub async fn begin(&self) -> Result<Transaction<'static, Sqlite>> {
        Ok(self.pool.begin().await?)
    }

    /// Borrow the connection for reads outside a transaction.
    pub async fn acquire(&self) -> Result<PoolConnection<Sqlite>> {
        Ok(self.pool.acquire().await?)
    }

    /// Row counts for every table.
    pub async fn counts(&self) -> Result<StoreCounts> {
        let mut conn = self.acquire().await?;
        let (items, tags, authors, item_tags, item_authors): (i64, i64, i64, i64, i64) =
            sqlx::query_as(
                r#"
                SELECT
                    (SELECT COUNT(*) FROM items),
                    (SELECT COUNT(*) FROM tags),
                    (SELECT COUNT(*) FROM authors),
                    (SELECT COUNT(*) FROM item_tags),
                    (SELECT COUNT(*) FROM item_authors)
                "#,
            )
            .fetch_one(&mut *conn)
            .await?;
        Ok(StoreCounts {
            items,
            tags,
            authors,
            item_tags,
            item_authors,
        })
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Fetch an item by id.
pub async fn find_item(conn: &mut SqliteConnection, item_id: &str) -> Result<Option<Item>> {
    let row: Option<(String, Option<String>, DateTime<Utc>, Option<DateTime<Utc>>)> =
        sqlx::query_as("SELECT id, title, created_at, updated_at FROM items WHERE id = ?")
            .bind(item_id)
            .fetch_optional(&mut *conn)
            .await?;
    Ok(row.map(|(id, title, created_at, updated_at)| Item {
        id,
        title,
        created_at: Some(created_at),
        updated_at,
    }))
}

/// Fetch a tag by canonical key.
pub async fn find_tag_by_key(conn: &mut SqliteConnection, key: &str) -> Result<Option<Tag>> {
    let row: Option<(i64, String, Option<String>, DateTime<Utc>)> =
        sqlx::query_as("SELECT id, key, label, created_at FROM tags WHERE key = ?")
            .bind(key)
            .fetch_optional(&mut *conn)
            .await?;
    Ok(row.map(|(id, key, label, created_at)| Tag {
        id: Some(id),
        key,
        label: label.unwrap_or_default(),
        created_at: Some(created_at),
    }))
}

/// Fetch the first tag carrying a display label.
pub async fn find_tag_by_label(conn: &mut SqliteConnection, label: &str) -> Result<Option<Tag>> {
    let row: Option<(i64, String, Option<String>, DateTime<Utc>)> = sqlx::query_as(
        "SELECT id, key, label, created_at FROM tags WHERE label = ? ORDER BY id LIMIT 1",
    )
    .bind(label)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(row.map(|(id, key, label, created_at)| Tag {
        id: Some(id),
        key,
        label: label.unwrap_or_default(),
        created_at: Some(created_at),
    }))
}

/// Keys of all tags linked to an item, in key order.
pub async fn tag_keys_for_item(conn: &mut SqliteConnection, item_id: &str) -> Result<Vec<String>> {
    let keys = sqlx::query_scalar(
        r#"
        SELECT t.key
        FROM item_tags l
        JOIN tags t ON t.id = l.tag_id
        WHERE l.item_id = ?
        ORDER BY t.key
        "#,
    )
    .bind(item_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(keys)
}

/// Names of all authors linked to an item, in name order.
pub async fn author_names_for_item(
    conn: &mut SqliteConnection,
    item_id: &str,
) -> Result<Vec<String>> {
    let names = sqlx::query_scalar(
        r#"
        SELECT a.name
        FROM item_authors l
        JOIN authors a ON a.id = l.author_id
        WHERE l.item_id = ?
        ORDER BY a.name
        "#,
    )
    .bind(item_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(names)
}

/// Number of tag links an item has.
pub async fn count_tag_links(conn: &mut SqliteConnection, item_id: &str) -> Result<i64> {
    let count = sqlx::query_scalar("SELECT COUNT(*) FROM item_tags WHERE item_id = ?")
        .bind(item_id)
        .fetch_one(&mut *conn)
        .await?;
    Ok(count)
}

/// Remove the link between an item and the tag with `key`.
pub async fn delete_tag_link(conn: &mut SqliteConnection, item_id: &str, key: &str) -> Result<bool> {
    let result = sqlx::query(
        "DELETE FROM item_tags WHERE item_id = ? AND tag_id = (SELECT id FROM tags WHERE key = ?)",
    )
    .bind(item_id)
    .bind(key)
    .execute(&mut *conn)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Delete every tag with a display label; links cascade.
pub async fn delete_tags_by_label(conn: &mut SqliteConnection, label: &str) -> Result<u64> {
    let result = sqlx::query("DELETE FROM tags WHERE label = ?")
        .bind(label)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected())
}

/// Delete an item; links cascade.
pub async fn delete_item(conn: &mut SqliteConnection, item_id: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM items WHERE id = ?")
        .bind(item_id)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected() > 0)
}
