//! Table definitions.
//!
//! Links cascade on delete of either side; `Store` turns foreign keys on for
//! every connection so SQLite actually enforces it.

use sqlx::SqlitePool;

use crate::error::Result;

const CREATE_ITEMS: &str = r#"
    CREATE TABLE IF NOT EXISTS items (
        id TEXT PRIMARY KEY,
        title TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT
    )
"#;

const CREATE_TAGS: &str = r#"
    CREATE TABLE IF NOT EXISTS tags (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        key TEXT NOT NULL UNIQUE,
        label TEXT,
        created_at TEXT NOT NULL
    )
"#;

const CREATE_AUTHORS: &str = r#"
    CREATE TABLE IF NOT EXISTS authors (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        created_at TEXT NOT NULL,
        updated_at TEXT
    )
"#;

const CREATE_ITEM_TAGS: &str = r#"
    CREATE TABLE IF NOT EXISTS item_tags (
        item_id TEXT NOT NULL REFERENCES items(id) ON DELETE CASCADE,
        tag_id INTEGER NOT NULL REFERENCES tags(id) ON DELETE CASCADE,
        created_at TEXT NOT NULL,
        PRIMARY KEY (item_id, tag_id)
    )
"#;

const CREATE_ITEM_AUTHORS: &str = r#"
    CREATE TABLE IF NOT EXISTS item_authors (
        item_id TEXT NOT NULL REFERENCES items(id) ON DELETE CASCADE,
        author_id INTEGER NOT NULL REFERENCES authors(id) ON DELETE CASCADE,
        created_at TEXT NOT NULL,
        PRIMARY KEY (item_id, author_id)
    )
"#;

const CREATE_INDEXES: [&str; 3] = [
    "CREATE INDEX IF NOT EXISTS idx_tags_label ON tags(label)",
    "CREATE INDEX IF NOT EXISTS idx_item_tags_tag ON item_tags(tag_id)",
    "CREATE INDEX IF NOT EXISTS idx_item_authors_author ON item_authors(author_id)",
];

/// Create all tables and indexes (idempotent).
pub async fn create_all(pool: &SqlitePool) -> Result<()> {
    for statement in [
        CREATE_ITEMS,
        CREATE_TAGS,
        CREATE_AUTHORS,
        CREATE_ITEM_TAGS,
        CREATE_ITEM_AUTHORS,
    ] {
        sqlx::query(statement).execute(pool).await?;
    }
    for statement in CREATE_INDEXES {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}
