//! `Record` implementations for every entity kind.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;

use crate::error::Result;
use crate::models::{Author, Item, ItemAuthorLink, ItemTagLink, Tag};
use crate::storage::upsert::{Existing, Record};

#[async_trait]
impl Record for Item {
    const KIND: &'static str = "items";

    async fn find_existing(&self, conn: &mut SqliteConnection) -> Result<Option<Existing>> {
        let created_at: Option<DateTime<Utc>> =
            sqlx::query_scalar("SELECT created_at FROM items WHERE id = ?")
                .bind(&self.id)
                .fetch_optional(&mut *conn)
                .await?;
        Ok(created_at.map(|created_at| Existing {
            id: None,
            created_at,
        }))
    }

    async fn insert(
        &mut self,
        conn: &mut SqliteConnection,
        created_at: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query("INSERT INTO items (id, title, created_at) VALUES (?, ?, ?)")
            .bind(&self.id)
            .bind(&self.title)
            .bind(created_at)
            .execute(&mut *conn)
            .await?;
        self.created_at = Some(created_at);
        self.updated_at = None;
        Ok(())
    }

    async fn merge(
        &mut self,
        conn: &mut SqliteConnection,
        updated_at: DateTime<Utc>,
    ) -> Result<()> {
        // A missing title (detail page without a header) keeps the stored one.
        sqlx::query(
            "UPDATE items SET title = COALESCE(?, title), updated_at = ? WHERE id = ?",
        )
        .bind(&self.title)
        .bind(updated_at)
        .bind(&self.id)
        .execute(&mut *conn)
        .await?;
        self.updated_at = Some(updated_at);
        Ok(())
    }

    fn adopt(&mut self, existing: Existing) {
        self.created_at = Some(existing.created_at);
    }
}

#[async_trait]
impl Record for Tag {
    const KIND: &'static str = "tags";

    async fn find_existing(&self, conn: &mut SqliteConnection) -> Result<Option<Existing>> {
        let row: Option<(i64, DateTime<Utc>)> =
            sqlx::query_as("SELECT id, created_at FROM tags WHERE key = ?")
                .bind(&self.key)
                .fetch_optional(&mut *conn)
                .await?;
        Ok(row.map(|(id, created_at)| Existing {
            id: Some(id),
            created_at,
        }))
    }

    async fn insert(
        &mut self,
        conn: &mut SqliteConnection,
        created_at: DateTime<Utc>,
    ) -> Result<()> {
        let result = sqlx::query("INSERT INTO tags (key, label, created_at) VALUES (?, ?, ?)")
            .bind(&self.key)
            .bind(&self.label)
            .bind(created_at)
            .execute(&mut *conn)
            .await?;
        self.id = Some(result.last_insert_rowid());
        self.created_at = Some(created_at);
        Ok(())
    }

    /// Tags have no update timestamp; only the label can change.
    async fn merge(
        &mut self,
        conn: &mut SqliteConnection,
        _updated_at: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query("UPDATE tags SET label = ? WHERE key = ?")
            .bind(&self.label)
            .bind(&self.key)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    fn adopt(&mut self, existing: Existing) {
        self.id = existing.id;
        self.created_at = Some(existing.created_at);
    }
}

#[async_trait]
impl Record for Author {
    const KIND: &'static str = "authors";

    async fn find_existing(&self, conn: &mut SqliteConnection) -> Result<Option<Existing>> {
        let row: Option<(i64, DateTime<Utc>)> =
            sqlx::query_as("SELECT id, created_at FROM authors WHERE name = ?")
                .bind(&self.name)
                .fetch_optional(&mut *conn)
                .await?;
        Ok(row.map(|(id, created_at)| Existing {
            id: Some(id),
            created_at,
        }))
    }

    async fn insert(
        &mut self,
        conn: &mut SqliteConnection,
        created_at: DateTime<Utc>,
    ) -> Result<()> {
        let result = sqlx::query("INSERT INTO authors (name, created_at) VALUES (?, ?)")
            .bind(&self.name)
            .bind(created_at)
            .execute(&mut *conn)
            .await?;
        self.id = Some(result.last_insert_rowid());
        self.created_at = Some(created_at);
        self.updated_at = None;
        Ok(())
    }

    /// Authors are only ever ensured, never updated.
    async fn merge(
        &mut self,
        _conn: &mut SqliteConnection,
        _updated_at: DateTime<Utc>,
    ) -> Result<()> {
        Ok(())
    }

    fn adopt(&mut self, existing: Existing) {
        self.id = existing.id;
        self.created_at = Some(existing.created_at);
    }
}

#[async_trait]
impl Record for ItemTagLink {
    const KIND: &'static str = "item_tags";

    async fn find_existing(&self, conn: &mut SqliteConnection) -> Result<Option<Existing>> {
        let created_at: Option<DateTime<Utc>> = sqlx::query_scalar(
            "SELECT created_at FROM item_tags WHERE item_id = ? AND tag_id = ?",
        )
        .bind(&self.item_id)
        .bind(self.tag_id)
        .fetch_optional(&mut *conn)
        .await?;
        Ok(created_at.map(|created_at| Existing {
            id: None,
            created_at,
        }))
    }

    async fn insert(
        &mut self,
        conn: &mut SqliteConnection,
        created_at: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query("INSERT INTO item_tags (item_id, tag_id, created_at) VALUES (?, ?, ?)")
            .bind(&self.item_id)
            .bind(self.tag_id)
            .bind(created_at)
            .execute(&mut *conn)
            .await?;
        self.created_at = Some(created_at);
        Ok(())
    }

    /// Links carry no mutable fields.
    async fn merge(
        &mut self,
        _conn: &mut SqliteConnection,
        _updated_at: DateTime<Utc>,
    ) -> Result<()> {
        Ok(())
    }

    fn adopt(&mut self, existing: Existing) {
        self.created_at = Some(existing.created_at);
    }
}

#[async_trait]
impl Record for ItemAuthorLink {
    const KIND: &'static str = "item_authors";

    async fn find_existing(&self, conn: &mut SqliteConnection) -> Result<Option<Existing>> {
        let created_at: Option<DateTime<Utc>> = sqlx::query_scalar(
            "SELECT created_at FROM item_authors WHERE item_id = ? AND author_id = ?",
        )
        .bind(&self.item_id)
        .bind(self.author_id)
        .fetch_optional(&mut *conn)
        .await?;
        Ok(created_at.map(|created_at| Existing {
            id: None,
            created_at,
        }))
    }

    async fn insert(
        &mut self,
        conn: &mut SqliteConnection,
        created_at: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO item_authors (item_id, author_id, created_at) VALUES (?, ?, ?)",
        )
        .bind(&self.item_id)
        .bind(self.author_id)
        .bind(created_at)
        .execute(&mut *conn)
        .await?;
        self.created_at = Some(created_at);
        Ok(())
    }

    /// Links carry no mutable fields.
    async fn merge(
        &mut self,
        _conn: &mut SqliteConnection,
        _updated_at: DateTime<Utc>,
    ) -> Result<()> {
        Ok(())
    }

    fn adopt(&mut self, existing: Existing) {
        self.created_at = Some(existing.created_at);
    }
}
