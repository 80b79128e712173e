// src/services/authors.rs

//! Author extraction and linking.
//!
//! Author links are append-only: a name missing from a later listing does
//! not unlink it.

use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;

use crate::error::{AppError, Result};
use crate::models::{Author, ItemAuthorLink};
use crate::storage::{UpsertOutcome, ensure};

/// Result of scanning a details block for authors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorList {
    /// The delimiter was present; names follow it (possibly none).
    Found(Vec<String>),
    /// No delimiter, so the row lists no authors.
    NotFound,
}

/// Split the author names out of a listing row's details text.
///
/// The text is free-form up to `delimiter`, then a comma-separated name list.
pub fn parse_authors(details: &str, delimiter: &str) -> AuthorList {
    match details.split_once(delimiter) {
        Some((_, names)) => AuthorList::Found(
            names
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .collect(),
        ),
        None => AuthorList::NotFound,
    }
}

/// Counts of rows created while linking one item's authors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AuthorLinkStats {
    pub authors_created: usize,
    pub links_created: usize,
}

/// Creates authors and item-author links; never updates or removes either.
#[derive(Debug, Clone, Copy)]
pub struct AuthorLinker {
    at: DateTime<Utc>,
}

impl AuthorLinker {
    pub fn new(at: DateTime<Utc>) -> Self {
        Self { at }
    }

    /// Ensure each author exists and is linked to `item_id`.
    pub async fn link(
        &self,
        conn: &mut SqliteConnection,
        item_id: &str,
        names: &[String],
    ) -> Result<AuthorLinkStats> {
        let mut stats = AuthorLinkStats::default();
        for name in names {
            log::trace!("link_author(author: {name}, item: {item_id})");

            let mut author = Author::new(name.as_str());
            if ensure(conn, &mut author, self.at).await? == UpsertOutcome::Created {
                stats.authors_created += 1;
                log::debug!("Added new author: {name}");
            }
            let author_id = author
                .id
                .ok_or_else(|| AppError::validation(format!("author '{name}' has no id")))?;

            let mut link = ItemAuthorLink::new(item_id, author_id);
            match ensure(conn, &mut link, self.at).await? {
                UpsertOutcome::Created => stats.links_created += 1,
                _ => log::trace!("Author link exists ({name}, {item_id})"),
            }
        }
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Item;
    use crate::storage::store::author_names_for_item;
    use crate::storage::{Store, upsert};

    const DELIM: &str = ":: ";

    #[test]
    fn test_parse_authors_found() {
        assert_eq!(
            parse_authors("Online Presentations | 2019 | Contributor(s):: Ann Lee, Bo Chan", DELIM),
            AuthorList::Found(vec!["Ann Lee".to_string(), "Bo Chan".to_string()])
        );
    }

    #[test]
    fn test_parse_authors_single_name() {
        assert_eq!(
            parse_authors("Tools:: Gerhard Klimeck", DELIM),
            AuthorList::Found(vec!["Gerhard Klimeck".to_string()])
        );
    }

    #[test]
    fn test_parse_authors_missing_delimiter() {
        assert_eq!(parse_authors("Series | 2020", DELIM), AuthorList::NotFound);
        assert_eq!(parse_authors("", DELIM), AuthorList::NotFound);
    }

    #[test]
    fn test_parse_authors_empty_after_delimiter() {
        assert_eq!(parse_authors("Tools:: ", DELIM), AuthorList::Found(vec![]));
        assert_eq!(
            parse_authors("Tools:: A, , B,", DELIM),
            AuthorList::Found(vec!["A".to_string(), "B".to_string()])
        );
    }

    async fn store_with_item(id: &str) -> Store {
        let store = Store::in_memory().await.unwrap();
        let mut conn = store.acquire().await.unwrap();
        upsert(&mut conn, &mut Item::new(id, None), Utc::now())
            .await
            .unwrap();
        drop(conn);
        store
    }

    #[tokio::test]
    async fn test_link_creates_authors_and_links_once() {
        let store = store_with_item("1").await;
        let linker = AuthorLinker::new(Utc::now());
        let names = vec!["X".to_string(), "Y".to_string()];
        let mut conn = store.acquire().await.unwrap();

        let first = linker.link(&mut conn, "1", &names).await.unwrap();
        assert_eq!(
            first,
            AuthorLinkStats {
                authors_created: 2,
                links_created: 2
            }
        );

        for _ in 0..3 {
            let again = linker.link(&mut conn, "1", &names).await.unwrap();
            assert_eq!(again, AuthorLinkStats::default());
        }
        drop(conn);

        let counts = store.counts().await.unwrap();
        assert_eq!(counts.authors, 2);
        assert_eq!(counts.item_authors, 2);
    }

    #[tokio::test]
    async fn test_links_are_append_only() {
        let store = store_with_item("1").await;
        let linker = AuthorLinker::new(Utc::now());
        let mut conn = store.acquire().await.unwrap();

        linker.link(&mut conn, "1", &["X".to_string()]).await.unwrap();
        // A later listing with no authors (or different ones) never unlinks X.
        linker.link(&mut conn, "1", &[]).await.unwrap();
        linker.link(&mut conn, "1", &["Z".to_string()]).await.unwrap();

        let names = author_names_for_item(&mut conn, "1").await.unwrap();
        assert_eq!(names, vec!["X".to_string(), "Z".to_string()]);
    }

    #[tokio::test]
    async fn test_author_shared_between_items() {
        let store = store_with_item("1").await;
        let at = Utc::now();
        let mut conn = store.acquire().await.unwrap();
        upsert(&mut conn, &mut Item::new("2", None), at).await.unwrap();

        let linker = AuthorLinker::new(at);
        linker.link(&mut conn, "1", &["X".to_string()]).await.unwrap();
        let stats = linker.link(&mut conn, "2", &["X".to_string()]).await.unwrap();
        assert_eq!(stats.authors_created, 0);
        assert_eq!(stats.links_created, 1);
        drop(conn);

        assert_eq!(store.counts().await.unwrap().authors, 1);
    }
}
