//! Data extracted from listing and detail pages.

/// One row of a tag listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemSummary {
    pub item_id: String,
    pub title: String,

    /// Raw text of the row's details block, if the row had one
    pub details: Option<String>,
}

/// A tag as seen on a page.
///
/// Detail pages always carry the canonical key. The listing only knows the
/// label of the tag being crawled, so `key` is `None` there.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObservedTag {
    pub key: Option<String>,
    pub label: String,
}

impl ObservedTag {
    pub fn keyed(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            label: label.into(),
        }
    }

    pub fn label_only(label: impl Into<String>) -> Self {
        Self {
            key: None,
            label: label.into(),
        }
    }
}

/// The parsed content of an item's detail page.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DetailPage {
    pub title: Option<String>,
    pub tags: Vec<ObservedTag>,
}
