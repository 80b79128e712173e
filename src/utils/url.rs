// src/utils/url.rs

//! URL construction and href parsing for the catalogue.
//!
//! Listing pages live at `/tags/<key>/resources`, item pages at
//! `/resources/<id>` and tag pages at `/tags/<key>`. Parsing works on path
//! segments, so hosts, query strings and trailing slashes don't matter.

use url::Url;

/// URL of one page of a tag's resource listing.
///
/// # Examples
/// ```
/// use harvester::utils::url::listing_url;
///
/// assert_eq!(
///     listing_url("https://nanohub.org", "quantum dots", 1000, 2000),
///     "https://nanohub.org/tags/quantum+dots/resources?limit=1000&sort=date&active=resources&start=2000"
/// );
/// ```
pub fn listing_url(base_url: &str, tag: &str, page_size: usize, offset: usize) -> String {
    format!(
        "{}/tags/{}/resources?limit={}&sort=date&active=resources&start={}",
        base_url.trim_end_matches('/'),
        tag.trim().replace(' ', "+"),
        page_size,
        offset
    )
}

/// URL of an item's detail page.
pub fn detail_url(base_url: &str, item_id: &str) -> String {
    format!(
        "{}/resources/{}",
        base_url.trim_end_matches('/'),
        item_id.trim_matches('/')
    )
}

/// Item id from a link to its detail page: everything after `/resources/`.
///
/// Relative hrefs are resolved against `base_url`.
pub fn item_id_from_href(base_url: &str, href: &str) -> Option<String> {
    let segments = path_segments(base_url, href)?;
    let start = segments.iter().position(|s| *s == "resources")? + 1;
    let id = segments[start..].join("/");
    (!id.is_empty()).then_some(id)
}

/// Canonical tag key from a link to a tag page: the segment after `/tags/`.
pub fn tag_key_from_href(base_url: &str, href: &str) -> Option<String> {
    let segments = path_segments(base_url, href)?;
    let start = segments.iter().position(|s| *s == "tags")? + 1;
    segments.get(start).map(|key| key.to_string())
}

fn path_segments(base_url: &str, href: &str) -> Option<Vec<String>> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    let base = Url::parse(base_url).ok()?;
    let url = base.join(href).ok()?;
    let segments = url
        .path_segments()?
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    Some(segments)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://nanohub.org";

    #[test]
    fn test_listing_url_offsets() {
        assert_eq!(
            listing_url("https://nanohub.org/", "graphene", 50, 0),
            "https://nanohub.org/tags/graphene/resources?limit=50&sort=date&active=resources&start=0"
        );
    }

    #[test]
    fn test_detail_url() {
        assert_eq!(
            detail_url(BASE, "tools/pntoy"),
            "https://nanohub.org/resources/tools/pntoy"
        );
    }

    #[test]
    fn test_item_id_absolute_and_relative() {
        assert_eq!(
            item_id_from_href(BASE, "https://nanohub.org/resources/12345"),
            Some("12345".to_string())
        );
        assert_eq!(
            item_id_from_href(BASE, "/resources/tools/pntoy/"),
            Some("tools/pntoy".to_string())
        );
        assert_eq!(
            item_id_from_href(BASE, "/resources/777?rec=1#top"),
            Some("777".to_string())
        );
    }

    #[test]
    fn test_item_id_not_found() {
        assert_eq!(item_id_from_href(BASE, "/tags/graphene"), None);
        assert_eq!(item_id_from_href(BASE, "/resources/"), None);
        assert_eq!(item_id_from_href(BASE, ""), None);
    }

    #[test]
    fn test_tag_key() {
        assert_eq!(
            tag_key_from_href(BASE, "https://nanohub.org/tags/quantumdots"),
            Some("quantumdots".to_string())
        );
        assert_eq!(
            tag_key_from_href(BASE, "/tags/nems/resources"),
            Some("nems".to_string())
        );
        assert_eq!(tag_key_from_href(BASE, "/tags/"), None);
        assert_eq!(tag_key_from_href(BASE, "/resources/1"), None);
    }
}
