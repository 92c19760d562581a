//! Release model and the list operations shared by every store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Marker that brackets the upgrade prerequisites section of a release body.
pub const PREREQUISITES_MARKER: &str = "<!--upgrade-prerequisites-required-->";

/// One published entry of the release feed, identified by its tag name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Release {
    pub tag_name: String,
    pub release_name: String,
    pub body: String,
    pub created_at: Option<DateTime<Utc>>,
    pub published_at: Option<DateTime<Utc>>,
    pub tag_link: String,
    pub prerequisite: bool,
    pub prerequisite_message: String,
}

impl Release {
    /// Build a release and derive its tag link and prerequisite fields.
    pub fn new(
        tag_name: String,
        release_name: String,
        body: String,
        created_at: Option<DateTime<Utc>>,
        published_at: Option<DateTime<Utc>>,
        tag_link_base: &str,
    ) -> Self {
        let tag_link = format!("{}/{}", tag_link_base.trim_end_matches('/'), tag_name);
        let mut release = Self {
            tag_name,
            release_name,
            body,
            created_at,
            published_at,
            tag_link,
            ..Default::default()
        };
        release.refresh_prerequisite();
        release
    }

    /// Recompute `prerequisite` and `prerequisite_message` from the body.
    pub fn refresh_prerequisite(&mut self) {
        let (prerequisite, message) = extract_prerequisite(&self.body);
        self.prerequisite = prerequisite;
        self.prerequisite_message = message.unwrap_or_default();
    }
}

/// Locate the prerequisites section of a release body.
///
/// Returns whether the marker is present at all, and the text enclosed by its
/// first and last occurrence (marker text stripped) when it occurs at least twice.
pub fn extract_prerequisite(body: &str) -> (bool, Option<String>) {
    let Some(start) = body.find(PREREQUISITES_MARKER) else {
        return (false, None);
    };
    let end = body.rfind(PREREQUISITES_MARKER).unwrap_or(start);
    if end == start {
        return (true, None);
    }

    let message = body[start..end].replace(PREREQUISITES_MARKER, "");
    (true, Some(message))
}

/// Merge a release into a newest-first list.
///
/// A release whose tag is already listed overwrites the mutable fields of that
/// entry in place; an unknown tag is prepended as the new latest release.
pub fn merge_release(list: &mut Vec<Release>, incoming: Release) {
    match list.iter_mut().find(|r| r.tag_name == incoming.tag_name) {
        Some(existing) => {
            existing.release_name = incoming.release_name;
            existing.body = incoming.body;
            existing.prerequisite = incoming.prerequisite;
            existing.prerequisite_message = incoming.prerequisite_message;
        }
        None => list.insert(0, incoming),
    }
}

/// Fold a freshly fetched newest-first list into the stored one.
///
/// Fetched entries win by tag and new tags keep the fetched order ahead of
/// older entries. Releases only the store knows about are kept.
pub fn reconcile_releases(stored: Vec<Release>, fetched: Vec<Release>) -> Vec<Release> {
    let mut list = stored;
    for release in fetched.into_iter().rev() {
        merge_release(&mut list, release);
    }
    list
}

/// Return the `[offset, offset + size)` window of a list, clamped to its length.
/// A `size` of zero means "everything after `offset`".
pub fn paginate(list: &[Release], offset: usize, size: usize) -> Vec<Release> {
    let take = if size == 0 { usize::MAX } else { size };
    list.iter().skip(offset).take(take).cloned().collect()
}

/// A snapshot of the release list as persisted by the relational store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseNoteRecord {
    pub id: i64,
    pub release_note: Vec<Release>,
    pub is_active: bool,
    pub created_on: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_on: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn release(tag: &str, name: &str, body: &str) -> Release {
        Release::new(
            tag.to_string(),
            name.to_string(),
            body.to_string(),
            None,
            None,
            "https://github.com/acme/app/releases/tag",
        )
    }

    #[test]
    fn test_tag_link_is_derived() {
        let r = release("v1.2.0", "v1.2.0", "");
        assert_eq!(r.tag_link, "https://github.com/acme/app/releases/tag/v1.2.0");
    }

    #[test]
    fn test_prerequisite_between_markers() {
        let body = "intro <!--upgrade-prerequisites-required-->do X<!--upgrade-prerequisites-required-->outro";
        let r = release("v1", "v1", body);
        assert!(r.prerequisite);
        assert_eq!(r.prerequisite_message, "do X");
    }

    #[test]
    fn test_prerequisite_single_marker_has_no_message() {
        let (flag, message) = extract_prerequisite("see <!--upgrade-prerequisites-required--> below");
        assert!(flag);
        assert!(message.is_none());
    }

    #[test]
    fn test_prerequisite_absent() {
        let r = release("v1", "v1", "just fixes");
        assert!(!r.prerequisite);
        assert_eq!(r.prerequisite_message, "");
    }

    #[test]
    fn test_prerequisite_strips_inner_markers() {
        let m = PREREQUISITES_MARKER;
        let body = format!("{m}a{m}b{m}");
        let (_, message) = extract_prerequisite(&body);
        assert_eq!(message.as_deref(), Some("ab"));
    }

    #[test]
    fn test_merge_prepends_new_tag() {
        let mut list = vec![release("v1", "one", "")];
        merge_release(&mut list, release("v2", "two", ""));
        let tags: Vec<_> = list.iter().map(|r| r.tag_name.as_str()).collect();
        assert_eq!(tags, vec!["v2", "v1"]);
    }

    #[test]
    fn test_merge_same_tag_last_write_wins() {
        let mut list = vec![release("v2", "two", "old"), release("v1", "one", "")];
        merge_release(&mut list, release("v2", "two (edited)", "new body"));

        assert_eq!(list.len(), 2);
        assert_eq!(list[0].tag_name, "v2");
        assert_eq!(list[0].release_name, "two (edited)");
        assert_eq!(list[0].body, "new body");
    }

    #[test]
    fn test_merge_edit_keeps_position() {
        let mut list = vec![release("v2", "two", ""), release("v1", "one", "")];
        merge_release(&mut list, release("v1", "one again", ""));
        assert_eq!(list[0].tag_name, "v2");
        assert_eq!(list[1].release_name, "one again");
    }

    #[test]
    fn test_reconcile_into_empty_store_keeps_fetched_order() {
        let fetched = vec![release("v3", "", ""), release("v2", "", ""), release("v1", "", "")];
        let list = reconcile_releases(Vec::new(), fetched);
        let tags: Vec<_> = list.iter().map(|r| r.tag_name.as_str()).collect();
        assert_eq!(tags, vec!["v3", "v2", "v1"]);
    }

    #[test]
    fn test_reconcile_keeps_store_only_releases() {
        let stored = vec![release("v0-hotfix", "hotfix", ""), release("v1", "one", "old")];
        let fetched = vec![release("v2", "two", ""), release("v1", "one (edited)", "new")];

        let list = reconcile_releases(stored, fetched);
        let tags: Vec<_> = list.iter().map(|r| r.tag_name.as_str()).collect();
        assert_eq!(tags, vec!["v2", "v0-hotfix", "v1"]);
        assert_eq!(list[2].release_name, "one (edited)");
        assert_eq!(list[2].body, "new");
    }

    #[test]
    fn test_paginate_window() {
        let list: Vec<_> = (0..10).map(|i| release(&format!("v{i}"), "", "")).collect();

        let page = paginate(&list, 2, 3);
        let tags: Vec<_> = page.iter().map(|r| r.tag_name.as_str()).collect();
        assert_eq!(tags, vec!["v2", "v3", "v4"]);

        assert!(paginate(&list, 12, 3).is_empty());
        assert_eq!(paginate(&list, 8, 5).len(), 2);
        assert_eq!(paginate(&list, 0, 0).len(), 10);
    }
}
