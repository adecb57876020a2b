//! Page ordering and position tracking for a loaded archive.
//!
//! A [`Navigator`] holds an immutable [`PageList`] and an optional current
//! index. Programmatic moves outside the list are ignored; page numbers typed
//! by a user are validated and rejected with [`NavError::InvalidPageNumber`].

use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::error::{NavError, Result};
use crate::natural;

/// File extensions recognized as pages, compared case-insensitively.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "gif", "tif", "tiff"];

/// One entry as reported by an archive collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveRecord {
    pub key: String,
    pub is_directory: bool,
    pub is_readable: bool,
}

/// Returns `true` if `key` names an image file by extension.
pub fn is_image_key(key: &str) -> bool {
    if key.ends_with('/') {
        return false;
    }

    Path::new(key)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
}

/// A single page of the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryRef {
    key: String,
    readable: bool,
}

impl EntryRef {
    pub fn new(key: impl Into<String>, readable: bool) -> Self {
        Self {
            key: key.into(),
            readable,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn is_readable(&self) -> bool {
        self.readable
    }
}

/// Pages in reading order. Cloning shares the underlying list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageList {
    entries: Arc<[EntryRef]>,
}

impl PageList {
    /// Keep image files only and sort them in natural order.
    ///
    /// Names the comparator considers equal (`p01` and `p1`) are ordered by
    /// their raw bytes, so the result depends only on the set of names.
    pub fn from_records(records: impl IntoIterator<Item = ArchiveRecord>) -> Self {
        let mut entries: Vec<EntryRef> = records
            .into_iter()
            .filter(|r| !r.is_directory && is_image_key(&r.key))
            .map(|r| EntryRef::new(r.key, r.is_readable))
            .collect();

        entries.sort_by(|a, b| {
            natural::compare(&a.key, &b.key).then_with(|| a.key.cmp(&b.key))
        });

        Self {
            entries: entries.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&EntryRef> {
        self.entries.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, EntryRef> {
        self.entries.iter()
    }
}

/// Everything a presenter needs to draw the current position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageView {
    /// 1-based page number
    pub display_index: usize,
    pub count: usize,
    pub is_at_first: bool,
    pub is_at_last: bool,
    pub current_key: String,
    pub readable: bool,
}

/// Current page position over a [`PageList`].
#[derive(Debug, Clone, Default)]
pub struct Navigator {
    pages: PageList,
    current: Option<usize>,
}

impl Navigator {
    /// Create a navigator with no pages.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the page list with the image entries of `records`.
    ///
    /// On success no page is selected yet; call [`first`](Self::first) to
    /// show the opening page. If no image entries remain, returns
    /// [`NavError::EmptyArchive`] and keeps the previous pages and position.
    pub fn load(&mut self, records: impl IntoIterator<Item = ArchiveRecord>) -> Result<()> {
        let pages = PageList::from_records(records);
        if pages.is_empty() {
            return Err(NavError::EmptyArchive);
        }

        debug!(count = pages.len(), "loaded page list");
        self.pages = pages;
        self.current = None;
        Ok(())
    }

    /// Drop all pages.
    pub fn clear(&mut self) {
        self.pages = PageList::default();
        self.current = None;
    }

    /// Move to `index`.
    ///
    /// Returns `Ok(None)` without changing anything when `index` is out of
    /// range. When the target page is unreadable the position still moves and
    /// [`NavError::PageUnreadable`] is returned.
    pub fn go_to(&mut self, index: usize) -> Result<Option<PageView>> {
        let Some(entry) = self.pages.get(index) else {
            return Ok(None);
        };
        let readable = entry.is_readable();

        self.current = Some(index);
        debug!(index, "moved to page");

        if !readable {
            let key = entry.key().to_string();
            debug!(index, key = %key, "page is unreadable");
            return Err(NavError::PageUnreadable { index, key });
        }

        Ok(self.view())
    }

    pub fn next(&mut self) -> Result<Option<PageView>> {
        match self.current {
            Some(i) => self.go_to(i + 1),
            None => self.go_to(0),
        }
    }

    pub fn prev(&mut self) -> Result<Option<PageView>> {
        match self.current.and_then(|i| i.checked_sub(1)) {
            Some(i) => self.go_to(i),
            None => Ok(None),
        }
    }

    pub fn first(&mut self) -> Result<Option<PageView>> {
        self.go_to(0)
    }

    pub fn last(&mut self) -> Result<Option<PageView>> {
        match self.pages.len().checked_sub(1) {
            Some(i) => self.go_to(i),
            None => Ok(None),
        }
    }

    /// Jump to a page number typed by the user (1-based).
    ///
    /// Unlike [`go_to`](Self::go_to), input that is not a number or names a
    /// page outside the list is rejected with
    /// [`NavError::InvalidPageNumber`] and the position is left alone.
    pub fn jump_to_page_number(&mut self, input: &str) -> Result<Option<PageView>> {
        let index = input
            .trim()
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .filter(|&i| i < self.pages.len())
            .ok_or_else(|| NavError::InvalidPageNumber {
                input: input.to_string(),
            })?;

        self.go_to(index)
    }

    pub fn pages(&self) -> &PageList {
        &self.pages
    }

    pub fn count(&self) -> usize {
        self.pages.len()
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn current_entry(&self) -> Option<&EntryRef> {
        self.current.and_then(|i| self.pages.get(i))
    }

    pub fn display_index(&self) -> Option<usize> {
        self.current.map(|i| i + 1)
    }

    pub fn is_at_first(&self) -> bool {
        self.current == Some(0)
    }

    pub fn is_at_last(&self) -> bool {
        self.current.is_some() && self.current == self.pages.len().checked_sub(1)
    }

    /// Snapshot of the current position, or `None` when no page is selected.
    pub fn view(&self) -> Option<PageView> {
        let entry = self.current_entry()?;
        Some(PageView {
            display_index: self.display_index()?,
            count: self.count(),
            is_at_first: self.is_at_first(),
            is_at_last: self.is_at_last(),
            current_key: entry.key().to_string(),
            readable: entry.is_readable(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(key: &str) -> ArchiveRecord {
        ArchiveRecord {
            key: key.to_string(),
            is_directory: false,
            is_readable: true,
        }
    }

    fn locked(key: &str) -> ArchiveRecord {
        ArchiveRecord {
            is_readable: false,
            ..page(key)
        }
    }

    fn loaded(keys: &[&str]) -> Navigator {
        let mut nav = Navigator::new();
        nav.load(keys.iter().map(|k| page(k))).expect("load");
        nav
    }

    fn keys(nav: &Navigator) -> Vec<&str> {
        nav.pages().iter().map(EntryRef::key).collect()
    }

    #[test]
    fn image_filter_matches_known_extensions() {
        assert!(is_image_key("a/b/001.JPG"));
        assert!(is_image_key("cover.tiff"));
        assert!(is_image_key("x.Png"));
        assert!(!is_image_key("ComicInfo.xml"));
        assert!(!is_image_key("jpg"));
        assert!(!is_image_key("folder.png/"));
    }

    #[test]
    fn load_filters_and_sorts() {
        let mut nav = Navigator::new();
        nav.load(vec![
            page("p10.png"),
            page("ComicInfo.xml"),
            ArchiveRecord {
                key: "scans.jpg/".into(),
                is_directory: true,
                is_readable: true,
            },
            page("p2.png"),
            page("P1.PNG"),
        ])
        .expect("load");

        assert_eq!(keys(&nav), vec!["P1.PNG", "p2.png", "p10.png"]);
        assert_eq!(nav.current_index(), None);
        assert!(nav.view().is_none());
    }

    #[test]
    fn load_order_ignores_input_order() {
        let a = loaded(&["c10.jpg", "c2.jpg", "c1.jpg", "c01.jpg"]);
        let b = loaded(&["c01.jpg", "c1.jpg", "c2.jpg", "c10.jpg"]);
        assert_eq!(keys(&a), keys(&b));
        assert_eq!(keys(&a), vec!["c01.jpg", "c1.jpg", "c2.jpg", "c10.jpg"]);
    }

    #[test]
    fn empty_load_keeps_previous_state() {
        let mut nav = loaded(&["a.jpg", "b.jpg"]);
        nav.last().expect("last");

        let err = nav.load(vec![page("notes.txt")]).unwrap_err();
        assert!(matches!(err, NavError::EmptyArchive));
        assert_eq!(nav.count(), 2);
        assert_eq!(nav.current_index(), Some(1));

        let mut empty = Navigator::new();
        assert!(matches!(empty.load(Vec::new()), Err(NavError::EmptyArchive)));
        assert_eq!(empty.count(), 0);
        assert_eq!(empty.current_index(), None);
    }

    #[test]
    fn single_page_next_is_ignored() {
        let mut nav = loaded(&["only.png"]);
        nav.first().expect("first");
        assert!(nav.is_at_last());
        assert!(nav.is_at_first());

        assert_eq!(nav.next().expect("next"), None);
        assert!(nav.is_at_last());
        assert_eq!(nav.current_index(), Some(0));
    }

    #[test]
    fn out_of_range_go_to_is_ignored() {
        let mut nav = loaded(&["x.png", "y.png", "z.png"]);
        nav.go_to(1).expect("go_to");

        assert_eq!(nav.go_to(5).expect("go_to"), None);
        assert_eq!(nav.current_index(), Some(1));
    }

    #[test]
    fn boundaries_clamp_silently() {
        let mut nav = loaded(&["1.png", "2.png", "3.png"]);
        assert_eq!(nav.prev().expect("prev"), None);
        assert_eq!(nav.current_index(), None);

        let view = nav.next().expect("next").expect("moved");
        assert_eq!(view.display_index, 1);
        assert!(view.is_at_first);
        assert_eq!(nav.prev().expect("prev"), None);

        let view = nav.last().expect("last").expect("moved");
        assert_eq!(view.display_index, 3);
        assert!(view.is_at_last);
        assert!(!view.is_at_first);
        assert_eq!(nav.next().expect("next"), None);
        assert_eq!(nav.current_index(), Some(2));
    }

    #[test]
    fn empty_navigator_ignores_moves() {
        let mut nav = Navigator::new();
        assert_eq!(nav.first().expect("first"), None);
        assert_eq!(nav.last().expect("last"), None);
        assert_eq!(nav.next().expect("next"), None);
        assert_eq!(nav.prev().expect("prev"), None);
        assert!(!nav.is_at_first());
        assert!(!nav.is_at_last());
        assert_eq!(nav.display_index(), None);
    }

    #[test]
    fn jump_accepts_valid_page_numbers() {
        let names: Vec<String> = (1..=10).map(|i| format!("{i}.jpg")).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let mut nav = loaded(&refs);

        let view = nav.jump_to_page_number("5").expect("jump").expect("moved");
        assert_eq!(nav.current_index(), Some(4));
        assert_eq!(view.display_index, 5);
        assert_eq!(view.count, 10);
        assert_eq!(view.current_key, "5.jpg");

        nav.jump_to_page_number(" 10 ").expect("jump");
        assert!(nav.is_at_last());
    }

    #[test]
    fn jump_rejects_invalid_page_numbers() {
        let names: Vec<String> = (1..=10).map(|i| format!("{i}.jpg")).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let mut nav = loaded(&refs);
        nav.go_to(2).expect("go_to");

        for input in ["11", "abc", "0", "-1", "", "2.5"] {
            let err = nav.jump_to_page_number(input).unwrap_err();
            match err {
                NavError::InvalidPageNumber { input: got } => assert_eq!(got, input),
                other => panic!("unexpected error for {input:?}: {other}"),
            }
            assert_eq!(nav.current_index(), Some(2));
        }
    }

    #[test]
    fn jump_on_empty_navigator_is_rejected() {
        let mut nav = Navigator::new();
        assert!(matches!(
            nav.jump_to_page_number("1"),
            Err(NavError::InvalidPageNumber { .. })
        ));
    }

    #[test]
    fn unreadable_page_advances_position() {
        let mut nav = Navigator::new();
        nav.load(vec![page("1.jpg"), locked("2.jpg"), page("3.jpg")])
            .expect("load");
        nav.first().expect("first");

        match nav.next() {
            Err(NavError::PageUnreadable { index, key }) => {
                assert_eq!(index, 1);
                assert_eq!(key, "2.jpg");
            }
            other => panic!("expected PageUnreadable, got {other:?}"),
        }
        assert_eq!(nav.current_index(), Some(1));
        assert!(!nav.view().expect("view").readable);

        let view = nav.next().expect("next").expect("moved");
        assert_eq!(view.display_index, 3);
        assert!(view.readable);
    }

    #[test]
    fn clear_returns_to_empty() {
        let mut nav = loaded(&["a.png", "b.png"]);
        nav.last().expect("last");
        nav.clear();
        assert_eq!(nav.count(), 0);
        assert_eq!(nav.current_index(), None);
        assert!(nav.pages().is_empty());
    }

    #[test]
    fn reload_resets_position() {
        let mut nav = loaded(&["a.png", "b.png"]);
        nav.last().expect("last");
        nav.load(vec![page("c.png")]).expect("load");
        assert_eq!(nav.current_index(), None);
        assert_eq!(keys(&nav), vec!["c.png"]);
    }
}
