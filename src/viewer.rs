//! A viewing session over one archive.
//!
//! [`Viewer`] owns the archive it reads from together with the navigator built
//! from it. Loading another archive replaces both at once, and dropping the
//! viewer releases the archive.

use tracing::debug;

use crate::archive::PageSource;
use crate::error::{NavError, Result};
use crate::navigator::{Navigator, PageList, PageView};

/// A page that was moved to, with its bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub view: PageView,
    pub bytes: Vec<u8>,
}

pub struct Viewer<S: PageSource> {
    source: S,
    navigator: Navigator,
}

impl<S: PageSource> Viewer<S> {
    /// Load the pages of `source` and select the first one.
    ///
    /// Fails with [`NavError::EmptyArchive`] if the archive holds no images.
    pub async fn open(source: S) -> Result<Self> {
        let navigator = Self::load(&source).await?;
        Ok(Self { source, navigator })
    }

    /// Switch to another archive.
    ///
    /// The new archive is fully loaded before anything is replaced; on error
    /// the current archive and position stay as they were.
    pub async fn replace(&mut self, source: S) -> Result<()> {
        let navigator = Self::load(&source).await?;
        self.source = source;
        self.navigator = navigator;
        Ok(())
    }

    async fn load(source: &S) -> Result<Navigator> {
        let records = source.records().await?;
        let mut navigator = Navigator::new();
        navigator.load(records)?;

        // An unreadable opening page is reported when it is read, not here.
        match navigator.first() {
            Ok(_) | Err(NavError::PageUnreadable { .. }) => {}
            Err(e) => return Err(e),
        }

        debug!(pages = navigator.count(), "archive ready");
        Ok(navigator)
    }

    /// Release the archive.
    pub fn close(self) {
        debug!("closing archive");
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn pages(&self) -> &PageList {
        self.navigator.pages()
    }

    pub fn view(&self) -> Option<PageView> {
        self.navigator.view()
    }

    /// Read the page at the current position.
    pub async fn current(&self) -> Result<Option<Page>> {
        let Some(index) = self.navigator.current_index() else {
            return Ok(None);
        };
        let moved = match self.navigator.view() {
            Some(view) if view.readable => Ok(Some(view)),
            Some(view) => Err(NavError::PageUnreadable {
                index,
                key: view.current_key,
            }),
            None => Ok(None),
        };
        self.fetch(moved).await
    }

    pub async fn go_to(&mut self, index: usize) -> Result<Option<Page>> {
        let moved = self.navigator.go_to(index);
        self.fetch(moved).await
    }

    pub async fn next(&mut self) -> Result<Option<Page>> {
        let moved = self.navigator.next();
        self.fetch(moved).await
    }

    pub async fn prev(&mut self) -> Result<Option<Page>> {
        let moved = self.navigator.prev();
        self.fetch(moved).await
    }

    pub async fn first(&mut self) -> Result<Option<Page>> {
        let moved = self.navigator.first();
        self.fetch(moved).await
    }

    pub async fn last(&mut self) -> Result<Option<Page>> {
        let moved = self.navigator.last();
        self.fetch(moved).await
    }

    /// Jump to a page number typed by the user, see
    /// [`Navigator::jump_to_page_number`].
    pub async fn jump(&mut self, input: &str) -> Result<Option<Page>> {
        let moved = self.navigator.jump_to_page_number(input);
        self.fetch(moved).await
    }

    async fn fetch(&self, moved: Result<Option<PageView>>) -> Result<Option<Page>> {
        let Some(view) = moved? else {
            return Ok(None);
        };
        let bytes = self.source.read(&view.current_key).await?;
        Ok(Some(Page { view, bytes }))
    }
}
