//! # pageflip
//!
//! Page through the images of a comic archive in the order a reader expects.
//!
//! The crate is built from two small pieces of logic and the plumbing around
//! them:
//!
//! - [`natural`]: natural ordering of entry names, so `page2` comes before
//!   `page10` and `page02` ties with `page2`
//! - [`navigator`]: the ordered page list and the current position, with
//!   silent clamping for button-style moves and validation for typed page
//!   numbers
//! - [`archive`]: the [`PageSource`] contract and a ZIP/CBZ implementation
//! - [`io`]: byte sources for local files, HTTP Range requests and memory
//! - [`viewer`]: a session that owns one archive and its navigator
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use pageflip::{LocalFileReader, Viewer, ZipArchive};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let reader = Arc::new(LocalFileReader::new("issue1.cbz".as_ref())?);
//!     let mut viewer = Viewer::open(ZipArchive::open(reader).await?).await?;
//!
//!     let mut page = viewer.current().await?;
//!     while let Some(p) = page {
//!         println!("{}/{} {}", p.view.display_index, p.view.count, p.view.current_key);
//!         page = viewer.next().await?;
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod archive;
pub mod cli;
pub mod error;
pub mod io;
pub mod natural;
pub mod navigator;
pub mod viewer;

pub use archive::{PageSource, ZipArchive};
pub use cli::Cli;
pub use error::NavError;
pub use io::{HttpRangeReader, LocalFileReader, MemoryReader, ReadAt};
pub use navigator::{ArchiveRecord, EntryRef, Navigator, PageList, PageView};
pub use viewer::{Page, Viewer};
