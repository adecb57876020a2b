use thiserror::Error;

pub type Result<T> = std::result::Result<T, NavError>;

/// Conditions reported to the user while loading or navigating pages.
///
/// None of these leave the navigator in a broken state. `PageUnreadable` is
/// reported *after* the position moved to the unreadable page.
#[derive(Debug, Error)]
pub enum NavError {
    #[error("no images were found inside this archive")]
    EmptyArchive,

    #[error("page does not exist: {input:?}")]
    InvalidPageNumber { input: String },

    #[error("page {} is encrypted or cannot be read: {key}", .index + 1)]
    PageUnreadable { index: usize, key: String },

    #[error(transparent)]
    Source(#[from] anyhow::Error),
}
