//! Natural ordering of archive entry names.
//!
//! Names are split into chunks of ASCII digits and non-digits. Digit chunks
//! compare by numeric value (so `page2` sorts before `page10`), everything else
//! compares case-insensitively by code point.
//!
//! ## Example
//!
//! ```
//! use std::cmp::Ordering;
//! use pageflip::natural;
//!
//! assert_eq!(natural::compare("page2.png", "page10.png"), Ordering::Less);
//! assert_eq!(natural::compare("page02", "page2"), Ordering::Equal);
//! ```

use std::cmp::Ordering;

/// A maximal run of digits or non-digits taken from a name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chunk<'a> {
    Numeric(&'a str),
    Text(&'a str),
}

impl<'a> Chunk<'a> {
    /// The literal text of the chunk.
    pub fn as_str(&self) -> &'a str {
        match self {
            Chunk::Numeric(s) | Chunk::Text(s) => s,
        }
    }
}

/// Iterator over the chunks of a name, see [`chunks`].
#[derive(Debug, Clone)]
pub struct Chunks<'a> {
    rest: &'a str,
}

impl<'a> Iterator for Chunks<'a> {
    type Item = Chunk<'a>;

    fn next(&mut self) -> Option<Chunk<'a>> {
        let first = self.rest.chars().next()?;
        let numeric = first.is_ascii_digit();

        let end = self
            .rest
            .find(|c: char| c.is_ascii_digit() != numeric)
            .unwrap_or(self.rest.len());
        let (head, tail) = self.rest.split_at(end);
        self.rest = tail;

        Some(if numeric {
            Chunk::Numeric(head)
        } else {
            Chunk::Text(head)
        })
    }
}

/// Split `name` into chunks. Concatenating the chunks yields `name` again.
pub fn chunks(name: &str) -> Chunks<'_> {
    Chunks { rest: name }
}

/// Compare two names in natural order.
pub fn compare(a: &str, b: &str) -> Ordering {
    let mut left = chunks(a);
    let mut right = chunks(b);

    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                let ord = compare_chunks(x, y);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

/// Compare optional names; a missing name sorts before any present one.
pub fn compare_optional(a: Option<&str>, b: Option<&str>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => compare(a, b),
    }
}

fn compare_chunks(a: Chunk<'_>, b: Chunk<'_>) -> Ordering {
    match (a, b) {
        (Chunk::Numeric(x), Chunk::Numeric(y)) => compare_digits(x, y),
        _ => compare_ignore_case(a.as_str(), b.as_str()),
    }
}

/// Compare digit runs by value without parsing, so runs of any length work.
fn compare_digits(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

fn compare_ignore_case(a: &str, b: &str) -> Ordering {
    a.chars().map(fold_case).cmp(b.chars().map(fold_case))
}

/// Upper-case one character, leaving it alone when its upper case is not a
/// single character (`ß` stays `ß`).
fn fold_case(c: char) -> char {
    let mut upper = c.to_uppercase();
    match (upper.next(), upper.next()) {
        (Some(u), None) => u,
        _ => c,
    }
}
