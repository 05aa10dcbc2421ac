//! Plain directory listing in natural order.
//!
//! This is what the browser shows when no query is typed: the immediate
//! children of the current directory, folders first, names compared so that
//! `file2` sorts before `file10`.

use crate::backend::DirectoryEnumerator;
use crate::types::Entry;
use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use tracing::debug;

/// List the immediate children of `dir`, folders first, in natural order.
///
/// Unreadable children are skipped and an unreadable directory yields an
/// empty list. The denylist is not applied.
pub fn list_directory(enumerator: &dyn DirectoryEnumerator, dir: &Path) -> Vec<Entry> {
    let children = match enumerator.read_dir(dir) {
        Ok(children) => children,
        Err(e) => {
            debug!(dir = %dir.display(), error = %e, "Cannot list directory");
            return Vec::new();
        }
    };

    let mut entries: Vec<Entry> = children
        .into_iter()
        .filter_map(|child| match child {
            Ok(info) => {
                let relative = PathBuf::from(&info.name);
                let mut entry = Entry::new(info.path, info.name, info.is_dir, relative);
                if !entry.is_dir {
                    entry.size = info.size;
                }
                entry.modified = info.modified;
                Some(entry)
            }
            Err(e) => {
                debug!(dir = %dir.display(), error = %e, "Skipping unreadable entry");
                None
            }
        })
        .collect();

    entries.sort_by(|a, b| {
        b.is_dir
            .cmp(&a.is_dir)
            .then_with(|| natural_cmp(&a.name, &b.name))
    });
    entries
}

/// Compare two names the way a person would.
///
/// Runs of digits compare by numeric value, everything else compares
/// case-insensitively. Names that compare equal fall back to ordinal order.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = Chunks::new(a);
    let mut right = Chunks::new(b);

    loop {
        match (left.next(), right.next()) {
            (None, None) => return a.cmp(b),
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

fn compare_chunks(a: &str, b: &str) -> Ordering {
    let a_digits = a.starts_with(|c: char| c.is_ascii_digit());
    let b_digits = b.starts_with(|c: char| c.is_ascii_digit());

    match (a_digits, b_digits) {
        (true, true) => {
            // Compare by magnitude without parsing, so long runs cannot overflow
            let a_trim = a.trim_start_matches('0');
            let b_trim = b.trim_start_matches('0');
            a_trim
                .len()
                .cmp(&b_trim.len())
                .then_with(|| a_trim.cmp(b_trim))
                .then_with(|| a.len().cmp(&b.len()))
        }
        // Digits sort before letters
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => a.to_lowercase().cmp(&b.to_lowercase()),
    }
}

/// Splits a string into alternating digit and non-digit runs.
struct Chunks<'a> {
    rest: &'a str,
}

impl<'a> Chunks<'a> {
    fn new(s: &'a str) -> Self {
        Chunks { rest: s }
    }
}

impl<'a> Iterator for Chunks<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        let first = self.rest.chars().next()?;
        let digits = first.is_ascii_digit();
        let end = self
            .rest
            .find(|c: char| c.is_ascii_digit() != digits)
            .unwrap_or(self.rest.len());
        let (chunk, rest) = self.rest.split_at(end);
        self.rest = rest;
        Some(chunk)
    }
}
