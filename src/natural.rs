//! Natural (numeric-aware) ordering of file names.
//!
//! Runs of ASCII digits compare by numeric value, everything else compares
//! character by character, so `v_2.png` sorts before `v_10.png`.

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

/// Compare two strings in natural order.
///
/// Digit runs of arbitrary length are compared without overflow. When two
/// names are otherwise equal (`v_7` against `v_07`) the plain string order
/// breaks the tie so the ordering is total.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = a;
    let mut right = b;

    loop {
        match (left.chars().next(), right.chars().next()) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) if l.is_ascii_digit() && r.is_ascii_digit() => {
                let (l_digits, l_rest) = split_digits(left);
                let (r_digits, r_rest) = split_digits(right);
                let ordering = compare_numeric(l_digits, r_digits);
                if ordering != Ordering::Equal {
                    return ordering;
                }
                left = l_rest;
                right = r_rest;
            }
            (Some(l), Some(r)) => {
                if l != r {
                    return l.cmp(&r);
                }
                left = &left[l.len_utf8()..];
                right = &right[r.len_utf8()..];
            }
        }
    }
}

/// Sort paths in natural order of their file names.
pub fn sort_paths(paths: &mut [PathBuf]) {
    paths.sort_by(|a, b| natural_cmp(&file_name_key(a), &file_name_key(b)));
}

fn file_name_key(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn split_digits(s: &str) -> (&str, &str) {
    let end = s
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map_or(s.len(), |(i, _)| i);
    s.split_at(end)
}

fn compare_numeric(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}
