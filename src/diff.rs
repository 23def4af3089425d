//! Line diff of two scripts rendered with git-style conflict markers.
//!
//! ```text
//! <<<<<<< local
//! 			name = "DateTime",
//! =======
//! 			name = "JSON",
//! >>>>>>> remote
//! ```
//!
//! The output is meant to be edited by hand; nothing here parses it back.

use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
};

use crate::{ast::Script, output::to_text};

pub const LOCAL_MARKER: &str = "<<<<<<< local";
pub const SEPARATOR_MARKER: &str = "=======";
pub const REMOTE_MARKER: &str = ">>>>>>> remote";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HunkKind {
    Equal,
    Delete,
    Insert,
}

/// A run of lines with the same classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hunk<'a> {
    pub kind: HunkKind,
    pub lines: Vec<&'a str>,
}

fn line_hash(line: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    line.hash(&mut hasher);
    hasher.finish()
}

/// Classic LCS diff over lines. Within a changed region deletions come
/// before insertions.
pub fn diff_lines<'a>(a: &'a str, b: &'a str) -> Vec<Hunk<'a>> {
    let a: Vec<&str> = a.lines().collect();
    let b: Vec<&str> = b.lines().collect();
    let a_hash: Vec<u64> = a.iter().map(|l| line_hash(l)).collect();
    let b_hash: Vec<u64> = b.iter().map(|l| line_hash(l)).collect();
    let same = |i: usize, j: usize| a_hash[i] == b_hash[j] && a[i] == b[j];

    // lcs[i][j] = LCS length of a[i..] and b[j..]
    let (n, m) = (a.len(), b.len());
    let mut lcs = vec![vec![0u32; m + 1]; n + 1];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            lcs[i][j] = if same(i, j) {
                lcs[i + 1][j + 1] + 1
            } else {
                lcs[i + 1][j].max(lcs[i][j + 1])
            };
        }
    }

    let mut hunks: Vec<Hunk<'a>> = Vec::new();
    let mut push = |kind: HunkKind, line: &'a str| match hunks.last_mut() {
        Some(last) if last.kind == kind => last.lines.push(line),
        _ => hunks.push(Hunk {
            kind,
            lines: vec![line],
        }),
    };

    let (mut i, mut j) = (0, 0);
    while i < n || j < m {
        if i < n && j < m && same(i, j) {
            push(HunkKind::Equal, a[i]);
            i += 1;
            j += 1;
        } else if i < n && (j == m || lcs[i + 1][j] >= lcs[i][j + 1]) {
            push(HunkKind::Delete, a[i]);
            i += 1;
        } else {
            push(HunkKind::Insert, b[j]);
            j += 1;
        }
    }
    hunks
}

fn push_lines(out: &mut String, lines: &[&str]) {
    for line in lines {
        out.push_str(line);
        out.push('\n');
    }
}

fn push_conflict(out: &mut String, local: &[&str], remote: &[&str]) {
    out.push_str(LOCAL_MARKER);
    out.push('\n');
    push_lines(out, local);
    out.push_str(SEPARATOR_MARKER);
    out.push('\n');
    push_lines(out, remote);
    out.push_str(REMOTE_MARKER);
    out.push('\n');
}

/// Renders the diff of two texts, wrapping every change in conflict markers.
pub fn conflict_markers(local: &str, remote: &str) -> String {
    let hunks = diff_lines(local, remote);
    let mut out = String::new();
    let mut iter = hunks.iter().peekable();
    while let Some(hunk) = iter.next() {
        match hunk.kind {
            HunkKind::Equal => push_lines(&mut out, &hunk.lines),
            HunkKind::Delete => {
                let inserted = iter.next_if(|next| next.kind == HunkKind::Insert);
                let remote_lines = inserted.map_or(&[][..], |h| &h.lines[..]);
                push_conflict(&mut out, &hunk.lines, remote_lines);
            }
            HunkKind::Insert => push_conflict(&mut out, &[], &hunk.lines),
        }
    }
    out
}

/// Diffs the canonical text of two scripts.
pub fn diff(local: &Script, remote: &Script) -> String {
    conflict_markers(&to_text(local), &to_text(remote))
}
