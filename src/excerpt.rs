// Copyright (C) 2022-2026 Michael Herstine <sp1ff@pobox.com>
//
// This file is part of tracing-excerpt.
//
// tracing-excerpt is free software: you can redistribute it and/or modify it under the terms of the
// GNU General Public License as published by the Free Software Foundation, either version 3 of the
// License, or (at your option) any later version.
//
// tracing-excerpt is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with tracing-excerpt.  If
// not, see <http://www.gnu.org/licenses/>.

//! Excerpting: deriving a short, single-line preview from a message.
//! ================================================================
//!
//! # Introduction
//!
//! Log messages can be long & span many lines, which makes them awkward to scan in a log viewer.
//! An _excerpt_ is a preview of the message that is:
//!
//! - stripped of any `"path:line: "` location prefix the logging facade put in front of it
//! - trimmed of leading & trailing (Unicode) whitespace
//! - no more than a configured number of runes (never splitting a multi-byte UTF-8 sequence)
//! - run through a list of substitutions (typically, newlines to spaces)
//! - marked when it was cut short, or when there was nothing (or nothing but whitespace) to
//!   excerpt
//!
//! ```rust
//! use tracing_excerpt::excerpt::{Excerpter, Marks, State};
//!
//! let x = Excerpter::new(12, Marks::new("…", "_EMPTY_", "_BLANK_"), vec![("\n", " ")]);
//! let mut buf = Vec::new();
//! assert_eq!(x.excerpt(b"Hello,\nWorld!", false, None, &mut buf), State::Truncated);
//! assert_eq!(buf, "Hello, World…".as_bytes());
//! ```
//!
//! # Replacement Policy
//!
//! Each substitution replaces _every_ non-overlapping occurrence of its pattern, scanning left to
//! right; substitutions are applied in order, each to the output of the last. A pair whose pattern
//! is empty, or identical to its substitute, is skipped.

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                        prefix parsing                                          //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// How to look for a location prefix at the start of each message.
///
/// Both prefix-bearing modes are parsed identically: everything up to the first `": "` is taken
/// to be the location. The distinction only matters when _rendering_ a prefix (see
/// [`Layer`](crate::layer::Layer)), where [`Flag::ShortFile`] renders the final path component &
/// [`Flag::LongFile`] the full path. That rendering difference is provisional.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Flag {
    /// Messages carry no location prefix
    #[default]
    None,
    ShortFile,
    LongFile,
}

/// The result of splitting a message on its location prefix.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Split {
    /// The file segment is `message[..file_end]` (empty when zero)
    pub file_end: usize,
    /// The text to be excerpted is `message[tail_start..]`
    pub tail_start: usize,
}

impl Split {
    /// Locate the location prefix in `message`, if `flag` calls for one.
    ///
    /// When a prefix is expected but `": "` doesn't appear, the whole message is taken to be the
    /// file segment & the tail is empty.
    pub fn new(message: &[u8], flag: Flag) -> Split {
        match flag {
            Flag::None => Split::default(),
            Flag::ShortFile | Flag::LongFile => match find(message, b": ") {
                Some(idx) => Split {
                    file_end: idx,
                    tail_start: idx + 2,
                },
                None => Split {
                    file_end: message.len(),
                    tail_start: message.len(),
                },
            },
        }
    }
    pub fn file<'a>(&self, message: &'a [u8]) -> Option<&'a [u8]> {
        (self.file_end > 0).then(|| &message[..self.file_end])
    }
    pub fn tail<'a>(&self, message: &'a [u8]) -> &'a [u8] {
        &message[self.tail_start..]
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                     runes & whitespace                                         //
////////////////////////////////////////////////////////////////////////////////////////////////////

const ASCII_SPACE: [bool; 128] = {
    let mut table = [false; 128];
    table[b'\t' as usize] = true;
    table[b'\n' as usize] = true;
    table[0x0b] = true;
    table[0x0c] = true;
    table[b'\r' as usize] = true;
    table[b' ' as usize] = true;
    table
};

fn is_space(c: char) -> bool {
    if c.is_ascii() {
        ASCII_SPACE[c as usize]
    } else {
        c.is_whitespace()
    }
}

/// True if `b` holds nothing but whitespace.
fn is_blank(b: &[u8]) -> bool {
    let mut idx = 0;
    while idx < b.len() {
        let (c, width) = first_rune(&b[idx..]);
        if !is_space(c) {
            return false;
        }
        idx += width;
    }
    true
}

/// Decode the rune at the start of `b`; invalid UTF-8 decodes to U+FFFD, one byte wide.
fn first_rune(b: &[u8]) -> (char, usize) {
    let lead = b[0];
    if lead < 0x80 {
        return (lead as char, 1);
    }
    let width = match lead {
        0xc0..=0xdf => 2,
        0xe0..=0xef => 3,
        0xf0..=0xf7 => 4,
        _ => 1,
    };
    b.get(..width)
        .and_then(|seq| std::str::from_utf8(seq).ok())
        .and_then(|s| s.chars().next())
        .map(|c| (c, width))
        .unwrap_or((char::REPLACEMENT_CHARACTER, 1))
}

/// Decode the rune at the end of `b`, if any.
fn last_rune(b: &[u8]) -> Option<(char, usize)> {
    let last = *b.last()?;
    if last < 0x80 {
        return Some((last as char, 1));
    }
    // Back up over at most three continuation bytes to find the lead byte
    let floor = b.len().saturating_sub(4);
    let mut start = b.len() - 1;
    while start > floor && b[start] & 0xc0 == 0x80 {
        start -= 1;
    }
    match std::str::from_utf8(&b[start..]) {
        Ok(s) => s.chars().next_back().map(|c| (c, c.len_utf8())),
        Err(_) => Some((char::REPLACEMENT_CHARACTER, 1)),
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Replace every occurrence of `pat` in `buf` with `sub`.
fn replace_all(buf: &mut Vec<u8>, pat: &[u8], sub: &[u8]) {
    let mut idx = match find(buf, pat) {
        Some(idx) => idx,
        None => return,
    };
    let mut out = Vec::with_capacity(buf.len());
    let mut rest = 0;
    loop {
        out.extend_from_slice(&buf[rest..rest + idx]);
        out.extend_from_slice(sub);
        rest += idx + pat.len();
        match find(&buf[rest..], pat) {
            Some(next) => idx = next,
            None => break,
        }
    }
    out.extend_from_slice(&buf[rest..]);
    *buf = out;
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                          excerpting                                            //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// Byte sequences signalling the state of an excerpt.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Marks {
    /// Appended to an excerpt that was cut short
    pub truncate: Vec<u8>,
    /// Substituted when there was no message at all
    pub empty: Vec<u8>,
    /// Substituted when the message was nothing but whitespace
    pub blank: Vec<u8>,
}

impl Marks {
    pub fn new<T, E, B>(truncate: T, empty: E, blank: B) -> Marks
    where
        T: Into<Vec<u8>>,
        E: Into<Vec<u8>>,
        B: Into<Vec<u8>>,
    {
        Marks {
            truncate: truncate.into(),
            empty: empty.into(),
            blank: blank.into(),
        }
    }
}

/// Which (if any) mark an excerpt received.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
    /// The whole (trimmed) message fit
    Complete,
    /// The message was cut short & the truncation mark appended
    Truncated,
    /// There was no message; the excerpt is the empty mark
    Empty,
    /// The message was all whitespace; the excerpt is the blank mark
    Blank,
}

/// Produces excerpts; immutable once built & safe to share between threads.
#[derive(Clone, Debug, Default)]
pub struct Excerpter {
    /// Maximum length, in runes, of an excerpt (not counting marks); zero means no limit
    pub(crate) trunc_limit: usize,
    pub(crate) marks: Marks,
    pub(crate) replace: Vec<(Vec<u8>, Vec<u8>)>,
}

impl Excerpter {
    pub fn new<P, S>(trunc_limit: usize, marks: Marks, replace: Vec<(P, S)>) -> Excerpter
    where
        P: Into<Vec<u8>>,
        S: Into<Vec<u8>>,
    {
        Excerpter {
            trunc_limit,
            marks,
            replace: replace
                .into_iter()
                .map(|(p, s)| (p.into(), s.into()))
                .collect(),
        }
    }

    /// Write the excerpt of `tail` to `dst`.
    ///
    /// `dst` is cleared first. `original_present` indicates that the record already carries an
    /// original message from elsewhere, in which case an empty `tail` is reported as blank rather
    /// than empty. If `host` is given (and non-empty) it is prepended, followed by a space.
    pub fn excerpt(
        &self,
        tail: &[u8],
        original_present: bool,
        host: Option<&[u8]>,
        dst: &mut Vec<u8>,
    ) -> State {
        dst.clear();

        // Leading whitespace: just advance a cursor
        let mut start = 0;
        while start < tail.len() {
            let (c, width) = first_rune(&tail[start..]);
            if !is_space(c) {
                break;
            }
            start += width;
        }

        // Accumulate, up to `trunc_limit` runes
        let mut end = start;
        let mut runes = 0;
        let mut truncated = false;
        while end < tail.len() {
            if self.trunc_limit > 0 && runes == self.trunc_limit {
                truncated = !is_blank(&tail[end..]);
                break;
            }
            end += first_rune(&tail[end..]).1;
            runes += 1;
        }
        dst.extend_from_slice(&tail[start..end]);

        // Trailing whitespace
        while let Some((c, width)) = last_rune(dst) {
            if !is_space(c) {
                break;
            }
            dst.truncate(dst.len() - width);
        }

        for (pat, sub) in &self.replace {
            if !pat.is_empty() && pat != sub {
                replace_all(dst, pat, sub);
            }
        }

        let state = if dst.is_empty() {
            if tail.is_empty() && !original_present {
                dst.extend_from_slice(&self.marks.empty);
                State::Empty
            } else {
                dst.extend_from_slice(&self.marks.blank);
                State::Blank
            }
        } else if truncated {
            dst.extend_from_slice(&self.marks.truncate);
            State::Truncated
        } else {
            State::Complete
        };

        if let Some(host) = host.filter(|h| !h.is_empty()) {
            dst.splice(0..0, host.iter().copied().chain(std::iter::once(b' ')));
        }

        state
    }
}
