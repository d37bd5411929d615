//! Multi-string (`msz`) codec.
//!
//! A multi-string is a list of NUL-terminated strings followed by one more NUL byte:
//! `"hello\0world\0\0"`. PC/SC uses it for reader group and reader name lists.

use std::ops::Range;
use std::str::Utf8Error;

use crate::{Error, Result};

/// Encodes `strings` as a multi-string.
///
/// Every string is followed by a NUL byte, and the list is closed by one more NUL byte. An empty list encodes to a
/// single NUL byte. The strings must not contain NUL bytes themselves.
pub fn encode<I, S>(strings: I) -> Vec<u8>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut buf = Vec::new();
    for string in strings {
        buf.extend_from_slice(string.as_ref().as_bytes());
        buf.push(0);
    }
    buf.push(0);

    buf
}

/// Decodes the whole buffer into owned strings.
pub fn decode(buf: &[u8]) -> Result<Vec<String>> {
    MultiStr::new(buf).to_vec()
}

/// A borrowed view over a multi-string buffer.
///
/// The view is `Copy`, so it can be iterated as many times as needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MultiStr<'a> {
    buf: &'a [u8],
}

impl<'a> MultiStr<'a> {
    /// Views the whole buffer.
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    /// Views the rest of `buf` starting at `offset`.
    pub fn from_offset(buf: &'a [u8], offset: usize) -> Result<Self> {
        Self::with_range(buf, offset, buf.len().saturating_sub(offset))
    }

    /// Views `len` bytes of `buf` starting at `offset`.
    pub fn with_range(buf: &'a [u8], offset: usize, len: usize) -> Result<Self> {
        let range = offset
            .checked_add(len)
            .and_then(|end| buf.get(offset..end))
            .ok_or_else(|| {
                Error::precondition(format!(
                    "range {}..{} is out of the {} bytes buffer",
                    offset,
                    offset.saturating_add(len),
                    buf.len()
                ))
            })?;

        Ok(Self { buf: range })
    }

    /// Returns a fresh iterator over the strings.
    pub fn iter(&self) -> MultiStrIter<'a> {
        MultiStrIter {
            buf: self.buf,
            start: 0,
            done: false,
        }
    }

    /// Collects the strings into owned values, failing on the first segment that is not UTF-8.
    pub fn to_vec(&self) -> Result<Vec<String>> {
        self.iter()
            .map(|segment| segment.map(str::to_owned).map_err(Error::from))
            .collect()
    }
}

impl<'a> IntoIterator for MultiStr<'a> {
    type Item = std::result::Result<&'a str, Utf8Error>;
    type IntoIter = MultiStrIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Lazy iterator over the strings of a [MultiStr].
///
/// An empty segment ends the list. An unterminated trailing segment is still yielded, because native buffers are
/// sometimes cut at an implicit length without the final terminator.
#[derive(Debug, Clone)]
pub struct MultiStrIter<'a> {
    buf: &'a [u8],
    start: usize,
    done: bool,
}

impl MultiStrIter<'_> {
    fn next_segment(&mut self) -> Option<Range<usize>> {
        if self.done {
            return None;
        }

        let rest = &self.buf[self.start..];
        match rest.iter().position(|byte| *byte == 0) {
            // The list terminator.
            Some(0) => {
                self.done = true;
                None
            }
            Some(len) => {
                let segment = self.start..self.start + len;
                self.start += len + 1;
                Some(segment)
            }
            None => {
                self.done = true;
                if rest.is_empty() {
                    None
                } else {
                    Some(self.start..self.buf.len())
                }
            }
        }
    }
}

impl<'a> Iterator for MultiStrIter<'a> {
    type Item = std::result::Result<&'a str, Utf8Error>;

    fn next(&mut self) -> Option<Self::Item> {
        let buf = self.buf;
        self.next_segment().map(|segment| std::str::from_utf8(&buf[segment]))
    }
}

impl std::iter::FusedIterator for MultiStrIter<'_> {}
