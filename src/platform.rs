//! Conversions between the native integer widths and the 64-bit values used by the public API.
//!
//! `DWORD` is 4 bytes on Windows and macOS and `unsigned long` on other pcsc-lite hosts. Handles are pointer sized
//! on Windows and `DWORD` sized elsewhere. Every value crossing the native boundary goes through [NativeWord], which
//! zero-extends 32-bit values so that the same bit pattern compares equal on every host.

use std::mem::size_of;

use ffi_types::{Dword, ScardStatus};

use crate::{Error, Result};

/// Width of the native `DWORD` in bytes.
pub const DWORD_SIZE: usize = size_of::<Dword>();

/// Width of the native context and card handles in bytes.
pub const HANDLE_SIZE: usize = size_of::<ffi_types::ScardHandle>();

/// Capacity of the ATR buffer in the native reader state structure.
pub const MAX_ATR_SIZE: usize = ffi_types::MAX_ATR_SIZE;

/// Receive buffer size used by [crate::Card::transmit]: a short APDU response plus the status word.
pub const MAX_BUFFER_SIZE: usize = 264;

/// An integer type that appears in a native signature.
pub trait NativeWord: Copy + Sized {
    /// Widens the value to 64 bits. 32-bit values are zero-extended.
    fn to_u64(self) -> u64;

    /// Narrows a 64-bit value. Returns `None` if it does not fit into the native width.
    fn from_u64(value: u64) -> Option<Self>;
}

macro_rules! impl_native_word {
    ($($t:ty),*) => {$(
        impl NativeWord for $t {
            #[allow(clippy::unnecessary_cast)]
            fn to_u64(self) -> u64 {
                if size_of::<Self>() == 4 {
                    self as u32 as u64
                } else {
                    self as u64
                }
            }

            #[allow(clippy::unnecessary_cast)]
            fn from_u64(value: u64) -> Option<Self> {
                if size_of::<Self>() == 4 {
                    u32::try_from(value).ok().map(|value| value as Self)
                } else {
                    Some(value as Self)
                }
            }
        }
    )*};
}

impl_native_word!(i32, u32, i64, u64, isize, usize);

/// Widens a native status code. PC/SC codes are 32-bit, so only the low 32 bits are kept.
pub(crate) fn status_code(status: ScardStatus) -> u64 {
    u64::from(status as u32)
}

/// Narrows a value for a native call, failing with [Error::Precondition] when it does not fit.
pub(crate) fn narrow<T: NativeWord>(value: u64, what: &str) -> Result<T> {
    T::from_u64(value)
        .ok_or_else(|| Error::precondition(format!("{what} {value:#x} does not fit into {} bytes", size_of::<T>())))
}

pub(crate) fn dword(value: u64, what: &str) -> Result<Dword> {
    narrow(value, what)
}

/// Buffer length as a native `DWORD`.
pub(crate) fn dword_len(len: usize) -> Result<Dword> {
    narrow(len as u64, "buffer length")
}

/// Native `DWORD` length as a buffer length.
pub(crate) fn usize_len(len: Dword) -> usize {
    usize::try_from(len.to_u64()).unwrap_or(usize::MAX)
}

/// Reverses `bytes` if and only if the host is little-endian.
///
/// PC/SC attribute values such as versions and bit masks are specified big-endian, while readers hand them back as
/// native `DWORD`s.
pub fn as_big_endian(bytes: &[u8]) -> Vec<u8> {
    let mut bytes = bytes.to_vec();
    if cfg!(target_endian = "little") {
        bytes.reverse();
    }
    bytes
}

/// Reads `len` (at most 8) big-endian bytes starting at `offset`.
pub(crate) fn read_be(bytes: &[u8], offset: usize, len: usize) -> Option<u64> {
    if len > 8 {
        return None;
    }

    bytes
        .get(offset..offset.checked_add(len)?)
        .map(|bytes| bytes.iter().fold(0u64, |acc, byte| (acc << 8) | u64::from(*byte)))
}
