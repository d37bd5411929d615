//! Native PC/SC ABI declarations.
//!
//! WinSCard and pcsc-lite expose the same functions, but they disagree on integer widths, handle widths,
//! struct packing, the ATR buffer capacity and some entry point names. Every one of those differences is
//! resolved here, once per target, so that the code built on top of this crate never has to look at `cfg`s.
//!
//! Useful links:
//! * [pcsc-lite API](https://pcsclite.apdu.fr/api/group__API.html)
//! * [Differences between pcsc-lite and WinSCard](https://pcsclite.apdu.fr/api/group__API.html#differences)
//! * [WinSCard API](https://learn.microsoft.com/en-us/windows/win32/api/winscard/)

mod common;
pub mod constants;
pub mod functions;
mod scard;

pub use common::*;
pub use scard::*;
