#![doc = include_str!("../README.md")]

#[macro_use]
extern crate tracing;

#[macro_use]
mod macros;

pub mod attribute;
pub mod backend;
mod card;
mod card_status;
mod context;
/// Environment variables that configure the crate.
pub mod env;
mod error;
pub mod logging;
pub mod multi_string;
pub mod platform;
mod reader_state;
mod types;

pub use attribute::{Attribute, AttributeClass, AttributeId, MechanicalCharacteristics, Version};
pub use card::Card;
pub use card_status::{CardState, CardStatus};
pub use context::Context;
pub use error::{Error, ErrorKind, Result, ScardError};
/// Native PC/SC types, constants and function prototypes.
pub use ffi_types as ffi;
pub use reader_state::{ReaderState, State};
pub use types::{ctl_code, Disposition, Initialization, Protocol, Scope, ShareMode, LONG_TIMEOUT};
