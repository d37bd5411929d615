use bitflags::bitflags;

use crate::Protocol;

bitflags! {
    /// State of the card as reported by [crate::Card::status].
    ///
    /// > SCardStatus() returns a bit field on pcsc-lite but a enumeration on Windows.
    ///
    /// On pcsc-lite any combination may be set. On Windows exactly one flag is set.
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
    pub struct CardState: u32 {
        /// The reader driver has no information concerning the current state of the reader.
        const UNKNOWN = 0x0001;
        /// There is no card in the reader.
        const ABSENT = 0x0002;
        /// There is a card in the reader, but it has not been moved into position for use.
        const PRESENT = 0x0004;
        /// There is a card in the reader in position for use. The card is not powered.
        const SWALLOWED = 0x0008;
        /// Power is being provided to the card, but the reader driver is unaware of the mode of the card.
        const POWERED = 0x0010;
        /// The card has been reset and is awaiting PTS negotiation.
        const NEGOTIABLE = 0x0020;
        /// The card has been reset and specific communication protocols have been established.
        const SPECIFIC = 0x0040;
    }
}

impl CardState {
    /// Decodes the pcsc-lite bit field. The unified bits are the pcsc-lite ones.
    pub(crate) fn from_bitmask(value: u64) -> Self {
        CardState::from_bits_truncate((value & 0xffff) as u32)
    }

    /// Decodes the WinSCard enumeration. An out-of-range value is [CardState::UNKNOWN].
    pub(crate) fn from_enumeration(value: u64) -> Self {
        match value {
            1 => CardState::ABSENT,
            2 => CardState::PRESENT,
            3 => CardState::SWALLOWED,
            4 => CardState::POWERED,
            5 => CardState::NEGOTIABLE,
            6 => CardState::SPECIFIC,
            _ => CardState::UNKNOWN,
        }
    }

    /// Decodes the value the host library returns.
    pub(crate) fn from_native(value: u64) -> Self {
        if cfg!(target_os = "windows") {
            CardState::from_enumeration(value)
        } else {
            CardState::from_bitmask(value)
        }
    }
}

/// Snapshot returned by [crate::Card::status].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardStatus {
    /// Names the reader is known by.
    pub reader_names: Vec<String>,
    pub state: CardState,
    /// Currently active protocol, if any.
    pub protocol: Option<Protocol>,
    pub atr: Vec<u8>,
}

impl CardStatus {
    /// First (display) name of the reader.
    pub fn reader_name(&self) -> Option<&str> {
        self.reader_names.first().map(String::as_str)
    }

    pub fn unknown(&self) -> bool {
        self.state.contains(CardState::UNKNOWN)
    }

    pub fn absent(&self) -> bool {
        self.state.contains(CardState::ABSENT)
    }

    pub fn present(&self) -> bool {
        self.state.contains(CardState::PRESENT)
    }

    pub fn swallowed(&self) -> bool {
        self.state.contains(CardState::SWALLOWED)
    }

    pub fn powered(&self) -> bool {
        self.state.contains(CardState::POWERED)
    }

    pub fn negotiable(&self) -> bool {
        self.state.contains(CardState::NEGOTIABLE)
    }

    pub fn specific(&self) -> bool {
        self.state.contains(CardState::SPECIFIC)
    }
}
