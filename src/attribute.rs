//! Reader attributes read with [Card::get_attrib].
//!
//! Identifiers and layouts follow PC/SC Specification Part 3, Section 3 and `SCARD_ATTR_*` from `winsmcard.h`.

use std::fmt;

use bitflags::bitflags;
use num_derive::{FromPrimitive, ToPrimitive};
use num_traits::FromPrimitive;

use crate::platform::{as_big_endian, read_be};
use crate::{Card, Error, Result};

/// Attribute information class (`SCARD_CLASS_*`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive, ToPrimitive)]
#[repr(u16)]
pub enum AttributeClass {
    /// Vendor information.
    VendorInfo = 1,
    /// Communications attributes.
    Communications = 2,
    /// Protocol attributes.
    Protocol = 3,
    /// Power management attributes.
    PowerManagement = 4,
    /// Security attributes.
    Security = 5,
    /// Mechanical attributes.
    Mechanical = 6,
    /// Vendor-defined attributes.
    VendorDefined = 7,
    /// Interface device protocol attributes.
    IfdProtocol = 8,
    /// Integrated circuit card state.
    IccState = 9,
    /// Performance counters.
    Perf = 0x7ffe,
    /// System attributes.
    System = 0x7fff,
}

/// Packed attribute identifier: `(class << 16) | tag`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttributeId(u32);

impl AttributeId {
    /// Packs a raw class and tag. Classes outside [AttributeClass] are accepted for vendor extensions.
    pub const fn new(class: u16, tag: u16) -> Self {
        Self(((class as u32) << 16) | tag as u32)
    }

    pub const fn class(self) -> u16 {
        (self.0 >> 16) as u16
    }

    pub const fn tag(self) -> u16 {
        self.0 as u16
    }

    /// Known information class, if any.
    pub fn attribute_class(self) -> Option<AttributeClass> {
        AttributeClass::from_u16(self.class())
    }

    /// Value passed to `SCardGetAttrib`.
    pub const fn value(self) -> u64 {
        self.0 as u64
    }
}

impl From<(AttributeClass, u16)> for AttributeId {
    fn from((class, tag): (AttributeClass, u16)) -> Self {
        AttributeId::new(class as u16, tag)
    }
}

/// Well-known reader attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attribute {
    /// Vendor name. See [Card::vendor_name].
    VendorName,
    /// Vendor-defined interface device type. See [Card::ifd_type].
    VendorIfdType,
    /// Vendor-defined interface device version. See [Card::ifd_version].
    VendorIfdVersion,
    /// Interface device serial number. See [Card::ifd_serial].
    VendorIfdSerial,
    /// See [Card::mechanical_characteristics].
    MechanicalCharacteristics,
}

impl Attribute {
    pub const fn id(self) -> AttributeId {
        match self {
            Attribute::VendorName => AttributeId::new(AttributeClass::VendorInfo as u16, 0x0100),
            Attribute::VendorIfdType => AttributeId::new(AttributeClass::VendorInfo as u16, 0x0101),
            Attribute::VendorIfdVersion => AttributeId::new(AttributeClass::VendorInfo as u16, 0x0102),
            Attribute::VendorIfdSerial => AttributeId::new(AttributeClass::VendorInfo as u16, 0x0103),
            Attribute::MechanicalCharacteristics => AttributeId::new(AttributeClass::Mechanical as u16, 0x0150),
        }
    }
}

impl From<Attribute> for AttributeId {
    fn from(value: Attribute) -> Self {
        value.id()
    }
}

/// Interface device version, `MM.mm.bbbb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Version {
    pub major: u8,
    pub minor: u8,
    pub build: u16,
}

impl Version {
    /// Decodes the big-endian `DWORD` layout. Anything but four bytes is rejected.
    pub fn from_be_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != 4 {
            return None;
        }

        Some(Self {
            major: u8::try_from(read_be(bytes, 0, 1)?).ok()?,
            minor: u8::try_from(read_be(bytes, 1, 1)?).ok()?,
            build: u16::try_from(read_be(bytes, 2, 2)?).ok()?,
        })
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.build)
    }
}

bitflags! {
    /// Mechanical characteristics of a reader.
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
    pub struct MechanicalCharacteristics: u32 {
        /// The reader has a card swallowing mechanism.
        const CARD_SWALLOWING = 0x01;
        /// The reader has a card ejection mechanism.
        const CARD_EJECTION = 0x02;
        /// The reader has a card capture mechanism.
        const CARD_CAPTURE = 0x04;
        /// The reader supports contactless communication.
        const CONTACTLESS = 0x08;
    }
}

impl MechanicalCharacteristics {
    /// Decodes the big-endian `DWORD` layout. Anything but four bytes is rejected. Unknown bits are dropped.
    pub fn from_be_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != 4 {
            return None;
        }

        let bits = u32::try_from(read_be(bytes, 0, 4)?).ok()?;

        Some(Self::from_bits_truncate(bits))
    }
}

/// Decodes a vendor string, dropping the NUL terminators some readers include.
fn decode_string(bytes: Vec<u8>) -> Option<String> {
    let len = bytes.iter().rposition(|byte| *byte != 0).map_or(0, |last| last + 1);

    std::str::from_utf8(&bytes[..len]).ok().map(str::to_owned)
}

/// Best-effort attribute read: an error from the smart card library means the value is not available.
fn optional_attrib<T>(
    card: &Card,
    attribute: Attribute,
    decode: impl FnOnce(Vec<u8>) -> Option<T>,
) -> Result<Option<T>> {
    match card.get_attrib(attribute) {
        Ok(value) => {
            let decoded = value.and_then(decode);
            if decoded.is_none() {
                debug!(?attribute, "Attribute is not available");
            }

            Ok(decoded)
        }
        Err(Error::Scard(error)) => {
            debug!(?attribute, %error, "Can not read the attribute");
            Ok(None)
        }
        Err(error) => Err(error),
    }
}

impl Card {
    /// Name of the reader vendor.
    pub fn vendor_name(&self) -> Result<Option<String>> {
        optional_attrib(self, Attribute::VendorName, decode_string)
    }

    /// Vendor-defined reader type.
    pub fn ifd_type(&self) -> Result<Option<String>> {
        optional_attrib(self, Attribute::VendorIfdType, decode_string)
    }

    /// Vendor-defined reader version.
    pub fn ifd_version(&self) -> Result<Option<Version>> {
        optional_attrib(self, Attribute::VendorIfdVersion, |value| {
            Version::from_be_bytes(&as_big_endian(&value))
        })
    }

    /// Reader serial number.
    pub fn ifd_serial(&self) -> Result<Option<String>> {
        optional_attrib(self, Attribute::VendorIfdSerial, decode_string)
    }

    pub fn mechanical_characteristics(&self) -> Result<Option<MechanicalCharacteristics>> {
        optional_attrib(self, Attribute::MechanicalCharacteristics, |value| {
            MechanicalCharacteristics::from_be_bytes(&as_big_endian(&value))
        })
    }
}
