use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

use crate::error::Error;

/// Size of a scalar memory item. Its natural alignment equals its size.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    TryFromPrimitive,
    IntoPrimitive,
    Display,
    EnumIter,
)]
#[repr(u8)]
pub enum Width {
    #[strum(serialize = "byte")]
    Byte = 1,
    #[strum(serialize = "halfword")]
    Half = 2,
    #[strum(serialize = "word")]
    Word = 4,
    #[strum(serialize = "doubleword")]
    Double = 8,
}

impl Width {
    pub fn from_bytes(n: u32) -> Result<Self, Error> {
        u8::try_from(n)
            .ok()
            .and_then(|b| Width::try_from(b).ok())
            .ok_or(Error::InvalidWidth(n))
    }

    /// `.align` operand: boundary is 2^exponent.
    pub fn from_exponent(exponent: u32) -> Result<Self, Error> {
        match exponent {
            0 => Ok(Width::Byte),
            1 => Ok(Width::Half),
            2 => Ok(Width::Word),
            3 => Ok(Width::Double),
            _ => Err(Error::InvalidAlignmentExponent(exponent)),
        }
    }

    pub fn bytes(self) -> u32 {
        u8::from(self) as u32
    }

    pub fn exponent(self) -> u32 {
        self.bytes().trailing_zeros()
    }

    pub fn is_aligned(self, addr: u64) -> bool {
        addr % self.bytes() as u64 == 0
    }

    pub fn align_up(self, offset: u64) -> u64 {
        let mask = self.bytes() as u64 - 1;
        (offset + mask) & !mask
    }
}
