use thiserror::Error;

use crate::{addr::AddressError, memory::SegmentKind};

#[derive(Error, Debug)]
pub enum Error {
    #[error("Unrecognized directive: `{0}`")]
    DirectiveNotFound(String),

    #[error("{segment} segment overflow: {requested} bytes requested, {available} available")]
    AllocationOverflow {
        segment: SegmentKind,
        requested: u64,
        available: u64,
    },

    #[error("Alignment exponent must be 0, 1, 2 or 3: `{0}`")]
    InvalidAlignmentExponent(u32),

    #[error("Data width must be 1, 2, 4 or 8 bytes: `{0}`")]
    InvalidWidth(u32),

    #[error("Invalid register number: `{0}`")]
    InvalidRegisterNumber(usize),

    #[error("Register in slot {slot} is numbered {number}")]
    RegisterSlotMismatch { slot: usize, number: usize },

    #[error("Unknown register name: `{0}`")]
    UnknownRegisterName(String),

    #[error("`{0}` directive cannot appear in text segment")]
    DataDirectiveInTextSegment(String),

    #[error("Bad operand for `{directive}`: {reason}")]
    BadOperand { directive: String, reason: String },

    #[error(transparent)]
    Address(#[from] AddressError),

    #[error("Failed to read config: {0}")]
    ConfigRead(String, #[source] std::io::Error),

    #[error("{0} segment has no addresses left")]
    AddressSpaceExhausted(SegmentKind),

    #[error("Invalid memory configuration: {0}")]
    ConfigInvalid(String),

    #[error("Failed to parse config")]
    ConfigParse(#[from] serde_yaml::Error),
}
