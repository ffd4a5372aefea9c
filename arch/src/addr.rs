use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use strum::{Display, EnumString};
use thiserror::Error;

use crate::{memory::MemoryConfig, width::Width};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "lowercase")]
pub enum AccessKind {
    Load,
    Store,
}

impl AccessKind {
    /// MIPS exception cause code (AdEL / AdES).
    pub fn cause(self) -> u32 {
        match self {
            AccessKind::Load => 4,
            AccessKind::Store => 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    Unaligned(Width),
    OutOfRange,
}

/// `0x` followed by eight lower-case hex digits.
pub fn hex(addr: u32) -> String {
    format!("0x{:08x}", addr)
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{}", self.message())]
pub struct AddressError {
    address: u32,
    kind: AccessKind,
    fault: Fault,
}

impl AddressError {
    pub fn new(address: u32, kind: AccessKind, fault: Fault) -> Self {
        AddressError {
            address,
            kind,
            fault,
        }
    }

    pub fn address(&self) -> u32 {
        self.address
    }

    pub fn kind(&self) -> AccessKind {
        self.kind
    }

    pub fn fault(&self) -> Fault {
        self.fault
    }

    pub fn message(&self) -> String {
        match self.fault {
            Fault::Unaligned(width) => format!(
                "{} address not aligned on {} boundary {}",
                self.kind,
                width,
                hex(self.address)
            ),
            Fault::OutOfRange => {
                format!("{} address out of range {}", self.kind, hex(self.address))
            }
        }
    }
}

// ----------------------------------------------------------------------------
// Validator

/// Checks effective addresses against frozen segment bounds.
#[derive(Debug, Clone)]
pub struct Validator {
    load: Vec<RangeInclusive<u32>>,
    store: Vec<RangeInclusive<u32>>,
    fetch: Vec<RangeInclusive<u32>>,
}

impl Validator {
    pub fn new(config: &MemoryConfig) -> Self {
        let fetch = vec![config.text_range(), config.ktext_range()];
        let data = vec![
            config.user_data_range(),
            config.kdata_range(),
            config.mmio_range(),
        ];
        let load = fetch.iter().chain(data.iter()).cloned().collect();
        let store = if config.self_modifying_code {
            fetch.iter().chain(data.iter()).cloned().collect()
        } else {
            data
        };
        Validator { load, store, fetch }
    }

    pub fn validate(
        &self,
        address: u32,
        kind: AccessKind,
        width: Width,
    ) -> Result<u32, AddressError> {
        let ranges = match kind {
            AccessKind::Load => &self.load,
            AccessKind::Store => &self.store,
        };
        Self::check(ranges, address, kind, width)
    }

    /// Instruction fetch: word aligned, text or kernel text only.
    pub fn validate_fetch(&self, address: u32) -> Result<u32, AddressError> {
        Self::check(&self.fetch, address, AccessKind::Load, Width::Word)
    }

    fn check(
        ranges: &[RangeInclusive<u32>],
        address: u32,
        kind: AccessKind,
        width: Width,
    ) -> Result<u32, AddressError> {
        if !width.is_aligned(address as u64) {
            return Err(AddressError::new(address, kind, Fault::Unaligned(width)));
        }
        // Range ends are the highest start address; an aligned access never
        // runs past the word or byte its limit names.
        if !ranges.iter().any(|r| r.contains(&address)) {
            return Err(AddressError::new(address, kind, Fault::OutOfRange));
        }
        Ok(address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_is_fixed_width() {
        assert_eq!(hex(0), "0x00000000");
        assert_eq!(hex(0x1001_0005), "0x10010005");
        assert_eq!(hex(0xffff_ffff), "0xffffffff");
    }

    #[test]
    fn message_names_access_and_address() {
        let err = AddressError::new(0, AccessKind::Store, Fault::OutOfRange);
        assert_eq!(err.to_string(), "store address out of range 0x00000000");
        let err = AddressError::new(5, AccessKind::Load, Fault::Unaligned(Width::Word));
        assert_eq!(
            err.to_string(),
            "load address not aligned on word boundary 0x00000005"
        );
    }

    #[test]
    fn cause_codes() {
        assert_eq!(AccessKind::Load.cause(), 4);
        assert_eq!(AccessKind::Store.cause(), 5);
        assert_eq!("store".parse::<AccessKind>().unwrap(), AccessKind::Store);
    }

    #[test]
    fn unaligned_word() {
        let v = Validator::new(&MemoryConfig::compact_data_at_zero());
        let err = v.validate(5, AccessKind::Load, Width::Word).unwrap_err();
        assert_eq!(err.address(), 5);
        assert_eq!(err.kind(), AccessKind::Load);
        assert_eq!(err.fault(), Fault::Unaligned(Width::Word));
        assert_eq!(v.validate(8, AccessKind::Load, Width::Word), Ok(8));
    }

    #[test]
    fn text_is_read_only() {
        let cfg = MemoryConfig::default();
        let v = Validator::new(&cfg);
        assert!(v.validate(cfg.text_base, AccessKind::Load, Width::Word).is_ok());
        let err = v
            .validate(cfg.text_base, AccessKind::Store, Width::Word)
            .unwrap_err();
        assert_eq!(err.fault(), Fault::OutOfRange);
        assert_eq!(err.kind(), AccessKind::Store);

        let v = Validator::new(&MemoryConfig {
            self_modifying_code: true,
            ..cfg.clone()
        });
        assert!(v.validate(cfg.text_base, AccessKind::Store, Width::Word).is_ok());
    }

    #[test]
    fn text_limit_is_last_word() {
        let cfg = MemoryConfig::default();
        let v = Validator::new(&cfg);
        assert_eq!(cfg.text_limit, 0x0fff_fffc);
        assert!(v.validate(cfg.text_limit, AccessKind::Load, Width::Byte).is_ok());
        assert!(v.validate(cfg.text_limit, AccessKind::Load, Width::Word).is_ok());
        assert!(v.validate_fetch(cfg.text_limit).is_ok());
        let err = v
            .validate(cfg.text_limit + 1, AccessKind::Load, Width::Byte)
            .unwrap_err();
        assert_eq!(err.fault(), Fault::OutOfRange);
        assert_eq!(err.address(), 0x0fff_fffd);

        assert!(v.validate_fetch(cfg.ktext_limit).is_ok());
        assert!(v
            .validate(cfg.ktext_limit + 1, AccessKind::Load, Width::Byte)
            .is_err());
    }

    #[test]
    fn range_bounds() {
        let cfg = MemoryConfig::default();
        let v = Validator::new(&cfg);
        assert!(v.validate(0, AccessKind::Load, Width::Byte).is_err());
        assert!(v
            .validate(cfg.mmio_limit, AccessKind::Store, Width::Byte)
            .is_ok());
        assert!(v
            .validate(0xffff_fff8, AccessKind::Load, Width::Double)
            .is_ok());
        assert!(v
            .validate(0x7fff_fff8, AccessKind::Store, Width::Double)
            .is_ok());
        assert!(v
            .validate(cfg.ktext_base, AccessKind::Store, Width::Byte)
            .is_err());
    }

    #[test]
    fn fetch() {
        let cfg = MemoryConfig::default();
        let v = Validator::new(&cfg);
        assert!(v.validate_fetch(cfg.text_base).is_ok());
        assert!(v.validate_fetch(cfg.ktext_base + 0x180).is_ok());
        assert_eq!(
            v.validate_fetch(cfg.data_base).unwrap_err().fault(),
            Fault::OutOfRange
        );
        assert_eq!(
            v.validate_fetch(cfg.text_base + 2).unwrap_err().kind(),
            AccessKind::Load
        );
    }
}
