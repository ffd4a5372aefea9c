use arch::{AccessKind, AddressError, MemoryConfig, Validator, Width};
use std::collections::HashMap;

/// Sparse little-endian byte store. Every access goes through the validator.
#[derive(Debug, Clone)]
pub struct Memory {
    validator: Validator,
    bytes: HashMap<u32, u8>,
}

impl Memory {
    pub fn new(config: &MemoryConfig) -> Self {
        Memory {
            validator: Validator::new(config),
            bytes: HashMap::new(),
        }
    }

    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    pub fn load(&self, addr: u32, width: Width) -> Result<u64, AddressError> {
        let addr = self.validator.validate(addr, AccessKind::Load, width)?;
        Ok(self.read_raw(addr, width))
    }

    pub fn store(&mut self, addr: u32, width: Width, value: u64) -> Result<(), AddressError> {
        let addr = self.validator.validate(addr, AccessKind::Store, width)?;
        for i in 0..width.bytes() {
            self.bytes.insert(addr + i, (value >> (8 * i)) as u8);
        }
        Ok(())
    }

    pub fn fetch(&self, addr: u32) -> Result<u32, AddressError> {
        let addr = self.validator.validate_fetch(addr)?;
        Ok(self.read_raw(addr, Width::Word) as u32)
    }

    /// Loader path: places an assembled image without access checks.
    pub fn write_image(&mut self, base: u32, image: &[u8]) {
        for (i, b) in image.iter().enumerate() {
            self.bytes.insert(base.wrapping_add(i as u32), *b);
        }
    }

    fn read_raw(&self, addr: u32, width: Width) -> u64 {
        (0..width.bytes()).fold(0, |acc, i| {
            let b = self.bytes.get(&(addr + i)).copied().unwrap_or(0);
            acc | (b as u64) << (8 * i)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arch::addr::Fault;

    #[test]
    fn round_trip_little_endian() {
        let cfg = MemoryConfig::default();
        let mut mem = Memory::new(&cfg);
        mem.store(cfg.data_base, Width::Word, 0x1122_3344).unwrap();
        assert_eq!(mem.load(cfg.data_base, Width::Byte).unwrap(), 0x44);
        assert_eq!(mem.load(cfg.data_base + 2, Width::Half).unwrap(), 0x1122);
        assert_eq!(mem.load(cfg.data_base + 8, Width::Double).unwrap(), 0);
    }

    #[test]
    fn faults_do_not_touch_memory() {
        let cfg = MemoryConfig::default();
        let mut mem = Memory::new(&cfg);
        let err = mem.store(cfg.data_base + 1, Width::Word, 0xff).unwrap_err();
        assert_eq!(err.kind(), AccessKind::Store);
        assert_eq!(err.address(), cfg.data_base + 1);
        assert_eq!(mem.load(cfg.data_base, Width::Double).unwrap(), 0);
    }

    #[test]
    fn text_image() {
        let cfg = MemoryConfig::default();
        let mut mem = Memory::new(&cfg);
        mem.write_image(cfg.text_base, &[0x20, 0x00, 0x02, 0x24]);
        assert_eq!(mem.fetch(cfg.text_base).unwrap(), 0x2402_0020);
        assert_eq!(
            mem.store(cfg.text_base, Width::Word, 0).unwrap_err().fault(),
            Fault::OutOfRange
        );
    }
}
