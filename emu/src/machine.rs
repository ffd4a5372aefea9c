use arch::{AccessKind, Error, MemoryConfig, RegisterFile, Width};

use crate::memory::Memory;

/// Register file and memory of one simulation session.
#[derive(Debug, Clone)]
pub struct Machine {
    pub regs: RegisterFile,
    pub mem: Memory,
}

impl Machine {
    pub fn new(config: &MemoryConfig) -> Self {
        Machine {
            regs: RegisterFile::new(config),
            mem: Memory::new(config),
        }
    }

    /// `base + offset` with a sign-extended 16-bit displacement.
    pub fn effective_address(&self, base: usize, offset: i16) -> Result<u32, Error> {
        Ok(self.regs.read(base)?.wrapping_add(offset as i32 as u32))
    }

    /// Loads `width` bytes at `offset(base)` into register `rt`, sign-extended.
    pub fn load(&mut self, rt: usize, base: usize, offset: i16, width: Width) -> Result<u32, Error> {
        self.regs.get(rt)?;
        let addr = self.effective_address(base, offset)?;
        let raw = self.mem.load(addr, width)?;
        let value = match width {
            Width::Byte => raw as u8 as i8 as i32 as u32,
            Width::Half => raw as u16 as i16 as i32 as u32,
            Width::Word | Width::Double => raw as u32,
        };
        self.regs.write(rt, value)?;
        Ok(addr)
    }

    /// Stores the low `width` bytes of register `rt` at `offset(base)`.
    pub fn store(&mut self, rt: usize, base: usize, offset: i16, width: Width) -> Result<u32, Error> {
        let value = self.regs.read(rt)?;
        let addr = self.effective_address(base, offset)?;
        self.mem.store(addr, width, value as u64)?;
        Ok(addr)
    }

    /// Address check only, for callers that manage their own storage.
    pub fn probe(&self, addr: u32, kind: AccessKind, width: Width) -> Result<u32, Error> {
        Ok(self.mem.validator().validate(addr, kind, width)?)
    }
}
