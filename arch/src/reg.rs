use bimap::BiMap;
use once_cell::sync::Lazy;
use serde::Serialize;

use crate::{error::Error, memory::MemoryConfig};

pub const GP: usize = 28;
pub const SP: usize = 29;

const NAMES: [&str; 32] = [
    "$zero", "$at", "$v0", "$v1", "$a0", "$a1", "$a2", "$a3", //
    "$t0", "$t1", "$t2", "$t3", "$t4", "$t5", "$t6", "$t7", //
    "$s0", "$s1", "$s2", "$s3", "$s4", "$s5", "$s6", "$s7", //
    "$t8", "$t9", "$k0", "$k1", "$gp", "$sp", "$fp", "$ra",
];

static NAME_MAP: Lazy<BiMap<&'static str, usize>> =
    Lazy::new(|| NAMES.iter().enumerate().map(|(i, n)| (*n, i)).collect());

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Register {
    name: &'static str,
    number: usize,
    value: u32,
}

impl Register {
    pub fn new(name: &'static str, number: usize) -> Self {
        Register {
            name,
            number,
            value: 0,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn number(&self) -> usize {
        self.number
    }

    pub fn value(&self) -> u32 {
        self.value
    }
}

/// General-purpose registers plus `pc`, `hi` and `lo`.
///
/// Writes are never filtered: a hardwired `$zero` is the caller's policy.
#[derive(Debug, Clone, Serialize)]
pub struct RegisterFile {
    regs: Vec<Register>,
    pc: u32,
    hi: u32,
    lo: u32,
}

impl RegisterFile {
    /// The 32 MIPS registers, initialized from `config`.
    pub fn new(config: &MemoryConfig) -> Self {
        let regs: Vec<Register> = NAMES
            .iter()
            .enumerate()
            .map(|(i, name)| Register::new(name, i))
            .collect();
        // slot i is built from NAMES[i] with number i
        let mut file = RegisterFile {
            regs,
            pc: 0,
            hi: 0,
            lo: 0,
        };
        file.reset(config);
        file
    }

    /// Register set for another architecture size.
    pub fn from_registers(regs: Vec<Register>) -> Result<Self, Error> {
        Self::verify(&regs)?;
        Ok(RegisterFile {
            regs,
            pc: 0,
            hi: 0,
            lo: 0,
        })
    }

    fn verify(regs: &[Register]) -> Result<(), Error> {
        match regs.iter().enumerate().find(|(slot, r)| r.number != *slot) {
            Some((slot, r)) => Err(Error::RegisterSlotMismatch {
                slot,
                number: r.number,
            }),
            None => Ok(()),
        }
    }

    pub fn reset(&mut self, config: &MemoryConfig) {
        for reg in &mut self.regs {
            reg.value = 0;
        }
        if self.regs.len() == NAMES.len() {
            self.regs[GP].value = config.global_pointer;
            self.regs[SP].value = config.stack_pointer;
        }
        self.pc = config.text_base;
        self.hi = 0;
        self.lo = 0;
    }

    pub fn len(&self) -> usize {
        self.regs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Register> {
        self.regs.iter()
    }

    pub fn get(&self, number: usize) -> Result<&Register, Error> {
        self.regs
            .get(number)
            .ok_or(Error::InvalidRegisterNumber(number))
    }

    pub fn read(&self, number: usize) -> Result<u32, Error> {
        Ok(self.get(number)?.value)
    }

    /// Returns the previous value.
    pub fn write(&mut self, number: usize, value: u32) -> Result<u32, Error> {
        let reg = self
            .regs
            .get_mut(number)
            .ok_or(Error::InvalidRegisterNumber(number))?;
        Ok(std::mem::replace(&mut reg.value, value))
    }

    /// Accepts `$t0`, `t0`, `$8` or `8`.
    pub fn lookup(&self, name: &str) -> Result<usize, Error> {
        let bare = name.strip_prefix('$').unwrap_or(name);
        let number = match bare.parse::<usize>() {
            Ok(n) => Some(n),
            Err(_) => NAME_MAP.get_by_left(format!("${bare}").as_str()).copied(),
        };
        match number {
            Some(n) if n < self.regs.len() => Ok(n),
            _ => Err(Error::UnknownRegisterName(name.to_string())),
        }
    }

    pub fn pc(&self) -> u32 {
        self.pc
    }

    pub fn set_pc(&mut self, pc: u32) {
        self.pc = pc;
    }

    pub fn hi(&self) -> u32 {
        self.hi
    }

    pub fn lo(&self) -> u32 {
        self.lo
    }

    pub fn set_hi(&mut self, value: u32) {
        self.hi = value;
    }

    pub fn set_lo(&mut self, value: u32) {
        self.lo = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_file_passes_slot_check() {
        let file = RegisterFile::new(&MemoryConfig::default());
        let regs: Vec<_> = file.iter().cloned().collect();
        assert!(RegisterFile::verify(&regs).is_ok());
        assert!(RegisterFile::from_registers(regs).is_ok());
    }

    #[test]
    fn numbers_are_slots() {
        let file = RegisterFile::new(&MemoryConfig::default());
        assert_eq!(file.len(), 32);
        for (slot, reg) in file.iter().enumerate() {
            assert_eq!(reg.number(), slot);
        }
    }

    #[test]
    fn mismatched_slots_are_rejected() {
        let regs = vec![Register::new("r0", 0), Register::new("r2", 2)];
        match RegisterFile::from_registers(regs) {
            Err(Error::RegisterSlotMismatch { slot, number }) => {
                assert_eq!((slot, number), (1, 2));
            }
            other => panic!("{other:?}"),
        }
        let regs = (0..8).map(|i| Register::new("r", i)).collect();
        assert_eq!(RegisterFile::from_registers(regs).unwrap().len(), 8);
    }

    #[test]
    fn read_write() {
        let mut file = RegisterFile::new(&MemoryConfig::default());
        assert_eq!(file.write(8, 0xdead_beef).unwrap(), 0);
        assert_eq!(file.read(8).unwrap(), 0xdead_beef);
        assert_eq!(file.write(8, 1).unwrap(), 0xdead_beef);
    }

    #[test]
    fn zero_register_is_not_hardwired() {
        let mut file = RegisterFile::new(&MemoryConfig::default());
        file.write(0, 7).unwrap();
        assert_eq!(file.read(0).unwrap(), 7);
    }

    #[test]
    fn out_of_bounds() {
        let mut file = RegisterFile::new(&MemoryConfig::default());
        assert!(matches!(file.read(32), Err(Error::InvalidRegisterNumber(32))));
        assert!(matches!(
            file.write(usize::MAX, 0),
            Err(Error::InvalidRegisterNumber(usize::MAX))
        ));
        // failed write leaves state alone
        assert!(file.iter().all(|r| r.number() < 32));
    }

    #[test]
    fn initial_values() {
        let cfg = MemoryConfig::default();
        let mut file = RegisterFile::new(&cfg);
        assert_eq!(file.read(GP).unwrap(), 0x1000_8000);
        assert_eq!(file.read(SP).unwrap(), 0x7fff_effc);
        assert_eq!(file.pc(), 0x0040_0000);
        file.write(SP, 0).unwrap();
        file.set_hi(3);
        file.reset(&cfg);
        assert_eq!(file.read(SP).unwrap(), 0x7fff_effc);
        assert_eq!(file.hi(), 0);
    }

    #[test]
    fn names() {
        let file = RegisterFile::new(&MemoryConfig::default());
        assert_eq!(file.lookup("$t0").unwrap(), 8);
        assert_eq!(file.lookup("t0").unwrap(), 8);
        assert_eq!(file.lookup("$8").unwrap(), 8);
        assert_eq!(file.lookup("$ra").unwrap(), 31);
        assert_eq!(file.get(29).unwrap().name(), "$sp");
        assert!(matches!(
            file.lookup("$t10"),
            Err(Error::UnknownRegisterName(_))
        ));
        assert!(file.lookup("$32").is_err());
    }
}
