use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use strum::{Display, EnumIter, EnumString};

use crate::error::Error;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
pub enum SegmentKind {
    #[strum(serialize = "text")]
    Text,
    #[strum(serialize = "data")]
    Data,
    #[strum(serialize = "ktext")]
    KernelText,
    #[strum(serialize = "kdata")]
    KernelData,
}

impl SegmentKind {
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn is_text(self) -> bool {
        matches!(self, SegmentKind::Text | SegmentKind::KernelText)
    }
}

/// Segment boundaries of the simulated address space.
/// Every `*_limit` is the highest address an access may start at: the last
/// word for the text segments, the last byte everywhere else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryConfig {
    pub name: String,
    pub text_base: u32,
    pub text_limit: u32,
    pub extern_base: u32,
    pub extern_limit: u32,
    pub global_pointer: u32,
    pub data_base: u32,
    pub heap_base: u32,
    pub stack_pointer: u32,
    pub data_limit: u32,
    pub ktext_base: u32,
    pub ktext_limit: u32,
    pub kdata_base: u32,
    pub kdata_limit: u32,
    pub mmio_base: u32,
    pub mmio_limit: u32,
    #[serde(default)]
    pub self_modifying_code: bool,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        MemoryConfig {
            name: "default".to_string(),
            text_base: 0x0040_0000,
            text_limit: 0x0fff_fffc,
            extern_base: 0x1000_0000,
            extern_limit: 0x1000_ffff,
            global_pointer: 0x1000_8000,
            data_base: 0x1001_0000,
            heap_base: 0x1004_0000,
            stack_pointer: 0x7fff_effc,
            data_limit: 0x7fff_ffff,
            ktext_base: 0x8000_0000,
            ktext_limit: 0x8fff_fffc,
            kdata_base: 0x9000_0000,
            kdata_limit: 0xfffe_ffff,
            mmio_base: 0xffff_0000,
            mmio_limit: 0xffff_ffff,
            self_modifying_code: false,
        }
    }
}

// ----------------------------------------------------------------------------
// Presets

impl MemoryConfig {
    pub fn compact_data_at_zero() -> Self {
        MemoryConfig {
            name: "compact-data-at-zero".to_string(),
            text_base: 0x3000,
            text_limit: 0x3ffc,
            extern_base: 0x1000,
            extern_limit: 0x1fff,
            global_pointer: 0x1800,
            data_base: 0x0000,
            heap_base: 0x2000,
            stack_pointer: 0x2ffc,
            data_limit: 0x2fff,
            ktext_base: 0x4000,
            ktext_limit: 0x4ffc,
            kdata_base: 0x5000,
            kdata_limit: 0x7eff,
            mmio_base: 0x7f00,
            mmio_limit: 0x7fff,
            self_modifying_code: false,
        }
    }

    pub fn compact_text_at_zero() -> Self {
        MemoryConfig {
            name: "compact-text-at-zero".to_string(),
            text_base: 0x0000,
            text_limit: 0x0ffc,
            extern_base: 0x1000,
            extern_limit: 0x1fff,
            global_pointer: 0x1800,
            data_base: 0x2000,
            heap_base: 0x3000,
            stack_pointer: 0x3ffc,
            data_limit: 0x3fff,
            ktext_base: 0x4000,
            ktext_limit: 0x4ffc,
            kdata_base: 0x5000,
            kdata_limit: 0x7eff,
            mmio_base: 0x7f00,
            mmio_limit: 0x7fff,
            self_modifying_code: false,
        }
    }

    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "default" => Some(Self::default()),
            "compact-data-at-zero" => Some(Self::compact_data_at_zero()),
            "compact-text-at-zero" => Some(Self::compact_text_at_zero()),
            _ => None,
        }
    }

    pub fn from_yaml(src: &str) -> Result<Self, Error> {
        let config: Self = serde_yaml::from_str(src)?;
        config.check()?;
        Ok(config)
    }

    /// Rejects regions that end before they start and static data that
    /// begins inside the extern area.
    pub fn check(&self) -> Result<(), Error> {
        let regions = [
            ("text", self.text_base, self.text_limit),
            ("extern", self.extern_base, self.extern_limit),
            ("data", self.data_base, self.data_limit),
            ("ktext", self.ktext_base, self.ktext_limit),
            ("kdata", self.kdata_base, self.kdata_limit),
            ("mmio", self.mmio_base, self.mmio_limit),
        ];
        for (name, base, limit) in regions {
            if base > limit {
                return Err(Error::ConfigInvalid(format!(
                    "{name} base 0x{base:08x} is above its limit 0x{limit:08x}"
                )));
            }
        }
        if self.heap_base < self.data_base {
            return Err(Error::ConfigInvalid(format!(
                "heap base 0x{:08x} is below data base 0x{:08x}",
                self.heap_base, self.data_base
            )));
        }
        if (self.extern_base..=self.extern_limit).contains(&self.data_base) {
            return Err(Error::ConfigInvalid(format!(
                "data base 0x{:08x} lies inside the extern area 0x{:08x}..=0x{:08x}",
                self.data_base, self.extern_base, self.extern_limit
            )));
        }
        Ok(())
    }

    pub fn load(path: &str) -> Result<Self, Error> {
        let src =
            std::fs::read_to_string(path).map_err(|e| Error::ConfigRead(path.to_string(), e))?;
        Self::from_yaml(&src)
    }

    pub fn to_yaml(&self) -> Result<String, Error> {
        Ok(serde_yaml::to_string(self)?)
    }
}

// ----------------------------------------------------------------------------
// Regions

/// One past the last byte of the word containing `limit`.
fn word_end(limit: u32) -> u64 {
    (limit | 3) as u64 + 1
}

impl MemoryConfig {
    /// Base address and byte capacity of the region a segment allocates into.
    /// Static data stops at the heap, or earlier at an extern area above it.
    pub fn segment(&self, kind: SegmentKind) -> (u32, u64) {
        let (base, end) = match kind {
            SegmentKind::Text => (self.text_base, word_end(self.text_limit)),
            SegmentKind::Data => {
                let mut end = self.heap_base as u64;
                if self.extern_base > self.data_base {
                    end = end.min(self.extern_base as u64);
                }
                (self.data_base, end)
            }
            SegmentKind::KernelText => (self.ktext_base, word_end(self.ktext_limit)),
            SegmentKind::KernelData => (self.kdata_base, word_end(self.kdata_limit)),
        };
        (base, end.saturating_sub(base as u64))
    }

    pub fn extern_area(&self) -> (u32, u64) {
        let end = self.extern_limit as u64 + 1;
        (self.extern_base, end.saturating_sub(self.extern_base as u64))
    }

    pub fn text_range(&self) -> RangeInclusive<u32> {
        self.text_base..=self.text_limit
    }

    /// Extern area, static data, heap and stack.
    pub fn user_data_range(&self) -> RangeInclusive<u32> {
        self.extern_base.min(self.data_base)..=self.data_limit
    }

    pub fn ktext_range(&self) -> RangeInclusive<u32> {
        self.ktext_base..=self.ktext_limit
    }

    pub fn kdata_range(&self) -> RangeInclusive<u32> {
        self.kdata_base..=self.kdata_limit
    }

    pub fn mmio_range(&self) -> RangeInclusive<u32> {
        self.mmio_base..=self.mmio_limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_segments() {
        let cfg = MemoryConfig::default();
        assert_eq!(cfg.segment(SegmentKind::Data), (0x1001_0000, 0x30000));
        assert_eq!(cfg.segment(SegmentKind::Text).0, 0x0040_0000);
        assert_eq!(cfg.segment(SegmentKind::KernelData).0, 0x9000_0000);
        assert_eq!(cfg.extern_area(), (0x1000_0000, 0x10000));
    }

    #[test]
    fn text_ends_at_last_word() {
        let cfg = MemoryConfig::default();
        assert_eq!(cfg.text_limit, 0x0fff_fffc);
        assert_eq!(cfg.ktext_limit, 0x8fff_fffc);
        assert_eq!(
            cfg.segment(SegmentKind::Text),
            (0x0040_0000, 0x1000_0000 - 0x0040_0000)
        );
    }

    #[test]
    fn compact_data_stops_below_extern() {
        let cfg = MemoryConfig::compact_data_at_zero();
        assert_eq!(cfg.segment(SegmentKind::Data), (0x0000, 0x1000));
        assert_eq!(cfg.extern_area(), (0x1000, 0x1000));
        let cfg = MemoryConfig::compact_text_at_zero();
        assert_eq!(cfg.segment(SegmentKind::Data), (0x2000, 0x1000));
    }

    #[test]
    fn presets_pass_check() {
        for cfg in [
            MemoryConfig::default(),
            MemoryConfig::compact_data_at_zero(),
            MemoryConfig::compact_text_at_zero(),
        ] {
            assert!(cfg.check().is_ok(), "{}", cfg.name);
        }
    }

    #[test]
    fn data_inside_extern_is_rejected() {
        let cfg = MemoryConfig {
            data_base: 0x1000_4000,
            ..MemoryConfig::default()
        };
        assert!(matches!(cfg.check(), Err(Error::ConfigInvalid(_))));
        let yaml = serde_yaml::to_string(&cfg).unwrap();
        assert!(matches!(
            MemoryConfig::from_yaml(&yaml),
            Err(Error::ConfigInvalid(_))
        ));
    }

    #[test]
    fn inverted_region_is_rejected() {
        let cfg = MemoryConfig {
            kdata_limit: 0x8000_0000,
            ..MemoryConfig::default()
        };
        assert!(matches!(cfg.check(), Err(Error::ConfigInvalid(_))));
    }

    #[test]
    fn yaml() {
        let cfg = MemoryConfig::compact_text_at_zero();
        let yaml = cfg.to_yaml().unwrap();
        assert_eq!(MemoryConfig::from_yaml(&yaml).unwrap(), cfg);
    }

    #[test]
    fn yaml_without_self_modifying_flag() {
        let mut yaml = MemoryConfig::default().to_yaml().unwrap();
        yaml = yaml
            .lines()
            .filter(|l| !l.starts_with("self_modifying_code"))
            .collect::<Vec<_>>()
            .join("\n");
        let cfg = MemoryConfig::from_yaml(&yaml).unwrap();
        assert!(!cfg.self_modifying_code);
    }

    #[test]
    fn bad_yaml() {
        assert!(matches!(
            MemoryConfig::from_yaml("name: [oops"),
            Err(Error::ConfigParse(_))
        ));
    }

    #[test]
    fn presets() {
        assert!(MemoryConfig::preset("default").is_some());
        assert!(MemoryConfig::preset("compact-data-at-zero").is_some());
        assert!(MemoryConfig::preset("nope").is_none());
    }
}
