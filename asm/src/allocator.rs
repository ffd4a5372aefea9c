use arch::{addr::Validator, Error, MemoryConfig, SegmentKind, Width};
use serde::Serialize;
use strum::IntoEnumIterator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Allocation {
    pub segment: SegmentKind,
    pub address: u32,
    pub size: u32,
}

#[derive(Debug, Clone)]
struct Segment {
    base: u32,
    limit: u64,
    offset: u64,
    auto_align: bool,
}

impl Segment {
    fn new((base, limit): (u32, u64)) -> Self {
        Segment {
            base,
            limit,
            offset: 0,
            auto_align: true,
        }
    }

    /// Address at `offset`. A segment filled up to 0xffffffff has none left.
    fn address_at(&self, kind: SegmentKind, offset: u64) -> Result<u32, Error> {
        u32::try_from(self.base as u64 + offset).map_err(|_| Error::AddressSpaceExhausted(kind))
    }

    fn available(&self) -> u64 {
        self.limit - self.offset
    }

    /// Offset after reserving `size` bytes at `start`, or None past the limit.
    fn fits(&self, start: u64, size: u64) -> Option<u64> {
        start.checked_add(size).filter(|end| *end <= self.limit)
    }
}

/// Bump allocator over the four segments plus the extern area.
#[derive(Debug, Clone)]
pub struct Allocator {
    config: MemoryConfig,
    segments: Vec<Segment>,
    extern_area: Segment,
    current: SegmentKind,
}

impl Allocator {
    pub fn new(config: MemoryConfig) -> Self {
        let segments = SegmentKind::iter()
            .map(|kind| Segment::new(config.segment(kind)))
            .collect();
        let extern_area = Segment::new(config.extern_area());
        Allocator {
            config,
            segments,
            extern_area,
            current: SegmentKind::Text,
        }
    }

    pub fn config(&self) -> &MemoryConfig {
        &self.config
    }

    pub fn current(&self) -> SegmentKind {
        self.current
    }

    pub fn offset(&self, kind: SegmentKind) -> u64 {
        self.segments[kind.index()].offset
    }

    /// Next address handed out in the active segment.
    pub fn address(&self) -> Result<u32, Error> {
        let seg = self.active();
        seg.address_at(self.current, seg.offset)
    }

    fn active(&self) -> &Segment {
        &self.segments[self.current.index()]
    }

    fn active_mut(&mut self) -> &mut Segment {
        &mut self.segments[self.current.index()]
    }

    /// Re-entering a segment restores automatic alignment.
    pub fn select(&mut self, kind: SegmentKind) {
        self.current = kind;
        self.active_mut().auto_align = true;
    }

    /// `.align e`. Exponent 0 also switches off automatic alignment
    /// until the next `select`.
    pub fn align(&mut self, exponent: u32) -> Result<u32, Error> {
        let width = Width::from_exponent(exponent)?;
        let kind = self.current;
        let seg = self.active_mut();
        let aligned = width.align_up(seg.offset);
        if aligned > seg.limit {
            return Err(Error::AllocationOverflow {
                segment: kind,
                requested: aligned - seg.offset,
                available: seg.available(),
            });
        }
        let address = seg.address_at(kind, aligned)?;
        seg.offset = aligned;
        seg.auto_align = exponent != 0;
        Ok(address)
    }

    /// Reserves `count` elements of `size`, one Allocation each.
    pub fn emit(&mut self, size: Width, count: usize) -> Result<Vec<Allocation>, Error> {
        let kind = self.current;
        let seg = self.active_mut();
        let start = if seg.auto_align {
            size.align_up(seg.offset)
        } else {
            seg.offset
        };
        let total = (size.bytes() as u64).saturating_mul(count as u64);
        let end = seg.fits(start, total).ok_or(Error::AllocationOverflow {
            segment: kind,
            requested: (start - seg.offset).saturating_add(total),
            available: seg.available(),
        })?;
        seg.offset = end;
        let base = seg.base as u64 + start;
        Ok((0..count as u64)
            .map(|i| Allocation {
                segment: kind,
                address: (base + i * size.bytes() as u64) as u32,
                size: size.bytes(),
            })
            .collect())
    }

    /// `.space n`: raw bytes, no alignment.
    pub fn reserve(&mut self, n: u32) -> Result<Allocation, Error> {
        let kind = self.current;
        let seg = self.active_mut();
        Self::bump(seg, kind, n)
    }

    /// `.extern label n`, placed in the global-pointer area.
    pub fn reserve_extern(&mut self, n: u32) -> Result<Allocation, Error> {
        Self::bump(&mut self.extern_area, SegmentKind::Data, n)
    }

    fn bump(seg: &mut Segment, kind: SegmentKind, n: u32) -> Result<Allocation, Error> {
        let start = seg.offset;
        seg.offset = seg.fits(start, n as u64).ok_or(Error::AllocationOverflow {
            segment: kind,
            requested: n as u64,
            available: seg.available(),
        })?;
        Ok(Allocation {
            segment: kind,
            address: (seg.base as u64 + start) as u32,
            size: n,
        })
    }

    /// Ends assembly. Offsets can no longer move.
    pub fn finish(self) -> Layout {
        let used = SegmentKind::iter()
            .map(|kind| (kind, self.segments[kind.index()].offset))
            .collect();
        Layout {
            config: self.config,
            used,
            extern_used: self.extern_area.offset,
        }
    }
}

// ----------------------------------------------------------------------------
// Layout

/// Frozen segment usage handed from the assembler to the simulator.
#[derive(Debug, Clone, Serialize)]
pub struct Layout {
    config: MemoryConfig,
    used: Vec<(SegmentKind, u64)>,
    extern_used: u64,
}

impl Layout {
    pub fn config(&self) -> &MemoryConfig {
        &self.config
    }

    pub fn used(&self, kind: SegmentKind) -> u64 {
        self.used
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, n)| *n)
            .unwrap_or(0)
    }

    pub fn extern_used(&self) -> u64 {
        self.extern_used
    }

    pub fn validator(&self) -> Validator {
        Validator::new(&self.config)
    }
}
