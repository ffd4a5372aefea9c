pub mod addr;
pub mod directive;
pub mod error;
pub mod memory;
pub mod reg;
pub mod width;

pub use addr::{AccessKind, AddressError, Validator};
pub use directive::{Category, Directive, EmitKind, NumericKind, SymbolKind};
pub use error::Error;
pub use memory::{MemoryConfig, SegmentKind};
pub use reg::{Register, RegisterFile};
pub use width::Width;
