pub mod machine;
pub mod memory;

pub use machine::Machine;
pub use memory::Memory;
