pub mod allocator;
pub mod layout;

pub use allocator::{Allocation, Allocator, Layout};
pub use layout::{apply, layout, Assembled, Operand, Stmt};
