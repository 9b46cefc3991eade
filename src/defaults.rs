use crate::configs::{Assembly, ElementType, MemoryOrder};
use crate::types::Float;

// adjoint test
pub const DEFAULT_SIGNIFICANT: i32 = 7;

// utilities
pub const DEFAULT_ORDER: MemoryOrder = MemoryOrder::RowMajor;

// convert
pub const DEFAULT_ELEMENT_TYPE: ElementType = ElementType::Float64;

// bicgstab
pub const DEFAULT_BICGSTAB_TOL: Float = 1e-8;

// main
pub const DEFAULT_ASSEMBLY: Assembly = Assembly::BlockDiag;
