use std::fmt;
use std::str::FromStr;

use crate::defaults::{DEFAULT_ASSEMBLY, DEFAULT_ELEMENT_TYPE, DEFAULT_ORDER};
use crate::error::LinOpError;

/// Memory order used when a flat column is viewed as an N-D array.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MemoryOrder {
    RowMajor,
    ColumnMajor,
    /// Row-major on the way in; on the way out, column-major only when the
    /// kernel hands back a Fortran-contiguous array.
    Automatic,
}

impl fmt::Display for MemoryOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemoryOrder::RowMajor => write!(f, "C"),
            MemoryOrder::ColumnMajor => write!(f, "F"),
            MemoryOrder::Automatic => write!(f, "A"),
        }
    }
}

impl Default for MemoryOrder {
    fn default() -> Self {
        DEFAULT_ORDER
    }
}

impl FromStr for MemoryOrder {
    type Err = LinOpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "C" | "row-major" => Ok(MemoryOrder::RowMajor),
            "F" | "column-major" => Ok(MemoryOrder::ColumnMajor),
            "A" | "auto" => Ok(MemoryOrder::Automatic),
            _ => Err(LinOpError::InvalidOrder(s.to_owned())),
        }
    }
}

/// Element type advertised through the matrix-free bridge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ElementType {
    Float32,
    Float64,
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementType::Float32 => write!(f, "f32"),
            ElementType::Float64 => write!(f, "f64"),
        }
    }
}

impl Default for ElementType {
    fn default() -> Self {
        DEFAULT_ELEMENT_TYPE
    }
}

impl FromStr for ElementType {
    type Err = LinOpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "f32" | "float32" => Ok(ElementType::Float32),
            "f64" | "float64" => Ok(ElementType::Float64),
            _ => Err(LinOpError::InvalidElementType(s.to_owned())),
        }
    }
}

/// How the command-line driver assembles the operators it loads.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Assembly {
    Hstack,
    Vstack,
    BlockDiag,
}

impl fmt::Display for Assembly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Assembly::Hstack => write!(f, "hstack"),
            Assembly::Vstack => write!(f, "vstack"),
            Assembly::BlockDiag => write!(f, "diag"),
        }
    }
}

impl Default for Assembly {
    fn default() -> Self {
        DEFAULT_ASSEMBLY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_order_parse() {
        assert_eq!("C".parse::<MemoryOrder>().unwrap(), MemoryOrder::RowMajor);
        assert_eq!("F".parse::<MemoryOrder>().unwrap(), MemoryOrder::ColumnMajor);
        assert_eq!("A".parse::<MemoryOrder>().unwrap(), MemoryOrder::Automatic);
        assert_eq!(
            "column-major".parse::<MemoryOrder>().unwrap(),
            MemoryOrder::ColumnMajor
        );
    }

    #[test]
    fn test_memory_order_rejects_unknown() {
        let err = "K".parse::<MemoryOrder>().unwrap_err();
        assert!(matches!(err, LinOpError::InvalidOrder(ref s) if s == "K"));
    }

    #[test]
    fn test_display_round_trip() {
        for order in [
            MemoryOrder::RowMajor,
            MemoryOrder::ColumnMajor,
            MemoryOrder::Automatic,
        ] {
            assert_eq!(order.to_string().parse::<MemoryOrder>().unwrap(), order);
        }
        for dtype in [ElementType::Float32, ElementType::Float64] {
            assert_eq!(dtype.to_string().parse::<ElementType>().unwrap(), dtype);
        }
    }

    #[test]
    fn test_defaults() {
        assert_eq!(MemoryOrder::default(), MemoryOrder::RowMajor);
        assert_eq!(ElementType::default(), ElementType::Float64);
        assert_eq!(Assembly::default().to_string(), "diag");
    }
}
