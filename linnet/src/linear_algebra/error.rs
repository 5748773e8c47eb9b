use std::error::Error;
use std::fmt;

use super::Value;

/// The matrix operation that rejected its operands.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Operation {
    Add,
    Subtract,
    Multiply,
    Hadamard,
    Concatenate,
    Assign,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Add => "add",
            Self::Subtract => "subtract",
            Self::Multiply => "multiply",
            Self::Hadamard => "hadamard",
            Self::Concatenate => "concatenate",
            Self::Assign => "assign",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DimensionError {
    /// The operand shapes are incompatible for `operation`.
    Mismatch {
        operation: Operation,
        left: [usize; 2],
        right: [usize; 2],
    },
    /// Explicit dimensions must both be at least 1.
    Empty([usize; 2]),
    /// The number of values does not fill the requested shape.
    Length { dim: [usize; 2], found: usize },
    /// A row passed to a row-list constructor has the wrong width.
    RaggedRows {
        row: usize,
        expected: usize,
        found: usize,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct IndexError {
    pub row: usize,
    pub column: usize,
    pub dim: [usize; 2],
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MatrixError {
    Dimension(DimensionError),
    Index(IndexError),
    /// `[min, max)` is empty or too wide to sample from.
    Range { min: Value, max: Value },
}

impl MatrixError {
    pub(crate) fn mismatch(operation: Operation, left: [usize; 2], right: [usize; 2]) -> Self {
        Self::Dimension(DimensionError::Mismatch {
            operation,
            left,
            right,
        })
    }
}

impl From<DimensionError> for MatrixError {
    fn from(error: DimensionError) -> Self {
        Self::Dimension(error)
    }
}

impl From<IndexError> for MatrixError {
    fn from(error: IndexError) -> Self {
        Self::Index(error)
    }
}

impl fmt::Display for DimensionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mismatch {
                operation,
                left,
                right,
            } => write!(
                f,
                "cannot {operation} matrices of shape {}x{} and {}x{}",
                left[0], left[1], right[0], right[1]
            ),
            Self::Empty(dim) => write!(f, "invalid dimensions: {}, {}", dim[0], dim[1]),
            Self::Length { dim, found } => write!(
                f,
                "{found} values cannot fill a {}x{} matrix",
                dim[0], dim[1]
            ),
            Self::RaggedRows {
                row,
                expected,
                found,
            } => write!(
                f,
                "row {row} has {found} columns, expected {expected}"
            ),
        }
    }
}

impl fmt::Display for IndexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "index ({}, {}) is out of bounds for a {}x{} matrix",
            self.row, self.column, self.dim[0], self.dim[1]
        )
    }
}

impl fmt::Display for MatrixError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dimension(error) => fmt::Display::fmt(error, f),
            Self::Index(error) => fmt::Display::fmt(error, f),
            Self::Range { min, max } => write!(f, "cannot sample values from [{min}, {max})"),
        }
    }
}

impl Error for DimensionError {}

impl Error for IndexError {}

impl Error for MatrixError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Dimension(error) => Some(error),
            Self::Index(error) => Some(error),
            Self::Range { .. } => None,
        }
    }
}
