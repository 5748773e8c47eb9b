pub use self::error::{DimensionError, IndexError, MatrixError, Operation};
pub use self::matrix::{DenseMatrix, Rows};

mod error;
mod matrix;

pub type Value = f64;

pub trait ValueType {
    const ZERO: Self;
    const ONE: Self;
}

impl ValueType for f64 {
    const ZERO: Self = 0.0;
    const ONE: Self = 1.0;
}
