use std::borrow::Borrow;
use std::fmt;
use std::iter::FusedIterator;
use std::ops::{Mul, MulAssign, Neg};

use rand::distributions::{Distribution, Uniform};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{DimensionError, IndexError, MatrixError, Operation, Value, ValueType};

/// A dense two-dimensional array of values, stored in row-major order.
///
/// Every operation returns a new matrix; the element setters exist to
/// populate a matrix after construction.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "MatrixData")]
pub struct DenseMatrix {
    dim: [usize; 2],
    values: Vec<Value>,
}

#[derive(Deserialize)]
struct MatrixData {
    dim: [usize; 2],
    values: Vec<Value>,
}

impl TryFrom<MatrixData> for DenseMatrix {
    type Error = MatrixError;

    fn try_from(data: MatrixData) -> Result<Self, Self::Error> {
        // `from_rows` of nothing.
        if data.dim == [0, 0] && data.values.is_empty() {
            return Ok(Self {
                dim: data.dim,
                values: data.values,
            });
        }

        Self::from_vec(data.dim[0], data.dim[1], data.values)
    }
}

impl DenseMatrix {
    pub fn zeros(rows: usize, columns: usize) -> Result<Self, MatrixError> {
        Self::filled(rows, columns, Value::ZERO)
    }

    pub fn ones(rows: usize, columns: usize) -> Result<Self, MatrixError> {
        Self::filled(rows, columns, Value::ONE)
    }

    pub fn identity(size: usize) -> Result<Self, MatrixError> {
        let mut identity = Self::zeros(size, size)?;
        for i in 0..size {
            identity.values[i * size + i] = Value::ONE;
        }
        Ok(identity)
    }

    /// Creates a matrix whose entries are drawn independently and uniformly
    /// from `[min, max)`.
    pub fn random(
        rows: usize,
        columns: usize,
        min: Value,
        max: Value,
        rng: &mut impl Rng,
    ) -> Result<Self, MatrixError> {
        if min.is_nan() || max.is_nan() || min >= max || !(max - min).is_finite() {
            return Err(MatrixError::Range { min, max });
        }

        let mut matrix = Self::zeros(rows, columns)?;

        let distribution = Uniform::new(min, max);
        matrix
            .values_mut()
            .for_each(|x| *x = distribution.sample(rng));

        Ok(matrix)
    }

    pub fn from_vec(rows: usize, columns: usize, values: Vec<Value>) -> Result<Self, MatrixError> {
        check_dim(rows, columns)?;
        if values.len() != rows * columns {
            return Err(DimensionError::Length {
                dim: [rows, columns],
                found: values.len(),
            }
            .into());
        }

        Ok(Self {
            dim: [rows, columns],
            values,
        })
    }

    /// Creates a 1 by `values.len()` matrix.
    pub fn row_vector(values: Vec<Value>) -> Result<Self, MatrixError> {
        Self::from_vec(1, values.len(), values)
    }

    /// Stacks the rows of every given matrix on top of each other.
    ///
    /// Every matrix must have the same number of columns. An empty list
    /// produces a 0x0 matrix.
    pub fn from_rows<I>(rows: I) -> Result<Self, MatrixError>
    where
        I: IntoIterator,
        I::Item: Borrow<DenseMatrix>,
    {
        let mut columns = None;
        let mut row_count = 0;
        let mut values = Vec::new();

        for (i, row) in rows.into_iter().enumerate() {
            let row = row.borrow();
            let expected = *columns.get_or_insert(row.dim[1]);
            if row.dim[1] != expected {
                return Err(DimensionError::RaggedRows {
                    row: i,
                    expected,
                    found: row.dim[1],
                }
                .into());
            }

            row_count += row.dim[0];
            values.extend_from_slice(&row.values);
        }

        Ok(Self {
            dim: [row_count, columns.unwrap_or(0)],
            values,
        })
    }

    fn filled(rows: usize, columns: usize, value: Value) -> Result<Self, MatrixError> {
        check_dim(rows, columns)?;
        Ok(Self {
            dim: [rows, columns],
            values: vec![value; rows * columns],
        })
    }

    /// Returns `[rows, columns]`.
    pub fn dim(&self) -> [usize; 2] {
        self.dim
    }

    pub fn get(&self, row: usize, column: usize) -> Result<Value, MatrixError> {
        let i = self.offset(row, column)?;
        Ok(self.values[i])
    }

    pub fn set(&mut self, row: usize, column: usize, value: Value) -> Result<(), MatrixError> {
        let i = self.offset(row, column)?;
        self.values[i] = value;
        Ok(())
    }

    fn offset(&self, row: usize, column: usize) -> Result<usize, IndexError> {
        if row < self.dim[0] && column < self.dim[1] {
            Ok(row * self.dim[1] + column)
        } else {
            Err(IndexError {
                row,
                column,
                dim: self.dim,
            })
        }
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.values.iter()
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut Value> {
        self.values.iter_mut()
    }

    pub fn as_slice(&self) -> &[Value] {
        &self.values
    }

    pub fn add(&self, other: &DenseMatrix) -> Result<DenseMatrix, MatrixError> {
        self.zip_with(other, Operation::Add, |a, b| a + b)
    }

    pub fn sub(&self, other: &DenseMatrix) -> Result<DenseMatrix, MatrixError> {
        self.zip_with(other, Operation::Subtract, |a, b| a - b)
    }

    /// Element-wise product. Fails if either dimension differs.
    pub fn hadamard(&self, other: &DenseMatrix) -> Result<DenseMatrix, MatrixError> {
        self.zip_with(other, Operation::Hadamard, |a, b| a * b)
    }

    fn zip_with(
        &self,
        other: &DenseMatrix,
        operation: Operation,
        f: impl Fn(Value, Value) -> Value,
    ) -> Result<DenseMatrix, MatrixError> {
        if self.dim != other.dim {
            return Err(MatrixError::mismatch(operation, self.dim, other.dim));
        }

        let values = self
            .values
            .iter()
            .zip(&other.values)
            .map(|(&a, &b)| f(a, b))
            .collect();

        Ok(Self {
            dim: self.dim,
            values,
        })
    }

    pub fn scale(&self, coefficient: Value) -> DenseMatrix {
        self * coefficient
    }

    /// The standard matrix product `self · other`.
    pub fn multiply(&self, other: &DenseMatrix) -> Result<DenseMatrix, MatrixError> {
        let [rows, inner] = self.dim;
        let [other_rows, columns] = other.dim;
        if inner != other_rows {
            return Err(MatrixError::mismatch(
                Operation::Multiply,
                self.dim,
                other.dim,
            ));
        }

        let mut values: Vec<Value> = Vec::with_capacity(rows * columns);
        for row in 0..rows {
            for column in 0..columns {
                values.push(
                    (0..inner)
                        .map(|k| self.values[row * inner + k] * other.values[k * columns + column])
                        .sum::<Value>(),
                );
            }
        }

        Ok(Self {
            dim: [rows, columns],
            values,
        })
    }

    pub fn transpose(&self) -> DenseMatrix {
        let [rows, columns] = self.dim;

        let mut values = vec![Value::ZERO; rows * columns];
        for row in 0..rows {
            for column in 0..columns {
                values[column * rows + row] = self.values[row * columns + column];
            }
        }

        Self {
            dim: [columns, rows],
            values,
        }
    }

    /// Returns row `i` as a 1xN matrix.
    pub fn row(&self, i: usize) -> Result<DenseMatrix, MatrixError> {
        if i >= self.dim[0] {
            return Err(IndexError {
                row: i,
                column: 0,
                dim: self.dim,
            }
            .into());
        }

        Ok(self.row_unchecked(i))
    }

    fn row_unchecked(&self, i: usize) -> DenseMatrix {
        let columns = self.dim[1];
        Self {
            dim: [1, columns],
            values: self.values[i * columns..(i + 1) * columns].to_vec(),
        }
    }

    /// Iterates over the rows of the matrix as 1xN matrices, in order.
    pub fn rows(&self) -> Rows<'_> {
        Rows {
            matrix: self,
            next: 0,
        }
    }

    /// Joins `other` onto the right side of `self`.
    pub fn concat_columns(&self, other: &DenseMatrix) -> Result<DenseMatrix, MatrixError> {
        if self.dim[0] != other.dim[0] {
            return Err(MatrixError::mismatch(
                Operation::Concatenate,
                self.dim,
                other.dim,
            ));
        }

        let rows = self.dim[0];
        let columns = self.dim[1] + other.dim[1];

        let mut values = Vec::with_capacity(rows * columns);
        for row in 0..rows {
            values.extend_from_slice(self.row_slice(row));
            values.extend_from_slice(other.row_slice(row));
        }

        Ok(Self {
            dim: [rows, columns],
            values,
        })
    }

    /// Splits the matrix into the columns before `at` and the columns from `at` onward.
    pub fn split_columns(&self, at: usize) -> Result<(DenseMatrix, DenseMatrix), MatrixError> {
        let [rows, columns] = self.dim;
        check_dim(rows, at)?;
        check_dim(rows, columns.saturating_sub(at))?;

        let mut left = Vec::with_capacity(rows * at);
        let mut right = Vec::with_capacity(rows * (columns - at));
        for row in 0..rows {
            let (l, r) = self.row_slice(row).split_at(at);
            left.extend_from_slice(l);
            right.extend_from_slice(r);
        }

        Ok((
            Self {
                dim: [rows, at],
                values: left,
            },
            Self {
                dim: [rows, columns - at],
                values: right,
            },
        ))
    }

    fn row_slice(&self, row: usize) -> &[Value] {
        let columns = self.dim[1];
        &self.values[row * columns..(row + 1) * columns]
    }

    /// Compares shape exactly and values within `tolerance`.
    pub fn approx_eq(&self, other: &DenseMatrix, tolerance: Value) -> bool {
        self.dim == other.dim
            && self
                .values
                .iter()
                .zip(&other.values)
                .all(|(a, b)| (a - b).abs() <= tolerance)
    }
}

fn check_dim(rows: usize, columns: usize) -> Result<(), DimensionError> {
    if rows < 1 || columns < 1 {
        Err(DimensionError::Empty([rows, columns]))
    } else {
        Ok(())
    }
}

#[derive(Clone)]
pub struct Rows<'a> {
    matrix: &'a DenseMatrix,
    next: usize,
}

impl<'a> Iterator for Rows<'a> {
    type Item = DenseMatrix;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next < self.matrix.dim[0] {
            let row = self.matrix.row_unchecked(self.next);
            self.next += 1;
            Some(row)
        } else {
            None
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.matrix.dim[0] - self.next;
        (remaining, Some(remaining))
    }
}

impl<'a> ExactSizeIterator for Rows<'a> {}

impl<'a> FusedIterator for Rows<'a> {}

impl TryFrom<Vec<Vec<Value>>> for DenseMatrix {
    type Error = MatrixError;

    fn try_from(rows: Vec<Vec<Value>>) -> Result<Self, Self::Error> {
        let rows = rows
            .into_iter()
            .map(DenseMatrix::row_vector)
            .collect::<Result<Vec<_>, _>>()?;
        DenseMatrix::from_rows(rows)
    }
}

impl Mul<Value> for DenseMatrix {
    type Output = DenseMatrix;

    fn mul(mut self, rhs: Value) -> Self::Output {
        self *= rhs;
        self
    }
}

impl Mul<Value> for &DenseMatrix {
    type Output = DenseMatrix;

    fn mul(self, rhs: Value) -> Self::Output {
        self.clone() * rhs
    }
}

impl MulAssign<Value> for DenseMatrix {
    fn mul_assign(&mut self, rhs: Value) {
        self.values_mut().for_each(|x| *x *= rhs);
    }
}

impl Neg for DenseMatrix {
    type Output = DenseMatrix;

    fn neg(self) -> Self::Output {
        self * -Value::ONE
    }
}

impl Neg for &DenseMatrix {
    type Output = DenseMatrix;

    fn neg(self) -> Self::Output {
        self * -Value::ONE
    }
}

impl fmt::Display for DenseMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..self.dim[0] {
            for value in self.row_slice(row) {
                write!(f, "{value:.6}\t")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl fmt::Debug for DenseMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [rows, columns] = self.dim;
        if rows == 0 {
            return write!(f, "[]");
        }

        for row in 0..rows {
            write!(f, "{}", if row == 0 { "[" } else { " " })?;
            for column in 0..columns {
                fmt::Debug::fmt(&self.values[row * columns + column], f)?;
                if column < columns - 1 {
                    write!(f, " ")?;
                }
            }
            write!(f, "{}", if row < rows - 1 { "\n" } else { "]" })?;
        }
        Ok(())
    }
}
