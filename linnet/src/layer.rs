use rand::Rng;

use crate::linear_algebra::{DenseMatrix, MatrixError, Operation, Value};

/// One node of the layer chain used to seed a network's weights.
///
/// A layer holds a 1xN row of values and, once linked, the weight matrix
/// connecting it to the next layer.
#[derive(Clone, Debug)]
pub struct Layer {
    values: DenseMatrix,
    weights: Option<DenseMatrix>,
}

const WEIGHT_RANGE: (Value, Value) = (0.0, 1.0);

impl Layer {
    pub fn new(dim: usize) -> Result<Self, MatrixError> {
        Ok(Self {
            values: DenseMatrix::zeros(1, dim)?,
            weights: None,
        })
    }

    pub fn with_successor(dim: usize, next: &Layer, rng: &mut impl Rng) -> Result<Self, MatrixError> {
        let mut layer = Self::new(dim)?;
        layer.link(next, rng)?;
        Ok(layer)
    }

    pub fn dim(&self) -> usize {
        self.values.dim()[1]
    }

    /// Allocates weights of shape `(self.dim(), next.dim())`, drawn uniformly from `[0, 1)`.
    pub fn link(&mut self, next: &Layer, rng: &mut impl Rng) -> Result<(), MatrixError> {
        let (min, max) = WEIGHT_RANGE;
        self.weights = Some(DenseMatrix::random(self.dim(), next.dim(), min, max, rng)?);
        Ok(())
    }

    /// Replaces the layer's values. The new values must have the same shape.
    pub fn set(&mut self, values: DenseMatrix) -> Result<(), MatrixError> {
        if values.dim() != self.values.dim() {
            return Err(MatrixError::mismatch(
                Operation::Assign,
                self.values.dim(),
                values.dim(),
            ));
        }

        self.values = values;
        Ok(())
    }

    pub fn values(&self) -> &DenseMatrix {
        &self.values
    }

    pub fn weights(&self) -> Option<&DenseMatrix> {
        self.weights.as_ref()
    }

    pub fn into_weights(self) -> Option<DenseMatrix> {
        self.weights
    }
}
