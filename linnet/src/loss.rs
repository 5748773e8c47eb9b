use serde::{Deserialize, Serialize};

use crate::linear_algebra::{DenseMatrix, MatrixError, Value};

/// Selects the error function a network is evaluated and trained against.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub enum Loss {
    /// Half the squared error of each row, summed over all rows.
    #[default]
    MeanSquaredError,
}

impl Loss {
    /// Calculates the scalar error of `outputs` against `labels`.
    pub fn error(self, outputs: &DenseMatrix, labels: &DenseMatrix) -> Result<Value, MatrixError> {
        match self {
            Self::MeanSquaredError => {
                let delta = outputs.sub(labels)?;

                let mut error = 0.0;
                for row in delta.rows() {
                    error += 0.5 * row.multiply(&row.transpose())?.get(0, 0)?;
                }
                Ok(error)
            }
        }
    }

    /// Calculates the derivative of the error with respect to `outputs`.
    pub fn gradient(
        self,
        outputs: &DenseMatrix,
        labels: &DenseMatrix,
    ) -> Result<DenseMatrix, MatrixError> {
        match self {
            Self::MeanSquaredError => outputs.sub(labels),
        }
    }
}
