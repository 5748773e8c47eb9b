use std::error::Error;
use std::fmt;
use std::fs::File;
use std::io::{Error as IoError, Read};
use std::path::Path;

use tracing::warn;

use crate::linear_algebra::{DenseMatrix, MatrixError, Rows, Value};

/// A table of samples, each made of a feature row followed by a label row.
#[derive(Clone, Debug, PartialEq)]
pub struct Dataset {
    data: DenseMatrix,
    x: DenseMatrix,
    y: DenseMatrix,
}

impl Dataset {
    /// Joins a feature matrix and a label matrix with the same number of rows.
    pub fn new(x: DenseMatrix, y: DenseMatrix) -> Result<Self, DatasetError> {
        let data = x.concat_columns(&y)?;
        Ok(Self { data, x, y })
    }

    /// Splits each row of `data` into `num_features` features followed by
    /// `num_classes` labels.
    pub fn from_matrix(
        data: DenseMatrix,
        num_features: usize,
        num_classes: usize,
    ) -> Result<Self, DatasetError> {
        let columns = data.dim()[1];
        if num_features == 0
            || num_classes == 0
            || num_features.checked_add(num_classes) != Some(columns)
        {
            return Err(DatasetError::Split {
                columns,
                features: num_features,
                classes: num_classes,
            });
        }

        let (x, y) = data.split_columns(num_features)?;
        Ok(Self { data, x, y })
    }

    /// Parses comma separated rows of numbers. Blank lines are skipped.
    pub fn parse_csv(
        text: &str,
        num_features: usize,
        num_classes: usize,
    ) -> Result<Self, DatasetError> {
        let mut rows = Vec::new();

        for (line_number, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let values = line
                .split(',')
                .enumerate()
                .map(|(column, entry)| {
                    let entry = entry.trim();
                    entry.parse::<Value>().map_err(|_| DatasetError::Parse {
                        line: line_number + 1,
                        column: column + 1,
                        value: entry.to_owned(),
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;

            rows.push(DenseMatrix::row_vector(values)?);
        }

        if rows.is_empty() {
            return Err(DatasetError::Empty);
        }

        let data = DenseMatrix::from_rows(rows)?;
        if data.dim()[1] == 1 {
            warn!("Only one column found in dataset.");
        }

        Self::from_matrix(data, num_features, num_classes)
    }

    pub fn from_file(
        filename: impl AsRef<Path>,
        num_features: usize,
        num_classes: usize,
    ) -> Result<Self, DatasetError> {
        let mut contents = String::new();
        File::open(filename.as_ref())?.read_to_string(&mut contents)?;

        Self::parse_csv(&contents, num_features, num_classes)
    }

    pub fn num_features(&self) -> usize {
        self.x.dim()[1]
    }

    pub fn num_classes(&self) -> usize {
        self.y.dim()[1]
    }

    pub fn size(&self) -> usize {
        self.data.dim()[0]
    }

    /// The feature matrix, `size()` by `num_features()`.
    pub fn x(&self) -> &DenseMatrix {
        &self.x
    }

    /// The label matrix, `size()` by `num_classes()`.
    pub fn y(&self) -> &DenseMatrix {
        &self.y
    }

    /// Iterates over the full data rows, features and labels together.
    pub fn rows(&self) -> Rows<'_> {
        self.data.rows()
    }

    /// Iterates over `(features, labels)` row pairs.
    pub fn samples(&self) -> impl Iterator<Item = (DenseMatrix, DenseMatrix)> + '_ {
        self.x.rows().zip(self.y.rows())
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.data, f)
    }
}

#[derive(Debug, PartialEq)]
pub enum DatasetError {
    Io(String),
    Empty,
    Parse {
        line: usize,
        column: usize,
        value: String,
    },
    Split {
        columns: usize,
        features: usize,
        classes: usize,
    },
    Matrix(MatrixError),
}

impl From<IoError> for DatasetError {
    fn from(error: IoError) -> Self {
        Self::Io(error.to_string())
    }
}

impl From<MatrixError> for DatasetError {
    fn from(error: MatrixError) -> Self {
        Self::Matrix(error)
    }
}

impl fmt::Display for DatasetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(error) => write!(f, "could not read dataset: {error}"),
            Self::Empty => write!(f, "dataset has no rows"),
            Self::Parse {
                line,
                column,
                value,
            } => write!(f, "invalid value at line {line}, column {column}: {value:?}"),
            Self::Split {
                columns,
                features,
                classes,
            } => write!(
                f,
                "cannot split {columns} columns into {features} features and {classes} classes"
            ),
            Self::Matrix(error) => fmt::Display::fmt(error, f),
        }
    }
}

impl Error for DatasetError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Matrix(error) => Some(error),
            _ => None,
        }
    }
}
