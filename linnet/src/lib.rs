pub mod dataset;
pub mod layer;
pub mod linear_algebra;
pub mod loss;
pub mod network;

pub use self::dataset::{Dataset, DatasetError};
pub use self::layer::Layer;
pub use self::linear_algebra::{DenseMatrix, MatrixError, Value};
pub use self::loss::Loss;
pub use self::network::{FitReport, FitStatus, Network, NetworkError};
