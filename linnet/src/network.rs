use std::error::Error;
use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};

use crate::dataset::Dataset;
use crate::layer::Layer;
use crate::linear_algebra::{DenseMatrix, MatrixError, Operation, Value};
use crate::loss::Loss;

const DEFAULT_LEARNING_RATE: Value = 0.0001;
const DEFAULT_DELTA: Value = 0.0001;

/// The training error is re-evaluated every this many iterations.
const CHECK_INTERVAL: usize = 10;

/// A feed-forward network of linear layers.
///
/// The network is a chain of weight matrices `W_0 … W_{L-1}`, where `W_i`
/// maps a row of width `dims[i]` to a row of width `dims[i + 1]`. No
/// activation function is applied between layers, so the whole network is
/// a single linear map and its weight gradients have a closed form.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(try_from = "NetworkData")]
pub struct Network {
    weights: Vec<DenseMatrix>,
    /// The step size of each gradient descent update.
    pub learning_rate: Value,
    /// Training stops early once the error is at or below this value.
    pub delta: Value,
    #[serde(skip)]
    error: Option<Value>,
}

#[derive(Deserialize)]
struct NetworkData {
    weights: Vec<DenseMatrix>,
    learning_rate: Value,
    delta: Value,
}

impl TryFrom<NetworkData> for Network {
    type Error = NetworkError;

    fn try_from(data: NetworkData) -> Result<Self, Self::Error> {
        Ok(Self::from_weights(data.weights)?
            .with_learning_rate(data.learning_rate)
            .with_delta(data.delta))
    }
}

impl Network {
    /// Builds a network with layer widths `dims`, seeding every weight
    /// uniformly from `[0, 1)`.
    pub fn new(dims: &[usize], rng: &mut impl Rng) -> Result<Self, NetworkError> {
        if dims.len() < 2 {
            return Err(NetworkError::TooFewLayers(dims.len()));
        }

        let mut layers = dims
            .iter()
            .map(|&dim| Layer::new(dim))
            .collect::<Result<Vec<_>, _>>()?;

        for i in 0..layers.len() - 1 {
            let (head, tail) = layers.split_at_mut(i + 1);
            head[i].link(&tail[0], rng)?;
        }

        let weights = layers
            .into_iter()
            .filter_map(Layer::into_weights)
            .collect::<Vec<_>>();

        trace!(?dims, "Initialized weights.");

        Ok(Self::with_weights(weights))
    }

    /// Builds a network from an existing weight chain.
    pub fn from_weights(weights: Vec<DenseMatrix>) -> Result<Self, NetworkError> {
        if weights.is_empty() {
            return Err(NetworkError::TooFewLayers(1));
        }

        for pair in weights.windows(2) {
            let (left, right) = (pair[0].dim(), pair[1].dim());
            if left[1] != right[0] {
                return Err(MatrixError::mismatch(Operation::Multiply, left, right).into());
            }
        }

        Ok(Self::with_weights(weights))
    }

    fn with_weights(weights: Vec<DenseMatrix>) -> Self {
        Self {
            weights,
            learning_rate: DEFAULT_LEARNING_RATE,
            delta: DEFAULT_DELTA,
            error: None,
        }
    }

    pub fn with_learning_rate(mut self, learning_rate: Value) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn with_delta(mut self, delta: Value) -> Self {
        self.delta = delta;
        self
    }

    pub fn weights(&self) -> &[DenseMatrix] {
        &self.weights
    }

    /// The layer widths, input first.
    pub fn dims(&self) -> Vec<usize> {
        let mut dims = Vec::with_capacity(self.weights.len() + 1);
        dims.push(self.input_width());
        dims.extend(self.weights.iter().map(|w| w.dim()[1]));
        dims
    }

    fn input_width(&self) -> usize {
        self.weights[0].dim()[0]
    }

    fn output_width(&self) -> usize {
        self.weights[self.weights.len() - 1].dim()[1]
    }

    /// The error recorded at the most recent training checkpoint.
    pub fn last_error(&self) -> Option<Value> {
        self.error
    }

    /// Computes `inputs · W_0 · W_1 · … · W_{L-1}`.
    ///
    /// `inputs` may hold a single row or a batch of rows.
    pub fn forward_propagate(&self, inputs: &DenseMatrix) -> Result<DenseMatrix, NetworkError> {
        let outputs = self
            .weights
            .iter()
            .try_fold(inputs.clone(), |outputs, w| outputs.multiply(w))?;
        Ok(outputs)
    }

    /// Returns the input followed by the output of every layer.
    fn activations(&self, inputs: &DenseMatrix) -> Result<Vec<DenseMatrix>, NetworkError> {
        let mut activations = Vec::with_capacity(self.weights.len() + 1);
        activations.push(inputs.clone());

        for w in &self.weights {
            let next = activations[activations.len() - 1].multiply(w)?;
            activations.push(next);
        }

        Ok(activations)
    }

    fn check_dataset(&self, dataset: &Dataset) -> Result<(), NetworkError> {
        if dataset.num_features() != self.input_width() {
            return Err(NetworkError::InputWidth {
                expected: self.input_width(),
                found: dataset.num_features(),
            });
        }

        if dataset.num_classes() != self.output_width() {
            return Err(NetworkError::OutputWidth {
                expected: self.output_width(),
                found: dataset.num_classes(),
            });
        }

        Ok(())
    }

    fn check_weight_index(&self, index: usize) -> Result<(), NetworkError> {
        if index >= self.weights.len() {
            return Err(NetworkError::WeightIndex {
                index,
                count: self.weights.len(),
            });
        }
        Ok(())
    }

    /// Propagates every feature row of `dataset`, one output row per sample.
    pub fn compute_output(&self, dataset: &Dataset) -> Result<DenseMatrix, NetworkError> {
        if dataset.num_features() != self.input_width() {
            return Err(NetworkError::InputWidth {
                expected: self.input_width(),
                found: dataset.num_features(),
            });
        }

        self.forward_propagate(dataset.x())
    }

    pub fn evaluate(&self, dataset: &Dataset, loss: Loss) -> Result<Value, NetworkError> {
        self.check_dataset(dataset)?;

        let outputs = self.compute_output(dataset)?;
        Ok(loss.error(&outputs, dataset.y())?)
    }

    /// Calculates the gradient of the error with respect to `W_index`.
    ///
    /// For each sample `m`, with `d = ŷ_m - y_m` and
    /// `prefix = x_m · W_0 · … · W_{index-1}`, the contribution is
    /// `prefix^T · d · W_{L-1}^T · … · W_{index+1}^T`. Contributions are
    /// summed over all samples.
    pub fn derivative(
        &self,
        dataset: &Dataset,
        index: usize,
        loss: Loss,
    ) -> Result<DenseMatrix, NetworkError> {
        self.check_weight_index(index)?;
        self.check_dataset(dataset)?;

        let outputs = self.compute_output(dataset)?;
        let deltas = loss.gradient(&outputs, dataset.y())?;

        let [rows, columns] = self.weights[index].dim();
        let mut gradient = DenseMatrix::zeros(rows, columns)?;

        for ((x, _), d) in dataset.samples().zip(deltas.rows()) {
            let prefix = self.weights[..index]
                .iter()
                .try_fold(x, |prefix, w| prefix.multiply(w))?;

            let contribution = self.weights[index + 1..]
                .iter()
                .rev()
                .try_fold(prefix.transpose().multiply(&d)?, |g, w| {
                    g.multiply(&w.transpose())
                })?;

            gradient = gradient.add(&contribution)?;
        }

        Ok(gradient)
    }

    /// Calculates the gradient of every weight matrix from a single forward pass.
    ///
    /// Equivalent to calling [`Network::derivative`] for each index, but the
    /// layer outputs are computed once and reused in one reverse sweep.
    pub fn gradients(
        &self,
        dataset: &Dataset,
        loss: Loss,
    ) -> Result<Vec<DenseMatrix>, NetworkError> {
        self.check_dataset(dataset)?;

        let activations = self.activations(dataset.x())?;
        let outputs = &activations[activations.len() - 1];

        let mut upstream = loss.gradient(outputs, dataset.y())?;
        let mut gradients = Vec::with_capacity(self.weights.len());

        let layer_inputs = &activations[..self.weights.len()];
        for (w, inputs) in self.weights.iter().zip(layer_inputs).rev() {
            gradients.push(inputs.transpose().multiply(&upstream)?);
            upstream = upstream.multiply(&w.transpose())?;
        }

        gradients.reverse();
        Ok(gradients)
    }

    /// Takes one gradient descent step: `W_index ← W_index − learning_rate · gradient`.
    pub fn weight_update(&mut self, index: usize, gradient: &DenseMatrix) -> Result<(), NetworkError> {
        self.check_weight_index(index)?;

        let updated = self.weights[index].sub(&gradient.scale(self.learning_rate))?;
        self.weights[index] = updated;
        Ok(())
    }

    /// Updates every weight matrix, last to first, against gradients taken
    /// at the current weights.
    pub fn back_propagate(&mut self, dataset: &Dataset, loss: Loss) -> Result<(), NetworkError> {
        let gradients = self.gradients(dataset, loss)?;

        for (index, gradient) in gradients.iter().enumerate().rev() {
            self.weight_update(index, gradient)?;
        }

        Ok(())
    }

    /// Trains the network with gradient descent.
    ///
    /// Runs up to `iterations` passes of [`Network::back_propagate`], or
    /// without limit if `iterations` is `None`. Every tenth pass the error
    /// is re-evaluated, and training stops once it is at or below
    /// [`Network::delta`]. An unbounded run that never reaches `delta` does
    /// not return.
    pub fn fit(
        &mut self,
        dataset: &Dataset,
        loss: Loss,
        iterations: Option<usize>,
        verbose: bool,
    ) -> Result<FitReport, NetworkError> {
        self.check_dataset(dataset)?;

        info!(
            dims = ?self.dims(),
            samples = dataset.size(),
            ?iterations,
            "Starting fitting process."
        );

        let mut completed = 0;
        let mut error_is_current = false;

        let status = loop {
            if Some(completed) == iterations {
                break FitStatus::Exhausted;
            }

            self.back_propagate(dataset, loss)?;
            let i = completed;
            completed += 1;
            error_is_current = false;

            if i % CHECK_INTERVAL == 0 {
                let error = self.evaluate(dataset, loss)?;
                self.error = Some(error);
                error_is_current = true;

                if !error.is_finite() {
                    warn!(iteration = i, error, "Training diverged.");
                    return Err(NetworkError::Diverged { iteration: i });
                }

                if verbose {
                    info!("{}", progress_line(i, error));
                } else {
                    debug!(iteration = i, error, "Checkpoint.");
                }

                if error <= self.delta {
                    break FitStatus::Converged;
                }
            }
        };

        let error = match self.error {
            Some(error) if error_is_current => error,
            _ => {
                let error = self.evaluate(dataset, loss)?;
                self.error = Some(error);
                error
            }
        };

        info!(?status, "Final error: {error:.6} ({completed})");

        Ok(FitReport {
            error,
            iterations: completed,
            status,
        })
    }
}

fn progress_line(iteration: usize, error: Value) -> String {
    format!("({iteration:>8}) -------> E: {error:.8}")
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, w) in self.weights.iter().enumerate() {
            writeln!(f, "W{i}:\n{w}")?;
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FitStatus {
    /// The error reached the convergence threshold.
    Converged,
    /// The iteration budget ran out first.
    Exhausted,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FitReport {
    /// The error of the weights the network was left with.
    pub error: Value,
    /// The number of back-propagation passes performed.
    pub iterations: usize,
    pub status: FitStatus,
}

#[derive(Debug, PartialEq)]
pub enum NetworkError {
    Matrix(MatrixError),
    /// A network needs an input and an output layer.
    TooFewLayers(usize),
    WeightIndex {
        index: usize,
        count: usize,
    },
    InputWidth {
        expected: usize,
        found: usize,
    },
    OutputWidth {
        expected: usize,
        found: usize,
    },
    /// The error stopped being finite at the given iteration.
    Diverged {
        iteration: usize,
    },
}

impl From<MatrixError> for NetworkError {
    fn from(error: MatrixError) -> Self {
        Self::Matrix(error)
    }
}

impl fmt::Display for NetworkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Matrix(error) => fmt::Display::fmt(error, f),
            Self::TooFewLayers(count) => {
                write!(f, "a network needs at least 2 layers, got {count}")
            }
            Self::WeightIndex { index, count } => {
                write!(f, "weight index {index} is out of range for {count} weight matrices")
            }
            Self::InputWidth { expected, found } => write!(
                f,
                "number of features in dataset ({found}) != dimension of input layer ({expected})"
            ),
            Self::OutputWidth { expected, found } => write!(
                f,
                "number of classes in dataset ({found}) != dimension of output layer ({expected})"
            ),
            Self::Diverged { iteration } => {
                write!(f, "training diverged at iteration {iteration}")
            }
        }
    }
}

impl Error for NetworkError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Matrix(error) => Some(error),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use crate::linear_algebra::DimensionError;

    fn matrix(rows: Vec<Vec<Value>>) -> DenseMatrix {
        rows.try_into().unwrap()
    }

    /// Four samples whose label is the sum of the two features.
    fn sum_dataset() -> Dataset {
        Dataset::new(
            matrix(vec![
                vec![1.0, 0.0],
                vec![0.0, 1.0],
                vec![1.0, 1.0],
                vec![0.0, 0.0],
            ]),
            matrix(vec![vec![1.0], vec![1.0], vec![2.0], vec![0.0]]),
        )
        .unwrap()
    }

    fn identity_dataset() -> Dataset {
        let x = matrix(vec![
            vec![1.0, 0.0],
            vec![0.0, 1.0],
            vec![1.0, 1.0],
            vec![0.0, 0.0],
        ]);
        Dataset::new(x.clone(), x).unwrap()
    }

    fn random_dataset(rng: &mut StdRng, size: usize, features: usize, classes: usize) -> Dataset {
        Dataset::new(
            DenseMatrix::random(size, features, -1.0, 1.0, rng).unwrap(),
            DenseMatrix::random(size, classes, -1.0, 1.0, rng).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn weight_chain_shapes() {
        let mut rng = StdRng::seed_from_u64(1);
        let network = Network::new(&[3, 4, 3, 4, 1], &mut rng).unwrap();

        let shapes = network.weights().iter().map(|w| w.dim()).collect::<Vec<_>>();
        assert_eq!(shapes, vec![[3, 4], [4, 3], [3, 4], [4, 1]]);
        assert_eq!(network.dims(), vec![3, 4, 3, 4, 1]);
        assert!(network
            .weights()
            .iter()
            .flat_map(|w| w.values())
            .all(|&w| (0.0..1.0).contains(&w)));
    }

    #[test]
    fn invalid_layer_widths() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(
            Network::new(&[3], &mut rng).unwrap_err(),
            NetworkError::TooFewLayers(1)
        );
        assert_eq!(
            Network::new(&[], &mut rng).unwrap_err(),
            NetworkError::TooFewLayers(0)
        );
        assert_eq!(
            Network::new(&[2, 0], &mut rng).unwrap_err(),
            NetworkError::Matrix(MatrixError::Dimension(DimensionError::Empty([1, 0]))),
        );
    }

    #[test]
    fn seeded_networks_are_identical() {
        let a = Network::new(&[2, 5, 5, 2], &mut StdRng::seed_from_u64(1)).unwrap();
        let b = Network::new(&[2, 5, 5, 2], &mut StdRng::seed_from_u64(1)).unwrap();
        assert_eq!(a.weights(), b.weights());
    }

    #[test]
    fn from_weights_checks_the_chain() {
        let broken = vec![
            DenseMatrix::zeros(2, 3).unwrap(),
            DenseMatrix::zeros(4, 1).unwrap(),
        ];
        assert_eq!(
            Network::from_weights(broken).unwrap_err(),
            NetworkError::Matrix(MatrixError::Dimension(DimensionError::Mismatch {
                operation: Operation::Multiply,
                left: [2, 3],
                right: [4, 1],
            })),
        );
        assert_eq!(
            Network::from_weights(Vec::new()).unwrap_err(),
            NetworkError::TooFewLayers(1)
        );
    }

    #[test]
    fn forward_propagation_shape() {
        let mut rng = StdRng::seed_from_u64(2);
        let network = Network::new(&[3, 5, 2], &mut rng).unwrap();

        let row = DenseMatrix::random(1, 3, -1.0, 1.0, &mut rng).unwrap();
        assert_eq!(network.forward_propagate(&row).unwrap().dim(), [1, 2]);

        let batch = DenseMatrix::random(4, 3, -1.0, 1.0, &mut rng).unwrap();
        assert_eq!(network.forward_propagate(&batch).unwrap().dim(), [4, 2]);

        let wide = DenseMatrix::zeros(1, 4).unwrap();
        assert!(matches!(
            network.forward_propagate(&wide),
            Err(NetworkError::Matrix(MatrixError::Dimension(
                DimensionError::Mismatch {
                    operation: Operation::Multiply,
                    ..
                }
            )))
        ));
    }

    #[test]
    fn forward_propagation_is_the_weight_product() {
        let network = Network::from_weights(vec![
            matrix(vec![vec![1.0, 2.0], vec![0.0, 1.0]]),
            matrix(vec![vec![3.0], vec![-1.0]]),
        ])
        .unwrap();

        // [1 1] · W_0 = [1 3]; [1 3] · W_1 = [0]
        let output = network
            .forward_propagate(&matrix(vec![vec![1.0, 1.0], vec![2.0, 0.0]]))
            .unwrap();
        assert_eq!(output, matrix(vec![vec![0.0], vec![2.0]]));
    }

    #[test]
    fn compute_output_stacks_rows() {
        let mut rng = StdRng::seed_from_u64(3);
        let network = Network::new(&[2, 3, 1], &mut rng).unwrap();
        let dataset = sum_dataset();

        let outputs = network.compute_output(&dataset).unwrap();
        assert_eq!(outputs.dim(), [4, 1]);
        for (i, (x, _)) in dataset.samples().enumerate() {
            let row = network.forward_propagate(&x).unwrap();
            assert_eq!(outputs.row(i).unwrap(), row);
        }

        let narrow = Network::new(&[3, 1], &mut rng).unwrap();
        assert_eq!(
            narrow.compute_output(&dataset).unwrap_err(),
            NetworkError::InputWidth {
                expected: 3,
                found: 2
            },
        );
    }

    #[test]
    fn evaluate_known_error() {
        // Predicts the first feature only, so the error is in the second.
        let network = Network::from_weights(vec![matrix(vec![vec![1.0], vec![0.0]])]).unwrap();
        let error = network
            .evaluate(&sum_dataset(), Loss::MeanSquaredError)
            .unwrap();

        // Residuals: 0, -1, -1, 0
        assert!((error - 1.0).abs() < 1e-12);

        let wrong_output = Network::from_weights(vec![DenseMatrix::zeros(2, 2).unwrap()]).unwrap();
        assert_eq!(
            wrong_output
                .evaluate(&sum_dataset(), Loss::MeanSquaredError)
                .unwrap_err(),
            NetworkError::OutputWidth {
                expected: 2,
                found: 1
            },
        );
    }

    #[test]
    fn derivative_of_a_single_layer() {
        let network = Network::from_weights(vec![matrix(vec![vec![1.0], vec![0.0]])]).unwrap();

        // X^T · (X·W - Y) with residuals [0, -1, -1, 0].
        let gradient = network
            .derivative(&sum_dataset(), 0, Loss::MeanSquaredError)
            .unwrap();
        assert_eq!(gradient, matrix(vec![vec![-1.0], vec![-2.0]]));
    }

    #[test]
    fn derivative_matches_gradient_sweep() {
        let mut rng = StdRng::seed_from_u64(4);
        let network = Network::new(&[3, 4, 2, 2], &mut rng).unwrap();
        let dataset = random_dataset(&mut rng, 6, 3, 2);

        let gradients = network
            .gradients(&dataset, Loss::MeanSquaredError)
            .unwrap();
        assert_eq!(gradients.len(), 3);

        for (j, gradient) in gradients.iter().enumerate() {
            let derivative = network
                .derivative(&dataset, j, Loss::MeanSquaredError)
                .unwrap();
            assert_eq!(derivative.dim(), network.weights()[j].dim());
            assert!(derivative.approx_eq(gradient, 1e-9));
        }

        assert_eq!(
            network
                .derivative(&dataset, 3, Loss::MeanSquaredError)
                .unwrap_err(),
            NetworkError::WeightIndex { index: 3, count: 3 },
        );
    }

    #[test]
    fn gradients_match_finite_differences() {
        const EPSILON: Value = 1e-5;

        let mut rng = StdRng::seed_from_u64(5);
        let network = Network::new(&[2, 3, 2], &mut rng).unwrap();
        let dataset = random_dataset(&mut rng, 5, 2, 2);
        let loss = Loss::MeanSquaredError;

        let gradients = network.gradients(&dataset, loss).unwrap();

        let perturbed_error = |j: usize, row: usize, column: usize, offset: Value| {
            let mut weights = network.weights().to_vec();
            let w = weights[j].get(row, column).unwrap();
            weights[j].set(row, column, w + offset).unwrap();
            Network::from_weights(weights)
                .unwrap()
                .evaluate(&dataset, loss)
                .unwrap()
        };

        for (j, gradient) in gradients.iter().enumerate() {
            let [rows, columns] = gradient.dim();
            for row in 0..rows {
                for column in 0..columns {
                    let numeric = (perturbed_error(j, row, column, EPSILON)
                        - perturbed_error(j, row, column, -EPSILON))
                        / (2.0 * EPSILON);
                    let analytic = gradient.get(row, column).unwrap();
                    assert!(
                        (numeric - analytic).abs() < 1e-5 * (1.0 + numeric.abs()),
                        "W{j}[{row}, {column}]: numeric {numeric}, analytic {analytic}",
                    );
                }
            }
        }
    }

    #[test]
    fn weight_update_descends() {
        let mut network = Network::from_weights(vec![matrix(vec![vec![1.0], vec![2.0]])])
            .unwrap()
            .with_learning_rate(0.5);

        network
            .weight_update(0, &matrix(vec![vec![2.0], vec![-2.0]]))
            .unwrap();
        assert_eq!(network.weights()[0], matrix(vec![vec![0.0], vec![3.0]]));

        assert_eq!(
            network
                .weight_update(0, &DenseMatrix::zeros(1, 2).unwrap())
                .unwrap_err(),
            NetworkError::Matrix(MatrixError::Dimension(DimensionError::Mismatch {
                operation: Operation::Subtract,
                left: [2, 1],
                right: [1, 2],
            })),
        );
        assert_eq!(
            network
                .weight_update(1, &DenseMatrix::zeros(2, 1).unwrap())
                .unwrap_err(),
            NetworkError::WeightIndex { index: 1, count: 1 },
        );
    }

    #[test]
    fn back_propagate_applies_every_gradient() {
        let mut rng = StdRng::seed_from_u64(6);
        let mut network = Network::new(&[2, 3, 1], &mut rng)
            .unwrap()
            .with_learning_rate(0.01);
        let dataset = sum_dataset();

        let before = network.weights().to_vec();
        let gradients = network
            .gradients(&dataset, Loss::MeanSquaredError)
            .unwrap();

        network
            .back_propagate(&dataset, Loss::MeanSquaredError)
            .unwrap();

        for ((after, before), gradient) in network.weights().iter().zip(&before).zip(&gradients) {
            let expected = before.sub(&gradient.scale(0.01)).unwrap();
            assert!(after.approx_eq(&expected, 1e-12));
        }
    }

    #[test]
    fn zero_iterations_leave_weights_untouched() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut network = Network::new(&[2, 4, 1], &mut rng).unwrap();
        let before = network.weights().to_vec();

        let report = network
            .fit(&sum_dataset(), Loss::MeanSquaredError, Some(0), false)
            .unwrap();

        assert_eq!(network.weights(), before.as_slice());
        assert_eq!(report.iterations, 0);
        assert_eq!(report.status, FitStatus::Exhausted);
        assert_eq!(
            Ok(report.error),
            network.evaluate(&sum_dataset(), Loss::MeanSquaredError)
        );
    }

    #[test]
    fn fit_reduces_the_error() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut network = Network::new(&[2, 1], &mut rng)
            .unwrap()
            .with_learning_rate(0.01)
            .with_delta(0.0);
        let dataset = sum_dataset();

        let initial = network
            .evaluate(&dataset, Loss::MeanSquaredError)
            .unwrap();
        let report = network
            .fit(&dataset, Loss::MeanSquaredError, Some(1000), false)
            .unwrap();

        assert_eq!(report.status, FitStatus::Exhausted);
        assert_eq!(report.iterations, 1000);
        assert!(report.error < initial);
        assert_eq!(network.last_error(), Some(report.error));
        assert_eq!(
            Ok(report.error),
            network.evaluate(&dataset, Loss::MeanSquaredError)
        );
    }

    #[test]
    fn fit_reduces_the_error_through_hidden_layers() {
        let mut rng = StdRng::seed_from_u64(8);
        let mut network = Network::new(&[2, 3, 1], &mut rng)
            .unwrap()
            .with_learning_rate(0.001)
            .with_delta(0.0);
        let dataset = sum_dataset();

        let initial = network
            .evaluate(&dataset, Loss::MeanSquaredError)
            .unwrap();
        let report = network
            .fit(&dataset, Loss::MeanSquaredError, Some(100), false)
            .unwrap();

        assert!(report.error < initial);
    }

    #[test]
    fn fit_stops_early_on_convergence() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut network = Network::new(&[2, 2], &mut rng)
            .unwrap()
            .with_learning_rate(0.1)
            .with_delta(1e-6);

        let report = network
            .fit(&identity_dataset(), Loss::MeanSquaredError, Some(1_000_000), true)
            .unwrap();

        assert_eq!(report.status, FitStatus::Converged);
        assert!(report.iterations < 1_000_000);
        assert!(report.error <= 1e-6);
        assert!(network.weights()[0].approx_eq(&DenseMatrix::identity(2).unwrap(), 1e-2));
    }

    #[test]
    fn unbounded_fit_stops_on_convergence() {
        let mut rng = StdRng::seed_from_u64(10);
        let mut network = Network::new(&[2, 2], &mut rng)
            .unwrap()
            .with_learning_rate(0.1)
            .with_delta(1e-6);

        let report = network
            .fit(&identity_dataset(), Loss::MeanSquaredError, None, false)
            .unwrap();

        assert_eq!(report.status, FitStatus::Converged);
        assert_eq!(report.iterations % CHECK_INTERVAL, 1);
    }

    #[test]
    fn fit_detects_divergence() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut network = Network::new(&[2, 1], &mut rng)
            .unwrap()
            .with_learning_rate(10.0);

        assert!(matches!(
            network.fit(&sum_dataset(), Loss::MeanSquaredError, Some(10_000), false),
            Err(NetworkError::Diverged { .. })
        ));
    }

    #[test]
    fn fit_rejects_mismatched_dataset() {
        let mut rng = StdRng::seed_from_u64(12);
        let mut network = Network::new(&[3, 1], &mut rng).unwrap();
        let before = network.weights().to_vec();

        assert_eq!(
            network
                .fit(&sum_dataset(), Loss::MeanSquaredError, Some(10), false)
                .unwrap_err(),
            NetworkError::InputWidth {
                expected: 3,
                found: 2
            },
        );
        assert_eq!(network.weights(), before.as_slice());
    }

    #[test]
    fn display_lists_weights() {
        let network = Network::from_weights(vec![
            matrix(vec![vec![1.0, 2.0]]),
            matrix(vec![vec![0.5], vec![-0.5]]),
        ])
        .unwrap();

        assert_eq!(
            network.to_string(),
            "W0:\n1.000000\t2.000000\t\n\nW1:\n0.500000\t\n-0.500000\t\n\n",
        );
    }

    #[test]
    fn progress_line_format() {
        assert_eq!(progress_line(0, 1.5), "(       0) -------> E: 1.50000000");
        assert_eq!(
            progress_line(123456789, 0.000012346),
            "(123456789) -------> E: 0.00001235"
        );
    }

    #[test]
    fn serde_round_trip() {
        let mut rng = StdRng::seed_from_u64(13);
        let network = Network::new(&[2, 3, 1], &mut rng)
            .unwrap()
            .with_learning_rate(0.05);

        let json = serde_json::to_string(&network).unwrap();
        let restored: Network = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.weights(), network.weights());
        assert_eq!(restored.learning_rate, 0.05);
        assert_eq!(restored.delta, DEFAULT_DELTA);

        let broken = r#"{"weights":[{"dim":[2,3],"values":[0,0,0,0,0,0]},{"dim":[2,1],"values":[0,0]}],"learning_rate":0.1,"delta":0.1}"#;
        assert!(serde_json::from_str::<Network>(broken).is_err());
    }
}
