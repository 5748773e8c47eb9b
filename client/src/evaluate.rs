use tracing::{error, info};

use linnet::{Dataset, Loss};

use crate::args::EvaluateConfig;
use crate::model::load_network;

pub fn run_evaluate(config: EvaluateConfig) {
    let network = match load_network(&config.model) {
        Ok(network) => network,
        Err(err) => {
            error!(error = %err, model = %config.model, "Could not load network.");
            return;
        }
    };

    let dataset =
        match Dataset::from_file(&config.file, config.split.features, config.split.classes) {
            Ok(dataset) => dataset,
            Err(err) => {
                error!(error = %err, file = %config.file, "Could not load dataset.");
                return;
            }
        };

    match network.evaluate(&dataset, Loss::MeanSquaredError) {
        Ok(error) => {
            info!(samples = dataset.size(), "Evaluated network.");
            println!("E: {error:.8}");
        }
        Err(err) => error!(error = %err, "Could not evaluate network."),
    }
}
