use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{error, info};

use linnet::{Dataset, Loss, Network};

use crate::args::FitConfig;
use crate::model::{load_network, save_network};

pub fn run_fit(config: FitConfig) {
    let dataset =
        match Dataset::from_file(&config.file, config.split.features, config.split.classes) {
            Ok(dataset) => dataset,
            Err(err) => {
                error!(error = %err, file = %config.file, "Could not load dataset.");
                return;
            }
        };

    let training = &config.train;

    let network = if let Some(filename) = &config.load {
        load_network(filename)
    } else {
        let mut rng = match training.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        info!(seed = ?training.seed, "Initializing weights.");

        Network::new(&config.dims, &mut rng).map_err(|err| err.to_string())
    };

    let mut network = match network {
        Ok(network) => network
            .with_learning_rate(training.learning_rate)
            .with_delta(training.delta),
        Err(err) => {
            error!(error = %err, "Could not create network.");
            return;
        }
    };

    if training.verbose {
        println!("{dataset}");
        println!("{network}");
    }

    let report = match network.fit(
        &dataset,
        Loss::MeanSquaredError,
        training.iterations,
        training.verbose,
    ) {
        Ok(report) => report,
        Err(err) => {
            error!(error = %err, "Training failed.");
            return;
        }
    };

    println!("----------------------------");
    println!("Final error: {:.6} ({})", report.error, report.iterations);
    println!("----------------------------");

    if training.verbose {
        println!("{network}");
    }

    if let Some(filename) = &config.output {
        match save_network(filename, &network) {
            Ok(()) => info!(file = %filename, "Saved network."),
            Err(err) => error!(error = %err, file = %filename, "Could not save network."),
        }
    }
}
