use std::collections::HashMap;
use std::str::FromStr;

use clap::{ArgGroup, Args as ArgsTrait, Parser, Subcommand};

use linnet::Value;

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Trains a network on a dataset.
    Fit(FitConfig),
    /// Reports the error of a saved network on a dataset.
    Evaluate(EvaluateConfig),
}

#[derive(ArgsTrait, Clone, Debug)]
#[command(group(ArgGroup::new("model").required(true).args(["dims", "load"])))]
pub struct FitConfig {
    /// A CSV file of samples. Each row holds the features followed by the labels.
    pub file: String,

    /// Dataset layout.
    ///
    /// Parameters:
    ///   features=int - The number of feature columns.
    ///   classes=int  - The number of label columns that follow the features.
    #[arg(short, long, verbatim_doc_comment)]
    pub split: Split,

    /// Layer widths of a new network, input first. (e.g. 2,5,5,2)
    #[arg(short, long, value_delimiter = ',', verbatim_doc_comment)]
    pub dims: Vec<usize>,

    /// A saved network, in JSON format, to continue training.
    #[arg(short, long, verbatim_doc_comment)]
    pub load: Option<String>,

    /// Training options.
    ///
    /// Parameters:
    ///   rate=decimal   - The gradient descent learning rate.
    ///   delta=decimal  - Stop once the error is at or below this value.
    ///   iterations=int - The maximum number of iterations. Omit to train until the error
    ///                    reaches delta.
    ///   verbose=bool   - Report the error every 10 iterations and print the weights.
    ///                    (false or true)
    ///   seed=int       - Seed for the weight initialization. Random if omitted.
    #[arg(
        short,
        long,
        default_value = "rate=0.0001,delta=0.0001,iterations=10000",
        verbatim_doc_comment
    )]
    pub train: Training,

    /// A file to save the trained network to, in JSON format.
    #[arg(short, long, verbatim_doc_comment)]
    pub output: Option<String>,
}

#[derive(ArgsTrait, Clone, Debug)]
pub struct EvaluateConfig {
    /// A saved network, in JSON format.
    pub model: String,

    /// A CSV file of samples. Each row holds the features followed by the labels.
    pub file: String,

    /// Dataset layout. These are the same as the options for `fit`.
    #[arg(short, long, verbatim_doc_comment)]
    pub split: Split,
}

#[derive(Clone, Copy, Debug)]
pub struct Split {
    pub features: usize,
    pub classes: usize,
}

impl FromStr for Split {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields = parse_map(s)?;

        let parse_count = |key: &str| {
            let field = fields
                .get(key)
                .ok_or_else(|| format!("no {key} field"))?;
            match field.parse::<usize>() {
                Ok(count) if count > 0 => Ok(count),
                _ => Err(format!("invalid value for {key}: {field}")),
            }
        };

        Ok(Self {
            features: parse_count("features")?,
            classes: parse_count("classes")?,
        })
    }
}

#[derive(Clone, Debug)]
pub struct Training {
    pub learning_rate: Value,
    pub delta: Value,
    pub iterations: Option<usize>,
    pub verbose: bool,
    pub seed: Option<u64>,
}

impl FromStr for Training {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields = parse_map(s)?;

        let learning_rate = fields
            .get("rate")
            .map(|&f| {
                f.parse::<Value>()
                    .map_err(|_| format!("invalid value for rate: {f}"))
            })
            .transpose()?
            .unwrap_or(0.0001);
        if learning_rate.is_nan() || learning_rate <= 0.0 {
            return Err(format!("rate must be positive: {learning_rate}"));
        }

        let delta = fields
            .get("delta")
            .map(|&f| {
                f.parse::<Value>()
                    .map_err(|_| format!("invalid value for delta: {f}"))
            })
            .transpose()?
            .unwrap_or(0.0001);

        let iterations = fields
            .get("iterations")
            .map(|&f| {
                f.parse::<usize>()
                    .map_err(|_| format!("invalid value for iterations: {f}"))
            })
            .transpose()?;

        let verbose = fields
            .get("verbose")
            .map(|&f| {
                f.parse::<bool>()
                    .map_err(|_| format!("invalid value for verbose: {f}"))
            })
            .transpose()?
            .unwrap_or_default();

        let seed = fields
            .get("seed")
            .map(|&f| {
                f.parse::<u64>()
                    .map_err(|_| format!("invalid value for seed: {f}"))
            })
            .transpose()?;

        Ok(Self {
            learning_rate,
            delta,
            iterations,
            verbose,
            seed,
        })
    }
}

fn parse_map(string: &str) -> Result<HashMap<&str, &str>, String> {
    string
        .split(',')
        .map(|field| field.trim())
        .filter(|field| !field.is_empty())
        .map(|field| field.split('=').map(|part| part.trim()))
        .map(|mut field_part| {
            let key = field_part
                .next()
                .ok_or_else(|| "no key for field".to_owned())?;
            let value = field_part
                .next()
                .ok_or_else(|| format!("no value for key: {key}"))?;
            Ok((key, value))
        })
        .collect()
}
