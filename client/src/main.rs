use std::env;

use clap::Parser;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::format;

use self::args::{Args, Command};
use self::evaluate::run_evaluate;
use self::fit::run_fit;

mod args;
mod evaluate;
mod fit;
mod model;

fn main() {
    let args = Args::parse();

    set_default_logging();

    let event_format = format().with_target(false).without_time();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .event_format(event_format)
        .init();

    match args.command {
        Command::Fit(config) => run_fit(config),
        Command::Evaluate(config) => run_evaluate(config),
    }
}

fn set_default_logging() {
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
}
