mod calibrate;
mod options;
mod point;
mod track;
mod validate;

use anyhow::{Context, Result};
use clap::Parser;
use milepost::Config;
use options::{Cli, Command};

fn main() -> Result<()> {
    let Cli { config, cmd } = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match config {
        Some(path) => {
            Config::from_path(&path).with_context(|| format!("loading config {path:?}"))?
        }
        None => Config::default(),
    };

    match cmd {
        Command::Calibrate(calibrate) => calibrate.run(config),
        Command::Point(point) => point.run(config),
        Command::Validate(validate) => validate.run(config),
        Command::Track(track) => track.run(config),
    }
}
