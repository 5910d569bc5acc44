#![warn(clippy::unwrap_used, clippy::expect_used)]

mod commands;
mod config;
mod errors;
mod events;
mod logging;
mod salt;
mod util;

use crate::{config::Config, errors::AppError};

fn main() -> Result<(), AppError> {
    let config = Config::new()?;
    logging::init(config.log_level, config.log_format)?;

    tracing::debug!(?config, "loaded config");

    let output = commands::run(&config)?;
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}
