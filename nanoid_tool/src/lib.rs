//! Identifier minting for the command line
//!
//! This library backs the `nanoidtool` binary. It loads a YAML configuration
//! describing the generator and how many identifiers of which size to mint,
//! then writes the identifiers one per line.

#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![deny(clippy::dbg_macro)]
#![deny(clippy::unwrap_used)]
#![deny(unused_extern_crates)]
#![deny(unreachable_pub)]
#![deny(missing_docs)]
#![deny(missing_debug_implementations)]
#![allow(clippy::module_name_repetitions)]

use std::{
    io::{self, Write},
    num::{NonZeroU32, NonZeroUsize},
    path::Path,
};

use nanoid::{DEFAULT_SIZE, Generator, RandomSource};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

/// Errors produced by the tool.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The generator configuration is invalid.
    #[error("Invalid generator configuration: {0}")]
    Config(#[from] nanoid::ConfigError),
    /// The configuration could not be deserialized.
    #[error("Failed to deserialize configuration: {0}")]
    SerdeYaml(#[from] serde_yaml::Error),
    /// Reading configuration, generating or writing identifiers failed.
    #[error(transparent)]
    Io(#[from] io::Error),
}

fn default_size() -> NonZeroUsize {
    NonZeroUsize::new(DEFAULT_SIZE).unwrap_or(NonZeroUsize::MIN)
}

fn default_count() -> NonZeroU32 {
    NonZeroU32::MIN
}

/// Configuration of the tool.
#[derive(Debug, Deserialize, Serialize, PartialEq, Eq, Clone)]
#[serde(rename_all = "snake_case")]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// The generator to mint identifiers with.
    #[serde(default)]
    pub generator: nanoid::Config,
    /// The number of symbols in each identifier.
    #[serde(default = "default_size")]
    pub size: NonZeroUsize,
    /// The number of identifiers to mint.
    #[serde(default = "default_count")]
    pub count: NonZeroU32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            generator: nanoid::Config::default(),
            size: default_size(),
            count: default_count(),
        }
    }
}

/// Parse a YAML configuration.
///
/// # Errors
///
/// Returns [`Error::SerdeYaml`] if `contents` is not a valid configuration.
pub fn parse_config(contents: &str) -> Result<Config, Error> {
    serde_yaml::from_str(contents).map_err(|err| {
        error!("Configuration validation failed: {}", err);
        Error::SerdeYaml(err)
    })
}

/// Load and parse the YAML configuration at `path`.
///
/// # Errors
///
/// Returns [`Error::Io`] if the file cannot be read and
/// [`Error::SerdeYaml`] if it is not a valid configuration.
pub fn load_config(path: &Path) -> Result<Config, Error> {
    debug!("Attempting to open configuration file at: {}", path.display());
    let contents = std::fs::read_to_string(path).map_err(|err| {
        error!("Could not read config file '{}': {}", path.display(), err);
        err
    })?;
    parse_config(&contents)
}

/// Check that `config` describes a valid generator.
///
/// # Errors
///
/// Returns [`Error::Config`] if the generator configuration is invalid.
pub fn validate(config: &Config) -> Result<(), Error> {
    Generator::from_config(&config.generator)?;
    info!("Configuration is valid");
    Ok(())
}

/// Write `count` identifiers of `size` symbols from `generator` to `writer`,
/// one per line.
///
/// # Errors
///
/// Returns [`Error::Io`] if the generator's random source fails or `writer`
/// cannot be written to.
pub fn mint<S, W>(
    generator: &Generator<S>,
    size: NonZeroUsize,
    count: NonZeroU32,
    writer: &mut W,
) -> Result<(), Error>
where
    S: RandomSource,
    W: Write,
{
    let size = size.get();
    for _ in 0..count.get() {
        let id = generator.new_id(size).map_err(io::Error::from)?;
        writer.write_all(id.as_bytes())?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    debug!(count = count.get(), size, "identifiers minted");
    Ok(())
}
