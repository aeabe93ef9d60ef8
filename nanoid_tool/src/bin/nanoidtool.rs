//! Identifier minting tool.

use std::{
    io,
    num::{NonZeroU32, NonZeroUsize},
    path::PathBuf,
    process,
};

use clap::{Args, Parser, Subcommand};
use nanoid::Generator;
use nanoid_tool::{Config, Error, load_config, mint, validate};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, util::SubscriberInitExt};

#[derive(Parser)]
#[clap(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
    #[command(flatten)]
    args: MintArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a configuration file and exit
    ConfigCheck(ConfigCheckArgs),
}

#[derive(Args)]
struct ConfigCheckArgs {
    /// path on disk to the configuration file
    #[clap(long)]
    config_path: PathBuf,
}

#[derive(Args)]
struct MintArgs {
    /// path on disk to the configuration file
    #[clap(long)]
    config_path: Option<PathBuf>,
    /// the symbols identifiers are drawn from, overrides the configuration
    #[clap(long)]
    alphabet: Option<String>,
    /// the number of symbols in each identifier, overrides the configuration
    #[clap(long)]
    size: Option<NonZeroUsize>,
    /// the number of identifiers to mint, overrides the configuration
    #[clap(long)]
    count: Option<NonZeroU32>,
}

fn get_config(args: MintArgs) -> Result<Config, Error> {
    let mut config = match &args.config_path {
        Some(path) => load_config(path)?,
        None => Config::default(),
    };

    if let Some(alphabet) = args.alphabet {
        config.generator.alphabet = Some(alphabet);
    }
    if let Some(size) = args.size {
        config.size = size;
    }
    if let Some(count) = args.count {
        config.count = count;
    }
    Ok(config)
}

fn run(args: MintArgs) -> Result<(), Error> {
    let config = get_config(args)?;
    let generator = Generator::from_config(&config.generator)?;
    info!(
        size = config.size.get(),
        count = config.count.get(),
        "Minting identifiers"
    );

    let stdout = io::stdout();
    let mut writer = io::BufWriter::new(stdout.lock());
    mint(&generator, config.size, config.count, &mut writer)
}

fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .with_ansi(false)
        .finish()
        .init();

    let cli = Cli::parse();
    match cli.command {
        Some(Commands::ConfigCheck(check)) => {
            match load_config(&check.config_path).and_then(|config| validate(&config)) {
                Ok(()) => process::exit(0),
                Err(err) => {
                    error!("Configuration check failed: {err}");
                    process::exit(1)
                }
            }
        }
        None => run(cli.args).inspect_err(|err| error!("Failed to mint identifiers: {err}")),
    }
}
