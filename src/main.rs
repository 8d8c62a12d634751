use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use selfpath::{ConfigLoader, ExecutableResolver, SourceKind};

/// Print the absolute path of this executable.
#[derive(Debug, Parser)]
#[command(name = "selfpath", version)]
struct Cli {
    /// Read settings from a key=value file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Data source to consult, in order (kernel, inherited)
    #[arg(long = "source", value_name = "SOURCE")]
    sources: Vec<SourceKind>,

    /// Ignore the shell's `_` variable
    #[arg(long)]
    no_shell_hint: bool,

    /// Also print the strategy that found the path, and log each attempt
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut config = match &cli.config {
        Some(path) => match ConfigLoader::load_from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("selfpath: {}: {}", path.display(), e);
                return ExitCode::FAILURE;
            }
        },
        None => ConfigLoader::default_config(),
    };
    if !cli.sources.is_empty() {
        config.sources = cli.sources;
    }
    if cli.no_shell_hint {
        config.shell_hint = false;
    }

    let resolver = ExecutableResolver::with_config(&config);
    match resolver.resolve_detailed() {
        Ok(resolution) if cli.verbose => {
            println!("{}", resolution);
            ExitCode::SUCCESS
        }
        Ok(resolution) => {
            println!("{}", resolution.path.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("selfpath: {}", e);
            ExitCode::FAILURE
        }
    }
}
