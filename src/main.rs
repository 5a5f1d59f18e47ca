//! fqcn-converter - FQCN conversion for Ansible content
//!
//! This is the main entry point for the fqcn-converter CLI.

mod cli;
mod config;

use cli::commands::CommandContext;
use cli::{Cli, Commands};
use config::{Config, LogFormat, LoggingConfig};
use is_terminal::IsTerminal;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Application version information
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Load configuration
    let config = match Config::load(cli.config.as_ref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("ERROR: {:#}", e);
            std::process::exit(fqcn_converter::error::ErrorKind::Configuration.exit_code());
        }
    };

    init_logging(cli.verbosity(), &config.logging);
    tracing::debug!("fqcn-converter v{}", VERSION);

    let use_color = !cli.no_color && std::io::stdout().is_terminal();
    let mut ctx = CommandContext::new(&cli, config, use_color);

    // Execute the appropriate command
    let result = match &cli.command {
        Commands::Convert(args) => args.execute(&mut ctx).await,
        Commands::Validate(args) => args.execute(&mut ctx).await,
        Commands::Batch(args) => args.execute(&mut ctx).await,
        Commands::Mappings(args) => args.execute(&mut ctx).await,
        Commands::Completions(args) => args.execute(&mut ctx).await,
    };

    let exit_code = match result {
        Ok(code) => code,
        Err(e) => {
            ctx.output.error(&format!("{:#}", e));
            exit_code_for(&e)
        }
    };

    std::process::exit(exit_code);
}

/// Exit status for an error escaping a command.
fn exit_code_for(error: &anyhow::Error) -> i32 {
    error
        .chain()
        .find_map(|cause| cause.downcast_ref::<fqcn_converter::error::Error>())
        .map_or(1, |e| e.exit_code())
}

/// Initialize logging based on verbosity level and configuration
///
/// `RUST_LOG` wins, then `-v`, then the configured level.
fn init_logging(verbosity: u8, logging: &LoggingConfig) {
    let filter = match verbosity {
        0 => logging.level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(filter))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let text_layer = (logging.format == LogFormat::Text).then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(verbosity >= 3)
    });
    let json_layer = (logging.format == LogFormat::Json)
        .then(|| fmt::layer().json().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(text_layer)
        .with(json_layer)
        .init();
}
