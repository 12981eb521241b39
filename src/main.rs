mod app;
mod cli;
mod config;
mod consts;
mod core;
mod error;
mod output;
mod settings;
mod store;
mod utils;

use clap::Parser;

use app::{CommandContext, handle_command, handle_config_init};
use cli::{Cli, Commands, ConfigCommands};
use config::AnnotationConfig;
use error::AppError;
use settings::Settings;
use utils::{bootstrap_dispatch, init_tracing};

fn run() -> Result<(), AppError> {
    let cli = Cli::parse().with_absolute_paths();

    // Settings and config are read before the log directory is known, so
    // their warnings go to stderr only
    let bootstrap = bootstrap_dispatch(cli.quiet, cli.verbose);
    let mut settings = tracing::dispatcher::with_default(&bootstrap, Settings::load);
    let cli = cli.with_settings(&settings);

    if let Some(Commands::Config {
        command: ConfigCommands::Init { output, force },
    }) = &cli.command
    {
        return tracing::dispatcher::with_default(&bootstrap, || {
            handle_config_init(output.as_deref(), *force)
        });
    }

    let (config, origin) = tracing::dispatcher::with_default(&bootstrap, || {
        AnnotationConfig::load(cli.config.as_deref())
    })?;
    drop(bootstrap);
    init_tracing(cli.quiet, cli.verbose, &config.log_dir())?;
    tracing::debug!("Using config {}", origin.path().display());

    let ctx = CommandContext {
        cli: &cli,
        config: &config,
        config_path: origin.path(),
    };
    handle_command(&ctx, &mut settings)
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
