use anyhow::Result;
use clap::Parser;
use memoscope_config::AppConfig;
use memoscope_core::AppError;

mod analyze_cmd;
mod artifacts;
mod cli;
mod collect_cmd;
mod config_cmds;
mod pipeline;

use cli::{Cli, Commands, ConfigCommands};

#[tokio::main]
async fn main() {
    // Initialize tracing (output to stderr, initialize only once)
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init()
        .ok();

    let cli = Cli::parse();
    if let Err(err) = dispatch(cli).await {
        eprintln!("Error: {err:#}");
        let code = AppError::find_in(&*err).map_or(1, AppError::exit_code);
        std::process::exit(code);
    }
}

async fn dispatch(cli: Cli) -> Result<()> {
    if let Commands::Config {
        cmd: ConfigCommands::Path,
    } = &cli.command
    {
        return config_cmds::handle_config_path();
    }

    let config = AppConfig::load(cli.config.as_deref())?;
    match cli.command {
        Commands::Collect(args) => collect_cmd::handle_collect(&config, args, cli.format).await,
        Commands::Analyze(args) => analyze_cmd::handle_analyze(&config, args, cli.format).await,
        Commands::Run { subject } => pipeline::handle_run(&config, subject, cli.format).await,
        Commands::Config { cmd } => match cmd {
            ConfigCommands::Show => config_cmds::handle_config_show(&config, cli.format),
            ConfigCommands::Path => config_cmds::handle_config_path(),
        },
    }
}
