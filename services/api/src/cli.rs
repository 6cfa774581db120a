use crate::calculate::{run_calculate, CalculateArgs};
use crate::demo::{run_demo, DemoArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use final_rating::error::AppError;
use final_rating::rating::default_template;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "Final Rating",
    about = "Serve, run and inspect the final rating calculation engine",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Rate every user in a signal export for one period
    Calculate(CalculateArgs),
    /// Inspect rating configurations
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
    /// Rate a synthetic team and replay every trace
    Demo(DemoArgs),
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Print the default configuration template as JSON
    Default,
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Signal export served to calculation requests
    #[arg(long)]
    pub(crate) signals_csv: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Calculate(args) => run_calculate(args),
        Command::Config {
            command: ConfigCommand::Default,
        } => print_default_config(),
        Command::Demo(args) => run_demo(args),
    }
}

fn print_default_config() -> Result<(), AppError> {
    let rendered = serde_json::to_string_pretty(&default_template())
        .map_err(|err| AppError::Io(err.into()))?;
    println!("{rendered}");
    Ok(())
}
