use crate::report::{
    run_coefficients, run_compare, run_predict, CompareArgs, ModelArgs, PredictArgs,
};
use crate::server;
use clap::{Args, Parser, Subcommand};
use housing_price::error::AppError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "Housing Price Estimator",
    about = "Serve and query housing price predictions from the command line",
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
    /// Estimate the price of a single house
    Predict(PredictArgs),
    /// Show the model's coefficient table, when it has one
    Coefficients(ModelArgs),
    /// Compare actual and predicted prices from a CSV file
    Compare(CompareArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Model artifact to serve instead of the configured one
    #[arg(long)]
    pub(crate) model: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Predict(args) => run_predict(args),
        Command::Coefficients(args) => run_coefficients(args),
        Command::Compare(args) => run_compare(args),
    }
}
