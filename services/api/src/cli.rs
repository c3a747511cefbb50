use crate::demo::{run_demo, run_stats, run_suggest, DemoArgs, SnapshotArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use civic_hub::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Civic Hub",
    about = "Track community needs, offers, and ideas and suggest matches between them",
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
    /// Print dashboard statistics for a submissions snapshot
    Stats(SnapshotArgs),
    /// Print need/offer match suggestions for a submissions snapshot
    Suggest(SnapshotArgs),
    /// Seed an in-memory hub with sample submissions and walk through a match
    Demo(DemoArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Stats(args) => run_stats(args),
        Command::Suggest(args) => run_suggest(args),
        Command::Demo(args) => run_demo(args),
    }
}
