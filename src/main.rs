use clap::Parser;
use pipepool::cli::{check, run, Cli, Commands};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match &cli.command {
        Commands::Run(args) => run::execute(args).await,
        Commands::Check(args) => check::execute(args.config.as_deref()),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
