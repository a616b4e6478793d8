use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod config;
mod core;
mod matching;
mod output;
mod parsing;
mod store;

fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();

    // Initialize logging based on verbosity flag
    let filter = if cli.verbose {
        EnvFilter::new("allele_join=debug,info")
    } else {
        EnvFilter::new("allele_join=warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        cli::Commands::Annotate(args) => {
            cli::annotate::run(args, cli.format, cli.verbose)?;
        }
        cli::Commands::Membership(args) => {
            cli::membership::run(args, cli.format, cli.verbose)?;
        }
    }

    Ok(())
}
