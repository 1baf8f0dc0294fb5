use clap::Parser;
use tracing_subscriber::EnvFilter;

mod api;
mod backend;
mod cli;
mod output;

mod commands {
    pub mod health;
    pub mod list;
    pub mod serve;
}

use cli::{Cli, Commands};
use output::OutputFormat;

/// Default log directive, overridable through `RUST_LOG`.
const LOG_DIRECTIVE: &str = "stratum=info";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Serve(args)) => {
            init_tracing()?;
            commands::serve::run(&args).await
        }
        Some(Commands::Health(args)) => commands::health::run(&args).await,
        Some(Commands::List(args)) => {
            let format = if args.json {
                OutputFormat::Json
            } else {
                OutputFormat::Human
            };
            commands::list::run(&args, format).await
        }
        None => {
            eprintln!("No command given. Run `stratum --help` for usage.");
            std::process::exit(2);
        }
    }
}

fn init_tracing() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(LOG_DIRECTIVE.parse()?))
        .init();
    Ok(())
}
