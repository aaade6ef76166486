use clap::Parser;
use tracing::{debug, error, trace};

use tfrun::cli::{execute, get_log_level, Cli, Collaborators};
use tfrun::Error;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(get_log_level(cli.verbose))
        .with_target(cli.verbose >= 2) // Show target module for -vv and above
        .with_thread_ids(cli.verbose >= 3) // Show thread IDs for -vvv
        .with_line_number(cli.verbose >= 3) // Show line numbers for -vvv
        .init();

    debug!("tfrun started with verbosity level: {}", cli.verbose);
    trace!("Full CLI args: {:?}", std::env::args().collect::<Vec<_>>());

    match run(cli).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            match e.downcast_ref::<Error>() {
                Some(Error::Aborted(message)) => println!("{message}"),
                _ => {
                    error!("Fatal error: {}", e);
                    eprintln!("Error: {e}");
                }
            }
            std::process::exit(1);
        }
    }
}

/// Whether every module built successfully
async fn run(cli: Cli) -> anyhow::Result<bool> {
    let report = execute(&cli, Collaborators::production()).await?;

    if !report.outcomes.is_empty() {
        println!("\n{}", report.summary());
    }
    Ok(report.is_success())
}
