use clap::Parser;
use tracing_subscriber::EnvFilter;

use refile::cli::{self, Cli};
use refile::output::OutputFormatter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = cli::run(cli) {
        OutputFormatter::error(&e.to_string());
        std::process::exit(1);
    }
}
