//! mib-harvester - MIB download, compile and OID report tool

use clap::Parser;
use std::io::IsTerminal;
use tracing_subscriber::EnvFilter;

use mib_harvester::cli::{self, Cli};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stdout)
        .with_target(false)
        .with_ansi(std::io::stdout().is_terminal())
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    init_tracing();

    match cli::run(&cli).await {
        Ok(_) => println!("Complete!"),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
