// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::Parser;
use tracing::error;

use scaf::config::ServerConfig;

#[derive(Parser)]
#[command(name = "scaf", version, about = "Rendezvous relay pairing two connections into one stream.")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Run the scaf server.
    Serve(ServerConfig),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match cli.command {
        Command::Serve(config) => {
            if let Err(e) = scaf::run(config).await {
                error!("fatal: {e:#}");
                std::process::exit(1);
            }
        }
    }
}
