// Copyright (C) 2025 Holdem Developers
// SPDX-License-Identifier: Apache-2.0
use clap::Parser;
use log::error;

#[derive(Debug, Parser)]
struct Cli {
    /// The server listening address.
    #[clap(long, short, default_value = "127.0.0.1")]
    address: String,
    /// The server listening port.
    #[clap(long, short, default_value_t = 50051)]
    port: u16,
    /// The database path.
    #[clap(long, default_value = "poker.db")]
    db: String,
}

#[tokio::main]
async fn main() {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .format_target(false)
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();
    let config = holdem_server::Config {
        address: cli.address,
        port: cli.port,
        db_path: cli.db,
    };

    if let Err(e) = holdem_server::run(config).await {
        error!("{e}");
        std::process::exit(1);
    }
}
