mod cli;
mod handlers;

use clap::Parser;
use tplink_core::DeviceConfig;
use tracing::error;

use crate::cli::{Cli, Command};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing
    if cli.verbose {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .init();
    }

    match cli.command {
        Command::Version => {
            println!("tplink {}", env!("CARGO_PKG_VERSION"));
            println!("tplink-core {}", tplink_core::VERSION);
        }

        Command::Device {
            target,
            port,
            timeout,
            command,
        } => {
            let config = DeviceConfig::new(&target)
                .with_port(port)
                .with_timeout(timeout);

            match handlers::handle_device(&config, command).await {
                Ok(json) => println!("{}", json),
                Err(e) => {
                    error!("Command to {}:{} failed: {}", target, port, e);
                    eprintln!("Error: {}:{}: {}", target, port, e);
                    std::process::exit(1);
                }
            }
        }
    }
}
