//! gatewayctl - provision and supervise a containerized gateway node

use std::process::ExitCode;

use clap::Parser;
use gatewayctl::cli::Cli;
use gatewayctl::domain::error::classify;
use gatewayctl::output::json::format_error;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let json = cli.json;
    match cli.run().await {
        Ok(code) => code,
        Err(e) => {
            let message = format!("{e:#}");
            match json.then(|| format_error(&message, classify(&e).as_str())) {
                Some(Ok(obj)) => println!("{obj}"),
                _ => eprintln!("Error: {message}"),
            }
            ExitCode::FAILURE
        }
    }
}
