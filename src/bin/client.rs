//! TierKV CLI Client
//!
//! Looks up one key and prints the value or `NOTFOUND`.

use std::time::Duration;

use clap::Parser;
use tierkv::network::{resolve, Client};
use tracing_subscriber::{fmt, EnvFilter};

/// TierKV CLI
#[derive(Parser, Debug)]
#[command(name = "tierkv-client")]
#[command(about = "Look up a key through the tiered key-value service")]
struct Args {
    /// Server host (the well-known lookup port is always used)
    host: String,

    /// The key to look up
    key: u32,

    /// Reply timeout in milliseconds
    #[arg(short, long, default_value = "2000")]
    timeout_ms: u64,
}

fn main() {
    // Logs go to stderr; stdout carries only the answer
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let addr = match resolve(&args.host) {
        Ok(addr) => addr,
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(1);
        }
    };

    let client = Client::with_timeout(addr, Duration::from_millis(args.timeout_ms));
    match client.lookup(args.key) {
        Ok(outcome) => println!("{}", outcome),
        Err(e) => {
            tracing::error!("Lookup of {} at {} failed: {}", args.key, addr, e);
            std::process::exit(1);
        }
    }
}
