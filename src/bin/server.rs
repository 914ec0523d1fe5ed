//! TierKV Origin Server Binary
//!
//! Serves lookups from the base store plus `KEY=VALUE` overrides.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use clap::Parser;
use tierkv::{Config, Origin, OriginStore, Override, Server, UDP_PORT};
use tracing_subscriber::{fmt, EnvFilter};

/// TierKV Origin Server
#[derive(Parser, Debug)]
#[command(name = "tierkv-server")]
#[command(about = "Authoritative origin for tiered key-value lookups")]
#[command(version)]
struct Args {
    /// Listen IP (the port is always the well-known lookup port)
    #[arg(short, long, default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    listen: IpAddr,

    /// Worker threads (0 handles every request on the receive thread)
    #[arg(short, long, default_value = "0")]
    workers: usize,

    /// Store overrides, applied in order on top of the base entries
    #[arg(value_name = "KEY=VALUE")]
    overrides: Vec<Override>,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tierkv=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("TierKV Server v{}", tierkv::VERSION);

    let store = OriginStore::with_overrides(args.overrides);
    tracing::info!("Store loaded with {} entries: {:?}", store.len(), store.entries());

    let config = Config::builder()
        .listen_addr(SocketAddr::new(args.listen, UDP_PORT))
        .workers(args.workers)
        .build();

    let server = match Server::bind(config, Origin::new(store)) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Failed to bind: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run() {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
