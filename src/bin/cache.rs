//! TierKV Cache Surrogate Binary
//!
//! Answers from static and memoized entries, forwarding misses to the origin.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use clap::Parser;
use tierkv::network::resolve;
use tierkv::{CacheTier, Config, Override, RemoteOrigin, Server, UDP_PORT};
use tracing_subscriber::{fmt, EnvFilter};

/// TierKV Cache Surrogate
#[derive(Parser, Debug)]
#[command(name = "tierkv-cache")]
#[command(about = "Caching surrogate in front of a TierKV origin")]
#[command(version)]
struct Args {
    /// Origin host (the well-known lookup port is always used)
    #[arg(short, long)]
    origin: String,

    /// Listen IP (the port is always the well-known lookup port)
    #[arg(short, long, default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    listen: IpAddr,

    /// Static entries answered without contacting the origin
    #[arg(short = 's', long = "static", value_name = "KEY=VALUE")]
    static_entries: Vec<Override>,

    /// Max number of memoized keys
    #[arg(short, long)]
    memo_capacity: Option<usize>,

    /// Origin reply timeout in milliseconds
    #[arg(short, long, default_value = "2000")]
    timeout_ms: u64,

    /// Worker threads forwarding misses to the origin (0 handles every
    /// request on the receive thread, so hits wait behind forwards)
    #[arg(short, long, default_value = "4")]
    workers: usize,
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

    tracing::info!("TierKV Cache v{}", tierkv::VERSION);

    let origin_addr = match resolve(&args.origin) {
        Ok(addr) => addr,
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(1);
        }
    };

    let mut builder = Config::builder()
        .listen_addr(SocketAddr::new(args.listen, UDP_PORT))
        .workers(args.workers)
        .client_timeout_ms(args.timeout_ms);
    if let Some(capacity) = args.memo_capacity {
        builder = builder.memo_capacity(capacity);
    }
    let config = builder.build();

    let upstream = RemoteOrigin::new(origin_addr, config.client_timeout());
    let tier = CacheTier::new(upstream)
        .with_static(args.static_entries)
        .with_memo_capacity(config.memo_capacity);

    tracing::info!(
        "Forwarding misses to {} ({} static entries)",
        tier.upstream().origin_addr(),
        tier.static_len()
    );

    let server = match Server::bind(config, tier) {
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
