//! Telemetry server binary
//!
//! Run with: cargo run [BIND_ADDR] [DB_PATH]
//!
//! Examples:
//!   cargo run                              # binds to 0.0.0.0:8080, readings.db
//!   cargo run localhost                    # binds to 127.0.0.1:8080
//!   cargo run 127.0.0.1:9000               # binds to 127.0.0.1:9000
//!   cargo run 0.0.0.0:8080 /var/lib/readings.db
//!
//! ## Submitting a reading
//!
//!   curl -X POST localhost:8080/measurements \
//!        -H 'Content-Type: application/json' \
//!        -d '{"temperatureC": 85.0, "humidity": 40.0}'
//!
//! ## Watching the live feed
//!
//!   websocat ws://localhost:8080/ws
//!
//! ## Reading the history
//!
//!   curl localhost:8080/measurements

use std::net::SocketAddr;

use thermocast_rs::store::SqliteStore;
use thermocast_rs::{SensorServer, ServerConfig};

/// Parse bind address from command line argument.
///
/// Accepts formats:
/// - "localhost" -> 127.0.0.1:8080
/// - "localhost:9000" -> 127.0.0.1:9000
/// - "127.0.0.1" -> 127.0.0.1:8080
/// - "0.0.0.0:8080" -> 0.0.0.0:8080
fn parse_bind_addr(arg: &str) -> Result<SocketAddr, String> {
    const DEFAULT_PORT: u16 = 8080;

    // Replace "localhost" with "127.0.0.1"
    let normalized = arg.replace("localhost", "127.0.0.1");

    // Try parsing as SocketAddr first (includes port)
    if let Ok(addr) = normalized.parse::<SocketAddr>() {
        return Ok(addr);
    }

    // Try parsing as IP address without port
    if let Ok(ip) = normalized.parse::<std::net::IpAddr>() {
        return Ok(SocketAddr::new(ip, DEFAULT_PORT));
    }

    Err(format!(
        "Invalid bind address: '{}'. Expected format: IP:PORT or IP or 'localhost'",
        arg
    ))
}

fn print_usage() {
    eprintln!("Usage: thermocast [BIND_ADDR] [DB_PATH]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  BIND_ADDR    Address to bind to (default: 0.0.0.0:8080)");
    eprintln!("  DB_PATH      SQLite database file (default: readings.db)");
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  thermocast                            # 0.0.0.0:8080, readings.db");
    eprintln!("  thermocast localhost                  # 127.0.0.1:8080");
    eprintln!("  thermocast 127.0.0.1:9000             # 127.0.0.1:9000");
    eprintln!("  thermocast 0.0.0.0:8080 /tmp/t.db     # custom database path");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return Ok(());
    }

    let mut config = ServerConfig::default();

    if let Some(addr_str) = args.get(1) {
        match parse_bind_addr(addr_str) {
            Ok(addr) => config = config.bind(addr),
            Err(e) => {
                eprintln!("Error: {}", e);
                eprintln!();
                print_usage();
                std::process::exit(1);
            }
        }
    }
    if let Some(db_path) = args.get(2) {
        config = config.db_path(db_path);
    }

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("thermocast_rs=debug".parse()?)
                .add_directive("thermocast=debug".parse()?),
        )
        .init();

    let store = SqliteStore::open(&config.db_path)?;
    let server = SensorServer::new(config, store);

    println!("Starting telemetry server on {}", server.bind_addr());
    println!();
    println!("=== Submit a reading ===");
    println!("curl -X POST localhost:8080/measurements -H 'Content-Type: application/json' \\");
    println!("     -d '{{\"temperatureC\": 85.0, \"humidity\": 40.0}}'");
    println!();
    println!("=== Watch the live feed ===");
    println!("websocat ws://localhost:8080/ws");
    println!();

    // Ctrl+C triggers the graceful path: stop accepting, drain the registry
    let shutdown = async {
        let _ = tokio::signal::ctrl_c().await;
        println!("\nShutting down...");
    };

    server.run_until(shutdown).await?;

    Ok(())
}
