//! # HyperHelix Server
//!
//! The main binary for the HyperHelix graph engine.
//!
//! This application provides:
//! - HTTP REST API server (axum-based)
//! - CLI interface for graph operations
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │              apps/helix (THE BINARY)         │
//! │                                              │
//! │   ┌─────────────┐        ┌─────────────┐    │
//! │   │    CLI      │        │  HTTP API   │    │
//! │   │   (clap)    │        │   (axum)    │    │
//! │   └──────┬──────┘        └──────┬──────┘    │
//! │          └──────────┬───────────┘           │
//! │                     ▼                       │
//! │             ┌───────────────┐               │
//! │             │  helix-core   │──── redb      │
//! │             └───────────────┘               │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! helix server --host 0.0.0.0 --port 8080
//! helix add-node alpha --tag seed --data '{"kind":"root"}'
//! helix walk alpha --depth 2
//! ```

use clap::Parser;
use helix::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // HELIX_LOG_FORMAT=json switches to machine-parseable output.
    let log_format = std::env::var("HELIX_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "helix=info,helix_core=info,tower_http=debug".into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    let cli = cli::Cli::parse();

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

fn print_banner() {
    println!(
        r#"
  ██╗  ██╗███████╗██╗     ██╗██╗  ██╗
  ██║  ██║██╔════╝██║     ██║╚██╗██╔╝
  ███████║█████╗  ██║     ██║ ╚███╔╝
  ██╔══██║██╔══╝  ██║     ██║ ██╔██╗
  ██║  ██║███████╗███████╗██║██╔╝ ██╗
  ╚═╝  ╚═╝╚══════╝╚══════╝╚═╝╚═╝  ╚═╝

  HyperHelix graph engine v{}
"#,
        env!("CARGO_PKG_VERSION")
    );
}
