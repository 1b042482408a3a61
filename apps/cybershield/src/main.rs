//! # CyberShield - Cybercrime Incident Server
//!
//! The main binary for CyberShield incident reporting and triage.
//!
//! This application provides:
//! - HTTP REST API server (axum-based)
//! - CLI interface for reporters and administrators
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────┐
//! │             apps/cybershield (THE BINARY)         │
//! │                                                   │
//! │     ┌─────────────┐          ┌─────────────┐      │
//! │     │    CLI      │          │  HTTP API   │      │
//! │     │   (clap)    │          │   (axum)    │      │
//! │     └──────┬──────┘          └──────┬──────┘      │
//! │            └────────────┬───────────┘             │
//! │                         ▼                         │
//! │               ┌──────────────────┐                │
//! │               │ cybershield-core │                │
//! │               │   (THE LOGIC)    │                │
//! │               └──────────────────┘                │
//! └───────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Start the HTTP server
//! cybershield server --host 0.0.0.0 --port 8080 --config cybershield.toml
//!
//! # CLI operations
//! cybershield user add U1 --email u1@example.com --name "Jane Doe"
//! cybershield --as U1 report -t "Phishing email" -d "Fake bank email" -k phishing -s low
//! cybershield --as A1 forward <incident-id> LE-2024-001
//! ```

use clap::Parser;
use cybershield::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    let cli = cli::Cli::parse();

    // Initialize tracing; CYBERSHIELD_LOG_FORMAT=json enables machine-parseable output.
    let log_format =
        std::env::var("CYBERSHIELD_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| cli.log_filter().into());

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
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the CyberShield startup banner.
fn print_banner() {
    println!(
        r#"
   ___      _               ___ _     _     _     _
  / __|_  _| |__  ___ _ _  / __| |_  (_)___| |__ | |
 | (__| || | '_ \/ -_) '_| \__ \ ' \ | / -_) / _` |
  \___|\_, |_.__/\___|_|   |___/_||_||_\___|_\__,_|
       |__/

  Cybercrime Incident Server v{}
"#,
        env!("CARGO_PKG_VERSION")
    );
}
