//! # Mezuro
//!
//! ```bash
//! # Seed a user and a configuration, then serve
//! mezuro user add --name Ana --email ana@example.org
//! mezuro configuration add --owner-email ana@example.org --name Java --public
//! mezuro server --host 0.0.0.0 --port 8080
//!
//! # Inspect
//! mezuro status --json-mode
//! mezuro collectors
//! ```

use clap::Parser;
use mezuro::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // MEZURO_LOG_FORMAT=json switches to JSON lines.
    let log_format = std::env::var("MEZURO_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "mezuro=info,mezuro_core=info,tower_http=debug".into());

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
  mezuro v{}
  metric configurations, ranges and readings
"#,
        env!("CARGO_PKG_VERSION")
    );
}
