//! Example: Fetching the upcoming arrivals at one stop
//!
//! Performs a single StopMonitoring request and prints the parsed visits,
//! without writing any files.
//!
//! # Usage
//!
//! ```bash
//! STOPMON_API_KEY=... cargo run -p stopmon-adapters --example fetch_once -- 16633 SF
//! ```

use std::env;

use chrono::Utc;
use stopmon_adapters::payload::{decode_body, parse_payload_detailed};
use stopmon_adapters::siri::StopMonitoringAdapter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let stop_code = env::args().nth(1).unwrap_or_else(|| {
        eprintln!("Usage: cargo run --example fetch_once -- <stop-code> [agency]");
        std::process::exit(1);
    });
    let agency = env::args().nth(2).unwrap_or_else(|| "SF".to_string());
    let api_key = env::var("STOPMON_API_KEY")?;

    let adapter = StopMonitoringAdapter::builder()
        .api_key(api_key)
        .agency(agency)
        .stop_code(stop_code)
        .build()?;

    println!("Fetching {}", adapter.redacted_url());

    let polled_at = Utc::now();
    let parsed = parse_payload_detailed(&decode_body(&adapter.fetch().await?)?);

    if !parsed.recognized {
        println!("Response had no StopMonitoringDelivery");
    }
    for visit in &parsed.visits {
        println!(
            "  {:>4} to {:<25} {:>3} min",
            visit.line,
            visit.destination,
            visit.minutes_away(polled_at)
        );
    }
    if parsed.skipped > 0 {
        println!("  ({} malformed visits skipped)", parsed.skipped);
    }

    Ok(())
}
