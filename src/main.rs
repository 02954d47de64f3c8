use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use stopmon::config::Overrides;
use stopmon::duration::format_duration;
use stopmon::replay::default_output_path;
use stopmon::{
    replay, ArchiveLog, ArrivalLog, Console, HttpSource, MonitorStats, Recorder, Settings,
    StopMonitor,
};

#[derive(Parser, Debug)]
#[command(name = "stopmon")]
#[command(about = "Poll a transit stop and log its predicted arrivals")]
struct Args {
    /// Path to a TOML config file (default: ./stopmon.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Stop code to monitor
    #[arg(short, long)]
    stop: Option<String>,

    /// Agency code (e.g. "SF")
    #[arg(short, long)]
    agency: Option<String>,

    /// Time between polls (e.g. "62s", "2m")
    #[arg(short, long)]
    interval: Option<String>,

    /// HTTP request timeout (e.g. "15s")
    #[arg(short, long)]
    timeout: Option<String>,

    /// StopMonitoring endpoint URL
    #[arg(long)]
    endpoint: Option<String>,

    /// Arrivals CSV path (with --replay: the replay output, default
    /// <archive>_replayed.csv)
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Raw response archive path
    #[arg(long, conflicts_with = "replay")]
    archive: Option<PathBuf>,

    /// Continue record numbers from the last row of an existing CSV
    #[arg(long)]
    resume_numbering: bool,

    /// Poll once and exit
    #[arg(long, conflicts_with = "replay")]
    once: bool,

    /// Re-parse an existing archive into the CSV instead of polling
    #[arg(long, value_name = "ARCHIVE")]
    replay: Option<PathBuf>,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            stop_code: self.stop.clone(),
            agency: self.agency.clone(),
            endpoint: self.endpoint.clone(),
            poll_interval: self.interval.clone(),
            request_timeout: self.timeout.clone(),
            csv_path: self.csv.clone(),
            archive_path: self.archive.clone(),
            resume_numbering: self.resume_numbering.then_some(true),
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let settings = Settings::load(args.config.as_deref(), &args.overrides())?;

    // Logs go to stderr; stdout is the arrival feed
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("stopmon={}", settings.log_level)));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Some(ref archive_path) = args.replay {
        let output = args
            .csv
            .clone()
            .unwrap_or_else(|| default_output_path(archive_path));
        return run_replay(archive_path, &output);
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start runtime")?;
    runtime.block_on(run_live(&settings, args.once))
}

async fn run_live(settings: &Settings, once: bool) -> Result<()> {
    let source = HttpSource::from_settings(settings)?;

    let last_record = if settings.resume_numbering {
        ArrivalLog::last_record_number(&settings.csv_path)
            .with_context(|| format!("Failed to read {}", settings.csv_path.display()))?
    } else {
        None
    };

    let arrivals = ArrivalLog::open(&settings.csv_path)
        .with_context(|| format!("Failed to open {}", settings.csv_path.display()))?;
    let archive = ArchiveLog::open(&settings.archive_path)
        .with_context(|| format!("Failed to open {}", settings.archive_path.display()))?;

    println!("Archiving raw replies → {}", settings.archive_path.display());
    println!("Arrival CSV → {}", settings.csv_path.display());

    let recorder = Recorder::new(arrivals, Console::stdout());
    let mut monitor = StopMonitor::new(source, recorder, archive, settings.poll_interval);
    if let Some(last) = last_record {
        info!("Resuming after record {}", last);
        monitor = monitor.resume_after(last);
    }

    if once {
        if !monitor.run_once(shutdown_signal()).await {
            println!("\nStopped by user.");
        }
        log_stats(&monitor.stats());
        return Ok(());
    }

    println!(
        "Polling every {}. Ctrl-C to stop.",
        format_duration(settings.poll_interval)
    );
    let stats = monitor.run(shutdown_signal()).await;

    println!("\nStopped by user.");
    log_stats(&stats);
    Ok(())
}

fn run_replay(archive_path: &Path, output: &Path) -> Result<()> {
    let arrivals = ArrivalLog::open(output)
        .with_context(|| format!("Failed to open {}", output.display()))?;
    let mut recorder = Recorder::new(arrivals, Console::stdout());

    let stats = replay(archive_path, &mut recorder)?;
    info!(
        "Replayed {} entries ({} failed polls, {} malformed lines skipped), {} rows written to {}",
        stats.entries,
        stats.failed_polls,
        stats.malformed,
        stats.visits_recorded,
        output.display()
    );
    Ok(())
}

/// Resolves on Ctrl-C. If the handler cannot be installed, never resolves.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

fn log_stats(stats: &MonitorStats) {
    info!(
        "{} polls, {} failed, {} visits recorded, {} skipped, {} write errors",
        stats.cycles,
        stats.failed_polls,
        stats.visits_recorded,
        stats.visits_skipped,
        stats.write_errors
    );
}
