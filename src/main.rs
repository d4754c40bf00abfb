//! # Tube Countdown Application Entry Point
//!
//! Runs the configured jobs once, in order, pushing one frame per job to the
//! panel. Scheduling repeated runs (cron, a queue consumer, a systemd timer)
//! is left to whatever invokes the binary.
//!
//! ## Usage
//!
//! ```text
//! tube-countdown                      # run every job from countdown-config.toml
//! tube-countdown --stdout             # render jobs to the terminal, no push
//! tube-countdown --job '{"station_id":"910GHMPSTDH","inbound":false}'
//! ```

use anyhow::Context;
use std::env;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use tube_countdown_lib::{
    config::Config,
    pipeline::{Job, Pipeline},
    preview::draw_ascii,
    stations::{DirectionExceptionTable, StationRegistry},
};

/// Main application entry point.
fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();

    // Development mode: render to stdout for testing without a panel
    let development_mode = args.iter().any(|arg| arg == "--stdout");

    let config = Config::load();

    // A single queue-style message replaces the configured job list
    let jobs = match args.iter().position(|arg| arg == "--job") {
        Some(index) => {
            let body = args
                .get(index + 1)
                .context("--job needs a JSON message argument")?;
            vec![serde_json::from_str::<Job>(body).context("invalid job message")?]
        }
        None => config.jobs.clone(),
    };

    let registry = Arc::new(StationRegistry::builtin().context("invalid station data")?);
    let exceptions = Arc::new(DirectionExceptionTable::builtin());
    let pipeline = Pipeline::new(&config, registry, exceptions)?;

    // One job at a time; no parallelism is needed
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    if development_mode {
        let background = config.display.theme().background;
        for job in &jobs {
            let canvas = rt.block_on(pipeline.render_job(job))?;
            let direction = if job.inbound { "inbound" } else { "outbound" };
            println!("{} {}", job.station_id, direction);
            draw_ascii(&canvas, background);
        }
        return Ok(());
    }

    let started = Instant::now();
    let mut failures = 0;
    for job in &jobs {
        wait_for(started, job.delay_secs);

        match rt.block_on(pipeline.run(job)) {
            Ok(reply) => info!(station = %job.station_id, %reply, "display updated"),
            Err(e) => {
                // Reported once; the next scheduled run is the retry
                error!(station = %job.station_id, error = %e, "display update failed");
                failures += 1;
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{failures} of {} display updates failed", jobs.len());
    }
    Ok(())
}

/// Sleep until `delay_secs` after `started`.
fn wait_for(started: Instant, delay_secs: u64) {
    let due = started + Duration::from_secs(delay_secs);
    let now = Instant::now();
    if due > now {
        std::thread::sleep(due - now);
    }
}
