//! racket CLI: run synthetic work through a Job and triage its progress.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use clap::Parser;
use racket::config::{Config, SupervisorConfig};
use racket::telemetry::{TelemetryConfig, init_telemetry};
use racket::{
    Job, Progress, ProgressData, ProgressKind, ProgressSender, ProgressSink, TracingOutput, Work,
    WorkerId, pmessage, work_channel,
};
use tracing::info;

#[derive(Parser)]
#[command(name = "racket", about = "Run work through a bounded worker pool")]
struct Cli {
    /// Number of work items to submit
    #[arg(long, default_value_t = 100)]
    items: i64,
    /// Maximum concurrent workers (defaults to the configured value)
    #[arg(long)]
    workers: Option<usize>,
    /// Simulated time each item takes, in milliseconds
    #[arg(long, default_value_t = 5)]
    work_ms: u64,
    /// Report an error for every Nth item (0 disables)
    #[arg(long, default_value_t = 0)]
    fail_every: i64,
    /// Don't log progress messages, updates, or estimates
    #[arg(long)]
    quiet: bool,
    /// Supervisor config TOML (overrides RACKET_* variables)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = Config::from_env()?;
    let _guard = init_telemetry(TelemetryConfig {
        endpoint: config.otel_endpoint.clone(),
        service_name: "racket".to_string(),
        log_level: config.log_level.clone(),
    })?;

    let supervisor = match &cli.config {
        Some(path) => SupervisorConfig::load(path)?,
        None => config.supervisor,
    };
    let workers = cli.workers.unwrap_or(supervisor.max_workers);
    let work_ms = cli.work_ms;
    let fail_every = cli.fail_every;

    let mut job = Job::with_config(
        move |id: WorkerId, work: Work, progress: ProgressSender| async move {
            let n = work.get_int("n");
            if n == 1 {
                progress.estimate(work.get_int("total")).await;
            }
            tokio::time::sleep(Duration::from_millis(work_ms)).await;
            if fail_every > 0 && n % fail_every == 0 {
                progress.error(format!("item {n} failed on worker {id}")).await;
            } else {
                progress.send(pmessage!("worker {id} finished item {n}")).await;
            }
            progress.update(1).await;
        },
        supervisor,
    );

    let (tx, intake) = work_channel();
    let (progress, drain) = job.supervise(workers, intake);

    let (bar_tx, bar_rx) = async_channel::bounded::<Progress>(16);
    let bar = tokio::spawn(async move {
        let (mut done, mut total) = (0i64, 0i64);
        while let Ok(p) = bar_rx.recv().await {
            if let ProgressData::Count(n) = p.data {
                if p.kind == ProgressKind::ESTIMATE {
                    total = n;
                } else {
                    done += n;
                }
            }
        }
        (done, total)
    });

    let failures = Arc::new(AtomicU64::new(0));
    let failed = Arc::clone(&failures);
    let sink = tokio::spawn(
        ProgressSink::new(TracingOutput)
            .log_messages(!cli.quiet)
            .on_error(move |_| {
                failed.fetch_add(1, Ordering::Relaxed);
            })
            .forward_bars(bar_tx)
            .run(progress.clone()),
    );

    info!(items = cli.items, workers, "submitting work");
    for n in 1..=cli.items {
        tx.send(Work::empty().with("n", n).with("total", cli.items))
            .await?;
    }
    drain.drain();

    job.is_done().wait().await;
    progress.close();
    sink.await?;
    let (done, total) = bar.await?;

    info!(
        done,
        total,
        failed = failures.load(Ordering::Relaxed),
        "all work finished"
    );
    Ok(())
}
