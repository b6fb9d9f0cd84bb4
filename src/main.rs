//! UstaadCart settlement service entry point
//!
//! ```text
//! ┌──────────┐    ┌──────────┐    ┌────────────┐    ┌──────────┐
//! │  Config  │───▶│ Postgres │───▶│ JobRunner  │    │ Gateway  │
//! │  (YAML)  │    │  (pool)  │    │ (sweeps)   │    │ (axum)   │
//! └──────────┘    └──────────┘    └────────────┘    └──────────┘
//! ```
//!
//! The job runner replaces the previous `pg_cron` schedules: suspension
//! daily at a configured UTC hour, finalization every few minutes. The
//! gateway exposes the order API and the manual job triggers.

use std::sync::Arc;

use ustaadcart::gateway::{self, state::AppState};
use ustaadcart::notify::{LogNotifier, Notifier};
use ustaadcart::orders::{OrderPolicy, OrderService};
use ustaadcart::scheduler::JobRunner;
use ustaadcart::{AppConfig, Database};

fn get_env() -> String {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if (args[i] == "--env" || args[i] == "-e") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }
    "dev".to_string()
}

/// Get port override from command line (--port argument)
fn get_port_override() -> Option<u16> {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if args[i] == "--port" && i + 1 < args.len() {
            return args[i + 1].parse().ok();
        }
    }
    None
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = get_env();
    let config = AppConfig::load(&env);
    let _log_guard = ustaadcart::logging::init_logging(&config);

    tracing::info!(
        "Starting UstaadCart settlement service in {} mode (build {})",
        env,
        env!("GIT_HASH")
    );

    let postgres_url = config
        .postgres_url
        .clone()
        .ok_or_else(|| anyhow::anyhow!("postgres_url missing from config/{}.yaml", env))?;

    let db = Arc::new(Database::connect(&postgres_url).await?);
    db.health_check().await?;

    let notifier: Arc<dyn Notifier> = Arc::new(LogNotifier);
    let jobs = JobRunner::new(db.clone(), config.jobs.clone(), notifier);
    jobs.spawn();
    tracing::info!(
        "Job runner started (finalize every {}s, suspension daily at {:02}:00 UTC)",
        config.jobs.finalize_interval_secs,
        config.jobs.suspension_hour_utc
    );

    let orders = Arc::new(OrderService::new(
        db.clone(),
        OrderPolicy::from(&config.jobs),
    ));
    let state = Arc::new(AppState::new(
        db,
        orders,
        jobs,
        config.jobs.internal_secret.clone(),
    ));

    let port = get_port_override().unwrap_or(config.gateway.port);
    gateway::run_server(&config.gateway.host, port, state).await;

    Ok(())
}
