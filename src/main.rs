//! login-pipeline entry point.
//!
//! Connects the queue and the store, runs the pipeline to completion, and
//! closes the database pool on every exit path.

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use login_pipeline::config::PipelineConfig;
use login_pipeline::persistence::PostgresStore;
use login_pipeline::queue::SqsQueue;
use login_pipeline::service::BatchPipeline;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration (also reads .env, so LOG_FORMAT / RUST_LOG apply)
    let config = PipelineConfig::from_env().context("invalid configuration")?;
    init_tracing();

    tracing::info!(
        queue_url = %config.queue_url,
        table = %config.target_table,
        batch_size = config.batch_size,
        mode = %config.run_mode,
        "starting login-pipeline"
    );

    // Acquire long-lived resources
    let queue = SqsQueue::connect(&config).await;
    let store = PostgresStore::connect(&config)
        .await
        .context("database unavailable")?;

    let result = match BatchPipeline::new(queue, store.clone(), &config) {
        Ok(pipeline) => pipeline.run_until(shutdown_signal()).await,
        Err(err) => Err(err),
    };
    store.close().await;

    match result {
        Ok(report) => {
            tracing::info!(
                polls = report.polls,
                received = report.messages_received,
                rejected = report.messages_rejected,
                committed = report.batches_committed,
                failed = report.batches_failed,
                rows = report.rows_inserted,
                deleted = report.messages_deleted,
                delete_failures = report.delete_failures,
                "pipeline finished"
            );
            Ok(())
        }
        Err(err) => {
            tracing::error!(error = %err, code = err.error_code(), "pipeline aborted");
            Err(err.into())
        }
    }
}

/// `LOG_FORMAT=json` switches to JSON lines; anything else is plain text.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    if json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}
