use anyhow::Result;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use slipway_core::BackgroundWorkQueue;

const QUEUE_WORKERS: usize = 4;

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let queue = BackgroundWorkQueue::start(QUEUE_WORKERS);
    tracing::info!(workers = QUEUE_WORKERS, "slipwayd started");

    tokio::signal::ctrl_c().await?;
    tracing::info!("slipwayd shutting down, draining work queue");
    queue.shutdown().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    #[test]
    fn slipwayd_smoke_compiles() {
        assert!(true);
    }
}
