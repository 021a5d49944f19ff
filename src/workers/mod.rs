mod session_cleanup;

use std::sync::Arc;

use tokio::sync::{broadcast, Mutex};
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{info, warn};

use crate::session::AuthContext;

pub use session_cleanup::cleanup_idle_sessions;

pub struct WorkerManager {
    scheduler: Mutex<JobScheduler>,
    shutdown_tx: broadcast::Sender<()>,
    auth: Arc<AuthContext>,
    sweep_schedule: String,
}

impl WorkerManager {
    pub async fn new(auth: Arc<AuthContext>, sweep_schedule: &str) -> Result<Self, WorkerError> {
        let scheduler = JobScheduler::new().await?;
        let (shutdown_tx, _) = broadcast::channel(1);
        Ok(Self {
            scheduler: Mutex::new(scheduler),
            shutdown_tx,
            auth,
            sweep_schedule: sweep_schedule.to_string(),
        })
    }

    pub async fn start(&self) -> Result<(), WorkerError> {
        let enable_session_cleanup = std::env::var("ENABLE_SESSION_CLEANUP_WORKER")
            .map(|v| v != "false" && v != "0")
            .unwrap_or(true);

        let scheduler = self.scheduler.lock().await;

        if enable_session_cleanup {
            let auth = Arc::clone(&self.auth);
            let shutdown_rx = self.shutdown_tx.subscribe();
            let job = Job::new_async(self.sweep_schedule.as_str(), move |_uuid, _lock| {
                let auth = Arc::clone(&auth);
                let mut rx = shutdown_rx.resubscribe();
                Box::pin(async move {
                    if rx.try_recv().is_ok() {
                        return;
                    }
                    cleanup_idle_sessions(auth);
                })
            })?;
            scheduler.add(job).await?;
            info!(schedule = %self.sweep_schedule, "Session cleanup worker scheduled");
        }

        scheduler.start().await?;
        info!("Workers started");
        Ok(())
    }

    pub async fn stop(&self) {
        info!("Stopping workers...");
        let _ = self.shutdown_tx.send(());

        let mut scheduler = self.scheduler.lock().await;
        if let Err(e) = scheduler.shutdown().await {
            warn!(error = %e, "Error shutting down scheduler");
        }

        info!("Workers stopped");
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("Scheduler error: {0}")]
    Scheduler(#[from] tokio_cron_scheduler::JobSchedulerError),
}
