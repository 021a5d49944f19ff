use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{debug, info};

use crate::session::AuthContext;

pub fn cleanup_idle_sessions(auth: Arc<AuthContext>) {
    let start = Instant::now();
    debug!("Starting session cleanup cycle");

    let expired = auth.sweep_idle(Utc::now());

    info!(
        expired_sessions = expired,
        remaining_sessions = auth.session_count(),
        duration_ms = start.elapsed().as_millis() as u64,
        "Session cleanup completed"
    );
}
