use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Server counters, updated with relaxed atomics from any task.
#[derive(Debug, Default)]
pub struct ServerMetrics {
    pub connected_clients: AtomicU64,
    pub messages_sent: AtomicU64,
    pub messages_received: AtomicU64,
    pub bytes_sent: AtomicU64,
    pub bytes_received: AtomicU64,
    pub rejected_clients: AtomicU64,
}

impl ServerMetrics {
    /// Get Prometheus-compatible metrics as a string
    pub fn to_prometheus(&self) -> String {
        format!(
            "# HELP voicechat_connected_clients Number of connected clients\n\
             # TYPE voicechat_connected_clients gauge\n\
             voicechat_connected_clients {}\n\
             \n\
             # HELP voicechat_messages_sent Total messages queued to clients\n\
             # TYPE voicechat_messages_sent counter\n\
             voicechat_messages_sent {}\n\
             \n\
             # HELP voicechat_messages_received Total messages dispatched from clients\n\
             # TYPE voicechat_messages_received counter\n\
             voicechat_messages_received {}\n\
             \n\
             # HELP voicechat_bytes_sent Total bytes written to clients\n\
             # TYPE voicechat_bytes_sent counter\n\
             voicechat_bytes_sent {}\n\
             \n\
             # HELP voicechat_bytes_received Total bytes read from clients\n\
             # TYPE voicechat_bytes_received counter\n\
             voicechat_bytes_received {}\n\
             \n\
             # HELP voicechat_rejected_clients Clients that failed the compatibility check\n\
             # TYPE voicechat_rejected_clients counter\n\
             voicechat_rejected_clients {}\n",
            self.connected_clients.load(Ordering::Relaxed),
            self.messages_sent.load(Ordering::Relaxed),
            self.messages_received.load(Ordering::Relaxed),
            self.bytes_sent.load(Ordering::Relaxed),
            self.bytes_received.load(Ordering::Relaxed),
            self.rejected_clients.load(Ordering::Relaxed),
        )
    }

    /// Print metrics to the log
    pub fn print_stats(&self) {
        tracing::info!(
            "Clients: {} | Msgs Sent: {} | Msgs Recv: {} | Bytes Sent: {} | Bytes Recv: {} | Rejected: {}",
            self.connected_clients.load(Ordering::Relaxed),
            self.messages_sent.load(Ordering::Relaxed),
            self.messages_received.load(Ordering::Relaxed),
            self.bytes_sent.load(Ordering::Relaxed),
            self.bytes_received.load(Ordering::Relaxed),
            self.rejected_clients.load(Ordering::Relaxed),
        );
    }
}

/// Start metrics reporting task
pub async fn start_metrics_reporter(metrics: Arc<ServerMetrics>, period: Duration) {
    let mut interval = tokio::time::interval(period);

    loop {
        interval.tick().await;
        metrics.print_stats();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prometheus_output_contains_counters() {
        let metrics = ServerMetrics::default();
        metrics.connected_clients.store(3, Ordering::Relaxed);
        metrics.rejected_clients.fetch_add(1, Ordering::Relaxed);

        let text = metrics.to_prometheus();
        assert!(text.contains("voicechat_connected_clients 3\n"));
        assert!(text.contains("voicechat_rejected_clients 1\n"));
        assert!(text.contains("voicechat_messages_sent 0\n"));
    }
}
