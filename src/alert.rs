use tracing::warn;

/// User-visible, blocking notification.
pub trait AlertSink: Send + Sync {
    fn alert(&self, message: &str);
}

#[derive(Debug, Default)]
pub struct TracingAlertSink;

impl AlertSink for TracingAlertSink {
    fn alert(&self, message: &str) {
        warn!(target: "alert", "{message}");
    }
}
