//! Event sink (component C8): a write-only interface the pipeline emits
//! terminal `ProcessingEvent`s to. A failure in the sink must never prevent
//! file routing (spec §4.8).

use crate::models::ProcessingEvent;

/// Write-only sink for processing events. Implementations must not block
/// the caller meaningfully nor propagate failures back into the pipeline.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: ProcessingEvent);
}

/// Logs each event at `info` level via structured fields. The default sink
/// when no external statistics store is configured.
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: ProcessingEvent) {
        tracing::info!(
            original_filename = %event.original_filename,
            final_filename = event.final_filename.as_deref().unwrap_or(""),
            status = %event.status,
            extracted_name = event.extracted_name.as_deref().unwrap_or(""),
            extracted_account = event.extracted_account.as_deref().unwrap_or(""),
            "processing event"
        );
    }
}

/// Forwards events over a channel, for callers (tests, the statistics
/// store) that want to observe them without coupling to the pipeline.
pub struct ChannelSink {
    tx: tokio::sync::mpsc::UnboundedSender<ProcessingEvent>,
}

impl ChannelSink {
    pub fn new() -> (Self, tokio::sync::mpsc::UnboundedReceiver<ProcessingEvent>) {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl EventSink for ChannelSink {
    fn emit(&self, event: ProcessingEvent) {
        // Receiver dropped is not the pipeline's problem; events are
        // best-effort per the sink contract.
        let _ = self.tx.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample_event() -> ProcessingEvent {
        ProcessingEvent {
            original_filename: "scan.pdf".into(),
            final_filename: Some("DOE_123.pdf".into()),
            file_size: 10,
            status: "fully_indexed".into(),
            extracted_name: Some("DOE".into()),
            extracted_account: Some("123".into()),
            destination_path: None,
            error_message: None,
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn channel_sink_forwards_event() {
        let (sink, mut rx) = ChannelSink::new();
        sink.emit(sample_event());
        let received = rx.recv().await.unwrap();
        assert_eq!(received.original_filename, "scan.pdf");
    }

    #[test]
    fn tracing_sink_does_not_panic_on_missing_optional_fields() {
        let sink = TracingSink;
        let mut event = sample_event();
        event.final_filename = None;
        sink.emit(event);
    }
}
