//! Event batcher / watcher (component C7): a debounced filesystem watcher
//! feeding a single-consumer batch processor, per spec §4.7. Replaces the
//! thread+mutex debounce timer named in §9 with a coalescing channel: a
//! tick drains all pending notifications and processes the directory once.

use std::path::{Path, PathBuf};

use notify::{EventKind, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::Config;
use crate::events::EventSink;
use crate::models::IntakeFile;
use crate::ocr::OcrBackend;
use crate::ocr::Rasterizer;
use crate::pipeline::Pipeline;

/// Spawn a `notify` watcher over the intake directory that forwards a
/// coalescing tick whenever a create/move event fires, adapted from the
/// `spawn_intake_watcher` wiring in the pack's receipt-pipeline example.
/// Modify events are ignored deliberately (§4.7): scanners emit repeated
/// modifies mid-copy, and create/move suffice.
pub fn spawn_watcher(
    watch_dir: &Path,
    tx: mpsc::UnboundedSender<()>,
) -> notify::Result<impl Watcher> {
    let mut watcher = notify::recommended_watcher(move |event: notify::Result<notify::Event>| {
        if let Ok(ev) = event {
            if matches!(ev.kind, EventKind::Create(_) | EventKind::Modify(notify::event::ModifyKind::Name(_))) {
                let _ = tx.send(());
            }
        }
    })?;
    watcher.watch(watch_dir, RecursiveMode::NonRecursive)?;
    Ok(watcher)
}

/// Run the debounce-and-batch loop forever: coalesce rapid-fire ticks into
/// a single `process_batch` call per quiet period, per §4.7 and §5's
/// single-logical-thread scheduling model.
pub async fn run_watch_loop(
    mut ticks: mpsc::UnboundedReceiver<()>,
    config: &Config,
    backend: &dyn OcrBackend,
    rasterizer: &Rasterizer,
    sink: &dyn EventSink,
) {
    while ticks.recv().await.is_some() {
        // Drain any further ticks that arrived while we were already
        // debouncing, then wait out the debounce window once more before
        // treating the burst as settled.
        drain_pending(&mut ticks);
        tokio::time::sleep(config.debounce()).await;
        drain_pending(&mut ticks);

        process_batch(config, backend, rasterizer, sink).await;
    }
}

fn drain_pending(ticks: &mut mpsc::UnboundedReceiver<()>) {
    while ticks.try_recv().is_ok() {}
}

/// §4.7's `process_batch`: sleep out the copy-settling window, enumerate
/// the intake directory, and process each surviving file with a bounded
/// read-probe retry loop.
pub async fn process_batch(
    config: &Config,
    backend: &dyn OcrBackend,
    rasterizer: &Rasterizer,
    sink: &dyn EventSink,
) {
    tokio::time::sleep(config.settle()).await;

    let pipeline = Pipeline::new(config, backend, rasterizer, sink);
    for path in list_intake_files(config) {
        if let Some(intake) = acquire_with_retry(&path, config).await {
            pipeline.process_one(&intake);
        } else {
            retry_fallback(config, &path, sink);
        }
    }
}

fn list_intake_files(config: &Config) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(config.intake_path()) else {
        return Vec::new();
    };
    let mut files: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .filter(|p| IntakeFile::from_path(p).is_some())
        .collect();
    files.sort();
    files
}

/// Retry up to `probe_retries` times, `probe_retry_delay` apart: open for
/// read and consume one byte. Returns `None` if the file disappeared mid
/// loop (already handled by another pass) or every retry found it locked.
async fn acquire_with_retry(path: &Path, config: &Config) -> Option<IntakeFile> {
    use std::io::Read;

    for _ in 0..config.probe_retries {
        if !path.exists() {
            return None;
        }
        if let Ok(mut file) = std::fs::File::open(path) {
            let mut one_byte = [0u8; 1];
            if file.read(&mut one_byte).is_ok() {
                return IntakeFile::from_path(path);
            }
        }
        tokio::time::sleep(config.probe_retry_delay()).await;
    }
    None
}

/// §4.7 step 3's retry-fallback, mirroring Router step 4 (Failed branch):
/// guarantees a file never stalls forever in intake because it stayed
/// locked through every probe retry. Emits a terminal `ProcessingEvent` the
/// same as the normal pipeline path, per §4.7 step 4.
fn retry_fallback(config: &Config, path: &Path, sink: &dyn EventSink) {
    use crate::models::ProcessingEvent;

    let original_filename = path.file_name().and_then(|n| n.to_str()).unwrap_or("unknown").to_string();
    let file_size = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);

    let Some(ext) = crate::models::InputExt::from_path(path) else {
        sink.emit(ProcessingEvent {
            original_filename,
            final_filename: None,
            file_size,
            status: "failed".to_string(),
            extracted_name: None,
            extracted_account: None,
            destination_path: None,
            error_message: Some("unsupported extension".to_string()),
            timestamp: chrono::Utc::now(),
        });
        return;
    };

    let fields = crate::models::ExtractedFields::default();
    let event = match crate::router::route(config, path, ext, &fields) {
        Ok(outcome) => ProcessingEvent {
            original_filename,
            final_filename: outcome.destination.file_name().and_then(|n| n.to_str()).map(String::from),
            file_size,
            status: outcome.decision.as_str().to_string(),
            extracted_name: None,
            extracted_account: None,
            destination_path: Some(outcome.destination),
            error_message: None,
            timestamp: chrono::Utc::now(),
        },
        Err(err) => ProcessingEvent {
            original_filename,
            final_filename: None,
            file_size,
            status: "failed".to_string(),
            extracted_name: None,
            extracted_account: None,
            destination_path: None,
            error_message: Some(err.to_string()),
            timestamp: chrono::Utc::now(),
        },
    };
    sink.emit(event);
}
