use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Notify};
use tracing::{debug, info};

use super::device::{CaptureDevice, DeviceControl, DeviceHandle, Fragment};
use crate::error::CaptureError;

const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Replays an encoded audio file as a live recording
///
/// The file is cut into `fragment_bytes` pieces delivered every `interval`.
/// The stream ends on its own once the file is exhausted.
pub struct FileDevice {
    name: String,
    path: PathBuf,
    fragment_bytes: usize,
    interval: Duration,
    buffer: usize,
    in_use: Arc<AtomicBool>,
}

impl FileDevice {
    pub fn new(path: impl Into<PathBuf>, fragment_bytes: usize, interval: Duration) -> Self {
        let path = path.into();
        Self {
            name: format!("file:{}", path.display()),
            path,
            fragment_bytes: fragment_bytes.max(1),
            // tokio intervals must have a non-zero period
            interval: interval.max(MIN_INTERVAL),
            buffer: 100,
            in_use: Arc::new(AtomicBool::new(false)),
        }
    }
}

struct Signals {
    paused: AtomicBool,
    finished: AtomicBool,
    wake: Notify,
}

#[async_trait]
impl CaptureDevice for FileDevice {
    async fn acquire(&self) -> Result<DeviceHandle, CaptureError> {
        if self.in_use.swap(true, Ordering::SeqCst) {
            return Err(CaptureError::DeviceUnavailable(format!(
                "{} is already in use",
                self.name
            )));
        }

        let data = match tokio::fs::read(&self.path).await {
            Ok(data) => data,
            Err(e) => {
                self.in_use.store(false, Ordering::SeqCst);
                return Err(CaptureError::DeviceUnavailable(format!(
                    "cannot open {:?}: {}",
                    self.path, e
                )));
            }
        };

        info!(
            "Replaying {:?} ({} bytes, {} byte fragments every {:?})",
            self.path,
            data.len(),
            self.fragment_bytes,
            self.interval
        );

        let signals = Arc::new(Signals {
            paused: AtomicBool::new(false),
            finished: AtomicBool::new(false),
            wake: Notify::new(),
        });

        let (tx, rx) = mpsc::channel(self.buffer);
        let task_signals = Arc::clone(&signals);
        let fragment_bytes = self.fragment_bytes;
        let interval = self.interval;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            let mut pieces = data.chunks(fragment_bytes).enumerate();

            loop {
                tokio::select! {
                    _ = task_signals.wake.notified() => {}
                    _ = ticker.tick() => {}
                }

                if task_signals.finished.load(Ordering::SeqCst) {
                    break;
                }
                if task_signals.paused.load(Ordering::SeqCst) {
                    continue;
                }

                let Some((seq, piece)) = pieces.next() else {
                    debug!("Replay file exhausted");
                    break;
                };

                let fragment = Fragment {
                    seq: seq as u64,
                    bytes: piece.to_vec(),
                };
                if tx.send(fragment).await.is_err() {
                    break;
                }
            }

            debug!("Replay task stopped");
        });

        Ok(DeviceHandle::new(
            self.name.clone(),
            rx,
            Box::new(FileControl {
                signals,
                in_use: Arc::clone(&self.in_use),
            }),
        ))
    }

    fn in_use(&self) -> bool {
        self.in_use.load(Ordering::SeqCst)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

struct FileControl {
    signals: Arc<Signals>,
    in_use: Arc<AtomicBool>,
}

impl DeviceControl for FileControl {
    fn set_paused(&self, paused: bool) {
        self.signals.paused.store(paused, Ordering::SeqCst);
    }

    fn finish(&self) {
        self.signals.finished.store(true, Ordering::SeqCst);
        self.signals.wake.notify_one();
    }

    fn release(&self) {
        self.finish();
        self.in_use.store(false, Ordering::SeqCst);
    }
}
