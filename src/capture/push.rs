use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::device::{CaptureDevice, DeviceControl, DeviceHandle, Fragment};
use crate::error::CaptureError;

struct PushShared {
    name: String,
    buffer: usize,
    permitted: AtomicBool,
    in_use: AtomicBool,
    paused: AtomicBool,
    next_seq: AtomicU64,
    sender: Mutex<Option<mpsc::Sender<Fragment>>>,
}

impl PushShared {
    fn sender(&self) -> MutexGuard<'_, Option<mpsc::Sender<Fragment>>> {
        // A poisoned slot only means a panic elsewhere; the Option is still usable
        match self.sender.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// Device fed from outside, e.g. recorder chunks uploaded by the browser
#[derive(Clone)]
pub struct PushDevice {
    shared: Arc<PushShared>,
}

impl PushDevice {
    pub fn new(name: impl Into<String>, buffer: usize) -> Self {
        Self {
            shared: Arc::new(PushShared {
                name: name.into(),
                buffer: buffer.max(1),
                permitted: AtomicBool::new(true),
                in_use: AtomicBool::new(false),
                paused: AtomicBool::new(false),
                next_seq: AtomicU64::new(0),
                sender: Mutex::new(None),
            }),
        }
    }

    /// Grant or deny microphone permission
    pub fn set_permission(&self, permitted: bool) {
        self.shared.permitted.store(permitted, Ordering::SeqCst);
    }

    pub fn feed(&self) -> FragmentFeed {
        FragmentFeed {
            shared: Arc::clone(&self.shared),
        }
    }
}

#[async_trait]
impl CaptureDevice for PushDevice {
    async fn acquire(&self) -> Result<DeviceHandle, CaptureError> {
        let shared = &self.shared;

        if !shared.permitted.load(Ordering::SeqCst) {
            return Err(CaptureError::DeviceUnavailable(format!(
                "permission denied for {}",
                shared.name
            )));
        }

        if shared.in_use.swap(true, Ordering::SeqCst) {
            return Err(CaptureError::DeviceUnavailable(format!(
                "{} is already in use",
                shared.name
            )));
        }

        let (tx, rx) = mpsc::channel(shared.buffer);
        shared.paused.store(false, Ordering::SeqCst);
        shared.next_seq.store(0, Ordering::SeqCst);
        *shared.sender() = Some(tx);

        info!("Acquired push device {}", shared.name);

        Ok(DeviceHandle::new(
            shared.name.clone(),
            rx,
            Box::new(PushControl {
                shared: Arc::clone(shared),
            }),
        ))
    }

    fn in_use(&self) -> bool {
        self.shared.in_use.load(Ordering::SeqCst)
    }

    fn name(&self) -> &str {
        &self.shared.name
    }
}

struct PushControl {
    shared: Arc<PushShared>,
}

impl DeviceControl for PushControl {
    fn set_paused(&self, paused: bool) {
        self.shared.paused.store(paused, Ordering::SeqCst);
    }

    fn finish(&self) {
        // Dropping the sender closes the channel once queued fragments are read
        self.shared.sender().take();
    }

    fn release(&self) {
        self.shared.sender().take();
        self.shared.paused.store(false, Ordering::SeqCst);
        self.shared.in_use.store(false, Ordering::SeqCst);
        info!("Released push device {}", self.shared.name);
    }
}

/// Producer side of a `PushDevice`
#[derive(Clone)]
pub struct FragmentFeed {
    shared: Arc<PushShared>,
}

impl FragmentFeed {
    /// Deliver one fragment
    ///
    /// Returns `Ok(false)` when the recording is paused and the fragment was
    /// dropped, as a paused recorder produces no data.
    pub async fn push(&self, bytes: Vec<u8>) -> Result<bool, CaptureError> {
        let sender = self.shared.sender().clone();
        let Some(sender) = sender else {
            return Err(CaptureError::NotCapturing(self.shared.name.clone()));
        };

        if self.shared.paused.load(Ordering::SeqCst) {
            debug!("Dropping {} byte fragment: recording paused", bytes.len());
            return Ok(false);
        }

        let seq = self.shared.next_seq.fetch_add(1, Ordering::SeqCst);
        let len = bytes.len();

        if sender.send(Fragment { seq, bytes }).await.is_err() {
            warn!("Fragment {} arrived after {} was released", seq, self.shared.name);
            return Err(CaptureError::NotCapturing(self.shared.name.clone()));
        }

        debug!("Pushed fragment {} ({} bytes) to {}", seq, len, self.shared.name);
        Ok(true)
    }
}
