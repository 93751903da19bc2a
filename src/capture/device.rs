use async_trait::async_trait;
use std::fmt;
use tokio::sync::mpsc;
use tracing::debug;

use crate::error::CaptureError;

/// One chunk of encoded audio as delivered by the device
#[derive(Clone, PartialEq, Eq)]
pub struct Fragment {
    /// Device-assigned sequence number, starting at 0 for each acquisition
    pub seq: u64,
    pub bytes: Vec<u8>,
}

impl fmt::Debug for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fragment")
            .field("seq", &self.seq)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Control side of an acquired device
pub trait DeviceControl: Send {
    /// Stop or restart fragment delivery without ending the stream
    fn set_paused(&self, paused: bool);

    /// End the stream; the fragment channel closes after any trailing fragments
    fn finish(&self);

    /// Give the input back to the device
    fn release(&self);
}

/// Exclusive ownership of an acquired audio input
///
/// Fragments arrive as messages on an mpsc channel. The input is released
/// exactly once, either explicitly or when the handle is dropped.
pub struct DeviceHandle {
    device: String,
    fragments: mpsc::Receiver<Fragment>,
    control: Box<dyn DeviceControl>,
    released: bool,
}

impl DeviceHandle {
    pub fn new(
        device: impl Into<String>,
        fragments: mpsc::Receiver<Fragment>,
        control: Box<dyn DeviceControl>,
    ) -> Self {
        Self {
            device: device.into(),
            fragments,
            control,
            released: false,
        }
    }

    pub fn device_name(&self) -> &str {
        &self.device
    }

    /// Next fragment already delivered, without waiting
    pub(crate) fn try_next(&mut self) -> Option<Fragment> {
        self.fragments.try_recv().ok()
    }

    /// Wait for the next fragment; `None` once the stream has ended
    pub(crate) async fn next(&mut self) -> Option<Fragment> {
        self.fragments.recv().await
    }

    pub(crate) fn set_paused(&self, paused: bool) {
        self.control.set_paused(paused);
    }

    pub(crate) fn finish(&self) {
        self.control.finish();
    }

    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.control.release();
        self.fragments.close();
        debug!("Released capture device {}", self.device);
    }
}

impl Drop for DeviceHandle {
    fn drop(&mut self) {
        self.release();
    }
}

/// Audio input that can be acquired by one capture session at a time
///
/// Implementations:
/// - `PushDevice`: fragments pushed in from outside (browser uploads)
/// - `FileDevice`: replays a file in fixed-size fragments
#[async_trait]
pub trait CaptureDevice: Send + Sync {
    /// Acquire the input; fails with `DeviceUnavailable` when absent, busy or denied
    async fn acquire(&self) -> Result<DeviceHandle, CaptureError>;

    /// Whether a handle is currently held
    fn in_use(&self) -> bool;

    /// Device name for logging
    fn name(&self) -> &str;
}
