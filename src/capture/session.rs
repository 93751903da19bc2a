use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::config::CaptureConfig;
use super::device::{CaptureDevice, DeviceHandle, Fragment};
use crate::error::CaptureError;
use crate::form::Upload;

/// Lifecycle state of a capture session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureState {
    Idle,
    Recording,
    Paused,
    Stopped,
}

impl fmt::Display for CaptureState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CaptureState::Idle => "idle",
            CaptureState::Recording => "recording",
            CaptureState::Paused => "paused",
            CaptureState::Stopped => "stopped",
        };
        f.write_str(s)
    }
}

/// Finished recording: all fragments concatenated in arrival order
#[derive(Clone, PartialEq, Eq)]
pub struct Artifact {
    pub bytes: Vec<u8>,
    pub media_type: String,
    pub fragment_count: usize,
}

impl Artifact {
    /// Turn the artifact into an upload payload named after its media type
    pub fn into_upload(self) -> Upload {
        let extension = self
            .media_type
            .split('/')
            .nth(1)
            .and_then(|sub| sub.split(';').next())
            .filter(|ext| !ext.is_empty())
            .unwrap_or("bin")
            .to_string();
        Upload::new(format!("audio.{}", extension), self.media_type, self.bytes)
    }
}

impl fmt::Debug for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Artifact")
            .field("media_type", &self.media_type)
            .field("fragment_count", &self.fragment_count)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Single audio recording: start, pause/resume, stop or discard
///
/// State machine:
/// - Idle --start--> Recording
/// - Recording --pause--> Paused --resume--> Recording
/// - Recording/Paused --stop--> Stopped (produces the artifact)
/// - any --discard--> Idle
///
/// Out-of-order calls return `CaptureError::InvalidState` and change nothing.
pub struct CaptureSession {
    device: Arc<dyn CaptureDevice>,
    config: CaptureConfig,
    state: CaptureState,
    chunks: Vec<Fragment>,
    handle: Option<DeviceHandle>,
}

impl CaptureSession {
    pub fn new(device: Arc<dyn CaptureDevice>, config: CaptureConfig) -> Self {
        Self {
            device,
            config,
            state: CaptureState::Idle,
            chunks: Vec::new(),
            handle: None,
        }
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    pub fn fragment_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn recorded_bytes(&self) -> usize {
        self.chunks.iter().map(|c| c.bytes.len()).sum()
    }

    /// Whether the session currently holds the device
    pub fn has_device(&self) -> bool {
        self.handle.is_some()
    }

    pub fn device_name(&self) -> &str {
        self.device.name()
    }

    fn invalid(&self, operation: &'static str) -> CaptureError {
        warn!("Rejected {} while {}", operation, self.state);
        CaptureError::InvalidState {
            operation,
            state: self.state,
        }
    }

    /// Acquire the device and begin recording
    pub async fn start(&mut self) -> Result<(), CaptureError> {
        if self.state != CaptureState::Idle {
            return Err(self.invalid("start"));
        }

        info!("Starting recording on {}", self.device.name());

        let handle = match self.device.acquire().await {
            Ok(handle) => handle,
            Err(e) => {
                warn!("Could not start recording: {}", e);
                return Err(e);
            }
        };

        self.chunks.clear();
        self.handle = Some(handle);
        self.state = CaptureState::Recording;

        info!("Recording started");
        Ok(())
    }

    /// Append fragments the device has already delivered
    ///
    /// Only collects while recording; anything delivered around a pause
    /// stays queued in arrival order until recording resumes or stops.
    pub fn collect_pending(&mut self) -> usize {
        if self.state != CaptureState::Recording {
            return 0;
        }
        let Some(handle) = self.handle.as_mut() else {
            return 0;
        };

        let mut collected = 0;
        while let Some(fragment) = handle.try_next() {
            debug!("Fragment {} ({} bytes)", fragment.seq, fragment.bytes.len());
            self.chunks.push(fragment);
            collected += 1;
        }
        collected
    }

    pub fn pause(&mut self) -> Result<(), CaptureError> {
        if self.state != CaptureState::Recording {
            return Err(self.invalid("pause"));
        }

        self.collect_pending();
        if let Some(handle) = &self.handle {
            handle.set_paused(true);
        }
        self.state = CaptureState::Paused;

        info!("Recording paused ({} fragments)", self.chunks.len());
        Ok(())
    }

    pub fn resume(&mut self) -> Result<(), CaptureError> {
        if self.state != CaptureState::Paused {
            return Err(self.invalid("resume"));
        }

        if let Some(handle) = &self.handle {
            handle.set_paused(false);
        }
        self.state = CaptureState::Recording;

        info!("Recording resumed");
        Ok(())
    }

    /// Finish the recording and return the concatenated artifact
    pub async fn stop(&mut self) -> Result<Artifact, CaptureError> {
        if !matches!(self.state, CaptureState::Recording | CaptureState::Paused) {
            return Err(self.invalid("stop"));
        }
        let Some(mut handle) = self.handle.take() else {
            return Err(self.invalid("stop"));
        };

        // Everything queued so far was delivered before stop, including
        // fragments that raced with a pause
        while let Some(fragment) = handle.try_next() {
            self.chunks.push(fragment);
        }

        handle.finish();
        let timeout = self.config.finish_timeout();
        let flushed = tokio::time::timeout(timeout, async {
            while let Some(fragment) = handle.next().await {
                self.chunks.push(fragment);
            }
        })
        .await;

        if flushed.is_err() {
            warn!(
                "{} did not end its stream within {:?}; keeping {} fragments",
                handle.device_name(),
                timeout,
                self.chunks.len()
            );
        }

        handle.release();
        self.state = CaptureState::Stopped;

        let bytes: Vec<u8> = self
            .chunks
            .iter()
            .flat_map(|c| c.bytes.iter().copied())
            .collect();

        info!(
            "Recording stopped: {} fragments, {} bytes",
            self.chunks.len(),
            bytes.len()
        );

        Ok(Artifact {
            bytes,
            media_type: self.config.media_type.clone(),
            fragment_count: self.chunks.len(),
        })
    }

    /// Release the device, drop collected fragments and return to Idle
    pub fn discard(&mut self) {
        if let Some(mut handle) = self.handle.take() {
            handle.release();
        }
        let dropped = self.chunks.len();
        self.chunks.clear();
        self.state = CaptureState::Idle;

        info!("Recording discarded ({} fragments dropped)", dropped);
    }
}
