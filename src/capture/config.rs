use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use super::device::CaptureDevice;
use super::file::FileDevice;
use super::push::{FragmentFeed, PushDevice};

/// Which device backs new capture sessions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    /// Fragments uploaded by the browser's recorder
    Push,
    /// Replay of `replay_file` (demos and smoke tests)
    File,
}

/// Configuration for audio capture
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Media type the finished artifact is tagged with
    pub media_type: String,

    /// Capacity of the device fragment channel
    pub fragment_buffer: usize,

    /// How long `stop` waits for the device to flush trailing fragments
    pub finish_timeout_ms: u64,

    pub device: DeviceKind,

    /// Source file for `DeviceKind::File`
    pub replay_file: Option<PathBuf>,

    /// Fragment size for `DeviceKind::File`
    pub replay_fragment_bytes: usize,

    /// Delivery interval for `DeviceKind::File`; zero is raised to 1 ms
    pub replay_interval_ms: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            media_type: "audio/webm".to_string(),
            fragment_buffer: 100,
            finish_timeout_ms: 2000,
            device: DeviceKind::Push,
            replay_file: None,
            replay_fragment_bytes: 4096,
            replay_interval_ms: 100,
        }
    }
}

impl CaptureConfig {
    pub fn finish_timeout(&self) -> Duration {
        Duration::from_millis(self.finish_timeout_ms)
    }
}

/// A device for one capture session, with its feed when fragments are pushed in
pub fn build_device(config: &CaptureConfig, name: &str) -> (Arc<dyn CaptureDevice>, Option<FragmentFeed>) {
    match (config.device, &config.replay_file) {
        (DeviceKind::File, Some(path)) => {
            let device = FileDevice::new(
                path.clone(),
                config.replay_fragment_bytes,
                Duration::from_millis(config.replay_interval_ms),
            );
            (Arc::new(device), None)
        }
        // No replay file configured: behave like an absent input so `start`
        // reports the device as unavailable
        (DeviceKind::File, None) => {
            let device = PushDevice::new(name, config.fragment_buffer);
            device.set_permission(false);
            (Arc::new(device), None)
        }
        (DeviceKind::Push, _) => {
            let device = PushDevice::new(name, config.fragment_buffer);
            let feed = device.feed();
            (Arc::new(device), Some(feed))
        }
    }
}
