//! Audio capture
//!
//! This module provides the `CaptureSession` state machine around a single
//! audio input, plus the devices it can be driven by:
//! - `PushDevice`: recorder chunks pushed in from the browser
//! - `FileDevice`: file replay for demos and tests

mod config;
mod device;
mod file;
mod push;
mod session;

pub use config::{build_device, CaptureConfig, DeviceKind};
pub use device::{CaptureDevice, DeviceControl, DeviceHandle, Fragment};
pub use file::FileDevice;
pub use push::{FragmentFeed, PushDevice};
pub use session::{Artifact, CaptureSession, CaptureState};
