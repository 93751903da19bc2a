//! Draft session management
//!
//! A `DraftSession` is what the HTTP layer keeps per open wizard:
//! - the `WizardController` holding the draft and step position
//! - the `CaptureSession` recording the optional audio
//! - the fragment feed when the browser uploads recorder chunks

mod session;
mod stats;

pub use session::DraftSession;
pub use stats::{CaptureStatus, DraftStatus, FieldMessage, MediaSummary};
