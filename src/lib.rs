pub mod capture;
pub mod config;
pub mod error;
pub mod form;
pub mod http;
pub mod i18n;
pub mod identity;
pub mod session;
pub mod storage;

pub use capture::{
    Artifact, CaptureConfig, CaptureDevice, CaptureSession, CaptureState, DeviceHandle, FileDevice,
    Fragment, FragmentFeed, PushDevice,
};
pub use config::Config;
pub use error::{CaptureError, PersistenceError, SubmitError, ValidationErrors};
pub use form::{
    ErrorCode, Field, FieldUpdate, FormDraft, MediaField, MediaValue, Upload, WizardController,
};
pub use http::{create_router, AppState};
pub use i18n::{Catalog, Localizer};
pub use identity::{IdentityResolver, OwnerId, Participant, Profile, Role, SessionContext};
pub use session::{DraftSession, DraftStatus};
pub use storage::{LocalStore, MemoryRecord, Persistence, RecordId, StorageConfig};
