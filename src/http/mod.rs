//! HTTP API through which the browser drives memory wizards
//!
//! - POST /drafts - Open a wizard (new memory, or edit with `record_id`)
//! - GET|DELETE /drafts/:id - Inspect or close a wizard
//! - PATCH /drafts/:id/fields, PUT /drafts/:id/files/:field - Edit the draft
//! - POST /drafts/:id/advance|retreat - Step navigation
//! - POST /drafts/:id/recording/* - Audio recording control and fragment upload
//! - POST /drafts/:id/submit - Save the memory
//! - GET /memories?owner= - List a participant's memories
//! - DELETE /memories/:id - Delete a memory
//! - GET /media/* - Stored images and audio
//! - GET /health - Health check

mod error;
mod extract;
mod handlers;
mod routes;
mod state;

pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
