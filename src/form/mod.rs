//! Memory wizard
//!
//! This module provides the three-step memory form:
//! - `FormDraft`: the record being created or edited
//! - `validation`: per-step and full-draft schema with stable error codes
//! - `WizardController`: step navigation, validation gates and submission

mod draft;
pub mod validation;
mod wizard;

pub use draft::{Field, FieldUpdate, FormDraft, MediaField, MediaValue, Upload};
pub use validation::ErrorCode;
pub use wizard::{
    Navigation, Notice, PendingSubmit, SubmitReceipt, WizardController, WizardState, TOTAL_STEPS,
};
