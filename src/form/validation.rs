//! Memory draft schema
//!
//! Rules are checked in order per field and the first failing rule wins.
//! Lengths are counted in UTF-16 code units after trimming surrounding
//! whitespace, the unit browsers report for `string.length`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::draft::{Field, FormDraft, MediaValue};
use crate::error::ValidationErrors;

pub const TITLE_MIN_CHARS: usize = 3;
pub const TITLE_MAX_CHARS: usize = 60;
pub const DESCRIPTION_MIN_CHARS: usize = 10;
pub const DESCRIPTION_MAX_CHARS: usize = 2489;

/// Stable validation error identifiers, independent of display language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorCode {
    ImageRequired,
    TitleRequired,
    TitleMinLength,
    TitleMaxLength,
    DescriptionRequired,
    DescriptionMinLength,
    DescriptionMaxLength,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ImageRequired => "imageRequired",
            ErrorCode::TitleRequired => "titleRequired",
            ErrorCode::TitleMinLength => "titleMinLength",
            ErrorCode::TitleMaxLength => "titleMaxLength",
            ErrorCode::DescriptionRequired => "descriptionRequired",
            ErrorCode::DescriptionMinLength => "descriptionMinLength",
            ErrorCode::DescriptionMaxLength => "descriptionMaxLength",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn check_image(image: Option<&MediaValue>) -> Option<ErrorCode> {
    match image {
        Some(value) if value.is_present() => None,
        _ => Some(ErrorCode::ImageRequired),
    }
}

pub fn check_title(title: &str) -> Option<ErrorCode> {
    check_text(
        title,
        TITLE_MIN_CHARS,
        TITLE_MAX_CHARS,
        [
            ErrorCode::TitleRequired,
            ErrorCode::TitleMinLength,
            ErrorCode::TitleMaxLength,
        ],
    )
}

pub fn check_description(description: &str) -> Option<ErrorCode> {
    check_text(
        description,
        DESCRIPTION_MIN_CHARS,
        DESCRIPTION_MAX_CHARS,
        [
            ErrorCode::DescriptionRequired,
            ErrorCode::DescriptionMinLength,
            ErrorCode::DescriptionMaxLength,
        ],
    )
}

fn check_text(value: &str, min: usize, max: usize, codes: [ErrorCode; 3]) -> Option<ErrorCode> {
    let [required, too_short, too_long] = codes;
    let len = value.trim().encode_utf16().count();

    if len == 0 {
        Some(required)
    } else if len < min {
        Some(too_short)
    } else if len > max {
        Some(too_long)
    } else {
        None
    }
}

/// Fields checked by the gate of a wizard step
pub fn step_fields(step: u8) -> &'static [Field] {
    match step {
        1 => &[Field::Image],
        2 => &[Field::Title, Field::Description],
        _ => &[],
    }
}

fn check_field(draft: &FormDraft, field: Field) -> Option<ErrorCode> {
    match field {
        Field::Image => check_image(draft.image.as_ref()),
        Field::Title => check_title(&draft.title),
        Field::Description => check_description(&draft.description),
        Field::Audio => None,
    }
}

fn check_fields(draft: &FormDraft, fields: &[Field]) -> Result<(), ValidationErrors> {
    let errors: BTreeMap<Field, ErrorCode> = fields
        .iter()
        .filter_map(|&field| check_field(draft, field).map(|code| (field, code)))
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationErrors(errors))
    }
}

/// Run the schema of one step against the draft
pub fn validate_step(draft: &FormDraft, step: u8) -> Result<(), ValidationErrors> {
    check_fields(draft, step_fields(step))
}

/// Run every rule against the whole draft
pub fn validate_draft(draft: &FormDraft) -> Result<(), ValidationErrors> {
    check_fields(
        draft,
        &[Field::Image, Field::Title, Field::Description, Field::Audio],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::Upload;

    fn draft(title: &str, description: &str) -> FormDraft {
        FormDraft {
            image: Some(MediaValue::reference("https://cdn/x.png")),
            title: title.to_string(),
            description: description.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_title_rules_in_order() {
        assert_eq!(check_title(""), Some(ErrorCode::TitleRequired));
        assert_eq!(check_title("    "), Some(ErrorCode::TitleRequired));
        assert_eq!(check_title("Ab"), Some(ErrorCode::TitleMinLength));
        assert_eq!(check_title("  Ab  "), Some(ErrorCode::TitleMinLength));
        assert_eq!(check_title("Abc"), None);
        assert_eq!(check_title(&"x".repeat(60)), None);
        assert_eq!(check_title(&"x".repeat(61)), Some(ErrorCode::TitleMaxLength));
    }

    #[test]
    fn test_description_bounds() {
        assert_eq!(check_description(""), Some(ErrorCode::DescriptionRequired));
        assert_eq!(check_description("123456789"), Some(ErrorCode::DescriptionMinLength));
        assert_eq!(check_description("0123456789"), None);
        assert_eq!(check_description(&"d".repeat(2489)), None);
        assert_eq!(
            check_description(&"d".repeat(2490)),
            Some(ErrorCode::DescriptionMaxLength)
        );
    }

    #[test]
    fn test_lengths_count_utf16_units() {
        // three code units, six bytes
        assert_eq!(check_title("äöü"), None);
        assert_eq!(check_title(&"é".repeat(60)), None);

        // astral characters take two units each
        assert_eq!(check_title("🌊"), Some(ErrorCode::TitleMinLength));
        assert_eq!(check_title("🌊🌊"), None);
        assert_eq!(check_title(&"🌊".repeat(30)), None);
        assert_eq!(check_title(&"🌊".repeat(31)), Some(ErrorCode::TitleMaxLength));
        assert_eq!(check_title(&"🌊".repeat(60)), Some(ErrorCode::TitleMaxLength));
        assert_eq!(check_description("🌊🌊🌊🌊🌊"), None);
        assert_eq!(check_description("🌊🌊🌊🌊"), Some(ErrorCode::DescriptionMinLength));
    }

    #[test]
    fn test_emoji_title_passes_step_two() {
        let d = draft("🌊🌊", "We walked along the shore.");
        assert!(validate_step(&d, 2).is_ok());
    }

    #[test]
    fn test_image_presence() {
        assert_eq!(check_image(None), Some(ErrorCode::ImageRequired));
        assert_eq!(
            check_image(Some(&MediaValue::reference(""))),
            Some(ErrorCode::ImageRequired)
        );
        assert_eq!(
            check_image(Some(&MediaValue::Payload(Upload::new("a.png", "image/png", vec![])))),
            Some(ErrorCode::ImageRequired)
        );
        assert_eq!(
            check_image(Some(&MediaValue::Payload(Upload::new("a.png", "image/png", vec![1])))),
            None
        );
    }

    #[test]
    fn test_step_two_ignores_image() {
        let mut d = draft("Beach Trip", "We walked along the shore.");
        d.image = None;
        assert!(validate_step(&d, 2).is_ok());
        assert!(validate_step(&d, 1).is_err());
        assert!(validate_step(&d, 3).is_ok());
    }

    #[test]
    fn test_step_two_reports_only_failing_fields() {
        let d = draft("Ab", "0123456789");
        let errors = validate_step(&d, 2).unwrap_err();
        assert_eq!(errors.get(Field::Title), Some(ErrorCode::TitleMinLength));
        assert_eq!(errors.get(Field::Description), None);
    }

    #[test]
    fn test_full_schema_collects_every_field() {
        let errors = validate_draft(&FormDraft::default()).unwrap_err();
        assert_eq!(errors.get(Field::Image), Some(ErrorCode::ImageRequired));
        assert_eq!(errors.get(Field::Title), Some(ErrorCode::TitleRequired));
        assert_eq!(errors.get(Field::Description), Some(ErrorCode::DescriptionRequired));
        assert_eq!(errors.get(Field::Audio), None);
    }

    #[test]
    fn test_step_two_matches_length_predicate() {
        let lengths = [0usize, 1, 2, 3, 4, 9, 10, 11, 59, 60, 61, 2488, 2489, 2490];
        for &t in &lengths {
            for &d in &lengths {
                let draft = draft(&"t".repeat(t), &format!("  {}  ", "d".repeat(d)));
                let expected = (3..=60).contains(&t) && (10..=2489).contains(&d);
                assert_eq!(validate_step(&draft, 2).is_ok(), expected, "title={} description={}", t, d);
            }
        }
    }
}
