//! Display text for stable message codes

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};

/// Maps message codes to user-facing text
pub trait Localizer: Send + Sync {
    fn resolve(&self, code: &str) -> String;
}

pub const DEFAULT_LOCALE: &str = "en";

const ENGLISH: &[(&str, &str)] = &[
    ("imageRequired", "Please upload an image"),
    ("titleRequired", "Title is required"),
    ("titleMinLength", "Title must be at least 3 characters"),
    ("titleMaxLength", "Title can be at most 60 characters"),
    ("descriptionRequired", "Description is required"),
    ("descriptionMinLength", "Description must be at least 10 characters"),
    ("descriptionMaxLength", "Description can be at most 2489 characters"),
    ("fixErrorsBeforeSubmitting", "Please fix the errors before submitting"),
    ("ownerMissing", "Could not identify the owner for this memory."),
    ("submissionInProgress", "Your memory is already being saved"),
    ("somethingWentWrong", "Something went wrong!"),
    ("memoryCreated", "Memory created successfully!"),
    ("memoryCreatedFor", "Memory created for {name}"),
    ("memoryUpdated", "Memory updated successfully!"),
    ("memoryDeleted", "Memory deleted successfully!"),
    ("deviceUnavailable", "Microphone is not available"),
];

/// Locale tables with English fallback
///
/// Extra locales are JSON objects of `code -> text` stored as
/// `<dir>/<locale>.json`.
#[derive(Debug, Clone)]
pub struct Catalog {
    tables: HashMap<String, HashMap<String, String>>,
}

impl Default for Catalog {
    fn default() -> Self {
        let english = ENGLISH
            .iter()
            .map(|(code, text)| (code.to_string(), text.to_string()))
            .collect();

        let mut tables = HashMap::new();
        tables.insert(DEFAULT_LOCALE.to_string(), english);
        Self { tables }
    }
}

impl Catalog {
    /// Built-in English plus every `*.json` table found in `dir`
    pub fn load_dir(dir: &Path) -> Result<Self> {
        let mut catalog = Self::default();

        if !dir.exists() {
            warn!("Locale directory {:?} not found, using built-in English", dir);
            return Ok(catalog);
        }

        for entry in std::fs::read_dir(dir).with_context(|| format!("Failed to read {:?}", dir))? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(locale) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };

            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read locale file {:?}", path))?;
            let table: HashMap<String, String> = serde_json::from_str(&raw)
                .with_context(|| format!("Invalid locale file {:?}", path))?;

            info!("Loaded locale {} ({} messages)", locale, table.len());
            catalog.insert(locale, table);
        }

        Ok(catalog)
    }

    /// Add or extend a locale table
    pub fn insert(&mut self, locale: &str, table: HashMap<String, String>) {
        self.tables.entry(locale.to_string()).or_default().extend(table);
    }

    pub fn has_locale(&self, locale: &str) -> bool {
        self.tables.contains_key(locale)
    }

    /// Look up `code` in `locale`, then English, then return the code itself
    pub fn message(&self, locale: &str, code: &str) -> String {
        [locale, DEFAULT_LOCALE]
            .iter()
            .find_map(|l| self.tables.get(*l).and_then(|t| t.get(code)))
            .cloned()
            .unwrap_or_else(|| code.to_string())
    }

    /// Bind the catalog to one locale
    pub fn localizer<'a>(&'a self, locale: &'a str) -> LocaleView<'a> {
        LocaleView {
            catalog: self,
            locale,
        }
    }
}

impl Localizer for Catalog {
    fn resolve(&self, code: &str) -> String {
        self.message(DEFAULT_LOCALE, code)
    }
}

/// A catalog bound to one locale
pub struct LocaleView<'a> {
    catalog: &'a Catalog,
    locale: &'a str,
}

impl Localizer for LocaleView<'_> {
    fn resolve(&self, code: &str) -> String {
        self.catalog.message(self.locale, code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_english_is_built_in() {
        let catalog = Catalog::default();
        assert_eq!(catalog.resolve("titleRequired"), "Title is required");
    }

    #[test]
    fn test_missing_code_falls_back() {
        let mut catalog = Catalog::default();
        catalog.insert(
            "nl",
            HashMap::from([("titleRequired".to_string(), "Titel is verplicht".to_string())]),
        );

        let nl = catalog.localizer("nl");
        assert_eq!(nl.resolve("titleRequired"), "Titel is verplicht");
        assert_eq!(nl.resolve("imageRequired"), "Please upload an image");
        assert_eq!(nl.resolve("noSuchCode"), "noSuchCode");
        assert_eq!(catalog.localizer("fr").resolve("titleRequired"), "Title is required");
    }

    #[test]
    fn test_load_dir_reads_json_tables() -> Result<()> {
        let dir = tempfile::tempdir()?;
        std::fs::write(
            dir.path().join("es.json"),
            r#"{ "titleRequired": "El título es obligatorio" }"#,
        )?;
        std::fs::write(dir.path().join("notes.txt"), "ignored")?;

        let catalog = Catalog::load_dir(dir.path())?;
        assert!(catalog.has_locale("es"));
        assert!(!catalog.has_locale("notes"));
        assert_eq!(catalog.message("es", "titleRequired"), "El título es obligatorio");
        Ok(())
    }
}
