//! Translation quality validation.
//!
//! Checks that translated strings preserve the elements that must survive
//! translation verbatim: C-style and Foundation format specifiers (`%@`,
//! `%lld`, `%1$@`, `%.2f`, ...) and `{name}`-style placeholders. Findings are
//! warnings only; the provider's output is never rejected.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;
use tracing::warn;

use crate::analyzer::TranslationRequest;
use crate::openai::TranslationResult;

/// Validation report for a single translated string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self {
            warnings: Vec::new(),
        }
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn is_clean(&self) -> bool {
        !self.has_warnings()
    }
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self::new()
    }
}

/// Validator for translated catalog strings.
pub struct TranslationValidator;

// Regex patterns for extraction (cached for performance)
static SPECIFIER_REGEX: OnceLock<Regex> = OnceLock::new();
static PLACEHOLDER_REGEX: OnceLock<Regex> = OnceLock::new();

impl TranslationValidator {
    /// Compare a translation against its source text.
    ///
    /// Specifier order may legitimately differ between languages (that is
    /// what positional forms like `%1$@` are for), so the comparison treats
    /// both sides as multisets.
    pub fn validate(source: &str, translated: &str) -> ValidationReport {
        let mut report = ValidationReport::new();

        let source_specifiers = Self::extract_specifiers(source);
        let translated_specifiers = Self::extract_specifiers(translated);
        if !same_multiset(&source_specifiers, &translated_specifiers) {
            report.warnings.push(format!(
                "Format specifier mismatch: source has {:?}, translation has {:?}",
                source_specifiers, translated_specifiers
            ));
        }

        let source_placeholders = Self::extract_placeholders(source);
        let translated_placeholders = Self::extract_placeholders(translated);
        if !same_multiset(&source_placeholders, &translated_placeholders) {
            report.warnings.push(format!(
                "Placeholder mismatch: source has {:?}, translation has {:?}",
                source_placeholders, translated_placeholders
            ));
        }

        report
    }

    /// Extract format specifiers from text. `%%` is a literal percent sign
    /// and never counts.
    fn extract_specifiers(text: &str) -> Vec<String> {
        let regex = SPECIFIER_REGEX.get_or_init(|| {
            Regex::new(r"%(?:\d+\$)?[-+#0]*\d*(?:\.\d+)?(?:hh?|ll?|[qLzjt])?[@diouxXeEfgGaAcCsSpn]")
                .unwrap()
        });

        let text = text.replace("%%", "");
        regex
            .find_iter(&text)
            .map(|m| m.as_str().to_string())
            .collect()
    }

    /// Extract `{name}`-style placeholders from text
    fn extract_placeholders(text: &str) -> Vec<String> {
        let regex = PLACEHOLDER_REGEX.get_or_init(|| Regex::new(r"\{[A-Za-z0-9_]+\}").unwrap());

        regex
            .find_iter(text)
            .map(|m| m.as_str().to_string())
            .collect()
    }
}

fn same_multiset(left: &[String], right: &[String]) -> bool {
    let mut left = left.to_vec();
    let mut right = right.to_vec();
    left.sort_unstable();
    right.sort_unstable();
    left == right
}

/// Validate every returned translation against the text that was sent for
/// its key, logging each finding. Returns the total warning count.
pub fn validate_batch(requests: &[TranslationRequest], results: &[TranslationResult]) -> usize {
    let sources: HashMap<&str, &str> = requests
        .iter()
        .map(|request| (request.key.as_str(), request.text.as_str()))
        .collect();

    let mut total = 0;
    for result in results {
        let Some(source) = sources.get(result.key.as_str()) else {
            continue;
        };
        for (language, text) in &result.translations {
            let report = TranslationValidator::validate(source, text);
            for warning in &report.warnings {
                warn!("{} ({}): {}", result.key, language, warning);
            }
            total += report.warnings.len();
        }
    }
    total
}
