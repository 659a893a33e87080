//! Catalog analysis: works out which keys and languages need translation.

use std::collections::HashMap;

use indexmap::IndexMap;
use serde::Serialize;
use tracing::debug;

use crate::catalog::{Localization, StringCatalog, TranslationState};

/// One key's worth of work for the translation provider.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranslationRequest {
    pub key: String,
    pub text: String,
    #[serde(rename = "targetLanguages")]
    pub target_languages: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// Which languages a key is missing, and whether each one had no localization
/// at all before this run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TranslationNeed {
    pub languages: Vec<String>,
    pub is_new: HashMap<String, bool>,
}

/// Output of [`analyze`]. `catalog` is a working copy with stale entries
/// removed; the input catalog is never touched.
#[derive(Debug)]
pub struct AnalysisResult {
    pub catalog: StringCatalog,
    pub requests: Vec<TranslationRequest>,
    pub needs: HashMap<String, TranslationNeed>,
    pub stale_removed: Vec<String>,
    pub key_fallbacks: usize,
    pub modified: bool,
}

/// Walk the catalog in key order and collect everything worth translating.
///
/// Stale entries are dropped from the working copy and recorded. Entries with
/// `shouldTranslate = false` are skipped without being touched. For everything
/// else, each target language is checked individually; a batch request is
/// emitted per key that has at least one language missing. Source text comes
/// from the source-language localization when it has a non-empty value,
/// otherwise the key itself is sent and the fallback counter goes up.
pub fn analyze(
    catalog: &StringCatalog,
    target_languages: &[String],
    source_language: Option<&str>,
) -> AnalysisResult {
    let mut working = catalog.clone();
    let mut requests = Vec::new();
    let mut needs: HashMap<String, TranslationNeed> = HashMap::new();
    let mut stale_removed = Vec::new();
    let mut key_fallbacks = 0usize;
    let mut modified = false;

    let keys: Vec<String> = working.strings.keys().cloned().collect();
    for key in keys {
        let Some(entry) = working.strings.get_mut(&key) else {
            continue;
        };

        if entry.is_stale() {
            working.strings.shift_remove(&key);
            debug!("Removing stale key {:?}", key);
            stale_removed.push(key);
            modified = true;
            continue;
        }

        if !entry.is_translatable() {
            debug!("Skipping {:?}: shouldTranslate is false", key);
            continue;
        }

        let comment = entry.comment.clone();
        let localizations = entry.localizations.get_or_insert_with(IndexMap::new);

        // Target order is the caller's order, not the catalog's.
        let mut languages = Vec::new();
        let mut is_new = HashMap::new();
        for language in target_languages {
            match localizations.get(language) {
                None => {
                    languages.push(language.clone());
                    is_new.insert(language.clone(), true);
                }
                Some(localization) if needs_translation(localization) => {
                    languages.push(language.clone());
                    is_new.insert(language.clone(), false);
                }
                Some(_) => {}
            }
        }

        if languages.is_empty() {
            continue;
        }

        let source_value = source_language
            .and_then(|code| localizations.get(code))
            .and_then(Localization::value)
            .map(str::trim)
            .filter(|text| !text.is_empty());

        let text = match source_value {
            Some(text) => text.to_string(),
            None => {
                key_fallbacks += 1;
                key.clone()
            }
        };

        debug!("Key {:?} needs {:?}", key, languages);
        needs.insert(
            key.clone(),
            TranslationNeed {
                languages: languages.clone(),
                is_new,
            },
        );
        requests.push(TranslationRequest {
            key,
            text,
            target_languages: languages,
            comment,
        });
    }

    AnalysisResult {
        catalog: working,
        requests,
        needs,
        stale_removed,
        key_fallbacks,
        modified,
    }
}

/// A language needs work when its value is missing or blank, or when Xcode
/// has flagged the translation for review.
fn needs_translation(localization: &Localization) -> bool {
    match &localization.string_unit {
        None => true,
        Some(unit) => {
            unit.state == TranslationState::NeedsReview
                || unit.value.as_deref().map_or(true, |value| value.trim().is_empty())
        }
    }
}
