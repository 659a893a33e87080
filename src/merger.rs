//! Merges provider results back into the working catalog.

use std::collections::HashMap;

use indexmap::IndexMap;
use tracing::warn;

use crate::analyzer::TranslationNeed;
use crate::catalog::{StringCatalog, StringUnit, TranslationState};
use crate::openai::TranslationResult;

/// Every change made during a run, as display identifiers of the form
/// `key (language)`, in the order the provider returned them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeLedger {
    pub added: Vec<String>,
    pub updated: Vec<String>,
    pub stale_removed: Vec<String>,
}

impl ChangeLedger {
    pub fn has_changes(&self) -> bool {
        self.total() > 0
    }

    /// True when the merge itself wrote translations, stale removal aside.
    pub fn wrote_translations(&self) -> bool {
        !self.added.is_empty() || !self.updated.is_empty()
    }

    pub fn total(&self) -> usize {
        self.added.len() + self.updated.len() + self.stale_removed.len()
    }
}

/// Write provider results into the catalog, in response order.
///
/// Results for keys the analysis never flagged and languages outside a key's
/// requested set are logged and skipped; one bad item never aborts the run.
/// Each applied translation overwrites the string unit with state
/// `translated`, even when the text came back empty.
pub fn apply_translations(
    catalog: &mut StringCatalog,
    needs: &HashMap<String, TranslationNeed>,
    results: &[TranslationResult],
    stale_removed: Vec<String>,
) -> ChangeLedger {
    let mut ledger = ChangeLedger {
        stale_removed,
        ..Default::default()
    };

    for result in results {
        let Some(need) = needs.get(&result.key) else {
            warn!("Ignoring translations for unknown key {:?}", result.key);
            continue;
        };
        let Some(entry) = catalog.strings.get_mut(&result.key) else {
            warn!("Ignoring translations for key {:?} missing from catalog", result.key);
            continue;
        };
        let localizations = entry.localizations.get_or_insert_with(IndexMap::new);

        for (language, text) in &result.translations {
            if !need.languages.iter().any(|needed| needed == language) {
                warn!(
                    "Ignoring unrequested language {:?} for key {:?}",
                    language, result.key
                );
                continue;
            }

            let localization = localizations.entry(language.clone()).or_default();
            localization.string_unit = Some(StringUnit {
                state: TranslationState::Translated,
                value: Some(text.clone()),
                extra: serde_json::Map::new(),
            });

            let identifier = format!("{} ({})", result.key, language);
            if need.is_new.get(language).copied().unwrap_or(false) {
                ledger.added.push(identifier);
            } else {
                ledger.updated.push(identifier);
            }
        }
    }

    ledger
}
