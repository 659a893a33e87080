//! Run reporting: a log summary plus an optional Markdown report suitable
//! for pasting into a pull request.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::info;

use crate::analyzer::{TranslationNeed, TranslationRequest};
use crate::merger::ChangeLedger;

/// Log a one-run summary at info level.
pub fn log_summary(ledger: &ChangeLedger, key_fallbacks: usize) {
    info!(
        "Catalog changes: {} added, {} updated, {} stale removed",
        ledger.added.len(),
        ledger.updated.len(),
        ledger.stale_removed.len()
    );
    if key_fallbacks > 0 {
        info!(
            "{} key(s) had no source-language text; the key itself was used as source",
            key_fallbacks
        );
    }
}

/// One listing line for a pending request: the key, the source text that
/// would be sent, and each target language marked new or update.
pub fn format_request_line(request: &TranslationRequest, need: Option<&TranslationNeed>) -> String {
    let languages: Vec<String> = request
        .target_languages
        .iter()
        .map(|language| {
            let is_new = need
                .and_then(|need| need.is_new.get(language))
                .copied()
                .unwrap_or(true);
            format!("{} ({})", language, if is_new { "new" } else { "update" })
        })
        .collect();
    format!(
        "{:?} ({:?}) -> {}",
        request.key,
        request.text,
        languages.join(", ")
    )
}

/// Render a Markdown report of everything the run changed.
pub fn render_markdown(ledger: &ChangeLedger, key_fallbacks: usize, model: &str) -> String {
    let mut report = String::new();
    report.push_str("## Localization update\n\n");
    report.push_str(&format!(
        "Generated on {} by {}.\n",
        Utc::now().format("%Y-%m-%d %H:%M UTC"),
        model
    ));

    if !ledger.has_changes() {
        report.push_str("\nNo catalog changes.\n");
        return report;
    }

    push_section(&mut report, "Added translations", &ledger.added);
    push_section(&mut report, "Updated translations", &ledger.updated);
    push_section(&mut report, "Removed stale keys", &ledger.stale_removed);

    if key_fallbacks > 0 {
        report.push_str(&format!(
            "\n{} key(s) had no source-language text; the key itself was used as source.\n",
            key_fallbacks
        ));
    }

    report
}

fn push_section(report: &mut String, title: &str, identifiers: &[String]) {
    if identifiers.is_empty() {
        return;
    }
    report.push_str(&format!("\n### {} ({})\n\n", title, identifiers.len()));
    for identifier in identifiers {
        report.push_str(&format!("- `{}`\n", identifier));
    }
}

/// Write the rendered report to disk.
pub fn write_report(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents)
        .with_context(|| format!("Failed to write report to {}", path.display()))?;
    info!("Wrote change report to {}", path.display());
    Ok(())
}
