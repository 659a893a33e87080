use std::path::Path;

use anyhow::Result;
use tracing::{info, warn};

use xcstrings_translator::analyzer::{self, AnalysisResult};
use xcstrings_translator::catalog::StringCatalog;
use xcstrings_translator::config::Config;
use xcstrings_translator::openai::OpenAiClient;
use xcstrings_translator::{merger, report, validator};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored in production/GitHub Actions)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("xcstrings_translator=info".parse()?),
        )
        .init();

    info!("Starting string catalog translation job");

    // Load configuration from environment
    let config = Config::from_env()?;
    let catalog_path = Path::new(&config.catalog_path);

    // Step 1: Load the catalog and work out what needs translating
    info!("Loading string catalog from {}", config.catalog_path);
    let catalog = StringCatalog::load(catalog_path)?;

    let source_language = config
        .source_language
        .clone()
        .or_else(|| catalog.source_language.clone());

    let analysis = analyzer::analyze(&catalog, &config.target_languages, source_language.as_deref());
    info!(
        "Analyzed {} keys: {} need translation, {} stale",
        catalog.strings.len(),
        analysis.requests.len(),
        analysis.stale_removed.len()
    );

    if analysis.requests.is_empty() && analysis.stale_removed.is_empty() {
        info!("Catalog is up to date, nothing to translate");
        return Ok(());
    }

    let AnalysisResult {
        catalog: mut working,
        requests,
        needs,
        stale_removed,
        key_fallbacks,
        modified,
    } = analysis;

    // Step 2: Translate the whole batch with OpenAI
    let results = if requests.is_empty() {
        Vec::new()
    } else {
        info!(
            "Translating {} strings into {} languages with {}",
            requests.len(),
            config.target_languages.len(),
            config.openai_model
        );
        let client = OpenAiClient::new(&config);
        client
            .translate_batch(
                &requests,
                source_language.as_deref().unwrap_or("en"),
                config.extra_instructions.as_deref(),
            )
            .await?
    };

    // Step 3: Merge translations into the working catalog
    let ledger = merger::apply_translations(&mut working, &needs, &results, stale_removed);

    // Step 4: Check that format specifiers and placeholders survived
    let warning_count = validator::validate_batch(&requests, &results);
    if warning_count > 0 {
        warn!(
            "{} validation warnings, review the affected strings in Xcode",
            warning_count
        );
    }

    // Step 5: Write the catalog back, but only when something changed
    if modified || ledger.wrote_translations() {
        working.save(catalog_path)?;
        info!("Wrote updated catalog to {}", catalog_path.display());
    } else {
        info!("No catalog changes to write");
    }

    report::log_summary(&ledger, key_fallbacks);

    if let Some(report_path) = &config.report_path {
        let markdown = report::render_markdown(&ledger, key_fallbacks, &config.openai_model);
        report::write_report(Path::new(report_path), &markdown)?;
    }

    info!("Translation job finished");
    Ok(())
}
