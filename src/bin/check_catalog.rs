//! Catalog check binary - reports what a translation run would do without
//! calling OpenAI or writing anything.
//!
//! Usage:
//!   cargo run --bin check-catalog                      # Print pending work
//!   cargo run --bin check-catalog -- --fail-on-missing # Exit 1 when translations are missing
//!
//! Required environment variables:
//! - CATALOG_PATH
//! - TARGET_LANGUAGES
//!
//! Optional:
//! - SOURCE_LANGUAGE (defaults to the catalog's sourceLanguage)

use std::path::Path;

use anyhow::{Context, Result};

use xcstrings_translator::analyzer;
use xcstrings_translator::catalog::StringCatalog;
use xcstrings_translator::config::parse_language_list;
use xcstrings_translator::report;

/// Minimal config for the check (no OpenAI key required)
struct CheckConfig {
    catalog_path: String,
    target_languages: Vec<String>,
    source_language: Option<String>,
}

impl CheckConfig {
    fn from_env() -> Result<Self> {
        Ok(Self {
            catalog_path: std::env::var("CATALOG_PATH").context("CATALOG_PATH not set")?,
            target_languages: parse_language_list(
                &std::env::var("TARGET_LANGUAGES").context("TARGET_LANGUAGES not set")?,
            )?,
            source_language: std::env::var("SOURCE_LANGUAGE")
                .ok()
                .filter(|value| !value.trim().is_empty()),
        })
    }
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("xcstrings_translator=info".parse()?),
        )
        .init();

    // Load environment from .env file
    dotenvy::dotenv().ok();

    // Parse CLI arguments
    let args: Vec<String> = std::env::args().collect();
    let fail_on_missing = args.iter().any(|arg| arg == "--fail-on-missing");

    let config = CheckConfig::from_env()?;
    let catalog = StringCatalog::load(Path::new(&config.catalog_path))?;

    let source_language = config
        .source_language
        .clone()
        .or_else(|| catalog.source_language.clone());

    let analysis = analyzer::analyze(&catalog, &config.target_languages, source_language.as_deref());

    println!("\n========== CATALOG STATUS ==========");
    println!("Catalog:           {}", config.catalog_path);
    println!("Keys:              {}", catalog.strings.len());
    println!("Target languages:  {}", config.target_languages.join(", "));
    println!("Needs translation: {}", analysis.requests.len());
    println!("Stale entries:     {}", analysis.stale_removed.len());
    println!("Key fallbacks:     {}", analysis.key_fallbacks);
    println!("====================================\n");

    if !analysis.requests.is_empty() {
        println!("Missing translations:");
        for request in &analysis.requests {
            println!(
                "  {}",
                report::format_request_line(request, analysis.needs.get(&request.key))
            );
        }
        println!();
    }

    if !analysis.stale_removed.is_empty() {
        println!("Stale entries a full run would remove:");
        for key in &analysis.stale_removed {
            println!("  {}", key);
        }
        println!();
    }

    if analysis.requests.is_empty() && analysis.stale_removed.is_empty() {
        println!("Catalog is fully translated.");
    }

    if fail_on_missing && !analysis.requests.is_empty() {
        std::process::exit(1);
    }

    Ok(())
}
