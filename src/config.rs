use anyhow::{bail, Context, Result};

#[derive(Debug, Clone)]
pub struct Config {
    // Catalog
    pub catalog_path: String,
    pub target_languages: Vec<String>,
    pub source_language: Option<String>,

    // OpenAI
    pub openai_api_key: String,
    pub openai_model: String,
    pub openai_api_url: String,
    pub max_completion_tokens: u32,
    pub extra_instructions: Option<String>,

    // Reporting
    pub report_path: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            // Catalog
            catalog_path: std::env::var("CATALOG_PATH").context("CATALOG_PATH not set")?,
            target_languages: parse_language_list(
                &std::env::var("TARGET_LANGUAGES").context("TARGET_LANGUAGES not set")?,
            )?,
            source_language: optional("SOURCE_LANGUAGE"),

            // OpenAI
            openai_api_key: std::env::var("OPENAI_API_KEY").context("OPENAI_API_KEY not set")?,
            openai_model: std::env::var("OPENAI_MODEL")
                .unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            openai_api_url: std::env::var("OPENAI_API_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1/chat/completions".to_string()),
            max_completion_tokens: std::env::var("MAX_COMPLETION_TOKENS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8000),
            extra_instructions: optional("EXTRA_INSTRUCTIONS"),

            // Reporting
            report_path: optional("REPORT_PATH"),
        })
    }
}

/// Read an optional environment variable, treating blank values as unset.
fn optional(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
}

/// Parse a comma-separated language list. Order is preserved; duplicates and
/// blank items are dropped.
pub fn parse_language_list(raw: &str) -> Result<Vec<String>> {
    let mut seen = std::collections::HashSet::new();
    let languages: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|code| !code.is_empty())
        .map(str::to_string)
        .filter(|code| seen.insert(code.clone()))
        .collect();

    if languages.is_empty() {
        bail!("TARGET_LANGUAGES must contain at least one language code");
    }
    Ok(languages)
}
