//! Data model and persistence for Xcode String Catalog (`.xcstrings`) files.
//!
//! Catalogs are JSON documents keyed by source string. Key order is
//! significant for diff stability, so all maps preserve insertion order, and
//! fields that this tool does not model are carried through untouched.

use std::fs;
use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A parsed `.xcstrings` document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StringCatalog {
    #[serde(rename = "sourceLanguage", skip_serializing_if = "Option::is_none")]
    pub source_language: Option<String>,
    pub strings: IndexMap<String, CatalogEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// One catalog entry, keyed by the source string.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(rename = "extractionState", skip_serializing_if = "Option::is_none")]
    pub extraction_state: Option<ExtractionState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub localizations: Option<IndexMap<String, Localization>>,
    #[serde(rename = "shouldTranslate", skip_serializing_if = "Option::is_none")]
    pub should_translate: Option<bool>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Per-language localization. Plural variations and device substitutions are
/// not modeled; they ride along in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Localization {
    #[serde(rename = "stringUnit", skip_serializing_if = "Option::is_none")]
    pub string_unit: Option<StringUnit>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StringUnit {
    pub state: TranslationState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Workflow state of a single translation, as written by Xcode.
/// States added by future Xcode versions round-trip via `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TranslationState {
    New,
    NeedsReview,
    Translated,
    Stale,
    #[serde(untagged)]
    Other(String),
}

impl Default for TranslationState {
    fn default() -> Self {
        TranslationState::New
    }
}

/// How the entry got into the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionState {
    Manual,
    Migrated,
    ExtractedWithValue,
    Stale,
    #[serde(untagged)]
    Other(String),
}

impl StringCatalog {
    /// Read and parse a catalog file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read catalog at {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse catalog at {}", path.display()))
    }

    /// Write the catalog back in Xcode's own layout.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = self.to_xcode_json()?;
        fs::write(path, json)
            .with_context(|| format!("Failed to write catalog at {}", path.display()))?;
        Ok(())
    }

    /// Serialize to the byte layout Xcode produces: two-space indent, a space
    /// on both sides of the colon, trailing newline.
    pub fn to_xcode_json(&self) -> Result<String> {
        let mut buf = Vec::new();
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, XcodeFormatter::new());
        self.serialize(&mut serializer)
            .context("Failed to serialize catalog")?;
        buf.push(b'\n');
        String::from_utf8(buf).context("Catalog serialized to invalid UTF-8")
    }
}

impl CatalogEntry {
    /// Entries Xcode has marked stale are leftovers from removed source code.
    pub fn is_stale(&self) -> bool {
        matches!(self.extraction_state, Some(ExtractionState::Stale))
    }

    /// `shouldTranslate = false` opts an entry out of translation entirely.
    pub fn is_translatable(&self) -> bool {
        self.should_translate.unwrap_or(true)
    }
}

impl Localization {
    /// The stored translation text, if any.
    pub fn value(&self) -> Option<&str> {
        self.string_unit.as_ref().and_then(|unit| unit.value.as_deref())
    }
}

/// Serde formatter matching Xcode's catalog serialization so rewritten files
/// diff cleanly against ones Xcode wrote itself.
struct XcodeFormatter {
    current_indent: usize,
    has_value: bool,
}

impl XcodeFormatter {
    fn new() -> Self {
        XcodeFormatter {
            current_indent: 0,
            has_value: false,
        }
    }

    fn write_indent<W>(&self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        for _ in 0..self.current_indent {
            writer.write_all(b"  ")?;
        }
        Ok(())
    }
}

impl serde_json::ser::Formatter for XcodeFormatter {
    fn begin_array<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.current_indent += 1;
        self.has_value = false;
        writer.write_all(b"[")
    }

    fn end_array<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.current_indent -= 1;
        if self.has_value {
            writer.write_all(b"\n")?;
            self.write_indent(writer)?;
        }
        writer.write_all(b"]")
    }

    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            writer.write_all(b"\n")?;
        } else {
            writer.write_all(b",\n")?;
        }
        self.write_indent(writer)
    }

    fn end_array_value<W>(&mut self, _writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.has_value = true;
        Ok(())
    }

    fn begin_object<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.current_indent += 1;
        self.has_value = false;
        writer.write_all(b"{")
    }

    fn end_object<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.current_indent -= 1;
        if self.has_value {
            writer.write_all(b"\n")?;
            self.write_indent(writer)?;
        }
        writer.write_all(b"}")
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            writer.write_all(b"\n")?;
        } else {
            writer.write_all(b",\n")?;
        }
        self.write_indent(writer)
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        // Xcode writes `"key" : value`, not `"key": value`.
        writer.write_all(b" : ")
    }

    fn end_object_value<W>(&mut self, _writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.has_value = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> StringCatalog {
        serde_json::from_str(json).expect("Should parse catalog")
    }

    // ==================== Parsing Tests ====================

    #[test]
    fn test_parse_minimal_catalog() {
        let catalog = parse(r#"{"sourceLanguage":"en","strings":{},"version":"1.0"}"#);

        assert_eq!(catalog.source_language.as_deref(), Some("en"));
        assert_eq!(catalog.version.as_deref(), Some("1.0"));
        assert!(catalog.strings.is_empty());
        assert!(catalog.extra.is_empty());
    }

    #[test]
    fn test_parse_full_entry() {
        let catalog = parse(
            r#"{
                "sourceLanguage": "en",
                "strings": {
                    "Save": {
                        "comment": "Toolbar button",
                        "extractionState": "manual",
                        "shouldTranslate": false,
                        "localizations": {
                            "de": {"stringUnit": {"state": "translated", "value": "Sichern"}}
                        }
                    }
                },
                "version": "1.0"
            }"#,
        );

        let entry = &catalog.strings["Save"];
        assert_eq!(entry.comment.as_deref(), Some("Toolbar button"));
        assert_eq!(entry.extraction_state, Some(ExtractionState::Manual));
        assert_eq!(entry.should_translate, Some(false));

        let localizations = entry.localizations.as_ref().expect("Should have localizations");
        let unit = localizations["de"].string_unit.as_ref().expect("Should have stringUnit");
        assert_eq!(unit.state, TranslationState::Translated);
        assert_eq!(unit.value.as_deref(), Some("Sichern"));
    }

    #[test]
    fn test_parse_all_known_states() {
        let json = r#"{
            "sourceLanguage": "en",
            "strings": {
                "A": {"localizations": {"fr": {"stringUnit": {"state": "new", "value": ""}}}},
                "B": {"localizations": {"fr": {"stringUnit": {"state": "needs_review", "value": "x"}}}},
                "C": {"localizations": {"fr": {"stringUnit": {"state": "translated", "value": "y"}}}},
                "D": {"localizations": {"fr": {"stringUnit": {"state": "stale", "value": "z"}}}}
            },
            "version": "1.0"
        }"#;
        let catalog = parse(json);

        let state = |key: &str| {
            catalog.strings[key].localizations.as_ref().unwrap()["fr"]
                .string_unit
                .as_ref()
                .unwrap()
                .state
                .clone()
        };
        assert_eq!(state("A"), TranslationState::New);
        assert_eq!(state("B"), TranslationState::NeedsReview);
        assert_eq!(state("C"), TranslationState::Translated);
        assert_eq!(state("D"), TranslationState::Stale);
    }

    #[test]
    fn test_parse_unknown_state() {
        let catalog = parse(
            r#"{
                "sourceLanguage": "en",
                "strings": {
                    "Hi": {"localizations": {"fr": {"stringUnit": {"state": "machine_translated", "value": "Salut"}}}}
                },
                "version": "1.0"
            }"#,
        );

        let unit = catalog.strings["Hi"].localizations.as_ref().unwrap()["fr"]
            .string_unit
            .as_ref()
            .unwrap();
        assert_eq!(unit.state, TranslationState::Other("machine_translated".to_string()));

        // Unknown states serialize back as the original string
        let json = serde_json::to_string(&catalog).expect("Should serialize");
        assert!(json.contains("machine_translated"));
    }

    #[test]
    fn test_parse_string_unit_without_value() {
        let catalog = parse(
            r#"{
                "sourceLanguage": "en",
                "strings": {"Hi": {"localizations": {"fr": {"stringUnit": {"state": "new"}}}}},
                "version": "1.0"
            }"#,
        );

        let unit = catalog.strings["Hi"].localizations.as_ref().unwrap()["fr"]
            .string_unit
            .as_ref()
            .unwrap();
        assert!(unit.value.is_none());
    }

    #[test]
    fn test_entry_is_stale() {
        let stale = CatalogEntry {
            extraction_state: Some(ExtractionState::Stale),
            ..Default::default()
        };
        let manual = CatalogEntry {
            extraction_state: Some(ExtractionState::Manual),
            ..Default::default()
        };
        let unmarked = CatalogEntry::default();

        assert!(stale.is_stale());
        assert!(!manual.is_stale());
        assert!(!unmarked.is_stale());
    }

    #[test]
    fn test_entry_is_translatable() {
        let opted_out = CatalogEntry {
            should_translate: Some(false),
            ..Default::default()
        };
        let explicit = CatalogEntry {
            should_translate: Some(true),
            ..Default::default()
        };
        let unmarked = CatalogEntry::default();

        assert!(!opted_out.is_translatable());
        assert!(explicit.is_translatable());
        assert!(unmarked.is_translatable());
    }

    #[test]
    fn test_localization_value() {
        let with_value: Localization = serde_json::from_str(
            r#"{"stringUnit": {"state": "translated", "value": "Salut"}}"#,
        )
        .unwrap();
        let without_unit: Localization = serde_json::from_str(r#"{}"#).unwrap();

        assert_eq!(with_value.value(), Some("Salut"));
        assert_eq!(without_unit.value(), None);
    }

    // ==================== Round-Trip Tests ====================

    #[test]
    fn test_unknown_fields_survive_round_trip() {
        let json = r#"{
            "sourceLanguage": "en",
            "strings": {
                "%lld items": {
                    "localizations": {
                        "en": {
                            "variations": {
                                "plural": {
                                    "one": {"stringUnit": {"state": "translated", "value": "%lld item"}}
                                }
                            }
                        }
                    }
                }
            },
            "version": "1.0"
        }"#;

        let catalog = parse(json);
        let localization = &catalog.strings["%lld items"].localizations.as_ref().unwrap()["en"];
        assert!(localization.string_unit.is_none());
        assert!(localization.extra.contains_key("variations"));

        let reserialized = serde_json::to_value(&catalog).expect("Should serialize");
        let original: serde_json::Value = serde_json::from_str(json).unwrap();
        assert_eq!(reserialized, original);
    }

    #[test]
    fn test_key_order_preserved_on_round_trip() {
        let json = r#"{"sourceLanguage":"en","strings":{"zebra":{},"apple":{},"Mango":{}},"version":"1.0"}"#;
        let catalog = parse(json);

        let keys: Vec<&str> = catalog.strings.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["zebra", "apple", "Mango"]);

        let out = catalog.to_xcode_json().expect("Should serialize");
        let zebra = out.find("zebra").unwrap();
        let apple = out.find("apple").unwrap();
        let mango = out.find("Mango").unwrap();
        assert!(zebra < apple && apple < mango);
    }

    // ==================== Xcode Writer Tests ====================

    #[test]
    fn test_writer_matches_xcode_layout() {
        let catalog = parse(
            r#"{"sourceLanguage":"en","strings":{"Hi":{"localizations":{"fr":{"stringUnit":{"state":"translated","value":"Salut"}}}}},"version":"1.0"}"#,
        );

        let out = catalog.to_xcode_json().expect("Should serialize");
        let expected = "{\n  \"sourceLanguage\" : \"en\",\n  \"strings\" : {\n    \"Hi\" : {\n      \"localizations\" : {\n        \"fr\" : {\n          \"stringUnit\" : {\n            \"state\" : \"translated\",\n            \"value\" : \"Salut\"\n          }\n        }\n      }\n    }\n  },\n  \"version\" : \"1.0\"\n}\n";
        assert_eq!(out, expected);
    }

    #[test]
    fn test_writer_spaces_around_colon() {
        let catalog = parse(r#"{"sourceLanguage":"en","strings":{},"version":"1.0"}"#);

        let out = catalog.to_xcode_json().expect("Should serialize");
        assert!(out.contains("\"sourceLanguage\" : \"en\""));
        assert!(out.contains("\"version\" : \"1.0\""));
        assert!(!out.contains("\": "));
    }

    #[test]
    fn test_writer_ends_with_single_newline() {
        let catalog = parse(r#"{"sourceLanguage":"en","strings":{},"version":"1.0"}"#);

        let out = catalog.to_xcode_json().expect("Should serialize");
        assert!(out.ends_with("}\n"));
        assert!(!out.ends_with("}\n\n"));
    }

    #[test]
    fn test_writer_keeps_unicode_unescaped() {
        let catalog = parse(
            r#"{"sourceLanguage":"en","strings":{"Café ☕️":{"comment":"menü"}},"version":"1.0"}"#,
        );

        let out = catalog.to_xcode_json().expect("Should serialize");
        assert!(out.contains("Café ☕️"));
        assert!(out.contains("menü"));
    }

    // ==================== File I/O Tests ====================

    #[test]
    fn test_load_save_round_trip() {
        let dir = tempfile::tempdir().expect("Should create temp dir");
        let path = dir.path().join("Localizable.xcstrings");

        let catalog = parse(
            r#"{
                "sourceLanguage": "en",
                "strings": {
                    "Hello": {"localizations": {"es": {"stringUnit": {"state": "translated", "value": "Hola"}}}}
                },
                "version": "1.0"
            }"#,
        );
        catalog.save(&path).expect("Should save");

        let reloaded = StringCatalog::load(&path).expect("Should load");
        assert_eq!(reloaded, catalog);
    }

    #[test]
    fn test_save_is_stable_across_rewrites() {
        let dir = tempfile::tempdir().expect("Should create temp dir");
        let path = dir.path().join("Localizable.xcstrings");

        let catalog = parse(
            r#"{"sourceLanguage":"en","strings":{"One":{},"Two":{}},"version":"1.0"}"#,
        );
        catalog.save(&path).expect("Should save");
        let first = std::fs::read_to_string(&path).unwrap();

        StringCatalog::load(&path)
            .expect("Should load")
            .save(&path)
            .expect("Should save again");
        let second = std::fs::read_to_string(&path).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_load_missing_file_reports_path() {
        let err = StringCatalog::load(Path::new("/nonexistent/Localizable.xcstrings"))
            .expect_err("Should fail");
        assert!(format!("{:#}", err).contains("/nonexistent/Localizable.xcstrings"));
    }

    #[test]
    fn test_load_rejects_invalid_json() {
        let dir = tempfile::tempdir().expect("Should create temp dir");
        let path = dir.path().join("broken.xcstrings");
        std::fs::write(&path, "{not json").unwrap();

        let err = StringCatalog::load(&path).expect_err("Should fail");
        assert!(format!("{:#}", err).contains("Failed to parse catalog"));
    }
}
