// 🔤 Name Normalizer - one club, three naming conventions
//
// "CFF: Rocklin_East" (CSV), "CFF__Rocklin_East.txt" (club file) and
// "www.inshape.com_gyms_rocklin-east-california-95677_clean.md" (document)
// all resolve to the same comparison key: "rocklin east".

use crate::config::PricingConfig;
use crate::error::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

static DEFAULT_NORMALIZER: Lazy<NameNormalizer> = Lazy::new(NameNormalizer::default);

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Normalize a raw club name with the built-in prefix and state tables
pub fn normalize_club_name(raw: &str) -> String {
    DEFAULT_NORMALIZER.normalize(raw)
}

// ============================================================================
// NAME NORMALIZER
// ============================================================================

#[derive(Debug, Clone)]
pub struct NameNormalizer {
    /// "CFF:" / "In-Shape:" at the start, any number of times
    source_prefix: Option<Regex>,

    /// " california 95677" / " ca 95355"
    state_zip: Option<Regex>,

    /// "CFF__" / "In-Shape__" at the start of a club file stem
    file_prefix: Option<Regex>,

    /// "www.inshape.com_gyms_" at the start of a document stem
    document_prefix: Option<Regex>,

    /// "-california-95677" inside a document stem
    document_state_zip: Option<Regex>,

    /// "_clean" at the end of a document stem
    document_stem_suffix: String,
}

impl NameNormalizer {
    pub fn new(config: &PricingConfig) -> Result<Self> {
        let prefixes = escaped(&config.source_prefixes);
        let states = escaped(&config.state_names);
        let doc_prefixes = escaped(&config.document_prefixes);

        let alternation = |items: &[String]| -> Option<String> {
            (!items.is_empty()).then(|| items.join("|"))
        };
        let compile = |pattern: Option<String>| -> Result<Option<Regex>> {
            Ok(match pattern {
                Some(p) => Some(Regex::new(&p)?),
                None => None,
            })
        };

        let source_prefix =
            compile(alternation(&prefixes).map(|alt| format!(r"(?i)^(?:(?:{}):\s*)+", alt)))?;
        let file_prefix =
            compile(alternation(&prefixes).map(|alt| format!(r"(?i)^(?:{})__", alt)))?;
        let state_zip =
            compile(alternation(&states).map(|alt| format!(r"(?i)\s+(?:{})\s+\d{{5}}\b", alt)))?;
        let document_state_zip =
            compile(alternation(&states).map(|alt| format!(r"(?i)-(?:{})-\d+", alt)))?;
        let document_prefix =
            compile(alternation(&doc_prefixes).map(|alt| format!(r"(?i)^(?:{})", alt)))?;

        let document_stem_suffix = Path::new(&config.document_suffix)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_string();

        Ok(NameNormalizer {
            source_prefix,
            state_zip,
            file_prefix,
            document_prefix,
            document_state_zip,
            document_stem_suffix,
        })
    }

    /// Canonical comparison key for a raw club name.
    ///
    /// Pure and idempotent: `normalize(normalize(x)) == normalize(x)`.
    pub fn normalize(&self, raw: &str) -> String {
        let mut current = self.normalize_once(raw);
        // A stripped prefix can expose another one ("CFF: _CFF: x")
        loop {
            let next = self.normalize_once(&current);
            if next == current {
                return current;
            }
            current = next;
        }
    }

    fn normalize_once(&self, raw: &str) -> String {
        let trimmed = raw.trim();

        let without_prefix = match &self.source_prefix {
            Some(re) => re.replace(trimmed, ""),
            None => trimmed.into(),
        };

        let spaced = without_prefix
            .to_lowercase()
            .replace(&['_', '-'][..], " ");

        let without_zip = match &self.state_zip {
            Some(re) => re.replace_all(&spaced, "").into_owned(),
            None => spaced,
        };

        WHITESPACE.replace_all(&without_zip, " ").trim().to_string()
    }

    /// Raw club name from a club text file ("CFF__Rocklin_East.txt" -> "Rocklin East")
    pub fn name_from_text_file(&self, path: &Path) -> String {
        let stem = file_stem(path);
        let stem = match &self.file_prefix {
            Some(re) => re.replace(&stem, "").into_owned(),
            None => stem,
        };
        stem.replace('_', " ")
    }

    /// Raw club name from a document file name
    pub fn name_from_document(&self, path: &Path) -> String {
        let mut stem = file_stem(path);

        if let Some(re) = &self.document_prefix {
            stem = re.replace(&stem, "").into_owned();
        }
        if !self.document_stem_suffix.is_empty() {
            if let Some(stripped) = stem.strip_suffix(self.document_stem_suffix.as_str()) {
                stem = stripped.to_string();
            }
        }
        if let Some(re) = &self.document_state_zip {
            stem = re.replace_all(&stem, "").into_owned();
        }

        stem.replace(&['-', '_'][..], " ")
    }

    /// Comparison key for a club text file
    pub fn text_file_key(&self, path: &Path) -> String {
        self.normalize(&self.name_from_text_file(path))
    }

    /// Comparison key for a document file
    pub fn document_key(&self, path: &Path) -> String {
        self.normalize(&self.name_from_document(path))
    }
}

impl Default for NameNormalizer {
    fn default() -> Self {
        // Built-in tables are plain literals, escaped before compiling
        NameNormalizer::new(&PricingConfig::default()).expect("built-in name patterns compile")
    }
}

fn escaped(items: &[String]) -> Vec<String> {
    items
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(regex::escape)
        .collect()
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("")
        .to_string()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_three_conventions_agree() {
        assert_eq!(normalize_club_name("CFF: Rocklin_East"), "rocklin east");
        assert_eq!(
            normalize_club_name("CFF: Rocklin_East"),
            normalize_club_name("rocklin-east")
        );
        assert_eq!(normalize_club_name("In-Shape: Stockton  Downtown"), "stockton downtown");
    }

    #[test]
    fn test_strips_state_and_zip() {
        assert_eq!(normalize_club_name("modesto-california-95355"), "modesto");
        assert_eq!(normalize_club_name("Plaza CA 95355"), "plaza");
        // No zip, no strip
        assert_eq!(normalize_club_name("Carmichael California"), "carmichael california");
    }

    #[test]
    fn test_idempotent() {
        let inputs = [
            "CFF: Rocklin_East",
            "  In-Shape:   Madison I-80 ",
            "CFF: _CFF: Turlock",
            "cff: cff: midtown",
            "Sunrise Hwy 50 california 95670 california 95670",
            "",
            "---",
        ];
        for input in inputs {
            let once = normalize_club_name(input);
            assert_eq!(normalize_club_name(&once), once, "input: {:?}", input);
        }
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(normalize_club_name(""), "");
        assert_eq!(normalize_club_name(" _ - "), "");
    }

    #[test]
    fn test_name_from_text_file() {
        let normalizer = NameNormalizer::default();
        let path = Path::new("club_files/CFF__Rocklin_East.txt");
        assert_eq!(normalizer.name_from_text_file(path), "Rocklin East");
        assert_eq!(normalizer.text_file_key(path), "rocklin east");

        let path = Path::new("In-Shape__Vallejo_Lincoln_Rd.txt");
        assert_eq!(normalizer.text_file_key(path), "vallejo lincoln rd");
    }

    #[test]
    fn test_name_from_document() {
        let normalizer = NameNormalizer::default();
        let path = Path::new("docs/www.inshape.com_gyms_rocklin-east-california-95677_clean.md");
        assert_eq!(normalizer.name_from_document(path), "rocklin east");
        assert_eq!(normalizer.document_key(path), "rocklin east");

        let path = Path::new("www.inshape.com_gyms_madison-i-80-ca-95608_clean.md");
        assert_eq!(normalizer.document_key(path), "madison i 80");
    }

    #[test]
    fn test_custom_prefixes() {
        let mut config = PricingConfig::default();
        config.source_prefixes = vec!["ACME".to_string()];
        let normalizer = NameNormalizer::new(&config).unwrap();

        assert_eq!(normalizer.normalize("ACME: North Side"), "north side");
        assert_eq!(normalizer.normalize("CFF: North Side"), "cff: north side");
    }
}
