// 🔗 Club Matcher - club text files ↔ location documents
//
// Resolution order per text file:
//   1. one-to-many override  (partial success allowed)
//   2. direct identity match
//   3. single alias override
//   4. no match              (warning, file dropped)
//
// No edit-distance matching: an ambiguous name is fixed in the override
// tables, not guessed at here.

use crate::config::PricingConfig;
use crate::error::Result;
use crate::normalize::NameNormalizer;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

// ============================================================================
// MATCH RESULT TYPES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MatchRule {
    MultiMapping,
    Direct,
    Alias,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum MatchWarning {
    /// A one-to-many target has no document; the other targets still match
    MultiTargetMissing {
        text_file: PathBuf,
        identity: String,
        target: String,
    },

    /// The alias points at a document that does not exist
    AliasTargetMissing {
        text_file: PathBuf,
        identity: String,
        alias: String,
    },

    /// Nothing matched (expected for e.g. seasonal clubs)
    NoMatch { text_file: PathBuf, identity: String },
}

impl fmt::Display for MatchWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchWarning::MultiTargetMissing {
                text_file,
                identity,
                target,
            } => write!(
                f,
                "multi-mapping target '{}' not found for {} (normalized: '{}')",
                target,
                text_file.display(),
                identity
            ),
            MatchWarning::AliasTargetMissing {
                text_file,
                identity,
                alias,
            } => write!(
                f,
                "no matching document for {} (normalized: '{}', alias: '{}')",
                text_file.display(),
                identity,
                alias
            ),
            MatchWarning::NoMatch {
                text_file,
                identity,
            } => write!(
                f,
                "no matching document for {} (normalized: '{}')",
                text_file.display(),
                identity
            ),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MatchReport {
    /// Text file -> one or more documents
    pub mapping: BTreeMap<PathBuf, Vec<PathBuf>>,

    /// Which rule produced each mapping entry
    pub rules: BTreeMap<PathBuf, MatchRule>,

    pub warnings: Vec<MatchWarning>,
}

impl MatchReport {
    pub fn pair_count(&self) -> usize {
        self.mapping.len()
    }

    pub fn document_count(&self) -> usize {
        self.mapping.values().map(|docs| docs.len()).sum()
    }
}

// ============================================================================
// CLUB MATCHER
// ============================================================================

pub struct ClubMatcher {
    normalizer: NameNormalizer,
    aliases: HashMap<String, String>,
    multi_mappings: HashMap<String, Vec<String>>,
}

impl ClubMatcher {
    /// Override keys and targets are normalized once here, so config
    /// entries may be written in any casing or separator style.
    pub fn new(config: &PricingConfig) -> Result<Self> {
        let normalizer = NameNormalizer::new(config)?;

        let aliases = config
            .aliases
            .iter()
            .map(|(from, to)| (normalizer.normalize(from), normalizer.normalize(to)))
            .collect();

        let multi_mappings = config
            .multi_mappings
            .iter()
            .map(|(from, targets)| {
                (
                    normalizer.normalize(from),
                    targets.iter().map(|t| normalizer.normalize(t)).collect(),
                )
            })
            .collect();

        Ok(ClubMatcher {
            normalizer,
            aliases,
            multi_mappings,
        })
    }

    pub fn normalizer(&self) -> &NameNormalizer {
        &self.normalizer
    }

    /// Document identity -> document. A later document with the same
    /// identity replaces an earlier one.
    pub fn document_index(&self, documents: &[PathBuf]) -> HashMap<String, PathBuf> {
        documents
            .iter()
            .map(|doc| (self.normalizer.document_key(doc), doc.clone()))
            .collect()
    }

    pub fn match_files(&self, text_files: &[PathBuf], documents: &[PathBuf]) -> MatchReport {
        let index = self.document_index(documents);
        let mut report = MatchReport::default();

        for text_file in text_files {
            let identity = self.normalizer.text_file_key(text_file);
            debug!(file = %text_file.display(), identity = %identity, "Matching club file");

            if let Some((rule, docs)) = self.resolve(text_file, &identity, &index, &mut report.warnings) {
                report.mapping.insert(text_file.clone(), docs);
                report.rules.insert(text_file.clone(), rule);
            }
        }

        for warning in &report.warnings {
            warn!("{}", warning);
        }

        report
    }

    fn resolve(
        &self,
        text_file: &Path,
        identity: &str,
        index: &HashMap<String, PathBuf>,
        warnings: &mut Vec<MatchWarning>,
    ) -> Option<(MatchRule, Vec<PathBuf>)> {
        // 1. One-to-many override
        if let Some(targets) = self.multi_mappings.get(identity) {
            let mut docs = Vec::new();
            for target in targets {
                match index.get(target) {
                    Some(doc) => docs.push(doc.clone()),
                    None => warnings.push(MatchWarning::MultiTargetMissing {
                        text_file: text_file.to_path_buf(),
                        identity: identity.to_string(),
                        target: target.clone(),
                    }),
                }
            }
            return if docs.is_empty() {
                None
            } else {
                Some((MatchRule::MultiMapping, docs))
            };
        }

        // 2. Direct match
        if let Some(doc) = index.get(identity) {
            return Some((MatchRule::Direct, vec![doc.clone()]));
        }

        // 3. Alias override
        if let Some(alias) = self.aliases.get(identity) {
            return match index.get(alias) {
                Some(doc) => Some((MatchRule::Alias, vec![doc.clone()])),
                None => {
                    warnings.push(MatchWarning::AliasTargetMissing {
                        text_file: text_file.to_path_buf(),
                        identity: identity.to_string(),
                        alias: alias.clone(),
                    });
                    None
                }
            };
        }

        // 4. No match
        warnings.push(MatchWarning::NoMatch {
            text_file: text_file.to_path_buf(),
            identity: identity.to_string(),
        });
        None
    }
}

// ============================================================================
// TESTS
// ============================================================================
