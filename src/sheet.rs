// 📄 Pricing Sheet - CSV export loaded once, columns detected once
//
// Column positions for club/fee/tier data are fixed by contract (see
// ColumnLayout). Columns that move between exports (extra tiers, program
// availability) are located by header text through a declarative table.

use crate::config::PricingConfig;
use crate::error::{PricingError, Result};
use csv::ReaderBuilder;
use std::io::Read;
use std::path::Path;

/// Capability name of the "extra tiers start after this column" anchor
pub const EXTRA_TIER_ANCHOR: &str = "extra tier anchor";

// ============================================================================
// PRICING SHEET
// ============================================================================

/// Header + data rows of one pricing CSV, cells kept as exported
#[derive(Debug, Clone, Default)]
pub struct PricingSheet {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl PricingSheet {
    pub fn from_path(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path).map_err(|e| PricingError::io(path, e))?;
        Self::from_reader(file)
    }

    /// Rows may be shorter or longer than the header; exports are ragged
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers = reader
            .headers()?
            .iter()
            .map(|h| h.to_string())
            .collect();

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result?;
            rows.push(record.iter().map(|c| c.to_string()).collect());
        }

        Ok(PricingSheet { headers, rows })
    }

    pub fn from_rows(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        PricingSheet { headers, rows }
    }
}

/// Trimmed cell value; missing cells read as empty
pub fn cell(row: &[String], idx: usize) -> &str {
    row.get(idx).map(|c| c.trim()).unwrap_or("")
}

// ============================================================================
// COLUMN DETECTION
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum MatchMode {
    /// Header contains the pattern anywhere
    Substring,

    /// Header equals the pattern, or starts/ends with it at a word boundary
    Bounded,
}

/// {capability: [accepted patterns]} - one row of the detection table
#[derive(Debug, Clone)]
pub struct ColumnRule {
    pub capability: String,
    pub patterns: Vec<String>,
    pub exclude: Vec<String>,
    pub mode: MatchMode,
}

impl ColumnRule {
    pub fn matches(&self, header: &str) -> bool {
        let header = header.trim().to_lowercase();

        if self
            .exclude
            .iter()
            .any(|word| header.contains(&word.to_lowercase()))
        {
            return false;
        }

        self.patterns.iter().any(|pattern| {
            let pattern = pattern.trim().to_lowercase();
            if pattern.is_empty() {
                return false;
            }
            match self.mode {
                MatchMode::Substring => header.contains(&pattern),
                MatchMode::Bounded => {
                    header == pattern
                        || header.starts_with(&format!("{} -", pattern))
                        || header.starts_with(&format!("{} ", pattern))
                        || header.ends_with(&format!(" - {}", pattern))
                        || header.ends_with(&format!(" {}", pattern))
                }
            }
        })
    }
}

/// Evaluates the detection table against a header row
#[derive(Debug, Clone)]
pub struct ColumnDetector {
    rules: Vec<ColumnRule>,
    program_names: Vec<String>,
}

impl ColumnDetector {
    pub fn new(config: &PricingConfig) -> Self {
        let mut rules = vec![ColumnRule {
            capability: EXTRA_TIER_ANCHOR.to_string(),
            patterns: config.extra_tier_anchor.clone(),
            exclude: Vec::new(),
            mode: MatchMode::Substring,
        }];

        for program in &config.programs {
            rules.push(ColumnRule {
                capability: program.name.clone(),
                patterns: program.patterns.clone(),
                exclude: program.exclude.clone(),
                mode: MatchMode::Bounded,
            });
        }

        ColumnDetector {
            rules,
            program_names: config.programs.iter().map(|p| p.name.clone()).collect(),
        }
    }

    /// First matching header column per capability
    pub fn detect(&self, headers: &[String]) -> ColumnMap {
        let columns = self
            .rules
            .iter()
            .filter_map(|rule| {
                headers
                    .iter()
                    .position(|h| rule.matches(h))
                    .map(|idx| (rule.capability.clone(), idx))
            })
            .collect();

        ColumnMap {
            columns,
            accepted: self
                .rules
                .iter()
                .map(|r| (r.capability.clone(), r.patterns.clone()))
                .collect(),
            program_names: self.program_names.clone(),
        }
    }
}

/// Detected capability -> column index, in table order
#[derive(Debug, Clone, Default)]
pub struct ColumnMap {
    columns: Vec<(String, usize)>,
    accepted: Vec<(String, Vec<String>)>,
    program_names: Vec<String>,
}

impl ColumnMap {
    pub fn get(&self, capability: &str) -> Option<usize> {
        self.columns
            .iter()
            .find(|(name, _)| name == capability)
            .map(|(_, idx)| *idx)
    }

    /// Like `get`, but a missing column is a `ColumnNotFound` failure
    pub fn require(&self, capability: &str) -> Result<usize> {
        self.get(capability)
            .ok_or_else(|| PricingError::ColumnNotFound {
                capability: capability.to_string(),
                accepted: self
                    .accepted
                    .iter()
                    .find(|(name, _)| name == capability)
                    .map(|(_, patterns)| patterns.clone())
                    .unwrap_or_default(),
            })
    }

    /// Detected program columns, in configured program order
    pub fn programs(&self) -> Vec<(&str, usize)> {
        self.program_names
            .iter()
            .filter_map(|name| self.get(name).map(|idx| (name.as_str(), idx)))
            .collect()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_load_ragged_csv() {
        let data = "Club ID,Club Name,Fee\n101,Rocklin East,10,extra\n102,Madison\n";
        let sheet = PricingSheet::from_reader(data.as_bytes()).unwrap();

        assert_eq!(sheet.headers, headers(&["Club ID", "Club Name", "Fee"]));
        assert_eq!(sheet.rows.len(), 2);
        assert_eq!(sheet.rows[0].len(), 4);
        assert_eq!(cell(&sheet.rows[1], 1), "Madison");
        assert_eq!(cell(&sheet.rows[1], 7), "");
    }

    #[test]
    fn test_detect_anchor_variants() {
        let detector = ColumnDetector::new(&PricingConfig::default());

        let map = detector.detect(&headers(&["Club", "Basic Local Network", "Lifestyle Local Network", "Extra"]));
        assert_eq!(map.get(EXTRA_TIER_ANCHOR), Some(2));

        let map = detector.detect(&headers(&["Club", "Lifestyle Network Plus"]));
        assert_eq!(map.require(EXTRA_TIER_ANCHOR).unwrap(), 1);
    }

    #[test]
    fn test_missing_anchor_is_column_not_found() {
        let detector = ColumnDetector::new(&PricingConfig::default());
        let map = detector.detect(&headers(&["Club", "One Club", "Local Network"]));

        match map.require(EXTRA_TIER_ANCHOR) {
            Err(PricingError::ColumnNotFound { capability, accepted }) => {
                assert_eq!(capability, EXTRA_TIER_ANCHOR);
                assert_eq!(accepted.len(), 2);
            }
            other => panic!("expected ColumnNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_program_headers() {
        let detector = ColumnDetector::new(&PricingConfig::default());
        let map = detector.detect(&headers(&[
            "Club",
            "Total Soccer Academy Silver Sneakers",
            "SILVER SNEAKERS",
            "PeerFit",
            "Optum Renew - NFC",
            "ASH Standard Rate",
        ]));

        assert_eq!(map.get("SILVER SNEAKERS"), Some(2));
        assert_eq!(map.get("Peer Fit"), Some(3));
        assert_eq!(map.get("OPTUM RENEW"), Some(4));
        assert_eq!(map.get("ASH - Standard"), Some(5));
        assert_eq!(map.get("ASH - Premium"), None);

        let programs = map.programs();
        let names: Vec<&str> = programs.iter().map(|(n, _)| *n).collect();
        assert_eq!(names, vec!["SILVER SNEAKERS", "ASH - Standard", "OPTUM RENEW", "Peer Fit"]);
    }

    #[test]
    fn test_bounded_rejects_embedded_words() {
        let rule = ColumnRule {
            capability: "Peer Fit".to_string(),
            patterns: vec!["peer fit".to_string()],
            exclude: Vec::new(),
            mode: MatchMode::Bounded,
        };
        assert!(rule.matches("Peer Fit"));
        assert!(rule.matches("peer fit - nfc"));
        assert!(rule.matches("Program Peer Fit"));
        assert!(!rule.matches("PeerFitness"));
        assert!(!rule.matches("Peer Fitness"));
    }
}
