// 🗂️ Pricing Configuration - Override tables as data
// Everything hand-maintained (column positions, name overrides, program
// headers, the canonical disclaimer) lives here and is loaded once per run.

use crate::error::{PricingError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

// ============================================================================
// COLUMN LAYOUT
// ============================================================================

/// Fixed column positions in the pricing CSV (0-based)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnLayout {
    pub club_id: usize,
    pub club_name: usize,
    pub club_level: usize,
    pub network_name: usize,
    pub network_access: usize,
    pub elevate_offering: usize,
    pub fee_type: usize,
    /// The three core tier columns, in display order
    pub tiers: [usize; 3],
}

impl Default for ColumnLayout {
    fn default() -> Self {
        ColumnLayout {
            club_id: 0,
            club_name: 1,
            club_level: 2,
            network_name: 3,
            network_access: 4,
            elevate_offering: 5,
            fee_type: 6,
            tiers: [12, 13, 14],
        }
    }
}

impl ColumnLayout {
    /// Minimum row width for a row to carry every fixed column
    pub fn min_width(&self) -> usize {
        let fixed = [
            self.club_id,
            self.club_name,
            self.club_level,
            self.network_name,
            self.network_access,
            self.elevate_offering,
            self.fee_type,
        ];
        fixed
            .iter()
            .chain(self.tiers.iter())
            .copied()
            .max()
            .unwrap_or(0)
            + 1
    }
}

// ============================================================================
// PROGRAM COLUMNS
// ============================================================================

/// One row of the declarative program-column table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramColumn {
    /// Display name ("SILVER SNEAKERS")
    pub name: String,

    /// Accepted header spellings (compared lowercase)
    pub patterns: Vec<String>,

    /// Words that disqualify an otherwise matching header
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl ProgramColumn {
    fn new(name: &str, patterns: &[&str], exclude: &[&str]) -> Self {
        ProgramColumn {
            name: name.to_string(),
            patterns: patterns.iter().map(|p| p.to_string()).collect(),
            exclude: exclude.iter().map(|e| e.to_string()).collect(),
        }
    }
}

fn default_programs() -> Vec<ProgramColumn> {
    vec![
        ProgramColumn::new("SILVER SNEAKERS", &["silver sneakers"], &["soccer", "academy"]),
        ProgramColumn::new("ASH - Standard", &["ash - standard", "ash standard"], &[]),
        ProgramColumn::new("ASH - Premium", &["ash - premium", "ash premium"], &[]),
        ProgramColumn::new(
            "Optum - Classic Core",
            &["optum - classic core", "optum classic core"],
            &[],
        ),
        ProgramColumn::new(
            "Optum - Premium Elite",
            &["optum - premium elite", "optum premium elite"],
            &[],
        ),
        ProgramColumn::new("OPTUM RENEW", &["optum renew", "optum renew - nfc"], &[]),
        ProgramColumn::new("Peer Fit", &["peer fit", "peerfit"], &[]),
    ]
}

// ============================================================================
// DISCLAIMER
// ============================================================================

pub const CANONICAL_DISCLAIMER: &str = "*Annual enhancement fee of $49.95 for the first member and $89.95 for all memberships with two or more persons will be billed 60 days from the join date, then every 12 months thereafter for the duration of the membership. If you choose to use a credit or debit card for your method of payment, additional $4.99 credit card fee added to your dues.

*Amenities and programming vary by location. Monthly retail rebate valid on in-club purchases of drinks, snacks and shakes and excludes day passes and discounted items. Rebate not to exceed monthly dues amount. Relax & Recover available at select clubs. For guest passes, guest must be 18+ and accompany a member. One guest per visit. All access pass is one time per month and expires at the end of the month.

*Reservations are required. A $2 no-show fee will be applied if reservations are not cancelled 2 hours prior.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisclaimerConfig {
    /// Replacement text for the fee-disclaimer region
    pub canonical_text: String,

    /// Substrings of the canonical text; all present means already current
    pub signatures: Vec<String>,

    /// Annual-fee dollar literals of the old detailed phrasing
    pub detailed_amounts: Vec<String>,

    /// Old credit-card fee literal; marks the card-fee clause
    pub card_fee_amount: String,
}

impl Default for DisclaimerConfig {
    fn default() -> Self {
        DisclaimerConfig {
            canonical_text: CANONICAL_DISCLAIMER.to_string(),
            signatures: vec![
                "$49.95 for the first member".to_string(),
                "$89.95 for all memberships".to_string(),
            ],
            detailed_amounts: vec!["$49.99".to_string(), "$89.98".to_string()],
            card_fee_amount: "$2.99".to_string(),
        }
    }
}

// ============================================================================
// PRICING CONFIG
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    pub column_layout: ColumnLayout,

    /// Display labels of the three core tiers
    pub tier_labels: [String; 3],

    /// Header variants that locate the extra-tier anchor column (substring match)
    pub extra_tier_anchor: Vec<String>,

    /// Decorative suffixes stripped from extra-tier labels
    pub extra_tier_label_suffixes: Vec<String>,

    /// Program availability columns, in output order
    pub programs: Vec<ProgramColumn>,

    /// Single-mapping override: text-file identity -> document identity
    pub aliases: BTreeMap<String, String>,

    /// One-to-many override: text-file identity -> document identities
    pub multi_mappings: BTreeMap<String, Vec<String>>,

    /// Organization tags stripped before normalization ("CFF", "In-Shape")
    pub source_prefixes: Vec<String>,

    /// Site path fragments stripped from document file names
    pub document_prefixes: Vec<String>,

    /// State names/abbreviations stripped together with a trailing zip
    pub state_names: Vec<String>,

    pub disclaimer: DisclaimerConfig,

    /// Document corpus file-name suffix
    pub document_suffix: String,

    /// Club text-file extension (without dot)
    pub text_extension: String,
}

impl Default for PricingConfig {
    fn default() -> Self {
        let aliases = [
            ("sports complex", "rocklin east"),
            ("east arden", "carmichael arden"),
            ("madison", "madison i 80"),
            ("sunrise", "sunrise hwy 50"),
            ("modesto mchenry", "modesto mchenry north"),
            ("suisun", "suisun city"),
            ("turlock", "turlock monte vista"),
            ("vallejo lincoln rd", "vallejo lincoln road"),
            ("victorville", "victorville north"),
            ("visalia mooney", "visalia mooney north"),
        ]
        .iter()
        .map(|(from, to)| (from.to_string(), to.to_string()))
        .collect();

        let mut multi_mappings = BTreeMap::new();
        multi_mappings.insert(
            "midtown".to_string(),
            vec!["midtown".to_string(), "downtown".to_string()],
        );

        PricingConfig {
            column_layout: ColumnLayout::default(),
            tier_labels: [
                "One Club".to_string(),
                "Local Network".to_string(),
                "Lifestyle Network Plus".to_string(),
            ],
            extra_tier_anchor: vec![
                "Lifestyle Local Network".to_string(),
                "Lifestyle Network Plus".to_string(),
            ],
            extra_tier_label_suffixes: vec![" - NFC".to_string()],
            programs: default_programs(),
            aliases,
            multi_mappings,
            source_prefixes: vec!["CFF".to_string(), "In-Shape".to_string()],
            document_prefixes: vec!["www.inshape.com_gyms_".to_string()],
            state_names: vec!["california".to_string(), "ca".to_string()],
            disclaimer: DisclaimerConfig::default(),
            document_suffix: "_clean.md".to_string(),
            text_extension: "txt".to_string(),
        }
    }
}

impl PricingConfig {
    /// Load overrides from a JSON file; missing keys keep their defaults
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| PricingError::io(path.as_ref(), e))?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: PricingConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.extra_tier_anchor.iter().all(|a| a.trim().is_empty()) {
            return Err(PricingError::Config(
                "extra_tier_anchor needs at least one header variant".to_string(),
            ));
        }
        if self.disclaimer.signatures.is_empty() {
            return Err(PricingError::Config(
                "disclaimer.signatures must not be empty".to_string(),
            ));
        }
        for signature in &self.disclaimer.signatures {
            if !self.disclaimer.canonical_text.contains(signature.as_str()) {
                return Err(PricingError::Config(format!(
                    "disclaimer signature '{}' is not part of the canonical text",
                    signature
                )));
            }
        }
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = PricingConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.column_layout.min_width(), 15);
        assert_eq!(config.programs.len(), 7);
        assert_eq!(config.aliases.get("sports complex").map(String::as_str), Some("rocklin east"));
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let json = r#"{
            "aliases": { "old town": "old town north" },
            "column_layout": { "tiers": [15, 16, 17] }
        }"#;
        let config = PricingConfig::from_json(json).unwrap();

        assert_eq!(config.aliases.len(), 1);
        assert_eq!(config.column_layout.tiers, [15, 16, 17]);
        assert_eq!(config.column_layout.fee_type, 6);
        assert_eq!(config.multi_mappings.get("midtown").unwrap().len(), 2);
        assert_eq!(config.document_suffix, "_clean.md");
    }

    #[test]
    fn test_signature_must_be_in_canonical_text() {
        let json = r#"{ "disclaimer": { "signatures": ["not in the text"] } }"#;
        let result = PricingConfig::from_json(json);
        assert!(matches!(result, Err(PricingError::Config(_))));
    }

    #[test]
    fn test_bad_json() {
        let result = PricingConfig::from_json("{ not json");
        assert!(matches!(result, Err(PricingError::Json(_))));
    }
}
