// 💲 Pricing Table - CSV rows for one club → ordered fee rows → text block
//
// Builder output is always in the fixed fee-type order, whatever order the
// export lists the rows in. First matching row wins for each fee type.

use crate::config::{ColumnLayout, PricingConfig};
use crate::error::{PricingError, Result};
use crate::normalize::NameNormalizer;
use crate::sheet::{cell, ColumnDetector, ColumnMap, PricingSheet, EXTRA_TIER_ANCHOR};
use serde::{Deserialize, Serialize};

/// Display value for a blank, dash or absent tier price
pub const NOT_AVAILABLE: &str = "Not available";

/// Start anchor of every pricing block
pub const MEMBER_TYPE_ANCHOR: &str = "Member Type:";

// ============================================================================
// FEE TYPE VOCABULARY
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FeeType {
    MemberType,
    Enrollment12M,
    MainDues12M,
    EnrollmentMtm,
    MainDuesMtm,
    AddAdult,
    AddYouth,
    AddChild,
    Preferred,
    Elevate,
    NonEftFee,
    CreditCardServiceFee,
}

impl FeeType {
    /// Every fee type, in output order
    pub const ALL: [FeeType; 12] = [
        FeeType::MemberType,
        FeeType::Enrollment12M,
        FeeType::MainDues12M,
        FeeType::EnrollmentMtm,
        FeeType::MainDuesMtm,
        FeeType::AddAdult,
        FeeType::AddYouth,
        FeeType::AddChild,
        FeeType::Preferred,
        FeeType::Elevate,
        FeeType::NonEftFee,
        FeeType::CreditCardServiceFee,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            FeeType::MemberType => "Member Type",
            FeeType::Enrollment12M => "Enrollment 12M",
            FeeType::MainDues12M => "Main Dues 12M",
            FeeType::EnrollmentMtm => "Enrollment MTM",
            FeeType::MainDuesMtm => "Main Dues MTM",
            FeeType::AddAdult => "Add Adult",
            FeeType::AddYouth => "Add Youth",
            FeeType::AddChild => "Add Child",
            FeeType::Preferred => "Preferred",
            FeeType::Elevate => "Elevate",
            FeeType::NonEftFee => "Non-EFT Fee",
            FeeType::CreditCardServiceFee => "Credit Card Service Fee",
        }
    }

    /// Case- and whitespace-insensitive ("Enrollment 12 M" is Enrollment12M)
    pub fn matches(&self, cell: &str) -> bool {
        squash(cell) == squash(self.label())
    }

    pub fn from_cell(cell: &str) -> Option<FeeType> {
        FeeType::ALL.iter().copied().find(|fee| fee.matches(cell))
    }
}

fn squash(s: &str) -> String {
    s.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(|c| c.to_lowercase())
        .collect()
}

// ============================================================================
// PRICING MODEL
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierValue {
    pub label: String,
    pub value: String,
}

impl TierValue {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        TierValue {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// One fee type with its core tier prices and any extra tiers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeRow {
    pub fee_type: FeeType,
    /// Always the three core tiers, sentinel-filled
    pub tiers: Vec<TierValue>,
    /// Only extra tiers with a real value
    pub extras: Vec<TierValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClubPricingRecord {
    /// Normalized club identity
    pub club: String,
    pub rows: Vec<FeeRow>,
}

impl ClubPricingRecord {
    pub fn render(&self) -> String {
        render_pricing_text(&self.rows)
    }
}

/// None for empty, "-", "$-" and "$"
fn clean_tier_value(raw: &str) -> Option<String> {
    let value = raw.trim();
    match value {
        "" | "-" | "$-" | "$" => None,
        _ => Some(value.to_string()),
    }
}

// ============================================================================
// PRICING TABLE BUILDER
// ============================================================================

pub struct PricingTableBuilder<'a> {
    sheet: &'a PricingSheet,
    layout: ColumnLayout,
    tier_labels: [String; 3],
    label_suffixes: Vec<String>,
    normalizer: NameNormalizer,
    columns: ColumnMap,
    /// Normalized club-name cell per row, computed once
    row_keys: Vec<String>,
    /// Rows narrower than this are ignored
    min_width: usize,
}

impl<'a> PricingTableBuilder<'a> {
    pub fn new(config: &PricingConfig, sheet: &'a PricingSheet) -> Result<Self> {
        let normalizer = NameNormalizer::new(config)?;
        let columns = ColumnDetector::new(config).detect(&sheet.headers);
        let layout = config.column_layout.clone();
        let min_width = layout.club_name + 1;

        let row_keys = sheet
            .rows
            .iter()
            .map(|row| normalizer.normalize(cell(row, layout.club_name)))
            .collect();

        Ok(PricingTableBuilder {
            sheet,
            layout,
            tier_labels: config.tier_labels.clone(),
            label_suffixes: config.extra_tier_label_suffixes.clone(),
            normalizer,
            min_width,
            columns,
            row_keys,
        })
    }

    /// Ignore rows too short to carry every fixed column
    pub fn with_min_width(mut self, min_width: usize) -> Self {
        self.min_width = min_width.max(self.layout.club_name + 1);
        self
    }

    pub fn columns(&self) -> &ColumnMap {
        &self.columns
    }

    /// Club identity under this builder's normalizer
    pub fn identity(&self, raw: &str) -> String {
        self.normalizer.normalize(raw)
    }

    /// Named header columns after the anchor, with decorative suffixes stripped
    pub fn extra_tier_columns(&self) -> Result<Vec<(usize, String)>> {
        let anchor = self.columns.require(EXTRA_TIER_ANCHOR)?;

        Ok(self
            .sheet
            .headers
            .iter()
            .enumerate()
            .skip(anchor + 1)
            .filter(|(_, name)| !name.trim().is_empty())
            .map(|(idx, name)| (idx, self.display_label(name)))
            .collect())
    }

    fn display_label(&self, header: &str) -> String {
        let mut label = header.trim().to_string();
        for suffix in &self.label_suffixes {
            if let Some(stripped) = label.strip_suffix(suffix.as_str()) {
                label = stripped.trim().to_string();
            }
        }
        label
    }

    /// Rows whose normalized club name equals the identity (exact match only)
    pub fn club_rows(&self, club: &str) -> Vec<&'a [String]> {
        let identity = self.normalizer.normalize(club);
        if identity.is_empty() {
            return Vec::new();
        }

        let sheet: &'a PricingSheet = self.sheet;
        sheet
            .rows
            .iter()
            .zip(self.row_keys.iter())
            .filter(|(row, key)| row.len() >= self.min_width && **key == identity)
            .map(|(row, _)| row.as_slice())
            .collect()
    }

    /// Fee table for one club, extra tiers included.
    ///
    /// Fails with `ColumnNotFound` when the header has no extra-tier anchor
    /// and with `ClubNotFound` when no row carries the club.
    pub fn build(&self, club: &str) -> Result<ClubPricingRecord> {
        let extras = self.extra_tier_columns()?;
        self.build_with(club, &extras)
    }

    /// Like `build`, but an export without the anchor just has no extra tiers
    pub fn build_lenient(&self, club: &str) -> Result<ClubPricingRecord> {
        let extras = match self.extra_tier_columns() {
            Ok(extras) => extras,
            Err(PricingError::ColumnNotFound { .. }) => Vec::new(),
            Err(e) => return Err(e),
        };
        self.build_with(club, &extras)
    }

    fn build_with(&self, club: &str, extras: &[(usize, String)]) -> Result<ClubPricingRecord> {
        let rows = self.club_rows(club);
        if rows.is_empty() {
            return Err(PricingError::ClubNotFound {
                club: club.to_string(),
            });
        }

        let fee_rows = FeeType::ALL
            .iter()
            .filter_map(|fee_type| {
                rows.iter()
                    .find(|row| fee_type.matches(cell(row, self.layout.fee_type)))
                    .map(|row| self.fee_row(*fee_type, row, extras))
            })
            .collect();

        Ok(ClubPricingRecord {
            club: self.normalizer.normalize(club),
            rows: fee_rows,
        })
    }

    fn fee_row(&self, fee_type: FeeType, row: &[String], extras: &[(usize, String)]) -> FeeRow {
        let tiers = self
            .layout
            .tiers
            .iter()
            .zip(self.tier_labels.iter())
            .map(|(idx, label)| {
                let value = clean_tier_value(cell(row, *idx))
                    .unwrap_or_else(|| NOT_AVAILABLE.to_string());
                TierValue::new(label.clone(), value)
            })
            .collect();

        let extras = extras
            .iter()
            .filter_map(|(idx, label)| {
                clean_tier_value(cell(row, *idx)).map(|value| TierValue::new(label.clone(), value))
            })
            .collect();

        FeeRow {
            fee_type,
            tiers,
            extras,
        }
    }
}

// ============================================================================
// PRICING TEXT RENDERER
// ============================================================================

/// One line per fee row, fee-type order, no trailing newline.
/// An empty table renders as "" (nothing to splice).
pub fn render_pricing_text(rows: &[FeeRow]) -> String {
    let mut ordered: Vec<&FeeRow> = rows.iter().collect();
    ordered.sort_by_key(|row| row.fee_type);

    ordered
        .iter()
        .map(|row| render_fee_row(row))
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_fee_row(row: &FeeRow) -> String {
    let parts: Vec<String> = row
        .tiers
        .iter()
        .chain(row.extras.iter())
        .map(|tier| format!("{}: {}", tier.label, tier.value))
        .collect();

    format!("{}: {}", row.fee_type.label(), parts.join(" | "))
}

/// Pricing block of an already-rendered text source: from "Member Type:"
/// up to the next blank line or end of text.
pub fn extract_legacy_pricing(text: &str) -> Option<String> {
    let start = text.find(MEMBER_TYPE_ANCHOR)?;
    let rest = &text[start..];

    let mut end = rest.len();
    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if offset > 0 && line.trim().is_empty() {
            end = offset;
            break;
        }
        offset += line.len();
    }

    let block = rest[..end].trim();
    if block.is_empty() {
        None
    } else {
        Some(block.to_string())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    /// 18 header columns, anchor "Lifestyle Local Network" at column 17
    fn header() -> Vec<String> {
        let mut h = strings(&[
            "Club ID",
            "Club Name",
            "Club Level",
            "Local Name",
            "Local Access",
            "Elevate Offering",
            "Add On Fees",
        ]);
        for i in 7..12 {
            h.push(format!("Col {}", i));
        }
        h.extend(strings(&[
            "One Club",
            "Local Network",
            "Network Plus",
            "Basic Local Network",
            "Fitness Plus Local Network",
            "Lifestyle Local Network",
        ]));
        h
    }

    fn row(club: &str, fee: &str, tiers: [&str; 3]) -> Vec<String> {
        let mut r = strings(&["101", club, "Gold", "NetA", "Full", "None", fee]);
        r.extend(strings(&["", "", "", "", ""]));
        r.extend(strings(&tiers));
        r
    }

    #[test]
    fn test_end_to_end_main_dues_line() {
        let sheet = PricingSheet::from_rows(
            header(),
            vec![strings(&[
                "101", "Rocklin East", "Gold", "NetA", "Full", "None", "Main Dues MTM", "", "", "",
                "", "", "$10", "$15", "$20",
            ])],
        );
        let config = PricingConfig::default();
        let builder = PricingTableBuilder::new(&config, &sheet).unwrap();

        let record = builder.build("Rocklin East").unwrap();
        assert_eq!(record.club, "rocklin east");
        assert_eq!(
            record.render(),
            "Main Dues MTM: One Club: $10 | Local Network: $15 | Lifestyle Network Plus: $20"
        );
    }

    #[test]
    fn test_club_not_found() {
        let sheet = PricingSheet::from_rows(header(), vec![row("Madison", "Elevate", ["$1", "$2", "$3"])]);
        let config = PricingConfig::default();
        let builder = PricingTableBuilder::new(&config, &sheet).unwrap();

        let result = builder.build("Rocklin East");
        assert!(matches!(result, Err(PricingError::ClubNotFound { .. })));
    }

    #[test]
    fn test_column_not_found() {
        let mut h = header();
        h[17] = "Something Else".to_string();
        let sheet = PricingSheet::from_rows(h, vec![row("Madison", "Elevate", ["$1", "$2", "$3"])]);
        let config = PricingConfig::default();
        let builder = PricingTableBuilder::new(&config, &sheet).unwrap();

        assert!(matches!(
            builder.build("Madison"),
            Err(PricingError::ColumnNotFound { .. })
        ));
        // Lenient builds still work without extra tiers
        let record = builder.build_lenient("Madison").unwrap();
        assert_eq!(record.rows.len(), 1);
        assert!(record.rows[0].extras.is_empty());
    }

    #[test]
    fn test_fixed_order_and_first_match_wins() {
        let sheet = PricingSheet::from_rows(
            header(),
            vec![
                row("CFF: Turlock", "Add Child", ["$5", "$6", "$7"]),
                row("Turlock", "Member Type", ["OC", "LN", "LNP"]),
                row("turlock", "Add Child", ["$50", "$60", "$70"]),
                row("Turlock", "Enrollment 12 M", ["$0", "-", "$-"]),
                row("Modesto", "Preferred", ["$1", "$1", "$1"]),
            ],
        );
        let config = PricingConfig::default();
        let builder = PricingTableBuilder::new(&config, &sheet).unwrap();
        let record = builder.build("turlock").unwrap();

        let order: Vec<FeeType> = record.rows.iter().map(|r| r.fee_type).collect();
        assert_eq!(order, vec![FeeType::MemberType, FeeType::Enrollment12M, FeeType::AddChild]);

        assert_eq!(record.rows[2].tiers[0].value, "$5");
        assert_eq!(record.rows[1].tiers[1].value, NOT_AVAILABLE);
        assert_eq!(record.rows[1].tiers[2].value, NOT_AVAILABLE);
    }

    #[test]
    fn test_extra_tiers_omit_blank_values() {
        let mut h = header();
        h.push("OPTUM RENEW - NFC".to_string());
        h.push("Corporate".to_string());
        h.push("".to_string());

        let mut with_extras = row("Madison", "Main Dues MTM", ["$30", "$40", "$50"]);
        with_extras.extend(strings(&["", "", "", "$25", "-", "$9"]));
        let mut dash_only = row("Madison", "Add Adult", ["$10", "$10", "$10"]);
        dash_only.extend(strings(&["", "", "", "$-", "", ""]));

        let sheet = PricingSheet::from_rows(h, vec![with_extras, dash_only]);
        let config = PricingConfig::default();
        let builder = PricingTableBuilder::new(&config, &sheet).unwrap();
        let record = builder.build("Madison").unwrap();

        assert_eq!(
            record.render(),
            "Main Dues MTM: One Club: $30 | Local Network: $40 | Lifestyle Network Plus: $50 | OPTUM RENEW: $25\n\
             Add Adult: One Club: $10 | Local Network: $10 | Lifestyle Network Plus: $10"
        );
    }

    #[test]
    fn test_render_empty() {
        assert_eq!(render_pricing_text(&[]), "");
    }

    #[test]
    fn test_render_sorts_by_fee_type() {
        let rows = vec![
            FeeRow {
                fee_type: FeeType::Elevate,
                tiers: vec![TierValue::new("A", "$1")],
                extras: vec![],
            },
            FeeRow {
                fee_type: FeeType::MemberType,
                tiers: vec![TierValue::new("A", "X")],
                extras: vec![TierValue::new("B", "Y")],
            },
        ];
        assert_eq!(render_pricing_text(&rows), "Member Type: A: X | B: Y\nElevate: A: $1");
    }

    #[test]
    fn test_fee_type_matching() {
        assert_eq!(FeeType::from_cell("Enrollment 12 M"), Some(FeeType::Enrollment12M));
        assert_eq!(FeeType::from_cell("non-eft fee"), Some(FeeType::NonEftFee));
        assert_eq!(FeeType::from_cell("Annual Fee"), None);
    }

    #[test]
    fn test_extract_legacy_pricing() {
        let text = "Club Name: Madison\n\nPricing Details:\nMember Type: One Club: OC\nElevate: One Club: $5\n  \nNetwork Name: X";
        assert_eq!(
            extract_legacy_pricing(text).unwrap(),
            "Member Type: One Club: OC\nElevate: One Club: $5"
        );

        let text = "Member Type: One Club: OC";
        assert_eq!(extract_legacy_pricing(text).unwrap(), "Member Type: One Club: OC");

        assert_eq!(extract_legacy_pricing("Club Name: Madison\nnothing here"), None);
    }
}
