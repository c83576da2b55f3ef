// 🧾 Pricing Formatter - whole CSV → flat multi-club text
//
// One section per club, sorted by club name:
//   Club Name / Pricing Details / Network Name / Elevate Offering /
//   Availability, closed by an 80-column "=" separator.

use crate::config::PricingConfig;
use crate::error::Result;
use crate::pricing::{PricingTableBuilder, NOT_AVAILABLE};
use crate::sheet::{cell, PricingSheet};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info};

pub const SEPARATOR_WIDTH: usize = 80;

pub fn section_separator() -> String {
    "=".repeat(SEPARATOR_WIDTH)
}

// ============================================================================
// CLUB INFO
// ============================================================================

/// Club metadata, taken from the club's first row in the export
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClubInfo {
    pub id: String,
    pub name: String,
    pub identity: String,
    pub level: String,
    pub network_name: String,
    pub network_access: String,
    pub elevate_offering: String,
}

impl ClubInfo {
    fn has_network(&self) -> bool {
        !self.network_name.is_empty() && self.network_name != "NA"
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FormattedPricing {
    pub text: String,
    pub clubs: Vec<ClubInfo>,
}

// ============================================================================
// FORMATTER
// ============================================================================

pub struct PricingFormatter<'a> {
    config: &'a PricingConfig,
}

impl<'a> PricingFormatter<'a> {
    pub fn new(config: &'a PricingConfig) -> Self {
        PricingFormatter { config }
    }

    /// One entry per club identity, sorted by display name.
    /// Repeated header rows and rows too short for the fixed columns are skipped.
    pub fn collect_clubs(&self, sheet: &PricingSheet, builder: &PricingTableBuilder) -> Vec<ClubInfo> {
        let layout = &self.config.column_layout;
        let min_width = layout.min_width();
        let mut seen: BTreeMap<String, ClubInfo> = BTreeMap::new();

        for (line, row) in sheet.rows.iter().enumerate() {
            if row.len() < min_width {
                debug!(line = line + 2, "Skipping short row ({} cells)", row.len());
                continue;
            }

            let name = cell(row, layout.club_name);
            if name.is_empty() || name == "Club Name" {
                continue;
            }

            let identity = builder.identity(name);
            seen.entry(identity.clone()).or_insert_with(|| ClubInfo {
                id: cell(row, layout.club_id).to_string(),
                name: name.to_string(),
                identity,
                level: cell(row, layout.club_level).to_string(),
                network_name: cell(row, layout.network_name).to_string(),
                network_access: cell(row, layout.network_access).to_string(),
                elevate_offering: cell(row, layout.elevate_offering).to_string(),
            });
        }

        let mut clubs: Vec<ClubInfo> = seen.into_values().collect();
        clubs.sort_by(|a, b| a.name.cmp(&b.name));
        clubs
    }

    pub fn format_sheet(&self, sheet: &PricingSheet) -> Result<FormattedPricing> {
        let builder = PricingTableBuilder::new(self.config, sheet)?
            .with_min_width(self.config.column_layout.min_width());
        let clubs = self.collect_clubs(sheet, &builder);
        let programs = builder.columns().programs();

        info!(
            clubs = clubs.len(),
            programs = programs.len(),
            "Formatting pricing sheet"
        );

        // Network name -> every club on it (display names, sorted)
        let mut networks: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for club in clubs.iter().filter(|c| c.has_network()) {
            networks
                .entry(club.network_name.as_str())
                .or_default()
                .push(club.name.as_str());
        }
        for members in networks.values_mut() {
            members.sort();
        }

        let mut lines: Vec<String> = Vec::new();

        for club in &clubs {
            lines.push(format!("Club Name: {}", club.name));
            lines.push(String::new());
            lines.push("Pricing Details:".to_string());

            let rendered = builder.build_lenient(&club.name)?.render();
            if !rendered.is_empty() {
                lines.push(rendered);
            }
            lines.push(String::new());

            if club.has_network() {
                let others = networks
                    .get(club.network_name.as_str())
                    .map(|members| members.join(", "))
                    .unwrap_or_default();
                lines.push(format!(
                    "Network Name: {} (Other Clubs: {})",
                    club.network_name, others
                ));
            } else {
                lines.push(format!("Network Name: {} (Other Clubs: )", NOT_AVAILABLE));
            }

            let elevate = club.elevate_offering.trim();
            if elevate.is_empty() || elevate == "NA" || elevate == NOT_AVAILABLE {
                lines.push(format!("Elevate Offering: {}", NOT_AVAILABLE));
            } else {
                lines.push(format!("Elevate Offering: {}", elevate));
            }
            lines.push(String::new());

            if !programs.is_empty() {
                let rows = builder.club_rows(&club.name);
                let parts: Vec<String> = programs
                    .iter()
                    .map(|(program, col)| {
                        let offered = rows.iter().any(|row| {
                            let value = cell(row, *col);
                            !value.is_empty() && value != "-"
                        });
                        let status = if offered { "available" } else { "not available" };
                        format!("{}: {}", program, status)
                    })
                    .collect();

                lines.push("Availability:".to_string());
                lines.push(parts.join(" | "));
            }

            lines.push(section_separator());
            lines.push(String::new());
        }

        Ok(FormattedPricing {
            text: lines.join("\n"),
            clubs,
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================
