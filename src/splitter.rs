// ✂️ Club File Splitter - flat multi-club text → one text file per club

use crate::error::{PricingError, Result};
use crate::formatter::section_separator;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const CLUB_NAME_PREFIX: &str = "Club Name: ";

static INVALID_FILENAME_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r#"[<>:"/\\|?*]"#).unwrap());

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClubSection {
    /// The full "Club Name: ..." line
    pub name: String,
    /// Section lines joined with '\n', Club Name line included
    pub content: String,
}

impl ClubSection {
    pub fn club_name(&self) -> &str {
        self.name.strip_prefix(CLUB_NAME_PREFIX).unwrap_or(&self.name)
    }

    pub fn file_name(&self, extension: &str) -> String {
        format!("{}.{}", club_file_name(&self.name), extension)
    }
}

/// Split formatted text at each "Club Name: " line; separator lines are dropped
pub fn split_club_sections(text: &str) -> Vec<ClubSection> {
    let separator = section_separator();
    let mut sections = Vec::new();
    let mut current: Option<(String, Vec<&str>)> = None;

    for line in text.lines() {
        if line.starts_with(CLUB_NAME_PREFIX) {
            if let Some((name, lines)) = current.take() {
                sections.push(ClubSection {
                    name,
                    content: lines.join("\n"),
                });
            }
            current = Some((line.to_string(), vec![line]));
        } else if let Some((_, lines)) = current.as_mut() {
            if line != separator {
                lines.push(line);
            }
        }
    }

    if let Some((name, lines)) = current {
        sections.push(ClubSection {
            name,
            content: lines.join("\n"),
        });
    }

    sections
}

/// "Club Name: CFF: Rocklin East" -> "CFF__Rocklin_East"
pub fn club_file_name(section_name: &str) -> String {
    let name = section_name.replacen(CLUB_NAME_PREFIX, "", 1);
    let name = INVALID_FILENAME_CHARS.replace_all(&name, "_");
    name.replace(' ', "_")
        .trim_matches(|c| c == '.' || c == ' ')
        .to_string()
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SplitReport {
    pub written: Vec<PathBuf>,
    pub failed: Vec<(String, String)>,
}

/// Write one file per section; a failed write is reported, not fatal
pub fn write_club_files(sections: &[ClubSection], output_dir: &Path, extension: &str) -> Result<SplitReport> {
    fs::create_dir_all(output_dir).map_err(|e| PricingError::io(output_dir, e))?;

    let mut report = SplitReport::default();
    for section in sections {
        let path = output_dir.join(section.file_name(extension));
        match fs::write(&path, &section.content) {
            Ok(()) => {
                info!(club = section.club_name(), file = %path.display(), "Saved club file");
                report.written.push(path);
            }
            Err(e) => {
                warn!(club = section.club_name(), file = %path.display(), "Failed to save club file: {}", e);
                report
                    .failed
                    .push((section.club_name().to_string(), e.to_string()));
            }
        }
    }

    Ok(report)
}

// ============================================================================
// TESTS
// ============================================================================
