// 🔄 Pricing Workflow - the three batch stages and the run summary
//
//   1. format  CSV            → one formatted text file (all clubs)
//   2. split   formatted text → one text file per club
//   3. update  club files + location documents → updated copies
//
// Per-club and per-document failures are counted and logged; only a missing
// input or an unreadable CSV aborts a stage.

use crate::config::PricingConfig;
use crate::error::PricingError;
use crate::formatter::{FormattedPricing, PricingFormatter};
use crate::matcher::ClubMatcher;
use crate::pricing::{extract_legacy_pricing, PricingTableBuilder};
use crate::sheet::PricingSheet;
use crate::splicer::{splice_pricing, DisclaimerOutcome, DocumentSplicer};
use crate::splitter::{split_club_sections, write_club_files, SplitReport};
use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Date stamp used in generated file and directory names
pub const DATE_FORMAT: &str = "%d-%m-%y";

/// Today's stamp, or the given one after checking it parses as DD-MM-YY
pub fn stage_date(date: Option<&str>) -> Result<String> {
    match date {
        Some(d) => {
            NaiveDate::parse_from_str(d, DATE_FORMAT)
                .with_context(|| format!("Invalid date '{}', expected DD-MM-YY", d))?;
            Ok(d.to_string())
        }
        None => Ok(Local::now().format(DATE_FORMAT).to_string()),
    }
}

// ============================================================================
// PATHS
// ============================================================================

/// Dated output locations of one run
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowPaths {
    pub formatted_text: PathBuf,
    pub club_dir: PathBuf,
    pub updated_dir: PathBuf,
}

impl WorkflowPaths {
    pub fn for_date(work_dir: &Path, date: &str) -> Self {
        WorkflowPaths {
            formatted_text: work_dir.join(format!("pricing_formatted_{}.txt", date)),
            club_dir: work_dir.join(format!("club_files_{}", date)),
            updated_dir: work_dir.join(format!("updated_locations_{}", date)),
        }
    }
}

// ============================================================================
// RUN SUMMARY
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PricingSource {
    Csv,
    TextFile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PricingStatus {
    Updated,
    NoContent,
    RegionNotFound,
    IoFailure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DisclaimerStatus {
    Replaced,
    AlreadyCurrent,
    NotFound,
}

/// Outcome for one document; pricing and disclaimer succeed independently
#[derive(Debug, Clone, Serialize)]
pub struct DocumentReport {
    pub document: String,
    pub text_file: String,
    pub source: Option<PricingSource>,
    pub pricing: PricingStatus,
    pub disclaimer: Option<DisclaimerStatus>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub text_files_matched: usize,
    pub documents_processed: usize,
    pub pricing_updated: usize,
    pub pricing_failed: usize,
    pub disclaimer_replaced: usize,
    pub disclaimer_already_current: usize,
    pub disclaimer_not_found: usize,
    pub warnings: Vec<String>,
    pub documents: Vec<DocumentReport>,
}

impl RunSummary {
    pub fn summary(&self) -> String {
        format!(
            "{} club files matched, {} documents processed: pricing {} updated / {} failed, disclaimer {} replaced / {} already current / {} not found",
            self.text_files_matched,
            self.documents_processed,
            self.pricing_updated,
            self.pricing_failed,
            self.disclaimer_replaced,
            self.disclaimer_already_current,
            self.disclaimer_not_found
        )
    }

    pub fn print(&self) {
        println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        println!("📊 Update Summary");
        println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        println!("  Club files matched:   {}", self.text_files_matched);
        println!("  Documents processed:  {}", self.documents_processed);
        println!("  ✓ Pricing updated:    {}", self.pricing_updated);
        println!("  ✗ Pricing failed:     {}", self.pricing_failed);
        println!();
        println!("  Fee disclaimer:");
        println!("  ✓ Replaced:           {}", self.disclaimer_replaced);
        println!("  ✓ Already current:    {}", self.disclaimer_already_current);
        println!("  ✗ Not found:          {}", self.disclaimer_not_found);
        if !self.warnings.is_empty() {
            println!();
            println!("  ⚠️  {} warning(s)", self.warnings.len());
        }
        println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).with_context(|| format!("Failed to write summary to {}", path.display()))
    }

    fn record_disclaimer(&mut self, status: DisclaimerStatus) {
        match status {
            DisclaimerStatus::Replaced => self.disclaimer_replaced += 1,
            DisclaimerStatus::AlreadyCurrent => self.disclaimer_already_current += 1,
            DisclaimerStatus::NotFound => self.disclaimer_not_found += 1,
        }
    }

    fn warn(&mut self, message: String) {
        warn!("{}", message);
        self.warnings.push(message);
    }
}

// ============================================================================
// WORKFLOW
// ============================================================================

pub struct Workflow {
    config: PricingConfig,
}

impl Workflow {
    pub fn new(config: PricingConfig) -> Self {
        Workflow { config }
    }

    pub fn config(&self) -> &PricingConfig {
        &self.config
    }

    /// Stage 1: CSV → formatted multi-club text
    pub fn format_stage(&self, csv: &Path, output: &Path) -> Result<FormattedPricing> {
        if !csv.is_file() {
            bail!("CSV not found: {}", csv.display());
        }

        let sheet = PricingSheet::from_path(csv)
            .with_context(|| format!("Failed to read pricing CSV {}", csv.display()))?;
        info!(rows = sheet.rows.len(), csv = %csv.display(), "Loaded pricing CSV");

        let formatted = PricingFormatter::new(&self.config).format_sheet(&sheet)?;

        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(output, &formatted.text)
            .with_context(|| format!("Failed to write {}", output.display()))?;

        info!(clubs = formatted.clubs.len(), output = %output.display(), "Formatted pricing written");
        Ok(formatted)
    }

    /// Stage 2: formatted text → one file per club
    pub fn split_stage(&self, input: &Path, output_dir: &Path) -> Result<SplitReport> {
        if !input.is_file() {
            bail!("Formatted file not found: {}", input.display());
        }

        let text = fs::read_to_string(input)
            .with_context(|| format!("Failed to read {}", input.display()))?;
        let sections = split_club_sections(&text);
        if sections.is_empty() {
            warn!(input = %input.display(), "No club sections found");
        }

        let report = write_club_files(&sections, output_dir, &self.config.text_extension)?;
        info!(
            written = report.written.len(),
            failed = report.failed.len(),
            output = %output_dir.display(),
            "Club files split"
        );
        Ok(report)
    }

    /// Stage 3: splice pricing and the fee disclaimer into copies of the documents
    pub fn update_stage(
        &self,
        club_dir: &Path,
        docs_dir: &Path,
        output_dir: &Path,
        csv: Option<&Path>,
    ) -> Result<RunSummary> {
        if !club_dir.is_dir() {
            bail!("Club files directory not found: {}", club_dir.display());
        }
        if !docs_dir.is_dir() {
            bail!("Document directory not found: {}", docs_dir.display());
        }
        fs::create_dir_all(output_dir)
            .with_context(|| format!("Failed to create {}", output_dir.display()))?;

        let extension = self.config.text_extension.as_str();
        let suffix = self.config.document_suffix.as_str();
        let text_files = list_files(club_dir, |name| {
            Path::new(name).extension().and_then(|e| e.to_str()) == Some(extension)
        })?;
        let documents = list_files(docs_dir, |name| name.ends_with(suffix))?;
        info!(
            text_files = text_files.len(),
            documents = documents.len(),
            "Building club file mapping"
        );

        let matcher = ClubMatcher::new(&self.config)?;
        let report = matcher.match_files(&text_files, &documents);

        let mut summary = RunSummary {
            text_files_matched: report.pair_count(),
            warnings: report.warnings.iter().map(|w| w.to_string()).collect(),
            ..RunSummary::default()
        };
        info!(pairs = report.pair_count(), "Club file mapping built");

        let sheet = match csv {
            Some(path) => Some(
                PricingSheet::from_path(path)
                    .with_context(|| format!("Failed to read pricing CSV {}", path.display()))?,
            ),
            None => None,
        };
        let builder = sheet
            .as_ref()
            .map(|sheet| PricingTableBuilder::new(&self.config, sheet))
            .transpose()?;

        let splicer = DocumentSplicer::new(&self.config);
        let mut disclaimer_seen: BTreeMap<PathBuf, DisclaimerStatus> = BTreeMap::new();

        for (text_file, docs) in &report.mapping {
            let club = matcher.normalizer().name_from_text_file(text_file);
            let text_name = file_name(text_file);
            info!(club = %club, file = %text_name, "Processing club");

            let Some((content, source)) = self.pricing_content(builder.as_ref(), &club, text_file, &mut summary)
            else {
                summary.pricing_failed += docs.len();
                summary.warn(format!("No pricing content for {} ({})", club, text_name));
                for doc in docs {
                    summary.documents.push(DocumentReport {
                        document: file_name(doc),
                        text_file: text_name.clone(),
                        source: None,
                        pricing: PricingStatus::NoContent,
                        disclaimer: None,
                    });
                }
                continue;
            };

            for doc in docs {
                summary.documents_processed += 1;
                let target = output_dir.join(file_name(doc));
                let (pricing, disclaimer) =
                    self.update_document(&splicer, doc, &target, &content, &mut summary);

                match pricing {
                    PricingStatus::Updated => summary.pricing_updated += 1,
                    _ => summary.pricing_failed += 1,
                }
                if let Some(status) = disclaimer {
                    disclaimer_seen.insert(target.clone(), status);
                }

                summary.documents.push(DocumentReport {
                    document: file_name(doc),
                    text_file: text_name.clone(),
                    source: Some(source),
                    pricing,
                    disclaimer,
                });
            }
        }

        self.disclaimer_sweep(&splicer, output_dir, &mut disclaimer_seen, &mut summary)?;
        for status in disclaimer_seen.values() {
            summary.record_disclaimer(*status);
        }

        info!("{}", summary.summary());
        Ok(summary)
    }

    /// Pricing text for a club: CSV first, then the club's own text file
    fn pricing_content(
        &self,
        builder: Option<&PricingTableBuilder>,
        club: &str,
        text_file: &Path,
        summary: &mut RunSummary,
    ) -> Option<(String, PricingSource)> {
        if let Some(builder) = builder {
            match builder.build(club) {
                Ok(record) => {
                    let rendered = record.render();
                    if !rendered.is_empty() {
                        let extras: usize = record.rows.iter().map(|r| r.extras.len()).max().unwrap_or(0);
                        debug!(club = %club, rows = record.rows.len(), extras, "Pricing built from CSV");
                        return Some((rendered, PricingSource::Csv));
                    }
                    debug!(club = %club, "CSV rows carry no known fee types");
                }
                Err(e @ (PricingError::ClubNotFound { .. } | PricingError::ColumnNotFound { .. })) => {
                    debug!(club = %club, "CSV pricing unavailable: {}", e);
                }
                Err(e) => {
                    summary.warn(format!("[{}] CSV pricing failed for {}: {}", e.kind(), club, e));
                }
            }
        }

        match fs::read_to_string(text_file) {
            Ok(text) => extract_legacy_pricing(&text).map(|content| (content, PricingSource::TextFile)),
            Err(e) => {
                summary.warn(format!("Failed to read {}: {}", text_file.display(), e));
                None
            }
        }
    }

    /// Copy, splice pricing then disclaimer on one buffer, write once
    fn update_document(
        &self,
        splicer: &DocumentSplicer,
        source: &Path,
        target: &Path,
        content: &str,
        summary: &mut RunSummary,
    ) -> (PricingStatus, Option<DisclaimerStatus>) {
        let name = file_name(source);

        if let Err(e) = fs::copy(source, target) {
            summary.warn(format!("Failed to copy {}: {}", name, e));
            return (PricingStatus::IoFailure, None);
        }

        let original = match fs::read_to_string(target) {
            Ok(text) => text,
            Err(e) => {
                summary.warn(format!("Failed to read {}: {}", target.display(), e));
                return (PricingStatus::IoFailure, None);
            }
        };

        let (mut buffer, pricing) = match splice_pricing(&original, content) {
            Ok(updated) => (updated, PricingStatus::Updated),
            Err(e) => {
                summary.warn(format!("[{}] {}: {}", e.kind(), name, e));
                (original.clone(), PricingStatus::RegionNotFound)
            }
        };

        let disclaimer = match splicer.splice_fee_disclaimer(&buffer) {
            Ok(DisclaimerOutcome::Replaced { strategy, text }) => {
                debug!(document = %name, strategy = strategy.name(), "Fee disclaimer replaced");
                buffer = text;
                DisclaimerStatus::Replaced
            }
            Ok(DisclaimerOutcome::AlreadyCurrent) => DisclaimerStatus::AlreadyCurrent,
            Err(e) => {
                warn!(document = %name, "{}", e);
                DisclaimerStatus::NotFound
            }
        };

        if buffer != original {
            if let Err(e) = fs::write(target, &buffer) {
                summary.warn(format!("Failed to write {}: {}", target.display(), e));
                return (PricingStatus::IoFailure, None);
            }
        }

        info!(document = %name, pricing = ?pricing, disclaimer = ?disclaimer, "Document updated");
        (pricing, Some(disclaimer))
    }

    /// Disclaimer pass over every document in the output directory.
    /// Documents already handled above keep their recorded status.
    fn disclaimer_sweep(
        &self,
        splicer: &DocumentSplicer,
        output_dir: &Path,
        seen: &mut BTreeMap<PathBuf, DisclaimerStatus>,
        summary: &mut RunSummary,
    ) -> Result<()> {
        let suffix = self.config.document_suffix.as_str();
        let documents = list_files(output_dir, |name| name.ends_with(suffix))?;
        info!(documents = documents.len(), "Fee disclaimer sweep");

        for doc in documents {
            let text = match fs::read_to_string(&doc) {
                Ok(text) => text,
                Err(e) => {
                    summary.warn(format!("Failed to read {}: {}", doc.display(), e));
                    continue;
                }
            };

            let status = match splicer.splice_fee_disclaimer(&text) {
                Ok(DisclaimerOutcome::Replaced { text: updated, .. }) => {
                    match fs::write(&doc, updated) {
                        Ok(()) => DisclaimerStatus::Replaced,
                        Err(e) => {
                            summary.warn(format!("Failed to write {}: {}", doc.display(), e));
                            DisclaimerStatus::NotFound
                        }
                    }
                }
                Ok(DisclaimerOutcome::AlreadyCurrent) => DisclaimerStatus::AlreadyCurrent,
                Err(_) => DisclaimerStatus::NotFound,
            };

            if !seen.contains_key(&doc) {
                if status == DisclaimerStatus::NotFound {
                    summary.warn(format!("Fee disclaimer not found in {}", file_name(&doc)));
                }
                seen.insert(doc, status);
            }
        }

        Ok(())
    }

    /// All three stages in order; skipped stages reuse the dated paths
    pub fn run(&self, options: &RunOptions) -> Result<Option<RunSummary>> {
        let date = stage_date(options.date.as_deref())?;
        let paths = WorkflowPaths::for_date(&options.work_dir, &date);

        info!(date = %date, csv = %options.csv.display(), docs = %options.docs_dir.display(), "Starting pricing workflow");

        if options.skip_format {
            info!("Skipping stage 1 (format)");
        } else {
            println!("\n📂 Stage 1: CSV → formatted text");
            let formatted = self.format_stage(&options.csv, &paths.formatted_text)?;
            println!("✓ {} clubs → {}", formatted.clubs.len(), paths.formatted_text.display());
        }

        if options.skip_split {
            info!("Skipping stage 2 (split)");
        } else {
            println!("\n✂️  Stage 2: formatted text → club files");
            let report = self.split_stage(&paths.formatted_text, &paths.club_dir)?;
            println!("✓ {} club files → {}", report.written.len(), paths.club_dir.display());
        }

        if options.skip_update {
            info!("Skipping stage 3 (update)");
            return Ok(None);
        }

        println!("\n🧩 Stage 3: update location documents");
        let csv = options.csv.is_file().then_some(options.csv.as_path());
        let summary = self.update_stage(&paths.club_dir, &options.docs_dir, &paths.updated_dir, csv)?;
        println!("✓ Updated documents in {}", paths.updated_dir.display());
        Ok(Some(summary))
    }
}

impl Default for Workflow {
    fn default() -> Self {
        Self::new(PricingConfig::default())
    }
}

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub csv: PathBuf,
    pub docs_dir: PathBuf,
    pub work_dir: PathBuf,
    pub date: Option<String>,
    pub skip_format: bool,
    pub skip_split: bool,
    pub skip_update: bool,
}

/// Regular files in `dir` whose name passes `keep`, sorted
fn list_files<F>(dir: &Path, keep: F) -> Result<Vec<PathBuf>>
where
    F: Fn(&str) -> bool,
{
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("Failed to list {}", dir.display()))? {
        let path = entry
            .with_context(|| format!("Failed to list {}", dir.display()))?
            .path();
        let keep_it = path.is_file()
            && path
                .file_name()
                .and_then(|n| n.to_str())
                .map(&keep)
                .unwrap_or(false);
        if keep_it {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CANONICAL_DISCLAIMER;
    use tempfile::TempDir;

    const HEADER: &str = "Club ID,Club Name,Club Level,Local Name,Local Access,Elevate Offering,Add On Fees,C7,C8,C9,C10,C11,One Club,Local Network,Network Plus,Basic Local Network,Fitness Plus Local Network,Lifestyle Local Network,OPTUM RENEW - NFC,SILVER SNEAKERS";

    fn csv_text() -> String {
        [
            HEADER,
            "101,CFF: Rocklin East,Gold,NetA,Full,None,Member Type,,,,,,OC,LN,LNP,,,,,x",
            "101,CFF: Rocklin East,Gold,NetA,Full,None,Main Dues MTM,,,,,,$10,$15,$20,,,,$25,x",
            "102,Madison I-80,Gold,NetA,Full,None,Main Dues MTM,,,,,,$11,$16,$21,,,,,",
        ]
        .join("\n")
    }

    fn document(club: &str) -> String {
        format!(
            "# {}\n\nMember Type: One Club: OLD\nMain Dues MTM: One Club: $1\n\nAvailability:\nSILVER SNEAKERS: available | Peer Fit: not available\n\n[Get Started](https://join)\n\n**Note:**\nAn Annual Enhancement Fee applies. Other terms and conditions apply. [Click here](https://terms)\n",
            club
        )
    }

    struct Fixture {
        _dir: TempDir,
        root: PathBuf,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let root = dir.path().to_path_buf();
            fs::create_dir_all(root.join("docs")).unwrap();
            fs::write(root.join("pricing.csv"), csv_text()).unwrap();
            fs::write(
                root.join("docs/www.inshape.com_gyms_rocklin-east-california-95677_clean.md"),
                document("Rocklin East"),
            )
            .unwrap();
            fs::write(
                root.join("docs/www.inshape.com_gyms_madison-i-80-california-95608_clean.md"),
                document("Madison"),
            )
            .unwrap();
            fs::write(root.join("docs/notes.txt"), "not a location document").unwrap();
            Fixture { _dir: dir, root }
        }

        fn path(&self, rel: &str) -> PathBuf {
            self.root.join(rel)
        }
    }

    #[test]
    fn test_stage_date() {
        assert_eq!(stage_date(Some("31-01-26")).unwrap(), "31-01-26");
        assert!(stage_date(Some("2026-01-31")).is_err());
        assert_eq!(stage_date(None).unwrap().len(), 8);
    }

    #[test]
    fn test_paths_for_date() {
        let paths = WorkflowPaths::for_date(Path::new("work"), "31-01-26");
        assert_eq!(paths.formatted_text, PathBuf::from("work/pricing_formatted_31-01-26.txt"));
        assert_eq!(paths.club_dir, PathBuf::from("work/club_files_31-01-26"));
    }

    #[test]
    fn test_format_and_split() {
        let fx = Fixture::new();
        let workflow = Workflow::default();

        let formatted = workflow
            .format_stage(&fx.path("pricing.csv"), &fx.path("out/formatted.txt"))
            .unwrap();
        assert_eq!(formatted.clubs.len(), 2);

        let report = workflow
            .split_stage(&fx.path("out/formatted.txt"), &fx.path("clubs"))
            .unwrap();
        assert_eq!(report.written.len(), 2);

        let rocklin = fs::read_to_string(fx.path("clubs/CFF__Rocklin_East.txt")).unwrap();
        assert!(rocklin.contains("Main Dues MTM: One Club: $10 | Local Network: $15 | Lifestyle Network Plus: $20"));
        assert!(fx.path("clubs/Madison_I-80.txt").exists());
    }

    #[test]
    fn test_missing_inputs_abort() {
        let fx = Fixture::new();
        let workflow = Workflow::default();

        assert!(workflow
            .format_stage(&fx.path("missing.csv"), &fx.path("out.txt"))
            .is_err());
        assert!(workflow
            .update_stage(&fx.path("no_clubs"), &fx.path("docs"), &fx.path("updated"), None)
            .is_err());
    }

    #[test]
    fn test_update_stage_from_csv() {
        let fx = Fixture::new();
        let workflow = Workflow::default();
        workflow
            .format_stage(&fx.path("pricing.csv"), &fx.path("formatted.txt"))
            .unwrap();
        workflow
            .split_stage(&fx.path("formatted.txt"), &fx.path("clubs"))
            .unwrap();

        let summary = workflow
            .update_stage(&fx.path("clubs"), &fx.path("docs"), &fx.path("updated"), Some(&fx.path("pricing.csv")))
            .unwrap();

        assert_eq!(summary.text_files_matched, 2);
        assert_eq!(summary.documents_processed, 2);
        assert_eq!(summary.pricing_updated, 2);
        assert_eq!(summary.pricing_failed, 0);
        assert_eq!(summary.disclaimer_replaced, 2);
        assert!(summary.documents.iter().all(|d| d.source == Some(PricingSource::Csv)));

        let updated = fs::read_to_string(
            fx.path("updated/www.inshape.com_gyms_rocklin-east-california-95677_clean.md"),
        )
        .unwrap();
        assert!(updated.contains(
            "Main Dues MTM: One Club: $10 | Local Network: $15 | Lifestyle Network Plus: $20 | OPTUM RENEW: $25"
        ));
        assert!(updated.contains(&format!(
            "{}\n\nOther terms and conditions apply. [Click here](https://terms)",
            CANONICAL_DISCLAIMER
        )));
        assert!(updated.contains("\n\n[Get Started](https://join)"));

        // Source documents are never modified
        let source = fs::read_to_string(
            fx.path("docs/www.inshape.com_gyms_rocklin-east-california-95677_clean.md"),
        )
        .unwrap();
        assert_eq!(source, document("Rocklin East"));
    }

    #[test]
    fn test_update_stage_text_fallback_and_sweep() {
        let fx = Fixture::new();
        fs::create_dir_all(fx.path("clubs")).unwrap();
        fs::write(
            fx.path("clubs/CFF__Rocklin_East.txt"),
            "Club Name: CFF: Rocklin East\n\nPricing Details:\nMember Type: One Club: OC\nElevate: One Club: $5\n\nNetwork Name: NetA",
        )
        .unwrap();
        fs::write(fx.path("clubs/CFF__Lake_Tahoe.txt"), "Club Name: CFF: Lake Tahoe\n").unwrap();

        // A stale document from an earlier run, outside the mapping
        fs::create_dir_all(fx.path("updated")).unwrap();
        fs::write(
            fx.path("updated/www.inshape.com_gyms_stale_clean.md"),
            "**Note:** An annual enhancement fee applies.\n",
        )
        .unwrap();

        let workflow = Workflow::default();
        let summary = workflow
            .update_stage(&fx.path("clubs"), &fx.path("docs"), &fx.path("updated"), None)
            .unwrap();

        assert_eq!(summary.text_files_matched, 1);
        assert_eq!(summary.pricing_updated, 1);
        assert_eq!(summary.documents[0].source, Some(PricingSource::TextFile));
        assert!(summary.warnings.iter().any(|w| w.contains("lake tahoe")));
        // Rocklin East in the mapping, the stale document in the sweep
        assert_eq!(summary.disclaimer_replaced, 2);

        let updated = fs::read_to_string(
            fx.path("updated/www.inshape.com_gyms_rocklin-east-california-95677_clean.md"),
        )
        .unwrap();
        assert!(updated.contains("Member Type: One Club: OC\nElevate: One Club: $5\n\n[Get Started]"));

        let stale = fs::read_to_string(fx.path("updated/www.inshape.com_gyms_stale_clean.md")).unwrap();
        assert!(stale.starts_with(CANONICAL_DISCLAIMER));
    }

    #[test]
    fn test_partial_document_state() {
        let fx = Fixture::new();
        fs::create_dir_all(fx.path("clubs")).unwrap();
        fs::write(fx.path("clubs/CFF__Rocklin_East.txt"), "Member Type: One Club: OC\n").unwrap();
        fs::write(
            fx.path("docs/www.inshape.com_gyms_rocklin-east-california-95677_clean.md"),
            "# Rocklin East\n\nNo pricing block here.\n\nAn annual enhancement fee applies. Billed yearly.\n",
        )
        .unwrap();

        let summary = Workflow::default()
            .update_stage(&fx.path("clubs"), &fx.path("docs"), &fx.path("updated"), None)
            .unwrap();

        assert_eq!(summary.pricing_failed, 1);
        assert_eq!(summary.disclaimer_replaced, 1);
        let doc = &summary.documents[0];
        assert_eq!(doc.pricing, PricingStatus::RegionNotFound);
        assert_eq!(doc.disclaimer, Some(DisclaimerStatus::Replaced));
    }

    #[test]
    fn test_summary_json() {
        let fx = Fixture::new();
        let summary = RunSummary {
            text_files_matched: 3,
            pricing_updated: 2,
            ..RunSummary::default()
        };
        summary.write_json(&fx.path("summary.json")).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(fx.path("summary.json")).unwrap()).unwrap();
        assert_eq!(json["text_files_matched"], 3);
        assert_eq!(json["pricing_updated"], 2);
        assert!(summary.summary().starts_with("3 club files matched"));
    }

    #[test]
    fn test_run_all_stages() {
        let fx = Fixture::new();
        let options = RunOptions {
            csv: fx.path("pricing.csv"),
            docs_dir: fx.path("docs"),
            work_dir: fx.path("work"),
            date: Some("31-01-26".to_string()),
            skip_format: false,
            skip_split: false,
            skip_update: false,
        };

        let summary = Workflow::default().run(&options).unwrap().unwrap();
        assert_eq!(summary.pricing_updated, 2);
        assert!(fx.path("work/pricing_formatted_31-01-26.txt").exists());
        assert!(fx.path("work/club_files_31-01-26/CFF__Rocklin_East.txt").exists());
        assert!(fx
            .path("work/updated_locations_31-01-26/www.inshape.com_gyms_madison-i-80-california-95608_clean.md")
            .exists());
    }
}
