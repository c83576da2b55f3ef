// Club Pricing - Core Library
// CSV pricing export → per-club text → spliced location documents

pub mod config;
pub mod error;
pub mod formatter;
pub mod logging;
pub mod matcher;
pub mod normalize;
pub mod pricing;
pub mod sheet;
pub mod splicer;
pub mod splitter;
pub mod workflow;

// Re-export commonly used types
pub use config::{ColumnLayout, DisclaimerConfig, PricingConfig, ProgramColumn, CANONICAL_DISCLAIMER};
pub use error::{PricingError, Result};
pub use formatter::{ClubInfo, FormattedPricing, PricingFormatter};
pub use matcher::{ClubMatcher, MatchReport, MatchRule, MatchWarning};
pub use normalize::{normalize_club_name, NameNormalizer};
pub use pricing::{
    extract_legacy_pricing, render_pricing_text, ClubPricingRecord, FeeRow, FeeType,
    PricingTableBuilder, TierValue,
};
pub use sheet::{ColumnDetector, ColumnMap, PricingSheet};
pub use splicer::{
    splice_pricing, DisclaimerOutcome, DisclaimerStrategy, DocumentRegion, DocumentSplicer,
    StrategyResult,
};
pub use splitter::{club_file_name, split_club_sections, write_club_files, ClubSection, SplitReport};
pub use workflow::{RunOptions, RunSummary, Workflow, WorkflowPaths};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
