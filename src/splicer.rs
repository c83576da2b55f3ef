// 🧩 Document Splicer - replaces the pricing block and fee disclaimer in place
//
// Documents are flat text, never parsed into a tree. Regions are located by
// anchor phrases and replaced by byte range on an in-memory buffer; the
// caller decides when to write.
//
// Disclaimer cascade (tried in order):
//   0. Already current   - both signatures present, no mutation
//   1. Generic sentence  - "An annual enhancement fee applies..."
//   2. Legacy detailed   - old wording with explicit dollar amounts
// A "Other terms and conditions apply" / "Click here" trailer found at the
// end of the region, or inside a legacy region extended to the card-fee
// clause, is consumed and re-appended after the canonical text.

use crate::config::{DisclaimerConfig, PricingConfig};
use crate::error::{PricingError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::debug;

pub const PRICING_REGION: &str = "pricing";
pub const DISCLAIMER_REGION: &str = "fee disclaimer";

const FEE_ANCHOR: &str = "annual enhancement fee";
const GENERIC_PHRASE: &str = "an annual enhancement fee applies";

// Search windows, in bytes, around the fee anchor
const GENERIC_LOOKBEHIND: usize = 50;
const GENERIC_LOOKAHEAD: usize = 400;
const LABEL_LOOKBEHIND: usize = 200;
const GENERIC_END_WINDOW: usize = 300;
const LINK_MAX_OFFSET: usize = 200;
const LEGACY_AMOUNT_WINDOW: usize = 500;
const TRAILER_PEEK: usize = 100;

// Pricing block: "Member Type:" ... label ... "available"; the end is then
// pushed to the next blank line or call-to-action
static PRICING_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)Member Type:.*?(?:SILVER SNEAKERS|Insurance Availability):.*?available").unwrap()
});
static PRICING_END: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\n|\n\[Get Started\]").unwrap());

static NOTE_LABEL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)\*\*Note:\*\*\s*$").unwrap());
static ADDITIONAL_FEES_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?mi)\*\*Additional\s+Fees?:\*\*\s*$").unwrap());

static TERMS_TRAILER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)Other\s+terms\s+and\s+conditions\s+apply[^.]*?\.?\s*(?:\[Click\s+here[^\]]*?\]\([^\)]+\))?")
        .unwrap()
});
static LINK_TRAILER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\[Click\s+here[^\]]*?\]\([^\)]+\)").unwrap());
static LEADING_TRAILER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?is)^\s*(Other\s+terms\s+and\s+conditions\s+apply[^.]*?\.?\s*(?:\[Click\s+here[^\]]*?\]\([^\)]+\))?|\[Click\s+here[^\]]*?\]\([^\)]+\))",
    )
    .unwrap()
});

// Up to two sentences, never past the current line
static SENTENCES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\n]*?\.(?:[ \t]+[^\n]*?\.[ \t]*(?:\n|$))?").unwrap());

static LEGACY_END: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\s+Other\s+terms\s+and\s+conditions\s+apply|\[Click\s+here|\n\n#").unwrap()
});

// ============================================================================
// REGION / OUTCOME TYPES
// ============================================================================

/// Half-open byte range `[start, end)` inside a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DocumentRegion {
    pub start: usize,
    pub end: usize,
}

impl DocumentRegion {
    pub fn new(start: usize, end: usize) -> Self {
        DocumentRegion { start, end }
    }

    pub fn slice<'d>(&self, doc: &'d str) -> &'d str {
        &doc[self.start..self.end]
    }

    /// Replace the region, keeping everything around it byte-for-byte
    pub fn replace(&self, doc: &str, replacement: &str) -> String {
        let mut out = String::with_capacity(doc.len() + replacement.len());
        out.push_str(&doc[..self.start]);
        out.push_str(replacement);
        out.push_str(&doc[self.end..]);
        out
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DisclaimerStrategy {
    GenericSentence,
    LegacyDetailed,
}

impl DisclaimerStrategy {
    /// Cascade order
    pub const ALL: [DisclaimerStrategy; 2] = [
        DisclaimerStrategy::GenericSentence,
        DisclaimerStrategy::LegacyDetailed,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            DisclaimerStrategy::GenericSentence => "generic sentence",
            DisclaimerStrategy::LegacyDetailed => "legacy detailed",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StrategyResult {
    Matched {
        region: DocumentRegion,
        preserved_trailer: Option<String>,
    },
    NoMatch,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DisclaimerOutcome {
    /// Region replaced; `text` is the whole updated document
    Replaced {
        strategy: DisclaimerStrategy,
        text: String,
    },

    /// Canonical text already present, document untouched
    AlreadyCurrent,
}

// ============================================================================
// PRICING SPLICE
// ============================================================================

/// Region of the first pricing block, if the document has one
pub fn locate_pricing(doc: &str) -> Option<DocumentRegion> {
    let block = PRICING_BLOCK.find(doc)?;
    let end = PRICING_END
        .find(&doc[block.end()..])
        .map(|m| block.end() + m.start())
        .unwrap_or(doc.len());
    Some(DocumentRegion::new(block.start(), end))
}

/// Replace the first pricing block with `new_content`
pub fn splice_pricing(doc: &str, new_content: &str) -> Result<String> {
    let region = locate_pricing(doc).ok_or(PricingError::RegionNotFound {
        region: PRICING_REGION,
    })?;
    debug!(start = region.start, end = region.end, "Pricing block located");
    Ok(region.replace(doc, new_content))
}

// ============================================================================
// FEE DISCLAIMER SPLICE
// ============================================================================

pub struct DocumentSplicer {
    disclaimer: DisclaimerConfig,
}

impl DocumentSplicer {
    pub fn new(config: &PricingConfig) -> Self {
        DocumentSplicer {
            disclaimer: config.disclaimer.clone(),
        }
    }

    pub fn canonical_text(&self) -> &str {
        &self.disclaimer.canonical_text
    }

    pub fn is_current(&self, doc: &str) -> bool {
        !self.disclaimer.signatures.is_empty()
            && self
                .disclaimer
                .signatures
                .iter()
                .all(|signature| doc.contains(signature.as_str()))
    }

    /// Byte offset of the first "annual enhancement fee", any casing
    pub fn find_anchor(&self, doc: &str) -> Option<usize> {
        doc.to_ascii_lowercase().find(FEE_ANCHOR)
    }

    /// Replace the fee disclaimer with the canonical text.
    ///
    /// Idempotent: a second call on the output reports `AlreadyCurrent`.
    pub fn splice_fee_disclaimer(&self, doc: &str) -> Result<DisclaimerOutcome> {
        if self.is_current(doc) {
            return Ok(DisclaimerOutcome::AlreadyCurrent);
        }

        let not_found = PricingError::RegionNotFound {
            region: DISCLAIMER_REGION,
        };
        let anchor = self.find_anchor(doc).ok_or(not_found)?;

        for strategy in DisclaimerStrategy::ALL {
            if let StrategyResult::Matched {
                region,
                preserved_trailer,
            } = self.apply_strategy(strategy, doc, anchor)
            {
                debug!(
                    strategy = strategy.name(),
                    start = region.start,
                    end = region.end,
                    trailer = preserved_trailer.is_some(),
                    "Fee disclaimer located"
                );

                let mut replacement = self.disclaimer.canonical_text.clone();
                if let Some(trailer) = preserved_trailer {
                    replacement.push_str("\n\n");
                    replacement.push_str(&trailer);
                }

                return Ok(DisclaimerOutcome::Replaced {
                    strategy,
                    text: region.replace(doc, &replacement),
                });
            }
        }

        Err(PricingError::RegionNotFound {
            region: DISCLAIMER_REGION,
        })
    }

    pub fn apply_strategy(&self, strategy: DisclaimerStrategy, doc: &str, anchor: usize) -> StrategyResult {
        match strategy {
            DisclaimerStrategy::GenericSentence => self.generic_sentence(doc, anchor),
            DisclaimerStrategy::LegacyDetailed => self.legacy_detailed(doc, anchor),
        }
    }

    /// Strategy 1: short generic sentence without dollar amounts
    pub fn generic_sentence(&self, doc: &str, anchor: usize) -> StrategyResult {
        let lower = doc.to_ascii_lowercase();
        let window_start = floor_boundary(doc, anchor.saturating_sub(GENERIC_LOOKBEHIND));
        let window_end = ceil_boundary(doc, anchor + GENERIC_LOOKAHEAD);

        let window = &lower[window_start..window_end];
        let has_applies = window.contains("applies") && window.contains(FEE_ANCHOR);
        let raw_window = &doc[window_start..window_end];
        let has_amounts = raw_window.contains(self.disclaimer.card_fee_amount.as_str())
            || self
                .disclaimer
                .detailed_amounts
                .iter()
                .any(|amount| raw_window.contains(amount.as_str()));

        if !has_applies || has_amounts {
            return StrategyResult::NoMatch;
        }

        let phrase_pos = lower[window_start..]
            .find(GENERIC_PHRASE)
            .map(|pos| window_start + pos)
            .unwrap_or(anchor);

        let start = label_start(doc, phrase_pos, &[&*NOTE_LABEL]);

        let after_end = ceil_boundary(doc, phrase_pos + GENERIC_END_WINDOW);
        let after = &doc[phrase_pos..after_end];

        let (end, preserved_trailer) = if let Some(m) = TERMS_TRAILER.find(after) {
            let trailer = m.as_str().trim_end();
            (phrase_pos + m.start() + trailer.len(), Some(trailer.to_string()))
        } else if let Some(m) = LINK_TRAILER.find(after).filter(|m| m.start() < LINK_MAX_OFFSET) {
            (phrase_pos + m.end(), Some(m.as_str().to_string()))
        } else if let Some(m) = SENTENCES.find(after) {
            (phrase_pos + m.as_str().trim_end().len(), None)
        } else {
            let line = after.split('\n').next().unwrap_or(after);
            (phrase_pos + line.len(), None)
        };

        StrategyResult::Matched {
            region: DocumentRegion::new(start, end),
            preserved_trailer,
        }
    }

    /// Strategy 2: old detailed wording with the legacy dollar amounts
    pub fn legacy_detailed(&self, doc: &str, anchor: usize) -> StrategyResult {
        let amount_window = &doc[anchor..ceil_boundary(doc, anchor + LEGACY_AMOUNT_WINDOW)];
        let has_legacy_amount = self
            .disclaimer
            .detailed_amounts
            .iter()
            .any(|amount| amount_window.contains(amount.as_str()));

        if !has_legacy_amount {
            return StrategyResult::NoMatch;
        }

        let start = label_start(doc, anchor, &[&*NOTE_LABEL, &*ADDITIONAL_FEES_LABEL]);

        let remaining = &doc[anchor..];
        let candidate = next_legacy_end(remaining, 0);

        let mut end = candidate;
        let mut trailers = Vec::new();
        if !self.has_card_clause(&remaining[..candidate]) {
            // The card-fee sentence sits past the first stop; extend to it,
            // carrying over any trailer or link the extension covers
            if let Some(clause) = self.find_card_clause(remaining, candidate) {
                end = next_legacy_end(remaining, clause);
                trailers = trailers_within(&remaining[candidate..end]);
            }
        }

        let peek = &remaining[end..ceil_boundary(remaining, end + TRAILER_PEEK)];
        if let Some(caps) = LEADING_TRAILER.captures(peek) {
            if let Some(group) = caps.get(1) {
                let trailer = group.as_str().trim_end();
                trailers.push(trailer.to_string());
                end += group.start() + trailer.len();
            }
        }

        let preserved_trailer = if trailers.is_empty() {
            None
        } else {
            Some(trailers.join(" "))
        };

        StrategyResult::Matched {
            region: DocumentRegion::new(start, anchor + end),
            preserved_trailer,
        }
    }

    fn has_card_clause(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        text.contains(self.disclaimer.card_fee_amount.as_str())
            || lower.contains("credit card")
            || lower.contains("debit card")
    }

    fn find_card_clause(&self, text: &str, from: usize) -> Option<usize> {
        let lower = text[from..].to_ascii_lowercase();
        [
            text[from..].find(self.disclaimer.card_fee_amount.as_str()),
            lower.find("credit card"),
            lower.find("debit card"),
        ]
        .into_iter()
        .flatten()
        .min()
        .map(|pos| from + pos)
    }
}

/// First trailer/link/heading stop at or after `from`, else end of text
fn next_legacy_end(text: &str, from: usize) -> usize {
    LEGACY_END
        .find(&text[from..])
        .map(|m| from + m.start())
        .unwrap_or(text.len())
}

/// Terms trailers and standalone links in `text`, in document order
fn trailers_within(text: &str) -> Vec<String> {
    let terms: Vec<_> = TERMS_TRAILER.find_iter(text).collect();
    let mut found: Vec<(usize, &str)> = terms
        .iter()
        .map(|m| (m.start(), m.as_str().trim_end()))
        .collect();

    for link in LINK_TRAILER.find_iter(text) {
        let inside_terms = terms
            .iter()
            .any(|t| link.start() < t.end() && t.start() < link.end());
        if !inside_terms {
            found.push((link.start(), link.as_str()));
        }
    }

    found.sort_by_key(|(start, _)| *start);
    found.into_iter().map(|(_, s)| s.to_string()).collect()
}

/// Start of the region: a bold label shortly before `pos`, else the line start
fn label_start(doc: &str, pos: usize, labels: &[&Regex]) -> usize {
    let window_start = floor_boundary(doc, pos.saturating_sub(LABEL_LOOKBEHIND));
    let before = &doc[window_start..pos];

    labels
        .iter()
        .find_map(|label| label.find(before))
        .map(|m| window_start + m.start())
        .unwrap_or_else(|| doc[..pos].rfind('\n').map(|i| i + 1).unwrap_or(0))
}

fn floor_boundary(s: &str, idx: usize) -> usize {
    let mut idx = idx.min(s.len());
    while !s.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

fn ceil_boundary(s: &str, idx: usize) -> usize {
    let mut idx = idx.min(s.len());
    while !s.is_char_boundary(idx) {
        idx += 1;
    }
    idx
}

// ============================================================================
// TESTS
// ============================================================================
