//! Per-file outcomes and the batch summary.

use crate::metrics;
use crate::pipeline::{Conversion, ConversionResult};
use crate::scan::Classification;

/// Which summary bucket an outcome counts toward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tally {
    Converted,
    Failed,
    Skipped,
}

/// What happened to one directory entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileOutcome {
    pub name: String,
    pub classification: Classification,
    /// Set only when conversion was attempted.
    pub result: Option<ConversionResult>,
    /// Error text for failed conversions.
    pub error: Option<String>,
}

impl FileOutcome {
    /// An entry that never reached conversion.
    pub fn skipped(name: impl Into<String>, classification: Classification) -> Self {
        Self {
            name: name.into(),
            classification,
            result: None,
            error: None,
        }
    }

    /// An entry that went through the pipeline.
    pub fn converted(name: impl Into<String>, conversion: &Conversion) -> Self {
        Self {
            name: name.into(),
            classification: Classification::ValidElf,
            result: Some(conversion.result),
            error: conversion.error.as_ref().map(ToString::to_string),
        }
    }

    #[must_use]
    pub const fn tally(&self) -> Tally {
        match self.result {
            Some(ConversionResult::Success) => Tally::Converted,
            Some(ConversionResult::ObjcopyFailed | ConversionResult::HexGenFailed) => Tally::Failed,
            None => Tally::Skipped,
        }
    }
}

/// Aggregate counts for a batch.
#[derive(Debug, Clone, Default)]
pub struct BatchSummary {
    pub converted: usize,
    pub failed: usize,
    pub skipped: usize,
    /// Every entry seen, in processing order.
    pub outcomes: Vec<FileOutcome>,
}

impl BatchSummary {
    #[must_use]
    pub const fn total(&self) -> usize {
        self.converted + self.failed + self.skipped
    }

    /// Add an outcome and record it in metrics.
    pub fn add(&mut self, outcome: FileOutcome) {
        match outcome.tally() {
            Tally::Converted => {
                metrics::record_converted();
                self.converted += 1;
            }
            Tally::Failed => {
                if let Some(result) = outcome.result {
                    metrics::record_failed(result.step());
                }
                self.failed += 1;
            }
            Tally::Skipped => {
                metrics::record_skipped(outcome.classification);
                self.skipped += 1;
            }
        }
        self.outcomes.push(outcome);
    }

    /// Outcome for the entry with this basename.
    #[must_use]
    pub fn outcome(&self, name: &str) -> Option<&FileOutcome> {
        self.outcomes.iter().find(|o| o.name == name)
    }

    /// Entries whose conversion failed.
    pub fn failures(&self) -> impl Iterator<Item = &FileOutcome> {
        self.outcomes
            .iter()
            .filter(|o| o.tally() == Tally::Failed)
    }
}

impl FromIterator<FileOutcome> for BatchSummary {
    fn from_iter<I: IntoIterator<Item = FileOutcome>>(iter: I) -> Self {
        let mut summary = Self::default();
        for outcome in iter {
            summary.add(outcome);
        }
        summary
    }
}

const RULE: &str = "============================================================";

/// Render the final summary block.
#[must_use]
pub fn render_summary(summary: &BatchSummary) -> String {
    let mut out = String::new();
    out.push_str(RULE);
    out.push('\n');
    out.push_str("Processing Complete! Full Summary:\n");
    out.push_str(&format!("  Successfully processed: {} files\n", summary.converted));
    out.push_str(&format!("  Failed to process:      {} files\n", summary.failed));
    out.push_str(&format!(
        "  Skipped (non-ELF/bin/hex): {} files\n",
        summary.skipped
    ));

    let mut failures = summary.failures().peekable();
    if failures.peek().is_some() {
        out.push_str("  Failures:\n");
        for failure in failures {
            let step = failure.result.map_or("?", ConversionResult::step);
            let error = failure.error.as_deref().unwrap_or("unknown error");
            let first_line = error.lines().next().unwrap_or_default();
            out.push_str(&format!("    {} ({step}): {first_line}\n", failure.name));
        }
    }

    out.push_str(RULE);
    out.push('\n');
    out
}

/// Print the final summary block to stdout.
pub fn print_summary(summary: &BatchSummary) {
    print!("{}", render_summary(summary));
}
