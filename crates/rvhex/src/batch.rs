//! Batch driver: scan → validate → convert, once per directory entry.

use std::path::Path;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::command::CommandRunner;
use crate::config::ConvertConfig;
use crate::pipeline;
use crate::scan::{self, Candidate, Classification, ScanEntry};
use crate::summary::{BatchSummary, FileOutcome};
use crate::terminal::Reporter;
use crate::validate::Validator;
use crate::{Error, Result};

/// Fail fast if the target directory is missing.
///
/// # Errors
///
/// [`Error::DirectoryNotFound`] if `dir` is not an existing directory.
pub fn check_target_dir(dir: &Path) -> Result<()> {
    if dir.is_dir() {
        Ok(())
    } else {
        Err(Error::DirectoryNotFound(dir.to_path_buf()))
    }
}

/// Run the validator on a prefiltered candidate.
///
/// A validator that cannot do its job yields [`Classification::NonElf`] with a
/// warning; the file is skipped rather than risk converting garbage.
pub fn classify(
    candidate: &Candidate,
    validator: &dyn Validator,
    reporter: &dyn Reporter,
) -> Classification {
    match validator.is_riscv_elf(&candidate.path) {
        Ok(true) => Classification::ValidElf,
        Ok(false) => {
            reporter.info(&format!(
                "Skipping non-ELF file: {} (format not recognized)",
                candidate.name
            ));
            Classification::NonElf
        }
        Err(e) => {
            warn!(path = %candidate.path.display(), validator = validator.name(), error = %e, "validation failed");
            reporter.warn(&format!(
                "Failed to check file format for {}: {e}",
                candidate.path.display()
            ));
            Classification::NonElf
        }
    }
}

/// Take one scanned entry through validation and, if valid, conversion.
pub fn process_entry(
    entry: &ScanEntry,
    config: &ConvertConfig,
    runner: &dyn CommandRunner,
    validator: &dyn Validator,
    reporter: &dyn Reporter,
) -> FileOutcome {
    let name = &entry.candidate.name;
    if let Some(skip) = entry.skip {
        debug!(file = %name, reason = %skip, "skipped");
        return FileOutcome::skipped(name.as_str(), skip);
    }

    match classify(&entry.candidate, validator, reporter) {
        Classification::ValidElf => {
            let conversion = pipeline::convert(&entry.candidate.path, config, runner, reporter);
            FileOutcome::converted(name.as_str(), &conversion)
        }
        other => FileOutcome::skipped(name.as_str(), other),
    }
}

/// Convert every eligible file in `config.target_dir`.
///
/// Individual failures are recorded in the summary and never stop the
/// batch. With more than one worker, files are processed on a rayon pool;
/// every file's artifacts depend only on its own name, so no coordination is
/// needed beyond merging the outcomes.
///
/// # Errors
///
/// [`Error::DirectoryNotFound`] if the target directory does not exist (no
/// file is touched), or [`Error::Io`] if it cannot be listed.
pub fn run_batch(
    config: &ConvertConfig,
    runner: &dyn CommandRunner,
    validator: &dyn Validator,
    reporter: &dyn Reporter,
) -> Result<BatchSummary> {
    check_target_dir(&config.target_dir)?;
    let entries = scan::scan_dir(&config.target_dir, &config.prefix)?;
    let workers = config.worker_count();
    info!(
        dir = %config.target_dir.display(),
        entries = entries.len(),
        workers,
        validator = validator.name(),
        "starting batch"
    );

    let process = |entry: &ScanEntry| process_entry(entry, config, runner, validator, reporter);

    if workers > 1 {
        match rayon::ThreadPoolBuilder::new().num_threads(workers).build() {
            Ok(pool) => {
                let outcomes: Vec<FileOutcome> =
                    pool.install(|| entries.par_iter().map(process).collect());
                return Ok(outcomes.into_iter().collect());
            }
            Err(e) => warn!(error = %e, "thread pool unavailable, processing sequentially"),
        }
    }

    Ok(entries.iter().map(process).collect())
}

/// Scan and validate without converting anything.
///
/// # Errors
///
/// Same as [`run_batch`].
pub fn scan_only(
    config: &ConvertConfig,
    validator: &dyn Validator,
    reporter: &dyn Reporter,
) -> Result<Vec<FileOutcome>> {
    check_target_dir(&config.target_dir)?;
    let entries = scan::scan_dir(&config.target_dir, &config.prefix)?;
    Ok(entries
        .iter()
        .map(|entry| {
            let classification = entry
                .skip
                .unwrap_or_else(|| classify(&entry.candidate, validator, reporter));
            FileOutcome::skipped(entry.candidate.name.as_str(), classification)
        })
        .collect())
}
