//! Batch conversion command.

use std::time::Duration;

use rvhex::config::DEFAULT_OBJCOPY;
use rvhex::{Console, Reporter, SystemRunner, find_objcopy, print_summary, run_batch};
use tracing::info;

use crate::cli::{EXIT_FAILURE, EXIT_SUCCESS, TargetArgs};

pub struct ConvertArgs<'a> {
    pub target: &'a TargetArgs,
    pub objcopy: Option<&'a str>,
    pub od: &'a str,
    pub jobs: usize,
    pub timeout: Option<Duration>,
    pub clean_partial_bin: bool,
    pub quiet: bool,
}

/// Convert every eligible file and print the summary.
///
/// Exits non-zero only when the run cannot start; per-file failures are
/// reported in the summary.
pub fn cmd_convert(args: &ConvertArgs<'_>) -> i32 {
    let reporter = Console::new(args.quiet);

    // Checked before tool discovery so a bad path fails without side effects.
    if let Err(e) = rvhex::check_target_dir(&args.target.dir) {
        reporter.error(&capitalize(&e.to_string()));
        return EXIT_FAILURE;
    }

    let runner = SystemRunner::new(args.timeout);
    let objcopy = args.objcopy.map_or_else(
        || find_objcopy(&runner).unwrap_or_else(|| DEFAULT_OBJCOPY.to_string()),
        str::to_string,
    );
    info!(%objcopy, od = args.od, "tools");

    let config = args
        .target
        .config()
        .with_objcopy(objcopy)
        .with_od(args.od)
        .with_jobs(args.jobs)
        .with_timeout(args.timeout)
        .with_clean_partial_bin(args.clean_partial_bin);

    let validator = match rvhex::validator_for(&config, &runner) {
        Ok(v) => v,
        Err(e) => {
            reporter.error(&capitalize(&e.to_string()));
            return EXIT_FAILURE;
        }
    };

    match run_batch(&config, &runner, validator.as_ref(), &reporter) {
        Ok(summary) => {
            print_summary(&summary);
            EXIT_SUCCESS
        }
        Err(e) => {
            reporter.error(&capitalize(&e.to_string()));
            EXIT_FAILURE
        }
    }
}

pub fn capitalize(message: &str) -> String {
    let mut chars = message.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}
