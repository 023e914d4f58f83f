//! Command implementations.

mod convert;
mod scan;

use crate::cli::{Cli, Commands, timeout_from_secs};

/// Dispatch CLI command to the appropriate handler.
pub fn run_command(cli: &Cli) -> i32 {
    match &cli.command {
        Commands::Convert {
            target,
            objcopy,
            od,
            jobs,
            timeout,
            clean_partial_bin,
        } => convert::cmd_convert(&convert::ConvertArgs {
            target,
            objcopy: objcopy.as_deref(),
            od,
            jobs: *jobs,
            timeout: timeout_from_secs(*timeout),
            clean_partial_bin: *clean_partial_bin,
            quiet: cli.quiet,
        }),
        Commands::Scan { target } => scan::cmd_scan(target, cli.quiet),
    }
}
