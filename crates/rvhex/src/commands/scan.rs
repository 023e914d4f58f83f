//! Classification-only command.

use rvhex::{Classification, Console, Reporter, SystemRunner};

use super::convert::capitalize;
use crate::cli::{EXIT_FAILURE, EXIT_SUCCESS, TargetArgs};

/// Print the classification of every entry in the target directory.
pub fn cmd_scan(target: &TargetArgs, quiet: bool) -> i32 {
    let reporter = Console::new(quiet);
    let config = target.config();
    let runner = SystemRunner::default();

    let result = rvhex::validator_for(&config, &runner)
        .and_then(|validator| rvhex::scan_only(&config, validator.as_ref(), &reporter));
    let mut outcomes = match result {
        Ok(o) => o,
        Err(e) => {
            reporter.error(&capitalize(&e.to_string()));
            return EXIT_FAILURE;
        }
    };
    outcomes.sort_by(|a, b| a.name.cmp(&b.name));

    let width = outcomes.iter().map(|o| o.name.len()).max().unwrap_or(0);
    for outcome in &outcomes {
        println!("{:<width$}  {}", outcome.name, outcome.classification);
    }

    let valid = outcomes
        .iter()
        .filter(|o| o.classification == Classification::ValidElf)
        .count();
    println!();
    println!("{valid} of {} entries would be converted", outcomes.len());
    EXIT_SUCCESS
}
