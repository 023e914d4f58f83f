//! RVHEX - RISC-V ELF to hex fixture converter
//!
//! Walks a directory of RISC-V test executables and, for every file that
//! looks like a RISC-V ELF, produces `<name>.bin` (raw image via `objcopy`)
//! and `<name>.hex` (one little-endian 32-bit word per line via `od`) for
//! simulator and HDL test benches.
//!
//! # Example
//!
//! ```no_run
//! use rvhex::{Console, ConvertConfig, SystemRunner, run_batch, validator_for};
//!
//! let config = ConvertConfig::new("tests").with_prefix("rv32");
//! let runner = SystemRunner::new(config.timeout);
//! let validator = validator_for(&config, &runner)?;
//! let summary = run_batch(&config, &runner, validator.as_ref(), &Console::default())?;
//! println!("{} converted", summary.converted);
//! # Ok::<(), rvhex::Error>(())
//! ```

pub mod batch;
pub mod command;
pub mod config;
mod error;
pub mod metrics;
pub mod pipeline;
pub mod scan;
pub mod summary;
pub mod terminal;
pub mod validate;

pub use batch::{check_target_dir, run_batch, scan_only};
pub use command::{CommandOutput, CommandRunner, SystemRunner, ToolCommand, find_objcopy};
pub use config::{ConvertConfig, ToolPaths, ValidatorKind};
pub use error::{Error, Result};
pub use pipeline::{Artifacts, Conversion, ConversionResult, convert};
pub use scan::{Candidate, Classification, ScanEntry, scan_dir};
pub use summary::{BatchSummary, FileOutcome, Tally, print_summary};
pub use terminal::{Console, Reporter, Silent, Status};
pub use validate::{ElfHeaderValidator, FileTypeValidator, Validator, validator_for};
