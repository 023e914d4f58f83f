//! CLI definitions and argument types.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use rvhex::{ConvertConfig, ValidatorKind};
use rvhex::config::{DEFAULT_FILE_CMD, DEFAULT_MACHINE_PATTERN, DEFAULT_OD, DEFAULT_PREFIX};

/// Exit code for success.
pub const EXIT_SUCCESS: i32 = 0;
/// Exit code for failure.
pub const EXIT_FAILURE: i32 = 1;

#[derive(Parser)]
#[command(name = "rvhex")]
#[command(about = "Convert RISC-V ELF test binaries to .bin and .hex fixtures")]
#[command(version)]
pub struct Cli {
    /// Show metrics summary after execution
    #[arg(long, global = true)]
    pub metrics: bool,

    /// Enable verbose output (sets RUST_LOG=debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print warnings, errors and the summary
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Convert every RISC-V ELF in a directory to .bin and .hex
    Convert {
        #[command(flatten)]
        target: TargetArgs,

        /// objcopy command (default: first RISC-V objcopy found on PATH)
        #[arg(long, env = "RVHEX_OBJCOPY")]
        objcopy: Option<String>,

        /// od command used to dump words
        #[arg(long, env = "RVHEX_OD", default_value = DEFAULT_OD)]
        od: String,

        /// Number of files converted in parallel (0 = auto)
        #[arg(short = 'j', long, default_value = "1")]
        jobs: usize,

        /// Kill an external tool after this many seconds
        #[arg(long, value_name = "SECS")]
        timeout: Option<u64>,

        /// Delete a partial .bin left by a failed objcopy
        #[arg(long)]
        clean_partial_bin: bool,
    },
    /// Classify directory entries without converting anything
    Scan {
        #[command(flatten)]
        target: TargetArgs,
    },
}

/// Directory and validation options shared by all commands.
#[derive(clap::Args, Clone, Debug)]
pub struct TargetArgs {
    /// Directory holding the ELF files
    #[arg(value_name = "DIR", default_value = "tests")]
    pub dir: PathBuf,

    /// Only consider files whose name starts with this prefix
    #[arg(short, long, default_value = DEFAULT_PREFIX)]
    pub prefix: String,

    /// How to recognise RISC-V ELF files
    #[arg(long, value_enum, default_value = "file")]
    pub validator: ValidatorArg,

    /// Case-insensitive regex the `file` output must match (besides "ELF")
    #[arg(long, default_value = DEFAULT_MACHINE_PATTERN)]
    pub machine_pattern: String,

    /// File-type inspector command
    #[arg(long, env = "RVHEX_FILE", default_value = DEFAULT_FILE_CMD)]
    pub file_cmd: String,
}

impl TargetArgs {
    /// Base config for these arguments.
    pub fn config(&self) -> ConvertConfig {
        ConvertConfig::new(&self.dir)
            .with_prefix(&self.prefix)
            .with_validator(self.validator.into())
            .with_machine_pattern(&self.machine_pattern)
            .with_file_cmd(&self.file_cmd)
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ValidatorArg {
    /// Look for "ELF" and the machine pattern in `file` output
    File,
    /// Read the ELF header's machine field
    Header,
}

impl From<ValidatorArg> for ValidatorKind {
    fn from(arg: ValidatorArg) -> Self {
        match arg {
            ValidatorArg::File => Self::FileType,
            ValidatorArg::Header => Self::ElfHeader,
        }
    }
}

/// Convert a `--timeout` value.
pub fn timeout_from_secs(secs: Option<u64>) -> Option<Duration> {
    secs.filter(|&s| s > 0).map(Duration::from_secs)
}
