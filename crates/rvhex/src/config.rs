//! Batch configuration.
//!
//! A [`ConvertConfig`] is built once (from the CLI or by a test) and then
//! passed by reference through scanner, validator and pipeline. Nothing in the
//! crate reads configuration from globals.

use std::path::PathBuf;
use std::time::Duration;

/// Default filename prefix for candidate ELF files.
pub const DEFAULT_PREFIX: &str = "rv32";
/// Default object-copy tool.
pub const DEFAULT_OBJCOPY: &str = "riscv32-unknown-elf-objcopy";
/// Default byte-dump tool.
pub const DEFAULT_OD: &str = "od";
/// Default file-type inspector.
pub const DEFAULT_FILE_CMD: &str = "file";
/// Default machine pattern looked for in the inspector output.
pub const DEFAULT_MACHINE_PATTERN: &str = "RISCV";

/// External tools invoked by the batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolPaths {
    /// File-type inspector (`file`).
    pub file: String,
    /// Object-copy tool (`riscv32-unknown-elf-objcopy`).
    pub objcopy: String,
    /// Byte-dump tool (`od`).
    pub od: String,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            file: DEFAULT_FILE_CMD.to_string(),
            objcopy: DEFAULT_OBJCOPY.to_string(),
            od: DEFAULT_OD.to_string(),
        }
    }
}

/// How candidates are checked before conversion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ValidatorKind {
    /// Substring heuristic over the inspector output.
    #[default]
    FileType,
    /// Reads the ELF identification and machine field directly.
    ElfHeader,
}

/// Configuration for a conversion batch.
#[derive(Debug, Clone)]
pub struct ConvertConfig {
    /// Directory holding the ELF files; artifacts are written next to them.
    pub target_dir: PathBuf,
    /// Only files whose name starts with this prefix are considered.
    pub prefix: String,
    /// External tools.
    pub tools: ToolPaths,
    /// Validation method.
    pub validator: ValidatorKind,
    /// Case-insensitive regex matched against the inspector output.
    pub machine_pattern: String,
    /// Worker count (1 = sequential, 0 = one per available core).
    pub jobs: usize,
    /// Per-invocation timeout for external tools.
    pub timeout: Option<Duration>,
    /// Remove a partial `.bin` left behind by a failed object-copy.
    pub clean_partial_bin: bool,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            target_dir: PathBuf::from("tests"),
            prefix: DEFAULT_PREFIX.to_string(),
            tools: ToolPaths::default(),
            validator: ValidatorKind::default(),
            machine_pattern: DEFAULT_MACHINE_PATTERN.to_string(),
            jobs: 1,
            timeout: None,
            clean_partial_bin: false,
        }
    }
}

impl ConvertConfig {
    /// Create a config for the given directory with default settings.
    pub fn new(target_dir: impl Into<PathBuf>) -> Self {
        Self {
            target_dir: target_dir.into(),
            ..Self::default()
        }
    }

    /// Set the filename prefix filter.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Set the object-copy tool.
    #[must_use]
    pub fn with_objcopy(mut self, objcopy: impl Into<String>) -> Self {
        self.tools.objcopy = objcopy.into();
        self
    }

    /// Set the byte-dump tool.
    #[must_use]
    pub fn with_od(mut self, od: impl Into<String>) -> Self {
        self.tools.od = od.into();
        self
    }

    /// Set the file-type inspector.
    #[must_use]
    pub fn with_file_cmd(mut self, file: impl Into<String>) -> Self {
        self.tools.file = file.into();
        self
    }

    /// Set the validation method.
    #[must_use]
    pub const fn with_validator(mut self, validator: ValidatorKind) -> Self {
        self.validator = validator;
        self
    }

    /// Set the machine pattern for the inspector heuristic.
    #[must_use]
    pub fn with_machine_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.machine_pattern = pattern.into();
        self
    }

    /// Set the worker count.
    #[must_use]
    pub const fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs;
        self
    }

    /// Set the per-invocation timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Enable removal of partial `.bin` files after an object-copy failure.
    #[must_use]
    pub const fn with_clean_partial_bin(mut self, clean: bool) -> Self {
        self.clean_partial_bin = clean;
        self
    }

    /// Effective worker count.
    #[must_use]
    pub fn worker_count(&self) -> usize {
        if self.jobs == 0 {
            num_cpus::get().max(1)
        } else {
            self.jobs
        }
    }
}
