//! RISC-V ELF validation.
//!
//! The default [`FileTypeValidator`] is a text heuristic over the output of
//! `file`: it accepts anything whose description mentions `ELF` and matches
//! the machine pattern (case-insensitive `RISCV` by default). The inspected
//! text includes the path itself, so a file whose *name* happens to match can
//! be accepted without being a RISC-V executable. That false positive is
//! accepted; use [`ElfHeaderValidator`] when it matters.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use regex::{Regex, RegexBuilder};
use tracing::debug;

use crate::command::{CommandRunner, ToolCommand};
use crate::config::{ConvertConfig, ValidatorKind};
use crate::{Error, Result};

const ELF_MAGIC: [u8; 4] = [0x7F, b'E', b'L', b'F'];
const ELF_CLASS_32: u8 = 1;
const ELF_CLASS_64: u8 = 2;
const ELF_DATA_LSB: u8 = 1;
const ELF_DATA_MSB: u8 = 2;
const ELF_MACHINE_RISCV: u16 = 243;

/// `e_ident` (16 bytes) + `e_type` (2) + `e_machine` (2).
const HEADER_PREFIX_LEN: usize = 20;

/// Decides whether a file is a RISC-V ELF worth converting.
pub trait Validator: Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Check the file.
    ///
    /// # Errors
    ///
    /// Returns an error if the check itself could not be carried out. Callers
    /// treat that as "not an ELF".
    fn is_riscv_elf(&self, path: &Path) -> Result<bool>;
}

/// Heuristic check over the file-type inspector's output.
pub struct FileTypeValidator<'a> {
    runner: &'a dyn CommandRunner,
    file_cmd: String,
    machine: Regex,
}

impl<'a> FileTypeValidator<'a> {
    /// # Errors
    ///
    /// [`Error::InvalidPattern`] if `machine_pattern` is not a valid regex.
    pub fn new(
        runner: &'a dyn CommandRunner,
        file_cmd: impl Into<String>,
        machine_pattern: &str,
    ) -> Result<Self> {
        let machine = RegexBuilder::new(machine_pattern)
            .case_insensitive(true)
            .build()?;
        Ok(Self {
            runner,
            file_cmd: file_cmd.into(),
            machine,
        })
    }

    /// Whether an inspector description denotes a RISC-V ELF.
    #[must_use]
    pub fn matches(&self, description: &str) -> bool {
        description.contains("ELF") && self.machine.is_match(description)
    }
}

impl Validator for FileTypeValidator<'_> {
    fn name(&self) -> &'static str {
        "file-type"
    }

    fn is_riscv_elf(&self, path: &Path) -> Result<bool> {
        let cmd = ToolCommand::new(&self.file_cmd).arg(path);
        // The exit status is ignored: `file` reports problems on stdout and
        // whatever it printed is what gets inspected.
        let output = self.runner.run(&cmd).map_err(|source| Error::Invocation {
            command: cmd.display(),
            source,
        })?;
        let description = output.stdout_lossy();
        debug!(path = %path.display(), description = %description.trim(), "inspected");
        Ok(self.matches(&description))
    }
}

/// Structural check of the ELF identification and machine field.
#[derive(Debug, Clone, Copy, Default)]
pub struct ElfHeaderValidator;

impl Validator for ElfHeaderValidator {
    fn name(&self) -> &'static str {
        "elf-header"
    }

    fn is_riscv_elf(&self, path: &Path) -> Result<bool> {
        let mut header = [0u8; HEADER_PREFIX_LEN];
        let mut file = File::open(path)?;
        match file.read_exact(&mut header) {
            Ok(()) => Ok(is_riscv_header(&header)),
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

/// Check magic, class, and `e_machine == EM_RISCV`.
#[must_use]
pub fn is_riscv_header(data: &[u8]) -> bool {
    if data.len() < HEADER_PREFIX_LEN || data[..4] != ELF_MAGIC {
        return false;
    }
    if !matches!(data[4], ELF_CLASS_32 | ELF_CLASS_64) {
        return false;
    }
    let machine = match data[5] {
        ELF_DATA_LSB => u16::from_le_bytes([data[18], data[19]]),
        ELF_DATA_MSB => u16::from_be_bytes([data[18], data[19]]),
        _ => return false,
    };
    machine == ELF_MACHINE_RISCV
}

/// Build the validator selected by `config`.
///
/// # Errors
///
/// [`Error::InvalidPattern`] if the configured machine pattern does not compile.
pub fn validator_for<'a>(
    config: &ConvertConfig,
    runner: &'a dyn CommandRunner,
) -> Result<Box<dyn Validator + 'a>> {
    Ok(match config.validator {
        ValidatorKind::FileType => Box::new(FileTypeValidator::new(
            runner,
            &config.tools.file,
            &config.machine_pattern,
        )?),
        ValidatorKind::ElfHeader => Box::new(ElfHeaderValidator),
    })
}
