//! Per-file conversion: ELF → `.bin` (objcopy) → `.hex` (od).
//!
//! ```text
//! Start → objcopy ─┬─ fail ──────────────────────────→ ObjcopyFailed
//!                  └─ ok → od + write .hex ─┬─ ok ───→ Success
//!                                           └─ fail ─→ rollback → HexGenFailed
//! ```
//!
//! After a run either both artifacts exist and belong together, or the hex
//! step failed and neither exists. A failed objcopy is not rolled back unless
//! [`ConvertConfig::clean_partial_bin`] is set.

use std::ffi::{OsStr, OsString};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{debug, error, info_span, warn};

use crate::command::{CommandRunner, ToolCommand, run_checked};
use crate::config::ConvertConfig;
use crate::terminal::Reporter;
use crate::{Error, Result, metrics};

/// Output files derived from an input name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifacts {
    pub bin: PathBuf,
    pub hex: PathBuf,
}

impl Artifacts {
    /// `<dir>/<name>.bin` and `<dir>/<name>.hex`, keeping `name` byte for byte.
    #[must_use]
    pub fn for_input(dir: &Path, name: &OsStr) -> Self {
        Self {
            bin: dir.join(with_suffix(name, ".bin")),
            hex: dir.join(with_suffix(name, ".hex")),
        }
    }
}

fn with_suffix(name: &OsStr, suffix: &str) -> OsString {
    let mut file = name.to_os_string();
    file.push(suffix);
    file
}

/// Terminal state of a conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionResult {
    Success,
    ObjcopyFailed,
    HexGenFailed,
}

impl ConversionResult {
    /// Name of the step that failed, for labels and summaries.
    #[must_use]
    pub const fn step(self) -> &'static str {
        match self {
            Self::Success => "done",
            Self::ObjcopyFailed => "objcopy",
            Self::HexGenFailed => "hex",
        }
    }
}

/// Outcome of converting one file.
#[derive(Debug)]
pub struct Conversion {
    pub result: ConversionResult,
    pub artifacts: Artifacts,
    /// Lines written to the `.hex` file.
    pub words: usize,
    pub error: Option<Error>,
}

impl Conversion {
    fn failed(result: ConversionResult, artifacts: Artifacts, error: Error) -> Self {
        Self {
            result,
            artifacts,
            words: 0,
            error: Some(error),
        }
    }
}

/// `<objcopy> -O binary <input> <bin>`
#[must_use]
pub fn objcopy_command(objcopy: &str, input: &Path, bin: &Path) -> ToolCommand {
    ToolCommand::new(objcopy)
        .args(["-O", "binary"])
        .arg(input)
        .arg(bin)
}

/// `<od> -An -tx4 -w4 -v --endian=little <bin>`
#[must_use]
pub fn od_command(od: &str, bin: &Path) -> ToolCommand {
    ToolCommand::new(od)
        .args(["-An", "-tx4", "-w4", "-v", "--endian=little"])
        .arg(bin)
}

/// Strip the single leading space `od -An` puts before every word and
/// newline-terminate each line.
#[must_use]
pub fn format_hex(dump: &str) -> String {
    let mut hex = String::with_capacity(dump.len());
    for line in dump.lines() {
        hex.push_str(line.strip_prefix(' ').unwrap_or(line));
        hex.push('\n');
    }
    hex
}

/// Convert one validated RISC-V ELF into `.bin` and `.hex` artifacts in the
/// configured target directory.
///
/// Failures are reported through `reporter` and returned in the
/// [`Conversion`]; this never aborts the caller.
pub fn convert(
    input: &Path,
    config: &ConvertConfig,
    runner: &dyn CommandRunner,
    reporter: &dyn Reporter,
) -> Conversion {
    let file_name = input.file_name().unwrap_or_default();
    let name = file_name.to_string_lossy();
    let _span = info_span!("convert", file = %name).entered();
    let artifacts = Artifacts::for_input(&config.target_dir, file_name);

    let bin_step = format!("Generate {name}.bin");
    reporter.info(&format!("Executing: {bin_step}"));
    let objcopy = objcopy_command(&config.tools.objcopy, input, &artifacts.bin);
    let start = Instant::now();
    let extracted = run_checked(runner, &objcopy);
    metrics::record_tool("objcopy", start.elapsed());
    if let Err(err) = extracted {
        report_failure(reporter, &bin_step, &err);
        handle_partial_bin(&artifacts, &name, config.clean_partial_bin, reporter);
        return Conversion::failed(ConversionResult::ObjcopyFailed, artifacts, err);
    }

    let hex_step = format!("Generate {name}.hex");
    reporter.info(&format!("Executing: {hex_step}"));
    match generate_hex(&config.tools.od, runner, &artifacts) {
        Ok(words) => {
            debug!(words, hex = %artifacts.hex.display(), "hex written");
            reporter.success(&format!(
                "Process completed: {name} → {name}.bin + {name}.hex"
            ));
            Conversion {
                result: ConversionResult::Success,
                artifacts,
                words,
                error: None,
            }
        }
        Err(err) => {
            report_failure(reporter, &hex_step, &err);
            rollback(&artifacts, &name, reporter);
            Conversion::failed(ConversionResult::HexGenFailed, artifacts, err)
        }
    }
}

/// Dump the `.bin` and write the formatted text to `.hex`.
///
/// The text goes to a temporary file in the same directory that is then
/// renamed onto the `.hex` path, so a failed write never leaves a truncated
/// `.hex` behind.
fn generate_hex(od: &str, runner: &dyn CommandRunner, artifacts: &Artifacts) -> Result<usize> {
    let cmd = od_command(od, &artifacts.bin);
    let start = Instant::now();
    let dumped = run_checked(runner, &cmd);
    metrics::record_tool("od", start.elapsed());
    let hex = format_hex(&dumped?.stdout_lossy());

    let dir = artifacts.hex.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::Builder::new()
        .prefix(".rvhex-")
        .suffix(".tmp")
        .tempfile_in(dir)?;
    tmp.write_all(hex.as_bytes())?;
    tmp.flush()?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tmp.as_file()
            .set_permissions(fs::Permissions::from_mode(0o644))?;
    }
    tmp.persist(&artifacts.hex).map_err(|e| e.error)?;

    Ok(hex.lines().count())
}

/// Remove both artifacts after a failed hex step.
fn rollback(artifacts: &Artifacts, name: &str, reporter: &dyn Reporter) {
    match remove_if_exists(&artifacts.bin) {
        Ok(true) => reporter.warn(&format!("Deleted invalid {name}.bin")),
        Ok(false) => {}
        Err(e) => {
            error!(path = %artifacts.bin.display(), error = %e, "rollback failed");
            reporter.error(&format!("Could not delete invalid {name}.bin: {e}"));
        }
    }
    remove_stale_hex(artifacts, name, reporter);
}

/// A `.hex` from an earlier run must not outlive its `.bin`.
fn remove_stale_hex(artifacts: &Artifacts, name: &str, reporter: &dyn Reporter) {
    match remove_if_exists(&artifacts.hex) {
        Ok(true) => reporter.warn(&format!("Deleted stale {name}.hex")),
        Ok(false) => {}
        Err(e) => {
            error!(path = %artifacts.hex.display(), error = %e, "stale hex not removed");
            reporter.error(&format!("Could not delete stale {name}.hex: {e}"));
        }
    }
}

/// Deal with whatever `.bin` a failed objcopy left behind.
fn handle_partial_bin(artifacts: &Artifacts, name: &str, clean: bool, reporter: &dyn Reporter) {
    let bin = &artifacts.bin;
    if clean {
        match remove_if_exists(bin) {
            Ok(true) => reporter.warn(&format!("Deleted partial {name}.bin")),
            Ok(false) => {}
            Err(e) => reporter.error(&format!("Could not delete partial {name}.bin: {e}")),
        }
    } else if bin.exists() {
        warn!(path = %bin.display(), "bin left in place after objcopy failure");
        reporter.warn(&format!(
            "{name}.bin may be partial or stale after the failed objcopy (kept; see --clean-partial-bin)"
        ));
    }
    if !bin.exists() {
        remove_stale_hex(artifacts, name, reporter);
    }
}

fn remove_if_exists(path: &Path) -> io::Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

fn report_failure(reporter: &dyn Reporter, step: &str, err: &Error) {
    error!(step, error = %err, "step failed");
    match err {
        Error::ToolFailed {
            command, stderr, ..
        } => reporter.error(&format!(
            "Failed to execute {step}:\nCommand: {command}\nError output: {}",
            stderr.trim_end()
        )),
        _ => reporter.error(&format!("Unexpected error when executing {step}: {err}")),
    }
}
