//! Shared helpers for integration tests: a scripted stand-in for `file`,
//! `objcopy` and `od`, and builders for fake RISC-V executables.

#![allow(dead_code)]

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use rvhex::{CommandOutput, CommandRunner, ConvertConfig, ToolCommand};

/// Size of the fake ELF header that the fake objcopy strips.
pub const HEADER_LEN: usize = 20;

/// Fake ELF: identification + `e_machine = EM_RISCV`, then `payload`.
pub fn fake_elf(payload: &[u8]) -> Vec<u8> {
    let mut data = vec![0u8; HEADER_LEN];
    data[..4].copy_from_slice(b"\x7fELF");
    data[4] = 1; // ELFCLASS32
    data[5] = 1; // ELFDATA2LSB
    data[18..20].copy_from_slice(&243u16.to_le_bytes());
    data.extend_from_slice(payload);
    data
}

/// Write a fake ELF into `dir` and return its path.
pub fn write_elf(dir: &Path, name: &str, payload: &[u8]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, fake_elf(payload)).unwrap();
    path
}

/// Config pointing at the fake tools.
pub fn config(dir: &Path) -> ConvertConfig {
    ConvertConfig::new(dir)
        .with_objcopy("objcopy")
        .with_od("od")
        .with_file_cmd("file")
}

/// Render bytes the way `od -An -tx4 -w4 -v --endian=little` does.
pub fn od_dump(data: &[u8]) -> String {
    data.chunks(4)
        .map(|chunk| {
            let mut word = [0u8; 4];
            word[..chunk.len()].copy_from_slice(chunk);
            format!(" {:08x}\n", u32::from_le_bytes(word))
        })
        .collect()
}

/// Scripted command runner.
///
/// `file` reports a RISC-V ELF for anything starting with the ELF magic,
/// `objcopy` strips the fake header, `od` dumps words. Failures can be
/// injected per input basename or per program.
#[derive(Default)]
pub struct FakeRunner {
    /// Input basenames for which objcopy exits 1.
    pub fail_objcopy: HashSet<String>,
    /// ... and leaves a truncated `.bin` behind.
    pub partial_bin_on_failure: bool,
    /// `.bin` basenames for which od exits 1.
    pub fail_od: HashSet<String>,
    /// Programs that cannot be spawned.
    pub missing: HashSet<String>,
    calls: Mutex<Vec<ToolCommand>>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_objcopy(mut self, name: &str) -> Self {
        self.fail_objcopy.insert(name.to_string());
        self
    }

    pub fn failing_od(mut self, name: &str) -> Self {
        self.fail_od.insert(format!("{name}.bin"));
        self
    }

    pub fn without(mut self, program: &str) -> Self {
        self.missing.insert(program.to_string());
        self
    }

    pub fn calls(&self) -> Vec<ToolCommand> {
        self.calls.lock().unwrap().clone()
    }

    /// Commands run against the given basename, in order (`program` only).
    pub fn programs_for(&self, name: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| {
                c.args_lossy().iter().any(|a| {
                    Path::new(a)
                        .file_name()
                        .is_some_and(|f| f.to_string_lossy() == name)
                })
            })
            .map(|c| c.program)
            .collect()
    }

    fn file(path: &Path) -> CommandOutput {
        let description = match fs::read(path) {
            Ok(data) if data.starts_with(b"\x7fELF") => {
                "ELF 32-bit LSB executable, RISCV, version 1 (SYSV), statically linked"
            }
            Ok(_) => "ASCII text",
            Err(_) => "cannot open (No such file or directory)",
        };
        CommandOutput::ok(format!("{}: {description}\n", path.display()))
    }

    fn objcopy(&self, args: &[String]) -> CommandOutput {
        let [flag, format, input, output] = args else {
            return CommandOutput::failed(1, "objcopy: bad usage\n");
        };
        assert_eq!((flag.as_str(), format.as_str()), ("-O", "binary"));
        let input = Path::new(input);
        let name = input.file_name().unwrap().to_string_lossy().into_owned();
        if self.fail_objcopy.contains(&name) {
            if self.partial_bin_on_failure {
                fs::write(output, b"\x13\x00").unwrap();
            }
            return CommandOutput::failed(
                1,
                format!("objcopy: {name}: file format not recognized\n"),
            );
        }
        match fs::read(input) {
            Ok(data) => {
                fs::write(output, &data[HEADER_LEN.min(data.len())..]).unwrap();
                CommandOutput::ok("")
            }
            Err(e) => CommandOutput::failed(1, format!("objcopy: {e}\n")),
        }
    }

    fn od(&self, args: &[String]) -> CommandOutput {
        let Some(bin) = args.last() else {
            return CommandOutput::failed(1, "od: missing operand\n");
        };
        assert_eq!(
            &args[..args.len() - 1],
            ["-An", "-tx4", "-w4", "-v", "--endian=little"]
        );
        let bin = Path::new(bin);
        let name = bin.file_name().unwrap().to_string_lossy().into_owned();
        if self.fail_od.contains(&name) {
            return CommandOutput::failed(1, format!("od: {name}: read error\n"));
        }
        match fs::read(bin) {
            Ok(data) => CommandOutput::ok(od_dump(&data)),
            Err(e) => CommandOutput::failed(1, format!("od: {e}\n")),
        }
    }
}

impl CommandRunner for FakeRunner {
    fn run(&self, cmd: &ToolCommand) -> io::Result<CommandOutput> {
        self.calls.lock().unwrap().push(cmd.clone());
        if self.missing.contains(&cmd.program) {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{}: command not found", cmd.program),
            ));
        }
        let args = cmd.args_lossy();
        Ok(match cmd.program.as_str() {
            "file" => Self::file(Path::new(&args[0])),
            "objcopy" => self.objcopy(&args),
            "od" => self.od(&args),
            other => CommandOutput::failed(127, format!("{other}: not scripted\n")),
        })
    }
}

/// Basenames of the regular files in `dir`.
pub fn listing(dir: &Path) -> HashSet<String> {
    fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect()
}

/// Every `.hex` in `dir` has its `.bin`.
pub fn assert_no_orphan_hex(dir: &Path) {
    let files = listing(dir);
    for name in &files {
        if let Some(stem) = name.strip_suffix(".hex") {
            assert!(
                files.contains(&format!("{stem}.bin")),
                "{name} exists without {stem}.bin"
            );
        }
    }
}
