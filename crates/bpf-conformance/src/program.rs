//! Program builder: turns a fixture's `raw` or `asm` section into the byte
//! stream the VM reads from stdin.

use std::path::PathBuf;
use std::process::{Command, Stdio};

use crate::error::HarnessError;
use crate::fixture::Fixture;
use crate::runner::communicate;

/// Translates assembly text into encoded bytecode.
pub trait Assembler {
    fn assemble(&self, source: &str) -> Result<Vec<u8>, HarnessError>;
}

/// Assembler backed by an external command.
///
/// The source is written to the command's stdin and its stdout is taken
/// verbatim as the program.
#[derive(Debug, Clone)]
pub struct CommandAssembler {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandAssembler {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Build from an argv list; `None` when the list is empty.
    pub fn from_argv(argv: &[String]) -> Option<Self> {
        let (program, args) = argv.split_first()?;
        Some(Self::new(program, args.to_vec()))
    }
}

impl Assembler for CommandAssembler {
    fn assemble(&self, source: &str) -> Result<Vec<u8>, HarnessError> {
        log::debug!("assembling with {} {:?}", self.program.display(), self.args);

        let child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                HarnessError::Assemble(format!("cannot run {}: {}", self.program.display(), e))
            })?;

        let output = communicate(child, source.as_bytes())
            .map_err(|e| HarnessError::Assemble(e.to_string()))?;
        if !output.status.success() {
            return Err(HarnessError::Assemble(
                String::from_utf8_lossy(&output.stderr).trim_end().to_string(),
            ));
        }
        Ok(output.stdout)
    }
}

/// Pack instruction words into native-endian 8-byte groups, in order.
pub fn encode_raw(words: &[u64]) -> Vec<u8> {
    words.iter().flat_map(|w| w.to_ne_bytes()).collect()
}

/// Build the program bytes for a fixture.
///
/// `raw` wins over `asm`. An assembler failure is a hard error, not an
/// expected-error outcome.
pub fn build_program(
    fixture: &Fixture,
    assembler: Option<&dyn Assembler>,
) -> Result<Vec<u8>, HarnessError> {
    if let Some(words) = fixture.raw() {
        return Ok(encode_raw(words));
    }
    match (fixture.asm(), assembler) {
        (Some(source), Some(assembler)) => assembler.assemble(source),
        (Some(_), None) => Err(HarnessError::Assemble("no assembler configured".into())),
        (None, _) => Err(HarnessError::NotBuildable),
    }
}
