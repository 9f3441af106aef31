//! Fixture model and the `.data` section loader.
//!
//! A fixture file is a list of sections, each opened by a `-- <name>`
//! header line:
//!
//! ```text
//! # comment
//! -- asm
//! mov32 %r0, 1
//! exit
//! -- result
//! 0x1
//! ```
//!
//! `raw` holds instruction words, `mem` holds hex bytes, everything else is
//! kept as text. The harness only ever looks at the section names listed
//! in [`sections`].

use std::collections::BTreeMap;
use std::path::Path;

/// Section names the harness reads.
pub mod sections {
    pub const ASM: &str = "asm";
    pub const RAW: &str = "raw";
    pub const MEM: &str = "mem";
    pub const RESULT: &str = "result";
    pub const VERIFIER_ERROR: &str = "verifier error";
    pub const ERROR: &str = "error";
    pub const ERROR_PATTERN: &str = "error-pattern";
}

/// Errors produced while reading a fixture file.
#[derive(Debug, thiserror::Error)]
pub enum FixtureError {
    #[error("Failed to read fixture: {0}")]
    Io(#[from] std::io::Error),

    #[error("line {line}: content before the first section header")]
    OrphanContent { line: usize },

    #[error("line {line}: section header without a name")]
    EmptyHeader { line: usize },

    #[error("duplicate section `{0}`")]
    DuplicateSection(String),

    #[error("section `{section}`: invalid token `{token}`")]
    InvalidToken { section: String, token: String },
}

/// Parsed content of one section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Section {
    Text(String),
    Bytes(Vec<u8>),
    Words(Vec<u64>),
}

impl Section {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Section::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// One conformance case, loaded fresh for every verification unit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fixture {
    sections: BTreeMap<String, Section>,
}

impl Fixture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a section.
    pub fn with(mut self, name: &str, section: Section) -> Self {
        self.sections.insert(name.to_string(), section);
        self
    }

    pub fn with_text(self, name: &str, text: &str) -> Self {
        self.with(name, Section::Text(text.to_string()))
    }

    pub fn get(&self, name: &str) -> Option<&Section> {
        self.sections.get(name)
    }

    pub fn has(&self, name: &str) -> bool {
        self.sections.contains_key(name)
    }

    pub fn asm(&self) -> Option<&str> {
        self.get(sections::ASM).and_then(Section::as_text)
    }

    pub fn raw(&self) -> Option<&[u64]> {
        match self.get(sections::RAW) {
            Some(Section::Words(words)) => Some(words),
            _ => None,
        }
    }

    pub fn mem(&self) -> Option<&[u8]> {
        match self.get(sections::MEM) {
            Some(Section::Bytes(bytes)) => Some(bytes),
            _ => None,
        }
    }

    pub fn verifier_error(&self) -> Option<&str> {
        self.get(sections::VERIFIER_ERROR).and_then(Section::as_text)
    }

    /// `true` if the fixture carries a program the builder can use.
    pub fn has_program(&self) -> bool {
        self.has(sections::ASM) || self.has(sections::RAW)
    }

    pub fn has_result(&self) -> bool {
        self.has(sections::RESULT)
    }

    /// `error` or `error-pattern` is present.
    pub fn has_generic_error(&self) -> bool {
        self.has(sections::ERROR) || self.has(sections::ERROR_PATTERN)
    }

    /// Parse the `.data` text format.
    pub fn parse(content: &str) -> Result<Self, FixtureError> {
        let mut bodies: Vec<(String, Vec<&str>)> = Vec::new();

        for (idx, line) in content.lines().enumerate() {
            if let Some(header) = line.strip_prefix("--") {
                let name = header.trim();
                if name.is_empty() {
                    return Err(FixtureError::EmptyHeader { line: idx + 1 });
                }
                bodies.push((name.to_string(), Vec::new()));
                continue;
            }

            match bodies.last_mut() {
                Some((_, body)) => body.push(line),
                None => {
                    let trimmed = line.trim();
                    if !trimmed.is_empty() && !trimmed.starts_with('#') {
                        return Err(FixtureError::OrphanContent { line: idx + 1 });
                    }
                }
            }
        }

        let mut fixture = Fixture::new();
        for (name, body) in bodies {
            if fixture.has(&name) {
                return Err(FixtureError::DuplicateSection(name));
            }
            let section = parse_section(&name, &body)?;
            fixture.sections.insert(name, section);
        }
        Ok(fixture)
    }
}

fn parse_section(name: &str, body: &[&str]) -> Result<Section, FixtureError> {
    match name {
        sections::RAW => numeric_tokens(body)
            .map(|tok| parse_word(tok).ok_or_else(|| invalid(name, tok)))
            .collect::<Result<Vec<_>, _>>()
            .map(Section::Words),
        sections::MEM => {
            let mut bytes = Vec::new();
            for tok in numeric_tokens(body) {
                if tok.len() % 2 != 0 {
                    return Err(invalid(name, tok));
                }
                for pair in tok.as_bytes().chunks(2) {
                    let byte = std::str::from_utf8(pair)
                        .ok()
                        .and_then(|s| u8::from_str_radix(s, 16).ok())
                        .ok_or_else(|| invalid(name, tok))?;
                    bytes.push(byte);
                }
            }
            Ok(Section::Bytes(bytes))
        }
        _ => Ok(Section::Text(body.join("\n").trim().to_string())),
    }
}

/// Whitespace-separated tokens with `#` comments removed.
fn numeric_tokens<'a>(body: &'a [&'a str]) -> impl Iterator<Item = &'a str> {
    body.iter()
        .copied()
        .map(|line| line.split('#').next().unwrap_or(""))
        .flat_map(str::split_whitespace)
}

fn parse_word(tok: &str) -> Option<u64> {
    match tok.strip_prefix("0x").or_else(|| tok.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => tok.parse().ok(),
    }
}

fn invalid(section: &str, token: &str) -> FixtureError {
    FixtureError::InvalidToken {
        section: section.to_string(),
        token: token.to_string(),
    }
}

/// Source of fixtures for the harness.
pub trait FixtureLoader {
    fn load(&self, path: &Path) -> Result<Fixture, FixtureError>;
}

/// Loader for the `.data` text format.
#[derive(Debug, Clone, Copy, Default)]
pub struct DataFileLoader;

impl FixtureLoader for DataFileLoader {
    fn load(&self, path: &Path) -> Result<Fixture, FixtureError> {
        let content = std::fs::read_to_string(path)?;
        Fixture::parse(&content)
    }
}
