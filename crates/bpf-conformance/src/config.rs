//! Harness configuration (conformance.toml)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::corpus::DEFAULT_PATTERN;
use crate::runner::DEFAULT_VERBOSE_FLAG;

/// Default name of the configuration file.
pub const CONFIG_FILE: &str = "conformance.toml";

/// Errors that can occur while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Validation error
    #[error("Invalid config: {0}")]
    ValidationError(String),
}

/// Top-level harness configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HarnessConfig {
    /// VM under test
    pub vm: VmConfig,

    /// External assembler for `asm` fixtures (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assembler: Option<AssemblerConfig>,

    /// Fixture corpus location
    #[serde(default)]
    pub corpus: CorpusConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct VmConfig {
    /// Path to the VM executable
    pub path: PathBuf,

    /// Flag selecting verbose diagnostics (default: "-v")
    #[serde(default = "default_verbose_flag")]
    pub verbose_flag: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssemblerConfig {
    /// Program and arguments; source goes to stdin, bytecode comes from stdout.
    ///
    /// A relative program with a directory part (`tools/asm`) is taken from
    /// the config file's directory; a bare name is looked up on `PATH`.
    pub command: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CorpusConfig {
    /// Directory holding fixture files (default: "tests")
    #[serde(default = "default_corpus_dir")]
    pub dir: PathBuf,

    /// Glob for fixture file names (default: "*.data")
    #[serde(default = "default_pattern")]
    pub pattern: String,
}

fn default_verbose_flag() -> String {
    DEFAULT_VERBOSE_FLAG.to_string()
}

fn default_corpus_dir() -> PathBuf {
    PathBuf::from("tests")
}

fn default_pattern() -> String {
    DEFAULT_PATTERN.to_string()
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            dir: default_corpus_dir(),
            pattern: default_pattern(),
        }
    }
}

impl HarnessConfig {
    /// Config with only a VM path; everything else defaulted.
    pub fn new(vm: impl Into<PathBuf>) -> Self {
        Self {
            vm: VmConfig {
                path: vm.into(),
                verbose_flag: default_verbose_flag(),
            },
            assembler: None,
            corpus: CorpusConfig::default(),
        }
    }

    /// Parse a config file; relative paths resolve against its directory.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_str(&content)?;
        if let Some(base) = path.parent() {
            config.resolve_relative(base);
        }
        Ok(config)
    }

    /// Parse a config from a string
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let config: HarnessConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the config
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.vm.path.as_os_str().is_empty() {
            return Err(ConfigError::ValidationError(
                "vm.path cannot be empty".to_string(),
            ));
        }

        if self.vm.verbose_flag.is_empty() {
            return Err(ConfigError::ValidationError(
                "vm.verbose-flag cannot be empty".to_string(),
            ));
        }

        if let Some(ref assembler) = self.assembler {
            if assembler.command.first().map_or(true, |p| p.is_empty()) {
                return Err(ConfigError::ValidationError(
                    "assembler.command must name a program".to_string(),
                ));
            }
        }

        if self.corpus.pattern.is_empty() {
            return Err(ConfigError::ValidationError(
                "corpus.pattern cannot be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Anchor relative VM and corpus paths at `base`.
    pub fn resolve_relative(&mut self, base: &Path) {
        if self.vm.path.is_relative() {
            self.vm.path = base.join(&self.vm.path);
        }
        if self.corpus.dir.is_relative() {
            self.corpus.dir = base.join(&self.corpus.dir);
        }
        if let Some(program) = self
            .assembler
            .as_mut()
            .and_then(|assembler| assembler.command.first_mut())
        {
            let path = Path::new(program.as_str());
            if path.is_relative() && path.components().count() > 1 {
                *program = base.join(path).to_string_lossy().into_owned();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_config() {
        let toml = r#"
[vm]
path = "/usr/local/bin/ubpf-test"
"#;

        let config = HarnessConfig::from_str(toml).unwrap();
        assert_eq!(config.vm.path, PathBuf::from("/usr/local/bin/ubpf-test"));
        assert_eq!(config.vm.verbose_flag, "-v");
        assert!(config.assembler.is_none());
        assert_eq!(config.corpus, CorpusConfig::default());
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[vm]
path = "vm/test"
verbose-flag = "-V"

[assembler]
command = ["ubpf-assembler", "--raw"]

[corpus]
dir = "fixtures"
pattern = "*.fixture"
"#;

        let config = HarnessConfig::from_str(toml).unwrap();
        assert_eq!(config.vm.verbose_flag, "-V");
        assert_eq!(
            config.assembler.unwrap().command,
            vec!["ubpf-assembler".to_string(), "--raw".to_string()]
        );
        assert_eq!(config.corpus.dir, PathBuf::from("fixtures"));
        assert_eq!(config.corpus.pattern, "*.fixture");
    }

    #[test]
    fn test_missing_vm_section_rejected() {
        let result = HarnessConfig::from_str("[corpus]\ndir = \"tests\"\n");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_validation_errors() {
        let empty_vm = "[vm]\npath = \"\"\n";
        assert!(matches!(
            HarnessConfig::from_str(empty_vm),
            Err(ConfigError::ValidationError(_))
        ));

        let empty_assembler = "[vm]\npath = \"vm\"\n[assembler]\ncommand = []\n";
        assert!(matches!(
            HarnessConfig::from_str(empty_assembler),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_from_file_resolves_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "[vm]\npath = \"vm/test\"\n[corpus]\ndir = \"/abs/tests\"\n").unwrap();

        let config = HarnessConfig::from_file(&path).unwrap();
        assert_eq!(config.vm.path, dir.path().join("vm/test"));
        assert_eq!(config.corpus.dir, PathBuf::from("/abs/tests"));
    }

    #[test]
    fn test_from_file_anchors_assembler_with_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(
            &path,
            "[vm]\npath = \"/opt/vm\"\n[assembler]\ncommand = [\"tools/asm\", \"-q\"]\n",
        )
        .unwrap();
        let config = HarnessConfig::from_file(&path).unwrap();
        let command = &config.assembler.unwrap().command;
        assert_eq!(PathBuf::from(&command[0]), dir.path().join("tools/asm"));
        assert_eq!(command[1], "-q");

        std::fs::write(
            &path,
            "[vm]\npath = \"/opt/vm\"\n[assembler]\ncommand = [\"ubpf-assembler\"]\n",
        )
        .unwrap();
        let config = HarnessConfig::from_file(&path).unwrap();
        assert_eq!(config.assembler.unwrap().command, vec!["ubpf-assembler".to_string()]);
    }
}
