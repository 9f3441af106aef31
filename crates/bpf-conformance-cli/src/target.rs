//! Locating the VM, assembler, and corpus from flags and `conformance.toml`.

use anyhow::{anyhow, Context};
use bpf_conformance::config::{AssemblerConfig, CONFIG_FILE};
use bpf_conformance::HarnessConfig;
use clap::Args;
use std::path::{Path, PathBuf};

/// Flags shared by every command. Flags win over the config file.
#[derive(Debug, Clone, Default, Args)]
pub struct TargetArgs {
    /// Config file (default: ./conformance.toml when present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// VM executable under test
    #[arg(long)]
    pub vm: Option<PathBuf>,
    /// Flag passed to the VM for verbose diagnostics
    #[arg(long, allow_hyphen_values = true)]
    pub verbose_flag: Option<String>,
    /// Directory holding fixture files
    #[arg(long)]
    pub corpus: Option<PathBuf>,
    /// Glob for fixture file names
    #[arg(long)]
    pub pattern: Option<String>,
    /// Assembler program for `asm` fixtures
    #[arg(long)]
    pub assembler: Option<String>,
    /// Argument for the assembler (repeatable)
    #[arg(long = "assembler-arg", allow_hyphen_values = true)]
    pub assembler_args: Vec<String>,
}

impl TargetArgs {
    pub fn resolve(&self) -> anyhow::Result<HarnessConfig> {
        let config_path = match &self.config {
            Some(path) => Some(path.clone()),
            None => Some(PathBuf::from(CONFIG_FILE)).filter(|p| p.is_file()),
        };

        let mut config = match (config_path, &self.vm) {
            (Some(path), _) => load(&path)?,
            (None, Some(vm)) => HarnessConfig::new(vm),
            (None, None) => {
                return Err(anyhow!(
                    "No VM configured.\nPass --vm <PATH> or create {}.",
                    CONFIG_FILE
                ))
            }
        };

        if let Some(vm) = &self.vm {
            config.vm.path = vm.clone();
        }
        if let Some(flag) = &self.verbose_flag {
            config.vm.verbose_flag = flag.clone();
        }
        if let Some(dir) = &self.corpus {
            config.corpus.dir = dir.clone();
        }
        if let Some(pattern) = &self.pattern {
            config.corpus.pattern = pattern.clone();
        }
        if let Some(program) = &self.assembler {
            let mut command = vec![program.clone()];
            command.extend(self.assembler_args.iter().cloned());
            config.assembler = Some(AssemblerConfig { command });
        }

        config.validate()?;
        log::debug!("resolved config: {:?}", config);
        Ok(config)
    }
}

fn load(path: &Path) -> anyhow::Result<HarnessConfig> {
    HarnessConfig::from_file(path).with_context(|| format!("loading {}", path.display()))
}
