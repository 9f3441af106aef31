//! `bpf-conformance list` — print the cases the corpus yields.

use crate::target::TargetArgs;
use bpf_conformance::{Corpus, Harness};

pub fn execute(target: &TargetArgs, filter: Option<&str>) -> anyhow::Result<()> {
    let config = target.resolve()?;
    let harness = Harness::from_config(&config);

    for case in Corpus::from_config(&config.corpus).cases(&harness)? {
        let name = case.name();
        if filter.map_or(true, |f| name.contains(f)) {
            println!("{}\t{}", name, case.path().display());
        }
    }
    Ok(())
}
