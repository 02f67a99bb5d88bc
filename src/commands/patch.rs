use clap::Args;
use serde::Serialize;
use std::path::{Path, PathBuf};

use textfix::patch::{self, AppliedPatch};

use super::CmdResult;

#[derive(Args)]
pub struct PatchArgs {
    /// File to patch
    #[arg(long)]
    file: String,

    /// JSON patch-list file (line-addressed substitutions)
    #[arg(long)]
    patches: String,

    /// Apply changes to disk (default is dry-run)
    #[arg(long)]
    write: bool,
}

#[derive(Serialize)]
pub struct PatchOutput {
    file: String,
    dry_run: bool,
    changed: bool,
    patches: Vec<AppliedPatch>,
    applied: bool,
}

pub fn run(args: PatchArgs, _global: &crate::commands::GlobalArgs) -> CmdResult<PatchOutput> {
    let patches_path = shellexpand::tilde(&args.patches).into_owned();
    let set = patch::load_patch_set(Path::new(&patches_path))?;

    let file = PathBuf::from(shellexpand::tilde(&args.file).into_owned());
    let report = patch::patch_file(&file, &set.patches, args.write)?;

    Ok((
        PatchOutput {
            file: report.file,
            dry_run: !args.write,
            changed: report.changed,
            patches: report.patches,
            applied: report.applied,
        },
        0,
    ))
}
