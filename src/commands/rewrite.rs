use clap::Args;
use serde::Serialize;
use std::path::{Path, PathBuf};

use textfix::presets;
use textfix::rewrite::{self, ChangedFile, FileFailure, RewriteOptions};
use textfix::rules::{self, RuleSet};

use super::CmdResult;

#[derive(Args)]
pub struct RewriteArgs {
    /// Root directory to rewrite under
    #[arg(long, default_value = ".")]
    path: String,

    /// Glob pattern relative to the root (repeatable; default: **/*.ts, **/*.tsx, **/*.jsx)
    #[arg(long = "glob")]
    globs: Vec<String>,

    /// Directory name to skip at any depth (repeatable; replaces the default set)
    #[arg(long = "exclude")]
    excludes: Vec<String>,

    /// JSON ruleset file
    #[arg(long)]
    rules: Option<String>,

    /// Inline rule as 'pattern=>replacement' (repeatable, applied in order)
    #[arg(long = "rule")]
    inline_rules: Vec<String>,

    /// Built-in preset name (see 'textfix rules presets')
    #[arg(long)]
    preset: Option<String>,

    /// Apply changes to disk (default is dry-run)
    #[arg(long)]
    write: bool,
}

#[derive(Serialize)]
pub struct RewriteOutput {
    root: String,
    dry_run: bool,
    rule_count: usize,
    scanned: usize,
    total_changed: usize,
    changed: Vec<ChangedFile>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    failures: Vec<FileFailure>,
    applied: bool,
}

pub fn run(args: RewriteArgs, _global: &crate::commands::GlobalArgs) -> CmdResult<RewriteOutput> {
    let ruleset = assemble_ruleset(
        args.preset.as_deref(),
        args.rules.as_deref(),
        &args.inline_rules,
    )?;
    let compiled = ruleset.compile()?;

    let root = PathBuf::from(shellexpand::tilde(&args.path).into_owned());

    let mut options = RewriteOptions::new(root.clone());
    if !args.globs.is_empty() {
        options.globs = args.globs.clone();
    }
    if !args.excludes.is_empty() {
        options.exclude = args.excludes.clone();
    }
    options.write = args.write;

    let rule_count = compiled.rules.len();
    let report = rewrite::run(&options, &compiled)?;

    // Per-file failures are report data; the run itself succeeds.
    Ok((
        RewriteOutput {
            root: root.display().to_string(),
            dry_run: !args.write,
            rule_count,
            scanned: report.scanned,
            total_changed: report.total_changed,
            changed: report.changed,
            failures: report.failures,
            applied: report.applied,
        },
        0,
    ))
}

/// Merge rule sources in a fixed order: preset rules first, then the
/// ruleset file, then inline rules.
fn assemble_ruleset(
    preset: Option<&str>,
    rules_file: Option<&str>,
    inline: &[String],
) -> textfix::Result<RuleSet> {
    let mut set = RuleSet::default();

    if let Some(name) = preset {
        let preset_set = presets::load(name)?;
        set.rules.extend(preset_set.rules);
    }

    if let Some(path) = rules_file {
        let path = shellexpand::tilde(path).into_owned();
        let file_set = rules::load_ruleset(Path::new(&path))?;
        set.rules.extend(file_set.rules);
        set.files.extend(file_set.files);
    }

    for spec in inline {
        set.rules.push(rules::parse_inline_rule(spec)?);
    }

    if set.rules.is_empty() && set.files.is_empty() {
        return Err(textfix::Error::validation_missing_argument(vec![
            "rules".to_string(),
            "rule".to_string(),
            "preset".to_string(),
        ])
        .with_hint("Provide a ruleset with --rules FILE, --rule 'pattern=>replacement', or --preset NAME"));
    }

    Ok(set)
}
