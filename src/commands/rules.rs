use clap::{Args, Subcommand};
use serde::Serialize;
use std::path::Path;

use textfix::presets::{self, Preset};
use textfix::rules::{self, Rule};

use super::CmdResult;

#[derive(Args)]
pub struct RulesArgs {
    #[command(subcommand)]
    command: RulesCommand,
}

#[derive(Subcommand)]
enum RulesCommand {
    /// Validate a ruleset file and list its compiled rules
    Check {
        /// JSON ruleset file
        file: String,
    },
    /// List built-in presets
    Presets,
}

#[derive(Serialize)]
#[serde(tag = "command")]
pub enum RulesOutput {
    #[serde(rename = "rules.check")]
    Check {
        file: String,
        rule_count: usize,
        file_rule_count: usize,
        rules: Vec<Rule>,
    },
    #[serde(rename = "rules.presets")]
    Presets { presets: Vec<Preset> },
}

pub fn run(args: RulesArgs, _global: &crate::commands::GlobalArgs) -> CmdResult<RulesOutput> {
    match args.command {
        RulesCommand::Check { file } => run_check(&file),
        RulesCommand::Presets => Ok((
            RulesOutput::Presets {
                presets: presets::list(),
            },
            0,
        )),
    }
}

fn run_check(file: &str) -> CmdResult<RulesOutput> {
    let path = shellexpand::tilde(file).into_owned();
    let set = rules::load_ruleset(Path::new(&path))?;

    // Compiling surfaces invalid patterns as errors
    set.compile()?;

    let file_rule_count = set.files.values().map(|r| r.len()).sum();

    Ok((
        RulesOutput::Check {
            file: path,
            rule_count: set.rules.len(),
            file_rule_count,
            rules: set.rules,
        },
        0,
    ))
}
