//! Built-in rule tables.
//!
//! These are the rule sequences the tool originally shipped as one-off
//! maintenance scripts: rewriting TypeScript `any` annotations to stricter
//! placeholder types. Rule order is significant and preserved.

use crate::error::{Error, Result};
use crate::rules::{Rule, RuleSet};
use serde::Serialize;

/// A named built-in ruleset.
#[derive(Debug, Clone, Serialize)]
pub struct Preset {
    pub name: &'static str,
    pub description: &'static str,
}

const PRESETS: &[Preset] = &[
    Preset {
        name: "ts-any",
        description: "Rewrite common TypeScript 'any' annotations (parameters, variables, arrow returns, casts, catch clauses)",
    },
    Preset {
        name: "ts-any-strict",
        description: "Second-pass 'any' forms: arrays, unions, statement-terminal casts and annotations",
    },
];

/// List all built-in presets.
pub fn list() -> Vec<Preset> {
    PRESETS.to_vec()
}

/// Look up a preset's ruleset by name.
pub fn load(name: &str) -> Result<RuleSet> {
    match name {
        "ts-any" => Ok(ts_any()),
        "ts-any-strict" => Ok(ts_any_strict()),
        _ => Err(Error::preset_not_found(name)),
    }
}

fn rule(pattern: &str, replacement: &str) -> Rule {
    Rule {
        pattern: pattern.to_string(),
        replacement: replacement.to_string(),
    }
}

fn ts_any() -> RuleSet {
    RuleSet {
        rules: vec![
            // Function parameters: (param: any)
            rule(r"\((\w+):\s*any\)", "(${1}: Record<string, unknown>)"),
            // Multi-word parameter lists: (a b: any)
            rule(r"\(([\w\s]+):\s*any\)", "(${1}: Record<string, unknown>)"),
            // Variable annotations: let x: any = ...
            rule(r":\s*any\s*=", ": unknown ="),
            // Arrow return types: ): any =>
            rule(r"\):\s*any\s*=>", "): unknown =>"),
            // Async arrow return types
            rule(r"async\s+\(\):\s*any\s*=>", "async (): Promise<unknown> =>"),
            // Casts closed by a paren: ... as any)
            rule(r"\s+as\s+any\)", " as Record<string, unknown>)"),
            // Catch clauses: catch (err: any)
            rule(r"catch\s*\(\s*(\w+):\s*any\s*\)", "catch (${1}: unknown)"),
        ],
        files: Default::default(),
    }
}

fn ts_any_strict() -> RuleSet {
    RuleSet {
        rules: vec![
            // Array casts: as any[]
            rule(r"as\s+any\[\]", "as Array<Record<string, unknown>>"),
            // Union casts: as any |
            rule(r"as\s+any\s+\|", "as Record<string, unknown> |"),
            // Statement-terminal casts: as any;
            rule(r"as\s+any\s*;", "as Record<string, unknown>;"),
            // Statement-terminal annotations: : any;
            rule(r":\s*any\s*;", ": Record<string, unknown>;"),
            // Array annotations: : any[]
            rule(r":\s*any\[\]", ": Array<Record<string, unknown>>"),
            // Trailing casts before ; or }
            rule(r"\s+as\s+any(\s+[;}])", " as Record<string, unknown>${1}"),
        ],
        files: Default::default(),
    }
}
