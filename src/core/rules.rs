//! Rule model and the sequential rewrite pass.
//!
//! A `Rule` is a (regex pattern, replacement template) pair. A `RuleSet` is
//! an ordered list of rules, optionally with per-file rule lists keyed by
//! relative path. `apply` runs every rule in order over the full content and
//! reports whether anything changed.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{Error, Result};

// ============================================================================
// Types
// ============================================================================

/// A single pattern/replacement rule as it appears in a ruleset file.
///
/// Replacement templates use the regex crate's `${n}` capture references.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Rule {
    pub pattern: String,
    pub replacement: String,
}

/// An ordered rule list, optionally restricted per file.
///
/// `rules` apply to every file the driver visits; `files` maps relative
/// paths to extra rules that apply only to that file, after the shared ones.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleSet {
    #[serde(default)]
    pub rules: Vec<Rule>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub files: BTreeMap<String, Vec<Rule>>,
}

/// A rule with its pattern compiled, ready to run.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    pub rule: Rule,
    regex: Regex,
}

impl CompiledRule {
    pub fn new(rule: Rule) -> Result<Self> {
        let regex = Regex::new(&rule.pattern)
            .map_err(|e| Error::rule_invalid_pattern(&rule.pattern, e.to_string(), None))?;
        Ok(Self { rule, regex })
    }

    /// Count the non-overlapping matches this rule has in `content`.
    pub fn match_count(&self, content: &str) -> usize {
        self.regex.find_iter(content).count()
    }
}

/// A compiled rule set: shared rules plus per-file extras.
#[derive(Debug, Clone, Default)]
pub struct CompiledRuleSet {
    pub rules: Vec<CompiledRule>,
    pub files: BTreeMap<String, Vec<CompiledRule>>,
}

impl CompiledRuleSet {
    /// The rules that apply to one file: shared rules first, then any rules
    /// keyed to the file's relative path, in declaration order.
    pub fn rules_for<'a>(&'a self, relative: &str) -> Vec<&'a CompiledRule> {
        let mut out: Vec<&CompiledRule> = self.rules.iter().collect();
        if let Some(extra) = self.files.get(relative) {
            out.extend(extra.iter());
        }
        out
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty() && self.files.is_empty()
    }
}

impl RuleSet {
    /// Compile every pattern in the set, failing on the first invalid one.
    pub fn compile(&self) -> Result<CompiledRuleSet> {
        let rules = compile_rules(&self.rules)?;

        let mut files = BTreeMap::new();
        for (path, file_rules) in &self.files {
            files.insert(path.clone(), compile_rules(file_rules)?);
        }

        Ok(CompiledRuleSet { rules, files })
    }
}

fn compile_rules(rules: &[Rule]) -> Result<Vec<CompiledRule>> {
    rules.iter().cloned().map(CompiledRule::new).collect()
}

// ============================================================================
// Loading
// ============================================================================

/// Load a ruleset from a JSON file.
pub fn load_ruleset(path: &Path) -> Result<RuleSet> {
    if !path.exists() {
        return Err(Error::ruleset_not_found(path.display().to_string()));
    }

    let raw = crate::io::read_file(path, &format!("read ruleset {}", path.display()))?;
    serde_json::from_str(&raw).map_err(|e| {
        Error::validation_invalid_json(e, Some(format!("parse ruleset {}", path.display())))
    })
}

/// Parse an inline `pattern=>replacement` rule from the command line.
pub fn parse_inline_rule(spec: &str) -> Result<Rule> {
    let Some(pos) = spec.find("=>") else {
        return Err(Error::validation_invalid_argument(
            "rule",
            format!("Expected 'pattern=>replacement', got '{}'", spec),
            None,
            None,
        ));
    };

    let pattern = &spec[..pos];
    if pattern.is_empty() {
        return Err(Error::validation_invalid_argument(
            "rule",
            "Rule pattern is empty",
            None,
            None,
        ));
    }

    Ok(Rule {
        pattern: pattern.to_string(),
        replacement: spec[pos + 2..].to_string(),
    })
}

// ============================================================================
// The rewrite pass
// ============================================================================

/// Outcome of applying a rule list to one content string.
#[derive(Debug, Clone)]
pub struct ApplyOutcome {
    pub content: String,
    pub changed: bool,
    /// Total non-overlapping matches replaced across all rules.
    pub replacements: usize,
}

/// Apply every rule in order to the full content.
///
/// Each rule replaces all non-overlapping left-to-right matches in the
/// output of the previous rule. Single top-to-bottom pass only: if a later
/// rule's replacement creates new text an earlier rule would match, it is
/// not revisited.
pub fn apply(content: &str, rules: &[&CompiledRule]) -> ApplyOutcome {
    let mut result = content.to_string();
    let mut replacements = 0;

    for rule in rules {
        let count = rule.match_count(&result);
        if count == 0 {
            continue;
        }
        replacements += count;
        result = rule
            .regex
            .replace_all(&result, rule.rule.replacement.as_str())
            .into_owned();
    }

    let changed = result != content;
    ApplyOutcome {
        content: result,
        changed,
        replacements,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(rules: &[(&str, &str)]) -> Vec<CompiledRule> {
        rules
            .iter()
            .map(|(p, r)| {
                CompiledRule::new(Rule {
                    pattern: p.to_string(),
                    replacement: r.to_string(),
                })
                .unwrap()
            })
            .collect()
    }

    fn apply_all(content: &str, compiled: &[CompiledRule]) -> ApplyOutcome {
        let refs: Vec<&CompiledRule> = compiled.iter().collect();
        apply(content, &refs)
    }

    #[test]
    fn end_to_end_example() {
        let rules = compile(&[(r":\s*any\s*=", ": unknown =")]);
        let outcome = apply_all("const x: any = foo();", &rules);
        assert!(outcome.changed);
        assert_eq!(outcome.content, "const x: unknown = foo();");
        assert_eq!(outcome.replacements, 1);
    }

    #[test]
    fn noop_returns_identical_content() {
        let rules = compile(&[(r":\s*any\s*=", ": unknown =")]);
        let outcome = apply_all("const x: number = 1;", &rules);
        assert!(!outcome.changed);
        assert_eq!(outcome.content, "const x: number = 1;");
        assert_eq!(outcome.replacements, 0);
    }

    #[test]
    fn non_overlapping_matches_rewritten_independently() {
        let rules = compile(&[(r"\((\w+): any\)", "(${1}: Record<string, unknown>)")]);
        let outcome = apply_all("(a: any) (b: any)", &rules);
        assert!(outcome.changed);
        assert_eq!(
            outcome.content,
            "(a: Record<string, unknown>) (b: Record<string, unknown>)"
        );
        assert_eq!(outcome.replacements, 2);
    }

    #[test]
    fn rules_compose_sequentially() {
        // Second rule sees the first rule's output.
        let rules = compile(&[("alpha", "beta"), ("beta", "gamma")]);
        let outcome = apply_all("alpha", &rules);
        assert_eq!(outcome.content, "gamma");
    }

    #[test]
    fn earlier_rule_never_revisits_later_output() {
        // Rule 2's output matches rule 1's pattern, but the pass is single
        // top-to-bottom: rule 1 already ran.
        let rules = compile(&[("beta", "final"), ("alpha", "beta")]);
        let outcome = apply_all("alpha", &rules);
        assert_eq!(outcome.content, "beta");
    }

    #[test]
    fn idempotent_on_stable_input() {
        let rules = compile(&[
            (r"\((\w+):\s*any\)", "(${1}: Record<string, unknown>)"),
            (r":\s*any\s*=", ": unknown ="),
        ]);
        let first = apply_all("let x: any = f(y: any)", &rules);
        assert!(first.changed);

        let second = apply_all(&first.content, &rules);
        assert!(!second.changed);
        assert_eq!(second.content, first.content);
    }

    #[test]
    fn capture_references_instantiate() {
        let rules = compile(&[(r"catch\s*\(\s*(\w+):\s*any\s*\)", "catch (${1}: unknown)")]);
        let outcome = apply_all("try {} catch (err: any) {}", &rules);
        assert_eq!(outcome.content, "try {} catch (err: unknown) {}");
    }

    #[test]
    fn invalid_pattern_rejected_at_compile() {
        let result = CompiledRule::new(Rule {
            pattern: "(unclosed".to_string(),
            replacement: "x".to_string(),
        });
        assert!(result.is_err());
        assert_eq!(result.unwrap_err().code.as_str(), "rule.invalid_pattern");
    }

    #[test]
    fn parse_inline_rule_splits_on_arrow() {
        let rule = parse_inline_rule(r":\s*any\s*==>: unknown =").unwrap();
        assert_eq!(rule.pattern, r":\s*any\s*=");
        assert_eq!(rule.replacement, ": unknown =");
    }

    #[test]
    fn parse_inline_rule_rejects_missing_arrow() {
        let err = parse_inline_rule("no separator here").unwrap_err();
        assert_eq!(err.code.as_str(), "validation.invalid_argument");
    }

    #[test]
    fn parse_inline_rule_rejects_empty_pattern() {
        let err = parse_inline_rule("=>replacement").unwrap_err();
        assert_eq!(err.code.as_str(), "validation.invalid_argument");
    }

    #[test]
    fn ruleset_file_rules_follow_shared_rules() {
        let set = RuleSet {
            rules: vec![Rule {
                pattern: "a".to_string(),
                replacement: "b".to_string(),
            }],
            files: BTreeMap::from([(
                "app/page.tsx".to_string(),
                vec![Rule {
                    pattern: "c".to_string(),
                    replacement: "d".to_string(),
                }],
            )]),
        };
        let compiled = set.compile().unwrap();

        let for_page = compiled.rules_for("app/page.tsx");
        assert_eq!(for_page.len(), 2);
        assert_eq!(for_page[0].rule.pattern, "a");
        assert_eq!(for_page[1].rule.pattern, "c");

        let for_other = compiled.rules_for("lib/db.ts");
        assert_eq!(for_other.len(), 1);
    }

    #[test]
    fn ruleset_deserializes_without_files_key() {
        let set: RuleSet =
            serde_json::from_str(r#"{"rules":[{"pattern":"x","replacement":"y"}]}"#).unwrap();
        assert_eq!(set.rules.len(), 1);
        assert!(set.files.is_empty());
    }

    #[test]
    fn load_ruleset_missing_file_is_not_found() {
        let err = load_ruleset(Path::new("/nonexistent/rules.json")).unwrap_err();
        assert_eq!(err.code.as_str(), "ruleset.not_found");
    }
}
