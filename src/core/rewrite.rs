//! Tree-walking rewrite driver.
//!
//! Enumerates files under a root via glob patterns, skips excluded path
//! segments, runs the rule pass over each file, and persists changed
//! content in place. Per-file failures are recorded and never halt the run.

use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::rules::{self, CompiledRuleSet};

// ============================================================================
// Types
// ============================================================================

/// Default glob patterns for text-source files.
pub const DEFAULT_GLOBS: &[&str] = &["**/*.ts", "**/*.tsx", "**/*.jsx"];

/// Directory names excluded at any depth by default.
pub const DEFAULT_EXCLUDES: &[&str] = &["node_modules", ".next", ".git", "dist", "build", "target"];

/// Options for one rewrite run.
#[derive(Debug, Clone)]
pub struct RewriteOptions {
    /// Root directory to enumerate from.
    pub root: PathBuf,
    /// Glob patterns relative to the root.
    pub globs: Vec<String>,
    /// Path segment names to skip.
    pub exclude: Vec<String>,
    /// Apply changes to disk (default is dry-run).
    pub write: bool,
}

impl RewriteOptions {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            globs: DEFAULT_GLOBS.iter().map(|s| s.to_string()).collect(),
            exclude: DEFAULT_EXCLUDES.iter().map(|s| s.to_string()).collect(),
            write: false,
        }
    }
}

/// One file whose content the rule pass changed.
#[derive(Debug, Clone, Serialize)]
pub struct ChangedFile {
    /// Path relative to the root.
    pub file: String,
    /// Non-overlapping matches replaced across all rules.
    pub replacements: usize,
}

/// One file that could not be processed.
#[derive(Debug, Clone, Serialize)]
pub struct FileFailure {
    /// Path relative to the root.
    pub file: String,
    /// What went wrong (read, decode, or write).
    pub error: String,
}

/// The full report of a rewrite run.
#[derive(Debug, Clone, Serialize)]
pub struct RewriteReport {
    /// Files enumerated after exclusion filtering.
    pub scanned: usize,
    /// Files whose content changed.
    pub changed: Vec<ChangedFile>,
    /// Per-file failures; these never fail the run.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<FileFailure>,
    /// Total changed-file count.
    pub total_changed: usize,
    /// Whether changes were written to disk.
    pub applied: bool,
}

// ============================================================================
// File enumeration
// ============================================================================

/// Expand the option globs under the root, deduplicated and sorted,
/// excluding any path with an excluded segment.
fn enumerate_files(options: &RewriteOptions) -> Result<Vec<PathBuf>> {
    let mut files = BTreeSet::new();

    for pattern in &options.globs {
        let full = options.root.join(pattern);
        let full = full.to_string_lossy();

        let entries = glob::glob(&full).map_err(|e| {
            Error::validation_invalid_argument(
                "glob",
                format!("Invalid glob pattern '{}': {}", pattern, e),
                Some(pattern.clone()),
                None,
            )
        })?;

        for path in entries.filter_map(|entry| entry.ok()) {
            if path.is_file() && !is_excluded(&path, &options.root, &options.exclude) {
                files.insert(path);
            }
        }
    }

    Ok(files.into_iter().collect())
}

/// True if any path segment between the root and the file matches an
/// excluded name.
fn is_excluded(path: &Path, root: &Path, exclude: &[String]) -> bool {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative.components().any(|c| {
        let name = c.as_os_str().to_string_lossy();
        exclude.iter().any(|e| e == name.as_ref())
    })
}

fn relative_display(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .to_string()
}

// ============================================================================
// The run
// ============================================================================

/// Run the rule set over every matching file under the root.
///
/// Each file is read, transformed through the full rule set, and written
/// back only when the result differs from the original. Read and write
/// failures become `FileFailure` records; the run always completes.
pub fn run(options: &RewriteOptions, ruleset: &CompiledRuleSet) -> Result<RewriteReport> {
    let files = enumerate_files(options)?;

    let mut changed = Vec::new();
    let mut failures = Vec::new();

    for path in &files {
        let relative = relative_display(path, &options.root);

        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                failures.push(FileFailure {
                    file: relative,
                    error: e.to_string(),
                });
                continue;
            }
        };

        let file_rules = ruleset.rules_for(&relative);
        let outcome = rules::apply(&content, &file_rules);
        if !outcome.changed {
            continue;
        }

        if options.write {
            if let Err(e) = std::fs::write(path, &outcome.content) {
                failures.push(FileFailure {
                    file: relative,
                    error: e.to_string(),
                });
                continue;
            }
            log_status!("rewrite", "Changed: {}", relative);
        }

        changed.push(ChangedFile {
            file: relative,
            replacements: outcome.replacements,
        });
    }

    let total_changed = changed.len();
    Ok(RewriteReport {
        scanned: files.len(),
        changed,
        failures,
        total_changed,
        applied: options.write,
    })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{Rule, RuleSet};

    fn compiled(rules: &[(&str, &str)]) -> CompiledRuleSet {
        RuleSet {
            rules: rules
                .iter()
                .map(|(p, r)| Rule {
                    pattern: p.to_string(),
                    replacement: r.to_string(),
                })
                .collect(),
            files: Default::default(),
        }
        .compile()
        .unwrap()
    }

    fn options(root: &Path, write: bool) -> RewriteOptions {
        let mut opts = RewriteOptions::new(root);
        opts.write = write;
        opts
    }

    #[test]
    fn dry_run_reports_without_writing() {
        let dir = std::env::temp_dir().join("textfix_rewrite_dry_test");
        let _ = std::fs::create_dir_all(&dir);

        std::fs::write(dir.join("a.ts"), "const x: any = foo();\n").unwrap();

        let rules = compiled(&[(r":\s*any\s*=", ": unknown =")]);
        let report = run(&options(&dir, false), &rules).unwrap();

        assert_eq!(report.total_changed, 1);
        assert!(!report.applied);
        assert_eq!(report.changed[0].file, "a.ts");
        assert_eq!(report.changed[0].replacements, 1);

        // File untouched
        let content = std::fs::read_to_string(dir.join("a.ts")).unwrap();
        assert_eq!(content, "const x: any = foo();\n");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn write_mode_persists_changed_files_only() {
        let dir = std::env::temp_dir().join("textfix_rewrite_write_test");
        let _ = std::fs::create_dir_all(&dir);

        std::fs::write(dir.join("a.ts"), "const x: any = foo();\n").unwrap();
        std::fs::write(dir.join("b.ts"), "const y: number = 1;\n").unwrap();

        let rules = compiled(&[(r":\s*any\s*=", ": unknown =")]);
        let report = run(&options(&dir, true), &rules).unwrap();

        assert_eq!(report.scanned, 2);
        assert_eq!(report.total_changed, 1);
        assert!(report.applied);

        assert_eq!(
            std::fs::read_to_string(dir.join("a.ts")).unwrap(),
            "const x: unknown = foo();\n"
        );
        assert_eq!(
            std::fs::read_to_string(dir.join("b.ts")).unwrap(),
            "const y: number = 1;\n"
        );

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn excluded_segment_never_touched() {
        let dir = std::env::temp_dir().join("textfix_rewrite_exclude_test");
        let vendored = dir.join("node_modules").join("pkg");
        let _ = std::fs::create_dir_all(&vendored);

        std::fs::write(vendored.join("index.ts"), "const x: any = foo();\n").unwrap();

        let rules = compiled(&[(r":\s*any\s*=", ": unknown =")]);
        let report = run(&options(&dir, true), &rules).unwrap();

        assert_eq!(report.scanned, 0);
        assert_eq!(report.total_changed, 0);
        assert_eq!(
            std::fs::read_to_string(vendored.join("index.ts")).unwrap(),
            "const x: any = foo();\n"
        );

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn nested_matching_files_found() {
        let dir = std::env::temp_dir().join("textfix_rewrite_nested_test");
        let sub = dir.join("app").join("api");
        let _ = std::fs::create_dir_all(&sub);

        std::fs::write(sub.join("route.ts"), "const body: any = req.json();\n").unwrap();

        let rules = compiled(&[(r":\s*any\s*=", ": unknown =")]);
        let report = run(&options(&dir, true), &rules).unwrap();

        assert_eq!(report.total_changed, 1);
        assert_eq!(report.changed[0].file, "app/api/route.ts");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn unreadable_file_recorded_and_run_continues() {
        let dir = std::env::temp_dir().join("textfix_rewrite_failure_test");
        let _ = std::fs::create_dir_all(&dir);

        // Invalid UTF-8 makes read_to_string fail
        std::fs::write(dir.join("bad.ts"), [0xff, 0xfe, 0x00, 0x01]).unwrap();
        std::fs::write(dir.join("good.ts"), "const x: any = foo();\n").unwrap();

        let rules = compiled(&[(r":\s*any\s*=", ": unknown =")]);
        let report = run(&options(&dir, true), &rules).unwrap();

        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].file, "bad.ts");
        assert_eq!(report.total_changed, 1);
        assert_eq!(report.changed[0].file, "good.ts");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn per_file_rules_restricted_to_their_path() {
        let dir = std::env::temp_dir().join("textfix_rewrite_perfile_test");
        let _ = std::fs::create_dir_all(&dir);

        std::fs::write(dir.join("page.tsx"), "plans[0].name\n").unwrap();
        std::fs::write(dir.join("other.tsx"), "plans[0].name\n").unwrap();

        let set = RuleSet {
            rules: vec![],
            files: std::collections::BTreeMap::from([(
                "page.tsx".to_string(),
                vec![Rule {
                    pattern: r"plans\[0\]\.name".to_string(),
                    replacement: "(plans[0] as Record<string, unknown>).name".to_string(),
                }],
            )]),
        };

        let report = run(&options(&dir, true), &set.compile().unwrap()).unwrap();

        assert_eq!(report.total_changed, 1);
        assert_eq!(report.changed[0].file, "page.tsx");
        assert_eq!(
            std::fs::read_to_string(dir.join("other.tsx")).unwrap(),
            "plans[0].name\n"
        );

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn is_excluded_matches_exact_segment_only() {
        let root = Path::new("/tmp/proj");
        let exclude = vec!["build".to_string()];

        assert!(is_excluded(
            Path::new("/tmp/proj/build/out.ts"),
            root,
            &exclude
        ));
        // "builders" contains "build" but is a different segment
        assert!(!is_excluded(
            Path::new("/tmp/proj/builders/out.ts"),
            root,
            &exclude
        ));
    }
}
