//! Line-addressed single-file patcher.
//!
//! Each patch carries a 1-indexed line number referring to the original
//! file; its substitution is confined to that line's text. Patches are
//! applied in descending line order so that an edit can never shift the
//! address of a not-yet-applied edit.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};
use crate::io;
use crate::rules::{CompiledRule, Rule};

// ============================================================================
// Types
// ============================================================================

/// A substitution confined to one line of the target file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinePatch {
    /// 1-indexed line number in the original file.
    pub line: usize,
    pub pattern: String,
    pub replacement: String,
}

/// A patch list as loaded from a JSON file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatchSet {
    pub patches: Vec<LinePatch>,
}

/// One applied patch in the report.
#[derive(Debug, Clone, Serialize)]
pub struct AppliedPatch {
    pub line: usize,
    /// Non-overlapping matches replaced on the line.
    pub replacements: usize,
}

/// The result of patching one file.
#[derive(Debug, Clone, Serialize)]
pub struct PatchReport {
    pub file: String,
    pub patches: Vec<AppliedPatch>,
    pub changed: bool,
    pub applied: bool,
}

// ============================================================================
// Loading
// ============================================================================

/// Load a patch set from a JSON file.
pub fn load_patch_set(path: &Path) -> Result<PatchSet> {
    if !path.exists() {
        return Err(Error::patch_set_not_found(path.display().to_string()));
    }

    let raw = io::read_file(path, &format!("read patch set {}", path.display()))?;
    serde_json::from_str(&raw).map_err(|e| {
        Error::validation_invalid_json(e, Some(format!("parse patch set {}", path.display())))
    })
}

// ============================================================================
// Application
// ============================================================================

/// Apply a patch set to the content of one file.
///
/// Line numbers are validated against the original file before anything is
/// rewritten; an out-of-range address fails the whole operation since every
/// address refers to the original line layout.
pub fn apply_patches(content: &str, file: &str, patches: &[LinePatch]) -> Result<(String, Vec<AppliedPatch>)> {
    // Split keeping line terminators so the join is byte-lossless.
    let mut lines: Vec<String> = content.split_inclusive('\n').map(String::from).collect();

    for patch in patches {
        if patch.line == 0 || patch.line > lines.len() {
            return Err(Error::patch_line_out_of_range(file, patch.line, lines.len()));
        }
    }

    // Descending order: an edit never shifts the address of a pending one.
    let mut ordered: Vec<&LinePatch> = patches.iter().collect();
    ordered.sort_by(|a, b| b.line.cmp(&a.line));

    let mut applied = Vec::new();
    for patch in ordered {
        let compiled = CompiledRule::new(Rule {
            pattern: patch.pattern.clone(),
            replacement: patch.replacement.clone(),
        })?;

        let idx = patch.line - 1;
        let outcome = crate::rules::apply(&lines[idx], &[&compiled]);
        applied.push(AppliedPatch {
            line: patch.line,
            replacements: outcome.replacements,
        });
        lines[idx] = outcome.content;
    }

    // Report in ascending line order
    applied.reverse();
    Ok((lines.concat(), applied))
}

/// Patch one file on disk, writing back only when content changed.
pub fn patch_file(path: &Path, patches: &[LinePatch], write: bool) -> Result<PatchReport> {
    let display = path.display().to_string();
    let content = io::read_file(path, &format!("read {}", display))?;

    let (new_content, applied) = apply_patches(&content, &display, patches)?;
    let changed = new_content != content;

    if changed && write {
        io::write_file(path, &new_content, &format!("write {}", display))?;
        log_status!("patch", "Patched: {}", display);
    }

    Ok(PatchReport {
        file: display,
        patches: applied,
        changed,
        applied: changed && write,
    })
}

// ============================================================================
// Tests
// ============================================================================
