use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};

/// Line coverage loaded from a Go cover profile.
///
/// Profile lines look like
/// `example.com/mod/pkg/file.go:10.2,12.16 2 1` — a source span, a
/// statement count and an execution count. Blocks that never executed
/// are dropped at load time, so membership means "executed".
#[derive(Debug, Default)]
pub struct Coverage {
    blocks: HashMap<String, Vec<Block>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
    pub start_line: usize,
    pub start_col: usize,
    pub end_line: usize,
    pub end_col: usize,
    pub count: u64,
}

impl Coverage {
    pub fn load(path: &Path) -> Result<Coverage> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read coverage profile {}", path.display()))?;
        Ok(Coverage::parse(&data))
    }

    /// Parse profile text. The `mode:` header and malformed lines are
    /// skipped rather than rejected, matching the tolerance of the Go
    /// cover tooling itself.
    pub fn parse(data: &str) -> Coverage {
        let mut cov = Coverage::default();
        for line in data.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with("mode:") {
                continue;
            }
            let Some((file, rest)) = line.rsplit_once(':') else {
                continue;
            };
            let fields: Vec<&str> = rest.split_whitespace().collect();
            if fields.len() != 3 {
                continue;
            }
            let Some((start, end)) = fields[0].split_once(',') else {
                continue;
            };
            let (Some((start_line, start_col)), Some((end_line, end_col))) =
                (parse_position(start), parse_position(end))
            else {
                continue;
            };
            let Ok(count) = fields[2].parse::<u64>() else {
                continue;
            };
            if count == 0 {
                continue;
            }
            cov.blocks.entry(file.to_string()).or_default().push(Block {
                start_line,
                start_col,
                end_line,
                end_col,
                count,
            });
        }
        cov
    }

    /// True when some executed block under a key matching `file` spans
    /// `line`.
    pub fn is_covered(&self, file: &Path, line: usize) -> bool {
        let file = file.to_string_lossy();
        for (key, blocks) in &self.blocks {
            if !paths_match(&file, key) {
                continue;
            }
            if blocks
                .iter()
                .any(|b| line >= b.start_line && line <= b.end_line)
            {
                return true;
            }
        }
        false
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

fn parse_position(s: &str) -> Option<(usize, usize)> {
    let (line, col) = s.split_once('.')?;
    Some((line.parse().ok()?, col.parse().ok()?))
}

/// Profile keys are module-qualified (`example.com/mod/pkg/file.go`)
/// while the engine works with absolute paths. Two paths match when one
/// is a segment-aligned suffix of the other, or when their rightmost
/// two segments agree.
fn paths_match(a: &str, b: &str) -> bool {
    let a_parts: Vec<&str> = a.split('/').filter(|s| !s.is_empty()).collect();
    let b_parts: Vec<&str> = b.split('/').filter(|s| !s.is_empty()).collect();
    if a_parts.is_empty() || b_parts.is_empty() {
        return false;
    }
    let mut common = 0;
    while common < a_parts.len()
        && common < b_parts.len()
        && a_parts[a_parts.len() - 1 - common] == b_parts[b_parts.len() - 1 - common]
    {
        common += 1;
    }
    common == a_parts.len() || common == b_parts.len() || common >= 2
}
