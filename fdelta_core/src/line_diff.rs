use fdelta_common::{
    Chunk, CompareConfig, DiffAlgorithm, EditOperation, EditScript, LineSequence,
    LineEndingPolicy, LineTerminator,
};
use similar::algorithms::{diff_slices, Capture, Replace};
use similar::{Algorithm, DiffOp};
use std::ops::Range;
use tracing::debug;

/// Configuration for line comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LineDiffConfig {
    pub algorithm: DiffAlgorithm,
    pub line_endings: LineEndingPolicy,
}

impl LineDiffConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn strict_line_endings() -> Self {
        Self {
            line_endings: LineEndingPolicy::Strict,
            ..Default::default()
        }
    }

    pub fn with_algorithm(algorithm: DiffAlgorithm) -> Self {
        Self {
            algorithm,
            ..Default::default()
        }
    }
}

impl From<&CompareConfig> for LineDiffConfig {
    fn from(config: &CompareConfig) -> Self {
        Self {
            algorithm: config.algorithm,
            line_endings: config.line_endings,
        }
    }
}

/// Comparison key for a line. Under the lenient policy the terminator is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
struct LineKey<'a> {
    content: &'a str,
    terminator: Option<LineTerminator>,
}

/// Line-oriented diff engine producing an [`EditScript`]
#[derive(Debug, Clone, Default)]
pub struct LineDiffEngine {
    config: LineDiffConfig,
}

impl LineDiffEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: LineDiffConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LineDiffConfig {
        &self.config
    }

    /// Compute the edit script turning `original` into `revised`.
    ///
    /// Adjacent unmatched runs on both sides are reported as one `Change`,
    /// never as a delete followed by an insert.
    pub fn diff(&self, original: &LineSequence, revised: &LineSequence) -> EditScript {
        let old_keys = self.keys(original);
        let new_keys = self.keys(revised);

        if old_keys == new_keys {
            debug!("Line sequences equivalent ({} lines)", original.len());
            return EditScript::default();
        }

        let mut hunks: Vec<(Range<usize>, Range<usize>)> = Vec::new();
        for op in self.capture_ops(&old_keys, &new_keys) {
            let (old, new) = match op {
                DiffOp::Equal { .. } => continue,
                DiffOp::Delete {
                    old_index,
                    old_len,
                    new_index,
                } => (old_index..old_index + old_len, new_index..new_index),
                DiffOp::Insert {
                    old_index,
                    new_index,
                    new_len,
                } => (old_index..old_index, new_index..new_index + new_len),
                DiffOp::Replace {
                    old_index,
                    old_len,
                    new_index,
                    new_len,
                } => (old_index..old_index + old_len, new_index..new_index + new_len),
            };

            // Touching hunks have no matched line between them; fold them into one.
            if let Some((prev_old, prev_new)) = hunks.last_mut() {
                if prev_old.end == old.start && prev_new.end == new.start {
                    prev_old.end = old.end;
                    prev_new.end = new.end;
                    continue;
                }
            }
            hunks.push((old, new));
        }

        let operations: Vec<EditOperation> = hunks
            .into_iter()
            .map(|(old, new)| to_operation(original, revised, old, new))
            .collect();

        debug!(
            "Diffed {} original lines against {} revised lines: {} operations",
            original.len(),
            revised.len(),
            operations.len()
        );

        EditScript::new(operations)
    }

    /// Split both texts into lines and diff them
    pub fn diff_text(&self, original: &str, revised: &str) -> EditScript {
        self.diff(
            &LineSequence::from_text(original),
            &LineSequence::from_text(revised),
        )
    }

    /// Ops in sequence order, adjacent delete/insert runs merged into replaces.
    ///
    /// Not `capture_diff_slices`: its compaction pass can leave a shifted op
    /// with a stale `new_index`.
    fn capture_ops(&self, old_keys: &[LineKey<'_>], new_keys: &[LineKey<'_>]) -> Vec<DiffOp> {
        let mut hook = Replace::new(Capture::new());
        if let Err(never) = diff_slices(self.algorithm(), &mut hook, old_keys, new_keys) {
            match never {}
        }
        hook.into_inner().into_ops()
    }

    fn algorithm(&self) -> Algorithm {
        match self.config.algorithm {
            DiffAlgorithm::Myers => Algorithm::Myers,
            DiffAlgorithm::Patience => Algorithm::Patience,
            DiffAlgorithm::Lcs => Algorithm::Lcs,
        }
    }

    fn keys<'a>(&self, lines: &'a LineSequence) -> Vec<LineKey<'a>> {
        let strict = self.config.line_endings == LineEndingPolicy::Strict;
        lines
            .iter()
            .map(|line| LineKey {
                content: line.content(),
                terminator: if strict { line.terminator() } else { None },
            })
            .collect()
    }
}

fn to_operation(
    original: &LineSequence,
    revised: &LineSequence,
    old: Range<usize>,
    new: Range<usize>,
) -> EditOperation {
    let original_chunk = Chunk::new(old.start, original.lines()[old.clone()].to_vec());
    let revised_chunk = Chunk::new(new.start, revised.lines()[new.clone()].to_vec());

    if old.is_empty() {
        EditOperation::Insert {
            original_index: old.start,
            revised: revised_chunk,
        }
    } else if new.is_empty() {
        EditOperation::Delete {
            original: original_chunk,
            revised_index: new.start,
        }
    } else {
        EditOperation::Change {
            original: original_chunk,
            revised: revised_chunk,
        }
    }
}
