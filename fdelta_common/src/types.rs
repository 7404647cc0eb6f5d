use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;

/// Line terminator style as found in the source text
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineTerminator {
    Lf,
    CrLf,
    Cr,
}

impl LineTerminator {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineTerminator::Lf => "\n",
            LineTerminator::CrLf => "\r\n",
            LineTerminator::Cr => "\r",
        }
    }
}

/// A single line of text, without its terminator
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Line {
    content: String,
    terminator: Option<LineTerminator>,
}

impl Line {
    pub fn new(content: impl Into<String>, terminator: Option<LineTerminator>) -> Self {
        Self {
            content: content.into(),
            terminator,
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// `None` only for a final line with no trailing newline
    pub fn terminator(&self) -> Option<LineTerminator> {
        self.terminator
    }

    /// The line as it appeared in the source, terminator included
    pub fn original_text(&self) -> String {
        match self.terminator {
            Some(t) => format!("{}{}", self.content, t.as_str()),
            None => self.content.clone(),
        }
    }
}

impl From<&str> for Line {
    fn from(content: &str) -> Self {
        Line::new(content, Some(LineTerminator::Lf))
    }
}

impl From<String> for Line {
    fn from(content: String) -> Self {
        Line::new(content, Some(LineTerminator::Lf))
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.content)
    }
}

/// Ordered, immutable sequence of lines read from one source
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LineSequence {
    lines: Vec<Line>,
}

impl LineSequence {
    pub fn new(lines: Vec<Line>) -> Self {
        Self { lines }
    }

    /// Split text on `\r\n`, `\n` and `\r`.
    ///
    /// A trailing terminator does not open an extra empty line, so `"a\n"`
    /// and `"a"` both yield one line. The empty string yields none.
    pub fn from_text(text: &str) -> Self {
        let mut lines = Vec::new();
        let mut rest = text;

        while !rest.is_empty() {
            match rest.find(|c: char| c == '\r' || c == '\n') {
                Some(idx) => {
                    let (terminator, width) = if rest[idx..].starts_with("\r\n") {
                        (LineTerminator::CrLf, 2)
                    } else if rest.as_bytes()[idx] == b'\r' {
                        (LineTerminator::Cr, 1)
                    } else {
                        (LineTerminator::Lf, 1)
                    };
                    lines.push(Line::new(&rest[..idx], Some(terminator)));
                    rest = &rest[idx + width..];
                }
                None => {
                    lines.push(Line::new(rest, None));
                    break;
                }
            }
        }

        Self { lines }
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Line> {
        self.lines.get(index)
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Line> {
        self.lines.iter()
    }
}

impl From<Vec<String>> for LineSequence {
    fn from(lines: Vec<String>) -> Self {
        lines.into_iter().collect()
    }
}

impl From<Vec<&str>> for LineSequence {
    fn from(lines: Vec<&str>) -> Self {
        lines.into_iter().map(Line::from).collect()
    }
}

impl FromIterator<Line> for LineSequence {
    fn from_iter<I: IntoIterator<Item = Line>>(iter: I) -> Self {
        Self {
            lines: iter.into_iter().collect(),
        }
    }
}

impl FromIterator<String> for LineSequence {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        iter.into_iter().map(Line::from).collect()
    }
}

impl<'a> IntoIterator for &'a LineSequence {
    type Item = &'a Line;
    type IntoIter = std::slice::Iter<'a, Line>;

    fn into_iter(self) -> Self::IntoIter {
        self.lines.iter()
    }
}

/// A run of lines at a 0-based position in one sequence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub position: usize,
    pub lines: Vec<Line>,
}

impl Chunk {
    pub fn new(position: usize, lines: Vec<Line>) -> Self {
        Self { position, lines }
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn range(&self) -> Range<usize> {
        self.position..self.position + self.lines.len()
    }
}

/// Kind of a line-level edit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditKind {
    Insert,
    Delete,
    Change,
}

/// One line-level edit instruction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum EditOperation {
    /// Lines present only in the revised sequence, inserted before `original_index`
    Insert { original_index: usize, revised: Chunk },
    /// Lines present only in the original sequence; `revised_index` is where they would have been
    Delete { original: Chunk, revised_index: usize },
    /// A contiguous block of original lines replaced by a block of revised lines
    Change { original: Chunk, revised: Chunk },
}

impl EditOperation {
    pub fn kind(&self) -> EditKind {
        match self {
            EditOperation::Insert { .. } => EditKind::Insert,
            EditOperation::Delete { .. } => EditKind::Delete,
            EditOperation::Change { .. } => EditKind::Change,
        }
    }

    /// Original-sequence indices covered; empty for an insert
    pub fn original_range(&self) -> Range<usize> {
        match self {
            EditOperation::Insert { original_index, .. } => *original_index..*original_index,
            EditOperation::Delete { original, .. } | EditOperation::Change { original, .. } => {
                original.range()
            }
        }
    }

    /// Revised-sequence indices covered; empty for a delete
    pub fn revised_range(&self) -> Range<usize> {
        match self {
            EditOperation::Delete { revised_index, .. } => *revised_index..*revised_index,
            EditOperation::Insert { revised, .. } | EditOperation::Change { revised, .. } => {
                revised.range()
            }
        }
    }

    pub fn original_lines(&self) -> &[Line] {
        match self {
            EditOperation::Insert { .. } => &[],
            EditOperation::Delete { original, .. } | EditOperation::Change { original, .. } => {
                &original.lines
            }
        }
    }

    pub fn revised_lines(&self) -> &[Line] {
        match self {
            EditOperation::Delete { .. } => &[],
            EditOperation::Insert { revised, .. } | EditOperation::Change { revised, .. } => {
                &revised.lines
            }
        }
    }
}

/// Ordered edit operations turning one line sequence into another.
///
/// Empty exactly when both sequences compare equal. Operations are sorted
/// by original position and never overlap.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EditScript {
    operations: Vec<EditOperation>,
}

impl EditScript {
    pub fn new(operations: Vec<EditOperation>) -> Self {
        debug_assert!(operations
            .windows(2)
            .all(|w| w[0].original_range().end <= w[1].original_range().start
                && w[0].revised_range().end <= w[1].revised_range().start));
        Self { operations }
    }

    pub fn is_equivalent(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn operations(&self) -> &[EditOperation] {
        &self.operations
    }

    pub fn iter(&self) -> std::slice::Iter<'_, EditOperation> {
        self.operations.iter()
    }

    /// (lines removed from original, lines added from revised)
    pub fn line_counts(&self) -> (usize, usize) {
        self.operations.iter().fold((0, 0), |(del, ins), op| {
            (del + op.original_lines().len(), ins + op.revised_lines().len())
        })
    }
}

impl IntoIterator for EditScript {
    type Item = EditOperation;
    type IntoIter = std::vec::IntoIter<EditOperation>;

    fn into_iter(self) -> Self::IntoIter {
        self.operations.into_iter()
    }
}

impl<'a> IntoIterator for &'a EditScript {
    type Item = &'a EditOperation;
    type IntoIter = std::slice::Iter<'a, EditOperation>;

    fn into_iter(self) -> Self::IntoIter {
        self.operations.iter()
    }
}

/// A byte read from a stream, or the end of that stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ByteValue {
    Byte(u8),
    Eof,
}

impl fmt::Display for ByteValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ByteValue::Byte(b) => write!(f, "{:#x}", b),
            ByteValue::Eof => f.write_str("EOF"),
        }
    }
}

/// Outcome of a byte-level comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ByteDivergence {
    Identical,
    /// First mismatch at a 0-based offset
    DiffersAt {
        offset: u64,
        original: ByteValue,
        revised: ByteValue,
    },
}

impl ByteDivergence {
    pub fn is_identical(&self) -> bool {
        matches!(self, ByteDivergence::Identical)
    }

    pub fn offset(&self) -> Option<u64> {
        match self {
            ByteDivergence::Identical => None,
            ByteDivergence::DiffersAt { offset, .. } => Some(*offset),
        }
    }
}
