use crate::byte_compare::ByteCompareEngine;
use crate::comparator::ContentDiff;
use crate::line_diff::{LineDiffConfig, LineDiffEngine};
use crate::text_source::{read_file_lines, Encoding};
use fdelta_common::{ByteDivergence, CompareConfig, EditScript, FDeltaError, LineSequence};
use std::path::Path;
use tracing::{debug, warn};

/// File-level checks built on the line and byte engines.
///
/// In every check `actual` is the original side and the expectation is the
/// revised side.
#[derive(Debug, Clone, Default)]
pub struct FileComparison {
    lines: LineDiffEngine,
    bytes: ByteCompareEngine,
}

impl FileComparison {
    pub fn new(lines: LineDiffEngine, bytes: ByteCompareEngine) -> Self {
        Self { lines, bytes }
    }

    pub fn from_config(config: &CompareConfig) -> Result<Self, FDeltaError> {
        config.validate()?;
        Ok(Self {
            lines: LineDiffEngine::with_config(LineDiffConfig::from(config)),
            bytes: ByteCompareEngine::new(config.chunk_size)?,
        })
    }

    /// Diff the decoded lines of `actual` against `expected` text
    pub fn has_content(
        &self,
        actual: &Path,
        expected: &str,
        encoding: Encoding,
    ) -> Result<EditScript, FDeltaError> {
        ensure_actual_file(actual)?;
        let actual_lines = read_file_lines(actual, encoding)?;
        Ok(self.lines.diff(&actual_lines, &LineSequence::from_text(expected)))
    }

    pub fn has_binary_content(
        &self,
        actual: &Path,
        expected: &[u8],
    ) -> Result<ByteDivergence, FDeltaError> {
        ensure_actual_file(actual)?;
        let file = std::fs::File::open(actual)
            .map_err(|e| FDeltaError::unreadable(format!("open {}", actual.display()), e))?;
        self.bytes.compare(file, expected)
    }

    /// Compare two files as text, falling back to bytes when a side cannot be decoded.
    ///
    /// If the fallback finds identical bytes the charset problem is still an
    /// error; identical bytes never stand in for a text comparison.
    pub fn same_content_as(
        &self,
        actual: &Path,
        actual_encoding: Encoding,
        expected: &Path,
        expected_encoding: Encoding,
    ) -> Result<ContentDiff, FDeltaError> {
        ensure_expected_file(expected)?;
        ensure_actual_file(actual)?;

        let decoded = read_file_lines(actual, actual_encoding).and_then(|actual_lines| {
            read_file_lines(expected, expected_encoding)
                .map(|expected_lines| (actual_lines, expected_lines))
        });

        match decoded {
            Ok((actual_lines, expected_lines)) => {
                Ok(ContentDiff::Lines(self.lines.diff(&actual_lines, &expected_lines)))
            }
            Err(FDeltaError::Encoding { encoding, reason }) => {
                warn!(
                    "Text decode failed ({}: {}), comparing {} and {} as bytes",
                    encoding,
                    reason,
                    actual.display(),
                    expected.display()
                );
                match self.bytes.compare_files(actual, expected)? {
                    ByteDivergence::Identical => Err(FDeltaError::Encoding {
                        encoding,
                        reason: format!(
                            "Unable to compare contents of files:<{}> and:<{}> \
                             with the given charsets ({})",
                            actual.display(),
                            expected.display(),
                            reason
                        ),
                    }),
                    divergence => {
                        debug!("Binary fallback found {:?}", divergence);
                        Ok(ContentDiff::Bytes(divergence))
                    }
                }
            }
            Err(other) => Err(other),
        }
    }
}

/// The file being compared against must exist before any check runs
fn ensure_expected_file(path: &Path) -> Result<(), FDeltaError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(FDeltaError::Precondition(format!(
            "Expected file:<'{}'> should be an existing file",
            path.display()
        )))
    }
}

fn ensure_actual_file(path: &Path) -> Result<(), FDeltaError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(FDeltaError::Precondition(format!(
            "Expecting path:<'{}'> to be a regular file",
            path.display()
        )))
    }
}
