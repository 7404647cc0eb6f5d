use crate::byte_compare::ByteCompareEngine;
use crate::line_diff::{LineDiffConfig, LineDiffEngine};
use crate::text_source::{read_lines, Encoding};
use fdelta_common::{ByteDivergence, CompareConfig, EditScript, FDeltaError};
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::str::FromStr;

/// How two sources are compared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComparisonMode {
    Text,
    Binary,
}

impl ComparisonMode {
    /// Guess the mode from a content prefix: NUL bytes or invalid UTF-8 mean binary.
    ///
    /// A multi-byte sequence cut off at the end of the prefix still counts as text.
    pub fn sniff(prefix: &[u8]) -> Self {
        if prefix.contains(&0) {
            return ComparisonMode::Binary;
        }
        match std::str::from_utf8(prefix) {
            Ok(_) => ComparisonMode::Text,
            Err(e) if e.error_len().is_none() => ComparisonMode::Text,
            Err(_) => ComparisonMode::Binary,
        }
    }
}

/// Result of a comparison in either mode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "result", rename_all = "lowercase")]
pub enum ContentDiff {
    Lines(EditScript),
    Bytes(ByteDivergence),
}

impl ContentDiff {
    pub fn is_equivalent(&self) -> bool {
        match self {
            ContentDiff::Lines(script) => script.is_equivalent(),
            ContentDiff::Bytes(divergence) => divergence.is_identical(),
        }
    }
}

/// A comparison mode behind a common interface
pub trait ContentComparator {
    fn mode(&self) -> ComparisonMode;

    fn compare_readers(
        &self,
        original: &mut dyn Read,
        revised: &mut dyn Read,
    ) -> Result<ContentDiff, FDeltaError>;
}

/// Line comparison of two decoded text sources
#[derive(Debug, Clone, Default)]
pub struct TextComparator {
    pub engine: LineDiffEngine,
    pub original_encoding: Encoding,
    pub revised_encoding: Encoding,
}

impl TextComparator {
    pub fn new(engine: LineDiffEngine, encoding: Encoding) -> Self {
        Self {
            engine,
            original_encoding: encoding,
            revised_encoding: encoding,
        }
    }

    pub fn with_encodings(mut self, original: Encoding, revised: Encoding) -> Self {
        self.original_encoding = original;
        self.revised_encoding = revised;
        self
    }
}

impl ContentComparator for TextComparator {
    fn mode(&self) -> ComparisonMode {
        ComparisonMode::Text
    }

    fn compare_readers(
        &self,
        original: &mut dyn Read,
        revised: &mut dyn Read,
    ) -> Result<ContentDiff, FDeltaError> {
        // Both sides are materialized before diffing begins.
        let original = read_lines(original, self.original_encoding)?;
        let revised = read_lines(revised, self.revised_encoding)?;
        Ok(ContentDiff::Lines(self.engine.diff(&original, &revised)))
    }
}

impl ContentComparator for ByteCompareEngine {
    fn mode(&self) -> ComparisonMode {
        ComparisonMode::Binary
    }

    fn compare_readers(
        &self,
        original: &mut dyn Read,
        revised: &mut dyn Read,
    ) -> Result<ContentDiff, FDeltaError> {
        self.compare(original, revised).map(ContentDiff::Bytes)
    }
}

/// Everything needed to build a comparator for either mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparatorSettings {
    pub line_diff: LineDiffConfig,
    pub chunk_size: usize,
    pub original_encoding: Encoding,
    pub revised_encoding: Encoding,
}

impl Default for ComparatorSettings {
    fn default() -> Self {
        Self {
            line_diff: LineDiffConfig::default(),
            chunk_size: fdelta_common::DEFAULT_CHUNK_SIZE,
            original_encoding: Encoding::Utf8,
            revised_encoding: Encoding::Utf8,
        }
    }
}

impl ComparatorSettings {
    pub fn from_config(config: &CompareConfig) -> Result<Self, FDeltaError> {
        config.validate()?;
        let encoding = Encoding::from_str(&config.default_encoding)?;
        Ok(Self {
            line_diff: LineDiffConfig::from(config),
            chunk_size: config.chunk_size,
            original_encoding: encoding,
            revised_encoding: encoding,
        })
    }
}

pub fn comparator_for(
    mode: ComparisonMode,
    settings: &ComparatorSettings,
) -> Result<Box<dyn ContentComparator>, FDeltaError> {
    Ok(match mode {
        ComparisonMode::Text => Box::new(TextComparator {
            engine: LineDiffEngine::with_config(settings.line_diff),
            original_encoding: settings.original_encoding,
            revised_encoding: settings.revised_encoding,
        }),
        ComparisonMode::Binary => Box::new(ByteCompareEngine::new(settings.chunk_size)?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use fdelta_common::{ByteValue, EditKind};

    #[test]
    fn test_sniff() {
        assert_eq!(ComparisonMode::sniff(b"plain text\n"), ComparisonMode::Text);
        assert_eq!(ComparisonMode::sniff(b""), ComparisonMode::Text);
        assert_eq!(ComparisonMode::sniff(b"a\0b"), ComparisonMode::Binary);
        assert_eq!(ComparisonMode::sniff(&[0xFE, 0x41]), ComparisonMode::Binary);
        // "é" with its second byte cut off by the prefix window
        assert_eq!(ComparisonMode::sniff(&[b'a', 0xC3]), ComparisonMode::Text);
    }

    #[test]
    fn test_text_comparator() {
        let comparator =
            comparator_for(ComparisonMode::Text, &ComparatorSettings::default()).unwrap();
        assert_eq!(comparator.mode(), ComparisonMode::Text);

        let result = comparator
            .compare_readers(&mut "a\nb\nc\n".as_bytes(), &mut "a\nx\nc\n".as_bytes())
            .unwrap();
        match result {
            ContentDiff::Lines(script) => {
                assert_eq!(script.len(), 1);
                assert_eq!(script.operations()[0].kind(), EditKind::Change);
            }
            other => panic!("expected line diff, got {other:?}"),
        }
    }

    #[test]
    fn test_text_comparator_mixed_encodings() {
        let comparator = TextComparator::default().with_encodings(Encoding::Latin1, Encoding::Utf8);
        let result = comparator
            .compare_readers(&mut &b"caf\xE9"[..], &mut "café".as_bytes())
            .unwrap();
        assert!(result.is_equivalent());
    }

    #[test]
    fn test_text_comparator_surfaces_decode_failure() {
        let comparator = TextComparator::default();
        let err = comparator
            .compare_readers(&mut &b"\xFE"[..], &mut &b"\xFE"[..])
            .unwrap_err();
        assert!(matches!(err, FDeltaError::Encoding { .. }));
    }

    #[test]
    fn test_binary_comparator() {
        let comparator =
            comparator_for(ComparisonMode::Binary, &ComparatorSettings::default()).unwrap();
        assert_eq!(comparator.mode(), ComparisonMode::Binary);

        let result = comparator
            .compare_readers(&mut &b"\x00"[..], &mut &b""[..])
            .unwrap();
        assert_eq!(
            result,
            ContentDiff::Bytes(ByteDivergence::DiffersAt {
                offset: 0,
                original: ByteValue::Byte(0),
                revised: ByteValue::Eof,
            })
        );
    }

    #[test]
    fn test_settings_from_config() {
        let mut config = CompareConfig::default();
        config.default_encoding = "latin1".to_string();
        config.chunk_size = 32;
        let settings = ComparatorSettings::from_config(&config).unwrap();
        assert_eq!(settings.original_encoding, Encoding::Latin1);
        assert_eq!(settings.chunk_size, 32);

        config.default_encoding = "klingon".to_string();
        assert!(ComparatorSettings::from_config(&config).is_err());
    }

    #[test]
    fn test_zero_chunk_size_rejected_by_factory() {
        let settings = ComparatorSettings {
            chunk_size: 0,
            ..Default::default()
        };
        assert!(matches!(
            comparator_for(ComparisonMode::Binary, &settings),
            Err(FDeltaError::Precondition(_))
        ));
    }
}
