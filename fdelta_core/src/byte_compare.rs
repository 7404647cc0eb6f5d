use fdelta_common::{ByteDivergence, ByteValue, FDeltaError, DEFAULT_CHUNK_SIZE};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use tracing::debug;

/// Streaming byte comparison engine.
///
/// Both sources are read in lock-step, `chunk_size` bytes at a time, and
/// reading stops at the first chunk that holds a divergence.
#[derive(Debug, Clone)]
pub struct ByteCompareEngine {
    chunk_size: usize,
}

impl ByteCompareEngine {
    pub fn new(chunk_size: usize) -> Result<Self, FDeltaError> {
        if chunk_size == 0 {
            return Err(FDeltaError::Precondition(
                "chunk size must be greater than zero".to_string(),
            ));
        }
        Ok(Self { chunk_size })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Locate the first differing byte between two sources.
    ///
    /// When one source ends first, the offset is the length of the shorter
    /// one and its side is reported as `Eof`.
    pub fn compare<R: Read, S: Read>(
        &self,
        mut original: R,
        mut revised: S,
    ) -> Result<ByteDivergence, FDeltaError> {
        let mut left_buf = vec![0u8; self.chunk_size];
        let mut right_buf = vec![0u8; self.chunk_size];
        let mut offset = 0u64;

        loop {
            let left_read = fill(&mut original, &mut left_buf)
                .map_err(|e| FDeltaError::unreadable("read original bytes", e))?;
            let right_read = fill(&mut revised, &mut right_buf)
                .map_err(|e| FDeltaError::unreadable("read revised bytes", e))?;

            let common = left_read.min(right_read);
            let left = &left_buf[..left_read];
            let right = &right_buf[..right_read];

            if let Some(idx) = left[..common]
                .iter()
                .zip(&right[..common])
                .position(|(l, r)| l != r)
            {
                let divergence = ByteDivergence::DiffersAt {
                    offset: offset + idx as u64,
                    original: ByteValue::Byte(left[idx]),
                    revised: ByteValue::Byte(right[idx]),
                };
                debug!("Byte mismatch: {:?}", divergence);
                return Ok(divergence);
            }

            if left_read != right_read {
                // A short fill means that side reached EOF.
                let divergence = ByteDivergence::DiffersAt {
                    offset: offset + common as u64,
                    original: value_at(left, common),
                    revised: value_at(right, common),
                };
                debug!("Length mismatch: {:?}", divergence);
                return Ok(divergence);
            }

            if left_read == 0 {
                debug!("Byte sources identical ({} bytes)", offset);
                return Ok(ByteDivergence::Identical);
            }

            offset += left_read as u64;
        }
    }

    pub fn compare_bytes(
        &self,
        original: &[u8],
        revised: &[u8],
    ) -> Result<ByteDivergence, FDeltaError> {
        self.compare(original, revised)
    }

    pub fn compare_files(
        &self,
        original: &Path,
        revised: &Path,
    ) -> Result<ByteDivergence, FDeltaError> {
        let original_file = File::open(original)
            .map_err(|e| FDeltaError::unreadable(format!("open {}", original.display()), e))?;
        let revised_file = File::open(revised)
            .map_err(|e| FDeltaError::unreadable(format!("open {}", revised.display()), e))?;
        self.compare(original_file, revised_file)
    }
}

impl Default for ByteCompareEngine {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

fn value_at(data: &[u8], idx: usize) -> ByteValue {
    data.get(idx).copied().map_or(ByteValue::Eof, ByteValue::Byte)
}

/// Read until `buf` is full or the source is exhausted
fn fill<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    /// Serves `data` one byte per read call and counts bytes handed out
    struct TricklingReader<'a> {
        data: &'a [u8],
        pos: usize,
    }

    impl Read for TricklingReader<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.pos >= self.data.len() || buf.is_empty() {
                return Ok(0);
            }
            buf[0] = self.data[self.pos];
            self.pos += 1;
            Ok(1)
        }
    }

    struct FailingReader;

    impl Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "device error"))
        }
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        assert!(matches!(
            ByteCompareEngine::new(0),
            Err(FDeltaError::Precondition(_))
        ));
    }

    #[test]
    fn test_identical_sources() {
        let engine = ByteCompareEngine::default();
        let data = b"Hello World";
        assert_eq!(engine.compare_bytes(data, data).unwrap(), ByteDivergence::Identical);
        assert_eq!(engine.compare_bytes(b"", b"").unwrap(), ByteDivergence::Identical);
    }

    #[test]
    fn test_first_mismatch_reported() {
        let engine = ByteCompareEngine::default();
        let result = engine.compare_bytes(b"Hello World", b"Hello Rust!").unwrap();
        assert_eq!(
            result,
            ByteDivergence::DiffersAt {
                offset: 6,
                original: ByteValue::Byte(b'W'),
                revised: ByteValue::Byte(b'R'),
            }
        );
    }

    #[test]
    fn test_single_byte_against_empty() {
        let engine = ByteCompareEngine::default();
        assert_eq!(
            engine.compare_bytes(&[0x00], &[]).unwrap(),
            ByteDivergence::DiffersAt {
                offset: 0,
                original: ByteValue::Byte(0x00),
                revised: ByteValue::Eof,
            }
        );
    }

    #[test]
    fn test_shorter_side_reports_eof() {
        let engine = ByteCompareEngine::default();
        assert_eq!(
            engine.compare_bytes(b"abc", b"ab").unwrap(),
            ByteDivergence::DiffersAt {
                offset: 2,
                original: ByteValue::Byte(b'c'),
                revised: ByteValue::Eof,
            }
        );
        assert_eq!(
            engine.compare_bytes(b"ab", b"abc").unwrap(),
            ByteDivergence::DiffersAt {
                offset: 2,
                original: ByteValue::Eof,
                revised: ByteValue::Byte(b'c'),
            }
        );
    }

    #[test]
    fn test_divergence_across_chunk_boundaries() {
        let engine = ByteCompareEngine::new(4).unwrap();
        let original: Vec<u8> = (0..=99).collect();
        let mut revised = original.clone();
        revised[57] = 0xFF;

        assert_eq!(
            engine.compare_bytes(&original, &revised).unwrap(),
            ByteDivergence::DiffersAt {
                offset: 57,
                original: ByteValue::Byte(57),
                revised: ByteValue::Byte(0xFF),
            }
        );

        // length mismatch on an exact chunk boundary
        assert_eq!(
            engine.compare_bytes(&original[..8], &original[..12]).unwrap(),
            ByteDivergence::DiffersAt {
                offset: 8,
                original: ByteValue::Eof,
                revised: ByteValue::Byte(8),
            }
        );
    }

    #[test]
    fn test_short_reads_do_not_fake_eof() {
        let engine = ByteCompareEngine::new(16).unwrap();
        let data = b"partial reads are fine";
        let trickle = TricklingReader { data, pos: 0 };
        assert_eq!(engine.compare(trickle, &data[..]).unwrap(), ByteDivergence::Identical);
    }

    #[test]
    fn test_stops_reading_after_divergence() {
        let engine = ByteCompareEngine::new(4).unwrap();
        let original = vec![1u8; 1024];
        let mut revised = original.clone();
        revised[2] = 9;

        let mut reader = TricklingReader { data: &original, pos: 0 };
        let result = engine.compare(&mut reader, &revised[..]).unwrap();
        assert_eq!(result.offset(), Some(2));
        assert!(reader.pos <= 4, "read {} bytes", reader.pos);
    }

    #[test]
    fn test_read_failure_is_error_not_identical() {
        let engine = ByteCompareEngine::default();
        let err = engine.compare(FailingReader, &b""[..]).unwrap_err();
        assert!(matches!(err, FDeltaError::InputUnreadable { .. }));

        let err = engine.compare(&b"abc"[..], FailingReader).unwrap_err();
        assert!(matches!(err, FDeltaError::InputUnreadable { .. }));
    }

    #[test]
    fn test_compare_files() {
        let mut left = NamedTempFile::new().unwrap();
        let mut right = NamedTempFile::new().unwrap();
        left.write_all(b"Hello World").unwrap();
        right.write_all(b"Hello World").unwrap();

        let engine = ByteCompareEngine::default();
        assert!(engine.compare_files(left.path(), right.path()).unwrap().is_identical());
        assert!(engine.compare_files(left.path(), left.path()).unwrap().is_identical());
    }

    #[test]
    fn test_compare_missing_file() {
        let left = NamedTempFile::new().unwrap();
        let engine = ByteCompareEngine::default();
        let err = engine
            .compare_files(left.path(), Path::new("/no/such/file.bin"))
            .unwrap_err();
        assert!(matches!(err, FDeltaError::InputUnreadable { .. }));
    }
}
