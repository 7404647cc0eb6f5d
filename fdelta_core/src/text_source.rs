use fdelta_common::{FDeltaError, LineSequence};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

/// Character encoding supplied by the caller. Decoding is strict; nothing is guessed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Encoding {
    #[default]
    Utf8,
    Utf16Le,
    Utf16Be,
    Latin1,
    Ascii,
}

impl Encoding {
    pub fn label(&self) -> &'static str {
        match self {
            Encoding::Utf8 => "UTF-8",
            Encoding::Utf16Le => "UTF-16LE",
            Encoding::Utf16Be => "UTF-16BE",
            Encoding::Latin1 => "ISO-8859-1",
            Encoding::Ascii => "US-ASCII",
        }
    }

    /// Decode `bytes`, failing on the first malformed sequence
    pub fn decode(&self, bytes: &[u8]) -> Result<String, FDeltaError> {
        match self {
            Encoding::Utf8 => std::str::from_utf8(bytes)
                .map(str::to_owned)
                .map_err(|e| {
                    self.error(format!("invalid byte sequence at offset {}", e.valid_up_to()))
                }),
            Encoding::Utf16Le | Encoding::Utf16Be => {
                if bytes.len() % 2 != 0 {
                    return Err(self.error(format!("odd byte length {}", bytes.len())));
                }
                let little_endian = *self == Encoding::Utf16Le;
                let units = bytes.chunks_exact(2).map(|pair| {
                    if little_endian {
                        u16::from_le_bytes([pair[0], pair[1]])
                    } else {
                        u16::from_be_bytes([pair[0], pair[1]])
                    }
                });
                char::decode_utf16(units)
                    .collect::<Result<String, _>>()
                    .map_err(|e| {
                        self.error(format!("unpaired surrogate {:#06x}", e.unpaired_surrogate()))
                    })
            }
            Encoding::Latin1 => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
            Encoding::Ascii => match bytes.iter().position(|b| !b.is_ascii()) {
                Some(pos) => Err(self.error(format!(
                    "non-ASCII byte {:#x} at offset {}",
                    bytes[pos], pos
                ))),
                None => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
            },
        }
    }

    fn error(&self, reason: String) -> FDeltaError {
        FDeltaError::Encoding {
            encoding: self.label().to_string(),
            reason,
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Encoding {
    type Err = FDeltaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "utf-8" | "utf8" => Ok(Encoding::Utf8),
            "utf-16le" | "utf16le" => Ok(Encoding::Utf16Le),
            "utf-16be" | "utf16be" => Ok(Encoding::Utf16Be),
            "latin1" | "latin-1" | "iso-8859-1" | "iso8859-1" => Ok(Encoding::Latin1),
            "ascii" | "us-ascii" => Ok(Encoding::Ascii),
            other => Err(FDeltaError::Encoding {
                encoding: other.to_string(),
                reason: "unsupported charset".to_string(),
            }),
        }
    }
}

/// Read a source to completion and split it into lines
pub fn read_lines<R: Read>(mut reader: R, encoding: Encoding) -> Result<LineSequence, FDeltaError> {
    let mut bytes = Vec::new();
    reader
        .read_to_end(&mut bytes)
        .map_err(|e| FDeltaError::unreadable("read text source", e))?;
    let text = encoding.decode(&bytes)?;
    let lines = LineSequence::from_text(&text);
    debug!("Decoded {} bytes as {} into {} lines", bytes.len(), encoding, lines.len());
    Ok(lines)
}

pub fn read_file_lines(path: &Path, encoding: Encoding) -> Result<LineSequence, FDeltaError> {
    let file = File::open(path)
        .map_err(|e| FDeltaError::unreadable(format!("open {}", path.display()), e))?;
    read_lines(file, encoding).map_err(|err| match err {
        FDeltaError::InputUnreadable { source, .. } => {
            FDeltaError::unreadable(format!("read {}", path.display()), source)
        }
        other => other,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    struct FailingReader;

    impl Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "disk on fire"))
        }
    }

    #[test]
    fn test_parse_labels() {
        assert_eq!("UTF-8".parse::<Encoding>().unwrap(), Encoding::Utf8);
        assert_eq!("utf16le".parse::<Encoding>().unwrap(), Encoding::Utf16Le);
        assert_eq!("ISO-8859-1".parse::<Encoding>().unwrap(), Encoding::Latin1);
        assert_eq!(" us-ascii ".parse::<Encoding>().unwrap(), Encoding::Ascii);
        assert!("ebcdic".parse::<Encoding>().is_err());
    }

    #[test]
    fn test_utf8_rejects_invalid_bytes() {
        let err = Encoding::Utf8.decode(&[0x00, 0xFE]).unwrap_err();
        match err {
            FDeltaError::Encoding { encoding, reason } => {
                assert_eq!(encoding, "UTF-8");
                assert!(reason.contains("offset 1"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_utf16_both_byte_orders() {
        assert_eq!(Encoding::Utf16Le.decode(&[b'h', 0, b'i', 0]).unwrap(), "hi");
        assert_eq!(Encoding::Utf16Be.decode(&[0, b'h', 0, b'i']).unwrap(), "hi");
        assert!(Encoding::Utf16Le.decode(&[b'h']).is_err());
        // lone high surrogate
        assert!(Encoding::Utf16Be.decode(&[0xD8, 0x00]).is_err());
    }

    #[test]
    fn test_latin1_and_ascii() {
        assert_eq!(Encoding::Latin1.decode(&[0x63, 0x61, 0x66, 0xE9]).unwrap(), "café");
        assert!(Encoding::Ascii.decode(&[0x63, 0xE9]).is_err());
        assert_eq!(Encoding::Ascii.decode(b"plain").unwrap(), "plain");
    }

    #[test]
    fn test_read_lines_from_reader() {
        let lines = read_lines("line1\r\nline2".as_bytes(), Encoding::Utf8).unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines.get(1).unwrap().content(), "line2");
    }

    #[test]
    fn test_read_failure_is_input_unreadable() {
        let err = read_lines(FailingReader, Encoding::Utf8).unwrap_err();
        assert!(matches!(err, FDeltaError::InputUnreadable { .. }));
    }

    #[test]
    fn test_missing_file_is_input_unreadable() {
        let err =
            read_file_lines(Path::new("/definitely/not/here.txt"), Encoding::Utf8).unwrap_err();
        assert!(matches!(err, FDeltaError::InputUnreadable { .. }));
        assert!(err.to_string().contains("not/here.txt"));
    }
}
