use std::fmt;
use std::io::{self, Cursor, Read, Write};
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::io::{BytesWriter, TextWriter};

/// Supported `open` modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OpenMode {
    #[default]
    ReadText,
    ReadBytes,
    WriteText,
    WriteBytes,
}

impl OpenMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            OpenMode::ReadText => "r",
            OpenMode::ReadBytes => "rb",
            OpenMode::WriteText => "w",
            OpenMode::WriteBytes => "wb",
        }
    }

    pub fn is_write(&self) -> bool {
        matches!(self, OpenMode::WriteText | OpenMode::WriteBytes)
    }
}

impl FromStr for OpenMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "r" | "rt" => Ok(OpenMode::ReadText),
            "rb" => Ok(OpenMode::ReadBytes),
            "w" | "wt" => Ok(OpenMode::WriteText),
            "wb" => Ok(OpenMode::WriteBytes),
            other => Err(Error::UnsupportedMode(other.to_string())),
        }
    }
}

impl fmt::Display for OpenMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A file handle returned by `open`
///
/// Read modes hold the full content in memory. Write modes buffer until
/// `close` or drop.
#[derive(Debug)]
pub enum OpenFile {
    ReadText(Cursor<String>),
    ReadBytes(Cursor<Vec<u8>>),
    WriteText(TextWriter),
    WriteBytes(BytesWriter),
}

impl OpenFile {
    pub fn mode(&self) -> OpenMode {
        match self {
            OpenFile::ReadText(_) => OpenMode::ReadText,
            OpenFile::ReadBytes(_) => OpenMode::ReadBytes,
            OpenFile::WriteText(_) => OpenMode::WriteText,
            OpenFile::WriteBytes(_) => OpenMode::WriteBytes,
        }
    }

    /// Remaining text of a text-mode reader
    pub fn read_text(&mut self) -> Result<String> {
        match self {
            OpenFile::ReadText(cursor) => {
                let mut out = String::new();
                cursor.read_to_string(&mut out)?;
                Ok(out)
            }
            _ => Err(unsupported("not readable as text").into()),
        }
    }

    /// Flush a write-mode handle; read handles just close
    pub fn close(self) -> Result<()> {
        match self {
            OpenFile::WriteText(writer) => writer.close(),
            OpenFile::WriteBytes(writer) => writer.close(),
            OpenFile::ReadText(_) | OpenFile::ReadBytes(_) => Ok(()),
        }
    }
}

fn unsupported(msg: &str) -> io::Error {
    io::Error::new(io::ErrorKind::Unsupported, msg)
}

impl Read for OpenFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            OpenFile::ReadText(cursor) => cursor.read(buf),
            OpenFile::ReadBytes(cursor) => cursor.read(buf),
            _ => Err(unsupported("not readable")),
        }
    }
}

/// Writes are buffered: content only reaches storage on `close` or drop, and
/// `flush` uploads nothing.
impl Write for OpenFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            OpenFile::WriteBytes(writer) => writer.write(buf),
            OpenFile::WriteText(writer) => writer.write_utf8(buf),
            _ => Err(unsupported("not writable")),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            OpenFile::WriteBytes(writer) => writer.flush(),
            OpenFile::WriteText(_) => Ok(()),
            _ => Err(unsupported("not writable")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::TextOptions;
    use crate::storage::MemoryStorage;
    use crate::Folder;
    use std::sync::Arc;

    #[test]
    fn test_parse_modes() {
        assert_eq!("r".parse::<OpenMode>().unwrap(), OpenMode::ReadText);
        assert_eq!("rt".parse::<OpenMode>().unwrap(), OpenMode::ReadText);
        assert_eq!("rb".parse::<OpenMode>().unwrap(), OpenMode::ReadBytes);
        assert_eq!("w".parse::<OpenMode>().unwrap(), OpenMode::WriteText);
        assert_eq!("wt".parse::<OpenMode>().unwrap(), OpenMode::WriteText);
        assert_eq!("wb".parse::<OpenMode>().unwrap(), OpenMode::WriteBytes);
    }

    #[test]
    fn test_unsupported_mode_is_named() {
        let err = "a+".parse::<OpenMode>().unwrap_err();
        assert_eq!(err.to_string(), "Unsupported mode: a+");
    }

    #[test]
    fn test_text_mode_accepts_split_characters() {
        let storage = Arc::new(MemoryStorage::new());
        let folder = Folder::new("test", storage.clone());
        let path = folder.path("split.txt");
        let bytes = "日".as_bytes();

        let mut file = path.open(OpenMode::WriteText, TextOptions::default()).unwrap();
        file.write_all(&bytes[..1]).unwrap();
        file.write_all(&bytes[1..]).unwrap();
        file.flush().unwrap();
        assert!(storage.is_empty());
        file.close().unwrap();

        assert_eq!(path.read_text(&TextOptions::default()).unwrap(), "日");
    }

    #[test]
    fn test_wrong_direction() {
        let mut file = OpenFile::ReadBytes(Cursor::new(b"abc".to_vec()));
        let err = file.write(b"x").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::Unsupported);

        let mut buf = Vec::new();
        file.read_to_end(&mut buf).unwrap();
        assert_eq!(buf, b"abc");
        assert!(file.read_text().is_err());
    }
}
