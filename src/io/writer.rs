//! Buffered writers over a whole-object upload
//!
//! The storage API can only replace an object in one call, so writers keep
//! everything in memory and upload once: on `close`, or when the writer goes
//! out of scope. Nothing is persisted before that.

use std::fmt;
use std::io;

use bytes::Bytes;

use crate::error::Result;
use crate::io::TextOptions;
use crate::path::FolderPath;

/// Text writer flushed through `FolderPath::write_text`
pub struct TextWriter {
    path: FolderPath,
    options: TextOptions,
    buffer: Vec<String>,
    // trailing bytes of a UTF-8 sequence split across byte writes
    pending: Vec<u8>,
    closed: bool,
}

impl TextWriter {
    pub(crate) fn new(path: FolderPath, options: TextOptions) -> Self {
        Self {
            path,
            options,
            buffer: Vec::new(),
            pending: Vec::new(),
            closed: false,
        }
    }

    pub fn path(&self) -> &FolderPath {
        &self.path
    }

    /// Buffer `data`, returning the number of characters accepted
    pub fn write(&mut self, data: &str) -> usize {
        self.buffer.push(data.to_string());
        data.chars().count()
    }

    /// Buffer UTF-8 bytes that may end mid-character; the incomplete tail
    /// waits for the next call.
    pub fn write_utf8(&mut self, buf: &[u8]) -> io::Result<usize> {
        let carried = self.pending.len();
        self.pending.extend_from_slice(buf);
        let valid = match std::str::from_utf8(&self.pending) {
            Ok(_) => self.pending.len(),
            Err(e) if e.error_len().is_none() => e.valid_up_to(),
            Err(e) => {
                self.pending.truncate(carried);
                return Err(io::Error::new(io::ErrorKind::InvalidData, e));
            }
        };
        let tail = self.pending.split_off(valid);
        let head = std::mem::replace(&mut self.pending, tail);
        let text = String::from_utf8(head)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        if !text.is_empty() {
            self.buffer.push(text);
        }
        Ok(buf.len())
    }

    /// Upload the buffered text
    pub fn close(mut self) -> Result<()> {
        self.flush_to_storage()
    }

    fn flush_to_storage(&mut self) -> Result<()> {
        self.closed = true;
        if !self.pending.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("{} trailing bytes of incomplete UTF-8", self.pending.len()),
            )
            .into());
        }
        let data = std::mem::take(&mut self.buffer).concat();
        self.path.write_text(&data, &self.options)
    }
}

impl fmt::Write for TextWriter {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.buffer.push(s.to_string());
        Ok(())
    }
}

impl Drop for TextWriter {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        if let Err(e) = self.flush_to_storage() {
            tracing::warn!("Failed to flush text writer for {}: {}", self.path, e);
        }
    }
}

impl fmt::Debug for TextWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextWriter")
            .field("path", &self.path.as_str())
            .field("chunks", &self.buffer.len())
            .finish()
    }
}

/// Byte writer flushed through `FolderPath::write_bytes`
pub struct BytesWriter {
    path: FolderPath,
    buffer: Vec<u8>,
    closed: bool,
}

impl BytesWriter {
    pub(crate) fn new(path: FolderPath) -> Self {
        Self {
            path,
            buffer: Vec::new(),
            closed: false,
        }
    }

    pub fn path(&self) -> &FolderPath {
        &self.path
    }

    /// Upload the buffered bytes
    pub fn close(mut self) -> Result<()> {
        self.flush_to_storage()
    }

    fn flush_to_storage(&mut self) -> Result<()> {
        self.closed = true;
        let data = Bytes::from(std::mem::take(&mut self.buffer));
        self.path.write_bytes(data)
    }
}

impl io::Write for BytesWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    // Buffered content only reaches storage on close.
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for BytesWriter {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        if let Err(e) = self.flush_to_storage() {
            tracing::warn!("Failed to flush bytes writer for {}: {}", self.path, e);
        }
    }
}

impl fmt::Debug for BytesWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BytesWriter")
            .field("path", &self.path.as_str())
            .field("len", &self.buffer.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use crate::Folder;
    use pretty_assertions::assert_eq;
    use std::fmt::Write as _;
    use std::io::Write as _;
    use std::sync::Arc;

    fn folder() -> (Folder, Arc<MemoryStorage>) {
        let storage = Arc::new(MemoryStorage::new());
        (Folder::new("test", storage.clone()), storage)
    }

    #[test]
    fn test_text_writer_concatenates_on_close() {
        let (folder, _) = folder();
        let path = &folder / "out.txt";

        let mut writer = TextWriter::new(path.clone(), TextOptions::default());
        writer.write("x");
        writer.write("y");
        writer.close().unwrap();

        assert_eq!(path.read_text(&TextOptions::default()).unwrap(), "xy");
    }

    #[test]
    fn test_nothing_persisted_before_close() {
        let (folder, storage) = folder();
        let path = &folder / "out.bin";

        let mut writer = BytesWriter::new(path.clone());
        writer.write_all(b"abc").unwrap();
        writer.flush().unwrap();

        assert!(storage.is_empty());
        writer.close().unwrap();
        assert_eq!(path.read_bytes().unwrap(), b"abc");
    }

    #[test]
    fn test_scope_exit_flushes() {
        let (folder, _) = folder();
        let path = &folder / "scoped.txt";
        {
            let mut writer = TextWriter::new(path.clone(), TextOptions::default());
            write!(writer, "{}-{}", 1, 2).unwrap();
        }
        assert_eq!(path.read_text(&TextOptions::default()).unwrap(), "1-2");
    }

    #[test]
    fn test_forgotten_writer_loses_data() {
        let (folder, storage) = folder();
        let mut writer = BytesWriter::new(&folder / "lost.bin");
        writer.write_all(b"gone").unwrap();
        std::mem::forget(writer);
        assert!(storage.is_empty());
    }

    #[test]
    fn test_text_writer_joins_split_characters() {
        let (folder, _) = folder();
        let path = &folder / "split.txt";
        let bytes = "日本".as_bytes();

        let mut writer = TextWriter::new(path.clone(), TextOptions::default());
        assert_eq!(writer.write_utf8(&bytes[..1]).unwrap(), 1);
        assert_eq!(writer.write_utf8(&bytes[1..4]).unwrap(), 3);
        assert_eq!(writer.write_utf8(&bytes[4..]).unwrap(), 2);
        writer.close().unwrap();

        assert_eq!(path.read_text(&TextOptions::default()).unwrap(), "日本");
    }

    #[test]
    fn test_text_writer_rejects_invalid_utf8() {
        let (folder, storage) = folder();
        let path = &folder / "bad.txt";

        let mut writer = TextWriter::new(path.clone(), TextOptions::default());
        writer.write_utf8(b"ok").unwrap();
        let err = writer.write_utf8(b"\xff").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        writer.write_utf8(&"日".as_bytes()[..2]).unwrap();
        assert!(writer.close().is_err());
        assert!(storage.is_empty());
    }

    #[test]
    fn test_text_writer_uses_encoding() {
        let (folder, _) = folder();
        let path = &folder / "sjis.txt";
        let options = TextOptions::new().encoding("shift_jis");

        let mut writer = TextWriter::new(path.clone(), options.clone());
        assert_eq!(writer.write("日本"), 2);
        writer.close().unwrap();

        assert_ne!(path.read_bytes().unwrap(), "日本".as_bytes());
        assert_eq!(path.read_text(&options).unwrap(), "日本");
    }
}
