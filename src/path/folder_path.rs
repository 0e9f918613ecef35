use bytes::Bytes;
use std::fmt;
use std::io::{Cursor, Read};
use std::ops::Div;

use crate::error::Result;
use crate::folder::Folder;
use crate::io::text::{decode, encode, translate_newlines};
use crate::io::{BytesWriter, OpenFile, OpenMode, TextOptions, TextWriter};
use crate::path::PurePosixPath;

/// Anything that can stand for a path argument: a string, a pure path, or
/// another `FolderPath`.
pub trait PathLike {
    fn to_pure(&self) -> PurePosixPath;

    /// Resolve into a `FolderPath`. Plain strings land in `folder`; a
    /// `FolderPath` keeps its own folder.
    fn into_folder_path(self, folder: &Folder) -> FolderPath
    where
        Self: Sized,
    {
        FolderPath::from_pure(folder.clone(), self.to_pure())
    }
}

impl PathLike for &str {
    fn to_pure(&self) -> PurePosixPath {
        PurePosixPath::new(self)
    }
}

impl PathLike for String {
    fn to_pure(&self) -> PurePosixPath {
        PurePosixPath::new(self)
    }
}

impl PathLike for &String {
    fn to_pure(&self) -> PurePosixPath {
        PurePosixPath::new(self)
    }
}

impl PathLike for PurePosixPath {
    fn to_pure(&self) -> PurePosixPath {
        self.clone()
    }
}

impl PathLike for &PurePosixPath {
    fn to_pure(&self) -> PurePosixPath {
        (*self).clone()
    }
}

impl PathLike for FolderPath {
    fn to_pure(&self) -> PurePosixPath {
        self.pure.clone()
    }

    fn into_folder_path(self, _folder: &Folder) -> FolderPath {
        self
    }
}

impl PathLike for &FolderPath {
    fn to_pure(&self) -> PurePosixPath {
        self.pure.clone()
    }

    fn into_folder_path(self, _folder: &Folder) -> FolderPath {
        self.clone()
    }
}

/// A path inside a storage folder
///
/// Path algebra is lexical and never touches storage. Content operations go
/// through the owning `Folder`, one storage call each.
#[derive(Clone)]
pub struct FolderPath {
    folder: Folder,
    path: String,
    pure: PurePosixPath,
}

impl FolderPath {
    pub fn new(folder: Folder, path: &str) -> Self {
        Self::from_pure(folder, PurePosixPath::new(path))
    }

    pub fn from_pure(folder: Folder, pure: PurePosixPath) -> Self {
        Self {
            folder,
            path: pure.to_string(),
            pure,
        }
    }

    fn rewrap(&self, pure: PurePosixPath) -> Self {
        Self::from_pure(self.folder.clone(), pure)
    }

    pub fn folder(&self) -> &Folder {
        &self.folder
    }

    /// Normalized path string
    pub fn as_str(&self) -> &str {
        &self.path
    }

    pub fn as_pure(&self) -> &PurePosixPath {
        &self.pure
    }

    // Path algebra

    pub fn name(&self) -> &str {
        self.pure.name()
    }

    pub fn suffix(&self) -> &str {
        self.pure.suffix()
    }

    pub fn suffixes(&self) -> Vec<String> {
        self.pure.suffixes()
    }

    pub fn stem(&self) -> &str {
        self.pure.stem()
    }

    pub fn parts(&self) -> Vec<String> {
        self.pure.parts()
    }

    pub fn parent(&self) -> Self {
        self.rewrap(self.pure.parent())
    }

    /// All ancestors, nearest first
    pub fn parents(&self) -> Vec<Self> {
        self.pure
            .parents()
            .into_iter()
            .map(|p| self.rewrap(p))
            .collect()
    }

    pub fn with_suffix(&self, suffix: &str) -> Result<Self> {
        Ok(self.rewrap(self.pure.with_suffix(suffix)?))
    }

    pub fn with_stem(&self, stem: &str) -> Result<Self> {
        Ok(self.rewrap(self.pure.with_stem(stem)?))
    }

    pub fn with_name(&self, name: &str) -> Result<Self> {
        Ok(self.rewrap(self.pure.with_name(name)?))
    }

    pub fn is_absolute(&self) -> bool {
        self.pure.is_absolute()
    }

    pub fn is_relative_to(&self, other: impl PathLike) -> bool {
        self.pure.is_relative_to(&other.to_pure())
    }

    pub fn relative_to(&self, other: impl PathLike) -> Result<Self> {
        Ok(self.rewrap(self.pure.relative_to(&other.to_pure())?))
    }

    pub fn joinpath<I, P>(&self, others: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: PathLike,
    {
        let joined = others
            .into_iter()
            .fold(self.pure.clone(), |acc, other| acc.join(&other.to_pure()));
        self.rewrap(joined)
    }

    /// Shell-style match of the trailing components against `pattern`
    pub fn matches(&self, pattern: &str) -> Result<bool> {
        Ok(self.pure.matches(pattern)?)
    }

    // Content

    pub fn read_bytes(&self) -> Result<Vec<u8>> {
        let mut stream = self.folder.get_download_stream(&self.path)?;
        let mut buf = Vec::new();
        stream.read_to_end(&mut buf)?;
        Ok(buf)
    }

    pub fn write_bytes(&self, data: impl Into<Bytes>) -> Result<()> {
        self.folder.upload_data(&self.path, data.into())
    }

    pub fn read_text(&self, options: &TextOptions) -> Result<String> {
        let encoding = options.resolve_encoding()?;
        let data = self.read_bytes()?;
        decode(&data, encoding, options.errors)
    }

    /// Encode and upload `data`. A set `newline` replaces every `\n` first.
    pub fn write_text(&self, data: &str, options: &TextOptions) -> Result<()> {
        let encoding = options.resolve_encoding()?;
        let data = translate_newlines(data, options.newline.as_deref())?;
        let encoded = encode(&data, encoding, options.errors)?;
        self.write_bytes(encoded)
    }

    /// Best effort; backend failures read as `false`
    pub fn exists(&self) -> bool {
        self.folder.exists(&self.path)
    }

    pub fn is_dir(&self) -> Result<bool> {
        Ok(self.folder.get_path_details(&self.path)?.directory)
    }

    /// Negation of `is_dir`: a missing path reports as a file, and metadata
    /// failures propagate.
    pub fn is_file(&self) -> Result<bool> {
        Ok(!self.is_dir()?)
    }

    pub fn unlink(&self) -> Result<()> {
        self.folder.delete_path(&self.path)
    }

    /// Copy the content to `target`, then delete this path. Not atomic.
    pub fn replace(&self, target: impl PathLike) -> Result<FolderPath> {
        let target = self.copy(target)?;
        self.unlink()?;
        Ok(target)
    }

    /// Copy the content to `target`. Strings resolve in this folder.
    pub fn copy(&self, target: impl PathLike) -> Result<FolderPath> {
        let target = target.into_folder_path(&self.folder);
        target.write_bytes(self.read_bytes()?)?;
        Ok(target)
    }

    pub fn open(&self, mode: OpenMode, options: TextOptions) -> Result<OpenFile> {
        Ok(match mode {
            OpenMode::ReadText => OpenFile::ReadText(self.open_read_text(&options)?),
            OpenMode::ReadBytes => OpenFile::ReadBytes(self.open_read_bytes()?),
            OpenMode::WriteText => OpenFile::WriteText(self.open_write_text(options)),
            OpenMode::WriteBytes => OpenFile::WriteBytes(self.open_write_bytes()),
        })
    }

    pub fn open_read_text(&self, options: &TextOptions) -> Result<Cursor<String>> {
        Ok(Cursor::new(self.read_text(options)?))
    }

    pub fn open_read_bytes(&self) -> Result<Cursor<Vec<u8>>> {
        Ok(Cursor::new(self.read_bytes()?))
    }

    pub fn open_write_text(&self, options: TextOptions) -> TextWriter {
        TextWriter::new(self.clone(), options)
    }

    pub fn open_write_bytes(&self) -> BytesWriter {
        BytesWriter::new(self.clone())
    }
}

impl<P: PathLike> Div<P> for &FolderPath {
    type Output = FolderPath;

    fn div(self, rhs: P) -> FolderPath {
        self.rewrap(self.pure.join(&rhs.to_pure()))
    }
}

impl<P: PathLike> Div<P> for FolderPath {
    type Output = FolderPath;

    fn div(self, rhs: P) -> FolderPath {
        &self / rhs
    }
}

impl fmt::Display for FolderPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

impl fmt::Debug for FolderPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FolderPath('{}')", self.path)
    }
}
