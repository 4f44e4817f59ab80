//! Making arbitrary input re-readable.
//!
//! Every parser attempt needs the stream from the very first byte, so
//! non-seekable input is drained into memory once and replayed from there.

use std::io::{self, Cursor, Read, Seek, SeekFrom};

use crate::Encoding;

/// A readable stream that can also seek.
pub trait ReadSeek: Read + Seek {}

impl<T: Read + Seek> ReadSeek for T {}

/// A borrowed input stream.
///
/// The caller keeps ownership of the underlying stream. It is never closed.
pub enum Input<'a> {
    /// A stream that can be rewound in place, e.g. a [`std::fs::File`].
    Seekable(&'a mut dyn ReadSeek),
    /// A stream that can only be read forward, e.g. stdin or a socket.
    Sequential(&'a mut dyn Read),
}

impl<'a> Input<'a> {
    pub fn seekable(stream: &'a mut dyn ReadSeek) -> Self {
        Self::Seekable(stream)
    }

    pub fn sequential(stream: &'a mut dyn Read) -> Self {
        Self::Sequential(stream)
    }

    pub fn is_seekable(&self) -> bool {
        matches!(self, Input::Seekable(_))
    }
}

impl std::fmt::Debug for Input<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Input::Seekable(_) => f.write_str("Input::Seekable(..)"),
            Input::Sequential(_) => f.write_str("Input::Sequential(..)"),
        }
    }
}

/// A stream that can always be rewound.
///
/// Either the caller's own seekable stream, or an in-memory copy of a stream
/// that could not seek. The copy is freed when this is dropped.
pub enum Rewindable<'a> {
    Passthrough(&'a mut dyn ReadSeek),
    Buffered(Cursor<Vec<u8>>),
}

impl Rewindable<'_> {
    pub fn is_buffered(&self) -> bool {
        matches!(self, Rewindable::Buffered(_))
    }
}

impl Read for Rewindable<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Rewindable::Passthrough(stream) => stream.read(buf),
            Rewindable::Buffered(cursor) => cursor.read(buf),
        }
    }
}

impl Seek for Rewindable<'_> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        match self {
            Rewindable::Passthrough(stream) => stream.seek(pos),
            Rewindable::Buffered(cursor) => cursor.seek(pos),
        }
    }
}

/// Returns a stream that supports seeking.
///
/// Seekable input is handed back untouched. Anything else is read to the end
/// and replaced with an in-memory copy positioned at its start; the original
/// stream must not be used for this content afterwards.
pub fn ensure_seekable(input: Input<'_>) -> io::Result<Rewindable<'_>> {
    match input {
        Input::Seekable(stream) => Ok(Rewindable::Passthrough(stream)),
        Input::Sequential(stream) => {
            let mut buffer = Vec::new();
            stream.read_to_end(&mut buffer)?;
            Ok(Rewindable::Buffered(Cursor::new(buffer)))
        }
    }
}

/// Returns up to `max_chars` characters from the start of `stream`.
///
/// Bytes that don't decode are replaced rather than reported, since this is
/// only ever used to describe a stream that already failed to parse.
pub fn preview<S: Read + Seek + ?Sized>(
    stream: &mut S,
    encoding: Encoding,
    max_chars: usize,
) -> io::Result<String> {
    stream.rewind()?;
    // No supported encoding needs more than 4 bytes per character
    let limit = max_chars.saturating_mul(4) as u64;
    let mut buffer = Vec::new();
    stream.take(limit).read_to_end(&mut buffer)?;
    Ok(encoding.decode_lossy(&buffer).chars().take(max_chars).collect())
}
