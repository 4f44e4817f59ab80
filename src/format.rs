//! The catalog of subtitle formats and the parsers that read them.

use std::{fmt::Display, io::Read, sync::OnceLock};

use regex::Regex;
use thiserror::Error;

use crate::{
    encoding::{DecodeError, Encoding},
    srt::{ParseDialogueError, SrtParser},
    vtt::VttParser,
    SubtitleEntry,
};

/// Identifies a subtitle dialect.
///
/// The name is unique within a [`Registry`] and the extension includes the
/// leading dot, e.g. `.srt`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubtitleFormat {
    pub name: &'static str,
    pub extension: &'static str,
}

impl SubtitleFormat {
    pub const fn new(name: &'static str, extension: &'static str) -> Self {
        Self { name, extension }
    }
}

impl Display for SubtitleFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name)
    }
}

pub const SUBRIP: SubtitleFormat = SubtitleFormat::new("srt", ".srt");
pub const WEBVTT: SubtitleFormat = SubtitleFormat::new("vtt", ".vtt");

/// An error raised by a [`FormatParser`] when the stream doesn't match its grammar.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("could not read stream: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error("missing `{expected}` header")]
    MissingHeader { expected: &'static str },
    #[error("no dialogue found")]
    NoDialogue,
    #[error("block {block}: {source}")]
    Dialogue {
        block: usize,
        #[source]
        source: ParseDialogueError,
    },
    #[error(transparent)]
    Other(Box<dyn std::error::Error + Send + Sync>),
}

impl ParseError {
    /// Wraps an arbitrary error from a third party parser.
    pub fn other(error: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Other(error.into())
    }
}

/// A parser for one subtitle dialect.
///
/// The stream is positioned at its start when handed over. Implementations
/// must decode with the given encoding and nothing else, and must not hold on
/// to the stream past the call.
pub trait FormatParser: Send + Sync {
    fn parse_stream(
        &self,
        stream: &mut dyn Read,
        encoding: Encoding,
    ) -> Result<Vec<SubtitleEntry>, ParseError>;
}

impl<F> FormatParser for F
where
    F: Fn(&mut dyn Read, Encoding) -> Result<Vec<SubtitleEntry>, ParseError> + Send + Sync,
{
    fn parse_stream(
        &self,
        stream: &mut dyn Read,
        encoding: Encoding,
    ) -> Result<Vec<SubtitleEntry>, ParseError> {
        self(stream, encoding)
    }
}

/// A format paired with the parser that reads it.
pub struct RegistryEntry {
    format: SubtitleFormat,
    parser: Box<dyn FormatParser>,
}

impl RegistryEntry {
    pub fn format(&self) -> &SubtitleFormat {
        &self.format
    }

    pub fn parser(&self) -> &dyn FormatParser {
        self.parser.as_ref()
    }
}

impl std::fmt::Debug for RegistryEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryEntry")
            .field("format", &self.format)
            .finish_non_exhaustive()
    }
}

/// The fixed set of formats known to a dispatcher.
///
/// The first registered format is the default one. A registry always has at
/// least that entry and is never modified once handed to a dispatcher.
#[derive(Debug)]
pub struct Registry {
    entries: Vec<RegistryEntry>,
}

fn extension_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r#"\.[^./\\]+$"#).unwrap())
}

impl Registry {
    pub fn new(format: SubtitleFormat, parser: impl FormatParser + 'static) -> Self {
        Self {
            entries: vec![RegistryEntry {
                format,
                parser: Box::new(parser),
            }],
        }
    }

    /// Appends a format.
    ///
    /// # Panics
    ///
    /// If a format with the same name is already registered.
    pub fn with(mut self, format: SubtitleFormat, parser: impl FormatParser + 'static) -> Self {
        assert!(
            self.find(format.name).is_none(),
            "subtitle format `{}` registered twice",
            format.name
        );
        self.entries.push(RegistryEntry {
            format,
            parser: Box::new(parser),
        });
        self
    }

    /// SubRip followed by WebVTT.
    pub fn builtin() -> Self {
        Self::new(SUBRIP, SrtParser).with(WEBVTT, VttParser)
    }

    pub fn entries(&self) -> &[RegistryEntry] {
        &self.entries
    }

    /// The registered formats in insertion order.
    pub fn formats(&self) -> impl Iterator<Item = &SubtitleFormat> + '_ {
        self.entries.iter().map(|e| &e.format)
    }

    pub fn default_format(&self) -> &SubtitleFormat {
        &self.entries[0].format
    }

    pub fn find(&self, name: &str) -> Option<&SubtitleFormat> {
        self.formats().find(|f| f.name == name)
    }

    /// Guesses the format from the extension of `file_name`.
    ///
    /// The comparison is case sensitive. Falls back to the default format
    /// when nothing matches.
    pub fn most_likely_format(&self, file_name: &str) -> &SubtitleFormat {
        extension_regex()
            .find(file_name)
            .and_then(|ext| self.formats().find(|f| f.extension == ext.as_str()))
            .unwrap_or_else(|| self.default_format())
    }
}
