//! Picking the parser that can read a stream.
//!
//! A [`Dispatcher`] owns a [`Registry`] and, for every call to
//! [`Dispatcher::parse`], orders the registered formats so the hinted one
//! comes first. Each candidate then gets the stream from its first byte until
//! one of them accepts it. What happens when a candidate rejects the stream is
//! decided by the [`FailurePolicy`].

use std::io::{self, Read, Seek};

use thiserror::Error;

use crate::{
    format::{ParseError, Registry, RegistryEntry, SubtitleFormat},
    stream::{ensure_seekable, preview, Input},
    Encoding, SubtitleEntry,
};

/// The number of characters of the stream shown when parsing fails.
pub const DEFAULT_PREVIEW_CHARS: usize = 500;

/// What to do when a candidate parser rejects the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Move on to the next candidate. Only once every candidate has failed
    /// is [`DispatchError::AllParsersFailed`] raised.
    #[default]
    Fallback,
    /// Stop at the first rejection with [`DispatchError::CandidateParseFailed`].
    AbortOnFirstFailure,
}

/// Per call options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseOptions {
    pub encoding: Encoding,
    /// The format to try first. The registry's default format when `None`.
    pub hint: Option<SubtitleFormat>,
    /// Overrides the dispatcher's [`FailurePolicy`] for this call.
    pub policy: Option<FailurePolicy>,
}

impl ParseOptions {
    pub fn new(encoding: Encoding, hint: Option<SubtitleFormat>) -> Self {
        Self {
            encoding,
            hint,
            policy: None,
        }
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = Some(policy);
        self
    }
}

/// A rejection from one candidate.
#[derive(Debug)]
pub struct CandidateFailure {
    pub format: SubtitleFormat,
    pub error: ParseError,
}

fn summarize(failures: &[CandidateFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("  {}: {}", f.format, f.error))
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("invalid stream: {reason}")]
    InvalidStream {
        reason: &'static str,
        #[source]
        source: Option<io::Error>,
    },
    #[error("{format} parser rejected the stream: {source}\nstream starts with:\n{preview}")]
    CandidateParseFailed {
        format: SubtitleFormat,
        #[source]
        source: ParseError,
        preview: String,
    },
    #[error(
        "no parser could read the stream\n{}\nstream starts with:\n{preview}",
        summarize(.failures)
    )]
    AllParsersFailed {
        failures: Vec<CandidateFailure>,
        preview: String,
    },
}

impl DispatchError {
    fn invalid_stream(reason: &'static str, source: Option<io::Error>) -> Self {
        Self::InvalidStream { reason, source }
    }

    /// The leading content of the stream, if this error carries it.
    pub fn preview(&self) -> Option<&str> {
        match self {
            DispatchError::InvalidStream { .. } => None,
            DispatchError::CandidateParseFailed { preview, .. }
            | DispatchError::AllParsersFailed { preview, .. } => Some(preview),
        }
    }
}

/// The result of a successful parse along with the format that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parsed {
    pub format: SubtitleFormat,
    pub entries: Vec<SubtitleEntry>,
}

/// How far apart two format names are.
///
/// This is the magnitude of the lexicographic comparison, not an edit or
/// ordinal distance: the hinted format is at 0 and every other format ties at
/// 1, so the rest keep their registration order.
fn name_distance(name: &str, hint: &str) -> u8 {
    (name.cmp(hint) as i8).unsigned_abs()
}

#[derive(Debug)]
pub struct Dispatcher {
    registry: Registry,
    policy: FailurePolicy,
    preview_chars: usize,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(Registry::builtin())
    }
}

impl Dispatcher {
    pub fn new(registry: Registry) -> Self {
        Self {
            registry,
            policy: FailurePolicy::default(),
            preview_chars: DEFAULT_PREVIEW_CHARS,
        }
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_preview_chars(mut self, preview_chars: usize) -> Self {
        self.preview_chars = preview_chars;
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    pub fn detect_format(&self, file_name: &str) -> &SubtitleFormat {
        self.registry.most_likely_format(file_name)
    }

    /// The order in which formats are tried for the given hint.
    ///
    /// Formats at the same distance from the hint keep their registration order.
    pub fn candidates(&self, hint: &SubtitleFormat) -> Vec<&RegistryEntry> {
        let mut candidates = self.registry.entries().iter().collect::<Vec<_>>();
        candidates.sort_by_key(|entry| name_distance(entry.format().name, hint.name));
        candidates
    }

    pub fn parse(
        &self,
        input: Input<'_>,
        options: &ParseOptions,
    ) -> Result<Vec<SubtitleEntry>, DispatchError> {
        self.parse_tagged(input, options).map(|parsed| parsed.entries)
    }

    /// Like [`Dispatcher::parse`] but also reports which format matched.
    pub fn parse_tagged(
        &self,
        input: Input<'_>,
        options: &ParseOptions,
    ) -> Result<Parsed, DispatchError> {
        let was_seekable = input.is_seekable();
        let mut stream = ensure_seekable(input)
            .map_err(|e| DispatchError::invalid_stream("could not read stream", Some(e)))?;

        let mut probe = [0u8; 1];
        match stream.rewind().and_then(|_| stream.read(&mut probe)) {
            Ok(0) => return Err(DispatchError::invalid_stream("stream is empty", None)),
            Ok(_) => {}
            Err(e) => return Err(DispatchError::invalid_stream("stream is not readable", Some(e))),
        }
        log::debug!(
            "stream prepared (seekable: {was_seekable}, buffered: {})",
            stream.is_buffered()
        );

        let hint = options
            .hint
            .unwrap_or_else(|| *self.registry.default_format());
        let encoding = options.encoding;
        let policy = options.policy.unwrap_or(self.policy);
        let mut failures = Vec::new();
        for candidate in self.candidates(&hint) {
            let format = *candidate.format();
            stream
                .rewind()
                .map_err(|e| DispatchError::invalid_stream("could not rewind stream", Some(e)))?;

            log::debug!("attempting {format} ({encoding})");
            match candidate.parser().parse_stream(&mut stream, encoding) {
                Ok(entries) => {
                    log::debug!("{format} parsed {} entries", entries.len());
                    return Ok(Parsed { format, entries });
                }
                Err(error) => {
                    log::debug!("{format} rejected the stream: {error}");
                    match policy {
                        FailurePolicy::AbortOnFirstFailure => {
                            return Err(DispatchError::CandidateParseFailed {
                                format,
                                source: error,
                                preview: self.preview(&mut stream, encoding),
                            });
                        }
                        FailurePolicy::Fallback => {
                            failures.push(CandidateFailure { format, error });
                        }
                    }
                }
            }
        }

        Err(DispatchError::AllParsersFailed {
            failures,
            preview: self.preview(&mut stream, encoding),
        })
    }

    fn preview<S: Read + Seek>(&self, stream: &mut S, encoding: Encoding) -> String {
        preview(stream, encoding, self.preview_chars).unwrap_or_else(|e| {
            log::warn!("could not read stream preview: {e}");
            String::new()
        })
    }
}
