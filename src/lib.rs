//! Reads subtitle streams of uncertain format.
//!
//! A [`Dispatcher`] tries the registered format parsers against a stream,
//! starting with the hinted format, and returns the entries of the first one
//! that accepts it.
//!
//! ```no_run
//! use sub_reader::{Input, ParseOptions};
//!
//! let mut file = std::fs::File::open("movie.vtt")?;
//! let options = ParseOptions {
//!     hint: Some(*sub_reader::detect_format("movie.vtt")),
//!     ..Default::default()
//! };
//! let entries = sub_reader::parse(Input::seekable(&mut file), &options)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::{io::Read, sync::OnceLock};

pub mod cli;
pub mod dispatch;
pub mod encoding;
pub mod entry;
pub mod format;
pub mod srt;
pub mod stream;
pub(crate) mod utils;
pub mod vtt;

pub use dispatch::{DispatchError, Dispatcher, FailurePolicy, ParseOptions, Parsed};
pub use encoding::Encoding;
pub use entry::SubtitleEntry;
pub use format::{FormatParser, ParseError, Registry, SubtitleFormat};
pub use stream::Input;

/// Reads a whole stream into a string.
///
/// Decoding with [`Encoding::decode`] drops any byte order mark, then line
/// endings are normalised to `\n`.
pub(crate) fn read_text(stream: &mut dyn Read, encoding: Encoding) -> Result<String, ParseError> {
    let mut bytes = Vec::new();
    stream.read_to_end(&mut bytes)?;
    let mut buffer = encoding.decode(&bytes)?;

    if buffer.contains("\r\n") {
        buffer = buffer.replace("\r\n", "\n");
    }

    Ok(buffer)
}

/// A process wide dispatcher over the built-in formats.
pub fn dispatcher() -> &'static Dispatcher {
    static DISPATCHER: OnceLock<Dispatcher> = OnceLock::new();
    DISPATCHER.get_or_init(Dispatcher::default)
}

/// Parses `input` with the built-in formats.
pub fn parse(input: Input<'_>, options: &ParseOptions) -> Result<Vec<SubtitleEntry>, DispatchError> {
    dispatcher().parse(input, options)
}

/// Guesses the built-in format of a file from its name.
pub fn detect_format(file_name: &str) -> &'static SubtitleFormat {
    dispatcher().detect_format(file_name)
}
