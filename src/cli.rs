use anyhow::Context;
use clap::{Args, CommandFactory, Parser, Subcommand};
use serde::Serialize;
use std::{
    fs::File,
    io::{stdin, stdout, Write},
    path::PathBuf,
    time::Duration,
};

use crate::{Dispatcher, Encoding, FailurePolicy, Input, ParseOptions, Parsed, SubtitleEntry};

#[derive(Debug, Clone, PartialEq, Eq)]
enum InputLocation {
    Path(PathBuf),
    Stdio,
}

impl InputLocation {
    fn new(path: PathBuf) -> Self {
        if path.as_os_str() == "-" {
            Self::Stdio
        } else {
            Self::Path(path)
        }
    }

    /// The name used to guess the format, if there is one.
    fn file_name(&self) -> Option<String> {
        match self {
            InputLocation::Path(path) => path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned()),
            InputLocation::Stdio => None,
        }
    }

    /// Files are handed over as seekable streams, stdin is not.
    fn parse(&self, dispatcher: &Dispatcher, options: &ParseOptions) -> anyhow::Result<Parsed> {
        match self {
            InputLocation::Path(path) => {
                let mut file = File::open(path)
                    .with_context(|| format!("could not open {}", path.display()))?;
                dispatcher
                    .parse_tagged(Input::seekable(&mut file), options)
                    .with_context(|| format!("failed to read subtitles from {}", path.display()))
            }
            InputLocation::Stdio => {
                let mut stdin = stdin().lock();
                dispatcher
                    .parse_tagged(Input::sequential(&mut stdin), options)
                    .context("failed to read subtitles from stdin")
            }
        }
    }
}

fn format_timestamp(d: &Duration) -> String {
    let seconds = d.as_secs();
    let (hours, seconds) = (seconds / 3600, seconds % 3600);
    let (minutes, seconds) = (seconds / 60, seconds % 60);
    let ms = d.subsec_millis();
    format!("{:02}:{:02}:{:02}.{:03}", hours, minutes, seconds, ms)
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Print what the parser dispatch is doing to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Subcommands,
}

#[derive(Subcommand, Debug)]
pub enum Subcommands {
    /// Parses a subtitle file of any supported format
    Parse(ParseArgs),
    /// Shows the format each file name would be tried as first
    Detect(DetectArgs),
    /// Lists the supported subtitle formats
    Formats,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        let dispatcher = crate::dispatcher();
        match self.command {
            Subcommands::Parse(args) => args.run(dispatcher),
            Subcommands::Detect(args) => args.run(dispatcher),
            Subcommands::Formats => {
                let default = dispatcher.registry().default_format();
                for format in dispatcher.registry().formats() {
                    let marker = if format == default { " (default)" } else { "" };
                    println!("{}\t{}{}", format.name, format.extension, marker);
                }
                Ok(())
            }
        }
    }
}

#[derive(Args, Debug)]
pub struct ParseArgs {
    /// The subtitle file to parse.
    ///
    /// If `-` is given, then it's interpreted as stdin.
    pub file: PathBuf,
    /// The character encoding of the file.
    ///
    /// Accepts labels such as `utf-8`, `utf-16le`, `utf-16be`
    /// and `latin1`. The encoding is never guessed.
    #[arg(short, long, default_value_t = Encoding::Utf8, verbatim_doc_comment)]
    pub encoding: Encoding,
    /// The format to try first, by name (see `formats`).
    ///
    /// Defaults to the format matching the file's extension.
    #[arg(short, long)]
    pub format: Option<String>,
    /// Give up as soon as the first format fails to parse the file
    /// instead of trying the remaining formats.
    #[arg(long)]
    pub strict: bool,
    /// Print the dialogue as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    format: &'a str,
    entries: Vec<JsonEntry<'a>>,
}

#[derive(Serialize)]
struct JsonEntry<'a> {
    index: Option<u32>,
    start_ms: u64,
    end_ms: u64,
    lines: &'a [String],
}

impl<'a> From<&'a SubtitleEntry> for JsonEntry<'a> {
    fn from(entry: &'a SubtitleEntry) -> Self {
        Self {
            index: entry.index,
            start_ms: entry.start.as_millis() as u64,
            end_ms: entry.end.as_millis() as u64,
            lines: &entry.lines,
        }
    }
}

impl ParseArgs {
    pub fn run(self, dispatcher: &Dispatcher) -> anyhow::Result<()> {
        let input = InputLocation::new(self.file);
        let hint = match &self.format {
            Some(name) => match dispatcher.registry().find(name) {
                Some(format) => *format,
                None => Cli::command()
                    .error(
                        clap::error::ErrorKind::ValueValidation,
                        format!("unknown subtitle format `{name}`"),
                    )
                    .exit(),
            },
            None => match input.file_name() {
                Some(name) => *dispatcher.detect_format(&name),
                None => *dispatcher.registry().default_format(),
            },
        };

        let mut options = ParseOptions::new(self.encoding, Some(hint));
        if self.strict {
            options = options.with_policy(FailurePolicy::AbortOnFirstFailure);
        }
        let parsed = input.parse(dispatcher, &options)?;

        let mut out = stdout().lock();
        if self.json {
            let output = JsonOutput {
                format: parsed.format.name,
                entries: parsed.entries.iter().map(JsonEntry::from).collect(),
            };
            serde_json::to_writer_pretty(&mut out, &output)?;
            writeln!(out)?;
        } else {
            writeln!(out, "Format: {}", parsed.format)?;
            writeln!(out, "Dialogue:\n  Total: {}", parsed.entries.len())?;
            for entry in &parsed.entries {
                let index = entry.index.map(|i| i.to_string()).unwrap_or_default();
                writeln!(
                    out,
                    "\n{index}\n{} --> {}",
                    format_timestamp(&entry.start),
                    format_timestamp(&entry.end)
                )?;
                for line in &entry.lines {
                    writeln!(out, "{line}")?;
                }
            }
        }
        Ok(())
    }
}

#[derive(Args, Debug)]
pub struct DetectArgs {
    /// The file names to check. The files don't need to exist.
    #[arg(required = true)]
    pub names: Vec<String>,
}

impl DetectArgs {
    pub fn run(self, dispatcher: &Dispatcher) -> anyhow::Result<()> {
        for name in &self.names {
            println!("{name}\t{}", dispatcher.detect_format(name));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_args() {
        let cli = Cli::try_parse_from([
            "sub-reader", "-v", "parse", "-", "--encoding", "latin1", "--format", "vtt",
            "--strict",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Subcommands::Parse(args) => {
                assert_eq!(args.encoding, Encoding::Latin1);
                assert_eq!(args.format.as_deref(), Some("vtt"));
                assert!(args.strict);
                assert_eq!(InputLocation::new(args.file), InputLocation::Stdio);
            }
            other => panic!("unexpected command: {other:?}"),
        }

        assert!(Cli::try_parse_from(["sub-reader", "parse", "a.srt", "-e", "ebcdic"]).is_err());
        assert!(Cli::try_parse_from(["sub-reader", "detect"]).is_err());
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(
            format_timestamp(&Duration::from_millis(3_723_456)),
            "01:02:03.456"
        );
    }
}
