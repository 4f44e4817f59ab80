//! WebVTT (.vtt) subtitles.

use regex::Regex;

use crate::{
    format::{FormatParser, ParseError},
    srt::{blocks, parse_srt_time},
    utils::Lines,
    Encoding, SubtitleEntry,
};
use std::{io::Read, sync::OnceLock};

fn cue_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(
            r#"(?x)
        ^(?P<start>(?:\d{2,}:)?\d{2}:\d{2}[\.,]\d{3})
        \s+-->\s+
        (?P<end>(?:\d{2,}:)?\d{2}:\d{2}[\.,]\d{3})
        (?:\s.*)?$"#,
        )
        .unwrap()
    })
}

fn text_cleanup_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r#"(</?c(?:\.[\w\-]+)*>|&lrm;|&rlm;)"#).unwrap())
}

fn is_header(line: &str) -> bool {
    match line.strip_prefix("WEBVTT") {
        Some(rest) => rest.is_empty() || rest.starts_with([' ', '\t']),
        None => false,
    }
}

/// Blocks that carry no cue and are skipped without complaint.
fn is_metadata_block(first_line: &str) -> bool {
    ["NOTE", "STYLE", "REGION"].iter().any(|keyword| {
        first_line
            .strip_prefix(keyword)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with([' ', '\t']))
    })
}

fn parse_dialogue(segment: &str) -> Option<SubtitleEntry> {
    let mut lines = Lines::new(segment);
    let identifier_or_cue = lines.next()?;
    let (index, cue) = match cue_regex().captures(identifier_or_cue) {
        Some(cue) => (None, cue),
        None => (
            identifier_or_cue.trim().parse::<u32>().ok(),
            cue_regex().captures(lines.next()?)?,
        ),
    };
    let start = parse_srt_time(&cue["start"])?;
    let end = parse_srt_time(&cue["end"])?;

    let text = text_cleanup_regex().replace_all(lines.remainder(), "");
    Some(SubtitleEntry {
        index,
        start,
        end,
        lines: text.lines().map(str::to_owned).collect(),
    })
}

pub fn load_from_string(buffer: &str) -> Result<Vec<SubtitleEntry>, ParseError> {
    if !buffer.lines().next().is_some_and(is_header) {
        return Err(ParseError::MissingHeader { expected: "WEBVTT" });
    }

    let mut dialogue = Vec::new();
    // The first block is the header along with any metadata lines
    for (i, block) in blocks(buffer).enumerate().skip(1) {
        let first_line = block.lines().next().unwrap_or_default();
        if is_metadata_block(first_line) {
            continue;
        }
        match parse_dialogue(block) {
            Some(entry) => dialogue.push(entry),
            None => log::warn!("skipping unrecognised WebVTT block {}", i + 1),
        }
    }

    if dialogue.is_empty() {
        return Err(ParseError::NoDialogue);
    }
    Ok(dialogue)
}

/// The WebVTT parser.
#[derive(Debug, Clone, Copy, Default)]
pub struct VttParser;

impl FormatParser for VttParser {
    fn parse_stream(
        &self,
        stream: &mut dyn Read,
        encoding: Encoding,
    ) -> Result<Vec<SubtitleEntry>, ParseError> {
        let buffer = crate::read_text(stream, encoding)?;
        load_from_string(&buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    const SAMPLE: &str = "WEBVTT - some title
Kind: captions

NOTE this is
a comment

STYLE
::cue { color: yellow }

1
00:00:01.000 --> 00:00:02.500 line:10% align:start
<c.yellow.bg_blue>Hello</c> there&lrm;

intro
01:00:03.000 --> 01:00:04.000
First line
Second line

00:05.000 --> 00:06.000
";

    #[test]
    fn test_load() {
        let dialogue = load_from_string(SAMPLE).unwrap();
        assert_eq!(dialogue.len(), 3);

        assert_eq!(dialogue[0].index, Some(1));
        assert_eq!(dialogue[0].start, Duration::from_secs(1));
        assert_eq!(dialogue[0].end, Duration::from_millis(2500));
        assert_eq!(dialogue[0].lines, vec!["Hello there"]);

        assert_eq!(dialogue[1].index, None);
        assert_eq!(dialogue[1].start, Duration::from_secs(3603));
        assert_eq!(dialogue[1].lines, vec!["First line", "Second line"]);

        assert_eq!(dialogue[2].start, Duration::from_secs(5));
        assert!(dialogue[2].lines.is_empty());
    }

    #[test]
    fn test_header() {
        assert!(is_header("WEBVTT"));
        assert!(is_header("WEBVTT\tfoo"));
        assert!(!is_header("WEBVTTX"));
        assert!(matches!(
            load_from_string("1\n00:00:01,000 --> 00:00:02,000\nHello\n"),
            Err(ParseError::MissingHeader { .. })
        ));
        assert!(matches!(
            load_from_string("WEBVTT\n\nNOTE nothing here\n"),
            Err(ParseError::NoDialogue)
        ));
    }

    #[test]
    fn test_skips_garbage_blocks() {
        let buffer = "WEBVTT\n\nnot a cue\n\n00:01.000 --> 00:02.000\nHi\n";
        let dialogue = load_from_string(buffer).unwrap();
        assert_eq!(dialogue.len(), 1);
        assert_eq!(dialogue[0].lines, vec!["Hi"]);
    }

    #[test]
    fn test_whitespace_separator() {
        let buffer = "WEBVTT\n\t\n00:01.000 --> 00:02.000\nHello\n  \n00:03.000 --> 00:04.000\nWorld\n";
        let dialogue = load_from_string(buffer).unwrap();
        assert_eq!(dialogue.len(), 2);
        assert_eq!(dialogue[0].lines, vec!["Hello"]);
        assert_eq!(dialogue[1].start, Duration::from_secs(3));
        assert_eq!(dialogue[1].lines, vec!["World"]);
    }

    #[test]
    fn test_huge_hours() {
        let buffer = "WEBVTT\n\n9999999999999999:00:00.000 --> 9999999999999999:00:01.000\nHi\n";
        assert!(matches!(
            load_from_string(buffer),
            Err(ParseError::NoDialogue)
        ));

        let mixed = "WEBVTT\n\n9999999999999999:00:00.000 --> 00:00:01.000\nHi\n\n\
                     00:02.000 --> 00:03.000\nThere\n";
        let dialogue = load_from_string(mixed).unwrap();
        assert_eq!(dialogue.len(), 1);
        assert_eq!(dialogue[0].lines, vec!["There"]);
    }

    #[test]
    fn test_parse_stream_utf16() {
        let text = "WEBVTT\r\n\r\n00:01.000 --> 00:02.000\r\nHi\r\n";
        let mut bytes = vec![0xFF, 0xFE];
        bytes.extend(text.encode_utf16().flat_map(u16::to_le_bytes));
        let dialogue = VttParser
            .parse_stream(&mut bytes.as_slice(), Encoding::Utf16Le)
            .unwrap();
        assert_eq!(dialogue.len(), 1);
        assert_eq!(dialogue[0].lines, vec!["Hi"]);
    }
}
