//! SubRip (.srt) subtitles.

use std::{error::Error, fmt::Display, io::Read, time::Duration};

use crate::{
    format::{FormatParser, ParseError},
    Encoding, SubtitleEntry,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseDialogueError {
    Position,
    Start,
    End,
    Separator,
    EmptyDialogue,
}

impl Display for ParseDialogueError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseDialogueError::Position => {
                f.write_str("could not parse srt dialogue: bad position")
            }
            ParseDialogueError::Start => f.write_str("could not parse srt dialogue: bad start"),
            ParseDialogueError::End => f.write_str("could not parse srt dialogue: bad end"),
            ParseDialogueError::Separator => {
                f.write_str("could not parse srt dialogue: bad or missing separator")
            }
            ParseDialogueError::EmptyDialogue => {
                f.write_str("could not parse srt dialogue: no dialogue")
            }
        }
    }
}

impl Error for ParseDialogueError {}

/// Parses a timestamp such as `01:02:03,456`.
///
/// The hours are optional and the milliseconds may be separated by either a
/// comma or a period, so WebVTT timestamps parse as well.
pub(crate) fn parse_srt_time(s: &str) -> Option<Duration> {
    let (rest, fraction) = s.trim().split_once([',', '.'])?;
    let mut fields = rest.rsplit(':');
    let seconds: u64 = fields.next()?.parse().ok()?;
    let minutes: u64 = fields.next()?.parse().ok()?;
    let hours: u64 = match fields.next() {
        Some(hours) => hours.parse().ok()?,
        None => 0,
    };
    if fields.next().is_some() {
        return None;
    }

    if fraction.is_empty() || fraction.len() > 3 || !fraction.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }
    // "5" is half a second, not five milliseconds
    let millis = fraction.parse::<u32>().ok()? * 10u32.pow(3 - fraction.len() as u32);

    let seconds = hours
        .checked_mul(3600)?
        .checked_add(minutes.checked_mul(60)?)?
        .checked_add(seconds)?;
    Some(Duration::new(seconds, millis * 1_000_000))
}

/// Splits the file into blocks separated by one or more blank lines.
///
/// Lines holding nothing but whitespace count as blank.
pub(crate) fn blocks(buffer: &str) -> impl Iterator<Item = &str> {
    let mut blocks = Vec::new();
    let mut start = None;
    let mut offset = 0;
    for line in buffer.split_inclusive('\n') {
        if line.trim().is_empty() {
            if let Some(start) = start.take() {
                blocks.push(buffer[start..offset].trim_end_matches('\n'));
            }
        } else if start.is_none() {
            start = Some(offset);
        }
        offset += line.len();
    }
    if let Some(start) = start {
        blocks.push(buffer[start..].trim_end_matches('\n'));
    }
    blocks.into_iter()
}

fn parse_dialogue(s: &str) -> Result<SubtitleEntry, ParseDialogueError> {
    let mut lines = s.splitn(3, '\n');
    let position: u32 = lines
        .next()
        .and_then(|s| s.trim().parse().ok())
        .ok_or(ParseDialogueError::Position)?;
    let (start, end) = match lines.next() {
        Some(times) => {
            let (start, end) = times
                .split_once("-->")
                .ok_or(ParseDialogueError::Separator)?;
            let start = parse_srt_time(start).ok_or(ParseDialogueError::Start)?;
            // Some files put display coordinates after the end time
            let end = end
                .split_whitespace()
                .next()
                .and_then(parse_srt_time)
                .ok_or(ParseDialogueError::End)?;
            (start, end)
        }
        None => return Err(ParseDialogueError::Start),
    };
    let lines = lines
        .next()
        .ok_or(ParseDialogueError::EmptyDialogue)?
        .lines()
        .map(str::to_owned)
        .collect();
    Ok(SubtitleEntry {
        index: Some(position),
        start,
        end,
        lines,
    })
}

pub fn load_from_string(buffer: &str) -> Result<Vec<SubtitleEntry>, ParseError> {
    let dialogue = blocks(buffer)
        .enumerate()
        .map(|(i, s)| {
            parse_dialogue(s).map_err(|source| ParseError::Dialogue {
                block: i + 1,
                source,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    if dialogue.is_empty() {
        return Err(ParseError::NoDialogue);
    }
    Ok(dialogue)
}

/// The SubRip parser.
#[derive(Debug, Clone, Copy, Default)]
pub struct SrtParser;

impl FormatParser for SrtParser {
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

    #[test]
    fn test_dialogue() {
        let fragment =
            "11\n00:00:22,814 --> 00:00:26,609\nもう ４月というのに\n何やら 今日は冷えますね";
        let result = parse_dialogue(fragment).expect("could not parse");
        assert_eq!(result.index, Some(11));
        assert_eq!(result.start.as_secs(), 22);
        assert_eq!(result.start.subsec_millis(), 814);
        assert_eq!(result.end.as_secs(), 26);
        assert_eq!(result.end.subsec_millis(), 609);
        assert_eq!(
            result.lines,
            vec!["もう ４月というのに", "何やら 今日は冷えますね"]
        );
    }

    #[test]
    fn test_times() {
        assert_eq!(
            parse_srt_time("01:02:03,456"),
            Some(Duration::from_millis(3_723_456))
        );
        assert_eq!(
            parse_srt_time("02:03.5"),
            Some(Duration::from_millis(123_500))
        );
        assert_eq!(parse_srt_time("00:00:01"), None);
        assert_eq!(parse_srt_time("00:00:01,1234"), None);
        assert_eq!(parse_srt_time("1:00:00:01,000"), None);
        assert_eq!(parse_srt_time("aa:00:01,000"), None);
        assert_eq!(parse_srt_time("18446744073709551615:00:00,000"), None);
        assert_eq!(parse_srt_time("5124095576030432:00:00,000"), None);
        assert_eq!(parse_srt_time("00:18446744073709551615:00,000"), None);
    }

    #[test]
    fn test_blocks() {
        let buffer = "\n \n1\nfoo\n \t\n2\nbar\n\n\n3\nbaz\n  ";
        assert_eq!(
            blocks(buffer).collect::<Vec<_>>(),
            vec!["1\nfoo", "2\nbar", "3\nbaz"]
        );
        assert_eq!(blocks(" \n\t\n").count(), 0);
    }

    #[test]
    fn test_whitespace_separator() {
        let buffer = "1\n00:00:01,000 --> 00:00:02,000\nHello\n \n\
                      2\n00:00:03,000 --> 00:00:04,000\nWorld\n";
        let dialogue = load_from_string(buffer).unwrap();
        assert_eq!(dialogue.len(), 2);
        assert_eq!(dialogue[0].lines, vec!["Hello"]);
        assert_eq!(dialogue[1].index, Some(2));
        assert_eq!(dialogue[1].lines, vec!["World"]);
    }

    #[test]
    fn test_huge_hours() {
        let buffer = "1\n18446744073709551615:00:00,000 --> 00:00:01,000\nHi\n";
        assert!(matches!(
            load_from_string(buffer),
            Err(ParseError::Dialogue {
                block: 1,
                source: ParseDialogueError::Start
            })
        ));
    }

    #[test]
    fn test_load() {
        let buffer = "1\n00:00:01,000 --> 00:00:02,500\nHello\n\n\n\
                      2\n00:00:03,000 --> 00:00:04,000 X1:100 X2:200 Y1:10 Y2:20\n<i>World</i>\nAgain\n";
        let dialogue = load_from_string(buffer).unwrap();
        assert_eq!(dialogue.len(), 2);
        assert_eq!(dialogue[0].lines, vec!["Hello"]);
        assert_eq!(dialogue[0].end, Duration::from_millis(2500));
        assert_eq!(dialogue[1].index, Some(2));
        assert_eq!(dialogue[1].end, Duration::from_secs(4));
        assert_eq!(dialogue[1].lines, vec!["<i>World</i>", "Again"]);
    }

    #[test]
    fn test_bad_block() {
        let buffer = "1\n00:00:01,000 --> 00:00:02,000\nHello\n\n2\n00:00:03,000 00:00:04,000\nWorld";
        match load_from_string(buffer) {
            Err(ParseError::Dialogue { block, source }) => {
                assert_eq!(block, 2);
                assert_eq!(source, ParseDialogueError::Separator);
            }
            other => panic!("unexpected result: {other:?}"),
        }

        let missing_text = "1\n00:00:01,000 --> 00:00:02,000";
        assert!(matches!(
            load_from_string(missing_text),
            Err(ParseError::Dialogue {
                source: ParseDialogueError::EmptyDialogue,
                ..
            })
        ));
    }

    #[test]
    fn test_rejects_other_formats() {
        assert!(matches!(
            load_from_string("WEBVTT\n\n00:01.000 --> 00:02.000\nHi\n"),
            Err(ParseError::Dialogue {
                block: 1,
                source: ParseDialogueError::Position
            })
        ));
        assert!(matches!(
            load_from_string("\n\n  \n"),
            Err(ParseError::NoDialogue)
        ));
    }

    #[test]
    fn test_parse_stream() {
        let bytes = b"\xEF\xBB\xBF1\r\n00:00:01,000 --> 00:00:02,000\r\nCaf\xC3\xA9\r\n\r\n";
        let dialogue = SrtParser
            .parse_stream(&mut &bytes[..], Encoding::Utf8)
            .unwrap();
        assert_eq!(dialogue.len(), 1);
        assert_eq!(dialogue[0].lines, vec!["Café"]);

        let latin1 = b"1\n00:00:01,000 --> 00:00:02,000\nCaf\xE9\n";
        assert!(matches!(
            SrtParser.parse_stream(&mut &latin1[..], Encoding::Utf8),
            Err(ParseError::Decode(_))
        ));
        let dialogue = SrtParser
            .parse_stream(&mut &latin1[..], Encoding::Latin1)
            .unwrap();
        assert_eq!(dialogue[0].lines, vec!["Café"]);
    }
}
