use std::time::Duration;

/// A single timed caption, as produced by one of the format parsers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleEntry {
    /// The ordinal given by the file, if the format has one.
    pub index: Option<u32>,
    pub start: Duration,
    pub end: Duration,
    /// The caption text, one element per displayed line.
    pub lines: Vec<String>,
}

impl SubtitleEntry {
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    pub fn duration(&self) -> Duration {
        self.end.saturating_sub(self.start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_text() {
        let entry = SubtitleEntry {
            index: Some(3),
            start: Duration::from_millis(1500),
            end: Duration::from_millis(1000),
            lines: vec!["first".into(), "second".into()],
        };
        assert_eq!(entry.text(), "first\nsecond");
        assert_eq!(entry.duration(), Duration::ZERO);
    }
}
