use std::fmt;
use std::path::Path;
use std::str::FromStr;
use regex::Regex;
use once_cell::sync::Lazy;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::errors::TimelineError;
use crate::file_utils::FileManager;

// @module: Timed-text parsing, serialization and in-memory model

// @const: Timestamp regex, accepts either millisecond separator
static TIMESTAMP_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d+):(\d{2}):(\d{2})[.,](\d{3})$").unwrap()
});

/// Millisecond separator profile used when writing timestamps
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TimeFormat {
    /// `HH:MM:SS.mmm`
    #[default]
    Dotted,
    /// `HH:MM:SS,mmm` (classic SRT)
    Comma,
}

impl TimeFormat {
    // @returns: Separator placed before the milliseconds
    pub fn millis_separator(self) -> char {
        match self {
            Self::Dotted => '.',
            Self::Comma => ',',
        }
    }
}

impl FromStr for TimeFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_lowercase().as_str() {
            "dotted" | "dot" | "." => Ok(Self::Dotted),
            "comma" | "srt" | "," => Ok(Self::Comma),
            _ => Err(anyhow::anyhow!("Invalid time format: {}", s)),
        }
    }
}

/// A time-of-day value with millisecond precision
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timestamp(u64);

impl Timestamp {
    pub const fn from_millis(ms: u64) -> Self {
        Self(ms)
    }

    pub const fn as_millis(self) -> u64 {
        self.0
    }

    pub fn as_secs_f64(self) -> f64 {
        self.0 as f64 / 1000.0
    }

    /// Parse `H:MM:SS.mmm` or `H:MM:SS,mmm`
    pub fn parse(timestamp: &str) -> Result<Self, TimelineError> {
        let trimmed = timestamp.trim();
        let caps = TIMESTAMP_REGEX
            .captures(trimmed)
            .ok_or_else(|| TimelineError::InvalidTimestamp(trimmed.to_string()))?;

        let field = |i: usize| -> Result<u64, TimelineError> {
            caps.get(i)
                .and_then(|m| m.as_str().parse::<u64>().ok())
                .ok_or_else(|| TimelineError::InvalidTimestamp(trimmed.to_string()))
        };

        let hours = field(1)?;
        let minutes = field(2)?;
        let seconds = field(3)?;
        let millis = field(4)?;

        if minutes >= 60 || seconds >= 60 {
            return Err(TimelineError::InvalidTimestamp(trimmed.to_string()));
        }

        // Hour digits are unbounded in the pattern
        hours
            .checked_mul(3_600_000)
            .and_then(|ms| ms.checked_add(minutes * 60_000 + seconds * 1_000 + millis))
            .map(Self)
            .ok_or_else(|| TimelineError::InvalidTimestamp(trimmed.to_string()))
    }

    /// Format as `HH:MM:SS<sep>mmm`
    pub fn format(self, format: TimeFormat) -> String {
        let ms = self.0;
        let hours = ms / 3_600_000;
        let minutes = (ms % 3_600_000) / 60_000;
        let seconds = (ms % 60_000) / 1_000;
        let millis = ms % 1_000;

        format!(
            "{:02}:{:02}:{:02}{}{:03}",
            hours,
            minutes,
            seconds,
            format.millis_separator(),
            millis
        )
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.format(TimeFormat::Dotted))
    }
}

impl FromStr for Timestamp {
    type Err = TimelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

// @struct: Single timed-text entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimedEntry {
    // @field: 1-based position, reassigned on serialize
    pub index: usize,

    // @field: Start time
    pub start: Timestamp,

    // @field: End time
    pub end: Timestamp,

    // @field: Entry text
    pub text: String,
}

impl TimedEntry {
    /// Creates an entry without validation
    pub fn new(index: usize, start: Timestamp, end: Timestamp, text: impl Into<String>) -> Self {
        TimedEntry {
            index,
            start,
            end,
            text: text.into(),
        }
    }

    // @creates: Validated entry
    // @validates: start <= end and non-empty text
    // Zero-length entries are kept: a split of a span shorter than its chunk count produces them
    pub fn new_validated(index: usize, start: Timestamp, end: Timestamp, text: &str) -> Result<Self, TimelineError> {
        if end < start {
            return Err(TimelineError::InvalidRange {
                start: start.to_string(),
                end: end.to_string(),
            });
        }

        let trimmed_text = text.trim();
        if trimmed_text.is_empty() {
            return Err(TimelineError::EmptyText);
        }

        Ok(TimedEntry::new(index, start, end, trimmed_text))
    }

    /// Whitespace-delimited word count
    pub fn word_count(&self) -> usize {
        word_count(&self.text)
    }

    /// Duration in milliseconds
    pub fn duration_ms(&self) -> u64 {
        self.end.as_millis().saturating_sub(self.start.as_millis())
    }

    /// Whether the text ends with sentence-terminal punctuation
    pub fn ends_sentence(&self) -> bool {
        is_complete_sentence(&self.text)
    }

    /// Render this entry as a timed-text block
    pub fn to_block(&self, format: TimeFormat) -> String {
        format!(
            "{}\n{} --> {}\n{}\n\n",
            self.index,
            self.start.format(format),
            self.end.format(format),
            self.text
        )
    }
}

impl fmt::Display for TimedEntry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_block(TimeFormat::Dotted))
    }
}

/// Count whitespace-delimited words
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Check for a trailing `.`, `?` or `!`
pub fn is_complete_sentence(text: &str) -> bool {
    text.trim_end().ends_with(['.', '?', '!'])
}

/// Ordered list of timed entries
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimedSequence {
    /// Entries in chronological order
    pub entries: Vec<TimedEntry>,
}

impl TimedSequence {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    pub fn from_entries(entries: Vec<TimedEntry>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TimedEntry> {
        self.entries.iter()
    }

    pub fn push(&mut self, entry: TimedEntry) {
        self.entries.push(entry);
    }

    /// Elapsed time from the first start to the last end
    pub fn span_ms(&self) -> Option<u64> {
        let first = self.entries.first()?;
        let last = self.entries.last()?;
        Some(last.end.as_millis().saturating_sub(first.start.as_millis()))
    }

    /// Elapsed time in seconds, used as the reconciliation target
    pub fn span_secs(&self) -> Option<f64> {
        self.span_ms().map(|ms| ms as f64 / 1000.0)
    }

    /// Total word count over every entry
    pub fn total_words(&self) -> usize {
        self.entries.iter().map(|e| e.word_count()).sum()
    }

    /// All entry texts joined with single spaces
    pub fn joined_text(&self) -> String {
        self.entries
            .iter()
            .map(|e| e.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Reassign indices to 1..=N in sequence order
    pub fn renumber(&mut self) {
        for (i, entry) in self.entries.iter_mut().enumerate() {
            entry.index = i + 1;
        }
    }

    /// Number of adjacent pairs whose intervals overlap
    pub fn overlap_count(&self) -> usize {
        self.entries
            .windows(2)
            .filter(|pair| pair[0].end > pair[1].start)
            .count()
    }
}

impl FromIterator<TimedEntry> for TimedSequence {
    fn from_iter<I: IntoIterator<Item = TimedEntry>>(iter: I) -> Self {
        Self::from_entries(iter.into_iter().collect())
    }
}

impl IntoIterator for TimedSequence {
    type Item = TimedEntry;
    type IntoIter = std::vec::IntoIter<TimedEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a TimedSequence {
    type Item = &'a TimedEntry;
    type IntoIter = std::slice::Iter<'a, TimedEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl fmt::Display for TimedSequence {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Timed Sequence")?;
        writeln!(f, "Entries: {}", self.entries.len())?;
        if let (Some(first), Some(last)) = (self.entries.first(), self.entries.last()) {
            writeln!(f, "Span: {} --> {}", first.start, last.end)?;
        }
        Ok(())
    }
}

/// Parse timed-text content into a sequence.
///
/// Blocks are separated by blank lines. Malformed blocks are skipped with a
/// warning; the rest of the content is still returned.
pub fn parse(raw: &str) -> TimedSequence {
    let blocks = split_blocks(raw.trim_start_matches('\u{feff}'));
    let mut entries = Vec::with_capacity(blocks.len());

    for (block_no, block) in blocks.iter().enumerate() {
        match parse_block(block) {
            Ok(entry) => entries.push(entry),
            Err(e) => {
                warn!("Skipping timed-text block {} ({:?}): {}", block_no + 1, block.first(), e);
            }
        }
    }

    let sequence = TimedSequence::from_entries(entries);

    let overlaps = sequence.overlap_count();
    if overlaps > 0 {
        warn!("Found {} overlapping timed-text entries", overlaps);
    }

    debug!("Parsed {} of {} timed-text blocks", sequence.len(), blocks.len());
    sequence
}

/// Serialize a sequence, numbering entries 1..=N
pub fn serialize(sequence: &TimedSequence, format: TimeFormat) -> String {
    let mut output = String::new();
    for (i, entry) in sequence.entries.iter().enumerate() {
        output.push_str(&format!(
            "{}\n{} --> {}\n{}\n\n",
            i + 1,
            entry.start.format(format),
            entry.end.format(format),
            entry.text
        ));
    }
    output
}

/// Load and parse a timed-text file
pub fn load<P: AsRef<Path>>(path: P) -> Result<TimedSequence, TimelineError> {
    let path = path.as_ref();
    let content = FileManager::read_to_string(path).map_err(|e| TimelineError::Io {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let sequence = parse(&content);
    debug!("Loaded {} entries from {}", sequence.len(), path.display());
    Ok(sequence)
}

/// Serialize and write a sequence, creating parent directories if needed
pub fn save<P: AsRef<Path>>(sequence: &TimedSequence, path: P, format: TimeFormat) -> Result<(), TimelineError> {
    let path = path.as_ref();
    FileManager::write_to_file(path, &serialize(sequence, format)).map_err(|e| TimelineError::Io {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    debug!("Saved {} entries to {}", sequence.len(), path.display());
    Ok(())
}

// Group trimmed non-blank lines into blocks
fn split_blocks(content: &str) -> Vec<Vec<&str>> {
    let mut blocks = Vec::new();
    let mut current = Vec::new();

    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            if !current.is_empty() {
                blocks.push(std::mem::take(&mut current));
            }
        } else {
            current.push(trimmed);
        }
    }

    if !current.is_empty() {
        blocks.push(current);
    }

    blocks
}

fn parse_block(lines: &[&str]) -> Result<TimedEntry, TimelineError> {
    if lines.len() < 2 {
        return Err(TimelineError::TooFewLines(lines.len()));
    }

    let index: usize = lines[0]
        .parse()
        .map_err(|_| TimelineError::InvalidIndex(lines[0].to_string()))?;

    let (start_raw, end_raw) = lines[1]
        .split_once("-->")
        .ok_or_else(|| TimelineError::MissingArrow(lines[1].to_string()))?;

    // Anything after the end timestamp (e.g. position hints) is ignored
    let end_raw = end_raw.split_whitespace().next().unwrap_or_default();

    let start = Timestamp::parse(start_raw)?;
    let end = Timestamp::parse(end_raw)?;
    let text = lines[2..].join(" ");

    TimedEntry::new_validated(index, start, end, &text)
}
