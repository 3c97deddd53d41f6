/*!
 * Reflow engine for timed text.
 *
 * Turns a fine-grained sequence (e.g. transcription segments) into entries
 * suited for narration:
 * - consecutive entries are merged while they fit in `max_words`, or while
 *   the accumulated text has not reached the end of a sentence
 * - entries shorter than `min_words` are never emitted on their own, except
 *   for the very last one
 * - any entry exceeding `max_words` is split into chunks of at most
 *   `max_words` words, dividing its time span into equal contiguous parts
 *
 * The pass is greedy and strictly forward: one owned accumulator, one
 * append-only output list, no backtracking. Text and total time span are
 * conserved exactly.
 */

use log::debug;

use crate::app_config::ReflowConfig;
use crate::errors::TimelineError;
use crate::timeline::{TimedEntry, TimedSequence, Timestamp};

/// Counters describing what a reflow pass did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReflowReport {
    /// Entries received
    pub input_entries: usize,
    /// Entries produced
    pub output_entries: usize,
    /// Merges taken because the pair fit or the sentence was unfinished
    pub merges: usize,
    /// Merges forced because the accumulator was below `min_words`
    pub fallback_merges: usize,
    /// Oversized accumulators that were split
    pub splits: usize,
}

/// Greedy merge/split reflow over a timed sequence
#[derive(Debug, Clone)]
pub struct Reflower {
    config: ReflowConfig,
}

impl Default for Reflower {
    fn default() -> Self {
        Self {
            config: ReflowConfig::default(),
        }
    }
}

impl Reflower {
    /// Create a reflower with the default bounds (4..=15 words)
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a reflower with custom bounds
    pub fn with_config(config: ReflowConfig) -> Result<Self, TimelineError> {
        if config.max_words == 0 || config.min_words > config.max_words {
            return Err(TimelineError::InvalidBounds {
                min_words: config.min_words,
                max_words: config.max_words,
            });
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &ReflowConfig {
        &self.config
    }

    /// Reflow a sequence
    pub fn reflow(&self, sequence: TimedSequence) -> TimedSequence {
        self.reflow_with_report(sequence).0
    }

    /// Reflow a sequence and report what happened
    pub fn reflow_with_report(&self, sequence: TimedSequence) -> (TimedSequence, ReflowReport) {
        let max_words = self.config.max_words;
        let min_words = self.config.min_words;

        let mut report = ReflowReport {
            input_entries: sequence.len(),
            ..ReflowReport::default()
        };

        let mut output: Vec<TimedEntry> = Vec::with_capacity(sequence.len());
        let mut entries = sequence.into_iter();

        let Some(first) = entries.next() else {
            return (TimedSequence::new(), report);
        };

        // Checked before any merge so an oversized first entry is bounded too
        let mut current = self.split_oversized(first, &mut output, &mut report);

        for next in entries {
            let curr_words = current.word_count();
            let next_words = next.word_count();

            if curr_words + next_words <= max_words || !current.ends_sentence() {
                merge_into(&mut current, next);
                report.merges += 1;
            } else if curr_words < min_words {
                // Short entries are absorbed even past max_words; the split below catches overflow
                merge_into(&mut current, next);
                report.fallback_merges += 1;
            } else {
                output.push(std::mem::replace(&mut current, next));
            }

            current = self.split_oversized(current, &mut output, &mut report);
        }

        output.push(current);

        let mut result = TimedSequence::from_entries(output);
        result.renumber();
        report.output_entries = result.len();

        debug!(
            "Reflowed {} entries into {} (merges: {}, fallback merges: {}, splits: {}) with min_words={}, max_words={}",
            report.input_entries,
            report.output_entries,
            report.merges,
            report.fallback_merges,
            report.splits,
            min_words,
            max_words
        );

        (result, report)
    }

    // Split `current` if it exceeds max_words. Every chunk but the last is
    // flushed to `output`; the last chunk is returned as the new accumulator.
    fn split_oversized(&self, current: TimedEntry, output: &mut Vec<TimedEntry>, report: &mut ReflowReport) -> TimedEntry {
        if current.word_count() <= self.config.max_words {
            return current;
        }

        let chunks = split_text(&current.text, self.config.max_words);
        let intervals = distribute_time(current.start, current.end, chunks.len());

        let mut pieces: Vec<TimedEntry> = chunks
            .into_iter()
            .zip(intervals)
            .enumerate()
            .map(|(i, (text, (start, end)))| TimedEntry::new(current.index + i, start, end, text))
            .collect();

        match pieces.pop() {
            Some(last) => {
                report.splits += 1;
                output.extend(pieces);
                last
            }
            None => current,
        }
    }
}

/// Reflow with explicit bounds
pub fn reflow(sequence: TimedSequence, min_words: usize, max_words: usize) -> Result<TimedSequence, TimelineError> {
    let reflower = Reflower::with_config(ReflowConfig::new(min_words, max_words))?;
    Ok(reflower.reflow(sequence))
}

/// Split text into consecutive chunks of at most `max_words` words
pub fn split_text(text: &str, max_words: usize) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    words
        .chunks(max_words.max(1))
        .map(|chunk| chunk.join(" "))
        .collect()
}

/// Divide `[start, end]` into `parts` contiguous intervals of equal width.
///
/// Boundaries are floored to the millisecond; the last interval always ends
/// exactly at `end`. Every interval is at least 1 ms wide when the span is at
/// least `parts` ms; shorter spans yield zero-length intervals.
pub fn distribute_time(start: Timestamp, end: Timestamp, parts: usize) -> Vec<(Timestamp, Timestamp)> {
    if parts == 0 {
        return Vec::new();
    }

    let start_ms = start.as_millis();
    let total = end.as_millis().saturating_sub(start_ms);
    let parts = parts as u64;
    let boundary = |i: u64| Timestamp::from_millis(start_ms + total * i / parts);

    (0..parts).map(|i| (boundary(i), boundary(i + 1))).collect()
}

fn merge_into(current: &mut TimedEntry, next: TimedEntry) {
    current.text.push(' ');
    current.text.push_str(&next.text);
    current.end = next.end;
}
