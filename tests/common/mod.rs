/*!
 * Common test utilities for the smartdub test suite
 */

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use tempfile::TempDir;

use smartdub::timeline::{TimedEntry, TimedSequence, Timestamp};

/// Fine-grained, transcription-like timeline spanning exactly 10 seconds
pub const FINE_GRAINED_TIMELINE: &str = "1
00:00:00.000 --> 00:00:01.000
Hello

2
00:00:01.000 --> 00:00:02.500
and welcome to

3
00:00:02.500 --> 00:00:04.000
the show.

4
00:00:04.000 --> 00:00:06.000
Today we will talk about

5
00:00:06.000 --> 00:00:08.000
timing subtitles for

6
00:00:08.000 --> 00:00:10.000
natural speech.
";

/// Initialise env_logger once; safe to call from every test
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Creates the fine-grained sample timeline in `dir`
pub fn create_test_timeline(dir: &Path, filename: &str) -> Result<PathBuf> {
    create_test_file(dir, filename, FINE_GRAINED_TIMELINE)
}

/// Builds an entry from millisecond bounds
pub fn entry(index: usize, start_ms: u64, end_ms: u64, text: &str) -> TimedEntry {
    TimedEntry::new(index, Timestamp::from_millis(start_ms), Timestamp::from_millis(end_ms), text)
}

/// Builds a sequence of contiguous entries, each `step_ms` long
pub fn contiguous_sequence(texts: &[&str], step_ms: u64) -> TimedSequence {
    texts
        .iter()
        .enumerate()
        .map(|(i, text)| entry(i + 1, i as u64 * step_ms, (i as u64 + 1) * step_ms, text))
        .collect()
}

/// `n` distinct words: `<prefix>1 <prefix>2 ...`
pub fn words(n: usize, prefix: &str) -> String {
    (1..=n)
        .map(|i| format!("{}{}", prefix, i))
        .collect::<Vec<_>>()
        .join(" ")
}
