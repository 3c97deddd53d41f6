/*!
 * Tests for file utility functions
 */

use std::fs;

use anyhow::Result;
use chrono::{Local, TimeZone};
use smartdub::file_utils::FileManager;
use crate::common;

#[test]
fn test_generateOutputPath_shouldInsertSuffixBeforeExtension() {
    let output = FileManager::generate_output_path("/videos/talk.srt", "/out", "translated", "srt");
    assert_eq!(output, std::path::PathBuf::from("/out/talk.translated.srt"));

    let audio = FileManager::generate_output_path("talk.srt", "/out", "speech", ".mp3");
    assert_eq!(audio, std::path::PathBuf::from("/out/talk.speech.mp3"));

    let plain = FileManager::generate_output_path("talk.srt", "/out", "", "txt");
    assert_eq!(plain, std::path::PathBuf::from("/out/talk.txt"));
}

#[test]
fn test_timestampedPath_shouldStampBeforeExtension() {
    let now = Local.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();

    let stamped = FileManager::timestamped_path("/tmp/out/adjusted.mp3", now);
    assert_eq!(stamped, std::path::PathBuf::from("/tmp/out/adjusted_20240309_070501.mp3"));

    let bare = FileManager::timestamped_path("/tmp/out/adjusted", now);
    assert_eq!(bare, std::path::PathBuf::from("/tmp/out/adjusted_20240309_070501"));
}

#[test]
fn test_findFiles_shouldMatchExtensionsRecursively() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let nested = temp_dir.path().join("season1");
    fs::create_dir_all(&nested)?;

    common::create_test_file(temp_dir.path(), "a.srt", "")?;
    common::create_test_file(temp_dir.path(), "b.SRT", "")?;
    common::create_test_file(&nested, "c.srt", "")?;
    common::create_test_file(&nested, "notes.txt", "")?;

    let files = FileManager::find_files(temp_dir.path(), &["srt"])?;

    assert_eq!(files.len(), 3);
    assert!(files.iter().all(|f| f.extension().is_some_and(|e| e.eq_ignore_ascii_case("srt"))));
    Ok(())
}

#[test]
fn test_writeToFile_withMissingParent_shouldCreateIt() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let target = temp_dir.path().join("a").join("b").join("file.txt");

    FileManager::write_to_file(&target, "content")?;

    assert!(FileManager::file_exists(&target));
    assert!(FileManager::dir_exists(temp_dir.path().join("a").join("b")));
    assert_eq!(FileManager::read_to_string(&target)?, "content");
    Ok(())
}

#[test]
fn test_sameFile_shouldResolveRelativeComponents() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let file = common::create_test_file(temp_dir.path(), "x.srt", "x")?;
    let roundabout = temp_dir.path().join(".").join("x.srt");

    assert!(FileManager::same_file(&file, &roundabout));
    assert!(!FileManager::same_file(&file, temp_dir.path().join("y.srt")));
    Ok(())
}

#[test]
fn test_appendToLogFile_shouldAppendTimestampedLines() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let log = temp_dir.path().join("logs").join("run.log");

    FileManager::append_to_log_file(&log, "first")?;
    FileManager::append_to_log_file(&log, "second")?;

    let content = fs::read_to_string(&log)?;
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].ends_with("first"));
    assert!(lines[1].ends_with("second"));
    Ok(())
}

#[test]
fn test_fileExists_withDirectory_shouldReturnFalse() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    assert!(!FileManager::file_exists(temp_dir.path()));
    assert!(FileManager::dir_exists(temp_dir.path()));
    Ok(())
}
