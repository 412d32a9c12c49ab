/*!
 * Tests for subtitle processing functionality
 */

use anyhow::Result;
use std::fs;
use quickcut::subtitle_processor::{SubtitleCollection, SubtitleEntry, SubtitleTrimmer, SUBTITLE_SHIFT_MS};
use quickcut::time_field::{TimeOfDay, TimeRange};
use crate::common;

fn range(start: &str, stop: &str) -> Result<TimeRange> {
    Ok(TimeRange::new(TimeOfDay::parse(start)?, TimeOfDay::parse(stop)?))
}

/// Test parsing a valid SRT string
#[test]
fn test_parse_srt_string_withValidContent_shouldParseCorrectly() -> Result<()> {
    let entries = SubtitleCollection::parse_srt_string(common::SAMPLE_SRT)?;

    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0].seq_num, 1);
    assert_eq!(entries[0].start_time_ms, 1_000);
    assert_eq!(entries[0].end_time_ms, 4_000);
    assert_eq!(entries[0].text, "This is a test subtitle.");
    assert_eq!(entries[1].end_time_ms, 14_500);
    Ok(())
}

/// Test that garbage with no entry at all is reported
#[test]
fn test_parse_srt_string_withNoEntries_shouldFail() {
    assert!(SubtitleCollection::parse_srt_string("just some words\nand more").is_err());
}

/// Test timestamp formatting and parsing agree
#[test]
fn test_format_timestamp_shouldUseCommaMillis() -> Result<()> {
    assert_eq!(SubtitleEntry::format_timestamp(3_723_004), "01:02:03,004");
    assert_eq!(SubtitleEntry::parse_timestamp("01:02:03,004")?, 3_723_004);
    Ok(())
}

/// Test the slice keeps only entries strictly inside the window
#[test]
fn test_trim_withWindow_shouldKeepShiftAndRenumber() -> Result<()> {
    let collection = SubtitleCollection {
        source_file: "sample.srt".into(),
        entries: SubtitleCollection::parse_srt_string(common::SAMPLE_SRT)?,
    };

    let part = SubtitleTrimmer::new().trim(&collection, &range("10", "20")?);

    assert_eq!(part.entries.len(), 2);
    assert_eq!(part.entries[0].seq_num, 1);
    assert_eq!(part.entries[0].start_time_ms, 12_000 - SUBTITLE_SHIFT_MS);
    assert_eq!(part.entries[0].end_time_ms, 14_500 - SUBTITLE_SHIFT_MS);
    assert_eq!(part.entries[1].seq_num, 2);
    assert_eq!(part.entries[1].text, "For testing purposes.");
    Ok(())
}

/// Entries touching a boundary are dropped, not clipped
#[test]
fn test_trim_withEntryOnBoundary_shouldDropIt() -> Result<()> {
    let mut collection = SubtitleCollection::new("edge.srt".into());
    collection.entries.push(SubtitleEntry::new(1, 10_000, 12_000, "starts on the cut".to_string()));
    collection.entries.push(SubtitleEntry::new(2, 15_000, 20_000, "ends on the cut".to_string()));
    collection.entries.push(SubtitleEntry::new(3, 9_000, 11_000, "crosses the cut".to_string()));

    let part = SubtitleTrimmer::new().trim(&collection, &range("10", "20")?);

    assert!(part.entries.is_empty());
    Ok(())
}

/// Shifting never goes below zero
#[test]
fn test_shift_back_nearStart_shouldSaturate() {
    let mut entry = SubtitleEntry::new(1, 500, 2_500, "early".to_string());
    entry.shift_back(SUBTITLE_SHIFT_MS);
    assert_eq!(entry.start_time_ms, 0);
    assert_eq!(entry.end_time_ms, 500);
}

/// Test writing and reading back a trimmed file
#[test]
fn test_trim_file_shouldWriteSrtFile() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_subtitle(temp_dir.path(), "movie.srt")?;
    let output = temp_dir.path().join("out").join("clip.srt");

    let written = SubtitleTrimmer::new().trim_file(&input, &output, &range("10", "20")?)?;

    assert_eq!(written.as_deref(), Some(output.as_path()));
    let content = fs::read_to_string(&output)?;
    assert_eq!(
        content,
        "1\n00:00:10,000 --> 00:00:12,500\nIt contains multiple entries.\n\n\
         2\n00:00:13,000 --> 00:00:17,000\nFor testing purposes.\n\n"
    );

    let reloaded = SubtitleCollection::from_srt_file(&output)?;
    assert_eq!(reloaded.entries.len(), 2);
    Ok(())
}

/// An empty window still produces a (blank) file
#[test]
fn test_trim_file_withNothingInRange_shouldWriteEmptyFile() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_subtitle(temp_dir.path(), "movie.srt")?;
    let output = temp_dir.path().join("clip.srt");

    SubtitleTrimmer::new().trim_file(&input, &output, &range("1:00", "2:00")?)?;

    assert_eq!(fs::read_to_string(&output)?, "");
    Ok(())
}

/// A missing input is skipped without creating the output
#[test]
fn test_trim_file_withMissingInput_shouldSkip() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let output = temp_dir.path().join("clip.srt");

    let written = SubtitleTrimmer::new().trim_file(temp_dir.path().join("nope.srt"), &output, &range("10", "20")?)?;

    assert!(written.is_none());
    assert!(!output.exists());
    Ok(())
}

/// Byte order marks written by some editors are ignored
#[test]
fn test_from_srt_file_withBom_shouldParse() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let content = format!("\u{feff}{}", common::SAMPLE_SRT);
    let path = common::create_test_file(temp_dir.path(), "bom.srt", &content)?;

    let collection = SubtitleCollection::from_srt_file(&path)?;
    assert_eq!(collection.entries.len(), 3);
    assert_eq!(collection.entries[0].seq_num, 1);
    Ok(())
}

/// A cue with no text survives the trim without swallowing its neighbour
#[test]
fn test_trim_file_withEmptyCue_shouldKeepFollowingCue() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_file(
        temp_dir.path(),
        "movie.srt",
        "1\n00:00:11,000 --> 00:00:12,000\n\n2\n00:00:13,000 --> 00:00:14,000\nHello\n",
    )?;
    let output = temp_dir.path().join("clip.srt");

    SubtitleTrimmer::new().trim_file(&input, &output, &range("10", "20")?)?;

    let reloaded = SubtitleCollection::from_srt_file(&output)?;
    assert_eq!(
        reloaded.entries,
        vec![
            SubtitleEntry::new(1, 9_000, 10_000, String::new()),
            SubtitleEntry::new(2, 11_000, 12_000, "Hello".to_string()),
        ]
    );
    Ok(())
}
