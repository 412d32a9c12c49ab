use anyhow::{anyhow, Context, Result};
use log::{debug, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::time_field::TimeRange;

// @module: SubRip parsing, slicing and re-timing

// @const: SRT timestamp regex
static TIMESTAMP_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{2,}):(\d{2}):(\d{2})[,.](\d{3})\s*-->\s*(\d{2,}):(\d{2}):(\d{2})[,.](\d{3})").unwrap()
});

/// Offset removed from every kept entry after a cut, in milliseconds
pub const SUBTITLE_SHIFT_MS: u64 = 2_000;

// @struct: Single subtitle entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleEntry {
    // @field: Sequence number
    pub seq_num: usize,

    // @field: Start time in ms
    pub start_time_ms: u64,

    // @field: End time in ms
    pub end_time_ms: u64,

    // @field: Subtitle text
    pub text: String,
}

impl SubtitleEntry {
    pub fn new(seq_num: usize, start_time_ms: u64, end_time_ms: u64, text: String) -> Self {
        SubtitleEntry {
            seq_num,
            start_time_ms,
            end_time_ms,
            text,
        }
    }

    // @creates: Validated subtitle entry
    // @validates: Time range only; text is kept as given, empty included
    pub fn new_validated(seq_num: usize, start_time_ms: u64, end_time_ms: u64, text: String) -> Result<Self> {
        if end_time_ms < start_time_ms {
            return Err(anyhow!(
                "Invalid time range: end time {} < start time {}",
                end_time_ms, start_time_ms
            ));
        }

        Ok(Self::new(seq_num, start_time_ms, end_time_ms, text))
    }

    /// Parse an SRT timestamp (`HH:MM:SS,mmm`) to milliseconds
    pub fn parse_timestamp(timestamp: &str) -> Result<u64> {
        let parts: Vec<&str> = timestamp.trim().split(&[':', ',', '.'][..]).collect();

        if parts.len() != 4 {
            return Err(anyhow!("Invalid timestamp format: {}", timestamp));
        }

        let hours: u64 = parts[0].parse().context("Failed to parse hours")?;
        let minutes: u64 = parts[1].parse().context("Failed to parse minutes")?;
        let seconds: u64 = parts[2].parse().context("Failed to parse seconds")?;
        let millis: u64 = parts[3].parse().context("Failed to parse milliseconds")?;

        if minutes >= 60 || seconds >= 60 || millis >= 1000 {
            return Err(anyhow!("Invalid time components in timestamp: {}", timestamp));
        }

        Ok(hours * 3_600_000 + minutes * 60_000 + seconds * 1_000 + millis)
    }

    /// Format a timestamp in milliseconds to SRT format (HH:MM:SS,mmm)
    pub fn format_timestamp(ms: u64) -> String {
        let hours = ms / 3_600_000;
        let minutes = (ms % 3_600_000) / 60_000;
        let seconds = (ms % 60_000) / 1_000;
        let millis = ms % 1_000;

        format!("{:02}:{:02}:{:02},{:03}", hours, minutes, seconds, millis)
    }

    pub fn format_start_time(&self) -> String {
        Self::format_timestamp(self.start_time_ms)
    }

    pub fn format_end_time(&self) -> String {
        Self::format_timestamp(self.end_time_ms)
    }

    /// Move both timestamps back by `offset_ms`, stopping at zero
    pub fn shift_back(&mut self, offset_ms: u64) {
        self.start_time_ms = self.start_time_ms.saturating_sub(offset_ms);
        self.end_time_ms = self.end_time_ms.saturating_sub(offset_ms);
    }
}

impl fmt::Display for SubtitleEntry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{}", self.seq_num)?;
        writeln!(f, "{} --> {}", self.format_start_time(), self.format_end_time())?;
        writeln!(f, "{}", self.text)?;
        writeln!(f)
    }
}

// Where the SRT parser is inside the current block
enum SrtBlock<'a> {
    Index,
    Timing { seq_num: usize },
    Text { seq_num: usize, start_ms: u64, end_ms: u64, lines: Vec<&'a str> },
}

/// Collection of subtitle entries with metadata
#[derive(Debug, Clone)]
pub struct SubtitleCollection {
    /// Source filename
    pub source_file: PathBuf,

    /// List of subtitle entries
    pub entries: Vec<SubtitleEntry>,
}

impl SubtitleCollection {
    pub fn new(source_file: PathBuf) -> Self {
        SubtitleCollection {
            source_file,
            entries: Vec::new(),
        }
    }

    /// Load and parse an SRT file
    pub fn from_srt_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read subtitle file: {}", path.display()))?;
        // Some editors write a byte order mark
        let content = content.trim_start_matches('\u{feff}');
        let entries = Self::parse_srt_string(content)
            .with_context(|| format!("Failed to parse subtitle file: {}", path.display()))?;

        Ok(SubtitleCollection {
            source_file: path.to_path_buf(),
            entries,
        })
    }

    /// Write subtitles to an SRT file
    pub fn write_to_srt<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let file = File::create(path)
            .with_context(|| format!("Failed to create subtitle file: {}", path.display()))?;
        let mut writer = BufWriter::new(file);

        for entry in &self.entries {
            write!(writer, "{}", entry)?;
        }
        writer.flush()?;

        Ok(())
    }

    /// Entries lying strictly inside `range`, in their original order.
    ///
    /// An entry touching or crossing either boundary is dropped, not clipped.
    pub fn slice(&self, range: &TimeRange) -> Self {
        let entries = self.entries.iter()
            .filter(|entry| range.strictly_contains(entry.start_time_ms, entry.end_time_ms))
            .cloned()
            .collect();

        SubtitleCollection {
            source_file: self.source_file.clone(),
            entries,
        }
    }

    /// Move every entry back by `offset_ms`
    pub fn shift_back(&mut self, offset_ms: u64) {
        for entry in &mut self.entries {
            entry.shift_back(offset_ms);
        }
    }

    /// Number entries from 1 in their current order
    pub fn renumber(&mut self) {
        for (i, entry) in self.entries.iter_mut().enumerate() {
            entry.seq_num = i + 1;
        }
    }

    /// Parse SRT format string into subtitle entries.
    ///
    /// A blank line after a timestamp always closes the entry, so cues with
    /// no text are kept. Text lines lose trailing whitespace only. Blank
    /// content yields no entries; content with text but no usable entry is
    /// an error.
    pub fn parse_srt_string(content: &str) -> Result<Vec<SubtitleEntry>> {
        let mut entries = Vec::new();
        let mut state = SrtBlock::Index;

        for (line_idx, raw_line) in content.lines().enumerate() {
            let line_count = line_idx + 1;
            let line = raw_line.trim_end();

            state = match state {
                SrtBlock::Index => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        SrtBlock::Index
                    } else if let Ok(seq_num) = trimmed.parse::<usize>() {
                        SrtBlock::Timing { seq_num }
                    } else if let Some((start_ms, end_ms)) = Self::parse_timing_line(trimmed, line_count) {
                        // Missing sequence number, renumbered later anyway
                        SrtBlock::Text { seq_num: entries.len() + 1, start_ms, end_ms, lines: Vec::new() }
                    } else {
                        warn!("Unexpected text at line {} before sequence number or timestamp: {}", line_count, trimmed);
                        SrtBlock::Index
                    }
                }
                SrtBlock::Timing { seq_num } => {
                    match Self::parse_timing_line(line.trim(), line_count) {
                        Some((start_ms, end_ms)) => SrtBlock::Text { seq_num, start_ms, end_ms, lines: Vec::new() },
                        None => {
                            warn!("Skipping subtitle entry {}: no timestamp at line {}", seq_num, line_count);
                            SrtBlock::Index
                        }
                    }
                }
                SrtBlock::Text { seq_num, start_ms, end_ms, mut lines } => {
                    if line.trim().is_empty() {
                        Self::push_entry(&mut entries, seq_num, start_ms, end_ms, &lines);
                        SrtBlock::Index
                    } else {
                        lines.push(line);
                        SrtBlock::Text { seq_num, start_ms, end_ms, lines }
                    }
                }
            };
        }

        if let SrtBlock::Text { seq_num, start_ms, end_ms, lines } = state {
            Self::push_entry(&mut entries, seq_num, start_ms, end_ms, &lines);
        }

        if entries.is_empty() && !content.trim().is_empty() {
            return Err(anyhow!("No valid subtitle entries were found in the SRT content"));
        }

        Ok(entries)
    }

    fn push_entry(entries: &mut Vec<SubtitleEntry>, seq_num: usize, start_ms: u64, end_ms: u64, lines: &[&str]) {
        match SubtitleEntry::new_validated(seq_num, start_ms, end_ms, lines.join("\n")) {
            Ok(entry) => entries.push(entry),
            Err(e) => warn!("Skipping invalid subtitle entry {}: {}", seq_num, e),
        }
    }

    fn parse_timing_line(line: &str, line_count: usize) -> Option<(u64, u64)> {
        let caps = TIMESTAMP_REGEX.captures(line)?;
        match (Self::parse_timestamp_to_ms(&caps, 1), Self::parse_timestamp_to_ms(&caps, 5)) {
            (Ok(start_ms), Ok(end_ms)) => Some((start_ms, end_ms)),
            _ => {
                warn!("Invalid timestamp format at line {}: {}", line_count, line);
                None
            }
        }
    }

    fn parse_timestamp_to_ms(caps: &regex::Captures, start_idx: usize) -> Result<u64> {
        let field = |offset: usize| -> Result<u64> {
            caps.get(start_idx + offset)
                .ok_or_else(|| anyhow!("Missing timestamp component"))?
                .as_str()
                .parse::<u64>()
                .context("Failed to parse timestamp component")
        };
        let (hours, minutes, seconds, millis) = (field(0)?, field(1)?, field(2)?, field(3)?);
        if minutes >= 60 || seconds >= 60 {
            return Err(anyhow!("Invalid time components in timestamp"));
        }

        Ok((hours * 3600 + minutes * 60 + seconds) * 1000 + millis)
    }
}

impl fmt::Display for SubtitleCollection {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Subtitle Collection")?;
        writeln!(f, "Source: {:?}", self.source_file)?;
        writeln!(f, "Entries: {}", self.entries.len())?;
        Ok(())
    }
}

/// Cuts a subtitle file down to the window of a trimmed video
pub struct SubtitleTrimmer {
    shift_ms: u64,
}

impl Default for SubtitleTrimmer {
    fn default() -> Self {
        Self { shift_ms: SUBTITLE_SHIFT_MS }
    }
}

impl SubtitleTrimmer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Slice, shift and renumber an in-memory collection
    pub fn trim(&self, collection: &SubtitleCollection, range: &TimeRange) -> SubtitleCollection {
        let mut part = collection.slice(range);
        part.shift_back(self.shift_ms);
        part.renumber();
        debug!(
            "Kept {} of {} subtitle entries between {} and {}",
            part.entries.len(), collection.entries.len(), range.start, range.stop
        );
        part
    }

    /// Trim `input` into `output`.
    ///
    /// Returns `Ok(None)` without touching anything when `input` is not an
    /// existing file.
    pub fn trim_file<P1: AsRef<Path>, P2: AsRef<Path>>(
        &self,
        input: P1,
        output: P2,
        range: &TimeRange,
    ) -> Result<Option<PathBuf>> {
        let input = input.as_ref();
        let output = output.as_ref();

        if !input.is_file() {
            debug!("No subtitle file at {:?}, skipping", input);
            return Ok(None);
        }

        let collection = SubtitleCollection::from_srt_file(input)?;
        let part = self.trim(&collection, range);
        part.write_to_srt(output)?;

        info!("Subtitles written: {:?} ({} entries)", output, part.entries.len());
        Ok(Some(output.to_path_buf()))
    }
}
