/*!
 * Error types for the quickcut application.
 *
 * Every failure the trim workflow can surface to the user is a variant of
 * [`TrimError`], using the thiserror crate for ergonomic error definitions.
 */

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while validating, cutting or re-timing
#[derive(Error, Debug)]
pub enum TrimError {
    /// A time entry does not match the accepted pattern or is not ready yet
    #[error("Invalid time format for {field}: '{text}'")]
    InvalidFormat {
        /// Which field was rejected (e.g. "start")
        field: String,
        /// Raw text of the field
        text: String,
    },

    /// The stop time precedes the start time
    #[error("Stop time {stop} is before start time {start}")]
    NegativeDuration { start: String, stop: String },

    /// Start and stop are the same instant
    #[error("Start and stop are both {0}, nothing to cut")]
    EmptyRange(String),

    /// The pre-existing output file could not be deleted
    #[error("Cannot write {path:?}, system returned {source}. Change output file name and retry")]
    FileRemoval {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The external encoder exited with a non-zero status
    #[error("Error {code} occurred during video cut:\n\n{stdout}\n\n{separator}\n\n{stderr}", separator = "*".repeat(99))]
    TranscodeFailure {
        /// Exit code, -1 when the process was terminated by a signal
        code: i32,
        stdout: String,
        stderr: String,
    },

    /// None of the candidate executables is on the search path
    #[error("No media tool found on PATH (tried: {})", .0.join(", "))]
    ToolNotFound(Vec<String>),

    /// The input video does not exist
    #[error("Input file does not exist: {0:?}")]
    InputNotFound(PathBuf),

    /// The computed output path is one of the input files
    #[error("Output {0:?} is also an input file. Change output file name and retry")]
    OutputIsInput(PathBuf),

    /// No output file name was given
    #[error("No output file name given")]
    MissingOutput,

    /// The encoder could not be started
    #[error("Failed to start {program:?}: {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The encoder ran past the configured timeout and was killed
    #[error("Media tool timed out after {0} seconds")]
    Timeout(u64),

    /// The user cancelled the running encoder
    #[error("Cut cancelled")]
    Cancelled,

    /// Reading or writing the subtitle file failed
    #[error("Subtitle error: {0}")]
    Subtitle(String),
}

impl TrimError {
    /// Shorthand for an [`TrimError::InvalidFormat`] on a named field
    pub fn invalid_format(field: &str, text: &str) -> Self {
        Self::InvalidFormat {
            field: field.to_string(),
            text: text.to_string(),
        }
    }
}
