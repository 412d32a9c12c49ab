/*!
 * # QuickCut - cut a video and its subtitles to a time range
 *
 * A Rust library for trimming a video file without re-encoding, delegating
 * the media work to an external tool (`ffmpeg` or `avconv`), and re-timing
 * the matching SubRip subtitle file to the kept window.
 *
 * ## Features
 *
 * - Free-form time entries (`130`, `5:30`, `12:30:45`) with live validity
 * - Stream-copy cuts: seek, duration, copy video and audio as-is
 * - Subtitle slicing with strict boundaries, a fixed 2 second shift and
 *   renumbering
 * - Overwrite confirmation, bounded and cancellable tool runs
 * - Optional hand-off of the result to the desktop's default player
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management and session state
 * - `time_field`: Time entry parsing, validation and duration arithmetic
 * - `form`: Validated fields, path pickers and the trim form
 * - `command_builder`: Media tool arguments and executable lookup
 * - `transcoder`: Asynchronous execution of the media tool
 * - `subtitle_processor`: SubRip parsing, slicing and re-timing
 * - `file_utils`: File system operations and the platform opener
 * - `app_controller`: The cut workflow
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod time_field;
pub mod form;
pub mod command_builder;
pub mod transcoder;
pub mod subtitle_processor;
pub mod file_utils;
pub mod app_controller;
pub mod errors;

// Re-export main types for easier usage
pub use app_config::Config;
pub use app_controller::{Controller, TrimOutcome, TrimRequest};
pub use errors::TrimError;
pub use subtitle_processor::{SubtitleCollection, SubtitleEntry, SubtitleTrimmer};
pub use time_field::{TimeOfDay, TimeRange};
