use log::{debug, error, info, warn};
use std::fmt;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::app_config::Config;
use crate::command_builder::TrimCommand;
use crate::errors::TrimError;
use crate::file_utils::{FileManager, FileOpener};
use crate::subtitle_processor::SubtitleTrimmer;
use crate::time_field::TimeRange;
use crate::transcoder::ToolRunner;

// @module: Application controller for cutting a video and its subtitles

/// One cut, built fresh from the form for every action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrimRequest {
    pub input_video_path: PathBuf,
    pub input_subtitle_path: Option<PathBuf>,
    /// Output path without extension; the inputs' extensions are appended
    pub output_base_path: PathBuf,
    pub range: TimeRange,
}

/// Where a cut currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrimState {
    Idle,
    Validating,
    CollisionCheck,
    Transcoding,
    Success,
    SubtitleTrim,
    Done,
    Failed,
}

impl fmt::Display for TrimState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Validating => "validating",
            Self::CollisionCheck => "collision check",
            Self::Transcoding => "transcoding",
            Self::Success => "success",
            Self::SubtitleTrim => "subtitle trim",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

/// How a cut ended when it did not fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrimOutcome {
    /// The user kept the existing output; nothing ran
    Declined,
    /// The video was cut, subtitles too when an input was present
    Done {
        video: PathBuf,
        subtitles: Option<PathBuf>,
    },
}

/// Asks before an existing output is replaced
pub trait Prompter: Send + Sync {
    fn confirm_overwrite(&self, path: &Path) -> bool;
}

/// Answers yes without asking (`--force-overwrite`)
pub struct AssumeYes;

impl Prompter for AssumeYes {
    fn confirm_overwrite(&self, path: &Path) -> bool {
        debug!("Overwriting {:?} without asking", path);
        true
    }
}

/// Asks on the terminal; anything but "y"/"yes" declines
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn confirm_overwrite(&self, path: &Path) -> bool {
        let mut stderr = std::io::stderr();
        let _ = write!(stderr, "{} already exists\n\nDo you want to replace it? [y/N] ", path.display());
        let _ = stderr.flush();

        let mut answer = String::new();
        if std::io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
    }
}

/// Main application controller: the form's "do it" action
pub struct Controller {
    // @field: App configuration
    config: Config,
    runner: Arc<dyn ToolRunner>,
    prompter: Box<dyn Prompter>,
    opener: Option<Box<dyn FileOpener>>,
    trimmer: SubtitleTrimmer,
}

impl Controller {
    pub fn new(config: Config, runner: Arc<dyn ToolRunner>, prompter: Box<dyn Prompter>) -> Self {
        Self {
            config,
            runner,
            prompter,
            opener: None,
            trimmer: SubtitleTrimmer::new(),
        }
    }

    /// Opener for the produced video; only used when `open_result` is set
    pub fn with_opener(mut self, opener: Option<Box<dyn FileOpener>>) -> Self {
        self.opener = opener;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn enter(state: TrimState) {
        debug!("Cut state: {}", state);
    }

    /// Cut the video, then its subtitles
    pub async fn run(&self, request: &TrimRequest) -> Result<TrimOutcome, TrimError> {
        Self::enter(TrimState::Idle);
        let start_time = std::time::Instant::now();

        match self.run_states(request).await {
            Ok(outcome) => {
                if let TrimOutcome::Done { video, .. } = &outcome {
                    info!("Success: {} ({})", video.display(), Self::format_elapsed(start_time.elapsed()));
                }
                Ok(outcome)
            }
            Err(e) => {
                Self::enter(TrimState::Failed);
                error!("{}", e);
                Err(e)
            }
        }
    }

    async fn run_states(&self, request: &TrimRequest) -> Result<TrimOutcome, TrimError> {
        Self::enter(TrimState::Validating);
        if !FileManager::file_exists(&request.input_video_path) {
            return Err(TrimError::InputNotFound(request.input_video_path.clone()));
        }
        let video_out = FileManager::output_path_for(&request.output_base_path, &request.input_video_path);
        Self::ensure_not_input(&video_out, &request.input_video_path)?;
        if let Some(subtitle_in) = request.input_subtitle_path.as_ref() {
            let subtitle_out = FileManager::output_path_for(&request.output_base_path, subtitle_in);
            Self::ensure_not_input(&subtitle_out, subtitle_in)?;
        }
        let program = self.runner.program()?;
        let command = TrimCommand::build(program, &request.input_video_path, &video_out, &request.range)?;

        Self::enter(TrimState::CollisionCheck);
        if video_out.exists() {
            if !self.prompter.confirm_overwrite(&video_out) {
                info!("Keeping existing {}", video_out.display());
                Self::enter(TrimState::Idle);
                return Ok(TrimOutcome::Declined);
            }
            if self.runner.cancel_requested() {
                return Err(TrimError::Cancelled);
            }
            FileManager::remove_existing(&video_out)?;
        }

        Self::enter(TrimState::Transcoding);
        info!("Cutting {} from {} to {}", request.input_video_path.display(), request.range.start, request.range.stop);
        let output = self.runner.run(&command).await?;
        if !output.success() {
            return Err(TrimError::TranscodeFailure {
                code: output.status_code.unwrap_or(-1),
                stdout: output.stdout,
                stderr: output.stderr,
            });
        }

        Self::enter(TrimState::Success);
        Self::enter(TrimState::SubtitleTrim);
        let subtitles = self.cut_subtitles(request)?;

        if self.config.open_result {
            self.open_result(&video_out);
        }

        Self::enter(TrimState::Done);
        Ok(TrimOutcome::Done { video: video_out, subtitles })
    }

    fn ensure_not_input(output: &Path, input: &Path) -> Result<(), TrimError> {
        if FileManager::same_file(output, input) {
            return Err(TrimError::OutputIsInput(output.to_path_buf()));
        }
        Ok(())
    }

    fn cut_subtitles(&self, request: &TrimRequest) -> Result<Option<PathBuf>, TrimError> {
        let Some(input) = request.input_subtitle_path.as_ref() else {
            return Ok(None);
        };

        let output = FileManager::output_path_for(&request.output_base_path, input);
        self.trimmer.trim_file(input, &output, &request.range)
            .map_err(|e| TrimError::Subtitle(format!("{:#}", e)))
    }

    fn open_result(&self, video: &Path) {
        match &self.opener {
            Some(opener) => {
                if let Err(e) = opener.open(video) {
                    warn!("Could not open {}: {}", video.display(), e);
                }
            }
            None => debug!("No opener available, leaving {} closed", video.display()),
        }
    }

    // Format duration in a human-readable format
    fn format_elapsed(duration: std::time::Duration) -> String {
        let total_seconds = duration.as_secs();
        let minutes = total_seconds / 60;
        let seconds = total_seconds % 60;

        if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}
