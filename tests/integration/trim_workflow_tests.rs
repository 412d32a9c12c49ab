/*!
 * Integration tests for the cut workflow against a scripted media tool
 */

use anyhow::Result;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use quickcut::app_config::Config;
use quickcut::app_controller::{AssumeYes, Controller, TrimOutcome, TrimRequest};
use quickcut::errors::TrimError;
use quickcut::time_field::{TimeOfDay, TimeRange};
use crate::common;
use crate::common::mock_tools::{MockRunner, RecordingOpener, ScriptedPrompter};

fn quiet_config() -> Config {
    let mut config = Config::default();
    config.open_result = false;
    config
}

fn request(dir: &Path, start: &str, stop: &str) -> Result<TrimRequest> {
    let video = common::create_test_file(dir, "movie.mp4", "source video")?;
    let subtitles = common::create_test_subtitle(dir, "movie.srt")?;
    Ok(TrimRequest {
        input_video_path: video,
        input_subtitle_path: Some(subtitles),
        output_base_path: dir.join("clip"),
        range: TimeRange::new(TimeOfDay::parse(start)?, TimeOfDay::parse(stop)?),
    })
}

/// Test a successful cut produces both outputs
#[tokio::test]
async fn test_run_withWorkingTool_shouldCutVideoAndSubtitles() -> Result<()> {
    common::init_logging();
    let temp_dir = common::create_temp_dir()?;
    let request = request(temp_dir.path(), "10", "20")?;
    let runner = Arc::new(MockRunner::succeeding());

    let controller = Controller::new(quiet_config(), runner.clone(), Box::new(AssumeYes));
    let outcome = controller.run(&request).await?;

    let video = temp_dir.path().join("clip.mp4");
    let subtitles = temp_dir.path().join("clip.srt");
    assert_eq!(outcome, TrimOutcome::Done { video: video.clone(), subtitles: Some(subtitles.clone()) });
    assert_eq!(runner.call_count(), 1);

    let command = runner.calls.lock().unwrap()[0].clone();
    let args: Vec<String> = command.args.iter().map(|a| a.to_string_lossy().into_owned()).collect();
    assert_eq!(&args[2..6], ["-ss", "00:00:10", "-t", "00:00:10"]);
    assert_eq!(args.last(), Some(&video.to_string_lossy().into_owned()));

    let content = fs::read_to_string(&subtitles)?;
    assert!(content.starts_with("1\n00:00:10,000 --> 00:00:12,500\n"));
    assert!(content.contains("2\n00:00:13,000 --> 00:00:17,000\n"));
    Ok(())
}

/// Test declining the overwrite leaves everything alone
#[tokio::test]
async fn test_run_withDeclinedOverwrite_shouldNotRunTool() -> Result<()> {
    common::init_logging();
    let temp_dir = common::create_temp_dir()?;
    let request = request(temp_dir.path(), "10", "20")?;
    let existing = common::create_test_file(temp_dir.path(), "clip.mp4", "keep me")?;
    let runner = Arc::new(MockRunner::succeeding());
    let prompter = ScriptedPrompter::answering(false);
    let asked = prompter.asked.clone();

    let controller = Controller::new(quiet_config(), runner.clone(), Box::new(prompter));
    let outcome = controller.run(&request).await?;

    assert_eq!(outcome, TrimOutcome::Declined);
    assert_eq!(*asked.lock().unwrap(), vec![existing.clone()]);
    assert_eq!(runner.call_count(), 0);
    assert_eq!(fs::read_to_string(&existing)?, "keep me");
    assert!(!temp_dir.path().join("clip.srt").exists());
    Ok(())
}

/// Test accepting the overwrite replaces the old output
#[tokio::test]
async fn test_run_withAcceptedOverwrite_shouldReplaceOutput() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let request = request(temp_dir.path(), "10", "20")?;
    let existing = common::create_test_file(temp_dir.path(), "clip.mp4", "old cut")?;
    let runner = Arc::new(MockRunner::succeeding());

    let controller = Controller::new(quiet_config(), runner.clone(), Box::new(ScriptedPrompter::answering(true)));
    controller.run(&request).await?;

    assert_eq!(runner.call_count(), 1);
    assert_eq!(fs::read_to_string(&existing)?, "cut video");
    Ok(())
}

/// Test a failing tool reports its output and skips the subtitles
#[tokio::test]
async fn test_run_withFailingTool_shouldReportAndSkipSubtitles() -> Result<()> {
    common::init_logging();
    let temp_dir = common::create_temp_dir()?;
    let request = request(temp_dir.path(), "10", "20")?;
    let runner = Arc::new(MockRunner::failing(1));
    let opener = RecordingOpener::default();
    let opened = opener.opened.clone();

    let controller = Controller::new(Config::default(), runner.clone(), Box::new(AssumeYes))
        .with_opener(Some(Box::new(opener)));
    let result = controller.run(&request).await;

    match result {
        Err(TrimError::TranscodeFailure { code, stdout, stderr }) => {
            assert_eq!(code, 1);
            assert_eq!(stdout, "progress");
            assert_eq!(stderr, "Invalid data found");
        }
        other => panic!("expected a transcode failure, got {:?}", other),
    }
    assert!(!temp_dir.path().join("clip.srt").exists());
    assert!(opened.lock().unwrap().is_empty());
    Ok(())
}

/// Test a reversed range fails before any tool runs
#[tokio::test]
async fn test_run_withStopBeforeStart_shouldNotRunTool() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let request = request(temp_dir.path(), "20", "10")?;
    let existing = common::create_test_file(temp_dir.path(), "clip.mp4", "keep me")?;
    let runner = Arc::new(MockRunner::succeeding());
    let prompter = ScriptedPrompter::answering(true);
    let asked = prompter.asked.clone();

    let controller = Controller::new(quiet_config(), runner.clone(), Box::new(prompter));
    let result = controller.run(&request).await;

    assert!(matches!(result, Err(TrimError::NegativeDuration { .. })));
    assert_eq!(runner.call_count(), 0);
    assert!(asked.lock().unwrap().is_empty());
    assert_eq!(fs::read_to_string(&existing)?, "keep me");
    Ok(())
}

/// Test a missing tool is reported before the old output is deleted
#[tokio::test]
async fn test_run_withoutTool_shouldKeepExistingOutput() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let request = request(temp_dir.path(), "10", "20")?;
    let existing = common::create_test_file(temp_dir.path(), "clip.mp4", "keep me")?;
    let runner = Arc::new(MockRunner::not_installed());

    let controller = Controller::new(quiet_config(), runner.clone(), Box::new(AssumeYes));
    let result = controller.run(&request).await;

    assert!(matches!(result, Err(TrimError::ToolNotFound(_))));
    assert!(existing.exists());
    Ok(())
}

/// Test a missing input video is reported
#[test]
fn test_run_withMissingVideo_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let mut request = request(temp_dir.path(), "10", "20")?;
    request.input_video_path = temp_dir.path().join("gone.mp4");
    let runner = Arc::new(MockRunner::succeeding());

    let controller = Controller::new(quiet_config(), runner.clone(), Box::new(AssumeYes));
    let result = tokio_test::block_on(async { controller.run(&request).await });

    assert!(matches!(result, Err(TrimError::InputNotFound(_))));
    assert_eq!(runner.call_count(), 0);
    Ok(())
}

/// Test a missing subtitle file is skipped silently
#[tokio::test]
async fn test_run_withoutSubtitleFile_shouldCutVideoOnly() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let mut request = request(temp_dir.path(), "10", "20")?;
    fs::remove_file(temp_dir.path().join("movie.srt"))?;
    request.input_subtitle_path = Some(temp_dir.path().join("movie.srt"));

    let controller = Controller::new(quiet_config(), Arc::new(MockRunner::succeeding()), Box::new(AssumeYes));
    let outcome = controller.run(&request).await?;

    assert_eq!(
        outcome,
        TrimOutcome::Done { video: temp_dir.path().join("clip.mp4"), subtitles: None }
    );
    assert!(!temp_dir.path().join("clip.srt").exists());
    Ok(())
}

/// Test a broken subtitle file is reported after the video was cut
#[tokio::test]
async fn test_run_withUnreadableSubtitles_shouldReportSubtitleError() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let mut request = request(temp_dir.path(), "10", "20")?;
    let broken = common::create_test_file(temp_dir.path(), "broken.srt", "no entries here")?;
    request.input_subtitle_path = Some(broken);

    let controller = Controller::new(quiet_config(), Arc::new(MockRunner::succeeding()), Box::new(AssumeYes));
    let result = controller.run(&request).await;

    assert!(matches!(result, Err(TrimError::Subtitle(_))));
    assert!(temp_dir.path().join("clip.mp4").exists());
    Ok(())
}

/// Test the produced video is handed to the opener when enabled
#[tokio::test]
async fn test_run_withOpenResult_shouldOpenVideo() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let request = request(temp_dir.path(), "10", "20")?;
    let opener = RecordingOpener::default();
    let opened = opener.opened.clone();

    let controller = Controller::new(Config::default(), Arc::new(MockRunner::succeeding()), Box::new(AssumeYes))
        .with_opener(Some(Box::new(opener)));
    controller.run(&request).await?;

    assert_eq!(*opened.lock().unwrap(), vec![temp_dir.path().join("clip.mp4")]);
    Ok(())
}

/// Test an output naming the source video is refused before anything is touched
#[tokio::test]
async fn test_run_withOutputOverInput_shouldRefuseAndKeepSource() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let mut request = request(temp_dir.path(), "10", "20")?;
    fs::write(&request.input_video_path, "ORIGINAL SOURCE")?;
    let runner = Arc::new(MockRunner::succeeding());

    for base in ["movie", "movie.mp4"] {
        request.output_base_path = temp_dir.path().join(base);
        let controller = Controller::new(quiet_config(), runner.clone(), Box::new(AssumeYes));

        let result = controller.run(&request).await;

        assert!(matches!(result, Err(TrimError::OutputIsInput(_))), "base {:?}", base);
    }
    assert_eq!(runner.call_count(), 0);
    assert_eq!(fs::read_to_string(&request.input_video_path)?, "ORIGINAL SOURCE");
    Ok(())
}

/// Test an output naming the source subtitles is refused too
#[tokio::test]
async fn test_run_withSubtitleOutputOverInput_shouldRefuse() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let mut request = request(temp_dir.path(), "10", "20")?;
    let subtitles = common::create_test_subtitle(temp_dir.path(), "clip.srt")?;
    request.input_subtitle_path = Some(subtitles.clone());
    let runner = Arc::new(MockRunner::succeeding());

    let controller = Controller::new(quiet_config(), runner.clone(), Box::new(AssumeYes));
    let result = controller.run(&request).await;

    assert!(matches!(result, Err(TrimError::OutputIsInput(path)) if path == subtitles));
    assert_eq!(runner.call_count(), 0);
    assert_eq!(fs::read_to_string(&subtitles)?, common::SAMPLE_SRT);
    Ok(())
}

/// Test a cancel requested during the prompt keeps the existing output
#[tokio::test]
async fn test_run_cancelledBeforeOverwrite_shouldKeepExistingOutput() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let request = request(temp_dir.path(), "10", "20")?;
    let existing = common::create_test_file(temp_dir.path(), "clip.mp4", "keep me")?;
    let runner = Arc::new(MockRunner::cancelled());

    let controller = Controller::new(quiet_config(), runner.clone(), Box::new(ScriptedPrompter::answering(true)));
    let result = controller.run(&request).await;

    assert!(matches!(result, Err(TrimError::Cancelled)));
    assert_eq!(runner.call_count(), 0);
    assert_eq!(fs::read_to_string(&existing)?, "keep me");
    Ok(())
}

/// Test an output that cannot be deleted stops the run before the tool starts
#[tokio::test]
async fn test_run_withUndeletableOutput_shouldReportRemovalError() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let request = request(temp_dir.path(), "10", "20")?;
    let blocker = temp_dir.path().join("clip.mp4");
    fs::create_dir(&blocker)?;
    let runner = Arc::new(MockRunner::succeeding());

    let controller = Controller::new(quiet_config(), runner.clone(), Box::new(AssumeYes));
    let result = controller.run(&request).await;

    match result {
        Err(TrimError::FileRemoval { path, .. }) => assert_eq!(path, blocker),
        other => panic!("expected a removal error, got {:?}", other),
    }
    assert_eq!(runner.call_count(), 0);
    assert!(blocker.is_dir());
    assert!(!temp_dir.path().join("clip.srt").exists());
    Ok(())
}
