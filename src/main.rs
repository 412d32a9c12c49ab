// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{anyhow, Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info, warn, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use quickcut::app_config::{Config, LogLevel};
use quickcut::app_controller::{AssumeYes, Controller, Prompter, TerminalPrompter, TrimOutcome};
use quickcut::command_builder::ToolLocator;
use quickcut::file_utils::{FileOpener, SystemOpener};
use quickcut::form::{TrimForm, Validator};
use quickcut::time_field::{canonical, TimeValidator};
use quickcut::transcoder::{LineObserver, ProcessRunner};

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => LogLevel::Error,
            CliLogLevel::Warn => LogLevel::Warn,
            CliLogLevel::Info => LogLevel::Info,
            CliLogLevel::Debug => LogLevel::Debug,
            CliLogLevel::Trace => LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Cut a video and its subtitles (default command)
    Trim(TrimArgs),

    /// Report how time entries are understood
    Check {
        /// Entries such as 130, 5:30 or 12:30:45
        #[arg(value_name = "TIME", required = true)]
        times: Vec<String>,
    },

    /// Generate shell completions for quickcut
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug)]
struct TrimArgs {
    /// Video file to cut
    #[arg(value_name = "VIDEO")]
    input_path: PathBuf,

    /// Start time (HHMMSS, colons optional)
    #[arg(value_name = "START")]
    start: String,

    /// Stop time (HHMMSS, colons optional)
    #[arg(value_name = "STOP")]
    stop: String,

    /// Output file name; the input's extension is appended
    #[arg(short, long, value_name = "OUTPUT")]
    output: PathBuf,

    /// Subtitle file (default: the video's name with .srt)
    #[arg(short, long, conflicts_with = "no_subtitles")]
    subtitles: Option<PathBuf>,

    /// Do not cut any subtitle file
    #[arg(long)]
    no_subtitles: bool,

    /// Overwrite an existing output without asking
    #[arg(short, long)]
    force_overwrite: bool,

    /// Do not open the result when done
    #[arg(long)]
    no_open: bool,

    /// Kill the media tool after this many seconds (0 = never)
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Configuration file path
    #[arg(short, long)]
    config_path: Option<PathBuf>,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

/// QuickCut - cut a video and its subtitles without re-encoding
#[derive(Parser, Debug)]
#[command(name = "quickcut")]
#[command(version)]
#[command(about = "Cut a video and its subtitles to a time range")]
#[command(long_about = "QuickCut trims a video with ffmpeg (or avconv) using stream copy, and cuts the matching SubRip subtitles to the same window.

EXAMPLES:
    quickcut movie.mp4 5:30 1:02:00 -o clip      # Writes clip.mp4 and clip.srt
    quickcut movie.mkv 130 500 -o clip -f        # Overwrite clip.mkv if present
    quickcut movie.mp4 0 10:00 -o clip --no-open # Do not open the result
    quickcut check 130 5:30 12:3                 # Show how entries are read
    quickcut completions bash > quickcut.bash    # Generate bash completions

CONFIGURATION:
    Configuration is stored in <config dir>/quickcut/config.json by default.
    A default one is created when missing.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Video file to cut
    #[arg(value_name = "VIDEO")]
    input_path: Option<PathBuf>,

    /// Start time (HHMMSS, colons optional)
    #[arg(value_name = "START")]
    start: Option<String>,

    /// Stop time (HHMMSS, colons optional)
    #[arg(value_name = "STOP")]
    stop: Option<String>,

    /// Output file name; the input's extension is appended
    #[arg(short, long, value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Subtitle file (default: the video's name with .srt)
    #[arg(short, long, conflicts_with = "no_subtitles")]
    subtitles: Option<PathBuf>,

    /// Do not cut any subtitle file
    #[arg(long)]
    no_subtitles: bool,

    /// Overwrite an existing output without asking
    #[arg(short, long)]
    force_overwrite: bool,

    /// Do not open the result when done
    #[arg(long)]
    no_open: bool,

    /// Kill the media tool after this many seconds (0 = never)
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Configuration file path
    #[arg(short, long)]
    config_path: Option<PathBuf>,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

// @struct: Custom logger implementation, filtered by `log::max_level` alone
// so the level can change after the config is read
struct CustomLogger;

impl CustomLogger {
    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        log::set_boxed_logger(Box::new(CustomLogger))?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI colour for log level
    fn color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "{}{} {:<5} {}\x1B[0m",
                Self::color_for_level(record.level()), now, record.level(), record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

// Keeps the spinner off the line while the question is asked; the stdin
// read blocks, so the worker thread is handed over to it
struct SpinnerPrompter {
    spinner: ProgressBar,
}

impl Prompter for SpinnerPrompter {
    fn confirm_overwrite(&self, path: &std::path::Path) -> bool {
        tokio::task::block_in_place(|| self.spinner.suspend(|| TerminalPrompter.confirm_overwrite(path)))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();

    match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "quickcut", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::Check { times }) => {
            check_times(&times);
            Ok(())
        }
        Some(Commands::Trim(args)) => run_trim(args).await,
        None => {
            // Top-level arguments behave like `trim`
            let (Some(input_path), Some(start), Some(stop)) = (cli.input_path, cli.start, cli.stop) else {
                return Err(anyhow!("VIDEO, START and STOP are required when no subcommand is specified"));
            };
            let output = cli.output.ok_or_else(|| anyhow!("--output is required"))?;

            run_trim(TrimArgs {
                input_path,
                start,
                stop,
                output,
                subtitles: cli.subtitles,
                no_subtitles: cli.no_subtitles,
                force_overwrite: cli.force_overwrite,
                no_open: cli.no_open,
                timeout: cli.timeout,
                config_path: cli.config_path,
                log_level: cli.log_level,
            })
            .await
        }
    }
}

fn check_times(times: &[String]) {
    for text in times {
        let validity = TimeValidator.validate(text);
        let reading = canonical(text).unwrap_or_else(|| "--:--:--".to_string());
        println!("{}{:<10} {:<10} {}\x1B[0m", validity.ansi(), text, validity.label(), reading);
    }
}

async fn run_trim(options: TrimArgs) -> Result<()> {
    if let Some(cmd_log_level) = &options.log_level {
        let level: LogLevel = cmd_log_level.clone().into();
        log::set_max_level(level.to_level_filter());
    }

    let config_path = options.config_path.clone().unwrap_or_else(Config::default_path);
    let mut config = Config::load_or_create(&config_path)?;

    if let Some(timeout) = options.timeout {
        config.tool.timeout_secs = timeout;
    }
    if options.no_open {
        config.open_result = false;
    }
    if let Some(log_level) = &options.log_level {
        config.log_level = log_level.clone().into();
    } else {
        log::set_max_level(config.log_level.to_level_filter());
    }

    config.validate().context("Configuration validation failed")?;

    // Fill the form the way a user would; command line paths are relative
    // to the working directory, not to the remembered one
    let cwd = std::env::current_dir().context("Failed to read the working directory")?;
    let mut session = config.session.clone();
    let mut form = TrimForm::new();
    form.pick_video(cwd.join(&options.input_path), &mut session);
    if let Some(subtitles) = &options.subtitles {
        form.subtitles.pick(cwd.join(subtitles), &mut session);
    }
    if options.no_subtitles {
        form.subtitles.set_text("");
    }
    form.output.pick(cwd.join(&options.output), &mut session);
    form.start.set_text(&options.start);
    form.start.finish_editing();
    form.stop.set_text(&options.stop);
    form.stop.finish_editing();

    for (name, field) in [("start", &form.start), ("stop", &form.stop)] {
        debug!("{} {:?} is {}", name, field.text(), field.validity().label());
    }

    let request = form.submit()?;

    let spinner = ProgressBar::new_spinner();
    let style = ProgressStyle::default_spinner()
        .template("{spinner} [{elapsed_precise}] {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    spinner.set_style(style);
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner.set_message("Cutting");
    let progress = spinner.clone();
    let observer: LineObserver = Arc::new(move |line: &str| {
        if !line.is_empty() {
            progress.set_message(line.to_string());
        }
    });

    let runner = ProcessRunner::new(config.tool.candidates.clone(), config.tool.timeout())
        .with_ctrl_c(true)
        .with_line_observer(observer);

    let prompter: Box<dyn Prompter> = if options.force_overwrite {
        Box::new(AssumeYes)
    } else {
        Box::new(SpinnerPrompter { spinner: spinner.clone() })
    };

    let opener = SystemOpener::locate(&config.opener_candidates, &ToolLocator::from_env())
        .map(|opener| Box::new(opener) as Box<dyn FileOpener>);

    let controller = Controller::new(config.clone(), Arc::new(runner), prompter).with_opener(opener);
    let result = controller.run(&request).await;
    spinner.finish_and_clear();

    match result {
        Ok(TrimOutcome::Declined) => {
            info!("Nothing done");
        }
        Ok(TrimOutcome::Done { subtitles, .. }) => {
            if let Some(subtitles) = subtitles {
                info!("Subtitles: {}", subtitles.display());
            }
            config.session = session;
            if let Err(e) = config.save(&config_path) {
                warn!("Could not save session to {}: {}", config_path.display(), e);
            }
        }
        Err(e) => {
            // Already reported by the controller
            debug!("Cut failed: {:?}", e);
            std::process::exit(1);
        }
    }

    Ok(())
}
