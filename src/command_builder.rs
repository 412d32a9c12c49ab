use log::debug;
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::errors::TrimError;
use crate::time_field::TimeRange;

// @module: Media tool invocation

/// A fully resolved media tool invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrimCommand {
    pub program: PathBuf,
    pub args: Vec<OsString>,
}

impl TrimCommand {
    /// Stream-copy `input` into `output`, keeping only `range`.
    ///
    /// Fails before building anything when the range is empty or reversed.
    pub fn build<P1: AsRef<Path>, P2: AsRef<Path>>(
        program: PathBuf,
        input: P1,
        output: P2,
        range: &TimeRange,
    ) -> Result<Self, TrimError> {
        let duration = range.duration_string()?;

        let args: Vec<OsString> = vec![
            "-nostdin".into(),
            "-noaccurate_seek".into(),
            "-ss".into(),
            range.start.to_string().into(),
            "-t".into(),
            duration.into(),
            "-i".into(),
            input.as_ref().as_os_str().to_owned(),
            "-vcodec".into(),
            "copy".into(),
            "-acodec".into(),
            "copy".into(),
            output.as_ref().as_os_str().to_owned(),
        ];

        Ok(Self { program, args })
    }
}

impl fmt::Display for TrimCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Finds executables on the search path
#[derive(Debug, Clone, Default)]
pub struct ToolLocator {
    // @field: Explicit `PATH`-style list, `None` searches the process `PATH`
    search_path: Option<OsString>,
}

impl ToolLocator {
    /// Search the directories of the `PATH` environment variable
    pub fn from_env() -> Self {
        Self { search_path: None }
    }

    /// Search an explicit `PATH`-style list of directories
    pub fn with_search_path<S: Into<OsString>>(search_path: S) -> Self {
        Self { search_path: Some(search_path.into()) }
    }

    /// Full path of `name`, if some search directory holds an executable by that name
    pub fn which(&self, name: &str) -> Option<PathBuf> {
        let found = match &self.search_path {
            None => which::which(name),
            Some(paths) => {
                let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
                which::which_in(name, Some(paths), cwd)
            }
        };

        match found {
            Ok(path) => Some(path),
            Err(e) => {
                debug!("{} not found: {}", name, e);
                None
            }
        }
    }

    /// First candidate found, in the given order
    pub fn resolve_first(&self, candidates: &[String]) -> Result<PathBuf, TrimError> {
        candidates.iter()
            .filter(|name| !name.trim().is_empty())
            .find_map(|name| self.which(name))
            .ok_or_else(|| TrimError::ToolNotFound(candidates.to_vec()))
    }
}
