use anyhow::{anyhow, Result};
use log::debug;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::command_builder::ToolLocator;
use crate::errors::TrimError;

// @module: File and directory utilities

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_file()
    }

    // @generates: Output path carrying the extension of `source`
    // @params: output_base, source
    //
    // The extension is appended, not substituted, unless the base already
    // ends with it.
    pub fn output_path_for<P1: AsRef<Path>, P2: AsRef<Path>>(output_base: P1, source: P2) -> PathBuf {
        let output_base = output_base.as_ref();
        let Some(ext) = source.as_ref().extension() else {
            return output_base.to_path_buf();
        };

        let already_there = output_base.extension()
            .is_some_and(|current| current.to_string_lossy().eq_ignore_ascii_case(&ext.to_string_lossy()));
        if already_there {
            return output_base.to_path_buf();
        }

        let mut name: OsString = output_base.as_os_str().to_owned();
        name.push(".");
        name.push(ext);
        PathBuf::from(name)
    }

    /// Whether two paths name the same file once links and `..` are resolved.
    ///
    /// A path that does not exist yet is resolved through its parent.
    pub fn same_file<P1: AsRef<Path>, P2: AsRef<Path>>(a: P1, b: P2) -> bool {
        let (a, b) = (a.as_ref(), b.as_ref());
        match (Self::resolve(a), Self::resolve(b)) {
            (Some(a), Some(b)) => a == b,
            _ => a == b,
        }
    }

    fn resolve(path: &Path) -> Option<PathBuf> {
        if let Ok(resolved) = fs::canonicalize(path) {
            return Some(resolved);
        }
        let name = path.file_name()?;
        let parent = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
        fs::canonicalize(parent).ok().map(|dir| dir.join(name))
    }

    /// Delete a file that is about to be overwritten
    pub fn remove_existing<P: AsRef<Path>>(path: P) -> Result<(), TrimError> {
        let path = path.as_ref();
        fs::remove_file(path).map_err(|source| TrimError::FileRemoval {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("Removed existing output {:?}", path);
        Ok(())
    }
}

/// Hands a produced file to the desktop
pub trait FileOpener: Send + Sync {
    fn open(&self, path: &Path) -> Result<()>;
}

/// Platform "open with default application" utility found on PATH
pub struct SystemOpener {
    program: PathBuf,
}

impl SystemOpener {
    /// First available opener, `None` when the platform has none installed
    pub fn locate(candidates: &[String], locator: &ToolLocator) -> Option<Self> {
        locator.resolve_first(candidates).ok().map(|program| Self { program })
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl FileOpener for SystemOpener {
    fn open(&self, path: &Path) -> Result<()> {
        let mut command = Command::new(&self.program);
        // gio needs its sub-command
        if self.program.file_stem().is_some_and(|stem| stem == "gio") {
            command.arg("open");
        }

        // Not waited for: the viewer outlives us
        command.arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| anyhow!("Failed to launch {:?}: {}", self.program, e))?;

        debug!("Opened {:?} with {:?}", path, self.program);
        Ok(())
    }
}
