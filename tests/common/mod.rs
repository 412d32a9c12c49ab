/*!
 * Common test utilities for the quickcut test suite
 */

use std::path::{Path, PathBuf};
use std::fs;
use anyhow::Result;
use tempfile::TempDir;


/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Creates an executable shell script, standing in for an installed tool
#[cfg(unix)]
pub fn create_test_executable(dir: &Path, filename: &str, body: &str) -> Result<PathBuf> {
    use std::os::unix::fs::PermissionsExt;

    let file_path = create_test_file(dir, filename, &format!("#!/bin/sh\n{}\n", body))?;
    fs::set_permissions(&file_path, fs::Permissions::from_mode(0o755))?;
    Ok(file_path)
}

/// Three entries; with a 00:00:10 to 00:00:20 window only the last two are kept
pub const SAMPLE_SRT: &str = r#"1
00:00:01,000 --> 00:00:04,000
This is a test subtitle.

2
00:00:12,000 --> 00:00:14,500
It contains multiple entries.

3
00:00:15,000 --> 00:00:19,000
For testing purposes.
"#;

/// Creates a sample subtitle file for testing
pub fn create_test_subtitle(dir: &Path, filename: &str) -> Result<PathBuf> {
    create_test_file(dir, filename, SAMPLE_SRT)
}

/// Routes library logging to the test output, once
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
