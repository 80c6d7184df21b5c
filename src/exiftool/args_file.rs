//! Argument files consumed by `exiftool -@ <file>`
//!
//! Every invocation gets its own uniquely named copy of the template, so
//! concurrent chunks never write to the same file.

use crate::error::{Error, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::{Builder, NamedTempFile};
use tracing::{debug, warn};

/// Marker between the template file name and the random suffix of a temp args file
pub const TEMP_MARKER: &str = ".tmp_";

/// Number of random characters appended after [`TEMP_MARKER`]
const RANDOM_SUFFIX_LEN: usize = 12;

/// Builds per-invocation argument files from a fixed template
#[derive(Clone, Debug)]
pub struct ArgsFileBuilder {
    template: PathBuf,
    temp_dir: PathBuf,
}

impl ArgsFileBuilder {
    /// Create a builder for the given template, placing temp files in `temp_dir`
    pub fn new(template: impl Into<PathBuf>, temp_dir: impl Into<PathBuf>) -> Self {
        Self {
            template: template.into(),
            temp_dir: temp_dir.into(),
        }
    }

    /// Path of the template file
    pub fn template(&self) -> &Path {
        &self.template
    }

    /// Directory where temp args files are created and swept
    pub fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }

    /// Fail with a configuration error unless the template file exists
    pub fn ensure_template(&self) -> Result<()> {
        if self.template.is_file() {
            Ok(())
        } else {
            Err(Error::Config {
                message: format!(
                    "exiftool arguments template not found at {}",
                    self.template.display()
                ),
                key: Some("args_template".to_string()),
            })
        }
    }

    /// Prefix shared by every temp file derived from this template
    fn temp_prefix(&self) -> String {
        let name = self
            .template
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "input.arg".to_string());
        format!("{name}{TEMP_MARKER}")
    }

    /// Write a fresh args file: template contents, then one trimmed path per line.
    ///
    /// Blank entries are dropped; a batch with no usable entries is rejected.
    /// The returned [`ArgsFile`] deletes itself when closed or dropped.
    pub fn build<P: AsRef<Path>>(&self, paths: &[P]) -> Result<ArgsFile> {
        let mut lines = Vec::with_capacity(paths.len());
        for path in paths {
            let path = path.as_ref();
            let text = path.to_str().ok_or_else(|| {
                Error::InvalidArgument(format!("path is not valid UTF-8: {}", path.display()))
            })?;
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                lines.push(trimmed);
            }
        }
        if lines.is_empty() {
            return Err(Error::InvalidArgument(
                "image path batch is empty".to_string(),
            ));
        }

        self.ensure_template()?;
        let mut template = fs::read_to_string(&self.template)?;
        if !template.is_empty() && !template.ends_with('\n') {
            template.push('\n');
        }

        let mut file = Builder::new()
            .prefix(&self.temp_prefix())
            .rand_bytes(RANDOM_SUFFIX_LEN)
            .tempfile_in(&self.temp_dir)?;

        let mut contents = template;
        for line in &lines {
            contents.push_str(line);
            contents.push('\n');
        }
        file.write_all(contents.as_bytes())?;
        file.flush()?;

        debug!(path = ?file.path(), files = lines.len(), "wrote exiftool args file");
        Ok(ArgsFile { file })
    }

    /// Delete leftover temp args files from earlier runs.
    ///
    /// Returns the number of files removed; a clean or missing directory yields 0.
    pub fn sweep(&self) -> Result<usize> {
        sweep_temp_files(&self.temp_dir, &self.temp_prefix())
    }
}

/// A temp args file scoped to one invocation
#[derive(Debug)]
pub struct ArgsFile {
    file: NamedTempFile,
}

impl ArgsFile {
    /// Path to pass after `-@`
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Delete the file now, surfacing any removal error.
    ///
    /// Dropping an `ArgsFile` without closing it also deletes the file.
    pub fn close(self) -> Result<()> {
        self.file.close()?;
        Ok(())
    }
}

/// Check a run's file list before any args file is written.
///
/// Every entry must be valid UTF-8 and non-blank; [`ArgsFileBuilder::build`]
/// would otherwise drop or reject it inside a single chunk.
pub fn check_paths<P: AsRef<Path>>(paths: &[P]) -> Result<()> {
    for (index, path) in paths.iter().enumerate() {
        let path = path.as_ref();
        match path.to_str() {
            None => {
                return Err(Error::InvalidArgument(format!(
                    "path is not valid UTF-8: {}",
                    path.display()
                )));
            }
            Some(text) if text.trim().is_empty() => {
                return Err(Error::InvalidArgument(format!(
                    "image path at position {index} is blank"
                )));
            }
            Some(_) => {}
        }
    }
    Ok(())
}

/// Remove every file in `dir` whose name starts with `prefix`
fn sweep_temp_files(dir: &Path, prefix: &str) -> Result<usize> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e.into()),
    };

    let mut removed = 0;
    for entry in entries {
        let entry = entry?;
        let is_leftover = entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with(prefix) && name.len() > prefix.len());
        if !is_leftover || !entry.file_type()?.is_file() {
            continue;
        }

        match fs::remove_file(entry.path()) {
            Ok(()) => {
                debug!(path = ?entry.path(), "removed leftover args file");
                removed += 1;
            }
            // Already gone: another sweep got there first
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                warn!(path = ?entry.path(), error = %e, "failed to remove leftover args file");
                return Err(e.into());
            }
        }
    }
    Ok(removed)
}
