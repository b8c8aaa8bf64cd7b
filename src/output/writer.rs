//! Crash-safe policy output
//!
//! A [`PolicyWriter`] buffers into a temporary file next to the destination
//! and renames it into place on [`PolicyWriter::commit`]. A run that fails
//! part-way never leaves a truncated policy behind: [`PolicyWriter::abort`]
//! (or dropping the writer) removes the temporary file.

use crate::config::STDIO_PATH;
use crate::error::OutputError;
use std::io::{self, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

const TEMP_PREFIX: &str = ".policy-bot.";
const TEMP_SUFFIX: &str = ".yml";

enum Target {
    Stdout(io::Stdout),
    TempFile(NamedTempFile),
}

/// Output sink for the rendered policy
pub struct PolicyWriter {
    dest: String,
    target: Target,
}

impl PolicyWriter {
    /// Open a writer for `dest`. `-` writes to standard output.
    pub fn create(dest: &str) -> Result<Self, OutputError> {
        if dest == STDIO_PATH {
            return Ok(Self::stdout());
        }

        let dir = match Path::new(dest).parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let temp = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .suffix(TEMP_SUFFIX)
            .tempfile_in(dir)
            .map_err(|source| OutputError::CreateTemp {
                dir: dir.display().to_string(),
                source,
            })?;

        debug!(dest = %dest, temp = %temp.path().display(), "Created temporary output file");

        Ok(Self {
            dest: dest.to_string(),
            target: Target::TempFile(temp),
        })
    }

    /// A writer for standard output
    pub fn stdout() -> Self {
        Self {
            dest: STDIO_PATH.to_string(),
            target: Target::Stdout(io::stdout()),
        }
    }

    /// Final destination of the output
    pub fn destination(&self) -> &str {
        &self.dest
    }

    /// Flush and move the output to its destination
    pub fn commit(self) -> Result<(), OutputError> {
        debug!(path = %self.dest, "Closing writer");

        match self.target {
            Target::Stdout(mut stdout) => stdout.flush()?,
            Target::TempFile(mut temp) => {
                temp.flush()?;
                debug!(
                    from = %temp.path().display(),
                    to = %self.dest,
                    "Moving temporary file to final destination"
                );
                // On failure the returned file is dropped, which removes it
                temp.persist(&self.dest)
                    .map_err(|e| OutputError::Rename {
                        dest: self.dest.clone(),
                        source: e.error,
                    })?;
            }
        }

        Ok(())
    }

    /// Discard everything written so far
    pub fn abort(self) -> Result<(), OutputError> {
        debug!(path = %self.dest, "Aborting writer");

        match self.target {
            Target::Stdout(_) => Ok(()),
            Target::TempFile(temp) => temp.close().map_err(OutputError::Remove),
        }
    }
}

impl Write for PolicyWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match &mut self.target {
            Target::Stdout(stdout) => stdout.write(buf),
            Target::TempFile(temp) => temp.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut self.target {
            Target::Stdout(stdout) => stdout.flush(),
            Target::TempFile(temp) => temp.flush(),
        }
    }
}
