//! Where tag listings come from.
//!
//! [`TeCommander`] runs `avlistassettags` against a customer's auth file and
//! captures its whole stdout. [`CapturedListing`] replays a listing saved to
//! disk earlier, which is handy off the TECommander host.
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

use log::{debug, info};

use crate::customer::Customer;
use crate::io::{DEFAULT_MMAP_THRESHOLD_BYTES, LineIter, iter_lines_auto, iter_lines_bytes};

/// Default TECommander install location.
pub const DEFAULT_TECOMMANDER: &str =
    "C:/Program Files/Tripwire/tw-tecommander/bin/tecommander.cmd";

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("failed to start {}: {source}", .program.display())]
    Spawn { program: PathBuf, source: io::Error },
    #[error("TECommander failed ({status}): {stderr}")]
    Failed { status: ExitStatus, stderr: String },
    #[error("failed to read tag listing: {0}")]
    Read(#[source] io::Error),
    #[error(transparent)]
    Listing(#[from] anyhow::Error),
}

/// Produces the raw line stream for one customer and node group.
pub trait TagSource: Send + Sync {
    fn fetch(&self, customer: &Customer, node_group: &str) -> Result<LineIter, SourceError>;
}

#[derive(Debug, Clone)]
pub struct TeCommander {
    executable: PathBuf,
}

impl Default for TeCommander {
    fn default() -> Self {
        Self::new(DEFAULT_TECOMMANDER)
    }
}

impl TeCommander {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
        }
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// The `avlistassettags` invocation for a customer.
    pub fn command(&self, customer: &Customer, node_group: &str) -> Command {
        let mut cmd = Command::new(&self.executable);
        cmd.arg("avlistassettags")
            .arg("-w")
            .arg(node_group)
            .arg("-M")
            .arg(&customer.auth_file)
            .arg("-q")
            .arg("-Q");
        cmd
    }
}

impl TagSource for TeCommander {
    fn fetch(&self, customer: &Customer, node_group: &str) -> Result<LineIter, SourceError> {
        info!(
            "getting tags for nodes in \"{}\" for {}",
            node_group, customer.name
        );
        let output = self
            .command(customer, node_group)
            .output()
            .map_err(|source| SourceError::Spawn {
                program: self.executable.clone(),
                source,
            })?;
        if !output.status.success() {
            return Err(SourceError::Failed {
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        debug!("TECommander returned {} bytes", output.stdout.len());
        Ok(iter_lines_bytes(output.stdout))
    }
}

/// A listing previously captured to a file.
#[derive(Debug, Clone)]
pub struct CapturedListing {
    path: PathBuf,
    mmap_threshold: u64,
}

impl CapturedListing {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_threshold(path, DEFAULT_MMAP_THRESHOLD_BYTES)
    }

    pub fn with_threshold(path: impl Into<PathBuf>, mmap_threshold: u64) -> Self {
        Self {
            path: path.into(),
            mmap_threshold,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TagSource for CapturedListing {
    fn fetch(&self, customer: &Customer, node_group: &str) -> Result<LineIter, SourceError> {
        info!(
            "replaying {} as the \"{}\" listing for {}",
            self.path.display(),
            node_group,
            customer.name
        );
        Ok(iter_lines_auto(&self.path, self.mmap_threshold)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsStr;
    use tempfile::NamedTempFile;

    fn acme() -> Customer {
        Customer::new("Acme", "C:/auth/acme.xml")
    }

    #[test]
    fn command_line_matches_avlistassettags_usage() {
        let tc = TeCommander::new("/opt/tecommander");
        let cmd = tc.command(&acme(), "Monitoring Enabled");
        assert_eq!(cmd.get_program(), OsStr::new("/opt/tecommander"));
        let args: Vec<&OsStr> = cmd.get_args().collect();
        assert_eq!(
            args,
            [
                "avlistassettags",
                "-w",
                "Monitoring Enabled",
                "-M",
                "C:/auth/acme.xml",
                "-q",
                "-Q"
            ]
            .map(OsStr::new)
        );
    }

    #[test]
    fn missing_executable_is_spawn_error() {
        let tc = TeCommander::new("/definitely/not/a/tecommander");
        let err = tc.fetch(&acme(), "group").err().unwrap();
        assert!(matches!(err, SourceError::Spawn { .. }));
    }

    #[test]
    fn captured_listing_replays_file() {
        let f = NamedTempFile::new().unwrap();
        std::fs::write(f.path(), "Node:a\nx\n\n").unwrap();
        let src = CapturedListing::new(f.path());
        let lines: Vec<String> = src
            .fetch(&acme(), "group")
            .unwrap()
            .collect::<io::Result<_>>()
            .unwrap();
        assert_eq!(lines, ["Node:a", "x", ""]);
    }

    #[test]
    fn missing_capture_is_listing_error() {
        let src = CapturedListing::new("/definitely/not/here.txt");
        let err = src.fetch(&acme(), "group").err().unwrap();
        assert!(matches!(err, SourceError::Listing(_)));
    }
}
