//! Archive backed by a git repository.

use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::{debug, info};
use url::Url;

use super::fs::{io_error, Archive};
use super::ArchiveSink;
use crate::error::{ArchiveError, ArchiveResult};

/// Runs `git` commands against an archive root.
#[cfg_attr(test, mockall::automock)]
pub trait GitRunner {
    /// Run `git -C <root> <args..>`.
    fn run(&self, root: &Path, args: Vec<String>) -> ArchiveResult<()>;
}

/// Runs the `git` binary found on the `PATH`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemGit;

impl GitRunner for SystemGit {
    fn run(&self, root: &Path, args: Vec<String>) -> ArchiveResult<()> {
        let status = Command::new("git")
            .arg("-C")
            .arg(root)
            .args(&args)
            .stdout(Stdio::null())
            .status();

        let status = match status {
            Ok(status) => status,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(ArchiveError::GitNotInstalled),
            Err(e) => return Err(io_error(root, e)),
        };

        if !status.success() {
            return Err(ArchiveError::GitFailed {
                command: format!("git -C {} {}", root.display(), args.join(" ")),
            });
        }

        Ok(())
    }
}

/// An [`Archive`] whose writes are staged and committed to git.
///
/// ```rust,ignore
/// let archive = GitArchive::open("path/to/root")?;
/// archive.commit_with("Updated 2024-01-01", |archive| {
///     archive.write(&page.url, &page.body).map(|_| ())
/// })?;
/// ```
#[derive(Debug)]
pub struct GitArchive<G: GitRunner = SystemGit> {
    archive: Archive,
    git: G,
}

impl GitArchive<SystemGit> {
    /// Open the archive, running `git init` unless it is already a repository.
    pub fn open(root: impl AsRef<Path>) -> ArchiveResult<Self> {
        Self::open_with(root, SystemGit)
    }
}

impl<G: GitRunner> GitArchive<G> {
    /// Like [`open`](GitArchive::open) with an explicit git runner.
    pub fn open_with(root: impl AsRef<Path>, git: G) -> ArchiveResult<Self> {
        let archive = Self {
            archive: Archive::open(root)?,
            git,
        };

        if !archive.is_git() {
            archive.init()?;
        }

        Ok(archive)
    }

    pub fn root(&self) -> &Path {
        self.archive.root()
    }

    /// Check if the root holds a git repository.
    pub fn is_git(&self) -> bool {
        self.root().join(".git").is_dir()
    }

    /// Initialize the git repository.
    pub fn init(&self) -> ArchiveResult<()> {
        info!(root = %self.root().display(), "Initializing git archive");
        self.git("init", [])
    }

    /// Write a page body and stage it.
    pub fn write(&self, url: &Url, body: &[u8]) -> ArchiveResult<PathBuf> {
        let path = self.archive.write(url, body)?;
        self.git("add", [path.display().to_string()])?;
        Ok(path)
    }

    /// Commit everything staged so far.
    pub fn commit(&self, message: &str) -> ArchiveResult<()> {
        debug!(root = %self.root().display(), message = %message, "Committing archive");
        self.git("commit", ["-m".to_string(), message.to_string()])
    }

    /// Run `f`, then commit what it staged.
    ///
    /// Nothing is committed if `f` fails.
    pub fn commit_with<T, F>(&self, message: &str, f: F) -> ArchiveResult<T>
    where
        F: FnOnce(&Self) -> ArchiveResult<T>,
    {
        let value = f(self)?;
        self.commit(message)?;
        Ok(value)
    }

    fn git<const N: usize>(&self, command: &str, args: [String; N]) -> ArchiveResult<()> {
        let mut all = Vec::with_capacity(N + 1);
        all.push(command.to_string());
        all.extend(args);
        self.git.run(self.root(), all)
    }
}

impl<G: GitRunner> ArchiveSink for GitArchive<G> {
    fn write(&mut self, url: &Url, body: &[u8]) -> ArchiveResult<PathBuf> {
        GitArchive::write(self, url, body)
    }
}

impl<G: GitRunner> fmt::Display for GitArchive<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.archive, f)
    }
}
