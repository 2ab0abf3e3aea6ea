use std::path::Path;

use async_trait::async_trait;

use crate::error::{AppError, GitError, Result, ResultExt};

use super::remote::parse_remote_line;
use super::{DiffFormat, VersionControl};

/// Captured result of one `git` invocation.
#[derive(Debug, Clone, Default)]
pub struct GitOutput {
    pub success: bool,
    /// Raw bytes; diffs may carry content in any encoding.
    pub stdout: Vec<u8>,
    pub stderr: String,
}

/// Runs `git` with the given arguments inside a working directory.
#[async_trait]
pub trait GitRunner: Send + Sync {
    async fn run(&self, dir: &Path, args: &[&str]) -> Result<GitOutput>;
}

/// Runs the `git` binary found on `PATH`.
pub struct GitCli;

#[async_trait]
impl GitRunner for GitCli {
    async fn run(&self, dir: &Path, args: &[&str]) -> Result<GitOutput> {
        tracing::debug!(dir = %dir.display(), args = ?args, "Running git");

        // output() waits for exit and drains both pipes before returning
        let output = tokio::process::Command::new("git")
            .args(args)
            .current_dir(dir)
            .kill_on_drop(true)
            .output()
            .await
            .or_unknown("Failed to run git")?;

        Ok(GitOutput {
            success: output.status.success(),
            stdout: output.stdout,
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Translate raw git output into stdout bytes or a typed error.
///
/// Every wording-dependent rule for git lives here.
pub fn classify_output(args: &[&str], output: &GitOutput) -> Result<Vec<u8>> {
    if String::from_utf8_lossy(&output.stdout).contains("not a git repository")
        || output.stderr.contains("not a git repository")
    {
        return Err(GitError::NotARepository.into());
    }

    if !output.success {
        tracing::error!(args = ?args, stderr = %output.stderr.trim(), "git exited with failure");
        return Err(AppError::unknown(format!(
            "git {} failed: {}",
            args.join(" "),
            output.stderr.trim()
        )));
    }

    Ok(output.stdout.clone())
}

/// Version-control vcs backed by `git` subprocesses.
pub struct GitVcs<R: GitRunner = GitCli> {
    runner: R,
}

impl GitVcs<GitCli> {
    pub fn new() -> Self {
        Self { runner: GitCli }
    }
}

impl Default for GitVcs<GitCli> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: GitRunner> GitVcs<R> {
    pub fn with_runner(runner: R) -> Self {
        Self { runner }
    }

    async fn stdout(&self, dir: &Path, args: &[&str]) -> Result<Vec<u8>> {
        let output = self.runner.run(dir, args).await?;
        classify_output(args, &output)
    }

    /// First non-blank line of stdout, or `Unknown` when there is none.
    async fn first_line(&self, dir: &Path, args: &[&str]) -> Result<String> {
        let stdout = self.stdout(dir, args).await?;
        String::from_utf8_lossy(&stdout)
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .map(str::to_string)
            .ok_or_else(|| AppError::unknown(format!("git {} printed nothing", args.join(" "))))
    }
}

/// Reject refs that git would parse as options.
fn validate_ref(name: &str) -> Result<()> {
    if name.is_empty() || name.starts_with('-') {
        return Err(AppError::unknown(format!("Invalid git ref: {name:?}")));
    }
    Ok(())
}

/// CRLF to LF, plus a trailing newline. Works on bytes so non-UTF-8
/// content passes through untouched.
fn normalize_line_endings(bytes: &[u8]) -> Vec<u8> {
    let mut normalized = Vec::with_capacity(bytes.len() + 1);
    let mut iter = bytes.iter().copied().peekable();
    while let Some(byte) = iter.next() {
        if byte == b'\r' && iter.peek() == Some(&b'\n') {
            continue;
        }
        normalized.push(byte);
    }
    if normalized.last() != Some(&b'\n') {
        normalized.push(b'\n');
    }
    normalized
}

#[async_trait]
impl<R: GitRunner> VersionControl for GitVcs<R> {
    async fn repository_path(&self, dir: &Path) -> Result<String> {
        let line = self.first_line(dir, &["remote", "-v"]).await?;
        parse_remote_line(&line).ok_or_else(|| {
            tracing::error!(remote = %line, "Unrecognized remote URL");
            AppError::unknown(format!("Unrecognized remote: {line}"))
        })
    }

    async fn current_branch(&self, dir: &Path) -> Result<String> {
        let branch = self
            .first_line(dir, &["rev-parse", "--abbrev-ref", "HEAD"])
            .await?;
        if branch == "HEAD" {
            return Err(GitError::DetachedHead.into());
        }
        Ok(branch)
    }

    async fn merge_base(&self, dir: &Path, upstream_ref: &str, head_ref: &str) -> Result<String> {
        validate_ref(upstream_ref)?;
        validate_ref(head_ref)?;
        self.first_line(dir, &["merge-base", upstream_ref, head_ref])
            .await
    }

    async fn diff_since(&self, dir: &Path, base: &str, format: DiffFormat) -> Result<Vec<u8>> {
        validate_ref(base)?;
        let mut args = vec!["diff", base, "--no-ext-diff"];
        if format == DiffFormat::Stat {
            args.push("--stat");
        }

        let stdout = self.stdout(dir, &args).await?;
        if stdout.iter().all(u8::is_ascii_whitespace) {
            return Err(GitError::EmptyDiff.into());
        }
        Ok(normalize_line_endings(&stdout))
    }

    async fn commit_hash(&self, dir: &Path) -> Result<String> {
        self.first_line(dir, &["rev-parse", "HEAD"]).await
    }
}
