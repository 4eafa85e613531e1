use std::process::Stdio;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

#[async_trait]
pub trait Clipboard: Send + Sync {
    async fn copy(&self, text: &str) -> Result<()>;
}

/// A copy utility invoked with the text on stdin.
#[derive(Debug, Clone)]
pub struct CopyCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl CopyCommand {
    pub fn new(program: &str, args: &[&str]) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }
}

/// Copies through the first platform utility that accepts the text.
pub struct SystemClipboard {
    candidates: Vec<CopyCommand>,
}

impl SystemClipboard {
    pub fn new() -> Self {
        Self::with_candidates(vec![
            CopyCommand::new("pbcopy", &[]),
            CopyCommand::new("wl-copy", &[]),
            CopyCommand::new("xclip", &["-selection", "clipboard"]),
            CopyCommand::new("xsel", &["--clipboard", "--input"]),
            CopyCommand::new("clip", &[]),
        ])
    }

    pub fn with_candidates(candidates: Vec<CopyCommand>) -> Self {
        Self { candidates }
    }
}

impl Default for SystemClipboard {
    fn default() -> Self {
        Self::new()
    }
}

async fn pipe_into(cmd: &CopyCommand, text: &str) -> Result<()> {
    let mut child = Command::new(&cmd.program)
        .args(&cmd.args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .with_context(|| format!("failed to spawn {}", cmd.program))?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(text.as_bytes())
            .await
            .with_context(|| format!("failed to write to {}", cmd.program))?;
    }

    let status = child
        .wait()
        .await
        .with_context(|| format!("failed to wait for {}", cmd.program))?;
    if !status.success() {
        bail!("{} exited with {status}", cmd.program);
    }
    Ok(())
}

#[async_trait]
impl Clipboard for SystemClipboard {
    async fn copy(&self, text: &str) -> Result<()> {
        let mut last_err = None;
        for cmd in &self.candidates {
            match pipe_into(cmd, text).await {
                Ok(()) => {
                    tracing::debug!(program = %cmd.program, bytes = text.len(), "copied to clipboard");
                    return Ok(());
                }
                Err(e) => {
                    tracing::debug!(program = %cmd.program, error = %e, "clipboard utility unavailable");
                    last_err = Some(e);
                }
            }
        }
        match last_err {
            Some(e) => Err(e.context("no clipboard utility succeeded")),
            None => bail!("no clipboard utility configured"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_utilities_fail() {
        let clipboard = SystemClipboard::with_candidates(vec![
            CopyCommand::new("ideafy-no-such-copy-tool", &[]),
            CopyCommand::new("ideafy-no-such-copy-tool-2", &[]),
        ]);
        let err = clipboard.copy("x").await.unwrap_err();
        assert!(format!("{err:#}").contains("no clipboard utility succeeded"));
    }

    #[tokio::test]
    async fn test_no_candidates_fail() {
        let clipboard = SystemClipboard::with_candidates(vec![]);
        assert!(clipboard.copy("x").await.is_err());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_falls_through_to_working_utility() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("clip.txt");
        let clipboard = SystemClipboard::with_candidates(vec![
            CopyCommand::new("ideafy-no-such-copy-tool", &[]),
            CopyCommand::new("sh", &["-c", &format!("cat > '{}'", out.display())]),
        ]);

        clipboard.copy("<div>copied</div>").await.unwrap();
        assert_eq!(std::fs::read_to_string(&out).unwrap(), "<div>copied</div>");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failing_exit_status_is_an_error() {
        let clipboard = SystemClipboard::with_candidates(vec![CopyCommand::new("sh", &["-c", "cat >/dev/null; exit 3"])]);
        assert!(clipboard.copy("x").await.is_err());
    }
}
