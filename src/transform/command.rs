// src/transform/command.rs

//! Boundary to external tools.
//!
//! Each file is piped through a shell command: its bytes are written to the
//! command's stdin and whatever the command prints on stdout replaces them.
//! Tools that only accept a path get `{input}` substituted with the path of
//! a temporary file holding the current contents, named with the asset's
//! current extension (stdin is then closed). The original source path is
//! exported as `ASSETPIPE_INPUT` in both modes.

use std::path::Path;
use std::process::Stdio;

use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info};

use crate::errors::{PipelineError, Result};
use crate::transform::{Asset, FileSet, TransformFuture, Transformer};

const NAME: &str = "command";

/// Lines of stderr kept in the error of a failed command.
const STDERR_TAIL_LINES: usize = 20;

#[derive(Debug, Clone)]
pub struct CommandTransformer {
    cmd: String,
    extname: Option<String>,
}

impl CommandTransformer {
    pub fn new(cmd: impl Into<String>, extname: Option<String>) -> Self {
        Self {
            cmd: cmd.into(),
            extname,
        }
    }

    async fn run_on(&self, mut asset: Asset) -> Result<Asset> {
        let name = asset.display_name();
        let uses_input = self.cmd.contains("{input}");
        // Held until the command has exited; the file is removed on drop.
        let staged = if uses_input {
            Some(stage_contents(&mut asset, &name).await?)
        } else {
            None
        };
        let cmd_line = match &staged {
            Some(file) => self.cmd.replace("{input}", &shell_quote(file.path())),
            None => self.cmd.clone(),
        };

        debug!(file = %name, cmd = %cmd_line, "running external transformer");

        let mut cmd = shell_command(&cmd_line);
        cmd.env("ASSETPIPE_INPUT", &asset.source)
            .stdin(if uses_input {
                Stdio::null()
            } else {
                Stdio::piped()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|e| {
            PipelineError::transform(NAME, &name, format!("spawning `{cmd_line}`: {e}"))
        })?;

        // Feed stdin from a separate task so a command producing output
        // before draining its input cannot deadlock against us.
        if let Some(mut stdin) = child.stdin.take() {
            let input = std::mem::take(&mut asset.contents);
            let file = name.clone();
            tokio::spawn(async move {
                if let Err(err) = stdin.write_all(&input).await {
                    debug!(file = %file, error = %err, "command closed stdin early");
                }
            });
        }

        let output = child.wait_with_output().await.map_err(|e| {
            PipelineError::transform(NAME, &name, format!("waiting for `{cmd_line}`: {e}"))
        })?;

        if !output.status.success() {
            let code = output.status.code().unwrap_or(-1);
            return Err(PipelineError::transform(
                NAME,
                &name,
                format!(
                    "`{cmd_line}` exited with code {code}: {}",
                    stderr_tail(&output.stderr)
                ),
            ));
        }

        drop(staged);
        info!(file = %name, bytes = output.stdout.len(), "external transformer finished");

        asset.contents = output.stdout;
        if let Some(ext) = &self.extname {
            asset.set_extname(ext);
        }
        Ok(asset)
    }
}

impl Transformer for CommandTransformer {
    fn name(&self) -> &str {
        &self.cmd
    }

    fn transform(&self, files: FileSet) -> TransformFuture<'_> {
        Box::pin(async move {
            let mut out = FileSet::new();
            for asset in files {
                out.push(self.run_on(asset).await?);
            }
            Ok(out)
        })
    }
}

/// Write the asset's current contents to a temporary file carrying its
/// current extension, so that earlier steps are not lost and tools that
/// sniff the extension see the right one.
async fn stage_contents(asset: &mut Asset, name: &str) -> Result<NamedTempFile> {
    let suffix = asset
        .relative
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default();
    let file = tempfile::Builder::new()
        .prefix("assetpipe-")
        .suffix(&suffix)
        .tempfile()
        .map_err(|e| PipelineError::transform(NAME, name, format!("creating temp input: {e}")))?;
    let contents = std::mem::take(&mut asset.contents);
    tokio::fs::write(file.path(), &contents)
        .await
        .map_err(|e| PipelineError::transform(NAME, name, format!("writing temp input: {e}")))?;
    Ok(file)
}

/// Build a shell command appropriate for the platform.
fn shell_command(line: &str) -> Command {
    if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(line);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(line);
        c
    }
}

fn shell_quote(path: &Path) -> String {
    let raw = path.to_string_lossy();
    if cfg!(windows) {
        format!("\"{raw}\"")
    } else {
        format!("'{}'", raw.replace('\'', r"'\''"))
    }
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join("\n")
}
