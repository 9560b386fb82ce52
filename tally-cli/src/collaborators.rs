//! External collaborators (OCR, speech-to-text) run as child processes.
//!
//! Every run goes through the [`WorkerPool`]: a semaphore bounds how many are
//! in flight and each one is cut off after its configured timeout.

use std::future::Future;
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::config::CommandSection;

#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error("{what} timed out after {after:?}")]
    Timeout { what: String, after: Duration },

    #[error("{what} failed: {message}")]
    Failed { what: String, message: String },

    #[error("{0} is not installed or not on PATH")]
    Unavailable(String),
}

#[derive(Debug, Clone)]
pub struct WorkerPool {
    permits: Arc<Semaphore>,
}

impl WorkerPool {
    pub fn new(max_concurrent: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }

    /// Run `job` once a permit is free, giving up after `after`.
    pub async fn run<T, F>(&self, what: &str, after: Duration, job: F) -> Result<T, CollaboratorError>
    where
        F: Future<Output = Result<T, CollaboratorError>>,
    {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|e| CollaboratorError::Failed {
                what: what.to_string(),
                message: e.to_string(),
            })?;

        match tokio::time::timeout(after, job).await {
            Ok(res) => res,
            Err(_) => {
                warn!(what, ?after, "collaborator timed out");
                Err(CollaboratorError::Timeout {
                    what: what.to_string(),
                    after,
                })
            }
        }
    }
}

/// Media file in, text out.
pub trait Recognize: Send + Sync {
    fn name(&self) -> &str;
    fn timeout(&self) -> Duration;
    fn recognize(&self, input: &Path) -> impl Future<Output = Result<String, CollaboratorError>> + Send;
}

#[derive(Debug, Clone)]
pub struct CommandRecognizer {
    section: CommandSection,
}

impl CommandRecognizer {
    pub fn new(section: CommandSection) -> Self {
        Self { section }
    }

    pub fn args_for(&self, input: &Path) -> Vec<String> {
        build_args(&self.section.args, input)
    }
}

/// Substitute `{input}`; append the path when no arg mentions it.
pub fn build_args(template: &[String], input: &Path) -> Vec<String> {
    let input = input.display().to_string();
    let mut substituted = false;
    let mut out: Vec<String> = template
        .iter()
        .map(|a| {
            if a.contains("{input}") {
                substituted = true;
                a.replace("{input}", &input)
            } else {
                a.clone()
            }
        })
        .collect();
    if !substituted {
        out.push(input);
    }
    out
}

impl Recognize for CommandRecognizer {
    fn name(&self) -> &str {
        &self.section.command
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.section.timeout_secs)
    }

    async fn recognize(&self, input: &Path) -> Result<String, CollaboratorError> {
        let cmd = &self.section.command;
        if which::which(cmd).is_err() {
            return Err(CollaboratorError::Unavailable(cmd.clone()));
        }
        let args = self.args_for(input);
        debug!(cmd = %cmd, ?args, "spawning collaborator");

        let out = tokio::process::Command::new(cmd)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| CollaboratorError::Failed {
                what: cmd.clone(),
                message: e.to_string(),
            })?;

        if !out.status.success() {
            return Err(CollaboratorError::Failed {
                what: cmd.clone(),
                message: format!(
                    "exited with {}. stderr: {}",
                    out.status,
                    String::from_utf8_lossy(&out.stderr).trim()
                ),
            });
        }
        Ok(String::from_utf8_lossy(&out.stdout).into_owned())
    }
}

/// Run a recognizer on the pool under its own timeout.
pub async fn recognize_file<R: Recognize>(
    pool: &WorkerPool,
    recognizer: &R,
    input: &Path,
) -> Result<String, CollaboratorError> {
    let text = pool
        .run(recognizer.name(), recognizer.timeout(), recognizer.recognize(input))
        .await?;
    debug!(what = recognizer.name(), text = %text, "recognized text");
    Ok(text)
}
