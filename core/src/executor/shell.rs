//! Runs commands through the platform shell (`sh -c`, or `cmd /C` on
//! Windows) with stdout and stderr captured. No timeout is applied: a command
//! that never exits holds its target, and therefore its batch, forever.

use std::process::Stdio;

use anyhow::Context;
use async_trait::async_trait;
use tokio::process::Command;

use super::{StepExecutor, StepOutput};

#[derive(Debug, Clone)]
pub struct ShellExecutor {
    program: String,
    flag: String,
}

impl ShellExecutor {
    pub fn new(program: impl Into<String>, flag: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            flag: flag.into(),
        }
    }
}

impl Default for ShellExecutor {
    fn default() -> Self {
        if cfg!(windows) {
            Self::new("cmd", "/C")
        } else {
            Self::new("sh", "-c")
        }
    }
}

#[async_trait]
impl StepExecutor for ShellExecutor {
    async fn run(&self, command: &str) -> anyhow::Result<StepOutput> {
        let output = Command::new(&self.program)
            .arg(&self.flag)
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .with_context(|| format!("launching {} {}", self.program, self.flag))?;

        Ok(StepOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code(),
        })
    }
}
