//! # Ejecución de Comandos de Shell
//! src/runner.rs
//!
//! Los jobs `shell` y `shell_emitter` ejecutan su comando a través de un
//! [`CommandRunner`]. La implementación real lanza `<shell> -c <comando>`
//! y bloquea hasta que el proceso termina (sin timeout).

use std::io;
use std::process::{Command, Stdio};
use thiserror::Error;
use tracing::debug;

/// Shell por defecto
pub const DEFAULT_SHELL: &str = "/bin/sh";

/// Salida capturada de un comando
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,

    /// Código de salida (`None` si terminó por señal)
    pub code: Option<i32>,

    pub success: bool,
}

impl CommandOutput {
    /// Describe por qué el comando no tuvo éxito
    pub fn failure_description(&self) -> String {
        match self.code {
            Some(code) => format!("command exited with status {}", code),
            None => "command terminated by signal".to_string(),
        }
    }
}

/// Error al lanzar un comando (nunca escapa de un job)
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("failed to spawn '{shell}': {source}")]
    Spawn {
        shell: String,
        #[source]
        source: io::Error,
    },
}

/// Ejecuta comandos de shell y captura su salida
pub trait CommandRunner {
    fn run(&self, command: &str) -> Result<CommandOutput, RunnerError>;
}

/// Runner que usa un shell del sistema
#[derive(Debug, Clone)]
pub struct ShellRunner {
    shell: String,
}

impl ShellRunner {
    pub fn new(shell: impl Into<String>) -> Self {
        Self { shell: shell.into() }
    }

    pub fn shell(&self) -> &str {
        &self.shell
    }
}

impl Default for ShellRunner {
    fn default() -> Self {
        Self::new(DEFAULT_SHELL)
    }
}

impl CommandRunner for ShellRunner {
    fn run(&self, command: &str) -> Result<CommandOutput, RunnerError> {
        debug!(shell = %self.shell, command, "running shell command");

        let output = Command::new(&self.shell)
            .arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|source| RunnerError::Spawn {
                shell: self.shell.clone(),
                source,
            })?;

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            code: output.status.code(),
            success: output.status.success(),
        })
    }
}
