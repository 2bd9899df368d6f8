//! # Configuración del Recolector
//! src/config.rs
//!
//! Argumentos CLI y variables de entorno.
//!
//! ## Ejemplos de uso
//!
//! ### CLI
//! ```bash
//! ./diag_bundle gather --target jobs.yaml --output bundle.tar.gz
//! cat jobs.yaml | ./diag_bundle --verbose gather --output bundle.tar.gz
//! ```
//!
//! ### Variables de entorno
//! ```bash
//! BUNDLE_SHELL=/bin/bash BUNDLE_OUTPUT=/tmp/bundle.tar.gz ./diag_bundle gather
//! ```

use crate::error::{BundleError, Result};
use crate::runner::DEFAULT_SHELL;
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

/// Configuración del recolector
#[derive(Debug, Clone, Parser)]
#[command(name = "diag_bundle")]
#[command(about = "Recolecta archivos, directorios y salidas de comandos en un bundle comprimido")]
#[command(version = "0.1.0")]
pub struct Config {
    /// Log detallado (nivel debug)
    #[arg(short, long, global = true, env = "BUNDLE_VERBOSE")]
    pub verbose: bool,

    /// Shell usado para los jobs `shell` y `shell_emitter`
    #[arg(long, global = true, default_value = DEFAULT_SHELL, env = "BUNDLE_SHELL")]
    pub shell: String,

    #[command(subcommand)]
    pub action: Action,
}

/// Subcomandos disponibles
#[derive(Debug, Clone, Subcommand)]
pub enum Action {
    /// Ejecuta la lista de jobs y escribe el bundle
    Gather(GatherArgs),
}

/// Argumentos de `gather`
#[derive(Debug, Clone, Args)]
pub struct GatherArgs {
    /// Documento con la lista de jobs (`-` u omitido: entrada estándar)
    #[arg(long, env = "BUNDLE_TARGET")]
    pub target: Option<PathBuf>,

    /// Ruta del bundle de salida
    #[arg(long, env = "BUNDLE_OUTPUT")]
    pub output: Option<PathBuf>,
}

impl GatherArgs {
    /// Target como archivo; `None` significa entrada estándar
    pub fn target_file(&self) -> Option<&Path> {
        self.target
            .as_deref()
            .filter(|path| path.as_os_str() != "-")
    }

    /// Ruta del bundle; falta de `--output` es un error de uso
    pub fn output_path(&self) -> Result<&Path> {
        self.output.as_deref().ok_or_else(|| {
            BundleError::Usage("Please specify an output location with --output.".to_string())
        })
    }
}

impl Config {
    /// Crea la configuración parseando argumentos CLI
    pub fn new() -> Self {
        Config::parse()
    }

    /// Valida la configuración
    ///
    /// Retorna `BundleError::Usage` si falta algo requerido
    pub fn validate(&self) -> Result<()> {
        if self.shell.trim().is_empty() {
            return Err(BundleError::Usage(
                "Please specify a shell program with --shell.".to_string(),
            ));
        }

        match &self.action {
            Action::Gather(args) => args.output_path().map(|_| ()),
        }
    }

    /// Imprime un resumen de la configuración
    pub fn print_summary(&self) {
        println!("⚙️  Configuración:");
        println!("   Shell:    {}", self.shell);
        println!("   Verbose:  {}", self.verbose);

        match &self.action {
            Action::Gather(args) => {
                let target = args
                    .target_file()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "<stdin>".to_string());
                let output = args
                    .output
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "<missing>".to_string());

                println!("   Target:   {}", target);
                println!("   Output:   {}", output);
            }
        }
        println!();
    }
}
