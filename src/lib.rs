//! # Diag Bundle
//! src/lib.rs
//!
//! Recolector ligero de artefactos de diagnóstico: lee una lista
//! declarativa de jobs (archivos, directorios, comandos) y empaqueta todo
//! lo recolectado en un único bundle `.tar.gz` para inspeccionarlo después.
//!
//! ## Arquitectura
//!
//! - `config`: argumentos CLI y variables de entorno
//! - `jobs`: descripciones, clasificación, variantes y lista de trabajo
//! - `runner`: ejecución de comandos de shell
//! - `archive`: escritura del bundle comprimido
//! - `gather`: la operación completa de recolección
//! - `error`: errores fatales de una corrida
//! - `logging`: inicialización de `tracing`
//!
//! ## Ejemplo de uso
//!
//! ```no_run
//! use diag_bundle::gather::gather_document;
//! use diag_bundle::runner::ShellRunner;
//! use std::path::Path;
//!
//! let doc = "commands:\n  - file: /etc/hostname\n  - shell: uname -a\n";
//! let summary = gather_document(doc, Path::new("/tmp/bundle.tar.gz"), &ShellRunner::default())
//!     .expect("Error al recolectar");
//! println!("{} entradas", summary.entries_written);
//! ```

pub mod archive;
pub mod config;
pub mod error;
pub mod gather;
pub mod jobs;
pub mod logging;
pub mod runner;

pub use error::{BundleError, Result};
