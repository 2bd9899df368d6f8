//! # Errores del Recolector
//! src/error.rs
//!
//! Solo los errores de este módulo pueden terminar una corrida. Los fallos
//! de cada job (archivo ausente, comando fallido, salida mal formada) se
//! contienen dentro del propio job y terminan como contenido del bundle.

use thiserror::Error;

/// Errores fatales de una corrida
#[derive(Debug, Error)]
pub enum BundleError {
    /// Falta un argumento requerido (por ejemplo `--output`)
    #[error("{0}")]
    Usage(String),

    /// Ninguna variante de job reconoce la descripción
    #[error("Unsupported job: {0}")]
    UnsupportedJob(String),

    /// El patrón `exclude` de un job de directorio no compila
    #[error("Invalid exclude pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// El documento de entrada no tiene la forma esperada
    #[error("Invalid job document: {0}")]
    Document(String),

    /// Error de I/O fuera de un job (leer el target, crear el archivo de salida)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error al escribir o cerrar el archivo comprimido
    #[error("Archive error: {0}")]
    Archive(String),
}

pub type Result<T> = std::result::Result<T, BundleError>;
