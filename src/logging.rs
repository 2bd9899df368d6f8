//! # Logging Estructurado
//! src/logging.rs
//!
//! Logs a stderr con `tracing`. El nivel sale de la configuración
//! (`--verbose`) y `RUST_LOG` tiene prioridad si está definido.

use tracing_subscriber::EnvFilter;

/// Nivel por defecto según la verbosidad
pub fn default_level(verbose: bool) -> &'static str {
    if verbose {
        "debug"
    } else {
        "info"
    }
}

/// Inicializa el subscriber global.
///
/// Usa `try_init`: si ya hay un subscriber (por ejemplo en las pruebas)
/// se mantiene el existente.
pub fn init(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level(verbose)));

    let result = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();

    if result.is_err() {
        tracing::debug!("tracing subscriber already initialized");
    }
}
