//! # Clasificación de Jobs
//! src/jobs/kind.rs
//!
//! Decide qué variante de job es dueña de una descripción.
//!
//! ## Política
//!
//! ```text
//! Descripción → ¿tiene `type`? → variante por nombre + `source`
//!             → si no: primera variante (en PRIORITY) cuyo verbo esté presente
//!             → si ninguna: UnsupportedJob
//! ```
//!
//! El orden de [`PRIORITY`] es parte del contrato: una descripción con
//! `file` y `shell` es siempre un job de archivo.

use crate::error::{BundleError, Result};
use crate::jobs::description::JobDescription;

/// Clave del formato tipado (`{"type": "file", "source": "..."}`)
pub const TYPE_KEY: &str = "type";

/// Clave de la fuente en el formato tipado
pub const SOURCE_KEY: &str = "source";

/// Variantes de job soportadas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobKind {
    /// Copia un archivo tal cual
    File,

    /// Expande un árbol de directorios en jobs de archivo
    Directory,

    /// Ejecuta un comando y guarda su salida
    Command,

    /// Ejecuta un comando cuya salida es una nueva lista de jobs
    CommandEmitter,
}

/// Orden fijo en que las variantes reclaman una descripción
pub const PRIORITY: [JobKind; 4] = [
    JobKind::File,
    JobKind::Directory,
    JobKind::Command,
    JobKind::CommandEmitter,
];

impl JobKind {
    /// Clave cuya presencia identifica a la variante
    pub fn verb(&self) -> &'static str {
        match self {
            JobKind::File => "file",
            JobKind::Directory => "directory",
            JobKind::Command => "shell",
            JobKind::CommandEmitter => "shell_emitter",
        }
    }

    /// Nombre de la variante (para logs y para el formato tipado)
    pub fn as_str(&self) -> &'static str {
        match self {
            JobKind::File => "file",
            JobKind::Directory => "directory",
            JobKind::Command => "command",
            JobKind::CommandEmitter => "commandEmitter",
        }
    }

    /// Convierte el valor de `type` a una variante
    pub fn from_type_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "file" => Some(JobKind::File),
            "directory" => Some(JobKind::Directory),
            "command" | "shell" => Some(JobKind::Command),
            "commandemitter" | "command_emitter" | "shell_emitter" => {
                Some(JobKind::CommandEmitter)
            }
            _ => None,
        }
    }
}

/// Resultado de clasificar una descripción
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub kind: JobKind,

    /// Ruta o comando sobre el que opera el job
    pub source: String,
}

/// Clasifica una descripción.
///
/// # Errores
///
/// `UnsupportedJob` si ninguna variante la reconoce, si el `type` es
/// desconocido o si el verbo no trae un valor de texto.
pub fn classify(description: &JobDescription) -> Result<Classification> {
    if description.contains(TYPE_KEY) {
        return classify_typed(description);
    }

    let kind = PRIORITY
        .iter()
        .copied()
        .find(|kind| description.contains(kind.verb()))
        .ok_or_else(|| BundleError::UnsupportedJob(description.to_string()))?;

    let source = description
        .get_str(kind.verb())
        .ok_or_else(|| BundleError::UnsupportedJob(description.to_string()))?;

    Ok(Classification { kind, source })
}

fn classify_typed(description: &JobDescription) -> Result<Classification> {
    let kind = description
        .get_str(TYPE_KEY)
        .and_then(|name| JobKind::from_type_name(&name))
        .ok_or_else(|| BundleError::UnsupportedJob(description.to_string()))?;

    let source = description
        .get_str(SOURCE_KEY)
        .ok_or_else(|| BundleError::UnsupportedJob(description.to_string()))?;

    Ok(Classification { kind, source })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify_kind(desc: JobDescription) -> JobKind {
        classify(&desc).unwrap().kind
    }

    // ==================== Verb keys ====================

    #[test]
    fn test_classify_each_verb() {
        assert_eq!(classify_kind(JobDescription::new().with("file", "/a")), JobKind::File);
        assert_eq!(classify_kind(JobDescription::new().with("directory", "/d")), JobKind::Directory);
        assert_eq!(classify_kind(JobDescription::new().with("shell", "ls")), JobKind::Command);
        assert_eq!(
            classify_kind(JobDescription::new().with("shell_emitter", "gen")),
            JobKind::CommandEmitter
        );
    }

    #[test]
    fn test_classify_priority_order() {
        let desc = JobDescription::new()
            .with("shell_emitter", "gen")
            .with("shell", "ls")
            .with("file", "/etc/hosts");

        let c = classify(&desc).unwrap();
        assert_eq!(c.kind, JobKind::File);
        assert_eq!(c.source, "/etc/hosts");

        let desc = JobDescription::new().with("shell", "ls").with("directory", "/d");
        assert_eq!(classify_kind(desc), JobKind::Directory);
    }

    #[test]
    fn test_priority_is_explicit() {
        assert_eq!(
            PRIORITY,
            [JobKind::File, JobKind::Directory, JobKind::Command, JobKind::CommandEmitter]
        );
    }

    #[test]
    fn test_classify_unknown_keys_ignored() {
        let desc = JobDescription::new()
            .with("shell", "uptime")
            .with("comment", "ignored");
        assert_eq!(classify_kind(desc), JobKind::Command);
    }

    // ==================== Unsupported ====================

    #[test]
    fn test_classify_unsupported() {
        let desc = JobDescription::new().with("bogus", "x");
        let err = classify(&desc).unwrap_err();

        assert!(matches!(err, BundleError::UnsupportedJob(_)));
        assert!(err.to_string().contains("bogus"));
    }

    #[test]
    fn test_classify_verb_without_value() {
        let jobs = crate::jobs::description::parse_document("commands:\n  - file:\n").unwrap();
        assert!(matches!(classify(&jobs[0]), Err(BundleError::UnsupportedJob(_))));
    }

    // ==================== Typed form ====================

    #[test]
    fn test_classify_typed() {
        let desc = JobDescription::new()
            .with("type", "commandEmitter")
            .with("source", "./emit.sh");
        let c = classify(&desc).unwrap();

        assert_eq!(c.kind, JobKind::CommandEmitter);
        assert_eq!(c.source, "./emit.sh");
    }

    #[test]
    fn test_classify_typed_wins_over_verbs() {
        let desc = JobDescription::new()
            .with("type", "command")
            .with("source", "df -h")
            .with("file", "/etc/hosts");
        assert_eq!(classify_kind(desc), JobKind::Command);
    }

    #[test]
    fn test_classify_typed_unknown_type() {
        let desc = JobDescription::new().with("type", "socket").with("source", "x");
        assert!(classify(&desc).is_err());
    }

    #[test]
    fn test_classify_typed_missing_source() {
        let desc = JobDescription::new().with("type", "file");
        assert!(classify(&desc).is_err());
    }

    #[test]
    fn test_from_type_name_aliases() {
        assert_eq!(JobKind::from_type_name("FILE"), Some(JobKind::File));
        assert_eq!(JobKind::from_type_name("command_emitter"), Some(JobKind::CommandEmitter));
        assert_eq!(JobKind::from_type_name("nope"), None);
    }
}
