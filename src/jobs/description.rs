//! # Descripciones de Jobs
//! src/jobs/description.rs
//!
//! Una descripción es un mapa clave/valor sin tipo, tal como sale del
//! documento declarativo (YAML o JSON) o como la sintetiza un job padre.
//!
//! ## Formato del documento
//!
//! ```yaml
//! commands:
//!   - file: /var/log/syslog
//!   - directory: /etc/apt
//!     exclude: "^.*\\.save$"
//!   - shell: pip3 list
//!     destination: commands/pip3-list
//!   - shell_emitter: ./list-extra-jobs.sh
//! ```
//!
//! Los elementos de `commands` que son strings se vuelven a parsear como
//! documentos anidados (o como una sola descripción en forma de flujo).

use crate::error::{BundleError, Result};
use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use std::fmt;
use std::path::{Path, MAIN_SEPARATOR};
use tracing::warn;

/// Clave de la lista de jobs en el documento
pub const COMMANDS_KEY: &str = "commands";

/// Clave opcional con la ruta destino dentro del bundle
pub const DESTINATION_KEY: &str = "destination";

/// Clave opcional con una etiqueta legible (solo para logs)
pub const NAME_KEY: &str = "name";

/// Descripción inmutable de un job
#[derive(Debug, Clone, PartialEq, Default)]
pub struct JobDescription {
    fields: Mapping,
}

impl JobDescription {
    /// Crea una descripción vacía
    pub fn new() -> Self {
        Self::default()
    }

    /// Envuelve un mapa ya parseado
    pub fn from_mapping(fields: Mapping) -> Self {
        Self { fields }
    }

    /// Agrega un campo string (constructor estilo builder)
    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.fields
            .insert(Value::String(key.to_string()), Value::String(value.into()));
        self
    }

    /// Descripción de un archivo emitida por un job de directorio.
    ///
    /// El destino es la ruta completa sin el separador inicial. Una ruta
    /// que no es UTF-8 se convierte con pérdida y queda registrada como
    /// ausente; se avisa en el log.
    pub fn emitted_file(path: &Path) -> Self {
        let full = match path.to_str() {
            Some(text) => text.to_string(),
            None => {
                let lossy = path.to_string_lossy().into_owned();
                warn!(path = %lossy, "file name is not valid UTF-8, it will be recorded as absent");
                lossy
            }
        };
        let destination = full.trim_start_matches(MAIN_SEPARATOR).to_string();

        Self::new()
            .with(NAME_KEY, format!("Emitted file archival ({})", full))
            .with("file", full)
            .with(DESTINATION_KEY, destination)
    }

    /// Verifica si la clave está presente (aunque su valor sea nulo)
    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Obtiene el valor de una clave como texto.
    ///
    /// Los escalares (números, booleanos) se convierten a su forma textual;
    /// nulos, listas y mapas retornan `None`.
    pub fn get_str(&self, key: &str) -> Option<String> {
        match self.fields.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// Destino explícito, si existe
    pub fn destination(&self) -> Option<String> {
        self.get_str(DESTINATION_KEY)
    }

    /// Etiqueta legible, si existe
    pub fn name(&self) -> Option<String> {
        self.get_str(NAME_KEY)
    }

    /// Número de campos
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl fmt::Display for JobDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (key, value)) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", render_value(key), render_value(value))?;
        }
        write!(f, "}}")
    }
}

/// Representación compacta de un valor para mensajes de error
fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => format!("{:?}", s),
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().replace('\n', " "))
            .unwrap_or_else(|_| "<unprintable>".to_string()),
    }
}

/// Parsea el documento de entrada y retorna la lista de descripciones.
///
/// Un documento vacío o sin `commands` no tiene jobs.
pub fn parse_document(text: &str) -> Result<Vec<JobDescription>> {
    let value: Value = serde_yaml::from_str(text)
        .map_err(|e| BundleError::Document(e.to_string()))?;

    descriptions_from_document(value)
}

/// Parsea la salida de un `shell_emitter`.
///
/// Primero intenta un documento completo con `commands`; si no lo es,
/// interpreta cada línea no vacía como una descripción en forma de flujo
/// (por ejemplo `{"file": "/etc/hosts"}`).
pub fn parse_emitted(text: &str) -> Result<Vec<JobDescription>> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    if let Ok(value) = serde_yaml::from_str::<Value>(trimmed) {
        let is_document = matches!(&value, Value::Mapping(m) if m.contains_key(COMMANDS_KEY));
        if is_document {
            return descriptions_from_document(value);
        }
    }

    let mut descriptions = Vec::new();
    for line in trimmed.lines().map(str::trim).filter(|l| !l.is_empty()) {
        // Solo mapas en forma de flujo; `clave: valor` suelto no es una línea válida
        if !line.starts_with('{') {
            return Err(BundleError::Document(format!(
                "emitted line is not a flow mapping: {}",
                line
            )));
        }

        match serde_yaml::from_str::<Value>(line) {
            Ok(Value::Mapping(m)) => descriptions.push(JobDescription::from_mapping(m)),
            Ok(_) => {
                return Err(BundleError::Document(format!(
                    "emitted line is not a job mapping: {}",
                    line
                )));
            }
            Err(e) => {
                return Err(BundleError::Document(format!(
                    "emitted line '{}' could not be parsed: {}",
                    line, e
                )));
            }
        }
    }

    Ok(descriptions)
}

/// Forma del documento de jobs; las claves desconocidas se ignoran
#[derive(Debug, Deserialize)]
struct JobDocument {
    #[serde(default)]
    commands: Option<Vec<Value>>,
}

fn descriptions_from_document(value: Value) -> Result<Vec<JobDescription>> {
    if value.is_null() {
        return Ok(Vec::new());
    }

    let document: JobDocument = serde_yaml::from_value(value)
        .map_err(|e| BundleError::Document(e.to_string()))?;

    let mut descriptions = Vec::new();
    for item in document.commands.unwrap_or_default() {
        descriptions.extend(descriptions_from_item(item)?);
    }

    Ok(descriptions)
}

fn descriptions_from_item(item: Value) -> Result<Vec<JobDescription>> {
    match item {
        Value::Mapping(m) => Ok(vec![JobDescription::from_mapping(m)]),
        Value::String(text) => {
            let nested: Value = serde_yaml::from_str(&text)
                .map_err(|_| BundleError::UnsupportedJob(format!("{:?}", text)))?;

            match nested {
                Value::Mapping(m) if m.contains_key(COMMANDS_KEY) => {
                    descriptions_from_document(Value::Mapping(m))
                }
                Value::Mapping(m) => Ok(vec![JobDescription::from_mapping(m)]),
                _ => Err(BundleError::UnsupportedJob(format!("{:?}", text))),
            }
        }
        other => Err(BundleError::UnsupportedJob(render_value(&other))),
    }
}
