//! # Variantes de Job
//! src/jobs/job.rs
//!
//! Un [`Job`] es una descripción ya clasificada y lista para ejecutarse.
//! Cada ejecución produce una [`Execution`]: contenido opcional para el
//! bundle, el destino bajo el que se guarda y los jobs hijos emitidos.
//!
//! | Variante        | Contenido                    | Hijos                     |
//! |-----------------|------------------------------|---------------------------|
//! | File            | bytes del archivo o aviso    | ninguno                   |
//! | Directory       | ninguno                      | un job File por archivo   |
//! | Command         | bloque stdout/stderr         | ninguno                   |
//! | CommandEmitter  | solo si falla (`errors/...`) | los jobs de su salida     |

use crate::error::{BundleError, Result};
use crate::jobs::description::{parse_emitted, JobDescription};
use crate::jobs::kind::{classify, JobKind};
use crate::jobs::walk::DirectoryWalk;
use crate::runner::{CommandOutput, CommandRunner};
use regex::Regex;
use std::fs::File;
use std::io::{self, Cursor, Read};
use std::path::{Path, PathBuf};

/// Clave opcional con el patrón de exclusión de un directorio
pub const EXCLUDE_KEY: &str = "exclude";

/// Prefijo de los destinos sintetizados para emisores fallidos
pub const ERRORS_PREFIX: &str = "errors";

/// Secuencia perezosa, finita y no reiniciable de descripciones hijas
pub type Children = Box<dyn Iterator<Item = JobDescription>>;

/// Contenido de un job, leído una sola vez y liberado al consumirse
pub enum Content {
    File { path: PathBuf, file: File },
    Text(Cursor<Vec<u8>>),
}

impl Content {
    pub fn text(text: impl Into<String>) -> Self {
        Content::Text(Cursor::new(text.into().into_bytes()))
    }

    /// Lee todo el contenido y libera el recurso.
    ///
    /// Un archivo que falla a mitad de lectura se reemplaza por un aviso;
    /// el segundo valor describe ese fallo.
    pub fn into_payload(mut self) -> (Vec<u8>, Option<String>) {
        let mut payload = Vec::new();
        match self.read_to_end(&mut payload) {
            Ok(_) => (payload, None),
            Err(e) => {
                let path = match &self {
                    Content::File { path, .. } => path.display().to_string(),
                    Content::Text(_) => "<text>".to_string(),
                };
                let notice = unreadable_notice(&path, &e);
                (notice.clone().into_bytes(), Some(notice))
            }
        }
    }
}

impl Read for Content {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Content::File { file, .. } => file.read(buf),
            Content::Text(cursor) => cursor.read(buf),
        }
    }
}

impl std::fmt::Debug for Content {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Content::File { path, .. } => write!(f, "Content::File({})", path.display()),
            Content::Text(cursor) => write!(f, "Content::Text({} bytes)", cursor.get_ref().len()),
        }
    }
}

/// Resultado de ejecutar un job
pub struct Execution {
    pub content: Option<Content>,

    /// Clave del bundle para `content`
    pub destination: String,

    pub children: Children,

    /// Fallo contenido (el contenido ya lo documenta)
    pub failure: Option<String>,
}

impl Execution {
    fn nothing(destination: String) -> Self {
        Self {
            content: None,
            destination,
            children: Box::new(std::iter::empty()),
            failure: None,
        }
    }

    fn with_content(destination: String, content: Content) -> Self {
        Self {
            content: Some(content),
            ..Self::nothing(destination)
        }
    }

    fn failed(mut self, failure: String) -> Self {
        self.failure = Some(failure);
        self
    }
}

/// Job de archivo: `{"file": "/var/log/syslog"}`
#[derive(Debug, Clone)]
pub struct FileJob {
    pub path: String,
    pub destination: String,
}

impl FileJob {
    pub fn execute(&self) -> Execution {
        let path = Path::new(&self.path);

        if !path.exists() {
            return Execution::with_content(
                self.destination.clone(),
                Content::text(absent_notice(&self.path)),
            );
        }

        match File::open(path) {
            Ok(file) => Execution::with_content(
                self.destination.clone(),
                Content::File { path: path.to_path_buf(), file },
            ),
            Err(e) => {
                let notice = unreadable_notice(&self.path, &e);
                Execution::with_content(self.destination.clone(), Content::text(notice.clone()))
                    .failed(notice)
            }
        }
    }
}

/// Job de directorio: `{"directory": "/var/log", "exclude": "^.*\\.gz$"}`
#[derive(Debug, Clone)]
pub struct DirectoryJob {
    pub path: String,
    pub destination: String,
    pub exclude: Option<Regex>,
}

impl DirectoryJob {
    /// Un job File por cada archivo no excluido del árbol.
    ///
    /// No requiere ejecución previa; un directorio inexistente no tiene hijos.
    pub fn items(&self) -> Children {
        let walk = DirectoryWalk::new(Path::new(&self.path), self.exclude.clone());
        Box::new(walk.map(|path| JobDescription::emitted_file(&path)))
    }

    pub fn execute(&self) -> Execution {
        Execution {
            children: self.items(),
            ..Execution::nothing(self.destination.clone())
        }
    }
}

/// Job de comando: `{"shell": "pip3 list", "destination": "commands/pip3-list"}`
#[derive(Debug, Clone)]
pub struct CommandJob {
    pub command: String,
    pub destination: String,
}

impl CommandJob {
    /// Ejecuta el comando. Un fallo queda documentado en el contenido.
    pub fn execute(&self, runner: &dyn CommandRunner) -> Execution {
        match runner.run(&self.command) {
            Ok(out) if out.success => Execution::with_content(
                self.destination.clone(),
                Content::text(command_block(&self.command, &out.stdout, &out.stderr, None)),
            ),
            Ok(out) => {
                let failure = out.failure_description();
                self.contained(&out, failure)
            }
            Err(e) => self.contained(&empty_output(), e.to_string()),
        }
    }

    fn contained(&self, out: &CommandOutput, failure: String) -> Execution {
        let block = command_block(&self.command, &out.stdout, &out.stderr, Some(&failure));
        Execution::with_content(self.destination.clone(), Content::text(block)).failed(failure)
    }
}

/// Job emisor: `{"shell_emitter": "./list-jobs.sh"}`
///
/// La salida del comando es un nuevo documento de jobs.
#[derive(Debug, Clone)]
pub struct CommandEmitterJob {
    pub command: String,
    pub destination: String,
}

impl CommandEmitterJob {
    pub fn execute(&self, runner: &dyn CommandRunner) -> Execution {
        let out = match runner.run(&self.command) {
            Ok(out) => out,
            Err(e) => return self.contained(&empty_output(), e.to_string()),
        };

        if !out.success {
            let failure = out.failure_description();
            return self.contained(&out, failure);
        }

        match parse_emitted(&out.stdout) {
            Ok(children) => Execution {
                children: Box::new(children.into_iter()),
                ..Execution::nothing(self.destination.clone())
            },
            Err(e) => self.contained(&out, format!("malformed emitter output: {}", e)),
        }
    }

    /// El destino original nunca aplica a un fallo: se guarda bajo `errors/`
    fn contained(&self, out: &CommandOutput, failure: String) -> Execution {
        let block = command_block(&self.command, &out.stdout, &out.stderr, Some(&failure));
        Execution::with_content(error_destination(), Content::text(block)).failed(failure)
    }
}

/// Job materializado a partir de una descripción
#[derive(Debug, Clone)]
pub enum Job {
    File(FileJob),
    Directory(DirectoryJob),
    Command(CommandJob),
    CommandEmitter(CommandEmitterJob),
}

impl Job {
    /// Clasifica y construye el job.
    ///
    /// # Errores
    ///
    /// - `UnsupportedJob` si ninguna variante reconoce la descripción
    /// - `InvalidPattern` si `exclude` no es una regex válida
    pub fn from_description(description: &JobDescription) -> Result<Self> {
        let classification = classify(description)?;
        let source = classification.source;
        let destination = description.destination().unwrap_or_else(|| source.clone());

        let job = match classification.kind {
            JobKind::File => Job::File(FileJob { path: source, destination }),
            JobKind::Directory => {
                let exclude = match description.get_str(EXCLUDE_KEY) {
                    Some(pattern) => Some(Regex::new(&pattern).map_err(|source| {
                        BundleError::InvalidPattern { pattern, source }
                    })?),
                    None => None,
                };
                Job::Directory(DirectoryJob { path: source, destination, exclude })
            }
            JobKind::Command => Job::Command(CommandJob { command: source, destination }),
            JobKind::CommandEmitter => {
                Job::CommandEmitter(CommandEmitterJob { command: source, destination })
            }
        };

        Ok(job)
    }

    pub fn kind(&self) -> JobKind {
        match self {
            Job::File(_) => JobKind::File,
            Job::Directory(_) => JobKind::Directory,
            Job::Command(_) => JobKind::Command,
            Job::CommandEmitter(_) => JobKind::CommandEmitter,
        }
    }

    pub fn destination(&self) -> &str {
        match self {
            Job::File(j) => &j.destination,
            Job::Directory(j) => &j.destination,
            Job::Command(j) => &j.destination,
            Job::CommandEmitter(j) => &j.destination,
        }
    }

    pub fn execute(&self, runner: &dyn CommandRunner) -> Execution {
        match self {
            Job::File(j) => j.execute(),
            Job::Directory(j) => j.execute(),
            Job::Command(j) => j.execute(runner),
            Job::CommandEmitter(j) => j.execute(runner),
        }
    }
}

/// Bloque de texto con la salida de un comando
pub fn command_block(command: &str, stdout: &str, stderr: &str, failure: Option<&str>) -> String {
    let mut block = format!(
        "# {}\n\n----- stdout -----\n{}\n\n----- stderr -----\n{}",
        command,
        stdout.trim_end(),
        stderr.trim_end()
    );

    if let Some(failure) = failure {
        block.push_str(&format!("\n\n----- exception -----\n{}", failure.trim_end()));
    }

    block
}

/// Destino único dentro del espacio de errores
pub fn error_destination() -> String {
    format!("{}/{:016x}", ERRORS_PREFIX, rand::random::<u64>())
}

fn absent_notice(path: &str) -> String {
    format!("File {} was absent when the bundle was collected.\n", path)
}

fn unreadable_notice(path: &str, err: &io::Error) -> String {
    format!("File {} could not be read: {}\n", path, err)
}

fn empty_output() -> CommandOutput {
    CommandOutput {
        stdout: String::new(),
        stderr: String::new(),
        code: None,
        success: false,
    }
}
