//! # Sistema de Jobs
//!
//! Motor de expansión y ejecución de jobs de recolección.
//!
//! ## Flujo
//!
//! ```text
//! documento → descripciones → Worklist (LIFO)
//!     pop → classify → Job::execute → bundle
//!                         └── hijos → push
//! ```
//!
//! - `description`: descripciones sin tipo y parsing del documento
//! - `kind`: clasificación por verbo (orden de prioridad fijo)
//! - `job`: las cuatro variantes (File, Directory, Command, CommandEmitter)
//! - `walk`: recorrido perezoso de directorios
//! - `scheduler`: la pila de trabajo y el bucle principal

pub mod description;
pub mod job;
pub mod kind;
pub mod scheduler;
pub mod walk;

pub use description::{parse_document, parse_emitted, JobDescription};
pub use job::{Content, Execution, Job};
pub use kind::{classify, Classification, JobKind, PRIORITY};
pub use scheduler::{RunSummary, Scheduler, Worklist};
