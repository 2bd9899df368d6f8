//! # Planificador de la Lista de Trabajo
//! src/jobs/scheduler.rs
//!
//! Consume descripciones de una pila LIFO hasta vaciarla:
//!
//! ```text
//! pop → clasificar → ejecutar → escribir contenido → push(hijos) → repetir
//! ```
//!
//! Como los hijos se apilan y se sacan antes que sus hermanos encolados
//! previamente, el recorrido es en profundidad sobre las cadenas de
//! expansión. Dentro de un mismo padre, el último hijo producido se
//! procesa primero.
//!
//! Solo un fallo de clasificación (o de escritura del bundle) aborta la
//! corrida; los fallos de ejecución ya vienen contenidos en el job.

use crate::archive::ArchiveSink;
use crate::error::Result;
use crate::jobs::description::JobDescription;
use crate::jobs::job::{Execution, Job};
use crate::runner::CommandRunner;
use tracing::{debug, error, warn};

/// Pila de descripciones pendientes (sin límite)
#[derive(Debug, Default)]
pub struct Worklist {
    stack: Vec<JobDescription>,
}

impl Worklist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Crea la pila con la lista inicial; el último elemento sale primero
    pub fn seeded(descriptions: Vec<JobDescription>) -> Self {
        Self { stack: descriptions }
    }

    pub fn push(&mut self, description: JobDescription) {
        self.stack.push(description);
    }

    pub fn pop(&mut self) -> Option<JobDescription> {
        self.stack.pop()
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }
}

/// Resumen de una corrida completa
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Jobs sacados de la pila y ejecutados
    pub jobs_executed: usize,

    /// Entradas escritas al bundle
    pub entries_written: usize,

    /// Fallos registrados como contenido
    pub contained_failures: usize,

    /// Descripciones hijas apiladas
    pub children_enqueued: usize,
}

/// Ejecuta la lista de trabajo sobre un runner y un bundle
pub struct Scheduler<'a> {
    runner: &'a dyn CommandRunner,
}

impl<'a> Scheduler<'a> {
    pub fn new(runner: &'a dyn CommandRunner) -> Self {
        Self { runner }
    }

    /// Procesa todas las descripciones, incluidas las que se emitan en el camino.
    ///
    /// # Errores
    ///
    /// Retorna el primer error fatal (job no soportado, patrón inválido o
    /// fallo de escritura); las descripciones pendientes se descartan.
    pub fn run(
        &self,
        descriptions: Vec<JobDescription>,
        archive: &mut dyn ArchiveSink,
    ) -> Result<RunSummary> {
        let mut worklist = Worklist::seeded(descriptions);
        let mut summary = RunSummary::default();

        while let Some(description) = worklist.pop() {
            debug!(queued = worklist.len() + 1, "Queued commands");

            let job = match Job::from_description(&description) {
                Ok(job) => job,
                Err(e) => {
                    error!(error = %e, pending = worklist.len(), "aborting run");
                    return Err(e);
                }
            };

            debug!(
                kind = job.kind().as_str(),
                destination = job.destination(),
                name = description.name().as_deref().unwrap_or(""),
                "executing job"
            );

            let execution = job.execute(self.runner);
            self.absorb(&job, execution, &mut worklist, archive, &mut summary)?;
        }

        Ok(summary)
    }

    /// Escribe el contenido de una ejecución y apila sus hijos.
    ///
    /// El contenido se lee una vez y se libera aquí.
    fn absorb(
        &self,
        job: &Job,
        execution: Execution,
        worklist: &mut Worklist,
        archive: &mut dyn ArchiveSink,
        summary: &mut RunSummary,
    ) -> Result<()> {
        let Execution {
            content,
            destination,
            children,
            failure,
        } = execution;

        summary.jobs_executed += 1;

        if let Some(reason) = failure {
            warn!(
                kind = job.kind().as_str(),
                destination = %destination,
                reason = %reason,
                "job failed, recorded in bundle"
            );
            summary.contained_failures += 1;
        }

        if let Some(content) = content {
            let (payload, read_failure) = content.into_payload();
            if let Some(reason) = read_failure {
                warn!(destination = %destination, reason = %reason, "content read failed, recorded in bundle");
                summary.contained_failures += 1;
            }

            archive.write_entry(&destination, &payload)?;
            summary.entries_written += 1;
        }

        for child in children {
            worklist.push(child);
            summary.children_enqueued += 1;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BundleError;
    use crate::runner::testing::ScriptedRunner;
    use std::fs;

    /// Bundle en memoria que recuerda el orden de escritura
    #[derive(Default)]
    struct RecordingSink {
        writes: Vec<(String, Vec<u8>)>,
    }

    impl RecordingSink {
        fn names(&self) -> Vec<&str> {
            self.writes.iter().map(|(n, _)| n.as_str()).collect()
        }

        fn text(&self, name: &str) -> String {
            let (_, body) = self.writes.iter().rev().find(|(n, _)| n == name).unwrap();
            String::from_utf8(body.clone()).unwrap()
        }
    }

    impl ArchiveSink for RecordingSink {
        fn write_entry(&mut self, name: &str, payload: &[u8]) -> Result<()> {
            self.writes.push((name.to_string(), payload.to_vec()));
            Ok(())
        }
    }

    fn shell(cmd: &str, dest: &str) -> JobDescription {
        JobDescription::new().with("shell", cmd).with("destination", dest)
    }

    // ==================== Worklist ====================

    #[test]
    fn test_worklist_is_lifo() {
        let mut worklist = Worklist::new();
        worklist.push(shell("a", "a"));
        worklist.push(shell("b", "b"));

        assert_eq!(worklist.len(), 2);
        assert_eq!(worklist.pop().unwrap().destination().as_deref(), Some("b"));
        assert_eq!(worklist.pop().unwrap().destination().as_deref(), Some("a"));
        assert!(worklist.is_empty());
    }

    // ==================== Ordering ====================

    #[test]
    fn test_seed_list_processed_last_first() {
        let runner = ScriptedRunner::new().on("one", 0, "1", "").on("two", 0, "2", "");
        let mut sink = RecordingSink::default();

        Scheduler::new(&runner)
            .run(vec![shell("one", "one"), shell("two", "two")], &mut sink)
            .unwrap();

        assert_eq!(runner.calls(), vec!["two", "one"]);
        assert_eq!(sink.names(), vec!["two", "one"]);
    }

    #[test]
    fn test_depth_first_expansion() {
        let emitted = r#"commands:
  - shell: child-x
    destination: x
  - shell_emitter: inner
"#;
        let runner = ScriptedRunner::new()
            .on("first", 0, "", "")
            .on("outer", 0, emitted, "")
            .on("inner", 0, "{\"shell\": \"grandchild\", \"destination\": \"g\"}", "")
            .on("child-x", 0, "", "")
            .on("grandchild", 0, "", "");
        let mut sink = RecordingSink::default();

        let jobs = vec![
            shell("first", "first"),
            JobDescription::new().with("shell_emitter", "outer"),
        ];
        let summary = Scheduler::new(&runner).run(jobs, &mut sink).unwrap();

        // outer → inner → grandchild → child-x, y solo al final el primero de la lista
        assert_eq!(
            runner.calls(),
            vec!["outer", "inner", "grandchild", "child-x", "first"]
        );
        assert_eq!(sink.names(), vec!["g", "x", "first"]);
        assert_eq!(summary.jobs_executed, 5);
        assert_eq!(summary.children_enqueued, 3);
        assert_eq!(summary.entries_written, 3);
    }

    // ==================== Containment ====================

    #[test]
    fn test_contained_failures_continue() {
        let runner = ScriptedRunner::new()
            .on("bad", 1, "", "broken")
            .on("bad-emitter", 1, "", "")
            .on("good", 0, "ok", "");
        let mut sink = RecordingSink::default();

        let jobs = vec![
            shell("good", "good"),
            JobDescription::new().with("shell_emitter", "bad-emitter"),
            shell("bad", "bad"),
            JobDescription::new().with("file", "/no/such/file/here"),
        ];
        let summary = Scheduler::new(&runner).run(jobs, &mut sink).unwrap();

        assert_eq!(summary.jobs_executed, 4);
        assert_eq!(summary.entries_written, 4);
        assert_eq!(summary.contained_failures, 2);
        assert!(sink.text("bad").contains("----- exception -----"));
        assert!(sink.text("/no/such/file/here").contains("absent"));
        assert!(sink.names().iter().any(|n| n.starts_with("errors/")));
    }

    #[test]
    fn test_two_emitter_failures_distinct_keys() {
        let runner = ScriptedRunner::new();
        let mut sink = RecordingSink::default();

        let jobs = vec![
            JobDescription::new().with("shell_emitter", "missing-a"),
            JobDescription::new().with("shell_emitter", "missing-b"),
        ];
        let summary = Scheduler::new(&runner).run(jobs, &mut sink).unwrap();

        let names = sink.names();
        assert_eq!(names.len(), 2);
        assert!(names.iter().all(|n| n.starts_with("errors/")));
        assert_ne!(names[0], names[1]);
        assert_eq!(summary.children_enqueued, 0);
    }

    // ==================== Fatal ====================

    #[test]
    fn test_unsupported_job_aborts() {
        let runner = ScriptedRunner::new().on("never", 0, "", "");
        let mut sink = RecordingSink::default();

        let jobs = vec![shell("never", "never"), JobDescription::new().with("bogus", "1")];
        let err = Scheduler::new(&runner).run(jobs, &mut sink).unwrap_err();

        assert!(matches!(err, BundleError::UnsupportedJob(_)));
        assert!(runner.calls().is_empty());
        assert!(sink.writes.is_empty());
    }

    #[test]
    fn test_directory_expansion_writes_each_file() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("d");
        fs::create_dir_all(root.join("sub")).unwrap();
        fs::write(root.join("a.txt"), "A").unwrap();
        fs::write(root.join("skip.txt"), "S").unwrap();
        fs::write(root.join("sub/b.txt"), "B").unwrap();

        let runner = ScriptedRunner::new();
        let mut sink = RecordingSink::default();
        let jobs = vec![JobDescription::new()
            .with("directory", root.to_string_lossy())
            .with("exclude", "^skip")];
        let summary = Scheduler::new(&runner).run(jobs, &mut sink).unwrap();

        let base = root.to_string_lossy().trim_start_matches('/').to_string();
        let mut names: Vec<String> = sink.names().iter().map(|s| s.to_string()).collect();
        names.sort();
        assert_eq!(names, vec![format!("{}/a.txt", base), format!("{}/sub/b.txt", base)]);
        assert_eq!(sink.text(&format!("{}/sub/b.txt", base)), "B");
        assert_eq!(summary.jobs_executed, 3);
    }
}
