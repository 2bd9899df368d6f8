//! # Comando `gather`
//! src/gather.rs
//!
//! Lee el documento de jobs, abre el bundle, ejecuta la lista de trabajo
//! y cierra el bundle en todos los caminos de salida.

use crate::archive::ArchiveWriter;
use crate::error::Result;
use crate::jobs::{parse_document, RunSummary, Scheduler};
use crate::runner::CommandRunner;
use std::fs;
use std::io::{self, Read};
use std::path::Path;
use tracing::info;

/// Lee el documento desde un archivo o, si no hay target, desde stdin
pub fn read_target(target: Option<&Path>) -> Result<String> {
    match target {
        Some(path) => Ok(fs::read_to_string(path)?),
        None => {
            let mut text = String::new();
            io::stdin().read_to_string(&mut text)?;
            Ok(text)
        }
    }
}

/// Ejecuta una corrida completa a partir del texto del documento.
///
/// El documento se valida antes de crear el bundle, así un documento
/// inválido no deja archivo de salida. El bundle se cierra aun cuando la
/// corrida aborta; en ese caso se reporta el error de la corrida.
pub fn gather_document(
    document: &str,
    output: &Path,
    runner: &dyn CommandRunner,
) -> Result<RunSummary> {
    let jobs = parse_document(document)?;
    info!(jobs = jobs.len(), output = %output.display(), "starting collection");

    let mut archive = ArchiveWriter::create(output)?;
    let outcome = Scheduler::new(runner).run(jobs, &mut archive);
    let closed = archive.finish();

    let summary = outcome?;
    closed?;

    info!(
        jobs = summary.jobs_executed,
        entries = summary.entries_written,
        contained_failures = summary.contained_failures,
        "collection finished"
    );

    Ok(summary)
}

/// `gather --target <target> --output <output>`
pub fn gather(
    target: Option<&Path>,
    output: &Path,
    runner: &dyn CommandRunner,
) -> Result<RunSummary> {
    let document = read_target(target)?;
    gather_document(&document, output, runner)
}
