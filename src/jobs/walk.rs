//! # Recorrido de Directorios
//! src/jobs/walk.rs
//!
//! Iterador perezoso, en profundidad, sobre los archivos de un árbol.
//! Cada directorio se lista en orden de nombre y sus subdirectorios se
//! recorren en cuanto aparecen. Los enlaces simbólicos no se siguen.

use regex::Regex;
use std::ffi::OsStr;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

/// Archivos de un árbol, excluyendo los que coinciden con `exclude`
pub struct DirectoryWalk {
    exclude: Option<Regex>,
    entries: walkdir::IntoIter,
}

impl DirectoryWalk {
    /// Crea el recorrido. Si `root` no existe el iterador queda vacío.
    pub fn new(root: &Path, exclude: Option<Regex>) -> Self {
        let entries = WalkDir::new(root)
            .follow_links(false)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter();

        Self { exclude, entries }
    }

    fn is_excluded(&self, name: &OsStr) -> bool {
        self.exclude
            .as_ref()
            .map_or(false, |re| matches_at_start(re, &name.to_string_lossy()))
    }
}

impl Iterator for DirectoryWalk {
    type Item = PathBuf;

    fn next(&mut self) -> Option<PathBuf> {
        loop {
            let entry = match self.entries.next()? {
                Ok(entry) => entry,
                Err(e) => {
                    report(&e);
                    continue;
                }
            };

            if entry.file_type().is_dir() || self.is_excluded(entry.file_name()) {
                continue;
            }

            return Some(entry.into_path());
        }
    }
}

/// Un directorio raíz ausente no es un fallo; lo demás se avisa y se salta
fn report(err: &walkdir::Error) {
    let missing_root = err.depth() == 0
        && err.io_error().map_or(false, |io| io.kind() == ErrorKind::NotFound);

    if !missing_root {
        let path = err.path().map(|p| p.display().to_string()).unwrap_or_default();
        warn!(path = %path, error = %err, "skipping unreadable entry");
    }
}

/// Coincidencia anclada al inicio del nombre (no a la ruta completa)
pub fn matches_at_start(re: &Regex, name: &str) -> bool {
    re.find(name).map_or(false, |m| m.start() == 0)
}
