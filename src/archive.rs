//! # Escritura del Bundle
//! src/archive.rs
//!
//! El bundle es un stream tar comprimido con gzip (deflate). Las entradas
//! se agregan en orden y nunca se deduplican: al extraer, la última
//! escritura de un mismo destino es la que queda.

use crate::error::{BundleError, Result};
use crate::jobs::job::error_destination;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

/// Destino de las entradas producidas por los jobs
pub trait ArchiveSink {
    fn write_entry(&mut self, name: &str, payload: &[u8]) -> Result<()>;
}

/// Reemplazo de un componente `..` dentro del nombre de una entrada
pub const PARENT_REPLACEMENT: &str = "__";

type Encoder = GzEncoder<BufWriter<File>>;

/// Bundle `.tar.gz` en disco.
///
/// Se finaliza una sola vez con [`ArchiveWriter::finish`]; si se descarta
/// sin finalizar, `Drop` intenta cerrarlo para no dejarlo truncado.
pub struct ArchiveWriter {
    path: PathBuf,
    builder: Option<tar::Builder<Encoder>>,
    entries: usize,
    mtime: u64,
}

impl ArchiveWriter {
    /// Crea (o trunca) el archivo de salida
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path)?;
        let encoder = GzEncoder::new(BufWriter::new(file), Compression::default());

        let mtime = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);

        debug!(path = %path.display(), "archive opened");

        Ok(Self {
            path: path.to_path_buf(),
            builder: Some(tar::Builder::new(encoder)),
            entries: 0,
            mtime,
        })
    }

    /// Número de entradas escritas
    pub fn entries(&self) -> usize {
        self.entries
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Escribe el trailer de tar y de gzip y cierra el archivo
    pub fn finish(mut self) -> Result<()> {
        self.finalize()
    }

    fn finalize(&mut self) -> Result<()> {
        let Some(builder) = self.builder.take() else {
            return Ok(());
        };

        let encoder = builder.into_inner().map_err(archive_error)?;
        let mut writer = encoder.finish().map_err(archive_error)?;
        writer.flush()?;

        debug!(path = %self.path.display(), entries = self.entries, "archive closed");
        Ok(())
    }
}

impl ArchiveSink for ArchiveWriter {
    fn write_entry(&mut self, name: &str, payload: &[u8]) -> Result<()> {
        let entry_name = normalize_entry_name(name);
        let builder = self
            .builder
            .as_mut()
            .ok_or_else(|| BundleError::Archive("archive already finalized".to_string()))?;

        let mut header = tar::Header::new_gnu();
        header.set_entry_type(tar::EntryType::Regular);
        header.set_size(payload.len() as u64);
        header.set_mode(0o644);
        header.set_mtime(self.mtime);

        builder
            .append_data(&mut header, &entry_name, payload)
            .map_err(archive_error)?;

        self.entries += 1;
        Ok(())
    }
}

impl Drop for ArchiveWriter {
    fn drop(&mut self) {
        if let Err(e) = self.finalize() {
            warn!(path = %self.path.display(), error = %e, "failed to close archive");
        }
    }
}

/// Normaliza el nombre de una entrada.
///
/// Quita separadores iniciales y componentes `.`; cada `..` se reescribe
/// como `__` para que la entrada no salga del bundle. Un nombre que queda
/// vacío se guarda bajo el espacio de errores.
pub fn normalize_entry_name(name: &str) -> String {
    let parts: Vec<&str> = name
        .split('/')
        .filter(|part| !matches!(*part, "" | "."))
        .map(|part| if part == ".." { PARENT_REPLACEMENT } else { part })
        .collect();

    if parts.is_empty() {
        let fallback = error_destination();
        warn!(name = %name, entry = %fallback, "empty entry name, stored under errors");
        return fallback;
    }

    parts.join("/")
}

fn archive_error(e: std::io::Error) -> BundleError {
    BundleError::Archive(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use std::io::Read;

    fn read_back(path: &Path) -> Vec<(String, String)> {
        let file = File::open(path).unwrap();
        let mut archive = tar::Archive::new(GzDecoder::new(file));
        archive
            .entries()
            .unwrap()
            .map(|entry| {
                let mut entry = entry.unwrap();
                let name = entry.path().unwrap().to_string_lossy().into_owned();
                let mut body = String::new();
                entry.read_to_string(&mut body).unwrap();
                (name, body)
            })
            .collect()
    }

    #[test]
    fn test_write_and_read_back() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("bundle.tar.gz");

        let mut writer = ArchiveWriter::create(&out).unwrap();
        writer.write_entry("/var/log/syslog", b"line\n").unwrap();
        writer.write_entry("commands/uname", b"Linux").unwrap();
        assert_eq!(writer.entries(), 2);
        writer.finish().unwrap();

        let entries = read_back(&out);
        assert_eq!(
            entries,
            vec![
                ("var/log/syslog".to_string(), "line\n".to_string()),
                ("commands/uname".to_string(), "Linux".to_string()),
            ]
        );
    }

    #[test]
    fn test_duplicate_destinations_kept_in_order() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("bundle.tar.gz");

        let mut writer = ArchiveWriter::create(&out).unwrap();
        writer.write_entry("same", b"first").unwrap();
        writer.write_entry("same", b"second").unwrap();
        writer.finish().unwrap();

        let entries = read_back(&out);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries.last().unwrap().1, "second");
    }

    #[test]
    fn test_drop_closes_archive() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("bundle.tar.gz");

        {
            let mut writer = ArchiveWriter::create(&out).unwrap();
            writer.write_entry("a", b"x").unwrap();
        }

        assert_eq!(read_back(&out).len(), 1);
    }

    #[test]
    fn test_empty_archive_is_valid() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("bundle.tar.gz");

        ArchiveWriter::create(&out).unwrap().finish().unwrap();
        assert!(read_back(&out).is_empty());
    }

    // ==================== Entry names ====================

    #[test]
    fn test_normalize_entry_name() {
        assert_eq!(normalize_entry_name("/tmp/d/a.txt"), "tmp/d/a.txt");
        assert_eq!(normalize_entry_name("./x//y"), "x/y");
        assert_eq!(normalize_entry_name("uname -a"), "uname -a");
    }

    #[test]
    fn test_normalize_rewrites_parent_components() {
        assert_eq!(normalize_entry_name("../etc/passwd"), "__/etc/passwd");
        assert_eq!(normalize_entry_name("/var/log/../x.log"), "var/log/__/x.log");
        assert_eq!(normalize_entry_name("ls /tmp/.."), "ls /tmp/__");
    }

    #[test]
    fn test_normalize_empty_name_goes_to_errors() {
        for name in ["", "/", "./."] {
            let entry = normalize_entry_name(name);
            assert!(entry.starts_with("errors/"), "{} -> {}", name, entry);
        }
    }

    #[test]
    fn test_parent_components_are_written() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("bundle.tar.gz");

        let mut writer = ArchiveWriter::create(&out).unwrap();
        writer.write_entry("/var/log/../x.log", b"x").unwrap();
        writer.write_entry("/", b"root").unwrap();
        writer.finish().unwrap();

        let entries = read_back(&out);
        assert_eq!(entries[0], ("var/log/__/x.log".to_string(), "x".to_string()));
        assert!(entries[1].0.starts_with("errors/"));
    }
}
