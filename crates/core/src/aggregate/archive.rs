//! Zip packaging of normalized outputs.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::metrics::ARCHIVE_BYTES;

use super::AggregateError;

/// What was written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveSummary {
    pub path: PathBuf,
    pub entries: Vec<String>,
    pub size_bytes: u64,
}

/// Archive entry names for `files`: base names only, made unique.
///
/// A repeated name gets `_2`, `_3`, ... inserted before its extension.
pub fn archive_entry_names(files: &[PathBuf]) -> Vec<String> {
    let mut used = HashSet::new();
    files
        .iter()
        .map(|path| {
            let base = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "output.mp3".to_string());

            let mut candidate = base.clone();
            let mut n = 2;
            while !used.insert(candidate.clone()) {
                candidate = with_suffix(&base, n);
                n += 1;
            }
            candidate
        })
        .collect()
}

fn with_suffix(name: &str, n: usize) -> String {
    let path = Path::new(name);
    match (path.file_stem(), path.extension()) {
        (Some(stem), Some(ext)) => format!(
            "{}_{}.{}",
            stem.to_string_lossy(),
            n,
            ext.to_string_lossy()
        ),
        _ => format!("{}_{}", name, n),
    }
}

/// Writes `files` into a deflate-compressed zip at `archive_path`.
///
/// Runs on the blocking thread pool.
pub async fn build_archive(
    files: Vec<PathBuf>,
    archive_path: PathBuf,
) -> Result<ArchiveSummary, AggregateError> {
    let summary = tokio::task::spawn_blocking(move || write_archive(&files, &archive_path))
        .await
        .map_err(|e| AggregateError::Task(e.to_string()))??;

    ARCHIVE_BYTES
        .with_label_values(&[])
        .observe(summary.size_bytes as f64);
    info!(
        path = %summary.path.display(),
        entries = summary.entries.len(),
        size_bytes = summary.size_bytes,
        "Archive built"
    );
    Ok(summary)
}

fn write_archive(files: &[PathBuf], archive_path: &Path) -> Result<ArchiveSummary, AggregateError> {
    let entries = archive_entry_names(files);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut writer = ZipWriter::new(BufWriter::new(File::create(archive_path)?));
    for (path, entry) in files.iter().zip(&entries) {
        writer.start_file(entry.as_str(), options)?;
        let mut source = File::open(path)?;
        std::io::copy(&mut source, &mut writer)?;
    }
    writer.finish()?.flush()?;

    let size_bytes = std::fs::metadata(archive_path)?.len();
    Ok(ArchiveSummary {
        path: archive_path.to_path_buf(),
        entries,
        size_bytes,
    })
}
