pub mod listenbrainz;

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use indicatif::{ProgressBar, ProgressStyle};
use thiserror::Error;
use walkdir::WalkDir;

use crate::SUPPORTED_EXTENSIONS;
use crate::models::ListenRecord;
use listenbrainz::{ExportFile, RawListen};

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid listen JSON in {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("No .json or .jsonl listen files found under {0}")]
    NoFiles(String),
}

/// Listens read from one or more export files, in file order then in-file order.
pub struct LoadedListens {
    pub records: Vec<ListenRecord>,
    pub files_read: usize,
    /// Unparseable `.jsonl` lines that were skipped.
    pub lines_skipped: usize,
}

/// Load every listen file reachable from `paths`.
///
/// Directories are walked recursively for supported extensions and visited
/// in sorted path order so the combined export order is reproducible.
pub fn load_paths(paths: &[PathBuf]) -> Result<LoadedListens, LoadError> {
    let files = collect_files(paths)?;

    let pb = if files.len() > 1 {
        let pb = ProgressBar::new(files.len() as u64);
        if let Ok(style) = ProgressStyle::with_template(
            "{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} files ({eta}) {msg}",
        ) {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb
    } else {
        ProgressBar::hidden()
    };

    let mut loaded = LoadedListens {
        records: Vec::new(),
        files_read: 0,
        lines_skipped: 0,
    };

    for file in &files {
        log::info!("Reading {}", file.display());
        let (records, skipped) = load_file(file)?;
        log::debug!("  {} listens from {}", records.len(), file.display());
        loaded.records.extend(records);
        loaded.lines_skipped += skipped;
        loaded.files_read += 1;
        pb.inc(1);
        pb.set_message(format!("{} listens", loaded.records.len()));
    }

    pb.finish_and_clear();
    Ok(loaded)
}

/// Expand `paths` into the list of listen files to read.
pub fn collect_files(paths: &[PathBuf]) -> Result<Vec<PathBuf>, LoadError> {
    let mut files = Vec::new();

    for path in paths {
        if path.is_file() {
            files.push(path.clone());
            continue;
        }

        let mut found: Vec<PathBuf> = WalkDir::new(path)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| match e {
                Ok(entry) => Some(entry),
                Err(err) => {
                    log::warn!("Error walking {}: {}", path.display(), err);
                    None
                }
            })
            .filter(|e| e.file_type().is_file() && is_supported(e.path()))
            .map(|e| e.into_path())
            .collect();

        if found.is_empty() {
            if !path.exists() {
                return Err(LoadError::Io {
                    path: path.display().to_string(),
                    source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file or directory"),
                });
            }
            return Err(LoadError::NoFiles(path.display().to_string()));
        }

        found.sort();
        files.extend(found);
    }

    Ok(files)
}

fn is_supported(path: &Path) -> bool {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    SUPPORTED_EXTENSIONS.contains(&ext.as_str())
}

fn is_jsonl(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("jsonl"))
}

/// Read one file. Returns the records and the number of skipped lines.
pub fn load_file(path: &Path) -> Result<(Vec<ListenRecord>, usize), LoadError> {
    let io_err = |source: std::io::Error| LoadError::Io {
        path: path.display().to_string(),
        source,
    };
    let file = File::open(path).map_err(io_err)?;
    let reader = BufReader::new(file);

    if is_jsonl(path) {
        return read_jsonl(reader, path);
    }

    let export: ExportFile = serde_json::from_reader(reader).map_err(|source| LoadError::Json {
        path: path.display().to_string(),
        source,
    })?;
    let records = export.into_listens().into_iter().map(ListenRecord::from).collect();
    Ok((records, 0))
}

fn read_jsonl<R: BufRead>(reader: R, path: &Path) -> Result<(Vec<ListenRecord>, usize), LoadError> {
    let mut records = Vec::new();
    let mut skipped = 0;

    for (i, line) in reader.lines().enumerate() {
        let line = line.map_err(|source| LoadError::Io {
            path: path.display().to_string(),
            source,
        })?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<RawListen>(&line) {
            Ok(raw) => records.push(ListenRecord::from(raw)),
            Err(e) => {
                log::warn!("{}:{}: skipping unparseable listen: {}", path.display(), i + 1, e);
                skipped += 1;
            }
        }
    }

    Ok((records, skipped))
}

/// Split off podcast episodes. Returns (music, removed count).
pub fn filter_podcasts(records: Vec<ListenRecord>) -> (Vec<ListenRecord>, usize) {
    let before = records.len();
    let kept: Vec<ListenRecord> = records.into_iter().filter(|r| !r.is_podcast()).collect();
    let removed = before - kept.len();
    if removed > 0 {
        log::info!("Removed {removed} podcast listens");
    }
    (kept, removed)
}
