//! Zip handling for the frame-based tasks.
//!
//! Archives are extracted flat into a staging directory with every entry name
//! lowercased, so `IMG_001.PNG` and `img_002.png` end up matched by the same
//! `*.png` glob.

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Component, Path, PathBuf};

use tracing::{debug, warn};
use zip::ZipArchive;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::error::ArchiveError;
use crate::fstools::lowercase_extension;

/// Still-image extensions that can be turned back into video.
pub const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Entries larger than this, declared or actual, are skipped rather than staged.
pub const MAX_ENTRY_SIZE: u64 = 100 * 1024 * 1024;

/// Directory holding the entries of one extracted archive.
#[derive(Clone, Debug)]
pub struct StagingArea {
    dir: PathBuf,
}

impl StagingArea {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        StagingArea { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Regular files in the staging area, sorted by name.
    pub fn files(&self) -> Result<Vec<PathBuf>, ArchiveError> {
        list_files(&self.dir)
    }

    /// Glob over every staged file with `extension`, as understood by ffmpeg's glob pattern type.
    pub fn glob(&self, extension: &str) -> PathBuf {
        self.dir.join(format!("*.{extension}"))
    }
}

/// Regular files directly inside `dir`, sorted by name.
pub fn list_files(dir: &Path) -> Result<Vec<PathBuf>, ArchiveError> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|ft| ft.is_file()).unwrap_or(false))
        .map(|entry| entry.path())
        .collect();
    files.sort();
    Ok(files)
}

/// Unpacks every file entry of `archive` into `staging_dir`.
pub fn extract(archive: &Path, staging_dir: &Path) -> Result<StagingArea, ArchiveError> {
    let reader = BufReader::new(File::open(archive)?);
    let mut zip = ZipArchive::new(reader)?;
    fs::create_dir_all(staging_dir)?;

    let mut seen = HashSet::new();
    for i in 0..zip.len() {
        let mut entry = zip.by_index(i)?;
        if entry.is_dir() {
            continue;
        }

        let Some(name) = entry.enclosed_name().and_then(|p| staged_name(&p)) else {
            warn!(entry = entry.name(), "skipping archive entry");
            continue;
        };
        let size = entry.size();
        if size > MAX_ENTRY_SIZE {
            warn!(entry = entry.name(), size, limit = MAX_ENTRY_SIZE, "skipping oversized archive entry");
            continue;
        }
        if !seen.insert(name.clone()) {
            warn!(entry = entry.name(), "skipping duplicate archive entry");
            continue;
        }

        let destination = staging_dir.join(&name);
        let mut out = BufWriter::new(File::create(&destination)?);
        // declared sizes are untrusted; cap the inflated bytes as well
        let written = io::copy(&mut (&mut entry).take(MAX_ENTRY_SIZE + 1), &mut out)?;
        out.flush()?;
        drop(out);
        if written > MAX_ENTRY_SIZE {
            fs::remove_file(&destination)?;
            warn!(entry = entry.name(), limit = MAX_ENTRY_SIZE, "skipping archive entry that inflates past the limit");
            continue;
        }
        debug!(entry = entry.name(), staged = %destination.display(), "extracted");
    }

    Ok(StagingArea {
        dir: staging_dir.to_path_buf(),
    })
}

/// Lowercased base name, or `None` for hidden files and anything under a hidden directory
/// (`__MACOSX/`, `.git/`, `._frame.png` resource forks).
fn staged_name(path: &Path) -> Option<String> {
    let hidden = path.components().any(|c| match c {
        Component::Normal(part) => {
            let part = part.to_string_lossy();
            part.starts_with('.') || part.starts_with("__")
        },
        _ => false,
    });
    if hidden {
        return None;
    }
    path.file_name().map(|name| name.to_string_lossy().to_lowercase())
}

/// First image extension found among the staged files, in name order.
pub fn detect_image_extension(staging: &StagingArea) -> Result<String, ArchiveError> {
    first_image_extension(&staging.files()?).ok_or_else(|| ArchiveError::NoImagesFound {
        dir: staging.dir.clone(),
    })
}

/// Same answer as [`detect_image_extension`] after [`extract`], read from the
/// archive's entry names without writing anything.
pub fn detect_archive_image_extension(archive: &Path) -> Result<String, ArchiveError> {
    let mut zip = ZipArchive::new(BufReader::new(File::open(archive)?))?;
    let mut names = Vec::new();
    for i in 0..zip.len() {
        let entry = zip.by_index(i)?;
        if entry.is_dir() || entry.size() > MAX_ENTRY_SIZE {
            continue;
        }
        if let Some(name) = entry.enclosed_name().and_then(|p| staged_name(&p)) {
            names.push(PathBuf::from(name));
        }
    }
    names.sort();
    first_image_extension(&names).ok_or_else(|| ArchiveError::NoImagesFound {
        dir: archive.to_path_buf(),
    })
}

fn first_image_extension(files: &[PathBuf]) -> Option<String> {
    files
        .iter()
        .map(|file| lowercase_extension(file))
        .find(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
}

/// Writes `files` into a new archive at `destination`, each under its base name.
pub fn pack(files: &[PathBuf], destination: &Path) -> Result<(), ArchiveError> {
    let mut zip = ZipWriter::new(BufWriter::new(File::create(destination)?));
    let options = SimpleFileOptions::default();

    for file in files {
        let name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, format!("{file:?} has no file name")))?;
        zip.start_file(name, options)?;
        let mut input = BufReader::new(File::open(file)?);
        io::copy(&mut input, &mut zip)?;
    }

    zip.finish()?;
    debug!(archive = %destination.display(), files = files.len(), "packed");
    Ok(())
}
