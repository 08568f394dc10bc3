//! Packaging of proxy bundle directories for import.
//!
//! The management API accepts a zip whose root contains the `apiproxy/`
//! directory. The archive is built in memory from the bundle directory.

use std::fs::File;
use std::io::{self, Cursor};
use std::path::Path;

use log::debug;
use walkdir::WalkDir;
use zip::ZipWriter;
use zip::write::FileOptions;

use crate::error::ClientError;

/// Zips every file below `dir`, with archive paths relative to `dir`.
///
/// Entries are added in sorted order so the same tree always yields the same
/// archive layout.
///
/// # Errors
///
/// Returns [`ClientError::BundleError`] if `dir` is missing, is not a
/// directory or contains no files, and I/O or zip errors otherwise.
pub fn package_bundle(dir: &Path) -> Result<Vec<u8>, ClientError> {
    if !dir.is_dir() {
        return Err(ClientError::BundleError(format!(
            "bundle directory not found: {}",
            dir.display()
        )));
    }

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let mut files = 0usize;

    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|e| ClientError::BundleError(e.to_string()))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(dir)
            .map_err(|e| ClientError::BundleError(e.to_string()))?;
        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        zip.start_file(name.as_str(), FileOptions::<()>::default())?;
        let mut source = File::open(entry.path())?;
        io::copy(&mut source, &mut zip)?;
        files += 1;
    }

    if files == 0 {
        return Err(ClientError::BundleError(format!(
            "bundle directory contains no files: {}",
            dir.display()
        )));
    }

    let bytes = zip.finish()?.into_inner();
    debug!("Packaged {files} bundle file(s) into {} bytes", bytes.len());
    Ok(bytes)
}
