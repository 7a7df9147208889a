//! Zip archives of build products.
//!
//! Archives keep the product's own directory name as their top-level entry, so extracting
//! `App.framework.zip` into a directory recreates `App.framework` inside it.

use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io;
use std::path::{Component, Path};
use tracing::debug;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Zip `source` (a file or directory) into a new archive at `destination`.
pub fn zip_product(source: &Path, destination: &Path) -> Result<()> {
    let parent = source.parent().unwrap_or_else(|| Path::new(""));
    if !source.exists() {
        anyhow::bail!("Cannot archive missing product: {}", source.display());
    }

    let file = File::create(destination)
        .with_context(|| format!("Failed to create archive: {}", destination.display()))?;
    let mut writer = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut entries = 0usize;
    for entry in WalkDir::new(source).sort_by_file_name() {
        let entry = entry.with_context(|| format!("Failed to walk {}", source.display()))?;
        let name = archive_name(entry.path().strip_prefix(parent)?);
        let file_type = entry.file_type();
        let metadata = entry.metadata()?;
        let options = options.unix_permissions(entry_mode(&metadata));

        if file_type.is_symlink() {
            let target = fs::read_link(entry.path())?;
            writer.add_symlink(name, target.to_string_lossy().into_owned(), options)?;
        } else if file_type.is_dir() {
            writer.add_directory(name, options)?;
        } else {
            writer.start_file(name, options)?;
            let mut input = File::open(entry.path())
                .with_context(|| format!("Failed to read {}", entry.path().display()))?;
            io::copy(&mut input, &mut writer)?;
        }
        entries += 1;
    }

    writer.finish()?;
    debug!(target: "cache", "Archived {} entries from {}", entries, source.display());
    Ok(())
}

/// Extract every entry of `archive` into `destination`, creating it if needed.
pub fn extract(archive: &Path, destination: &Path) -> Result<()> {
    let file = File::open(archive)
        .with_context(|| format!("Failed to open archive: {}", archive.display()))?;
    let mut zip = ZipArchive::new(file)
        .with_context(|| format!("Not a zip archive: {}", archive.display()))?;
    fs::create_dir_all(destination)?;
    zip.extract(destination)
        .with_context(|| format!("Failed to extract into {}", destination.display()))?;
    debug!(target: "cache", "Extracted {} entries into {}", zip.len(), destination.display());
    Ok(())
}

#[cfg(unix)]
fn entry_mode(metadata: &fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o7777
}

#[cfg(not(unix))]
fn entry_mode(metadata: &fs::Metadata) -> u32 {
    if metadata.is_dir() { 0o755 } else { 0o644 }
}

// Zip entry names always use forward slashes.
fn archive_name(relative: &Path) -> String {
    relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_zip_and_extract_framework() {
        let temp = TempDir::new().unwrap();
        let framework = temp.path().join("App.framework");
        fs::create_dir_all(framework.join("Headers")).unwrap();
        fs::write(framework.join("App"), b"binary").unwrap();
        fs::write(framework.join("Headers/App.h"), "#import <Foundation/Foundation.h>").unwrap();

        let archive = temp.path().join("App.zip");
        zip_product(&framework, &archive).unwrap();

        let output = temp.path().join("out");
        extract(&archive, &output).unwrap();

        assert_eq!(fs::read(output.join("App.framework/App")).unwrap(), b"binary");
        assert!(output.join("App.framework/Headers/App.h").is_file());
    }

    #[cfg(unix)]
    #[test]
    fn test_file_modes_survive_round_trip() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let framework = temp.path().join("Tool.framework");
        fs::create_dir_all(&framework).unwrap();
        fs::write(framework.join("Tool"), b"binary").unwrap();
        fs::write(framework.join("Info.plist"), b"<plist/>").unwrap();
        fs::set_permissions(framework.join("Tool"), fs::Permissions::from_mode(0o755)).unwrap();
        fs::set_permissions(framework.join("Info.plist"), fs::Permissions::from_mode(0o644))
            .unwrap();

        let archive = temp.path().join("Tool.zip");
        zip_product(&framework, &archive).unwrap();
        let output = temp.path().join("out");
        extract(&archive, &output).unwrap();

        let mode = |name: &str| {
            fs::metadata(output.join("Tool.framework").join(name)).unwrap().permissions().mode()
                & 0o777
        };
        assert_eq!(mode("Tool"), 0o755);
        assert_eq!(mode("Info.plist"), 0o644);
    }

    #[test]
    fn test_zip_missing_product() {
        let temp = TempDir::new().unwrap();
        let result = zip_product(&temp.path().join("Missing.framework"), &temp.path().join("a.zip"));
        assert!(result.is_err());
    }

    #[test]
    fn test_extract_rejects_non_zip() {
        let temp = TempDir::new().unwrap();
        let bogus = temp.path().join("bogus.zip");
        fs::write(&bogus, "not a zip").unwrap();
        assert!(extract(&bogus, &temp.path().join("out")).is_err());
    }

    #[test]
    fn test_archive_name_uses_forward_slashes() {
        let relative = Path::new("App.framework").join("Headers").join("App.h");
        assert_eq!(archive_name(&relative), "App.framework/Headers/App.h");
    }
}
