//! EPUB container packaging
//!
//! An EPUB is a zip archive whose first member is an uncompressed file named
//! `mimetype` holding `application/epub+zip`, so readers can identify the
//! container from its first bytes. Every other member follows, deflated.

use crate::error::PackageError;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Name of the container's first member
pub const MIMETYPE_MEMBER: &str = "mimetype";

/// MIME declaration stored in the first member
pub const EPUB_MIMETYPE: &str = "application/epub+zip";

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> PackageError + '_ {
    move |source| PackageError::Io {
        path: path.display().to_string(),
        source,
    }
}

/// Zip `tree` into `<tree's parent>/<archive_name>` and return the archive path.
///
/// The archive is built inside the tree first, so a failure leaves nothing
/// next to it.
pub fn package(tree: &Path, archive_name: &str) -> Result<PathBuf, PackageError> {
    tracing::info!("Zipping up EPUB");
    let parent = tree
        .parent()
        .ok_or_else(|| PackageError::NoParent(tree.display().to_string()))?;
    check_mimetype(tree)?;

    let mut members = Vec::new();
    collect_files(tree, tree, &mut members)?;

    let staged = tree.join(archive_name);
    members.retain(|path| path != &staged && path != &tree.join(MIMETYPE_MEMBER));

    let file = File::create(&staged).map_err(io_error(&staged))?;
    let mut zip = ZipWriter::new(BufWriter::new(file));

    let stored = FileOptions::default().compression_method(CompressionMethod::Stored);
    zip.start_file(MIMETYPE_MEMBER, stored)?;
    zip.write_all(EPUB_MIMETYPE.as_bytes())
        .map_err(io_error(&staged))?;

    let deflated = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(9));
    for path in &members {
        let name = member_name(tree, path);
        tracing::debug!("Adding {}", name);
        zip.start_file(name, deflated)?;
        let data = std::fs::read(path).map_err(io_error(path))?;
        zip.write_all(&data).map_err(io_error(&staged))?;
    }

    let mut writer = zip.finish()?;
    writer.flush().map_err(io_error(&staged))?;
    drop(writer);

    let archive = parent.join(archive_name);
    relocate(&staged, &archive)?;
    tracing::info!(
        "Packaged {} members into {}",
        members.len() + 1,
        archive.display()
    );
    Ok(archive)
}

/// A template-supplied mimetype must agree with the declaration written
fn check_mimetype(tree: &Path) -> Result<(), PackageError> {
    let path = tree.join(MIMETYPE_MEMBER);
    if !path.is_file() {
        return Ok(());
    }
    let found = std::fs::read_to_string(&path).map_err(io_error(&path))?;
    if found.trim() != EPUB_MIMETYPE {
        return Err(PackageError::MimetypeConflict {
            found: found.trim().to_string(),
            expected: EPUB_MIMETYPE.to_string(),
        });
    }
    Ok(())
}

/// Every file below `dir`, depth first, in name order. No directory entries.
fn collect_files(root: &Path, dir: &Path, files: &mut Vec<PathBuf>) -> Result<(), PackageError> {
    let mut children: Vec<_> = std::fs::read_dir(dir)
        .map_err(io_error(dir))?
        .collect::<Result<_, _>>()
        .map_err(io_error(dir))?;
    children.sort_by_key(|e| e.file_name());

    for child in children {
        let path = child.path();
        if child.file_type().map_err(io_error(&path))?.is_dir() {
            collect_files(root, &path, files)?;
        } else {
            files.push(path);
        }
    }
    Ok(())
}

/// Archive member name: path relative to the tree, `/`-separated
fn member_name(tree: &Path, path: &Path) -> String {
    path.strip_prefix(tree)
        .unwrap_or(path)
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Move the finished archive, copying when a rename is not possible
fn relocate(from: &Path, to: &Path) -> Result<(), PackageError> {
    if std::fs::rename(from, to).is_ok() {
        return Ok(());
    }
    std::fs::copy(from, to).map_err(io_error(to))?;
    std::fs::remove_file(from).map_err(io_error(from))?;
    Ok(())
}

/// One member of a packaged archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberInfo {
    pub name: String,
    pub stored: bool,
}

/// List an archive's members in order
pub fn inspect(archive: &Path) -> Result<Vec<MemberInfo>, PackageError> {
    let file = File::open(archive).map_err(io_error(archive))?;
    let mut zip = ZipArchive::new(file)?;
    let mut members = Vec::with_capacity(zip.len());
    for i in 0..zip.len() {
        let member = zip.by_index(i)?;
        members.push(MemberInfo {
            name: member.name().to_string(),
            stored: member.compression() == CompressionMethod::Stored,
        });
    }
    Ok(members)
}
