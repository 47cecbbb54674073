use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use tracing::info;
use zip::{write::SimpleFileOptions, CompressionMethod, ZipWriter};

use crate::{
    batch::{collect_frames, PNG_ONLY},
    errors::{FramekitError, Result},
};

/// Outcome of an archive build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackSummary {
    pub archive: PathBuf,
    pub entries: usize,
}

/// Zips the PNG frames of `source` into `dest/<archive_name>`.
///
/// Entries are rooted under a single folder named after the archive's stem
/// (`foo.bfk` packs `foo/<frame>.png`), in the same lexicographic order the
/// pipeline processes frames, deflate compressed. Input errors, including a
/// frame name the archive cannot carry, surface before anything is created
/// under `dest`.
pub fn pack_frames(source: &Path, dest: &Path, archive_name: &str) -> Result<PackSummary> {
    let stem = Path::new(archive_name)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .filter(|stem| !stem.is_empty())
        .ok_or_else(|| FramekitError::Configuration {
            message: format!("invalid archive name: {archive_name:?}"),
        })?
        .to_owned();

    let frames = collect_frames(source, PNG_ONLY)?;
    // validate every entry name before the archive file exists, otherwise a
    // bad frame name leaves a partial archive behind
    let entries: Vec<String> = frames
        .iter()
        .map(|frame| {
            frame
                .file_name()
                .and_then(|name| name.to_str())
                .map(|name| format!("{stem}/{name}"))
                .ok_or_else(|| FramekitError::Configuration {
                    message: format!("frame name is not valid UTF-8: {}", frame.display()),
                })
        })
        .collect::<Result<_>>()?;

    fs::create_dir_all(dest).map_err(|source| FramekitError::FileSystem {
        path: dest.to_path_buf(),
        operation: "create package directory".to_string(),
        source,
    })?;
    let archive_path = dest.join(archive_name);
    let file = File::create(&archive_path).map_err(|source| FramekitError::FileSystem {
        path: archive_path.clone(),
        operation: "create archive".to_string(),
        source,
    })?;

    let mut writer = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    for (frame, entry) in frames.iter().zip(&entries) {
        writer
            .start_file(entry.as_str(), options)
            .map_err(|source| FramekitError::Archive {
                path: archive_path.clone(),
                source,
            })?;
        let bytes = fs::read(frame).map_err(|source| FramekitError::FileSystem {
            path: frame.clone(),
            operation: "read frame".to_string(),
            source,
        })?;
        writer
            .write_all(&bytes)
            .map_err(|source| FramekitError::FileSystem {
                path: archive_path.clone(),
                operation: "write archive entry".to_string(),
                source,
            })?;
    }
    writer.finish().map_err(|source| FramekitError::Archive {
        path: archive_path.clone(),
        source,
    })?;

    info!(
        archive = %archive_path.display(),
        entries = frames.len(),
        "packed frames"
    );
    Ok(PackSummary {
        archive: archive_path,
        entries: frames.len(),
    })
}
