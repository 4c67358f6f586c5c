use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::engine::errors::ZipBuildError;
use crate::engine::zip::manifest::nested_path_tree;
use crate::request::Fingerprint;

const LOG_TARGET: &str = "engine::zip::builder";

/// Assembles the archive for `fingerprint` under `scratch_dir`.
///
/// Each `(key, path)` pair in `entries` becomes an archive member named
/// after the object key, read from the cached file at `path`. Two manifest
/// members are appended after the payload: a flat JSON list of the keys and
/// a nested directory tree of the same keys.
///
/// Returns the path of the finished `.zip` file.
pub fn build_archive(
    scratch_dir: &Path,
    fingerprint: &Fingerprint,
    keys: &[String],
    entries: &[(String, PathBuf)],
) -> Result<PathBuf, ZipBuildError> {
    std::fs::create_dir_all(scratch_dir)?;

    let archive_path = scratch_dir.join(fingerprint.archive_object_name());
    let mut writer = ZipWriter::new(File::create(&archive_path)?);
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    for (key, source) in entries {
        writer.start_file(key, options)?;
        let mut reader = File::open(source)?;
        io::copy(&mut reader, &mut writer)?;
    }

    writer.start_file(format!("{}.list.manifest.json", fingerprint.as_str()), options)?;
    writer.write_all(&serde_json::to_vec_pretty(keys)?)?;

    writer.start_file(format!("{}.nested.manifest.json", fingerprint.as_str()), options)?;
    writer.write_all(&serde_json::to_vec_pretty(&nested_path_tree(keys))?)?;

    writer.finish()?;

    tracing::debug!(
        target: LOG_TARGET,
        fingerprint = %fingerprint,
        entries = entries.len(),
        path = %archive_path.display(),
        "Archive assembled"
    );

    Ok(archive_path)
}
