//! Archive decoders
//!
//! One decoder per supported kind. All of them funnel members through the
//! same `write_member` sink, which runs the path guard before creating
//! anything on disk and stream-copies member content without buffering a
//! whole member in memory.

use flate2::read::GzDecoder;
use log::{info, warn};
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::Path;
use tar::Archive as TarArchive;
use zip::ZipArchive;
use zstd::stream::read::Decoder as ZstdDecoder;

use crate::archive::UploadOutcome;
use crate::browse::path::normalize_member_path;
use crate::error::BrowseError;

/// Extract a zip archive: iterate its member directory, open each member
/// stream in order.
pub fn extract_zip(spool: File, dest: &Path) -> Result<UploadOutcome, BrowseError> {
    let mut archive =
        ZipArchive::new(spool).map_err(|e| BrowseError::CorruptArchive(e.to_string()))?;

    let mut outcome = UploadOutcome::default();
    for index in 0..archive.len() {
        let mut member = archive
            .by_index(index)
            .map_err(|e| BrowseError::CorruptArchive(e.to_string()))?;
        let raw_path = member.name().to_string();

        if member.is_dir() {
            create_dir_member(dest, &raw_path)?;
        } else {
            let declared = member.size();
            write_member(dest, &raw_path, &mut member, Some(declared), &mut outcome)?;
        }
    }

    info!(
        "Extracted zip archive into {}: {} files, {} bytes",
        dest.display(),
        outcome.files_written,
        outcome.bytes_written
    );

    Ok(outcome)
}

/// Extract a tar archive read sequentially from `reader`.
pub fn extract_tar<R: Read>(reader: R, dest: &Path) -> Result<UploadOutcome, BrowseError> {
    let mut archive = TarArchive::new(reader);
    let entries = archive
        .entries()
        .map_err(|e| BrowseError::CorruptArchive(e.to_string()))?;

    let mut outcome = UploadOutcome::default();
    for entry in entries {
        let mut entry = entry.map_err(|e| BrowseError::CorruptArchive(e.to_string()))?;
        let raw_path = String::from_utf8_lossy(&entry.path_bytes()).to_string();
        let entry_type = entry.header().entry_type();

        if entry_type.is_dir() {
            create_dir_member(dest, &raw_path)?;
        } else if entry_type.is_file() {
            let declared = entry.size();
            write_member(dest, &raw_path, &mut entry, Some(declared), &mut outcome)?;
        } else {
            // Links, devices and other special members never touch the tree.
            warn!("Skipping non-regular archive member: {}", raw_path);
        }
    }

    info!(
        "Extracted tar archive into {}: {} files, {} bytes",
        dest.display(),
        outcome.files_written,
        outcome.bytes_written
    );

    Ok(outcome)
}

/// Extract a gzip stream. A `.tar.gz`/`.tgz` upload name marks the decoded
/// stream as a tar container; anything else is a single file named by
/// stripping the `.gz` suffix from the upload name.
pub fn extract_gz(
    spool: File,
    upload_name: Option<&str>,
    dest: &Path,
) -> Result<UploadOutcome, BrowseError> {
    let decoder = GzDecoder::new(spool);
    if wraps_tar(upload_name, &[".tar.gz", ".tgz"]) {
        return extract_tar(decoder, dest);
    }
    extract_single(decoder, upload_name, ".gz", dest)
}

/// Extract a zstd stream, with the same tar-vs-single-file policy as gzip.
pub fn extract_zst(
    spool: File,
    upload_name: Option<&str>,
    dest: &Path,
) -> Result<UploadOutcome, BrowseError> {
    let decoder = ZstdDecoder::new(spool).map_err(BrowseError::Io)?;
    if wraps_tar(upload_name, &[".tar.zst", ".tzst"]) {
        return extract_tar(decoder, dest);
    }
    extract_single(decoder, upload_name, ".zst", dest)
}

fn wraps_tar(upload_name: Option<&str>, suffixes: &[&str]) -> bool {
    let Some(name) = upload_name else {
        return false;
    };
    let name = name.to_lowercase();
    suffixes.iter().any(|suffix| name.ends_with(suffix))
}

/// Write a single decompressed stream under a name derived from the upload
/// metadata, with the compressor's suffix stripped.
fn extract_single<R: Read>(
    mut reader: R,
    upload_name: Option<&str>,
    suffix: &str,
    dest: &Path,
) -> Result<UploadOutcome, BrowseError> {
    let name = upload_name.unwrap_or("upload");
    let name = strip_suffix_ignore_case(name, suffix).unwrap_or(name);

    let mut outcome = UploadOutcome::default();
    write_member(dest, name, &mut reader, None, &mut outcome)?;
    Ok(outcome)
}

fn strip_suffix_ignore_case<'a>(name: &'a str, suffix: &str) -> Option<&'a str> {
    let split = name.len().checked_sub(suffix.len())?;
    if name.is_char_boundary(split) && name[split..].eq_ignore_ascii_case(suffix) {
        Some(&name[..split])
    } else {
        None
    }
}

/// Create a directory member (and missing intermediates) idempotently.
fn create_dir_member(dest: &Path, raw_path: &str) -> Result<(), BrowseError> {
    let relative = normalize_member_path(raw_path)?;
    if relative.is_empty() {
        return Ok(());
    }
    fs::create_dir_all(dest.join(relative)).map_err(BrowseError::Io)
}

/// Materialize one file member under `dest`.
///
/// The path guard runs before anything is created; the content is then
/// stream-copied into a created-or-truncated destination file. A declared
/// member size that disagrees with the decoded length is a corrupt archive,
/// not a silent discrepancy.
fn write_member<R: Read>(
    dest: &Path,
    raw_path: &str,
    content: &mut R,
    declared_size: Option<u64>,
    outcome: &mut UploadOutcome,
) -> Result<(), BrowseError> {
    let relative = normalize_member_path(raw_path)?;
    if relative.is_empty() {
        return Err(BrowseError::CorruptArchive(format!(
            "member name {:?} resolves to nothing",
            raw_path
        )));
    }

    let target = dest.join(&relative);
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).map_err(BrowseError::Io)?;
    }

    let mut file = File::create(&target).map_err(BrowseError::Io)?;
    let copied = io::copy(content, &mut file).map_err(BrowseError::Io)?;

    if let Some(declared) = declared_size {
        if copied != declared {
            return Err(BrowseError::CorruptArchive(format!(
                "member {} declared {} bytes but decoded {}",
                relative, declared, copied
            )));
        }
    }

    outcome.files_written += 1;
    outcome.bytes_written += copied;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::{Seek, SeekFrom, Write};
    use tempfile::TempDir;

    fn spool_from(bytes: &[u8]) -> File {
        let mut spool = tempfile::tempfile().expect("create spool file");
        spool.write_all(bytes).expect("write spool");
        spool.seek(SeekFrom::Start(0)).expect("rewind spool");
        spool
    }

    fn sample_zip() -> File {
        let mut spool = tempfile::tempfile().expect("create spool file");
        {
            let mut writer = zip::ZipWriter::new(&mut spool);
            let options = zip::write::SimpleFileOptions::default();
            writer.start_file("a.txt", options).expect("start a.txt");
            writer.write_all(b"hello").expect("write a.txt");
            writer.add_directory("sub/", options).expect("add sub/");
            writer
                .start_file("sub/b.txt", options)
                .expect("start sub/b.txt");
            writer.write_all(b"world").expect("write sub/b.txt");
            writer.finish().expect("finish zip");
        }
        spool.seek(SeekFrom::Start(0)).expect("rewind spool");
        spool
    }

    fn sample_tar(extra_member: Option<(&str, &[u8])>) -> Vec<u8> {
        let mut builder = tar::Builder::new(Vec::new());
        append_tar_file(&mut builder, "a.txt", b"hello");
        if let Some((path, data)) = extra_member {
            append_tar_file(&mut builder, path, data);
        }
        append_tar_file(&mut builder, "sub/b.txt", b"world");
        builder.into_inner().expect("finish tar")
    }

    fn append_tar_file(builder: &mut tar::Builder<Vec<u8>>, path: &str, data: &[u8]) {
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        // Write the path straight into the header name field. `append_data`
        // and `set_path` reject `..`, so they can't build the traversal
        // fixture this test needs to exercise `extract_tar`'s rejection path.
        let name = path.as_bytes();
        let gnu = header.as_gnu_mut().expect("gnu header");
        gnu.name[..name.len()].copy_from_slice(name);
        header.set_cksum();
        builder
            .append(&header, data)
            .expect("append tar member");
    }

    #[test]
    fn test_zip_round_trip() {
        let dest = TempDir::new().expect("create dest");
        let outcome = extract_zip(sample_zip(), dest.path()).expect("extract zip");

        assert_eq!(outcome.files_written, 2);
        assert_eq!(outcome.bytes_written, 10);
        assert_eq!(
            fs::read(dest.path().join("a.txt")).expect("read a.txt"),
            b"hello"
        );
        assert_eq!(
            fs::read(dest.path().join("sub/b.txt")).expect("read sub/b.txt"),
            b"world"
        );
    }

    #[test]
    fn test_tar_round_trip() {
        let dest = TempDir::new().expect("create dest");
        let outcome =
            extract_tar(sample_tar(None).as_slice(), dest.path()).expect("extract tar");

        assert_eq!(outcome.files_written, 2);
        assert_eq!(
            fs::read(dest.path().join("a.txt")).expect("read a.txt"),
            b"hello"
        );
        assert_eq!(
            fs::read(dest.path().join("sub/b.txt")).expect("read sub/b.txt"),
            b"world"
        );
    }

    #[test]
    fn test_tar_traversal_member_rejected_without_rollback() {
        let outer = TempDir::new().expect("create outer dir");
        let dest = outer.path().join("inner");
        fs::create_dir(&dest).expect("create dest");
        let tar = sample_tar(Some(("../evil.txt", b"evil")));

        let result = extract_tar(tar.as_slice(), &dest);
        assert!(matches!(result, Err(BrowseError::PathTraversal(_))));

        // The member before the traversal stays; the escape target and the
        // member after it were never written.
        assert!(dest.join("a.txt").exists());
        assert!(!dest.join("sub/b.txt").exists());
        assert!(!outer.path().join("evil.txt").exists());
    }

    #[test]
    fn test_gz_wraps_tar_when_named_so() {
        let dest = TempDir::new().expect("create dest");
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&sample_tar(None)).expect("compress tar");
        let compressed = encoder.finish().expect("finish gzip");

        let outcome = extract_gz(
            spool_from(&compressed),
            Some("bundle.tar.gz"),
            dest.path(),
        )
        .expect("extract tar.gz");

        assert_eq!(outcome.files_written, 2);
        assert!(dest.path().join("sub/b.txt").exists());
    }

    #[test]
    fn test_gz_single_file_named_from_upload_metadata() {
        let dest = TempDir::new().expect("create dest");
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"plain text").expect("compress file");
        let compressed = encoder.finish().expect("finish gzip");

        let outcome = extract_gz(
            spool_from(&compressed),
            Some("notes.txt.gz"),
            dest.path(),
        )
        .expect("extract gz");

        assert_eq!(outcome.files_written, 1);
        assert_eq!(
            fs::read(dest.path().join("notes.txt")).expect("read notes.txt"),
            b"plain text"
        );
    }

    #[test]
    fn test_zst_single_file_round_trip() {
        let dest = TempDir::new().expect("create dest");
        let compressed = zstd::encode_all(&b"zstd payload"[..], 3).expect("compress zstd");

        let outcome = extract_zst(
            spool_from(&compressed),
            Some("data.bin.zst"),
            dest.path(),
        )
        .expect("extract zst");

        assert_eq!(outcome.files_written, 1);
        assert_eq!(
            fs::read(dest.path().join("data.bin")).expect("read data.bin"),
            b"zstd payload"
        );
    }

    #[test]
    fn test_zst_wraps_tar_when_named_so() {
        let dest = TempDir::new().expect("create dest");
        let compressed =
            zstd::encode_all(sample_tar(None).as_slice(), 3).expect("compress tar.zst");

        let outcome = extract_zst(
            spool_from(&compressed),
            Some("bundle.tar.zst"),
            dest.path(),
        )
        .expect("extract tar.zst");

        assert_eq!(outcome.files_written, 2);
        assert!(dest.path().join("a.txt").exists());
    }

    #[test]
    fn test_corrupt_stream_is_reported() {
        let dest = TempDir::new().expect("create dest");
        let result = extract_zip(spool_from(b"this is not a zip"), dest.path());
        assert!(matches!(result, Err(BrowseError::CorruptArchive(_))));
    }

    #[test]
    fn test_declared_size_mismatch_is_corrupt() {
        let dest = TempDir::new().expect("create dest");
        let mut outcome = UploadOutcome::default();
        let mut short = &b"abc"[..];
        let result = write_member(dest.path(), "f.txt", &mut short, Some(5), &mut outcome);
        assert!(matches!(result, Err(BrowseError::CorruptArchive(_))));
    }
}
