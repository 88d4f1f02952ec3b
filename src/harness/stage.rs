//! Archive staging
//!
//! Unpacks the case archive into the working directory before enumeration
//! starts. Accepts plain tar and tar compressed with gzip, bzip2, or xz; the
//! format is picked from the stream's leading bytes rather than the file
//! extension.

use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

use bzip2::read::BzDecoder;
use flate2::read::GzDecoder;
use tar::Archive;
use xz2::read::XzDecoder;

use super::error::{HarnessError, HarnessResult};

const GZIP_MAGIC: &[u8] = &[0x1f, 0x8b];
const BZIP2_MAGIC: &[u8] = b"BZh";
const XZ_MAGIC: &[u8] = &[0xfd, 0x37, 0x7a, 0x58, 0x5a, 0x00];

/// Compression wrapped around the tar stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    None,
    Gzip,
    Bzip2,
    Xz,
}

impl Compression {
    /// Identify the compression from the first bytes of the archive.
    pub fn detect(head: &[u8]) -> Self {
        if head.starts_with(GZIP_MAGIC) {
            Compression::Gzip
        } else if head.starts_with(BZIP2_MAGIC) {
            Compression::Bzip2
        } else if head.starts_with(XZ_MAGIC) {
            Compression::Xz
        } else {
            Compression::None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Compression::None => "none",
            Compression::Gzip => "gzip",
            Compression::Bzip2 => "bzip2",
            Compression::Xz => "xz",
        }
    }
}

/// Result of a successful staging step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedWorkspace {
    pub root: PathBuf,
    /// Members written under `root` (files, directories, links)
    pub members: usize,
    /// Members refused because their path would land outside `root`
    pub skipped: usize,
}

/// Extract every member of `archive` into `dest`, creating `dest` if needed.
#[tracing::instrument(skip_all, fields(archive = %archive.display(), dest = %dest.display()))]
pub fn stage_archive(archive: &Path, dest: &Path) -> HarnessResult<StagedWorkspace> {
    let extraction = |source: io::Error| HarnessError::Extraction {
        archive: archive.to_path_buf(),
        source,
    };

    let file = File::open(archive).map_err(extraction)?;
    let mut reader = BufReader::new(file);
    let head = reader.fill_buf().map_err(extraction)?;
    if head.is_empty() {
        return Err(extraction(io::Error::new(io::ErrorKind::InvalidData, "archive is empty")));
    }
    let compression = Compression::detect(head);

    fs::create_dir_all(dest).map_err(extraction)?;

    let (members, skipped) = match compression {
        Compression::None => unpack_members(Archive::new(reader), dest),
        Compression::Gzip => unpack_members(Archive::new(GzDecoder::new(reader)), dest),
        Compression::Bzip2 => unpack_members(Archive::new(BzDecoder::new(reader)), dest),
        Compression::Xz => unpack_members(Archive::new(XzDecoder::new(reader)), dest),
    }
    .map_err(extraction)?;

    if skipped > 0 {
        tracing::warn!(skipped, "archive members outside the working directory were not extracted");
    }
    tracing::info!(members, compression = compression.as_str(), "staged archive");

    Ok(StagedWorkspace {
        root: dest.to_path_buf(),
        members,
        skipped,
    })
}

fn unpack_members<R: Read>(mut archive: Archive<R>, dest: &Path) -> io::Result<(usize, usize)> {
    let mut members = 0;
    let mut skipped = 0;
    for entry in archive.entries()? {
        let mut entry = entry?;
        if entry.unpack_in(dest)? {
            members += 1;
        } else {
            skipped += 1;
        }
    }
    Ok((members, skipped))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;

    fn append_file<W: io::Write>(builder: &mut tar::Builder<W>, path: &str, data: &[u8]) {
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, path, data).unwrap();
    }

    fn write_tar(path: &Path, files: &[(&str, &str)]) {
        let mut builder = tar::Builder::new(File::create(path).unwrap());
        for (name, data) in files {
            append_file(&mut builder, name, data.as_bytes());
        }
        builder.finish().unwrap();
    }

    fn write_tar_gz(path: &Path, files: &[(&str, &str)]) {
        let encoder = GzEncoder::new(File::create(path).unwrap(), flate2::Compression::default());
        let mut builder = tar::Builder::new(encoder);
        for (name, data) in files {
            append_file(&mut builder, name, data.as_bytes());
        }
        builder.into_inner().unwrap().finish().unwrap();
    }

    fn write_tar_bz2(path: &Path, files: &[(&str, &str)]) {
        let encoder = bzip2::write::BzEncoder::new(File::create(path).unwrap(), bzip2::Compression::default());
        let mut builder = tar::Builder::new(encoder);
        for (name, data) in files {
            append_file(&mut builder, name, data.as_bytes());
        }
        builder.into_inner().unwrap().finish().unwrap();
    }

    fn write_tar_xz(path: &Path, files: &[(&str, &str)]) {
        let encoder = xz2::write::XzEncoder::new(File::create(path).unwrap(), 6);
        let mut builder = tar::Builder::new(encoder);
        for (name, data) in files {
            append_file(&mut builder, name, data.as_bytes());
        }
        builder.into_inner().unwrap().finish().unwrap();
    }

    /// Append a member whose raw header name is `name`, bypassing the
    /// builder's path validation.
    fn append_raw_name<W: io::Write>(builder: &mut tar::Builder<W>, name: &[u8], data: &[u8]) {
        let mut header = tar::Header::new_gnu();
        header.as_old_mut().name[..name.len()].copy_from_slice(name);
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_entry_type(tar::EntryType::Regular);
        header.set_cksum();
        builder.append(&header, data).unwrap();
    }

    #[test]
    fn test_detect_compression_from_magic() {
        assert_eq!(Compression::detect(&[0x1f, 0x8b, 0x08]), Compression::Gzip);
        assert_eq!(Compression::detect(b"BZh91AY&SY"), Compression::Bzip2);
        assert_eq!(
            Compression::detect(&[0xfd, 0x37, 0x7a, 0x58, 0x5a, 0x00, 0x00]),
            Compression::Xz
        );
        assert_eq!(Compression::detect(b"a.bin\0\0\0"), Compression::None);
        // Truncated magic is not enough
        assert_eq!(Compression::detect(&[0xfd, 0x37, 0x7a]), Compression::None);
    }

    #[test]
    fn test_stage_plain_tar() {
        let tmp = tempfile::tempdir().unwrap();
        let archive = tmp.path().join("cases.tar");
        write_tar(&archive, &[("a.bin", "MZ"), ("sub/b.bin", "MZP")]);

        let dest = tmp.path().join("run");
        let staged = stage_archive(&archive, &dest).unwrap();

        assert_eq!(staged.members, 2);
        assert_eq!(staged.skipped, 0);
        assert_eq!(fs::read(dest.join("a.bin")).unwrap(), b"MZ");
        assert_eq!(fs::read(dest.join("sub/b.bin")).unwrap(), b"MZP");
    }

    #[test]
    fn test_stage_gzip_tar() {
        let tmp = tempfile::tempdir().unwrap();
        let archive = tmp.path().join("cases.tgz");
        write_tar_gz(&archive, &[("nested/deeper/c.exe", "payload")]);

        let dest = tmp.path().join("run");
        let staged = stage_archive(&archive, &dest).unwrap();

        assert_eq!(staged.members, 1);
        assert_eq!(fs::read(dest.join("nested/deeper/c.exe")).unwrap(), b"payload");
    }

    #[test]
    fn test_stage_bzip2_tar() {
        let tmp = tempfile::tempdir().unwrap();
        let archive = tmp.path().join("cases.tar.bz2");
        write_tar_bz2(&archive, &[("a.bin", "MZ"), ("sub/b.bin", "MZP")]);

        let dest = tmp.path().join("run");
        let staged = stage_archive(&archive, &dest).unwrap();

        assert_eq!(staged.members, 2);
        assert_eq!(fs::read(dest.join("a.bin")).unwrap(), b"MZ");
        assert_eq!(fs::read(dest.join("sub/b.bin")).unwrap(), b"MZP");
    }

    #[test]
    fn test_stage_xz_tar() {
        let tmp = tempfile::tempdir().unwrap();
        // Extension deliberately misleading: detection goes by content
        let archive = tmp.path().join("cases.tar");
        write_tar_xz(&archive, &[("nested/c.exe", "payload")]);

        let dest = tmp.path().join("run");
        let staged = stage_archive(&archive, &dest).unwrap();

        assert_eq!(staged.members, 1);
        assert_eq!(fs::read(dest.join("nested/c.exe")).unwrap(), b"payload");
    }

    #[test]
    fn test_parent_traversal_member_is_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        let archive = tmp.path().join("evil.tar");
        let mut builder = tar::Builder::new(File::create(&archive).unwrap());
        append_raw_name(&mut builder, b"../evil.bin", b"pwned");
        append_file(&mut builder, "good.bin", b"MZ");
        builder.finish().unwrap();

        let dest = tmp.path().join("run");
        let staged = stage_archive(&archive, &dest).unwrap();

        assert_eq!(staged.skipped, 1);
        assert_eq!(staged.members, 1);
        assert!(dest.join("good.bin").is_file());
        assert!(!tmp.path().join("evil.bin").exists());
        assert!(!dest.join("evil.bin").exists());
    }

    #[test]
    fn test_stage_creates_nested_destination() {
        let tmp = tempfile::tempdir().unwrap();
        let archive = tmp.path().join("cases.tar");
        write_tar(&archive, &[("x.bin", "1")]);

        let dest = tmp.path().join("does/not/exist/yet");
        stage_archive(&archive, &dest).unwrap();
        assert!(dest.join("x.bin").is_file());
    }

    #[test]
    fn test_missing_archive_is_extraction_error() {
        let tmp = tempfile::tempdir().unwrap();
        let err = stage_archive(&tmp.path().join("nope.tar"), &tmp.path().join("run")).unwrap_err();
        assert!(matches!(err, HarnessError::Extraction { .. }));
        // Nothing is created when the archive cannot be opened
        assert!(!tmp.path().join("run").exists());
    }

    #[test]
    fn test_empty_archive_is_extraction_error() {
        let tmp = tempfile::tempdir().unwrap();
        let archive = tmp.path().join("empty.tar");
        File::create(&archive).unwrap();
        let err = stage_archive(&archive, &tmp.path().join("run")).unwrap_err();
        assert!(matches!(err, HarnessError::Extraction { .. }));
    }

    #[test]
    fn test_gzip_without_tar_payload_is_extraction_error() {
        let tmp = tempfile::tempdir().unwrap();
        let archive = tmp.path().join("broken.tar.gz");
        let mut encoder = GzEncoder::new(File::create(&archive).unwrap(), flate2::Compression::default());
        io::Write::write_all(&mut encoder, &[b'x'; 100]).unwrap();
        encoder.finish().unwrap();
        let err = stage_archive(&archive, &tmp.path().join("run")).unwrap_err();
        assert!(matches!(err, HarnessError::Extraction { .. }));
    }

    #[test]
    fn test_plain_garbage_is_extraction_error() {
        let tmp = tempfile::tempdir().unwrap();
        let archive = tmp.path().join("garbage.tar");
        fs::write(&archive, [0xabu8; 512]).unwrap();
        let err = stage_archive(&archive, &tmp.path().join("run")).unwrap_err();
        assert!(matches!(err, HarnessError::Extraction { .. }));
    }
}
