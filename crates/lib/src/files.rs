use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::os::unix::fs::MetadataExt;
use std::path::Path;

use tracing::debug;

use crate::Error;

const COPY_BUF_SIZE: usize = 64 * 1024;

/// Copy `src` to `dest` byte for byte, creating or truncating `dest`.
/// Returns the number of bytes in `dest` afterwards.
///
/// If `dest` already is `src` (same device and inode, through any path or
/// link) nothing is written.
pub fn copy_file(src: &Path, dest: &Path) -> Result<u64, Error> {
    let mut from = File::open(src).map_err(|e| Error::io(src, e))?;
    let meta = from.metadata().map_err(|e| Error::io(src, e))?;

    if let Ok(existing) = fs::metadata(dest)
        && existing.dev() == meta.dev()
        && existing.ino() == meta.ino()
    {
        debug!(dest = %dest.display(), "Destination is the source file, leaving it as is");
        return Ok(meta.len());
    }

    let mut to = File::create(dest).map_err(|e| Error::io(dest, e))?;
    let mut buf = vec![0u8; COPY_BUF_SIZE];
    let mut written = 0u64;
    loop {
        let n = match from.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(Error::io(src, e)),
        };
        to.write_all(&buf[..n]).map_err(|e| Error::io(dest, e))?;
        written += n as u64;
    }
    to.flush().map_err(|e| Error::io(dest, e))?;
    Ok(written)
}

/// Whether `path` exists and is a regular file (symlinks followed)
pub fn is_regular_file(path: &Path) -> bool {
    path.metadata().map(|m| m.is_file()).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn copy_is_byte_identical() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("a.bin");
        let dest = dir.path().join("b.bin");
        let content: Vec<u8> = (0..=255u8).cycle().take(70_000).collect();
        fs::write(&src, &content).unwrap();

        let n = copy_file(&src, &dest).unwrap();

        assert_eq!(n, content.len() as u64);
        assert_eq!(fs::read(&dest).unwrap(), content);
    }

    #[test]
    fn copy_overwrites_existing_destination() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("a.txt");
        let dest = dir.path().join("b.txt");
        fs::write(&src, "hello").unwrap();
        fs::write(&dest, "a much longer previous content").unwrap();

        copy_file(&src, &dest).unwrap();

        assert_eq!(fs::read_to_string(&dest).unwrap(), "hello");
    }

    #[test]
    fn copy_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("empty");
        let dest = dir.path().join("copy");
        fs::write(&src, "").unwrap();

        assert_eq!(copy_file(&src, &dest).unwrap(), 0);
        assert!(dest.is_file());
    }

    #[test]
    fn missing_source_names_path() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("nope");
        let err = copy_file(&src, &dir.path().join("out")).unwrap_err();
        match err {
            Error::Io { path, source } => {
                assert_eq!(path, src);
                assert_eq!(source.kind(), io::ErrorKind::NotFound);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(!dir.path().join("out").exists());
    }

    #[test]
    fn unwritable_destination_names_path() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("a.txt");
        fs::write(&src, "x").unwrap();
        let dest = dir.path().join("missing-dir").join("a.txt");

        let err = copy_file(&src, &dest).unwrap_err();
        assert!(matches!(err, Error::Io { ref path, .. } if *path == dest));
    }

    #[test]
    fn copy_onto_itself_keeps_content() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("a.txt");
        fs::write(&src, "hello").unwrap();

        assert_eq!(copy_file(&src, &src).unwrap(), 5);
        assert_eq!(fs::read_to_string(&src).unwrap(), "hello");

        let same = dir.path().join(".").join("a.txt");
        assert_eq!(copy_file(&src, &same).unwrap(), 5);
        assert_eq!(fs::read_to_string(&src).unwrap(), "hello");
    }

    #[test]
    fn copy_onto_hard_link_keeps_content() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("a.txt");
        let link = dir.path().join("b.txt");
        fs::write(&src, "hello").unwrap();
        fs::hard_link(&src, &link).unwrap();

        assert_eq!(copy_file(&src, &link).unwrap(), 5);
        assert_eq!(fs::read_to_string(&link).unwrap(), "hello");
    }

    #[test]
    fn read_failure_names_source() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("sub");
        fs::create_dir(&src).unwrap();
        let dest = dir.path().join("out");

        let err = copy_file(&src, &dest).unwrap_err();
        assert!(matches!(err, Error::Io { ref path, .. } if *path == src));
    }

    #[test]
    fn regular_file_check() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("f");
        fs::write(&file, "x").unwrap();

        assert!(is_regular_file(&file));
        assert!(!is_regular_file(dir.path()));
        assert!(!is_regular_file(&dir.path().join("absent")));
    }
}
