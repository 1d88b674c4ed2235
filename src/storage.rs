//! Storage helpers for downloaded content on disk.

use std::io::Write;
use std::path::{Path, PathBuf};

use crate::models::{Congress, DocumentId, FileFormat};

/// Construct the storage path for one rendition of a document.
///
/// Layout: `{downloads_dir}/{format}/{congress}/{id}.{extension}`
pub fn content_storage_path(
    downloads_dir: &Path,
    format: FileFormat,
    congress: Congress,
    id: &DocumentId,
) -> PathBuf {
    downloads_dir
        .join(format.as_str())
        .join(congress.number().to_string())
        .join(format!("{}.{}", id.as_str(), format.extension()))
}

/// Write content to `path`, creating parent directories.
///
/// Bytes go to a temporary file in the destination directory and are
/// renamed into place, so a crash never leaves a truncated file at `path`.
pub fn write_atomic(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let parent = path.parent().unwrap_or(Path::new("."));
    std::fs::create_dir_all(parent)?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_content_storage_path() {
        let id = DocumentId::parse("CHRG-105hhrg12345").unwrap();
        let congress = id.congress().unwrap();
        let path = content_storage_path(Path::new("/data/dl"), FileFormat::Pdf, congress, &id);
        assert_eq!(path, PathBuf::from("/data/dl/pdf/105/CHRG-105hhrg12345.pdf"));
    }

    #[test]
    fn test_write_atomic_creates_parents() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("txt").join("105").join("a.txt");

        write_atomic(&path, b"hearing").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"hearing");

        write_atomic(&path, b"replaced").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"replaced");

        let leftovers = std::fs::read_dir(path.parent().unwrap()).unwrap().count();
        assert_eq!(leftovers, 1);
    }
}
