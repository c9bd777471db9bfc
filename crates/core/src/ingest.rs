use crate::models::{DocumentMetadata, FileKind, StoredDocument};
use chrono::Utc;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Every `.txt` and `.pdf` file under `folder`, sorted by path.
pub fn discover_documents(folder: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for entry in WalkDir::new(folder)
        .into_iter()
        .filter_map(|item| item.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }

        let supported = entry
            .file_name()
            .to_str()
            .and_then(FileKind::from_file_name)
            .is_some();

        if supported {
            files.push(entry.path().to_path_buf());
        }
    }

    files.sort_unstable();
    files
}

pub fn digest_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

pub fn build_metadata(file_name: &str, bytes: &[u8]) -> DocumentMetadata {
    DocumentMetadata {
        file_name: file_name.to_string(),
        checksum: digest_bytes(bytes),
        size_bytes: bytes.len() as u64,
        uploaded_at: Utc::now(),
    }
}

pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

pub struct IngestionReport {
    pub documents: Vec<StoredDocument>,
    pub skipped_files: Vec<SkippedFile>,
}

#[cfg(test)]
mod tests {
    use super::{build_metadata, digest_bytes, discover_documents};
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn discover_documents_is_recursive_and_filters_types() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let base = dir.path();
        let nested = base.join("nested");
        fs::create_dir(&nested)?;

        fs::write(base.join("a.txt"), b"alpha")?;
        fs::write(nested.join("b.PDF"), b"%PDF-1.4\n%fake")?;
        fs::write(base.join("c.docx"), b"ignored")?;

        let files = discover_documents(base);
        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|path| !path.ends_with("c.docx")));
        Ok(())
    }

    #[test]
    fn checksum_is_reproducible() {
        assert_eq!(digest_bytes(b"abc"), digest_bytes(b"abc"));
        assert_ne!(digest_bytes(b"abc"), digest_bytes(b"abd"));
    }

    #[test]
    fn metadata_records_name_and_size() {
        let metadata = build_metadata("sky.txt", b"The sky is blue.");
        assert_eq!(metadata.file_name, "sky.txt");
        assert_eq!(metadata.size_bytes, 16);
        assert_eq!(metadata.checksum.len(), 64);
    }
}
