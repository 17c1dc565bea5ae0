use super::layout::NewsletterLayout;
use super::types::{ExtractedArchive, FileRecord};
use crate::error::{NewsletterError, Result};
use log::{debug, info};
use std::io::Read;
use tar::Archive;

/// Extracts every regular file below the content root of a tar archive.
///
/// Entries are visited in archive order. An entry is kept when one of its path segments equals the
/// layout's content root and something follows that segment; the remainder becomes the entry's
/// relative path. GitHub prefixes every entry with `{repo}-{sha}/`, so the marker is searched for
/// rather than expected at a fixed depth. Directory entries are skipped. Every kept entry is read
/// fully into memory.
///
/// # Arguments
///
/// * `tar_bytes` - The uncompressed tar archive.
/// * `layout` - Supplies the content root marker.
///
/// # Returns
///
/// * `Ok(ExtractedArchive)` - File index and payloads keyed by relative path.
/// * `Err(NewsletterError::CorruptArchive)` - The tar structure could not be read.
///
/// # Examples
///
/// ```rust
/// use newsletter_source::parse::{extract_archive, NewsletterLayout};
///
/// let mut builder = tar::Builder::new(Vec::new());
/// let mut header = tar::Header::new_gnu();
/// header.set_size(5);
/// header.set_mode(0o644);
/// header.set_cksum();
/// builder
///     .append_data(&mut header, "repo-sha/newsletters/newsletter-1/2024-01-01-newsletter-1.md", &b"hello"[..])
///     .unwrap();
/// let tar_bytes = builder.into_inner().unwrap();
///
/// let archive = extract_archive(&tar_bytes, &NewsletterLayout::default()).unwrap();
/// assert_eq!(archive.files.len(), 1);
/// ```
pub fn extract_archive(tar_bytes: &[u8], layout: &NewsletterLayout) -> Result<ExtractedArchive> {
    let mut archive = Archive::new(tar_bytes);
    let mut extracted = ExtractedArchive::default();
    let mut skipped = 0usize;

    let entries = archive
        .entries()
        .map_err(|e| NewsletterError::CorruptArchive(format!("cannot read tar entries: {}", e)))?;

    for entry in entries {
        let mut entry =
            entry.map_err(|e| NewsletterError::CorruptArchive(format!("bad tar entry: {}", e)))?;
        let archive_path = String::from_utf8_lossy(&entry.path_bytes()).into_owned();

        if entry.header().entry_type().is_dir() || archive_path.ends_with('/') {
            continue;
        }

        let Some(relative_path) = relative_to_root(&archive_path, layout.content_root()) else {
            skipped += 1;
            continue;
        };
        let filename = match relative_path.rsplit_once('/') {
            Some((_, name)) => name.to_string(),
            None => relative_path.clone(),
        };

        let size_bytes = entry
            .header()
            .size()
            .map_err(|e| NewsletterError::CorruptArchive(format!("bad size for {}: {}", archive_path, e)))?;
        let mut payload = Vec::new();
        entry
            .read_to_end(&mut payload)
            .map_err(|e| NewsletterError::CorruptArchive(format!("cannot read {}: {}", archive_path, e)))?;
        if payload.len() as u64 != size_bytes {
            return Err(NewsletterError::CorruptArchive(format!(
                "{} is truncated: expected {} bytes, got {}",
                archive_path,
                size_bytes,
                payload.len()
            )));
        }

        debug!("Extracted {} ({} bytes)", relative_path, size_bytes);
        extracted.contents.insert(relative_path.clone(), payload);
        extracted.files.insert(
            relative_path.clone(),
            FileRecord {
                relative_path,
                filename,
                size_bytes,
            },
        );
    }

    info!(
        "Extracted {} file(s) below {}/, skipped {} entr(ies) outside it",
        extracted.files.len(),
        layout.content_root(),
        skipped
    );
    Ok(extracted)
}

/// Returns the part of `archive_path` after the first segment equal to `root`.
///
/// `None` when no segment matches or nothing follows it.
fn relative_to_root(archive_path: &str, root: &str) -> Option<String> {
    let segments: Vec<&str> = archive_path.split('/').collect();
    let marker = segments.iter().position(|segment| *segment == root)?;
    let rest: Vec<&str> = segments[marker + 1..]
        .iter()
        .copied()
        .filter(|segment| !segment.is_empty())
        .collect();
    if rest.is_empty() {
        None
    } else {
        Some(rest.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tar::{Builder, EntryType, Header};

    fn add_file(builder: &mut Builder<Vec<u8>>, path: &str, data: &[u8]) {
        let mut header = Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, path, data).unwrap();
    }

    fn add_dir(builder: &mut Builder<Vec<u8>>, path: &str) {
        let mut header = Header::new_gnu();
        header.set_entry_type(EntryType::Directory);
        header.set_size(0);
        header.set_mode(0o755);
        header.set_cksum();
        builder.append_data(&mut header, path, &[][..]).unwrap();
    }

    #[test]
    fn test_relative_to_root() {
        assert_eq!(
            relative_to_root("repo-abc/newsletters/item-1/a.md", "newsletters"),
            Some("item-1/a.md".to_string())
        );
        assert_eq!(
            relative_to_root("newsletters/item-1/a.md", "newsletters"),
            Some("item-1/a.md".to_string())
        );
        assert_eq!(relative_to_root("repo-abc/README.md", "newsletters"), None);
        assert_eq!(relative_to_root("repo-abc/newsletters/", "newsletters"), None);
        assert_eq!(relative_to_root("repo-abc/old-newsletters/a.md", "newsletters"), None);
    }

    /// Tests that only files below the content root are indexed and directories are skipped.
    #[test]
    fn test_extract_archive_filters_to_content_root() {
        let mut builder = Builder::new(Vec::new());
        add_dir(&mut builder, "repo-sha/");
        add_file(&mut builder, "repo-sha/README.md", b"readme");
        add_dir(&mut builder, "repo-sha/newsletters/");
        add_dir(&mut builder, "repo-sha/newsletters/item-1/");
        add_file(
            &mut builder,
            "repo-sha/newsletters/item-1/2024-01-01-token-1.md",
            b"hello",
        );
        add_file(&mut builder, "repo-sha/newsletters/item-1/pic.png", &[1, 2, 3]);
        let tar_bytes = builder.into_inner().unwrap();

        let layout = NewsletterLayout::new("newsletters", "item", "token", "md").unwrap();
        let archive = extract_archive(&tar_bytes, &layout).unwrap();

        assert_eq!(archive.files.len(), 2);
        assert_eq!(archive.contents.len(), 2);
        let record = &archive.files["item-1/2024-01-01-token-1.md"];
        assert_eq!(record.filename, "2024-01-01-token-1.md");
        assert_eq!(record.size_bytes, 5);
        assert_eq!(archive.contents["item-1/2024-01-01-token-1.md"], b"hello");
        assert_eq!(archive.contents["item-1/pic.png"], vec![1, 2, 3]);
        assert!(!archive.files.contains_key("README.md"));
    }

    /// Tests that paths longer than the classic 100-byte name field survive extraction.
    #[test]
    fn test_extract_archive_long_paths() {
        let long_dir = "d".repeat(120);
        let path = format!("{}/newsletters/item-2/2024-03-04-token-2.md", long_dir);
        let mut builder = Builder::new(Vec::new());
        add_file(&mut builder, &path, b"long");
        let tar_bytes = builder.into_inner().unwrap();

        let layout = NewsletterLayout::new("newsletters", "item", "token", "md").unwrap();
        let archive = extract_archive(&tar_bytes, &layout).unwrap();
        assert_eq!(archive.contents["item-2/2024-03-04-token-2.md"], b"long");
    }

    #[test]
    fn test_extract_empty_archive() {
        let tar_bytes = Builder::new(Vec::new()).into_inner().unwrap();
        let archive = extract_archive(&tar_bytes, &NewsletterLayout::default()).unwrap();
        assert!(archive.files.is_empty());
    }

    #[test]
    fn test_extract_truncated_archive_is_corrupt() {
        let mut builder = Builder::new(Vec::new());
        add_file(&mut builder, "repo/newsletters/item-1/a.md", &[b'x'; 2048]);
        let tar_bytes = builder.into_inner().unwrap();
        let truncated = &tar_bytes[..700];

        let result = extract_archive(truncated, &NewsletterLayout::default());
        assert!(matches!(result, Err(NewsletterError::CorruptArchive(_))));
    }
}
