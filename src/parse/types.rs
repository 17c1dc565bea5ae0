use chrono::NaiveDate;
use std::collections::HashMap;
use std::fmt::Debug;

/// One regular file found below the content root of an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    /// Path below the content root (e.g., "newsletter-12/2024-01-01-newsletter-12.md").
    pub relative_path: String,
    /// Final path segment (e.g., "2024-01-01-newsletter-12.md").
    pub filename: String,
    /// Size declared by the tar header.
    pub size_bytes: u64,
}

/// One newsletter issue derived from a numbered directory and its dated markdown file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemMetadata {
    /// Issue number taken from the directory name suffix; unique within a listing.
    pub number: u32,
    /// Publication date taken from the markdown filename.
    pub date: NaiveDate,
    /// Relative path of the markdown file.
    pub path: String,
    /// Filename of the markdown file.
    pub filename: String,
}

/// Output of one tar extraction pass: the file index and the payload of every file.
#[derive(Debug, Default)]
pub struct ExtractedArchive {
    pub files: HashMap<String, FileRecord>,
    pub contents: HashMap<String, Vec<u8>>,
}

/// The fully assembled snapshot of a repository's newsletter content.
///
/// A bundle is never mutated once built. The cache swaps in a whole new bundle when it refreshes,
/// so readers holding an older one keep a consistent view.
#[derive(Debug, Default)]
pub struct RepositoryContents {
    files: HashMap<String, FileRecord>,
    contents: HashMap<String, Vec<u8>>,
    items: Vec<ItemMetadata>,
}

impl RepositoryContents {
    pub fn new(archive: ExtractedArchive, items: Vec<ItemMetadata>) -> Self {
        Self {
            files: archive.files,
            contents: archive.contents,
            items,
        }
    }

    /// Index of every extracted file, keyed by relative path.
    pub fn files(&self) -> &HashMap<String, FileRecord> {
        &self.files
    }

    /// Issues ordered by number, newest first.
    pub fn items(&self) -> &[ItemMetadata] {
        &self.items
    }

    pub fn item(&self, number: u32) -> Option<&ItemMetadata> {
        self.items.iter().find(|item| item.number == number)
    }

    pub fn get_content(&self, path: &str) -> Option<&[u8]> {
        self.contents.get(path).map(Vec::as_slice)
    }
}
