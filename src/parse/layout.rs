use crate::error::{NewsletterError, Result};
use chrono::NaiveDate;
use regex::Regex;

pub const DEFAULT_CONTENT_ROOT: &str = "newsletters";
pub const DEFAULT_DIRECTORY_PREFIX: &str = "newsletter";
pub const DEFAULT_FILE_TOKEN: &str = "newsletter";
pub const DEFAULT_EXTENSION: &str = "md";

/// Naming conventions of a newsletter repository.
///
/// Content lives under `{content_root}/`, each issue in a `{directory_prefix}-{N}/` directory whose
/// primary file is named `{YYYY}-{MM}-{DD}-{file_token}-{N}.{extension}`.
#[derive(Debug, Clone)]
pub struct NewsletterLayout {
    content_root: String,
    directory_prefix: String,
    extension: String,
    directory_pattern: Regex,
    file_pattern: Regex,
}

impl NewsletterLayout {
    /// Builds a layout and compiles its directory and filename patterns.
    ///
    /// # Arguments
    ///
    /// * `content_root` - Directory segment marking the content root (e.g., "newsletters").
    /// * `directory_prefix` - Literal before `-{N}` in issue directory names.
    /// * `file_token` - Literal between the date and `-{N}` in primary filenames.
    /// * `extension` - Primary file extension without the dot (e.g., "md").
    ///
    /// # Returns
    ///
    /// * `Ok(NewsletterLayout)` - The compiled layout.
    /// * `Err(NewsletterError::Configuration)` - A part is empty or contains a path separator.
    pub fn new(content_root: &str, directory_prefix: &str, file_token: &str, extension: &str) -> Result<Self> {
        let content_root = content_root.trim_matches('/');
        for (name, value) in [
            ("content root", content_root),
            ("directory prefix", directory_prefix),
            ("file token", file_token),
            ("extension", extension),
        ] {
            if value.is_empty() {
                return Err(NewsletterError::Configuration(format!("{} must not be empty", name)));
            }
            if name != "content root" && value.contains('/') {
                return Err(NewsletterError::Configuration(format!(
                    "{} must not contain '/': {}",
                    name, value
                )));
            }
        }

        let directory_pattern = compile(&format!(r"^{}-(\d+)$", regex::escape(directory_prefix)))?;
        let file_pattern = compile(&format!(
            r"^(\d{{4}})-(\d{{2}})-(\d{{2}})-{}-(\d+)\.{}$",
            regex::escape(file_token),
            regex::escape(extension)
        ))?;

        Ok(Self {
            content_root: content_root.to_string(),
            directory_prefix: directory_prefix.to_string(),
            extension: extension.to_string(),
            directory_pattern,
            file_pattern,
        })
    }

    pub fn content_root(&self) -> &str {
        &self.content_root
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Extracts the issue number from a directory name, e.g. `newsletter-12` → `12`.
    pub fn directory_number(&self, directory: &str) -> Option<u32> {
        let captures = self.directory_pattern.captures(directory)?;
        captures[1].parse().ok()
    }

    /// Extracts the calendar date from a primary filename.
    ///
    /// Returns `None` when the name does not follow the convention or names an impossible date.
    pub fn file_date(&self, filename: &str) -> Option<NaiveDate> {
        let captures = self.file_pattern.captures(filename)?;
        let year = captures[1].parse().ok()?;
        let month = captures[2].parse().ok()?;
        let day = captures[3].parse().ok()?;
        NaiveDate::from_ymd_opt(year, month, day)
    }

    /// Whether `filename` carries the primary file extension.
    pub fn is_primary_candidate(&self, filename: &str) -> bool {
        filename
            .rsplit_once('.')
            .is_some_and(|(stem, ext)| !stem.is_empty() && ext == self.extension)
    }

    /// Relative path of an auxiliary file inside an issue directory.
    pub fn item_file_path(&self, number: u32, filename: &str) -> String {
        format!("{}-{}/{}", self.directory_prefix, number, filename)
    }
}

impl Default for NewsletterLayout {
    fn default() -> Self {
        // The default parts are plain words, so building them cannot fail.
        match Self::new(
            DEFAULT_CONTENT_ROOT,
            DEFAULT_DIRECTORY_PREFIX,
            DEFAULT_FILE_TOKEN,
            DEFAULT_EXTENSION,
        ) {
            Ok(layout) => layout,
            Err(e) => unreachable!("default layout is valid: {}", e),
        }
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| NewsletterError::Configuration(format!("invalid pattern {}: {}", pattern, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item_layout() -> NewsletterLayout {
        NewsletterLayout::new("newsletters", "item", "token", "md").unwrap()
    }

    #[test]
    fn test_directory_number() {
        let layout = item_layout();
        assert_eq!(layout.directory_number("item-12"), Some(12));
        assert_eq!(layout.directory_number("item-007"), Some(7));
        assert_eq!(layout.directory_number("itemX"), None);
        assert_eq!(layout.directory_number("item-"), None);
        assert_eq!(layout.directory_number("item-3a"), None);
        assert_eq!(layout.directory_number("other-3"), None);
    }

    #[test]
    fn test_directory_number_overflow_is_rejected() {
        assert_eq!(item_layout().directory_number("item-99999999999"), None);
    }

    #[test]
    fn test_file_date() {
        let layout = item_layout();
        assert_eq!(
            layout.file_date("2024-01-01-token-1.md"),
            NaiveDate::from_ymd_opt(2024, 1, 1)
        );
        assert_eq!(layout.file_date("2024-02-30-wrongtoken-8.md"), None);
        assert_eq!(layout.file_date("2024-01-01-token-1.txt"), None);
        assert_eq!(layout.file_date("24-01-01-token-1.md"), None);
    }

    /// Tests that a well-formed name with an impossible calendar date is dropped.
    #[test]
    fn test_file_date_rejects_impossible_date() {
        assert_eq!(item_layout().file_date("2024-02-30-token-8.md"), None);
    }

    #[test]
    fn test_literal_parts_are_escaped() {
        let layout = NewsletterLayout::new("news", "a.b", "x+y", "md").unwrap();
        assert_eq!(layout.directory_number("a.b-1"), Some(1));
        assert_eq!(layout.directory_number("aXb-1"), None);
        assert!(layout.file_date("2024-01-01-x+y-1.md").is_some());
        assert!(layout.file_date("2024-01-01-xxy-1.md").is_none());
    }

    #[test]
    fn test_empty_parts_are_configuration_errors() {
        assert!(matches!(
            NewsletterLayout::new("", "item", "token", "md"),
            Err(NewsletterError::Configuration(_))
        ));
        assert!(matches!(
            NewsletterLayout::new("newsletters", "it/em", "token", "md"),
            Err(NewsletterError::Configuration(_))
        ));
    }

    #[test]
    fn test_item_file_path() {
        assert_eq!(item_layout().item_file_path(4, "pic.png"), "item-4/pic.png");
        assert_eq!(
            NewsletterLayout::default().item_file_path(4, "pic.png"),
            "newsletter-4/pic.png"
        );
    }

    #[test]
    fn test_is_primary_candidate() {
        let layout = item_layout();
        assert!(layout.is_primary_candidate("notes.md"));
        assert!(!layout.is_primary_candidate("notes.txt"));
        assert!(!layout.is_primary_candidate(".md"));
        assert!(!layout.is_primary_candidate("md"));
    }
}
