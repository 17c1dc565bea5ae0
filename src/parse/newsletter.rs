use super::layout::NewsletterLayout;
use super::types::{FileRecord, ItemMetadata};
use log::{debug, warn};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Derives newsletter issue metadata from an archive's file index.
///
/// Files are grouped by their first path segment. A group becomes an issue when:
///
/// 1. the directory name matches `{prefix}-{digits}`,
/// 2. it contains a file with the primary extension (the first by path order is used), and
/// 3. that filename matches `{YYYY}-{MM}-{DD}-{token}-{digits}.{ext}` with a real calendar date.
///
/// Groups failing any step are left out; this is ordinary filtering and never an error. When two
/// directories parse to the same number (e.g. `item-1` and `item-01`), the one sorting first wins.
/// The result is ordered by number, highest first, independent of the map's iteration order.
///
/// # Arguments
///
/// * `files` - File index keyed by relative path.
/// * `layout` - Naming conventions to match against.
///
/// # Returns
///
/// A vector of `ItemMetadata`, newest number first.
pub fn derive_items(files: &HashMap<String, FileRecord>, layout: &NewsletterLayout) -> Vec<ItemMetadata> {
    // BTreeMaps make "first file" and duplicate resolution independent of hash order.
    let mut groups: BTreeMap<&str, BTreeMap<&str, &FileRecord>> = BTreeMap::new();
    for (path, record) in files {
        if let Some((directory, _)) = path.split_once('/') {
            groups.entry(directory).or_default().insert(path.as_str(), record);
        }
    }

    let mut seen = HashSet::new();
    let mut items = Vec::new();
    for (directory, group) in groups {
        let Some(number) = layout.directory_number(directory) else {
            debug!("Skipping {}: not an issue directory", directory);
            continue;
        };
        let Some(primary) = group
            .values()
            .find(|record| layout.is_primary_candidate(&record.filename))
        else {
            debug!("Skipping {}: no .{} file", directory, layout.extension());
            continue;
        };
        let Some(date) = layout.file_date(&primary.filename) else {
            debug!("Skipping {}: {} does not carry a date", directory, primary.filename);
            continue;
        };
        if !seen.insert(number) {
            warn!("Skipping {}: issue number {} already taken", directory, number);
            continue;
        }

        items.push(ItemMetadata {
            number,
            date,
            path: primary.relative_path.clone(),
            filename: primary.filename.clone(),
        });
    }

    items.sort_by(|a, b| b.number.cmp(&a.number));
    items
}
